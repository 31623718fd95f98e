//! Kiosk 硬件命令
//!
//! - POST /nodes/{node}/barricade
//! - POST /nodes/{node}/hover-cms
//! - POST /nodes/{node}/car-cms
//! - POST /nodes/{node}/alpr/clear
//! - POST /nodes/{node}/state/idle
//!
//! 均为尽力而为：写入失败只记日志，接口照常返回。

use crate::AppState;
use crate::middleware::require_staff;
use crate::utils::parse_node;
use crate::utils::response::bad_request_error;
use api_contract::{ApiResponse, BarricadeRequest, CmsRequest};
use axum::{
    Json,
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
};
use domain::Node;
use park_control::BarricadeAction;

fn accepted(node: Node, command: &str) -> Response {
    (
        StatusCode::ACCEPTED,
        Json(ApiResponse::success(serde_json::json!({
            "node": node.path_segment(),
            "command": command,
        }))),
    )
        .into_response()
}

fn authorize(state: &AppState, headers: &HeaderMap, node: &str) -> Result<Node, Response> {
    require_staff(state, headers)?;
    parse_node(node)
}

/// 打开/关闭道闸
pub async fn control_barricade(
    State(state): State<AppState>,
    Path(node): Path<String>,
    headers: HeaderMap,
    Json(req): Json<BarricadeRequest>,
) -> Response {
    let node = match authorize(&state, &headers, &node) {
        Ok(node) => node,
        Err(response) => return response,
    };
    let action = match req.action.parse::<BarricadeAction>() {
        Ok(action) => action,
        Err(message) => return bad_request_error(message),
    };
    state.dispatcher.control_barricade(node, action).await;
    accepted(node, "barricade")
}

/// 设置手势感应距离
pub async fn set_hover_cms(
    State(state): State<AppState>,
    Path(node): Path<String>,
    headers: HeaderMap,
    Json(req): Json<CmsRequest>,
) -> Response {
    let node = match authorize(&state, &headers, &node) {
        Ok(node) => node,
        Err(response) => return response,
    };
    state.dispatcher.set_hover_cms(node, req.value).await;
    accepted(node, "set_hover_cms")
}

/// 设置车辆感应距离
pub async fn set_car_cms(
    State(state): State<AppState>,
    Path(node): Path<String>,
    headers: HeaderMap,
    Json(req): Json<CmsRequest>,
) -> Response {
    let node = match authorize(&state, &headers, &node) {
        Ok(node) => node,
        Err(response) => return response,
    };
    state.dispatcher.set_car_cms(node, req.value).await;
    accepted(node, "set_car_cms")
}

/// 清空车牌识别结果
pub async fn clear_license_number(
    State(state): State<AppState>,
    Path(node): Path<String>,
    headers: HeaderMap,
) -> Response {
    let node = match authorize(&state, &headers, &node) {
        Ok(node) => node,
        Err(response) => return response,
    };
    state.dispatcher.clear_license_number(node).await;
    accepted(node, "clear")
}

/// 状态机回到空闲
pub async fn set_state_initial(
    State(state): State<AppState>,
    Path(node): Path<String>,
    headers: HeaderMap,
) -> Response {
    let node = match authorize(&state, &headers, &node) {
        Ok(node) => node,
        Err(response) => return response,
    };
    state.dispatcher.set_state_initial(node).await;
    accepted(node, "set_idle")
}
