//! 全局设置
//!
//! - GET /settings
//! - PUT /settings（管理员）

use crate::AppState;
use crate::middleware::{require_admin, require_staff};
use crate::utils::normalize_required;
use crate::utils::response::{bad_request_error, not_found_error, projection_error};
use api_contract::{ApiResponse, SettingsDto};
use axum::{
    Json,
    extract::State,
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
};
use park_protocol::Settings;
use tracing::info;

pub async fn get_settings(State(state): State<AppState>, headers: HeaderMap) -> Response {
    if let Err(response) = require_staff(&state, &headers) {
        return response;
    }
    match state.projector.read_settings().await {
        Ok(Some(settings)) => (
            StatusCode::OK,
            Json(ApiResponse::success(SettingsDto {
                fee: settings.fee,
                promptpay: settings.promptpay,
            })),
        )
            .into_response(),
        Ok(None) => not_found_error(),
        Err(err) => projection_error(err),
    }
}

/// 写入为尽力而为，失败只记日志
pub async fn put_settings(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(req): Json<SettingsDto>,
) -> Response {
    let ctx = match require_staff(&state, &headers) {
        Ok(ctx) => ctx,
        Err(response) => return response,
    };
    if let Err(response) = require_admin(&ctx) {
        return response;
    }
    if !req.fee.is_finite() || req.fee < 0.0 {
        return bad_request_error("fee must be a non-negative number");
    }
    let promptpay = match normalize_required(req.promptpay, "promptpay") {
        Ok(value) => value,
        Err(response) => return response,
    };
    let settings = Settings {
        fee: req.fee,
        promptpay,
    };
    state.projector.write_settings(&settings).await;
    info!(target: "park.api", staff = %ctx.email, "settings_written");
    (
        StatusCode::OK,
        Json(ApiResponse::success(SettingsDto {
            fee: settings.fee,
            promptpay: settings.promptpay,
        })),
    )
        .into_response()
}
