//! 节点状态
//!
//! - GET /nodes/{node}：投影 + 在线状态 + 展示视图 + 关联交易
//! - GET /nodes/{node}/events：同一结构的 SSE 推送，订阅建立时先推一次当前快照
//!
//! 关联交易查询失败不影响视图：按“交易未加载”解释。

use crate::AppState;
use crate::middleware::require_staff;
use crate::utils::parse_node;
use crate::utils::response::{
    connectivity_to_dto, projection_error, transaction_to_dto, view_to_dto,
};
use api_contract::{ApiResponse, NodeDto};
use axum::{
    Json,
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    response::{
        IntoResponse, Response,
        sse::{Event, KeepAlive, Sse},
    },
};
use chrono::Utc;
use futures_util::stream;
use park_interpret::interpret;
use park_projection::{NodeSnapshot, ProjectionError};
use std::convert::Infallible;
use tracing::{debug, warn};

pub async fn get_node(
    State(state): State<AppState>,
    Path(node): Path<String>,
    headers: HeaderMap,
) -> Response {
    if let Err(response) = require_staff(&state, &headers) {
        return response;
    }
    let node = match parse_node(&node) {
        Ok(node) => node,
        Err(response) => return response,
    };
    let snapshot = match state.projector.snapshot(node).await {
        Ok(snapshot) => snapshot,
        Err(err) => return projection_error(err),
    };
    match node_dto(&state, snapshot).await {
        Ok(dto) => (StatusCode::OK, Json(ApiResponse::success(dto))).into_response(),
        Err(err) => projection_error(err),
    }
}

pub async fn node_events(
    State(state): State<AppState>,
    Path(node): Path<String>,
    headers: HeaderMap,
) -> Response {
    if let Err(response) = require_staff(&state, &headers) {
        return response;
    }
    let node = match parse_node(&node) {
        Ok(node) => node,
        Err(response) => return response,
    };
    let watch = match state.projector.watch(node).await {
        Ok(watch) => watch,
        Err(err) => return projection_error(err),
    };
    debug!(target: "park.api", node = %node, "node_events_opened");
    let initial = Some(watch.current());
    // 客户端断开时流被丢弃，NodeWatch 随之取消订阅
    let events = stream::unfold(
        (state, watch, initial),
        |(state, mut watch, pending)| async move {
            let snapshot = match pending {
                Some(snapshot) => snapshot,
                None => watch.changed().await.ok()?,
            };
            let event = match node_dto(&state, snapshot).await {
                Ok(dto) => Event::default()
                    .event("node")
                    .json_data(&dto)
                    .unwrap_or_else(|err| Event::default().event("error").data(err.to_string())),
                Err(err) => Event::default().event("error").data(err.to_string()),
            };
            Some((Ok::<Event, Infallible>(event), (state, watch, None)))
        },
    );
    Sse::new(events)
        .keep_alive(KeepAlive::default())
        .into_response()
}

/// 快照 → 返回结构：补上关联交易与展示视图。
async fn node_dto(state: &AppState, snapshot: NodeSnapshot) -> Result<NodeDto, ProjectionError> {
    let node = snapshot.info.node();
    let transaction = match state.projector.linked_transaction(&snapshot.info).await {
        Ok(transaction) => transaction,
        Err(err) => {
            warn!(target: "park.api", node = %node, error = %err, "linked_transaction_failed");
            None
        }
    };
    let info = snapshot.info.to_tree()?;
    let view = interpret(Some(&snapshot.info), transaction.as_ref(), Utc::now());
    Ok(NodeDto {
        node: node.path_segment().to_string(),
        info,
        connectivity: connectivity_to_dto(snapshot.connectivity),
        updated_at: snapshot.updated_at,
        view: view_to_dto(view),
        transaction: transaction.map(transaction_to_dto),
    })
}
