//! 进程内指标快照。
//!
//! - GET /metrics

use api_contract::ApiResponse;
use axum::{
    Json,
    extract::State,
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
};
use park_telemetry::metrics;

use crate::{AppState, middleware::require_staff, utils::response::metrics_to_dto};

pub async fn get_metrics(State(state): State<AppState>, headers: HeaderMap) -> Response {
    if let Err(response) = require_staff(&state, &headers) {
        return response;
    }
    let snapshot = metrics().snapshot();
    (
        StatusCode::OK,
        Json(ApiResponse::success(metrics_to_dto(snapshot))),
    )
        .into_response()
}
