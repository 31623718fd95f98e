//! 支付审核
//!
//! - GET /payments/pending：所有交易下待审核的支付，新到旧
//! - PUT /transactions/{tid}/payments/{pid}：approve / reject / refund

use crate::AppState;
use crate::middleware::require_staff;
use crate::utils::response::{bad_request_error, console_error, payment_to_dto};
use api_contract::{ApiResponse, PaymentActionRequest, PaymentDto};
use axum::{
    Json,
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
};
use park_console::PaymentAction;

pub async fn list_pending_payments(State(state): State<AppState>, headers: HeaderMap) -> Response {
    if let Err(response) = require_staff(&state, &headers) {
        return response;
    }
    match state.payments.pending().await {
        Ok(records) => {
            let data: Vec<PaymentDto> = records.into_iter().map(payment_to_dto).collect();
            (StatusCode::OK, Json(ApiResponse::success(data))).into_response()
        }
        Err(err) => console_error(err),
    }
}

pub async fn apply_payment_action(
    State(state): State<AppState>,
    Path((tid, pid)): Path<(String, String)>,
    headers: HeaderMap,
    Json(req): Json<PaymentActionRequest>,
) -> Response {
    let ctx = match require_staff(&state, &headers) {
        Ok(ctx) => ctx,
        Err(response) => return response,
    };
    let action = match req.action.parse::<PaymentAction>() {
        Ok(action) => action,
        Err(err) => return bad_request_error(err.to_string()),
    };
    match state.payments.apply(&ctx, &tid, &pid, action).await {
        Ok(record) => (
            StatusCode::OK,
            Json(ApiResponse::success(payment_to_dto(record))),
        )
            .into_response(),
        Err(err) => console_error(err),
    }
}
