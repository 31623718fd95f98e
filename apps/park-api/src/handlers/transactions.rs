//! 交易管理
//!
//! - GET /transactions
//! - POST /transactions：新增（`manual=false` 时交给入口状态机）
//! - GET /transactions/{tid}
//! - PUT /transactions/{tid}：改写
//! - POST /transactions/{tid}/cancel
//! - POST /transactions/{tid}/exit：出口放行
//! - GET /transactions/{tid}/payments

use crate::AppState;
use crate::middleware::require_staff;
use crate::utils::response::{bad_request_error, console_error, payment_to_dto, transaction_to_dto};
use crate::utils::{normalize_required, parse_optional_timestamp};
use api_contract::{
    AddTransactionRequest, AddTransactionResultDto, ApiResponse, EditTransactionRequest,
    PaymentDto, TransactionDto,
};
use axum::{
    Json,
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
};
use chrono::Utc;
use park_console::{AddOutcome, AddTransaction, EditTransaction};
use park_storage::TransactionStatus;

pub async fn list_transactions(State(state): State<AppState>, headers: HeaderMap) -> Response {
    if let Err(response) = require_staff(&state, &headers) {
        return response;
    }
    match state.transactions.list().await {
        Ok(records) => {
            let data: Vec<TransactionDto> = records.into_iter().map(transaction_to_dto).collect();
            (StatusCode::OK, Json(ApiResponse::success(data))).into_response()
        }
        Err(err) => console_error(err),
    }
}

pub async fn add_transaction(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(req): Json<AddTransactionRequest>,
) -> Response {
    let ctx = match require_staff(&state, &headers) {
        Ok(ctx) => ctx,
        Err(response) => return response,
    };
    let license_number = match normalize_required(req.license_number, "license_number") {
        Ok(value) => value,
        Err(response) => return response,
    };
    let now = Utc::now();
    let timestamp_in = match parse_optional_timestamp(req.timestamp_in.as_deref(), "timestamp_in")
    {
        Ok(value) => value.unwrap_or(now),
        Err(response) => return response,
    };
    let input = AddTransaction {
        license_number,
        timestamp_in,
        image_in: req.image_in,
        manual: req.manual,
    };
    match state.transactions.add(&ctx, input, now).await {
        Ok(AddOutcome::Dispatched { license_number }) => (
            StatusCode::ACCEPTED,
            Json(ApiResponse::success(AddTransactionResultDto {
                dispatched: true,
                license_number,
                transaction: None,
            })),
        )
            .into_response(),
        Ok(AddOutcome::Created(record)) => (
            StatusCode::CREATED,
            Json(ApiResponse::success(AddTransactionResultDto {
                dispatched: false,
                license_number: record.license_number.clone(),
                transaction: Some(transaction_to_dto(record)),
            })),
        )
            .into_response(),
        Err(err) => console_error(err),
    }
}

pub async fn get_transaction(
    State(state): State<AppState>,
    Path(tid): Path<String>,
    headers: HeaderMap,
) -> Response {
    if let Err(response) = require_staff(&state, &headers) {
        return response;
    }
    match state.transactions.get(&tid).await {
        Ok(record) => (
            StatusCode::OK,
            Json(ApiResponse::success(transaction_to_dto(record))),
        )
            .into_response(),
        Err(err) => console_error(err),
    }
}

pub async fn edit_transaction(
    State(state): State<AppState>,
    Path(tid): Path<String>,
    headers: HeaderMap,
    Json(req): Json<EditTransactionRequest>,
) -> Response {
    let ctx = match require_staff(&state, &headers) {
        Ok(ctx) => ctx,
        Err(response) => return response,
    };
    let input = match edit_input(req) {
        Ok(input) => input,
        Err(response) => return response,
    };
    match state.transactions.edit(&ctx, &tid, input, Utc::now()).await {
        Ok(record) => (
            StatusCode::OK,
            Json(ApiResponse::success(transaction_to_dto(record))),
        )
            .into_response(),
        Err(err) => console_error(err),
    }
}

fn edit_input(req: EditTransactionRequest) -> Result<EditTransaction, Response> {
    let status = match req.status {
        Some(status) => Some(parse_status(&status)?),
        None => None,
    };
    Ok(EditTransaction {
        license_number: req.license_number,
        timestamp_in: parse_optional_timestamp(req.timestamp_in.as_deref(), "timestamp_in")?,
        timestamp_out: parse_optional_timestamp(req.timestamp_out.as_deref(), "timestamp_out")?,
        status,
        fee: req.fee,
        paid: req.paid,
        image_in: req.image_in,
        image_out: req.image_out,
    })
}

fn parse_status(value: &str) -> Result<TransactionStatus, Response> {
    serde_json::from_value(serde_json::Value::String(value.trim().to_string()))
        .map_err(|_| bad_request_error(format!("invalid status: {value}")))
}

pub async fn cancel_transaction(
    State(state): State<AppState>,
    Path(tid): Path<String>,
    headers: HeaderMap,
) -> Response {
    let ctx = match require_staff(&state, &headers) {
        Ok(ctx) => ctx,
        Err(response) => return response,
    };
    match state.transactions.cancel(&ctx, &tid).await {
        Ok(record) => (
            StatusCode::OK,
            Json(ApiResponse::success(transaction_to_dto(record))),
        )
            .into_response(),
        Err(err) => console_error(err),
    }
}

/// 向出口下发 `set_get`，由出口状态机完成放行
pub async fn exit_transaction(
    State(state): State<AppState>,
    Path(tid): Path<String>,
    headers: HeaderMap,
) -> Response {
    let ctx = match require_staff(&state, &headers) {
        Ok(ctx) => ctx,
        Err(response) => return response,
    };
    match state.transactions.exit(&ctx, &tid).await {
        Ok(()) => (
            StatusCode::ACCEPTED,
            Json(ApiResponse::success(serde_json::json!({ "tid": tid }))),
        )
            .into_response(),
        Err(err) => console_error(err),
    }
}

pub async fn list_transaction_payments(
    State(state): State<AppState>,
    Path(tid): Path<String>,
    headers: HeaderMap,
) -> Response {
    if let Err(response) = require_staff(&state, &headers) {
        return response;
    }
    match state.payments.list(&tid).await {
        Ok(records) => {
            let data: Vec<PaymentDto> = records.into_iter().map(payment_to_dto).collect();
            (StatusCode::OK, Json(ApiResponse::success(data))).into_response()
        }
        Err(err) => console_error(err),
    }
}
