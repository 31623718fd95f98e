//! 客户工单
//!
//! - GET /reports
//! - GET /reports/{rid}：工单 + 聊天记录
//! - POST /reports/{rid}/claim
//! - POST /reports/{rid}/unclaim：仅认领人
//! - POST /reports/{rid}/chats：以值班人员身份回复
//! - POST /reports/{rid}/close

use crate::AppState;
use crate::middleware::require_staff;
use crate::utils::response::{chat_to_dto, console_error, report_to_dto};
use api_contract::{ApiResponse, CloseReportRequest, ReplyRequest, ReportDetailDto, ReportDto};
use axum::{
    Json,
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
};
use chrono::Utc;
use park_console::ConsoleError;
use park_storage::ReportRecord;

fn report_response(result: Result<ReportRecord, ConsoleError>) -> Response {
    match result {
        Ok(record) => (
            StatusCode::OK,
            Json(ApiResponse::success(report_to_dto(record))),
        )
            .into_response(),
        Err(err) => console_error(err),
    }
}

pub async fn list_reports(State(state): State<AppState>, headers: HeaderMap) -> Response {
    if let Err(response) = require_staff(&state, &headers) {
        return response;
    }
    match state.reports.list().await {
        Ok(records) => {
            let data: Vec<ReportDto> = records.into_iter().map(report_to_dto).collect();
            (StatusCode::OK, Json(ApiResponse::success(data))).into_response()
        }
        Err(err) => console_error(err),
    }
}

pub async fn get_report(
    State(state): State<AppState>,
    Path(rid): Path<String>,
    headers: HeaderMap,
) -> Response {
    if let Err(response) = require_staff(&state, &headers) {
        return response;
    }
    match state.reports.get(&rid).await {
        Ok(detail) => {
            let data = ReportDetailDto {
                report: report_to_dto(detail.report),
                chats: detail.chats.into_iter().map(chat_to_dto).collect(),
            };
            (StatusCode::OK, Json(ApiResponse::success(data))).into_response()
        }
        Err(err) => console_error(err),
    }
}

/// 认领或接手工单；已关闭或客户已有进行中工单时返回 409
pub async fn claim_report(
    State(state): State<AppState>,
    Path(rid): Path<String>,
    headers: HeaderMap,
) -> Response {
    let ctx = match require_staff(&state, &headers) {
        Ok(ctx) => ctx,
        Err(response) => return response,
    };
    report_response(state.reports.claim(&ctx, &rid).await)
}

pub async fn unclaim_report(
    State(state): State<AppState>,
    Path(rid): Path<String>,
    headers: HeaderMap,
) -> Response {
    let ctx = match require_staff(&state, &headers) {
        Ok(ctx) => ctx,
        Err(response) => return response,
    };
    report_response(state.reports.unclaim(&ctx, &rid).await)
}

pub async fn close_report(
    State(state): State<AppState>,
    Path(rid): Path<String>,
    headers: HeaderMap,
    Json(req): Json<CloseReportRequest>,
) -> Response {
    let ctx = match require_staff(&state, &headers) {
        Ok(ctx) => ctx,
        Err(response) => return response,
    };
    report_response(
        state
            .reports
            .close(&ctx, &rid, &req.response, Utc::now())
            .await,
    )
}

pub async fn reply_report(
    State(state): State<AppState>,
    Path(rid): Path<String>,
    headers: HeaderMap,
    Json(req): Json<ReplyRequest>,
) -> Response {
    let ctx = match require_staff(&state, &headers) {
        Ok(ctx) => ctx,
        Err(response) => return response,
    };
    match state.reports.reply(&ctx, &rid, &req.message, Utc::now()).await {
        Ok(chat) => (StatusCode::CREATED, Json(ApiResponse::success(chat_to_dto(chat)))).into_response(),
        Err(err) => console_error(err),
    }
}
