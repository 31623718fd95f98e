//! HTTP 响应辅助函数和 DTO 转换
//!
//! 错误响应：auth_error, not_staff_error, forbidden_error, bad_request_error,
//! not_found_error, projection_error, console_error
//!
//! DTO 转换：transaction_to_dto, payment_to_dto, report_to_dto, chat_to_dto,
//! customer_to_dto, car_to_dto, staff_to_dto, view_to_dto, connectivity_to_dto, metrics_to_dto

use api_contract::{
    ApiResponse, CarDto, ChatDto, ChatSenderDto, ConnectivityDto, CustomerDto, KioskViewDto,
    MetricsSnapshotDto, PaymentDto, ReportDto, StaffDto, TransactionDto,
};
use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use park_console::ConsoleError;
use park_interpret::KioskView;
use park_projection::{Connectivity, ProjectionError};
use park_protocol::format_timestamp;
use park_storage::{
    CarRecord, ChatRecord, CustomerRecord, PaymentRecord, ReportRecord, StaffRecord,
    TransactionRecord,
};
use park_telemetry::MetricsSnapshot;
use serde::Serialize;
use tracing::{error, warn};

fn error_response(status: StatusCode, code: &str, message: impl Into<String>) -> Response {
    (status, Json(ApiResponse::<()>::error(code, message.into()))).into_response()
}

/// 认证错误响应
pub fn auth_error(status: StatusCode) -> Response {
    error_response(status, "AUTH.UNAUTHORIZED", "unauthorized")
}

/// 身份有效但不是值班人员
pub fn not_staff_error() -> Response {
    error_response(StatusCode::FORBIDDEN, "AUTH.NOT_STAFF", "not a staff")
}

/// 禁止访问错误响应
pub fn forbidden_error() -> Response {
    error_response(StatusCode::FORBIDDEN, "AUTH.FORBIDDEN", "forbidden")
}

/// 错误请求响应
pub fn bad_request_error(message: impl Into<String>) -> Response {
    error_response(StatusCode::BAD_REQUEST, "INVALID.REQUEST", message)
}

/// 资源未找到错误响应
pub fn not_found_error() -> Response {
    error_response(StatusCode::NOT_FOUND, "RESOURCE.NOT_FOUND", "not found")
}

/// 节点投影错误响应；子树形状不符视为上游数据错误
pub fn projection_error(err: ProjectionError) -> Response {
    match err {
        ProjectionError::Decode(err) => {
            warn!(target: "park.api", error = %err, "node_decode_failed");
            error_response(StatusCode::BAD_GATEWAY, "NODE.DECODE_FAILED", err.to_string())
        }
        other => {
            error!(target: "park.api", error = %other, "projection_failed");
            error_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                "INTERNAL.ERROR",
                other.to_string(),
            )
        }
    }
}

/// 值班操作错误响应
pub fn console_error(err: ConsoleError) -> Response {
    match err {
        ConsoleError::Validation { field, message } => {
            bad_request_error(format!("{field}: {message}"))
        }
        ConsoleError::Conflict(message) => {
            error_response(StatusCode::CONFLICT, "RESOURCE.CONFLICT", message)
        }
        ConsoleError::NotFound { .. } => not_found_error(),
        ConsoleError::Storage(message) => {
            error!(target: "park.api", error = %message, "storage_failed");
            error_response(StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL.ERROR", message)
        }
        ConsoleError::Command(message) => {
            warn!(target: "park.api", error = %message, "command_failed");
            error_response(StatusCode::BAD_GATEWAY, "COMMAND.FAILED", message)
        }
    }
}

/// 枚举的序列化名（如 `System Fault`）
fn label<T: Serialize + std::fmt::Debug>(value: &T) -> String {
    match serde_json::to_value(value) {
        Ok(serde_json::Value::String(label)) => label,
        _ => format!("{value:?}"),
    }
}

/// TransactionRecord 转 TransactionDto
pub fn transaction_to_dto(record: TransactionRecord) -> TransactionDto {
    TransactionDto {
        status: label(&record.status),
        tid: record.tid,
        license_number: record.license_number,
        timestamp_in: format_timestamp(record.timestamp_in),
        timestamp_out: record.timestamp_out.map(format_timestamp),
        fee: record.fee,
        paid: record.paid,
        image_in: record.image_in,
        image_out: record.image_out,
        is_cancel: record.is_cancel,
        is_edit: record.is_edit,
        add_by: record.add_by,
    }
}

/// PaymentRecord 转 PaymentDto
pub fn payment_to_dto(record: PaymentRecord) -> PaymentDto {
    PaymentDto {
        status: label(&record.status),
        pid: record.pid,
        tid: record.tid,
        amount: record.amount,
        timestamp: format_timestamp(record.timestamp),
        reason: record.reason,
        paid_by: record.paid_by,
        is_edit: record.is_edit,
    }
}

/// ReportRecord 转 ReportDto
pub fn report_to_dto(record: ReportRecord) -> ReportDto {
    ReportDto {
        topic: label(&record.topic),
        status: label(&record.status),
        rid: record.rid,
        description: record.description,
        customer: record.customer,
        created_timestamp: format_timestamp(record.created_timestamp),
        t_ref: record.t_ref,
        staff: record.staff,
        closed_timestamp: record.closed_timestamp.map(format_timestamp),
        response: record.response,
        is_edit: record.is_edit,
    }
}

/// ChatRecord 转 ChatDto
pub fn chat_to_dto(record: ChatRecord) -> ChatDto {
    let timestamp = format_timestamp(record.timestamp());
    let (source, message_id, message, sender) = match record {
        ChatRecord::Received {
            message_id,
            message,
            ..
        } => ("received", Some(message_id), message, None),
        ChatRecord::Response {
            message_id,
            message,
            sender,
            ..
        } => ("response", message_id, message, sender),
    };
    ChatDto {
        source: source.to_string(),
        message_id,
        timestamp,
        message: serde_json::to_value(&message).unwrap_or(serde_json::Value::Null),
        sender: sender.map(|sender| ChatSenderDto {
            name: sender.name,
            icon_url: sender.icon_url,
        }),
    }
}

/// CustomerRecord 转 CustomerDto
pub fn customer_to_dto(record: CustomerRecord) -> CustomerDto {
    CustomerDto {
        uid: record.uid,
        display_name: record.display_name,
        photo_url: record.photo_url,
    }
}

pub fn car_to_dto(record: CarRecord) -> CarDto {
    CarDto {
        license_number: record.license_number,
        province: record.province,
        brand: record.brand,
        color: record.color,
    }
}

/// StaffRecord 转 StaffDto
pub fn staff_to_dto(record: StaffRecord) -> StaffDto {
    StaffDto {
        email: record.email,
        name: record.name,
        role: record.role,
        disabled: record.disabled,
        add_by: record.add_by,
    }
}

/// 在线状态转 DTO
pub fn connectivity_to_dto(connectivity: Connectivity) -> ConnectivityDto {
    ConnectivityDto {
        alpr: connectivity.alpr,
        controller: connectivity.controller,
        state: connectivity.state,
    }
}

/// KioskView 转 KioskViewDto
pub fn view_to_dto(view: KioskView) -> KioskViewDto {
    match view {
        KioskView::Unavailable => named("unavailable"),
        KioskView::Idle => named("idle"),
        KioskView::Detect {
            candidate_key,
            checked_license_numbers,
            countdown,
        } => KioskViewDto {
            candidate_key,
            checked_license_numbers,
            countdown,
            ..named("detect")
        },
        KioskView::Process { license_number } => KioskViewDto {
            license_number: Some(license_number),
            ..named("process")
        },
        KioskView::Get {
            tid,
            license_number,
        } => KioskViewDto {
            tid: Some(tid),
            license_number: Some(license_number),
            ..named("get")
        },
        KioskView::Payment {
            tid,
            call_staff,
            countdown,
        } => KioskViewDto {
            tid: Some(tid),
            call_staff: Some(call_staff),
            countdown,
            ..named("payment")
        },
        KioskView::Success { tid, is_car_pass } => KioskViewDto {
            tid: Some(tid),
            is_car_pass: Some(is_car_pass),
            ..named("success")
        },
        KioskView::PaymentRequired { tid } => KioskViewDto {
            tid: Some(tid),
            ..named("payment_required")
        },
        KioskView::LicenseActive { tid } => KioskViewDto {
            tid: Some(tid),
            ..named("license_active")
        },
        KioskView::Failed {
            reason,
            call_staff,
            countdown,
        } => KioskViewDto {
            reason: Some(reason),
            call_staff: Some(call_staff),
            countdown,
            ..named("failed")
        },
    }
}

fn named(view: &str) -> KioskViewDto {
    KioskViewDto {
        view: view.to_string(),
        ..KioskViewDto::default()
    }
}

/// 指标快照转 DTO
pub fn metrics_to_dto(snapshot: MetricsSnapshot) -> MetricsSnapshotDto {
    MetricsSnapshotDto {
        commands_dispatched: snapshot.commands_dispatched,
        command_failures_swallowed: snapshot.command_failures_swallowed,
        command_failures_surfaced: snapshot.command_failures_surfaced,
        command_skipped: snapshot.command_skipped,
        command_latency_ms_total: snapshot.command_latency_ms_total,
        command_latency_ms_count: snapshot.command_latency_ms_count,
        node_snapshots_projected: snapshot.node_snapshots_projected,
        node_projection_failures: snapshot.node_projection_failures,
        transactions_resolved: snapshot.transactions_resolved,
        report_claims: snapshot.report_claims,
        report_claim_conflicts: snapshot.report_claim_conflicts,
        payment_transitions: snapshot.payment_transitions,
    }
}
