//! 稳定的 DTO 与 API 响应契约。

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// 标准 API 响应封装。
#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: Option<T>,
    pub error: Option<ApiError>,
}

/// 失败响应的错误体。
#[derive(Debug, Serialize)]
pub struct ApiError {
    pub code: String,
    pub message: String,
}

impl<T> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    pub fn error(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(ApiError {
                code: code.into(),
                message: message.into(),
            }),
        }
    }
}

/// 指标快照。
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MetricsSnapshotDto {
    pub commands_dispatched: u64,
    pub command_failures_swallowed: u64,
    pub command_failures_surfaced: u64,
    pub command_skipped: u64,
    pub command_latency_ms_total: u64,
    pub command_latency_ms_count: u64,
    pub node_snapshots_projected: u64,
    pub node_projection_failures: u64,
    pub transactions_resolved: u64,
    pub report_claims: u64,
    pub report_claim_conflicts: u64,
    pub payment_transitions: u64,
}

/// 各模块在线状态。
#[derive(Debug, Serialize)]
pub struct ConnectivityDto {
    pub alpr: bool,
    pub controller: bool,
    pub state: bool,
}

/// Kiosk 展示视图；`view` 为视图名，其余字段按视图出现。
#[derive(Debug, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct KioskViewDto {
    pub view: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tid: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub license_number: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub candidate_key: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub checked_license_numbers: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub call_staff: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_car_pass: Option<bool>,
    /// 剩余秒数，仅作提示
    #[serde(skip_serializing_if = "Option::is_none")]
    pub countdown: Option<u64>,
}

/// 节点快照。
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeDto {
    pub node: String,
    /// 实时树原样子树
    pub info: Value,
    pub connectivity: ConnectivityDto,
    pub updated_at: String,
    pub view: KioskViewDto,
    pub transaction: Option<TransactionDto>,
}

/// 道闸命令请求体。
#[derive(Debug, Deserialize)]
pub struct BarricadeRequest {
    pub action: String,
}

/// 距离阈值请求体（厘米）。
#[derive(Debug, Deserialize)]
pub struct CmsRequest {
    pub value: i64,
}

/// 全局设置。
#[derive(Debug, Serialize, Deserialize)]
pub struct SettingsDto {
    pub fee: f64,
    pub promptpay: String,
}

/// 交易返回结构。
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionDto {
    pub tid: String,
    pub license_number: String,
    pub timestamp_in: String,
    pub timestamp_out: Option<String>,
    pub status: String,
    pub fee: f64,
    pub paid: f64,
    pub image_in: Option<String>,
    pub image_out: Option<String>,
    pub is_cancel: bool,
    pub is_edit: bool,
    pub add_by: Option<String>,
}

/// 新增交易请求体。
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddTransactionRequest {
    #[serde(alias = "license_number")]
    pub license_number: String,
    /// RFC 3339；缺省为当前时间
    #[serde(default, alias = "timestamp_in")]
    pub timestamp_in: Option<String>,
    #[serde(default, alias = "image_in")]
    pub image_in: Option<String>,
    #[serde(default)]
    pub manual: bool,
}

/// 新增交易结果：已下发给入口，或已写入。
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AddTransactionResultDto {
    pub dispatched: bool,
    pub license_number: String,
    pub transaction: Option<TransactionDto>,
}

/// 编辑交易请求体。
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EditTransactionRequest {
    #[serde(default, alias = "license_number")]
    pub license_number: Option<String>,
    #[serde(default, alias = "timestamp_in")]
    pub timestamp_in: Option<String>,
    #[serde(default, alias = "timestamp_out")]
    pub timestamp_out: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub fee: Option<f64>,
    #[serde(default)]
    pub paid: Option<f64>,
    #[serde(default, alias = "image_in")]
    pub image_in: Option<String>,
    #[serde(default, alias = "image_out")]
    pub image_out: Option<String>,
}

/// 支付返回结构。
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentDto {
    pub pid: String,
    pub tid: String,
    pub amount: f64,
    pub timestamp: String,
    pub status: String,
    pub reason: Option<String>,
    pub paid_by: Option<String>,
    pub is_edit: bool,
}

/// 支付操作请求体：approve / reject / refund。
#[derive(Debug, Deserialize)]
pub struct PaymentActionRequest {
    pub action: String,
}

/// 工单返回结构。
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportDto {
    pub rid: String,
    pub topic: String,
    pub description: String,
    pub customer: String,
    pub created_timestamp: String,
    pub status: String,
    pub t_ref: Option<String>,
    pub staff: Option<String>,
    pub closed_timestamp: Option<String>,
    pub response: Option<String>,
    pub is_edit: bool,
}

/// 回复发送者。
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatSenderDto {
    pub name: String,
    pub icon_url: Option<String>,
}

/// 聊天记录；`message` 为原样消息体。
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatDto {
    pub source: String,
    pub message_id: Option<String>,
    pub timestamp: String,
    pub message: Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sender: Option<ChatSenderDto>,
}

/// 工单详情。
#[derive(Debug, Serialize)]
pub struct ReportDetailDto {
    pub report: ReportDto,
    pub chats: Vec<ChatDto>,
}

/// 关闭工单请求体。
#[derive(Debug, Deserialize)]
pub struct CloseReportRequest {
    pub response: String,
}

/// 回复客户请求体。
#[derive(Debug, Deserialize)]
pub struct ReplyRequest {
    pub message: String,
}

/// 客户。
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomerDto {
    pub uid: String,
    pub display_name: String,
    pub photo_url: Option<String>,
}

/// 客户登记的车辆。
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CarDto {
    pub license_number: String,
    pub province: String,
    pub brand: String,
    pub color: String,
}

/// 客户详情。
#[derive(Debug, Serialize)]
pub struct CustomerDetailDto {
    pub customer: CustomerDto,
    pub cars: Vec<CarDto>,
}

/// 值班人员。
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StaffDto {
    pub email: String,
    pub name: String,
    pub role: String,
    pub disabled: bool,
    pub add_by: Option<String>,
}
