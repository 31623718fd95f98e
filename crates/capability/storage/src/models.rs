//! 数据模型
//!
//! 文档存储中的记录与更新结构：
//! - 交易：TransactionRecord, TransactionUpdate
//! - 支付：PaymentRecord（挂在交易下的子集合）
//! - 工单：ReportRecord, ChatRecord（挂在工单下的子集合）
//! - 值班人员：StaffRecord
//! - 客户：CustomerRecord, CarRecord（挂在客户下的子集合）

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// 交易状态。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TransactionStatus {
    Unpaid,
    Paid,
    Cancel,
}

/// 一次停车会话。只做标记，不物理删除。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransactionRecord {
    pub tid: String,
    pub license_number: String,
    pub timestamp_in: DateTime<Utc>,
    pub timestamp_out: Option<DateTime<Utc>>,
    pub status: TransactionStatus,
    pub fee: f64,
    pub paid: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_in: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_out: Option<String>,
    #[serde(default)]
    pub is_cancel: bool,
    /// 值班人员改写过的标记
    #[serde(default)]
    pub is_edit: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub add_by: Option<String>,
}

impl TransactionRecord {
    /// 仍在场内：未出场且未取消。
    pub fn is_active(&self) -> bool {
        self.timestamp_out.is_none() && !self.is_cancel
    }
}

/// 新建交易输入（tid 由存储分配）。
#[derive(Debug, Clone)]
pub struct TransactionCreate {
    pub license_number: String,
    pub timestamp_in: DateTime<Utc>,
    pub image_in: Option<String>,
    pub add_by: String,
}

/// 交易部分更新；`None` 字段保持不变。
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TransactionUpdate {
    pub license_number: Option<String>,
    pub timestamp_in: Option<DateTime<Utc>>,
    pub timestamp_out: Option<DateTime<Utc>>,
    pub status: Option<TransactionStatus>,
    pub fee: Option<f64>,
    pub paid: Option<f64>,
    pub image_in: Option<String>,
    pub image_out: Option<String>,
    pub is_cancel: Option<bool>,
    pub is_edit: Option<bool>,
}

impl TransactionUpdate {
    pub fn is_empty(&self) -> bool {
        *self == TransactionUpdate::default()
    }

    pub fn apply(self, record: &mut TransactionRecord) {
        if let Some(value) = self.license_number {
            record.license_number = value;
        }
        if let Some(value) = self.timestamp_in {
            record.timestamp_in = value;
        }
        if let Some(value) = self.timestamp_out {
            record.timestamp_out = Some(value);
        }
        if let Some(value) = self.status {
            record.status = value;
        }
        if let Some(value) = self.fee {
            record.fee = value;
        }
        if let Some(value) = self.paid {
            record.paid = value;
        }
        if let Some(value) = self.image_in {
            record.image_in = Some(value);
        }
        if let Some(value) = self.image_out {
            record.image_out = Some(value);
        }
        if let Some(value) = self.is_cancel {
            record.is_cancel = value;
        }
        if let Some(value) = self.is_edit {
            record.is_edit = value;
        }
    }
}

/// 支付状态。
///
/// 旧客户端会写入 `Approve` / `Reject`，读取时分别视为 `Success` / `Failed`。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PaymentStatus {
    Pending,
    #[serde(alias = "Approve")]
    Success,
    #[serde(alias = "Reject")]
    Failed,
    Process,
    Refund,
    Canceled,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaymentRecord {
    pub pid: String,
    pub tid: String,
    pub amount: f64,
    pub timestamp: DateTime<Utc>,
    pub status: PaymentStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    /// 付款客户 ID
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub paid_by: Option<String>,
    /// 值班人员改写过状态
    #[serde(default)]
    pub is_edit: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ReportTopic {
    Transaction,
    Payment,
    #[serde(rename = "System Fault")]
    SystemFault,
    Others,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ReportStatus {
    Pending,
    Open,
    Closed,
}

/// 客户工单。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportRecord {
    pub rid: String,
    pub topic: ReportTopic,
    pub description: String,
    /// 客户 ID
    pub customer: String,
    pub created_timestamp: DateTime<Utc>,
    pub status: ReportStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub t_ref: Option<String>,
    /// 认领人邮箱
    #[serde(default)]
    pub staff: Option<String>,
    #[serde(default)]
    pub closed_timestamp: Option<DateTime<Utc>>,
    #[serde(default)]
    pub response: Option<String>,
    #[serde(default)]
    pub is_edit: bool,
}

/// 聊天发送者。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatSender {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon_url: Option<String>,
}

/// 媒体内容托管方。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MediaProvider {
    /// 消息平台托管，需要经平台接口取回
    Line,
    External,
}

/// 媒体消息；`External` 时带内容地址。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MediaContent {
    pub provider: MediaProvider,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub preview_url: Option<String>,
}

/// 聊天消息内容。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ChatMessage {
    Text {
        text: String,
    },
    Image(MediaContent),
    Video(MediaContent),
    Audio(MediaContent),
    Location {
        title: String,
        address: String,
        latitude: f64,
        longitude: f64,
    },
    Others {
        kind: String,
    },
}

/// 工单聊天记录，按 `source` 区分客户消息与值班人员回复。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "source", rename_all = "snake_case")]
pub enum ChatRecord {
    Received {
        message_id: String,
        timestamp: DateTime<Utc>,
        #[serde(default)]
        unsend: bool,
        message: ChatMessage,
    },
    Response {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        message_id: Option<String>,
        timestamp: DateTime<Utc>,
        #[serde(default)]
        is_send: bool,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        sender: Option<ChatSender>,
        message: ChatMessage,
    },
}

impl ChatRecord {
    pub fn timestamp(&self) -> DateTime<Utc> {
        match self {
            ChatRecord::Received { timestamp, .. } | ChatRecord::Response { timestamp, .. } => {
                *timestamp
            }
        }
    }
}

/// 值班人员；文档 ID 为邮箱。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StaffRecord {
    pub email: String,
    pub name: String,
    pub role: String,
    #[serde(default)]
    pub disabled: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub add_by: Option<String>,
}

/// 客户；文档 ID 为消息平台用户 ID。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomerRecord {
    pub uid: String,
    #[serde(rename = "displayName")]
    pub display_name: String,
    #[serde(rename = "photoUrl", default)]
    pub photo_url: Option<String>,
}

/// 客户登记的车辆；文档 ID 为去空白后的车牌。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CarRecord {
    pub license_number: String,
    pub province: String,
    pub brand: String,
    pub color: String,
}
