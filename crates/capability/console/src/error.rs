use park_control::ControlError;
use park_storage::StorageError;

/// 值班人员操作错误。
#[derive(Debug, thiserror::Error)]
pub enum ConsoleError {
    /// 输入不合法（表单级错误）
    #[error("invalid {field}: {message}")]
    Validation {
        field: &'static str,
        message: String,
    },
    /// 违反一致性约束，未写入
    #[error("conflict: {0}")]
    Conflict(String),
    #[error("{kind} not found: {id}")]
    NotFound { kind: &'static str, id: String },
    #[error("storage error: {0}")]
    Storage(String),
    /// 影响交易的命令下发失败
    #[error("command failed: {0}")]
    Command(String),
}

impl ConsoleError {
    pub fn validation(field: &'static str, message: impl Into<String>) -> Self {
        Self::Validation {
            field,
            message: message.into(),
        }
    }

    pub fn not_found(kind: &'static str, id: impl Into<String>) -> Self {
        Self::NotFound {
            kind,
            id: id.into(),
        }
    }
}

impl From<StorageError> for ConsoleError {
    fn from(err: StorageError) -> Self {
        Self::Storage(err.to_string())
    }
}

impl From<ControlError> for ConsoleError {
    fn from(err: ControlError) -> Self {
        match err {
            ControlError::InvalidArgument(message) => Self::validation("command", message),
            ControlError::Dispatch { .. } => Self::Command(err.to_string()),
        }
    }
}
