use park_protocol::ProtocolError;
use park_storage::StorageError;

/// 投影错误。
#[derive(Debug, thiserror::Error)]
pub enum ProjectionError {
    /// 子树形状与协议不符
    #[error(transparent)]
    Decode(#[from] ProtocolError),
    #[error("storage error: {0}")]
    Storage(String),
    #[error("invalid settings: {0}")]
    Settings(String),
    #[error("node watch closed")]
    WatchClosed,
}

impl From<StorageError> for ProjectionError {
    fn from(err: StorageError) -> Self {
        Self::Storage(err.to_string())
    }
}
