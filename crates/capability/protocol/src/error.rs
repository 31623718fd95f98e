//! 协议错误类型定义

/// 实时树编解码错误
#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    /// 子树形状与 schema 不符
    #[error("decode error at {path}: {message}")]
    Decode { path: String, message: String },

    /// 序列化失败
    #[error("encode error at {path}: {message}")]
    Encode { path: String, message: String },
}

impl ProtocolError {
    pub(crate) fn decode(path: impl Into<String>, err: serde_json::Error) -> Self {
        Self::Decode {
            path: path.into(),
            message: err.to_string(),
        }
    }

    pub(crate) fn encode(path: impl Into<String>, err: serde_json::Error) -> Self {
        Self::Encode {
            path: path.into(),
            message: err.to_string(),
        }
    }
}
