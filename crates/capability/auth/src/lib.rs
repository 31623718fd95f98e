//! 认证能力：校验控制台登录后签发的 ID Token。
//!
//! Token 由外部身份服务签发，这里只校验签名、过期、受众与签发方，
//! 并要求 `staff` 自定义声明为真。

mod jwt;

pub use jwt::{IdTokenVerifier, SECURE_TOKEN_ISSUER_PREFIX};

/// 认证相关错误。
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("token expired")]
    TokenExpired,
    #[error("token invalid")]
    TokenInvalid,
    /// 签名有效但不是值班人员；等价于强制退出登录
    #[error("not a staff")]
    NotStaff,
    #[error("invalid key: {0}")]
    Key(String),
}
