pub mod node;

pub use node::{Module, Node, ParseNodeError};

/// 值班人员上下文：所有模块共享的执行上下文。
///
/// 由 ID Token 的自定义声明构造；`staff` 声明缺失的身份不会走到这里。
#[derive(Debug, Clone)]
pub struct StaffContext {
    pub uid: String,
    pub email: String,
    pub is_admin: bool,
}

impl StaffContext {
    /// 构造显式身份的值班人员上下文。
    pub fn new(uid: impl Into<String>, email: impl Into<String>, is_admin: bool) -> Self {
        Self {
            uid: uid.into(),
            email: email.into(),
            is_admin,
        }
    }
}
