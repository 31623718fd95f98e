//! 验证辅助函数
//!
//! - ensure_id：文档 ID 非空
//! - ensure_path：实时树路径合法
//! - ensure_staff：操作人身份非空

use crate::error::StorageError;
use domain::StaffContext;

/// 验证文档 ID 非空
pub fn ensure_id(kind: &str, id: &str) -> Result<(), StorageError> {
    if id.trim().is_empty() {
        return Err(StorageError::new(format!("{kind} required")));
    }
    Ok(())
}

/// 验证实时树路径
///
/// 路径由 `/` 分隔，空路径表示根；段内不允许 RTDB 保留字符。
pub fn ensure_path(path: &str) -> Result<(), StorageError> {
    let trimmed = path.trim_matches('/');
    if trimmed.is_empty() {
        return Ok(());
    }
    for segment in trimmed.split('/') {
        if segment.is_empty() || segment.contains(['.', '$', '#', '[', ']']) {
            return Err(StorageError::new(format!("invalid path: {path}")));
        }
    }
    Ok(())
}

/// 验证操作人身份
pub fn ensure_staff(ctx: &StaffContext) -> Result<(), StorageError> {
    if ctx.email.trim().is_empty() {
        return Err(StorageError::new("staff email required"));
    }
    Ok(())
}
