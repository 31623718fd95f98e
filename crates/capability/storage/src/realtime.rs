//! 实时树端口
//!
//! 节点状态、命令通道与全局设置都挂在同一棵 JSON 树上。
//! 写入是整值替换（last-writer-wins），写 `null` 等同删除。

use crate::error::StorageError;
use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::broadcast;

/// 变更通知的缓冲深度；订阅方落后时只丢通知，不丢数据。
pub const TREE_CHANGE_CAPACITY: usize = 256;

/// 某个路径下发生了写入。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TreeChange {
    /// 规范化路径（无首尾 `/`，根为空串）
    pub path: String,
}

impl TreeChange {
    pub fn new(path: &str) -> Self {
        Self {
            path: normalize_path(path),
        }
    }

    /// 变更是否影响 `prefix` 子树（祖先或后代路径都算）。
    pub fn touches(&self, prefix: &str) -> bool {
        let prefix = normalize_path(prefix);
        is_within(&self.path, &prefix) || is_within(&prefix, &self.path)
    }
}

/// 去掉首尾 `/`。
pub fn normalize_path(path: &str) -> String {
    path.trim().trim_matches('/').to_string()
}

fn is_within(path: &str, ancestor: &str) -> bool {
    if ancestor.is_empty() {
        return true;
    }
    match path.strip_prefix(ancestor) {
        Some(rest) => rest.is_empty() || rest.starts_with('/'),
        None => false,
    }
}

/// 实时树访问接口
#[async_trait]
pub trait RealtimeTree: Send + Sync {
    /// 读取路径下的值；不存在返回 `None`
    async fn get(&self, path: &str) -> Result<Option<Value>, StorageError>;

    /// 整值替换写入
    async fn set(&self, path: &str, value: Value) -> Result<(), StorageError>;

    /// 订阅变更通知
    fn subscribe(&self) -> broadcast::Receiver<TreeChange>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn change_touches_ancestors_and_descendants() {
        let change = TreeChange::new("/entrance/state/status");
        assert!(change.touches("entrance"));
        assert!(change.touches("entrance/state/status/info"));
        assert!(change.touches(""));
        assert!(!change.touches("exit"));
        assert!(!change.touches("entrance/stat"));

        let root = TreeChange::new("/");
        assert!(root.touches("exit"));
    }
}
