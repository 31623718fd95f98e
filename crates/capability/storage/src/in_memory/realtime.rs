//! 实时树内存实现
//!
//! 用于本地演示和测试；整棵树保存在一个 JSON 值中。

use crate::error::StorageError;
use crate::realtime::{RealtimeTree, TREE_CHANGE_CAPACITY, TreeChange, normalize_path};
use crate::validation::ensure_path;
use serde_json::{Map, Value};
use std::sync::RwLock;
use tokio::sync::broadcast;

/// 实时树内存存储
pub struct InMemoryRealtimeTree {
    root: RwLock<Value>,
    changes: broadcast::Sender<TreeChange>,
}

impl InMemoryRealtimeTree {
    pub fn new() -> Self {
        Self::with_root(Value::Object(Map::new()))
    }

    /// 以给定树作为初始内容
    pub fn with_root(root: Value) -> Self {
        let (changes, _) = broadcast::channel(TREE_CHANGE_CAPACITY);
        Self {
            root: RwLock::new(root),
            changes,
        }
    }
}

impl Default for InMemoryRealtimeTree {
    fn default() -> Self {
        Self::new()
    }
}

fn segments(path: &str) -> Vec<String> {
    let path = normalize_path(path);
    if path.is_empty() {
        return Vec::new();
    }
    path.split('/').map(str::to_string).collect()
}

fn lookup<'a>(root: &'a Value, segments: &[String]) -> Option<&'a Value> {
    let mut current = root;
    for segment in segments {
        current = current.as_object()?.get(segment)?;
    }
    Some(current)
}

fn store(root: &mut Value, segments: &[String], value: Value) {
    let Some((last, parents)) = segments.split_last() else {
        *root = value;
        return;
    };
    let mut current = root;
    for segment in parents {
        if !current.is_object() {
            *current = Value::Object(Map::new());
        }
        current = match current {
            Value::Object(map) => map
                .entry(segment.clone())
                .or_insert_with(|| Value::Object(Map::new())),
            _ => return,
        };
    }
    if !current.is_object() {
        *current = Value::Object(Map::new());
    }
    if let Value::Object(map) = current {
        if value.is_null() {
            map.remove(last);
        } else {
            map.insert(last.clone(), value);
        }
    }
}

#[async_trait::async_trait]
impl RealtimeTree for InMemoryRealtimeTree {
    async fn get(&self, path: &str) -> Result<Option<Value>, StorageError> {
        ensure_path(path)?;
        let root = self
            .root
            .read()
            .map_err(|_| StorageError::new("lock failed"))?;
        Ok(lookup(&root, &segments(path))
            .filter(|value| !value.is_null())
            .cloned())
    }

    async fn set(&self, path: &str, value: Value) -> Result<(), StorageError> {
        ensure_path(path)?;
        {
            let mut root = self
                .root
                .write()
                .map_err(|_| StorageError::new("lock failed"))?;
            store(&mut root, &segments(path), value);
        }
        // 无订阅者时发送失败属正常情况
        let _ = self.changes.send(TreeChange::new(path));
        Ok(())
    }

    fn subscribe(&self) -> broadcast::Receiver<TreeChange> {
        self.changes.subscribe()
    }
}
