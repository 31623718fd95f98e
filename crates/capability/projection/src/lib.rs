//! # 节点状态投影
//!
//! - [`NodeProjector::snapshot`]：一次性读取节点快照（类型化节点信息 + 在线状态）
//! - [`NodeProjector::watch`]：订阅节点，子树变化时整体替换快照
//! - [`NodeProjector::linked_transaction`]：按状态中的交易号查询关联交易
//! - [`LivenessPolicy`]：心跳新鲜度判定

mod error;
mod liveness;
mod projector;

pub use error::ProjectionError;
pub use liveness::{Connectivity, DEFAULT_LIVENESS_THRESHOLD, LivenessPolicy};
pub use projector::{NodeProjector, NodeSnapshot, NodeWatch};
