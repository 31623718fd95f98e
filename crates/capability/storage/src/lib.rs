//! # Park Storage 模块
//!
//! 提供两类存储抽象：
//!
//! 1. **实时树** (`realtime.rs`)：Kiosk 节点状态、命令通道、全局设置所在的 JSON 树，
//!    带变更通知
//! 2. **文档存储** (`traits.rs`)：交易、支付、工单、值班人员、客户
//!
//! ## 实现
//!
//! - [`in_memory`]：`RwLock` 内存实现，用于本地演示与测试
//! - [`firebase`]：Firebase Realtime Database REST 实现（读写 + 事件流）
//! - [`firestore`]：Firestore REST 文档存储，条件写入走服务端事务
//!
//! ## 一致性
//!
//! - 实时树写入是整值替换，同一路径后写覆盖先写
//! - 工单认领、支付状态迁移是条件写入：内存实现在单把写锁内完成检查与写入，
//!   Firestore 实现在同一个事务内读取、判定并提交

pub mod error;
pub mod firebase;
pub mod firestore;
pub mod in_memory;
pub mod models;
pub mod realtime;
pub mod traits;
pub mod validation;

pub use error::*;
pub use firebase::{FirebaseConfig, FirebaseRealtimeTree};
pub use firestore::{FirestoreConfig, FirestoreDocuments};
pub use models::*;
pub use realtime::*;
pub use traits::*;
pub use validation::*;

pub use in_memory::{
    InMemoryCustomerStore, InMemoryPaymentStore, InMemoryRealtimeTree, InMemoryReportStore, InMemoryStaffStore,
    InMemoryTransactionStore,
};
