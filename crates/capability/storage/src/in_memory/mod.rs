//! 内存存储实现模块
//!
//! 仅用于本地演示和测试。
//!
//! 包含以下实现：
//! - RealtimeTree: InMemoryRealtimeTree
//! - TransactionStore: InMemoryTransactionStore
//! - PaymentStore: InMemoryPaymentStore
//! - ReportStore: InMemoryReportStore
//! - StaffStore: InMemoryStaffStore
//! - CustomerStore: InMemoryCustomerStore

pub mod customer;
pub mod payment;
pub mod realtime;
pub mod report;
pub mod staff;
pub mod transaction;

pub use customer::*;
pub use payment::*;
pub use realtime::*;
pub use report::*;
pub use staff::*;
pub use transaction::*;
