//! # 值班人员操作
//!
//! 控制台对文档存储与 Kiosk 的写操作：
//!
//! - [`TransactionService`]：新增（自动经入口或手工写入）、编辑、取消、出口放行
//! - [`PaymentService`]：待审核支付、批准/拒绝/退款
//! - [`ReportService`]：工单认领/接手、取消认领、回复、关闭
//! - [`DirectoryService`]：客户、车辆与值班人员查询
//!
//! 状态迁移都交给存储做条件写入，这里只做输入校验与结果判定。

mod directory;
mod error;
mod payment;
mod report;
mod transaction;

pub use directory::{CustomerDetail, DirectoryService};
pub use error::ConsoleError;
pub use payment::{PaymentAction, PaymentService, ParsePaymentActionError};
pub use report::{ReportDetail, ReportService};
pub use transaction::{
    AddOutcome, AddTransaction, EditTransaction, TransactionService, normalize_license_number,
};
