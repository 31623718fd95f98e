//! 文档存储接口 Trait 定义
//!
//! - TransactionStore：交易
//! - PaymentStore：交易下的支付子集合
//! - ReportStore：工单与聊天子集合
//! - StaffStore：值班人员
//! - CustomerStore：客户与其车辆子集合（只读）
//!
//! 状态迁移类写入都是条件写入：检查与写入在存储内部一次完成，
//! 结果通过 [`ConditionalWrite`] / [`ClaimOutcome`] 返回给调用方判定。

use crate::error::StorageError;
use crate::models::{
    CarRecord, ChatRecord, CustomerRecord, PaymentRecord, PaymentStatus, ReportRecord, StaffRecord, TransactionCreate,
    TransactionRecord, TransactionUpdate,
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};

/// 条件写入结果
#[derive(Debug, Clone, PartialEq)]
pub enum ConditionalWrite<T> {
    /// 条件满足，已写入；携带写入后的记录
    Applied(T),
    /// 目标不存在
    NotFound,
    /// 条件不满足，未写入；携带当前记录
    Rejected(T),
}

/// 工单认领结果
#[derive(Debug, Clone, PartialEq)]
pub enum ClaimOutcome {
    Claimed(ReportRecord),
    NotFound,
    /// 工单已关闭
    Unavailable(ReportRecord),
    /// 同一客户已有另一张处理中的工单
    CustomerHasOpenReport { rid: String },
}

/// 交易存储接口
#[async_trait]
pub trait TransactionStore: Send + Sync {
    /// 按入场时间倒序列出
    async fn list_transactions(&self) -> Result<Vec<TransactionRecord>, StorageError>;

    async fn find_transaction(&self, tid: &str)
    -> Result<Option<TransactionRecord>, StorageError>;

    /// 查找仍在场内的同牌照交易
    async fn find_active_by_license(
        &self,
        license_number: &str,
    ) -> Result<Option<TransactionRecord>, StorageError>;

    /// 创建交易，tid 由存储分配
    async fn create_transaction(
        &self,
        input: TransactionCreate,
    ) -> Result<TransactionRecord, StorageError>;

    /// 部分更新；不存在返回 `None`
    async fn update_transaction(
        &self,
        tid: &str,
        update: TransactionUpdate,
    ) -> Result<Option<TransactionRecord>, StorageError>;
}

/// 支付存储接口
#[async_trait]
pub trait PaymentStore: Send + Sync {
    /// 某笔交易的支付，按时间倒序
    async fn list_payments(&self, tid: &str) -> Result<Vec<PaymentRecord>, StorageError>;

    /// 跨交易查询待审核支付
    async fn list_pending_payments(&self) -> Result<Vec<PaymentRecord>, StorageError>;

    async fn create_payment(&self, record: PaymentRecord) -> Result<PaymentRecord, StorageError>;

    /// 当前状态属于 `allowed_from` 时迁移到 `to`
    async fn transition_payment(
        &self,
        tid: &str,
        pid: &str,
        allowed_from: &[PaymentStatus],
        to: PaymentStatus,
    ) -> Result<ConditionalWrite<PaymentRecord>, StorageError>;
}

/// 工单存储接口
#[async_trait]
pub trait ReportStore: Send + Sync {
    /// 按创建时间倒序列出
    async fn list_reports(&self) -> Result<Vec<ReportRecord>, StorageError>;

    async fn find_report(&self, rid: &str) -> Result<Option<ReportRecord>, StorageError>;

    async fn create_report(&self, record: ReportRecord) -> Result<ReportRecord, StorageError>;

    /// 认领或接手。
    ///
    /// 无认领人时要求客户没有其他处理中工单；已有认领人时直接转给 `staff`。
    /// 已关闭的工单不可认领。
    async fn claim_report(&self, rid: &str, staff: &str) -> Result<ClaimOutcome, StorageError>;

    /// 取消认领：仅当前认领人可操作，且工单未关闭
    async fn unclaim_report(
        &self,
        rid: &str,
        staff: &str,
    ) -> Result<ConditionalWrite<ReportRecord>, StorageError>;

    /// 关闭：处理中时写入回复与关闭时间
    async fn close_report(
        &self,
        rid: &str,
        response: &str,
        closed_at: DateTime<Utc>,
    ) -> Result<ConditionalWrite<ReportRecord>, StorageError>;

    /// 聊天记录，按时间正序
    async fn list_chats(&self, rid: &str) -> Result<Vec<ChatRecord>, StorageError>;

    async fn add_chat(&self, rid: &str, chat: ChatRecord) -> Result<(), StorageError>;
}

/// 值班人员存储接口
#[async_trait]
pub trait StaffStore: Send + Sync {
    async fn list_staffs(&self) -> Result<Vec<StaffRecord>, StorageError>;

    async fn find_staff(&self, email: &str) -> Result<Option<StaffRecord>, StorageError>;

    async fn upsert_staff(&self, record: StaffRecord) -> Result<StaffRecord, StorageError>;
}

/// 客户存储接口
#[async_trait]
pub trait CustomerStore: Send + Sync {
    async fn list_customers(&self) -> Result<Vec<CustomerRecord>, StorageError>;

    async fn find_customer(&self, uid: &str) -> Result<Option<CustomerRecord>, StorageError>;

    /// 客户登记的车辆，按车牌排序
    async fn list_cars(&self, uid: &str) -> Result<Vec<CarRecord>, StorageError>;
}
