//! 工单内存存储实现
//!
//! 认领时“客户是否已有处理中工单”的检查与写入在同一把写锁内完成，
//! 并发的首次认领最多一个成功。

use crate::error::StorageError;
use crate::models::{ChatRecord, ReportRecord, ReportStatus};
use crate::traits::{ClaimOutcome, ConditionalWrite, ReportStore};
use crate::validation::ensure_id;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::RwLock;

/// 工单内存存储
pub struct InMemoryReportStore {
    reports: RwLock<HashMap<String, ReportRecord>>,
    chats: RwLock<HashMap<String, Vec<ChatRecord>>>,
}

impl InMemoryReportStore {
    pub fn new() -> Self {
        Self {
            reports: RwLock::new(HashMap::new()),
            chats: RwLock::new(HashMap::new()),
        }
    }
}

impl Default for InMemoryReportStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl ReportStore for InMemoryReportStore {
    async fn list_reports(&self) -> Result<Vec<ReportRecord>, StorageError> {
        let mut items: Vec<ReportRecord> = self
            .reports
            .read()
            .map_err(|_| StorageError::new("lock failed"))?
            .values()
            .cloned()
            .collect();
        items.sort_by(|a, b| b.created_timestamp.cmp(&a.created_timestamp));
        Ok(items)
    }

    async fn find_report(&self, rid: &str) -> Result<Option<ReportRecord>, StorageError> {
        ensure_id("rid", rid)?;
        let record = self
            .reports
            .read()
            .map_err(|_| StorageError::new("lock failed"))?
            .get(rid)
            .cloned();
        Ok(record)
    }

    async fn create_report(&self, record: ReportRecord) -> Result<ReportRecord, StorageError> {
        ensure_id("rid", &record.rid)?;
        let mut map = self
            .reports
            .write()
            .map_err(|_| StorageError::new("lock failed"))?;
        if map.contains_key(&record.rid) {
            return Err(StorageError::new("report exists"));
        }
        map.insert(record.rid.clone(), record.clone());
        Ok(record)
    }

    async fn claim_report(&self, rid: &str, staff: &str) -> Result<ClaimOutcome, StorageError> {
        ensure_id("rid", rid)?;
        ensure_id("staff", staff)?;
        let mut map = self
            .reports
            .write()
            .map_err(|_| StorageError::new("lock failed"))?;
        let Some(current) = map.get(rid) else {
            return Ok(ClaimOutcome::NotFound);
        };
        if current.status == ReportStatus::Closed {
            return Ok(ClaimOutcome::Unavailable(current.clone()));
        }
        if current.staff.is_none() {
            let customer = current.customer.clone();
            if let Some(open) = map.values().find(|report| {
                report.rid != rid
                    && report.customer == customer
                    && report.status == ReportStatus::Open
            }) {
                return Ok(ClaimOutcome::CustomerHasOpenReport {
                    rid: open.rid.clone(),
                });
            }
        }
        let Some(record) = map.get_mut(rid) else {
            return Ok(ClaimOutcome::NotFound);
        };
        record.staff = Some(staff.to_string());
        record.status = ReportStatus::Open;
        record.is_edit = true;
        Ok(ClaimOutcome::Claimed(record.clone()))
    }

    async fn unclaim_report(
        &self,
        rid: &str,
        staff: &str,
    ) -> Result<ConditionalWrite<ReportRecord>, StorageError> {
        ensure_id("rid", rid)?;
        ensure_id("staff", staff)?;
        let mut map = self
            .reports
            .write()
            .map_err(|_| StorageError::new("lock failed"))?;
        let Some(record) = map.get_mut(rid) else {
            return Ok(ConditionalWrite::NotFound);
        };
        if record.status == ReportStatus::Closed || record.staff.as_deref() != Some(staff) {
            return Ok(ConditionalWrite::Rejected(record.clone()));
        }
        record.staff = None;
        record.status = ReportStatus::Pending;
        record.is_edit = true;
        Ok(ConditionalWrite::Applied(record.clone()))
    }

    async fn close_report(
        &self,
        rid: &str,
        response: &str,
        closed_at: DateTime<Utc>,
    ) -> Result<ConditionalWrite<ReportRecord>, StorageError> {
        ensure_id("rid", rid)?;
        let mut map = self
            .reports
            .write()
            .map_err(|_| StorageError::new("lock failed"))?;
        let Some(record) = map.get_mut(rid) else {
            return Ok(ConditionalWrite::NotFound);
        };
        if record.status != ReportStatus::Open {
            return Ok(ConditionalWrite::Rejected(record.clone()));
        }
        record.status = ReportStatus::Closed;
        record.response = Some(response.to_string());
        record.closed_timestamp = Some(closed_at);
        record.is_edit = true;
        Ok(ConditionalWrite::Applied(record.clone()))
    }

    async fn list_chats(&self, rid: &str) -> Result<Vec<ChatRecord>, StorageError> {
        ensure_id("rid", rid)?;
        let mut items = self
            .chats
            .read()
            .map_err(|_| StorageError::new("lock failed"))?
            .get(rid)
            .cloned()
            .unwrap_or_default();
        items.sort_by_key(ChatRecord::timestamp);
        Ok(items)
    }

    async fn add_chat(&self, rid: &str, chat: ChatRecord) -> Result<(), StorageError> {
        ensure_id("rid", rid)?;
        self.chats
            .write()
            .map_err(|_| StorageError::new("lock failed"))?
            .entry(rid.to_string())
            .or_default()
            .push(chat);
        Ok(())
    }
}
