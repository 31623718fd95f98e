//! 支付内存存储实现
//!
//! 键为 `(tid, pid)`，对应交易下的 `payments` 子集合。

use crate::error::StorageError;
use crate::models::{PaymentRecord, PaymentStatus};
use crate::traits::{ConditionalWrite, PaymentStore};
use crate::validation::ensure_id;
use std::collections::HashMap;
use std::sync::RwLock;

/// 支付内存存储
pub struct InMemoryPaymentStore {
    payments: RwLock<HashMap<(String, String), PaymentRecord>>,
}

impl InMemoryPaymentStore {
    pub fn new() -> Self {
        Self {
            payments: RwLock::new(HashMap::new()),
        }
    }
}

impl Default for InMemoryPaymentStore {
    fn default() -> Self {
        Self::new()
    }
}

fn newest_first(items: &mut [PaymentRecord]) {
    items.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
}

#[async_trait::async_trait]
impl PaymentStore for InMemoryPaymentStore {
    async fn list_payments(&self, tid: &str) -> Result<Vec<PaymentRecord>, StorageError> {
        ensure_id("tid", tid)?;
        let mut items: Vec<PaymentRecord> = self
            .payments
            .read()
            .map_err(|_| StorageError::new("lock failed"))?
            .values()
            .filter(|payment| payment.tid == tid)
            .cloned()
            .collect();
        newest_first(&mut items);
        Ok(items)
    }

    async fn list_pending_payments(&self) -> Result<Vec<PaymentRecord>, StorageError> {
        let mut items: Vec<PaymentRecord> = self
            .payments
            .read()
            .map_err(|_| StorageError::new("lock failed"))?
            .values()
            .filter(|payment| payment.status == PaymentStatus::Pending)
            .cloned()
            .collect();
        newest_first(&mut items);
        Ok(items)
    }

    async fn create_payment(&self, record: PaymentRecord) -> Result<PaymentRecord, StorageError> {
        ensure_id("tid", &record.tid)?;
        ensure_id("pid", &record.pid)?;
        let mut map = self
            .payments
            .write()
            .map_err(|_| StorageError::new("lock failed"))?;
        let key = (record.tid.clone(), record.pid.clone());
        if map.contains_key(&key) {
            return Err(StorageError::new("payment exists"));
        }
        map.insert(key, record.clone());
        Ok(record)
    }

    async fn transition_payment(
        &self,
        tid: &str,
        pid: &str,
        allowed_from: &[PaymentStatus],
        to: PaymentStatus,
    ) -> Result<ConditionalWrite<PaymentRecord>, StorageError> {
        ensure_id("tid", tid)?;
        ensure_id("pid", pid)?;
        let mut map = self
            .payments
            .write()
            .map_err(|_| StorageError::new("lock failed"))?;
        let Some(record) = map.get_mut(&(tid.to_string(), pid.to_string())) else {
            return Ok(ConditionalWrite::NotFound);
        };
        if !allowed_from.contains(&record.status) {
            return Ok(ConditionalWrite::Rejected(record.clone()));
        }
        record.status = to;
        record.is_edit = true;
        Ok(ConditionalWrite::Applied(record.clone()))
    }
}
