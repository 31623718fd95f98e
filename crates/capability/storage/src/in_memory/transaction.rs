//! 交易内存存储实现

use crate::error::StorageError;
use crate::models::{TransactionCreate, TransactionRecord, TransactionStatus, TransactionUpdate};
use crate::traits::TransactionStore;
use crate::validation::ensure_id;
use std::collections::HashMap;
use std::sync::RwLock;

/// 交易内存存储
///
/// 使用 RwLock + HashMap 提供线程安全的内存存储。
pub struct InMemoryTransactionStore {
    transactions: RwLock<HashMap<String, TransactionRecord>>,
}

impl InMemoryTransactionStore {
    pub fn new() -> Self {
        Self {
            transactions: RwLock::new(HashMap::new()),
        }
    }

    /// 以给定记录预置存储（演示和测试用）
    pub fn with_records(records: impl IntoIterator<Item = TransactionRecord>) -> Self {
        let map = records
            .into_iter()
            .map(|record| (record.tid.clone(), record))
            .collect();
        Self {
            transactions: RwLock::new(map),
        }
    }
}

impl Default for InMemoryTransactionStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl TransactionStore for InMemoryTransactionStore {
    async fn list_transactions(&self) -> Result<Vec<TransactionRecord>, StorageError> {
        let mut items: Vec<TransactionRecord> = self
            .transactions
            .read()
            .map(|map| map.values().cloned().collect())
            .map_err(|_| StorageError::new("lock failed"))?;
        items.sort_by(|a, b| b.timestamp_in.cmp(&a.timestamp_in));
        Ok(items)
    }

    async fn find_transaction(
        &self,
        tid: &str,
    ) -> Result<Option<TransactionRecord>, StorageError> {
        ensure_id("tid", tid)?;
        let record = self
            .transactions
            .read()
            .map_err(|_| StorageError::new("lock failed"))?
            .get(tid)
            .cloned();
        Ok(record)
    }

    async fn find_active_by_license(
        &self,
        license_number: &str,
    ) -> Result<Option<TransactionRecord>, StorageError> {
        let record = self
            .transactions
            .read()
            .map_err(|_| StorageError::new("lock failed"))?
            .values()
            .find(|record| record.is_active() && record.license_number == license_number)
            .cloned();
        Ok(record)
    }

    async fn create_transaction(
        &self,
        input: TransactionCreate,
    ) -> Result<TransactionRecord, StorageError> {
        ensure_id("license_number", &input.license_number)?;
        let record = TransactionRecord {
            tid: uuid::Uuid::new_v4().simple().to_string(),
            license_number: input.license_number,
            timestamp_in: input.timestamp_in,
            timestamp_out: None,
            status: TransactionStatus::Unpaid,
            fee: 0.0,
            paid: 0.0,
            image_in: input.image_in,
            image_out: None,
            is_cancel: false,
            is_edit: false,
            add_by: Some(input.add_by),
        };
        let mut map = self
            .transactions
            .write()
            .map_err(|_| StorageError::new("lock failed"))?;
        map.insert(record.tid.clone(), record.clone());
        Ok(record)
    }

    async fn update_transaction(
        &self,
        tid: &str,
        update: TransactionUpdate,
    ) -> Result<Option<TransactionRecord>, StorageError> {
        ensure_id("tid", tid)?;
        let mut map = self
            .transactions
            .write()
            .map_err(|_| StorageError::new("lock failed"))?;
        let Some(record) = map.get_mut(tid) else {
            return Ok(None);
        };
        update.apply(record);
        Ok(Some(record.clone()))
    }
}
