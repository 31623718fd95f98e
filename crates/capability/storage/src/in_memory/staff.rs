//! 值班人员内存存储实现

use crate::error::StorageError;
use crate::models::StaffRecord;
use crate::traits::StaffStore;
use crate::validation::ensure_id;
use std::collections::HashMap;
use std::sync::RwLock;

/// 值班人员内存存储，以邮箱为键
pub struct InMemoryStaffStore {
    staffs: RwLock<HashMap<String, StaffRecord>>,
}

impl InMemoryStaffStore {
    pub fn new() -> Self {
        Self {
            staffs: RwLock::new(HashMap::new()),
        }
    }

    pub fn with_records(records: impl IntoIterator<Item = StaffRecord>) -> Self {
        let map = records
            .into_iter()
            .map(|record| (record.email.clone(), record))
            .collect();
        Self {
            staffs: RwLock::new(map),
        }
    }
}

impl Default for InMemoryStaffStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl StaffStore for InMemoryStaffStore {
    async fn list_staffs(&self) -> Result<Vec<StaffRecord>, StorageError> {
        let mut items: Vec<StaffRecord> = self
            .staffs
            .read()
            .map_err(|_| StorageError::new("lock failed"))?
            .values()
            .cloned()
            .collect();
        items.sort_by(|a, b| a.email.cmp(&b.email));
        Ok(items)
    }

    async fn find_staff(&self, email: &str) -> Result<Option<StaffRecord>, StorageError> {
        ensure_id("email", email)?;
        let record = self
            .staffs
            .read()
            .map_err(|_| StorageError::new("lock failed"))?
            .get(email)
            .cloned();
        Ok(record)
    }

    async fn upsert_staff(&self, record: StaffRecord) -> Result<StaffRecord, StorageError> {
        ensure_id("email", &record.email)?;
        let mut map = self
            .staffs
            .write()
            .map_err(|_| StorageError::new("lock failed"))?;
        map.insert(record.email.clone(), record.clone());
        Ok(record)
    }
}
