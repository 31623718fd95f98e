//! 客户内存存储实现

use crate::error::StorageError;
use crate::models::{CarRecord, CustomerRecord};
use crate::traits::CustomerStore;
use crate::validation::ensure_id;
use std::collections::HashMap;
use std::sync::RwLock;

/// 客户内存存储；车辆按客户 uid 分组
pub struct InMemoryCustomerStore {
    customers: RwLock<HashMap<String, CustomerRecord>>,
    cars: RwLock<HashMap<String, Vec<CarRecord>>>,
}

impl InMemoryCustomerStore {
    pub fn new() -> Self {
        Self {
            customers: RwLock::new(HashMap::new()),
            cars: RwLock::new(HashMap::new()),
        }
    }

    pub fn with_records(records: impl IntoIterator<Item = (CustomerRecord, Vec<CarRecord>)>) -> Self {
        let mut customers = HashMap::new();
        let mut cars = HashMap::new();
        for (customer, owned) in records {
            cars.insert(customer.uid.clone(), owned);
            customers.insert(customer.uid.clone(), customer);
        }
        Self {
            customers: RwLock::new(customers),
            cars: RwLock::new(cars),
        }
    }
}

impl Default for InMemoryCustomerStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl CustomerStore for InMemoryCustomerStore {
    async fn list_customers(&self) -> Result<Vec<CustomerRecord>, StorageError> {
        let mut items: Vec<CustomerRecord> = self
            .customers
            .read()
            .map_err(|_| StorageError::new("lock failed"))?
            .values()
            .cloned()
            .collect();
        items.sort_by(|a, b| a.display_name.cmp(&b.display_name).then_with(|| a.uid.cmp(&b.uid)));
        Ok(items)
    }

    async fn find_customer(&self, uid: &str) -> Result<Option<CustomerRecord>, StorageError> {
        ensure_id("uid", uid)?;
        let record = self
            .customers
            .read()
            .map_err(|_| StorageError::new("lock failed"))?
            .get(uid)
            .cloned();
        Ok(record)
    }

    async fn list_cars(&self, uid: &str) -> Result<Vec<CarRecord>, StorageError> {
        ensure_id("uid", uid)?;
        let mut items = self
            .cars
            .read()
            .map_err(|_| StorageError::new("lock failed"))?
            .get(uid)
            .cloned()
            .unwrap_or_default();
        items.sort_by(|a, b| a.license_number.cmp(&b.license_number));
        Ok(items)
    }
}
