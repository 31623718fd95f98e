//! 客户与值班人员查询。

use crate::error::ConsoleError;
use park_storage::{CarRecord, CustomerRecord, CustomerStore, StaffRecord, StaffStore};
use std::sync::Arc;

/// 客户及其登记车辆。
#[derive(Debug, Clone, PartialEq)]
pub struct CustomerDetail {
    pub customer: CustomerRecord,
    pub cars: Vec<CarRecord>,
}

#[derive(Clone)]
pub struct DirectoryService {
    customers: Arc<dyn CustomerStore>,
    staffs: Arc<dyn StaffStore>,
}

impl DirectoryService {
    pub fn new(customers: Arc<dyn CustomerStore>, staffs: Arc<dyn StaffStore>) -> Self {
        Self { customers, staffs }
    }

    pub async fn customers(&self) -> Result<Vec<CustomerRecord>, ConsoleError> {
        Ok(self.customers.list_customers().await?)
    }

    pub async fn customer(&self, uid: &str) -> Result<CustomerDetail, ConsoleError> {
        let customer = self
            .customers
            .find_customer(uid)
            .await?
            .ok_or_else(|| ConsoleError::not_found("customer", uid))?;
        let cars = self.customers.list_cars(uid).await?;
        Ok(CustomerDetail { customer, cars })
    }

    pub async fn staffs(&self) -> Result<Vec<StaffRecord>, ConsoleError> {
        Ok(self.staffs.list_staffs().await?)
    }
}
