//! 支付审核。

use crate::error::ConsoleError;
use domain::StaffContext;
use park_storage::{ConditionalWrite, PaymentRecord, PaymentStatus, PaymentStore, ensure_staff};
use park_telemetry::record_payment_transition;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use tracing::{info, warn};

const FROM_PENDING: &[PaymentStatus] = &[PaymentStatus::Pending];
const FROM_SUCCESS: &[PaymentStatus] = &[PaymentStatus::Success];

/// 值班人员对支付的操作。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PaymentAction {
    Approve,
    Reject,
    Refund,
}

impl PaymentAction {
    /// 允许的起始状态与目标状态。
    pub fn transition(self) -> (&'static [PaymentStatus], PaymentStatus) {
        match self {
            PaymentAction::Approve => (FROM_PENDING, PaymentStatus::Success),
            PaymentAction::Reject => (FROM_PENDING, PaymentStatus::Failed),
            PaymentAction::Refund => (FROM_SUCCESS, PaymentStatus::Refund),
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            PaymentAction::Approve => "approve",
            PaymentAction::Reject => "reject",
            PaymentAction::Refund => "refund",
        }
    }
}

impl fmt::Display for PaymentAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown payment action: {0}")]
pub struct ParsePaymentActionError(String);

impl FromStr for PaymentAction {
    type Err = ParsePaymentActionError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "approve" => Ok(PaymentAction::Approve),
            "reject" => Ok(PaymentAction::Reject),
            "refund" => Ok(PaymentAction::Refund),
            _ => Err(ParsePaymentActionError(value.to_string())),
        }
    }
}

#[derive(Clone)]
pub struct PaymentService {
    payments: Arc<dyn PaymentStore>,
}

impl PaymentService {
    pub fn new(payments: Arc<dyn PaymentStore>) -> Self {
        Self { payments }
    }

    /// 所有交易下的待审核支付。
    pub async fn pending(&self) -> Result<Vec<PaymentRecord>, ConsoleError> {
        Ok(self.payments.list_pending_payments().await?)
    }

    pub async fn list(&self, tid: &str) -> Result<Vec<PaymentRecord>, ConsoleError> {
        Ok(self.payments.list_payments(tid).await?)
    }

    pub async fn apply(
        &self,
        ctx: &StaffContext,
        tid: &str,
        pid: &str,
        action: PaymentAction,
    ) -> Result<PaymentRecord, ConsoleError> {
        ensure_staff(ctx).map_err(|err| ConsoleError::validation("staff", err.message()))?;
        let (allowed_from, to) = action.transition();
        match self
            .payments
            .transition_payment(tid, pid, allowed_from, to)
            .await?
        {
            ConditionalWrite::Applied(record) => {
                record_payment_transition();
                info!(
                    target: "park.console",
                    staff = %ctx.email,
                    tid,
                    pid,
                    action = %action,
                    "payment_transitioned"
                );
                Ok(record)
            }
            ConditionalWrite::NotFound => Err(ConsoleError::not_found("payment", pid)),
            ConditionalWrite::Rejected(record) => {
                warn!(
                    target: "park.console",
                    tid,
                    pid,
                    action = %action,
                    status = ?record.status,
                    "payment_transition_rejected"
                );
                Err(ConsoleError::Conflict(format!(
                    "cannot {action} payment in status {:?}",
                    record.status
                )))
            }
        }
    }
}
