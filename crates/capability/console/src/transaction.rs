//! 交易操作。

use crate::error::ConsoleError;
use chrono::{DateTime, Utc};
use domain::StaffContext;
use park_control::CommandDispatcher;
use park_storage::{
    TransactionCreate, TransactionRecord, TransactionStatus, TransactionStore, TransactionUpdate,
    ensure_staff,
};
use std::sync::Arc;
use tracing::info;

/// 车牌规范化：去掉所有空白。
pub fn normalize_license_number(value: &str) -> String {
    value.chars().filter(|c| !c.is_whitespace()).collect()
}

/// 新增交易输入。
#[derive(Debug, Clone)]
pub struct AddTransaction {
    pub license_number: String,
    pub timestamp_in: DateTime<Utc>,
    pub image_in: Option<String>,
    /// `false` 时交给入口状态机写入，控制台不写文档
    pub manual: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub enum AddOutcome {
    /// 已向入口下发 `set_process`
    Dispatched { license_number: String },
    Created(TransactionRecord),
}

/// 编辑交易输入；`None` 表示不修改。
#[derive(Debug, Clone, Default)]
pub struct EditTransaction {
    pub license_number: Option<String>,
    pub timestamp_in: Option<DateTime<Utc>>,
    pub timestamp_out: Option<DateTime<Utc>>,
    pub status: Option<TransactionStatus>,
    pub fee: Option<f64>,
    pub paid: Option<f64>,
    pub image_in: Option<String>,
    pub image_out: Option<String>,
}

#[derive(Clone)]
pub struct TransactionService {
    transactions: Arc<dyn TransactionStore>,
    dispatcher: CommandDispatcher,
}

impl TransactionService {
    pub fn new(transactions: Arc<dyn TransactionStore>, dispatcher: CommandDispatcher) -> Self {
        Self {
            transactions,
            dispatcher,
        }
    }

    pub async fn list(&self) -> Result<Vec<TransactionRecord>, ConsoleError> {
        Ok(self.transactions.list_transactions().await?)
    }

    pub async fn get(&self, tid: &str) -> Result<TransactionRecord, ConsoleError> {
        self.transactions
            .find_transaction(tid)
            .await?
            .ok_or_else(|| ConsoleError::not_found("transaction", tid))
    }

    /// 新增交易。
    pub async fn add(
        &self,
        ctx: &StaffContext,
        input: AddTransaction,
        now: DateTime<Utc>,
    ) -> Result<AddOutcome, ConsoleError> {
        ensure_staff(ctx).map_err(|err| ConsoleError::validation("add_by", err.message()))?;
        let license_number = normalize_license_number(&input.license_number);
        if license_number.is_empty() {
            return Err(ConsoleError::validation(
                "license_number",
                "license number required",
            ));
        }
        if input.timestamp_in > now {
            return Err(ConsoleError::validation(
                "timestamp_in",
                "timestamp in is after timestamp now",
            ));
        }
        if let Some(active) = self
            .transactions
            .find_active_by_license(&license_number)
            .await?
        {
            return Err(ConsoleError::Conflict(format!(
                "license number {license_number} is in the system ({})",
                active.tid
            )));
        }

        if !input.manual {
            self.dispatcher.set_entrance_process(&license_number).await?;
            info!(
                target: "park.console",
                staff = %ctx.email,
                license_number = %license_number,
                "transaction_add_dispatched"
            );
            return Ok(AddOutcome::Dispatched { license_number });
        }

        let record = self
            .transactions
            .create_transaction(TransactionCreate {
                license_number,
                timestamp_in: input.timestamp_in,
                image_in: input.image_in,
                add_by: ctx.email.clone(),
            })
            .await?;
        info!(
            target: "park.console",
            staff = %ctx.email,
            tid = %record.tid,
            "transaction_created"
        );
        Ok(AddOutcome::Created(record))
    }

    /// 编辑交易：只写入变化的字段；无变化不写。
    pub async fn edit(
        &self,
        ctx: &StaffContext,
        tid: &str,
        input: EditTransaction,
        now: DateTime<Utc>,
    ) -> Result<TransactionRecord, ConsoleError> {
        ensure_staff(ctx).map_err(|err| ConsoleError::validation("staff", err.message()))?;
        let current = self.get(tid).await?;
        let update = changes(&current, input);
        if update.is_empty() {
            return Ok(current);
        }

        let timestamp_in = update.timestamp_in.unwrap_or(current.timestamp_in);
        if update.timestamp_in.is_some() && timestamp_in > now {
            return Err(ConsoleError::validation(
                "timestamp_in",
                "timestamp in is after timestamp now",
            ));
        }
        if let Some(license_number) = &update.license_number {
            if license_number.is_empty() {
                return Err(ConsoleError::validation(
                    "license_number",
                    "license number required",
                ));
            }
        }
        let timestamp_out = update.timestamp_out.or(current.timestamp_out);
        if let Some(timestamp_out) = timestamp_out {
            if timestamp_out <= timestamp_in {
                return Err(ConsoleError::validation(
                    "timestamp_out",
                    "timestamp out is before timestamp in",
                ));
            }
        }

        let update = TransactionUpdate {
            is_edit: Some(true),
            ..update
        };
        let record = self
            .transactions
            .update_transaction(tid, update)
            .await?
            .ok_or_else(|| ConsoleError::not_found("transaction", tid))?;
        info!(target: "park.console", staff = %ctx.email, tid, "transaction_edited");
        Ok(record)
    }

    /// 取消交易；只做标记。
    pub async fn cancel(
        &self,
        ctx: &StaffContext,
        tid: &str,
    ) -> Result<TransactionRecord, ConsoleError> {
        ensure_staff(ctx).map_err(|err| ConsoleError::validation("staff", err.message()))?;
        let record = self
            .transactions
            .update_transaction(
                tid,
                TransactionUpdate {
                    is_cancel: Some(true),
                    status: Some(TransactionStatus::Cancel),
                    is_edit: Some(true),
                    ..TransactionUpdate::default()
                },
            )
            .await?
            .ok_or_else(|| ConsoleError::not_found("transaction", tid))?;
        info!(target: "park.console", staff = %ctx.email, tid, "transaction_cancelled");
        Ok(record)
    }

    /// 出口放行：让出口状态机直接进入 `get`。
    pub async fn exit(&self, ctx: &StaffContext, tid: &str) -> Result<(), ConsoleError> {
        ensure_staff(ctx).map_err(|err| ConsoleError::validation("staff", err.message()))?;
        let record = self.get(tid).await?;
        if !record.is_active() {
            return Err(ConsoleError::Conflict(format!(
                "transaction {tid} is not in the system"
            )));
        }
        self.dispatcher
            .set_exit_get(&record.tid, &record.license_number)
            .await?;
        info!(target: "park.console", staff = %ctx.email, tid, "transaction_exit_dispatched");
        Ok(())
    }
}

fn changes(current: &TransactionRecord, input: EditTransaction) -> TransactionUpdate {
    TransactionUpdate {
        license_number: input
            .license_number
            .map(|value| normalize_license_number(&value))
            .filter(|value| *value != current.license_number),
        timestamp_in: input
            .timestamp_in
            .filter(|value| *value != current.timestamp_in),
        timestamp_out: input
            .timestamp_out
            .filter(|value| Some(*value) != current.timestamp_out),
        status: input.status.filter(|value| *value != current.status),
        fee: input.fee.filter(|value| *value != current.fee),
        paid: input.paid.filter(|value| *value != current.paid),
        image_in: input
            .image_in
            .filter(|value| Some(value) != current.image_in.as_ref()),
        image_out: input
            .image_out
            .filter(|value| Some(value) != current.image_out.as_ref()),
        is_cancel: None,
        is_edit: None,
    }
}
