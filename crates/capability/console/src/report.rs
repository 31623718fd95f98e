//! 工单处理。

use crate::error::ConsoleError;
use chrono::{DateTime, Utc};
use domain::StaffContext;
use park_storage::{
    ChatMessage, ChatRecord, ChatSender, ClaimOutcome, ConditionalWrite, ReportRecord,
    ReportStatus, ReportStore, StaffRecord, StaffStore, ensure_staff,
};
use park_telemetry::{record_report_claim, record_report_claim_conflict};
use std::sync::Arc;
use tracing::{info, warn};

/// 工单及其聊天记录。
#[derive(Debug, Clone, PartialEq)]
pub struct ReportDetail {
    pub report: ReportRecord,
    pub chats: Vec<ChatRecord>,
}

#[derive(Clone)]
pub struct ReportService {
    reports: Arc<dyn ReportStore>,
    staffs: Arc<dyn StaffStore>,
}

impl ReportService {
    pub fn new(reports: Arc<dyn ReportStore>, staffs: Arc<dyn StaffStore>) -> Self {
        Self { reports, staffs }
    }

    pub async fn list(&self) -> Result<Vec<ReportRecord>, ConsoleError> {
        Ok(self.reports.list_reports().await?)
    }

    pub async fn get(&self, rid: &str) -> Result<ReportDetail, ConsoleError> {
        let report = self
            .reports
            .find_report(rid)
            .await?
            .ok_or_else(|| ConsoleError::not_found("report", rid))?;
        let chats = self.reports.list_chats(rid).await?;
        Ok(ReportDetail { report, chats })
    }

    async fn active_staff(&self, ctx: &StaffContext) -> Result<StaffRecord, ConsoleError> {
        ensure_staff(ctx).map_err(|err| ConsoleError::validation("staff", err.message()))?;
        match self.staffs.find_staff(&ctx.email).await? {
            Some(staff) if !staff.disabled => Ok(staff),
            _ => Err(ConsoleError::validation(
                "staff",
                format!("{} is not an active staff", ctx.email),
            )),
        }
    }

    /// 认领工单，已有认领人时由当前值班人员接手。认领人必须是未停用的值班人员。
    pub async fn claim(
        &self,
        ctx: &StaffContext,
        rid: &str,
    ) -> Result<ReportRecord, ConsoleError> {
        self.active_staff(ctx).await?;

        let conflict = match self.reports.claim_report(rid, &ctx.email).await? {
            ClaimOutcome::Claimed(record) => {
                record_report_claim();
                info!(target: "park.console", staff = %ctx.email, rid, "report_claimed");
                return Ok(record);
            }
            ClaimOutcome::NotFound => return Err(ConsoleError::not_found("report", rid)),
            ClaimOutcome::Unavailable(record) => format!("report {rid} is {:?}", record.status),
            ClaimOutcome::CustomerHasOpenReport { rid: open } => {
                format!("customer already has an open report ({open})")
            }
        };
        record_report_claim_conflict();
        warn!(target: "park.console", staff = %ctx.email, rid, reason = %conflict, "report_claim_rejected");
        Err(ConsoleError::Conflict(conflict))
    }

    pub async fn unclaim(
        &self,
        ctx: &StaffContext,
        rid: &str,
    ) -> Result<ReportRecord, ConsoleError> {
        match self.reports.unclaim_report(rid, &ctx.email).await? {
            ConditionalWrite::Applied(record) => {
                info!(target: "park.console", staff = %ctx.email, rid, "report_unclaimed");
                Ok(record)
            }
            ConditionalWrite::NotFound => Err(ConsoleError::not_found("report", rid)),
            ConditionalWrite::Rejected(record) => {
                let reason = match (record.status, record.staff) {
                    (ReportStatus::Closed, _) => format!("report {rid} is closed"),
                    (_, Some(owner)) => format!("report {rid} is claimed by {owner}"),
                    (_, None) => format!("report {rid} is not claimed"),
                };
                warn!(target: "park.console", staff = %ctx.email, rid, reason = %reason, "report_unclaim_rejected");
                Err(ConsoleError::Conflict(reason))
            }
        }
    }

    /// 以值班人员身份回复客户；只有处理中的工单可回复。
    pub async fn reply(
        &self,
        ctx: &StaffContext,
        rid: &str,
        text: &str,
        now: DateTime<Utc>,
    ) -> Result<ChatRecord, ConsoleError> {
        let text = text.trim();
        if text.is_empty() {
            return Err(ConsoleError::validation("message", "message required"));
        }
        let staff = self.active_staff(ctx).await?;
        let report = self
            .reports
            .find_report(rid)
            .await?
            .ok_or_else(|| ConsoleError::not_found("report", rid))?;
        if report.status != ReportStatus::Open {
            return Err(ConsoleError::Conflict(format!(
                "report {rid} is {:?}",
                report.status
            )));
        }
        let chat = ChatRecord::Response {
            message_id: None,
            timestamp: now,
            is_send: false,
            sender: Some(ChatSender {
                name: staff.name,
                icon_url: None,
            }),
            message: ChatMessage::Text {
                text: text.to_string(),
            },
        };
        self.reports.add_chat(rid, chat.clone()).await?;
        info!(target: "park.console", staff = %ctx.email, rid, "report_replied");
        Ok(chat)
    }

    /// 关闭工单；回复不能为空。
    pub async fn close(
        &self,
        ctx: &StaffContext,
        rid: &str,
        response: &str,
        now: DateTime<Utc>,
    ) -> Result<ReportRecord, ConsoleError> {
        let response = response.trim();
        if response.is_empty() {
            return Err(ConsoleError::validation("response", "response required"));
        }
        match self.reports.close_report(rid, response, now).await? {
            ConditionalWrite::Applied(record) => {
                info!(target: "park.console", staff = %ctx.email, rid, "report_closed");
                Ok(record)
            }
            ConditionalWrite::NotFound => Err(ConsoleError::not_found("report", rid)),
            ConditionalWrite::Rejected(record) => Err(ConsoleError::Conflict(format!(
                "report {rid} is {:?}",
                record.status
            ))),
        }
    }
}
