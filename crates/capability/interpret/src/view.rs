//! 状态 → 展示视图。

use crate::countdown::{
    ENTRANCE_DETECT_DEADLINE, ENTRANCE_FAILED_DEADLINE, EXIT_DETECT_DEADLINE,
    EXIT_FAILED_DEADLINE, EXIT_PAYMENT_DEADLINE, countdown,
};
use chrono::{DateTime, Utc};
use park_protocol::{EntranceNodeInfo, EntranceStatus, ExitNodeInfo, ExitStatus, NodeInfo};
use park_storage::TransactionRecord;

/// Kiosk 展示视图。
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KioskView {
    /// 节点信息或状态数据缺失（fetch node info failed）
    Unavailable,
    Idle,
    /// 识别到车牌，等待确认（入口）或比对交易（出口）
    Detect {
        candidate_key: Option<String>,
        checked_license_numbers: Vec<String>,
        countdown: Option<u64>,
    },
    /// 入口正在写入交易
    Process { license_number: String },
    /// 出口已找到交易，正在检查支付
    Get { tid: String, license_number: String },
    /// 出口等待支付
    Payment {
        tid: String,
        call_staff: bool,
        countdown: Option<u64>,
    },
    /// 入口写入交易成功 / 出口关闭交易成功
    Success { tid: String, is_car_pass: bool },
    /// 入口失败：该车牌有上一次出场未付款的交易
    PaymentRequired { tid: String },
    /// 入口失败：该车牌已有在场交易
    LicenseActive { tid: String },
    /// 其他失败原因
    Failed {
        reason: String,
        call_staff: bool,
        countdown: Option<u64>,
    },
}

/// 只有与当前状态交易号一致的交易才视为已加载。
///
/// 订阅切换状态后，上一个状态查到的交易可能还没被替换。
pub fn matching_transaction<'a>(
    info: &NodeInfo,
    transaction: Option<&'a TransactionRecord>,
) -> Option<&'a TransactionRecord> {
    let tid = info.linked_tid()?;
    transaction.filter(|record| record.tid == tid)
}

/// 解释节点当前状态。
pub fn interpret(
    info: Option<&NodeInfo>,
    transaction: Option<&TransactionRecord>,
    now: DateTime<Utc>,
) -> KioskView {
    let Some(info) = info else {
        return KioskView::Unavailable;
    };
    let transaction = matching_transaction(info, transaction);
    match info {
        NodeInfo::Entrance(tree) => interpret_entrance(tree, transaction, now),
        NodeInfo::Exit(tree) => interpret_exit(tree, now),
    }
}

fn interpret_entrance(
    tree: &EntranceNodeInfo,
    transaction: Option<&TransactionRecord>,
    now: DateTime<Utc>,
) -> KioskView {
    let Some(status) = tree.state.as_ref().and_then(|state| state.status.as_ref()) else {
        return KioskView::Unavailable;
    };
    match status {
        EntranceStatus::Idle { .. } => KioskView::Idle,
        EntranceStatus::Detect { transition, .. } => KioskView::Detect {
            candidate_key: candidate_key(tree.alpr.as_ref()),
            checked_license_numbers: Vec::new(),
            countdown: countdown(&transition.enter_timestamp, ENTRANCE_DETECT_DEADLINE, now),
        },
        EntranceStatus::Process { info, .. } => KioskView::Process {
            license_number: info.license_number.clone(),
        },
        EntranceStatus::Success { info, .. } => KioskView::Success {
            tid: info.tid.clone(),
            is_car_pass: info.is_car_pass,
        },
        EntranceStatus::Failed { transition, info } => match (&info.tid, transaction) {
            (Some(tid), Some(record)) if record.timestamp_out.is_some() => {
                KioskView::PaymentRequired { tid: tid.clone() }
            }
            (Some(tid), Some(_)) => KioskView::LicenseActive { tid: tid.clone() },
            (tid, _) => KioskView::Failed {
                reason: info.reason.clone(),
                call_staff: info.call_staff,
                countdown: match tid {
                    Some(_) => None,
                    None => countdown(&transition.enter_timestamp, ENTRANCE_FAILED_DEADLINE, now),
                },
            },
        },
    }
}

fn interpret_exit(tree: &ExitNodeInfo, now: DateTime<Utc>) -> KioskView {
    let Some(status) = tree.state.as_ref().and_then(|state| state.status.as_ref()) else {
        return KioskView::Unavailable;
    };
    match status {
        ExitStatus::Idle { .. } => KioskView::Idle,
        ExitStatus::Detect { transition, info } => KioskView::Detect {
            candidate_key: candidate_key(tree.alpr.as_ref()),
            checked_license_numbers: info.checked_license_numbers.clone(),
            countdown: countdown(&transition.enter_timestamp, EXIT_DETECT_DEADLINE, now),
        },
        ExitStatus::Get { info, .. } => KioskView::Get {
            tid: info.tid.clone(),
            license_number: info.license_number.clone(),
        },
        ExitStatus::Payment { transition, info } => KioskView::Payment {
            tid: info.tid.clone(),
            call_staff: info.call_staff,
            countdown: countdown(&transition.enter_timestamp, EXIT_PAYMENT_DEADLINE, now),
        },
        ExitStatus::Success { info, .. } => KioskView::Success {
            tid: info.tid.clone(),
            is_car_pass: info.is_car_pass,
        },
        ExitStatus::Failed { transition, info } => KioskView::Failed {
            reason: info.reason.clone(),
            call_staff: info.call_staff,
            countdown: countdown(&transition.enter_timestamp, EXIT_FAILED_DEADLINE, now),
        },
    }
}

fn candidate_key(alpr: Option<&park_protocol::AlprModule>) -> Option<String> {
    alpr.and_then(|alpr| alpr.status.as_ref())
        .map(|status| status.candidate_key.clone())
        .filter(|key| !key.is_empty())
}
