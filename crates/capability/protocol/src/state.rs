//! 入口/出口状态机发布的状态联合。
//!
//! `current_state` 是标签，`info` 的形状完全由标签决定：
//! 没有任何变体携带其他变体的字段，消费方必须对标签做穷尽匹配。
//! `idle` 与入口 `detect` 的 `info` 没有固定形状，原样保留。

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// 入口状态机的状态标签。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntranceState {
    Idle,
    Detect,
    Process,
    Success,
    Failed,
}

/// 出口状态机的状态标签。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExitState {
    Idle,
    Detect,
    Get,
    Payment,
    Success,
    Failed,
}

/// 每个状态共有的转移信息。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transition<S> {
    pub prev_state: S,
    pub next_state: S,
    /// 进入当前状态的时间（ISO-8601）
    pub enter_timestamp: String,
}

/// 入口 `process`：正在写入交易。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProcessInfo {
    pub license_number: String,
}

/// `success`：交易写入/关闭成功。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PassInfo {
    pub tid: String,
    pub is_car_pass: bool,
}

/// `failed`：失败原因，可选关联交易。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FailureInfo {
    pub reason: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tid: Option<String>,
    pub call_staff: bool,
}

/// 出口 `detect`：已比对过的车牌。
///
/// 实时库不保存空数组，空列表与整个 `info` 缺失等价。
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DetectInfo {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub checked_license_numbers: Vec<String>,
}

impl DetectInfo {
    pub fn is_empty(&self) -> bool {
        self.checked_license_numbers.is_empty()
    }
}

/// 出口 `get`：已找到交易。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GetInfo {
    pub tid: String,
    pub license_number: String,
}

/// 出口 `payment`：等待支付。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentInfo {
    pub tid: String,
    pub call_staff: bool,
}

/// 入口状态联合。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "current_state", rename_all = "snake_case")]
pub enum EntranceStatus {
    Idle {
        #[serde(flatten)]
        transition: Transition<EntranceState>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        info: Option<Value>,
    },
    Detect {
        #[serde(flatten)]
        transition: Transition<EntranceState>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        info: Option<Value>,
    },
    Process {
        #[serde(flatten)]
        transition: Transition<EntranceState>,
        info: ProcessInfo,
    },
    Success {
        #[serde(flatten)]
        transition: Transition<EntranceState>,
        info: PassInfo,
    },
    Failed {
        #[serde(flatten)]
        transition: Transition<EntranceState>,
        info: FailureInfo,
    },
}

impl EntranceStatus {
    pub fn current_state(&self) -> EntranceState {
        match self {
            EntranceStatus::Idle { .. } => EntranceState::Idle,
            EntranceStatus::Detect { .. } => EntranceState::Detect,
            EntranceStatus::Process { .. } => EntranceState::Process,
            EntranceStatus::Success { .. } => EntranceState::Success,
            EntranceStatus::Failed { .. } => EntranceState::Failed,
        }
    }

    pub fn transition(&self) -> &Transition<EntranceState> {
        match self {
            EntranceStatus::Idle { transition, .. }
            | EntranceStatus::Detect { transition, .. }
            | EntranceStatus::Process { transition, .. }
            | EntranceStatus::Success { transition, .. }
            | EntranceStatus::Failed { transition, .. } => transition,
        }
    }

    /// 当前状态 `info` 中携带的交易号。
    pub fn tid(&self) -> Option<&str> {
        match self {
            EntranceStatus::Idle { .. }
            | EntranceStatus::Detect { .. }
            | EntranceStatus::Process { .. } => None,
            EntranceStatus::Success { info, .. } => Some(info.tid.as_str()),
            EntranceStatus::Failed { info, .. } => info.tid.as_deref(),
        }
    }
}

/// 出口状态联合。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "current_state", rename_all = "snake_case")]
pub enum ExitStatus {
    Idle {
        #[serde(flatten)]
        transition: Transition<ExitState>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        info: Option<Value>,
    },
    Detect {
        #[serde(flatten)]
        transition: Transition<ExitState>,
        #[serde(default, skip_serializing_if = "DetectInfo::is_empty")]
        info: DetectInfo,
    },
    Get {
        #[serde(flatten)]
        transition: Transition<ExitState>,
        info: GetInfo,
    },
    Payment {
        #[serde(flatten)]
        transition: Transition<ExitState>,
        info: PaymentInfo,
    },
    Success {
        #[serde(flatten)]
        transition: Transition<ExitState>,
        info: PassInfo,
    },
    Failed {
        #[serde(flatten)]
        transition: Transition<ExitState>,
        info: FailureInfo,
    },
}

impl ExitStatus {
    pub fn current_state(&self) -> ExitState {
        match self {
            ExitStatus::Idle { .. } => ExitState::Idle,
            ExitStatus::Detect { .. } => ExitState::Detect,
            ExitStatus::Get { .. } => ExitState::Get,
            ExitStatus::Payment { .. } => ExitState::Payment,
            ExitStatus::Success { .. } => ExitState::Success,
            ExitStatus::Failed { .. } => ExitState::Failed,
        }
    }

    pub fn transition(&self) -> &Transition<ExitState> {
        match self {
            ExitStatus::Idle { transition, .. }
            | ExitStatus::Detect { transition, .. }
            | ExitStatus::Get { transition, .. }
            | ExitStatus::Payment { transition, .. }
            | ExitStatus::Success { transition, .. }
            | ExitStatus::Failed { transition, .. } => transition,
        }
    }

    pub fn tid(&self) -> Option<&str> {
        match self {
            ExitStatus::Idle { .. } | ExitStatus::Detect { .. } => None,
            ExitStatus::Get { info, .. } => Some(info.tid.as_str()),
            ExitStatus::Payment { info, .. } => Some(info.tid.as_str()),
            ExitStatus::Success { info, .. } => Some(info.tid.as_str()),
            ExitStatus::Failed { info, .. } => info.tid.as_deref(),
        }
    }
}
