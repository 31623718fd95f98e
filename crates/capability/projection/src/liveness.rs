//! 模块在线判定。
//!
//! 心跳时间距当前不足阈值即视为在线；恰好等于阈值视为离线。
//! 心跳缺失或无法解析视为离线，未来时间视为在线。

use chrono::{DateTime, TimeDelta, Utc};
use park_protocol::{Heartbeat, NodeInfo, parse_timestamp};
use std::time::Duration;

/// 默认阈值。
pub const DEFAULT_LIVENESS_THRESHOLD: Duration = Duration::from_secs(15);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LivenessPolicy {
    threshold: TimeDelta,
}

impl LivenessPolicy {
    pub fn new(threshold: Duration) -> Self {
        Self {
            threshold: TimeDelta::from_std(threshold).unwrap_or(TimeDelta::MAX),
        }
    }

    pub fn from_seconds(seconds: u64) -> Self {
        Self::new(Duration::from_secs(seconds))
    }

    pub fn threshold(&self) -> TimeDelta {
        self.threshold
    }

    pub fn is_connected(&self, connected_timestamp: Option<&str>, now: DateTime<Utc>) -> bool {
        match connected_timestamp.and_then(parse_timestamp) {
            Some(seen_at) => now.signed_duration_since(seen_at) < self.threshold,
            None => false,
        }
    }

    pub fn is_module_connected<M: Heartbeat>(&self, module: Option<&M>, now: DateTime<Utc>) -> bool {
        self.is_connected(module.and_then(|module| module.connected_timestamp()), now)
    }

    /// 节点三个模块的在线状态。
    pub fn connectivity(&self, info: &NodeInfo, now: DateTime<Utc>) -> Connectivity {
        Connectivity {
            alpr: self.is_module_connected(info.alpr(), now),
            controller: self.is_module_connected(info.controller(), now),
            state: self.is_connected(info.state_connected_timestamp(), now),
        }
    }
}

impl Default for LivenessPolicy {
    fn default() -> Self {
        Self::new(DEFAULT_LIVENESS_THRESHOLD)
    }
}

/// 节点模块在线状态。
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Connectivity {
    pub alpr: bool,
    pub controller: bool,
    pub state: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(seconds_before: i64, now: DateTime<Utc>) -> String {
        (now - TimeDelta::seconds(seconds_before)).to_rfc3339()
    }

    #[test]
    fn threshold_is_strict() {
        let now = Utc.with_ymd_and_hms(2024, 5, 1, 10, 0, 0).unwrap();
        let policy = LivenessPolicy::default();
        assert!(policy.is_connected(Some(&at(1, now)), now));
        assert!(policy.is_connected(Some(&at(14, now)), now));
        assert!(!policy.is_connected(Some(&at(15, now)), now));
        assert!(!policy.is_connected(Some(&at(16, now)), now));
    }

    #[test]
    fn missing_or_garbage_is_disconnected() {
        let now = Utc::now();
        let policy = LivenessPolicy::default();
        assert!(!policy.is_connected(None, now));
        assert!(!policy.is_connected(Some("not a time"), now));
    }

    #[test]
    fn future_heartbeat_is_connected() {
        let now = Utc::now();
        let policy = LivenessPolicy::from_seconds(5);
        assert!(policy.is_connected(Some(&at(-30, now)), now));
    }
}
