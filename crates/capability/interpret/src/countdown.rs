//! 倒计时推导。

use chrono::{DateTime, Utc};
use park_protocol::parse_timestamp;

/// 入口 `detect` 等待确认的秒数。
pub const ENTRANCE_DETECT_DEADLINE: u64 = 30;
/// 入口 `failed`（无交易号）回到空闲前的秒数。
pub const ENTRANCE_FAILED_DEADLINE: u64 = 10;
pub const EXIT_DETECT_DEADLINE: u64 = 60;
pub const EXIT_PAYMENT_DEADLINE: u64 = 120;
pub const EXIT_FAILED_DEADLINE: u64 = 10;

/// 剩余秒数：`deadline - floor(now - enter)`，不小于 0。
///
/// `enter_timestamp` 无法解析时返回 `None`；进入时间晚于 `now` 时按刚进入计算。
pub fn countdown(enter_timestamp: &str, deadline: u64, now: DateTime<Utc>) -> Option<u64> {
    let entered = parse_timestamp(enter_timestamp)?;
    let elapsed = (now - entered).num_seconds().max(0) as u64;
    Some(deadline.saturating_sub(elapsed))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeDelta, TimeZone};

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 1, 10, 0, 0).unwrap()
    }

    fn ago(millis: i64) -> String {
        (now() - TimeDelta::milliseconds(millis)).to_rfc3339()
    }

    #[test]
    fn five_seconds_into_thirty() {
        assert_eq!(countdown(&ago(5_000), 30, now()), Some(25));
    }

    #[test]
    fn partial_seconds_are_floored() {
        assert_eq!(countdown(&ago(5_900), 30, now()), Some(25));
    }

    #[test]
    fn clamps_at_zero() {
        assert_eq!(countdown(&ago(45_000), 30, now()), Some(0));
    }

    #[test]
    fn future_enter_counts_from_deadline() {
        assert_eq!(countdown(&ago(-3_000), 10, now()), Some(10));
    }

    #[test]
    fn unparsable_enter_timestamp() {
        assert_eq!(countdown("yesterday", 30, now()), None);
    }
}
