//! 输入验证辅助函数
//!
//! - normalize_required：必填字段去空格并检查非空
//! - parse_node：路径中的节点名（大小写不敏感）
//! - parse_timestamp_field：RFC 3339 / ISO-8601 时间
//!
//! 失败返回 bad_request_error 响应

use crate::utils::response::bad_request_error;
use axum::response::Response;
use chrono::{DateTime, Utc};
use domain::Node;
use park_protocol::parse_timestamp;

/// 验证必填字段，去除空格并检查非空
pub fn normalize_required(value: String, field: &str) -> Result<String, Response> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(bad_request_error(format!("{field} required")));
    }
    Ok(trimmed.to_string())
}

/// 解析节点名：`entrance` / `exit`
pub fn parse_node(value: &str) -> Result<Node, Response> {
    value
        .parse::<Node>()
        .map_err(|err| bad_request_error(err.to_string()))
}

/// 解析时间字段
pub fn parse_timestamp_field(value: &str, field: &str) -> Result<DateTime<Utc>, Response> {
    parse_timestamp(value).ok_or_else(|| bad_request_error(format!("invalid {field}: {value}")))
}

/// 解析可选时间字段
pub fn parse_optional_timestamp(
    value: Option<&str>,
    field: &str,
) -> Result<Option<DateTime<Utc>>, Response> {
    value
        .map(|value| parse_timestamp_field(value, field))
        .transpose()
}
