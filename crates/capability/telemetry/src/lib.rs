//! 追踪、请求 ID 与进程内指标。

use std::sync::OnceLock;
use std::sync::atomic::{AtomicU64, Ordering};
use tracing_subscriber::{EnvFilter, fmt};

/// 请求级追踪标识。
#[derive(Debug, Clone)]
pub struct RequestIds {
    pub request_id: String,
    pub trace_id: String,
}

/// 指标快照。
#[derive(Debug, Clone, Copy, Default)]
pub struct MetricsSnapshot {
    pub commands_dispatched: u64,
    pub command_failures_swallowed: u64,
    pub command_failures_surfaced: u64,
    pub command_skipped: u64,
    pub command_latency_ms_total: u64,
    pub command_latency_ms_count: u64,
    pub node_snapshots_projected: u64,
    pub node_projection_failures: u64,
    pub transactions_resolved: u64,
    pub report_claims: u64,
    pub report_claim_conflicts: u64,
    pub payment_transitions: u64,
}

/// 进程内指标。
pub struct TelemetryMetrics {
    commands_dispatched: AtomicU64,
    command_failures_swallowed: AtomicU64,
    command_failures_surfaced: AtomicU64,
    command_skipped: AtomicU64,
    command_latency_ms_total: AtomicU64,
    command_latency_ms_count: AtomicU64,
    node_snapshots_projected: AtomicU64,
    node_projection_failures: AtomicU64,
    transactions_resolved: AtomicU64,
    report_claims: AtomicU64,
    report_claim_conflicts: AtomicU64,
    payment_transitions: AtomicU64,
}

impl TelemetryMetrics {
    pub fn new() -> Self {
        Self {
            commands_dispatched: AtomicU64::new(0),
            command_failures_swallowed: AtomicU64::new(0),
            command_failures_surfaced: AtomicU64::new(0),
            command_skipped: AtomicU64::new(0),
            command_latency_ms_total: AtomicU64::new(0),
            command_latency_ms_count: AtomicU64::new(0),
            node_snapshots_projected: AtomicU64::new(0),
            node_projection_failures: AtomicU64::new(0),
            transactions_resolved: AtomicU64::new(0),
            report_claims: AtomicU64::new(0),
            report_claim_conflicts: AtomicU64::new(0),
            payment_transitions: AtomicU64::new(0),
        }
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            commands_dispatched: self.commands_dispatched.load(Ordering::Relaxed),
            command_failures_swallowed: self.command_failures_swallowed.load(Ordering::Relaxed),
            command_failures_surfaced: self.command_failures_surfaced.load(Ordering::Relaxed),
            command_skipped: self.command_skipped.load(Ordering::Relaxed),
            command_latency_ms_total: self.command_latency_ms_total.load(Ordering::Relaxed),
            command_latency_ms_count: self.command_latency_ms_count.load(Ordering::Relaxed),
            node_snapshots_projected: self.node_snapshots_projected.load(Ordering::Relaxed),
            node_projection_failures: self.node_projection_failures.load(Ordering::Relaxed),
            transactions_resolved: self.transactions_resolved.load(Ordering::Relaxed),
            report_claims: self.report_claims.load(Ordering::Relaxed),
            report_claim_conflicts: self.report_claim_conflicts.load(Ordering::Relaxed),
            payment_transitions: self.payment_transitions.load(Ordering::Relaxed),
        }
    }
}

impl Default for TelemetryMetrics {
    fn default() -> Self {
        Self::new()
    }
}

static METRICS: OnceLock<TelemetryMetrics> = OnceLock::new();

/// 获取全局指标实例。
pub fn metrics() -> &'static TelemetryMetrics {
    METRICS.get_or_init(TelemetryMetrics::new)
}

/// 初始化 tracing（默认 info）。
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = fmt().with_env_filter(filter).try_init();
}

/// 生成新的 request_id 与 trace_id。
pub fn new_request_ids() -> RequestIds {
    RequestIds {
        request_id: uuid::Uuid::new_v4().to_string(),
        trace_id: uuid::Uuid::new_v4().to_string(),
    }
}

/// 记录命令写入成功次数。
pub fn record_command_dispatched() {
    metrics().commands_dispatched.fetch_add(1, Ordering::Relaxed);
}

/// 记录尽力而为命令的失败（已记录日志并吞掉）。
pub fn record_command_failure_swallowed() {
    metrics()
        .command_failures_swallowed
        .fetch_add(1, Ordering::Relaxed);
}

/// 记录返回给调用方的命令失败。
pub fn record_command_failure_surfaced() {
    metrics()
        .command_failures_surfaced
        .fetch_add(1, Ordering::Relaxed);
}

/// 记录参数非法而未写入的命令。
pub fn record_command_skipped() {
    metrics().command_skipped.fetch_add(1, Ordering::Relaxed);
}

/// 记录命令写入耗时（毫秒）。
pub fn record_command_latency_ms(latency_ms: u64) {
    let metrics = metrics();
    metrics
        .command_latency_ms_total
        .fetch_add(latency_ms, Ordering::Relaxed);
    metrics
        .command_latency_ms_count
        .fetch_add(1, Ordering::Relaxed);
}

/// 记录节点快照投影次数。
pub fn record_node_snapshot() {
    metrics()
        .node_snapshots_projected
        .fetch_add(1, Ordering::Relaxed);
}

/// 记录节点子树解码失败次数。
pub fn record_node_projection_failure() {
    metrics()
        .node_projection_failures
        .fetch_add(1, Ordering::Relaxed);
}

/// 记录关联交易查询次数。
pub fn record_transaction_resolved() {
    metrics()
        .transactions_resolved
        .fetch_add(1, Ordering::Relaxed);
}

/// 记录工单认领成功次数。
pub fn record_report_claim() {
    metrics().report_claims.fetch_add(1, Ordering::Relaxed);
}

/// 记录工单认领冲突次数。
pub fn record_report_claim_conflict() {
    metrics()
        .report_claim_conflicts
        .fetch_add(1, Ordering::Relaxed);
}

/// 记录支付状态迁移次数。
pub fn record_payment_transition() {
    metrics()
        .payment_transitions
        .fetch_add(1, Ordering::Relaxed);
}
