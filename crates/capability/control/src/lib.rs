//! # Kiosk 命令下发
//!
//! 命令以字符串整值写入实时树的 `command` 路径，硬件节点自行消费。
//! 至多一次：不等回执、不重试。
//!
//! 两类命令：
//! - 尽力而为：道闸、距离阈值、清空车牌、回到空闲。失败只记日志
//! - 影响交易：`set_process`、`set_get`。失败返回给调用方

mod command;

pub use command::{BarricadeAction, KioskCommand};

use async_trait::async_trait;
use domain::Node;
use park_storage::RealtimeTree;
use park_telemetry::{
    record_command_dispatched, record_command_failure_surfaced, record_command_failure_swallowed,
    record_command_latency_ms, record_command_skipped,
};
use std::sync::Arc;
use std::time::Instant;
use tracing::{info, warn};

/// 控制链路错误。
#[derive(Debug, thiserror::Error)]
pub enum ControlError {
    #[error("dispatch error at {path}: {message}")]
    Dispatch { path: String, message: String },
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
}

/// 命令写入端口。
#[async_trait]
pub trait CommandSink: Send + Sync {
    async fn write(&self, path: &str, command: &str) -> Result<(), ControlError>;
}

/// 写入实时树的命令端口。
pub struct RealtimeCommandSink {
    tree: Arc<dyn RealtimeTree>,
}

impl RealtimeCommandSink {
    pub fn new(tree: Arc<dyn RealtimeTree>) -> Self {
        Self { tree }
    }
}

#[async_trait]
impl CommandSink for RealtimeCommandSink {
    async fn write(&self, path: &str, command: &str) -> Result<(), ControlError> {
        self.tree
            .set(path, serde_json::Value::String(command.to_string()))
            .await
            .map_err(|err| ControlError::Dispatch {
                path: path.to_string(),
                message: err.to_string(),
            })
    }
}

/// 命令下发器。
#[derive(Clone)]
pub struct CommandDispatcher {
    sink: Arc<dyn CommandSink>,
}

impl CommandDispatcher {
    pub fn new(sink: Arc<dyn CommandSink>) -> Self {
        Self { sink }
    }

    /// 打开/关闭道闸。
    pub async fn control_barricade(&self, node: Node, action: BarricadeAction) {
        self.send_best_effort(node, KioskCommand::Barricade(action))
            .await;
    }

    /// 设置手势感应距离（厘米）；非正数或超出范围不下发。
    pub async fn set_hover_cms(&self, node: Node, value: i64) {
        if let Some(value) = positive_cms(node, "set_hover_cms", value) {
            self.send_best_effort(node, KioskCommand::SetHoverCms(value))
                .await;
        }
    }

    /// 设置车辆感应距离（厘米）。
    pub async fn set_car_cms(&self, node: Node, value: i64) {
        if let Some(value) = positive_cms(node, "set_car_cms", value) {
            self.send_best_effort(node, KioskCommand::SetCarCms(value))
                .await;
        }
    }

    /// 清空车牌识别结果。
    pub async fn clear_license_number(&self, node: Node) {
        self.send_best_effort(node, KioskCommand::Clear).await;
    }

    /// 状态机回到空闲。
    pub async fn set_state_initial(&self, node: Node) {
        self.send_best_effort(node, KioskCommand::SetIdle).await;
    }

    /// 入口按给定车牌开始写交易。
    pub async fn set_entrance_process(&self, license_number: &str) -> Result<(), ControlError> {
        let license_number = license_number.trim();
        if license_number.is_empty() {
            return Err(ControlError::InvalidArgument(
                "license_number required".to_string(),
            ));
        }
        self.send(
            Node::Entrance,
            KioskCommand::SetProcess {
                license_number: license_number.to_string(),
            },
        )
        .await
        .inspect_err(|_| record_command_failure_surfaced())
    }

    /// 出口按给定交易放行流程。
    pub async fn set_exit_get(&self, tid: &str, license_number: &str) -> Result<(), ControlError> {
        let tid = tid.trim();
        let license_number = license_number.trim();
        if tid.is_empty() || tid.contains(',') {
            return Err(ControlError::InvalidArgument(format!("invalid tid: {tid}")));
        }
        if license_number.is_empty() {
            return Err(ControlError::InvalidArgument(
                "license_number required".to_string(),
            ));
        }
        self.send(
            Node::Exit,
            KioskCommand::SetGet {
                tid: tid.to_string(),
                license_number: license_number.to_string(),
            },
        )
        .await
        .inspect_err(|_| record_command_failure_surfaced())
    }

    async fn send_best_effort(&self, node: Node, command: KioskCommand) {
        if let Err(err) = self.send(node, command).await {
            record_command_failure_swallowed();
            warn!(
                target: "park.control",
                node = %node,
                error = %err,
                "command_dispatch_failed"
            );
        }
    }

    async fn send(&self, node: Node, command: KioskCommand) -> Result<(), ControlError> {
        let module = command.module();
        let path = module.command_path(node);
        let value = command.to_string();
        let started_at = Instant::now();
        let result = self.sink.write(&path, &value).await;
        record_command_latency_ms(started_at.elapsed().as_millis() as u64);
        if result.is_ok() {
            record_command_dispatched();
            info!(
                target: "park.control",
                node = %node,
                module = module.path_segment(),
                command = command.name(),
                path = %path,
                "command_dispatched"
            );
        }
        result
    }
}

fn positive_cms(node: Node, command: &'static str, value: i64) -> Option<u32> {
    match u32::try_from(value) {
        Ok(value) if value > 0 => Some(value),
        _ => {
            record_command_skipped();
            info!(
                target: "park.control",
                node = %node,
                command,
                value,
                "command_skipped_out_of_range"
            );
            None
        }
    }
}
