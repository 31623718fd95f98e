//! 节点下各硬件模块发布的数据形状。
//!
//! 每个模块由外部硬件节点写入 `connected_timestamp`（心跳）与 `status`，
//! 控制台只读这些字段，只写 `command`。

use serde::{Deserialize, Serialize};
use serde_json::Number;

/// 提供心跳时间戳的模块。
pub trait Heartbeat {
    fn connected_timestamp(&self) -> Option<&str>;
}

/// 车牌识别模块状态。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AlprStatus {
    /// 当前候选车牌
    pub candidate_key: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub license_numbers: Option<Vec<String>>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AlprModule {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub connected_timestamp: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<AlprStatus>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub command: Option<String>,
}

/// 控制器 IO 状态。
///
/// - `b_*`：道闸按钮
/// - `k_*`：Kiosk 上的手势/按钮传感器
/// - `p_*`：车辆在位与道闸位置
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ControllerStatus {
    pub mode: bool,
    pub b_open: bool,
    pub b_close: bool,
    pub k_hover: bool,
    pub k_button: bool,
    pub p_has_car: bool,
    pub p_barricade: bool,
}

/// 控制器距离阈值配置（厘米）。
///
/// 节点写入的数值可能带小数，按原样保存以便无损回写。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ControllerConfig {
    pub hover_cms: Number,
    pub car_cms: Number,
}

impl ControllerConfig {
    pub fn hover_cms(&self) -> Option<f64> {
        self.hover_cms.as_f64()
    }

    pub fn car_cms(&self) -> Option<f64> {
        self.car_cms.as_f64()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ControllerModule {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub connected_timestamp: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<ControllerStatus>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub config: Option<ControllerConfig>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub command: Option<String>,
}

impl ControllerModule {
    /// 道闸是否处于打开位置；无状态时视为关闭。
    pub fn is_barricade_open(&self) -> bool {
        self.status.is_some_and(|status| status.p_barricade)
    }
}

/// 状态机模块；`S` 为入口或出口的状态联合。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(bound(deserialize = "S: serde::de::DeserializeOwned"))]
pub struct StateModule<S> {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub connected_timestamp: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<S>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub command: Option<String>,
}

impl Heartbeat for AlprModule {
    fn connected_timestamp(&self) -> Option<&str> {
        self.connected_timestamp.as_deref()
    }
}

impl Heartbeat for ControllerModule {
    fn connected_timestamp(&self) -> Option<&str> {
        self.connected_timestamp.as_deref()
    }
}

impl<S> Heartbeat for StateModule<S> {
    fn connected_timestamp(&self) -> Option<&str> {
        self.connected_timestamp.as_deref()
    }
}
