//! # Kiosk 实时树协议
//!
//! 描述硬件节点在实时数据库中发布的数据形状：
//!
//! ```text
//! /{entrance|exit}
//!     /alpr        { connected_timestamp, status, command }
//!     /controller  { connected_timestamp, status, config, command }
//!     /state       { connected_timestamp, status, command }
//! /settings        { fee, promptpay }
//! ```
//!
//! 控制台只读 `status` 与心跳，只写 `command`。

mod error;
mod module;
mod node_info;
mod settings;
mod state;
mod timestamp;

pub use error::ProtocolError;
pub use module::{
    AlprModule, AlprStatus, ControllerConfig, ControllerModule, ControllerStatus, Heartbeat,
    StateModule,
};
pub use node_info::{EntranceNodeInfo, ExitNodeInfo, NodeInfo, NodeTree, RawNodeParts};
pub use settings::{SETTINGS_PATH, Settings};
pub use state::{
    DetectInfo, EntranceState, EntranceStatus, ExitState, ExitStatus, FailureInfo, GetInfo,
    PassInfo, PaymentInfo, ProcessInfo, Transition,
};
pub use timestamp::{format_timestamp, parse_timestamp};
