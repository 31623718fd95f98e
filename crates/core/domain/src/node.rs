//! 闸机节点与硬件模块标识。
//!
//! 节点只用作实时树子路径的键，不落库。

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// 物理闸机节点：入口或出口。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Node {
    Entrance,
    Exit,
}

impl Node {
    pub const ALL: [Node; 2] = [Node::Entrance, Node::Exit];

    /// 实时树中的路径段（小写）。
    pub fn path_segment(self) -> &'static str {
        match self {
            Node::Entrance => "entrance",
            Node::Exit => "exit",
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Node::Entrance => "Entrance",
            Node::Exit => "Exit",
        }
    }
}

impl fmt::Display for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseNodeError(pub String);

impl fmt::Display for ParseNodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown node: {}", self.0)
    }
}

impl std::error::Error for ParseNodeError {}

impl FromStr for Node {
    type Err = ParseNodeError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "entrance" => Ok(Node::Entrance),
            "exit" => Ok(Node::Exit),
            _ => Err(ParseNodeError(value.to_string())),
        }
    }
}

/// 节点下的硬件模块。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Module {
    /// 车牌识别
    Alpr,
    /// 道闸与传感器控制器
    Controller,
    /// 状态机进程
    State,
}

impl Module {
    pub const ALL: [Module; 3] = [Module::Alpr, Module::Controller, Module::State];

    pub fn path_segment(self) -> &'static str {
        match self {
            Module::Alpr => "alpr",
            Module::Controller => "controller",
            Module::State => "state",
        }
    }

    /// `{node}/{module}`
    pub fn path(self, node: Node) -> String {
        format!("{}/{}", node.path_segment(), self.path_segment())
    }

    /// `{node}/{module}/command`
    pub fn command_path(self, node: Node) -> String {
        format!("{}/command", self.path(node))
    }
}
