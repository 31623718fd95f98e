//! 节点子树编解码。
//!
//! 解码由节点决定：同一 `state` 子树在入口解释为 [`EntranceStatus`]，
//! 在出口解释为 [`ExitStatus`]。

use crate::error::ProtocolError;
use crate::module::{AlprModule, ControllerModule, StateModule};
use crate::state::{EntranceStatus, ExitStatus};
use domain::{Module, Node};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// 单个节点下三个模块的子树；缺失的模块为 `None`。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(bound(deserialize = "S: DeserializeOwned"))]
pub struct NodeTree<S> {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alpr: Option<AlprModule>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub controller: Option<ControllerModule>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state: Option<StateModule<S>>,
}

impl<S> Default for NodeTree<S> {
    fn default() -> Self {
        Self {
            alpr: None,
            controller: None,
            state: None,
        }
    }
}

pub type EntranceNodeInfo = NodeTree<EntranceStatus>;
pub type ExitNodeInfo = NodeTree<ExitStatus>;

/// 节点信息：入口与出口的状态联合不同，不能互换。
#[derive(Debug, Clone, PartialEq)]
pub enum NodeInfo {
    Entrance(EntranceNodeInfo),
    Exit(ExitNodeInfo),
}

/// 模块原始子树，`None` 表示路径下无数据。
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawNodeParts {
    pub alpr: Option<Value>,
    pub controller: Option<Value>,
    pub state: Option<Value>,
}

impl NodeInfo {
    /// 空节点（所有模块缺失）。
    pub fn empty(node: Node) -> Self {
        match node {
            Node::Entrance => NodeInfo::Entrance(NodeTree::default()),
            Node::Exit => NodeInfo::Exit(NodeTree::default()),
        }
    }

    pub fn node(&self) -> Node {
        match self {
            NodeInfo::Entrance(_) => Node::Entrance,
            NodeInfo::Exit(_) => Node::Exit,
        }
    }

    /// 由三个模块路径的原始值组装。
    pub fn from_parts(node: Node, parts: RawNodeParts) -> Result<Self, ProtocolError> {
        let alpr = decode_module(node, Module::Alpr, parts.alpr)?;
        let controller = decode_module(node, Module::Controller, parts.controller)?;
        match node {
            Node::Entrance => Ok(NodeInfo::Entrance(NodeTree {
                alpr,
                controller,
                state: decode_module(node, Module::State, parts.state)?,
            })),
            Node::Exit => Ok(NodeInfo::Exit(NodeTree {
                alpr,
                controller,
                state: decode_module(node, Module::State, parts.state)?,
            })),
        }
    }

    /// 由 `{node}` 整个子树解码。
    pub fn from_tree(node: Node, tree: Value) -> Result<Self, ProtocolError> {
        let mut object = match tree {
            Value::Null => Map::new(),
            Value::Object(object) => object,
            other => {
                return Err(ProtocolError::Decode {
                    path: node.path_segment().to_string(),
                    message: format!("expected object, got {other}"),
                });
            }
        };
        Self::from_parts(
            node,
            RawNodeParts {
                alpr: object.remove(Module::Alpr.path_segment()),
                controller: object.remove(Module::Controller.path_segment()),
                state: object.remove(Module::State.path_segment()),
            },
        )
    }

    /// 编码回 `{node}` 子树。
    pub fn to_tree(&self) -> Result<Value, ProtocolError> {
        let result = match self {
            NodeInfo::Entrance(tree) => serde_json::to_value(tree),
            NodeInfo::Exit(tree) => serde_json::to_value(tree),
        };
        result.map_err(|err| ProtocolError::encode(self.node().path_segment(), err))
    }

    pub fn alpr(&self) -> Option<&AlprModule> {
        match self {
            NodeInfo::Entrance(tree) => tree.alpr.as_ref(),
            NodeInfo::Exit(tree) => tree.alpr.as_ref(),
        }
    }

    pub fn controller(&self) -> Option<&ControllerModule> {
        match self {
            NodeInfo::Entrance(tree) => tree.controller.as_ref(),
            NodeInfo::Exit(tree) => tree.controller.as_ref(),
        }
    }

    /// 状态模块心跳。
    pub fn state_connected_timestamp(&self) -> Option<&str> {
        match self {
            NodeInfo::Entrance(tree) => tree
                .state
                .as_ref()
                .and_then(|state| state.connected_timestamp.as_deref()),
            NodeInfo::Exit(tree) => tree
                .state
                .as_ref()
                .and_then(|state| state.connected_timestamp.as_deref()),
        }
    }

    /// 当前状态是否发布了状态数据。
    pub fn has_state_status(&self) -> bool {
        match self {
            NodeInfo::Entrance(tree) => tree.state.as_ref().is_some_and(|s| s.status.is_some()),
            NodeInfo::Exit(tree) => tree.state.as_ref().is_some_and(|s| s.status.is_some()),
        }
    }

    /// 当前状态中的交易号。
    ///
    /// 只有 `failed` / `get` / `payment` / `success` 会携带交易号。
    pub fn linked_tid(&self) -> Option<&str> {
        match self {
            NodeInfo::Entrance(tree) => tree
                .state
                .as_ref()
                .and_then(|state| state.status.as_ref())
                .and_then(EntranceStatus::tid),
            NodeInfo::Exit(tree) => tree
                .state
                .as_ref()
                .and_then(|state| state.status.as_ref())
                .and_then(ExitStatus::tid),
        }
    }
}

fn decode_module<T: DeserializeOwned>(
    node: Node,
    module: Module,
    value: Option<Value>,
) -> Result<Option<T>, ProtocolError> {
    match value {
        None | Some(Value::Null) => Ok(None),
        Some(value) => serde_json::from_value(value)
            .map(Some)
            .map_err(|err| ProtocolError::decode(module.path(node), err)),
    }
}
