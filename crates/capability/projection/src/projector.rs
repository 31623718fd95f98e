//! 节点状态投影。
//!
//! 读取 `{node}/alpr`、`{node}/controller`、`{node}/state` 三个子树，
//! 组装成类型化的 [`NodeInfo`]，并计算各模块在线状态。

use crate::error::ProjectionError;
use crate::liveness::{Connectivity, LivenessPolicy};
use chrono::{DateTime, Local, Utc};
use domain::{Module, Node};
use park_protocol::{NodeInfo, RawNodeParts, SETTINGS_PATH, Settings};
use park_storage::{RealtimeTree, TransactionRecord, TransactionStore, TreeChange};
use park_telemetry::{record_node_projection_failure, record_node_snapshot, record_transaction_resolved};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{broadcast, watch};
use tokio::task::JoinHandle;
use tracing::{debug, warn};

/// 订阅任务重新评估在线状态的周期。
const LIVENESS_REFRESH: Duration = Duration::from_secs(1);

/// 某一时刻的节点快照。
#[derive(Debug, Clone, PartialEq)]
pub struct NodeSnapshot {
    pub info: NodeInfo,
    pub connectivity: Connectivity,
    /// 最近一次成功读取的本地时间（`%Y-%m-%d %H:%M:%S`）
    pub updated_at: String,
}

/// 节点投影器
#[derive(Clone)]
pub struct NodeProjector {
    tree: Arc<dyn RealtimeTree>,
    transactions: Arc<dyn TransactionStore>,
    liveness: LivenessPolicy,
}

impl NodeProjector {
    pub fn new(
        tree: Arc<dyn RealtimeTree>,
        transactions: Arc<dyn TransactionStore>,
        liveness: LivenessPolicy,
    ) -> Self {
        Self {
            tree,
            transactions,
            liveness,
        }
    }

    pub fn liveness(&self) -> LivenessPolicy {
        self.liveness
    }

    /// 读取节点当前快照。
    pub async fn snapshot(&self, node: Node) -> Result<NodeSnapshot, ProjectionError> {
        self.snapshot_at(node, Utc::now()).await
    }

    /// 以给定时间计算在线状态的快照。
    pub async fn snapshot_at(
        &self,
        node: Node,
        now: DateTime<Utc>,
    ) -> Result<NodeSnapshot, ProjectionError> {
        let info = self.read_info(node).await?;
        let connectivity = self.liveness.connectivity(&info, now);
        record_node_snapshot();
        Ok(NodeSnapshot {
            info,
            connectivity,
            updated_at: update_label(),
        })
    }

    async fn read_info(&self, node: Node) -> Result<NodeInfo, ProjectionError> {
        let alpr_path = Module::Alpr.path(node);
        let controller_path = Module::Controller.path(node);
        let state_path = Module::State.path(node);
        let (alpr, controller, state) = tokio::try_join!(
            self.tree.get(&alpr_path),
            self.tree.get(&controller_path),
            self.tree.get(&state_path),
        )?;
        NodeInfo::from_parts(
            node,
            RawNodeParts {
                alpr,
                controller,
                state,
            },
        )
        .inspect_err(|err| {
            record_node_projection_failure();
            warn!(target: "park.projection", node = %node, error = %err, "node_decode_failed");
        })
        .map_err(ProjectionError::from)
    }

    /// 当前状态携带交易号时查询关联交易；其他状态不查询。
    pub async fn linked_transaction(
        &self,
        info: &NodeInfo,
    ) -> Result<Option<TransactionRecord>, ProjectionError> {
        let Some(tid) = info.linked_tid() else {
            return Ok(None);
        };
        record_transaction_resolved();
        let record = self.transactions.find_transaction(tid).await?;
        if record.is_none() {
            debug!(target: "park.projection", node = %info.node(), tid, "linked_transaction_missing");
        }
        Ok(record)
    }

    /// 订阅节点：子树每次变化都重新投影并整体替换快照。
    ///
    /// 丢弃返回的 [`NodeWatch`] 即取消订阅。
    pub async fn watch(&self, node: Node) -> Result<NodeWatch, ProjectionError> {
        // 订阅须先于读初值
        let changes = self.tree.subscribe();
        let initial = self.snapshot(node).await?;
        let (sender, receiver) = watch::channel(initial);
        let projector = self.clone();
        let handle = tokio::spawn(projector.run_watch(node, changes, sender));
        Ok(NodeWatch { receiver, handle })
    }

    async fn run_watch(
        self,
        node: Node,
        mut changes: broadcast::Receiver<TreeChange>,
        sender: watch::Sender<NodeSnapshot>,
    ) {
        let prefix = node.path_segment();
        let mut ticker = tokio::time::interval(LIVENESS_REFRESH);
        loop {
            tokio::select! {
                change = changes.recv() => {
                    let relevant = match change {
                        Ok(change) => change.touches(prefix),
                        Err(broadcast::error::RecvError::Lagged(skipped)) => {
                            debug!(target: "park.projection", node = %node, skipped, "node_watch_lagged");
                            true
                        }
                        Err(broadcast::error::RecvError::Closed) => break,
                    };
                    if !relevant {
                        continue;
                    }
                    match self.snapshot(node).await {
                        Ok(snapshot) => {
                            sender.send_replace(snapshot);
                        }
                        Err(err) => {
                            warn!(target: "park.projection", node = %node, error = %err, "node_watch_refresh_failed");
                        }
                    }
                }
                _ = ticker.tick() => {
                    let now = Utc::now();
                    let liveness = self.liveness;
                    sender.send_if_modified(|snapshot| {
                        let connectivity = liveness.connectivity(&snapshot.info, now);
                        if connectivity == snapshot.connectivity {
                            return false;
                        }
                        snapshot.connectivity = connectivity;
                        true
                    });
                }
                _ = sender.closed() => break,
            }
        }
        debug!(target: "park.projection", node = %node, "node_watch_stopped");
    }

    /// 读取全局设置；路径不存在返回 `None`。
    pub async fn read_settings(&self) -> Result<Option<Settings>, ProjectionError> {
        let Some(value) = self.tree.get(SETTINGS_PATH).await? else {
            return Ok(None);
        };
        serde_json::from_value(value)
            .map(Some)
            .map_err(|err| ProjectionError::Settings(err.to_string()))
    }

    /// 写入全局设置；失败只记日志。
    pub async fn write_settings(&self, settings: &Settings) {
        let value = match serde_json::to_value(settings) {
            Ok(value) => value,
            Err(err) => {
                warn!(target: "park.projection", error = %err, "settings_encode_failed");
                return;
            }
        };
        if let Err(err) = self.tree.set(SETTINGS_PATH, value).await {
            warn!(target: "park.projection", error = %err, "settings_write_failed");
        }
    }
}

/// 节点订阅句柄；丢弃即停止后台任务。
pub struct NodeWatch {
    receiver: watch::Receiver<NodeSnapshot>,
    handle: JoinHandle<()>,
}

impl NodeWatch {
    /// 最新快照。
    pub fn current(&self) -> NodeSnapshot {
        self.receiver.borrow().clone()
    }

    /// 等待下一次快照替换。
    pub async fn changed(&mut self) -> Result<NodeSnapshot, ProjectionError> {
        self.receiver
            .changed()
            .await
            .map_err(|_| ProjectionError::WatchClosed)?;
        Ok(self.receiver.borrow_and_update().clone())
    }

    pub fn node(&self) -> Node {
        self.receiver.borrow().info.node()
    }
}

impl Drop for NodeWatch {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

fn update_label() -> String {
    Local::now().format("%Y-%m-%d %H:%M:%S").to_string()
}
