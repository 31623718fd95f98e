use chrono::{TimeDelta, TimeZone, Utc};
use domain::Node;
use park_projection::{LivenessPolicy, NodeProjector, ProjectionError};
use park_protocol::{NodeInfo, Settings};
use park_storage::{
    InMemoryRealtimeTree, InMemoryTransactionStore, RealtimeTree, TransactionRecord,
    TransactionStatus,
};
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;

fn transaction(tid: &str) -> TransactionRecord {
    TransactionRecord {
        tid: tid.to_string(),
        license_number: "ABC123".to_string(),
        timestamp_in: Utc.with_ymd_and_hms(2024, 5, 1, 9, 0, 0).unwrap(),
        timestamp_out: None,
        status: TransactionStatus::Unpaid,
        fee: 0.0,
        paid: 0.0,
        image_in: None,
        image_out: None,
        is_cancel: false,
        is_edit: false,
        add_by: None,
    }
}

fn projector(tree: Arc<InMemoryRealtimeTree>) -> NodeProjector {
    let transactions = Arc::new(InMemoryTransactionStore::with_records([transaction("T1")]));
    NodeProjector::new(tree, transactions, LivenessPolicy::default())
}

fn exit_state(current_state: &str, info: serde_json::Value) -> serde_json::Value {
    json!({
        "connected_timestamp": "2024-05-01T10:00:00Z",
        "status": {
            "current_state": current_state,
            "prev_state": "idle",
            "next_state": "idle",
            "enter_timestamp": "2024-05-01T09:59:50Z",
            "info": info
        }
    })
}

#[tokio::test]
async fn absent_modules_project_as_none() {
    let tree = Arc::new(InMemoryRealtimeTree::new());
    let snapshot = projector(tree).snapshot(Node::Exit).await.expect("snapshot");
    assert_eq!(snapshot.info, NodeInfo::empty(Node::Exit));
    assert!(!snapshot.connectivity.alpr);
    assert!(!snapshot.connectivity.controller);
    assert!(!snapshot.connectivity.state);
    assert_eq!(snapshot.updated_at.len(), "2024-05-01 10:00:00".len());
}

#[tokio::test]
async fn connectivity_follows_heartbeats() {
    let now = Utc.with_ymd_and_hms(2024, 5, 1, 10, 0, 10).unwrap();
    let tree = Arc::new(InMemoryRealtimeTree::with_root(json!({
        "entrance": {
            "alpr": { "connected_timestamp": (now - TimeDelta::seconds(1)).to_rfc3339() },
            "controller": { "connected_timestamp": (now - TimeDelta::seconds(16)).to_rfc3339() },
            "state": { "connected_timestamp": (now - TimeDelta::seconds(15)).to_rfc3339() }
        }
    })));
    let snapshot = projector(tree)
        .snapshot_at(Node::Entrance, now)
        .await
        .expect("snapshot");
    assert!(snapshot.connectivity.alpr);
    assert!(!snapshot.connectivity.controller);
    assert!(!snapshot.connectivity.state);
}

#[tokio::test]
async fn malformed_subtree_is_a_decode_error() {
    let tree = Arc::new(InMemoryRealtimeTree::with_root(json!({
        "exit": { "controller": { "status": { "mode": "yes" } } }
    })));
    let err = projector(tree).snapshot(Node::Exit).await.unwrap_err();
    assert!(matches!(err, ProjectionError::Decode(_)));
}

#[tokio::test]
async fn linked_transaction_only_for_states_with_tid() {
    let tree = Arc::new(InMemoryRealtimeTree::with_root(json!({
        "exit": { "state": exit_state("get", json!({ "tid": "T1", "license_number": "ABC123" })) },
        "entrance": { "state": {
            "status": {
                "current_state": "process",
                "prev_state": "detect",
                "next_state": "success",
                "enter_timestamp": "2024-05-01T09:59:50Z",
                "info": { "license_number": "ABC123" }
            }
        } }
    })));
    let projector = projector(tree);

    let exit = projector.snapshot(Node::Exit).await.expect("snapshot");
    let linked = projector.linked_transaction(&exit.info).await.expect("linked");
    assert_eq!(linked.map(|t| t.tid), Some("T1".to_string()));

    let entrance = projector.snapshot(Node::Entrance).await.expect("snapshot");
    assert!(projector.linked_transaction(&entrance.info).await.expect("linked").is_none());
}

#[tokio::test]
async fn watch_replaces_snapshot_on_change() {
    let tree = Arc::new(InMemoryRealtimeTree::new());
    let projector = projector(tree.clone());
    let mut watch = projector.watch(Node::Exit).await.expect("watch");
    assert_eq!(watch.node(), Node::Exit);
    assert!(!watch.current().info.has_state_status());

    tree.set("exit/state", exit_state("payment", json!({ "tid": "T1", "call_staff": false })))
        .await
        .expect("set");

    let snapshot = tokio::time::timeout(Duration::from_secs(2), async {
        loop {
            let snapshot = watch.changed().await.expect("changed");
            if snapshot.info.has_state_status() {
                return snapshot;
            }
        }
    })
    .await
    .expect("timely update");
    assert_eq!(snapshot.info.linked_tid(), Some("T1"));
}

#[tokio::test]
async fn settings_round_trip_through_tree() {
    let tree = Arc::new(InMemoryRealtimeTree::new());
    let projector = projector(tree.clone());
    assert!(projector.read_settings().await.expect("read").is_none());

    let settings = Settings {
        fee: 20.0,
        promptpay: "0812345678".to_string(),
    };
    projector.write_settings(&settings).await;
    assert_eq!(projector.read_settings().await.expect("read"), Some(settings));
}
