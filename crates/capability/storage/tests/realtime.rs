use park_storage::{InMemoryRealtimeTree, RealtimeTree};
use serde_json::json;

#[tokio::test]
async fn set_and_get_nested_paths() {
    let tree = InMemoryRealtimeTree::new();
    tree.set("entrance/controller/command", json!("open_barricade"))
        .await
        .expect("set");

    let command = tree
        .get("/entrance/controller/command")
        .await
        .expect("get");
    assert_eq!(command, Some(json!("open_barricade")));

    let controller = tree.get("entrance/controller").await.expect("get");
    assert_eq!(controller, Some(json!({ "command": "open_barricade" })));

    assert_eq!(tree.get("exit").await.expect("get"), None);
}

#[tokio::test]
async fn writing_null_removes_value() {
    let tree = InMemoryRealtimeTree::with_root(json!({
        "settings": { "fee": 20, "promptpay": "0812345678" }
    }));
    tree.set("settings/promptpay", serde_json::Value::Null)
        .await
        .expect("set");
    assert_eq!(
        tree.get("settings").await.expect("get"),
        Some(json!({ "fee": 20 }))
    );
}

#[tokio::test]
async fn set_overwrites_whole_value() {
    let tree = InMemoryRealtimeTree::new();
    tree.set("exit/state", json!({ "command": "set_idle", "status": { "a": 1 } }))
        .await
        .expect("set");
    tree.set("exit/state", json!({ "command": "set_get:T1,ABC123" }))
        .await
        .expect("set");
    assert_eq!(
        tree.get("exit/state").await.expect("get"),
        Some(json!({ "command": "set_get:T1,ABC123" }))
    );
}

#[tokio::test]
async fn subscribers_receive_change_paths() {
    let tree = InMemoryRealtimeTree::new();
    let mut changes = tree.subscribe();
    tree.set("/exit/alpr/command/", json!("clear"))
        .await
        .expect("set");
    let change = changes.recv().await.expect("change");
    assert_eq!(change.path, "exit/alpr/command");
    assert!(change.touches("exit"));
    assert!(!change.touches("entrance"));
}

#[tokio::test]
async fn rejects_reserved_characters() {
    let tree = InMemoryRealtimeTree::new();
    assert!(tree.set("entrance/a.b", json!(1)).await.is_err());
    assert!(tree.get("entrance/$x").await.is_err());
}
