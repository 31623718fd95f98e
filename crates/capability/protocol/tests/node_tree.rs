use domain::Node;
use park_protocol::{
    EntranceState, EntranceStatus, ExitStatus, NodeInfo, ProtocolError, RawNodeParts,
};
use serde_json::{Value, json};

fn entrance_fixture() -> Value {
    json!({
        "alpr": {
            "connected_timestamp": "2024-05-01T10:00:00.000Z",
            "status": { "candidate_key": "ABC123", "license_numbers": ["ABC123", "ABC128"] },
            "command": "clear"
        },
        "controller": {
            "connected_timestamp": "2024-05-01T10:00:01.000Z",
            "status": {
                "mode": true,
                "b_open": false,
                "b_close": false,
                "k_hover": true,
                "k_button": false,
                "p_has_car": true,
                "p_barricade": false
            },
            "config": { "hover_cms": 30, "car_cms": 120 },
            "command": "open_barricade"
        },
        "state": {
            "connected_timestamp": "2024-05-01T10:00:02.000Z",
            "status": {
                "current_state": "failed",
                "prev_state": "process",
                "next_state": "idle",
                "enter_timestamp": "2024-05-01T09:59:58.000Z",
                "info": { "reason": "license active", "tid": "T1", "call_staff": false }
            }
        }
    })
}

fn exit_fixture() -> Value {
    json!({
        "state": {
            "connected_timestamp": "2024-05-01T10:00:02.000Z",
            "status": {
                "current_state": "detect",
                "prev_state": "idle",
                "next_state": "get",
                "enter_timestamp": "2024-05-01T09:59:58.000Z",
                "info": { "checked_license_numbers": ["ABC123"] }
            },
            "command": "set_idle"
        }
    })
}

#[test]
fn entrance_tree_round_trips() {
    let fixture = entrance_fixture();
    let info = NodeInfo::from_tree(Node::Entrance, fixture.clone()).unwrap();
    assert_eq!(info.node(), Node::Entrance);
    assert_eq!(info.to_tree().unwrap(), fixture);
}

#[test]
fn exit_tree_round_trips() {
    let fixture = exit_fixture();
    let info = NodeInfo::from_tree(Node::Exit, fixture.clone()).unwrap();
    assert_eq!(info.to_tree().unwrap(), fixture);
}

#[test]
fn exit_detect_without_checked_plates_round_trips() {
    // 实时库会丢掉空数组，`info` 整体缺失
    let fixture = json!({
        "state": {
            "status": {
                "current_state": "detect",
                "prev_state": "idle",
                "next_state": "get",
                "enter_timestamp": "2024-05-01T09:59:58Z"
            }
        }
    });
    let info = NodeInfo::from_tree(Node::Exit, fixture.clone()).unwrap();
    assert_eq!(info.to_tree().unwrap(), fixture);
}

#[test]
fn decoding_is_node_directed() {
    let get_state = json!({
        "status": {
            "current_state": "get",
            "prev_state": "detect",
            "next_state": "payment",
            "enter_timestamp": "2024-05-01T09:59:58Z",
            "info": { "tid": "T1", "license_number": "ABC123" }
        }
    });

    let exit = NodeInfo::from_parts(
        Node::Exit,
        RawNodeParts {
            state: Some(get_state.clone()),
            ..RawNodeParts::default()
        },
    )
    .unwrap();
    match exit {
        NodeInfo::Exit(tree) => {
            let status = tree.state.and_then(|state| state.status).unwrap();
            assert!(matches!(status, ExitStatus::Get { ref info, .. } if info.tid == "T1"));
        }
        NodeInfo::Entrance(_) => panic!("expected exit node"),
    }

    let err = NodeInfo::from_parts(
        Node::Entrance,
        RawNodeParts {
            state: Some(get_state),
            ..RawNodeParts::default()
        },
    )
    .unwrap_err();
    match err {
        ProtocolError::Decode { path, .. } => assert_eq!(path, "entrance/state"),
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn absent_paths_are_none() {
    let info = NodeInfo::from_tree(Node::Entrance, Value::Null).unwrap();
    assert!(info.alpr().is_none());
    assert!(info.controller().is_none());
    assert!(!info.has_state_status());
    assert_eq!(info, NodeInfo::empty(Node::Entrance));
}

#[test]
fn entrance_accessors_read_failed_info() {
    let info = NodeInfo::from_tree(Node::Entrance, entrance_fixture()).unwrap();
    assert_eq!(info.linked_tid(), Some("T1"));
    assert!(!info.controller().unwrap().is_barricade_open());
    let NodeInfo::Entrance(tree) = info else {
        panic!("expected entrance node");
    };
    let status = tree.state.unwrap().status.unwrap();
    assert_eq!(status.current_state(), EntranceState::Failed);
    assert_eq!(status.transition().prev_state, EntranceState::Process);
    assert!(matches!(status, EntranceStatus::Failed { .. }));
}

#[test]
fn process_state_carries_no_tid() {
    let info = NodeInfo::from_tree(
        Node::Entrance,
        json!({
            "state": {
                "status": {
                    "current_state": "process",
                    "prev_state": "detect",
                    "next_state": "success",
                    "enter_timestamp": "2024-05-01T09:59:58Z",
                    "info": { "license_number": "ABC123" }
                }
            }
        }),
    )
    .unwrap();
    assert!(info.has_state_status());
    assert_eq!(info.linked_tid(), None);
}

#[test]
fn fractional_controller_config_decodes() {
    let fixture = json!({
        "controller": {
            "config": { "hover_cms": 30.5, "car_cms": 120 }
        }
    });
    let info = NodeInfo::from_tree(Node::Exit, fixture.clone()).unwrap();
    let config = info.controller().unwrap().config.clone().unwrap();
    assert_eq!(config.hover_cms(), Some(30.5));
    assert_eq!(config.car_cms(), Some(120.0));
    assert_eq!(info.to_tree().unwrap(), fixture);
}

#[test]
fn idle_and_entrance_detect_keep_opaque_info() {
    let entrance = json!({
        "state": {
            "status": {
                "current_state": "detect",
                "prev_state": "idle",
                "next_state": "process",
                "enter_timestamp": "2024-05-01T09:59:58Z",
                "info": { "license_number": "ABC123" }
            }
        }
    });
    let info = NodeInfo::from_tree(Node::Entrance, entrance.clone()).unwrap();
    assert_eq!(info.to_tree().unwrap(), entrance);

    let exit = json!({
        "state": {
            "status": {
                "current_state": "idle",
                "prev_state": "success",
                "next_state": "detect",
                "enter_timestamp": "2024-05-01T09:59:58Z",
                "info": { "tid": "T1", "is_car_pass": true }
            }
        }
    });
    let info = NodeInfo::from_tree(Node::Exit, exit.clone()).unwrap();
    assert_eq!(info.linked_tid(), None);
    assert_eq!(info.to_tree().unwrap(), exit);
}

#[test]
fn generic_tree_decodes_without_default_status() {
    let tree: park_protocol::EntranceNodeInfo = serde_json::from_value(entrance_fixture()).unwrap();
    assert!(tree.state.and_then(|state| state.status).is_some());
    let tree: park_protocol::ExitNodeInfo = serde_json::from_value(exit_fixture()).unwrap();
    assert!(tree.state.and_then(|state| state.status).is_some());
}
