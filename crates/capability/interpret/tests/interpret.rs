use chrono::{DateTime, TimeDelta, TimeZone, Utc};
use domain::Node;
use park_interpret::{KioskView, interpret, matching_transaction};
use park_protocol::NodeInfo;
use park_storage::{TransactionRecord, TransactionStatus};
use serde_json::{Value, json};

fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 5, 1, 10, 0, 0).unwrap()
}

fn node(node: Node, current_state: &str, info: Option<Value>, entered_secs_ago: i64) -> NodeInfo {
    let mut status = json!({
        "current_state": current_state,
        "prev_state": "idle",
        "next_state": "idle",
        "enter_timestamp": (now() - TimeDelta::seconds(entered_secs_ago)).to_rfc3339(),
    });
    if let Some(info) = info {
        status["info"] = info;
    }
    NodeInfo::from_tree(
        node,
        json!({
            "alpr": {
                "connected_timestamp": now().to_rfc3339(),
                "status": { "candidate_key": "ABC123" }
            },
            "state": { "connected_timestamp": now().to_rfc3339(), "status": status }
        }),
    )
    .unwrap()
}

fn transaction(tid: &str, exited: bool) -> TransactionRecord {
    TransactionRecord {
        tid: tid.to_string(),
        license_number: "ABC123".to_string(),
        timestamp_in: now() - TimeDelta::hours(3),
        timestamp_out: exited.then(|| now() - TimeDelta::hours(1)),
        status: TransactionStatus::Unpaid,
        fee: 60.0,
        paid: 0.0,
        image_in: None,
        image_out: None,
        is_cancel: false,
        is_edit: false,
        add_by: None,
    }
}

#[test]
fn entrance_failed_sub_cases() {
    let with_tid = json!({ "reason": "license exists", "tid": "T1", "call_staff": false });
    let without_tid = json!({ "reason": "write failed", "call_staff": true });
    let cases = [
        (
            "no tid",
            without_tid.clone(),
            None,
            KioskView::Failed {
                reason: "write failed".to_string(),
                call_staff: true,
                countdown: Some(7),
            },
        ),
        (
            "tid with timestamp_out",
            with_tid.clone(),
            Some(transaction("T1", true)),
            KioskView::PaymentRequired {
                tid: "T1".to_string(),
            },
        ),
        (
            "tid without timestamp_out",
            with_tid.clone(),
            Some(transaction("T1", false)),
            KioskView::LicenseActive {
                tid: "T1".to_string(),
            },
        ),
        (
            "tid not loaded",
            with_tid.clone(),
            None,
            KioskView::Failed {
                reason: "license exists".to_string(),
                call_staff: false,
                countdown: None,
            },
        ),
        (
            "stale transaction from another tid",
            with_tid,
            Some(transaction("T0", true)),
            KioskView::Failed {
                reason: "license exists".to_string(),
                call_staff: false,
                countdown: None,
            },
        ),
    ];

    for (name, info, transaction, expected) in cases {
        let info = node(Node::Entrance, "failed", Some(info), 3);
        let view = interpret(Some(&info), transaction.as_ref(), now());
        assert_eq!(view, expected, "case: {name}");
    }
}

#[test]
fn entrance_detect_counts_down_from_thirty() {
    let info = node(Node::Entrance, "detect", None, 5);
    assert_eq!(
        interpret(Some(&info), None, now()),
        KioskView::Detect {
            candidate_key: Some("ABC123".to_string()),
            checked_license_numbers: Vec::new(),
            countdown: Some(25),
        }
    );
}

#[test]
fn exit_states_map_to_views() {
    let cases = [
        ("idle", None, KioskView::Idle),
        (
            "detect",
            Some(json!({ "checked_license_numbers": ["XYZ9"] })),
            KioskView::Detect {
                candidate_key: Some("ABC123".to_string()),
                checked_license_numbers: vec!["XYZ9".to_string()],
                countdown: Some(50),
            },
        ),
        (
            "get",
            Some(json!({ "tid": "T1", "license_number": "ABC123" })),
            KioskView::Get {
                tid: "T1".to_string(),
                license_number: "ABC123".to_string(),
            },
        ),
        (
            "payment",
            Some(json!({ "tid": "T1", "call_staff": true })),
            KioskView::Payment {
                tid: "T1".to_string(),
                call_staff: true,
                countdown: Some(110),
            },
        ),
        (
            "success",
            Some(json!({ "tid": "T1", "is_car_pass": true })),
            KioskView::Success {
                tid: "T1".to_string(),
                is_car_pass: true,
            },
        ),
        (
            "failed",
            Some(json!({ "reason": "timeout", "tid": "T1", "call_staff": false })),
            KioskView::Failed {
                reason: "timeout".to_string(),
                call_staff: false,
                countdown: Some(0),
            },
        ),
    ];

    for (state, info, expected) in cases {
        let elapsed = if state == "failed" { 12 } else { 10 };
        let info = node(Node::Exit, state, info, elapsed);
        assert_eq!(interpret(Some(&info), None, now()), expected, "state: {state}");
    }
}

#[test]
fn entrance_process_and_success() {
    let process = node(
        Node::Entrance,
        "process",
        Some(json!({ "license_number": "ABC123" })),
        1,
    );
    assert_eq!(
        interpret(Some(&process), None, now()),
        KioskView::Process {
            license_number: "ABC123".to_string()
        }
    );

    let success = node(
        Node::Entrance,
        "success",
        Some(json!({ "tid": "T1", "is_car_pass": false })),
        1,
    );
    assert_eq!(
        interpret(Some(&success), None, now()),
        KioskView::Success {
            tid: "T1".to_string(),
            is_car_pass: false
        }
    );
}

#[test]
fn missing_info_or_status_is_unavailable() {
    assert_eq!(interpret(None, None, now()), KioskView::Unavailable);
    let empty = NodeInfo::empty(Node::Exit);
    assert_eq!(interpret(Some(&empty), None, now()), KioskView::Unavailable);
    let heartbeat_only =
        NodeInfo::from_tree(Node::Entrance, json!({ "state": { "connected_timestamp": "x" } }))
            .unwrap();
    assert_eq!(
        interpret(Some(&heartbeat_only), None, now()),
        KioskView::Unavailable
    );
}

#[test]
fn transaction_is_ignored_for_states_without_tid() {
    let process = node(
        Node::Entrance,
        "process",
        Some(json!({ "license_number": "ABC123" })),
        1,
    );
    let record = transaction("T1", false);
    assert!(matching_transaction(&process, Some(&record)).is_none());

    let payment = node(Node::Exit, "payment", Some(json!({ "tid": "T1", "call_staff": false })), 1);
    assert!(matching_transaction(&payment, Some(&record)).is_some());
}

#[test]
fn countdown_reaching_zero_keeps_view() {
    let info = node(Node::Entrance, "detect", None, 90);
    assert!(matches!(
        interpret(Some(&info), None, now()),
        KioskView::Detect {
            countdown: Some(0),
            ..
        }
    ));
}
