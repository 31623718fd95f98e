use async_trait::async_trait;
use chrono::{DateTime, Duration, TimeZone, Utc};
use domain::StaffContext;
use park_console::{AddOutcome, AddTransaction, ConsoleError, EditTransaction, TransactionService};
use park_control::{CommandDispatcher, CommandSink, ControlError};
use park_storage::{
    InMemoryTransactionStore, TransactionRecord, TransactionStatus, TransactionStore,
};
use std::sync::{Arc, Mutex};

#[derive(Default)]
struct RecordingSink {
    writes: Mutex<Vec<(String, String)>>,
}

#[async_trait]
impl CommandSink for RecordingSink {
    async fn write(&self, path: &str, command: &str) -> Result<(), ControlError> {
        self.writes
            .lock()
            .unwrap()
            .push((path.to_string(), command.to_string()));
        Ok(())
    }
}

struct FailingSink;

#[async_trait]
impl CommandSink for FailingSink {
    async fn write(&self, path: &str, _command: &str) -> Result<(), ControlError> {
        Err(ControlError::Dispatch {
            path: path.to_string(),
            message: "offline".to_string(),
        })
    }
}

fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap()
}

fn staff() -> StaffContext {
    StaffContext::new("u1", "staff@park.test", false)
}

fn record(tid: &str, license_number: &str, exited: bool) -> TransactionRecord {
    TransactionRecord {
        tid: tid.to_string(),
        license_number: license_number.to_string(),
        timestamp_in: now() - Duration::hours(2),
        timestamp_out: exited.then(|| now() - Duration::hours(1)),
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

struct Fixture {
    store: Arc<InMemoryTransactionStore>,
    sink: Arc<RecordingSink>,
    service: TransactionService,
}

fn fixture(records: Vec<TransactionRecord>) -> Fixture {
    let store = Arc::new(InMemoryTransactionStore::with_records(records));
    let sink = Arc::new(RecordingSink::default());
    let service = TransactionService::new(store.clone(), CommandDispatcher::new(sink.clone()));
    Fixture {
        store,
        sink,
        service,
    }
}

fn add_input(license_number: &str, manual: bool) -> AddTransaction {
    AddTransaction {
        license_number: license_number.to_string(),
        timestamp_in: now() - Duration::minutes(1),
        image_in: None,
        manual,
    }
}

#[tokio::test]
async fn automatic_add_dispatches_to_entrance_without_writing() {
    let fx = fixture(Vec::new());
    let outcome = fx
        .service
        .add(&staff(), add_input(" AB 123 ", false), now())
        .await
        .expect("add");
    assert_eq!(
        outcome,
        AddOutcome::Dispatched {
            license_number: "AB123".to_string()
        }
    );
    assert_eq!(
        fx.sink.writes.lock().unwrap().clone(),
        vec![(
            "entrance/state/command".to_string(),
            "set_process:AB123".to_string()
        )]
    );
    assert!(fx.store.list_transactions().await.unwrap().is_empty());
}

#[tokio::test]
async fn manual_add_creates_unpaid_transaction() {
    let fx = fixture(Vec::new());
    let AddOutcome::Created(created) = fx
        .service
        .add(&staff(), add_input("AB 123", true), now())
        .await
        .expect("add")
    else {
        panic!("expected created");
    };
    assert_eq!(created.license_number, "AB123");
    assert_eq!(created.status, TransactionStatus::Unpaid);
    assert_eq!(created.add_by.as_deref(), Some("staff@park.test"));
    assert!(fx.sink.writes.lock().unwrap().is_empty());
}

#[tokio::test]
async fn add_rejects_active_license_and_future_entry() {
    let fx = fixture(vec![record("T1", "AB123", false)]);
    let err = fx
        .service
        .add(&staff(), add_input("AB123", true), now())
        .await
        .unwrap_err();
    assert!(matches!(err, ConsoleError::Conflict(_)));

    let mut future = add_input("ZZ999", true);
    future.timestamp_in = now() + Duration::minutes(5);
    let err = fx.service.add(&staff(), future, now()).await.unwrap_err();
    assert!(matches!(
        err,
        ConsoleError::Validation {
            field: "timestamp_in",
            ..
        }
    ));

    let err = fx
        .service
        .add(&staff(), add_input("   ", true), now())
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        ConsoleError::Validation {
            field: "license_number",
            ..
        }
    ));
}

#[tokio::test]
async fn exited_license_can_enter_again() {
    let fx = fixture(vec![record("T1", "AB123", true)]);
    let outcome = fx
        .service
        .add(&staff(), add_input("AB123", true), now())
        .await
        .expect("add");
    assert!(matches!(outcome, AddOutcome::Created(_)));
}

#[tokio::test]
async fn automatic_add_surfaces_dispatch_failure() {
    let store = Arc::new(InMemoryTransactionStore::new());
    let service = TransactionService::new(store, CommandDispatcher::new(Arc::new(FailingSink)));
    let err = service
        .add(&staff(), add_input("AB123", false), now())
        .await
        .unwrap_err();
    assert!(matches!(err, ConsoleError::Command(_)));
}

#[tokio::test]
async fn edit_writes_only_changes() {
    let fx = fixture(vec![record("T1", "AB123", false)]);
    let unchanged = fx
        .service
        .edit(
            &staff(),
            "T1",
            EditTransaction {
                license_number: Some("AB 123".to_string()),
                ..EditTransaction::default()
            },
            now(),
        )
        .await
        .expect("edit");
    assert!(!unchanged.is_edit);

    let edited = fx
        .service
        .edit(
            &staff(),
            "T1",
            EditTransaction {
                license_number: Some("CD 456".to_string()),
                fee: Some(40.0),
                ..EditTransaction::default()
            },
            now(),
        )
        .await
        .expect("edit");
    assert_eq!(edited.license_number, "CD456");
    assert_eq!(edited.fee, 40.0);
    assert!(edited.is_edit);
}

#[tokio::test]
async fn edit_validates_timestamps() {
    let fx = fixture(vec![record("T1", "AB123", false)]);
    let err = fx
        .service
        .edit(
            &staff(),
            "T1",
            EditTransaction {
                timestamp_out: Some(now() - Duration::hours(3)),
                ..EditTransaction::default()
            },
            now(),
        )
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        ConsoleError::Validation {
            field: "timestamp_out",
            ..
        }
    ));

    let err = fx
        .service
        .edit(
            &staff(),
            "T1",
            EditTransaction {
                timestamp_in: Some(now() + Duration::minutes(1)),
                ..EditTransaction::default()
            },
            now(),
        )
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        ConsoleError::Validation {
            field: "timestamp_in",
            ..
        }
    ));

    let err = fx
        .service
        .edit(&staff(), "T9", EditTransaction::default(), now())
        .await
        .unwrap_err();
    assert!(matches!(err, ConsoleError::NotFound { .. }));
}

#[tokio::test]
async fn cancel_marks_without_deleting() {
    let fx = fixture(vec![record("T1", "AB123", false)]);
    let cancelled = fx.service.cancel(&staff(), "T1").await.expect("cancel");
    assert!(cancelled.is_cancel);
    assert!(cancelled.is_edit);
    assert_eq!(cancelled.status, TransactionStatus::Cancel);
    assert_eq!(fx.store.list_transactions().await.unwrap().len(), 1);
}

#[tokio::test]
async fn exit_override_sends_set_get() {
    let fx = fixture(vec![
        record("T1", "AB123", false),
        record("T2", "CD456", true),
    ]);
    fx.service.exit(&staff(), "T1").await.expect("exit");
    assert_eq!(
        fx.sink.writes.lock().unwrap().clone(),
        vec![(
            "exit/state/command".to_string(),
            "set_get:T1,AB123".to_string()
        )]
    );

    let err = fx.service.exit(&staff(), "T2").await.unwrap_err();
    assert!(matches!(err, ConsoleError::Conflict(_)));
}
