use chrono::{TimeZone, Utc};
use domain::StaffContext;
use park_console::{ConsoleError, DirectoryService, PaymentAction, PaymentService, ReportService};
use park_storage::{
    CarRecord, ChatMessage, ChatRecord, CustomerRecord, InMemoryCustomerStore,
    InMemoryPaymentStore, InMemoryReportStore, InMemoryStaffStore, PaymentRecord, PaymentStatus,
    PaymentStore, ReportRecord, ReportStatus, ReportStore, ReportTopic, StaffRecord,
};
use std::sync::Arc;

fn staff_record(email: &str, disabled: bool) -> StaffRecord {
    StaffRecord {
        email: email.to_string(),
        name: email.to_string(),
        role: "staff".to_string(),
        disabled,
        add_by: None,
    }
}

fn ctx(email: &str) -> StaffContext {
    StaffContext::new(email, email, false)
}

fn report(rid: &str, customer: &str) -> ReportRecord {
    ReportRecord {
        rid: rid.to_string(),
        topic: ReportTopic::Payment,
        description: "charged twice".to_string(),
        customer: customer.to_string(),
        created_timestamp: Utc.with_ymd_and_hms(2024, 5, 1, 9, 0, 0).unwrap(),
        status: ReportStatus::Pending,
        t_ref: Some("T1".to_string()),
        staff: None,
        closed_timestamp: None,
        response: None,
        is_edit: false,
    }
}

async fn reports(records: Vec<ReportRecord>) -> ReportService {
    let store = Arc::new(InMemoryReportStore::new());
    for record in records {
        store.create_report(record).await.expect("create");
    }
    let staffs = (0..4)
        .map(|idx| staff_record(&format!("s{idx}@park.test"), false))
        .chain([staff_record("off@park.test", true)]);
    let staffs = Arc::new(InMemoryStaffStore::with_records(staffs));
    ReportService::new(store, staffs)
}

#[tokio::test]
async fn payment_actions_follow_allowed_transitions() {
    let store = Arc::new(InMemoryPaymentStore::new());
    for (pid, status) in [("P1", PaymentStatus::Pending), ("P2", PaymentStatus::Pending)] {
        store
            .create_payment(PaymentRecord {
                pid: pid.to_string(),
                tid: "T1".to_string(),
                amount: 40.0,
                timestamp: Utc.with_ymd_and_hms(2024, 5, 1, 9, 0, 0).unwrap(),
                status,
                reason: None,
                paid_by: None,
                is_edit: false,
            })
            .await
            .expect("create");
    }
    let service = PaymentService::new(store);
    let staff = ctx("s0@park.test");

    let err = service
        .apply(&staff, "T1", "P1", PaymentAction::Refund)
        .await
        .unwrap_err();
    assert!(matches!(err, ConsoleError::Conflict(_)));

    let approved = service
        .apply(&staff, "T1", "P1", PaymentAction::Approve)
        .await
        .expect("approve");
    assert_eq!(approved.status, PaymentStatus::Success);
    assert!(approved.is_edit);

    let refunded = service
        .apply(&staff, "T1", "P1", PaymentAction::Refund)
        .await
        .expect("refund");
    assert_eq!(refunded.status, PaymentStatus::Refund);

    let rejected = service
        .apply(&staff, "T1", "P2", PaymentAction::Reject)
        .await
        .expect("reject");
    assert_eq!(rejected.status, PaymentStatus::Failed);
    assert!(service.pending().await.expect("pending").is_empty());

    let err = service
        .apply(&staff, "T1", "P9", PaymentAction::Approve)
        .await
        .unwrap_err();
    assert!(matches!(err, ConsoleError::NotFound { .. }));
}

#[test]
fn payment_action_parses_case_insensitively() {
    assert_eq!("Approve".parse::<PaymentAction>(), Ok(PaymentAction::Approve));
    assert_eq!(" refund ".parse::<PaymentAction>(), Ok(PaymentAction::Refund));
    assert!("pay".parse::<PaymentAction>().is_err());
}

#[tokio::test]
async fn claim_requires_active_staff() {
    let service = reports(vec![report("R1", "C1")]).await;
    for email in ["off@park.test", "nobody@park.test"] {
        let err = service.claim(&ctx(email), "R1").await.unwrap_err();
        assert!(matches!(err, ConsoleError::Validation { field: "staff", .. }));
    }
    let err = service.claim(&ctx("s0@park.test"), "R9").await.unwrap_err();
    assert!(matches!(err, ConsoleError::NotFound { .. }));
}

#[tokio::test]
async fn claim_unclaim_close() {
    let service = reports(vec![report("R1", "C1")]).await;
    let claimed = service.claim(&ctx("s0@park.test"), "R1").await.expect("claim");
    assert_eq!(claimed.status, ReportStatus::Open);

    let taken = service.claim(&ctx("s1@park.test"), "R1").await.expect("takeover");
    assert_eq!(taken.staff.as_deref(), Some("s1@park.test"));

    let err = service.unclaim(&ctx("s0@park.test"), "R1").await.unwrap_err();
    assert!(matches!(err, ConsoleError::Conflict(ref reason) if reason.contains("s1@park.test")));

    let err = service
        .close(&ctx("s0@park.test"), "R1", "  ", Utc::now())
        .await
        .unwrap_err();
    assert!(matches!(err, ConsoleError::Validation { field: "response", .. }));

    let closed = service
        .close(&ctx("s0@park.test"), "R1", "refund issued", Utc::now())
        .await
        .expect("close");
    assert_eq!(closed.status, ReportStatus::Closed);

    let err = service.unclaim(&ctx("s0@park.test"), "R1").await.unwrap_err();
    assert!(matches!(err, ConsoleError::Conflict(_)));

    let detail = service.get("R1").await.expect("get");
    assert_eq!(detail.report.response.as_deref(), Some("refund issued"));
    assert!(detail.chats.is_empty());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_claims_for_one_customer_admit_one() {
    let service = reports(vec![
        report("R1", "C1"),
        report("R2", "C1"),
        report("R3", "C1"),
        report("R4", "C1"),
    ])
    .await;

    let mut handles = Vec::new();
    for (idx, rid) in ["R1", "R2", "R3", "R4"].into_iter().enumerate() {
        let service = service.clone();
        handles.push(tokio::spawn(async move {
            service.claim(&ctx(&format!("s{idx}@park.test")), rid).await
        }));
    }

    let mut claimed = 0;
    let mut conflicts = 0;
    for handle in handles {
        match handle.await.expect("join") {
            Ok(_) => claimed += 1,
            Err(ConsoleError::Conflict(_)) => conflicts += 1,
            Err(other) => panic!("unexpected error: {other}"),
        }
    }
    assert_eq!(claimed, 1);
    assert_eq!(conflicts, 3);
}

#[tokio::test]
async fn owner_can_unclaim_back_to_pending() {
    let service = reports(vec![report("R1", "C1")]).await;
    service.claim(&ctx("s0@park.test"), "R1").await.expect("claim");
    let released = service.unclaim(&ctx("s0@park.test"), "R1").await.expect("unclaim");
    assert_eq!(released.status, ReportStatus::Pending);
    assert_eq!(released.staff, None);

    let err = service.unclaim(&ctx("s0@park.test"), "R1").await.unwrap_err();
    assert!(matches!(err, ConsoleError::Conflict(_)));
}

#[tokio::test]
async fn reply_requires_open_report() {
    let service = reports(vec![report("R1", "C1")]).await;
    let now = Utc.with_ymd_and_hms(2024, 5, 1, 9, 30, 0).unwrap();

    let err = service
        .reply(&ctx("s0@park.test"), "R1", "on my way", now)
        .await
        .unwrap_err();
    assert!(matches!(err, ConsoleError::Conflict(_)));

    service.claim(&ctx("s0@park.test"), "R1").await.expect("claim");
    let err = service
        .reply(&ctx("s0@park.test"), "R1", "   ", now)
        .await
        .unwrap_err();
    assert!(matches!(err, ConsoleError::Validation { field: "message", .. }));
    let err = service
        .reply(&ctx("nobody@park.test"), "R1", "hi", now)
        .await
        .unwrap_err();
    assert!(matches!(err, ConsoleError::Validation { field: "staff", .. }));

    let chat = service
        .reply(&ctx("s0@park.test"), "R1", " on my way ", now)
        .await
        .expect("reply");
    let ChatRecord::Response { sender, message, timestamp, .. } = chat else {
        panic!("expected response chat");
    };
    assert_eq!(timestamp, now);
    assert_eq!(sender.map(|sender| sender.name).as_deref(), Some("s0@park.test"));
    assert_eq!(
        message,
        ChatMessage::Text {
            text: "on my way".to_string()
        }
    );

    let detail = service.get("R1").await.expect("get");
    assert_eq!(detail.chats.len(), 1);
}

#[tokio::test]
async fn directory_reads_customers_and_staffs() {
    let customers = InMemoryCustomerStore::with_records([(
        CustomerRecord {
            uid: "U1".to_string(),
            display_name: "Anan".to_string(),
            photo_url: None,
        },
        vec![CarRecord {
            license_number: "ABC123".to_string(),
            province: "Bangkok".to_string(),
            brand: "Honda".to_string(),
            color: "red".to_string(),
        }],
    )]);
    let staffs = InMemoryStaffStore::with_records([
        staff_record("b@park.test", false),
        staff_record("a@park.test", true),
    ]);
    let service = DirectoryService::new(Arc::new(customers), Arc::new(staffs));

    let detail = service.customer("U1").await.expect("customer");
    assert_eq!(detail.customer.display_name, "Anan");
    assert_eq!(detail.cars.len(), 1);
    let err = service.customer("U9").await.unwrap_err();
    assert!(matches!(err, ConsoleError::NotFound { kind: "customer", .. }));

    assert_eq!(service.customers().await.expect("list").len(), 1);
    let emails: Vec<String> = service
        .staffs()
        .await
        .expect("staffs")
        .into_iter()
        .map(|staff| staff.email)
        .collect();
    assert_eq!(emails, ["a@park.test", "b@park.test"]);
}
