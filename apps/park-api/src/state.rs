//! 应用共享状态。

use park_auth::IdTokenVerifier;
use park_console::{DirectoryService, PaymentService, ReportService, TransactionService};
use park_control::{CommandDispatcher, RealtimeCommandSink};
use park_projection::{LivenessPolicy, NodeProjector};
use park_storage::{
    CustomerStore, FirestoreDocuments, InMemoryCustomerStore, InMemoryPaymentStore,
    InMemoryReportStore, InMemoryStaffStore, InMemoryTransactionStore, PaymentStore,
    RealtimeTree, ReportStore, StaffStore, TransactionStore,
};
use std::sync::Arc;

/// 文档存储集合。
#[derive(Clone)]
pub struct Stores {
    pub transactions: Arc<dyn TransactionStore>,
    pub payments: Arc<dyn PaymentStore>,
    pub reports: Arc<dyn ReportStore>,
    pub staffs: Arc<dyn StaffStore>,
    pub customers: Arc<dyn CustomerStore>,
}

impl Stores {
    /// 内存存储（本地演示与测试）
    pub fn in_memory() -> Self {
        Self {
            transactions: Arc::new(InMemoryTransactionStore::new()),
            payments: Arc::new(InMemoryPaymentStore::new()),
            reports: Arc::new(InMemoryReportStore::new()),
            staffs: Arc::new(InMemoryStaffStore::new()),
            customers: Arc::new(InMemoryCustomerStore::new()),
        }
    }

    /// 所有集合共用同一个 Firestore 连接
    pub fn firestore(documents: FirestoreDocuments) -> Self {
        let documents = Arc::new(documents);
        Self {
            transactions: documents.clone(),
            payments: documents.clone(),
            reports: documents.clone(),
            staffs: documents.clone(),
            customers: documents,
        }
    }
}

#[derive(Clone)]
pub struct AppState {
    pub verifier: Arc<IdTokenVerifier>,
    pub projector: NodeProjector,
    pub dispatcher: CommandDispatcher,
    pub transactions: TransactionService,
    pub payments: PaymentService,
    pub reports: ReportService,
    pub directory: DirectoryService,
}

impl AppState {
    pub fn new(
        verifier: Arc<IdTokenVerifier>,
        tree: Arc<dyn RealtimeTree>,
        stores: Stores,
        liveness: LivenessPolicy,
    ) -> Self {
        let dispatcher = CommandDispatcher::new(Arc::new(RealtimeCommandSink::new(tree.clone())));
        Self {
            verifier,
            projector: NodeProjector::new(tree, stores.transactions.clone(), liveness),
            transactions: TransactionService::new(stores.transactions, dispatcher.clone()),
            payments: PaymentService::new(stores.payments),
            reports: ReportService::new(stores.reports, stores.staffs.clone()),
            directory: DirectoryService::new(stores.customers, stores.staffs),
            dispatcher,
        }
    }
}
