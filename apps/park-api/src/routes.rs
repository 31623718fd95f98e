//! 路由定义
//!
//! 集中管理所有 API 路由，将路径映射到对应的 handlers。
//! 路由包括：
//! - 健康检查与指标：/health, /metrics
//! - 节点状态与命令：/nodes/:node/*
//! - 全局设置：/settings
//! - 交易与支付：/transactions/*, /payments/pending
//! - 客户工单：/reports/*
//! - 客户与值班人员：/customers/*, /staffs

use super::AppState;
use super::handlers::*;
use axum::{
    Router,
    routing::{get, post, put},
};

/// 创建 API 路由
pub fn create_api_router() -> Router<AppState> {
    Router::new()
        .route("/health", get(health))
        .route("/metrics", get(get_metrics))
        .route("/nodes/:node", get(get_node))
        .route("/nodes/:node/events", get(node_events))
        .route("/nodes/:node/barricade", post(control_barricade))
        .route("/nodes/:node/hover-cms", post(set_hover_cms))
        .route("/nodes/:node/car-cms", post(set_car_cms))
        .route("/nodes/:node/alpr/clear", post(clear_license_number))
        .route("/nodes/:node/state/idle", post(set_state_initial))
        .route("/settings", get(get_settings).put(put_settings))
        .route(
            "/transactions",
            get(list_transactions).post(add_transaction),
        )
        .route(
            "/transactions/:tid",
            get(get_transaction).put(edit_transaction),
        )
        .route("/transactions/:tid/cancel", post(cancel_transaction))
        .route("/transactions/:tid/exit", post(exit_transaction))
        .route(
            "/transactions/:tid/payments",
            get(list_transaction_payments),
        )
        .route(
            "/transactions/:tid/payments/:pid",
            put(apply_payment_action),
        )
        .route("/payments/pending", get(list_pending_payments))
        .route("/reports", get(list_reports))
        .route("/reports/:rid", get(get_report))
        .route("/reports/:rid/claim", post(claim_report))
        .route("/reports/:rid/unclaim", post(unclaim_report))
        .route("/reports/:rid/chats", post(reply_report))
        .route("/reports/:rid/close", post(close_report))
        .route("/customers", get(list_customers))
        .route("/customers/:uid", get(get_customer))
        .route("/staffs", get(list_staffs))
}
