//! 停车场控制台 HTTP API。
//!
//! - `state`：共享状态（存储、投影器、命令下发、值班操作）
//! - `routes`：路由表
//! - `handlers`：各资源的处理函数
//! - `middleware`：请求追踪 ID、Bearer 认证
//! - `utils`：统一错误响应、DTO 转换、输入校验

pub mod handlers;
pub mod middleware;
pub mod routes;
pub mod state;
pub mod utils;

pub use state::{AppState, Stores};

use axum::Router;
use tower_http::trace::TraceLayer;

/// 组装完整应用：路由 + 状态 + 中间件。
pub fn build_app(state: AppState) -> Router {
    routes::create_api_router()
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(axum::middleware::from_fn(middleware::request_context))
}
