//! 认证和授权中间件
//!
//! 提供以下中间件和辅助函数：
//! - request_context：请求上下文中间件，注入 request_id/trace_id
//! - bearer_token：从 Authorization 头提取 Bearer token
//! - require_staff：校验 ID Token，得到值班人员上下文
//! - require_admin：要求 `admin` 声明
//!
//! 认证流程：
//! 1. request_context：在所有请求前注入追踪 ID
//! 2. bearer_token：从请求头提取 token
//! 3. require_staff：校验签名与 `staff` 声明，获取 StaffContext

use axum::{
    body::Body,
    extract::Request,
    http::{HeaderMap, HeaderValue, StatusCode, header},
    middleware::Next,
    response::Response,
};
use domain::StaffContext;
use park_auth::AuthError;
use park_telemetry::new_request_ids;
use tracing::{Instrument, info_span, warn};

use crate::AppState;
use crate::utils::response::{auth_error, forbidden_error, not_staff_error};

/// 请求上下文中间件：注入 request_id/trace_id
pub async fn request_context(mut req: Request<Body>, next: Next) -> Response {
    let ids = new_request_ids();
    let method = req.method().clone();
    let path = req.uri().path().to_string();
    req.extensions_mut().insert(ids.clone());

    let span = info_span!(
        "request",
        request_id = %ids.request_id,
        trace_id = %ids.trace_id,
        method = %method,
        path = %path
    );

    let mut response: Response = next.run(req).instrument(span).await;
    response.headers_mut().insert(
        "x-request-id",
        HeaderValue::from_str(&ids.request_id).unwrap_or_else(|_| HeaderValue::from_static("")),
    );
    response.headers_mut().insert(
        "x-trace-id",
        HeaderValue::from_str(&ids.trace_id).unwrap_or_else(|_| HeaderValue::from_static("")),
    );
    response
}

/// 从请求头中提取 Bearer token
pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    let header_value = headers.get(header::AUTHORIZATION)?;
    let auth_str = header_value.to_str().ok()?;
    auth_str.strip_prefix("Bearer ")
}

/// 验证 ID Token 并提取值班人员上下文
pub fn require_staff(state: &AppState, headers: &HeaderMap) -> Result<StaffContext, Response> {
    let Some(token) = bearer_token(headers) else {
        return Err(auth_error(StatusCode::UNAUTHORIZED));
    };
    match state.verifier.verify(token) {
        Ok(ctx) => Ok(ctx),
        Err(AuthError::NotStaff) => Err(not_staff_error()),
        Err(err @ (AuthError::TokenInvalid | AuthError::TokenExpired)) => {
            warn!(target: "park.api", error = %err, "token_rejected");
            Err(auth_error(StatusCode::UNAUTHORIZED))
        }
        Err(err) => {
            warn!(target: "park.api", error = %err, "token_verifier_failed");
            Err(auth_error(StatusCode::UNAUTHORIZED))
        }
    }
}

/// 要求管理员
pub fn require_admin(ctx: &StaffContext) -> Result<(), Response> {
    if ctx.is_admin {
        Ok(())
    } else {
        Err(forbidden_error())
    }
}
