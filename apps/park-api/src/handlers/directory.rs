//! 客户与值班人员
//!
//! - GET /customers
//! - GET /customers/{uid}：客户 + 登记车辆
//! - GET /staffs

use crate::AppState;
use crate::middleware::require_staff;
use crate::utils::response::{car_to_dto, console_error, customer_to_dto, staff_to_dto};
use api_contract::{ApiResponse, CustomerDetailDto, CustomerDto, StaffDto};
use axum::{
    Json,
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
};

pub async fn list_customers(State(state): State<AppState>, headers: HeaderMap) -> Response {
    if let Err(response) = require_staff(&state, &headers) {
        return response;
    }
    match state.directory.customers().await {
        Ok(records) => {
            let data: Vec<CustomerDto> = records.into_iter().map(customer_to_dto).collect();
            (StatusCode::OK, Json(ApiResponse::success(data))).into_response()
        }
        Err(err) => console_error(err),
    }
}

pub async fn get_customer(
    State(state): State<AppState>,
    Path(uid): Path<String>,
    headers: HeaderMap,
) -> Response {
    if let Err(response) = require_staff(&state, &headers) {
        return response;
    }
    match state.directory.customer(&uid).await {
        Ok(detail) => {
            let data = CustomerDetailDto {
                customer: customer_to_dto(detail.customer),
                cars: detail.cars.into_iter().map(car_to_dto).collect(),
            };
            (StatusCode::OK, Json(ApiResponse::success(data))).into_response()
        }
        Err(err) => console_error(err),
    }
}

pub async fn list_staffs(State(state): State<AppState>, headers: HeaderMap) -> Response {
    if let Err(response) = require_staff(&state, &headers) {
        return response;
    }
    match state.directory.staffs().await {
        Ok(records) => {
            let data: Vec<StaffDto> = records.into_iter().map(staff_to_dto).collect();
            (StatusCode::OK, Json(ApiResponse::success(data))).into_response()
        }
        Err(err) => console_error(err),
    }
}
