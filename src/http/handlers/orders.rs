use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

use crate::accrual::model::OrderDto;
use crate::error::AppError;
use crate::http::state::AppState;
use crate::session::context::AuthUser;

/// Accepts a plain-text order number in the request body -- matching the
/// original upload endpoint's `text/plain` contract rather than JSON.
pub async fn upload(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    body: String,
) -> Result<StatusCode, AppError> {
    let order_number = body.trim();
    if order_number.is_empty() {
        return Err(AppError::Validation("order number must not be empty".to_string()));
    }

    match state.intake_service.load_order(user.id, order_number).await {
        Ok(_) => Ok(StatusCode::ACCEPTED),
        Err(AppError::AlreadyExists) => Ok(StatusCode::OK),
        Err(e) => Err(e),
    }
}

pub async fn list(State(state): State<AppState>, AuthUser(user): AuthUser) -> Result<Response, AppError> {
    let orders = state.intake_service.list_orders(user.id).await?;

    if orders.is_empty() {
        return Ok(StatusCode::NO_CONTENT.into_response());
    }

    let dtos: Vec<OrderDto> = orders.into_iter().map(OrderDto::from).collect();
    Ok(Json(dtos).into_response())
}
