use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

use crate::balance::model::WithdrawalDto;
use crate::error::AppError;
use crate::http::state::AppState;
use crate::session::context::AuthUser;

pub async fn list(State(state): State<AppState>, AuthUser(user): AuthUser) -> Result<Response, AppError> {
    let withdrawals = state.balance_engine.list_withdrawals(user.id).await?;

    if withdrawals.is_empty() {
        return Ok(StatusCode::NO_CONTENT.into_response());
    }

    let dtos: Vec<WithdrawalDto> = withdrawals.into_iter().map(WithdrawalDto::from).collect();
    Ok(Json(dtos).into_response())
}
