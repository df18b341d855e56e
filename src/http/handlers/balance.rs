use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;

use crate::balance::model::{Balance, WithdrawRequestDto};
use crate::error::AppError;
use crate::http::state::AppState;
use crate::session::context::AuthUser;

pub async fn get(State(state): State<AppState>, AuthUser(user): AuthUser) -> Result<Json<Balance>, AppError> {
    Ok(Json(state.balance_engine.get_balance(user.id).await?))
}

pub async fn withdraw(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Json(body): Json<WithdrawRequestDto>,
) -> Result<StatusCode, AppError> {
    state
        .balance_engine
        .withdraw(user.id, &body.order, body.sum)
        .await?;
    Ok(StatusCode::OK)
}
