use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;

use crate::error::AppError;
use crate::http::state::AppState;
use crate::users::model::{AuthResponseDto, CredentialsDto};

pub async fn register(
    State(state): State<AppState>,
    Json(body): Json<CredentialsDto>,
) -> Result<(StatusCode, Json<AuthResponseDto>), AppError> {
    if body.login.trim().is_empty() || body.password.is_empty() {
        return Err(AppError::Validation("login and password are required".to_string()));
    }

    let token = state.user_service.register(&body.login, &body.password).await?;
    Ok((StatusCode::OK, Json(AuthResponseDto { token })))
}

pub async fn login(
    State(state): State<AppState>,
    Json(body): Json<CredentialsDto>,
) -> Result<(StatusCode, Json<AuthResponseDto>), AppError> {
    if body.login.trim().is_empty() || body.password.is_empty() {
        return Err(AppError::Validation("login and password are required".to_string()));
    }

    let token = state.user_service.authenticate(&body.login, &body.password).await?;
    Ok((StatusCode::OK, Json(AuthResponseDto { token })))
}
