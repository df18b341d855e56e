use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;
use thiserror::Error;

/// Closed set of domain error kinds, matched once at the HTTP boundary.
///
/// `RequestProcessing` never reaches a handler: the worker pool retries it
/// internally and never propagates it upward.
#[derive(Error, Debug)]
pub enum AppError {
    #[error("already uploaded by this user")]
    AlreadyExists,

    #[error("conflict: {0}")]
    Conflict(String),

    #[error("unauthorized")]
    Unauthorized,

    #[error("payment required")]
    PaymentRequired,

    #[error("validation failed: {0}")]
    Validation(String),

    #[error("luhn check failed")]
    InvalidOrderNumber,

    #[error("transient upstream failure: {0}")]
    RequestProcessing(String),

    #[error(transparent)]
    Fatal(#[from] anyhow::Error),
}

impl From<sqlx::Error> for AppError {
    fn from(err: sqlx::Error) -> Self {
        AppError::Fatal(anyhow::Error::new(err))
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            AppError::AlreadyExists => (StatusCode::OK, self.to_string()),
            AppError::Conflict(_) => (StatusCode::CONFLICT, self.to_string()),
            AppError::Unauthorized => (StatusCode::UNAUTHORIZED, self.to_string()),
            AppError::PaymentRequired => (StatusCode::PAYMENT_REQUIRED, self.to_string()),
            AppError::Validation(_) => (StatusCode::BAD_REQUEST, self.to_string()),
            AppError::InvalidOrderNumber => (StatusCode::UNPROCESSABLE_ENTITY, self.to_string()),
            AppError::RequestProcessing(_) => {
                tracing::error!("RequestProcessing error leaked to HTTP boundary");
                (StatusCode::INTERNAL_SERVER_ERROR, "internal error".to_string())
            }
            AppError::Fatal(err) => {
                tracing::error!(error = ?err, "fatal error serving request");
                (StatusCode::INTERNAL_SERVER_ERROR, "internal error".to_string())
            }
        };

        (status, Json(json!({ "message": message }))).into_response()
    }
}
