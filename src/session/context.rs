use axum::extract::FromRequestParts;
use axum::http::request::Parts;

use crate::auth::jwt;
use crate::error::AppError;
use crate::http::state::AppState;
use crate::users::model::User;

/// The caller identity resolved from a verified JWT, extractable directly
/// in handler signatures for every route behind the authenticated group.
pub struct AuthUser(pub User);

impl FromRequestParts<AppState> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let header = parts
            .headers
            .get(axum::http::header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .ok_or(AppError::Unauthorized)?;

        let token = header
            .strip_prefix("Bearer ")
            .ok_or(AppError::Unauthorized)?;

        let claims = jwt::verify(token, &state.jwt_secret)?;
        let user = state.user_service.current_user(&claims.login).await?;

        Ok(AuthUser(user))
    }
}
