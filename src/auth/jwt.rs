use crate::error::AppError;
use chrono::{Duration, Utc};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};

const TOKEN_TTL_HOURS: i64 = 24;

#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub login: String,
    pub exp: i64,
}

pub fn issue(login: &str, secret: &str) -> Result<String, AppError> {
    let claims = Claims {
        login: login.to_string(),
        exp: (Utc::now() + Duration::hours(TOKEN_TTL_HOURS)).timestamp(),
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .map_err(|e| AppError::Fatal(anyhow::anyhow!("signing jwt: {e}")))
}

pub fn verify(token: &str, secret: &str) -> Result<Claims, AppError> {
    decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )
    .map(|data| data.claims)
    .map_err(|_| AppError::Unauthorized)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_login() {
        let token = issue("alice", "secret").unwrap();
        let claims = verify(&token, "secret").unwrap();
        assert_eq!(claims.login, "alice");
    }

    #[test]
    fn rejects_wrong_secret() {
        let token = issue("alice", "secret").unwrap();
        assert!(verify(&token, "other-secret").is_err());
    }
}
