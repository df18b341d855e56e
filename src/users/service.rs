use std::sync::Arc;

use crate::auth::{jwt, password};
use crate::error::AppError;
use crate::users::model::User;
use crate::users::repository::UserRepository;

pub struct UserService {
    repo: Arc<dyn UserRepository>,
    jwt_secret: String,
}

impl UserService {
    pub fn new(repo: Arc<dyn UserRepository>, jwt_secret: String) -> Self {
        Self { repo, jwt_secret }
    }

    /// Registers a new login, which must be 5..30 characters, matching the
    /// `User` data model's constraint on the `login` field.
    pub async fn register(&self, login: &str, plain_password: &str) -> Result<String, AppError> {
        if !(5..=30).contains(&login.chars().count()) {
            return Err(AppError::Validation(
                "login must be between 5 and 30 characters".to_string(),
            ));
        }

        let hash = password::hash(plain_password)?;
        let user = self.repo.create(login, &hash).await?;
        jwt::issue(&user.login, &self.jwt_secret)
    }

    pub async fn authenticate(&self, login: &str, plain_password: &str) -> Result<String, AppError> {
        let user = self
            .repo
            .find_by_login(login)
            .await?
            .ok_or(AppError::Unauthorized)?;

        if !password::verify(plain_password, &user.password_hash)? {
            return Err(AppError::Unauthorized);
        }

        jwt::issue(&user.login, &self.jwt_secret)
    }

    /// Resolves the logged-in user from a verified JWT's `login` claim.
    /// Any failure here collapses to Unauthorized, matching the original
    /// service's "can't prove who you are" contract.
    pub async fn current_user(&self, login: &str) -> Result<User, AppError> {
        self.repo
            .find_by_login(login)
            .await?
            .ok_or(AppError::Unauthorized)
    }
}
