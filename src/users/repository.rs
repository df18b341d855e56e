use async_trait::async_trait;

use crate::error::AppError;
use crate::users::model::User;

#[async_trait]
pub trait UserRepository: Send + Sync {
    async fn create(&self, login: &str, password_hash: &str) -> Result<User, AppError>;

    async fn find_by_login(&self, login: &str) -> Result<Option<User>, AppError>;
}
