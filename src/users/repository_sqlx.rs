use std::sync::Arc;

use async_trait::async_trait;
use sqlx::{PgPool, Row};

use crate::error::AppError;
use crate::users::model::User;
use crate::users::repository::UserRepository;

pub struct SqlxUserRepository {
    pool: Arc<PgPool>,
}

impl SqlxUserRepository {
    pub fn new(pool: Arc<PgPool>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserRepository for SqlxUserRepository {
    async fn create(&self, login: &str, password_hash: &str) -> Result<User, AppError> {
        let row = sqlx::query(
            r#"
INSERT INTO users (login, password_hash)
VALUES ($1, $2)
RETURNING id, login, password_hash, created_at;
"#,
        )
        .bind(login)
        .bind(password_hash)
        .fetch_one(&*self.pool)
        .await
        .map_err(|e| {
            if let sqlx::Error::Database(ref db_err) = e {
                if db_err.constraint() == Some("users_login_unique") {
                    return AppError::Conflict("login already taken".to_string());
                }
            }
            AppError::from(e)
        })?;

        Ok(row_to_user(&row))
    }

    async fn find_by_login(&self, login: &str) -> Result<Option<User>, AppError> {
        let row = sqlx::query(
            r#"SELECT id, login, password_hash, created_at FROM users WHERE login = $1;"#,
        )
        .bind(login)
        .fetch_optional(&*self.pool)
        .await?;

        Ok(row.as_ref().map(row_to_user))
    }
}

fn row_to_user(r: &sqlx::postgres::PgRow) -> User {
    User {
        id: r.get("id"),
        login: r.get("login"),
        password_hash: r.get("password_hash"),
        created_at: r.get("created_at"),
    }
}
