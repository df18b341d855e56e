pub mod schema;
use std::sync::Arc;

use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;

#[derive(Clone)]
pub struct Db {
    pub pool: Arc<PgPool>,
}

impl Db {
    pub async fn connect(database_uri: &str) -> anyhow::Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(16)
            .connect(database_uri)
            .await?;

        Ok(Self {
            pool: Arc::new(pool),
        })
    }

    pub async fn migrate(&self) -> anyhow::Result<()> {
        schema::migrate(&self.pool).await
    }

    /// Clears any `processing_lock` left set by a worker that crashed mid-batch.
    /// Run once at startup, before the scheduler begins claiming work.
    pub async fn recover_uncommitted(&self) -> anyhow::Result<u64> {
        let result = sqlx::query(
            r#"UPDATE loyalty_points_accrual SET processing_lock = false WHERE processing_lock = true"#,
        )
        .execute(&*self.pool)
        .await?;

        Ok(result.rows_affected())
    }
}
