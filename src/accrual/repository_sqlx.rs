use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use sqlx::{PgPool, Row};
use uuid::Uuid;

use crate::accrual::model::{Accrual, AccrualStatus};
use crate::accrual::repository::{AccrualOutcome, AccrualRepository};
use crate::error::AppError;

pub struct SqlxAccrualRepository {
    pool: Arc<PgPool>,
}

impl SqlxAccrualRepository {
    pub fn new(pool: Arc<PgPool>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl AccrualRepository for SqlxAccrualRepository {
    async fn create_order(&self, user_id: Uuid, order_number: &str) -> Result<Accrual, AppError> {
        let row = sqlx::query(
            r#"
INSERT INTO loyalty_points_accrual (order_number, user_id, status)
VALUES ($1, $2, 'NEW')
RETURNING order_number, user_id, status, accrual, uploaded_at, processed_at;
"#,
        )
        .bind(order_number)
        .bind(user_id)
        .fetch_one(&*self.pool)
        .await
        .map_err(|e| {
            if let sqlx::Error::Database(ref db_err) = e {
                match db_err.constraint() {
                    Some("pk_loyalty_points_accrual") => return AppError::AlreadyExists,
                    Some("loyalty_points_accrual_order_number_unique") => {
                        return AppError::Conflict("order already registered by another user".to_string());
                    }
                    _ => {}
                }
            }
            AppError::from(e)
        })?;

        row_to_accrual(&row)
    }

    async fn list_for_user(&self, user_id: Uuid) -> Result<Vec<Accrual>, AppError> {
        let rows = sqlx::query(
            r#"
SELECT order_number, user_id, status, accrual, uploaded_at, processed_at
FROM loyalty_points_accrual
WHERE user_id = $1
ORDER BY uploaded_at ASC;
"#,
        )
        .bind(user_id)
        .fetch_all(&*self.pool)
        .await?;

        rows.iter().map(row_to_accrual).collect()
    }

    async fn claim_batch(&self, limit: i64) -> Result<Vec<Accrual>, AppError> {
        let rows = sqlx::query(
            r#"
WITH claimed AS (
    SELECT order_number, user_id
    FROM loyalty_points_accrual
    WHERE status IN ('NEW', 'PROCESSING') AND processing_lock = false
    ORDER BY uploaded_at
    LIMIT $1
    FOR UPDATE SKIP LOCKED
)
UPDATE loyalty_points_accrual a
SET processing_lock = true, status = 'PROCESSING'
FROM claimed c
WHERE a.order_number = c.order_number AND a.user_id = c.user_id
RETURNING a.order_number, a.user_id, a.status, a.accrual, a.uploaded_at, a.processed_at;
"#,
        )
        .bind(limit)
        .fetch_all(&*self.pool)
        .await?;

        rows.iter().map(row_to_accrual).collect()
    }

    async fn commit_batch(
        &self,
        batch: &[Accrual],
        outcomes: &[AccrualOutcome],
    ) -> Result<(), AppError> {
        let mut tx = self.pool.begin().await?;

        let by_order: HashMap<&str, &AccrualOutcome> =
            outcomes.iter().map(|o| (o.order_number.as_str(), o)).collect();

        for accrual in batch {
            match by_order.get(accrual.order_number.as_str()) {
                Some(outcome) => {
                    let terminal = matches!(
                        outcome.status,
                        AccrualStatus::Processed | AccrualStatus::Invalid
                    );
                    sqlx::query(
                        r#"
UPDATE loyalty_points_accrual
SET status = $1, accrual = $2, processing_lock = false,
    processed_at = CASE WHEN $5 THEN now() ELSE processed_at END
WHERE order_number = $3 AND user_id = $4;
"#,
                    )
                    .bind(outcome.status.as_db_str())
                    .bind(outcome.accrual)
                    .bind(&accrual.order_number)
                    .bind(accrual.user_id)
                    .bind(terminal)
                    .execute(&mut *tx)
                    .await?;
                }
                None => {
                    // No response yet from the upstream scorer -- release the
                    // lock so the next tick retries it, leave status as-is.
                    sqlx::query(
                        r#"
UPDATE loyalty_points_accrual
SET processing_lock = false
WHERE order_number = $1 AND user_id = $2;
"#,
                    )
                    .bind(&accrual.order_number)
                    .bind(accrual.user_id)
                    .execute(&mut *tx)
                    .await?;
                }
            }
        }

        tx.commit().await?;
        Ok(())
    }
}

fn row_to_accrual(r: &sqlx::postgres::PgRow) -> Result<Accrual, AppError> {
    let status_str: String = r.get("status");
    let status = AccrualStatus::from_db_str(&status_str)
        .ok_or_else(|| AppError::Fatal(anyhow::anyhow!("unknown accrual status: {status_str}")))?;

    Ok(Accrual {
        order_number: r.get("order_number"),
        user_id: r.get("user_id"),
        status,
        accrual: r.get("accrual"),
        uploaded_at: r.get("uploaded_at"),
        processed_at: r.get("processed_at"),
    })
}
