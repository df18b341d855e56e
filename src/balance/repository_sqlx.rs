use std::sync::Arc;

use async_trait::async_trait;
use rust_decimal::Decimal;
use sqlx::{PgPool, Row};
use uuid::Uuid;

use crate::balance::model::Withdrawal;
use crate::balance::repository::BalanceRepository;
use crate::error::AppError;

pub struct SqlxBalanceRepository {
    pool: Arc<PgPool>,
}

impl SqlxBalanceRepository {
    pub fn new(pool: Arc<PgPool>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl BalanceRepository for SqlxBalanceRepository {
    async fn accrued_total(&self, user_id: Uuid) -> Result<Decimal, AppError> {
        let row = sqlx::query(
            r#"
SELECT COALESCE(SUM(accrual), 0) AS total
FROM loyalty_points_accrual
WHERE user_id = $1 AND status = 'PROCESSED';
"#,
        )
        .bind(user_id)
        .fetch_one(&*self.pool)
        .await?;

        Ok(row.get("total"))
    }

    async fn withdrawn_total(&self, user_id: Uuid) -> Result<Decimal, AppError> {
        let row = sqlx::query(
            r#"
SELECT COALESCE(SUM(sum), 0) AS total
FROM loyalty_points_withdrawn
WHERE user_id = $1;
"#,
        )
        .bind(user_id)
        .fetch_one(&*self.pool)
        .await?;

        Ok(row.get("total"))
    }

    async fn list_withdrawals(&self, user_id: Uuid) -> Result<Vec<Withdrawal>, AppError> {
        let rows = sqlx::query(
            r#"
SELECT order_number, sum, processed_at
FROM loyalty_points_withdrawn
WHERE user_id = $1
ORDER BY processed_at ASC;
"#,
        )
        .bind(user_id)
        .fetch_all(&*self.pool)
        .await?;

        Ok(rows
            .iter()
            .map(|r| Withdrawal {
                order_number: r.get("order_number"),
                sum: r.get("sum"),
                processed_at: r.get("processed_at"),
            })
            .collect())
    }

    async fn withdraw(&self, user_id: Uuid, order_number: &str, sum: Decimal) -> Result<(), AppError> {
        let mut tx = self.pool.begin().await?;

        // Scopes concurrent withdrawals by the same user to one at a time,
        // so the balance check below can't race against another withdrawal
        // from the same account within this transaction's lifetime.
        sqlx::query("SELECT pg_advisory_xact_lock(hashtext($1::text)::bigint)")
            .bind(user_id)
            .execute(&mut *tx)
            .await?;

        let accrued_row = sqlx::query(
            r#"SELECT COALESCE(SUM(accrual), 0) AS total FROM loyalty_points_accrual WHERE user_id = $1 AND status = 'PROCESSED';"#,
        )
        .bind(user_id)
        .fetch_one(&mut *tx)
        .await?;
        let accrued: Decimal = accrued_row.get("total");

        let withdrawn_row = sqlx::query(
            r#"SELECT COALESCE(SUM(sum), 0) AS total FROM loyalty_points_withdrawn WHERE user_id = $1;"#,
        )
        .bind(user_id)
        .fetch_one(&mut *tx)
        .await?;
        let withdrawn: Decimal = withdrawn_row.get("total");

        let current = accrued - withdrawn;
        if crate::domain::money::compare(current, sum) == std::cmp::Ordering::Less {
            return Err(AppError::PaymentRequired);
        }

        sqlx::query(
            r#"INSERT INTO loyalty_points_withdrawn (order_number, user_id, sum) VALUES ($1, $2, $3);"#,
        )
        .bind(order_number)
        .bind(user_id)
        .bind(sum)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(())
    }
}
