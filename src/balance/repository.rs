use async_trait::async_trait;
use rust_decimal::Decimal;
use uuid::Uuid;

use crate::balance::model::Withdrawal;
use crate::error::AppError;

#[async_trait]
pub trait BalanceRepository: Send + Sync {
    /// Sum of all PROCESSED accruals for this user.
    async fn accrued_total(&self, user_id: Uuid) -> Result<Decimal, AppError>;

    /// Sum of all recorded withdrawals for this user.
    async fn withdrawn_total(&self, user_id: Uuid) -> Result<Decimal, AppError>;

    async fn list_withdrawals(&self, user_id: Uuid) -> Result<Vec<Withdrawal>, AppError>;

    /// Takes out `sum` against the user's current balance under an
    /// advisory lock scoped to `user_id`, so concurrent withdrawals from the
    /// same user serialize instead of racing on a stale balance read.
    /// Returns `AppError::PaymentRequired` if the balance is insufficient.
    async fn withdraw(&self, user_id: Uuid, order_number: &str, sum: Decimal) -> Result<(), AppError>;
}
