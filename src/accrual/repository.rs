use async_trait::async_trait;
use rust_decimal::Decimal;
use uuid::Uuid;

use crate::accrual::model::{Accrual, AccrualStatus};
use crate::error::AppError;

/// Outcome of a single scored order, ready to be committed back by a worker.
pub struct AccrualOutcome {
    pub order_number: String,
    pub status: AccrualStatus,
    pub accrual: Option<Decimal>,
}

#[async_trait]
pub trait AccrualRepository: Send + Sync {
    /// Registers a new order for processing. Disambiguates the two ways an
    /// insert can collide: the same user re-uploading (AlreadyExists, which
    /// the HTTP layer reports as success) versus a different user claiming
    /// an order number already owned by someone else (Conflict).
    async fn create_order(&self, user_id: Uuid, order_number: &str) -> Result<Accrual, AppError>;

    async fn list_for_user(&self, user_id: Uuid) -> Result<Vec<Accrual>, AppError>;

    /// Atomically claims up to `limit` orders in NEW or PROCESSING state that
    /// are not already locked by another worker, and marks them locked +
    /// PROCESSING in the same transaction.
    async fn claim_batch(&self, limit: i64) -> Result<Vec<Accrual>, AppError>;

    /// Applies scored results and releases the processing lock on every
    /// order in the batch, whether or not it appears in `outcomes`.
    async fn commit_batch(
        &self,
        batch: &[Accrual],
        outcomes: &[AccrualOutcome],
    ) -> Result<(), AppError>;
}
