use std::sync::Arc;
use uuid::Uuid;

use crate::accrual::model::Accrual;
use crate::accrual::repository::AccrualRepository;
use crate::domain::luhn;
use crate::error::AppError;

pub struct IntakeService {
    repo: Arc<dyn AccrualRepository>,
}

impl IntakeService {
    pub fn new(repo: Arc<dyn AccrualRepository>) -> Self {
        Self { repo }
    }

    /// Registers `order_number` for `user_id` after parsing it to `i64` and
    /// validating its Luhn checksum, in that order -- matching the original
    /// handler's `ParseOrderNumber` (400 on overflow/non-digits) before its
    /// Luhn check (422). Returns `AppError::AlreadyExists` when this exact
    /// user already uploaded it -- a success the HTTP layer reports as 200 OK.
    pub async fn load_order(&self, user_id: Uuid, order_number: &str) -> Result<Accrual, AppError> {
        if luhn::parse(order_number).is_none() {
            return Err(AppError::Validation("order number is not a valid number".to_string()));
        }

        if !luhn::is_valid(order_number) {
            return Err(AppError::InvalidOrderNumber);
        }

        self.repo.create_order(user_id, order_number).await
    }

    pub async fn list_orders(&self, user_id: Uuid) -> Result<Vec<Accrual>, AppError> {
        self.repo.list_for_user(user_id).await
    }
}
