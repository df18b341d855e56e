use std::sync::Arc;
use uuid::Uuid;

use crate::balance::model::{Balance, Withdrawal};
use crate::balance::repository::BalanceRepository;
use crate::domain::luhn;
use crate::error::AppError;

pub struct BalanceEngine {
    repo: Arc<dyn BalanceRepository>,
}

impl BalanceEngine {
    pub fn new(repo: Arc<dyn BalanceRepository>) -> Self {
        Self { repo }
    }

    pub async fn get_balance(&self, user_id: Uuid) -> Result<Balance, AppError> {
        let current_total = self.repo.accrued_total(user_id).await?;
        let withdrawn = self.repo.withdrawn_total(user_id).await?;

        Ok(Balance {
            current: current_total - withdrawn,
            withdrawn,
        })
    }

    pub async fn withdraw(&self, user_id: Uuid, order_number: &str, sum: rust_decimal::Decimal) -> Result<(), AppError> {
        if sum <= rust_decimal::Decimal::ZERO {
            return Err(AppError::Validation("withdrawal sum must be positive".to_string()));
        }

        if luhn::parse(order_number).is_none() {
            return Err(AppError::Validation("order number is not a valid number".to_string()));
        }

        if !luhn::is_valid(order_number) {
            return Err(AppError::InvalidOrderNumber);
        }

        self.repo.withdraw(user_id, order_number, sum).await
    }

    pub async fn list_withdrawals(&self, user_id: Uuid) -> Result<Vec<Withdrawal>, AppError> {
        self.repo.list_withdrawals(user_id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use chrono::Utc;
    use rust_decimal_macros::dec;
    use std::sync::Mutex;

    struct MockBalanceRepository {
        accrued: Mutex<rust_decimal::Decimal>,
        withdrawn: Mutex<rust_decimal::Decimal>,
        withdrawals: Mutex<Vec<Withdrawal>>,
    }

    #[async_trait]
    impl BalanceRepository for MockBalanceRepository {
        async fn accrued_total(&self, _user_id: Uuid) -> Result<rust_decimal::Decimal, AppError> {
            Ok(*self.accrued.lock().unwrap())
        }

        async fn withdrawn_total(&self, _user_id: Uuid) -> Result<rust_decimal::Decimal, AppError> {
            Ok(*self.withdrawn.lock().unwrap())
        }

        async fn list_withdrawals(&self, _user_id: Uuid) -> Result<Vec<Withdrawal>, AppError> {
            Ok(self.withdrawals.lock().unwrap().clone())
        }

        async fn withdraw(
            &self,
            _user_id: Uuid,
            order_number: &str,
            sum: rust_decimal::Decimal,
        ) -> Result<(), AppError> {
            let current = *self.accrued.lock().unwrap() - *self.withdrawn.lock().unwrap();
            if crate::domain::money::compare(current, sum) == std::cmp::Ordering::Less {
                return Err(AppError::PaymentRequired);
            }
            *self.withdrawn.lock().unwrap() += sum;
            self.withdrawals.lock().unwrap().push(Withdrawal {
                order_number: order_number.to_string(),
                sum,
                processed_at: Utc::now(),
            });
            Ok(())
        }
    }

    fn engine(accrued: rust_decimal::Decimal) -> BalanceEngine {
        BalanceEngine::new(Arc::new(MockBalanceRepository {
            accrued: Mutex::new(accrued),
            withdrawn: Mutex::new(rust_decimal::Decimal::ZERO),
            withdrawals: Mutex::new(Vec::new()),
        }))
    }

    #[tokio::test]
    async fn withdraw_rejects_bad_luhn() {
        let eng = engine(dec!(1000));
        let result = eng.withdraw(Uuid::new_v4(), "1234567890", dec!(1)).await;
        assert!(matches!(result, Err(AppError::InvalidOrderNumber)));
    }

    #[tokio::test]
    async fn withdraw_rejects_insufficient_balance() {
        let eng = engine(dec!(10));
        let result = eng.withdraw(Uuid::new_v4(), "12345678903", dec!(100)).await;
        assert!(matches!(result, Err(AppError::PaymentRequired)));
    }

    #[tokio::test]
    async fn withdraw_succeeds_and_updates_balance() {
        let eng = engine(dec!(1000));
        let user = Uuid::new_v4();
        eng.withdraw(user, "12345678903", dec!(100)).await.unwrap();
        let balance = eng.get_balance(user).await.unwrap();
        assert_eq!(balance.withdrawn, dec!(100));
        assert_eq!(balance.current, dec!(900));
    }
}
