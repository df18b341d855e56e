use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, Serialize)]
pub struct Balance {
    pub current: Decimal,
    pub withdrawn: Decimal,
}

#[derive(Clone, Debug)]
pub struct Withdrawal {
    pub order_number: String,
    pub sum: Decimal,
    pub processed_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
pub struct WithdrawRequestDto {
    pub order: String,
    pub sum: Decimal,
}

#[derive(Debug, Serialize)]
pub struct WithdrawalDto {
    pub order: String,
    pub sum: Decimal,
    pub processed_at: String,
}

impl From<Withdrawal> for WithdrawalDto {
    fn from(w: Withdrawal) -> Self {
        WithdrawalDto {
            order: w.order_number,
            sum: w.sum,
            processed_at: crate::time::format_rfc3339(w.processed_at),
        }
    }
}
