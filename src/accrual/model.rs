use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum AccrualStatus {
    New,
    Processing,
    Invalid,
    Processed,
}

impl AccrualStatus {
    pub fn as_db_str(self) -> &'static str {
        match self {
            AccrualStatus::New => "NEW",
            AccrualStatus::Processing => "PROCESSING",
            AccrualStatus::Invalid => "INVALID",
            AccrualStatus::Processed => "PROCESSED",
        }
    }

    pub fn from_db_str(s: &str) -> Option<Self> {
        match s {
            "NEW" => Some(AccrualStatus::New),
            "PROCESSING" => Some(AccrualStatus::Processing),
            "INVALID" => Some(AccrualStatus::Invalid),
            "PROCESSED" => Some(AccrualStatus::Processed),
            _ => None,
        }
    }
}

#[derive(Clone, Debug)]
pub struct Accrual {
    pub order_number: String,
    pub user_id: Uuid,
    pub status: AccrualStatus,
    pub accrual: Option<Decimal>,
    pub uploaded_at: DateTime<Utc>,
    pub processed_at: Option<DateTime<Utc>>,
}

/// Matches the upstream accrual system's response shape for a scored order.
#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ScorerStatus {
    Registered,
    Processing,
    Invalid,
    Processed,
}

#[derive(Clone, Debug, Deserialize)]
pub struct ScorerResponse {
    pub order: String,
    pub status: ScorerStatus,
    pub accrual: Option<Decimal>,
}

#[derive(Debug, Serialize)]
pub struct OrderDto {
    pub number: String,
    pub status: AccrualStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub accrual: Option<Decimal>,
    pub uploaded_at: String,
}

impl From<Accrual> for OrderDto {
    fn from(a: Accrual) -> Self {
        OrderDto {
            number: a.order_number,
            status: a.status,
            accrual: a.accrual,
            uploaded_at: crate::time::format_rfc3339(a.uploaded_at),
        }
    }
}
