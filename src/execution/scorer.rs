use std::time::Duration;

use async_trait::async_trait;
use backoff::ExponentialBackoff;
use backoff::future::retry;

use crate::accrual::model::{ScorerResponse, ScorerStatus};

#[async_trait]
pub trait OrderScorer: Send + Sync {
    async fn fetch(&self, order_number: &str) -> Result<ScorerResponse, ScorerError>;
}

/// Talks to the external accrual-scoring system over HTTP, with a retry
/// policy tuned to match the one the original service used against the same
/// upstream: short initial backoff, aggressive multiplier, capped at 60s
/// per attempt and 120s total, since the upstream itself rate-limits hard.
pub struct ScorerClient {
    http: reqwest::Client,
    base_url: String,
}

#[derive(Debug, thiserror::Error)]
pub enum ScorerError {
    #[error("order not yet registered with the accrual system")]
    NotRegistered,
    #[error("upstream request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("upstream returned an unexpected status: {0}")]
    UnexpectedStatus(reqwest::StatusCode),
}

impl ScorerClient {
    pub fn new(base_url: String) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url,
        }
    }

    fn backoff_policy() -> ExponentialBackoff {
        ExponentialBackoff {
            initial_interval: Duration::from_secs(1),
            multiplier: 5.0,
            randomization_factor: 0.0,
            max_interval: Duration::from_secs(60),
            max_elapsed_time: Some(Duration::from_secs(120)),
            ..Default::default()
        }
    }

    async fn fetch_once(&self, order_number: &str) -> Result<ScorerResponse, ScorerError> {
        let url = format!("{}/api/orders/{order_number}", self.base_url);
        let response = self.http.get(&url).send().await?;

        match response.status() {
            reqwest::StatusCode::OK => Ok(response.json::<ScorerResponse>().await?),
            reqwest::StatusCode::NO_CONTENT => Err(ScorerError::NotRegistered),
            status => Err(ScorerError::UnexpectedStatus(status)),
        }
    }
}

#[async_trait]
impl OrderScorer for ScorerClient {
    /// Fetches the current score for `order_number`, retrying transient
    /// failures (429, 5xx, network errors) under the policy above. A 204
    /// (order unknown upstream yet) is reported as [`ScorerError::NotRegistered`]
    /// without retrying -- the next scheduler tick will pick it up again.
    async fn fetch(&self, order_number: &str) -> Result<ScorerResponse, ScorerError> {
        retry(Self::backoff_policy(), || async {
            self.fetch_once(order_number).await.map_err(|e| match &e {
                ScorerError::NotRegistered => backoff::Error::Permanent(e),
                ScorerError::UnexpectedStatus(status) if status.as_u16() < 500 && status.as_u16() != 429 => {
                    backoff::Error::Permanent(e)
                }
                _ => backoff::Error::transient(e),
            })
        })
        .await
    }
}

impl ScorerResponse {
    pub fn is_terminal(&self) -> bool {
        matches!(self.status, ScorerStatus::Invalid | ScorerStatus::Processed)
    }
}
