use std::sync::Arc;
use std::sync::atomic::Ordering;

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::accrual::model::{Accrual, AccrualStatus};
use crate::accrual::repository::{AccrualOutcome, AccrualRepository};
use crate::execution::scorer::{OrderScorer, ScorerError};
use crate::logger::warn_if_slow;
use crate::metrics::counters::Counters;

/// Fixed-size pool of workers draining claimed batches off a bounded queue.
/// Each batch is scored and committed as a unit: either every order in it
/// gets a fresh status, or (on upstream failure) the batch's processing
/// lock is simply released for the next scheduler tick to retry.
pub struct WorkerPool {
    repo: Arc<dyn AccrualRepository>,
    scorer: Arc<dyn OrderScorer>,
    counters: Counters,
}

impl WorkerPool {
    pub fn new(repo: Arc<dyn AccrualRepository>, scorer: Arc<dyn OrderScorer>, counters: Counters) -> Self {
        Self {
            repo,
            scorer,
            counters,
        }
    }

    /// Spawns `worker_count` tasks pulling batches from `rx` until the
    /// channel closes or `shutdown` fires. Returns their join handles so the
    /// caller can await a clean drain on shutdown.
    pub fn spawn(
        self: Arc<Self>,
        rx: mpsc::Receiver<Vec<Accrual>>,
        worker_count: usize,
        shutdown: CancellationToken,
    ) -> Vec<tokio::task::JoinHandle<()>> {
        let rx = Arc::new(tokio::sync::Mutex::new(rx));

        (0..worker_count.max(1))
            .map(|id| {
                let pool = self.clone();
                let rx = rx.clone();
                let shutdown = shutdown.clone();
                tokio::spawn(async move { pool.run(id, rx, shutdown).await })
            })
            .collect()
    }

    async fn run(
        &self,
        worker_id: usize,
        rx: Arc<tokio::sync::Mutex<mpsc::Receiver<Vec<Accrual>>>>,
        shutdown: CancellationToken,
    ) {
        loop {
            let batch = {
                let mut guard = rx.lock().await;
                tokio::select! {
                    biased;
                    _ = shutdown.cancelled() => None,
                    batch = guard.recv() => batch,
                }
            };

            let Some(batch) = batch else {
                tracing::info!(worker_id, "worker pool shutting down");
                return;
            };

            if let Err(e) = self.process_batch(&batch).await {
                tracing::error!(worker_id, error = %e, "failed to process accrual batch");
            }
        }
    }

    async fn process_batch(&self, batch: &[Accrual]) -> anyhow::Result<()> {
        let futures = batch
            .iter()
            .map(|accrual| self.score_order(accrual));

        let outcomes: Vec<AccrualOutcome> = futures::future::join_all(futures)
            .await
            .into_iter()
            .flatten()
            .collect();

        self.counters
            .worker_processed
            .fetch_add(batch.len() as u64, Ordering::Relaxed);
        self.counters
            .worker_processed_final
            .fetch_add(outcomes.len() as u64, Ordering::Relaxed);

        warn_if_slow(
            "commit_batch",
            std::time::Duration::from_millis(200),
            self.repo.commit_batch(batch, &outcomes),
        )
        .await?;
        Ok(())
    }

    async fn score_order(&self, accrual: &Accrual) -> Option<AccrualOutcome> {
        match self.scorer.fetch(&accrual.order_number).await {
            Ok(response) => {
                let status = match response.status {
                    crate::accrual::model::ScorerStatus::Registered
                    | crate::accrual::model::ScorerStatus::Processing => AccrualStatus::Processing,
                    crate::accrual::model::ScorerStatus::Invalid => {
                        self.counters.worker_invalid.fetch_add(1, Ordering::Relaxed);
                        AccrualStatus::Invalid
                    }
                    crate::accrual::model::ScorerStatus::Processed => AccrualStatus::Processed,
                };

                Some(AccrualOutcome {
                    order_number: accrual.order_number.clone(),
                    status,
                    accrual: response.accrual,
                })
            }
            Err(ScorerError::NotRegistered) => {
                self.counters.worker_retried.fetch_add(1, Ordering::Relaxed);
                None
            }
            Err(e) => {
                tracing::warn!(order_number = %accrual.order_number, error = %e, "scoring order failed, will retry next tick");
                self.counters.worker_retried.fetch_add(1, Ordering::Relaxed);
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::accrual::model::{ScorerResponse, ScorerStatus};
    use async_trait::async_trait;
    use chrono::Utc;
    use rust_decimal_macros::dec;
    use std::collections::HashMap;
    use std::sync::Mutex;
    use uuid::Uuid;

    struct MockRepo {
        committed: Mutex<Vec<(Vec<Accrual>, Vec<AccrualOutcome>)>>,
    }

    #[async_trait]
    impl AccrualRepository for MockRepo {
        async fn create_order(&self, _user_id: Uuid, _order_number: &str) -> Result<Accrual, crate::error::AppError> {
            unimplemented!("not exercised by worker pool tests")
        }

        async fn list_for_user(&self, _user_id: Uuid) -> Result<Vec<Accrual>, crate::error::AppError> {
            unimplemented!("not exercised by worker pool tests")
        }

        async fn claim_batch(&self, _limit: i64) -> Result<Vec<Accrual>, crate::error::AppError> {
            unimplemented!("not exercised by worker pool tests")
        }

        async fn commit_batch(
            &self,
            batch: &[Accrual],
            outcomes: &[AccrualOutcome],
        ) -> Result<(), crate::error::AppError> {
            self.committed
                .lock()
                .unwrap()
                .push((batch.to_vec(), outcomes.iter().map(clone_outcome).collect()));
            Ok(())
        }
    }

    fn clone_outcome(o: &AccrualOutcome) -> AccrualOutcome {
        AccrualOutcome {
            order_number: o.order_number.clone(),
            status: o.status,
            accrual: o.accrual,
        }
    }

    struct MockScorer {
        responses: HashMap<String, Result<ScorerResponse, ()>>,
    }

    #[async_trait]
    impl OrderScorer for MockScorer {
        async fn fetch(&self, order_number: &str) -> Result<ScorerResponse, ScorerError> {
            match self.responses.get(order_number) {
                Some(Ok(resp)) => Ok(resp.clone()),
                Some(Err(())) => Err(ScorerError::NotRegistered),
                None => Err(ScorerError::NotRegistered),
            }
        }
    }

    fn accrual(order_number: &str) -> Accrual {
        Accrual {
            order_number: order_number.to_string(),
            user_id: Uuid::new_v4(),
            status: AccrualStatus::Processing,
            accrual: None,
            uploaded_at: Utc::now(),
            processed_at: None,
        }
    }

    #[tokio::test]
    async fn processed_order_commits_with_outcome() {
        let mut responses = HashMap::new();
        responses.insert(
            "12345".to_string(),
            Ok(ScorerResponse {
                order: "12345".to_string(),
                status: ScorerStatus::Processed,
                accrual: Some(dec!(500)),
            }),
        );

        let repo = Arc::new(MockRepo {
            committed: Mutex::new(Vec::new()),
        });
        let scorer = Arc::new(MockScorer { responses });
        let pool = WorkerPool::new(repo.clone(), scorer, Counters::default());

        pool.process_batch(&[accrual("12345")]).await.unwrap();

        let committed = repo.committed.lock().unwrap();
        assert_eq!(committed.len(), 1);
        assert_eq!(committed[0].1.len(), 1);
        assert_eq!(committed[0].1[0].status, AccrualStatus::Processed);
        assert_eq!(committed[0].1[0].accrual, Some(dec!(500)));
    }

    #[tokio::test]
    async fn unregistered_order_commits_with_no_outcome() {
        let repo = Arc::new(MockRepo {
            committed: Mutex::new(Vec::new()),
        });
        let scorer = Arc::new(MockScorer {
            responses: HashMap::new(),
        });
        let pool = WorkerPool::new(repo.clone(), scorer, Counters::default());

        pool.process_batch(&[accrual("99999")]).await.unwrap();

        let committed = repo.committed.lock().unwrap();
        assert_eq!(committed.len(), 1);
        assert!(committed[0].1.is_empty());
    }

    /// Mirrors `processing_lock` release behind the trait boundary, the way
    /// `accrual_scheduler`'s `LockTrackingRepo` does for claiming.
    struct LockTrackingRepo {
        locked: Mutex<std::collections::HashSet<String>>,
    }

    #[async_trait]
    impl AccrualRepository for LockTrackingRepo {
        async fn create_order(&self, _user_id: Uuid, _order_number: &str) -> Result<Accrual, crate::error::AppError> {
            unimplemented!("not exercised by worker pool tests")
        }

        async fn list_for_user(&self, _user_id: Uuid) -> Result<Vec<Accrual>, crate::error::AppError> {
            unimplemented!("not exercised by worker pool tests")
        }

        async fn claim_batch(&self, _limit: i64) -> Result<Vec<Accrual>, crate::error::AppError> {
            unimplemented!("not exercised by worker pool tests")
        }

        async fn commit_batch(
            &self,
            batch: &[Accrual],
            _outcomes: &[AccrualOutcome],
        ) -> Result<(), crate::error::AppError> {
            let mut locked = self.locked.lock().unwrap();
            for accrual in batch {
                locked.remove(&accrual.order_number);
            }
            Ok(())
        }
    }

    /// P6: a commit-pass releases the lock on every row it touched, whether
    /// the scorer returned a terminal outcome for it or not -- an
    /// unregistered order still needs to be reclaimable on the next tick.
    #[tokio::test]
    async fn process_batch_releases_the_lock_on_every_row_regardless_of_outcome() {
        let repo = Arc::new(LockTrackingRepo {
            locked: Mutex::new(
                ["12345".to_string(), "99999".to_string()]
                    .into_iter()
                    .collect(),
            ),
        });

        let mut responses = HashMap::new();
        responses.insert(
            "12345".to_string(),
            Ok(ScorerResponse {
                order: "12345".to_string(),
                status: ScorerStatus::Processed,
                accrual: Some(dec!(500)),
            }),
        );
        let scorer = Arc::new(MockScorer { responses });
        let pool = WorkerPool::new(repo.clone(), scorer, Counters::default());

        pool.process_batch(&[accrual("12345"), accrual("99999")])
            .await
            .unwrap();

        assert!(
            repo.locked.lock().unwrap().is_empty(),
            "commit must release the lock on every row in the batch, scored or not"
        );
    }
}
