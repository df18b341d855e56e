use std::sync::Arc;
use std::sync::atomic::AtomicU64;

/// Minimal counters for operational visibility into the accrual pipeline.
#[derive(Clone, Default)]
pub struct Counters {
    pub scheduler_ticks: Arc<AtomicU64>,
    pub scheduler_claimed: Arc<AtomicU64>,
    pub scheduler_empty_ticks: Arc<AtomicU64>,
    pub scheduler_queue_full: Arc<AtomicU64>,

    pub worker_processed: Arc<AtomicU64>,
    pub worker_retried: Arc<AtomicU64>,
    pub worker_invalid: Arc<AtomicU64>,
    pub worker_processed_final: Arc<AtomicU64>,
}
