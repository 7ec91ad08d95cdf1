//! # Retry and Failure Handling
//!
//! Item failures inside an otherwise healthy batch are retried with
//! exponential backoff and land at the front of the queue once the delay has
//! elapsed. Systemic batch failures requeue every retryable item immediately,
//! in original order. Items whose budget is spent become permanently failed:
//! they are logged, kept in a capped log, and never requeued.

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info, warn};

use crate::config::BackoffConfig;
use crate::error::PipelineError;
use crate::models::ResponseId;
use crate::persistence::ResponseRepository;
use crate::queue::{QueueItem, QueueStore};

/// Terminal record of an item that will not be attempted again
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FailedItemRecord {
    pub response_id: ResponseId,
    pub retry_count: u32,
    pub error: String,
    pub failed_at: DateTime<Utc>,
}

/// What happened to one failed item
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryDecision {
    /// Requeued at the front after the given delay
    Scheduled { delay: Duration },
    /// Requeued at the front with no delay
    Requeued,
    PermanentlyFailed,
}

/// Counts produced by a systemic requeue
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SystemicOutcome {
    pub requeued: usize,
    pub permanently_failed: usize,
}

/// Delayed requeues not yet due; a generation bump cancels them all
#[derive(Debug, Default)]
struct PendingRetries {
    generation: u64,
    count: usize,
}

#[derive(Debug)]
pub struct RetryHandler {
    queue: Arc<QueueStore>,
    repository: Arc<dyn ResponseRepository>,
    backoff: BackoffConfig,
    pending: Arc<Mutex<PendingRetries>>,
    failed_log: Mutex<VecDeque<FailedItemRecord>>,
    failed_log_size: usize,
}

impl RetryHandler {
    pub fn new(
        queue: Arc<QueueStore>,
        repository: Arc<dyn ResponseRepository>,
        backoff: BackoffConfig,
        failed_log_size: usize,
    ) -> Self {
        Self {
            queue,
            repository,
            backoff,
            pending: Arc::new(Mutex::new(PendingRetries::default())),
            failed_log: Mutex::new(VecDeque::new()),
            failed_log_size: failed_log_size.max(1),
        }
    }

    /// Delay before the retry numbered `retry_count`
    pub fn backoff_delay(&self, retry_count: u32) -> Duration {
        self.backoff.delay_for(retry_count)
    }

    /// Retries whose backoff has not yet elapsed
    pub fn pending_retries(&self) -> usize {
        self.pending.lock().count
    }

    /// Cancel every retry still waiting out its backoff, returning how many
    pub fn cancel_pending(&self) -> usize {
        let mut pending = self.pending.lock();
        let cancelled = pending.count;
        pending.generation += 1;
        pending.count = 0;
        if cancelled > 0 {
            info!(cancelled, "Pending retries cancelled");
        }
        cancelled
    }

    /// Most recent permanently failed items, oldest first
    pub fn permanently_failed(&self) -> Vec<FailedItemRecord> {
        self.failed_log.lock().iter().cloned().collect()
    }

    /// Handle one item that failed inside a batch
    pub async fn handle_item_failure(
        &self,
        mut item: QueueItem,
        error: &PipelineError,
    ) -> RetryDecision {
        item.last_error = Some(error.to_string());

        if !error.is_retryable() {
            warn!(
                response_id = item.response_id,
                error = %error,
                "Item failed with a non-retryable error"
            );
            if !matches!(error, PipelineError::NotFound { .. }) {
                self.mark_failed(&item, error).await;
            }
            self.record_permanent_failure(&item, error);
            return RetryDecision::PermanentlyFailed;
        }

        if !item.can_retry() {
            self.mark_failed(&item, error).await;
            self.record_permanent_failure(&item, error);
            return RetryDecision::PermanentlyFailed;
        }

        item.retry_count += 1;
        let delay = self.backoff_delay(item.retry_count);
        info!(
            response_id = item.response_id,
            retry_count = item.retry_count,
            max_retries = item.max_retries,
            delay_ms = delay.as_millis() as u64,
            "🔁 Scheduling retry"
        );

        let queue = Arc::clone(&self.queue);
        let pending = Arc::clone(&self.pending);
        let generation = {
            let mut pending = pending.lock();
            pending.count += 1;
            pending.generation
        };
        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            let mut pending = pending.lock();
            if pending.generation != generation {
                debug!(response_id = item.response_id, "Cancelled retry dropped");
                return;
            }
            pending.count -= 1;
            queue.requeue_front(item);
        });

        RetryDecision::Scheduled { delay }
    }

    /// Requeue a whole batch after a systemic failure, without backoff
    pub async fn handle_systemic_failure(
        &self,
        items: Vec<QueueItem>,
        error: &PipelineError,
    ) -> SystemicOutcome {
        let mut requeue = Vec::with_capacity(items.len());
        let mut outcome = SystemicOutcome::default();

        for mut item in items {
            item.last_error = Some(error.to_string());
            if item.can_retry() {
                item.retry_count += 1;
                requeue.push(item);
            } else {
                self.mark_failed(&item, error).await;
                self.record_permanent_failure(&item, error);
                outcome.permanently_failed += 1;
            }
        }

        outcome.requeued = requeue.len();
        self.queue.requeue_front_many(requeue);

        warn!(
            requeued = outcome.requeued,
            permanently_failed = outcome.permanently_failed,
            error = %error,
            "Batch failed systemically, items requeued at front"
        );
        outcome
    }

    async fn mark_failed(&self, item: &QueueItem, error: &PipelineError) {
        if let Err(mark_error) = self
            .repository
            .mark_response_processing_failed(item.response_id, &error.to_string())
            .await
        {
            error!(
                response_id = item.response_id,
                error = %mark_error,
                "Failed to mark response processing as failed"
            );
        }
    }

    fn record_permanent_failure(&self, item: &QueueItem, error: &PipelineError) {
        error!(
            response_id = item.response_id,
            retry_count = item.retry_count,
            error = %error,
            "❌ Response permanently failed"
        );

        let mut log = self.failed_log.lock();
        log.push_back(FailedItemRecord {
            response_id: item.response_id,
            retry_count: item.retry_count,
            error: error.to_string(),
            failed_at: Utc::now(),
        });
        while log.len() > self.failed_log_size {
            log.pop_front();
        }
        debug!(failed_log_len = log.len(), "Permanent failure recorded");
    }
}
