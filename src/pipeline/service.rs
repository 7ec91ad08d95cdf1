//! # Response Pipeline Service
//!
//! The caller-owned facade tying the queue, scheduler, executor, retry
//! handler and metrics together.
//!
//! ## Triggers
//!
//! A batch attempt runs through [`PipelineInner::try_start_batch`] from three
//! sources: an enqueue that brings the queue to `batch_size` (while running),
//! the periodic tick, and [`ResponsePipeline::trigger_batch`]. The attempt is
//! skipped when the queue is empty or every concurrency slot is taken.
//! [`ResponsePipeline::force_process_all`] bypasses the scheduler entirely.

use parking_lot::{Mutex, RwLock};
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Weak};
use std::time::{Duration, Instant};
use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use super::batch::{Batch, BatchAttempt, BatchSummary, BatchTrigger, ForceProcessReport, SkipReason};
use super::executor::BatchExecutor;
use super::metrics::{MetricsCollector, MetricsSnapshot, RecentPerformance};
use super::retry::{FailedItemRecord, RetryDecision, RetryHandler};
use super::scheduler::{schedule_decision, BatchSlot, ConcurrencyLimiter, ScheduleDecision};
use crate::config::{ConfigUpdate, PipelineConfig};
use crate::error::{PipelineError, Result};
use crate::logging::{log_batch_operation, log_error};
use crate::models::ResponseId;
use crate::persistence::ResponseRepository;
use crate::queue::{ProcessingOptions, QueueItem, QueueStore};

/// Returned to the caller of [`ResponsePipeline::enqueue`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnqueueReceipt {
    /// 1-based position at insertion time
    pub queue_position: usize,
    /// `ceil(queue_length / batch_size) * average_processing_time_ms`
    pub estimated_wait_ms: u64,
    /// Eager batch attempt made because the queue reached the batch size
    pub triggered: Option<BatchAttempt>,
}

/// Read-only operational snapshot
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineStatus {
    pub is_running: bool,
    pub queue_length: usize,
    pub in_flight_batches: usize,
    pub pending_retries: usize,
    /// All-time count; the retained log in `permanently_failed()` is capped
    pub permanently_failed: u64,
    pub config: PipelineConfig,
    pub metrics: MetricsSnapshot,
    pub recent: RecentPerformance,
}

struct PipelineInner {
    config: RwLock<PipelineConfig>,
    queue: Arc<QueueStore>,
    limiter: Arc<ConcurrencyLimiter>,
    executor: BatchExecutor,
    retry: RetryHandler,
    metrics: MetricsCollector,
    running: AtomicBool,
    runtime: Mutex<Option<Handle>>,
    ticker: Mutex<Option<JoinHandle<()>>>,
}

/// Batch pipeline for scoring submitted responses.
///
/// Cloning is cheap and every clone drives the same queue.
///
/// ```rust,no_run
/// use std::sync::Arc;
/// use response_pipeline::config::PipelineConfig;
/// use response_pipeline::persistence::InMemoryResponseRepository;
/// use response_pipeline::pipeline::ResponsePipeline;
/// use response_pipeline::queue::ProcessingOptions;
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let repository = Arc::new(InMemoryResponseRepository::new());
///     let pipeline = ResponsePipeline::new(PipelineConfig::default(), repository);
///     pipeline.start()?;
///
///     let receipt = pipeline.enqueue(42, ProcessingOptions::default());
///     println!("queued at position {}", receipt.queue_position);
///
///     pipeline.stop();
///     pipeline.force_process_all().await;
///     Ok(())
/// }
/// ```
#[derive(Clone)]
pub struct ResponsePipeline {
    inner: Arc<PipelineInner>,
}

impl std::fmt::Debug for ResponsePipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResponsePipeline")
            .field("running", &self.is_running())
            .field("queue_length", &self.inner.queue.size())
            .field("in_flight", &self.inner.limiter.in_flight())
            .finish()
    }
}

impl ResponsePipeline {
    pub fn new(config: PipelineConfig, repository: Arc<dyn ResponseRepository>) -> Self {
        let config = config.clamped();
        let queue = Arc::new(QueueStore::new());
        let retry = RetryHandler::new(
            Arc::clone(&queue),
            Arc::clone(&repository),
            config.backoff.clone(),
            config.failed_log_size,
        );

        Self {
            inner: Arc::new(PipelineInner {
                limiter: Arc::new(ConcurrencyLimiter::new(config.max_concurrent_batches)),
                metrics: MetricsCollector::new(config.history_size),
                executor: BatchExecutor::new(repository),
                retry,
                queue,
                config: RwLock::new(config),
                running: AtomicBool::new(false),
                runtime: Mutex::new(None),
                ticker: Mutex::new(None),
            }),
        }
    }

    /// Start the periodic tick. Starting twice is a no-op.
    pub fn start(&self) -> Result<()> {
        let handle = Handle::try_current().map_err(|_| PipelineError::Runtime {
            message: "starting the pipeline requires a Tokio runtime".to_string(),
        })?;

        if self.inner.running.swap(true, Ordering::AcqRel) {
            debug!("Pipeline already running");
            return Ok(());
        }

        *self.inner.runtime.lock() = Some(handle.clone());
        let ticker = handle.spawn(run_ticker(Arc::downgrade(&self.inner)));
        *self.inner.ticker.lock() = Some(ticker);

        let config = self.inner.config.read();
        info!(
            batch_size = config.batch_size,
            batch_timeout_ms = config.batch_timeout_ms,
            max_concurrent_batches = config.max_concurrent_batches,
            "🚀 Response pipeline started"
        );
        Ok(())
    }

    /// Cancel the periodic tick; batches already in flight run to completion
    pub fn stop(&self) {
        if !self.inner.running.swap(false, Ordering::AcqRel) {
            return;
        }
        if let Some(ticker) = self.inner.ticker.lock().take() {
            ticker.abort();
        }
        info!(
            in_flight = self.inner.limiter.in_flight(),
            queue_length = self.inner.queue.size(),
            "🛑 Response pipeline stopped"
        );
    }

    pub fn is_running(&self) -> bool {
        self.inner.running.load(Ordering::Acquire)
    }

    /// Queue a response for processing
    pub fn enqueue(&self, response_id: ResponseId, options: ProcessingOptions) -> EnqueueReceipt {
        let (batch_size, max_retries) = {
            let config = self.inner.config.read();
            (config.batch_size, config.max_retries)
        };

        let queue_position = self
            .inner
            .queue
            .enqueue(QueueItem::new(response_id, max_retries, options));
        let estimated_wait_ms = estimate_wait_ms(
            queue_position,
            batch_size,
            self.inner.metrics.average_processing_time_ms(),
        );

        debug!(response_id, queue_position, "Response enqueued");

        let triggered = (self.is_running() && self.inner.queue.size() >= batch_size)
            .then(|| self.inner.try_start_batch(BatchTrigger::SizeThreshold));

        EnqueueReceipt {
            queue_position,
            estimated_wait_ms,
            triggered,
        }
    }

    /// Run the scheduling decision now, as the tick would
    pub fn trigger_batch(&self) -> BatchAttempt {
        self.inner.try_start_batch(BatchTrigger::Manual)
    }

    /// Drain and process the current queue content inline, bypassing the scheduler.
    ///
    /// Processes at most the number of items queued when the call starts.
    pub async fn force_process_all(&self) -> ForceProcessReport {
        let mut remaining = self.inner.queue.size();
        let mut report = ForceProcessReport::default();

        info!(queue_length = remaining, "Forcing queue drain");

        while remaining > 0 {
            let batch_size = self.inner.config.read().batch_size;
            let items = self.inner.queue.drain(remaining.min(batch_size));
            if items.is_empty() {
                break;
            }
            remaining = remaining.saturating_sub(items.len());

            let summary = self
                .inner
                .run_batch(Batch::new(items, BatchTrigger::Forced))
                .await;
            report.total_processed += summary.size;
            report.total_success += summary.success_count;
            report.total_failed += summary.failure_count;
            report.batches.push(summary);
        }

        report
    }

    /// Apply a runtime configuration update; invalid fields are clamped or ignored
    pub fn configure(&self, update: &ConfigUpdate) -> PipelineConfig {
        if update.is_empty() {
            debug!("Empty configuration update ignored");
            return self.inner.config.read().clone();
        }

        let updated = {
            let mut config = self.inner.config.write();
            config.apply(update);
            config.clone()
        };
        self.inner.limiter.set_max(updated.max_concurrent_batches);

        info!(
            batch_size = updated.batch_size,
            batch_timeout_ms = updated.batch_timeout_ms,
            max_concurrent_batches = updated.max_concurrent_batches,
            "Pipeline configuration updated"
        );
        updated
    }

    /// Discard queued items and cancel retries still waiting out their backoff.
    ///
    /// Returns the number of queued items removed; batches in flight are unaffected.
    pub fn clear_queue(&self) -> usize {
        let cancelled_retries = self.inner.retry.cancel_pending();
        let cleared = self.inner.queue.clear();
        warn!(cleared, cancelled_retries, "Queue cleared");
        cleared
    }

    pub fn get_status(&self) -> PipelineStatus {
        let config = self.inner.config.read().clone();
        let metrics = self.inner.metrics.snapshot();
        PipelineStatus {
            is_running: self.is_running(),
            queue_length: self.inner.queue.size(),
            in_flight_batches: self.inner.limiter.in_flight(),
            pending_retries: self.inner.retry.pending_retries(),
            permanently_failed: metrics.permanent_failures,
            recent: self.inner.metrics.recent_performance(config.recent_window),
            metrics,
            config,
        }
    }

    pub fn permanently_failed(&self) -> Vec<FailedItemRecord> {
        self.inner.retry.permanently_failed()
    }

    /// Highest number of batches that were in flight at once
    pub fn peak_in_flight(&self) -> usize {
        self.inner.limiter.peak()
    }

    /// Wait until no batch is in flight
    pub async fn wait_for_idle(&self, timeout: Duration) -> Result<()> {
        tokio::time::timeout(timeout, self.inner.limiter.wait_idle())
            .await
            .map_err(|_| PipelineError::Timeout {
                operation: "wait_for_idle".to_string(),
                timeout_ms: timeout.as_millis() as u64,
            })
    }
}

impl PipelineInner {
    fn spawn_handle(&self) -> Option<Handle> {
        Handle::try_current()
            .ok()
            .or_else(|| self.runtime.lock().clone())
    }

    /// Unified scheduling path for every trigger source
    fn try_start_batch(self: &Arc<Self>, trigger: BatchTrigger) -> BatchAttempt {
        let Some(handle) = self.spawn_handle() else {
            warn!(trigger = trigger.name(), "No runtime available for batch");
            return self.skip(trigger, SkipReason::NoRuntime);
        };

        match schedule_decision(!self.queue.is_empty(), self.limiter.has_free_slot()) {
            ScheduleDecision::SkipEmptyQueue => return self.skip(trigger, SkipReason::EmptyQueue),
            ScheduleDecision::SkipAtCapacity => return self.skip(trigger, SkipReason::AtCapacity),
            ScheduleDecision::Run => {}
        }

        let Some(slot) = self.limiter.try_acquire() else {
            return self.skip(trigger, SkipReason::AtCapacity);
        };

        let batch_size = self.config.read().batch_size;
        let items = self.queue.drain(batch_size);
        if items.is_empty() {
            return self.skip(trigger, SkipReason::EmptyQueue);
        }

        let batch = Batch::new(items, trigger);
        let attempt = BatchAttempt::Started {
            batch_id: batch.batch_id.clone(),
            size: batch.len(),
        };

        let inner = Arc::clone(self);
        handle.spawn(async move {
            let _slot: BatchSlot = slot;
            inner.run_batch(batch).await;
        });

        attempt
    }

    fn skip(&self, trigger: BatchTrigger, reason: SkipReason) -> BatchAttempt {
        self.metrics.record_skipped_attempt();
        debug!(trigger = trigger.name(), reason = ?reason, "Batch attempt skipped");
        BatchAttempt::Skipped(reason)
    }

    /// Execute a batch and route its failures and metrics
    async fn run_batch(&self, batch: Batch) -> BatchSummary {
        let started = Instant::now();
        let size = batch.len();
        let chunk_size = self.config.read().chunk_concurrency;

        info!(
            batch_id = %batch.batch_id,
            trigger = batch.trigger.name(),
            size,
            "📦 Processing batch"
        );

        match self.executor.execute(&batch, chunk_size).await {
            Ok(report) => {
                let success_count = report.succeeded.len();
                let failure_count = report.failures.len();
                let mut retries = 0;
                let mut permanent = 0;

                for failure in report.failures {
                    self.metrics.record_error(failure.error.error_kind());
                    match self.retry.handle_item_failure(failure.item, &failure.error).await {
                        RetryDecision::Scheduled { .. } | RetryDecision::Requeued => retries += 1,
                        RetryDecision::PermanentlyFailed => permanent += 1,
                    }
                }
                self.metrics.record_retries(retries);
                self.metrics.record_permanent_failures(permanent);

                let duration_ms = started.elapsed().as_millis() as u64;
                self.metrics
                    .record_batch(size, success_count, failure_count, duration_ms, false);
                log_batch_operation(
                    "process_batch",
                    &batch.batch_id,
                    batch.trigger.name(),
                    size,
                    success_count,
                    failure_count,
                    duration_ms,
                );

                BatchSummary {
                    batch_id: batch.batch_id,
                    trigger: batch.trigger,
                    size,
                    success_count,
                    failure_count,
                    duration_ms,
                    systemic_failure: None,
                }
            }
            Err(batch_error) => {
                log_error(
                    "batch_executor",
                    "process_batch",
                    &batch_error.to_string(),
                    Some(&batch.batch_id),
                );
                self.metrics.record_error(batch_error.error_kind());

                let Batch {
                    batch_id,
                    items,
                    trigger,
                    ..
                } = batch;
                let outcome = self.retry.handle_systemic_failure(items, &batch_error).await;
                self.metrics.record_retries(outcome.requeued);
                self.metrics
                    .record_permanent_failures(outcome.permanently_failed);

                let duration_ms = started.elapsed().as_millis() as u64;
                self.metrics.record_batch(size, 0, size, duration_ms, true);

                BatchSummary {
                    batch_id,
                    trigger,
                    size,
                    success_count: 0,
                    failure_count: size,
                    duration_ms,
                    systemic_failure: Some(batch_error.to_string()),
                }
            }
        }
    }
}

/// Periodic tick; exits when the pipeline is dropped or stopped
async fn run_ticker(weak: Weak<PipelineInner>) {
    loop {
        let interval = match weak.upgrade() {
            Some(inner) if inner.running.load(Ordering::Acquire) => {
                inner.config.read().batch_timeout()
            }
            _ => break,
        };

        tokio::time::sleep(interval).await;

        let Some(inner) = weak.upgrade() else {
            break;
        };
        if !inner.running.load(Ordering::Acquire) {
            break;
        }
        if let BatchAttempt::Started { batch_id, size } = inner.try_start_batch(BatchTrigger::Timer)
        {
            debug!(batch_id = %batch_id, size, "Timer started batch");
        }
    }
    debug!("Scheduler tick loop ended");
}

fn estimate_wait_ms(queue_length: usize, batch_size: usize, average_processing_time_ms: f64) -> u64 {
    if batch_size == 0 {
        error!("Batch size of zero reached wait estimation");
        return 0;
    }
    let batches_ahead = queue_length.div_ceil(batch_size) as f64;
    (batches_ahead * average_processing_time_ms).ceil() as u64
}
