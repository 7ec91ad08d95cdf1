//! # Batch Processing Pipeline
//!
//! Queue-driven batch processing with bounded concurrency, retry with backoff
//! and rolling metrics.
//!
//! - [`scheduler`] - unified trigger decision and the in-flight ceiling
//! - [`executor`] - chunked concurrent processing of one batch
//! - [`retry`] - backoff requeue and permanent failure log
//! - [`metrics`] - all-time and recent performance figures
//! - [`service`] - the [`ResponsePipeline`] facade

pub mod batch;
pub mod executor;
pub mod metrics;
pub mod retry;
pub mod scheduler;
pub mod service;

pub use batch::{
    Batch, BatchAttempt, BatchReport, BatchSummary, BatchTrigger, ForceProcessReport, ItemFailure,
    ProcessedResponse, SkipReason,
};
pub use executor::BatchExecutor;
pub use metrics::{MetricsCollector, MetricsSnapshot, RecentPerformance};
pub use retry::{FailedItemRecord, RetryDecision, RetryHandler, SystemicOutcome};
pub use scheduler::{schedule_decision, BatchSlot, ConcurrencyLimiter, ScheduleDecision};
pub use service::{EnqueueReceipt, PipelineStatus, ResponsePipeline};
