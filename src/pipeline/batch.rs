//! Batch formation types and per-batch results.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use uuid::Uuid;

use crate::error::PipelineError;
use crate::models::ResponseId;
use crate::queue::QueueItem;

/// What caused a batch to be formed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BatchTrigger {
    /// Queue reached the batch size right after an enqueue
    SizeThreshold,
    /// Periodic scheduler tick
    Timer,
    /// Explicit call to `trigger_batch`
    Manual,
    /// Administrative drain bypassing the scheduler
    Forced,
}

impl BatchTrigger {
    pub fn name(&self) -> &'static str {
        match self {
            BatchTrigger::SizeThreshold => "size_threshold",
            BatchTrigger::Timer => "timer",
            BatchTrigger::Manual => "manual",
            BatchTrigger::Forced => "forced",
        }
    }
}

/// Ephemeral group of drained items, discarded after processing
#[derive(Debug, Clone)]
pub struct Batch {
    pub batch_id: String,
    pub items: Vec<QueueItem>,
    pub trigger: BatchTrigger,
    pub created_at: DateTime<Utc>,
}

impl Batch {
    pub fn new(items: Vec<QueueItem>, trigger: BatchTrigger) -> Self {
        let created_at = Utc::now();
        let suffix = Uuid::new_v4().simple().to_string();
        Self {
            batch_id: format!("batch_{}_{}", created_at.timestamp_millis(), &suffix[..8]),
            items,
            trigger,
            created_at,
        }
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

/// Why a batch attempt did not start
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    EmptyQueue,
    /// Every concurrency slot is taken
    AtCapacity,
    /// No Tokio runtime is available to run the batch on
    NoRuntime,
}

/// Outcome of one scheduling attempt
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BatchAttempt {
    Started { batch_id: String, size: usize },
    Skipped(SkipReason),
}

impl BatchAttempt {
    pub fn is_started(&self) -> bool {
        matches!(self, BatchAttempt::Started { .. })
    }
}

/// A response that was fully scored and persisted
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProcessedResponse {
    pub response_id: ResponseId,
    pub answers_scored: usize,
    pub rating_count: usize,
    pub average_rating: f64,
}

#[derive(Debug, Clone)]
pub struct ItemFailure {
    pub item: QueueItem,
    pub error: PipelineError,
}

/// Per-item partition of a completed batch
#[derive(Debug, Clone)]
pub struct BatchReport {
    pub batch_id: String,
    pub succeeded: Vec<ProcessedResponse>,
    pub failures: Vec<ItemFailure>,
    pub duration: Duration,
}

/// Serializable summary of one processed batch
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchSummary {
    pub batch_id: String,
    pub trigger: BatchTrigger,
    pub size: usize,
    pub success_count: usize,
    pub failure_count: usize,
    pub duration_ms: u64,
    /// Set when the whole batch failed before per-item partitioning
    pub systemic_failure: Option<String>,
}

/// Result of draining the queue through `force_process_all`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ForceProcessReport {
    pub total_processed: usize,
    pub total_success: usize,
    pub total_failed: usize,
    pub batches: Vec<BatchSummary>,
}
