use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::ResponseId;

/// Informational priority; it does not reorder the queue
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Priority {
    #[default]
    Normal,
    High,
}

/// Caller-supplied options carried with each queued response
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProcessingOptions {
    /// Write the response-level summary after scoring
    pub refresh_aggregates: bool,
    pub priority: Priority,
}

impl Default for ProcessingOptions {
    fn default() -> Self {
        Self {
            refresh_aggregates: true,
            priority: Priority::Normal,
        }
    }
}

/// One unit of pending work
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueueItem {
    pub response_id: ResponseId,
    pub enqueued_at: DateTime<Utc>,
    pub priority: Priority,
    pub retry_count: u32,
    pub max_retries: u32,
    pub options: ProcessingOptions,
    /// Message of the most recent failed attempt
    pub last_error: Option<String>,
}

impl QueueItem {
    pub fn new(response_id: ResponseId, max_retries: u32, options: ProcessingOptions) -> Self {
        Self {
            response_id,
            enqueued_at: Utc::now(),
            priority: options.priority,
            retry_count: 0,
            max_retries,
            options,
            last_error: None,
        }
    }

    /// Whether another attempt fits in the retry budget
    pub fn can_retry(&self) -> bool {
        self.retry_count < self.max_retries
    }
}
