//! # Pipeline Error Types
//!
//! Structured error handling for the response pipeline using thiserror.
//! Variants follow the pipeline's failure taxonomy so the retry handler can
//! decide per error whether an item is worth another attempt.

use thiserror::Error;

use crate::models::ResponseId;

/// Errors raised while queueing, scoring, persisting or scheduling responses
#[derive(Error, Debug, Clone, PartialEq)]
pub enum PipelineError {
    /// The response disappeared between enqueue and processing
    #[error("Response not found: {response_id}")]
    NotFound { response_id: ResponseId },

    /// Any item-level failure while scoring, aggregating or persisting
    #[error("Processing failed for response {response_id}: {message}")]
    TransientProcessing {
        response_id: ResponseId,
        message: String,
    },

    /// Failure reported by the persistence collaborator
    #[error("Persistence error: {operation}: {message}")]
    Persistence { operation: String, message: String },

    /// Failure outside per-item handling that affects a whole batch
    #[error("Batch {batch_id} failed: {message}")]
    SystemicBatch { batch_id: String, message: String },

    #[error("Configuration error: {message}")]
    Configuration { message: String },

    #[error("Timeout: operation {operation} did not finish within {timeout_ms}ms")]
    Timeout { operation: String, timeout_ms: u64 },

    /// No async runtime to schedule work on
    #[error("Runtime error: {message}")]
    Runtime { message: String },
}

impl PipelineError {
    /// Create a persistence error for the named repository operation
    pub fn persistence(operation: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Persistence {
            operation: operation.into(),
            message: message.into(),
        }
    }

    /// Create a configuration error
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    /// Whether an item failing with this error may be queued for another attempt
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::NotFound { .. } | Self::Configuration { .. } | Self::Runtime { .. } => false,
            Self::TransientProcessing { .. }
            | Self::Persistence { .. }
            | Self::SystemicBatch { .. }
            | Self::Timeout { .. } => true,
        }
    }

    /// Stable label used as a metrics key
    pub fn error_kind(&self) -> &'static str {
        match self {
            Self::NotFound { .. } => "not_found",
            Self::TransientProcessing { .. } => "transient_processing",
            Self::Persistence { .. } => "persistence",
            Self::SystemicBatch { .. } => "systemic_batch",
            Self::Configuration { .. } => "configuration",
            Self::Timeout { .. } => "timeout",
            Self::Runtime { .. } => "runtime",
        }
    }
}

impl From<config::ConfigError> for PipelineError {
    fn from(error: config::ConfigError) -> Self {
        Self::configuration(error.to_string())
    }
}

pub type Result<T> = std::result::Result<T, PipelineError>;
