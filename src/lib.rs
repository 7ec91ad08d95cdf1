#![allow(clippy::doc_markdown)] // Allow technical terms like DashMap, TOML in docs
#![allow(clippy::missing_errors_doc)] // Allow public functions without # Errors sections
#![allow(clippy::must_use_candidate)] // Allow methods without must_use when context is clear

//! # Response Pipeline
//!
//! Asynchronous batch processing of questionnaire responses.
//!
//! ## Overview
//!
//! Submitted responses are queued by id and later scored in batches. Each
//! answer is turned into a normalized 0-10 rating score (with sentiment for
//! free text), the scores are aggregated into a per-response summary, and
//! both are written back through a [`persistence::ResponseRepository`].
//!
//! ## Architecture
//!
//! - **Single queue, many triggers**: enqueue-at-size, the periodic tick and
//!   manual triggers all go through one scheduling decision
//! - **Bounded concurrency**: attempts over the in-flight ceiling are shed,
//!   never blocked
//! - **Retry with backoff**: failed items go back to the front of the queue
//!   after an exponential delay until their budget runs out
//! - **Caller-owned**: [`pipeline::ResponsePipeline`] is an explicit value, not
//!   a process-wide singleton
//!
//! ## Module Organization
//!
//! - [`models`] - Questionnaire, question, answer and response types
//! - [`scoring`] - Per-question-type scoring strategies and sentiment
//! - [`aggregation`] - Per-response summary computation
//! - [`persistence`] - Storage collaborator trait and in-memory implementation
//! - [`queue`] - Pending work items and the FIFO store
//! - [`pipeline`] - Scheduler, executor, retry handling, metrics and the facade
//! - [`config`] - Layered configuration with clamping
//! - [`error`] - Structured error handling
//! - [`logging`] - Structured tracing setup
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use response_pipeline::{
//!     InMemoryResponseRepository, PipelineConfig, ProcessingOptions, ResponsePipeline,
//! };
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! response_pipeline::logging::init_structured_logging();
//!
//! let config = PipelineConfig::load(None)?;
//! let repository = Arc::new(InMemoryResponseRepository::new());
//! let pipeline = ResponsePipeline::new(config, repository);
//! pipeline.start()?;
//!
//! pipeline.enqueue(1001, ProcessingOptions::default());
//! println!("{:?}", pipeline.get_status());
//! # Ok(())
//! # }
//! ```
//!
//! ## Testing
//!
//! ```bash
//! cargo test --lib    # Unit tests
//! cargo test          # Unit, integration and property tests
//! ```

pub mod aggregation;
pub mod config;
pub mod constants;
pub mod error;
pub mod logging;
pub mod models;
pub mod persistence;
pub mod pipeline;
pub mod queue;
pub mod scoring;

pub use aggregation::{ResponseAggregator, ResponseSummary};
pub use config::{BackoffConfig, ConfigUpdate, PipelineConfig};
pub use error::{PipelineError, Result};
pub use models::{
    Answer, CategoryMapping, ProcessedAnswer, Question, QuestionType, QuestionnaireContext,
    ResponseRecord, Sentiment,
};
pub use persistence::{InMemoryResponseRepository, ResponseRepository};
pub use pipeline::{
    BatchAttempt, BatchSummary, EnqueueReceipt, ForceProcessReport, PipelineStatus,
    ResponsePipeline, SkipReason,
};
pub use queue::{Priority, ProcessingOptions, QueueItem};
pub use scoring::{AnswerScorer, QuestionScorer, ScoreResult};
