//! # Batch Executor
//!
//! Processes one drained batch in fixed-width chunks. Items within a chunk run
//! concurrently and a failing item never cancels its siblings; every item of
//! a chunk completes before the next chunk starts.

use futures::future::join_all;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, instrument};

use super::batch::{Batch, BatchReport, ItemFailure, ProcessedResponse};
use crate::aggregation::ResponseAggregator;
use crate::error::{PipelineError, Result};
use crate::models::{AnswerId, AnswerScoreUpdate};
use crate::persistence::ResponseRepository;
use crate::queue::QueueItem;
use crate::scoring::AnswerScorer;

#[derive(Debug, Clone)]
pub struct BatchExecutor {
    repository: Arc<dyn ResponseRepository>,
    scorer: AnswerScorer,
    aggregator: ResponseAggregator,
}

impl BatchExecutor {
    pub fn new(repository: Arc<dyn ResponseRepository>) -> Self {
        Self {
            repository,
            scorer: AnswerScorer::new(),
            aggregator: ResponseAggregator::new(),
        }
    }

    /// Process every item of `batch`, partitioning into successes and failures.
    ///
    /// An `Err` means the batch failed as a whole before any item ran.
    #[instrument(skip(self, batch), fields(batch_id = %batch.batch_id, size = batch.len()))]
    pub async fn execute(&self, batch: &Batch, chunk_size: usize) -> Result<BatchReport> {
        let started = Instant::now();

        self.repository
            .check_available()
            .await
            .map_err(|error| PipelineError::SystemicBatch {
                batch_id: batch.batch_id.clone(),
                message: error.to_string(),
            })?;

        let mut succeeded = Vec::with_capacity(batch.len());
        let mut failures = Vec::new();

        for chunk in batch.items.chunks(chunk_size.max(1)) {
            let outcomes = join_all(chunk.iter().map(|item| self.process_item(item))).await;

            for (item, outcome) in chunk.iter().zip(outcomes) {
                match outcome {
                    Ok(processed) => succeeded.push(processed),
                    Err(error) => {
                        debug!(response_id = item.response_id, error = %error, "Item failed");
                        failures.push(ItemFailure {
                            item: item.clone(),
                            error,
                        });
                    }
                }
            }
        }

        Ok(BatchReport {
            batch_id: batch.batch_id.clone(),
            succeeded,
            failures,
            duration: started.elapsed(),
        })
    }

    /// Score and persist one response.
    ///
    /// All answers are scored and aggregated first, then persisted in one
    /// write so a failed attempt leaves the response untouched.
    pub async fn process_item(&self, item: &QueueItem) -> Result<ProcessedResponse> {
        let response_id = item.response_id;
        let transient = |error: PipelineError| match error {
            PipelineError::NotFound { .. } => error,
            other => PipelineError::TransientProcessing {
                response_id,
                message: other.to_string(),
            },
        };

        let response = self
            .repository
            .fetch_response_with_answers(response_id)
            .await
            .map_err(transient)?
            .ok_or(PipelineError::NotFound { response_id })?;

        let processed = self.scorer.score_response(&response);
        let summary = self
            .aggregator
            .aggregate(&processed, &response.questionnaire);

        let scores: Vec<(AnswerId, AnswerScoreUpdate)> = processed
            .iter()
            .map(|answer| (answer.answer_id, answer.score_update()))
            .collect();
        let summary_write = item.options.refresh_aggregates.then_some(&summary);

        self.repository
            .persist_scored_response(response_id, &scores, summary_write)
            .await
            .map_err(transient)?;

        debug!(
            response_id,
            answers = processed.len(),
            average_rating = summary.average_rating,
            "Response scored"
        );

        Ok(ProcessedResponse {
            response_id,
            answers_scored: processed.len(),
            rating_count: summary.rating_count,
            average_rating: summary.average_rating,
        })
    }
}
