//! # Persistence Collaborator
//!
//! Abstract storage operations the pipeline needs, plus a DashMap-backed
//! in-memory implementation for embedding and tests.
//!
//! ```rust
//! use response_pipeline::models::{QuestionnaireContext, ResponseRecord};
//! use response_pipeline::persistence::{InMemoryResponseRepository, ResponseRepository};
//!
//! # tokio_test::block_on(async {
//! let repository = InMemoryResponseRepository::new();
//! repository.insert(ResponseRecord::new(7, QuestionnaireContext::new(1)));
//!
//! let fetched = repository.fetch_response_with_answers(7).await.unwrap();
//! assert!(fetched.is_some());
//! # });
//! ```

use async_trait::async_trait;
use dashmap::DashMap;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use crate::aggregation::ResponseSummary;
use crate::error::{PipelineError, Result};
use crate::models::{AnswerId, AnswerScoreUpdate, ResponseId, ResponseRecord};

/// Storage operations consumed by the batch executor
#[async_trait]
pub trait ResponseRepository: Send + Sync {
    /// Fetch a response with every answer joined to its question
    async fn fetch_response_with_answers(
        &self,
        response_id: ResponseId,
    ) -> Result<Option<ResponseRecord>>;

    async fn update_response_metadata(
        &self,
        response_id: ResponseId,
        summary: &ResponseSummary,
    ) -> Result<()>;

    async fn update_answer_score(&self, answer_id: AnswerId, update: &AnswerScoreUpdate)
        -> Result<()>;

    async fn mark_response_processing_failed(
        &self,
        response_id: ResponseId,
        error_message: &str,
    ) -> Result<()>;

    /// Write every answer score and the optional summary of one processing
    /// attempt as a single unit: either all of it lands or none of it does.
    ///
    /// The default issues the individual writes in order and is only
    /// all-or-nothing when those writes cannot fail; transactional backends
    /// override it.
    async fn persist_scored_response(
        &self,
        response_id: ResponseId,
        scores: &[(AnswerId, AnswerScoreUpdate)],
        summary: Option<&ResponseSummary>,
    ) -> Result<()> {
        for (answer_id, update) in scores {
            self.update_answer_score(*answer_id, update).await?;
        }
        if let Some(summary) = summary {
            self.update_response_metadata(response_id, summary).await?;
        }
        Ok(())
    }

    /// Shared precondition checked once per batch before any item runs
    async fn check_available(&self) -> Result<()> {
        Ok(())
    }
}

impl std::fmt::Debug for dyn ResponseRepository {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("ResponseRepository")
    }
}

/// In-memory repository keyed by response and answer id
#[derive(Debug)]
pub struct InMemoryResponseRepository {
    responses: DashMap<ResponseId, ResponseRecord>,
    summaries: DashMap<ResponseId, ResponseSummary>,
    answer_scores: DashMap<AnswerId, AnswerScoreUpdate>,
    failures: DashMap<ResponseId, String>,
    fetch_count: AtomicU64,
    available: AtomicBool,
    /// Serializes multi-record writes so readers never see half an attempt
    write_lock: Mutex<()>,
}

impl InMemoryResponseRepository {
    pub fn new() -> Self {
        Self {
            responses: DashMap::new(),
            summaries: DashMap::new(),
            answer_scores: DashMap::new(),
            failures: DashMap::new(),
            fetch_count: AtomicU64::new(0),
            available: AtomicBool::new(true),
            write_lock: Mutex::new(()),
        }
    }

    pub fn insert(&self, response: ResponseRecord) {
        self.responses.insert(response.id, response);
    }

    pub fn remove(&self, response_id: ResponseId) -> Option<ResponseRecord> {
        self.responses.remove(&response_id).map(|(_, record)| record)
    }

    pub fn summary(&self, response_id: ResponseId) -> Option<ResponseSummary> {
        self.summaries.get(&response_id).map(|entry| entry.clone())
    }

    pub fn answer_score(&self, answer_id: AnswerId) -> Option<AnswerScoreUpdate> {
        self.answer_scores.get(&answer_id).map(|entry| entry.clone())
    }

    pub fn failure(&self, response_id: ResponseId) -> Option<String> {
        self.failures.get(&response_id).map(|entry| entry.clone())
    }

    pub fn fetch_count(&self) -> u64 {
        self.fetch_count.load(Ordering::Acquire)
    }

    /// Toggle the batch-level availability precondition
    pub fn set_available(&self, available: bool) {
        self.available.store(available, Ordering::Release);
    }
}

impl Default for InMemoryResponseRepository {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ResponseRepository for InMemoryResponseRepository {
    async fn fetch_response_with_answers(
        &self,
        response_id: ResponseId,
    ) -> Result<Option<ResponseRecord>> {
        self.fetch_count.fetch_add(1, Ordering::AcqRel);
        Ok(self.responses.get(&response_id).map(|entry| entry.clone()))
    }

    async fn update_response_metadata(
        &self,
        response_id: ResponseId,
        summary: &ResponseSummary,
    ) -> Result<()> {
        self.summaries.insert(response_id, summary.clone());
        Ok(())
    }

    async fn update_answer_score(
        &self,
        answer_id: AnswerId,
        update: &AnswerScoreUpdate,
    ) -> Result<()> {
        self.answer_scores.insert(answer_id, update.clone());
        Ok(())
    }

    async fn mark_response_processing_failed(
        &self,
        response_id: ResponseId,
        error_message: &str,
    ) -> Result<()> {
        self.failures.insert(response_id, error_message.to_string());
        Ok(())
    }

    async fn persist_scored_response(
        &self,
        response_id: ResponseId,
        scores: &[(AnswerId, AnswerScoreUpdate)],
        summary: Option<&ResponseSummary>,
    ) -> Result<()> {
        if !self.available.load(Ordering::Acquire) {
            return Err(PipelineError::persistence(
                "persist_scored_response",
                "repository is unavailable",
            ));
        }

        let _write = self.write_lock.lock();
        for (answer_id, update) in scores {
            self.answer_scores.insert(*answer_id, update.clone());
        }
        if let Some(summary) = summary {
            self.summaries.insert(response_id, summary.clone());
        }
        Ok(())
    }

    async fn check_available(&self) -> Result<()> {
        if self.available.load(Ordering::Acquire) {
            Ok(())
        } else {
            Err(PipelineError::persistence(
                "check_available",
                "repository is unavailable",
            ))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::QuestionnaireContext;

    #[tokio::test]
    async fn test_fetch_missing_response_returns_none() {
        let repository = InMemoryResponseRepository::new();
        let fetched = repository.fetch_response_with_answers(1).await.unwrap();
        assert!(fetched.is_none());
        assert_eq!(repository.fetch_count(), 1);
    }

    #[tokio::test]
    async fn test_unavailable_repository_writes_nothing() {
        let repository = InMemoryResponseRepository::new();
        repository.set_available(false);
        let update = AnswerScoreUpdate {
            rating_score: Some(4.0),
            metadata: serde_json::Map::new(),
        };

        let result = repository
            .persist_scored_response(1, &[(11, update.clone()), (12, update)], None)
            .await;

        assert!(result.is_err());
        assert!(repository.answer_score(11).is_none());
        assert!(repository.answer_score(12).is_none());
    }

    #[tokio::test]
    async fn test_availability_toggle() {
        let repository = InMemoryResponseRepository::new();
        repository.insert(ResponseRecord::new(1, QuestionnaireContext::new(1)));

        assert!(repository.check_available().await.is_ok());
        repository.set_available(false);
        assert!(repository.check_available().await.is_err());
    }
}
