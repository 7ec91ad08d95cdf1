//! Repository doubles layered over the in-memory repository

use async_trait::async_trait;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use tokio::sync::Semaphore;

use response_pipeline::models::{AnswerScoreUpdate, ResponseRecord};
use response_pipeline::{
    InMemoryResponseRepository, PipelineError, ResponseRepository, ResponseSummary, Result,
};

/// Fails the first `n` fetches with a persistence error, then delegates
pub struct FlakyRepository {
    pub inner: InMemoryResponseRepository,
    failures_remaining: AtomicUsize,
    attempts: AtomicU64,
}

impl FlakyRepository {
    pub fn failing_times(failures: usize) -> Self {
        Self {
            inner: InMemoryResponseRepository::new(),
            failures_remaining: AtomicUsize::new(failures),
            attempts: AtomicU64::new(0),
        }
    }

    pub fn always_failing() -> Self {
        Self::failing_times(usize::MAX)
    }

    pub fn attempts(&self) -> u64 {
        self.attempts.load(Ordering::Acquire)
    }
}

#[async_trait]
impl ResponseRepository for FlakyRepository {
    async fn fetch_response_with_answers(&self, response_id: i64) -> Result<Option<ResponseRecord>> {
        self.attempts.fetch_add(1, Ordering::AcqRel);
        let should_fail = self
            .failures_remaining
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |remaining| {
                remaining.checked_sub(1)
            })
            .is_ok();
        if should_fail {
            return Err(PipelineError::persistence(
                "fetch_response_with_answers",
                "connection reset by peer",
            ));
        }
        self.inner.fetch_response_with_answers(response_id).await
    }

    async fn update_response_metadata(&self, response_id: i64, summary: &ResponseSummary) -> Result<()> {
        self.inner.update_response_metadata(response_id, summary).await
    }

    async fn update_answer_score(&self, answer_id: i64, update: &AnswerScoreUpdate) -> Result<()> {
        self.inner.update_answer_score(answer_id, update).await
    }

    async fn mark_response_processing_failed(&self, response_id: i64, error_message: &str) -> Result<()> {
        self.inner
            .mark_response_processing_failed(response_id, error_message)
            .await
    }
}

/// Holds every fetch until permits are released through `open`
pub struct GatedRepository {
    pub inner: InMemoryResponseRepository,
    gate: Semaphore,
}

impl GatedRepository {
    pub fn closed() -> Self {
        Self {
            inner: InMemoryResponseRepository::new(),
            gate: Semaphore::new(0),
        }
    }

    pub fn open(&self) {
        self.gate.add_permits(Semaphore::MAX_PERMITS / 2);
    }
}

#[async_trait]
impl ResponseRepository for GatedRepository {
    async fn fetch_response_with_answers(&self, response_id: i64) -> Result<Option<ResponseRecord>> {
        let _permit = self
            .gate
            .acquire()
            .await
            .map_err(|e| PipelineError::persistence("fetch_response_with_answers", e.to_string()))?;
        self.inner.fetch_response_with_answers(response_id).await
    }

    async fn update_response_metadata(&self, response_id: i64, summary: &ResponseSummary) -> Result<()> {
        self.inner.update_response_metadata(response_id, summary).await
    }

    async fn update_answer_score(&self, answer_id: i64, update: &AnswerScoreUpdate) -> Result<()> {
        self.inner.update_answer_score(answer_id, update).await
    }

    async fn mark_response_processing_failed(&self, response_id: i64, error_message: &str) -> Result<()> {
        self.inner
            .mark_response_processing_failed(response_id, error_message)
            .await
    }
}

/// Transactional double whose write of `poisoned_answer` fails the first `n`
/// times; a failed write rolls back every record of that attempt
pub struct WriteFailingRepository {
    pub inner: InMemoryResponseRepository,
    poisoned_answer: i64,
    failures_remaining: AtomicUsize,
}

impl WriteFailingRepository {
    pub fn failing_times(poisoned_answer: i64, failures: usize) -> Self {
        Self {
            inner: InMemoryResponseRepository::new(),
            poisoned_answer,
            failures_remaining: AtomicUsize::new(failures),
        }
    }

    pub fn always_failing(poisoned_answer: i64) -> Self {
        Self::failing_times(poisoned_answer, usize::MAX)
    }

    fn write_fails(&self, answer_id: i64) -> bool {
        answer_id == self.poisoned_answer
            && self
                .failures_remaining
                .fetch_update(Ordering::AcqRel, Ordering::Acquire, |remaining| {
                    remaining.checked_sub(1)
                })
                .is_ok()
    }
}

#[async_trait]
impl ResponseRepository for WriteFailingRepository {
    async fn fetch_response_with_answers(&self, response_id: i64) -> Result<Option<ResponseRecord>> {
        self.inner.fetch_response_with_answers(response_id).await
    }

    async fn update_response_metadata(&self, response_id: i64, summary: &ResponseSummary) -> Result<()> {
        self.inner.update_response_metadata(response_id, summary).await
    }

    async fn update_answer_score(&self, answer_id: i64, update: &AnswerScoreUpdate) -> Result<()> {
        if self.write_fails(answer_id) {
            return Err(PipelineError::persistence("update_answer_score", "deadlock detected"));
        }
        self.inner.update_answer_score(answer_id, update).await
    }

    async fn mark_response_processing_failed(&self, response_id: i64, error_message: &str) -> Result<()> {
        self.inner
            .mark_response_processing_failed(response_id, error_message)
            .await
    }

    async fn persist_scored_response(
        &self,
        response_id: i64,
        scores: &[(i64, AnswerScoreUpdate)],
        summary: Option<&ResponseSummary>,
    ) -> Result<()> {
        if scores.iter().any(|(answer_id, _)| self.write_fails(*answer_id)) {
            return Err(PipelineError::persistence(
                "persist_scored_response",
                "deadlock detected, transaction rolled back",
            ));
        }
        self.inner
            .persist_scored_response(response_id, scores, summary)
            .await
    }
}

/// Records fetch starts and completed writes; each fetch takes
/// `fetch_delay(response_id)` of (possibly paused) Tokio time
pub struct RecordingRepository {
    pub inner: InMemoryResponseRepository,
    events: parking_lot::Mutex<Vec<String>>,
    fetch_delay: fn(i64) -> std::time::Duration,
}

impl RecordingRepository {
    pub fn new(fetch_delay: fn(i64) -> std::time::Duration) -> Self {
        Self {
            inner: InMemoryResponseRepository::new(),
            events: parking_lot::Mutex::new(Vec::new()),
            fetch_delay,
        }
    }

    pub fn events(&self) -> Vec<String> {
        self.events.lock().clone()
    }

    /// Index of the first event equal to `event`
    pub fn position(&self, event: &str) -> usize {
        self.events
            .lock()
            .iter()
            .position(|recorded| recorded == event)
            .unwrap_or_else(|| panic!("event {event} was never recorded"))
    }
}

#[async_trait]
impl ResponseRepository for RecordingRepository {
    async fn fetch_response_with_answers(&self, response_id: i64) -> Result<Option<ResponseRecord>> {
        self.events.lock().push(format!("fetch:{response_id}"));
        tokio::time::sleep((self.fetch_delay)(response_id)).await;
        self.inner.fetch_response_with_answers(response_id).await
    }

    async fn update_response_metadata(&self, response_id: i64, summary: &ResponseSummary) -> Result<()> {
        self.inner.update_response_metadata(response_id, summary).await
    }

    async fn update_answer_score(&self, answer_id: i64, update: &AnswerScoreUpdate) -> Result<()> {
        self.inner.update_answer_score(answer_id, update).await
    }

    async fn mark_response_processing_failed(&self, response_id: i64, error_message: &str) -> Result<()> {
        self.inner
            .mark_response_processing_failed(response_id, error_message)
            .await
    }

    async fn persist_scored_response(
        &self,
        response_id: i64,
        scores: &[(i64, AnswerScoreUpdate)],
        summary: Option<&ResponseSummary>,
    ) -> Result<()> {
        self.inner
            .persist_scored_response(response_id, scores, summary)
            .await?;
        self.events.lock().push(format!("persisted:{response_id}"));
        Ok(())
    }
}
