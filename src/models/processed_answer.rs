use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::{AnswerId, QuestionId};

/// Coarse five-way polarity of a free-text answer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Sentiment {
    Positive,
    SlightlyPositive,
    Neutral,
    SlightlyNegative,
    Negative,
}

impl Sentiment {
    pub fn as_str(&self) -> &'static str {
        match self {
            Sentiment::Positive => "positive",
            Sentiment::SlightlyPositive => "slightly_positive",
            Sentiment::Neutral => "neutral",
            Sentiment::SlightlyNegative => "slightly_negative",
            Sentiment::Negative => "negative",
        }
    }
}

impl std::fmt::Display for Sentiment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Score, sentiment and diagnostics derived from one answer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProcessedAnswer {
    pub answer_id: AnswerId,
    pub question_id: QuestionId,
    pub category: String,
    /// Final score in [0, 10], absent when no numeric signal exists
    pub rating_score: Option<f64>,
    /// Only set for free-text answers
    pub sentiment: Option<Sentiment>,
    /// Audit and debug details, never read by business logic
    pub metadata: Map<String, Value>,
}

impl ProcessedAnswer {
    /// Payload written back onto the answer record
    pub fn score_update(&self) -> AnswerScoreUpdate {
        AnswerScoreUpdate {
            rating_score: self.rating_score,
            metadata: self.metadata.clone(),
        }
    }
}

/// Per-answer write issued to the persistence layer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnswerScoreUpdate {
    pub rating_score: Option<f64>,
    pub metadata: Map<String, Value>,
}
