//! # Answer Scoring
//!
//! Turns one raw answer plus its question metadata into a [`ProcessedAnswer`]:
//! a normalized score in [0, 10], an optional sentiment tag and diagnostics.
//!
//! ## Architecture
//!
//! Every question type maps to one [`QuestionScorer`] strategy through
//! [`scorer_for`]. The [`AnswerScorer`] runs the strategy, then applies the
//! category weight and the final clamp. Scoring is pure: no I/O and no state
//! besides the read-only questionnaire context.

pub mod normalize;
pub mod sentiment;
pub mod strategies;

use serde_json::{json, Map, Value};

use crate::models::{
    Answer, ProcessedAnswer, Question, QuestionType, QuestionnaireContext, ResponseRecord,
    Sentiment,
};

pub use normalize::{clamp_rating, normalize_to_scale};
pub use sentiment::{analyze_sentiment, SentimentAnalysis};
pub use strategies::{
    ChoiceScorer, NumberScorer, PassThroughScorer, RatingScorer, TextScorer, YesNoScorer,
};

/// Unweighted result produced by a strategy
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ScoreResult {
    pub score: Option<f64>,
    pub sentiment: Option<Sentiment>,
    pub metadata: Map<String, Value>,
}

impl ScoreResult {
    /// A result with an optional score tagged with the strategy that produced it
    pub fn numeric(score: Option<f64>, source: &str) -> Self {
        let mut metadata = Map::new();
        metadata.insert("source".to_string(), json!(source));
        Self {
            score,
            sentiment: None,
            metadata,
        }
    }
}

/// Scoring contract shared by every question type
pub trait QuestionScorer: Send + Sync {
    fn score(
        &self,
        answer: &Answer,
        question: &Question,
        context: &QuestionnaireContext,
    ) -> ScoreResult;
}

/// Strategy responsible for a question type
pub fn scorer_for(question_type: QuestionType) -> &'static dyn QuestionScorer {
    match question_type {
        QuestionType::Rating | QuestionType::Scale => &RatingScorer,
        QuestionType::YesNo => &YesNoScorer,
        QuestionType::SingleChoice | QuestionType::MultipleChoice => &ChoiceScorer,
        QuestionType::Text | QuestionType::Textarea => &TextScorer,
        QuestionType::Number => &NumberScorer,
        QuestionType::Other => &PassThroughScorer,
    }
}

/// Applies the per-type strategy plus category weighting and clamping
#[derive(Debug, Clone, Copy, Default)]
pub struct AnswerScorer;

impl AnswerScorer {
    pub fn new() -> Self {
        Self
    }

    pub fn score(
        &self,
        answer: &Answer,
        question: &Question,
        context: &QuestionnaireContext,
    ) -> ProcessedAnswer {
        let ScoreResult {
            score,
            sentiment,
            mut metadata,
        } = scorer_for(question.question_type).score(answer, question, context);

        let category = question.category_or_default().to_string();
        metadata.insert("question_type".to_string(), json!(question.question_type));

        let weighted = match (score, context.category_weight(&category)) {
            (Some(score), Some(weight)) => {
                metadata.insert("category_weight".to_string(), json!(weight));
                Some(score * weight)
            }
            (score, _) => score,
        };

        let rating_score = weighted.and_then(clamp_rating);
        if let (Some(raw), Some(clamped)) = (weighted, rating_score) {
            if raw != clamped {
                metadata.insert("pre_clamp_score".to_string(), json!(raw));
            }
        }

        if let Some(area) = context
            .category_mapping(&category)
            .and_then(|mapping| mapping.improvement_area.as_ref())
        {
            metadata.insert("improvement_area".to_string(), json!(area));
        }

        ProcessedAnswer {
            answer_id: answer.id,
            question_id: question.id,
            category,
            rating_score,
            sentiment,
            metadata,
        }
    }

    /// Score every answer of a response, in answer order
    pub fn score_response(&self, response: &ResponseRecord) -> Vec<ProcessedAnswer> {
        response
            .answers
            .iter()
            .map(|entry| self.score(&entry.answer, &entry.question, &response.questionnaire))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::CategoryMapping;

    #[test]
    fn test_category_weight_is_applied() {
        let question = Question::new(1, QuestionType::Number).with_category("service");
        let context = QuestionnaireContext::new(1).with_category(
            "service",
            CategoryMapping {
                improvement_area: Some("Customer Service".to_string()),
                weight: Some(1.25),
            },
        );

        let processed = AnswerScorer.score(&Answer::new(1, 1).with_number(7.5), &question, &context);

        assert_eq!(processed.rating_score, Some(5.0));
        assert_eq!(processed.category, "service");
        assert_eq!(processed.metadata["improvement_area"], "Customer Service");
        assert_eq!(processed.metadata["category_weight"], 1.25);
    }

    #[test]
    fn test_weighted_score_is_clamped() {
        let question = Question::new(1, QuestionType::Rating).with_category("value");
        let context = QuestionnaireContext::new(1).with_category(
            "value",
            CategoryMapping {
                improvement_area: None,
                weight: Some(3.0),
            },
        );

        let processed = AnswerScorer.score(&Answer::new(1, 1).with_rating(9.0), &question, &context);

        assert_eq!(processed.rating_score, Some(10.0));
        assert_eq!(processed.metadata["pre_clamp_score"], 27.0);
    }

    #[test]
    fn test_text_answer_carries_sentiment() {
        let question = Question::new(1, QuestionType::Textarea);
        let processed = AnswerScorer.score(
            &Answer::new(1, 1).with_text("Excellent, friendly and helpful"),
            &question,
            &QuestionnaireContext::new(1),
        );

        assert_eq!(processed.sentiment, Some(Sentiment::Positive));
        assert_eq!(processed.rating_score, Some(4.5));
        assert_eq!(processed.category, "uncategorized");
    }

    #[test]
    fn test_other_types_pass_through_rating() {
        let question = Question::new(1, QuestionType::Other);
        let processed = AnswerScorer.score(
            &Answer::new(1, 1).with_rating(6.0),
            &question,
            &QuestionnaireContext::new(1),
        );
        assert_eq!(processed.rating_score, Some(6.0));
        assert_eq!(processed.sentiment, None);
    }

    #[test]
    fn test_scoring_is_idempotent() {
        let question = Question::new(3, QuestionType::MultipleChoice).with_options(["x", "y", "z"]);
        let answer = Answer::new(9, 3).with_selection(["y", "z"]);
        let context = QuestionnaireContext::new(1);

        let first = AnswerScorer.score(&answer, &question, &context);
        let second = AnswerScorer.score(&answer, &question, &context);
        assert_eq!(first, second);
    }
}
