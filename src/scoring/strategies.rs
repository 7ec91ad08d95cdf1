//! Per-question-type scoring strategies.
//!
//! Each strategy turns one raw answer into an unweighted, unclamped
//! [`ScoreResult`]; category weighting and the final clamp are applied by
//! [`super::AnswerScorer`].

use serde_json::{json, Map, Value};

use super::normalize::normalize_to_scale;
use super::sentiment::analyze_sentiment;
use super::{QuestionScorer, ScoreResult};
use crate::constants::scoring::*;
use crate::models::{Answer, Question, QuestionnaireContext};

/// Rating and scale questions store a value already on the canonical scale
#[derive(Debug, Clone, Copy, Default)]
pub struct RatingScorer;

impl QuestionScorer for RatingScorer {
    fn score(&self, answer: &Answer, _question: &Question, _context: &QuestionnaireContext) -> ScoreResult {
        ScoreResult::numeric(answer.rating_value, "rating")
    }
}

/// Types without a dedicated strategy keep any stored rating
#[derive(Debug, Clone, Copy, Default)]
pub struct PassThroughScorer;

impl QuestionScorer for PassThroughScorer {
    fn score(&self, answer: &Answer, _question: &Question, _context: &QuestionnaireContext) -> ScoreResult {
        ScoreResult::numeric(answer.rating_value, "pass_through")
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct YesNoScorer;

impl QuestionScorer for YesNoScorer {
    fn score(&self, answer: &Answer, _question: &Question, _context: &QuestionnaireContext) -> ScoreResult {
        let value = answer
            .text_value
            .as_deref()
            .map(|v| v.trim().to_lowercase());
        let score = match value.as_deref() {
            Some("yes") => Some(YES_SCORE),
            Some("no") => Some(NO_SCORE),
            _ => None,
        };

        let mut result = ScoreResult::numeric(score, "yes_no");
        if let Some(value) = value {
            result.metadata.insert("answer_value".to_string(), json!(value));
        }
        result
    }
}

/// Single and multiple choice: configured option weights, else option rank
#[derive(Debug, Clone, Copy, Default)]
pub struct ChoiceScorer;

impl ChoiceScorer {
    /// Map a 1-based rank onto 1-5: `round(rank / option_count * 5)`
    pub fn positional_score(rank: usize, option_count: usize) -> Option<f64> {
        if option_count == 0 || rank == 0 {
            return None;
        }
        let scaled = (rank as f64 / option_count as f64 * SCALE_MAX).round();
        Some(scaled.clamp(SCALE_MIN, SCALE_MAX))
    }
}

impl QuestionScorer for ChoiceScorer {
    fn score(&self, answer: &Answer, question: &Question, context: &QuestionnaireContext) -> ScoreResult {
        let selections: Vec<&str> = if answer.selected_options.is_empty() {
            answer.text_value.as_deref().map(str::trim).into_iter().collect()
        } else {
            answer.selected_options.iter().map(String::as_str).collect()
        };

        let mut option_scores = Map::new();
        let mut weighted = 0usize;
        let mut positional = 0usize;

        for option in selections.iter().filter(|s| !s.is_empty()) {
            let score = match context.option_weight(question.id, option) {
                Some(weight) => {
                    weighted += 1;
                    Some(weight)
                }
                None => question.option_rank(option).and_then(|rank| {
                    positional += 1;
                    Self::positional_score(rank, question.options.len())
                }),
            };
            if let Some(score) = score {
                option_scores.insert((*option).to_string(), json!(score));
            }
        }

        let scores: Vec<f64> = option_scores.values().filter_map(Value::as_f64).collect();
        let average = (!scores.is_empty()).then(|| scores.iter().sum::<f64>() / scores.len() as f64);

        let method = match (weighted, positional) {
            (0, 0) => "none",
            (_, 0) => "weighted",
            (0, _) => "positional",
            _ => "mixed",
        };

        let mut result = ScoreResult::numeric(average, "choice");
        result.metadata.insert("selection_count".to_string(), json!(selections.len()));
        result.metadata.insert("option_scores".to_string(), Value::Object(option_scores));
        result.metadata.insert("scoring_method".to_string(), json!(method));
        result
    }
}

/// Free text scored through the sentiment heuristic
#[derive(Debug, Clone, Copy, Default)]
pub struct TextScorer;

impl QuestionScorer for TextScorer {
    fn score(&self, answer: &Answer, _question: &Question, _context: &QuestionnaireContext) -> ScoreResult {
        let Some(analysis) = answer.text_value.as_deref().and_then(analyze_sentiment) else {
            return ScoreResult::numeric(None, "sentiment");
        };

        let mut result = ScoreResult::numeric(Some(analysis.score), "sentiment");
        result.sentiment = Some(analysis.sentiment);
        if let Ok(Value::Object(details)) = serde_json::to_value(&analysis) {
            result.metadata.insert("analysis".to_string(), Value::Object(details));
        }
        result.metadata.insert("word_count".to_string(), json!(analysis.word_count));
        result
    }
}

/// Number questions normalized from their declared domain onto 1-5
#[derive(Debug, Clone, Copy, Default)]
pub struct NumberScorer;

impl QuestionScorer for NumberScorer {
    fn score(&self, answer: &Answer, question: &Question, _context: &QuestionnaireContext) -> ScoreResult {
        let value = answer.numeric_value.or_else(|| {
            answer
                .text_value
                .as_deref()
                .and_then(|text| text.trim().parse::<f64>().ok())
        });
        let min = question.min_value.unwrap_or(DEFAULT_NUMBER_MIN);
        let max = question.max_value.unwrap_or(DEFAULT_NUMBER_MAX);

        let score = value
            .filter(|v| v.is_finite())
            .map(|v| normalize_to_scale(v, min, max, SCALE_MIN, SCALE_MAX));

        let mut result = ScoreResult::numeric(score, "number");
        if let Some(value) = value {
            result.metadata.insert("raw_value".to_string(), json!(value));
        }
        result.metadata.insert("domain".to_string(), json!([min, max]));
        result
    }
}
