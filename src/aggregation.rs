//! # Response Aggregation
//!
//! Combines the scored answers of one response into the summary written onto
//! the response's metadata. Only answers with a positive score contribute to
//! averages. Improvement areas come from the questionnaire's category
//! mappings, never from answer metadata.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

use crate::constants::scoring::IMPROVEMENT_THRESHOLD;
use crate::models::{ProcessedAnswer, QuestionnaireContext, Sentiment};

/// Per-response summary produced after all answers are scored
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResponseSummary {
    pub average_rating: f64,
    pub category_averages: BTreeMap<String, f64>,
    pub total_answers: usize,
    /// Answers that contributed to the averages
    pub rating_count: usize,
    pub sentiment_breakdown: BTreeMap<Sentiment, usize>,
    /// Improvement areas of categories averaging below the threshold
    pub improvement_areas: Vec<String>,
    pub processed_at: DateTime<Utc>,
}

#[derive(Debug, Default)]
struct Accumulator {
    sum: f64,
    count: usize,
}

impl Accumulator {
    fn add(&mut self, score: f64) {
        self.sum += score;
        self.count += 1;
    }

    fn average(&self) -> f64 {
        if self.count == 0 {
            0.0
        } else {
            self.sum / self.count as f64
        }
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct ResponseAggregator;

impl ResponseAggregator {
    pub fn new() -> Self {
        Self
    }

    pub fn aggregate(
        &self,
        answers: &[ProcessedAnswer],
        context: &QuestionnaireContext,
    ) -> ResponseSummary {
        let mut overall = Accumulator::default();
        let mut by_category: BTreeMap<&str, Accumulator> = BTreeMap::new();
        let mut sentiment_breakdown = BTreeMap::new();

        for answer in answers {
            if let Some(sentiment) = answer.sentiment {
                *sentiment_breakdown.entry(sentiment).or_insert(0) += 1;
            }
            let Some(score) = answer.rating_score.filter(|score| *score > 0.0) else {
                continue;
            };
            overall.add(score);
            by_category
                .entry(answer.category.as_str())
                .or_default()
                .add(score);
        }

        let category_averages: BTreeMap<String, f64> = by_category
            .iter()
            .map(|(category, acc)| ((*category).to_string(), acc.average()))
            .collect();

        let improvement_areas: BTreeSet<String> = category_averages
            .iter()
            .filter(|(_, average)| **average < IMPROVEMENT_THRESHOLD)
            .filter_map(|(category, _)| context.category_mapping(category))
            .filter_map(|mapping| mapping.improvement_area.clone())
            .collect();

        ResponseSummary {
            average_rating: overall.average(),
            category_averages,
            total_answers: answers.len(),
            rating_count: overall.count,
            sentiment_breakdown,
            improvement_areas: improvement_areas.into_iter().collect(),
            processed_at: Utc::now(),
        }
    }
}
