use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use super::{QuestionId, QuestionnaireId};

/// Reporting configuration for one question category
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CategoryMapping {
    /// Improvement area this category reports under
    pub improvement_area: Option<String>,
    /// Multiplier applied to every score in this category
    pub weight: Option<f64>,
}

/// Read-only questionnaire configuration passed to the scorer
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct QuestionnaireContext {
    pub questionnaire_id: QuestionnaireId,
    /// Category name to mapping
    #[serde(default)]
    pub category_mappings: HashMap<String, CategoryMapping>,
    /// Per-question, per-option score weights for choice questions
    #[serde(default)]
    pub option_weights: HashMap<QuestionId, HashMap<String, f64>>,
}

impl QuestionnaireContext {
    pub fn new(questionnaire_id: QuestionnaireId) -> Self {
        Self {
            questionnaire_id,
            ..Self::default()
        }
    }

    pub fn with_category(mut self, category: impl Into<String>, mapping: CategoryMapping) -> Self {
        self.category_mappings.insert(category.into(), mapping);
        self
    }

    pub fn with_option_weight(
        mut self,
        question_id: QuestionId,
        option: impl Into<String>,
        weight: f64,
    ) -> Self {
        self.option_weights
            .entry(question_id)
            .or_default()
            .insert(option.into(), weight);
        self
    }

    pub fn category_mapping(&self, category: &str) -> Option<&CategoryMapping> {
        self.category_mappings.get(category)
    }

    /// Configured weight for a category, ignoring non-finite values
    pub fn category_weight(&self, category: &str) -> Option<f64> {
        self.category_mapping(category)
            .and_then(|mapping| mapping.weight)
            .filter(|weight| weight.is_finite())
    }

    pub fn option_weight(&self, question_id: QuestionId, option: &str) -> Option<f64> {
        self.option_weights
            .get(&question_id)
            .and_then(|weights| weights.get(option))
            .copied()
            .filter(|weight| weight.is_finite())
    }
}
