use serde::{Deserialize, Serialize};

use super::QuestionId;
use crate::constants::scoring::UNCATEGORIZED;

/// Kind of question, which selects the scoring strategy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuestionType {
    Rating,
    Scale,
    YesNo,
    SingleChoice,
    MultipleChoice,
    Text,
    Textarea,
    Number,
    /// Any type the pipeline has no dedicated strategy for
    #[serde(other)]
    Other,
}

/// One offered option of a choice question
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuestionOption {
    pub value: String,
    pub label: Option<String>,
}

impl QuestionOption {
    pub fn new(value: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            label: None,
        }
    }
}

/// Question metadata attached to each answer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Question {
    pub id: QuestionId,
    pub question_type: QuestionType,
    pub category: Option<String>,
    /// Offered options in display order
    #[serde(default)]
    pub options: Vec<QuestionOption>,
    /// Declared numeric domain for number questions
    pub min_value: Option<f64>,
    pub max_value: Option<f64>,
    #[serde(default)]
    pub required: bool,
}

impl Question {
    pub fn new(id: QuestionId, question_type: QuestionType) -> Self {
        Self {
            id,
            question_type,
            category: None,
            options: Vec::new(),
            min_value: None,
            max_value: None,
            required: false,
        }
    }

    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }

    pub fn with_options<I, S>(mut self, options: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.options = options.into_iter().map(QuestionOption::new).collect();
        self
    }

    pub fn with_range(mut self, min: f64, max: f64) -> Self {
        self.min_value = Some(min);
        self.max_value = Some(max);
        self
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    /// Category name, or `"uncategorized"` when none is set
    pub fn category_or_default(&self) -> &str {
        self.category
            .as_deref()
            .filter(|c| !c.trim().is_empty())
            .unwrap_or(UNCATEGORIZED)
    }

    /// 1-based position of `value` among the offered options
    pub fn option_rank(&self, value: &str) -> Option<usize> {
        self.options
            .iter()
            .position(|option| option.value == value)
            .map(|index| index + 1)
    }
}
