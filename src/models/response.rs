use serde::{Deserialize, Serialize};

use super::{AnswerId, Question, QuestionId, QuestionnaireContext, ResponseId};

/// One raw answer as stored by the submission layer
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Answer {
    pub id: AnswerId,
    pub question_id: QuestionId,
    /// Stored numeric rating, already on the canonical scale
    pub rating_value: Option<f64>,
    /// Free text, or the raw value of a yes/no question
    pub text_value: Option<String>,
    /// Selected option values for choice questions
    #[serde(default)]
    pub selected_options: Vec<String>,
    pub numeric_value: Option<f64>,
}

impl Answer {
    pub fn new(id: AnswerId, question_id: QuestionId) -> Self {
        Self {
            id,
            question_id,
            ..Self::default()
        }
    }

    pub fn with_rating(mut self, rating: f64) -> Self {
        self.rating_value = Some(rating);
        self
    }

    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text_value = Some(text.into());
        self
    }

    pub fn with_selection<I, S>(mut self, options: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.selected_options = options.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_number(mut self, value: f64) -> Self {
        self.numeric_value = Some(value);
        self
    }
}

/// An answer joined with its question
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnsweredQuestion {
    pub answer: Answer,
    pub question: Question,
}

/// A submitted response with everything needed to score it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResponseRecord {
    pub id: ResponseId,
    pub questionnaire: QuestionnaireContext,
    pub answers: Vec<AnsweredQuestion>,
}

impl ResponseRecord {
    pub fn new(id: ResponseId, questionnaire: QuestionnaireContext) -> Self {
        Self {
            id,
            questionnaire,
            answers: Vec::new(),
        }
    }

    pub fn with_answer(mut self, question: Question, answer: Answer) -> Self {
        self.answers.push(AnsweredQuestion { answer, question });
        self
    }
}
