//! # Domain Models
//!
//! Questionnaire, question, answer and response types consumed by the scoring
//! pipeline, plus the derived [`ProcessedAnswer`].

pub mod processed_answer;
pub mod question;
pub mod questionnaire;
pub mod response;

pub use processed_answer::{AnswerScoreUpdate, ProcessedAnswer, Sentiment};
pub use question::{Question, QuestionOption, QuestionType};
pub use questionnaire::{CategoryMapping, QuestionnaireContext};
pub use response::{Answer, AnsweredQuestion, ResponseRecord};

pub type ResponseId = i64;
pub type AnswerId = i64;
pub type QuestionId = i64;
pub type QuestionnaireId = i64;
