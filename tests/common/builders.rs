//! Test data builders for questionnaire responses and pipelines

use std::sync::Arc;

use response_pipeline::models::{
    Answer, CategoryMapping, Question, QuestionType, QuestionnaireContext, ResponseRecord,
};
use response_pipeline::{PipelineConfig, ResponsePipeline, ResponseRepository};

/// Builder pattern for creating test responses
pub struct ResponseBuilder {
    id: i64,
    context: QuestionnaireContext,
    answers: Vec<(Question, Answer)>,
}

impl ResponseBuilder {
    pub fn new(id: i64) -> Self {
        Self {
            id,
            context: QuestionnaireContext::new(1),
            answers: Vec::new(),
        }
    }

    pub fn with_category(mut self, category: &str, area: &str, weight: Option<f64>) -> Self {
        self.context = self.context.with_category(
            category,
            CategoryMapping {
                improvement_area: Some(area.to_string()),
                weight,
            },
        );
        self
    }

    pub fn rating(mut self, category: &str, value: f64) -> Self {
        let question_id = self.next_question_id();
        let answer_id = self.answer_id(question_id);
        self.answers.push((
            Question::new(question_id, QuestionType::Rating).with_category(category),
            Answer::new(answer_id, question_id).with_rating(value),
        ));
        self
    }

    pub fn yes_no(mut self, category: &str, value: &str) -> Self {
        let question_id = self.next_question_id();
        let answer_id = self.answer_id(question_id);
        self.answers.push((
            Question::new(question_id, QuestionType::YesNo).with_category(category),
            Answer::new(answer_id, question_id).with_text(value),
        ));
        self
    }

    pub fn text(mut self, category: &str, value: &str) -> Self {
        let question_id = self.next_question_id();
        let answer_id = self.answer_id(question_id);
        self.answers.push((
            Question::new(question_id, QuestionType::Textarea).with_category(category),
            Answer::new(answer_id, question_id).with_text(value),
        ));
        self
    }

    pub fn build(self) -> ResponseRecord {
        self.answers.into_iter().fold(
            ResponseRecord::new(self.id, self.context),
            |record, (question, answer)| record.with_answer(question, answer),
        )
    }

    fn next_question_id(&self) -> i64 {
        self.answers.len() as i64 + 1
    }

    fn answer_id(&self, question_id: i64) -> i64 {
        self.id * 100 + question_id
    }
}

/// A small, valid response used where content does not matter
pub fn simple_response(id: i64) -> ResponseRecord {
    ResponseBuilder::new(id)
        .rating("overall", 4.0)
        .yes_no("overall", "yes")
        .build()
}

/// Configuration with the given batch size and concurrency ceiling
pub fn test_config(batch_size: usize, max_concurrent_batches: usize) -> PipelineConfig {
    PipelineConfig {
        batch_size,
        max_concurrent_batches,
        ..PipelineConfig::default()
    }
}

pub fn test_pipeline(
    config: PipelineConfig,
    repository: Arc<dyn ResponseRepository>,
) -> ResponsePipeline {
    ResponsePipeline::new(config, repository)
}
