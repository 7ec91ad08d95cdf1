use proptest::prelude::*;

use response_pipeline::models::QuestionType;
use response_pipeline::BackoffConfig;

/// Strategy for question types with a dedicated scorer or the fallback
pub fn question_type_strategy() -> impl Strategy<Value = QuestionType> {
    prop_oneof![
        Just(QuestionType::Rating),
        Just(QuestionType::Scale),
        Just(QuestionType::YesNo),
        Just(QuestionType::SingleChoice),
        Just(QuestionType::MultipleChoice),
        Just(QuestionType::Text),
        Just(QuestionType::Textarea),
        Just(QuestionType::Number),
        Just(QuestionType::Other),
    ]
}

/// Raw numeric inputs including values far outside any sane range
pub fn raw_value_strategy() -> impl Strategy<Value = f64> {
    prop_oneof![
        -1_000.0f64..1_000.0,
        Just(0.0),
        Just(10.0),
        Just(f64::MAX),
        Just(f64::MIN),
    ]
}

/// Optional category weights, including zero and large multipliers
pub fn weight_strategy() -> impl Strategy<Value = Option<f64>> {
    prop::option::of(0.0f64..50.0)
}

/// Free text built from lexicon words, filler and punctuation
pub fn answer_text_strategy() -> impl Strategy<Value = String> {
    prop::collection::vec(
        prop_oneof![
            Just("great".to_string()),
            Just("TERRIBLE".to_string()),
            Just("okay".to_string()),
            Just("slow!".to_string()),
            Just("love".to_string()),
            Just("the".to_string()),
            Just("!!!".to_string()),
            "[a-zA-Z]{1,8}",
        ],
        0..20,
    )
    .prop_map(|words| words.join(" "))
}

/// Backoff settings that satisfy the configuration invariants
pub fn backoff_strategy() -> impl Strategy<Value = BackoffConfig> {
    (1u64..5_000, 1u64..120_000, 1.0f64..4.0).prop_map(|(base, extra, multiplier)| {
        BackoffConfig {
            base_delay_ms: base,
            max_delay_ms: base + extra,
            multiplier,
        }
    })
}
