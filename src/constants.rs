//! # Pipeline Constants
//!
//! Scoring bounds, sentiment lexicons and default tuning values that define the
//! operational boundaries of the response pipeline.

/// Bounds applied to every derived answer score
pub mod scoring {
    /// Lower bound of the final rating score
    pub const MIN_RATING_SCORE: f64 = 0.0;
    /// Upper bound of the final rating score
    pub const MAX_RATING_SCORE: f64 = 10.0;

    pub const YES_SCORE: f64 = 5.0;
    pub const NO_SCORE: f64 = 1.0;

    /// Output range for choice ranks, numeric normalization and sentiment
    pub const SCALE_MIN: f64 = 1.0;
    pub const SCALE_MAX: f64 = 5.0;

    /// Numeric domain assumed when a number question declares none
    pub const DEFAULT_NUMBER_MIN: f64 = 0.0;
    pub const DEFAULT_NUMBER_MAX: f64 = 10.0;

    /// Category used when a question has none
    pub const UNCATEGORIZED: &str = "uncategorized";

    /// Category averages below this value surface their improvement area
    pub const IMPROVEMENT_THRESHOLD: f64 = 3.0;
}

/// Fixed lexicons and thresholds for the text sentiment heuristic
pub mod sentiment {
    pub const POSITIVE_WORDS: &[&str] = &[
        "good",
        "great",
        "excellent",
        "amazing",
        "awesome",
        "fantastic",
        "wonderful",
        "love",
        "like",
        "enjoy",
        "enjoyed",
        "happy",
        "pleased",
        "satisfied",
        "helpful",
        "friendly",
        "easy",
        "fast",
        "perfect",
        "best",
        "nice",
        "recommend",
        "clean",
        "comfortable",
    ];

    pub const NEGATIVE_WORDS: &[&str] = &[
        "bad",
        "poor",
        "terrible",
        "awful",
        "horrible",
        "worst",
        "hate",
        "dislike",
        "unhappy",
        "disappointed",
        "disappointing",
        "frustrated",
        "frustrating",
        "annoying",
        "rude",
        "slow",
        "difficult",
        "confusing",
        "broken",
        "useless",
        "dirty",
        "expensive",
        "problem",
        "wrong",
    ];

    pub const POSITIVE_RATIO: f64 = 0.7;
    pub const SLIGHTLY_POSITIVE_RATIO: f64 = 0.4;
    pub const NEGATIVE_RATIO: f64 = 0.3;

    pub const POSITIVE_SCORE: f64 = 4.5;
    pub const SLIGHTLY_POSITIVE_SCORE: f64 = 3.5;
    pub const NEUTRAL_SCORE: f64 = 3.0;
    pub const SLIGHTLY_NEGATIVE_SCORE: f64 = 2.5;
    pub const NEGATIVE_SCORE: f64 = 1.5;

    /// More exclamation marks than this intensify the polarity
    pub const EXCLAMATION_THRESHOLD: usize = 2;
    pub const EXCLAMATION_BOOST: f64 = 0.5;

    pub const CAPS_RATIO_THRESHOLD: f64 = 0.5;
    /// Texts at or below this length never count as shouting
    pub const CAPS_MIN_LENGTH: usize = 10;
    pub const CAPS_BOOST: f64 = 0.3;
}

/// Default queue and scheduling values
pub mod defaults {
    pub const BATCH_SIZE: usize = 10;
    pub const BATCH_TIMEOUT_MS: u64 = 30_000;
    pub const MAX_CONCURRENT_BATCHES: usize = 3;
    pub const CHUNK_CONCURRENCY: usize = 10;
    pub const MAX_RETRIES: u32 = 3;
    pub const HISTORY_SIZE: usize = 100;
    pub const RECENT_WINDOW: usize = 10;
    pub const FAILED_LOG_SIZE: usize = 100;

    pub const BACKOFF_BASE_DELAY_MS: u64 = 1_000;
    pub const BACKOFF_MAX_DELAY_MS: u64 = 30_000;
    pub const BACKOFF_MULTIPLIER: f64 = 2.0;
}

/// Clamping bounds for runtime configuration
pub mod limits {
    pub const MIN_BATCH_SIZE: usize = 1;
    pub const MAX_BATCH_SIZE: usize = 1_000;
    pub const MIN_BATCH_TIMEOUT_MS: u64 = 1_000;
    pub const MAX_BATCH_TIMEOUT_MS: u64 = 300_000;
    pub const MIN_CONCURRENT_BATCHES: usize = 1;
    pub const MAX_CONCURRENT_BATCHES: usize = 10;
    pub const MIN_CHUNK_CONCURRENCY: usize = 1;
    pub const MAX_CHUNK_CONCURRENCY: usize = 100;
    pub const MAX_RETRIES: u32 = 10;
    pub const MIN_HISTORY_SIZE: usize = 1;
    pub const MAX_HISTORY_SIZE: usize = 10_000;
}
