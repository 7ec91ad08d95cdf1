//! Numeric helpers shared by the scoring strategies.

use crate::constants::scoring::{MAX_RATING_SCORE, MIN_RATING_SCORE};

/// Linearly map `value` from `[from_min, from_max]` onto `[to_min, to_max]`.
///
/// The result is clamped to the target range. A degenerate source domain
/// (`from_max == from_min`) yields `to_min`.
pub fn normalize_to_scale(value: f64, from_min: f64, from_max: f64, to_min: f64, to_max: f64) -> f64 {
    let span = from_max - from_min;
    if span == 0.0 || !span.is_finite() {
        return to_min;
    }
    let normalized = (value - from_min) / span * (to_max - to_min) + to_min;
    normalized.clamp(to_min, to_max)
}

/// Clamp a derived score into [0, 10]; non-finite scores carry no signal
pub fn clamp_rating(score: f64) -> Option<f64> {
    score
        .is_finite()
        .then(|| score.clamp(MIN_RATING_SCORE, MAX_RATING_SCORE))
}

pub fn round_to_hundredths(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
