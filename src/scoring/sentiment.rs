//! # Text Sentiment Heuristic
//!
//! Lexical polarity estimate for free-text answers. Tokens are split on
//! whitespace, lower-cased and stripped of surrounding punctuation, then
//! matched against fixed positive and negative word lists. Exclamation marks
//! and shouting push a polar result further toward its extreme.

use serde::Serialize;

use super::normalize::round_to_hundredths;
use crate::constants::scoring::{SCALE_MAX, SCALE_MIN};
use crate::constants::sentiment::*;
use crate::models::Sentiment;

/// Outcome of analysing one non-empty text
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SentimentAnalysis {
    pub sentiment: Sentiment,
    /// Score on the 1-5 scale, rounded to two decimals
    pub score: f64,
    pub word_count: usize,
    pub positive_matches: usize,
    pub negative_matches: usize,
    /// `positive / (positive + negative)`, absent when no lexicon word matched
    pub ratio: Option<f64>,
    pub exclamation_count: usize,
    pub caps_ratio: f64,
    pub intensified: bool,
}

/// Analyse `text`, returning `None` for empty or whitespace-only input
pub fn analyze_sentiment(text: &str) -> Option<SentimentAnalysis> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return None;
    }

    let tokens: Vec<String> = trimmed
        .split_whitespace()
        .map(|token| {
            token
                .trim_matches(|c: char| !c.is_alphanumeric())
                .to_lowercase()
        })
        .filter(|token| !token.is_empty())
        .collect();

    let positive_matches = tokens
        .iter()
        .filter(|token| POSITIVE_WORDS.contains(&token.as_str()))
        .count();
    let negative_matches = tokens
        .iter()
        .filter(|token| NEGATIVE_WORDS.contains(&token.as_str()))
        .count();

    let (sentiment, base_score, ratio) = classify(positive_matches, negative_matches);

    let exclamation_count = trimmed.matches('!').count();
    let caps_ratio = uppercase_ratio(trimmed);

    let mut score = base_score;
    if exclamation_count > EXCLAMATION_THRESHOLD {
        score = intensify(sentiment, score, EXCLAMATION_BOOST);
    }
    if caps_ratio > CAPS_RATIO_THRESHOLD && trimmed.chars().count() > CAPS_MIN_LENGTH {
        score = intensify(sentiment, score, CAPS_BOOST);
    }

    Some(SentimentAnalysis {
        sentiment,
        score: round_to_hundredths(score),
        word_count: tokens.len(),
        positive_matches,
        negative_matches,
        ratio,
        exclamation_count,
        caps_ratio: round_to_hundredths(caps_ratio),
        intensified: score != base_score,
    })
}

fn classify(positive: usize, negative: usize) -> (Sentiment, f64, Option<f64>) {
    let total = positive + negative;
    if total == 0 {
        return (Sentiment::Neutral, NEUTRAL_SCORE, None);
    }

    let ratio = positive as f64 / total as f64;
    let (sentiment, score) = if ratio >= POSITIVE_RATIO {
        (Sentiment::Positive, POSITIVE_SCORE)
    } else if ratio >= SLIGHTLY_POSITIVE_RATIO {
        (Sentiment::SlightlyPositive, SLIGHTLY_POSITIVE_SCORE)
    } else if ratio <= NEGATIVE_RATIO {
        (Sentiment::Negative, NEGATIVE_SCORE)
    } else {
        (Sentiment::SlightlyNegative, SLIGHTLY_NEGATIVE_SCORE)
    };
    (sentiment, score, Some(ratio))
}

/// Push polar scores toward their extreme; neutral and slight variants stay put
fn intensify(sentiment: Sentiment, score: f64, boost: f64) -> f64 {
    match sentiment {
        Sentiment::Positive => (score + boost).clamp(SCALE_MIN, SCALE_MAX),
        Sentiment::Negative => (score - boost).clamp(SCALE_MIN, SCALE_MAX),
        _ => score,
    }
}

/// Fraction of alphabetic characters that are uppercase
fn uppercase_ratio(text: &str) -> f64 {
    let (letters, upper) = text
        .chars()
        .filter(|c| c.is_alphabetic())
        .fold((0usize, 0usize), |(letters, upper), c| {
            (letters + 1, upper + usize::from(c.is_uppercase()))
        });
    if letters == 0 {
        0.0
    } else {
        upper as f64 / letters as f64
    }
}
