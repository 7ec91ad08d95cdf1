//! # Pipeline Configuration
//!
//! Tuning knobs for batching, concurrency, retries and metrics retention.
//!
//! ## Architecture
//!
//! - **Defaults everywhere**: every field has a default, so an empty file is valid
//! - **Clamp, don't reject**: out-of-range values are pulled back into bounds
//! - **Runtime updates**: [`ConfigUpdate`] carries the subset adjustable while running
//!
//! ## Usage
//!
//! ```rust,no_run
//! use response_pipeline::config::PipelineConfig;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let config = PipelineConfig::load(None)?;
//! println!("batch size: {}", config.batch_size);
//! # Ok(())
//! # }
//! ```

pub mod loader;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Duration;

use crate::constants::{defaults, limits};

pub use loader::ENV_PREFIX;

/// Exponential backoff settings for per-item retries
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct BackoffConfig {
    pub base_delay_ms: u64,
    pub max_delay_ms: u64,
    pub multiplier: f64,
}

impl Default for BackoffConfig {
    fn default() -> Self {
        Self {
            base_delay_ms: defaults::BACKOFF_BASE_DELAY_MS,
            max_delay_ms: defaults::BACKOFF_MAX_DELAY_MS,
            multiplier: defaults::BACKOFF_MULTIPLIER,
        }
    }
}

impl BackoffConfig {
    /// Delay before the retry numbered `retry_count`: `min(base * multiplier^retry_count, max)`
    pub fn delay_for(&self, retry_count: u32) -> Duration {
        let exponent = i32::try_from(retry_count).unwrap_or(i32::MAX);
        let raw = self.base_delay_ms as f64 * self.multiplier.powi(exponent);
        let capped = if raw.is_finite() {
            raw.min(self.max_delay_ms as f64)
        } else {
            self.max_delay_ms as f64
        };
        Duration::from_millis(capped.max(0.0) as u64)
    }
}

/// Root configuration for a [`crate::pipeline::ResponsePipeline`]
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Maximum number of items drained into one batch
    pub batch_size: usize,
    /// Interval of the periodic batch tick
    pub batch_timeout_ms: u64,
    /// Ceiling on batches in flight at the same time
    pub max_concurrent_batches: usize,
    /// Number of items processed concurrently inside one batch
    pub chunk_concurrency: usize,
    /// Retry budget stamped onto each item at enqueue
    pub max_retries: u32,
    /// Cap on the rolling batch history
    pub history_size: usize,
    /// Number of most recent batches used for recent performance
    pub recent_window: usize,
    /// Cap on the retained permanently-failed log
    pub failed_log_size: usize,
    pub backoff: BackoffConfig,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            batch_size: defaults::BATCH_SIZE,
            batch_timeout_ms: defaults::BATCH_TIMEOUT_MS,
            max_concurrent_batches: defaults::MAX_CONCURRENT_BATCHES,
            chunk_concurrency: defaults::CHUNK_CONCURRENCY,
            max_retries: defaults::MAX_RETRIES,
            history_size: defaults::HISTORY_SIZE,
            recent_window: defaults::RECENT_WINDOW,
            failed_log_size: defaults::FAILED_LOG_SIZE,
            backoff: BackoffConfig::default(),
        }
    }
}

impl PipelineConfig {
    /// Return a copy with every field pulled into its supported range
    pub fn clamped(mut self) -> Self {
        self.batch_size = self
            .batch_size
            .clamp(limits::MIN_BATCH_SIZE, limits::MAX_BATCH_SIZE);
        self.batch_timeout_ms = self
            .batch_timeout_ms
            .clamp(limits::MIN_BATCH_TIMEOUT_MS, limits::MAX_BATCH_TIMEOUT_MS);
        self.max_concurrent_batches = self
            .max_concurrent_batches
            .clamp(limits::MIN_CONCURRENT_BATCHES, limits::MAX_CONCURRENT_BATCHES);
        self.chunk_concurrency = self
            .chunk_concurrency
            .clamp(limits::MIN_CHUNK_CONCURRENCY, limits::MAX_CHUNK_CONCURRENCY);
        self.max_retries = self.max_retries.min(limits::MAX_RETRIES);
        self.history_size = self
            .history_size
            .clamp(limits::MIN_HISTORY_SIZE, limits::MAX_HISTORY_SIZE);
        self.recent_window = self.recent_window.clamp(1, self.history_size);
        self.failed_log_size = self.failed_log_size.max(1);
        if !self.backoff.multiplier.is_finite() || self.backoff.multiplier < 1.0 {
            self.backoff.multiplier = defaults::BACKOFF_MULTIPLIER;
        }
        if self.backoff.max_delay_ms < self.backoff.base_delay_ms {
            self.backoff.max_delay_ms = self.backoff.base_delay_ms;
        }
        self
    }

    /// Apply a runtime update, clamping present fields and ignoring absent ones
    pub fn apply(&mut self, update: &ConfigUpdate) {
        if let Some(batch_size) = update.batch_size {
            self.batch_size = clamp_i64(
                batch_size,
                limits::MIN_BATCH_SIZE as i64,
                limits::MAX_BATCH_SIZE as i64,
            ) as usize;
        }
        if let Some(timeout) = update.batch_timeout_ms {
            self.batch_timeout_ms = clamp_i64(
                timeout,
                limits::MIN_BATCH_TIMEOUT_MS as i64,
                limits::MAX_BATCH_TIMEOUT_MS as i64,
            ) as u64;
        }
        if let Some(max_concurrent) = update.max_concurrent_batches {
            self.max_concurrent_batches = clamp_i64(
                max_concurrent,
                limits::MIN_CONCURRENT_BATCHES as i64,
                limits::MAX_CONCURRENT_BATCHES as i64,
            ) as usize;
        }
    }

    pub fn batch_timeout(&self) -> Duration {
        Duration::from_millis(self.batch_timeout_ms)
    }
}

fn clamp_i64(value: i64, min: i64, max: i64) -> i64 {
    value.clamp(min, max)
}

/// Runtime-adjustable subset of [`PipelineConfig`]
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct ConfigUpdate {
    pub batch_size: Option<i64>,
    pub batch_timeout_ms: Option<i64>,
    pub max_concurrent_batches: Option<i64>,
}

impl ConfigUpdate {
    /// Build an update from a loose JSON object.
    ///
    /// Accepts both `batch_size` and `batchSize` spellings. Non-numeric or
    /// non-finite values are dropped; fractional values are truncated.
    pub fn from_json(value: &Value) -> Self {
        Self {
            batch_size: numeric_field(value, &["batch_size", "batchSize"]),
            batch_timeout_ms: numeric_field(
                value,
                &["batch_timeout_ms", "batchTimeout", "batch_timeout"],
            ),
            max_concurrent_batches: numeric_field(
                value,
                &["max_concurrent_batches", "maxConcurrentBatches"],
            ),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.batch_size.is_none()
            && self.batch_timeout_ms.is_none()
            && self.max_concurrent_batches.is_none()
    }
}

fn numeric_field(value: &Value, keys: &[&str]) -> Option<i64> {
    keys.iter()
        .filter_map(|key| value.get(*key))
        .find_map(|field| match field {
            Value::Number(n) => n
                .as_i64()
                .or_else(|| n.as_f64().filter(|f| f.is_finite()).map(|f| f as i64)),
            _ => None,
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_default_config_is_within_bounds() {
        let config = PipelineConfig::default();
        assert_eq!(config.clone().clamped(), config);
        assert_eq!(config.batch_size, 10);
        assert_eq!(config.batch_timeout(), Duration::from_secs(30));
    }

    #[test]
    fn test_apply_clamps_out_of_range_values() {
        let mut config = PipelineConfig::default();
        config.apply(&ConfigUpdate {
            batch_size: Some(5_000),
            batch_timeout_ms: Some(10),
            max_concurrent_batches: Some(0),
        });

        assert_eq!(config.batch_size, 1_000);
        assert_eq!(config.batch_timeout_ms, 1_000);
        assert_eq!(config.max_concurrent_batches, 1);
    }

    #[test]
    fn test_apply_ignores_absent_fields() {
        let mut config = PipelineConfig::default();
        config.apply(&ConfigUpdate {
            batch_size: Some(25),
            ..ConfigUpdate::default()
        });

        assert_eq!(config.batch_size, 25);
        assert_eq!(config.batch_timeout_ms, defaults::BATCH_TIMEOUT_MS);
        assert_eq!(
            config.max_concurrent_batches,
            defaults::MAX_CONCURRENT_BATCHES
        );
    }

    #[test]
    fn test_update_from_json_ignores_invalid_fields() {
        let update = ConfigUpdate::from_json(&json!({
            "batchSize": "twenty",
            "batchTimeout": 45000,
            "maxConcurrentBatches": 4.7,
            "unknown": true
        }));

        assert_eq!(update.batch_size, None);
        assert_eq!(update.batch_timeout_ms, Some(45_000));
        assert_eq!(update.max_concurrent_batches, Some(4));
    }

    #[test]
    fn test_backoff_delay_is_capped() {
        let backoff = BackoffConfig::default();
        assert_eq!(backoff.delay_for(0), Duration::from_millis(1_000));
        assert_eq!(backoff.delay_for(1), Duration::from_millis(2_000));
        assert_eq!(backoff.delay_for(4), Duration::from_millis(16_000));
        assert_eq!(backoff.delay_for(5), Duration::from_millis(30_000));
        assert_eq!(backoff.delay_for(60), Duration::from_millis(30_000));
    }

    #[test]
    fn test_clamped_repairs_backoff() {
        let config = PipelineConfig {
            backoff: BackoffConfig {
                base_delay_ms: 500,
                max_delay_ms: 100,
                multiplier: 0.5,
            },
            recent_window: 500,
            history_size: 50,
            ..PipelineConfig::default()
        }
        .clamped();

        assert_eq!(config.backoff.max_delay_ms, 500);
        assert_eq!(config.backoff.multiplier, 2.0);
        assert_eq!(config.recent_window, 50);
    }
}
