//! # Pipeline Metrics
//!
//! All-time counters plus a capped rolling history of batch outcomes. The
//! history feeds "recent" throughput and success rate, distinct from the
//! all-time figures. Every read returns an owned snapshot.

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, VecDeque};
use std::time::Instant;

/// All-time processing figures
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MetricsSnapshot {
    /// Items across every batch attempt, successful or not
    pub total_processed: u64,
    pub total_batches: u64,
    /// Batches that failed as a whole before per-item partitioning
    pub failed_batches: u64,
    pub total_items_failed: u64,
    pub total_retries: u64,
    pub permanent_failures: u64,
    /// Attempts shed because the queue was empty or every slot was taken
    pub skipped_attempts: u64,
    /// Running average over all batches
    pub average_processing_time_ms: f64,
    /// Item failures keyed by error kind
    pub error_counts: HashMap<String, u64>,
    pub uptime_seconds: u64,
}

/// Performance over the most recent batches
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecentPerformance {
    pub window_batches: usize,
    pub items_processed: u64,
    pub items_failed: u64,
    /// Items per second of batch processing time
    pub throughput_per_second: f64,
    /// Successful share of items (1.0 when the window is empty)
    pub success_rate: f64,
    pub average_processing_time_ms: f64,
}

impl Default for RecentPerformance {
    fn default() -> Self {
        Self {
            window_batches: 0,
            items_processed: 0,
            items_failed: 0,
            throughput_per_second: 0.0,
            success_rate: 1.0,
            average_processing_time_ms: 0.0,
        }
    }
}

#[derive(Debug, Clone)]
struct BatchDataPoint {
    items_succeeded: u64,
    items_failed: u64,
    processing_time_ms: u64,
}

#[derive(Debug, Default)]
struct MetricsState {
    snapshot: MetricsSnapshot,
    history: VecDeque<BatchDataPoint>,
}

/// Collects batch outcomes; safe to share across tasks
#[derive(Debug)]
pub struct MetricsCollector {
    started_at: Instant,
    max_history_size: usize,
    state: RwLock<MetricsState>,
}

impl MetricsCollector {
    pub fn new(max_history_size: usize) -> Self {
        Self {
            started_at: Instant::now(),
            max_history_size: max_history_size.max(1),
            state: RwLock::new(MetricsState::default()),
        }
    }

    /// Record one batch attempt
    pub fn record_batch(
        &self,
        item_count: usize,
        items_succeeded: usize,
        items_failed: usize,
        processing_time_ms: u64,
        systemic_failure: bool,
    ) {
        let mut guard = self.state.write();
        let state = &mut *guard;
        let metrics = &mut state.snapshot;

        metrics.total_processed += item_count as u64;
        metrics.total_batches += 1;
        metrics.total_items_failed += items_failed as u64;
        if systemic_failure {
            metrics.failed_batches += 1;
        }

        let batches = metrics.total_batches as f64;
        metrics.average_processing_time_ms = (metrics.average_processing_time_ms * (batches - 1.0)
            + processing_time_ms as f64)
            / batches;

        state.history.push_back(BatchDataPoint {
            items_succeeded: items_succeeded as u64,
            items_failed: items_failed as u64,
            processing_time_ms,
        });
        while state.history.len() > self.max_history_size {
            state.history.pop_front();
        }
    }

    pub fn record_skipped_attempt(&self) {
        self.state.write().snapshot.skipped_attempts += 1;
    }

    pub fn record_error(&self, error_kind: &str) {
        let mut state = self.state.write();
        *state
            .snapshot
            .error_counts
            .entry(error_kind.to_string())
            .or_insert(0) += 1;
    }

    pub fn record_retries(&self, count: usize) {
        self.state.write().snapshot.total_retries += count as u64;
    }

    pub fn record_permanent_failures(&self, count: usize) {
        self.state.write().snapshot.permanent_failures += count as u64;
    }

    pub fn average_processing_time_ms(&self) -> f64 {
        self.state.read().snapshot.average_processing_time_ms
    }

    pub fn history_len(&self) -> usize {
        self.state.read().history.len()
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        let mut snapshot = self.state.read().snapshot.clone();
        snapshot.uptime_seconds = self.started_at.elapsed().as_secs();
        snapshot
    }

    /// Aggregate the `window` most recent batches
    pub fn recent_performance(&self, window: usize) -> RecentPerformance {
        let state = self.state.read();
        let recent: Vec<&BatchDataPoint> = state.history.iter().rev().take(window).collect();
        if recent.is_empty() {
            return RecentPerformance::default();
        }

        let items_processed: u64 = recent.iter().map(|p| p.items_succeeded).sum();
        let items_failed: u64 = recent.iter().map(|p| p.items_failed).sum();
        let total_time_ms: u64 = recent.iter().map(|p| p.processing_time_ms).sum();
        let total_items = items_processed + items_failed;

        let throughput_per_second = if total_time_ms > 0 {
            total_items as f64 / (total_time_ms as f64 / 1000.0)
        } else {
            0.0
        };
        let success_rate = if total_items > 0 {
            items_processed as f64 / total_items as f64
        } else {
            1.0
        };

        RecentPerformance {
            window_batches: recent.len(),
            items_processed,
            items_failed,
            throughput_per_second,
            success_rate,
            average_processing_time_ms: total_time_ms as f64 / recent.len() as f64,
        }
    }

    /// Reset all metrics (for testing or maintenance)
    pub fn reset(&self) {
        let mut state = self.state.write();
        state.snapshot = MetricsSnapshot::default();
        state.history.clear();
    }
}
