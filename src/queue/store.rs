use parking_lot::Mutex;
use std::collections::VecDeque;
use tracing::debug;

use super::QueueItem;
use crate::models::ResponseId;

/// FIFO queue with front re-insertion for retries
#[derive(Debug, Default)]
pub struct QueueStore {
    items: Mutex<VecDeque<QueueItem>>,
}

impl QueueStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an item, returning its 1-based position
    pub fn enqueue(&self, item: QueueItem) -> usize {
        let mut items = self.items.lock();
        items.push_back(item);
        items.len()
    }

    /// Remove up to `max_count` items from the front, in FIFO order
    pub fn drain(&self, max_count: usize) -> Vec<QueueItem> {
        let mut items = self.items.lock();
        let count = max_count.min(items.len());
        items.drain(..count).collect()
    }

    /// Reinsert an item ahead of everything currently queued
    pub fn requeue_front(&self, item: QueueItem) {
        debug!(
            response_id = item.response_id,
            retry_count = item.retry_count,
            "Requeueing item at front"
        );
        self.items.lock().push_front(item);
    }

    /// Reinsert several items at the front, keeping their relative order
    pub fn requeue_front_many(&self, batch: Vec<QueueItem>) {
        if batch.is_empty() {
            return;
        }
        let mut items = self.items.lock();
        for item in batch.into_iter().rev() {
            items.push_front(item);
        }
    }

    pub fn size(&self) -> usize {
        self.items.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.lock().is_empty()
    }

    /// Discard all pending items, returning how many were removed
    pub fn clear(&self) -> usize {
        let mut items = self.items.lock();
        let cleared = items.len();
        items.clear();
        cleared
    }

    /// Copy of the queued response ids in order
    pub fn snapshot_ids(&self) -> Vec<ResponseId> {
        self.items.lock().iter().map(|item| item.response_id).collect()
    }
}
