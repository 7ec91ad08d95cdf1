//! # Batch Scheduling
//!
//! One decision function shared by every trigger source, and the semaphore
//! backed limiter that enforces the in-flight ceiling. An attempt that finds
//! no permit is shed, never queued or blocked; work simply stays in the queue
//! until a slot frees up.

use parking_lot::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::{Notify, OwnedSemaphorePermit, Semaphore, TryAcquireError};
use tracing::{debug, warn};

/// Result of the unified scheduling decision
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScheduleDecision {
    Run,
    SkipEmptyQueue,
    SkipAtCapacity,
}

/// Decide whether a batch should be formed
pub fn schedule_decision(queue_non_empty: bool, slot_free: bool) -> ScheduleDecision {
    if !queue_non_empty {
        ScheduleDecision::SkipEmptyQueue
    } else if !slot_free {
        ScheduleDecision::SkipAtCapacity
    } else {
        ScheduleDecision::Run
    }
}

/// Permits whose release is withheld after the ceiling was lowered
#[derive(Debug)]
struct CeilingState {
    max: usize,
    debt: usize,
}

/// Bounds in-flight batches with a semaphore whose size follows the
/// runtime-adjustable ceiling
#[derive(Debug)]
pub struct ConcurrencyLimiter {
    semaphore: Arc<Semaphore>,
    ceiling: Mutex<CeilingState>,
    peak: AtomicUsize,
    idle: Notify,
}

impl ConcurrencyLimiter {
    pub fn new(max: usize) -> Self {
        let max = max.max(1);
        Self {
            semaphore: Arc::new(Semaphore::new(max)),
            ceiling: Mutex::new(CeilingState { max, debt: 0 }),
            peak: AtomicUsize::new(0),
            idle: Notify::new(),
        }
    }

    pub fn max(&self) -> usize {
        self.ceiling.lock().max
    }

    /// Resize the ceiling.
    ///
    /// Lowering never cancels batches already in flight: permits that cannot
    /// be forgotten right away become debt, paid off as in-flight slots drop.
    pub fn set_max(&self, max: usize) {
        let max = max.max(1);
        let mut ceiling = self.ceiling.lock();

        if max > ceiling.max {
            let mut added = max - ceiling.max;
            let repaid = added.min(ceiling.debt);
            ceiling.debt -= repaid;
            added -= repaid;
            self.semaphore.add_permits(added);
        } else if max < ceiling.max {
            let removed = ceiling.max - max;
            let forgotten = self.semaphore.forget_permits(removed);
            ceiling.debt += removed - forgotten;
        }

        debug!(
            max,
            debt = ceiling.debt,
            available = self.semaphore.available_permits(),
            "Concurrency ceiling resized"
        );
        ceiling.max = max;
    }

    /// Batches currently holding a slot
    pub fn in_flight(&self) -> usize {
        let ceiling = self.ceiling.lock();
        (ceiling.max + ceiling.debt).saturating_sub(self.semaphore.available_permits())
    }

    /// Highest in-flight count observed since creation
    pub fn peak(&self) -> usize {
        self.peak.load(Ordering::Acquire)
    }

    pub fn has_free_slot(&self) -> bool {
        self.semaphore.available_permits() > 0
    }

    /// Claim a slot without waiting, or `None` when the ceiling is reached
    pub fn try_acquire(self: &Arc<Self>) -> Option<BatchSlot> {
        match Arc::clone(&self.semaphore).try_acquire_owned() {
            Ok(permit) => {
                self.peak.fetch_max(self.in_flight(), Ordering::AcqRel);
                Some(BatchSlot {
                    permit: Some(permit),
                    limiter: Arc::clone(self),
                })
            }
            Err(TryAcquireError::NoPermits) => None,
            Err(TryAcquireError::Closed) => {
                warn!("Concurrency semaphore closed");
                None
            }
        }
    }

    /// Resolve once no batch holds a slot
    pub async fn wait_idle(&self) {
        loop {
            let notified = self.idle.notified();
            tokio::pin!(notified);
            notified.as_mut().enable();

            if self.in_flight() == 0 {
                return;
            }
            notified.await;
        }
    }

    fn release(&self, permit: OwnedSemaphorePermit) {
        {
            let mut ceiling = self.ceiling.lock();
            if ceiling.debt > 0 {
                ceiling.debt -= 1;
                permit.forget();
            } else {
                drop(permit);
            }
        }
        self.idle.notify_waiters();
    }
}

/// In-flight marker; its permit returns to the limiter when dropped
#[derive(Debug)]
pub struct BatchSlot {
    permit: Option<OwnedSemaphorePermit>,
    limiter: Arc<ConcurrencyLimiter>,
}

impl Drop for BatchSlot {
    fn drop(&mut self) {
        if let Some(permit) = self.permit.take() {
            self.limiter.release(permit);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_schedule_decision() {
        assert_eq!(schedule_decision(false, true), ScheduleDecision::SkipEmptyQueue);
        assert_eq!(schedule_decision(false, false), ScheduleDecision::SkipEmptyQueue);
        assert_eq!(schedule_decision(true, false), ScheduleDecision::SkipAtCapacity);
        assert_eq!(schedule_decision(true, true), ScheduleDecision::Run);
    }

    #[test]
    fn test_limiter_enforces_ceiling() {
        let limiter = Arc::new(ConcurrencyLimiter::new(2));

        let first = limiter.try_acquire();
        let second = limiter.try_acquire();
        let third = limiter.try_acquire();

        assert!(first.is_some());
        assert!(second.is_some());
        assert!(third.is_none());
        assert_eq!(limiter.in_flight(), 2);

        drop(first);
        assert_eq!(limiter.in_flight(), 1);
        assert!(limiter.try_acquire().is_some());
        assert_eq!(limiter.peak(), 2);
    }

    #[test]
    fn test_lowering_ceiling_blocks_new_slots() {
        let limiter = Arc::new(ConcurrencyLimiter::new(3));
        let _a = limiter.try_acquire();
        let _b = limiter.try_acquire();

        limiter.set_max(1);
        assert!(!limiter.has_free_slot());
        assert!(limiter.try_acquire().is_none());

        limiter.set_max(0);
        assert_eq!(limiter.max(), 1);
    }

    #[test]
    fn test_lowered_ceiling_is_honoured_as_slots_drop() {
        let limiter = Arc::new(ConcurrencyLimiter::new(3));
        let a = limiter.try_acquire();
        let b = limiter.try_acquire();

        limiter.set_max(1);
        assert_eq!(limiter.in_flight(), 2);

        drop(a);
        assert_eq!(limiter.in_flight(), 1);
        assert!(limiter.try_acquire().is_none());

        drop(b);
        assert_eq!(limiter.in_flight(), 0);
        let only = limiter.try_acquire();
        assert!(only.is_some());
        assert!(limiter.try_acquire().is_none());
    }

    #[test]
    fn test_raising_ceiling_repays_debt_first() {
        let limiter = Arc::new(ConcurrencyLimiter::new(3));
        let slots: Vec<_> = (0..3).filter_map(|_| limiter.try_acquire()).collect();

        limiter.set_max(1);
        limiter.set_max(2);
        assert_eq!(limiter.in_flight(), 3);
        assert!(!limiter.has_free_slot());

        drop(slots);
        assert_eq!(limiter.in_flight(), 0);
        let held: Vec<_> = (0..5).filter_map(|_| limiter.try_acquire()).collect();
        assert_eq!(held.len(), 2);
    }

    #[tokio::test]
    async fn test_wait_idle_resolves_when_last_slot_drops() {
        let limiter = Arc::new(ConcurrencyLimiter::new(2));
        limiter.wait_idle().await;

        let slot = limiter.try_acquire();
        let waiter = {
            let limiter = Arc::clone(&limiter);
            tokio::spawn(async move { limiter.wait_idle().await })
        };
        tokio::task::yield_now().await;
        assert!(!waiter.is_finished());

        drop(slot);
        tokio::time::timeout(std::time::Duration::from_secs(1), waiter)
            .await
            .unwrap()
            .unwrap();
    }
}
