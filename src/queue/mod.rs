//! # Queue Store
//!
//! Volatile, ordered collection of pending work. Every mutation happens under
//! a single lock and never suspends, so a drain always observes a consistent
//! snapshot: no item is both drained and left behind.

pub mod item;
pub mod store;

pub use item::{Priority, ProcessingOptions, QueueItem};
pub use store::QueueStore;
