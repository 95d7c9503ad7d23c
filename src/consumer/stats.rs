//! Pipeline counters
//!
//! Each counter is written by exactly one loop (or by the shutdown path),
//! so relaxed atomics are enough; readers only ever want a rough snapshot.

use std::sync::atomic::{AtomicU64, Ordering};

#[derive(Debug, Default)]
pub(crate) struct ConsumerStats {
    pub(crate) fetched: AtomicU64,
    pub(crate) fetch_errors: AtomicU64,
    pub(crate) empty_polls: AtomicU64,
    pub(crate) processed: AtomicU64,
    pub(crate) process_failures: AtomicU64,
    pub(crate) returned: AtomicU64,
    pub(crate) return_failures: AtomicU64,
    pub(crate) requeued: AtomicU64,
    pub(crate) requeue_failures: AtomicU64,
}

/// Point-in-time copy of the consumer counters
#[derive(Debug, Clone, Default, PartialEq, Eq, serde::Serialize)]
pub struct StatsSnapshot {
    /// Entries popped from the store
    pub fetched: u64,
    /// Pop cycles that failed with a store error
    pub fetch_errors: u64,
    /// Pop cycles that found every queue empty
    pub empty_polls: u64,
    /// Entries the processor handled successfully
    pub processed: u64,
    /// Entries the processor failed on (errors and panics)
    pub process_failures: u64,
    /// Entries pushed back on the processor's request
    pub returned: u64,
    /// Explicit returns the store rejected
    pub return_failures: u64,
    /// Entries pushed back during shutdown
    pub requeued: u64,
    /// Shutdown pushes the store rejected
    pub requeue_failures: u64,
    /// Entries waiting in the relay buffer
    pub buffered: usize,
}

impl ConsumerStats {
    pub(crate) fn add(counter: &AtomicU64, amount: usize) {
        counter.fetch_add(amount as u64, Ordering::Relaxed);
    }

    pub(crate) fn incr(counter: &AtomicU64) {
        counter.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn snapshot(&self, buffered: usize) -> StatsSnapshot {
        let read = |counter: &AtomicU64| counter.load(Ordering::Relaxed);
        StatsSnapshot {
            fetched: read(&self.fetched),
            fetch_errors: read(&self.fetch_errors),
            empty_polls: read(&self.empty_polls),
            processed: read(&self.processed),
            process_failures: read(&self.process_failures),
            returned: read(&self.returned),
            return_failures: read(&self.return_failures),
            requeued: read(&self.requeued),
            requeue_failures: read(&self.requeue_failures),
            buffered,
        }
    }
}
