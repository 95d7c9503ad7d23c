//! Returning unconsumed entries to the store at shutdown
//!
//! Entries are pushed back newest first, each onto the end it was popped
//! from. For a head-popping queue that rebuilds the original head order; for
//! a tail-popping queue the original tail order.

use crate::consumer::entry::Entry;
use crate::store::QueueStore;

/// Outcome of a shutdown requeue
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, serde::Serialize)]
pub struct CloseReport {
    /// Entries successfully pushed back
    pub requeued: usize,
    /// Entries the store rejected; these are lost
    pub failed: usize,
}

impl CloseReport {
    pub fn attempted(&self) -> usize {
        self.requeued + self.failed
    }

    pub fn is_clean(&self) -> bool {
        self.failed == 0
    }
}

/// Push `entries` (oldest first) back to their origin queues
///
/// Failures are logged and counted, never retried.
pub(crate) async fn requeue(store: &dyn QueueStore, entries: Vec<Entry>) -> CloseReport {
    let mut report = CloseReport::default();
    if entries.is_empty() {
        return report;
    }

    log::info!("Returning {} unconsumed entries", entries.len());
    for entry in entries.into_iter().rev() {
        let end = entry.requeue_end();
        match store.push(entry.queue(), entry.payload(), end).await {
            Ok(()) => report.requeued += 1,
            Err(e) => {
                report.failed += 1;
                log::error!(
                    "[{}] Returning entry to the {} failed: {}",
                    entry.queue(),
                    end,
                    e
                );
            }
        }
    }

    if report.is_clean() {
        log::info!("Returned all {} entries", report.requeued);
    } else {
        log::error!(
            "Failed to return {} of {} entries",
            report.failed,
            report.attempted()
        );
    }
    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{MemoryQueueStore, QueueEnd};

    fn texts(items: Vec<Vec<u8>>) -> Vec<String> {
        items
            .into_iter()
            .map(|i| String::from_utf8(i).unwrap())
            .collect()
    }

    #[tokio::test]
    async fn test_head_popped_entries_restore_head_order() {
        let store = MemoryQueueStore::new().with_queue("a", ["e1", "e2", "e3", "e4"]);
        let popped = store.pop_batch("a", 3, QueueEnd::Front).await.unwrap();
        let entries = popped
            .into_iter()
            .map(|p| Entry::new("a", p, QueueEnd::Front))
            .collect();

        let report = requeue(&store, entries).await;
        assert_eq!(report, CloseReport { requeued: 3, failed: 0 });
        assert_eq!(texts(store.contents("a").unwrap()), vec!["e1", "e2", "e3", "e4"]);
    }

    #[tokio::test]
    async fn test_tail_popped_entries_restore_tail_order() {
        let store = MemoryQueueStore::new().with_queue("b", ["1", "2", "3"]);
        let popped = store.pop_batch("b", 2, QueueEnd::Back).await.unwrap();
        let entries = popped
            .into_iter()
            .map(|p| Entry::new("b", p, QueueEnd::Back))
            .collect();

        requeue(&store, entries).await;
        assert_eq!(texts(store.contents("b").unwrap()), vec!["1", "2", "3"]);
    }

    #[tokio::test]
    async fn test_empty_requeue_is_clean() {
        let store = MemoryQueueStore::new();
        let report = requeue(&store, Vec::new()).await;
        assert!(report.is_clean());
        assert_eq!(report.attempted(), 0);
    }
}
