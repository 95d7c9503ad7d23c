//! Queue Store Client contract
//!
//! The consumer pipeline never talks to a concrete queue service directly.
//! Everything it needs from the remote store is expressed by [`QueueStore`]:
//! an atomic batched pop from either end of a named queue, and a push of a
//! single payload to either end.
//!
//! Implementations must tolerate concurrent use from independent tasks. The
//! pipeline itself uses at most one popping task per consumer, but the
//! dispatcher and the shutdown path push concurrently with it.
//!
//! [`MemoryQueueStore`] is an in-process implementation used by the
//! `relayq` binary (backed by a JSON snapshot) and throughout the tests.

pub mod error;
pub mod memory;

pub use error::{StoreError, StoreResult};
pub use memory::MemoryQueueStore;

use serde::{Deserialize, Serialize};

/// One end of a queue
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QueueEnd {
    Front,
    Back,
}

impl std::fmt::Display for QueueEnd {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            QueueEnd::Front => write!(f, "front"),
            QueueEnd::Back => write!(f, "back"),
        }
    }
}

/// Client for an external FIFO-capable queue store
#[async_trait::async_trait]
pub trait QueueStore: Send + Sync {
    /// Atomically pop up to `max_count` items from `queue` at `end`
    ///
    /// Items are returned in the order they were popped, so popping
    /// `[4, 5]` from the back yields `[5, 4]`. A missing queue is empty.
    async fn pop_batch(
        &self,
        queue: &str,
        max_count: usize,
        end: QueueEnd,
    ) -> StoreResult<Vec<Vec<u8>>>;

    /// Push a payload onto the head of `queue`
    async fn push_front(&self, queue: &str, payload: &[u8]) -> StoreResult<()>;

    /// Push a payload onto the tail of `queue`
    async fn push_back(&self, queue: &str, payload: &[u8]) -> StoreResult<()>;

    /// Push a payload onto the given end of `queue`
    async fn push(&self, queue: &str, payload: &[u8], end: QueueEnd) -> StoreResult<()> {
        match end {
            QueueEnd::Front => self.push_front(queue, payload).await,
            QueueEnd::Back => self.push_back(queue, payload).await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_queue_end_display() {
        assert_eq!(QueueEnd::Front.to_string(), "front");
        assert_eq!(QueueEnd::Back.to_string(), "back");
    }

    #[tokio::test]
    async fn test_provided_push_routes_by_end() {
        let store = MemoryQueueStore::new();
        store.push("q", b"middle", QueueEnd::Back).await.unwrap();
        store.push("q", b"first", QueueEnd::Front).await.unwrap();
        store.push("q", b"last", QueueEnd::Back).await.unwrap();

        assert_eq!(
            store.contents("q").unwrap(),
            vec![b"first".to_vec(), b"middle".to_vec(), b"last".to_vec()]
        );
    }
}
