use relayq::store::{MemoryQueueStore, QueueEnd, QueueStore, StoreError, StoreResult};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;

/// One push the consumer made
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PushRecord {
    pub queue: String,
    pub end: QueueEnd,
    pub payload: String,
}

/// Memory store that records pushes and can fail pops or pushes on demand
#[derive(Default)]
pub struct RecordingStore {
    pub inner: MemoryQueueStore,
    pushes: Mutex<Vec<PushRecord>>,
    failing_pops: AtomicUsize,
    reject_pushes: AtomicBool,
}

#[allow(dead_code)]
impl RecordingStore {
    pub fn new(inner: MemoryQueueStore) -> Self {
        Self {
            inner,
            ..Self::default()
        }
    }

    /// Fail the next `count` pops with `StoreError::Unavailable`
    pub fn fail_next_pops(&self, count: usize) {
        self.failing_pops.store(count, Ordering::SeqCst);
    }

    pub fn reject_pushes(&self, reject: bool) {
        self.reject_pushes.store(reject, Ordering::SeqCst);
    }

    pub fn pushes(&self) -> Vec<PushRecord> {
        self.pushes.lock().unwrap().clone()
    }

    pub fn texts(&self, queue: &str) -> Vec<String> {
        self.inner
            .contents(queue)
            .unwrap()
            .into_iter()
            .map(|p| String::from_utf8(p).unwrap())
            .collect()
    }

    fn record(&self, queue: &str, payload: &[u8], end: QueueEnd) -> StoreResult<()> {
        if self.reject_pushes.load(Ordering::SeqCst) {
            return Err(StoreError::Operation {
                queue: queue.to_string(),
                message: "read-only replica".to_string(),
            });
        }
        self.pushes.lock().unwrap().push(PushRecord {
            queue: queue.to_string(),
            end,
            payload: String::from_utf8_lossy(payload).into_owned(),
        });
        Ok(())
    }
}

#[async_trait::async_trait]
impl QueueStore for RecordingStore {
    async fn pop_batch(
        &self,
        queue: &str,
        max_count: usize,
        end: QueueEnd,
    ) -> StoreResult<Vec<Vec<u8>>> {
        let remaining = self.failing_pops.load(Ordering::SeqCst);
        if remaining > 0 {
            self.failing_pops.store(remaining - 1, Ordering::SeqCst);
            return Err(StoreError::Unavailable {
                message: "connection refused".to_string(),
            });
        }
        self.inner.pop_batch(queue, max_count, end).await
    }

    async fn push_front(&self, queue: &str, payload: &[u8]) -> StoreResult<()> {
        self.record(queue, payload, QueueEnd::Front)?;
        self.inner.push_front(queue, payload).await
    }

    async fn push_back(&self, queue: &str, payload: &[u8]) -> StoreResult<()> {
        self.record(queue, payload, QueueEnd::Back)?;
        self.inner.push_back(queue, payload).await
    }
}

/// Poll `condition` until it holds, failing the test after two seconds
#[allow(dead_code)]
pub async fn wait_until<F: Fn() -> bool>(what: &str, condition: F) {
    let deadline = tokio::time::Instant::now() + std::time::Duration::from_secs(2);
    while !condition() {
        assert!(
            tokio::time::Instant::now() < deadline,
            "Timed out waiting for {}",
            what
        );
        tokio::time::sleep(std::time::Duration::from_millis(5)).await;
    }
}
