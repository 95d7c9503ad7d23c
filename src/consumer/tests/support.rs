//! Shared fixtures: an instrumented store and a few processors

use crate::consumer::{Disposition, Entry, ProcessError, Processor};
use crate::store::{MemoryQueueStore, QueueEnd, QueueStore, StoreError, StoreResult};
use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::{mpsc, Notify, Semaphore};
use tokio::time::{Duration, Instant};

/// One call to `pop_batch`
#[derive(Debug, Clone)]
pub(super) struct PopRecord {
    pub queue: String,
    pub end: QueueEnd,
    pub returned: usize,
    pub failed: bool,
    pub at: Instant,
}

/// Memory store that records pops and can be told to fail
#[derive(Default)]
pub(super) struct TestStore {
    inner: MemoryQueueStore,
    pops: Mutex<Vec<PopRecord>>,
    failing_pops: Mutex<HashSet<usize>>,
    failing_pushes: AtomicBool,
    held_pops: AtomicBool,
    waiting_pops: AtomicUsize,
    pop_release: Notify,
}

impl TestStore {
    pub fn new(inner: MemoryQueueStore) -> Arc<Self> {
        Arc::new(Self {
            inner,
            ..Self::default()
        })
    }

    pub fn pops(&self) -> Vec<PopRecord> {
        self.pops.lock().unwrap().clone()
    }

    pub fn pop_count(&self) -> usize {
        self.pops.lock().unwrap().len()
    }

    /// Make the pop with this zero-based call index fail
    pub fn fail_pop(&self, index: usize) {
        self.failing_pops.lock().unwrap().insert(index);
    }

    pub fn fail_pushes(&self, fail: bool) {
        self.failing_pushes.store(fail, Ordering::SeqCst);
    }

    pub fn texts(&self, queue: &str) -> Vec<String> {
        self.inner
            .contents(queue)
            .unwrap()
            .into_iter()
            .map(|p| String::from_utf8(p).unwrap())
            .collect()
    }

    /// Park the next pop before it touches the queue, until `release_pop`
    pub fn hold_pops(&self) {
        self.held_pops.store(true, Ordering::SeqCst);
    }

    pub fn release_pop(&self) {
        self.held_pops.store(false, Ordering::SeqCst);
        self.pop_release.notify_one();
    }

    pub fn waiting_pops(&self) -> usize {
        self.waiting_pops.load(Ordering::SeqCst)
    }

    fn check_push(&self, queue: &str) -> StoreResult<()> {
        if self.failing_pushes.load(Ordering::SeqCst) {
            return Err(StoreError::Operation {
                queue: queue.to_string(),
                message: "push rejected".to_string(),
            });
        }
        Ok(())
    }
}

#[async_trait::async_trait]
impl QueueStore for TestStore {
    async fn pop_batch(
        &self,
        queue: &str,
        max_count: usize,
        end: QueueEnd,
    ) -> StoreResult<Vec<Vec<u8>>> {
        if self.held_pops.load(Ordering::SeqCst) {
            self.waiting_pops.fetch_add(1, Ordering::SeqCst);
            self.pop_release.notified().await;
            self.waiting_pops.fetch_sub(1, Ordering::SeqCst);
        }
        let index = self.pop_count();
        let fail = self.failing_pops.lock().unwrap().remove(&index);
        let result = if fail {
            Err(StoreError::Unavailable {
                message: "connection reset".to_string(),
            })
        } else {
            self.inner.pop_batch(queue, max_count, end).await
        };

        self.pops.lock().unwrap().push(PopRecord {
            queue: queue.to_string(),
            end,
            returned: result.as_ref().map_or(0, Vec::len),
            failed: result.is_err(),
            at: Instant::now(),
        });
        result
    }

    async fn push_front(&self, queue: &str, payload: &[u8]) -> StoreResult<()> {
        self.check_push(queue)?;
        self.inner.push_front(queue, payload).await
    }

    async fn push_back(&self, queue: &str, payload: &[u8]) -> StoreResult<()> {
        self.check_push(queue)?;
        self.inner.push_back(queue, payload).await
    }
}

fn text(entry: &Entry) -> String {
    entry.payload_str().unwrap_or_default().to_string()
}

/// Records every entry and consumes it
#[derive(Default)]
pub(super) struct Recorder {
    seen: Mutex<Vec<(String, String)>>,
}

impl Recorder {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn count(&self) -> usize {
        self.seen.lock().unwrap().len()
    }

    pub fn payloads(&self) -> Vec<String> {
        self.seen.lock().unwrap().iter().map(|(_, p)| p.clone()).collect()
    }

    pub fn payloads_for(&self, queue: &str) -> Vec<String> {
        self.seen
            .lock()
            .unwrap()
            .iter()
            .filter(|(q, _)| q == queue)
            .map(|(_, p)| p.clone())
            .collect()
    }
}

#[async_trait::async_trait]
impl Processor for Recorder {
    async fn process(&self, entry: &Entry) -> Result<Disposition, ProcessError> {
        self.seen
            .lock()
            .unwrap()
            .push((entry.queue().to_string(), text(entry)));
        Ok(Disposition::Consumed)
    }
}

/// Blocks inside `process` until released, one permit per entry
pub(super) struct Gate {
    started: mpsc::UnboundedSender<String>,
    permits: Semaphore,
    finished: Mutex<Vec<String>>,
}

impl Gate {
    pub fn new() -> (Arc<Self>, mpsc::UnboundedReceiver<String>) {
        let (started, started_rx) = mpsc::unbounded_channel();
        let gate = Arc::new(Self {
            started,
            permits: Semaphore::new(0),
            finished: Mutex::new(Vec::new()),
        });
        (gate, started_rx)
    }

    pub fn release(&self, count: usize) {
        self.permits.add_permits(count);
    }

    pub fn finished(&self) -> Vec<String> {
        self.finished.lock().unwrap().clone()
    }
}

#[async_trait::async_trait]
impl Processor for Gate {
    async fn process(&self, entry: &Entry) -> Result<Disposition, ProcessError> {
        let payload = text(entry);
        let _ = self.started.send(payload.clone());
        if let Ok(permit) = self.permits.acquire().await {
            permit.forget();
        }
        self.finished.lock().unwrap().push(payload);
        Ok(Disposition::Consumed)
    }
}

/// Poll `condition` until it holds, failing the test after two seconds
pub(super) async fn eventually<F: Fn() -> bool>(what: &str, condition: F) {
    let deadline = Instant::now() + Duration::from_secs(2);
    while !condition() {
        if Instant::now() > deadline {
            panic!("Timed out waiting for {}", what);
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
}

pub(super) fn texts(entries: &[Entry]) -> Vec<String> {
    entries.iter().map(text).collect()
}
