//! In-process queue store
//!
//! Keeps every queue as a `VecDeque` behind a single mutex, which makes each
//! pop and push atomic with respect to every other caller. Queues can be
//! persisted to and restored from a JSON snapshot so the `relayq` binary can
//! carry unconsumed items across runs.

use crate::core::sync::handle_mutex_poison;
use crate::core::version::snapshot_format_version;
use crate::store::{QueueEnd, QueueStore, StoreError, StoreResult};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap, VecDeque};
use std::path::Path;
use std::sync::{Mutex, MutexGuard};

/// Queue store held entirely in memory
#[derive(Debug, Default)]
pub struct MemoryQueueStore {
    queues: Mutex<HashMap<String, VecDeque<Vec<u8>>>>,
}

/// On-disk representation of a [`MemoryQueueStore`]
#[derive(Debug, Serialize, Deserialize)]
struct Snapshot {
    format_version: u32,
    queues: BTreeMap<String, Vec<String>>,
}

impl MemoryQueueStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style helper that seeds `queue` with `items`, head first
    pub fn with_queue<I, P>(self, queue: &str, items: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<Vec<u8>>,
    {
        if let Ok(mut queues) = self.queues.lock() {
            queues
                .entry(queue.to_string())
                .or_default()
                .extend(items.into_iter().map(Into::into));
        }
        self
    }

    /// Number of items currently in `queue`
    pub fn len(&self, queue: &str) -> StoreResult<usize> {
        Ok(self.lock()?.get(queue).map_or(0, VecDeque::len))
    }

    /// True when `queue` has no items
    pub fn is_empty(&self, queue: &str) -> StoreResult<bool> {
        Ok(self.len(queue)? == 0)
    }

    /// Copy of the items in `queue`, head first
    pub fn contents(&self, queue: &str) -> StoreResult<Vec<Vec<u8>>> {
        Ok(self
            .lock()?
            .get(queue)
            .map(|items| items.iter().cloned().collect())
            .unwrap_or_default())
    }

    /// Names of all queues that currently hold items
    pub fn queue_names(&self) -> StoreResult<Vec<String>> {
        let queues = self.lock()?;
        let mut names: Vec<String> = queues
            .iter()
            .filter(|(_, items)| !items.is_empty())
            .map(|(name, _)| name.clone())
            .collect();
        names.sort();
        Ok(names)
    }

    /// Restore a store from a JSON snapshot written by [`save_snapshot`]
    ///
    /// [`save_snapshot`]: MemoryQueueStore::save_snapshot
    pub fn load_snapshot(path: &Path) -> StoreResult<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| StoreError::Snapshot {
            message: format!("cannot read {}: {}", path.display(), e),
        })?;
        let snapshot: Snapshot =
            serde_json::from_str(&contents).map_err(|e| StoreError::Snapshot {
                message: format!("cannot parse {}: {}", path.display(), e),
            })?;

        let supported = snapshot_format_version();
        if snapshot.format_version > supported {
            return Err(StoreError::Snapshot {
                message: format!(
                    "{} uses snapshot format {} but only format {} and earlier are supported",
                    path.display(),
                    snapshot.format_version,
                    supported
                ),
            });
        }

        let queues = snapshot
            .queues
            .into_iter()
            .map(|(name, items)| {
                let items = items.into_iter().map(String::into_bytes).collect();
                (name, items)
            })
            .collect();

        log::debug!("Loaded queue snapshot from {}", path.display());
        Ok(Self {
            queues: Mutex::new(queues),
        })
    }

    /// Write all non-empty queues to `path` as a JSON snapshot
    ///
    /// Payloads must be valid UTF-8; a binary payload fails the save and
    /// leaves any existing file untouched.
    pub fn save_snapshot(&self, path: &Path) -> StoreResult<()> {
        let mut queues = BTreeMap::new();
        for (name, items) in self.lock()?.iter() {
            if items.is_empty() {
                continue;
            }
            let mut encoded = Vec::with_capacity(items.len());
            for item in items {
                let text = String::from_utf8(item.clone()).map_err(|_| StoreError::Snapshot {
                    message: format!("queue '{}' holds a payload that is not UTF-8", name),
                })?;
                encoded.push(text);
            }
            queues.insert(name.clone(), encoded);
        }

        let snapshot = Snapshot {
            format_version: snapshot_format_version(),
            queues,
        };
        let json = serde_json::to_string_pretty(&snapshot).map_err(|e| StoreError::Snapshot {
            message: e.to_string(),
        })?;
        std::fs::write(path, json).map_err(|e| StoreError::Snapshot {
            message: format!("cannot write {}: {}", path.display(), e),
        })?;

        log::debug!("Saved queue snapshot to {}", path.display());
        Ok(())
    }

    fn lock(&self) -> StoreResult<MutexGuard<'_, HashMap<String, VecDeque<Vec<u8>>>>> {
        handle_mutex_poison(self.queues.lock(), |message| StoreError::Poisoned {
            message,
        })
    }
}

#[async_trait::async_trait]
impl QueueStore for MemoryQueueStore {
    async fn pop_batch(
        &self,
        queue: &str,
        max_count: usize,
        end: QueueEnd,
    ) -> StoreResult<Vec<Vec<u8>>> {
        let mut queues = self.lock()?;
        let Some(items) = queues.get_mut(queue) else {
            return Ok(Vec::new());
        };

        let count = max_count.min(items.len());
        let popped = match end {
            QueueEnd::Front => items.drain(..count).collect(),
            QueueEnd::Back => (0..count).filter_map(|_| items.pop_back()).collect(),
        };
        Ok(popped)
    }

    async fn push_front(&self, queue: &str, payload: &[u8]) -> StoreResult<()> {
        self.lock()?
            .entry(queue.to_string())
            .or_default()
            .push_front(payload.to_vec());
        Ok(())
    }

    async fn push_back(&self, queue: &str, payload: &[u8]) -> StoreResult<()> {
        self.lock()?
            .entry(queue.to_string())
            .or_default()
            .push_back(payload.to_vec());
        Ok(())
    }
}
