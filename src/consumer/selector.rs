//! Queue selection
//!
//! Decides which queue is polled on each fetch cycle. The queue that most
//! recently produced data is "sticky": it is polled first on the next cycle
//! and, while it keeps yielding, no other queue is touched. Once it runs dry
//! the remaining queues are tried in configuration order and the first one
//! with data becomes the new sticky queue.
//!
//! The selector is owned by the fetcher task, which is its only reader and
//! writer, so the sticky pointer needs no synchronisation.

use crate::consumer::entry::Entry;
use crate::consumer::queue_spec::QueueSpec;
use crate::store::{QueueStore, StoreResult};

pub struct QueueSelector {
    queues: Vec<QueueSpec>,
    sticky: Option<usize>,
}

impl QueueSelector {
    pub fn new(queues: Vec<QueueSpec>) -> Self {
        Self {
            queues,
            sticky: None,
        }
    }

    pub fn queues(&self) -> &[QueueSpec] {
        &self.queues
    }

    /// The queue that last yielded data, if any
    pub fn sticky(&self) -> Option<&QueueSpec> {
        self.sticky.and_then(|idx| self.queues.get(idx))
    }

    /// Queues in the order the next cycle will poll them
    pub fn poll_order(&self) -> Vec<&QueueSpec> {
        let rest = self
            .queues
            .iter()
            .enumerate()
            .filter(|(idx, _)| Some(*idx) != self.sticky)
            .map(|(_, spec)| spec);
        self.sticky().into_iter().chain(rest).collect()
    }

    /// Run one selection cycle against `store`
    ///
    /// Returns the first non-empty batch, in the order the store popped it,
    /// or an empty vector when every queue is empty. A store error aborts the
    /// cycle and leaves the sticky queue untouched.
    pub async fn next_batch(
        &mut self,
        store: &dyn QueueStore,
        batch_size: usize,
    ) -> StoreResult<Vec<Entry>> {
        let sticky = self.sticky;
        let order = sticky
            .into_iter()
            .chain((0..self.queues.len()).filter(|idx| Some(*idx) != sticky));

        for idx in order {
            let spec = &self.queues[idx];
            let end = spec.pop_end();
            let items = store.pop_batch(spec.name(), batch_size, end).await?;
            if items.is_empty() {
                continue;
            }

            log::debug!("Popped {} entries from '{}'", items.len(), spec.name());
            let entries = items
                .into_iter()
                .map(|payload| Entry::new(spec.name(), payload, end))
                .collect();
            self.sticky = Some(idx);
            return Ok(entries);
        }

        Ok(Vec::new())
    }
}
