//! Fetcher loop
//!
//! Polls the store through the [`QueueSelector`] and feeds the relay buffer.
//! After a cycle that found nothing it stays quiet for `empty_wait`, after a
//! store error for `err_wait`; both pauses end early on a stop request.
//! Store errors are never fatal, only a stop request ends the loop.

use crate::consumer::entry::Entry;
use crate::consumer::relay::{Forwarded, RelaySender};
use crate::consumer::selector::QueueSelector;
use crate::consumer::signal::StopListener;
use crate::consumer::stats::ConsumerStats;
use crate::store::QueueStore;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::{sleep_until, Instant};

pub(crate) struct Fetcher {
    pub(crate) store: Arc<dyn QueueStore>,
    pub(crate) selector: QueueSelector,
    pub(crate) relay: RelaySender,
    pub(crate) batch_size: usize,
    pub(crate) empty_wait: Duration,
    pub(crate) err_wait: Duration,
    pub(crate) stats: Arc<ConsumerStats>,
}

impl Fetcher {
    /// Run until `stop` fires
    ///
    /// Returns the entries of an interrupted batch that never made it into
    /// the relay buffer, oldest first, so shutdown can requeue them after
    /// whatever is still buffered. An in-flight pop is always allowed to
    /// complete; the loop only exits between store calls.
    pub(crate) async fn run(mut self, mut stop: StopListener) -> Vec<Entry> {
        let mut resume_at = Instant::now();

        loop {
            if stop.is_stopped() {
                break;
            }

            if Instant::now() < resume_at {
                tokio::select! {
                    biased;
                    _ = stop.stopped() => break,
                    _ = sleep_until(resume_at) => {}
                }
                continue;
            }

            match self
                .selector
                .next_batch(self.store.as_ref(), self.batch_size)
                .await
            {
                Err(e) => {
                    ConsumerStats::incr(&self.stats.fetch_errors);
                    log::warn!("Pop failed, retrying in {:?}: {}", self.err_wait, e);
                    resume_at = Instant::now() + self.err_wait;
                }
                Ok(batch) if batch.is_empty() => {
                    ConsumerStats::incr(&self.stats.empty_polls);
                    log::info!("All queues empty, next poll in {:?}", self.empty_wait);
                    resume_at = Instant::now() + self.empty_wait;
                }
                Ok(batch) => {
                    ConsumerStats::add(&self.stats.fetched, batch.len());
                    if let Forwarded::Interrupted(rest) = self.relay.forward(batch, &mut stop).await
                    {
                        log::debug!("Fetcher stopped with {} unbuffered entries", rest.len());
                        return rest;
                    }
                }
            }
        }

        log::debug!("Fetcher stopped");
        Vec::new()
    }
}
