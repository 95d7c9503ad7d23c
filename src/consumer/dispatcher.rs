//! Dispatcher loop
//!
//! Takes entries off the relay buffer one at a time and runs the processor
//! on each. It never reads from the store; the only store call it makes is
//! the push for an entry the processor asked to have returned.

use crate::consumer::entry::{Disposition, Entry, ReturnDirective};
use crate::consumer::processor::Processor;
use crate::consumer::relay::RelayReceiver;
use crate::consumer::signal::StopListener;
use crate::consumer::stats::ConsumerStats;
use crate::store::QueueStore;
use futures::FutureExt;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

pub(crate) struct Dispatcher {
    pub(crate) store: Arc<dyn QueueStore>,
    pub(crate) processor: Arc<dyn Processor>,
    pub(crate) relay: RelayReceiver,
    pub(crate) stats: Arc<ConsumerStats>,
}

impl Dispatcher {
    /// Run until `stop` fires, then hand the relay buffer back for draining
    ///
    /// A stop request is only observed between entries: an entry that is
    /// already being processed is finished, including any return push.
    pub(crate) async fn run(self, mut stop: StopListener) -> RelayReceiver {
        let Dispatcher {
            store,
            processor,
            mut relay,
            stats,
        } = self;
        let handler = Handler {
            store,
            processor,
            stats,
        };

        loop {
            let next = tokio::select! {
                biased;
                _ = stop.stopped() => break,
                next = relay.recv() => next,
            };

            match next {
                Some(entry) => handler.dispatch(entry).await,
                // Sender gone and buffer empty; wait for the stop request
                None => {
                    stop.stopped().await;
                    break;
                }
            }
        }

        log::debug!("Dispatcher stopped");
        relay
    }
}

/// The parts of the dispatcher that handle a single entry
struct Handler {
    store: Arc<dyn QueueStore>,
    processor: Arc<dyn Processor>,
    stats: Arc<ConsumerStats>,
}

impl Handler {
    async fn dispatch(&self, entry: Entry) {
        let outcome = AssertUnwindSafe(self.processor.process(&entry))
            .catch_unwind()
            .await;

        let disposition = match outcome {
            Ok(Ok(disposition)) => {
                ConsumerStats::incr(&self.stats.processed);
                disposition
            }
            Ok(Err(e)) => {
                ConsumerStats::incr(&self.stats.process_failures);
                log::warn!("[{}] Processing failed: {}", entry.queue(), e);
                return;
            }
            Err(_) => {
                ConsumerStats::incr(&self.stats.process_failures);
                log::error!("[{}] Processor panicked; entry dropped", entry.queue());
                return;
            }
        };

        if let Disposition::Return(directive) = disposition {
            self.return_entry(&entry, &directive).await;
        }
    }

    async fn return_entry(&self, entry: &Entry, directive: &ReturnDirective) {
        match self
            .store
            .push(directive.queue(), entry.payload(), directive.end())
            .await
        {
            Ok(()) => {
                ConsumerStats::incr(&self.stats.returned);
                log::info!(
                    "[{}] Entry returned to '{}' ({})",
                    entry.queue(),
                    directive.queue(),
                    directive.end()
                );
            }
            Err(e) => {
                ConsumerStats::incr(&self.stats.return_failures);
                log::error!(
                    "[{}] Returning entry to '{}' failed; entry lost: {}",
                    entry.queue(),
                    directive.queue(),
                    e
                );
            }
        }
    }
}
