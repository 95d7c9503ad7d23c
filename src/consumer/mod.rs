//! Relay consumer
//!
//! A continuous consumer for named queues in an external queue store. It
//! pops batches, buffers them locally, hands each item to a [`Processor`],
//! and on shutdown pushes everything it popped but did not consume back to
//! where it came from, in the original order.
//!
//! # Architecture
//!
//! ```text
//!            ┌─────────────────────── Queue Store ───────────────────────┐
//!            │   +a: [1,2,3]          -b: [4,5]          c: []          │
//!            └──────▲────────────────────┬────────────────────▲─────────┘
//!       pop_batch   │                    │ push (return /      │
//!  (sticky first)   │                    │  shutdown requeue)  │
//!            ┌──────┴──────┐   ┌─────────▼────────┐   ┌────────┴────────┐
//!            │   Fetcher   │──▶│   Relay Buffer   │──▶│   Dispatcher    │
//!            │ QueueSelector│  │ (bounded, FIFO)  │   │ Processor::process
//!            └──────▲──────┘   └─────────▲────────┘   └────────▲────────┘
//!                   │ stop + ack         │ drain               │ stop + hand back
//!            ┌──────┴────────────────────┴─────────────────────┴────────┐
//!            │              RelayConsumer::close()                      │
//!            └──────────────────────────────────────────────────────────┘
//! ```
//!
//! - **Fetcher**: one store round per cycle through the [`QueueSelector`];
//!   backs off for `empty_wait` when nothing is found and `err_wait` on
//!   store errors.
//! - **Relay Buffer**: holds at most `cache_size` entries; a full buffer
//!   blocks the fetcher.
//! - **Dispatcher**: runs the processor on one entry at a time and pushes an
//!   entry back when the processor returns [`Disposition::Return`].
//! - **Shutdown**: see [`RelayConsumer::close`].
//!
//! Within one queue, entries reach the processor in the order the store
//! returned them. Nothing is promised across queues.
//!
//! # In-flight entries at shutdown
//!
//! The dispatcher only notices a stop request between entries, so an entry
//! that is being processed when `close()` is called is finished (and its
//! return directive honoured) before the buffer is drained. It is neither
//! requeued nor lost.

mod config;
mod dispatcher;
mod entry;
mod error;
mod fetcher;
mod manager;
mod processor;
mod queue_spec;
mod relay;
mod requeue;
mod selector;
mod signal;
mod state;
mod stats;

pub use config::{
    ConsumerConfig, Settings, DEFAULT_CACHE_SIZE, DEFAULT_EMPTY_WAIT, DEFAULT_ERR_WAIT,
    DEFAULT_POP_BATCH_SIZE,
};
pub use entry::{Disposition, Entry, ReturnDirective};
pub use error::{ConsumerError, ConsumerResult};
pub use manager::{RelayConsumer, RelayConsumerBuilder};
pub use processor::{processor_fn, FnProcessor, ProcessError, Processor};
pub use queue_spec::{parse_queue_specs, QueueSpec};
pub use requeue::CloseReport;
pub use selector::QueueSelector;
pub use state::ConsumerState;
pub use stats::StatsSnapshot;

#[cfg(test)]
mod tests;
