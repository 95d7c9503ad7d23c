//! RelayConsumer - lifecycle and shutdown coordination
//!
//! Owns the two pipeline tasks and runs the shutdown handshake:
//!
//! 1. stop the fetcher and wait for it to acknowledge (no more pops),
//! 2. stop the dispatcher and take the relay buffer back from it,
//! 3. drain the buffer without processing it and requeue everything,
//!    followed by any batch remainder the fetcher never managed to buffer.
//!
//! Because the dispatcher hands the buffer back only after it has stopped,
//! the drain can never race it: every popped-but-unconsumed entry is
//! requeued exactly once.
//!
//! The handshake runs in its own task. A `close()` that is dropped midway
//! (for example by a timeout) does not abandon it; the next `close()` picks
//! up the same shutdown and its report.

use crate::consumer::config::{ConsumerConfig, Settings};
use crate::consumer::dispatcher::Dispatcher;
use crate::consumer::error::{ConsumerError, ConsumerResult};
use crate::consumer::fetcher::Fetcher;
use crate::consumer::processor::Processor;
use crate::consumer::relay::{relay_buffer, RelayReceiver, RelaySender};
use crate::consumer::requeue::{requeue, CloseReport};
use crate::consumer::selector::QueueSelector;
use crate::consumer::signal::{stop_signal, StopSignal};
use crate::consumer::state::ConsumerState;
use crate::consumer::stats::{ConsumerStats, StatsSnapshot};
use crate::consumer::{entry::Entry, queue_spec::QueueSpec};
use crate::store::QueueStore;
use std::sync::Arc;
use tokio::sync::{watch, Mutex};
use tokio::task::JoinHandle;

/// Continuous consumer for one or more store queues
///
/// # Example
///
/// ```rust,no_run
/// use relayq::consumer::{processor_fn, ConsumerConfig, Disposition, RelayConsumer};
/// use relayq::store::MemoryQueueStore;
/// use std::sync::Arc;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let consumer = RelayConsumer::builder()
///     .config(ConsumerConfig::new(["+jobs", "-mail"]))
///     .store(Arc::new(MemoryQueueStore::new()))
///     .processor(processor_fn(|entry| {
///         println!("{:?}", entry.payload_str());
///         Ok(Disposition::Consumed)
///     }))
///     .build()?;
///
/// consumer.start().await;
/// // ... later
/// let report = consumer.close().await;
/// println!("requeued {} entries", report.requeued);
/// # Ok(())
/// # }
/// ```
pub struct RelayConsumer {
    settings: Settings,
    store: Arc<dyn QueueStore>,
    processor: Arc<dyn Processor>,
    stats: Arc<ConsumerStats>,
    state: Arc<watch::Sender<ConsumerState>>,
    lifecycle: Mutex<Lifecycle>,
}

enum Lifecycle {
    Idle,
    Running(RunningTasks),
    /// Shutdown task spawned; the report appears here when it is done
    Closing(watch::Receiver<Option<CloseReport>>),
    Finished(CloseReport),
}

struct RunningTasks {
    fetcher_stop: StopSignal,
    dispatcher_stop: StopSignal,
    fetcher: JoinHandle<Vec<Entry>>,
    dispatcher: JoinHandle<RelayReceiver>,
    relay: RelaySender,
}

impl RelayConsumer {
    pub fn builder() -> RelayConsumerBuilder {
        RelayConsumerBuilder::default()
    }

    /// The configured queues in polling order
    pub fn queues(&self) -> &[QueueSpec] {
        &self.settings.queues
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn state(&self) -> ConsumerState {
        *self.state.borrow()
    }

    /// Watch lifecycle transitions
    pub fn subscribe_state(&self) -> watch::Receiver<ConsumerState> {
        self.state.subscribe()
    }

    /// Current counters
    ///
    /// `buffered` reads as zero while `start()` or `close()` is in progress.
    pub fn stats(&self) -> StatsSnapshot {
        let buffered = match self.lifecycle.try_lock() {
            Ok(lifecycle) => match &*lifecycle {
                Lifecycle::Running(tasks) => tasks.relay.buffered(),
                _ => 0,
            },
            Err(_) => 0,
        };
        self.stats.snapshot(buffered)
    }

    /// Launch the fetcher and dispatcher
    ///
    /// Only the first call does anything; it returns `true`. Later calls,
    /// including calls after [`close`](Self::close), return `false`.
    /// Must be called from within a tokio runtime.
    pub async fn start(&self) -> bool {
        let mut lifecycle = self.lifecycle.lock().await;
        if !matches!(*lifecycle, Lifecycle::Idle) {
            log::debug!("Consumer already started; ignoring start()");
            return false;
        }

        let (relay_tx, relay_rx) = relay_buffer(self.settings.cache_size);
        let (fetcher_stop, fetcher_listener) = stop_signal();
        let (dispatcher_stop, dispatcher_listener) = stop_signal();

        let fetcher = Fetcher {
            store: self.store.clone(),
            selector: QueueSelector::new(self.settings.queues.clone()),
            relay: relay_tx.clone(),
            batch_size: self.settings.pop_batch_size,
            empty_wait: self.settings.empty_wait,
            err_wait: self.settings.err_wait,
            stats: self.stats.clone(),
        };
        let dispatcher = Dispatcher {
            store: self.store.clone(),
            processor: self.processor.clone(),
            relay: relay_rx,
            stats: self.stats.clone(),
        };

        *lifecycle = Lifecycle::Running(RunningTasks {
            fetcher_stop,
            dispatcher_stop,
            fetcher: tokio::spawn(fetcher.run(fetcher_listener)),
            dispatcher: tokio::spawn(dispatcher.run(dispatcher_listener)),
            relay: relay_tx,
        });
        self.state.send_replace(ConsumerState::Running);

        let names: Vec<String> = self.settings.queues.iter().map(ToString::to_string).collect();
        log::info!(
            "Consumer started on [{}] (buffer {}, batch {})",
            names.join(", "),
            self.settings.cache_size,
            self.settings.pop_batch_size
        );
        true
    }

    /// Stop both loops and return every unconsumed entry to the store
    ///
    /// Blocks until the consumer reaches [`ConsumerState::Stopped`]. Never
    /// fails: push errors are counted in the report. Concurrent and repeated
    /// callers wait for the first shutdown and receive the same report.
    ///
    /// While the fetcher finishes an in-flight pop (`StopRequested`), the
    /// dispatcher keeps working through the buffer; whatever is left once
    /// the fetcher has stopped is requeued unprocessed.
    ///
    /// Cancel safe: dropping the returned future does not interrupt the
    /// shutdown, which carries on in the background.
    pub async fn close(&self) -> CloseReport {
        let mut lifecycle = self.lifecycle.lock().await;
        let mut report_rx = match std::mem::replace(&mut *lifecycle, Lifecycle::Idle) {
            Lifecycle::Idle => {
                *lifecycle = Lifecycle::Finished(CloseReport::default());
                self.state.send_replace(ConsumerState::Stopped);
                log::debug!("Consumer closed before it was started");
                return CloseReport::default();
            }
            Lifecycle::Finished(report) => {
                *lifecycle = Lifecycle::Finished(report);
                return report;
            }
            Lifecycle::Closing(report_rx) => {
                *lifecycle = Lifecycle::Closing(report_rx.clone());
                report_rx
            }
            Lifecycle::Running(tasks) => {
                let (report_tx, report_rx) = watch::channel(None);
                let shutdown = Shutdown {
                    tasks,
                    store: self.store.clone(),
                    stats: self.stats.clone(),
                    state: self.state.clone(),
                };
                tokio::spawn(async move {
                    let report = shutdown.run().await;
                    report_tx.send_replace(Some(report));
                });
                *lifecycle = Lifecycle::Closing(report_rx.clone());
                report_rx
            }
        };
        drop(lifecycle);

        let report = match report_rx.wait_for(Option::is_some).await {
            Ok(report) => (*report).unwrap_or_default(),
            Err(_) => {
                log::error!("Shutdown task failed before reporting; buffered entries may be lost");
                CloseReport::default()
            }
        };

        let mut lifecycle = self.lifecycle.lock().await;
        if matches!(*lifecycle, Lifecycle::Closing(_)) {
            *lifecycle = Lifecycle::Finished(report);
        }
        report
    }
}

/// Everything the shutdown handshake needs, owned so it can run in a task
struct Shutdown {
    tasks: RunningTasks,
    store: Arc<dyn QueueStore>,
    stats: Arc<ConsumerStats>,
    state: Arc<watch::Sender<ConsumerState>>,
}

impl Shutdown {
    async fn run(self) -> CloseReport {
        let RunningTasks {
            fetcher_stop,
            dispatcher_stop,
            fetcher,
            dispatcher,
            relay,
        } = self.tasks;
        // Only the fetcher may hold a sender now, so the buffer closes with it
        drop(relay);

        fetcher_stop.trigger();
        self.state.send_replace(ConsumerState::StopRequested);
        let unbuffered = match fetcher.await {
            Ok(rest) => rest,
            Err(e) => {
                log::error!("Fetcher task failed: {}", e);
                Vec::new()
            }
        };
        self.state.send_replace(ConsumerState::FetcherStopped);

        dispatcher_stop.trigger();
        self.state.send_replace(ConsumerState::Draining);
        let mut pending = match dispatcher.await {
            Ok(mut relay) => relay.drain(),
            Err(e) => {
                log::error!("Dispatcher task failed; buffered entries are lost: {}", e);
                Vec::new()
            }
        };
        pending.extend(unbuffered);

        let report = requeue(self.store.as_ref(), pending).await;
        ConsumerStats::add(&self.stats.requeued, report.requeued);
        ConsumerStats::add(&self.stats.requeue_failures, report.failed);

        self.state.send_replace(ConsumerState::Stopped);
        log::info!(
            "Consumer stopped (requeued {}, failed {})",
            report.requeued,
            report.failed
        );
        report
    }
}

impl Drop for RelayConsumer {
    fn drop(&mut self) {
        if let Lifecycle::Running(tasks) = self.lifecycle.get_mut() {
            log::warn!(
                "Consumer dropped while running; {} buffered entries will not be returned",
                tasks.relay.buffered()
            );
            tasks.fetcher_stop.trigger();
            tasks.dispatcher_stop.trigger();
        }
    }
}

/// Builder for [`RelayConsumer`]
///
/// Both a store and a processor are required; building without either
/// fails immediately instead of surfacing later inside a running loop.
#[derive(Default)]
pub struct RelayConsumerBuilder {
    config: ConsumerConfig,
    store: Option<Arc<dyn QueueStore>>,
    processor: Option<Arc<dyn Processor>>,
}

impl RelayConsumerBuilder {
    pub fn config(mut self, config: ConsumerConfig) -> Self {
        self.config = config;
        self
    }

    pub fn store(mut self, store: Arc<dyn QueueStore>) -> Self {
        self.store = Some(store);
        self
    }

    pub fn processor(mut self, processor: impl Processor + 'static) -> Self {
        self.processor = Some(Arc::new(processor));
        self
    }

    pub fn shared_processor(mut self, processor: Arc<dyn Processor>) -> Self {
        self.processor = Some(processor);
        self
    }

    pub fn build(self) -> ConsumerResult<RelayConsumer> {
        let processor = self.processor.ok_or(ConsumerError::MissingProcessor)?;
        let store = self.store.ok_or(ConsumerError::MissingStore)?;
        let settings = self.config.resolve()?;
        let (state, _) = watch::channel(ConsumerState::Idle);

        Ok(RelayConsumer {
            settings,
            store,
            processor,
            stats: Arc::new(ConsumerStats::default()),
            state: Arc::new(state),
            lifecycle: Mutex::new(Lifecycle::Idle),
        })
    }
}
