//! Stop signals for the pipeline loops
//!
//! Each loop gets its own signal so the shutdown sequence can stop the
//! fetcher and the dispatcher one after the other.

use tokio::sync::watch;

/// Sending half, held by the consumer
#[derive(Debug)]
pub(crate) struct StopSignal {
    tx: watch::Sender<bool>,
}

/// Receiving half, held by a loop
#[derive(Debug, Clone)]
pub(crate) struct StopListener {
    rx: watch::Receiver<bool>,
}

pub(crate) fn stop_signal() -> (StopSignal, StopListener) {
    let (tx, rx) = watch::channel(false);
    (StopSignal { tx }, StopListener { rx })
}

impl StopSignal {
    /// Request a stop; repeated calls are harmless
    pub(crate) fn trigger(&self) {
        self.tx.send_replace(true);
    }
}

impl StopListener {
    pub(crate) fn is_stopped(&self) -> bool {
        *self.rx.borrow()
    }

    /// Resolve once a stop is requested
    ///
    /// Also resolves if the signal is dropped, since nobody could ever
    /// trigger it after that. Cancel safe.
    pub(crate) async fn stopped(&mut self) {
        let _ = self.rx.wait_for(|stopped| *stopped).await;
    }
}
