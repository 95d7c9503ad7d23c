//! Bounded relay buffer between the fetcher and the dispatcher
//!
//! A fixed-capacity channel of entries. A full buffer blocks the fetcher,
//! which bounds memory use, but the block always yields to a stop request.

use crate::consumer::entry::Entry;
use crate::consumer::signal::StopListener;
use tokio::sync::mpsc;

/// Producer side, owned by the fetcher
#[derive(Debug, Clone)]
pub(crate) struct RelaySender {
    tx: mpsc::Sender<Entry>,
}

/// Consumer side, owned by the dispatcher until shutdown drains it
#[derive(Debug)]
pub(crate) struct RelayReceiver {
    rx: mpsc::Receiver<Entry>,
}

/// Result of forwarding a batch into the buffer
#[derive(Debug, PartialEq)]
pub(crate) enum Forwarded {
    /// Every entry is in the buffer
    Delivered,
    /// Forwarding stopped early; these entries never entered the buffer
    Interrupted(Vec<Entry>),
}

/// Create a relay buffer holding at most `capacity` entries
///
/// `capacity` must be non-zero; configuration defaults guarantee that.
pub(crate) fn relay_buffer(capacity: usize) -> (RelaySender, RelayReceiver) {
    let (tx, rx) = mpsc::channel(capacity);
    (RelaySender { tx }, RelayReceiver { rx })
}

impl RelaySender {
    /// Entries currently waiting in the buffer
    pub(crate) fn buffered(&self) -> usize {
        self.tx.max_capacity() - self.tx.capacity()
    }

    /// Push `batch` into the buffer in order, waiting for space as needed
    ///
    /// A stop request takes priority over free space: once `stop` fires no
    /// further entry is buffered and the remainder is handed back, oldest
    /// first. The same happens if the receiving side has gone away.
    pub(crate) async fn forward(&self, batch: Vec<Entry>, stop: &mut StopListener) -> Forwarded {
        let mut pending = batch.into_iter();
        while let Some(entry) = pending.next() {
            let permit = tokio::select! {
                biased;
                _ = stop.stopped() => None,
                permit = self.tx.reserve() => permit.ok(),
            };

            match permit {
                Some(permit) => permit.send(entry),
                None => {
                    let mut rest = vec![entry];
                    rest.extend(pending);
                    return Forwarded::Interrupted(rest);
                }
            }
        }
        Forwarded::Delivered
    }
}

impl RelayReceiver {
    /// Wait for the next entry; `None` once the buffer is empty and the
    /// sender is gone
    pub(crate) async fn recv(&mut self) -> Option<Entry> {
        self.rx.recv().await
    }

    /// Close the buffer and take everything left in it, oldest first
    pub(crate) fn drain(&mut self) -> Vec<Entry> {
        self.rx.close();
        let mut entries = Vec::new();
        while let Ok(entry) = self.rx.try_recv() {
            entries.push(entry);
        }
        entries
    }
}
