//! Consumer lifecycle states
//!
//! ```text
//! Idle ──start()──▶ Running ──close()──▶ StopRequested ──▶ FetcherStopped
//!   │                                                          │
//!   └────────close() before start()──────▶ Stopped ◀── Draining ◀┘
//! ```

use strum_macros::{Display, EnumIter};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumIter)]
pub enum ConsumerState {
    /// Built but not started
    Idle,
    /// Fetcher and dispatcher are running
    Running,
    /// The fetcher has been asked to stop
    StopRequested,
    /// The fetcher acknowledged; no further pops will happen
    FetcherStopped,
    /// The dispatcher is stopped and leftovers are being requeued
    Draining,
    /// Shutdown finished
    Stopped,
}

impl ConsumerState {
    /// True while `close()` is in progress
    pub fn is_stopping(self) -> bool {
        matches!(
            self,
            ConsumerState::StopRequested | ConsumerState::FetcherStopped | ConsumerState::Draining
        )
    }
}
