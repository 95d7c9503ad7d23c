//! Process Shutdown Signals
//!
//! Turns SIGINT/SIGTERM/SIGHUP/SIGQUIT (or Ctrl-C elsewhere) into a single
//! shutdown notification the binary can await before closing its consumer.
//! A second signal while the first is still being handled exits immediately.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::broadcast;

/// Exit status used when a second signal forces the process down
pub const FORCED_EXIT_CODE: i32 = 130;

/// Fans process signals out to any number of waiting tasks
pub struct ShutdownCoordinator {
    shutdown_tx: broadcast::Sender<()>,
    shutdown_requested: Arc<AtomicBool>,
}

impl ShutdownCoordinator {
    /// Create a coordinator without installing signal handlers
    pub fn new() -> (Self, broadcast::Receiver<()>) {
        let (shutdown_tx, shutdown_rx) = broadcast::channel(8);

        let coordinator = Self {
            shutdown_tx,
            shutdown_requested: Arc::new(AtomicBool::new(false)),
        };

        (coordinator, shutdown_rx)
    }

    /// Create a coordinator wired to the process signal handlers
    ///
    /// Must be called from within a tokio runtime.
    pub fn install() -> (Self, broadcast::Receiver<()>) {
        let (coordinator, shutdown_rx) = Self::new();
        setup_signal_handlers(
            coordinator.shutdown_tx.clone(),
            coordinator.shutdown_requested.clone(),
        );
        (coordinator, shutdown_rx)
    }

    pub fn subscribe(&self) -> broadcast::Receiver<()> {
        self.shutdown_tx.subscribe()
    }

    /// Request shutdown programmatically
    pub fn trigger_shutdown(&self) {
        // Release pairs with the Acquire load in is_shutdown_requested
        self.shutdown_requested.store(true, Ordering::Release);
        let _ = self.shutdown_tx.send(());
    }

    pub fn is_shutdown_requested(&self) -> bool {
        self.shutdown_requested.load(Ordering::Acquire)
    }

    /// Wait until shutdown is requested
    ///
    /// Returns immediately if a request already happened, even one that was
    /// sent before `shutdown_rx` was created.
    pub async fn wait(&self, shutdown_rx: &mut broadcast::Receiver<()>) {
        if self.is_shutdown_requested() {
            return;
        }
        // Lagged or closed both mean a signal was sent or can never arrive
        let _ = shutdown_rx.recv().await;
    }
}

fn notify(
    shutdown_tx: &broadcast::Sender<()>,
    shutdown_requested: &AtomicBool,
    signal_count: &AtomicUsize,
    name: &str,
) {
    let previous = signal_count.fetch_add(1, Ordering::AcqRel);
    shutdown_requested.store(true, Ordering::Release);
    let _ = shutdown_tx.send(());
    if previous >= 1 {
        log::warn!("{} received again; exiting without returning buffered entries", name);
        std::process::exit(FORCED_EXIT_CODE);
    }
    log::info!("{} received; shutting down (repeat to force exit)", name);
}

fn setup_signal_handlers(shutdown_tx: broadcast::Sender<()>, shutdown_requested: Arc<AtomicBool>) {
    let signal_count = Arc::new(AtomicUsize::new(0));

    #[cfg(unix)]
    {
        // Writes to a closed stdout pipe should terminate quietly
        unsafe {
            libc::signal(libc::SIGPIPE, libc::SIG_DFL);
        }

        use tokio::signal::unix::{signal, SignalKind};
        let signals = [
            (SignalKind::interrupt(), "SIGINT"),
            (SignalKind::terminate(), "SIGTERM"),
            (SignalKind::hangup(), "SIGHUP"),
            (SignalKind::quit(), "SIGQUIT"),
        ];

        for (kind, name) in signals {
            let tx = shutdown_tx.clone();
            let requested = shutdown_requested.clone();
            let counter = signal_count.clone();

            tokio::spawn(async move {
                match signal(kind) {
                    Ok(mut stream) => {
                        while stream.recv().await.is_some() {
                            notify(&tx, &requested, &counter, name);
                        }
                    }
                    Err(e) => log::debug!("Cannot listen for {}: {}", name, e),
                }
            });
        }
    }

    #[cfg(not(unix))]
    {
        tokio::spawn(async move {
            while tokio::signal::ctrl_c().await.is_ok() {
                notify(&shutdown_tx, &shutdown_requested, &signal_count, "Ctrl-C");
            }
        });
    }
}
