//! Binary startup sequence
//!
//! Parse arguments, start logging, merge the configuration file, open the
//! store, then run the consumer until a shutdown signal arrives. On the way
//! out the consumer is closed (requeueing anything it still holds) and the
//! store snapshot is written back.

use super::cli::{load_config, Args};
use super::error::AppResult;
use super::printer::Printer;
use crate::app::error::AppError;
use crate::consumer::{CloseReport, RelayConsumer, StatsSnapshot};
use crate::core::logging::init_logging;
use crate::core::shutdown::ShutdownCoordinator;
use crate::core::styles::StyleRole;
use crate::core::version::long_version;
use crate::store::MemoryQueueStore;
use std::io::IsTerminal;
use std::path::Path;
use std::sync::Arc;

/// Run the `relayq` binary
pub async fn run() -> AppResult<()> {
    let args = Args::parse_from_env();
    let use_color = args
        .color_choice()
        .unwrap_or_else(|| std::io::stdout().is_terminal());

    init_logging(
        args.log_level.as_deref(),
        args.log_format.as_deref(),
        args.log_file.as_deref(),
        use_color,
    )
    .map_err(|e| AppError::Logging {
        message: e.to_string(),
    })?;
    log::info!("relayq {} starting", long_version());

    let settings = load_config(args.config_file.as_deref()).await?.merge(&args)?;
    log::debug!("Settings: {:?}", settings);

    let store = Arc::new(open_store(settings.snapshot.as_deref())?);
    let printer = Printer::new(settings.format, use_color, settings.forward_to.clone());
    let consumer = RelayConsumer::builder()
        .config(settings.consumer.clone())
        .store(store.clone())
        .processor(printer)
        .build()?;

    let (shutdown, mut shutdown_rx) = ShutdownCoordinator::install();
    consumer.start().await;
    shutdown.wait(&mut shutdown_rx).await;

    let report = consumer.close().await;
    let summary = summarize(&report, &consumer.stats());
    log::info!("{}", summary);
    eprintln!("{}", StyleRole::Summary.paint(&summary, use_color));

    if let Some(path) = &settings.snapshot {
        store.save_snapshot(path)?;
        log::info!("Queues saved to {}", path.display());
    }
    Ok(())
}

/// Open the in-process store, restoring the snapshot when one exists
pub fn open_store(snapshot: Option<&Path>) -> AppResult<MemoryQueueStore> {
    match snapshot {
        Some(path) if path.exists() => {
            let store = MemoryQueueStore::load_snapshot(path)?;
            log::info!(
                "Loaded {} queues from {}",
                store.queue_names()?.len(),
                path.display()
            );
            Ok(store)
        }
        Some(path) => {
            log::info!("{} not found; starting with empty queues", path.display());
            Ok(MemoryQueueStore::new())
        }
        None => {
            log::warn!("No snapshot configured; queue contents will not outlive this process");
            Ok(MemoryQueueStore::new())
        }
    }
}

fn summarize(report: &CloseReport, stats: &StatsSnapshot) -> String {
    format!(
        "Processed {} of {} fetched ({} failed, {} returned); requeued {} on shutdown ({} lost)",
        stats.processed,
        stats.fetched,
        stats.process_failures,
        stats.returned,
        report.requeued,
        report.failed
    )
}
