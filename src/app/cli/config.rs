//! TOML configuration file loading and merging
//!
//! The file is optional. An explicit `--config` path must exist; otherwise
//! `<config dir>/Relayq/relayq.toml` is used when present. Command line
//! values always win over file values.
//!
//! ```toml
//! [consumer]
//! queues = ["+jobs", "-mail"]
//! cache_size = 100
//! pop_batch_size = 10
//! empty_wait = "60s"
//! err_wait = "5s"
//!
//! [store]
//! snapshot = "/var/lib/relayq/queues.json"
//!
//! [output]
//! format = "text"
//! forward_to = "-audit"
//! ```

use super::args::Args;
use crate::app::error::{AppError, AppResult};
use crate::app::printer::OutputFormat;
use crate::consumer::{ConsumerConfig, ReturnDirective};
use crate::core::validation::{split_comma_separated, validate_queue_name};
use crate::store::QueueEnd;
use std::path::{Path, PathBuf};

#[derive(Debug, Default, serde::Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FileConfig {
    pub consumer: ConsumerConfig,
    pub store: StoreSection,
    pub output: OutputSection,
}

#[derive(Debug, Default, serde::Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct StoreSection {
    pub snapshot: Option<PathBuf>,
}

#[derive(Debug, Default, serde::Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct OutputSection {
    pub format: Option<OutputFormat>,
    pub forward_to: Option<String>,
}

/// Everything the binary needs once file and command line are merged
#[derive(Debug, Clone)]
pub struct RunSettings {
    pub consumer: ConsumerConfig,
    pub snapshot: Option<PathBuf>,
    pub format: OutputFormat,
    pub forward_to: Option<ReturnDirective>,
}

/// Default configuration file location
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("Relayq").join("relayq.toml"))
}

/// Load the configuration file, if there is one
pub async fn load_config(explicit: Option<&Path>) -> AppResult<FileConfig> {
    let path = match explicit {
        Some(path) => {
            if !path.exists() {
                return Err(AppError::ConfigNotFound {
                    path: path.to_path_buf(),
                });
            }
            path.to_path_buf()
        }
        None => match default_config_path() {
            Some(path) if path.exists() => path,
            _ => {
                log::debug!("No configuration file; using defaults");
                return Ok(FileConfig::default());
            }
        },
    };

    log::debug!("Loading configuration from {}", path.display());
    let contents = tokio::fs::read_to_string(&path)
        .await
        .map_err(|source| AppError::ConfigRead {
            path: path.clone(),
            source,
        })?;
    parse_config(&contents, &path)
}

pub fn parse_config(contents: &str, path: &Path) -> AppResult<FileConfig> {
    toml::from_str(contents).map_err(|e| AppError::ConfigParse {
        path: path.to_path_buf(),
        message: e.to_string(),
    })
}

/// Parse a `--forward-to` target: `+name` front, `-name` or `name` back
pub fn parse_forward_target(target: &str) -> AppResult<ReturnDirective> {
    let (name, end) = if let Some(name) = target.strip_prefix('+') {
        (name, QueueEnd::Front)
    } else if let Some(name) = target.strip_prefix('-') {
        (name, QueueEnd::Back)
    } else {
        (target, QueueEnd::Back)
    };

    validate_queue_name(name).map_err(|message| AppError::InvalidForwardTarget {
        target: target.to_string(),
        message,
    })?;
    Ok(ReturnDirective::new(name, end))
}

impl FileConfig {
    /// Apply command line overrides on top of the file values
    pub fn merge(self, args: &Args) -> AppResult<RunSettings> {
        let mut consumer = self.consumer;
        if !args.queues.is_empty() {
            consumer.queues = split_comma_separated(&args.queues);
        }
        if let Some(cache_size) = args.cache_size {
            consumer.cache_size = cache_size;
        }
        if let Some(batch_size) = args.batch_size {
            consumer.pop_batch_size = batch_size;
        }
        if let Some(empty_wait) = args.empty_wait {
            consumer.empty_wait = empty_wait;
        }
        if let Some(err_wait) = args.err_wait {
            consumer.err_wait = err_wait;
        }

        let forward_to = match args.forward_to.as_deref().or(self.output.forward_to.as_deref()) {
            Some(target) => Some(parse_forward_target(target)?),
            None => None,
        };

        Ok(RunSettings {
            consumer,
            snapshot: args.snapshot.clone().or(self.store.snapshot),
            format: args.format.or(self.output.format).unwrap_or_default(),
            forward_to,
        })
    }
}
