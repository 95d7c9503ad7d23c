//! Command line arguments
//!
//! Every option here overrides the matching value from the configuration
//! file; see [`super::config`] for how the two are merged.

use crate::app::printer::OutputFormat;
use crate::core::logging::{LOG_FORMATS, LOG_LEVELS};
use crate::core::time::parse_duration;
use crate::core::validation::validate_positive_int;
use crate::core::version::long_version;
use clap::{ArgAction, CommandFactory, FromArgMatches, Parser};
use std::path::PathBuf;
use std::time::Duration;

#[derive(Parser, Debug, Clone, Default)]
#[command(name = "relayq")]
#[command(about = "Continuously consume queues, returning unconsumed entries on shutdown")]
#[command(version)]
#[command(after_help = " * can be specified multiple times or as a comma-separated list\n   prefix a queue with '-' to pop from its tail, '+' (or nothing) for its head")]
pub struct Args {
    /// Queues to consume, in polling order*
    #[arg(short = 'q', long = "queue", value_name = "QUEUES", action = ArgAction::Append, allow_hyphen_values = true)]
    pub queues: Vec<String>,

    /// Configuration file path
    #[arg(short = 'c', long = "config", value_name = "FILE")]
    pub config_file: Option<PathBuf>,

    /// Maximum number of entries held in the local buffer
    #[arg(long = "cache-size", value_name = "COUNT", value_parser = validate_positive_int)]
    pub cache_size: Option<usize>,

    /// Maximum number of entries popped per store call
    #[arg(long = "batch-size", value_name = "COUNT", value_parser = validate_positive_int)]
    pub batch_size: Option<usize>,

    /// Pause after a poll that found every queue empty (e.g. 60s, 500ms)
    #[arg(long = "empty-wait", value_name = "DURATION", value_parser = parse_duration)]
    pub empty_wait: Option<Duration>,

    /// Pause after a store error
    #[arg(long = "err-wait", value_name = "DURATION", value_parser = parse_duration)]
    pub err_wait: Option<Duration>,

    /// Queue snapshot file, loaded at startup and saved on shutdown
    #[arg(short = 's', long = "snapshot", value_name = "FILE")]
    pub snapshot: Option<PathBuf>,

    /// Output format for consumed entries
    #[arg(long = "format", value_name = "FORMAT")]
    pub format: Option<OutputFormat>,

    /// Return every entry to this queue after printing it ('+' front, '-' back)
    #[arg(long = "forward-to", value_name = "QUEUE", allow_hyphen_values = true)]
    pub forward_to: Option<String>,

    /// Log level
    #[arg(short = 'l', long = "log-level", value_name = "LEVEL", value_parser = LOG_LEVELS)]
    pub log_level: Option<String>,

    /// Log output format
    #[arg(short = 'o', long = "log-format", value_name = "FORMAT", value_parser = LOG_FORMATS)]
    pub log_format: Option<String>,

    /// Log file path
    #[arg(short = 'f', long = "log-file", value_name = "FILE")]
    pub log_file: Option<PathBuf>,

    /// Force colored output
    #[arg(long = "color", conflicts_with = "no_color")]
    pub color: bool,

    /// Disable colored output
    #[arg(long = "no-color")]
    pub no_color: bool,
}

impl Args {
    /// Parse the process arguments, with build details in `--version`
    pub fn parse_from_env() -> Self {
        Self::parse_with_version(std::env::args_os())
    }

    pub fn parse_with_version<I, T>(args: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<std::ffi::OsString> + Clone,
    {
        let matches = Self::command()
            .long_version(long_version())
            .get_matches_from(args);
        match Self::from_arg_matches(&matches) {
            Ok(args) => args,
            Err(e) => e.exit(),
        }
    }

    /// Explicit color choice from the command line, if any
    pub fn color_choice(&self) -> Option<bool> {
        match (self.color, self.no_color) {
            (true, _) => Some(true),
            (_, true) => Some(false),
            _ => None,
        }
    }
}
