//! CLI module containing argument parsing and configuration file handling

pub mod args;
pub mod config;

pub use args::Args;
pub use config::{load_config, FileConfig, RunSettings};
