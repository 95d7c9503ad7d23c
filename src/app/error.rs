//! Application Error Types

use crate::consumer::ConsumerError;
use crate::core::error_handling::ContextualError;
use crate::store::StoreError;
use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Configuration file not found: {}", path.display())]
    ConfigNotFound { path: PathBuf },

    #[error("Cannot read configuration file {}: {source}", path.display())]
    ConfigRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid configuration file {}: {message}", path.display())]
    ConfigParse { path: PathBuf, message: String },

    #[error("Invalid forward target '{target}': {message}")]
    InvalidForwardTarget { target: String, message: String },

    #[error("Cannot start logging: {message}")]
    Logging { message: String },

    #[error(transparent)]
    Consumer(#[from] ConsumerError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl ContextualError for AppError {
    fn is_user_actionable(&self) -> bool {
        match self {
            AppError::ConfigParse { .. } | AppError::InvalidForwardTarget { .. } => true,
            AppError::Consumer(e) => e.is_user_actionable(),
            _ => false,
        }
    }

    fn user_message(&self) -> Option<&str> {
        match self {
            AppError::ConfigParse { message, .. } => Some(message),
            AppError::InvalidForwardTarget { message, .. } => Some(message),
            AppError::Consumer(e) => e.user_message(),
            _ => None,
        }
    }
}

/// Result type for the command line front end
pub type AppResult<T> = Result<T, AppError>;
