//! Consumer Error Types

use crate::core::error_handling::ContextualError;

/// Errors raised while building a consumer
///
/// Everything that can go wrong once the loops are running is logged and
/// contained instead; only construction can fail.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ConsumerError {
    #[error("Invalid consumer configuration: {message}")]
    Configuration { message: String },

    #[error("Invalid queue '{spec}': {message}")]
    InvalidQueue { spec: String, message: String },

    #[error("No processor was supplied; a consumer cannot run without one")]
    MissingProcessor,

    #[error("No queue store was supplied; a consumer cannot run without one")]
    MissingStore,
}

impl ConsumerError {
    pub(crate) fn configuration(message: impl Into<String>) -> Self {
        ConsumerError::Configuration {
            message: message.into(),
        }
    }
}

impl ContextualError for ConsumerError {
    fn is_user_actionable(&self) -> bool {
        matches!(
            self,
            ConsumerError::Configuration { .. } | ConsumerError::InvalidQueue { .. }
        )
    }

    fn user_message(&self) -> Option<&str> {
        match self {
            ConsumerError::Configuration { message } => Some(message),
            ConsumerError::InvalidQueue { message, .. } => Some(message),
            _ => None,
        }
    }
}

/// Result type for consumer construction
pub type ConsumerResult<T> = Result<T, ConsumerError>;
