//! Queue Store Error Types

#[derive(Debug, Clone, thiserror::Error)]
pub enum StoreError {
    #[error("Queue store unavailable: {message}")]
    Unavailable { message: String },

    #[error("Operation on queue '{queue}' failed: {message}")]
    Operation { queue: String, message: String },

    #[error("Queue store lock poisoned: {message}")]
    Poisoned { message: String },

    #[error("Snapshot error: {message}")]
    Snapshot { message: String },
}

/// Result type for queue store operations
pub type StoreResult<T> = Result<T, StoreError>;
