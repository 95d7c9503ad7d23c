//! Generic error handling utilities
//!
//! Lets the binary report any domain error the same way: a single `FATAL:`
//! line the operator can act on, with the full error chain at debug level.

/// Trait for errors that can distinguish between user-actionable and system errors
///
/// When `is_user_actionable()` returns `true`, `user_message()` should return
/// `Some(message)`; otherwise it should return `None`.
pub trait ContextualError: std::error::Error {
    /// True when the message tells the operator exactly what to fix
    /// (bad arguments, invalid queue names, missing configuration).
    fn is_user_actionable(&self) -> bool;

    /// The message to show for user-actionable errors
    fn user_message(&self) -> Option<&str>;
}

/// Log errors with appropriate detail level based on error specificity
///
/// # Examples
/// ```rust,no_run
/// # use relayq::core::error_handling::log_error_with_context;
/// # use relayq::consumer::ConsumerError;
/// let error = ConsumerError::MissingProcessor;
/// log_error_with_context(&error, "Building consumer");
/// // Logs: "FATAL: Building consumer" followed by debug detail
/// ```
pub fn log_error_with_context<E: ContextualError + std::fmt::Display + std::fmt::Debug>(
    error: &E,
    operation_context: &str,
) {
    match error.user_message() {
        Some(user_msg) if error.is_user_actionable() => log::error!("FATAL: {}", user_msg),
        _ => log::error!("FATAL: {}: {}", operation_context, error),
    }
    log::debug!("DETAIL: {}", error);
    log::debug!("DEBUG_DETAILS: {:?}", error);
}
