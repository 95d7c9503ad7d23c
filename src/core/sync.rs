//! Synchronization utilities for robust mutex handling
//!
//! Converts mutex poisoning into domain errors so a panic on one task does
//! not cascade into panics everywhere the same lock is taken.

use std::sync::LockResult;

/// Handle poisoned mutex cases with consistent error handling
///
/// Maps a poisoned lock into an application error built by
/// `error_constructor`, leaving healthy guards untouched.
///
/// # Examples
/// ```
/// use std::sync::Mutex;
/// use relayq::core::sync::handle_mutex_poison;
/// use relayq::store::StoreError;
///
/// let mutex = Mutex::new(42);
/// let guard = handle_mutex_poison(
///     mutex.lock(),
///     |message| StoreError::Poisoned { message }
/// ).unwrap();
/// assert_eq!(*guard, 42);
/// ```
pub fn handle_mutex_poison<T, E>(
    result: LockResult<T>,
    error_constructor: impl FnOnce(String) -> E,
) -> Result<T, E> {
    result.map_err(|poison_err| {
        error_constructor(format!(
            "Internal synchronisation error (mutex poisoned). This indicates a panic occurred while holding a lock. PoisonError: {:?}",
            poison_err
        ))
    })
}
