//! Consumer configuration
//!
//! [`ConsumerConfig`] is the user-facing, serde-loadable form. Zero values
//! mean "use the default", matching how the TOML file and the command line
//! leave settings unset. [`ConsumerConfig::resolve`] validates it into the
//! [`Settings`] the running loops use.

use crate::consumer::error::ConsumerResult;
use crate::consumer::queue_spec::{parse_queue_specs, QueueSpec};
use crate::core::time::serde_duration;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Default relay buffer capacity
pub const DEFAULT_CACHE_SIZE: usize = 100;
/// Default number of items requested per pop
pub const DEFAULT_POP_BATCH_SIZE: usize = 10;
/// Default pause after a cycle that found every queue empty
pub const DEFAULT_EMPTY_WAIT: Duration = Duration::from_secs(60);
/// Default pause after a store error
pub const DEFAULT_ERR_WAIT: Duration = Duration::from_secs(5);

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ConsumerConfig {
    /// Queues in polling order, each `+name`, `-name` or `name`
    pub queues: Vec<String>,
    /// Relay buffer capacity
    pub cache_size: usize,
    /// Maximum items per pop
    pub pop_batch_size: usize,
    /// Pause after a cycle that found every queue empty
    #[serde(with = "serde_duration")]
    pub empty_wait: Duration,
    /// Pause after a store error
    #[serde(with = "serde_duration")]
    pub err_wait: Duration,
}

impl Default for ConsumerConfig {
    fn default() -> Self {
        Self {
            queues: Vec::new(),
            cache_size: DEFAULT_CACHE_SIZE,
            pop_batch_size: DEFAULT_POP_BATCH_SIZE,
            empty_wait: DEFAULT_EMPTY_WAIT,
            err_wait: DEFAULT_ERR_WAIT,
        }
    }
}

impl ConsumerConfig {
    pub fn new<I, S>(queues: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            queues: queues.into_iter().map(Into::into).collect(),
            ..Self::default()
        }
    }

    pub fn cache_size(mut self, cache_size: usize) -> Self {
        self.cache_size = cache_size;
        self
    }

    pub fn pop_batch_size(mut self, pop_batch_size: usize) -> Self {
        self.pop_batch_size = pop_batch_size;
        self
    }

    pub fn empty_wait(mut self, empty_wait: Duration) -> Self {
        self.empty_wait = empty_wait;
        self
    }

    pub fn err_wait(mut self, err_wait: Duration) -> Self {
        self.err_wait = err_wait;
        self
    }

    /// Apply defaults and parse the queue list
    pub fn resolve(&self) -> ConsumerResult<Settings> {
        let non_zero = |value: usize, default: usize| if value == 0 { default } else { value };
        let non_zero_wait =
            |value: Duration, default: Duration| if value.is_zero() { default } else { value };

        Ok(Settings {
            queues: parse_queue_specs(&self.queues)?,
            cache_size: non_zero(self.cache_size, DEFAULT_CACHE_SIZE),
            pop_batch_size: non_zero(self.pop_batch_size, DEFAULT_POP_BATCH_SIZE),
            empty_wait: non_zero_wait(self.empty_wait, DEFAULT_EMPTY_WAIT),
            err_wait: non_zero_wait(self.err_wait, DEFAULT_ERR_WAIT),
        })
    }
}

/// Validated consumer settings
#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub queues: Vec<QueueSpec>,
    pub cache_size: usize,
    pub pop_batch_size: usize,
    pub empty_wait: Duration,
    pub err_wait: Duration,
}
