//! The user-supplied processing callback

use crate::consumer::entry::{Disposition, Entry};

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Processing failure reported by a [`Processor`]
///
/// The consumer logs it at warning level and drops the entry; a processor
/// that wants the entry retried returns [`Disposition::Return`] instead.
#[derive(Debug, thiserror::Error)]
#[error("{message}")]
pub struct ProcessError {
    message: String,
    #[source]
    source: Option<BoxError>,
}

impl ProcessError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            source: None,
        }
    }

    pub fn with_source(message: impl Into<String>, source: impl Into<BoxError>) -> Self {
        Self {
            message: message.into(),
            source: Some(source.into()),
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

/// Handles entries delivered by the dispatcher, one at a time
///
/// `process` runs inline on the dispatcher task, so a slow processor slows
/// consumption but never fetching (until the relay buffer fills).
#[async_trait::async_trait]
pub trait Processor: Send + Sync {
    async fn process(&self, entry: &Entry) -> Result<Disposition, ProcessError>;
}

/// Adapter that turns a synchronous closure into a [`Processor`]
pub struct FnProcessor<F> {
    func: F,
}

#[async_trait::async_trait]
impl<F> Processor for FnProcessor<F>
where
    F: Fn(&Entry) -> Result<Disposition, ProcessError> + Send + Sync,
{
    async fn process(&self, entry: &Entry) -> Result<Disposition, ProcessError> {
        (self.func)(entry)
    }
}

/// Wrap a closure as a [`Processor`]
///
/// ```
/// use relayq::consumer::{processor_fn, Disposition};
///
/// let processor = processor_fn(|entry| {
///     println!("{} bytes from {}", entry.payload().len(), entry.queue());
///     Ok(Disposition::Consumed)
/// });
/// # let _ = processor;
/// ```
pub fn processor_fn<F>(func: F) -> FnProcessor<F>
where
    F: Fn(&Entry) -> Result<Disposition, ProcessError> + Send + Sync,
{
    FnProcessor { func }
}
