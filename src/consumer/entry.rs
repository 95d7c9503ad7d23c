//! Fetched items and what the processor decides to do with them

use crate::store::QueueEnd;
use chrono::{DateTime, Utc};

/// An item popped from the queue store
///
/// An entry is owned by exactly one stage at a time: the fetcher creates it,
/// the relay buffer holds it, and the dispatcher consumes it or hands it
/// back to the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entry {
    queue: String,
    payload: Vec<u8>,
    popped_from: QueueEnd,
    fetched_at: DateTime<Utc>,
}

impl Entry {
    pub fn new(queue: impl Into<String>, payload: impl Into<Vec<u8>>, popped_from: QueueEnd) -> Self {
        Self {
            queue: queue.into(),
            payload: payload.into(),
            popped_from,
            fetched_at: Utc::now(),
        }
    }

    /// Name of the queue this entry was popped from
    pub fn queue(&self) -> &str {
        &self.queue
    }

    pub fn payload(&self) -> &[u8] {
        &self.payload
    }

    /// Payload as text, if it is valid UTF-8
    pub fn payload_str(&self) -> Option<&str> {
        std::str::from_utf8(&self.payload).ok()
    }

    pub fn into_payload(self) -> Vec<u8> {
        self.payload
    }

    pub fn popped_from(&self) -> QueueEnd {
        self.popped_from
    }

    /// End this entry goes back to if it has to be requeued
    ///
    /// The end it came from: pushing the newest entry back first then puts
    /// the oldest one where the next pop will find it.
    pub fn requeue_end(&self) -> QueueEnd {
        self.popped_from
    }

    pub fn fetched_at(&self) -> DateTime<Utc> {
        self.fetched_at
    }
}

/// Where a returned entry should be pushed
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReturnDirective {
    queue: String,
    end: QueueEnd,
}

impl ReturnDirective {
    pub fn new(queue: impl Into<String>, end: QueueEnd) -> Self {
        Self {
            queue: queue.into(),
            end,
        }
    }

    pub fn to_front(queue: impl Into<String>) -> Self {
        Self::new(queue, QueueEnd::Front)
    }

    pub fn to_back(queue: impl Into<String>) -> Self {
        Self::new(queue, QueueEnd::Back)
    }

    pub fn queue(&self) -> &str {
        &self.queue
    }

    pub fn end(&self) -> QueueEnd {
        self.end
    }
}

/// Outcome of processing one entry
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Disposition {
    /// The entry is done and is dropped
    #[default]
    Consumed,
    /// Push the entry's payload back into the store
    Return(ReturnDirective),
}

impl Disposition {
    pub fn return_to_front(queue: impl Into<String>) -> Self {
        Disposition::Return(ReturnDirective::to_front(queue))
    }

    pub fn return_to_back(queue: impl Into<String>) -> Self {
        Disposition::Return(ReturnDirective::to_back(queue))
    }

    /// Put the entry back at the head of the queue it came from
    pub fn retry(entry: &Entry) -> Self {
        Self::return_to_front(entry.queue())
    }

    pub fn is_return(&self) -> bool {
        matches!(self, Disposition::Return(_))
    }
}
