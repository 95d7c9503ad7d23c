//! Queue specifications
//!
//! A queue is configured as its name with an optional direction prefix:
//! `+name` or `name` pops from the head, `-name` pops from the tail.

use crate::consumer::error::{ConsumerError, ConsumerResult};
use crate::core::validation::validate_queue_name;
use crate::store::QueueEnd;
use std::collections::HashSet;
use std::str::FromStr;

/// A configured queue and the end it is popped from
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct QueueSpec {
    name: String,
    pop_from_tail: bool,
}

impl QueueSpec {
    pub fn new(name: impl Into<String>, pop_from_tail: bool) -> ConsumerResult<Self> {
        let name = name.into();
        validate_queue_name(&name).map_err(|message| ConsumerError::InvalidQueue {
            spec: name.clone(),
            message,
        })?;
        Ok(Self {
            name,
            pop_from_tail,
        })
    }

    /// Parse `+name`, `-name` or `name`
    pub fn parse(field: &str) -> ConsumerResult<Self> {
        let (name, pop_from_tail) = match field.chars().next() {
            Some('+') => (&field[1..], false),
            Some('-') => (&field[1..], true),
            _ => (field, false),
        };
        validate_queue_name(name).map_err(|message| ConsumerError::InvalidQueue {
            spec: field.to_string(),
            message,
        })?;
        Ok(Self {
            name: name.to_string(),
            pop_from_tail,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn pop_from_tail(&self) -> bool {
        self.pop_from_tail
    }

    /// End that batches are popped from
    pub fn pop_end(&self) -> QueueEnd {
        if self.pop_from_tail {
            QueueEnd::Back
        } else {
            QueueEnd::Front
        }
    }

    /// End that unconsumed items are pushed back onto
    pub fn requeue_end(&self) -> QueueEnd {
        self.pop_end()
    }
}

impl FromStr for QueueSpec {
    type Err = ConsumerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl std::fmt::Display for QueueSpec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let prefix = if self.pop_from_tail { "-" } else { "+" };
        write!(f, "{}{}", prefix, self.name)
    }
}

/// Parse an ordered queue list, rejecting empty lists and duplicate names
pub fn parse_queue_specs<I, S>(fields: I) -> ConsumerResult<Vec<QueueSpec>>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut seen = HashSet::new();
    let mut specs = Vec::new();
    for field in fields {
        let spec = QueueSpec::parse(field.as_ref())?;
        if !seen.insert(spec.name().to_string()) {
            return Err(ConsumerError::InvalidQueue {
                spec: field.as_ref().to_string(),
                message: format!("Queue '{}' is configured more than once", spec.name()),
            });
        }
        specs.push(spec);
    }

    if specs.is_empty() {
        return Err(ConsumerError::configuration(
            "At least one queue must be configured",
        ));
    }
    Ok(specs)
}
