//! relayq: a relay consumer for named queues in an external queue store
//!
//! See [`consumer`] for the pipeline and its shutdown guarantees and
//! [`store`] for the store contract.

pub mod app;
pub mod consumer;
pub mod core;
pub mod store;
