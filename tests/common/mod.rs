//! Common test utilities and helpers
//!
//! Store wrappers that record what the consumer asks of them and can be
//! told to fail.

pub mod store_helpers;
