//! Test suites for the relay consumer, organised by pipeline stage

mod shutdown;
mod support;
