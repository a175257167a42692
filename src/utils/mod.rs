//! Shared utilities.
//!
//! - `logging`: tracing subscriber setup for binaries and tests
//! - `metrics`: metrics sink interface and implementations

pub mod logging;
pub mod metrics;
