//! Polling-job engine and the chain log job built on it.
//!
//! This module provides the core ingestion loop:
//! - A generic engine driving check → fetch → dispatch → persist iterations
//! - Next-window selection from checkpoint, tip and window policy
//! - Batch enrichment of raw logs with block and receipt data
//! - Concurrent handler fan-out
//! - The transient/fatal error taxonomy governing retries

mod engine;
mod enricher;
mod error;
mod handlers;
mod job;
mod range;

pub use engine::{EngineHandle, PollingJob, PollingJobEngine};
pub use enricher::LogEnricher;
pub use error::PollerError;
pub use handlers::{BatchHandler, HandlerPipeline};
pub use job::ChainLogPollJob;
pub use range::BlockRangeCalculator;
