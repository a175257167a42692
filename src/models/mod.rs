//! Domain models and data structures for chain log watching.
//!
//! This module contains the core data structures used throughout the crate:
//!
//! - `blockchain`: chain-reported data (blocks, logs, receipts) and the
//!   filter/range types driving each polling iteration
//! - `config`: typed configuration consumed by polling jobs

mod blockchain;
mod config;

pub use blockchain::{
	Block, BlockRange, ConfirmationTag, EnrichedLogEvent, LogFilter, RawLogEvent, ReceiptLog,
	TransactionReceipt,
};

pub use config::{ConfigError, PollJobConfig, DEFAULT_POLL_INTERVAL_MS};
