//! Typed configuration consumed by polling jobs.
//!
//! The watcher consumes configuration, it does not load it: how values reach
//! a `PollJobConfig` (files, env, flags) is the embedding process's concern.

use std::time::Duration;

use serde::Deserialize;
use thiserror::Error;

use crate::models::ConfirmationTag;

/// Default pause between polling iterations, in milliseconds.
pub const DEFAULT_POLL_INTERVAL_MS: u64 = 1_000;

/// Configuration validation errors.
#[derive(Debug, Error)]
pub enum ConfigError {
	#[error("job id must not be empty")]
	EmptyJobId,

	#[error("chain name must not be empty")]
	EmptyChain,

	#[error("max_blocks_per_iteration must be greater than 0")]
	InvalidMaxBlocks,

	#[error("start_height {start} is above end_height {end}")]
	InvertedHeights { start: u64, end: u64 },

	#[error("end_height requires an explicit start_height")]
	MissingStartHeight,
}

/// Per-job configuration for one chain log polling job.
#[derive(Debug, Clone, Deserialize)]
pub struct PollJobConfig {
	/// Unique job identifier, also the checkpoint key.
	pub job_id: String,
	/// Chain name passed through to the data source and enriched events.
	pub chain: String,
	/// Numeric chain id stamped onto enriched events.
	pub chain_id: u64,
	/// Pause between iterations in milliseconds.
	#[serde(default = "default_interval_ms")]
	pub interval_ms: u64,
	/// Contract addresses to filter logs by.
	#[serde(default)]
	pub addresses: Vec<String>,
	/// Topic hashes to filter logs by.
	#[serde(default)]
	pub topics: Vec<String>,
	/// Explicit height to start from when no checkpoint exists. Without it,
	/// new jobs start watching from the current tip.
	#[serde(default)]
	pub start_height: Option<u64>,
	/// When set, the job is a bounded backfill that completes once this
	/// height has been processed.
	#[serde(default)]
	pub end_height: Option<u64>,
	/// Caps how many blocks one iteration may cover, pacing large backlogs.
	#[serde(default)]
	pub max_blocks_per_iteration: Option<u64>,
	/// Tip selector: latest, safe or finalized.
	#[serde(default)]
	pub confirmation_tag: ConfirmationTag,
	/// Whether enriched events should carry transaction receipt detail.
	#[serde(default)]
	pub fetch_receipts: bool,
}

fn default_interval_ms() -> u64 {
	DEFAULT_POLL_INTERVAL_MS
}

impl PollJobConfig {
	/// Minimal config for an unbounded watcher with default policies.
	pub fn new(job_id: impl Into<String>, chain: impl Into<String>, chain_id: u64) -> Self {
		PollJobConfig {
			job_id: job_id.into(),
			chain: chain.into(),
			chain_id,
			interval_ms: DEFAULT_POLL_INTERVAL_MS,
			addresses: Vec::new(),
			topics: Vec::new(),
			start_height: None,
			end_height: None,
			max_blocks_per_iteration: None,
			confirmation_tag: ConfirmationTag::default(),
			fetch_receipts: false,
		}
	}

	/// The inter-iteration pause as a [`Duration`].
	pub fn interval(&self) -> Duration {
		Duration::from_millis(self.interval_ms)
	}

	/// Checks invariants that would otherwise surface as confusing runtime
	/// behavior (empty checkpoint keys, zero-width windows).
	pub fn validate(&self) -> Result<(), ConfigError> {
		if self.job_id.trim().is_empty() {
			return Err(ConfigError::EmptyJobId);
		}
		if self.chain.trim().is_empty() {
			return Err(ConfigError::EmptyChain);
		}
		if self.max_blocks_per_iteration == Some(0) {
			return Err(ConfigError::InvalidMaxBlocks);
		}
		match (self.start_height, self.end_height) {
			(Some(start), Some(end)) if start > end => {
				return Err(ConfigError::InvertedHeights { start, end });
			}
			// A backfill window has no defined lower bound without a start
			// height: a tip already past the end would leave the job idling
			// forever without ever reporting completion.
			(None, Some(_)) => return Err(ConfigError::MissingStartHeight),
			_ => {}
		}
		Ok(())
	}
}
