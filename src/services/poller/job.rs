//! Chain log polling job.
//!
//! Wires the range calculator, chain data source, log enricher and
//! checkpoint store into one engine iteration: pick the next height window,
//! fetch and enrich the logs in it, and commit the window's upper bound as
//! the new checkpoint once the engine has fanned the batch out successfully.
//! A crash between dispatch and persist redelivers the same range
//! (at-least-once, never gaps).

use std::sync::Arc;

use async_trait::async_trait;

use crate::{
	models::{EnrichedLogEvent, LogFilter, PollJobConfig},
	repositories::{Checkpoint, CheckpointStore},
	services::{
		datasource::ChainDataSource,
		poller::{
			engine::PollingJob, enricher::LogEnricher, error::PollerError,
			range::BlockRangeCalculator,
		},
	},
};

/// Polls one chain for contract log events with resumable progress.
pub struct ChainLogPollJob<D, S> {
	config: PollJobConfig,
	range: BlockRangeCalculator,
	enricher: LogEnricher,
	data_source: Arc<D>,
	checkpoint_store: Arc<S>,
	/// Last fully-processed height, warmed from the store in `pre_hook`.
	cursor: Option<u64>,
	/// Upper bound of the fetched-but-not-yet-committed window.
	pending_height: Option<u64>,
}

impl<D, S> ChainLogPollJob<D, S>
where
	D: ChainDataSource,
	S: CheckpointStore,
{
	pub fn new(config: PollJobConfig, data_source: Arc<D>, checkpoint_store: Arc<S>) -> Self {
		let range = BlockRangeCalculator::new(
			config.start_height,
			config.end_height,
			config.max_blocks_per_iteration,
		);
		let enricher = LogEnricher::new(config.chain_id, config.fetch_receipts);

		ChainLogPollJob {
			config,
			range,
			enricher,
			data_source,
			checkpoint_store,
			cursor: None,
			pending_height: None,
		}
	}

	/// Last fully-processed height, if any batch has completed.
	pub fn cursor(&self) -> Option<u64> {
		self.cursor
	}

	fn job_id(&self) -> &str {
		&self.config.job_id
	}
}

#[async_trait]
impl<D, S> PollingJob for ChainLogPollJob<D, S>
where
	D: ChainDataSource,
	S: CheckpointStore,
{
	type Item = EnrichedLogEvent;

	/// Checks the configuration and warms the in-memory cursor from the
	/// persisted checkpoint.
	async fn pre_hook(&mut self) -> Result<(), PollerError> {
		self.config.validate()?;

		let checkpoint = self
			.checkpoint_store
			.get(self.job_id())
			.await
			.map_err(PollerError::checkpoint)?;

		self.cursor = checkpoint.map(|c| c.last_block);
		tracing::info!(
			job = self.job_id(),
			chain = %self.config.chain,
			cursor = ?self.cursor,
			"checkpoint loaded"
		);
		Ok(())
	}

	/// Unbounded watchers always continue; bounded backfills complete once
	/// the configured end height has been processed.
	async fn has_next_batch(&mut self) -> Result<bool, PollerError> {
		Ok(!self.range.is_exhausted(self.cursor))
	}

	fn describe_progress(&self) {
		tracing::debug!(
			job = self.job_id(),
			chain = %self.config.chain,
			cursor = ?self.cursor,
			"polling for new logs"
		);
	}

	/// Computes the next window strictly from the checkpoint and a freshly
	/// read tip, fetches the logs in it and enriches them. An empty window
	/// fetches nothing; the engine still sleeps one interval.
	async fn fetch_batch(&mut self) -> Result<Vec<EnrichedLogEvent>, PollerError> {
		// A pending height from a failed iteration must never be committed.
		self.pending_height = None;
		let chain = self.config.chain.as_str();

		let tip = self
			.data_source
			.get_block_height(chain, self.config.confirmation_tag)
			.await
			.map_err(|e| PollerError::from_data_source(self.job_id(), e))?;

		let Some(range) = self.range.next_range(self.cursor, tip) else {
			tracing::debug!(
				job = self.job_id(),
				tip = tip,
				cursor = ?self.cursor,
				"caught up with the chain tip"
			);
			return Ok(Vec::new());
		};

		tracing::debug!(
			job = self.job_id(),
			range = %range,
			tip = tip,
			"fetching logs"
		);

		let filter = LogFilter::bounded(&self.config.addresses, &self.config.topics, range);
		let logs = self
			.data_source
			.get_filtered_logs(chain, &filter)
			.await
			.map_err(|e| PollerError::from_data_source(self.job_id(), e))?;

		let enriched = self
			.enricher
			.enrich(self.data_source.as_ref(), chain, logs)
			.await
			.map_err(|e| PollerError::from_data_source(self.job_id(), e))?;

		self.pending_height = Some(range.to_height);
		Ok(enriched)
	}

	/// Advances the checkpoint to the committed window's upper bound.
	/// Forward-only: a pending height at or below the cursor is discarded,
	/// so `last_block` never decreases.
	async fn persist_progress(&mut self) -> Result<(), PollerError> {
		let Some(height) = self.pending_height.take() else {
			return Ok(());
		};

		if self.cursor.is_some_and(|cursor| height <= cursor) {
			return Ok(());
		}

		let checkpoint = Checkpoint::new(self.job_id(), height);
		self.checkpoint_store
			.save(self.job_id(), &checkpoint)
			.await
			.map_err(PollerError::checkpoint)?;
		self.cursor = Some(height);

		tracing::debug!(job = self.job_id(), last_block = height, "checkpoint saved");
		Ok(())
	}
}
