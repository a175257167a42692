//! Batch enrichment of raw logs into delivery-ready events.
//!
//! Joins each raw log to its parent block timestamp and, when configured for
//! deeper detail, to its transaction receipt. Lookups are deduplicated into
//! one batched call per iteration over the distinct block heights and tx
//! hashes present, bounding RPC traffic to O(unique blocks) + O(unique
//! transactions) instead of O(logs).

use std::collections::BTreeSet;

use crate::{
	models::{EnrichedLogEvent, RawLogEvent},
	services::datasource::{ChainDataSource, DataSourceError},
};

/// Joins raw logs with block and optional receipt data.
#[derive(Debug, Clone, Copy)]
pub struct LogEnricher {
	chain_id: u64,
	fetch_receipts: bool,
}

impl LogEnricher {
	pub fn new(chain_id: u64, fetch_receipts: bool) -> Self {
		LogEnricher {
			chain_id,
			fetch_receipts,
		}
	}

	/// Enriches a batch of raw logs fetched for one iteration.
	///
	/// A log whose parent block is missing from the response indicates a
	/// malformed provider answer and fails the batch as transient; the same
	/// range is refetched next tick.
	pub async fn enrich<D: ChainDataSource + ?Sized>(
		&self,
		data_source: &D,
		chain: &str,
		logs: Vec<RawLogEvent>,
	) -> Result<Vec<EnrichedLogEvent>, DataSourceError> {
		if logs.is_empty() {
			return Ok(Vec::new());
		}

		let heights: BTreeSet<u64> = logs.iter().map(|log| log.block_number).collect();
		let blocks = data_source.get_blocks(chain, &heights, false).await?;

		let receipts = if self.fetch_receipts {
			let tx_hashes: BTreeSet<String> = logs
				.iter()
				.map(|log| log.transaction_hash.clone())
				.collect();
			Some(
				data_source
					.get_transaction_receipts(chain, &tx_hashes)
					.await?,
			)
		} else {
			None
		};

		let mut enriched = Vec::with_capacity(logs.len());
		for log in logs {
			let block = blocks.get(&log.block_hash).ok_or_else(|| {
				DataSourceError::malformed(
					chain,
					format!(
						"block {} ({}) missing from batched block response",
						log.block_number, log.block_hash
					),
				)
			})?;

			let receipt = receipts
				.as_ref()
				.and_then(|map| map.get(&log.transaction_hash).cloned());

			enriched.push(EnrichedLogEvent {
				block_timestamp: block.timestamp,
				chain_id: self.chain_id,
				chain: chain.to_string(),
				receipt,
				log,
			});
		}

		Ok(enriched)
	}
}
