//! Chain data types shared across the watcher.
//!
//! These types mirror what chain nodes report for blocks, logs and receipts,
//! plus the ephemeral range/filter values recomputed on every polling
//! iteration. Log events are immutable once produced.

use serde::{Deserialize, Serialize};

/// Symbolic height selector used when querying the chain tip.
///
/// Trades recency for reorg safety: `Latest` follows the head, `Safe` and
/// `Finalized` lag behind it by the chain's confirmation rules.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConfirmationTag {
	#[default]
	Latest,
	Safe,
	Finalized,
}

impl std::fmt::Display for ConfirmationTag {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		match self {
			ConfirmationTag::Latest => write!(f, "latest"),
			ConfirmationTag::Safe => write!(f, "safe"),
			ConfirmationTag::Finalized => write!(f, "finalized"),
		}
	}
}

/// Inclusive block height window selected for one polling iteration.
///
/// Recomputed every tick from the checkpoint and the current tip, never
/// cached across ticks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlockRange {
	pub from_height: u64,
	pub to_height: u64,
}

impl BlockRange {
	/// Creates a range, returning `None` when the bounds are inverted.
	pub fn new(from_height: u64, to_height: u64) -> Option<Self> {
		if from_height > to_height {
			return None;
		}
		Some(BlockRange {
			from_height,
			to_height,
		})
	}

	/// Number of blocks covered by the range (inclusive bounds).
	pub fn block_count(&self) -> u64 {
		self.to_height - self.from_height + 1
	}
}

impl std::fmt::Display for BlockRange {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		write!(f, "[{}, {}]", self.from_height, self.to_height)
	}
}

/// Log query filter sent to the data source.
///
/// Addresses and topics are fixed per job; the block bounds are substituted
/// each iteration from the current [`BlockRange`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogFilter {
	pub addresses: Vec<String>,
	pub topics: Vec<String>,
	pub from_block: u64,
	pub to_block: u64,
}

impl LogFilter {
	/// Builds a filter for the given range, keeping addresses and topics.
	pub fn bounded(addresses: &[String], topics: &[String], range: BlockRange) -> Self {
		LogFilter {
			addresses: addresses.to_vec(),
			topics: topics.to_vec(),
			from_block: range.from_height,
			to_block: range.to_height,
		}
	}
}

/// A block as reported by the data source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Block {
	pub number: u64,
	pub hash: String,
	/// Epoch seconds.
	pub timestamp: u64,
}

/// A contract log event exactly as the chain reported it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawLogEvent {
	pub block_number: u64,
	pub block_hash: String,
	pub address: String,
	pub topics: Vec<String>,
	pub data: String,
	pub transaction_hash: String,
	pub transaction_index: u64,
	pub log_index: u64,
	pub removed: bool,
}

/// A log entry carried inside a transaction receipt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReceiptLog {
	pub address: String,
	pub topics: Vec<String>,
	pub data: String,
}

/// Transaction receipt fields attached to enriched events when the job is
/// configured for receipt detail.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionReceipt {
	pub transaction_hash: String,
	pub status: String,
	pub logs: Vec<ReceiptLog>,
}

/// The delivery-ready unit handed to downstream handlers.
///
/// Joins the raw log with its parent block timestamp and the chain identity,
/// plus optional receipt data when enabled.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnrichedLogEvent {
	#[serde(flatten)]
	pub log: RawLogEvent,
	/// Epoch seconds of the parent block.
	pub block_timestamp: u64,
	pub chain_id: u64,
	pub chain: String,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub receipt: Option<TransactionReceipt>,
}
