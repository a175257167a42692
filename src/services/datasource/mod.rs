//! Chain data source interface.
//!
//! Defines the contract all chain node clients must follow to feed the
//! polling jobs: tip height, block batches, filtered logs and transaction
//! receipts. Concrete RPC implementations live outside this crate; they only
//! need to surface [`DataSourceError::AllProvidersUnreachable`] distinctly,
//! since that discriminant is the contract for fatal failure classification.

use std::collections::{BTreeSet, HashMap};

use async_trait::async_trait;
use thiserror::Error;

use crate::models::{Block, ConfirmationTag, LogFilter, RawLogEvent, TransactionReceipt};

/// Errors surfaced by chain data sources.
///
/// Everything except [`DataSourceError::AllProvidersUnreachable`] is treated
/// as transient by the polling engine and retried on the next tick.
#[derive(Debug, Error)]
pub enum DataSourceError {
	/// Every configured endpoint for the chain is unreachable. This is the
	/// only condition the polling engine treats as fatal.
	#[error("no healthy providers for chain {chain}")]
	AllProvidersUnreachable { chain: String },

	/// Request-level failure against a single provider.
	#[error("transport error for chain {chain}: {message}")]
	Transport {
		chain: String,
		message: String,
		#[source]
		source: Option<Box<dyn std::error::Error + Send + Sync + 'static>>,
	},

	/// A provider answered but the payload did not match the expected shape.
	#[error("malformed response from chain {chain}: {message}")]
	MalformedResponse { chain: String, message: String },

	/// A provider did not answer within the configured deadline.
	#[error("request to chain {chain} timed out")]
	Timeout { chain: String },
}

impl DataSourceError {
	/// Creates a Transport error without an underlying source.
	pub fn transport(chain: impl Into<String>, message: impl Into<String>) -> Self {
		DataSourceError::Transport {
			chain: chain.into(),
			message: message.into(),
			source: None,
		}
	}

	/// Creates a MalformedResponse error.
	pub fn malformed(chain: impl Into<String>, message: impl Into<String>) -> Self {
		DataSourceError::MalformedResponse {
			chain: chain.into(),
			message: message.into(),
		}
	}

	/// True when every provider for the chain is down.
	pub fn is_provider_exhaustion(&self) -> bool {
		matches!(self, DataSourceError::AllProvidersUnreachable { .. })
	}
}

/// Read access to chain data for one or more chains.
///
/// Implementations are expected to be cheap to share (`Arc`) and safe to
/// call concurrently from independent job loops.
#[async_trait]
pub trait ChainDataSource: Send + Sync {
	/// Current chain tip height for the given confirmation tag.
	async fn get_block_height(
		&self,
		chain: &str,
		tag: ConfirmationTag,
	) -> Result<u64, DataSourceError>;

	/// Fetches the blocks at the given heights, keyed by block hash.
	async fn get_blocks(
		&self,
		chain: &str,
		heights: &BTreeSet<u64>,
		with_transactions: bool,
	) -> Result<HashMap<String, Block>, DataSourceError>;

	/// Fetches logs matching the filter, including its block bounds.
	async fn get_filtered_logs(
		&self,
		chain: &str,
		filter: &LogFilter,
	) -> Result<Vec<RawLogEvent>, DataSourceError>;

	/// Fetches receipts for the given transaction hashes, keyed by hash.
	async fn get_transaction_receipts(
		&self,
		chain: &str,
		tx_hashes: &BTreeSet<String>,
	) -> Result<HashMap<String, TransactionReceipt>, DataSourceError>;
}
