//! Concurrent fan-out of batches to downstream consumers.
//!
//! A batch is delivered to every registered handler concurrently; the
//! iteration waits for all of them to settle and succeeds only if none
//! failed. Handlers are side-effecting and must be idempotent: a crash
//! between dispatch and checkpoint persistence redelivers the same batch.

use std::sync::Arc;

use async_trait::async_trait;
use futures::future::join_all;

use crate::services::poller::error::PollerError;

/// A downstream consumer of one batch per iteration (publisher, indexer).
#[async_trait]
pub trait BatchHandler<T>: Send + Sync {
	/// Name used in failure logs to identify the consumer.
	fn name(&self) -> &str;

	async fn handle(&self, batch: &[T]) -> Result<(), anyhow::Error>;
}

/// The set of independent consumers invoked per batch.
pub struct HandlerPipeline<T> {
	handlers: Vec<Arc<dyn BatchHandler<T>>>,
}

impl<T> Default for HandlerPipeline<T> {
	fn default() -> Self {
		HandlerPipeline {
			handlers: Vec::new(),
		}
	}
}

impl<T: Send + Sync> HandlerPipeline<T> {
	pub fn new() -> Self {
		Self::default()
	}

	/// Adds a consumer to the fan-out set.
	pub fn register(mut self, handler: Arc<dyn BatchHandler<T>>) -> Self {
		self.handlers.push(handler);
		self
	}

	pub fn len(&self) -> usize {
		self.handlers.len()
	}

	pub fn is_empty(&self) -> bool {
		self.handlers.is_empty()
	}

	/// Delivers the batch to every handler concurrently and waits for all
	/// of them to settle. Any failure fails the whole iteration; the first
	/// failure (in registration order) is returned.
	pub async fn dispatch(&self, batch: &[T]) -> Result<(), PollerError> {
		let results = join_all(
			self.handlers
				.iter()
				.map(|handler| async move { (handler.name(), handler.handle(batch).await) }),
		)
		.await;

		for (name, result) in results {
			if let Err(error) = result {
				tracing::error!(handler = name, error = %error, "handler rejected batch");
				return Err(PollerError::transient_handler(
					error.context(format!("handler {} rejected batch", name)),
				));
			}
		}

		Ok(())
	}
}
