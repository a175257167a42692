//! Error taxonomy for the polling engine.
//!
//! Iteration failures fall into two buckets at the engine boundary:
//! transient errors (retried on the same range after one interval, with no
//! backoff growth and no retry cap) and provider exhaustion (aborts the run).
//! Checkpoint-store failures sit outside the classified critical section and
//! propagate out of the run directly.

use thiserror::Error;

use crate::{models::ConfigError, services::datasource::DataSourceError};

/// Errors emitted by polling jobs and the engine driving them.
#[derive(Debug, Error)]
pub enum PollerError {
	/// Fetch-side failure (tip query, log/block/receipt fetch). Retried.
	#[error("failed to fetch batch: {0}")]
	TransientFetch(#[source] anyhow::Error),

	/// One or more handlers failed for the batch. Retried.
	#[error("handler failed for batch: {0}")]
	TransientHandler(#[source] anyhow::Error),

	/// All providers for the job's chain are unreachable. Aborts the run;
	/// restarting is the surrounding process's responsibility.
	#[error("no healthy providers, job: {job_id}")]
	ProviderExhaustion { job_id: String },

	/// Checkpoint store failure during warm-up or persist.
	#[error("checkpoint store failure: {0}")]
	Checkpoint(#[source] anyhow::Error),

	/// The job configuration cannot produce a valid run. Surfaces during
	/// warm-up, before the first iteration.
	#[error("invalid job configuration: {0}")]
	InvalidConfig(#[from] ConfigError),
}

impl PollerError {
	pub fn transient_fetch(source: impl Into<anyhow::Error>) -> Self {
		PollerError::TransientFetch(source.into())
	}

	pub fn transient_handler(source: impl Into<anyhow::Error>) -> Self {
		PollerError::TransientHandler(source.into())
	}

	pub fn checkpoint(source: impl Into<anyhow::Error>) -> Self {
		PollerError::Checkpoint(source.into())
	}

	/// Maps a data-source error onto the taxonomy for the given job,
	/// promoting provider exhaustion to the fatal variant.
	pub fn from_data_source(job_id: &str, error: DataSourceError) -> Self {
		if error.is_provider_exhaustion() {
			return PollerError::ProviderExhaustion {
				job_id: job_id.to_string(),
			};
		}
		PollerError::TransientFetch(error.into())
	}

	/// True when the error must abort the run instead of being retried.
	///
	/// Classification is structural; a textual "no healthy providers" match
	/// is kept as a fallback for sources that only report the condition in
	/// their error message.
	pub fn is_fatal(&self) -> bool {
		match self {
			PollerError::ProviderExhaustion { .. } => true,
			PollerError::TransientFetch(source) | PollerError::TransientHandler(source) => {
				format!("{:#}", source)
					.to_lowercase()
					.contains("no healthy providers")
			}
			PollerError::Checkpoint(_) | PollerError::InvalidConfig(_) => false,
		}
	}
}
