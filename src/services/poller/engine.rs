//! Generic polling-job execution engine.
//!
//! Drives an unbounded or bounded sequence of check → fetch → dispatch →
//! persist iterations at a configurable interval, independent of what is
//! polled. One engine drives one job as a single cooperative loop: no two
//! iterations of the same job ever overlap, and nothing is cancelled
//! mid-flight. Distinct jobs run as independent loops sharing no mutable
//! state beyond their own checkpoint key.

use std::{
	sync::{
		atomic::{AtomicBool, Ordering},
		Arc,
	},
	time::{Duration, Instant},
};

use async_trait::async_trait;
use tracing::instrument;

use crate::{
	services::poller::{error::PollerError, handlers::HandlerPipeline},
	utils::metrics::{
		MetricsSink, JOB_ITEMS_TOTAL, JOB_NO_HEALTHY_TOTAL, JOB_POLL_DURATION_SECONDS,
		JOB_RUNS_STOPPED, JOB_RUNS_TOTAL,
	},
};

/// Strategy driven by [`PollingJobEngine`], one value per chain job.
///
/// Implementations own their cursor state; the engine owns retry and stop
/// semantics.
#[async_trait]
pub trait PollingJob: Send {
	/// Item type delivered to handlers, one batch per iteration.
	type Item: Send + Sync;

	/// One-time warm-up before the first iteration (e.g. loading the
	/// persisted checkpoint).
	async fn pre_hook(&mut self) -> Result<(), PollerError> {
		Ok(())
	}

	/// Whether another batch may exist. Unbounded watchers always return
	/// true; bounded backfills return false once their end is covered, at
	/// which point the engine stops cleanly.
	async fn has_next_batch(&mut self) -> Result<bool, PollerError> {
		Ok(true)
	}

	/// Progress/heartbeat hook called before each fetch. Side-effect only;
	/// must not fail.
	fn describe_progress(&self);

	/// Fetches one batch. An empty batch still completes the iteration.
	async fn fetch_batch(&mut self) -> Result<Vec<Self::Item>, PollerError>;

	/// Commits progress after the whole batch was delivered successfully.
	async fn persist_progress(&mut self) -> Result<(), PollerError>;
}

/// Cloneable handle for stopping a running engine from outside its loop.
#[derive(Clone)]
pub struct EngineHandle {
	id: String,
	running: Arc<AtomicBool>,
	metrics: Arc<dyn MetricsSink>,
}

impl EngineHandle {
	/// Requests a cooperative stop. Takes effect at the next iteration
	/// boundary; an in-flight iteration always runs to completion.
	/// Idempotent: repeated calls count the stop once.
	pub fn stop(&self) {
		if self.running.swap(false, Ordering::SeqCst) {
			tracing::info!(job = %self.id, "stopping polling job");
			self.metrics
				.count(JOB_RUNS_STOPPED, &[("job", &self.id)], 1);
		}
	}

	pub fn is_running(&self) -> bool {
		self.running.load(Ordering::SeqCst)
	}
}

/// Generic scheduler for one polling job.
///
/// The run-state machine is {Created, Running, Stopped}: Created→Running on
/// [`PollingJobEngine::run`] after the job's pre-hook, Running→Stopped either
/// on clean bounded completion or on an observed [`EngineHandle::stop`]. The
/// flag is read only at the top of each iteration.
pub struct PollingJobEngine {
	id: String,
	interval: Duration,
	running: Arc<AtomicBool>,
	metrics: Arc<dyn MetricsSink>,
}

impl PollingJobEngine {
	pub fn new(id: impl Into<String>, interval: Duration, metrics: Arc<dyn MetricsSink>) -> Self {
		PollingJobEngine {
			id: id.into(),
			interval,
			running: Arc::new(AtomicBool::new(true)),
			metrics,
		}
	}

	/// Handle for requesting a stop while [`PollingJobEngine::run`] is
	/// in flight.
	pub fn handle(&self) -> EngineHandle {
		EngineHandle {
			id: self.id.clone(),
			running: self.running.clone(),
			metrics: self.metrics.clone(),
		}
	}

	pub fn is_running(&self) -> bool {
		self.running.load(Ordering::SeqCst)
	}

	/// Runs the job until stopped, completed or fatally failed.
	///
	/// Per iteration: check the running flag, ask the job whether a next
	/// batch may exist, fetch, fan the batch out to all handlers
	/// concurrently, and on full success persist progress, count a success
	/// and sleep one interval.
	///
	/// Failures in the fetch/dispatch critical section are classified:
	/// transient errors are logged and counted, the checkpoint is left
	/// untouched and the identical range is retried after one interval,
	/// indefinitely and without backoff growth. Provider exhaustion is
	/// counted distinctly and returned to the caller; restarting is the
	/// embedding process's responsibility.
	#[instrument(skip_all, fields(job = %self.id))]
	pub async fn run<J: PollingJob>(
		&self,
		job: &mut J,
		handlers: &HandlerPipeline<J::Item>,
	) -> Result<(), PollerError> {
		tracing::info!("starting polling job");
		job.pre_hook().await?;

		while self.running.load(Ordering::SeqCst) {
			if !job.has_next_batch().await? {
				tracing::info!("finished processing");
				self.handle().stop();
				break;
			}

			job.describe_progress();

			let started = Instant::now();
			let outcome = self.poll_once(job, handlers).await;
			self.metrics.measure(
				JOB_POLL_DURATION_SECONDS,
				&[("job", &self.id)],
				started.elapsed(),
			);

			match outcome {
				Ok(items) => {
					self.metrics
						.count(JOB_ITEMS_TOTAL, &[("job", &self.id)], items as u64);
					job.persist_progress().await?;
					self.metrics.count(
						JOB_RUNS_TOTAL,
						&[("job", &self.id), ("status", "success")],
						1,
					);
				}
				Err(error) if error.is_fatal() => {
					self.metrics
						.count(JOB_NO_HEALTHY_TOTAL, &[("job", &self.id)], 1);
					tracing::error!(error = %error, "no healthy providers, aborting run");
					return Err(error);
				}
				Err(error) => {
					tracing::error!(error = %error, "error processing items, will retry");
					self.metrics.count(
						JOB_RUNS_TOTAL,
						&[("job", &self.id), ("status", "error")],
						1,
					);
				}
			}

			tokio::time::sleep(self.interval).await;
		}

		Ok(())
	}

	/// One fetch+dispatch critical section; returns the batch size.
	async fn poll_once<J: PollingJob>(
		&self,
		job: &mut J,
		handlers: &HandlerPipeline<J::Item>,
	) -> Result<usize, PollerError> {
		let batch = job.fetch_batch().await?;

		// Empty batches complete the iteration without touching handlers.
		if !batch.is_empty() {
			handlers.dispatch(&batch).await?;
		}

		Ok(batch.len())
	}
}
