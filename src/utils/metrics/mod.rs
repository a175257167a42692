//! Metrics sinks for polling jobs.
//!
//! - Defines the fire-and-forget [`MetricsSink`] interface recorded per job
//!   id and outcome.
//! - Provides a no-op sink so loop code never branches on whether metrics
//!   are configured.
//! - Provides a Prometheus-backed sink over a global registry.
//!
//! Sinks must never block or fail the polling loop.

use std::time::Duration;

use lazy_static::lazy_static;
use prometheus::{
	CounterVec, Encoder, HistogramOpts, HistogramVec, Opts, Registry, TextEncoder,
};

/// Counter name: iterations finished, labeled by job and outcome.
pub const JOB_RUNS_TOTAL: &str = "job_runs_total";
/// Counter name: items fetched and dispatched, labeled by job.
pub const JOB_ITEMS_TOTAL: &str = "job_items_total";
/// Counter name: runs aborted because every provider was unreachable.
pub const JOB_NO_HEALTHY_TOTAL: &str = "job_no_healthy_total";
/// Counter name: explicit stops observed by the engine.
pub const JOB_RUNS_STOPPED: &str = "job_runs_stopped";
/// Histogram name: duration of one fetch+dispatch critical section.
pub const JOB_POLL_DURATION_SECONDS: &str = "job_poll_duration_seconds";

/// Fire-and-forget counters and timers keyed by job id and outcome.
pub trait MetricsSink: Send + Sync {
	/// Increments a counter by `value`.
	fn count(&self, name: &str, labels: &[(&str, &str)], value: u64);

	/// Records a duration measurement.
	fn measure(&self, name: &str, labels: &[(&str, &str)], duration: Duration);
}

/// Null-object sink used when no metrics backend is configured.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopMetrics;

impl MetricsSink for NoopMetrics {
	fn count(&self, _name: &str, _labels: &[(&str, &str)], _value: u64) {}

	fn measure(&self, _name: &str, _labels: &[(&str, &str)], _duration: Duration) {}
}

lazy_static! {
	/// Global Prometheus registry holding all watcher metrics.
	pub static ref REGISTRY: Registry = Registry::new();

	/// Counter for finished iterations per job and status.
	static ref RUNS_TOTAL: CounterVec = {
		let counter = CounterVec::new(
			Opts::new(JOB_RUNS_TOTAL, "Polling iterations finished"),
			&["job", "status"],
		)
		.unwrap();
		REGISTRY.register(Box::new(counter.clone())).unwrap();
		counter
	};

	/// Counter for items fetched and dispatched per job.
	static ref ITEMS_TOTAL: CounterVec = {
		let counter = CounterVec::new(
			Opts::new(JOB_ITEMS_TOTAL, "Log events fetched and dispatched"),
			&["job"],
		)
		.unwrap();
		REGISTRY.register(Box::new(counter.clone())).unwrap();
		counter
	};

	/// Counter for runs aborted on provider exhaustion.
	static ref NO_HEALTHY_TOTAL: CounterVec = {
		let counter = CounterVec::new(
			Opts::new(
				JOB_NO_HEALTHY_TOTAL,
				"Runs aborted because no provider was reachable",
			),
			&["job"],
		)
		.unwrap();
		REGISTRY.register(Box::new(counter.clone())).unwrap();
		counter
	};

	/// Counter for explicit stops.
	static ref RUNS_STOPPED: CounterVec = {
		let counter = CounterVec::new(
			Opts::new(JOB_RUNS_STOPPED, "Polling jobs stopped"),
			&["job"],
		)
		.unwrap();
		REGISTRY.register(Box::new(counter.clone())).unwrap();
		counter
	};

	/// Histogram for the fetch+dispatch critical section.
	static ref POLL_DURATION: HistogramVec = {
		let histogram = HistogramVec::new(
			HistogramOpts::new(
				JOB_POLL_DURATION_SECONDS,
				"Duration of one fetch and dispatch cycle",
			),
			&["job"],
		)
		.unwrap();
		REGISTRY.register(Box::new(histogram.clone())).unwrap();
		histogram
	};
}

/// Prometheus-backed sink over the global [`struct@REGISTRY`].
///
/// Metric and label names are fixed at registration; unknown metric names
/// are dropped with a debug log rather than failing the loop.
#[derive(Debug, Clone, Copy, Default)]
pub struct PrometheusMetrics;

impl PrometheusMetrics {
	pub fn new() -> Self {
		PrometheusMetrics
	}

	/// Encodes the registry in the Prometheus text exposition format.
	pub fn gather() -> String {
		let encoder = TextEncoder::new();
		let mut buffer = Vec::new();
		if let Err(error) = encoder.encode(&REGISTRY.gather(), &mut buffer) {
			tracing::warn!(error = %error, "failed to encode metrics");
			return String::new();
		}
		String::from_utf8(buffer).unwrap_or_default()
	}
}

fn label_value<'a>(labels: &'a [(&str, &str)], key: &str) -> &'a str {
	labels
		.iter()
		.find(|(name, _)| *name == key)
		.map(|(_, value)| *value)
		.unwrap_or("")
}

impl MetricsSink for PrometheusMetrics {
	fn count(&self, name: &str, labels: &[(&str, &str)], value: u64) {
		let job = label_value(labels, "job");
		match name {
			JOB_RUNS_TOTAL => {
				let status = label_value(labels, "status");
				RUNS_TOTAL
					.with_label_values(&[job, status])
					.inc_by(value as f64);
			}
			JOB_ITEMS_TOTAL => {
				ITEMS_TOTAL.with_label_values(&[job]).inc_by(value as f64);
			}
			JOB_NO_HEALTHY_TOTAL => {
				NO_HEALTHY_TOTAL
					.with_label_values(&[job])
					.inc_by(value as f64);
			}
			JOB_RUNS_STOPPED => {
				RUNS_STOPPED.with_label_values(&[job]).inc_by(value as f64);
			}
			_ => {
				tracing::debug!(metric = name, "dropping unregistered counter");
			}
		}
	}

	fn measure(&self, name: &str, labels: &[(&str, &str)], duration: Duration) {
		let job = label_value(labels, "job");
		match name {
			JOB_POLL_DURATION_SECONDS => {
				POLL_DURATION
					.with_label_values(&[job])
					.observe(duration.as_secs_f64());
			}
			_ => {
				tracing::debug!(metric = name, "dropping unregistered measurement");
			}
		}
	}
}
