//! Engine lifecycle tests: stop semantics, retry policy and run metrics,
//! exercised through the full chain log job.

use std::{sync::Arc, time::Duration};

use blockchain_watcher::{
	models::PollJobConfig,
	repositories::{Checkpoint, CheckpointStore, InMemoryCheckpointStore},
	services::poller::{ChainLogPollJob, HandlerPipeline, PollerError, PollingJobEngine},
	utils::metrics::{
		JOB_NO_HEALTHY_TOTAL, JOB_RUNS_STOPPED, JOB_RUNS_TOTAL,
	},
};

use crate::integration::mocks::{
	wait_until, RecordingHandler, RecordingMetrics, ScriptedDataSource,
};

const JOB_ID: &str = "poll-evm-logs-ethereum";

fn config() -> PollJobConfig {
	PollJobConfig::new(JOB_ID, "ethereum", 2)
}

#[tokio::test]
async fn test_stop_takes_effect_at_iteration_boundary() {
	blockchain_watcher::utils::logging::try_init();

	let chain = ScriptedDataSource::with_tip(11);
	let store = Arc::new(InMemoryCheckpointStore::new());
	let mut job = ChainLogPollJob::new(config(), chain.clone(), store.clone());
	let handler = RecordingHandler::new();
	let pipeline = HandlerPipeline::new().register(handler.clone());
	let metrics = RecordingMetrics::new();

	let engine = PollingJobEngine::new(JOB_ID, Duration::from_millis(5), metrics.clone());
	let handle = engine.handle();
	let task = tokio::spawn(async move { engine.run(&mut job, &pipeline).await });

	let delivered = wait_until(|| handler.batch_count() >= 1, Duration::from_secs(2)).await;
	assert!(delivered, "first batch never arrived");

	handle.stop();
	task.await.unwrap().unwrap();

	// The in-flight iteration completed and committed before the stop
	let saved = store.get(JOB_ID).await.unwrap().unwrap();
	assert_eq!(saved.last_block, 11);
	assert_eq!(metrics.total(JOB_RUNS_STOPPED), 1);
	assert!(metrics.total_with_label(JOB_RUNS_TOTAL, "status", "success") >= 1);
}

#[tokio::test]
async fn test_transient_handler_failure_retries_same_range() {
	let chain = ScriptedDataSource::with_tip(20);
	let store = Arc::new(InMemoryCheckpointStore::new());
	store
		.save(JOB_ID, &Checkpoint::new(JOB_ID, 10))
		.await
		.unwrap();
	let mut job = ChainLogPollJob::new(config(), chain.clone(), store.clone());
	let handler = RecordingHandler::new();
	handler
		.fail_next
		.store(1, std::sync::atomic::Ordering::SeqCst);
	let pipeline = HandlerPipeline::new().register(handler.clone());
	let metrics = RecordingMetrics::new();

	let engine = PollingJobEngine::new(JOB_ID, Duration::from_millis(5), metrics.clone());
	let handle = engine.handle();
	let task = tokio::spawn(async move { engine.run(&mut job, &pipeline).await });

	let delivered = wait_until(|| handler.batch_count() >= 1, Duration::from_secs(2)).await;
	assert!(delivered, "retry batch never arrived");
	handle.stop();
	task.await.unwrap().unwrap();

	// The rejected delivery left the checkpoint alone; the retry redelivered
	// the identical range and then committed it.
	assert_eq!(handler.seen_blocks(), (11..=20).collect::<Vec<_>>());
	assert_eq!(store.get(JOB_ID).await.unwrap().unwrap().last_block, 20);
	assert!(metrics.total_with_label(JOB_RUNS_TOTAL, "status", "error") >= 1);
	assert!(metrics.total_with_label(JOB_RUNS_TOTAL, "status", "success") >= 1);
}

#[tokio::test]
async fn test_provider_exhaustion_aborts_without_persisting() {
	let chain = ScriptedDataSource::with_tip(50);
	chain
		.exhausted
		.store(true, std::sync::atomic::Ordering::SeqCst);
	let store = Arc::new(InMemoryCheckpointStore::new());
	let mut job = ChainLogPollJob::new(config(), chain, store.clone());
	let metrics = RecordingMetrics::new();

	let engine = PollingJobEngine::new(JOB_ID, Duration::from_millis(5), metrics.clone());
	let result = engine.run(&mut job, &HandlerPipeline::new()).await;

	assert!(matches!(result, Err(PollerError::ProviderExhaustion { .. })));
	assert!(store.get(JOB_ID).await.unwrap().is_none());
	assert_eq!(metrics.total(JOB_NO_HEALTHY_TOTAL), 1);
}

#[tokio::test]
async fn test_bounded_backfill_stops_on_its_own() {
	let chain = ScriptedDataSource::with_tip(100);
	let store = Arc::new(InMemoryCheckpointStore::new());
	let mut cfg = config();
	cfg.start_height = Some(1);
	cfg.end_height = Some(6);
	cfg.max_blocks_per_iteration = Some(3);
	let mut job = ChainLogPollJob::new(cfg, chain, store.clone());
	let handler = RecordingHandler::new();
	let pipeline = HandlerPipeline::new().register(handler.clone());
	let metrics = RecordingMetrics::new();

	let engine = PollingJobEngine::new(JOB_ID, Duration::from_millis(1), metrics.clone());
	engine.run(&mut job, &pipeline).await.unwrap();

	// Two capped windows cover [1, 6], then the job reports completion
	assert_eq!(handler.seen_blocks(), (1..=6).collect::<Vec<_>>());
	assert_eq!(store.get(JOB_ID).await.unwrap().unwrap().last_block, 6);
	assert!(!engine.is_running());
	assert_eq!(metrics.total(JOB_RUNS_STOPPED), 1);
}

#[tokio::test]
async fn test_caught_up_iterations_fetch_nothing() {
	let chain = ScriptedDataSource::with_tip(15);
	let store = Arc::new(InMemoryCheckpointStore::new());
	store
		.save(JOB_ID, &Checkpoint::new(JOB_ID, 15))
		.await
		.unwrap();
	let mut job = ChainLogPollJob::new(config(), chain.clone(), store.clone());
	let handler = RecordingHandler::new();
	let pipeline = HandlerPipeline::new().register(handler.clone());
	let metrics = RecordingMetrics::new();

	let engine = PollingJobEngine::new(JOB_ID, Duration::from_millis(3), metrics.clone());
	let handle = engine.handle();
	let task = tokio::spawn(async move { engine.run(&mut job, &pipeline).await });

	let idled = wait_until(
		|| metrics.total_with_label(JOB_RUNS_TOTAL, "status", "success") >= 2,
		Duration::from_secs(2),
	)
	.await;
	assert!(idled, "idle iterations never completed");
	handle.stop();
	task.await.unwrap().unwrap();

	// Empty windows never hit the log endpoint or the handlers
	assert_eq!(
		chain
			.log_fetch_calls
			.load(std::sync::atomic::Ordering::SeqCst),
		0
	);
	assert_eq!(handler.batch_count(), 0);
	assert_eq!(store.get(JOB_ID).await.unwrap().unwrap().last_block, 15);
}
