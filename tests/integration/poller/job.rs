//! End-to-end chain log job tests: checkpoint durability across restarts,
//! tip following and enrichment of delivered events.

use std::{sync::Arc, time::Duration};

use blockchain_watcher::{
	models::{ConfirmationTag, PollJobConfig},
	repositories::{CheckpointStore, FileCheckpointStore},
	services::poller::{ChainLogPollJob, HandlerPipeline, PollingJobEngine},
	utils::metrics::NoopMetrics,
};

use crate::integration::mocks::{wait_until, RecordingHandler, ScriptedDataSource};

const JOB_ID: &str = "poll-evm-logs-fantom";

fn config() -> PollJobConfig {
	let mut cfg = PollJobConfig::new(JOB_ID, "fantom", 250);
	cfg.addresses = vec!["0xf890982f9310df57d00f659cf4fd87e65aded8d7".to_string()];
	cfg.topics =
		vec!["0xbccc00b713f54173962e7de6098f643d8ebf53d488d71f4b2a5171496d038f9e".to_string()];
	cfg
}

async fn run_until_block(
	cfg: PollJobConfig,
	chain: Arc<ScriptedDataSource>,
	store: FileCheckpointStore,
	block: u64,
) -> Arc<RecordingHandler> {
	blockchain_watcher::utils::logging::try_init();

	let mut job = ChainLogPollJob::new(cfg, chain, Arc::new(store));
	let handler = RecordingHandler::new();
	let pipeline = HandlerPipeline::new().register(handler.clone());

	let engine = PollingJobEngine::new(JOB_ID, Duration::from_millis(3), Arc::new(NoopMetrics));
	let handle = engine.handle();
	let task = tokio::spawn(async move { engine.run(&mut job, &pipeline).await });

	let reached = wait_until(
		|| handler.seen_blocks().contains(&block),
		Duration::from_secs(2),
	)
	.await;
	assert!(reached, "block {} never delivered", block);

	handle.stop();
	task.await.unwrap().unwrap();
	handler
}

#[tokio::test]
async fn test_fresh_job_starts_at_the_tip() {
	let temp_dir = tempfile::tempdir().unwrap();
	let store = FileCheckpointStore::new(temp_dir.path().to_path_buf());
	let chain = ScriptedDataSource::with_tip(11);

	let handler = run_until_block(config(), chain.clone(), store.clone(), 11).await;

	// No checkpoint means the first window is exactly [tip, tip]
	assert_eq!(
		chain.log_requests.lock().unwrap().first().copied(),
		Some((11, 11))
	);
	let event = &handler.batches.lock().unwrap()[0][0];
	assert_eq!(event.log.block_number, 11);
	assert_eq!(event.block_timestamp, 132);
	assert_eq!(event.chain, "fantom");
	assert_eq!(event.chain_id, 250);
	assert!(event.receipt.is_none());

	assert_eq!(store.get(JOB_ID).await.unwrap().unwrap().last_block, 11);
}

#[tokio::test]
async fn test_restart_resumes_after_checkpoint() {
	let temp_dir = tempfile::tempdir().unwrap();
	let store = FileCheckpointStore::new(temp_dir.path().to_path_buf());

	let chain = ScriptedDataSource::with_tip(10);
	run_until_block(config(), chain, store.clone(), 10).await;
	assert_eq!(store.get(JOB_ID).await.unwrap().unwrap().last_block, 10);

	// Second process instance, same storage directory, taller chain
	let chain = ScriptedDataSource::with_tip(20);
	let handler = run_until_block(config(), chain.clone(), store.clone(), 20).await;

	assert_eq!(
		chain.log_requests.lock().unwrap().first().copied(),
		Some((11, 20))
	);
	assert_eq!(handler.seen_blocks().first().copied(), Some(11));
	assert_eq!(store.get(JOB_ID).await.unwrap().unwrap().last_block, 20);
}

#[tokio::test]
async fn test_job_follows_an_advancing_tip() {
	let temp_dir = tempfile::tempdir().unwrap();
	let store = FileCheckpointStore::new(temp_dir.path().to_path_buf());
	let chain = ScriptedDataSource::with_tip(5);

	let mut job = ChainLogPollJob::new(config(), chain.clone(), Arc::new(store.clone()));
	let handler = RecordingHandler::new();
	let pipeline = HandlerPipeline::new().register(handler.clone());

	let engine = PollingJobEngine::new(JOB_ID, Duration::from_millis(3), Arc::new(NoopMetrics));
	let handle = engine.handle();
	let task = tokio::spawn(async move { engine.run(&mut job, &pipeline).await });

	let caught_first = wait_until(
		|| handler.seen_blocks().contains(&5),
		Duration::from_secs(2),
	)
	.await;
	assert!(caught_first, "initial tip never delivered");

	chain.set_tip(8);
	let caught_growth = wait_until(
		|| handler.seen_blocks().contains(&8),
		Duration::from_secs(2),
	)
	.await;
	assert!(caught_growth, "advanced tip never delivered");

	handle.stop();
	task.await.unwrap().unwrap();

	// Each height delivered exactly once, in order, with no gaps
	let mut blocks = handler.seen_blocks();
	blocks.retain(|&b| b >= 5);
	assert_eq!(blocks, (5..=8).collect::<Vec<_>>());
	assert_eq!(store.get(JOB_ID).await.unwrap().unwrap().last_block, 8);
}

#[tokio::test]
async fn test_receipts_attached_end_to_end() {
	let temp_dir = tempfile::tempdir().unwrap();
	let store = FileCheckpointStore::new(temp_dir.path().to_path_buf());
	let chain = ScriptedDataSource::with_tip(7);

	let mut cfg = config();
	cfg.fetch_receipts = true;
	cfg.confirmation_tag = ConfirmationTag::Finalized;
	let handler = run_until_block(cfg, chain, store, 7).await;

	let event = &handler.batches.lock().unwrap()[0][0];
	let receipt = event.receipt.as_ref().unwrap();
	assert_eq!(receipt.transaction_hash, "0xtx7");
	assert_eq!(receipt.status, "0x1");
}

#[tokio::test]
async fn test_transient_transport_failure_never_skips_blocks() {
	let temp_dir = tempfile::tempdir().unwrap();
	let store = FileCheckpointStore::new(temp_dir.path().to_path_buf());
	let chain = ScriptedDataSource::with_tip(9);
	chain
		.fail_log_fetches
		.store(2, std::sync::atomic::Ordering::SeqCst);

	let mut cfg = config();
	cfg.start_height = Some(6);
	let handler = run_until_block(cfg, chain.clone(), store.clone(), 9).await;

	// Both failed attempts and the successful one asked for the same window
	let requests = chain.log_requests.lock().unwrap().clone();
	assert!(requests.len() >= 3);
	assert!(requests.iter().take(3).all(|&window| window == (6, 9)));
	assert_eq!(handler.seen_blocks(), vec![6, 7, 8, 9]);
	assert_eq!(store.get(JOB_ID).await.unwrap().unwrap().last_block, 9);
}
