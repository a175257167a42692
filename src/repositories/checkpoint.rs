//! Checkpoint storage for resumable polling jobs.
//!
//! A checkpoint is the persisted cursor marking the last fully-processed
//! chain height for a job. It is read once at job start to resume and
//! overwritten (never appended) after each successful batch. Stores must
//! provide read-after-write consistency per job id across process restarts,
//! since the checkpoint is the sole persisted source of truth.

use std::{collections::HashMap, path::PathBuf, sync::Arc};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;

/// Persisted cursor for one polling job.
///
/// `last_block` only ever increases over the lifetime of a job; the job
/// persists it only after every log in a range has been delivered to all
/// handlers without error.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Checkpoint {
	pub job_id: String,
	pub last_block: u64,
}

impl Checkpoint {
	pub fn new(job_id: impl Into<String>, last_block: u64) -> Self {
		Checkpoint {
			job_id: job_id.into(),
			last_block,
		}
	}
}

/// Interface for durable checkpoint storage, keyed by job id.
#[async_trait]
pub trait CheckpointStore: Send + Sync {
	/// Retrieves the checkpoint for a job, or `None` when the job has never
	/// completed a batch.
	async fn get(&self, job_id: &str) -> Result<Option<Checkpoint>, anyhow::Error>;

	/// Overwrites the checkpoint for a job.
	async fn save(&self, job_id: &str, checkpoint: &Checkpoint) -> Result<(), anyhow::Error>;
}

#[async_trait]
impl<T: CheckpointStore + ?Sized> CheckpointStore for Arc<T> {
	async fn get(&self, job_id: &str) -> Result<Option<Checkpoint>, anyhow::Error> {
		(**self).get(job_id).await
	}

	async fn save(&self, job_id: &str, checkpoint: &Checkpoint) -> Result<(), anyhow::Error> {
		(**self).save(job_id, checkpoint).await
	}
}

/// File-based checkpoint storage.
///
/// Each job id maps to one JSON file under the configured directory. Saves
/// replace the file wholesale.
#[derive(Clone)]
pub struct FileCheckpointStore {
	storage_path: PathBuf,
}

impl FileCheckpointStore {
	pub fn new(storage_path: PathBuf) -> Self {
		FileCheckpointStore { storage_path }
	}

	fn checkpoint_path(&self, job_id: &str) -> PathBuf {
		self.storage_path.join(format!("{}_checkpoint.json", job_id))
	}
}

impl Default for FileCheckpointStore {
	/// Stores checkpoints under "data" in the working directory.
	fn default() -> Self {
		FileCheckpointStore::new(PathBuf::from("data"))
	}
}

#[async_trait]
impl CheckpointStore for FileCheckpointStore {
	async fn get(&self, job_id: &str) -> Result<Option<Checkpoint>, anyhow::Error> {
		let file_path = self.checkpoint_path(job_id);

		if !file_path.exists() {
			return Ok(None);
		}

		let content = tokio::fs::read_to_string(&file_path)
			.await
			.map_err(|e| anyhow::anyhow!("Failed to read checkpoint: {}", e))?;
		let checkpoint: Checkpoint = serde_json::from_str(&content)
			.map_err(|e| anyhow::anyhow!("Failed to parse checkpoint: {}", e))?;
		Ok(Some(checkpoint))
	}

	async fn save(&self, job_id: &str, checkpoint: &Checkpoint) -> Result<(), anyhow::Error> {
		let file_path = self.checkpoint_path(job_id);
		let json = serde_json::to_string(checkpoint)
			.map_err(|e| anyhow::anyhow!("Failed to serialize checkpoint: {}", e))?;
		tokio::fs::write(&file_path, json)
			.await
			.map_err(|e| anyhow::anyhow!("Failed to save checkpoint: {}", e))?;
		Ok(())
	}
}

/// In-memory checkpoint storage.
///
/// Suited to tests and deployments where progress may restart from the tip.
#[derive(Clone, Default)]
pub struct InMemoryCheckpointStore {
	checkpoints: Arc<RwLock<HashMap<String, Checkpoint>>>,
}

impl InMemoryCheckpointStore {
	pub fn new() -> Self {
		Self::default()
	}
}

#[async_trait]
impl CheckpointStore for InMemoryCheckpointStore {
	async fn get(&self, job_id: &str) -> Result<Option<Checkpoint>, anyhow::Error> {
		Ok(self.checkpoints.read().await.get(job_id).cloned())
	}

	async fn save(&self, job_id: &str, checkpoint: &Checkpoint) -> Result<(), anyhow::Error> {
		self.checkpoints
			.write()
			.await
			.insert(job_id.to_string(), checkpoint.clone());
		Ok(())
	}
}
