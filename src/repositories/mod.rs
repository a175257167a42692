//! Persistence interfaces for watcher progress.
//!
//! Provides the checkpoint store abstraction plus the bundled file-backed
//! and in-memory implementations.

mod checkpoint;

pub use checkpoint::{Checkpoint, CheckpointStore, FileCheckpointStore, InMemoryCheckpointStore};
