//! Long-running ingestion watcher for contract log events.
//!
//! Continuously polls chain nodes for contract log events across many
//! chains, normalizes them into [`models::EnrichedLogEvent`]s and fans them
//! out to downstream consumers, while tracking resumable progress through a
//! forward-only checkpoint.
//!
//! The core pieces are:
//! - [`services::poller::PollingJobEngine`]: a generic supervisor loop
//!   driving check → fetch → dispatch → persist iterations
//! - [`services::poller::BlockRangeCalculator`]: decides which chain segment
//!   to fetch next from the checkpoint and the current tip
//! - [`services::poller::ChainLogPollJob`]: wires a chain data source, log
//!   enricher and checkpoint store into one job
//! - The [`services::poller::PollerError`] taxonomy classifying failures
//!   into transient-retry versus fatal-abort
//!
//! Delivery is at-least-once: the checkpoint advances only after a full
//! batch was handed to every handler without error, so consumers must be
//! idempotent. Concrete RPC clients, checkpoint backends beyond the bundled
//! file/in-memory stores, and publishing backends are the embedding
//! process's concern and plug in through the [`services::datasource::ChainDataSource`],
//! [`repositories::CheckpointStore`] and [`services::poller::BatchHandler`]
//! traits.

pub mod models;
pub mod repositories;
pub mod services;
pub mod utils;
