//! Core services for chain log ingestion.
//!
//! Contains the service layer of the watcher:
//!
//! - `datasource`: read access to chain nodes (tip, blocks, logs, receipts)
//! - `poller`: the polling engine, range/checkpoint logic and handler fan-out

pub mod datasource;
pub mod poller;
