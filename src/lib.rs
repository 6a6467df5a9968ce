//! reelsync: background playlist sync with an offline video cache.
//!
//! This crate keeps a local SQLite copy of a remote video playlist fresh:
//! Endpoint → fetch → transform → cache → reactive snapshot → consumer
//!
//! # Architecture
//!
//! The pipeline is built from independent pieces wired together at startup:
//! - **Remote source**: One GET against the playlist endpoint via `reqwest`
//! - **Cache**: SQLite table keyed by video URL, upserted in whole batches
//! - **Repository**: Sequences fetch → map → upsert as a single refresh run
//! - **Scheduler**: Recurring trigger deduplicated by logical work name
//! - **Feed**: Display-shape snapshots plus the interactive refresh surface
//!
//! Concurrent scheduled and interactive refreshes are never serialized
//! against each other; each run commits one whole batch, so the cache only
//! ever moves between complete fetch results.

pub mod config;
pub mod error;
pub mod feed;
pub mod remote;
pub mod repository;
pub mod scheduler;
pub mod store;

pub use config::SyncConfig;
pub use error::{RefreshError, Result, SyncError};
pub use feed::PlaylistFeed;
pub use remote::{NetworkVideo, PlaylistClient, RemoteConfig, RemoteSource};
pub use repository::PlaylistRepository;
pub use scheduler::{RefreshExecutorBridge, Scheduler, TaskResult, TASK_REFRESH_PLAYLIST};
pub use store::{StoredVideo, Video, VideoStore};
