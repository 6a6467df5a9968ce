//! Refresh pipeline: fetch the remote playlist and upsert it into the cache.
//!
//! The repository is the only writer of the cache and the sole place where
//! fetch, transform, and store are sequenced. Failure in any step surfaces
//! as [`RefreshError`]; the cache's batch transaction guarantees that a
//! failed run leaves nothing half-written.

use std::sync::Arc;

use tokio::sync::watch;

use crate::error::RefreshError;
use crate::remote::RemoteSource;
use crate::store::{as_display, StoredVideo, Video, VideoStore};

/// Orchestrates refresh runs against a remote source and a local cache.
pub struct PlaylistRepository {
    source: Arc<dyn RemoteSource>,
    store: Arc<VideoStore>,
}

impl PlaylistRepository {
    /// Build a repository over the given source and cache.
    pub fn new(source: Arc<dyn RemoteSource>, store: Arc<VideoStore>) -> Self {
        Self { source, store }
    }

    /// Fetch the remote playlist and upsert it into the cache.
    ///
    /// Returns the number of records upserted.
    ///
    /// # Errors
    ///
    /// Returns a [`RefreshError`] carrying the failing step. Concurrent
    /// refresh runs are not serialized here; each commits one whole batch,
    /// so the last committed batch wins.
    pub async fn refresh(&self) -> std::result::Result<usize, RefreshError> {
        tracing::debug!("refresh requested");

        let playlist = self.source.fetch_playlist().await?;
        let records: Vec<StoredVideo> = playlist.into_iter().map(Into::into).collect();
        self.store.upsert_all(&records)?;

        tracing::info!("playlist cache refreshed with {} videos", records.len());
        Ok(records.len())
    }

    /// Subscribe to cache snapshots in the persisted shape.
    pub fn observe(&self) -> watch::Receiver<Vec<StoredVideo>> {
        self.store.observe()
    }

    /// Latest cached playlist in the display shape.
    pub fn playlist(&self) -> Vec<Video> {
        as_display(&self.store.latest())
    }
}
