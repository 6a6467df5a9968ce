//! UI-facing playlist surface.
//!
//! [`PlaylistFeed`] is what a frontend binds to: the latest display-shape
//! playlist, an interactive refresh trigger, and the network-error flags.
//! Even when an interactive refresh fails, previously cached data stays
//! visible through the playlist stream.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tokio::sync::watch;
use tokio_stream::wrappers::WatchStream;

use crate::repository::PlaylistRepository;
use crate::store::{as_display, Video};

/// Reactive playlist view with interactive refresh.
///
/// Construct inside a tokio runtime: a forwarding task re-publishes cache
/// snapshots in the display shape for as long as the feed lives.
pub struct PlaylistFeed {
    repo: Arc<PlaylistRepository>,
    playlist_rx: watch::Receiver<Vec<Video>>,
    network_error: AtomicBool,
    error_shown: AtomicBool,
}

impl PlaylistFeed {
    /// Build a feed over the given repository.
    pub fn new(repo: Arc<PlaylistRepository>) -> Self {
        let (playlist_tx, playlist_rx) = watch::channel(repo.playlist());

        let mut store_rx = repo.observe();
        tokio::spawn(async move {
            while store_rx.changed().await.is_ok() {
                let snapshot = as_display(&store_rx.borrow_and_update());
                if playlist_tx.send(snapshot).is_err() {
                    break;
                }
            }
        });

        Self {
            repo,
            playlist_rx,
            network_error: AtomicBool::new(false),
            error_shown: AtomicBool::new(false),
        }
    }

    /// Latest known playlist in display shape.
    pub fn playlist(&self) -> Vec<Video> {
        self.playlist_rx.borrow().clone()
    }

    /// Subscribe to playlist snapshots.
    pub fn subscribe(&self) -> watch::Receiver<Vec<Video>> {
        self.playlist_rx.clone()
    }

    /// Subscribe to playlist snapshots as a `Stream`.
    pub fn subscribe_stream(&self) -> WatchStream<Vec<Video>> {
        WatchStream::new(self.playlist_rx.clone())
    }

    /// Run an interactive refresh.
    ///
    /// On success both error flags reset. On failure the network-error flag
    /// is raised and the cached playlist stays as it was.
    pub async fn refresh_now(&self) {
        match self.repo.refresh().await {
            Ok(count) => {
                tracing::debug!("interactive refresh stored {count} videos");
                self.network_error.store(false, Ordering::SeqCst);
                self.error_shown.store(false, Ordering::SeqCst);
            }
            Err(e) => {
                tracing::warn!("interactive refresh failed: {e}");
                self.network_error.store(true, Ordering::SeqCst);
            }
        }
    }

    /// Whether the last interactive refresh failed.
    pub fn network_error_occurred(&self) -> bool {
        self.network_error.load(Ordering::SeqCst)
    }

    /// Whether the consumer has already surfaced the current error.
    pub fn is_error_shown(&self) -> bool {
        self.error_shown.load(Ordering::SeqCst)
    }

    /// Record that the error has been surfaced to the user.
    ///
    /// Only marks the error as shown; the error flag itself resets on the
    /// next successful refresh.
    pub fn mark_error_shown(&self) {
        self.error_shown.store(true, Ordering::SeqCst);
    }
}
