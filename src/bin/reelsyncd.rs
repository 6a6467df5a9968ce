//! Playlist sync daemon.
//!
//! Wires the store, client, repository, and feed together, performs one
//! immediate refresh so the cache is warm, then hands the recurring refresh
//! to the scheduler and logs task results as they arrive.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;

use reelsync::{
    PlaylistClient, PlaylistFeed, PlaylistRepository, RefreshExecutorBridge, RemoteConfig,
    Scheduler, SyncConfig, TaskResult, VideoStore,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    tracing::info!("reelsyncd starting");

    let config = SyncConfig::load()?;
    let db_path = config
        .cache
        .resolved_database_path()
        .ok_or_else(|| anyhow::anyhow!("cannot determine database path"))?;

    let store = Arc::new(VideoStore::open(&db_path)?);
    tracing::info!(
        "cache open at {} with {} videos",
        db_path.display(),
        store.latest().len()
    );

    let client = PlaylistClient::new(
        RemoteConfig::new(&config.remote.base_url)
            .with_timeout(Duration::from_secs(config.remote.request_timeout_secs)),
    )?;
    let repo = Arc::new(PlaylistRepository::new(Arc::new(client), store));
    let feed = PlaylistFeed::new(Arc::clone(&repo));

    // Warm the cache immediately rather than waiting for the first tick.
    feed.refresh_now().await;
    if feed.network_error_occurred() {
        tracing::warn!("initial refresh failed; serving cached playlist");
    }

    let (result_tx, mut result_rx) = mpsc::unbounded_channel();
    let mut scheduler = Scheduler::new(result_tx)
        .with_executor(RefreshExecutorBridge::new(Arc::clone(&repo)).into_executor());
    scheduler.with_playlist_refresh(config.schedule.refresh_interval_secs);
    let scheduler_handle = scheduler.run();

    while let Some(result) = result_rx.recv().await {
        match result {
            TaskResult::Success(msg) => tracing::info!("scheduled run: {msg}"),
            TaskResult::Retry(msg) => tracing::warn!("scheduled run will retry: {msg}"),
            TaskResult::Error(msg) => tracing::error!("scheduled run failed: {msg}"),
        }
    }

    scheduler_handle.abort();
    tracing::info!("reelsyncd shut down");
    Ok(())
}
