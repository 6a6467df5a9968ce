//! HTTP client for the remote playlist endpoint.
//!
//! Issues a single GET against the playlist service and decodes the response
//! into [`NetworkVideo`] records. No retries happen here; retry policy is
//! owned by the scheduled caller.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::error::{Result, SyncError};

/// Path of the playlist resource under the base URL.
const PLAYLIST_PATH: &str = "/playlist";

// ── Transport DTOs ─────────────────────────────────────────────

/// One video entry as it appears on the wire. All fields are required.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NetworkVideo {
    /// Video URL; globally unique, used as the cache key.
    pub url: String,
    /// Last-updated timestamp, passed through verbatim.
    pub updated: String,
    /// Display title.
    pub title: String,
    /// Display description.
    pub description: String,
    /// Thumbnail image URL.
    pub thumbnail: String,
}

/// Envelope the endpoint wraps the playlist in.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlaylistPayload {
    /// Ordered playlist entries.
    pub videos: Vec<NetworkVideo>,
}

/// Decode a response body into playlist entries.
pub(crate) fn parse_payload(body: &str) -> Result<Vec<NetworkVideo>> {
    let payload: PlaylistPayload = serde_json::from_str(body)
        .map_err(|e| SyncError::Parse(format!("malformed playlist payload: {e}")))?;
    Ok(payload.videos)
}

// ── Configuration ──────────────────────────────────────────────

/// Configuration for the playlist client.
#[derive(Debug, Clone)]
pub struct RemoteConfig {
    /// Base URL of the playlist service.
    pub base_url: String,
    /// Request timeout.
    pub timeout: Duration,
}

impl RemoteConfig {
    /// Create a config for the given base URL with the default timeout.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            timeout: Duration::from_secs(30),
        }
    }

    /// Set the base URL (useful for testing with mock servers).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Set the request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

// ── Client ─────────────────────────────────────────────────────

/// Source of playlist data. The seam between the refresh pipeline and the
/// transport, so tests can substitute a canned source.
#[async_trait]
pub trait RemoteSource: Send + Sync {
    /// Fetch the full playlist from the remote endpoint.
    async fn fetch_playlist(&self) -> Result<Vec<NetworkVideo>>;
}

/// Reqwest-backed playlist client.
pub struct PlaylistClient {
    config: RemoteConfig,
    http: reqwest::Client,
}

impl PlaylistClient {
    /// Build a client for the given config.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying HTTP client cannot be constructed.
    pub fn new(config: RemoteConfig) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| SyncError::Config(format!("cannot build HTTP client: {e}")))?;
        Ok(Self { config, http })
    }

    fn playlist_url(&self) -> String {
        format!(
            "{}{}",
            self.config.base_url.trim_end_matches('/'),
            PLAYLIST_PATH
        )
    }
}

#[async_trait]
impl RemoteSource for PlaylistClient {
    async fn fetch_playlist(&self) -> Result<Vec<NetworkVideo>> {
        let url = self.playlist_url();
        tracing::debug!("fetching playlist from {url}");

        let response = self
            .http
            .get(&url)
            .send()
            .await
            .map_err(|e| SyncError::Network(format!("request to {url} failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            return Err(SyncError::Network(format!(
                "{url} returned status {status}"
            )));
        }

        let body = response
            .text()
            .await
            .map_err(|e| SyncError::Network(format!("cannot read response body: {e}")))?;

        parse_payload(&body)
    }
}
