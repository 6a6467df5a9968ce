//! Configuration types for the sync daemon.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{Result, SyncError};

/// Top-level configuration for the sync daemon.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SyncConfig {
    /// Remote playlist endpoint settings.
    pub remote: RemoteSection,
    /// Local cache settings.
    pub cache: CacheSection,
    /// Recurring refresh settings.
    pub schedule: ScheduleSection,
}

/// Remote endpoint configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RemoteSection {
    /// Base URL of the playlist service.
    pub base_url: String,
    /// Request timeout in seconds.
    pub request_timeout_secs: u64,
}

impl Default for RemoteSection {
    fn default() -> Self {
        Self {
            base_url: "https://feeds.reelsync.dev".to_owned(),
            request_timeout_secs: 30,
        }
    }
}

/// Local cache configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheSection {
    /// Database file path (None = platform data directory).
    pub database_path: Option<PathBuf>,
}

impl CacheSection {
    /// Resolve the database file path, falling back to
    /// `{data_dir}/reelsync/reelsync.db`.
    pub fn resolved_database_path(&self) -> Option<PathBuf> {
        if let Some(path) = &self.database_path {
            return Some(path.clone());
        }
        dirs::data_dir().map(|d| d.join("reelsync").join("reelsync.db"))
    }
}

/// Recurring refresh configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScheduleSection {
    /// Seconds between scheduled refresh runs (default: one day).
    pub refresh_interval_secs: u64,
}

impl Default for ScheduleSection {
    fn default() -> Self {
        Self {
            refresh_interval_secs: 24 * 3600,
        }
    }
}

impl SyncConfig {
    /// Returns the path to the config file (`{config_dir}/reelsync/config.toml`).
    pub fn default_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|d| d.join("reelsync").join("config.toml"))
    }

    /// Load configuration from the default location.
    ///
    /// Returns the default configuration if the file is missing; a present
    /// but malformed file is an error rather than a silent fallback.
    pub fn load() -> Result<Self> {
        match Self::default_config_path() {
            Some(path) => Self::load_from(&path),
            None => Ok(Self::default()),
        }
    }

    /// Load configuration from a specific TOML file.
    pub fn load_from(path: &Path) -> Result<Self> {
        let contents = match std::fs::read_to_string(path) {
            Ok(c) => c,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Ok(Self::default());
            }
            Err(e) => {
                return Err(SyncError::Config(format!(
                    "cannot read config {}: {e}",
                    path.display()
                )));
            }
        };

        let config: Self = toml::from_str(&contents)
            .map_err(|e| SyncError::Config(format!("cannot parse config: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    /// Check invariants the type system cannot express.
    pub fn validate(&self) -> Result<()> {
        url::Url::parse(&self.remote.base_url)
            .map_err(|e| SyncError::Config(format!("invalid base_url: {e}")))?;

        if self.remote.request_timeout_secs == 0 {
            return Err(SyncError::Config(
                "request_timeout_secs must be non-zero".to_owned(),
            ));
        }
        if self.schedule.refresh_interval_secs == 0 {
            return Err(SyncError::Config(
                "refresh_interval_secs must be non-zero".to_owned(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used)]

    use super::*;

    #[test]
    fn default_config_validates() {
        let config = SyncConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.schedule.refresh_interval_secs, 86400);
        assert_eq!(config.remote.request_timeout_secs, 30);
    }

    #[test]
    fn partial_toml_fills_defaults() {
        let config: SyncConfig = toml::from_str(
            r#"
            [remote]
            base_url = "http://localhost:9000"
            "#,
        )
        .unwrap();
        assert_eq!(config.remote.base_url, "http://localhost:9000");
        assert_eq!(config.remote.request_timeout_secs, 30);
        assert_eq!(config.schedule.refresh_interval_secs, 86400);
    }

    #[test]
    fn load_from_missing_file_returns_default() {
        let dir = tempfile::tempdir().unwrap();
        let config = SyncConfig::load_from(&dir.path().join("nope.toml")).unwrap();
        assert_eq!(config.remote.base_url, RemoteSection::default().base_url);
    }

    #[test]
    fn load_from_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");

        let mut config = SyncConfig::default();
        config.remote.base_url = "http://127.0.0.1:8080".to_owned();
        config.schedule.refresh_interval_secs = 3600;
        std::fs::write(&path, toml::to_string_pretty(&config).unwrap()).unwrap();

        let restored = SyncConfig::load_from(&path).unwrap();
        assert_eq!(restored.remote.base_url, "http://127.0.0.1:8080");
        assert_eq!(restored.schedule.refresh_interval_secs, 3600);
    }

    #[test]
    fn invalid_base_url_is_rejected() {
        let mut config = SyncConfig::default();
        config.remote.base_url = "not a url".to_owned();
        assert!(matches!(config.validate(), Err(SyncError::Config(_))));
    }

    #[test]
    fn zero_interval_is_rejected() {
        let mut config = SyncConfig::default();
        config.schedule.refresh_interval_secs = 0;
        assert!(matches!(config.validate(), Err(SyncError::Config(_))));
    }

    #[test]
    fn explicit_database_path_wins() {
        let section = CacheSection {
            database_path: Some(PathBuf::from("/tmp/custom.db")),
        };
        assert_eq!(
            section.resolved_database_path(),
            Some(PathBuf::from("/tmp/custom.db"))
        );
    }
}
