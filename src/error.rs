//! Error types for the reelsync pipeline.

/// Top-level error type for the sync system.
#[derive(Debug, thiserror::Error)]
pub enum SyncError {
    /// Connectivity failure, timeout, or non-success HTTP status.
    #[error("network error: {0}")]
    Network(String),

    /// Response body could not be decoded into the playlist shape.
    #[error("parse error: {0}")]
    Parse(String),

    /// Local cache read or write failure.
    #[error("storage error: {0}")]
    Storage(String),

    /// Scheduler error (task execution, state persistence).
    #[error("scheduler error: {0}")]
    Scheduler(String),

    /// Configuration error.
    #[error("config error: {0}")]
    Config(String),

    /// Channel send/receive error.
    #[error("channel error: {0}")]
    Channel(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Convenience result type.
pub type Result<T> = std::result::Result<T, SyncError>;

/// Failure of a full refresh run, carrying the step that caused it.
///
/// The pipeline is the sole recovery point: the scheduled context turns a
/// transient failure into a retry request, the interactive context turns any
/// failure into a user-visible flag. Either way the underlying [`SyncError`]
/// is preserved as the source.
#[derive(Debug, thiserror::Error)]
#[error("refresh failed: {source}")]
pub struct RefreshError {
    #[from]
    source: SyncError,
}

impl RefreshError {
    /// The underlying cause.
    pub fn cause(&self) -> &SyncError {
        &self.source
    }

    /// Returns `true` when the failure is a transport-level problem worth
    /// retrying later (the scheduled context's retry signal).
    pub fn is_transient(&self) -> bool {
        matches!(self.source, SyncError::Network(_))
    }
}
