//! Scheduled task definitions.
//!
//! Defines the [`ScheduledTask`] type, [`Schedule`] enum for timing, and the
//! [`TaskResult`] outcome a task reports back to its scheduler.

use serde::{Deserialize, Serialize};
use std::time::{SystemTime, UNIX_EPOCH};

/// Stable logical name of the recurring playlist refresh.
pub const TASK_REFRESH_PLAYLIST: &str = "refresh_playlist";

/// How often a task should run.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Schedule {
    /// Run every N seconds.
    Interval {
        /// Interval in seconds between runs.
        secs: u64,
    },
    /// Run once daily at a given hour and minute (UTC).
    Daily {
        /// Hour of day (0-23, UTC).
        hour: u8,
        /// Minute of hour (0-59).
        min: u8,
    },
}

impl std::fmt::Display for Schedule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Interval { secs } => {
                if *secs >= 3600 {
                    write!(f, "every {} hours", secs / 3600)
                } else {
                    write!(f, "every {} minutes", secs / 60)
                }
            }
            Self::Daily { hour, min } => write!(f, "daily at {hour:02}:{min:02} UTC"),
        }
    }
}

/// Outcome of executing a scheduled task.
///
/// A task reports exactly one of: completed, or transient failure that the
/// scheduler should try again. `Error` is a completed-but-failed run; it
/// does not request another attempt.
#[derive(Debug, Clone)]
pub enum TaskResult {
    /// Task completed successfully with a summary message.
    Success(String),
    /// Task hit a transient failure and asks to be run again.
    Retry(String),
    /// Task failed with a non-transient error message.
    Error(String),
}

impl TaskResult {
    /// Outcome classification for run history.
    pub fn outcome(&self) -> TaskRunOutcome {
        match self {
            Self::Success(_) => TaskRunOutcome::Success,
            Self::Retry(_) => TaskRunOutcome::Retry,
            Self::Error(_) => TaskRunOutcome::Error,
        }
    }

    /// Human-readable summary of the run.
    pub fn summary(&self) -> String {
        match self {
            Self::Success(msg) | Self::Retry(msg) | Self::Error(msg) => msg.clone(),
        }
    }
}

/// Persisted classification of one task run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskRunOutcome {
    /// Run completed.
    Success,
    /// Run asked to be re-attempted.
    Retry,
    /// Run failed permanently.
    Error,
}

/// One entry of scheduler run history.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskRunRecord {
    /// Task that ran.
    pub task_id: String,
    /// Unix epoch seconds when the run started.
    pub started_at: u64,
    /// Unix epoch seconds when the run finished.
    pub finished_at: u64,
    /// Run classification.
    pub outcome: TaskRunOutcome,
    /// Human-readable summary.
    pub summary: String,
}

/// A task that runs on a schedule.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScheduledTask {
    /// Unique task identifier (e.g. [`TASK_REFRESH_PLAYLIST`]).
    pub id: String,
    /// Human-readable task name.
    pub name: String,
    /// When to run this task.
    pub schedule: Schedule,
    /// Unix epoch seconds of the last completed run, if any.
    pub last_run: Option<u64>,
    /// Whether the task is enabled.
    pub enabled: bool,
}

impl ScheduledTask {
    /// Create a new enabled task with the given schedule.
    pub fn new(id: impl Into<String>, name: impl Into<String>, schedule: Schedule) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            schedule,
            last_run: None,
            enabled: true,
        }
    }

    /// Returns `true` if the task is enabled and due to run.
    pub fn is_due(&self) -> bool {
        if !self.enabled {
            return false;
        }

        let now = now_epoch_secs();

        match &self.schedule {
            Schedule::Interval { secs } => match self.last_run {
                None => true,
                Some(last) => now.saturating_sub(last) >= *secs,
            },
            Schedule::Daily { hour, min } => {
                let day_secs = u64::from(*hour) * 3600 + u64::from(*min) * 60;
                let today_start = now - (now % 86400);
                let scheduled = today_start + day_secs;

                match self.last_run {
                    None => now >= scheduled,
                    Some(last) => last < scheduled && now >= scheduled,
                }
            }
        }
    }

    /// Record that the task completed at the current time.
    pub fn mark_run(&mut self) {
        self.last_run = Some(now_epoch_secs());
    }
}

/// Returns current UTC seconds since epoch.
pub(crate) fn now_epoch_secs() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}
