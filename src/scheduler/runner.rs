//! Scheduler background loop.
//!
//! Spawns a tokio task that periodically checks for due tasks and executes
//! them. Task definitions and run history are persisted to
//! `{config_dir}/reelsync/scheduler.json`.

use std::path::PathBuf;

use futures_util::future::BoxFuture;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

use crate::error::{Result, SyncError};
use crate::scheduler::tasks::{
    now_epoch_secs, Schedule, ScheduledTask, TaskResult, TaskRunRecord, TASK_REFRESH_PLAYLIST,
};

/// Interval between scheduler ticks (seconds).
const TICK_INTERVAL_SECS: u64 = 60;

/// Number of run-history entries to keep.
const DEFAULT_HISTORY_LIMIT: usize = 200;

/// Callback type for executing a task.
///
/// Takes the scheduled task and returns a future resolving to a
/// [`TaskResult`]. The scheduler itself is schedule-agnostic: it knows when
/// to run tasks, never what they do.
pub type TaskExecutor =
    Box<dyn Fn(&ScheduledTask) -> BoxFuture<'static, TaskResult> + Send + Sync>;

/// Persisted scheduler state.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct SchedulerState {
    /// Schema version.
    #[serde(default = "default_state_version")]
    version: u8,
    /// RFC 3339 timestamp of the last persist.
    #[serde(default)]
    saved_at: Option<String>,
    /// Persisted task definitions and runtime state.
    #[serde(default)]
    tasks: Vec<ScheduledTask>,
    /// Persisted run history.
    #[serde(default)]
    history: Vec<TaskRunRecord>,
}

fn default_state_version() -> u8 {
    1
}

/// Background scheduler that runs periodic tasks.
pub struct Scheduler {
    /// Registered tasks.
    tasks: Vec<ScheduledTask>,
    /// Recent run history.
    history: Vec<TaskRunRecord>,
    /// Path to persisted scheduler state.
    state_path: Option<PathBuf>,
    /// Channel for reporting task results to the embedding application.
    result_tx: mpsc::UnboundedSender<TaskResult>,
    /// Task executor callback.
    executor: Option<TaskExecutor>,
    /// Max history entries kept in memory and persisted to disk.
    max_history_entries: usize,
}

impl Scheduler {
    /// Create a new scheduler with the given result channel.
    pub fn new(result_tx: mpsc::UnboundedSender<TaskResult>) -> Self {
        let state_path = Self::default_state_path();
        Self {
            tasks: Vec::new(),
            history: Vec::new(),
            state_path,
            result_tx,
            executor: None,
            max_history_entries: DEFAULT_HISTORY_LIMIT,
        }
    }

    /// Set the executor callback for running tasks.
    pub fn with_executor(mut self, executor: TaskExecutor) -> Self {
        self.executor = Some(executor);
        self
    }

    /// Override the state file location (None disables persistence).
    pub fn with_state_path(mut self, path: Option<PathBuf>) -> Self {
        self.state_path = path;
        self
    }

    /// Override the in-memory and persisted run-history limit.
    pub fn with_history_limit(mut self, max_entries: usize) -> Self {
        self.max_history_entries = max_entries.max(1);
        self
    }

    /// Register the recurring playlist refresh under its stable work name.
    ///
    /// A no-op when a task with that name already exists, so the schedule an
    /// earlier run registered (or a user edited) is kept.
    pub fn with_playlist_refresh(&mut self, interval_secs: u64) {
        self.add_task_if_missing(ScheduledTask::new(
            TASK_REFRESH_PLAYLIST,
            "Refresh playlist cache",
            Schedule::Interval {
                secs: interval_secs,
            },
        ));
    }

    /// Add (or replace) a task.
    pub fn add_task(&mut self, task: ScheduledTask) {
        if let Some(existing) = self.tasks.iter_mut().find(|t| t.id == task.id) {
            *existing = task;
        } else {
            self.tasks.push(task);
        }
    }

    /// Add a task unless one with the same id is already registered.
    pub fn add_task_if_missing(&mut self, task: ScheduledTask) {
        let exists = self.tasks.iter().any(|existing| existing.id == task.id);
        if !exists {
            self.tasks.push(task);
        }
    }

    /// Returns registered tasks.
    pub fn tasks(&self) -> &[ScheduledTask] {
        &self.tasks
    }

    /// Returns scheduler run history.
    pub fn history(&self) -> &[TaskRunRecord] {
        &self.history
    }

    /// Enables or disables a task by id. Returns `true` when found.
    pub fn set_task_enabled(&mut self, task_id: &str, enabled: bool) -> bool {
        if let Some(task) = self.tasks.iter_mut().find(|t| t.id == task_id) {
            task.enabled = enabled;
            return true;
        }
        false
    }

    /// Load persisted state from disk and merge with registered tasks.
    pub fn load_state(&mut self) {
        let state = match load_state_from_path(self.state_path.as_deref()) {
            Ok(s) => s,
            Err(e) => {
                warn!("cannot load scheduler state: {e}");
                return;
            }
        };

        for task in state.tasks {
            if let Some(existing) = self.tasks.iter_mut().find(|t| t.id == task.id) {
                *existing = task;
            } else {
                self.tasks.push(task);
            }
        }

        self.history = state.history;
        self.trim_history();

        if let Some(path) = &self.state_path {
            debug!("loaded scheduler state from {}", path.display());
        }
    }

    /// Persist task state and run history.
    fn save_state(&self) {
        let state = SchedulerState {
            version: default_state_version(),
            saved_at: Some(chrono::Utc::now().to_rfc3339()),
            tasks: self.tasks.clone(),
            history: self.history.clone(),
        };

        if let Err(e) = save_state_to_path(self.state_path.as_deref(), &state) {
            error!("cannot persist scheduler state: {e}");
        }
    }

    /// Start the scheduler background loop.
    pub fn run(mut self) -> tokio::task::JoinHandle<()> {
        self.load_state();

        tokio::spawn(async move {
            info!("scheduler started with {} tasks", self.tasks.len());
            let mut interval =
                tokio::time::interval(std::time::Duration::from_secs(TICK_INTERVAL_SECS));

            loop {
                interval.tick().await;
                if !self.tick().await {
                    return;
                }
            }
        })
    }

    /// Execute a task immediately by id, bypassing its schedule.
    ///
    /// Performs the same bookkeeping as a scheduled run (outcome recording,
    /// history, state persistence) but hands the result back to the caller
    /// instead of the result channel.
    ///
    /// # Errors
    ///
    /// Returns an error if no task with the given id is registered.
    pub async fn run_once(&mut self, task_id: &str) -> Result<TaskResult> {
        let task = self
            .tasks
            .iter()
            .find(|t| t.id == task_id)
            .cloned()
            .ok_or_else(|| SyncError::Scheduler(format!("unknown task: {task_id}")))?;

        let result = self.execute_and_record(&task).await;
        self.save_state();
        Ok(result)
    }

    /// Execute one scheduler tick — check and run due tasks.
    ///
    /// Returns `false` when the result channel is closed and the loop
    /// should stop.
    async fn tick(&mut self) -> bool {
        let due_ids: Vec<String> = self
            .tasks
            .iter()
            .filter(|t| t.is_due())
            .map(|t| t.id.clone())
            .collect();

        let ran_any = !due_ids.is_empty();
        for task_id in due_ids {
            let task = match self.tasks.iter().find(|t| t.id == task_id).cloned() {
                Some(task) => task,
                None => continue,
            };

            let result = self.execute_and_record(&task).await;
            if self.result_tx.send(result).is_err() {
                debug!("scheduler result channel closed, stopping");
                return false;
            }
        }

        if ran_any {
            self.save_state();
        }
        true
    }

    /// Run one task and apply outcome bookkeeping.
    ///
    /// A `Retry` outcome leaves `last_run` untouched so the task stays due
    /// at the next tick; `Success` and `Error` stamp it.
    async fn execute_and_record(&mut self, task: &ScheduledTask) -> TaskResult {
        debug!("executing scheduled task: {}", task.id);
        let started_at = now_epoch_secs();
        let result = self.execute_task(task).await;
        let finished_at = now_epoch_secs();

        if let Some(task) = self.tasks.iter_mut().find(|t| t.id == task.id) {
            match &result {
                TaskResult::Retry(msg) => {
                    warn!("task {} requested retry: {msg}", task.id);
                }
                TaskResult::Error(msg) => {
                    error!("task {} failed: {msg}", task.id);
                    task.mark_run();
                }
                TaskResult::Success(msg) => {
                    info!("task {} completed: {msg}", task.id);
                    task.mark_run();
                }
            }
        }

        self.push_history(TaskRunRecord {
            task_id: task.id.clone(),
            started_at,
            finished_at,
            outcome: result.outcome(),
            summary: result.summary(),
        });

        result
    }

    /// Execute a single task via the configured executor.
    async fn execute_task(&self, task: &ScheduledTask) -> TaskResult {
        match &self.executor {
            Some(executor) => executor(task).await,
            None => TaskResult::Error(format!("no executor configured for task {}", task.id)),
        }
    }

    fn push_history(&mut self, run: TaskRunRecord) {
        self.history.push(run);
        self.trim_history();
    }

    fn trim_history(&mut self) {
        if self.history.len() <= self.max_history_entries {
            return;
        }
        let drop_count = self.history.len().saturating_sub(self.max_history_entries);
        self.history.drain(0..drop_count);
    }

    /// Default path for the scheduler state file.
    pub fn default_state_path() -> Option<PathBuf> {
        dirs::config_dir().map(|d| d.join("reelsync").join("scheduler.json"))
    }
}

fn load_state_from_path(path: Option<&std::path::Path>) -> Result<SchedulerState> {
    let Some(path) = path else {
        return Ok(SchedulerState::default());
    };

    let bytes = match std::fs::read(path) {
        Ok(contents) => contents,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Ok(SchedulerState::default());
        }
        Err(e) => {
            return Err(SyncError::Scheduler(format!("cannot read state: {e}")));
        }
    };

    serde_json::from_slice(&bytes)
        .map_err(|e| SyncError::Scheduler(format!("cannot parse state: {e}")))
}

fn save_state_to_path(path: Option<&std::path::Path>, state: &SchedulerState) -> Result<()> {
    let Some(path) = path else {
        return Ok(());
    };

    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .map_err(|e| SyncError::Scheduler(format!("cannot create state dir: {e}")))?;
    }

    let json = serde_json::to_string_pretty(state)
        .map_err(|e| SyncError::Scheduler(format!("cannot serialize state: {e}")))?;
    std::fs::write(path, json)
        .map_err(|e| SyncError::Scheduler(format!("cannot write state: {e}")))?;
    Ok(())
}
