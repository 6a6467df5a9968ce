//! Scheduler→pipeline bridge.
//!
//! Provides [`RefreshExecutorBridge`] which implements the
//! [`TaskExecutor`](super::runner::TaskExecutor) callback to connect the
//! scheduled refresh task to the refresh pipeline.

use std::sync::Arc;

use futures_util::future::BoxFuture;
use tracing::debug;

use crate::repository::PlaylistRepository;
use crate::scheduler::runner::TaskExecutor;
use crate::scheduler::tasks::{ScheduledTask, TaskResult, TASK_REFRESH_PLAYLIST};

/// Bridges scheduler task execution to the refresh pipeline.
///
/// Applies the scheduled-context failure policy: a transient transport
/// failure asks the scheduler to retry, anything else completes the run
/// (successfully or not) without requesting another attempt.
pub struct RefreshExecutorBridge {
    repo: Arc<PlaylistRepository>,
}

impl RefreshExecutorBridge {
    /// Create a new executor bridge over the given repository.
    pub fn new(repo: Arc<PlaylistRepository>) -> Self {
        Self { repo }
    }

    /// Convert this bridge into a boxed [`TaskExecutor`] callback.
    ///
    /// The returned callback can be passed to
    /// [`Scheduler::with_executor`](super::runner::Scheduler::with_executor).
    pub fn into_executor(self) -> TaskExecutor {
        Box::new(move |task: &ScheduledTask| -> BoxFuture<'static, TaskResult> {
            debug!("executor bridge running task: {}", task.id);
            let repo = Arc::clone(&self.repo);
            let task_id = task.id.clone();

            Box::pin(async move {
                if task_id != TASK_REFRESH_PLAYLIST {
                    return TaskResult::Error(format!("no handler for task {task_id}"));
                }

                match repo.refresh().await {
                    Ok(count) => TaskResult::Success(format!("refreshed {count} videos")),
                    Err(e) if e.is_transient() => TaskResult::Retry(e.to_string()),
                    Err(e) => TaskResult::Error(e.to_string()),
                }
            })
        })
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used)]

    use super::*;
    use crate::error::{Result, SyncError};
    use crate::remote::{NetworkVideo, RemoteSource};
    use crate::scheduler::tasks::Schedule;
    use crate::store::VideoStore;
    use async_trait::async_trait;

    struct FixedSource(Vec<NetworkVideo>);

    #[async_trait]
    impl RemoteSource for FixedSource {
        async fn fetch_playlist(&self) -> Result<Vec<NetworkVideo>> {
            Ok(self.0.clone())
        }
    }

    struct FailingSource(fn() -> SyncError);

    #[async_trait]
    impl RemoteSource for FailingSource {
        async fn fetch_playlist(&self) -> Result<Vec<NetworkVideo>> {
            Err((self.0)())
        }
    }

    fn refresh_task() -> ScheduledTask {
        ScheduledTask::new(
            TASK_REFRESH_PLAYLIST,
            "Refresh playlist cache",
            Schedule::Interval { secs: 86400 },
        )
    }

    fn bridge_over(source: Arc<dyn RemoteSource>) -> (TaskExecutor, Arc<VideoStore>) {
        let store = Arc::new(VideoStore::open_in_memory().unwrap());
        let repo = Arc::new(PlaylistRepository::new(source, Arc::clone(&store)));
        (RefreshExecutorBridge::new(repo).into_executor(), store)
    }

    #[tokio::test]
    async fn successful_run_reports_success() {
        let (executor, store) = bridge_over(Arc::new(FixedSource(vec![NetworkVideo {
            url: "a".to_owned(),
            updated: "2021-01-01".to_owned(),
            title: "T1".to_owned(),
            description: "D1".to_owned(),
            thumbnail: "th1".to_owned(),
        }])));

        let result = executor(&refresh_task()).await;
        assert!(matches!(result, TaskResult::Success(_)));
        assert_eq!(store.list_all().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn network_failure_requests_retry() {
        let (executor, store) = bridge_over(Arc::new(FailingSource(|| {
            SyncError::Network("connection reset".to_owned())
        })));

        let result = executor(&refresh_task()).await;
        assert!(matches!(result, TaskResult::Retry(_)));
        assert!(store.list_all().unwrap().is_empty());
    }

    #[tokio::test]
    async fn parse_failure_completes_without_retry() {
        let (executor, _store) = bridge_over(Arc::new(FailingSource(|| {
            SyncError::Parse("bad payload".to_owned())
        })));

        let result = executor(&refresh_task()).await;
        assert!(matches!(result, TaskResult::Error(_)));
    }

    #[tokio::test]
    async fn unknown_task_is_rejected() {
        let (executor, _store) = bridge_over(Arc::new(FixedSource(vec![])));

        let task = ScheduledTask::new("mystery", "M", Schedule::Interval { secs: 60 });
        let result = executor(&task).await;
        assert!(matches!(result, TaskResult::Error(_)));
    }
}
