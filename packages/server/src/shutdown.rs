//! Graceful shutdown coordination via `CancellationToken` and `TaskTracker`.

use std::{future::Future, time::Duration};

use tokio::task::JoinHandle;
use tokio_util::{sync::CancellationToken, task::TaskTracker};

/// Shared stop signal plus the set of tasks that must observe it.
///
/// Every session broadcaster and connection pump is spawned through the
/// coordinator, so shutdown can wait for all of them.
#[derive(Debug, Clone, Default)]
pub struct ShutdownCoordinator {
    token: CancellationToken,
    tracker: TaskTracker,
}

impl ShutdownCoordinator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Clone of the root cancellation token
    pub fn token(&self) -> CancellationToken {
        self.token.clone()
    }

    /// Token cancelled together with the root, or on its own
    pub fn child_token(&self) -> CancellationToken {
        self.token.child_token()
    }

    /// Spawn a tracked task
    pub fn spawn<F>(&self, task: F) -> JoinHandle<F::Output>
    where
        F: Future + Send + 'static,
        F::Output: Send + 'static,
    {
        self.tracker.spawn(task)
    }

    /// Signal every task to stop
    pub fn shutdown(&self) {
        self.token.cancel();
    }

    pub fn is_shutting_down(&self) -> bool {
        self.token.is_cancelled()
    }

    /// Number of tracked tasks still running
    pub fn active_tasks(&self) -> usize {
        self.tracker.len()
    }

    /// Cancel everything and wait up to `timeout` for tracked tasks to finish.
    ///
    /// Returns `false` when tasks were still running at the deadline.
    pub async fn graceful_shutdown(&self, timeout: Duration) -> bool {
        self.shutdown();
        self.tracker.close();
        tracing::info!(
            task_count = self.tracker.len(),
            timeout_ms = timeout.as_millis() as u64,
            "Waiting for chat tasks to complete"
        );

        if tokio::time::timeout(timeout, self.tracker.wait())
            .await
            .is_err()
        {
            tracing::warn!(
                remaining = self.tracker.len(),
                "Shutdown timed out after {:?}, some tasks may still be running",
                timeout
            );
            return false;
        }
        true
    }
}
