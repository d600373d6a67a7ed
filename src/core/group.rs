//! Bounded task group with first-error cancellation.
//!
//! Tasks share one cancellation token derived from the caller's. The first
//! task to fail cancels that token, so siblings observing it can stop early,
//! and its error is what [`TaskGroup::wait`] returns. An optional limit bounds
//! how many tasks run at once; [`TaskGroup::spawn`] waits for a slot.

use std::future::Future;
use std::sync::Arc;

use parking_lot::Mutex;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use super::limiter::ConcurrencyLimiter;
use super::{AppResult, LimitError};

/// Group of fallible async tasks.
pub struct TaskGroup {
    tasks: JoinSet<()>,
    cancel: CancellationToken,
    limiter: Option<ConcurrencyLimiter>,
    first_error: Arc<Mutex<Option<anyhow::Error>>>,
}

impl TaskGroup {
    /// Create a group whose token is a child of `parent`.
    #[must_use]
    pub fn new(parent: &CancellationToken) -> Self {
        Self {
            tasks: JoinSet::new(),
            cancel: parent.child_token(),
            limiter: None,
            first_error: Arc::new(Mutex::new(None)),
        }
    }

    /// Allow at most `limit` tasks to run at once.
    ///
    /// # Errors
    ///
    /// `LimitError::InvalidConfig` when `limit` is zero.
    pub fn with_limit(mut self, limit: usize) -> Result<Self, LimitError> {
        self.limiter = Some(ConcurrencyLimiter::new(limit)?);
        Ok(self)
    }

    /// Token cancelled on the first failure or when the parent is cancelled.
    #[must_use]
    pub fn token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Start a task, waiting first for a free slot when a limit is set.
    ///
    /// The task receives the group token.
    ///
    /// # Errors
    ///
    /// `LimitError::Cancelled` if the group was cancelled before a slot freed;
    /// the task is not started.
    pub async fn spawn<F, Fut>(&mut self, task: F) -> Result<(), LimitError>
    where
        F: FnOnce(CancellationToken) -> Fut + Send + 'static,
        Fut: Future<Output = AppResult<()>> + Send + 'static,
    {
        let permit = match &self.limiter {
            Some(limiter) => Some(limiter.acquire(&self.cancel).await?),
            None => None,
        };

        let token = self.cancel.clone();
        let first_error = Arc::clone(&self.first_error);
        self.tasks.spawn(async move {
            let outcome = task(token.clone()).await;
            drop(permit);
            if let Err(err) = outcome {
                let mut slot = first_error.lock();
                if slot.is_none() {
                    debug!(error = %err, "Task group failed, cancelling siblings");
                    *slot = Some(err);
                }
                token.cancel();
            }
        });
        Ok(())
    }

    /// Wait for every started task and return the first error, if any.
    ///
    /// # Errors
    ///
    /// The first task error, or an error describing a panicked task.
    pub async fn wait(mut self) -> AppResult<()> {
        let mut panicked = false;
        while let Some(joined) = self.tasks.join_next().await {
            if joined.is_err() {
                panicked = true;
                self.cancel.cancel();
            }
        }
        if let Some(err) = self.first_error.lock().take() {
            return Err(err);
        }
        if panicked {
            anyhow::bail!("a task in the group panicked");
        }
        Ok(())
    }
}
