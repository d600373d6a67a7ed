//! Processing-function abstraction and runtime spawning seam.

use std::future::Future;

use async_trait::async_trait;

use super::{AppResult, TaskMeta};

/// Abstraction for processing one task payload into a result.
///
/// The processor is the opaque, potentially slow, potentially failing unit of
/// work supplied by the caller. Errors are returned, never panicked: a panic
/// inside `process` is fatal for the worker that ran it.
///
/// # Example
///
/// ```rust,ignore
/// use async_trait::async_trait;
/// use prometheus_task_toolkit::core::{AppResult, TaskMeta, TaskProcessor};
///
/// #[derive(Clone)]
/// struct Square;
///
/// #[async_trait]
/// impl TaskProcessor<u64, u64> for Square {
///     async fn process(&self, n: u64, _meta: TaskMeta) -> AppResult<u64> {
///         Ok(n * n)
///     }
/// }
/// ```
#[async_trait]
pub trait TaskProcessor<P, R>: Send + Sync + Clone + 'static
where
    P: Send + 'static,
    R: Send + 'static,
{
    /// Process a payload and return the result.
    ///
    /// On the worker pool this runs on a dedicated worker thread inside that
    /// thread's single-threaded tokio runtime.
    async fn process(&self, payload: P, meta: TaskMeta) -> AppResult<R>;
}

/// Adapter turning an async closure into a [`TaskProcessor`].
#[derive(Clone)]
pub struct FnProcessor<F> {
    func: F,
}

/// Build a processor from `Fn(P, TaskMeta) -> impl Future<Output = AppResult<R>>`.
pub fn processor_fn<P, R, F, Fut>(func: F) -> FnProcessor<F>
where
    F: Fn(P, TaskMeta) -> Fut + Send + Sync + Clone + 'static,
    Fut: Future<Output = AppResult<R>> + Send + 'static,
{
    FnProcessor { func }
}

#[async_trait]
impl<P, R, F, Fut> TaskProcessor<P, R> for FnProcessor<F>
where
    P: Send + 'static,
    R: Send + 'static,
    F: Fn(P, TaskMeta) -> Fut + Send + Sync + Clone + 'static,
    Fut: Future<Output = AppResult<R>> + Send + 'static,
{
    async fn process(&self, payload: P, meta: TaskMeta) -> AppResult<R> {
        (self.func)(payload, meta).await
    }
}

/// Abstraction for spawning detached async work on a runtime.
pub trait Spawn {
    /// Spawn an async task that returns nothing.
    fn spawn<F>(&self, fut: F)
    where
        F: Future<Output = ()> + Send + 'static;
}
