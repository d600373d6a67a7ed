//! Error types for toolkit components.

use thiserror::Error;

/// Errors produced by the worker pool.
#[derive(Debug, Error)]
pub enum PoolError {
    /// Configuration validation failed.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
    /// A worker thread could not be spawned.
    #[error("failed to spawn worker {worker_id}: {reason}")]
    Spawn {
        /// Index of the worker that failed to start.
        worker_id: usize,
        /// OS-level reason.
        reason: String,
    },
    /// A worker panicked inside the processor. The pool does not recover from this.
    #[error("worker {worker_id} panicked")]
    WorkerPanicked {
        /// Index of the first worker observed to have panicked.
        worker_id: usize,
    },
    /// The supervisor thread itself died before reporting.
    #[error("pool supervisor exited abnormally")]
    Supervisor,
}

/// Errors produced by fan-out/fan-in helpers.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum FanError {
    /// Fan-out requires at least one lane.
    #[error("fan-out needs at least one lane")]
    NoLanes,
}

/// Errors produced by the concurrency and rate limiters.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum LimitError {
    /// Configuration validation failed.
    #[error("invalid limiter configuration: {0}")]
    InvalidConfig(String),
    /// The caller's cancellation signal fired while waiting.
    #[error("acquire cancelled")]
    Cancelled,
    /// No permit is free right now (non-blocking acquire only).
    #[error("no permit available")]
    Exhausted,
    /// The limiter was closed.
    #[error("limiter closed")]
    Closed,
}

/// Errors produced by the batcher.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum BatchError {
    /// Configuration validation failed.
    #[error("invalid batcher configuration: {0}")]
    InvalidConfig(String),
    /// No Tokio runtime was available at construction.
    #[error("batcher requires a tokio runtime")]
    NoRuntime,
    /// The batcher has been closed.
    #[error("batcher is closed")]
    Closed,
}

/// Errors produced by the delayed-action scheduler.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ScheduleError {
    /// Negative delay.
    #[error("invalid delay: {0}ms")]
    InvalidDelay(i64),
    /// No Tokio runtime was available at construction.
    #[error("scheduler requires a tokio runtime")]
    NoRuntime,
    /// The scheduler has been closed.
    #[error("scheduler is closed")]
    Closed,
}

/// Aggregate error for callers that mix components.
#[derive(Debug, Error)]
pub enum ToolkitError {
    /// Worker pool failure.
    #[error(transparent)]
    Pool(#[from] PoolError),
    /// Fan-out/fan-in failure.
    #[error(transparent)]
    Fan(#[from] FanError),
    /// Limiter failure.
    #[error(transparent)]
    Limit(#[from] LimitError),
    /// Batcher failure.
    #[error(transparent)]
    Batch(#[from] BatchError),
    /// Scheduler failure.
    #[error(transparent)]
    Schedule(#[from] ScheduleError),
    /// Configuration could not be loaded.
    #[error("config error: {0}")]
    Config(String),
}

/// Application-facing result using anyhow for processor outcomes.
pub type AppResult<T> = Result<T, anyhow::Error>;
