//! Task and result envelopes exchanged over toolkit channels.

use serde::{Deserialize, Serialize};

use super::AppResult;

/// Identifier attached to every task and carried onto its result.
pub type TaskId = u64;

/// A unit of work: identifying key plus opaque payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task<P> {
    /// Identifying key.
    pub id: TaskId,
    /// Caller-supplied payload.
    pub payload: P,
}

impl<P> Task<P> {
    /// Wrap a payload with its id.
    pub const fn new(id: TaskId, payload: P) -> Self {
        Self { id, payload }
    }
}

/// Metadata handed to the processor alongside the payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskMeta {
    /// Id of the task being processed.
    pub id: TaskId,
    /// Index of the worker processing it.
    pub worker_id: usize,
}

/// Output of processing one task.
///
/// Processor errors are carried in `outcome`; the pool delivers them, it never
/// interprets them.
#[derive(Debug)]
pub struct TaskResult<R> {
    /// Id of the originating task.
    pub id: TaskId,
    /// Worker that produced this result.
    pub worker_id: usize,
    /// Processor outcome.
    pub outcome: AppResult<R>,
}

impl<R> TaskResult<R> {
    /// Whether the processor succeeded.
    pub const fn is_ok(&self) -> bool {
        self.outcome.is_ok()
    }

    /// Consume the envelope, returning the processor outcome.
    pub fn into_outcome(self) -> AppResult<R> {
        self.outcome
    }
}
