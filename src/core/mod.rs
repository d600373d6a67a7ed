//! Core task-processing primitives: worker pool, fan-in/out, limiters,
//! batcher, scheduler, channel pipelines and task groups.

pub mod error;
pub mod task;
pub mod executor;
pub mod worker_pool;
pub mod fan_in;
pub mod fan_out;
pub mod limiter;
pub mod batcher;
pub mod scheduler;
pub mod pipeline;
pub mod group;

pub use error::{
    AppResult, BatchError, FanError, LimitError, PoolError, ScheduleError, ToolkitError,
};
pub use task::{Task, TaskId, TaskMeta, TaskResult};
pub use executor::{processor_fn, FnProcessor, Spawn, TaskProcessor};
pub use worker_pool::{PoolHandle, PoolStats, WorkerPool};
pub use fan_in::{merge, merge_bounded};
pub use fan_out::{fan_out, fan_out_bounded, fan_out_workers};
pub use limiter::{ConcurrencyLimiter, Permit, RateLimiter};
pub use batcher::{Batcher, FlushAction};
pub use scheduler::Scheduler;
pub use group::TaskGroup;
