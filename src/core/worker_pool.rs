//! Bounded worker pool draining a shared task channel with dedicated worker threads.
//!
//! A `WorkerPool` runs a fixed number of workers against one shared
//! [`flume::Receiver`] of tasks. Every task is pulled by exactly one worker,
//! processed by the caller's [`TaskProcessor`](crate::core::TaskProcessor),
//! and its [`TaskResult`](crate::core::TaskResult) is sent to the result
//! channel. A supervisor joins every worker before dropping the designated
//! result sender, so the result channel closes only after the last send.
//!
//! # Key Features
//!
//! - **Bounded parallelism**: never more than `worker_count` tasks in flight
//! - **Join-before-close**: the result channel is closed by one supervisor
//! - **Errors are data**: processor failures travel inside the result
//! - **Cancellable**: workers stop pulling new tasks when the token fires
//!
//! # Example
//!
//! ```rust,ignore
//! use prometheus_task_toolkit::config::WorkerPoolConfig;
//! use prometheus_task_toolkit::core::{processor_fn, WorkerPool};
//!
//! let pool = WorkerPool::new(
//!     WorkerPoolConfig::new().with_worker_count(3),
//!     processor_fn(|n: u64, _meta| async move { Ok(n * n) }),
//! )?;
//!
//! let results = pool.process_all(1..=10)?;
//! assert_eq!(results.len(), 10);
//! ```

mod native;

use std::sync::atomic::{AtomicU64, Ordering};

/// Statistics about pool utilization.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PoolStats {
    /// Number of worker threads.
    pub worker_count: usize,

    /// Tasks currently inside the processor.
    pub active_tasks: u64,

    /// Tasks pulled from the task channel.
    pub received_tasks: u64,

    /// Tasks whose processor returned `Ok`.
    pub completed_tasks: u64,

    /// Tasks whose processor returned `Err`.
    pub failed_tasks: u64,
}

/// Internal counters for pool statistics (thread-safe).
#[derive(Debug, Default)]
pub(crate) struct PoolCounters {
    pub active_tasks: AtomicU64,
    pub received_tasks: AtomicU64,
    pub completed_tasks: AtomicU64,
    pub failed_tasks: AtomicU64,
}

impl PoolCounters {
    /// Get a snapshot of current statistics.
    pub fn snapshot(&self, worker_count: usize) -> PoolStats {
        PoolStats {
            worker_count,
            active_tasks: self.active_tasks.load(Ordering::Relaxed),
            received_tasks: self.received_tasks.load(Ordering::Relaxed),
            completed_tasks: self.completed_tasks.load(Ordering::Relaxed),
            failed_tasks: self.failed_tasks.load(Ordering::Relaxed),
        }
    }

    pub fn record_start(&self) {
        self.received_tasks.fetch_add(1, Ordering::Relaxed);
        self.active_tasks.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_finish(&self, ok: bool) {
        self.active_tasks.fetch_sub(1, Ordering::Relaxed);
        if ok {
            self.completed_tasks.fetch_add(1, Ordering::Relaxed);
        } else {
            self.failed_tasks.fetch_add(1, Ordering::Relaxed);
        }
    }
}

pub use native::{PoolHandle, WorkerPool};
