//! # Prometheus Task Toolkit
//!
//! Bounded concurrent task-processing primitives for async Rust services.
//!
//! Every primitive here answers the same question: who closes the channel, and
//! when. Each output channel has exactly one owner that drops its sender, and
//! only after every producer feeding it has finished.
//!
//! ## Key Features
//!
//! - **Worker Pool**: fixed number of dedicated OS threads draining one task
//!   channel, result channel closed only after every worker exits
//! - **Fan-in / Fan-out**: merge N channels into one, or route one channel
//!   round-robin across N lanes
//! - **Limiters**: semaphore-style max-in-flight and ticker-style
//!   requests-per-interval, both cancellable
//! - **Batcher**: size- and time-triggered grouping with a draining close
//! - **Scheduler**: keyed one-shot delayed actions, last write wins
//! - **Pipelines**: generator, map stage, tee, bridge, or-done
//! - **Task groups**: bounded groups with first-error cancellation
//!
//! ## Worker Pool
//!
//! ```rust,ignore
//! use prometheus_task_toolkit::config::WorkerPoolConfig;
//! use prometheus_task_toolkit::core::{processor_fn, Task, WorkerPool};
//!
//! let pool = WorkerPool::new(
//!     WorkerPoolConfig::new().with_worker_count(3),
//!     processor_fn(|n: u64, _meta| async move { Ok(n * n) }),
//! )?;
//!
//! let (task_tx, task_rx) = pool.channel();
//! let (result_tx, result_rx) = pool.channel();
//! let handle = pool.run(task_rx, result_tx)?;
//!
//! for n in 1..=10 {
//!     task_tx.send(Task::new(n, n))?;
//! }
//! drop(task_tx);
//!
//! let squares: Vec<_> = result_rx.iter().collect();
//! handle.join()?;
//! ```
//!
//! ## Limiters
//!
//! ```rust,ignore
//! use prometheus_task_toolkit::core::{ConcurrencyLimiter, RateLimiter};
//! use tokio_util::sync::CancellationToken;
//! use std::time::Duration;
//!
//! let cancel = CancellationToken::new();
//! let slots = ConcurrencyLimiter::new(4)?;
//! let pace = RateLimiter::new(10, Duration::from_secs(1))?;
//!
//! let _permit = slots.acquire(&cancel).await?;
//! pace.acquire(&cancel).await?;
//! call_upstream().await;
//! ```
//!
//! For complete scenarios, see the integration tests under `tests/`.

#![deny(missing_docs)]
#![deny(unsafe_code)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]

/// Core task-processing primitives.
pub mod core;
/// Configuration models for pools, limiters and batchers.
pub mod config;
/// Runtime adapters.
pub mod runtime;
/// Shared utilities: cancellation helpers, serde helpers, tracing setup.
pub mod util;
