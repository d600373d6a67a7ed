//! Configuration models for pools, limiters, and batchers.

pub mod pool;
pub mod toolkit;

pub use pool::WorkerPoolConfig;
pub use toolkit::{BatcherConfig, ConcurrencyLimitConfig, RateLimitConfig, ToolkitConfig};
