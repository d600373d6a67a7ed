//! Worker pool configuration.

use serde::{Deserialize, Serialize};

/// Default stack size for worker threads (2 MiB).
pub const DEFAULT_STACK_SIZE: usize = 2 * 1024 * 1024;

/// Default capacity of channels created by the pool.
pub const DEFAULT_QUEUE_CAPACITY: usize = 256;

/// Configuration for [`WorkerPool`](crate::core::WorkerPool).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorkerPoolConfig {
    /// Number of worker threads (W).
    pub worker_count: usize,
    /// Capacity of channels created through `WorkerPool::channel`.
    pub queue_capacity: usize,
    /// Stack size for each worker thread in bytes.
    pub thread_stack_size: usize,
    /// Prefix for worker thread names.
    pub thread_name_prefix: String,
}

impl Default for WorkerPoolConfig {
    fn default() -> Self {
        Self {
            worker_count: num_cpus::get().max(1),
            queue_capacity: DEFAULT_QUEUE_CAPACITY,
            thread_stack_size: DEFAULT_STACK_SIZE,
            thread_name_prefix: "tk-worker".into(),
        }
    }
}

impl WorkerPoolConfig {
    /// Configuration with one worker per CPU.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the number of workers.
    #[must_use]
    pub const fn with_worker_count(mut self, worker_count: usize) -> Self {
        self.worker_count = worker_count;
        self
    }

    /// Set the capacity of channels created by the pool.
    #[must_use]
    pub const fn with_queue_capacity(mut self, queue_capacity: usize) -> Self {
        self.queue_capacity = queue_capacity;
        self
    }

    /// Set the worker thread stack size.
    #[must_use]
    pub const fn with_thread_stack_size(mut self, thread_stack_size: usize) -> Self {
        self.thread_stack_size = thread_stack_size;
        self
    }

    /// Set the worker thread name prefix.
    #[must_use]
    pub fn with_thread_name_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.thread_name_prefix = prefix.into();
        self
    }

    /// Validate pool configuration values.
    ///
    /// # Errors
    ///
    /// Returns a description of the first invalid field.
    pub fn validate(&self) -> Result<(), String> {
        if self.worker_count == 0 {
            return Err("worker_count must be greater than 0".into());
        }
        if self.queue_capacity == 0 {
            return Err("queue_capacity must be greater than 0".into());
        }
        if self.thread_stack_size < 64 * 1024 {
            return Err("thread_stack_size must be at least 64 KiB".into());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_valid() {
        let cfg = WorkerPoolConfig::new();
        assert!(cfg.worker_count >= 1);
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn test_builder_methods() {
        let cfg = WorkerPoolConfig::new()
            .with_worker_count(3)
            .with_queue_capacity(8)
            .with_thread_name_prefix("squares");
        assert_eq!(cfg.worker_count, 3);
        assert_eq!(cfg.queue_capacity, 8);
        assert_eq!(cfg.thread_name_prefix, "squares");
    }

    #[test]
    fn test_invalid_values() {
        assert!(WorkerPoolConfig::new().with_worker_count(0).validate().is_err());
        assert!(WorkerPoolConfig::new().with_queue_capacity(0).validate().is_err());
        assert!(WorkerPoolConfig::new().with_thread_stack_size(1024).validate().is_err());
    }
}
