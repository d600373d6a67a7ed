//! Size- and time-triggered batcher.
//!
//! Lifecycle: `Open -> (append* -> [size flush])* -> Closed`.
//!
//! Items are appended under an exclusive lock. Reaching `max_size` swaps the
//! batch out and resets the periodic timer, so a size flush is not followed
//! immediately by a timer flush. A background loop flushes whatever has
//! accumulated on every tick. Flushed batches are handed to the action on
//! tokio's blocking pool, so neither `append` nor the flush timer waits on a
//! slow consumer; the order in which two rapid flushes reach the action is
//! therefore not guaranteed.

use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::Notify;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;
use tracing::{debug, info};

use crate::config::BatcherConfig;
use crate::core::{BatchError, Spawn};
use crate::runtime::TokioSpawner;

/// Callback receiving each flushed batch.
pub type FlushAction<T> = Arc<dyn Fn(Vec<T>) + Send + Sync>;

#[derive(Debug, Clone, Copy)]
enum FlushReason {
    Size,
    Interval,
    Close,
}

struct BatchState<T> {
    items: Vec<T>,
    closed: bool,
}

struct Inner<T> {
    config: BatcherConfig,
    state: Mutex<BatchState<T>>,
    action: FlushAction<T>,
    spawner: TokioSpawner,
    /// Background loop plus every dispatched flush action.
    tasks: TaskTracker,
    reset: Notify,
    shutdown: CancellationToken,
}

/// Accumulates items and flushes them as a group.
pub struct Batcher<T: Send + 'static> {
    inner: Arc<Inner<T>>,
}

impl<T: Send + 'static> Batcher<T> {
    /// Create a batcher on the current tokio runtime and start its flush loop.
    ///
    /// # Errors
    ///
    /// `BatchError::InvalidConfig` for a zero size or interval,
    /// `BatchError::NoRuntime` outside a tokio runtime.
    pub fn new<F>(config: BatcherConfig, action: F) -> Result<Self, BatchError>
    where
        F: Fn(Vec<T>) + Send + Sync + 'static,
    {
        let spawner = TokioSpawner::try_current().ok_or(BatchError::NoRuntime)?;
        Self::with_spawner(config, spawner, action)
    }

    /// Create a batcher whose loop and flushes run on `spawner`.
    ///
    /// # Errors
    ///
    /// `BatchError::InvalidConfig` for a zero size or interval.
    pub fn with_spawner<F>(
        config: BatcherConfig,
        spawner: TokioSpawner,
        action: F,
    ) -> Result<Self, BatchError>
    where
        F: Fn(Vec<T>) + Send + Sync + 'static,
    {
        config.validate().map_err(BatchError::InvalidConfig)?;

        let inner = Arc::new(Inner {
            config,
            state: Mutex::new(BatchState {
                items: Vec::with_capacity(config.max_size),
                closed: false,
            }),
            action: Arc::new(action),
            spawner,
            tasks: TaskTracker::new(),
            reset: Notify::new(),
            shutdown: CancellationToken::new(),
        });

        let loop_inner = Arc::clone(&inner);
        inner
            .spawner
            .spawn(inner.tasks.track_future(flush_loop(loop_inner)));

        let flush_interval_ms =
            u64::try_from(config.flush_interval.as_millis()).unwrap_or(u64::MAX);
        debug!(
            max_size = config.max_size,
            flush_interval_ms = flush_interval_ms,
            "Batcher started"
        );
        Ok(Self { inner })
    }

    /// Append one item.
    ///
    /// Reaching `max_size` flushes immediately and restarts the flush timer.
    ///
    /// # Errors
    ///
    /// `BatchError::Closed` once [`close`](Self::close) has begun.
    pub fn append(&self, item: T) -> Result<(), BatchError> {
        let mut state = self.inner.state.lock();
        if state.closed {
            return Err(BatchError::Closed);
        }
        state.items.push(item);
        if state.items.len() >= self.inner.config.max_size {
            let batch = std::mem::replace(
                &mut state.items,
                Vec::with_capacity(self.inner.config.max_size),
            );
            // Dispatch only spawns; registering it before unlocking keeps it
            // visible to a concurrent close.
            self.inner.dispatch(batch, FlushReason::Size);
            drop(state);
            self.inner.reset.notify_one();
        }
        Ok(())
    }

    /// Items buffered and not yet flushed.
    #[must_use]
    pub fn pending(&self) -> usize {
        self.inner.state.lock().items.len()
    }

    /// Whether [`close`](Self::close) has begun.
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.inner.state.lock().closed
    }

    /// Close the batcher. Idempotent.
    ///
    /// Rejects further appends, flushes what remains, stops the timer, and
    /// returns once the loop has exited and every flush action has finished.
    pub async fn close(&self) {
        let first = {
            let mut state = self.inner.state.lock();
            !std::mem::replace(&mut state.closed, true)
        };
        if first {
            info!("Closing batcher");
        }
        self.inner.shutdown.cancel();
        self.inner.tasks.close();
        self.inner.tasks.wait().await;
    }
}

impl<T: Send + 'static> Drop for Batcher<T> {
    fn drop(&mut self) {
        // Stop the loop; it flushes what remains on its way out.
        self.inner.state.lock().closed = true;
        self.inner.shutdown.cancel();
    }
}

impl<T: Send + 'static> Inner<T> {
    fn flush(&self, reason: FlushReason) {
        let batch = {
            let mut state = self.state.lock();
            if state.items.is_empty() {
                return;
            }
            std::mem::take(&mut state.items)
        };
        self.dispatch(batch, reason);
    }

    fn dispatch(&self, batch: Vec<T>, reason: FlushReason) {
        debug!(size = batch.len(), reason = ?reason, "Flushing batch");
        let action = Arc::clone(&self.action);
        drop(
            self.tasks
                .spawn_blocking_on(move || action(batch), self.spawner.handle()),
        );
    }
}

async fn flush_loop<T: Send + 'static>(inner: Arc<Inner<T>>) {
    let period = inner.config.flush_interval;
    let mut ticker = interval_at(Instant::now() + period, period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            biased;
            () = inner.shutdown.cancelled() => {
                inner.flush(FlushReason::Close);
                break;
            }
            () = inner.reset.notified() => ticker.reset(),
            _ = ticker.tick() => inner.flush(FlushReason::Interval),
        }
    }
    debug!("Batcher loop exited");
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn collecting() -> (Arc<Mutex<Vec<Vec<u32>>>>, impl Fn(Vec<u32>) + Send + Sync + 'static) {
        let delivered = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&delivered);
        (delivered, move |batch| sink.lock().push(batch))
    }

    #[tokio::test]
    async fn test_invalid_config() {
        let (_, action) = collecting();
        let err = Batcher::new(BatcherConfig::new(0, Duration::from_secs(1)), action)
            .err()
            .unwrap();
        assert!(matches!(err, BatchError::InvalidConfig(_)));

        let (_, action) = collecting();
        let err = Batcher::new(BatcherConfig::new(4, Duration::ZERO), action)
            .err()
            .unwrap();
        assert!(matches!(err, BatchError::InvalidConfig(_)));
    }

    #[test]
    fn test_requires_runtime() {
        let (_, action) = collecting();
        let err = Batcher::new(BatcherConfig::new(4, Duration::from_secs(1)), action)
            .err()
            .unwrap();
        assert_eq!(err, BatchError::NoRuntime);
    }

    #[tokio::test]
    async fn test_append_after_close_fails() {
        let (delivered, action) = collecting();
        let batcher = Batcher::new(BatcherConfig::new(4, Duration::from_secs(60)), action).unwrap();
        batcher.close().await;
        batcher.close().await;
        assert_eq!(batcher.append(1), Err(BatchError::Closed));
        assert!(delivered.lock().is_empty());
    }
}
