//! Keyed registry of one-shot delayed actions.
//!
//! At most one action is pending per key: re-using a key cancels the previous
//! registration (last write wins). The registry lock is held only while the
//! map changes. When a timer elapses, its task re-checks under the lock that
//! it is still the current registration for its key, removes itself, and
//! hands the action to tokio's blocking pool after releasing the lock. A slow
//! action therefore never delays the timers of other keys.

use std::collections::HashMap;
use std::hash::Hash;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::core::{ScheduleError, Spawn};
use crate::runtime::TokioSpawner;

struct Pending {
    generation: u64,
    cancel: CancellationToken,
}

struct Registry<K> {
    closed: bool,
    next_generation: u64,
    actions: HashMap<K, Pending>,
}

struct Inner<K> {
    registry: Mutex<Registry<K>>,
    spawner: TokioSpawner,
}

/// Delayed-action scheduler keyed by `K`.
///
/// Clones share the same registry. Dropping every clone without calling
/// [`close`](Self::close) leaves pending actions armed.
pub struct Scheduler<K = u64> {
    inner: Arc<Inner<K>>,
}

impl<K> Clone for Scheduler<K> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<K> Scheduler<K>
where
    K: Eq + Hash + Clone + Send + Sync + 'static,
{
    /// Create a scheduler whose timers run on the current tokio runtime.
    ///
    /// # Errors
    ///
    /// `ScheduleError::NoRuntime` outside a tokio runtime.
    pub fn new() -> Result<Self, ScheduleError> {
        TokioSpawner::try_current()
            .map(Self::with_spawner)
            .ok_or(ScheduleError::NoRuntime)
    }

    /// Create a scheduler whose timers run on `spawner`.
    #[must_use]
    pub fn with_spawner(spawner: TokioSpawner) -> Self {
        Self {
            inner: Arc::new(Inner {
                registry: Mutex::new(Registry {
                    closed: false,
                    next_generation: 0,
                    actions: HashMap::new(),
                }),
                spawner,
            }),
        }
    }

    /// Run `action` once after `delay`, replacing any action pending under `key`.
    ///
    /// # Errors
    ///
    /// `ScheduleError::Closed` after [`close`](Self::close).
    pub fn set_timeout<F>(&self, key: K, delay: Duration, action: F) -> Result<(), ScheduleError>
    where
        F: FnOnce() + Send + 'static,
    {
        let mut registry = self.inner.registry.lock();
        if registry.closed {
            return Err(ScheduleError::Closed);
        }

        let generation = registry.next_generation;
        registry.next_generation += 1;
        let cancel = CancellationToken::new();

        let previous = registry.actions.insert(
            key.clone(),
            Pending {
                generation,
                cancel: cancel.clone(),
            },
        );
        if let Some(previous) = previous {
            previous.cancel.cancel();
            debug!(generation = generation, "Replaced pending action");
        }

        let inner = Arc::clone(&self.inner);
        self.inner.spawner.spawn(async move {
            tokio::select! {
                biased;
                () = cancel.cancelled() => return,
                () = tokio::time::sleep(delay) => {}
            }
            if inner.take_if_current(&key, generation) {
                // Blocking pool: a slow action never holds a timer thread.
                drop(inner.spawner.handle().spawn_blocking(action));
            }
        });
        Ok(())
    }

    /// Like [`set_timeout`](Self::set_timeout) with a signed millisecond delay.
    ///
    /// # Errors
    ///
    /// `ScheduleError::InvalidDelay` for a negative delay,
    /// `ScheduleError::Closed` after [`close`](Self::close).
    pub fn set_timeout_signed<F>(
        &self,
        key: K,
        delay_ms: i64,
        action: F,
    ) -> Result<(), ScheduleError>
    where
        F: FnOnce() + Send + 'static,
    {
        let millis = u64::try_from(delay_ms).map_err(|_| ScheduleError::InvalidDelay(delay_ms))?;
        self.set_timeout(key, Duration::from_millis(millis), action)
    }

    /// Cancel the action pending under `key`. Absent keys are a no-op.
    ///
    /// Returns whether an action was cancelled.
    pub fn cancel_timeout(&self, key: &K) -> bool {
        let removed = self.inner.registry.lock().actions.remove(key);
        removed.map(|pending| pending.cancel.cancel()).is_some()
    }

    /// Close permanently and cancel every pending action.
    ///
    /// Actions already firing are unaffected.
    pub fn close(&self) {
        let drained: Vec<Pending> = {
            let mut registry = self.inner.registry.lock();
            registry.closed = true;
            registry.actions.drain().map(|(_, pending)| pending).collect()
        };
        info!(cancelled = drained.len(), "Scheduler closed");
        for pending in drained {
            pending.cancel.cancel();
        }
    }

    /// Number of actions still pending.
    #[must_use]
    pub fn pending(&self) -> usize {
        self.inner.registry.lock().actions.len()
    }

    /// Whether [`close`](Self::close) has been called.
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.inner.registry.lock().closed
    }
}

impl<K: Eq + Hash> Inner<K> {
    /// Remove `key` if `generation` is still its registration.
    fn take_if_current(&self, key: &K, generation: u64) -> bool {
        let mut registry = self.registry.lock();
        let current = registry
            .actions
            .get(key)
            .is_some_and(|pending| pending.generation == generation);
        if current {
            registry.actions.remove(key);
        }
        current
    }
}
