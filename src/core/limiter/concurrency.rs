//! Semaphore-style max-concurrency limiter.

use std::future::Future;
use std::sync::Arc;

use tokio::sync::{OwnedSemaphorePermit, Semaphore, TryAcquireError};
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::config::ConcurrencyLimitConfig;
use crate::core::LimitError;

/// Bounded set of N permits.
///
/// At any instant the number of acquired, unreleased permits is at most N.
/// Waiters are served in arrival order. Cloning shares the same permits.
#[derive(Clone, Debug)]
pub struct ConcurrencyLimiter {
    semaphore: Arc<Semaphore>,
    max_in_flight: usize,
}

/// A held permit. Dropping it releases the slot.
#[derive(Debug)]
pub struct Permit {
    _permit: OwnedSemaphorePermit,
}

impl Permit {
    /// Release the permit explicitly.
    pub fn release(self) {
        drop(self);
    }
}

impl ConcurrencyLimiter {
    /// Create a limiter with `max_in_flight` permits.
    ///
    /// # Errors
    ///
    /// Returns `LimitError::InvalidConfig` when `max_in_flight` is zero or
    /// larger than the semaphore supports.
    pub fn new(max_in_flight: usize) -> Result<Self, LimitError> {
        Self::from_config(&ConcurrencyLimitConfig { max_in_flight })
    }

    /// Create a limiter from configuration.
    ///
    /// # Errors
    ///
    /// Returns `LimitError::InvalidConfig` on invalid values.
    pub fn from_config(config: &ConcurrencyLimitConfig) -> Result<Self, LimitError> {
        config.validate().map_err(LimitError::InvalidConfig)?;
        if config.max_in_flight > Semaphore::MAX_PERMITS {
            return Err(LimitError::InvalidConfig(format!(
                "max_in_flight must be at most {}",
                Semaphore::MAX_PERMITS
            )));
        }
        Ok(Self {
            semaphore: Arc::new(Semaphore::new(config.max_in_flight)),
            max_in_flight: config.max_in_flight,
        })
    }

    /// Wait for a permit or for `cancel` to fire.
    ///
    /// An already-cancelled token wins over a free permit.
    ///
    /// # Errors
    ///
    /// `LimitError::Cancelled` on cancellation, `LimitError::Closed` after
    /// [`close`](Self::close).
    pub async fn acquire(&self, cancel: &CancellationToken) -> Result<Permit, LimitError> {
        tokio::select! {
            biased;
            () = cancel.cancelled() => {
                debug!("Permit acquire cancelled");
                Err(LimitError::Cancelled)
            }
            permit = Arc::clone(&self.semaphore).acquire_owned() => permit
                .map(|p| Permit { _permit: p })
                .map_err(|_| LimitError::Closed),
        }
    }

    /// Take a permit only if one is free right now.
    ///
    /// # Errors
    ///
    /// `LimitError::Exhausted` if all permits are held, `LimitError::Closed`
    /// after [`close`](Self::close).
    pub fn try_acquire(&self) -> Result<Permit, LimitError> {
        match Arc::clone(&self.semaphore).try_acquire_owned() {
            Ok(p) => Ok(Permit { _permit: p }),
            Err(TryAcquireError::NoPermits) => Err(LimitError::Exhausted),
            Err(TryAcquireError::Closed) => Err(LimitError::Closed),
        }
    }

    /// Run `op` while holding a permit.
    ///
    /// # Errors
    ///
    /// Same as [`acquire`](Self::acquire); `op` does not run on error.
    pub async fn run<F, T>(&self, cancel: &CancellationToken, op: F) -> Result<T, LimitError>
    where
        F: Future<Output = T>,
    {
        let permit = self.acquire(cancel).await?;
        let out = op.await;
        permit.release();
        Ok(out)
    }

    /// Fail every pending and future acquire with `LimitError::Closed`.
    pub fn close(&self) {
        self.semaphore.close();
    }

    /// Configured permit count.
    #[must_use]
    pub const fn max_in_flight(&self) -> usize {
        self.max_in_flight
    }

    /// Permits free right now.
    #[must_use]
    pub fn available(&self) -> usize {
        self.semaphore.available_permits()
    }

    /// Permits currently held.
    #[must_use]
    pub fn in_flight(&self) -> usize {
        self.max_in_flight.saturating_sub(self.available())
    }
}
