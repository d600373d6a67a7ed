//! Ticker-style requests-per-interval limiter.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Mutex;
use tokio::time::{interval_at, Instant, Interval, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

use crate::config::RateLimitConfig;
use crate::core::LimitError;

/// Issues one permit every `per / rate`.
///
/// The clock starts on the first [`acquire`](Self::acquire) and the first
/// permit arrives one period later, so M acquisitions take at least
/// `M * per / rate`. Ticks missed while nobody waits are delayed, never
/// accumulated into a burst. Cloning shares the same clock.
#[derive(Clone, Debug)]
pub struct RateLimiter {
    config: RateLimitConfig,
    ticker: Arc<Mutex<Option<Interval>>>,
}

impl RateLimiter {
    /// Create a limiter allowing `rate` operations per `per`.
    ///
    /// # Errors
    ///
    /// Returns `LimitError::InvalidConfig` when `rate` or `per` is zero.
    pub fn new(rate: u32, per: Duration) -> Result<Self, LimitError> {
        Self::from_config(RateLimitConfig { rate, per })
    }

    /// Create a limiter from configuration.
    ///
    /// # Errors
    ///
    /// Returns `LimitError::InvalidConfig` on invalid values.
    pub fn from_config(config: RateLimitConfig) -> Result<Self, LimitError> {
        config.validate().map_err(LimitError::InvalidConfig)?;
        Ok(Self {
            config,
            ticker: Arc::new(Mutex::new(None)),
        })
    }

    /// Spacing between permits.
    #[must_use]
    pub fn period(&self) -> Duration {
        self.config.period()
    }

    /// Wait for the next clock tick or for `cancel` to fire.
    ///
    /// # Errors
    ///
    /// `LimitError::Cancelled` on cancellation; the tick is not consumed.
    pub async fn acquire(&self, cancel: &CancellationToken) -> Result<(), LimitError> {
        let mut guard = tokio::select! {
            biased;
            () = cancel.cancelled() => return Err(LimitError::Cancelled),
            guard = self.ticker.lock() => guard,
        };

        let period = self.period();
        let ticker = guard.get_or_insert_with(|| {
            let mut ticker = interval_at(Instant::now() + period, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            ticker
        });

        tokio::select! {
            biased;
            () = cancel.cancelled() => Err(LimitError::Cancelled),
            _ = ticker.tick() => Ok(()),
        }
    }

    /// Wait for a permit, then run `op`.
    ///
    /// # Errors
    ///
    /// Same as [`acquire`](Self::acquire); `op` does not run on error.
    pub async fn run<F, T>(&self, cancel: &CancellationToken, op: F) -> Result<T, LimitError>
    where
        F: Future<Output = T>,
    {
        self.acquire(cancel).await?;
        Ok(op.await)
    }
}
