//! Limiter, batcher, and root toolkit configuration.

use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::WorkerPoolConfig;

/// Semaphore-style limiter configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConcurrencyLimitConfig {
    /// Maximum operations in flight at once (N).
    pub max_in_flight: usize,
}

impl ConcurrencyLimitConfig {
    /// Validate limiter configuration values.
    ///
    /// # Errors
    ///
    /// Returns a description of the invalid field.
    pub fn validate(&self) -> Result<(), String> {
        if self.max_in_flight == 0 {
            return Err("max_in_flight must be greater than 0".into());
        }
        Ok(())
    }
}

/// Ticker-style limiter configuration: `rate` operations per `per`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RateLimitConfig {
    /// Operations allowed per interval (R).
    pub rate: u32,
    /// Length of the interval (I).
    #[serde(rename = "per_ms", with = "crate::util::serde::duration_ms")]
    pub per: Duration,
}

impl RateLimitConfig {
    /// Validate limiter configuration values.
    ///
    /// # Errors
    ///
    /// Returns a description of the first invalid field.
    pub fn validate(&self) -> Result<(), String> {
        if self.rate == 0 {
            return Err("rate must be greater than 0".into());
        }
        if self.per.is_zero() {
            return Err("per must be greater than 0".into());
        }
        if self.period().is_zero() {
            return Err("per / rate must be at least 1ns".into());
        }
        Ok(())
    }

    /// Spacing between two consecutive permits.
    #[must_use]
    pub fn period(&self) -> Duration {
        self.per / self.rate.max(1)
    }
}

/// Batcher configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatcherConfig {
    /// Items that trigger an immediate flush.
    pub max_size: usize,
    /// Period of the background flush.
    #[serde(rename = "flush_interval_ms", with = "crate::util::serde::duration_ms")]
    pub flush_interval: Duration,
}

impl BatcherConfig {
    /// Create a batcher configuration.
    #[must_use]
    pub const fn new(max_size: usize, flush_interval: Duration) -> Self {
        Self {
            max_size,
            flush_interval,
        }
    }

    /// Validate batcher configuration values.
    ///
    /// # Errors
    ///
    /// Returns a description of the first invalid field.
    pub fn validate(&self) -> Result<(), String> {
        if self.max_size == 0 {
            return Err("max_size must be greater than 0".into());
        }
        if self.flush_interval.is_zero() {
            return Err("flush_interval must be greater than 0".into());
        }
        Ok(())
    }
}

/// Root configuration grouping every component.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolkitConfig {
    /// Worker pool settings.
    #[serde(default)]
    pub pool: WorkerPoolConfig,
    /// Optional semaphore limiter.
    #[serde(default)]
    pub concurrency: Option<ConcurrencyLimitConfig>,
    /// Optional rate limiter.
    #[serde(default)]
    pub rate: Option<RateLimitConfig>,
    /// Optional batcher.
    #[serde(default)]
    pub batcher: Option<BatcherConfig>,
}

impl ToolkitConfig {
    /// Validate every configured component.
    ///
    /// # Errors
    ///
    /// Returns the first failure prefixed with its section name.
    pub fn validate(&self) -> Result<(), String> {
        self.pool.validate().map_err(|e| format!("pool invalid: {e}"))?;
        if let Some(c) = &self.concurrency {
            c.validate().map_err(|e| format!("concurrency invalid: {e}"))?;
        }
        if let Some(r) = &self.rate {
            r.validate().map_err(|e| format!("rate invalid: {e}"))?;
        }
        if let Some(b) = &self.batcher {
            b.validate().map_err(|e| format!("batcher invalid: {e}"))?;
        }
        Ok(())
    }

    /// Parse configuration from a JSON string and validate.
    ///
    /// # Errors
    ///
    /// Returns a parse or validation message.
    pub fn from_json_str(input: &str) -> Result<Self, String> {
        let cfg: Self = serde_json::from_str(input).map_err(|e| format!("parse error: {e}"))?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Load configuration from `TOOLKIT_*` environment variables.
    ///
    /// A `.env` file in the working directory is loaded first when present.
    ///
    /// # Errors
    ///
    /// Returns a parse or validation message.
    pub fn from_env() -> Result<Self, String> {
        let _ = dotenvy::dotenv();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build configuration from an arbitrary key lookup.
    ///
    /// Recognized keys: `TOOLKIT_WORKER_COUNT`, `TOOLKIT_QUEUE_CAPACITY`,
    /// `TOOLKIT_MAX_IN_FLIGHT`, `TOOLKIT_RATE` with `TOOLKIT_RATE_PER_MS`,
    /// and `TOOLKIT_BATCH_MAX_SIZE` with `TOOLKIT_BATCH_FLUSH_MS`.
    ///
    /// # Errors
    ///
    /// Returns a parse or validation message.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, String>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut cfg = Self::default();

        if let Some(n) = parse_key(&lookup, "TOOLKIT_WORKER_COUNT")? {
            cfg.pool.worker_count = n;
        }
        if let Some(n) = parse_key(&lookup, "TOOLKIT_QUEUE_CAPACITY")? {
            cfg.pool.queue_capacity = n;
        }
        if let Some(max_in_flight) = parse_key(&lookup, "TOOLKIT_MAX_IN_FLIGHT")? {
            cfg.concurrency = Some(ConcurrencyLimitConfig { max_in_flight });
        }
        if let Some(rate) = parse_key(&lookup, "TOOLKIT_RATE")? {
            let per_ms: u64 = parse_key(&lookup, "TOOLKIT_RATE_PER_MS")?.unwrap_or(1000);
            cfg.rate = Some(RateLimitConfig {
                rate,
                per: Duration::from_millis(per_ms),
            });
        }
        if let Some(max_size) = parse_key(&lookup, "TOOLKIT_BATCH_MAX_SIZE")? {
            let flush_ms: u64 = parse_key(&lookup, "TOOLKIT_BATCH_FLUSH_MS")?.unwrap_or(1000);
            cfg.batcher = Some(BatcherConfig::new(max_size, Duration::from_millis(flush_ms)));
        }

        cfg.validate()?;
        Ok(cfg)
    }
}

fn parse_key<F, T>(lookup: &F, key: &str) -> Result<Option<T>, String>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
    T::Err: std::fmt::Display,
{
    lookup(key)
        .map(|raw| {
            raw.trim()
                .parse::<T>()
                .map_err(|e| format!("{key}: cannot parse `{raw}`: {e}"))
        })
        .transpose()
}
