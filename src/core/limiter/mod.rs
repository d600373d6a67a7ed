//! Concurrency and rate limiting.
//!
//! Two independent, composable strategies:
//!
//! - [`ConcurrencyLimiter`] bounds operations *in flight at once* (semaphore).
//! - [`RateLimiter`] bounds operations *started per unit of time* (ticker).
//!
//! Wrapping a rate-limited call inside a concurrency permit applies both
//! bounds. Every blocking acquire takes a [`CancellationToken`] and returns
//! [`LimitError::Cancelled`](crate::core::LimitError::Cancelled) when it fires.
//!
//! [`CancellationToken`]: tokio_util::sync::CancellationToken

mod concurrency;
mod rate;

pub use concurrency::{ConcurrencyLimiter, Permit};
pub use rate::RateLimiter;
