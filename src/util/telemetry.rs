//! Tracing setup for binaries and tests that use the toolkit.

use tracing_subscriber::EnvFilter;

/// Filter applied when `RUST_LOG` is unset.
pub const DEFAULT_FILTER: &str = "prometheus_task_toolkit=info";

/// Install an env-filtered fmt subscriber unless one is already set.
///
/// Reads `RUST_LOG`; falls back to [`DEFAULT_FILTER`].
pub fn init_tracing() {
    init_tracing_with(DEFAULT_FILTER);
}

/// Like [`init_tracing`], with a caller-chosen fallback filter.
///
/// Returns `false` when another subscriber was already installed.
pub fn init_tracing_with(fallback: &str) -> bool {
    if tracing::dispatcher::has_been_set() {
        return false;
    }
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(fallback));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_thread_names(true)
        .try_init()
        .is_ok()
}
