//! Shared utilities.

pub mod cancel;
pub mod serde;
pub mod telemetry;

pub use cancel::{child_with_deadline, deadline_token};
pub use telemetry::init_tracing;
