//! Tests for error types and conversions

use prometheus_task_toolkit::core::{
    BatchError, FanError, LimitError, PoolError, ScheduleError, ToolkitError,
};

#[test]
fn test_pool_error_display() {
    let err = PoolError::Spawn {
        worker_id: 2,
        reason: "out of threads".into(),
    };
    assert_eq!(err.to_string(), "failed to spawn worker 2: out of threads");
    assert_eq!(
        PoolError::WorkerPanicked { worker_id: 1 }.to_string(),
        "worker 1 panicked"
    );
}

#[test]
fn test_component_errors_display() {
    assert_eq!(FanError::NoLanes.to_string(), "fan-out needs at least one lane");
    assert_eq!(LimitError::Cancelled.to_string(), "acquire cancelled");
    assert_eq!(BatchError::Closed.to_string(), "batcher is closed");
    assert_eq!(ScheduleError::InvalidDelay(-5).to_string(), "invalid delay: -5ms");
}

#[test]
fn test_toolkit_error_is_transparent() {
    let err: ToolkitError = LimitError::Closed.into();
    assert!(matches!(err, ToolkitError::Limit(LimitError::Closed)));
    assert_eq!(err.to_string(), "limiter closed");

    let err: ToolkitError = ScheduleError::Closed.into();
    assert_eq!(err.to_string(), "scheduler is closed");
}

#[test]
fn test_errors_convert_into_anyhow() {
    fn fails() -> anyhow::Result<()> {
        Err(BatchError::NoRuntime.into())
    }
    let err = fails().unwrap_err();
    assert_eq!(err.to_string(), "batcher requires a tokio runtime");
    assert!(err.downcast_ref::<BatchError>().is_some());
}
