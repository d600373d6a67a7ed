//! Tests for runtime adapters

use prometheus_task_toolkit::core::Spawn;
use prometheus_task_toolkit::runtime::TokioSpawner;
use std::time::Duration;

#[test]
fn test_try_current_outside_runtime_is_none() {
    assert!(TokioSpawner::try_current().is_none());
}

#[tokio::test]
async fn test_current_spawner_runs_tasks() {
    let spawner = TokioSpawner::current();
    let (tx, rx) = flume::bounded(1);
    spawner.spawn(async move {
        let _ = tx.send_async("done").await;
    });
    assert_eq!(rx.recv_async().await, Ok("done"));
}

#[test]
fn test_spawner_from_handle() {
    let runtime = tokio::runtime::Runtime::new().unwrap();
    let spawner = TokioSpawner::new(runtime.handle().clone());
    let (tx, rx) = flume::bounded(1);
    spawner.spawn(async move {
        tokio::time::sleep(Duration::from_millis(5)).await;
        let _ = tx.send_async(7u8).await;
    });
    assert_eq!(rx.recv_timeout(Duration::from_secs(2)), Ok(7));
}
