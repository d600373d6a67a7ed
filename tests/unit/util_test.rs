//! Tests for shared utilities

use prometheus_task_toolkit::runtime::TokioSpawner;
use prometheus_task_toolkit::util::{deadline_token, init_tracing};
use serde::{Deserialize, Serialize};
use std::time::Duration;

#[derive(Debug, PartialEq, Serialize, Deserialize)]
struct Timed {
    #[serde(with = "prometheus_task_toolkit::util::serde::duration_ms")]
    timeout: Duration,
}

#[test]
fn test_duration_ms_serde() {
    let timed = Timed {
        timeout: Duration::from_millis(1500),
    };
    let json = serde_json::to_string(&timed).unwrap();
    assert_eq!(json, r#"{"timeout":1500}"#);
    assert_eq!(serde_json::from_str::<Timed>(&json).unwrap(), timed);
}

#[test]
fn test_init_tracing_twice_is_harmless() {
    init_tracing();
    init_tracing();
}

#[tokio::test(start_paused = true)]
async fn test_deadline_token_fires_after_timeout() {
    let token = deadline_token(&TokioSpawner::current(), Duration::from_millis(100));
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert!(!token.is_cancelled());

    tokio::time::sleep(Duration::from_millis(60)).await;
    assert!(token.is_cancelled());
}
