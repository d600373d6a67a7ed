//! Tests for configuration validation and loading

use prometheus_task_toolkit::config::{
    BatcherConfig, ConcurrencyLimitConfig, RateLimitConfig, ToolkitConfig, WorkerPoolConfig,
};
use std::time::Duration;

#[test]
fn test_pool_config_defaults_are_valid() {
    let cfg = WorkerPoolConfig::default();
    assert!(cfg.worker_count >= 1);
    assert!(cfg.validate().is_ok());
}

#[test]
fn test_pool_config_builder() {
    let cfg = WorkerPoolConfig::new()
        .with_worker_count(6)
        .with_queue_capacity(32)
        .with_thread_name_prefix("ingest");
    assert_eq!(cfg.worker_count, 6);
    assert_eq!(cfg.queue_capacity, 32);
    assert_eq!(cfg.thread_name_prefix, "ingest");
}

#[test]
fn test_pool_config_rejects_zero_workers() {
    let cfg = WorkerPoolConfig::new().with_worker_count(0);
    assert!(cfg.validate().is_err());
}

#[test]
fn test_pool_config_rejects_tiny_stack() {
    let cfg = WorkerPoolConfig::new().with_thread_stack_size(1024);
    assert!(cfg.validate().is_err());
}

#[test]
fn test_limiter_configs() {
    assert!(ConcurrencyLimitConfig { max_in_flight: 0 }.validate().is_err());
    assert!(ConcurrencyLimitConfig { max_in_flight: 8 }.validate().is_ok());

    let zero_rate = RateLimitConfig {
        rate: 0,
        per: Duration::from_secs(1),
    };
    assert!(zero_rate.validate().is_err());

    let ok = RateLimitConfig {
        rate: 4,
        per: Duration::from_secs(2),
    };
    assert_eq!(ok.period(), Duration::from_millis(500));
}

#[test]
fn test_batcher_config_rejects_zero_values() {
    assert!(BatcherConfig::new(0, Duration::from_secs(1)).validate().is_err());
    assert!(BatcherConfig::new(10, Duration::ZERO).validate().is_err());
    assert!(BatcherConfig::new(10, Duration::from_millis(250)).validate().is_ok());
}

#[test]
fn test_toolkit_config_from_json() {
    let cfg = ToolkitConfig::from_json_str(
        r#"{
            "pool": { "worker_count": 4, "queue_capacity": 64 },
            "rate": { "rate": 10, "per_ms": 1000 },
            "batcher": { "max_size": 50, "flush_interval_ms": 200 }
        }"#,
    )
    .unwrap();

    assert_eq!(cfg.pool.worker_count, 4);
    assert_eq!(cfg.pool.queue_capacity, 64);
    assert_eq!(cfg.rate.unwrap().period(), Duration::from_millis(100));
    assert_eq!(cfg.batcher.unwrap().flush_interval, Duration::from_millis(200));
    assert!(cfg.concurrency.is_none());
}

#[test]
fn test_toolkit_config_json_round_trip() {
    let cfg = ToolkitConfig {
        concurrency: Some(ConcurrencyLimitConfig { max_in_flight: 3 }),
        batcher: Some(BatcherConfig::new(8, Duration::from_millis(40))),
        ..ToolkitConfig::default()
    };
    let json = serde_json::to_string(&cfg).unwrap();
    assert!(json.contains("\"flush_interval_ms\":40"));
    assert_eq!(ToolkitConfig::from_json_str(&json).unwrap(), cfg);
}

#[test]
fn test_toolkit_config_reports_section() {
    let err = ToolkitConfig::from_json_str(
        r#"{ "batcher": { "max_size": 0, "flush_interval_ms": 10 } }"#,
    )
    .unwrap_err();
    assert!(err.starts_with("batcher invalid"));

    let err = ToolkitConfig::from_json_str("{ not json").unwrap_err();
    assert!(err.starts_with("parse error"));
}

#[test]
fn test_toolkit_config_from_lookup_defaults() {
    let cfg = ToolkitConfig::from_lookup(|_| None).unwrap();
    assert_eq!(cfg, ToolkitConfig::default());
}
