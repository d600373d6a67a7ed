//! Integration tests for fan-in and fan-out
//!
//! Producers and consumers run with randomized pacing to shake out
//! close-ordering bugs: every value must arrive exactly once and every
//! output must close exactly once.

use flume::Receiver;
use prometheus_task_toolkit::core::{
    fan_out, fan_out_workers, merge, merge_bounded, processor_fn, Spawn, Task,
};
use prometheus_task_toolkit::runtime::TokioSpawner;
use rand::Rng;
use std::collections::{HashMap, HashSet};
use std::time::Duration;

// ============================================================================
// HELPER FUNCTIONS
// ============================================================================

async fn drain<T>(rx: Receiver<T>) -> Vec<T> {
    let mut values = Vec::new();
    while let Ok(value) = rx.recv_async().await {
        values.push(value);
    }
    values
}

/// Producer emitting `count` tagged values with small random pauses.
fn jittery_source(spawner: &TokioSpawner, source: u32, count: u32) -> Receiver<(u32, u32)> {
    let (tx, rx) = flume::bounded(0);
    spawner.spawn(async move {
        for seq in 0..count {
            let pause = rand::rng().random_range(0..3u64);
            tokio::time::sleep(Duration::from_millis(pause)).await;
            if tx.send_async((source, seq)).await.is_err() {
                return;
            }
        }
    });
    rx
}

// ============================================================================
// FAN-IN
// ============================================================================

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_merge_delivers_every_value_once() {
    let spawner = TokioSpawner::current();
    let sources: Vec<_> = (0..8).map(|s| jittery_source(&spawner, s, 25)).collect();

    let merged = drain(merge(&spawner, sources)).await;
    assert_eq!(merged.len(), 8 * 25);

    let unique: HashSet<_> = merged.iter().copied().collect();
    assert_eq!(unique.len(), merged.len());

    // Per-source order is preserved even though sources interleave.
    let mut last_seq: HashMap<u32, u32> = HashMap::new();
    for (source, seq) in merged {
        if let Some(previous) = last_seq.insert(source, seq) {
            assert!(seq > previous);
        }
    }
}

#[tokio::test]
async fn test_merge_mixes_closed_and_live_sources() {
    let spawner = TokioSpawner::current();
    let (closed_tx, closed_rx) = flume::unbounded::<(u32, u32)>();
    drop(closed_tx);

    let live = jittery_source(&spawner, 1, 5);
    let merged = drain(merge_bounded(&spawner, vec![closed_rx, live], 4)).await;
    assert_eq!(merged, (0..5).map(|seq| (1, seq)).collect::<Vec<_>>());
}

#[tokio::test]
async fn test_merge_output_stays_open_while_a_source_is_open() {
    let spawner = TokioSpawner::current();
    let (open_tx, open_rx) = flume::unbounded::<u32>();
    let out = merge(&spawner, vec![open_rx]);

    let waited = tokio::time::timeout(Duration::from_millis(50), out.recv_async()).await;
    assert!(waited.is_err(), "output must not close while a source is open");

    drop(open_tx);
    assert!(out.recv_async().await.is_err());
}

// ============================================================================
// FAN-OUT
// ============================================================================

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_fan_out_lanes_partition_source() {
    let spawner = TokioSpawner::current();
    let (tx, rx) = flume::bounded(0);
    spawner.spawn(async move {
        for n in 0..30u32 {
            if tx.send_async(n).await.is_err() {
                return;
            }
        }
    });

    let lanes = fan_out(&spawner, rx, 4).unwrap();
    let per_lane = futures::future::join_all(lanes.into_iter().map(drain)).await;

    for (lane, values) in per_lane.iter().enumerate() {
        assert!(values.iter().all(|n| *n as usize % 4 == lane));
    }
    let total: usize = per_lane.iter().map(Vec::len).sum();
    assert_eq!(total, 30);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_fan_out_workers_round_trip() {
    let spawner = TokioSpawner::current();
    let (tx, rx) = flume::unbounded();
    for n in 0..12u64 {
        tx.send(Task::new(n, n)).unwrap();
    }
    drop(tx);

    let square = processor_fn(|n: u64, _meta| async move { Ok(n * n) });
    let results = drain(fan_out_workers(&spawner, rx, 3, square).unwrap()).await;
    assert_eq!(results.len(), 12);

    for result in results {
        assert_eq!(result.worker_id as u64, result.id % 3);
        let id = result.id;
        assert_eq!(result.into_outcome().unwrap(), id * id);
    }
}
