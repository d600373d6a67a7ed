//! Fan-in: merge several channels into one arrival-ordered output.
//!
//! One reader task per source forwards whatever is ready, so the output
//! interleaving follows arrival, not source order. Readers are registered on a
//! [`TaskTracker`], which is the join counter: a single closer task waits for
//! the tracker to drain and only then drops the last output sender.

use flume::Receiver;
use tokio_util::task::TaskTracker;
use tracing::{debug, trace};

use super::Spawn;

/// Merge `sources` into one rendezvous output channel.
///
/// The output closes after every source is closed and fully drained. With no
/// sources it is closed immediately. Sources already closed on entry count as
/// drained.
pub fn merge<T, S, I>(spawner: &S, sources: I) -> Receiver<T>
where
    T: Send + 'static,
    S: Spawn,
    I: IntoIterator<Item = Receiver<T>>,
{
    merge_bounded(spawner, sources, 0)
}

/// Like [`merge`], with an output buffer of `capacity` values.
pub fn merge_bounded<T, S, I>(spawner: &S, sources: I, capacity: usize) -> Receiver<T>
where
    T: Send + 'static,
    S: Spawn,
    I: IntoIterator<Item = Receiver<T>>,
{
    let (out_tx, out_rx) = flume::bounded(capacity);
    let readers = TaskTracker::new();
    let mut lanes = 0usize;

    for (lane, source) in sources.into_iter().enumerate() {
        lanes += 1;
        let out = out_tx.clone();
        spawner.spawn(readers.track_future(async move {
            while let Ok(value) = source.recv_async().await {
                if out.send_async(value).await.is_err() {
                    trace!(lane = lane, "Merged output dropped, reader exiting");
                    return;
                }
            }
            trace!(lane = lane, "Source drained");
        }));
    }
    readers.close();

    spawner.spawn(async move {
        readers.wait().await;
        drop(out_tx);
        debug!(lanes = lanes, "Fan-in complete, output closed");
    });

    out_rx
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runtime::TokioSpawner;

    async fn drain<T>(rx: Receiver<T>) -> Vec<T> {
        let mut values = Vec::new();
        while let Ok(v) = rx.recv_async().await {
            values.push(v);
        }
        values
    }

    #[tokio::test]
    async fn test_merge_no_sources_closes_immediately() {
        let out = merge::<u32, _, _>(&TokioSpawner::current(), Vec::new());
        assert!(out.recv_async().await.is_err());
    }

    #[tokio::test]
    async fn test_merge_closed_source_counts_as_drained() {
        let (tx, rx) = flume::unbounded::<u32>();
        tx.send(5).unwrap();
        drop(tx);
        let (closed_tx, closed_rx) = flume::unbounded::<u32>();
        drop(closed_tx);

        let out = merge(&TokioSpawner::current(), vec![rx, closed_rx]);
        assert_eq!(drain(out).await, vec![5]);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_merge_every_value_once() {
        let spawner = TokioSpawner::current();
        let sources: Vec<_> = (0..4u32)
            .map(|lane| {
                let (tx, rx) = flume::bounded(1);
                tokio::spawn(async move {
                    for i in 0..25 {
                        tx.send_async(lane * 100 + i).await.unwrap();
                    }
                });
                rx
            })
            .collect();

        let mut values = drain(merge_bounded(&spawner, sources, 8)).await;
        values.sort_unstable();
        let mut expected: Vec<u32> = (0..4)
            .flat_map(|l| (0..25).map(move |i| l * 100 + i))
            .collect();
        expected.sort_unstable();
        assert_eq!(values, expected);
    }
}
