//! Fan-out: route one task stream round-robin across N lanes.

use flume::{Receiver, Sender};
use tracing::{debug, warn};

use super::fan_in::merge;
use super::{FanError, Spawn, Task, TaskMeta, TaskProcessor, TaskResult};

/// Split `source` into `lanes` rendezvous channels.
///
/// Item `i` goes to lane `i % lanes`. One distributor task owns every lane
/// sender and drops them all once `source` is exhausted, which is what lets
/// lane consumers terminate.
///
/// Every lane must be consumed. If any lane receiver is dropped, the
/// distributor stops at the first item routed to it and closes all lanes;
/// that item and whatever remains in `source` are not delivered.
///
/// # Errors
///
/// Returns `FanError::NoLanes` when `lanes` is zero.
pub fn fan_out<T, S>(
    spawner: &S,
    source: Receiver<T>,
    lanes: usize,
) -> Result<Vec<Receiver<T>>, FanError>
where
    T: Send + 'static,
    S: Spawn,
{
    fan_out_bounded(spawner, source, lanes, 0)
}

/// Like [`fan_out`], with `capacity` buffered items per lane.
///
/// # Errors
///
/// Returns `FanError::NoLanes` when `lanes` is zero.
pub fn fan_out_bounded<T, S>(
    spawner: &S,
    source: Receiver<T>,
    lanes: usize,
    capacity: usize,
) -> Result<Vec<Receiver<T>>, FanError>
where
    T: Send + 'static,
    S: Spawn,
{
    if lanes == 0 {
        return Err(FanError::NoLanes);
    }

    let (senders, receivers): (Vec<Sender<T>>, Vec<Receiver<T>>) =
        (0..lanes).map(|_| flume::bounded(capacity)).unzip();

    spawner.spawn(async move {
        let mut routed = 0usize;
        while let Ok(item) = source.recv_async().await {
            let lane = routed % senders.len();
            if senders[lane].send_async(item).await.is_err() {
                warn!(lane = lane, routed = routed, "Lane receiver dropped, closing every lane");
                break;
            }
            routed += 1;
        }
        drop(senders);
        debug!(lanes = lanes, routed = routed, "Fan-out complete, lanes closed");
    });

    Ok(receivers)
}

/// Fan tasks out to one worker per lane and merge their results back.
///
/// Worker `k` owns lane `k`, so a task's `worker_id` equals its lane index.
/// The returned channel closes after every lane worker has exited.
///
/// # Errors
///
/// Returns `FanError::NoLanes` when `lanes` is zero.
pub fn fan_out_workers<P, R, E, S>(
    spawner: &S,
    source: Receiver<Task<P>>,
    lanes: usize,
    processor: E,
) -> Result<Receiver<TaskResult<R>>, FanError>
where
    P: Send + 'static,
    R: Send + 'static,
    E: TaskProcessor<P, R>,
    S: Spawn,
{
    let lane_inputs = fan_out(spawner, source, lanes)?;

    let lane_outputs: Vec<Receiver<TaskResult<R>>> = lane_inputs
        .into_iter()
        .enumerate()
        .map(|(worker_id, input)| {
            let (tx, rx) = flume::bounded(0);
            let processor = processor.clone();
            spawner.spawn(async move {
                while let Ok(task) = input.recv_async().await {
                    let meta = TaskMeta { id: task.id, worker_id };
                    let outcome = processor.process(task.payload, meta).await;
                    let result = TaskResult {
                        id: meta.id,
                        worker_id,
                        outcome,
                    };
                    if tx.send_async(result).await.is_err() {
                        break;
                    }
                }
                debug!(worker_id = worker_id, "Lane worker exiting");
            });
            rx
        })
        .collect();

    Ok(merge(spawner, lane_outputs))
}
