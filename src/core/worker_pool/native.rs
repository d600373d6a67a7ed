//! Native implementation of `WorkerPool` using OS threads.
//!
//! Each worker is a dedicated OS thread with its own single-threaded tokio
//! runtime, so CPU-heavy processors never block a caller's async runtime.
//!
//! # Design Principles
//!
//! - **No polling**: workers block on channel recv
//! - **Single closer**: only the supervisor drops the result sender it owns,
//!   and only after joining every worker
//! - **Clean shutdown**: closing the task channel unblocks workers naturally

use std::marker::PhantomData;
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use flume::{Receiver, Sender};
use tokio::runtime::Runtime;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::config::WorkerPoolConfig;
use crate::core::executor::TaskProcessor;
use crate::core::{PoolError, Task, TaskMeta, TaskResult};

use super::{PoolCounters, PoolStats};

/// Worker pool with dedicated OS threads.
///
/// The pool itself is a reusable template: each call to [`run`](Self::run)
/// starts `worker_count` fresh workers against the supplied channels.
///
/// # Panics in processors
///
/// A panic inside the processor is not caught. It kills the worker thread
/// that ran it, and the task it was holding is lost. The remaining workers
/// keep draining, the result channel is still closed once they exit, and
/// [`PoolHandle::join`] reports [`PoolError::WorkerPanicked`].
pub struct WorkerPool<P, R, E>
where
    P: Send + 'static,
    R: Send + 'static,
    E: TaskProcessor<P, R>,
{
    /// Pool configuration.
    config: WorkerPoolConfig,

    /// Caller-supplied processing function.
    processor: E,

    /// Pool statistics counters (lock-free atomics), shared across runs.
    counters: Arc<PoolCounters>,

    _marker: PhantomData<fn(P) -> R>,
}

impl<P, R, E> WorkerPool<P, R, E>
where
    P: Send + 'static,
    R: Send + 'static,
    E: TaskProcessor<P, R>,
{
    /// Create a new worker pool with the given configuration and processor.
    ///
    /// No threads are started until [`run`](Self::run).
    ///
    /// # Errors
    ///
    /// Returns `PoolError::InvalidConfig` if the configuration is invalid.
    pub fn new(config: WorkerPoolConfig, processor: E) -> Result<Self, PoolError> {
        config.validate().map_err(PoolError::InvalidConfig)?;

        Ok(Self {
            config,
            processor,
            counters: Arc::new(PoolCounters::default()),
            _marker: PhantomData,
        })
    }

    /// Pool configuration.
    #[must_use]
    pub const fn config(&self) -> &WorkerPoolConfig {
        &self.config
    }

    /// Create a bounded channel sized by `queue_capacity`.
    #[must_use]
    pub fn channel<T>(&self) -> (Sender<T>, Receiver<T>) {
        flume::bounded(self.config.queue_capacity)
    }

    /// Start the workers against `tasks`, publishing to `results`.
    ///
    /// Pass ownership of the result sender: the channel closes when the
    /// supervisor drops it after every worker exited. Any clone the caller
    /// keeps holds the channel open.
    ///
    /// # Errors
    ///
    /// Returns `PoolError::Spawn` if a worker runtime or thread cannot be
    /// created. Workers already started are cancelled.
    pub fn run(
        &self,
        tasks: Receiver<Task<P>>,
        results: Sender<TaskResult<R>>,
    ) -> Result<PoolHandle, PoolError> {
        self.run_with_cancel(tasks, results, CancellationToken::new())
    }

    /// Like [`run`](Self::run), with an external cancellation signal.
    ///
    /// After `cancel` fires, workers stop pulling new tasks; a task already
    /// inside the processor finishes and its result is still delivered. The
    /// pool only ever cancels a child of `cancel`, never `cancel` itself.
    ///
    /// # Errors
    ///
    /// Returns `PoolError::Spawn` if a worker runtime or thread cannot be
    /// created. Workers already started are cancelled.
    pub fn run_with_cancel(
        &self,
        tasks: Receiver<Task<P>>,
        results: Sender<TaskResult<R>>,
        cancel: CancellationToken,
    ) -> Result<PoolHandle, PoolError> {
        let cancel = cancel.child_token();
        let worker_count = self.config.worker_count;
        let mut workers = Vec::with_capacity(worker_count);

        for worker_id in 0..worker_count {
            let spawned = spawn_worker(
                worker_id,
                &self.config,
                tasks.clone(),
                results.clone(),
                Arc::clone(&self.counters),
                self.processor.clone(),
                cancel.clone(),
            );
            match spawned {
                Ok(handle) => workers.push(handle),
                Err(err) => {
                    cancel.cancel();
                    return Err(err);
                }
            }
        }
        drop(tasks);

        let supervisor = thread::Builder::new()
            .name(format!("{}-supervisor", self.config.thread_name_prefix))
            .spawn(move || supervise(workers, results))
            .map_err(|e| {
                cancel.cancel();
                PoolError::Spawn {
                    worker_id: worker_count,
                    reason: e.to_string(),
                }
            })?;

        info!(worker_count = worker_count, "WorkerPool started");

        Ok(PoolHandle {
            supervisor,
            cancel,
            counters: Arc::clone(&self.counters),
            worker_count,
        })
    }

    /// Process every payload and collect all results (blocking API).
    ///
    /// Payloads get sequential ids starting at zero. Result order follows
    /// completion, not submission. Call from synchronous code, or through
    /// `spawn_blocking` inside an async runtime.
    ///
    /// # Errors
    ///
    /// Returns `PoolError::Spawn` if the workers cannot start and
    /// `PoolError::WorkerPanicked` if a processor panicked.
    pub fn process_all<I>(&self, payloads: I) -> Result<Vec<TaskResult<R>>, PoolError>
    where
        I: IntoIterator<Item = P>,
    {
        let (task_tx, task_rx) = flume::unbounded();
        for (id, payload) in (0u64..).zip(payloads) {
            // The receiver is alive in this scope, so the send cannot fail.
            let _ = task_tx.send(Task::new(id, payload));
        }
        drop(task_tx);

        let (result_tx, result_rx) = self.channel();
        let handle = self.run(task_rx, result_tx)?;
        let collected: Vec<_> = result_rx.iter().collect();
        handle.join()?;
        Ok(collected)
    }

    /// Get current pool statistics.
    #[must_use]
    pub fn stats(&self) -> PoolStats {
        self.counters.snapshot(self.config.worker_count)
    }
}

/// Handle to one running instance of the pool.
pub struct PoolHandle {
    supervisor: JoinHandle<Option<usize>>,
    cancel: CancellationToken,
    counters: Arc<PoolCounters>,
    worker_count: usize,
}

impl PoolHandle {
    /// Ask workers to stop pulling new tasks.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    /// Whether every worker and the supervisor have exited.
    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.supervisor.is_finished()
    }

    /// Snapshot of the pool counters.
    #[must_use]
    pub fn stats(&self) -> PoolStats {
        self.counters.snapshot(self.worker_count)
    }

    /// Block until every worker has exited and the result channel is closed.
    ///
    /// # Errors
    ///
    /// Returns `PoolError::WorkerPanicked` if any processor panicked.
    pub fn join(self) -> Result<PoolStats, PoolError> {
        let stats_source = Arc::clone(&self.counters);
        match self.supervisor.join() {
            Ok(None) => Ok(stats_source.snapshot(self.worker_count)),
            Ok(Some(worker_id)) => Err(PoolError::WorkerPanicked { worker_id }),
            Err(_) => Err(PoolError::Supervisor),
        }
    }

    /// Async variant of [`join`](Self::join), waiting on tokio's blocking pool.
    ///
    /// # Errors
    ///
    /// Same as [`join`](Self::join).
    pub async fn join_async(self) -> Result<PoolStats, PoolError> {
        tokio::task::spawn_blocking(move || self.join())
            .await
            .unwrap_or(Err(PoolError::Supervisor))
    }
}

/// Join every worker, then drop the designated result sender.
///
/// Returns the id of the first worker observed to have panicked.
fn supervise<R>(workers: Vec<JoinHandle<()>>, results: Sender<TaskResult<R>>) -> Option<usize> {
    let worker_count = workers.len();
    let mut panicked = None;

    for (worker_id, worker) in workers.into_iter().enumerate() {
        if worker.join().is_ok() {
            debug!(worker_id = worker_id, "Worker joined");
        } else {
            warn!(worker_id = worker_id, "Worker panicked");
            panicked.get_or_insert(worker_id);
        }
    }

    drop(results);
    info!(worker_count = worker_count, "All workers exited, result channel closed");
    panicked
}

/// Spawn a worker thread.
fn spawn_worker<P, R, E>(
    worker_id: usize,
    config: &WorkerPoolConfig,
    tasks: Receiver<Task<P>>,
    results: Sender<TaskResult<R>>,
    counters: Arc<PoolCounters>,
    processor: E,
    cancel: CancellationToken,
) -> Result<JoinHandle<()>, PoolError>
where
    P: Send + 'static,
    R: Send + 'static,
    E: TaskProcessor<P, R>,
{
    let spawn_err = |reason: String| PoolError::Spawn { worker_id, reason };
    let (ready_tx, ready_rx) = flume::bounded::<Result<(), String>>(1);

    // The runtime lives and dies on the worker thread, never on the caller's.
    let handle = thread::Builder::new()
        .name(format!("{}-{worker_id}", config.thread_name_prefix))
        .stack_size(config.thread_stack_size)
        .spawn(move || {
            let built = tokio::runtime::Builder::new_current_thread()
                .enable_all()
                .build();
            let rt = match built {
                Ok(rt) => rt,
                Err(e) => {
                    let _ = ready_tx.send(Err(e.to_string()));
                    return;
                }
            };
            let _ = ready_tx.send(Ok(()));
            debug!(worker_id = worker_id, "Worker thread started");
            worker_loop(worker_id, &rt, &tasks, &results, &counters, &processor, &cancel);
            debug!(worker_id = worker_id, "Worker thread exiting");
        })
        .map_err(|e| spawn_err(e.to_string()))?;

    match ready_rx.recv() {
        Ok(Ok(())) => Ok(handle),
        Ok(Err(reason)) => {
            let _ = handle.join();
            Err(spawn_err(reason))
        }
        Err(_) => {
            let _ = handle.join();
            Err(spawn_err("worker thread exited before starting".into()))
        }
    }
}

fn worker_loop<P, R, E>(
    worker_id: usize,
    rt: &Runtime,
    tasks: &Receiver<Task<P>>,
    results: &Sender<TaskResult<R>>,
    counters: &PoolCounters,
    processor: &E,
    cancel: &CancellationToken,
) where
    P: Send + 'static,
    R: Send + 'static,
    E: TaskProcessor<P, R>,
{
    rt.block_on(async {
        loop {
            let task = tokio::select! {
                biased;
                () = cancel.cancelled() => {
                    debug!(worker_id = worker_id, "Worker cancelled, exiting");
                    break;
                }
                next = tasks.recv_async() => match next {
                    Ok(task) => task,
                    Err(_) => {
                        debug!(worker_id = worker_id, "Task channel closed, exiting");
                        break;
                    }
                },
            };

            counters.record_start();
            let meta = TaskMeta { id: task.id, worker_id };
            debug!(worker_id = worker_id, task_id = task.id, "Worker executing task");

            let outcome = processor.process(task.payload, meta).await;
            counters.record_finish(outcome.is_ok());

            let result = TaskResult {
                id: meta.id,
                worker_id,
                outcome,
            };
            if results.send_async(result).await.is_err() {
                warn!(worker_id = worker_id, "Result receiver dropped, exiting");
                break;
            }
        }
    });
}
