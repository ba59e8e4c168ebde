//! Worker pool running dispatcher loops over a shared work queue.
//!
//! Each worker dequeues one task identifier at a time and dispatches it.
//! Scheduled retries and identifiers whose dispatch hit a store error go
//! back on the queue; everything else is acknowledged by dropping it.

use crate::task::{
    ports::{ImageStore, TaskRepository, WorkQueue},
    services::{DispatchOutcome, TaskDispatcher},
};
use mockable::Clock;
use std::ops::AddAssign;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

/// Default number of workers.
pub const DEFAULT_WORKER_COUNT: usize = 2;

/// Per-worker outcome counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WorkerStats {
    /// Tasks committed as completed.
    pub completed: usize,
    /// Tasks committed as failed.
    pub failed: usize,
    /// Retries scheduled.
    pub retried: usize,
    /// Deliveries acknowledged without work.
    pub skipped: usize,
    /// Dispatch calls that returned an infrastructure error.
    pub errors: usize,
}

impl AddAssign for WorkerStats {
    fn add_assign(&mut self, other: Self) {
        self.completed += other.completed;
        self.failed += other.failed;
        self.retried += other.retried;
        self.skipped += other.skipped;
        self.errors += other.errors;
    }
}

/// Errors returned when joining the pool.
#[derive(Debug, Error)]
pub enum WorkerPoolError {
    /// A worker task panicked or was cancelled.
    #[error("worker task failed: {0}")]
    Join(#[from] tokio::task::JoinError),
}

/// A fixed set of tokio tasks sharing one queue and one dispatcher.
#[derive(Debug)]
pub struct WorkerPool {
    handles: Vec<JoinHandle<WorkerStats>>,
    shutdown: watch::Sender<bool>,
}

impl WorkerPool {
    /// Spawns `count` workers on the current runtime.
    ///
    /// A count of zero is raised to one.
    #[must_use]
    pub fn spawn<R, S, C, Q>(
        count: usize,
        dispatcher: Arc<TaskDispatcher<R, S, C>>,
        queue: Arc<Q>,
    ) -> Self
    where
        R: TaskRepository + 'static,
        S: ImageStore + 'static,
        C: Clock + Send + Sync + 'static,
        Q: WorkQueue + 'static,
    {
        let (shutdown, signal) = watch::channel(false);
        let handles = (0..count.max(1))
            .map(|worker| {
                let dispatcher = Arc::clone(&dispatcher);
                let queue = Arc::clone(&queue);
                let signal = signal.clone();
                tokio::spawn(run_worker(worker, dispatcher, queue, signal))
            })
            .collect();
        info!(workers = count.max(1), "worker pool started");
        Self { handles, shutdown }
    }

    /// Returns how many workers were spawned.
    #[must_use]
    pub fn len(&self) -> usize {
        self.handles.len()
    }

    /// Returns `true` when the pool has no workers.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.handles.is_empty()
    }

    /// Asks every worker to stop after its current dispatch.
    pub fn shutdown(&self) {
        self.shutdown.send_replace(true);
    }

    /// Waits for every worker to stop and sums their counters.
    ///
    /// Workers stop once the queue is closed and drained, or after
    /// [`WorkerPool::shutdown`].
    ///
    /// # Errors
    ///
    /// Returns [`WorkerPoolError::Join`] if a worker panicked.
    pub async fn join(self) -> Result<WorkerStats, WorkerPoolError> {
        let mut total = WorkerStats::default();
        for handle in self.handles {
            total += handle.await?;
        }
        drop(self.shutdown);
        info!(
            completed = total.completed,
            failed = total.failed,
            retried = total.retried,
            "worker pool stopped"
        );
        Ok(total)
    }
}

async fn run_worker<R, S, C, Q>(
    worker: usize,
    dispatcher: Arc<TaskDispatcher<R, S, C>>,
    queue: Arc<Q>,
    mut signal: watch::Receiver<bool>,
) -> WorkerStats
where
    R: TaskRepository,
    S: ImageStore,
    C: Clock + Send + Sync,
    Q: WorkQueue,
{
    let mut stats = WorkerStats::default();
    loop {
        let next = tokio::select! {
            biased;
            _ = signal.wait_for(|stop| *stop) => None,
            task_id = queue.dequeue() => task_id,
        };
        let Some(task_id) = next else {
            break;
        };

        match dispatcher.dispatch(task_id).await {
            Ok(DispatchOutcome::Completed) => stats.completed += 1,
            Ok(DispatchOutcome::Failed) => stats.failed += 1,
            Ok(DispatchOutcome::RetryScheduled { delay }) => {
                stats.retried += 1;
                if let Err(err) = queue.submit_after(task_id, delay).await {
                    error!(worker, task_id = %task_id, error = %err, "could not re-enqueue retry");
                }
            }
            Ok(DispatchOutcome::Skipped(reason)) => {
                stats.skipped += 1;
                debug!(worker, task_id = %task_id, ?reason, "delivery skipped");
            }
            Ok(DispatchOutcome::NotFound) => stats.skipped += 1,
            Err(err) => {
                stats.errors += 1;
                let delay = dispatcher.policy().retry.base_delay;
                warn!(
                    worker,
                    task_id = %task_id,
                    delay_secs = delay.as_secs(),
                    error = %err,
                    "dispatch failed, redelivering"
                );
                if let Err(err) = queue.submit_after(task_id, delay).await {
                    error!(worker, task_id = %task_id, error = %err, "could not redeliver task");
                }
            }
        }
    }
    debug!(worker, "worker stopped");
    stats
}
