//! Work queue port carrying task identifiers to workers.
//!
//! Delivery is at-least-once: the dispatcher must tolerate seeing the same
//! identifier more than once.

use crate::task::domain::TaskId;
use async_trait::async_trait;
use std::time::Duration;
use thiserror::Error;

/// Result type for work queue operations.
pub type WorkQueueResult<T> = Result<T, WorkQueueError>;

/// Shared queue of task identifiers awaiting dispatch.
#[async_trait]
pub trait WorkQueue: Send + Sync {
    /// Enqueues a task for immediate dispatch.
    ///
    /// # Errors
    ///
    /// Returns [`WorkQueueError::Closed`] once the queue has been closed.
    async fn submit(&self, task_id: TaskId) -> WorkQueueResult<()>;

    /// Enqueues a task once `delay` has elapsed.
    ///
    /// The call returns immediately. A delayed entry still becomes visible
    /// after the queue is closed so scheduled retries are not lost.
    ///
    /// # Errors
    ///
    /// Returns [`WorkQueueError::Closed`] once the queue has been closed.
    async fn submit_after(&self, task_id: TaskId, delay: Duration) -> WorkQueueResult<()>;

    /// Waits for the next task identifier.
    ///
    /// Returns `None` once the queue is closed, empty and has no delayed
    /// entries outstanding.
    async fn dequeue(&self) -> Option<TaskId>;

    /// Stops accepting new submissions.
    fn close(&self);
}

/// Errors returned by work queue implementations.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum WorkQueueError {
    /// The queue no longer accepts submissions.
    #[error("work queue is closed; cannot submit task {0}")]
    Closed(TaskId),
}
