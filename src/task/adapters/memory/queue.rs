//! In-memory work queue shared by the worker pool.
//!
//! ## Limitations
//!
//! - Single-process only: identifiers are not visible across processes.
//! - No deduplication: an identifier submitted twice is delivered twice.
//! - Delayed entries live in detached tokio tasks and are lost if the
//!   runtime shuts down first.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::Notify;

use crate::task::{
    domain::TaskId,
    ports::{WorkQueue, WorkQueueError, WorkQueueResult},
};

#[derive(Debug, Default)]
struct QueueState {
    ready: VecDeque<TaskId>,
    delayed: usize,
    closed: bool,
}

#[derive(Debug, Default)]
struct QueueInner {
    state: Mutex<QueueState>,
    notify: Notify,
}

impl QueueInner {
    fn lock(&self) -> MutexGuard<'_, QueueState> {
        // Each critical section is a single field update.
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn push(&self, task_id: TaskId) {
        self.lock().ready.push_back(task_id);
        self.notify.notify_waiters();
    }
}

/// FIFO work queue backed by a [`VecDeque`] and a [`Notify`].
///
/// Cloning yields another handle to the same queue.
#[derive(Debug, Clone, Default)]
pub struct InMemoryWorkQueue {
    inner: Arc<QueueInner>,
}

impl InMemoryWorkQueue {
    /// Creates an empty, open queue.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns how many identifiers are ready for dispatch.
    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.lock().ready.len()
    }

    /// Returns `true` when no identifier is ready for dispatch.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns how many delayed submissions have not yet become ready.
    #[must_use]
    pub fn delayed(&self) -> usize {
        self.inner.lock().delayed
    }

    fn ensure_open(&self, task_id: TaskId) -> WorkQueueResult<()> {
        if self.inner.lock().closed {
            return Err(WorkQueueError::Closed(task_id));
        }
        Ok(())
    }
}

#[async_trait]
impl WorkQueue for InMemoryWorkQueue {
    async fn submit(&self, task_id: TaskId) -> WorkQueueResult<()> {
        self.ensure_open(task_id)?;
        self.inner.push(task_id);
        Ok(())
    }

    async fn submit_after(&self, task_id: TaskId, delay: Duration) -> WorkQueueResult<()> {
        if delay.is_zero() {
            return self.submit(task_id).await;
        }
        {
            let mut state = self.inner.lock();
            if state.closed {
                return Err(WorkQueueError::Closed(task_id));
            }
            state.delayed += 1;
        }

        let inner = Arc::clone(&self.inner);
        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            {
                let mut state = inner.lock();
                state.delayed = state.delayed.saturating_sub(1);
                state.ready.push_back(task_id);
            }
            inner.notify.notify_waiters();
        });
        Ok(())
    }

    async fn dequeue(&self) -> Option<TaskId> {
        loop {
            let notified = self.inner.notify.notified();
            tokio::pin!(notified);
            notified.as_mut().enable();

            {
                let mut state = self.inner.lock();
                if let Some(task_id) = state.ready.pop_front() {
                    return Some(task_id);
                }
                if state.closed && state.delayed == 0 {
                    return None;
                }
            }

            notified.await;
        }
    }

    fn close(&self) {
        self.inner.lock().closed = true;
        self.inner.notify.notify_waiters();
    }
}
