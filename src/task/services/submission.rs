//! Ingestion and status polling for analysis tasks.

use crate::task::{
    domain::{ImageRef, OwnerRef, Task, TaskDomainError, TaskId, TaskReport},
    ports::{TaskRepository, TaskRepositoryError, WorkQueue, WorkQueueError},
};
use mockable::Clock;
use std::sync::Arc;
use thiserror::Error;
use tracing::info;

/// Request payload for submitting an uploaded image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmitTaskRequest {
    owner: String,
    original_image_ref: String,
}

impl SubmitTaskRequest {
    /// Creates a request for an image already stored under
    /// `original_image_ref`.
    #[must_use]
    pub fn new(owner: impl Into<String>, original_image_ref: impl Into<String>) -> Self {
        Self {
            owner: owner.into(),
            original_image_ref: original_image_ref.into(),
        }
    }
}

/// Service-level errors for submission and polling.
#[derive(Debug, Error)]
pub enum TaskSubmissionError {
    /// Domain validation failed.
    #[error(transparent)]
    Domain(#[from] TaskDomainError),
    /// Repository operation failed.
    #[error(transparent)]
    Repository(#[from] TaskRepositoryError),
    /// The task row was stored but could not be enqueued.
    #[error(transparent)]
    Queue(#[from] WorkQueueError),
}

/// Result type for submission service operations.
pub type TaskSubmissionResult<T> = Result<T, TaskSubmissionError>;

/// Creates `pending` tasks, enqueues them and serves status views.
#[derive(Clone)]
pub struct TaskSubmissionService<R, Q, C>
where
    R: TaskRepository,
    Q: WorkQueue,
    C: Clock + Send + Sync,
{
    repository: Arc<R>,
    queue: Arc<Q>,
    clock: Arc<C>,
}

impl<R, Q, C> TaskSubmissionService<R, Q, C>
where
    R: TaskRepository,
    Q: WorkQueue,
    C: Clock + Send + Sync,
{
    /// Creates a submission service.
    #[must_use]
    pub const fn new(repository: Arc<R>, queue: Arc<Q>, clock: Arc<C>) -> Self {
        Self {
            repository,
            queue,
            clock,
        }
    }

    /// Stores a `pending` task and enqueues it for dispatch.
    ///
    /// # Errors
    ///
    /// Returns [`TaskSubmissionError`] when the owner or image reference is
    /// invalid, the repository rejects the row, or the queue is closed.
    pub async fn submit(&self, request: SubmitTaskRequest) -> TaskSubmissionResult<Task> {
        let owner = OwnerRef::new(request.owner)?;
        let original_image_ref = ImageRef::new(request.original_image_ref)?;
        let task = Task::new(owner, original_image_ref, &*self.clock);
        self.repository.insert(&task).await?;
        self.queue.submit(task.id()).await?;
        info!(task_id = %task.id(), owner = %task.owner(), "task submitted");
        Ok(task)
    }

    /// Returns the committed view of a task.
    ///
    /// # Errors
    ///
    /// Returns [`TaskSubmissionError::Repository`] when lookup fails.
    pub async fn status(&self, task_id: TaskId) -> TaskSubmissionResult<Option<TaskReport>> {
        let task = self.repository.load(task_id).await?;
        Ok(task.as_ref().map(TaskReport::from))
    }

    /// Returns views of every task submitted by `owner`, oldest first.
    ///
    /// # Errors
    ///
    /// Returns [`TaskSubmissionError`] when the owner is blank or lookup
    /// fails.
    pub async fn list_for_owner(&self, owner: &str) -> TaskSubmissionResult<Vec<TaskReport>> {
        let owner = OwnerRef::new(owner)?;
        let tasks = self.repository.find_by_owner(&owner).await?;
        Ok(tasks.iter().map(TaskReport::from).collect())
    }
}
