//! Job dispatcher: drives one task through the analysis state machine.

use super::DispatchPolicy;
use crate::analysis::{
    domain::{AnalysisReport, NormalizedImage},
    services::{AnalysisError, AnalysisPipeline, ImageNormalizer, NormalizeError},
};
use crate::task::{
    domain::{ImageRef, Task, TaskDomainError, TaskFailure, TaskFailureKind, TaskId, TaskStatus},
    ports::{ImageStore, ImageStoreError, TaskRepository, TaskRepositoryError},
};
use chrono::TimeDelta;
use mockable::Clock;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info, warn};

/// Why a dequeued task was acknowledged without work.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// The task already reached a terminal status.
    AlreadyTerminal,
    /// Another worker holds a live processing lease.
    LeaseHeld,
}

/// Result of one dispatch call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchOutcome {
    /// Results were committed.
    Completed,
    /// A permanent failure was committed.
    Failed,
    /// The task went back to `pending` and must be re-enqueued.
    RetryScheduled {
        /// Backoff before the next attempt.
        delay: Duration,
    },
    /// Nothing was written.
    Skipped(SkipReason),
    /// No task row exists for the identifier.
    NotFound,
}

/// Infrastructure failures during dispatch.
///
/// The task row is left as last committed; redelivering the identifier
/// resumes it.
#[derive(Debug, Error)]
pub enum DispatchError {
    /// Domain transition was rejected.
    #[error(transparent)]
    Domain(#[from] TaskDomainError),
    /// Task store operation failed.
    #[error(transparent)]
    Repository(#[from] TaskRepositoryError),
    /// Image store operation failed.
    #[error(transparent)]
    ImageStore(#[from] ImageStoreError),
}

/// Result type for dispatch operations.
pub type DispatchResult<T> = Result<T, DispatchError>;

/// Runs the normalizer and analysis pipeline for dequeued tasks and commits
/// every transition.
#[derive(Clone)]
pub struct TaskDispatcher<R, S, C>
where
    R: TaskRepository,
    S: ImageStore,
    C: Clock + Send + Sync,
{
    repository: Arc<R>,
    images: Arc<S>,
    pipeline: Arc<AnalysisPipeline>,
    normalizer: ImageNormalizer,
    policy: DispatchPolicy,
    clock: Arc<C>,
}

impl<R, S, C> TaskDispatcher<R, S, C>
where
    R: TaskRepository,
    S: ImageStore,
    C: Clock + Send + Sync,
{
    /// Creates a dispatcher.
    #[must_use]
    pub const fn new(
        repository: Arc<R>,
        images: Arc<S>,
        pipeline: Arc<AnalysisPipeline>,
        normalizer: ImageNormalizer,
        policy: DispatchPolicy,
        clock: Arc<C>,
    ) -> Self {
        Self {
            repository,
            images,
            pipeline,
            normalizer,
            policy,
            clock,
        }
    }

    /// Returns the dispatch policy.
    #[must_use]
    pub const fn policy(&self) -> DispatchPolicy {
        self.policy
    }

    /// Dispatches one task.
    ///
    /// # Errors
    ///
    /// Returns [`DispatchError`] when a store operation fails. Pipeline
    /// failures never surface here; they are committed on the task.
    pub async fn dispatch(&self, task_id: TaskId) -> DispatchResult<DispatchOutcome> {
        let Some(task) = self.repository.load(task_id).await? else {
            warn!(task_id = %task_id, "dequeued task has no stored row");
            return Ok(DispatchOutcome::NotFound);
        };

        match self.run(task).await {
            Err(DispatchError::Repository(TaskRepositoryError::TerminalState { status, .. })) => {
                info!(task_id = %task_id, %status, "task finished elsewhere, dropping stale work");
                Ok(DispatchOutcome::Skipped(SkipReason::AlreadyTerminal))
            }
            other => other,
        }
    }

    async fn run(&self, mut task: Task) -> DispatchResult<DispatchOutcome> {
        let task_id = task.id();
        match task.status() {
            TaskStatus::Completed | TaskStatus::Failed => {
                debug!(task_id = %task_id, status = %task.status(), "task already terminal");
                return Ok(DispatchOutcome::Skipped(SkipReason::AlreadyTerminal));
            }
            TaskStatus::Processing if self.lease_held(&task) => {
                debug!(task_id = %task_id, "task is processing under a live lease");
                return Ok(DispatchOutcome::Skipped(SkipReason::LeaseHeld));
            }
            TaskStatus::Processing => {
                warn!(task_id = %task_id, attempts = task.attempts(), "reclaiming task with expired lease");
            }
            TaskStatus::Pending => {}
        }

        let normalized = match self.load_source(&task).await? {
            Ok(normalized) => normalized,
            Err((kind, message)) => return self.commit_failure(task, kind, message).await,
        };

        let processed_ref = ImageRef::processed_for(task_id);
        self.images
            .write(&processed_ref, normalized.encoded())
            .await?;
        task.start_attempt(normalized.metadata(), &*self.clock)?;
        self.repository.commit(&task).await?;
        info!(task_id = %task_id, attempt = task.attempts(), "task processing");

        match self.analyze(normalized).await {
            Ok(report) => {
                info!(
                    task_id = %task_id,
                    health_score = report.health_score(),
                    findings = report.findings().len(),
                    "analysis completed"
                );
                task.complete(report, processed_ref, &*self.clock)?;
                self.repository.commit(&task).await?;
                Ok(DispatchOutcome::Completed)
            }
            Err(err) => self.handle_analysis_error(task, &err).await,
        }
    }

    fn lease_held(&self, task: &Task) -> bool {
        let lease = TimeDelta::from_std(self.policy.processing_lease).unwrap_or(TimeDelta::MAX);
        self.clock.utc().signed_duration_since(task.updated_at()) < lease
    }

    /// Reads and normalizes the source image.
    ///
    /// The inner `Err` carries a fatal input failure to commit on the task.
    async fn load_source(
        &self,
        task: &Task,
    ) -> DispatchResult<Result<NormalizedImage, (TaskFailureKind, String)>> {
        let raw = match self.images.read(task.original_image_ref()).await {
            Ok(raw) => raw,
            Err(err) => {
                warn!(task_id = %task.id(), error = %err, "source image unavailable");
                return Ok(Err((TaskFailureKind::SourceMissing, err.to_string())));
            }
        };

        let normalizer = self.normalizer;
        let normalized = tokio::task::spawn_blocking(move || normalizer.normalize(&raw)).await;
        Ok(match normalized {
            Ok(Ok(normalized)) => Ok(normalized),
            Ok(Err(err @ NormalizeError::Decode(_))) => {
                Err((TaskFailureKind::InputDecode, err.to_string()))
            }
            Ok(Err(err)) => Err((TaskFailureKind::Internal, err.to_string())),
            Err(join_err) => Err((TaskFailureKind::Internal, join_err.to_string())),
        })
    }

    async fn analyze(&self, image: NormalizedImage) -> Result<AnalysisReport, AnalysisError> {
        let pipeline = Arc::clone(&self.pipeline);
        tokio::task::spawn_blocking(move || pipeline.analyze(&image))
            .await
            .unwrap_or_else(|join_err| Err(AnalysisError::Segmentation(join_err.to_string())))
    }

    async fn handle_analysis_error(
        &self,
        mut task: Task,
        err: &AnalysisError,
    ) -> DispatchResult<DispatchOutcome> {
        let task_id = task.id();
        let attempts = task.attempts();
        if !err.is_retryable() {
            let kind = match err {
                AnalysisError::ModelUnavailable(_) => TaskFailureKind::ModelUnavailable,
                AnalysisError::TransientBackend(_) | AnalysisError::Segmentation(_) => {
                    TaskFailureKind::Internal
                }
            };
            return self.commit_failure(task, kind, err.to_string()).await;
        }

        if !self.policy.retry.allows_retry(attempts) {
            warn!(task_id = %task_id, attempts, error = %err, "retry budget exhausted");
            return self
                .commit_failure(task, TaskFailureKind::TransientBackend, err.to_string())
                .await;
        }

        let delay = self.policy.retry.backoff(attempts);
        task.schedule_retry(&*self.clock)?;
        self.repository.commit(&task).await?;
        warn!(
            task_id = %task_id,
            attempt = attempts,
            delay_secs = delay.as_secs(),
            error = %err,
            "transient backend failure, retry scheduled"
        );
        Ok(DispatchOutcome::RetryScheduled { delay })
    }

    async fn commit_failure(
        &self,
        mut task: Task,
        kind: TaskFailureKind,
        message: String,
    ) -> DispatchResult<DispatchOutcome> {
        let failure = TaskFailure::new(kind, message, task.attempts());
        warn!(task_id = %task.id(), kind = %kind, attempts = task.attempts(), "task failed");
        task.fail(failure, &*self.clock)?;
        self.repository.commit(&task).await?;
        Ok(DispatchOutcome::Failed)
    }
}
