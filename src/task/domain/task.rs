//! Task aggregate root and the analysis job state machine.

use super::{ImageRef, OwnerRef, ParseTaskStatusError, TaskDomainError, TaskId};
use crate::analysis::domain::{AnalysisReport, Finding, ImageMetadata, TreeSpecies};
use chrono::{DateTime, Utc};
use mockable::Clock;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Task lifecycle status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    /// Waiting in the queue.
    Pending,
    /// A worker is running the pipeline.
    Processing,
    /// Analysis finished and results are committed.
    Completed,
    /// Analysis failed permanently.
    Failed,
}

impl TaskStatus {
    /// Every status, in lifecycle order.
    pub const ALL: [Self; 4] = [
        Self::Pending,
        Self::Processing,
        Self::Completed,
        Self::Failed,
    ];

    /// Returns the canonical storage representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Processing => "processing",
            Self::Completed => "completed",
            Self::Failed => "failed",
        }
    }

    /// Returns `true` for statuses no transition may leave.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Failed)
    }

    /// Returns `true` when the state machine permits moving to `target`.
    ///
    /// `Processing -> Processing` is the reclaim of a stale in-flight task
    /// and `Processing -> Pending` is a scheduled retry. `Pending -> Failed`
    /// covers inputs rejected before any inference ran.
    #[must_use]
    pub const fn can_transition_to(self, target: Self) -> bool {
        matches!(
            (self, target),
            (Self::Pending, Self::Processing | Self::Failed)
                | (
                    Self::Processing,
                    Self::Processing | Self::Completed | Self::Failed | Self::Pending
                )
        )
    }
}

impl TryFrom<&str> for TaskStatus {
    type Error = ParseTaskStatusError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        let normalized = value.trim().to_ascii_lowercase();
        match normalized.as_str() {
            "pending" => Ok(Self::Pending),
            "processing" => Ok(Self::Processing),
            "completed" => Ok(Self::Completed),
            "failed" => Ok(Self::Failed),
            _ => Err(ParseTaskStatusError(value.to_owned())),
        }
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Classification of a permanent task failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskFailureKind {
    /// The source bytes are not a decodable image.
    InputDecode,
    /// The source image is missing or unreadable.
    SourceMissing,
    /// The backend stayed unavailable through every retry.
    TransientBackend,
    /// The backend is misconfigured or cannot be loaded.
    ModelUnavailable,
    /// Any other failure inside the pipeline.
    Internal,
}

impl TaskFailureKind {
    /// Returns the canonical storage representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::InputDecode => "input_decode",
            Self::SourceMissing => "source_missing",
            Self::TransientBackend => "transient_backend",
            Self::ModelUnavailable => "model_unavailable",
            Self::Internal => "internal",
        }
    }
}

impl fmt::Display for TaskFailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Structured error payload stored on a failed task.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskFailure {
    /// Failure classification.
    pub kind: TaskFailureKind,
    /// Human-readable detail of the last error.
    pub message: String,
    /// Dispatch attempts started before the failure.
    pub attempts: u32,
}

impl TaskFailure {
    /// Creates a failure payload.
    #[must_use]
    pub fn new(kind: TaskFailureKind, message: impl Into<String>, attempts: u32) -> Self {
        Self {
            kind,
            message: message.into(),
            attempts,
        }
    }
}

/// Task aggregate root.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    id: TaskId,
    owner: OwnerRef,
    status: TaskStatus,
    original_image_ref: ImageRef,
    processed_image_ref: Option<ImageRef>,
    report: Option<AnalysisReport>,
    image_metadata: Option<ImageMetadata>,
    error: Option<TaskFailure>,
    attempts: u32,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl Task {
    /// Creates a pending task for an uploaded image.
    #[must_use]
    pub fn new(owner: OwnerRef, original_image_ref: ImageRef, clock: &impl Clock) -> Self {
        let timestamp = clock.utc();
        Self {
            id: TaskId::new(),
            owner,
            status: TaskStatus::Pending,
            original_image_ref,
            processed_image_ref: None,
            report: None,
            image_metadata: None,
            error: None,
            attempts: 0,
            created_at: timestamp,
            updated_at: timestamp,
        }
    }

    /// Returns the task identifier.
    #[must_use]
    pub const fn id(&self) -> TaskId {
        self.id
    }

    /// Returns the owner reference.
    #[must_use]
    pub const fn owner(&self) -> &OwnerRef {
        &self.owner
    }

    /// Returns the lifecycle status.
    #[must_use]
    pub const fn status(&self) -> TaskStatus {
        self.status
    }

    /// Returns the source image reference.
    #[must_use]
    pub const fn original_image_ref(&self) -> &ImageRef {
        &self.original_image_ref
    }

    /// Returns the processed image reference once completed.
    #[must_use]
    pub const fn processed_image_ref(&self) -> Option<&ImageRef> {
        self.processed_image_ref.as_ref()
    }

    /// Returns the analysis results once completed.
    #[must_use]
    pub const fn report(&self) -> Option<&AnalysisReport> {
        self.report.as_ref()
    }

    /// Returns the species of the primary instance once completed.
    #[must_use]
    pub fn primary_label(&self) -> Option<TreeSpecies> {
        self.report.as_ref().map(AnalysisReport::primary_label)
    }

    /// Returns the confidence of the primary instance once completed.
    #[must_use]
    pub fn primary_confidence(&self) -> Option<f64> {
        self.report.as_ref().map(AnalysisReport::primary_confidence)
    }

    /// Returns the findings; empty until completed.
    #[must_use]
    pub fn findings(&self) -> &[Finding] {
        self.report.as_ref().map_or(&[], AnalysisReport::findings)
    }

    /// Returns the health score once completed.
    #[must_use]
    pub fn health_score(&self) -> Option<f64> {
        self.report.as_ref().map(AnalysisReport::health_score)
    }

    /// Returns processed-image metadata once normalization has run.
    #[must_use]
    pub const fn image_metadata(&self) -> Option<&ImageMetadata> {
        self.image_metadata.as_ref()
    }

    /// Returns the failure payload when the task failed.
    #[must_use]
    pub const fn error(&self) -> Option<&TaskFailure> {
        self.error.as_ref()
    }

    /// Returns how many dispatch attempts have started.
    #[must_use]
    pub const fn attempts(&self) -> u32 {
        self.attempts
    }

    /// Returns the creation timestamp.
    #[must_use]
    pub const fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Returns the latest lifecycle timestamp.
    #[must_use]
    pub const fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    /// Starts a dispatch attempt, moving to [`TaskStatus::Processing`].
    ///
    /// Also used to reclaim a task whose previous worker went silent. The
    /// attempt counter increases and the normalization metadata is attached.
    ///
    /// # Errors
    ///
    /// Returns [`TaskDomainError::InvalidStateTransition`] from a terminal
    /// status.
    pub fn start_attempt(
        &mut self,
        metadata: ImageMetadata,
        clock: &impl Clock,
    ) -> Result<(), TaskDomainError> {
        self.transition_to(TaskStatus::Processing, clock)?;
        self.attempts = self.attempts.saturating_add(1);
        self.image_metadata = Some(metadata);
        Ok(())
    }

    /// Commits analysis results and moves to [`TaskStatus::Completed`].
    ///
    /// # Errors
    ///
    /// Returns [`TaskDomainError::InvalidStateTransition`] unless the task
    /// is processing.
    pub fn complete(
        &mut self,
        report: AnalysisReport,
        processed_image_ref: ImageRef,
        clock: &impl Clock,
    ) -> Result<(), TaskDomainError> {
        self.transition_to(TaskStatus::Completed, clock)?;
        self.report = Some(report);
        self.processed_image_ref = Some(processed_image_ref);
        Ok(())
    }

    /// Records a permanent failure and moves to [`TaskStatus::Failed`].
    ///
    /// # Errors
    ///
    /// Returns [`TaskDomainError::InvalidStateTransition`] from a terminal
    /// status.
    pub fn fail(&mut self, failure: TaskFailure, clock: &impl Clock) -> Result<(), TaskDomainError> {
        self.transition_to(TaskStatus::Failed, clock)?;
        self.error = Some(failure);
        Ok(())
    }

    /// Returns a processing task to the queue for another attempt.
    ///
    /// # Errors
    ///
    /// Returns [`TaskDomainError::InvalidStateTransition`] unless the task
    /// is processing.
    pub fn schedule_retry(&mut self, clock: &impl Clock) -> Result<(), TaskDomainError> {
        if self.status != TaskStatus::Processing {
            return Err(self.invalid_transition(TaskStatus::Pending));
        }
        self.transition_to(TaskStatus::Pending, clock)
    }

    fn transition_to(
        &mut self,
        target: TaskStatus,
        clock: &impl Clock,
    ) -> Result<(), TaskDomainError> {
        if !self.status.can_transition_to(target) {
            return Err(self.invalid_transition(target));
        }
        self.status = target;
        self.touch(clock);
        Ok(())
    }

    const fn invalid_transition(&self, to: TaskStatus) -> TaskDomainError {
        TaskDomainError::InvalidStateTransition {
            task_id: self.id,
            from: self.status,
            to,
        }
    }

    /// Updates the `updated_at` timestamp to the current clock time.
    fn touch(&mut self, clock: &impl Clock) {
        self.updated_at = clock.utc();
    }
}
