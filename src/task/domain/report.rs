//! Caller-facing projection of a task.

use super::{ImageRef, Task, TaskFailure, TaskId, TaskStatus};
use crate::analysis::domain::{AnalysisReport, Finding, ImageMetadata, TreeSpecies, TreeSummary};
use chrono::{DateTime, Utc};
use serde::Serialize;

/// Status view returned to the submitter of a task.
///
/// Result fields are present only once the task completed; `error` only
/// once it failed.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TaskReport {
    /// Task identifier.
    pub task_id: TaskId,
    /// Lifecycle status.
    pub status: TaskStatus,
    /// Source image reference.
    pub original_image_ref: ImageRef,
    /// Processed image reference.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub processed_image_ref: Option<ImageRef>,
    /// Species of the primary instance.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub primary_label: Option<TreeSpecies>,
    /// Scientific name of the primary species.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub primary_scientific_name: Option<&'static str>,
    /// Confidence of the primary instance.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub primary_confidence: Option<f64>,
    /// Findings across analyzed instances.
    pub findings: Vec<Finding>,
    /// Composite health score.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub health_score: Option<f64>,
    /// Per-instance summaries in segmentation order.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub trees: Vec<TreeSummary>,
    /// Normalization metadata.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_metadata: Option<ImageMetadata>,
    /// Failure payload.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<TaskFailure>,
    /// Dispatch attempts started so far.
    pub attempts: u32,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Latest lifecycle timestamp.
    pub updated_at: DateTime<Utc>,
}

impl From<&Task> for TaskReport {
    fn from(task: &Task) -> Self {
        Self {
            task_id: task.id(),
            status: task.status(),
            original_image_ref: task.original_image_ref().clone(),
            processed_image_ref: task.processed_image_ref().cloned(),
            primary_label: task.primary_label(),
            primary_scientific_name: task.primary_label().map(TreeSpecies::scientific_name),
            primary_confidence: task.primary_confidence(),
            findings: task.findings().to_vec(),
            health_score: task.health_score(),
            trees: task
                .report()
                .map(AnalysisReport::trees)
                .unwrap_or_default()
                .to_vec(),
            image_metadata: task.image_metadata().copied(),
            error: task.error().cloned(),
            attempts: task.attempts(),
            created_at: task.created_at(),
            updated_at: task.updated_at(),
        }
    }
}
