//! Domain model for analysis tasks.
//!
//! A task tracks one uploaded image through the analysis job state machine
//! and carries the committed results. Infrastructure concerns stay outside
//! the domain boundary.

mod error;
mod ids;
mod report;
mod task;

pub use error::{ParseTaskStatusError, TaskDomainError};
pub use ids::{ImageRef, OwnerRef, TaskId};
pub use report::TaskReport;
pub use task::{Task, TaskFailure, TaskFailureKind, TaskStatus};
