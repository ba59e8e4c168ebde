//! Port contracts for the task context.
//!
//! Ports define infrastructure-agnostic interfaces used by task services.

pub mod image_store;
pub mod queue;
pub mod repository;

pub use image_store::{ImageStore, ImageStoreError, ImageStoreResult};
pub use queue::{WorkQueue, WorkQueueError, WorkQueueResult};
pub use repository::{TaskRepository, TaskRepositoryError, TaskRepositoryResult};
