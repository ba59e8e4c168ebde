//! Port contracts for tree image analysis.
//!
//! Ports define the model-agnostic inference interfaces used by the
//! analysis pipeline.

pub mod inference;

pub use inference::{DefectModel, InferenceError, InferenceResult, SegmentationModel};

#[cfg(test)]
pub use inference::{MockDefectModel, MockSegmentationModel};
