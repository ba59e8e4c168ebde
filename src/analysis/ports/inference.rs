//! Inference ports for instance segmentation and defect detection.
//!
//! Both calls are blocking and compute-bound. Implementations must be pure
//! functions of their input apart from deliberate sampling, so a task can be
//! re-executed safely after redelivery.

use crate::analysis::domain::{Instance, RawDefect};
use image::{RgbImage, RgbaImage};
use thiserror::Error;

/// Result type for inference calls.
pub type InferenceResult<T> = Result<T, InferenceError>;

/// Primary model contract: finds tree instances and their masks.
#[cfg_attr(test, mockall::automock)]
pub trait SegmentationModel: Send + Sync {
    /// Segments a normalized image.
    ///
    /// Returns instances in detection order. An empty vector is a valid
    /// result meaning no tree was found.
    ///
    /// # Errors
    ///
    /// Returns [`InferenceError`] when the model cannot produce a result.
    fn segment(&self, image: &RgbImage) -> InferenceResult<Vec<Instance>>;
}

/// Secondary model contract: finds defects inside one isolated instance.
#[cfg_attr(test, mockall::automock)]
pub trait DefectModel: Send + Sync {
    /// Detects defects in a crop where everything outside the instance mask
    /// is fully transparent.
    ///
    /// # Errors
    ///
    /// Returns [`InferenceError`] when the model cannot produce a result.
    fn detect_defects(&self, crop: &RgbaImage) -> InferenceResult<Vec<RawDefect>>;
}

/// Errors raised by inference backends.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum InferenceError {
    /// The model is temporarily unable to serve (busy, out of memory,
    /// accelerator reset). Worth retrying later.
    #[error("inference backend temporarily unavailable: {0}")]
    Transient(String),

    /// The model is misconfigured or cannot be loaded at all.
    #[error("inference model unavailable: {0}")]
    Unavailable(String),

    /// The model ran but failed on this input.
    #[error("inference failed: {0}")]
    Failed(String),
}
