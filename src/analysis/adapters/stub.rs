//! Scripted deterministic models.
//!
//! Each stub replays a fixed outcome on every call and counts how often it
//! was invoked, which makes pipeline and dispatcher behaviour reproducible
//! without a real model.

use crate::analysis::{
    domain::{Instance, RawDefect},
    ports::{DefectModel, InferenceError, InferenceResult, SegmentationModel},
};
use image::{RgbImage, RgbaImage};
use std::sync::atomic::{AtomicUsize, Ordering};

/// Segmentation model that always returns the same outcome.
#[derive(Debug)]
pub struct StubSegmenter {
    outcome: InferenceResult<Vec<Instance>>,
    calls: AtomicUsize,
}

impl StubSegmenter {
    /// Returns the given instances on every call.
    #[must_use]
    pub const fn returning(instances: Vec<Instance>) -> Self {
        Self {
            outcome: Ok(instances),
            calls: AtomicUsize::new(0),
        }
    }

    /// Fails with the given error on every call.
    #[must_use]
    pub const fn failing(error: InferenceError) -> Self {
        Self {
            outcome: Err(error),
            calls: AtomicUsize::new(0),
        }
    }

    /// Returns how many times the model was invoked.
    #[must_use]
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl SegmentationModel for StubSegmenter {
    fn segment(&self, _image: &RgbImage) -> InferenceResult<Vec<Instance>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.outcome.clone()
    }
}

/// Defect model that always returns the same outcome.
#[derive(Debug)]
pub struct StubDefectModel {
    outcome: InferenceResult<Vec<RawDefect>>,
    calls: AtomicUsize,
}

impl StubDefectModel {
    /// Returns the given defects on every call.
    #[must_use]
    pub const fn returning(defects: Vec<RawDefect>) -> Self {
        Self {
            outcome: Ok(defects),
            calls: AtomicUsize::new(0),
        }
    }

    /// Fails with the given error on every call.
    #[must_use]
    pub const fn failing(error: InferenceError) -> Self {
        Self {
            outcome: Err(error),
            calls: AtomicUsize::new(0),
        }
    }

    /// Returns how many times the model was invoked.
    #[must_use]
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl DefectModel for StubDefectModel {
    fn detect_defects(&self, _crop: &RgbaImage) -> InferenceResult<Vec<RawDefect>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.outcome.clone()
    }
}
