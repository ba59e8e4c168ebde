//! Segmentation, per-instance defect analysis, and aggregation over one
//! normalized image.

use super::{Aggregator, InferenceBackend, isolate_instance, select_primary};
use crate::analysis::{
    domain::{AnalysisReport, MaskPolygon, NormalizedImage, RawDefect},
    ports::InferenceError,
};
use rand::{SeedableRng, rngs::StdRng};
use std::sync::{Mutex, PoisonError};
use thiserror::Error;
use tracing::{debug, warn};

/// Pipeline behaviour switches.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PipelineConfig {
    /// Primary confidence and health score reported when no instance is
    /// detected.
    pub baseline_confidence: f64,
    /// Run defect detection on every instance instead of only the primary.
    pub analyze_all_instances: bool,
    /// Seed for severity sampling and score jitter.
    pub scoring_seed: Option<u64>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            baseline_confidence: 0.5,
            analyze_all_instances: false,
            scoring_seed: None,
        }
    }
}

/// Errors that abort an analysis run.
///
/// Per-instance defect failures and unknown labels never show up here;
/// they degrade in place.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum AnalysisError {
    /// The backend is temporarily unable to serve.
    #[error("transient backend error: {0}")]
    TransientBackend(String),

    /// The backend cannot be used at all.
    #[error("model unavailable: {0}")]
    ModelUnavailable(String),

    /// Segmentation failed on this input.
    #[error("segmentation failed: {0}")]
    Segmentation(String),
}

impl AnalysisError {
    /// Returns `true` when a later attempt may succeed.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(self, Self::TransientBackend(_))
    }
}

impl From<InferenceError> for AnalysisError {
    fn from(err: InferenceError) -> Self {
        match err {
            InferenceError::Transient(message) => Self::TransientBackend(message),
            InferenceError::Unavailable(message) => Self::ModelUnavailable(message),
            InferenceError::Failed(message) => Self::Segmentation(message),
        }
    }
}

/// Runs the two-stage inference flow and scores the result.
#[derive(Debug)]
pub struct AnalysisPipeline {
    backend: InferenceBackend,
    aggregator: Aggregator,
    analyze_all_instances: bool,
    rng: Mutex<StdRng>,
}

impl AnalysisPipeline {
    /// Creates a pipeline over a backend.
    #[must_use]
    pub fn new(backend: InferenceBackend, config: PipelineConfig) -> Self {
        let aggregator = Aggregator::new(backend.scoring(), config.baseline_confidence);
        let rng = config
            .scoring_seed
            .map_or_else(StdRng::from_os_rng, StdRng::seed_from_u64);
        Self {
            backend,
            aggregator,
            analyze_all_instances: config.analyze_all_instances,
            rng: Mutex::new(rng),
        }
    }

    /// Analyzes a normalized image.
    ///
    /// # Errors
    ///
    /// Returns [`AnalysisError`] when segmentation fails or when the defect
    /// model reports itself unavailable. Any other defect-model failure
    /// leaves that instance without findings.
    pub fn analyze(&self, image: &NormalizedImage) -> Result<AnalysisReport, AnalysisError> {
        let instances = self.backend.segmenter().segment(image.pixels())?;
        let Some(primary_index) = select_primary(&instances) else {
            debug!("segmentation found no instances");
            return Ok(self.aggregator.empty_report());
        };

        let mut defects: Vec<Option<Vec<RawDefect>>> = Vec::with_capacity(instances.len());
        for (index, instance) in instances.iter().enumerate() {
            let analyzed = self.analyze_all_instances || index == primary_index;
            defects.push(if analyzed {
                self.detect_for_instance(image, index, &instance.mask)?
            } else {
                None
            });
        }

        let mut rng = self.rng.lock().unwrap_or_else(PoisonError::into_inner);
        Ok(self
            .aggregator
            .aggregate(&instances, primary_index, &defects, &mut *rng))
    }

    fn detect_for_instance(
        &self,
        image: &NormalizedImage,
        index: usize,
        mask: &MaskPolygon,
    ) -> Result<Option<Vec<RawDefect>>, AnalysisError> {
        let Some(crop) = isolate_instance(image.pixels(), mask) else {
            warn!(instance = index, "instance mask covers no pixels, skipping defects");
            return Ok(None);
        };
        match self.backend.defect_model().detect_defects(&crop) {
            Ok(defects) => Ok(Some(defects)),
            Err(InferenceError::Unavailable(message)) => {
                Err(AnalysisError::ModelUnavailable(message))
            }
            Err(err) => {
                warn!(instance = index, error = %err, "defect analysis failed, continuing without findings");
                Ok(None)
            }
        }
    }
}
