//! Configuration-selected inference backend.

use super::ScoringPolicy;
use crate::analysis::{
    adapters::MockBackend,
    ports::{DefectModel, InferenceError, SegmentationModel},
};
use std::{fmt, sync::Arc};
use thiserror::Error;

/// Backend choice read from configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BackendKind {
    /// Injected segmentation and defect models.
    Real,
    /// Randomized [`MockBackend`].
    Mock,
}

impl BackendKind {
    /// Returns the configuration spelling.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Real => "real",
            Self::Mock => "mock",
        }
    }
}

/// Error returned for an unrecognized backend name.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("unknown inference backend '{0}', expected 'real' or 'mock'")]
pub struct ParseBackendKindError(pub String);

impl TryFrom<&str> for BackendKind {
    type Error = ParseBackendKindError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value.trim().to_ascii_lowercase().as_str() {
            "real" => Ok(Self::Real),
            "mock" => Ok(Self::Mock),
            _ => Err(ParseBackendKindError(value.to_owned())),
        }
    }
}

/// Inference backend chosen once at worker startup.
///
/// Both variants expose the same segmentation and defect contracts; the
/// variant also decides how findings are scored.
#[derive(Clone)]
pub enum InferenceBackend {
    /// Real models supplied by the integrator.
    Real {
        /// Instance segmentation model.
        segmenter: Arc<dyn SegmentationModel>,
        /// Defect detection model.
        defects: Arc<dyn DefectModel>,
    },
    /// Randomized backend.
    Mock(Arc<MockBackend>),
}

impl InferenceBackend {
    /// Wraps real model implementations.
    #[must_use]
    pub fn real(segmenter: Arc<dyn SegmentationModel>, defects: Arc<dyn DefectModel>) -> Self {
        Self::Real { segmenter, defects }
    }

    /// Creates a mock backend, seeded when `seed` is given.
    #[must_use]
    pub fn mock(seed: Option<u64>) -> Self {
        let backend = seed.map_or_else(MockBackend::new, MockBackend::seeded);
        Self::Mock(Arc::new(backend))
    }

    /// Builds the backend named by configuration.
    ///
    /// # Errors
    ///
    /// Returns [`InferenceError::Unavailable`] when `kind` is
    /// [`BackendKind::Real`] and no models were supplied.
    pub fn from_kind(
        kind: BackendKind,
        models: Option<(Arc<dyn SegmentationModel>, Arc<dyn DefectModel>)>,
        mock_seed: Option<u64>,
    ) -> Result<Self, InferenceError> {
        match (kind, models) {
            (BackendKind::Mock, _) => Ok(Self::mock(mock_seed)),
            (BackendKind::Real, Some((segmenter, defects))) => Ok(Self::real(segmenter, defects)),
            (BackendKind::Real, None) => Err(InferenceError::Unavailable(
                "real backend selected but no segmentation or defect model was loaded".to_owned(),
            )),
        }
    }

    /// Returns which variant this is.
    #[must_use]
    pub const fn kind(&self) -> BackendKind {
        match self {
            Self::Real { .. } => BackendKind::Real,
            Self::Mock(_) => BackendKind::Mock,
        }
    }

    /// Returns the segmentation model.
    #[must_use]
    pub fn segmenter(&self) -> &dyn SegmentationModel {
        match self {
            Self::Real { segmenter, .. } => segmenter.as_ref(),
            Self::Mock(mock) => mock.as_ref(),
        }
    }

    /// Returns the defect model.
    #[must_use]
    pub fn defect_model(&self) -> &dyn DefectModel {
        match self {
            Self::Real { defects, .. } => defects.as_ref(),
            Self::Mock(mock) => mock.as_ref(),
        }
    }

    /// Returns how findings from this backend are scored.
    #[must_use]
    pub fn scoring(&self) -> ScoringPolicy {
        match self {
            Self::Real { .. } => ScoringPolicy::DETERMINISTIC,
            Self::Mock(_) => ScoringPolicy::stochastic(),
        }
    }
}

impl fmt::Debug for InferenceBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("InferenceBackend")
            .field(&self.kind())
            .finish()
    }
}
