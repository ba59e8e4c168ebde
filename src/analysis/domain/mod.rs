//! Domain model for tree image analysis.
//!
//! The analysis domain owns the closed taxonomies (species, defect kinds,
//! severities), the raw model output shapes, and the findings and reports
//! that leave the pipeline.

mod advice;
mod error;
mod finding;
mod image;
mod instance;
mod report;
mod taxonomy;

pub use advice::{DEFAULT_DESCRIPTION, DEFAULT_RECOMMENDATION, description_for, recommendations_for};
pub use error::{ParseTaxonomyError, UnknownLabelError};
pub use finding::{Finding, decode_findings, encode_findings};
pub use image::{ImageMetadata, NormalizedImage};
pub use instance::{BoundingBox, Instance, MaskPolygon, Point, RawDefect};
pub use report::{AnalysisReport, TreeSummary};
pub use taxonomy::{DefectKind, Severity, TreeSpecies};

/// Clamps a score into the closed unit interval.
///
/// Non-finite input collapses to `0.0` so a misbehaving model can never
/// push a `NaN` into a persisted report.
#[must_use]
pub fn clamp_unit(value: f64) -> f64 {
    if value.is_nan() {
        return 0.0;
    }
    value.clamp(0.0, 1.0)
}
