//! Findings and their persisted JSON encoding.

use super::{DefectKind, Severity, clamp_unit, description_for, recommendations_for};
use serde::{Deserialize, Serialize};

/// One detected defect with its grade and advice.
///
/// Findings are immutable once produced and belong to the task that
/// produced them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Finding {
    #[serde(rename = "type")]
    kind: DefectKind,
    confidence: f64,
    severity: Severity,
    description: String,
    recommendations: Vec<String>,
}

impl Finding {
    /// Creates a finding, resolving description and recommendations from
    /// the static advice table.
    ///
    /// Confidence is clamped into `[0, 1]`.
    #[must_use]
    pub fn new(kind: DefectKind, confidence: f64, severity: Severity) -> Self {
        Self {
            kind,
            confidence: clamp_unit(confidence),
            severity,
            description: description_for(kind).to_owned(),
            recommendations: recommendations_for(kind, severity)
                .iter()
                .map(|text| (*text).to_owned())
                .collect(),
        }
    }

    /// Returns the defect kind.
    #[must_use]
    pub const fn kind(&self) -> DefectKind {
        self.kind
    }

    /// Returns the detection confidence.
    #[must_use]
    pub const fn confidence(&self) -> f64 {
        self.confidence
    }

    /// Returns the severity grade.
    #[must_use]
    pub const fn severity(&self) -> Severity {
        self.severity
    }

    /// Returns the user-facing description.
    #[must_use]
    pub fn description(&self) -> &str {
        &self.description
    }

    /// Returns the ordered treatment recommendations.
    #[must_use]
    pub fn recommendations(&self) -> &[String] {
        &self.recommendations
    }
}

/// Serializes findings into the persisted array encoding.
///
/// # Errors
///
/// Returns [`serde_json::Error`] if serialization fails.
pub fn encode_findings(findings: &[Finding]) -> Result<String, serde_json::Error> {
    serde_json::to_string(findings)
}

/// Parses findings from the persisted array encoding.
///
/// # Errors
///
/// Returns [`serde_json::Error`] when the payload is not a findings array.
pub fn decode_findings(encoded: &str) -> Result<Vec<Finding>, serde_json::Error> {
    serde_json::from_str(encoded)
}
