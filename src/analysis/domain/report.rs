//! Aggregated analysis result for one image.

use super::{BoundingBox, Finding, TreeSpecies};
use serde::{Deserialize, Serialize};

/// Per-instance result carried alongside the primary summary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TreeSummary {
    tree_id: String,
    species: TreeSpecies,
    confidence: f64,
    bbox: BoundingBox,
    findings: Vec<Finding>,
    defects_analyzed: bool,
}

impl TreeSummary {
    /// Creates a summary for the instance at zero-based `index`.
    #[must_use]
    pub fn new(
        index: usize,
        species: TreeSpecies,
        confidence: f64,
        bbox: BoundingBox,
        findings: Vec<Finding>,
        defects_analyzed: bool,
    ) -> Self {
        Self {
            tree_id: format!("tree_{}", index.saturating_add(1)),
            species,
            confidence,
            bbox,
            findings,
            defects_analyzed,
        }
    }

    /// Returns the one-based identifier, e.g. `tree_1`.
    #[must_use]
    pub fn tree_id(&self) -> &str {
        &self.tree_id
    }

    /// Returns the mapped species.
    #[must_use]
    pub const fn species(&self) -> TreeSpecies {
        self.species
    }

    /// Returns the scientific name of the species.
    #[must_use]
    pub const fn scientific_name(&self) -> &'static str {
        self.species.scientific_name()
    }

    /// Returns the clamped segmentation confidence.
    #[must_use]
    pub const fn confidence(&self) -> f64 {
        self.confidence
    }

    /// Returns the bounding box in normalized-image pixels.
    #[must_use]
    pub const fn bbox(&self) -> BoundingBox {
        self.bbox
    }

    /// Returns this instance's findings.
    #[must_use]
    pub fn findings(&self) -> &[Finding] {
        &self.findings
    }

    /// Returns `false` when defect detection was skipped or failed for this
    /// instance.
    #[must_use]
    pub const fn defects_analyzed(&self) -> bool {
        self.defects_analyzed
    }
}

/// Output of the analysis pipeline.
///
/// The four result fields always travel together so a task either carries
/// all of them or none. `findings` is the concatenation of every analyzed
/// tree's findings in instance order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisReport {
    primary_label: TreeSpecies,
    primary_confidence: f64,
    findings: Vec<Finding>,
    health_score: f64,
    #[serde(default)]
    trees: Vec<TreeSummary>,
}

impl AnalysisReport {
    /// Creates a report.
    #[must_use]
    pub const fn new(
        primary_label: TreeSpecies,
        primary_confidence: f64,
        findings: Vec<Finding>,
        health_score: f64,
        trees: Vec<TreeSummary>,
    ) -> Self {
        Self {
            primary_label,
            primary_confidence,
            findings,
            health_score,
            trees,
        }
    }

    /// Returns the species of the primary instance.
    #[must_use]
    pub const fn primary_label(&self) -> TreeSpecies {
        self.primary_label
    }

    /// Returns the confidence of the primary instance.
    #[must_use]
    pub const fn primary_confidence(&self) -> f64 {
        self.primary_confidence
    }

    /// Returns findings in detection order.
    #[must_use]
    pub fn findings(&self) -> &[Finding] {
        &self.findings
    }

    /// Returns the composite health score in `[0, 1]`.
    #[must_use]
    pub const fn health_score(&self) -> f64 {
        self.health_score
    }

    /// Returns one summary per segmented instance, in segmentation order.
    #[must_use]
    pub fn trees(&self) -> &[TreeSummary] {
        &self.trees
    }

    /// Returns how many instances segmentation produced.
    #[must_use]
    pub const fn instances_detected(&self) -> usize {
        self.trees.len()
    }
}
