//! Closed taxonomies for tree species, defect kinds, and severities.
//!
//! Model labels enter the system only through [`TreeSpecies::from_model_label`]
//! and [`DefectKind::from_model_label`]; everything downstream speaks the
//! canonical names returned by `as_str`, which are also the serde names.

use super::{ParseTaxonomyError, UnknownLabelError};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Normalizes a free-form model label for table lookup.
fn normalize_label(label: &str) -> String {
    label
        .trim()
        .to_ascii_lowercase()
        .chars()
        .map(|ch| if ch == ' ' || ch == '-' { '_' } else { ch })
        .collect()
}

/// Tree species recognized in reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TreeSpecies {
    /// Quercus robur.
    Oak,
    /// Pinus sylvestris.
    Pine,
    /// Betula pendula.
    Birch,
    /// Acer platanoides.
    Maple,
    /// Ornamental cherry.
    Cherry,
    /// A tree whose species the model could not determine.
    Unknown,
}

impl TreeSpecies {
    /// Every species, in declaration order.
    pub const ALL: [Self; 6] = [
        Self::Oak,
        Self::Pine,
        Self::Birch,
        Self::Maple,
        Self::Cherry,
        Self::Unknown,
    ];

    /// Returns the canonical storage representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Oak => "oak",
            Self::Pine => "pine",
            Self::Birch => "birch",
            Self::Maple => "maple",
            Self::Cherry => "cherry",
            Self::Unknown => "unknown",
        }
    }

    /// Returns the label a segmentation model emits for this species.
    ///
    /// Models report an unidentified tree as the generic class `tree`.
    #[must_use]
    pub const fn model_label(self) -> &'static str {
        match self {
            Self::Unknown => "tree",
            other => other.as_str(),
        }
    }

    /// Returns the scientific name shown alongside the species.
    #[must_use]
    pub const fn scientific_name(self) -> &'static str {
        match self {
            Self::Oak => "Quercus robur",
            Self::Pine => "Pinus sylvestris",
            Self::Birch => "Betula pendula",
            Self::Maple => "Acer platanoides",
            Self::Cherry => "Prunus serrulata",
            Self::Unknown => "Species not determined",
        }
    }

    /// Maps a segmentation model label onto the species taxonomy.
    ///
    /// # Errors
    ///
    /// Returns [`UnknownLabelError`] for labels with no table entry. Callers
    /// treat this as non-fatal and fall back to [`TreeSpecies::Unknown`].
    pub fn from_model_label(label: &str) -> Result<Self, UnknownLabelError> {
        match normalize_label(label).as_str() {
            "oak" | "quercus_robur" => Ok(Self::Oak),
            "pine" | "pinus_sylvestris" => Ok(Self::Pine),
            "birch" | "betula_pendula" => Ok(Self::Birch),
            "maple" | "acer_platanoides" => Ok(Self::Maple),
            "cherry" => Ok(Self::Cherry),
            "tree" | "unknown" => Ok(Self::Unknown),
            _ => Err(UnknownLabelError {
                taxonomy: "species",
                label: label.to_owned(),
            }),
        }
    }
}

impl TryFrom<&str> for TreeSpecies {
    type Error = ParseTaxonomyError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        let normalized = value.trim().to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|species| species.as_str() == normalized)
            .ok_or_else(|| ParseTaxonomyError {
                taxonomy: "species",
                value: value.to_owned(),
            })
    }
}

impl fmt::Display for TreeSpecies {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Public defect taxonomy carried by findings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DefectKind {
    /// Signs of insect infestation.
    InsectDamage,
    /// Fungal growth or rot.
    FungalInfection,
    /// Bark wounds or stripping.
    BarkDamage,
    /// Abnormal leaf colour.
    LeafDiscoloration,
    /// Broken or split branches.
    BranchBreakage,
    /// Damage to the root system or root flare.
    RootDamage,
    /// Wilting or scorch from water shortage.
    DroughtStress,
    /// Chlorosis and other nutrient symptoms.
    NutrientDeficiency,
    /// Trunk or stem crack.
    Crack,
    /// Cavity in the trunk.
    Hollow,
    /// Dead branch still attached to the crown.
    DeadBranch,
    /// Fallback for labels the translation table does not know.
    Unidentified,
}

impl DefectKind {
    /// Kind assigned to labels with no table entry.
    pub const FALLBACK: Self = Self::Unidentified;

    /// Every defect kind, in declaration order.
    pub const ALL: [Self; 12] = [
        Self::InsectDamage,
        Self::FungalInfection,
        Self::BarkDamage,
        Self::LeafDiscoloration,
        Self::BranchBreakage,
        Self::RootDamage,
        Self::DroughtStress,
        Self::NutrientDeficiency,
        Self::Crack,
        Self::Hollow,
        Self::DeadBranch,
        Self::Unidentified,
    ];

    /// Returns the canonical storage representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::InsectDamage => "insect_damage",
            Self::FungalInfection => "fungal_infection",
            Self::BarkDamage => "bark_damage",
            Self::LeafDiscoloration => "leaf_discoloration",
            Self::BranchBreakage => "branch_breakage",
            Self::RootDamage => "root_damage",
            Self::DroughtStress => "drought_stress",
            Self::NutrientDeficiency => "nutrient_deficiency",
            Self::Crack => "crack",
            Self::Hollow => "hollow",
            Self::DeadBranch => "dead_branch",
            Self::Unidentified => "unidentified",
        }
    }

    /// Maps a defect model label onto the defect taxonomy.
    ///
    /// # Errors
    ///
    /// Returns [`UnknownLabelError`] for labels with no table entry. Callers
    /// treat this as non-fatal and use [`DefectKind::FALLBACK`].
    pub fn from_model_label(label: &str) -> Result<Self, UnknownLabelError> {
        let normalized = normalize_label(label);
        let kind = match normalized.as_str() {
            "insect_damage" | "insects" => Self::InsectDamage,
            "fungal_infection" | "fungus" => Self::FungalInfection,
            "bark_damage" => Self::BarkDamage,
            "leaf_discoloration" => Self::LeafDiscoloration,
            "branch_breakage" | "broken_branch" => Self::BranchBreakage,
            "root_damage" => Self::RootDamage,
            "drought_stress" => Self::DroughtStress,
            "nutrient_deficiency" => Self::NutrientDeficiency,
            "crack" => Self::Crack,
            "hollow" | "hole" => Self::Hollow,
            "dead_branch" => Self::DeadBranch,
            _ => {
                return Err(UnknownLabelError {
                    taxonomy: "defect",
                    label: label.to_owned(),
                });
            }
        };
        Ok(kind)
    }
}

impl TryFrom<&str> for DefectKind {
    type Error = ParseTaxonomyError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        let normalized = value.trim().to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|kind| kind.as_str() == normalized)
            .ok_or_else(|| ParseTaxonomyError {
                taxonomy: "defect",
                value: value.to_owned(),
            })
    }
}

impl fmt::Display for DefectKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Severity grade attached to each finding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    /// Cosmetic or early-stage damage.
    Low,
    /// Damage that needs treatment.
    Medium,
    /// Damage that threatens the tree or its surroundings.
    High,
}

impl Severity {
    /// Every severity, from least to most severe.
    pub const ALL: [Self; 3] = [Self::Low, Self::Medium, Self::High];

    /// Returns the canonical storage representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
        }
    }

    /// Multiplier applied to the health score for one finding of this
    /// severity.
    #[must_use]
    pub const fn health_modifier(self) -> f64 {
        match self {
            Self::Low => 0.95,
            Self::Medium => 0.85,
            Self::High => 0.70,
        }
    }
}

impl TryFrom<&str> for Severity {
    type Error = ParseTaxonomyError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value.trim().to_ascii_lowercase().as_str() {
            "low" => Ok(Self::Low),
            "medium" => Ok(Self::Medium),
            "high" => Ok(Self::High),
            _ => Err(ParseTaxonomyError {
                taxonomy: "severity",
                value: value.to_owned(),
            }),
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
