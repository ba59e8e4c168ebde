//! Static description and treatment tables for findings.
//!
//! Both lookups are total over every (kind, severity) pair so a finding can
//! never carry empty user-facing text.

use super::{DefectKind, Severity};

/// Description used when a defect kind has no dedicated text.
pub const DEFAULT_DESCRIPTION: &str = "Defect detected by the analysis model";

/// Recommendation used when a (kind, severity) pair has no dedicated advice.
pub const DEFAULT_RECOMMENDATION: &str = "Consult with arborist";

/// Returns the user-facing description for a defect kind.
#[must_use]
pub const fn description_for(kind: DefectKind) -> &'static str {
    match kind {
        DefectKind::InsectDamage => "Signs of insect infestation detected",
        DefectKind::FungalInfection => "Fungal infection present on tree",
        DefectKind::BarkDamage => "Bark damage or wounds observed",
        DefectKind::LeafDiscoloration => "Unusual leaf discoloration detected",
        DefectKind::BranchBreakage => "Broken or damaged branches found",
        DefectKind::RootDamage => "Potential root system damage",
        DefectKind::DroughtStress => "Signs of drought stress visible",
        DefectKind::NutrientDeficiency => "Nutrient deficiency symptoms detected",
        DefectKind::Crack => "Crack in trunk or stem observed",
        DefectKind::Hollow => "Cavity or hollow in trunk detected",
        DefectKind::DeadBranch => "Dead branch present in crown",
        DefectKind::Unidentified => DEFAULT_DESCRIPTION,
    }
}

/// Returns the ordered treatment recommendations for a finding.
#[must_use]
pub const fn recommendations_for(kind: DefectKind, severity: Severity) -> &'static [&'static str] {
    use DefectKind as K;
    use Severity as S;

    match (kind, severity) {
        (K::InsectDamage, S::Low) => &["Monitor tree regularly", "Apply preventive treatment"],
        (K::InsectDamage, S::Medium) => &["Apply insecticide treatment", "Remove affected branches"],
        (K::InsectDamage, S::High) => &[
            "Immediate treatment required",
            "Consult arborist",
            "Consider tree removal if severe",
        ],
        (K::FungalInfection, S::Low) => &["Improve air circulation", "Remove dead material"],
        (K::FungalInfection, S::Medium) => &["Apply fungicide", "Prune affected areas"],
        (K::FungalInfection, S::High) => &[
            "Immediate fungicide treatment",
            "Extensive pruning required",
            "Monitor closely",
        ],
        (K::BarkDamage, S::Low) => &["Protect from further damage", "Apply wound dressing"],
        (K::BarkDamage, S::Medium) => &["Clean and treat wounds", "Monitor for infection"],
        (K::BarkDamage, S::High) => &[
            "Immediate wound treatment",
            "Protect from pests",
            "Consider professional help",
        ],
        (K::LeafDiscoloration, S::Low) => &["Check soil conditions", "Adjust watering"],
        (K::LeafDiscoloration, S::Medium) => {
            &["Soil testing recommended", "Fertilizer application"]
        }
        (K::LeafDiscoloration, S::High) => {
            &["Immediate soil analysis", "Professional consultation needed"]
        }
        (K::BranchBreakage, S::Low) => &["Prune broken branches", "Clean cuts properly"],
        (K::BranchBreakage, S::Medium) => {
            &["Remove damaged branches", "Support remaining structure"]
        }
        (K::BranchBreakage, S::High) => &[
            "Immediate pruning required",
            "Structural support needed",
            "Safety assessment",
        ],
        (K::RootDamage, S::Low) => &["Improve drainage", "Avoid soil compaction"],
        (K::RootDamage, S::Medium) => &["Root zone treatment", "Mulching recommended"],
        (K::RootDamage, S::High) => &[
            "Immediate root care",
            "Professional assessment",
            "Consider tree removal",
        ],
        (K::DroughtStress, S::Low) => &["Increase watering", "Apply mulch"],
        (K::DroughtStress, S::Medium) => &["Deep watering schedule", "Soil moisture monitoring"],
        (K::DroughtStress, S::High) => &[
            "Emergency watering",
            "Shade protection",
            "Professional irrigation",
        ],
        (K::NutrientDeficiency, S::Low) => &["Soil testing", "Balanced fertilization"],
        (K::NutrientDeficiency, S::Medium) => {
            &["Targeted nutrient application", "pH adjustment"]
        }
        (K::NutrientDeficiency, S::High) => &[
            "Immediate nutrient treatment",
            "Soil amendment",
            "Professional consultation",
        ],
        (K::Crack, S::Low) => &["Monitor crack for growth"],
        (K::Crack, S::Medium) => &["Install cabling or bracing", "Reinspect within six months"],
        (K::Crack, S::High) => &["Restrict access beneath the tree", "Urgent arborist inspection"],
        (K::Hollow, S::Low) => &["Monitor cavity size", "Keep cavity free of standing water"],
        (K::Hollow, S::Medium) => &["Assess residual wall thickness", "Consult with arborist"],
        (K::Hollow, S::High) => &["Structural stability assessment", "Consider tree removal"],
        (K::DeadBranch, S::Low) => &["Remove at next scheduled pruning"],
        (K::DeadBranch, S::Medium) => &["Prune dead wood", "Check crown for further dieback"],
        (K::DeadBranch, S::High) => &["Immediate removal of dead wood", "Restrict access beneath the tree"],
        (K::Unidentified, _) => &[DEFAULT_RECOMMENDATION],
    }
}
