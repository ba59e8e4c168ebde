//! Randomized inference backend.
//!
//! The mock does no real inference. It reports one instance covering the
//! whole image with a sampled species and confidence, and a sampled set of
//! defects for each crop it is shown. Seed it for reproducible runs.

use crate::analysis::{
    domain::{BoundingBox, DefectKind, Instance, MaskPolygon, RawDefect, TreeSpecies},
    ports::{DefectModel, InferenceResult, SegmentationModel},
};
use image::{RgbImage, RgbaImage};
use rand::{Rng, SeedableRng, rngs::StdRng};
use std::sync::{Mutex, PoisonError};
use tracing::debug;

/// Sampling tables used by [`MockBackend`].
pub mod mock_statistics {
    use crate::analysis::domain::{DefectKind, TreeSpecies};

    /// Species weights for the single reported instance.
    pub const SPECIES_WEIGHTS: [(TreeSpecies, f64); 6] = [
        (TreeSpecies::Oak, 0.25),
        (TreeSpecies::Pine, 0.20),
        (TreeSpecies::Birch, 0.15),
        (TreeSpecies::Maple, 0.15),
        (TreeSpecies::Cherry, 0.10),
        (TreeSpecies::Unknown, 0.15),
    ];

    /// Inclusive range for the instance confidence.
    pub const INSTANCE_CONFIDENCE: (f64, f64) = (0.65, 0.95);

    /// Weights for how many defects one crop reports.
    pub const DEFECT_COUNT_WEIGHTS: [(usize, f64); 5] =
        [(0, 0.30), (1, 0.35), (2, 0.20), (3, 0.10), (4, 0.05)];

    /// Relative weights for each drawn defect kind.
    pub const DEFECT_KIND_WEIGHTS: [(DefectKind, f64); 8] = [
        (DefectKind::InsectDamage, 0.20),
        (DefectKind::FungalInfection, 0.15),
        (DefectKind::BarkDamage, 0.18),
        (DefectKind::LeafDiscoloration, 0.12),
        (DefectKind::BranchBreakage, 0.10),
        (DefectKind::RootDamage, 0.08),
        (DefectKind::DroughtStress, 0.10),
        (DefectKind::NutrientDeficiency, 0.07),
    ];

    /// Inclusive range for each defect confidence.
    pub const DEFECT_CONFIDENCE: (f64, f64) = (0.45, 0.90);
}

/// Picks a value from a relative-weight table by cumulative roll.
pub(crate) fn pick_weighted<T: Copy, R: Rng + ?Sized>(
    rng: &mut R,
    table: &[(T, f64)],
    fallback: T,
) -> T {
    let total: f64 = table.iter().map(|(_, weight)| weight).sum();
    let roll = rng.random::<f64>() * total;
    let mut cumulative = 0.0;
    for &(value, weight) in table {
        cumulative += weight;
        if roll < cumulative {
            return value;
        }
    }
    fallback
}

/// Randomized backend implementing both model contracts.
#[derive(Debug)]
pub struct MockBackend {
    rng: Mutex<StdRng>,
}

impl MockBackend {
    /// Creates a mock seeded from the operating system.
    #[must_use]
    pub fn new() -> Self {
        Self {
            rng: Mutex::new(StdRng::from_os_rng()),
        }
    }

    /// Creates a mock with a fixed seed.
    #[must_use]
    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: Mutex::new(StdRng::seed_from_u64(seed)),
        }
    }

    fn with_rng<T>(&self, f: impl FnOnce(&mut StdRng) -> T) -> T {
        let mut rng = self.rng.lock().unwrap_or_else(PoisonError::into_inner);
        f(&mut rng)
    }
}

impl Default for MockBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl SegmentationModel for MockBackend {
    fn segment(&self, image: &RgbImage) -> InferenceResult<Vec<Instance>> {
        let (width, height) = image.dimensions();
        let bbox = BoundingBox::new(0, 0, width, height);
        let instance = self.with_rng(|rng| {
            let species =
                pick_weighted(rng, &mock_statistics::SPECIES_WEIGHTS, TreeSpecies::Unknown);
            let (low, high) = mock_statistics::INSTANCE_CONFIDENCE;
            Instance {
                label: species.model_label().to_owned(),
                confidence: rng.random_range(low..=high),
                bbox,
                mask: MaskPolygon::from_bbox(bbox),
            }
        });
        debug!(label = %instance.label, confidence = instance.confidence, "mock segmentation");
        Ok(vec![instance])
    }
}

impl DefectModel for MockBackend {
    fn detect_defects(&self, _crop: &RgbaImage) -> InferenceResult<Vec<RawDefect>> {
        let defects = self.with_rng(|rng| {
            let draws = pick_weighted(rng, &mock_statistics::DEFECT_COUNT_WEIGHTS, 0);
            let mut kinds: Vec<DefectKind> = Vec::with_capacity(draws);
            for _ in 0..draws {
                let kind = pick_weighted(
                    rng,
                    &mock_statistics::DEFECT_KIND_WEIGHTS,
                    DefectKind::InsectDamage,
                );
                if !kinds.contains(&kind) {
                    kinds.push(kind);
                }
            }
            let (low, high) = mock_statistics::DEFECT_CONFIDENCE;
            kinds
                .into_iter()
                .map(|kind| RawDefect::new(kind.as_str(), Some(rng.random_range(low..=high))))
                .collect::<Vec<_>>()
        });
        debug!(count = defects.len(), "mock defect detection");
        Ok(defects)
    }
}
