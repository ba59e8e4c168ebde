//! Mapping of raw model output onto the public taxonomy, and health
//! scoring.

use crate::analysis::{
    adapters::mock::pick_weighted,
    domain::{
        AnalysisReport, DefectKind, Finding, Instance, RawDefect, Severity, TreeSpecies,
        TreeSummary, clamp_unit,
    },
};
use rand::Rng;
use tracing::warn;

/// Relative weights for sampled severities.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SeverityWeights {
    /// Weight of [`Severity::Low`].
    pub low: f64,
    /// Weight of [`Severity::Medium`].
    pub medium: f64,
    /// Weight of [`Severity::High`].
    pub high: f64,
}

impl Default for SeverityWeights {
    fn default() -> Self {
        Self {
            low: 0.50,
            medium: 0.35,
            high: 0.15,
        }
    }
}

/// How a finding's severity is decided.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SeverityPolicy {
    /// Severity is drawn from weights (stochastic backends).
    Sampled(SeverityWeights),
    /// Severity follows the defect confidence (deterministic backends).
    ///
    /// Confidence at or above `high_at` is high, at or above `medium_at` is
    /// medium, anything lower is low. A defect without confidence is medium.
    ConfidenceRule {
        /// Lower bound for medium.
        medium_at: f64,
        /// Lower bound for high.
        high_at: f64,
    },
}

impl SeverityPolicy {
    /// Default rule used by deterministic backends.
    pub const DETERMINISTIC: Self = Self::ConfidenceRule {
        medium_at: 0.60,
        high_at: 0.80,
    };

    fn assign<R: Rng + ?Sized>(&self, confidence: Option<f64>, rng: &mut R) -> Severity {
        match *self {
            Self::Sampled(weights) => pick_weighted(
                rng,
                &[
                    (Severity::Low, weights.low),
                    (Severity::Medium, weights.medium),
                    (Severity::High, weights.high),
                ],
                Severity::Low,
            ),
            Self::ConfidenceRule { medium_at, high_at } => match confidence {
                None => Severity::Medium,
                Some(value) if value >= high_at => Severity::High,
                Some(value) if value >= medium_at => Severity::Medium,
                Some(_) => Severity::Low,
            },
        }
    }
}

/// Multiplicative noise applied to the health score.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Jitter {
    /// Factor is always `1.0`.
    None,
    /// Factor drawn uniformly from `[low, high]`.
    Uniform {
        /// Smallest factor.
        low: f64,
        /// Largest factor.
        high: f64,
    },
}

impl Jitter {
    /// Jitter used by stochastic backends.
    pub const STOCHASTIC: Self = Self::Uniform {
        low: 0.9,
        high: 1.1,
    };

    fn sample<R: Rng + ?Sized>(self, rng: &mut R) -> f64 {
        match self {
            Self::None => 1.0,
            Self::Uniform { low, high } if high > low => rng.random_range(low..=high),
            Self::Uniform { low, .. } => low,
        }
    }
}

/// Scoring behaviour supplied by the active backend.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScoringPolicy {
    /// Severity assignment.
    pub severity: SeverityPolicy,
    /// Health-score noise.
    pub jitter: Jitter,
}

impl ScoringPolicy {
    /// Policy for backends that report real results.
    pub const DETERMINISTIC: Self = Self {
        severity: SeverityPolicy::DETERMINISTIC,
        jitter: Jitter::None,
    };

    /// Policy for the randomized mock backend.
    #[must_use]
    pub fn stochastic() -> Self {
        Self {
            severity: SeverityPolicy::Sampled(SeverityWeights::default()),
            jitter: Jitter::STOCHASTIC,
        }
    }
}

/// Computes `clamp01(primary_confidence × Π severity_modifier × jitter)`.
#[must_use]
pub fn health_score(primary_confidence: f64, findings: &[Finding], jitter: f64) -> f64 {
    let modifier: f64 = findings
        .iter()
        .map(|finding| finding.severity().health_modifier())
        .product();
    clamp_unit(primary_confidence * modifier * jitter)
}

fn species_of(instance: &Instance) -> TreeSpecies {
    TreeSpecies::from_model_label(&instance.label).unwrap_or_else(|err| {
        warn!(error = %err, "mapping species to fallback");
        TreeSpecies::Unknown
    })
}

/// Turns segmented instances and their raw defects into a report.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Aggregator {
    policy: ScoringPolicy,
    baseline_confidence: f64,
}

impl Aggregator {
    /// Creates an aggregator.
    ///
    /// `baseline_confidence` is reported as both primary confidence and
    /// health score when no instance was detected.
    #[must_use]
    pub fn new(policy: ScoringPolicy, baseline_confidence: f64) -> Self {
        Self {
            policy,
            baseline_confidence: clamp_unit(baseline_confidence),
        }
    }

    /// Returns the scoring policy.
    #[must_use]
    pub const fn policy(&self) -> ScoringPolicy {
        self.policy
    }

    /// Report for an image in which segmentation found nothing.
    #[must_use]
    pub fn empty_report(&self) -> AnalysisReport {
        AnalysisReport::new(
            TreeSpecies::Unknown,
            self.baseline_confidence,
            Vec::new(),
            self.baseline_confidence,
            Vec::new(),
        )
    }

    /// Builds the report for the instance at `primary`.
    ///
    /// `defects` is aligned with `instances`; `None` marks an instance whose
    /// defects were not analyzed. The report's findings concatenate every
    /// analyzed instance's findings in instance order, and the health score
    /// covers all of them. An out-of-range `primary` yields
    /// [`Aggregator::empty_report`].
    ///
    /// Unknown species and defect labels fall back to
    /// [`TreeSpecies::Unknown`] and [`DefectKind::FALLBACK`].
    pub fn aggregate<R: Rng + ?Sized>(
        &self,
        instances: &[Instance],
        primary: usize,
        defects: &[Option<Vec<RawDefect>>],
        rng: &mut R,
    ) -> AnalysisReport {
        let Some(primary_instance) = instances.get(primary) else {
            return self.empty_report();
        };
        let primary_confidence = clamp_unit(primary_instance.confidence);

        let mut trees = Vec::with_capacity(instances.len());
        let mut findings: Vec<Finding> = Vec::new();
        for (index, instance) in instances.iter().enumerate() {
            let raw = defects.get(index).and_then(Option::as_ref);
            let tree_findings: Vec<Finding> = raw
                .map(|raw| {
                    raw.iter()
                        .map(|defect| self.finding(defect, primary_confidence, rng))
                        .collect()
                })
                .unwrap_or_default();
            findings.extend(tree_findings.iter().cloned());
            trees.push(TreeSummary::new(
                index,
                species_of(instance),
                clamp_unit(instance.confidence),
                instance.bbox,
                tree_findings,
                raw.is_some(),
            ));
        }

        let jitter = self.policy.jitter.sample(rng);
        let score = health_score(primary_confidence, &findings, jitter);
        let species = trees
            .get(primary)
            .map_or(TreeSpecies::Unknown, TreeSummary::species);

        AnalysisReport::new(species, primary_confidence, findings, score, trees)
    }

    fn finding<R: Rng + ?Sized>(
        &self,
        defect: &RawDefect,
        primary_confidence: f64,
        rng: &mut R,
    ) -> Finding {
        let kind = DefectKind::from_model_label(&defect.label).unwrap_or_else(|err| {
            warn!(error = %err, "mapping defect to fallback");
            DefectKind::FALLBACK
        });
        let severity = self.policy.severity.assign(defect.confidence, rng);
        let confidence = defect.confidence.unwrap_or(primary_confidence);
        Finding::new(kind, confidence, severity)
    }
}
