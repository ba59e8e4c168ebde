//! Application services for tree image analysis.

mod aggregator;
mod backend;
mod isolation;
mod normalizer;
mod pipeline;

pub use aggregator::{Aggregator, Jitter, ScoringPolicy, SeverityPolicy, SeverityWeights, health_score};
pub use backend::{BackendKind, InferenceBackend, ParseBackendKindError};
pub use isolation::{isolate_instance, select_primary};
pub use normalizer::{ImageNormalizer, NormalizeError, NormalizerConfig};
pub use pipeline::{AnalysisError, AnalysisPipeline, PipelineConfig};
