//! Environment-driven configuration for the worker.
//!
//! Every setting has a default; `CANOPY_*` variables override them. A
//! variable that is set but cannot be parsed is an error rather than a
//! silent fallback.

use crate::analysis::services::{BackendKind, NormalizerConfig, PipelineConfig};
use crate::task::services::{DispatchPolicy, RetryPolicy};
use crate::worker::DEFAULT_WORKER_COUNT;
use camino::Utf8PathBuf;
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;

/// Default root directory for source and processed images.
pub const DEFAULT_UPLOAD_DIR: &str = "uploads";

/// Errors raised while loading configuration.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ConfigError {
    /// The variable is set but does not parse.
    #[error("{variable}={value:?} is not a valid {expected}")]
    InvalidValue {
        /// Environment variable name.
        variable: &'static str,
        /// Raw value found.
        value: String,
        /// Description of the accepted format.
        expected: &'static str,
    },

    /// The variable parses but violates a constraint.
    #[error("{variable}={value} is out of range: must be {constraint}")]
    OutOfRange {
        /// Environment variable name.
        variable: &'static str,
        /// Parsed value, rendered.
        value: String,
        /// Description of the accepted range.
        constraint: &'static str,
    },
}

/// Complete worker configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct CanopyConfig {
    /// Number of concurrent workers.
    pub workers: usize,
    /// Inference backend selection.
    pub backend: BackendKind,
    /// Seed for the mock backend and score sampling.
    pub mock_seed: Option<u64>,
    /// Root directory of the image store.
    pub upload_dir: Utf8PathBuf,
    /// Normalizer bounds and JPEG quality.
    pub normalizer: NormalizerConfig,
    /// Baseline confidence and instance coverage.
    pub pipeline: PipelineConfig,
    /// Retry budget and processing lease.
    pub dispatch: DispatchPolicy,
}

impl Default for CanopyConfig {
    fn default() -> Self {
        Self {
            workers: DEFAULT_WORKER_COUNT,
            backend: BackendKind::Mock,
            mock_seed: None,
            upload_dir: Utf8PathBuf::from(DEFAULT_UPLOAD_DIR),
            normalizer: NormalizerConfig::default(),
            pipeline: PipelineConfig::default(),
            dispatch: DispatchPolicy::default(),
        }
    }
}

impl CanopyConfig {
    /// Loads configuration from the process environment.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when a set variable is malformed or out of
    /// range.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Loads configuration through an arbitrary variable lookup.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when a set variable is malformed or out of
    /// range.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let env = Lookup(lookup);

        let workers = env
            .parse::<usize>("CANOPY_WORKERS", "worker count")?
            .unwrap_or(defaults.workers);
        if workers == 0 {
            return Err(out_of_range("CANOPY_WORKERS", workers, "at least 1"));
        }

        let backend = match env.raw("CANOPY_BACKEND") {
            Some(value) => {
                BackendKind::try_from(value.as_str()).map_err(|_| ConfigError::InvalidValue {
                    variable: "CANOPY_BACKEND",
                    value,
                    expected: "backend (mock or real)",
                })?
            }
            None => defaults.backend,
        };

        let mock_seed = env.parse::<u64>("CANOPY_MOCK_SEED", "unsigned integer seed")?;
        let upload_dir = env
            .raw("CANOPY_UPLOAD_DIR")
            .filter(|value| !value.trim().is_empty())
            .map_or(defaults.upload_dir, Utf8PathBuf::from);

        let normalizer = load_normalizer(&env, defaults.normalizer)?;
        let pipeline = load_pipeline(&env, defaults.pipeline, mock_seed)?;
        let dispatch = load_dispatch(&env, defaults.dispatch)?;

        Ok(Self {
            workers,
            backend,
            mock_seed,
            upload_dir,
            normalizer,
            pipeline,
            dispatch,
        })
    }
}

struct Lookup<F>(F);

impl<F> Lookup<F>
where
    F: Fn(&str) -> Option<String>,
{
    fn raw(&self, variable: &str) -> Option<String> {
        (self.0)(variable)
    }

    fn parse<T: FromStr>(
        &self,
        variable: &'static str,
        expected: &'static str,
    ) -> Result<Option<T>, ConfigError> {
        let Some(value) = self.raw(variable) else {
            return Ok(None);
        };
        value
            .trim()
            .parse::<T>()
            .map(Some)
            .map_err(|_| ConfigError::InvalidValue {
                variable,
                value,
                expected,
            })
    }

    fn flag(&self, variable: &'static str) -> Result<Option<bool>, ConfigError> {
        let Some(value) = self.raw(variable) else {
            return Ok(None);
        };
        match value.trim().to_ascii_lowercase().as_str() {
            "1" | "true" | "yes" | "on" => Ok(Some(true)),
            "0" | "false" | "no" | "off" => Ok(Some(false)),
            _ => Err(ConfigError::InvalidValue {
                variable,
                value,
                expected: "boolean (true or false)",
            }),
        }
    }

    fn seconds(&self, variable: &'static str) -> Result<Option<Duration>, ConfigError> {
        Ok(self
            .parse::<u64>(variable, "number of seconds")?
            .map(Duration::from_secs))
    }
}

fn out_of_range(
    variable: &'static str,
    value: impl ToString,
    constraint: &'static str,
) -> ConfigError {
    ConfigError::OutOfRange {
        variable,
        value: value.to_string(),
        constraint,
    }
}

fn load_normalizer<F>(
    env: &Lookup<F>,
    defaults: NormalizerConfig,
) -> Result<NormalizerConfig, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let max_width = env
        .parse::<u32>("CANOPY_MAX_WIDTH", "pixel width")?
        .unwrap_or(defaults.max_width);
    if max_width == 0 {
        return Err(out_of_range("CANOPY_MAX_WIDTH", max_width, "at least 1"));
    }
    let max_height = env
        .parse::<u32>("CANOPY_MAX_HEIGHT", "pixel height")?
        .unwrap_or(defaults.max_height);
    if max_height == 0 {
        return Err(out_of_range("CANOPY_MAX_HEIGHT", max_height, "at least 1"));
    }
    let jpeg_quality = env
        .parse::<u8>("CANOPY_JPEG_QUALITY", "JPEG quality")?
        .unwrap_or(defaults.jpeg_quality);
    if !(1..=100).contains(&jpeg_quality) {
        return Err(out_of_range(
            "CANOPY_JPEG_QUALITY",
            jpeg_quality,
            "between 1 and 100",
        ));
    }
    Ok(NormalizerConfig {
        max_width,
        max_height,
        jpeg_quality,
    })
}

/// The scoring seed is the mock seed plus one, wrapping.
fn load_pipeline<F>(
    env: &Lookup<F>,
    defaults: PipelineConfig,
    mock_seed: Option<u64>,
) -> Result<PipelineConfig, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let baseline_confidence = env
        .parse::<f64>("CANOPY_BASELINE_CONFIDENCE", "decimal number")?
        .unwrap_or(defaults.baseline_confidence);
    if !(0.0..=1.0).contains(&baseline_confidence) {
        return Err(out_of_range(
            "CANOPY_BASELINE_CONFIDENCE",
            baseline_confidence,
            "between 0 and 1",
        ));
    }
    let analyze_all_instances = env
        .flag("CANOPY_ANALYZE_ALL_INSTANCES")?
        .unwrap_or(defaults.analyze_all_instances);
    Ok(PipelineConfig {
        baseline_confidence,
        analyze_all_instances,
        scoring_seed: mock_seed
            .map(|seed| seed.wrapping_add(1))
            .or(defaults.scoring_seed),
    })
}

fn load_dispatch<F>(env: &Lookup<F>, defaults: DispatchPolicy) -> Result<DispatchPolicy, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let max_retries = env
        .parse::<u32>("CANOPY_MAX_RETRIES", "retry count")?
        .unwrap_or(defaults.retry.max_retries);
    let base_delay = env
        .seconds("CANOPY_RETRY_BASE_DELAY_SECS")?
        .unwrap_or(defaults.retry.base_delay);
    let max_delay = env
        .seconds("CANOPY_RETRY_MAX_DELAY_SECS")?
        .unwrap_or(defaults.retry.max_delay);
    if max_delay < base_delay {
        return Err(out_of_range(
            "CANOPY_RETRY_MAX_DELAY_SECS",
            max_delay.as_secs(),
            "at least CANOPY_RETRY_BASE_DELAY_SECS",
        ));
    }
    let processing_lease = env
        .seconds("CANOPY_PROCESSING_LEASE_SECS")?
        .unwrap_or(defaults.processing_lease);
    Ok(DispatchPolicy {
        retry: RetryPolicy {
            max_retries,
            base_delay,
            max_delay,
        },
        processing_lease,
    })
}
