//! Configuration for grouping, classification, and training.
//!
//! Every tunable the system's behavior hinges on lives here rather than as
//! a hard-coded constant: the fuzzy acceptance threshold, the dynamic
//! threshold window, the classifier's minimum-sample threshold, learning
//! parameters, and the training-loop bounds.

pub mod defaults;

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::errors::ConfigError;

/// Top-level configuration, loadable from TOML.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct TallyConfig {
    pub similarity: SimilarityConfig,
    pub classifier: ClassifierConfig,
    pub training: TrainingConfig,
}

/// Fuzzy string-grouping tunables.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SimilarityConfig {
    /// Normalized-LCS score a group must reach to be a candidate.
    pub threshold: f64,
    /// Member count at which a group starts computing its own, tighter
    /// acceptance threshold from pairwise member similarity.
    pub window: usize,
}

/// Per-cluster classifier tunables.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ClassifierConfig {
    /// Fixed encoding width: one input per character, zero padded.
    pub inputs: usize,
    /// Hidden layer width.
    pub hidden: usize,
    /// Distinct accepted identities required before readiness flags are
    /// trusted. Readiness requires strictly more than this many.
    pub min_samples: usize,
    /// Backpropagation step size.
    pub learning_rate: f64,
    /// Training passes performed per accept/reject call.
    pub train_iterations: usize,
    /// Oscillation-counter multiple at which polarization is reported.
    pub polarize_limit: usize,
}

/// Training-protocol bounds.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TrainingConfig {
    /// Hard cap on accept/reject pairs per training loop.
    pub iteration_cap: usize,
    /// How many hay members are mixed into a reject pool.
    pub hay_sample: usize,
}

impl TallyConfig {
    /// Load configuration from a TOML file. Missing fields fall back to
    /// defaults; a missing file is an error, not a silent default.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;
        toml::from_str(&raw).map_err(|e| ConfigError::Parse {
            message: e.to_string(),
        })
    }
}

impl Default for SimilarityConfig {
    fn default() -> Self {
        Self {
            threshold: defaults::SIMILARITY_THRESHOLD,
            window: defaults::SIMILARITY_WINDOW,
        }
    }
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            inputs: defaults::CLASSIFIER_INPUTS,
            hidden: defaults::CLASSIFIER_HIDDEN,
            min_samples: defaults::MIN_SAMPLES,
            learning_rate: defaults::LEARNING_RATE,
            train_iterations: defaults::TRAIN_ITERATIONS,
            polarize_limit: defaults::POLARIZE_LIMIT,
        }
    }
}

impl Default for TrainingConfig {
    fn default() -> Self {
        Self {
            iteration_cap: defaults::ITERATION_CAP,
            hay_sample: defaults::HAY_SAMPLE,
        }
    }
}
