//! YAML configuration for the generate and plan commands.
//!
//! Every field is optional; command-line flags override whatever the file
//! sets.
//!
//! ```yaml
//! batch_size: 500
//! flush_interval: 250
//! streaming_threshold: 100000
//! shuffle: false
//! seed: 42
//! weights:
//!   - tier: small
//!     weight: 0.7
//!   - tier: huge
//!     weight: 0.3
//! ```

use crate::request::GenerationRequest;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read config {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yaml_ng::Error,
    },
}

/// One entry of an ordered weight table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeightEntry {
    pub tier: String,
    pub weight: f64,
}

/// Complete YAML configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CorpusConfig {
    pub batch_size: Option<usize>,
    pub flush_interval: Option<usize>,
    pub streaming_threshold: Option<u64>,
    pub shuffle: Option<bool>,
    pub seed: Option<u64>,
    /// Mixing order matters: the last tier absorbs rounding remainders
    pub weights: Vec<WeightEntry>,
}

impl CorpusConfig {
    /// Load configuration from a YAML file
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        serde_yaml_ng::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Fill request fields from the config; call before applying CLI flags
    pub fn apply(&self, mut request: GenerationRequest) -> GenerationRequest {
        if let Some(batch_size) = self.batch_size {
            request.batch_size = batch_size;
        }
        if let Some(flush_interval) = self.flush_interval {
            request.flush_interval = Some(flush_interval);
        }
        if let Some(threshold) = self.streaming_threshold {
            request.streaming_threshold = threshold;
        }
        if let Some(shuffle) = self.shuffle {
            request.shuffle = shuffle;
        }
        if let Some(seed) = self.seed {
            request.seed = Some(seed);
        }
        if !self.weights.is_empty() {
            request.weights = Some(
                self.weights
                    .iter()
                    .map(|w| (w.tier.clone(), w.weight))
                    .collect(),
            );
        }
        request
    }
}
