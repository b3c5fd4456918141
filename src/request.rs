//! Generation requests: what to generate, how much, and in which format.

use crate::distribution::{self, DistributionError, DistributionPlan};
use corpus_templates::{Registry, TemplateError, TemplateFamily};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const DEFAULT_BATCH_SIZE: usize = 1000;

/// Counts above this are always generated in streaming mode.
pub const DEFAULT_STREAMING_THRESHOLD: u64 = 50_000;

#[derive(Debug, Error)]
pub enum RequestError {
    #[error(transparent)]
    Template(#[from] TemplateError),

    #[error("batch size must be greater than 0")]
    ZeroBatchSize,

    #[error("flush interval must be greater than 0")]
    ZeroFlushInterval,

    #[error("invalid weight table: {0}")]
    Weights(#[from] DistributionError),

    #[error(
        "JSON array output is limited to {threshold} documents (requested {count}); use ndjson for larger corpora"
    )]
    ArrayTooLarge { count: u64, threshold: u64 },
}

/// One tier of the active family, or a weighted mix of all of them
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum TierSelector {
    #[default]
    Mixed,
    Tier(String),
}

impl TierSelector {
    pub fn is_mixed(&self) -> bool {
        matches!(self, TierSelector::Mixed)
    }
}

impl std::str::FromStr for TierSelector {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lower = s.trim().to_lowercase();
        Ok(if lower == "mixed" {
            TierSelector::Mixed
        } else {
            TierSelector::Tier(lower)
        })
    }
}

impl std::fmt::Display for TierSelector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TierSelector::Mixed => write!(f, "mixed"),
            TierSelector::Tier(name) => write!(f, "{}", name),
        }
    }
}

/// Output serialization format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// One compact document per line
    #[default]
    Ndjson,
    /// A single top-level array
    Json,
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "ndjson" | "jsonl" => Ok(OutputFormat::Ndjson),
            "json" => Ok(OutputFormat::Json),
            _ => Err(format!(
                "Unknown format: {}. Valid options: ndjson, json",
                s
            )),
        }
    }
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OutputFormat::Ndjson => write!(f, "ndjson"),
            OutputFormat::Json => write!(f, "json"),
        }
    }
}

/// An immutable description of one corpus to generate.
///
/// Built with [`GenerationRequest::new`] and the `with_*` methods; checked
/// against a [`Registry`] by [`GenerationRequest::validate`] before any output
/// is opened.
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationRequest {
    pub family: String,
    pub tier: TierSelector,
    pub total_count: u64,
    pub batch_size: usize,
    /// `None` flushes once per batch
    pub flush_interval: Option<usize>,
    pub format: OutputFormat,
    /// Pretty-print array output; NDJSON is always compact
    pub pretty: bool,
    /// `None` draws a fresh seed, reported back in the statistics
    pub seed: Option<u64>,
    pub streaming: bool,
    /// Counts above this stream. Shuffled runs at or below it hold the whole
    /// corpus in memory, so peak memory grows with the threshold
    pub streaming_threshold: u64,
    pub shuffle: bool,
    /// Override of the family's default weight table, in mixing order
    pub weights: Option<Vec<(String, f64)>>,
}

impl GenerationRequest {
    pub fn new(family: impl Into<String>, tier: TierSelector, total_count: u64) -> Self {
        Self {
            family: family.into(),
            tier,
            total_count,
            batch_size: DEFAULT_BATCH_SIZE,
            flush_interval: None,
            format: OutputFormat::Ndjson,
            pretty: false,
            seed: None,
            streaming: false,
            streaming_threshold: DEFAULT_STREAMING_THRESHOLD,
            shuffle: true,
            weights: None,
        }
    }

    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size;
        self
    }

    pub fn with_flush_interval(mut self, flush_interval: usize) -> Self {
        self.flush_interval = Some(flush_interval);
        self
    }

    pub fn with_format(mut self, format: OutputFormat) -> Self {
        self.format = format;
        self
    }

    pub fn with_pretty(mut self, pretty: bool) -> Self {
        self.pretty = pretty;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn with_streaming(mut self, streaming: bool) -> Self {
        self.streaming = streaming;
        self
    }

    pub fn with_streaming_threshold(mut self, threshold: u64) -> Self {
        self.streaming_threshold = threshold;
        self
    }

    pub fn with_shuffle(mut self, shuffle: bool) -> Self {
        self.shuffle = shuffle;
        self
    }

    pub fn with_weights(mut self, weights: Vec<(String, f64)>) -> Self {
        self.weights = Some(weights);
        self
    }

    /// Documents written between forced flushes
    pub fn effective_flush_interval(&self) -> usize {
        self.flush_interval.unwrap_or(self.batch_size)
    }

    /// Streaming is forced once the count passes the threshold
    pub fn is_streaming(&self) -> bool {
        self.streaming || self.total_count > self.streaming_threshold
    }

    /// Whether the whole corpus is materialized and shuffled before writing
    pub fn shuffles(&self) -> bool {
        self.shuffle && self.tier.is_mixed() && !self.is_streaming()
    }

    /// Validate the request and resolve its ordered weight table.
    ///
    /// A single tier resolves to `[(tier, 1.0)]`; a mixed request uses the
    /// override table if present, else the family's defaults.
    pub fn validate(&self, registry: &Registry) -> Result<Vec<(String, f64)>, RequestError> {
        if self.batch_size == 0 {
            return Err(RequestError::ZeroBatchSize);
        }
        if self.flush_interval == Some(0) {
            return Err(RequestError::ZeroFlushInterval);
        }
        if self.format == OutputFormat::Json && self.total_count > self.streaming_threshold {
            return Err(RequestError::ArrayTooLarge {
                count: self.total_count,
                threshold: self.streaming_threshold,
            });
        }

        let family = registry.family(&self.family)?;
        let weights = match &self.tier {
            TierSelector::Tier(name) => vec![(family.resolve_tier(name)?.name.to_string(), 1.0)],
            TierSelector::Mixed => match &self.weights {
                Some(overrides) => resolve_overrides(family, overrides)?,
                None => family.default_weights(),
            },
        };
        distribution::validate_weights(&weights)?;
        Ok(weights)
    }

    /// Validate and compute the distribution plan
    pub fn plan(&self, registry: &Registry) -> Result<DistributionPlan, RequestError> {
        let weights = self.validate(registry)?;
        Ok(distribution::allocate(self.total_count, &weights)?)
    }
}

fn resolve_overrides(
    family: &dyn TemplateFamily,
    overrides: &[(String, f64)],
) -> Result<Vec<(String, f64)>, RequestError> {
    overrides
        .iter()
        .map(|(tier, weight)| -> Result<(String, f64), RequestError> {
            Ok((family.resolve_tier(tier)?.name.to_string(), *weight))
        })
        .collect()
}
