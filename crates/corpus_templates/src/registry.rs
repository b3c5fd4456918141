//! Template registry: maps a family and tier name to a document generator.

use crate::document::Document;
use crate::families::{EcommerceFamily, GenericFamily, LogsFamily, NewsFamily, TimeSeriesFamily};
use rand_chacha::ChaCha8Rng;
use serde::Serialize;
use thiserror::Error;

/// The single random source threaded through generation.
pub type CorpusRng = ChaCha8Rng;

#[derive(Debug, Error)]
pub enum TemplateError {
    #[error("unknown family '{name}'. Available families: {available}")]
    UnknownFamily { name: String, available: String },

    #[error("unknown tier '{tier}' for family '{family}'. Valid tiers: {valid}")]
    UnknownTier {
        family: String,
        tier: String,
        valid: String,
    },

    #[error("template produced a {found} instead of an object")]
    NotAnObject { found: &'static str },

    #[error("document is missing a string 'id' field")]
    MissingId,

    #[error("template failed: {0}")]
    Failed(String),
}

/// Nominal serialized size band of a tier, in bytes.
///
/// Informational only: generators aim for the band but nothing enforces it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SizeBand {
    pub min_bytes: usize,
    /// `None` means unbounded
    pub max_bytes: Option<usize>,
}

impl SizeBand {
    pub const fn new(min_bytes: usize, max_bytes: usize) -> Self {
        Self {
            min_bytes,
            max_bytes: Some(max_bytes),
        }
    }

    pub const fn at_least(min_bytes: usize) -> Self {
        Self {
            min_bytes,
            max_bytes: None,
        }
    }

    pub fn contains(&self, len: usize) -> bool {
        len >= self.min_bytes && self.max_bytes.is_none_or(|max| len <= max)
    }
}

/// Static description of one tier within a family
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TierSpec {
    pub name: &'static str,
    /// Default share of a mixed corpus
    pub weight: f64,
    pub band: SizeBand,
    pub description: &'static str,
}

/// A family of document tiers sharing a default weight table.
///
/// Implementations must only consume randomness from the supplied RNG and
/// must not keep mutable state between calls.
pub trait TemplateFamily: Send + Sync {
    fn name(&self) -> &'static str;

    /// Tiers in their canonical mixing order
    fn tiers(&self) -> &'static [TierSpec];

    /// Build one document of `tier` carrying `id` as its identifier.
    fn generate(
        &self,
        tier: &str,
        id: &str,
        rng: &mut CorpusRng,
    ) -> Result<Document, TemplateError>;

    fn resolve_tier(&self, name: &str) -> Result<&'static TierSpec, TemplateError> {
        let lower = name.to_lowercase();
        self.tiers()
            .iter()
            .find(|t| t.name == lower)
            .ok_or_else(|| self.unknown_tier(name))
    }

    /// Documents form a sequence keyed by their index and are never shuffled
    fn ordered(&self) -> bool {
        false
    }

    /// Ordered `(tier, weight)` table used for mixed corpora
    fn default_weights(&self) -> Vec<(String, f64)> {
        self.tiers()
            .iter()
            .map(|t| (t.name.to_string(), t.weight))
            .collect()
    }

    fn unknown_tier(&self, tier: &str) -> TemplateError {
        TemplateError::UnknownTier {
            family: self.name().to_string(),
            tier: tier.to_string(),
            valid: self
                .tiers()
                .iter()
                .map(|t| t.name)
                .collect::<Vec<_>>()
                .join(", "),
        }
    }
}

/// Registered template families, looked up by name.
pub struct Registry {
    families: Vec<Box<dyn TemplateFamily>>,
}

impl Registry {
    /// An empty registry
    pub fn new() -> Self {
        Self {
            families: Vec::new(),
        }
    }

    /// Registry with the generic, logs, ecommerce, news and timeseries families
    pub fn with_builtin_families() -> Self {
        let mut registry = Self::new();
        registry.register(Box::new(GenericFamily));
        registry.register(Box::new(LogsFamily));
        registry.register(Box::new(EcommerceFamily));
        registry.register(Box::new(NewsFamily));
        registry.register(Box::new(TimeSeriesFamily));
        registry
    }

    /// Add a family, replacing any family registered under the same name
    pub fn register(&mut self, family: Box<dyn TemplateFamily>) {
        self.families.retain(|f| f.name() != family.name());
        self.families.push(family);
    }

    pub fn family(&self, name: &str) -> Result<&dyn TemplateFamily, TemplateError> {
        let lower = name.to_lowercase();
        self.families
            .iter()
            .find(|f| f.name() == lower)
            .map(|f| f.as_ref())
            .ok_or_else(|| TemplateError::UnknownFamily {
                name: name.to_string(),
                available: self.family_names().join(", "),
            })
    }

    pub fn family_names(&self) -> Vec<&'static str> {
        self.families.iter().map(|f| f.name()).collect()
    }
}

impl Default for Registry {
    fn default() -> Self {
        Self::with_builtin_families()
    }
}
