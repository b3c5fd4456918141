//! Document templates for the synthetic corpus generator.
//!
//! A [`Registry`] maps a family name (`generic`, `logs`, `ecommerce`,
//! `news`, `timeseries`) to a [`TemplateFamily`], which builds one [`Document`] per call
//! for a named tier. All randomness comes from the caller's [`CorpusRng`],
//! so a seeded RNG yields identical documents across runs.
//!
//! # Example
//!
//! ```rust
//! use corpus_templates::{CorpusRng, Registry};
//! use rand::SeedableRng;
//!
//! let registry = Registry::with_builtin_families();
//! let family = registry.family("generic").unwrap();
//! let mut rng = CorpusRng::seed_from_u64(42);
//! let doc = family.generate("small", "small_0", &mut rng).unwrap();
//! assert_eq!(doc.id(), "small_0");
//! ```

#![recursion_limit = "256"]

pub mod document;
pub mod fake;
pub mod families;
pub mod registry;

pub use document::Document;
pub use families::{EcommerceFamily, GenericFamily, LogsFamily, NewsFamily, TimeSeriesFamily};
pub use registry::{CorpusRng, Registry, SizeBand, TemplateError, TemplateFamily, TierSpec};
