// Allow dead code for items that are part of the public API but only used in tests
#![allow(dead_code)]

pub mod config;
pub mod distribution;
pub mod pipeline;
pub mod progress;
pub mod request;
pub mod stats;
pub mod writer;

pub use corpus_templates as templates;
