//! Run statistics: an append-only collector and the frozen report it yields.

use crate::request::OutputFormat;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// How a run ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum RunStatus {
    Completed,
    Cancelled,
    Aborted,
}

impl std::fmt::Display for RunStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RunStatus::Completed => write!(f, "completed"),
            RunStatus::Cancelled => write!(f, "cancelled"),
            RunStatus::Aborted => write!(f, "aborted"),
        }
    }
}

/// Documents and serialized bytes produced for one tier
#[derive(Debug, Clone, PartialEq, Eq, Serialize, JsonSchema)]
pub struct TierCount {
    pub tier: String,
    pub documents: u64,
    pub bytes: u64,
}

/// Writer-side figures folded into the final statistics
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WriteSummary {
    /// Bytes handed to the sink before compression, separators included
    pub bytes_written: u64,
    pub flushes: u64,
    /// Hex SHA-256 of the uncompressed stream
    pub sha256: String,
}

/// Final statistics of a generation run.
#[derive(Debug, Clone, PartialEq, Serialize, JsonSchema)]
pub struct CorpusStatistics {
    pub document_count: u64,
    /// Serialized document bytes, separators excluded
    pub total_bytes: u64,
    pub bytes_written: u64,
    /// Per-tier counts in plan order
    pub per_tier: Vec<TierCount>,
    pub batches: u64,
    pub flushes: u64,
    pub generation_secs: f64,
    pub write_secs: f64,
    pub seed: u64,
    pub shuffled: bool,
    pub status: RunStatus,
    pub format: OutputFormat,
    pub sha256: String,
}

impl CorpusStatistics {
    pub fn tier_count(&self, tier: &str) -> u64 {
        self.per_tier
            .iter()
            .find(|t| t.tier == tier)
            .map_or(0, |t| t.documents)
    }

    pub fn is_complete(&self) -> bool {
        self.status == RunStatus::Completed
    }

    pub fn average_document_bytes(&self) -> f64 {
        if self.document_count == 0 {
            0.0
        } else {
            self.total_bytes as f64 / self.document_count as f64
        }
    }

    pub fn generation_docs_per_sec(&self) -> Option<f64> {
        rate(self.document_count as f64, self.generation_secs)
    }

    pub fn write_docs_per_sec(&self) -> Option<f64> {
        rate(self.document_count as f64, self.write_secs)
    }

    pub fn write_mb_per_sec(&self) -> Option<f64> {
        rate(self.bytes_written as f64 / (1024.0 * 1024.0), self.write_secs)
    }
}

fn rate(amount: f64, secs: f64) -> Option<f64> {
    (secs > 0.0).then(|| amount / secs)
}

/// Accumulates counts and timings while the pipeline runs.
#[derive(Debug, Clone)]
pub struct StatisticsCollector {
    per_tier: Vec<TierCount>,
    document_count: u64,
    total_bytes: u64,
    batches: u64,
    generation_time: Duration,
    write_time: Duration,
    seed: u64,
    shuffled: bool,
    format: OutputFormat,
}

impl StatisticsCollector {
    pub fn new(seed: u64, format: OutputFormat) -> Self {
        Self {
            per_tier: Vec::new(),
            document_count: 0,
            total_bytes: 0,
            batches: 0,
            generation_time: Duration::ZERO,
            write_time: Duration::ZERO,
            seed,
            shuffled: false,
            format,
        }
    }

    /// Pre-register tiers so the report lists them in plan order, zeros included
    pub fn with_tiers<'a>(mut self, tiers: impl IntoIterator<Item = &'a str>) -> Self {
        for tier in tiers {
            self.tier_entry(tier);
        }
        self
    }

    pub fn record(&mut self, tier: &str, byte_length: usize) {
        let entry = self.tier_entry(tier);
        entry.documents += 1;
        entry.bytes += byte_length as u64;
        self.document_count += 1;
        self.total_bytes += byte_length as u64;
    }

    pub fn record_batch(&mut self) {
        self.batches += 1;
    }

    pub fn add_generation_time(&mut self, elapsed: Duration) {
        self.generation_time += elapsed;
    }

    pub fn add_write_time(&mut self, elapsed: Duration) {
        self.write_time += elapsed;
    }

    pub fn set_shuffled(&mut self, shuffled: bool) {
        self.shuffled = shuffled;
    }

    pub fn document_count(&self) -> u64 {
        self.document_count
    }

    /// Freeze the current counts into a report
    pub fn finish(&self, status: RunStatus, write: &WriteSummary) -> CorpusStatistics {
        CorpusStatistics {
            document_count: self.document_count,
            total_bytes: self.total_bytes,
            bytes_written: write.bytes_written,
            per_tier: self.per_tier.clone(),
            batches: self.batches,
            flushes: write.flushes,
            generation_secs: self.generation_time.as_secs_f64(),
            write_secs: self.write_time.as_secs_f64(),
            seed: self.seed,
            shuffled: self.shuffled,
            status,
            format: self.format,
            sha256: write.sha256.clone(),
        }
    }

    fn tier_entry(&mut self, tier: &str) -> &mut TierCount {
        let pos = match self.per_tier.iter().position(|t| t.tier == tier) {
            Some(pos) => pos,
            None => {
                self.per_tier.push(TierCount {
                    tier: tier.to_string(),
                    documents: 0,
                    bytes: 0,
                });
                self.per_tier.len() - 1
            }
        };
        &mut self.per_tier[pos]
    }
}
