//! Generate command CLI handler.

use super::RequestArgs;
use crate::pipeline::{CancellationToken, Pipeline, PipelineError};
use crate::progress::document_bar;
use crate::request::OutputFormat;
use crate::stats::{CorpusStatistics, RunStatus};
use crate::writer::{Compression, Sink};
use corpus_templates::Registry;
use schemars::JsonSchema;
use serde::Serialize;
use std::path::PathBuf;
use std::time::Duration;

/// JSON output for a generate run
#[derive(Serialize, JsonSchema)]
pub(crate) struct GenerateJsonOutput {
    output: String,
    family: String,
    tier: String,
    requested: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    compression: Option<String>,
    streaming: bool,
    statistics: CorpusStatistics,
    rates: GenerateRates,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

#[derive(Serialize, JsonSchema)]
pub(crate) struct GenerateRates {
    average_document_bytes: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    generation_docs_per_sec: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    write_docs_per_sec: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    write_mb_per_sec: Option<f64>,
}

pub fn run(
    args: RequestArgs,
    output: PathBuf,
    format: String,
    pretty: bool,
    time_limit: Option<f64>,
    progress: bool,
    json: bool,
) -> anyhow::Result<()> {
    let format = format
        .parse::<OutputFormat>()
        .map_err(|e| anyhow::anyhow!("{}", e))?;
    let request = args
        .to_request()?
        .with_format(format)
        .with_pretty(pretty);

    if pretty && format == OutputFormat::Ndjson {
        tracing::warn!("--pretty only applies to JSON array output; NDJSON stays compact");
    }

    let sink = Sink::from_path(&output);
    // documents go to stdout, so the report must not
    let report_to_stderr = sink == Sink::Stdout;
    let compression = sink.compression();

    let token = CancellationToken::new();
    if let Some(secs) = time_limit {
        if !(secs.is_finite() && secs > 0.0) {
            anyhow::bail!("--time-limit must be a positive number of seconds");
        }
        let limit = Duration::from_secs_f64(secs);
        let token = token.clone();
        std::thread::spawn(move || {
            std::thread::sleep(limit);
            token.cancel();
        });
    }

    let registry = Registry::with_builtin_families();
    let family = request.family.clone();
    let tier = request.tier.to_string();
    let requested = request.total_count;
    let streaming = request.is_streaming();

    if !json && !report_to_stderr {
        println!(
            "Generating {} {} documents ({}) to {}",
            requested, family, tier, sink
        );
        if compression != Compression::None {
            println!("Compression: {}", compression);
        }
        if streaming {
            println!("Mode: streaming");
        }
        println!();
    }

    let mut pipeline = Pipeline::new(&registry, request).with_cancellation(token);
    let bar = (progress && !json).then(|| document_bar(requested));
    if let Some(bar) = bar.clone() {
        pipeline = pipeline.with_progress(move |documents, _bytes| bar.set_position(documents));
    }

    let result = pipeline.run(&sink);
    if let Some(bar) = &bar {
        bar.finish_and_clear();
    }

    let (stats, failure) = match result {
        Ok(stats) => (stats, None),
        Err(PipelineError::Aborted { cause, partial }) => (*partial, Some(cause)),
        Err(e @ PipelineError::Request(_)) => return Err(e.into()),
    };

    if json {
        let output_json = GenerateJsonOutput {
            output: sink.to_string(),
            family,
            tier,
            requested,
            compression: (compression != Compression::None).then(|| compression.to_string()),
            streaming,
            rates: GenerateRates {
                average_document_bytes: stats.average_document_bytes(),
                generation_docs_per_sec: stats.generation_docs_per_sec(),
                write_docs_per_sec: stats.write_docs_per_sec(),
                write_mb_per_sec: stats.write_mb_per_sec(),
            },
            error: failure.as_ref().map(|e| e.to_string()),
            statistics: stats.clone(),
        };
        let text = serde_json::to_string_pretty(&output_json)?;
        if report_to_stderr {
            eprintln!("{}", text);
        } else {
            println!("{}", text);
        }
    } else {
        let report = render_report(&stats);
        if report_to_stderr {
            eprint!("{}", report);
        } else {
            print!("{}", report);
        }
    }

    match (stats.status, failure) {
        (_, Some(cause)) => Err(anyhow::Error::new(cause).context(format!(
            "generation aborted after {} documents",
            stats.document_count
        ))),
        (RunStatus::Cancelled, None) => anyhow::bail!(
            "generation cancelled after {} documents",
            stats.document_count
        ),
        _ => Ok(()),
    }
}

fn render_report(stats: &CorpusStatistics) -> String {
    const MB: f64 = 1024.0 * 1024.0;
    let mut out = String::new();

    let headline = match stats.status {
        RunStatus::Completed => "✓ Generation completed".to_string(),
        RunStatus::Cancelled => format!("✗ Cancelled after {} documents", stats.document_count),
        RunStatus::Aborted => format!("✗ Aborted after {} documents", stats.document_count),
    };
    out.push_str(&format!("{}\n\nStatistics:\n", headline));
    out.push_str(&format!("  Documents: {}\n", stats.document_count));
    out.push_str(&format!(
        "  Total size: {:.2} MB ({} bytes written)\n",
        stats.total_bytes as f64 / MB,
        stats.bytes_written
    ));
    out.push_str(&format!(
        "  Average size: {:.2} KB\n",
        stats.average_document_bytes() / 1024.0
    ));
    out.push_str(&format!(
        "  Generation time: {:.3}s{}\n",
        stats.generation_secs,
        stats
            .generation_docs_per_sec()
            .map(|r| format!(" ({:.0} docs/sec)", r))
            .unwrap_or_default()
    ));
    out.push_str(&format!(
        "  Write time: {:.3}s{}\n",
        stats.write_secs,
        stats
            .write_docs_per_sec()
            .zip(stats.write_mb_per_sec())
            .map(|(docs, mb)| format!(" ({:.0} docs/sec, {:.2} MB/s)", docs, mb))
            .unwrap_or_default()
    ));
    out.push_str(&format!(
        "  Batches: {}, flushes: {}\n",
        stats.batches, stats.flushes
    ));
    out.push_str(&format!("  Seed: {}\n", stats.seed));
    out.push_str(&format!(
        "  Shuffled: {}\n",
        if stats.shuffled { "yes" } else { "no" }
    ));
    out.push_str(&format!("  SHA-256: {}\n", stats.sha256));

    if !stats.per_tier.is_empty() {
        out.push_str("\nPer-tier breakdown:\n");
        for tier in &stats.per_tier {
            let avg_kb = if tier.documents > 0 {
                tier.bytes as f64 / tier.documents as f64 / 1024.0
            } else {
                0.0
            };
            out.push_str(&format!(
                "  {}: {} documents (avg {:.2} KB)\n",
                tier.tier, tier.documents, avg_kb
            ));
        }
    }

    let status_line = match stats.status {
        RunStatus::Completed => "completed".to_string(),
        status => format!("{} after {} documents", status, stats.document_count),
    };
    out.push_str(&format!("\nStatus: {}\n", status_line));
    out
}
