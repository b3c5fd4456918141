//! End-to-end properties of the generation pipeline, driven through the
//! library API.

use corpus_gen::pipeline::{AbortCause, CancellationToken, Pipeline, PipelineError, PipelineState};
use corpus_gen::request::{GenerationRequest, OutputFormat, TierSelector};
use corpus_gen::stats::RunStatus;
use corpus_gen::templates::Registry;
use corpus_gen::writer::{Compression, Sink, StreamingWriter, WriterOptions};
use serde_json::Value;
use std::collections::HashSet;
use std::fs;
use std::io::{self, Write};
use std::sync::{Arc, Mutex};
use tempfile::TempDir;

fn generate_file(request: GenerationRequest, name: &str) -> (TempDir, String) {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join(name);
    let registry = Registry::with_builtin_families();
    let stats = Pipeline::new(&registry, request)
        .run(&Sink::File(path.clone()))
        .unwrap();
    assert_eq!(stats.status, RunStatus::Completed);
    let content = fs::read_to_string(&path).unwrap();
    (dir, content)
}

fn ids_of(records: &[Value]) -> Vec<String> {
    records
        .iter()
        .map(|r| r["id"].as_str().unwrap().to_string())
        .collect()
}

// =============================================================================
// Counts and ids
// =============================================================================

#[test]
fn test_ndjson_line_count_matches_request() {
    let request = GenerationRequest::new("generic", TierSelector::Mixed, 57)
        .with_seed(1)
        .with_batch_size(10);
    let (_dir, content) = generate_file(request, "corpus.ndjson");

    let records: Vec<Value> = content
        .lines()
        .map(|line| serde_json::from_str(line).unwrap())
        .collect();
    assert_eq!(records.len(), 57);
    assert!(content.ends_with('\n'));

    let ids: HashSet<String> = ids_of(&records).into_iter().collect();
    assert_eq!(ids.len(), 57, "ids must be unique");
}

#[test]
fn test_json_array_length_matches_request() {
    for pretty in [false, true] {
        let request = GenerationRequest::new("news", TierSelector::Mixed, 23)
            .with_seed(5)
            .with_format(OutputFormat::Json)
            .with_pretty(pretty);
        let (_dir, content) = generate_file(request, "corpus.json");

        let value: Value = serde_json::from_str(&content).unwrap();
        let records = value.as_array().unwrap();
        assert_eq!(records.len(), 23);
        assert!(records.iter().all(Value::is_object));
    }
}

#[test]
fn test_per_tier_counts_follow_plan() {
    let registry = Registry::with_builtin_families();
    let request = GenerationRequest::new("generic", TierSelector::Mixed, 100)
        .with_seed(3)
        .with_shuffle(false);
    let plan = request.plan(&registry).unwrap();

    let dir = TempDir::new().unwrap();
    let stats = Pipeline::new(&registry, request)
        .run(&Sink::File(dir.path().join("out.ndjson")))
        .unwrap();

    for allocation in &plan {
        assert_eq!(stats.tier_count(&allocation.tier), allocation.count);
    }
    assert_eq!(stats.document_count, 100);
    let bytes: u64 = stats.per_tier.iter().map(|t| t.bytes).sum();
    assert_eq!(bytes, stats.total_bytes);
}

#[test]
fn test_single_tier_request() {
    let request = GenerationRequest::new("ecommerce", "review".parse().unwrap(), 12).with_seed(8);
    let (_dir, content) = generate_file(request, "reviews.ndjson");

    let records: Vec<Value> = content
        .lines()
        .map(|line| serde_json::from_str(line).unwrap())
        .collect();
    assert_eq!(records.len(), 12);
    assert!(ids_of(&records).iter().all(|id| id.starts_with("review_")));
}

#[test]
fn test_time_series_stays_in_sequence() {
    let registry = Registry::with_builtin_families();
    let request = GenerationRequest::new("timeseries", TierSelector::Mixed, 150)
        .with_seed(4)
        .with_batch_size(40);
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("series.ndjson");
    let stats = Pipeline::new(&registry, request)
        .run(&Sink::File(path.clone()))
        .unwrap();
    assert!(!stats.shuffled);
    assert_eq!(stats.tier_count("ts"), 150);

    let records: Vec<Value> = fs::read_to_string(&path)
        .unwrap()
        .lines()
        .map(|line| serde_json::from_str(line).unwrap())
        .collect();
    for (i, record) in records.iter().enumerate() {
        assert_eq!(record["id"], format!("ts_{}", i));
        assert_eq!(record["sequence_id"].as_u64(), Some(i as u64));
    }
    assert_eq!(records[0]["timestamp"], "2023-12-25T00:00:00");
    assert_eq!(records[149]["timestamp"], "2023-12-25T02:29:00");
}

#[test]
fn test_zero_count_produces_empty_outputs() {
    let (_dir, ndjson) = generate_file(
        GenerationRequest::new("logs", TierSelector::Mixed, 0).with_seed(1),
        "empty.ndjson",
    );
    assert_eq!(ndjson, "");

    let (_dir, json) = generate_file(
        GenerationRequest::new("logs", TierSelector::Mixed, 0)
            .with_seed(1)
            .with_format(OutputFormat::Json),
        "empty.json",
    );
    assert_eq!(json, "[]");
}

// =============================================================================
// Determinism
// =============================================================================

#[test]
fn test_same_seed_gives_identical_bytes() {
    let request = GenerationRequest::new("generic", TierSelector::Mixed, 40)
        .with_seed(2024)
        .with_batch_size(7);
    let (_a, first) = generate_file(request.clone(), "a.ndjson");
    let (_b, second) = generate_file(request, "b.ndjson");
    assert_eq!(first, second);
}

#[test]
fn test_different_seeds_differ() {
    let base = GenerationRequest::new("logs", TierSelector::Mixed, 20);
    let (_a, first) = generate_file(base.clone().with_seed(1), "a.ndjson");
    let (_b, second) = generate_file(base.with_seed(2), "b.ndjson");
    assert_ne!(first, second);
}

#[test]
fn test_digest_matches_written_bytes() {
    use sha2::{Digest, Sha256};

    let dir = TempDir::new().unwrap();
    let path = dir.path().join("corpus.ndjson");
    let registry = Registry::with_builtin_families();
    let request = GenerationRequest::new("news", TierSelector::Mixed, 15).with_seed(4);
    let stats = Pipeline::new(&registry, request)
        .run(&Sink::File(path.clone()))
        .unwrap();

    let content = fs::read(&path).unwrap();
    assert_eq!(stats.bytes_written, content.len() as u64);
    assert_eq!(stats.sha256, hex::encode(Sha256::digest(&content)));
    assert_eq!(stats.seed, 4);
}

#[test]
fn test_compressed_output_decompresses_to_same_corpus() {
    use flate2::read::GzDecoder;
    use std::io::Read;

    let dir = TempDir::new().unwrap();
    let plain = dir.path().join("corpus.ndjson");
    let gzipped = dir.path().join("corpus.ndjson.gz");
    let registry = Registry::with_builtin_families();
    let request = GenerationRequest::new("ecommerce", TierSelector::Mixed, 10).with_seed(6);

    Pipeline::new(&registry, request.clone())
        .run(&Sink::File(plain.clone()))
        .unwrap();
    Pipeline::new(&registry, request)
        .run(&Sink::File(gzipped.clone()))
        .unwrap();

    let mut decoded = String::new();
    GzDecoder::new(fs::File::open(&gzipped).unwrap())
        .read_to_string(&mut decoded)
        .unwrap();
    assert_eq!(decoded, fs::read_to_string(&plain).unwrap());
}

// =============================================================================
// Streaming and flushing
// =============================================================================

#[test]
fn test_streaming_flushes_once_per_batch() {
    let registry = Registry::with_builtin_families();
    let request = GenerationRequest::new("generic", "small".parse().unwrap(), 100_000).with_seed(9);
    assert!(request.is_streaming());

    let writer = StreamingWriter::from_writer(
        Box::new(io::sink()),
        Compression::None,
        WriterOptions::from_request(&request),
    )
    .unwrap();
    let stats = Pipeline::new(&registry, request)
        .run_with_writer(writer)
        .unwrap();

    assert_eq!(stats.document_count, 100_000);
    assert_eq!(stats.batches, 100);
    // one per batch, plus the final drain
    assert_eq!(stats.flushes, 101);
    assert!(!stats.shuffled);
}

#[test]
fn test_large_json_array_rejected_up_front() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("too-big.json");
    let registry = Registry::with_builtin_families();
    let request = GenerationRequest::new("generic", TierSelector::Mixed, 11)
        .with_streaming_threshold(10)
        .with_format(OutputFormat::Json);

    let err = Pipeline::new(&registry, request)
        .run(&Sink::File(path.clone()))
        .unwrap_err();
    assert!(matches!(err, PipelineError::Request(_)));
    assert!(!path.exists());
}

// =============================================================================
// Failure and cancellation
// =============================================================================

/// Accepts `limit` writes, then fails every write after that.
#[derive(Clone)]
struct FailingSink {
    delivered: Arc<Mutex<Vec<u8>>>,
    limit: usize,
}

impl FailingSink {
    fn new(limit: usize) -> Self {
        Self {
            delivered: Arc::default(),
            limit,
        }
    }

    fn delivered(&self) -> Vec<u8> {
        self.delivered.lock().unwrap().clone()
    }
}

impl Write for FailingSink {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        if self.limit == 0 {
            return Err(io::Error::other("disk full"));
        }
        self.limit -= 1;
        self.delivered.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

fn run_against(sink: &FailingSink, request: GenerationRequest) -> PipelineError {
    let registry = Registry::with_builtin_families();
    let writer = StreamingWriter::from_writer(
        Box::new(sink.clone()),
        Compression::None,
        WriterOptions::from_request(&request),
    )
    .unwrap();
    Pipeline::new(&registry, request)
        .run_with_writer(writer)
        .unwrap_err()
}

#[test]
fn test_sink_failure_reports_partial_statistics() {
    let sink = FailingSink::new(5);
    let request = GenerationRequest::new("generic", "small".parse().unwrap(), 20)
        .with_seed(1)
        .with_flush_interval(1);

    let err = run_against(&sink, request);
    let partial = err.partial().expect("abort carries partial statistics");
    assert_eq!(partial.status, RunStatus::Aborted);
    assert_eq!(partial.document_count, 5);
    assert!(err.to_string().contains("aborted after 5 documents"));
}

#[test]
fn test_sink_failure_counts_only_flushed_documents() {
    let sink = FailingSink::new(1);
    let request = GenerationRequest::new("generic", "small".parse().unwrap(), 20)
        .with_seed(1)
        .with_batch_size(10);

    let err = run_against(&sink, request);
    let delivered = sink.delivered();
    assert_eq!(delivered.iter().filter(|&&b| b == b'\n').count(), 10);

    let partial = err.partial().unwrap();
    assert_eq!(partial.document_count, 10);
    assert_eq!(partial.tier_count("small"), 10);
    assert_eq!(partial.bytes_written, delivered.len() as u64);
    assert!(err.to_string().starts_with("aborted after 10 documents: flush failed"));
    assert!(matches!(
        err,
        PipelineError::Aborted {
            cause: AbortCause::Flush { .. },
            ..
        }
    ));
}

#[test]
fn test_aborted_json_array_is_left_unterminated() {
    let sink = FailingSink::new(1);
    let request = GenerationRequest::new("generic", "small".parse().unwrap(), 20)
        .with_seed(1)
        .with_batch_size(10)
        .with_format(OutputFormat::Json);

    let err = run_against(&sink, request);
    assert_eq!(err.partial().unwrap().document_count, 10);

    let delivered = String::from_utf8(sink.delivered()).unwrap();
    assert!(delivered.starts_with('['));
    assert!(!delivered.ends_with(']'));
    assert!(serde_json::from_str::<Value>(&delivered).is_err());
}

#[test]
fn test_unwritable_path_aborts_before_generation() {
    let dir = TempDir::new().unwrap();
    let blocker = dir.path().join("file");
    fs::write(&blocker, "not a directory").unwrap();

    let registry = Registry::with_builtin_families();
    let request = GenerationRequest::new("generic", TierSelector::Mixed, 5).with_seed(1);
    let err = Pipeline::new(&registry, request)
        .run(&Sink::File(blocker.join("corpus.ndjson")))
        .unwrap_err();
    assert_eq!(err.partial().map(|p| p.document_count), Some(0));
}

#[test]
fn test_cancellation_stops_at_batch_boundary() {
    let registry = Registry::with_builtin_families();
    let token = CancellationToken::new();
    let cancel = token.clone();
    let request = GenerationRequest::new("generic", "small".parse().unwrap(), 50)
        .with_seed(1)
        .with_batch_size(10);

    let dir = TempDir::new().unwrap();
    let path = dir.path().join("partial.ndjson");
    let stats = Pipeline::new(&registry, request)
        .with_cancellation(token)
        .with_progress(move |documents, _| {
            if documents >= 20 {
                cancel.cancel();
            }
        })
        .run(&Sink::File(path.clone()))
        .unwrap();

    assert_eq!(stats.status, RunStatus::Cancelled);
    assert_eq!(stats.document_count, 20);
    assert_eq!(fs::read_to_string(&path).unwrap().lines().count(), 20);
}

#[test]
fn test_pipeline_starts_in_planning() {
    let registry = Registry::with_builtin_families();
    let pipeline = Pipeline::new(
        &registry,
        GenerationRequest::new("generic", TierSelector::Mixed, 1),
    );
    assert_eq!(pipeline.state(), PipelineState::Planning);
}
