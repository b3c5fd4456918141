//! Verify command: re-reads a corpus and checks each record.

use crate::progress::{byte_bar, ProgressReader};
use crate::request::OutputFormat;
use crate::writer::Compression;
use ahash::AHashSet;
use schemars::JsonSchema;
use serde::Serialize;
use serde_json::Value;
use std::collections::BTreeMap;
use std::fs::File;
use std::io::{self, BufRead, BufReader, Read};
use std::path::PathBuf;

const MAX_REPORTED_DUPLICATES: usize = 20;

/// JSON output for the verify command
#[derive(Serialize, JsonSchema)]
pub(crate) struct VerifyJsonOutput {
    file: String,
    format: OutputFormat,
    #[serde(skip_serializing_if = "Option::is_none")]
    compression: Option<String>,
    documents: u64,
    unique_ids: u64,
    duplicate_count: u64,
    /// First few repeated ids
    duplicate_ids: Vec<String>,
    invalid_records: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    first_error: Option<String>,
    /// Documents per id prefix (the id up to its last underscore)
    per_prefix: BTreeMap<String, u64>,
    valid: bool,
}

#[derive(Default)]
struct Tally {
    documents: u64,
    ids: AHashSet<String>,
    duplicate_count: u64,
    duplicate_ids: Vec<String>,
    invalid: u64,
    first_error: Option<String>,
    per_prefix: BTreeMap<String, u64>,
}

impl Tally {
    fn check(&mut self, position: u64, record: Result<Value, String>) {
        let value = match record {
            Ok(value) => value,
            Err(e) => return self.invalid(position, e),
        };
        let Some(id) = value.get("id").and_then(Value::as_str) else {
            let msg = if value.is_object() {
                "missing string 'id' field".to_string()
            } else {
                "not a JSON object".to_string()
            };
            return self.invalid(position, msg);
        };

        self.documents += 1;
        let prefix = id.rsplit_once('_').map_or(id, |(prefix, _)| prefix);
        *self.per_prefix.entry(prefix.to_string()).or_insert(0) += 1;

        if !self.ids.insert(id.to_string()) {
            self.duplicate_count += 1;
            if self.duplicate_ids.len() < MAX_REPORTED_DUPLICATES {
                self.duplicate_ids.push(id.to_string());
            }
        }
    }

    fn invalid(&mut self, position: u64, message: String) {
        self.invalid += 1;
        if self.first_error.is_none() {
            self.first_error = Some(format!("record {}: {}", position, message));
        }
    }

    fn is_valid(&self) -> bool {
        self.invalid == 0 && self.duplicate_count == 0
    }
}

pub fn run(
    file: PathBuf,
    format: Option<String>,
    progress: bool,
    json: bool,
) -> anyhow::Result<()> {
    let input = File::open(&file)
        .map_err(|e| anyhow::anyhow!("cannot open {}: {}", file.display(), e))?;
    let file_size = input.metadata()?.len();
    let compression = Compression::from_path(&file);

    let bar = (progress && !json).then(|| byte_bar(file_size));
    let raw: Box<dyn Read> = match bar.clone() {
        Some(bar) => Box::new(ProgressReader::new(input, move |bytes| {
            bar.set_position(bytes)
        })),
        None => Box::new(input),
    };
    let mut reader = BufReader::new(compression.wrap_reader(raw)?);

    let format = match format {
        Some(name) => name
            .parse::<OutputFormat>()
            .map_err(|e| anyhow::anyhow!("{}", e))?,
        None => detect_format(&mut reader)?,
    };
    tracing::debug!(%format, %compression, "verifying {}", file.display());

    let tally = match format {
        OutputFormat::Ndjson => verify_ndjson(reader)?,
        OutputFormat::Json => verify_array(reader),
    };
    if let Some(bar) = &bar {
        bar.finish_and_clear();
    }

    let valid = tally.is_valid();
    if json {
        let output = VerifyJsonOutput {
            file: file.display().to_string(),
            format,
            compression: (compression != Compression::None).then(|| compression.to_string()),
            documents: tally.documents,
            unique_ids: tally.ids.len() as u64,
            duplicate_count: tally.duplicate_count,
            duplicate_ids: tally.duplicate_ids,
            invalid_records: tally.invalid,
            first_error: tally.first_error,
            per_prefix: tally.per_prefix,
            valid,
        };
        println!("{}", serde_json::to_string_pretty(&output)?);
    } else {
        print_report(&file, format, &tally);
    }

    if !valid {
        anyhow::bail!(
            "verification failed: {} invalid records, {} duplicate ids",
            tally.invalid,
            tally.duplicate_count
        );
    }
    Ok(())
}

/// A leading '[' means a JSON array; anything else is treated as NDJSON.
fn detect_format(reader: &mut impl BufRead) -> io::Result<OutputFormat> {
    loop {
        let buf = reader.fill_buf()?;
        if buf.is_empty() {
            return Ok(OutputFormat::Ndjson);
        }
        match buf.iter().position(|b| !b.is_ascii_whitespace()) {
            Some(pos) => {
                let format = if buf[pos] == b'[' {
                    OutputFormat::Json
                } else {
                    OutputFormat::Ndjson
                };
                return Ok(format);
            }
            None => {
                let len = buf.len();
                reader.consume(len);
            }
        }
    }
}

fn verify_ndjson(reader: impl BufRead) -> io::Result<Tally> {
    let mut tally = Tally::default();
    for (i, line) in reader.lines().enumerate() {
        let line = line?;
        let record = serde_json::from_str::<Value>(&line).map_err(|e| e.to_string());
        tally.check(i as u64 + 1, record);
    }
    Ok(tally)
}

fn verify_array(reader: impl Read) -> Tally {
    let mut tally = Tally::default();
    match serde_json::from_reader::<_, Value>(reader) {
        Ok(Value::Array(records)) => {
            for (i, record) in records.into_iter().enumerate() {
                tally.check(i as u64 + 1, Ok(record));
            }
        }
        Ok(_) => tally.invalid(0, "top-level value is not an array".to_string()),
        Err(e) => tally.invalid(0, e.to_string()),
    }
    tally
}

fn print_report(file: &std::path::Path, format: OutputFormat, tally: &Tally) {
    if tally.is_valid() {
        println!("✓ {} is valid ({})", file.display(), format);
    } else {
        println!("✗ {} has problems ({})", file.display(), format);
    }
    println!();
    println!("Documents: {}", tally.documents);
    println!("Unique ids: {}", tally.ids.len());
    if tally.duplicate_count > 0 {
        println!(
            "Duplicate ids: {} (e.g. {})",
            tally.duplicate_count,
            tally.duplicate_ids.join(", ")
        );
    }
    if tally.invalid > 0 {
        println!("Invalid records: {}", tally.invalid);
        if let Some(err) = &tally.first_error {
            println!("First error: {}", err);
        }
    }
    if !tally.per_prefix.is_empty() {
        println!();
        println!("Per-tier counts:");
        for (prefix, count) in &tally.per_prefix {
            println!("  {}: {}", prefix, count);
        }
    }
}
