//! Streaming document writer.
//!
//! Serializes documents one at a time as NDJSON or as a single JSON array,
//! flushing every `flush_interval` documents. The sink is a file (optionally
//! compressed, chosen by extension) or stdout. Bytes and a SHA-256 digest are
//! tracked over the uncompressed stream.

use crate::progress::CountingWriter;
use crate::request::{GenerationRequest, OutputFormat};
use crate::stats::WriteSummary;
use corpus_templates::Document;
use sha2::{Digest, Sha256};
use std::fs::{self, File};
use std::io::{self, BufWriter, Read, Write};
use std::path::{Path, PathBuf};
use thiserror::Error;

pub const WRITER_BUFFER_SIZE: usize = 256 * 1024;

#[derive(Debug, Error)]
pub enum WriteError {
    #[error("serialization failed: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error(transparent)]
    Io(#[from] io::Error),

    /// The document was buffered but the flush it triggered failed
    #[error("flush failed: {source}")]
    Flush {
        len: usize,
        #[source]
        source: io::Error,
    },

    #[error("writer is already closed")]
    Closed,
}

/// Compression format detected from file extension
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Compression {
    None,
    Gzip,
    Bzip2,
    Xz,
    Zstd,
}

impl Compression {
    /// Detect compression format from file extension
    pub fn from_path(path: &Path) -> Self {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_lowercase());

        match ext.as_deref() {
            Some("gz" | "gzip") => Compression::Gzip,
            Some("bz2" | "bzip2") => Compression::Bzip2,
            Some("xz" | "lzma") => Compression::Xz,
            Some("zst" | "zstd") => Compression::Zstd,
            _ => Compression::None,
        }
    }

    fn wrap_writer(&self, writer: Box<dyn Write + Send>) -> io::Result<Encoder> {
        Ok(match self {
            Compression::None => Encoder::Plain(writer),
            Compression::Gzip => Encoder::Gzip(flate2::write::GzEncoder::new(
                writer,
                flate2::Compression::default(),
            )),
            Compression::Bzip2 => Encoder::Bzip2(bzip2::write::BzEncoder::new(
                writer,
                bzip2::Compression::default(),
            )),
            Compression::Xz => Encoder::Xz(xz2::write::XzEncoder::new(writer, 6)),
            Compression::Zstd => Encoder::Zstd(zstd::stream::write::Encoder::new(writer, 0)?),
        })
    }

    /// Wrap a reader with the appropriate decompressor
    pub fn wrap_reader<'a>(&self, reader: Box<dyn Read + 'a>) -> io::Result<Box<dyn Read + 'a>> {
        Ok(match self {
            Compression::None => reader,
            Compression::Gzip => Box::new(flate2::read::GzDecoder::new(reader)),
            Compression::Bzip2 => Box::new(bzip2::read::BzDecoder::new(reader)),
            Compression::Xz => Box::new(xz2::read::XzDecoder::new(reader)),
            Compression::Zstd => Box::new(zstd::stream::read::Decoder::new(reader)?),
        })
    }
}

impl std::fmt::Display for Compression {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Compression::None => write!(f, "none"),
            Compression::Gzip => write!(f, "gzip"),
            Compression::Bzip2 => write!(f, "bzip2"),
            Compression::Xz => write!(f, "xz"),
            Compression::Zstd => write!(f, "zstd"),
        }
    }
}

/// Compressing (or pass-through) layer directly above the sink
enum Encoder {
    Plain(Box<dyn Write + Send>),
    Gzip(flate2::write::GzEncoder<Box<dyn Write + Send>>),
    Bzip2(bzip2::write::BzEncoder<Box<dyn Write + Send>>),
    Xz(xz2::write::XzEncoder<Box<dyn Write + Send>>),
    Zstd(zstd::stream::write::Encoder<'static, Box<dyn Write + Send>>),
}

impl Encoder {
    /// Write any compression trailer and flush the sink
    fn finish(self) -> io::Result<()> {
        let mut sink = match self {
            Encoder::Plain(w) => w,
            Encoder::Gzip(e) => e.finish()?,
            Encoder::Bzip2(e) => e.finish()?,
            Encoder::Xz(e) => e.finish()?,
            Encoder::Zstd(e) => e.finish()?,
        };
        sink.flush()
    }
}

impl Write for Encoder {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        match self {
            Encoder::Plain(w) => w.write(buf),
            Encoder::Gzip(e) => e.write(buf),
            Encoder::Bzip2(e) => e.write(buf),
            Encoder::Xz(e) => e.write(buf),
            Encoder::Zstd(e) => e.write(buf),
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        match self {
            Encoder::Plain(w) => w.flush(),
            Encoder::Gzip(e) => e.flush(),
            Encoder::Bzip2(e) => e.flush(),
            Encoder::Xz(e) => e.flush(),
            Encoder::Zstd(e) => e.flush(),
        }
    }
}

/// Where output goes: a file path, or stdout for `-`
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Sink {
    Stdout,
    File(PathBuf),
}

impl Sink {
    pub fn from_path(path: &Path) -> Self {
        if path.as_os_str() == "-" {
            Sink::Stdout
        } else {
            Sink::File(path.to_path_buf())
        }
    }

    pub fn compression(&self) -> Compression {
        match self {
            Sink::Stdout => Compression::None,
            Sink::File(path) => Compression::from_path(path),
        }
    }
}

impl std::fmt::Display for Sink {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Sink::Stdout => write!(f, "<stdout>"),
            Sink::File(path) => write!(f, "{}", path.display()),
        }
    }
}

/// Serialization settings for a [`StreamingWriter`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WriterOptions {
    pub format: OutputFormat,
    /// Pretty-print array elements; ignored for NDJSON
    pub pretty: bool,
    pub flush_interval: usize,
}

impl WriterOptions {
    pub fn from_request(request: &GenerationRequest) -> Self {
        Self {
            format: request.format,
            pretty: request.pretty,
            flush_interval: request.effective_flush_interval(),
        }
    }
}

impl Default for WriterOptions {
    fn default() -> Self {
        Self {
            format: OutputFormat::Ndjson,
            pretty: false,
            flush_interval: crate::request::DEFAULT_BATCH_SIZE,
        }
    }
}

type Output = CountingWriter<BufWriter<Encoder>>;

/// Writes documents to a sink in constant memory.
///
/// Documents count as committed once a flush has pushed them to the sink;
/// [`summary`](Self::summary) only ever reports committed output. `close`
/// terminates the array (for JSON output), finishes compression and flushes
/// the sink; it is idempotent. `abort` releases the sink without the array
/// terminator. Dropping an unclosed writer flushes whatever is buffered.
pub struct StreamingWriter {
    out: Option<Output>,
    options: WriterOptions,
    hasher: Sha256,
    scratch: Vec<u8>,
    indented: Vec<u8>,
    documents: u64,
    since_flush: usize,
    flushes: u64,
    committed_documents: u64,
    committed_bytes: u64,
    committed_hasher: Sha256,
}

impl StreamingWriter {
    /// Open a sink, creating parent directories for file paths
    pub fn open(sink: &Sink, options: WriterOptions) -> io::Result<Self> {
        let writer: Box<dyn Write + Send> = match sink {
            Sink::Stdout => Box::new(io::stdout()),
            Sink::File(path) => {
                if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                    fs::create_dir_all(parent)?;
                }
                Box::new(File::create(path)?)
            }
        };
        Self::from_writer(writer, sink.compression(), options)
    }

    /// Wrap an arbitrary writer
    pub fn from_writer(
        writer: Box<dyn Write + Send>,
        compression: Compression,
        options: WriterOptions,
    ) -> io::Result<Self> {
        let encoder = compression.wrap_writer(writer)?;
        let out = CountingWriter::new(BufWriter::with_capacity(WRITER_BUFFER_SIZE, encoder));

        let mut writer = Self {
            out: Some(out),
            options: WriterOptions {
                flush_interval: options.flush_interval.max(1),
                ..options
            },
            hasher: Sha256::new(),
            scratch: Vec::with_capacity(4096),
            indented: Vec::new(),
            documents: 0,
            since_flush: 0,
            flushes: 0,
            committed_documents: 0,
            committed_bytes: 0,
            committed_hasher: Sha256::new(),
        };
        if writer.options.format == OutputFormat::Json {
            if let Some(out) = writer.out.as_mut() {
                emit(out, &mut writer.hasher, b"[")?;
            }
        }
        Ok(writer)
    }

    /// Serialize and write one document, returning its serialized length
    /// (separators excluded).
    ///
    /// A failing automatic flush is reported as [`WriteError::Flush`]; the
    /// document stays buffered and uncommitted.
    pub fn write_document(&mut self, doc: &Document) -> Result<usize, WriteError> {
        let out = self.out.as_mut().ok_or(WriteError::Closed)?;
        let pretty = self.options.pretty && self.options.format == OutputFormat::Json;

        self.scratch.clear();
        if pretty {
            serde_json::to_writer_pretty(&mut self.scratch, doc)?;
            self.indented.clear();
            for &byte in &self.scratch {
                self.indented.push(byte);
                if byte == b'\n' {
                    self.indented.extend_from_slice(b"  ");
                }
            }
        } else {
            serde_json::to_writer(&mut self.scratch, doc)?;
        }
        let body: &[u8] = if pretty { &self.indented } else { &self.scratch };

        match self.options.format {
            OutputFormat::Ndjson => {
                emit(out, &mut self.hasher, body)?;
                emit(out, &mut self.hasher, b"\n")?;
            }
            OutputFormat::Json => {
                let separator: &[u8] = match (self.documents, pretty) {
                    (0, true) => b"\n  ",
                    (0, false) => b"",
                    (_, true) => b",\n  ",
                    (_, false) => b",",
                };
                emit(out, &mut self.hasher, separator)?;
                emit(out, &mut self.hasher, body)?;
            }
        }
        let len = body.len();

        self.documents += 1;
        self.since_flush += 1;
        if self.since_flush >= self.options.flush_interval {
            self.flush()
                .map_err(|source| WriteError::Flush { len, source })?;
        }
        Ok(len)
    }

    /// Flush buffered documents to the sink and commit them. A no-op when
    /// nothing was written since the last flush.
    pub fn flush(&mut self) -> io::Result<()> {
        if self.since_flush == 0 {
            return Ok(());
        }
        let Some(out) = self.out.as_mut() else {
            return Ok(());
        };
        out.flush()?;
        let bytes = out.bytes_written();
        self.commit(bytes);
        self.flushes += 1;
        Ok(())
    }

    /// Terminate the output and release the sink.
    pub fn close(&mut self) -> io::Result<WriteSummary> {
        let Some(mut out) = self.out.take() else {
            return Ok(self.summary());
        };

        if self.options.format == OutputFormat::Json {
            let trailer: &[u8] = if self.options.pretty && self.documents > 0 {
                b"\n]"
            } else {
                b"]"
            };
            emit(&mut out, &mut self.hasher, trailer)?;
        }
        self.release(out)
    }

    /// Release the sink after a failed run. Buffered documents get one more
    /// flush attempt, but a JSON array is left unterminated so the output
    /// cannot pass for a complete corpus.
    pub fn abort(&mut self) -> io::Result<WriteSummary> {
        match self.out.take() {
            Some(out) => self.release(out),
            None => Ok(self.summary()),
        }
    }

    fn release(&mut self, mut out: Output) -> io::Result<WriteSummary> {
        out.flush()?;
        let bytes = out.bytes_written();
        let encoder = out.into_inner().into_inner().map_err(|e| e.into_error())?;
        encoder.finish()?;
        self.commit(bytes);
        self.flushes += 1;
        Ok(self.summary())
    }

    fn commit(&mut self, bytes: u64) {
        self.committed_documents = self.documents;
        self.committed_bytes = bytes;
        self.committed_hasher = self.hasher.clone();
        self.since_flush = 0;
    }

    pub fn is_closed(&self) -> bool {
        self.out.is_none()
    }

    /// Documents accepted so far, committed or still buffered
    pub fn documents_written(&self) -> u64 {
        self.documents
    }

    /// Documents the sink has accepted
    pub fn committed_documents(&self) -> u64 {
        self.committed_documents
    }

    /// Uncompressed bytes accepted so far, committed or still buffered
    pub fn bytes_written(&self) -> u64 {
        self.out
            .as_ref()
            .map_or(self.committed_bytes, |out| out.bytes_written())
    }

    /// Uncompressed bytes the sink has accepted
    pub fn committed_bytes(&self) -> u64 {
        self.committed_bytes
    }

    pub fn flushes(&self) -> u64 {
        self.flushes
    }

    /// Bytes, flush count and digest of the committed output
    pub fn summary(&self) -> WriteSummary {
        WriteSummary {
            bytes_written: self.committed_bytes,
            flushes: self.flushes,
            sha256: hex::encode(self.committed_hasher.clone().finalize()),
        }
    }
}

impl Drop for StreamingWriter {
    fn drop(&mut self) {
        if let Some(out) = self.out.as_mut() {
            let _ = out.flush();
        }
    }
}

fn emit(out: &mut Output, hasher: &mut Sha256, bytes: &[u8]) -> io::Result<()> {
    out.write_all(bytes)?;
    hasher.update(bytes);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Value};
    use std::sync::{Arc, Mutex};

    /// Shared in-memory sink so tests can inspect output after close
    #[derive(Clone, Default)]
    struct SharedBuf(Arc<Mutex<Vec<u8>>>);

    impl SharedBuf {
        fn contents(&self) -> String {
            String::from_utf8(self.0.lock().unwrap().clone()).unwrap()
        }
    }

    impl Write for SharedBuf {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    fn doc(id: &str) -> Document {
        Document::from_value(json!({"id": id, "n": 1})).unwrap()
    }

    fn writer(buf: &SharedBuf, format: OutputFormat, pretty: bool) -> StreamingWriter {
        let options = WriterOptions {
            format,
            pretty,
            flush_interval: 2,
        };
        StreamingWriter::from_writer(Box::new(buf.clone()), Compression::None, options).unwrap()
    }

    #[test]
    fn test_ndjson_lines() {
        let buf = SharedBuf::default();
        let mut w = writer(&buf, OutputFormat::Ndjson, false);
        let len = w.write_document(&doc("a_0")).unwrap();
        w.write_document(&doc("a_1")).unwrap();
        let summary = w.close().unwrap();

        let text = buf.contents();
        assert_eq!(text, "{\"id\":\"a_0\",\"n\":1}\n{\"id\":\"a_1\",\"n\":1}\n");
        assert_eq!(len, "{\"id\":\"a_0\",\"n\":1}".len());
        assert_eq!(summary.bytes_written, text.len() as u64);
    }

    #[test]
    fn test_compact_array() {
        let buf = SharedBuf::default();
        let mut w = writer(&buf, OutputFormat::Json, false);
        w.write_document(&doc("a_0")).unwrap();
        w.write_document(&doc("a_1")).unwrap();
        w.close().unwrap();

        let parsed: Value = serde_json::from_str(&buf.contents()).unwrap();
        assert_eq!(parsed.as_array().unwrap().len(), 2);
        assert_eq!(parsed[1]["id"], "a_1");
    }

    #[test]
    fn test_pretty_array_matches_serde() {
        let buf = SharedBuf::default();
        let mut w = writer(&buf, OutputFormat::Json, true);
        let docs = vec![doc("a_0"), doc("a_1"), doc("a_2")];
        for d in &docs {
            w.write_document(d).unwrap();
        }
        w.close().unwrap();

        assert_eq!(buf.contents(), serde_json::to_string_pretty(&docs).unwrap());
    }

    #[test]
    fn test_empty_outputs() {
        let buf = SharedBuf::default();
        writer(&buf, OutputFormat::Json, true).close().unwrap();
        assert_eq!(buf.contents(), "[]");

        let buf = SharedBuf::default();
        let summary = writer(&buf, OutputFormat::Ndjson, false).close().unwrap();
        assert_eq!(buf.contents(), "");
        assert_eq!(summary.bytes_written, 0);
    }

    #[test]
    fn test_flush_interval_and_close_count() {
        let buf = SharedBuf::default();
        let mut w = writer(&buf, OutputFormat::Ndjson, false);
        for i in 0..5 {
            w.write_document(&doc(&format!("a_{}", i))).unwrap();
        }
        assert_eq!(w.flushes(), 2);
        w.flush().unwrap();
        assert_eq!(w.flushes(), 3);
        // nothing pending
        w.flush().unwrap();
        assert_eq!(w.flushes(), 3);
        assert_eq!(w.close().unwrap().flushes, 4);
    }

    #[test]
    fn test_close_is_idempotent() {
        let buf = SharedBuf::default();
        let mut w = writer(&buf, OutputFormat::Json, false);
        w.write_document(&doc("a_0")).unwrap();
        let first = w.close().unwrap();
        let second = w.close().unwrap();
        assert_eq!(first, second);
        assert_eq!(buf.contents(), "[{\"id\":\"a_0\",\"n\":1}]");
        assert!(matches!(
            w.write_document(&doc("a_1")),
            Err(WriteError::Closed)
        ));
    }

    #[test]
    fn test_digest_covers_uncompressed_stream() {
        let buf = SharedBuf::default();
        let mut w = writer(&buf, OutputFormat::Ndjson, false);
        w.write_document(&doc("a_0")).unwrap();
        let summary = w.close().unwrap();
        let expected = hex::encode(Sha256::digest(buf.contents().as_bytes()));
        assert_eq!(summary.sha256, expected);
    }

    #[test]
    fn test_drop_flushes_buffer() {
        let buf = SharedBuf::default();
        {
            let mut w = writer(&buf, OutputFormat::Ndjson, false);
            w.write_document(&doc("a_0")).unwrap();
        }
        assert_eq!(buf.contents(), "{\"id\":\"a_0\",\"n\":1}\n");
    }

    /// Accepts `limit` writes into `buf`, then fails
    struct LimitedSink {
        buf: SharedBuf,
        limit: usize,
    }

    impl Write for LimitedSink {
        fn write(&mut self, data: &[u8]) -> io::Result<usize> {
            if self.limit == 0 {
                return Err(io::Error::other("disk full"));
            }
            self.limit -= 1;
            self.buf.write(data)
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_failed_flush_leaves_documents_uncommitted() {
        let buf = SharedBuf::default();
        let sink = LimitedSink {
            buf: buf.clone(),
            limit: 1,
        };
        let options = WriterOptions {
            format: OutputFormat::Ndjson,
            pretty: false,
            flush_interval: 2,
        };
        let mut w = StreamingWriter::from_writer(Box::new(sink), Compression::None, options).unwrap();

        w.write_document(&doc("a_0")).unwrap();
        w.write_document(&doc("a_1")).unwrap();
        assert_eq!(w.committed_documents(), 2);

        w.write_document(&doc("a_2")).unwrap();
        let err = w.write_document(&doc("a_3")).unwrap_err();
        assert!(matches!(err, WriteError::Flush { len, .. } if len == doc_len("a_3")));
        assert_eq!(w.documents_written(), 4);
        assert_eq!(w.committed_documents(), 2);

        let delivered = buf.contents();
        assert_eq!(delivered.lines().count(), 2);
        let summary = w.summary();
        assert_eq!(summary.bytes_written, delivered.len() as u64);
        assert_eq!(summary.sha256, hex::encode(Sha256::digest(delivered.as_bytes())));
        assert!(w.bytes_written() > summary.bytes_written);

        assert!(w.abort().is_err());
        assert_eq!(w.committed_documents(), 2);
    }

    fn doc_len(id: &str) -> usize {
        serde_json::to_vec(&doc(id)).unwrap().len()
    }

    #[test]
    fn test_abort_leaves_array_unterminated() {
        let buf = SharedBuf::default();
        let mut w = writer(&buf, OutputFormat::Json, false);
        w.write_document(&doc("a_0")).unwrap();
        let summary = w.abort().unwrap();

        assert_eq!(buf.contents(), "[{\"id\":\"a_0\",\"n\":1}");
        assert!(serde_json::from_str::<Value>(&buf.contents()).is_err());
        assert_eq!(summary.bytes_written, buf.contents().len() as u64);
        assert_eq!(w.committed_documents(), 1);
        assert!(w.is_closed());
    }

    #[test]
    fn test_compression_from_path() {
        assert_eq!(Compression::from_path(Path::new("a.ndjson.gz")), Compression::Gzip);
        assert_eq!(Compression::from_path(Path::new("a.json.ZST")), Compression::Zstd);
        assert_eq!(Compression::from_path(Path::new("a.ndjson")), Compression::None);
        assert_eq!(Sink::from_path(Path::new("-")), Sink::Stdout);
        assert_eq!(Sink::Stdout.compression(), Compression::None);
    }

    #[test]
    fn test_gzip_round_trip() {
        let buf = SharedBuf::default();
        let mut w = StreamingWriter::from_writer(
            Box::new(buf.clone()),
            Compression::Gzip,
            WriterOptions::default(),
        )
        .unwrap();
        w.write_document(&doc("a_0")).unwrap();
        let summary = w.close().unwrap();

        let compressed = buf.0.lock().unwrap().clone();
        let mut reader = Compression::Gzip
            .wrap_reader(Box::new(&compressed[..]))
            .unwrap();
        let mut text = String::new();
        reader.read_to_string(&mut text).unwrap();
        assert_eq!(text, "{\"id\":\"a_0\",\"n\":1}\n");
        assert_eq!(summary.bytes_written, text.len() as u64);
    }
}
