//! Shared progress tracking utilities.
//!
//! Byte-counting wrappers for sinks and sources, plus the progress bar styles
//! used by the `generate` and `verify` commands.

use indicatif::{ProgressBar, ProgressStyle};
use std::io::{self, Read, Write};
use std::time::Duration;

/// A writer wrapper that tracks how many bytes were accepted by the inner
/// writer. The count is the byte offset of the next write.
pub struct CountingWriter<W: Write> {
    inner: W,
    bytes_written: u64,
}

impl<W: Write> CountingWriter<W> {
    pub fn new(inner: W) -> Self {
        Self {
            inner,
            bytes_written: 0,
        }
    }

    pub fn bytes_written(&self) -> u64 {
        self.bytes_written
    }

    pub fn get_mut(&mut self) -> &mut W {
        &mut self.inner
    }

    pub fn into_inner(self) -> W {
        self.inner
    }
}

impl<W: Write> Write for CountingWriter<W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let n = self.inner.write(buf)?;
        self.bytes_written += n as u64;
        Ok(n)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.inner.flush()
    }
}

/// A reader wrapper that calls a callback with the total bytes read so far.
///
/// `verify` wraps the raw (possibly compressed) file in this so the bar
/// tracks position in the file on disk.
pub struct ProgressReader<R: Read> {
    reader: R,
    callback: Box<dyn Fn(u64)>,
    bytes_read: u64,
}

impl<R: Read> ProgressReader<R> {
    pub fn new<F>(reader: R, callback: F) -> Self
    where
        F: Fn(u64) + 'static,
    {
        Self {
            reader,
            callback: Box::new(callback),
            bytes_read: 0,
        }
    }
}

impl<R: Read> Read for ProgressReader<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let n = self.reader.read(buf)?;
        self.bytes_read += n as u64;
        (self.callback)(self.bytes_read);
        Ok(n)
    }
}

const TICK_CHARS: &str = "⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏";
const PROGRESS_CHARS: &str = "█▓▒░  ";

/// Progress bar counting documents towards a known total
pub fn document_bar(total: u64) -> ProgressBar {
    styled(
        ProgressBar::new(total),
        "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} docs ({percent}%) {msg}",
    )
}

/// Progress bar counting bytes of an input file
pub fn byte_bar(total: u64) -> ProgressBar {
    styled(
        ProgressBar::new(total),
        "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {bytes}/{total_bytes} ({percent}%) {msg}",
    )
}

fn styled(bar: ProgressBar, template: &str) -> ProgressBar {
    if let Ok(style) = ProgressStyle::with_template(template) {
        bar.set_style(
            style
                .progress_chars(PROGRESS_CHARS)
                .tick_chars(TICK_CHARS),
        );
    }
    bar.enable_steady_tick(Duration::from_millis(100));
    bar
}
