//! Chunked content streaming.

use std::fs::File;
use std::io::{self, Read};
use std::sync::atomic::{AtomicBool, Ordering};

use dirbundle_core::{BundleSink, BundleStats, Entry, EntryKind, WalkError, WalkWarning, WarningKind};
use dirbundle_filter::RuleChain;
use tracing::debug;

use crate::buffer::BufferPool;
use crate::diagnostics::Diagnostics;

/// Chunk size for files under [`MEDIUM_FILE`] bytes.
pub const SMALL_CHUNK: usize = 4096;
/// Chunk size for everything else.
pub const LARGE_CHUNK: usize = 16 * 1024;
/// Files smaller than this are read in [`SMALL_CHUNK`]s.
pub const MEDIUM_FILE: u64 = 16 * 1024;

/// Chunk size used for a file of `size` bytes: small files in one chunk,
/// then two fixed size classes.
pub fn chunk_size(size: u64) -> usize {
    if size > 0 && size < SMALL_CHUNK as u64 {
        size as usize
    } else if size < MEDIUM_FILE {
        SMALL_CHUNK
    } else {
        LARGE_CHUNK
    }
}

/// What happened to one file's content.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Streamed {
    /// Header, every accepted chunk and the footer were written.
    Complete,
    /// Nothing was written for the file.
    Skipped,
    /// Header and some chunks were written; no footer.
    Truncated,
    /// Cancellation was requested while the file was being read.
    Cancelled,
}

/// Streams file content through the rule chain into a sink.
pub struct ContentPipeline<'a> {
    chain: &'a RuleChain,
    pool: &'a BufferPool,
    diagnostics: &'a Diagnostics,
    max_file_size: u64,
    cancel: Option<&'a AtomicBool>,
}

impl<'a> ContentPipeline<'a> {
    pub fn new(
        chain: &'a RuleChain,
        pool: &'a BufferPool,
        diagnostics: &'a Diagnostics,
        max_file_size: u64,
    ) -> Self {
        Self {
            chain,
            pool,
            diagnostics,
            max_file_size,
            cancel: None,
        }
    }

    /// Check `flag` before every chunk.
    pub fn with_cancel(mut self, flag: &'a AtomicBool) -> Self {
        self.cancel = Some(flag);
        self
    }

    /// Stream the content of `entry` into `sink`.
    ///
    /// The header is written once the first chunk has been accepted, so a
    /// file rejected outright leaves no trace in the content section.
    /// Filesystem trouble is recorded as a warning; only buffer and sink
    /// failures are returned as errors.
    pub fn stream<S>(
        &self,
        entry: &Entry<'_>,
        sink: &mut S,
        stats: &mut BundleStats,
    ) -> Result<Streamed, WalkError>
    where
        S: BundleSink + ?Sized,
    {
        let streamed = match entry.kind() {
            EntryKind::Directory => Streamed::Skipped,
            EntryKind::Other => {
                self.diagnostics.warn(WalkWarning::new(
                    entry.abs_path(),
                    format!("Not a regular file, content not read: {}", entry.path()),
                    WarningKind::NotRegular,
                ));
                Streamed::Skipped
            }
            EntryKind::Symlink => self.stream_link(entry, sink, stats)?,
            EntryKind::File => self.stream_file(entry, sink, stats)?,
        };

        match streamed {
            Streamed::Complete | Streamed::Truncated => stats.files_streamed += 1,
            Streamed::Skipped => stats.files_skipped += 1,
            Streamed::Cancelled => {}
        }
        if streamed == Streamed::Truncated {
            stats.files_truncated += 1;
        }
        Ok(streamed)
    }

    /// Unfollowed links are never read; transforms see one empty chunk.
    fn stream_link<S>(
        &self,
        entry: &Entry<'_>,
        sink: &mut S,
        stats: &mut BundleStats,
    ) -> Result<Streamed, WalkError>
    where
        S: BundleSink + ?Sized,
    {
        if !self.chain.should_include_content(entry, &[]) {
            return Ok(Streamed::Skipped);
        }
        let out = self.chain.transform(entry, &[]);
        sink.write_file_header(entry).map_err(WalkError::output)?;
        if !out.data.is_empty() {
            sink.write_file_chunk(&out.data).map_err(WalkError::output)?;
            stats.record_chunk(0, out.data.len());
        }
        sink.write_file_footer().map_err(WalkError::output)?;
        Ok(Streamed::Complete)
    }

    fn stream_file<S>(
        &self,
        entry: &Entry<'_>,
        sink: &mut S,
        stats: &mut BundleStats,
    ) -> Result<Streamed, WalkError>
    where
        S: BundleSink + ?Sized,
    {
        if entry.size() > self.max_file_size {
            self.diagnostics.warn(WalkWarning::new(
                entry.abs_path(),
                format!(
                    "File is {} bytes, over the {} byte limit; content skipped",
                    entry.size(),
                    self.max_file_size
                ),
                WarningKind::FileTooLarge,
            ));
            return Ok(Streamed::Skipped);
        }

        let mut file = match File::open(entry.content_path()) {
            Ok(f) => f,
            Err(e) => {
                self.diagnostics
                    .warn(WalkWarning::from_io(entry.abs_path(), "open file", &e));
                return Ok(Streamed::Skipped);
            }
        };

        let mut buffer = self.pool.acquire(chunk_size(entry.size()))?;
        stats.peak_buffer_size = stats.peak_buffer_size.max(buffer.len());
        let mut header_written = false;

        loop {
            if self.cancelled() {
                return Ok(Streamed::Cancelled);
            }

            let read = match fill(&mut file, &mut buffer) {
                Ok(0) => break,
                Ok(n) => n,
                Err(e) => {
                    self.diagnostics
                        .warn(WalkWarning::from_io(entry.abs_path(), "read file", &e));
                    return Ok(if header_written {
                        Streamed::Truncated
                    } else {
                        Streamed::Skipped
                    });
                }
            };
            let chunk = &buffer[..read];

            if !self.chain.should_include_content(entry, chunk) {
                debug!(path = entry.path(), "content rejected");
                return Ok(if header_written {
                    Streamed::Truncated
                } else {
                    Streamed::Skipped
                });
            }

            let out = self.chain.transform(entry, chunk);
            if !header_written {
                sink.write_file_header(entry).map_err(WalkError::output)?;
                header_written = true;
            }
            sink.write_file_chunk(&out.data).map_err(WalkError::output)?;
            stats.record_chunk(read, out.data.len());

            if out.ends_file {
                break;
            }
        }

        if !header_written {
            sink.write_file_header(entry).map_err(WalkError::output)?;
        }
        sink.write_file_footer().map_err(WalkError::output)?;
        Ok(Streamed::Complete)
    }

    fn cancelled(&self) -> bool {
        self.cancel.is_some_and(|flag| flag.load(Ordering::Relaxed))
    }
}

/// Read until `buf` is full or the file ends.
fn fill(file: &mut File, buf: &mut [u8]) -> io::Result<usize> {
    let mut filled = 0;
    while filled < buf.len() {
        match file.read(&mut buf[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        }
    }
    Ok(filled)
}
