//! Run statistics and the final report.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::WalkWarning;

/// Counters accumulated over both passes of a run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BundleStats {
    /// Directories written to the structure listing.
    pub dirs_listed: u64,
    /// Non-directory entries written to the structure listing.
    pub files_listed: u64,
    /// Files whose content was emitted (fully or partially).
    pub files_streamed: u64,
    /// Files whose content was dropped before anything was emitted.
    pub files_skipped: u64,
    /// Files whose content was cut off after some chunks were emitted.
    pub files_truncated: u64,
    /// Bytes read from files.
    pub bytes_read: u64,
    /// Bytes handed to the output boundary after transforms.
    pub bytes_written: u64,
    /// Largest chunk buffer handed out during the run.
    pub peak_buffer_size: usize,
    /// Deepest level reached.
    pub max_depth: u32,
}

impl BundleStats {
    /// Create new empty stats.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a listed directory.
    pub fn record_dir(&mut self, depth: u32) {
        self.dirs_listed += 1;
        self.max_depth = self.max_depth.max(depth);
    }

    /// Record a listed file entry.
    pub fn record_file(&mut self, depth: u32) {
        self.files_listed += 1;
        self.max_depth = self.max_depth.max(depth);
    }

    /// Record one emitted chunk.
    pub fn record_chunk(&mut self, read: usize, written: usize) {
        self.bytes_read += read as u64;
        self.bytes_written += written as u64;
    }
}

/// How a run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RunOutcome {
    /// Both passes walked the whole tree.
    Completed,
    /// A callback aborted the run with this code.
    Aborted(i32),
}

impl RunOutcome {
    /// Whether the run finished normally.
    pub fn is_completed(&self) -> bool {
        matches!(self, RunOutcome::Completed)
    }
}

/// Result of a bundling run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BundleReport {
    /// How the run ended.
    pub outcome: RunOutcome,
    /// Counters.
    pub stats: BundleStats,
    /// Retained warnings; may be fewer than `warning_count`.
    pub warnings: Vec<WalkWarning>,
    /// Total number of warnings raised.
    pub warning_count: u64,
    /// Wall-clock duration.
    pub duration: Duration,
}

impl BundleReport {
    /// Check if any warnings were raised.
    pub fn has_warnings(&self) -> bool {
        self.warning_count > 0
    }
}
