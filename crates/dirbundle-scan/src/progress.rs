//! Run progress reporting.

use std::path::PathBuf;
use std::time::{Duration, Instant};

use dirbundle_core::BundleStats;

/// Which pass a run is in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Structure,
    Content,
    Finished,
}

/// Progress snapshot broadcast during a run.
#[derive(Debug, Clone)]
pub struct BundleProgress {
    pub phase: Phase,
    /// Entries reported by the current pass so far.
    pub entries_seen: u64,
    /// Files whose content was emitted so far.
    pub files_streamed: u64,
    /// Bytes read from files so far.
    pub bytes_read: u64,
    /// Warnings raised so far.
    pub warnings: u64,
    /// Last entry reported.
    pub current_path: PathBuf,
    /// Time since the run started.
    pub elapsed: Duration,
}

impl BundleProgress {
    /// Entries per second over the run so far.
    pub fn entries_per_second(&self) -> f64 {
        if self.elapsed.as_secs_f64() > 0.0 {
            self.entries_seen as f64 / self.elapsed.as_secs_f64()
        } else {
            0.0
        }
    }

    /// Read throughput in bytes per second.
    pub fn bytes_per_second(&self) -> f64 {
        if self.elapsed.as_secs_f64() > 0.0 {
            self.bytes_read as f64 / self.elapsed.as_secs_f64()
        } else {
            0.0
        }
    }
}

/// Accumulates progress within one run and decides when to publish.
#[derive(Debug)]
pub(crate) struct ProgressTracker {
    start_time: Instant,
    phase: Phase,
    entries_seen: u64,
    current_path: PathBuf,
    interval: u64,
}

impl ProgressTracker {
    pub fn new(interval: u64) -> Self {
        Self {
            start_time: Instant::now(),
            phase: Phase::Structure,
            entries_seen: 0,
            current_path: PathBuf::new(),
            interval: interval.max(1),
        }
    }

    pub fn start_phase(&mut self, phase: Phase) {
        self.phase = phase;
        self.entries_seen = 0;
    }

    /// Count an entry; true when a snapshot is due.
    pub fn record_entry(&mut self, path: &str) -> bool {
        self.entries_seen += 1;
        if self.entries_seen % self.interval == 0 {
            self.current_path = PathBuf::from(path);
            true
        } else {
            false
        }
    }

    pub fn elapsed(&self) -> Duration {
        self.start_time.elapsed()
    }

    pub fn snapshot(&self, stats: &BundleStats, warnings: u64) -> BundleProgress {
        BundleProgress {
            phase: self.phase,
            entries_seen: self.entries_seen,
            files_streamed: stats.files_streamed,
            bytes_read: stats.bytes_read,
            warnings,
            current_path: self.current_path.clone(),
            elapsed: self.start_time.elapsed(),
        }
    }
}
