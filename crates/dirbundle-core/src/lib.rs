//! Core types and traits for dirbundle.
//!
//! This crate provides the data structures shared by the rule chain, the
//! walk engine and the renderers: walk entries, the resolved policy, the
//! output boundary trait, and error/report types.

mod config;
mod entry;
mod error;
mod output;
mod report;

pub use config::{
    BinaryMode, DEFAULT_MAX_BUFFER_SIZE, DEFAULT_MAX_DEPTH, DEFAULT_MAX_FILE_SIZE,
    DEFAULT_MAX_PATH_LEN, DEFAULT_MAX_TRACKED_IDENTITIES, MIN_BUFFER_SIZE, Policy,
    PolicyBuilder, SymlinkMode,
};
pub use entry::{BINARY_CHECK_SIZE, Entry, EntryKind, Identity, detect_binary};
pub use error::{WalkError, WalkWarning, WarningKind};
pub use output::BundleSink;
pub use report::{BundleReport, BundleStats, RunOutcome};
