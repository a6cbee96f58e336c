//! Walk engine for dirbundle.
//!
//! This crate walks a directory tree without recursion, guards against
//! symlink cycles, and streams file content through a rule chain into a
//! [`BundleSink`](dirbundle_core::BundleSink).
//!
//! # Overview
//!
//! - **Walk primitive** ([`Walker`]) driven by a per-entry callback, shared
//!   by the structure and content passes
//! - **Cycle safety** through the identities of the open directories
//! - **Bounded streaming**: files are read in size-classed chunks from a
//!   scoped [`BufferPool`]
//! - **Progress updates** via broadcast channels
//! - **Cooperative cancellation** checked per entry and per chunk
//!
//! # Example
//!
//! ```rust,no_run
//! use dirbundle_scan::{Bundler, Policy};
//! # use dirbundle_core::{BundleSink, Entry};
//! # struct Stdout;
//! # impl BundleSink for Stdout {
//! #     fn write_directory(&mut self, _: &Entry<'_>, _: u32) -> std::io::Result<()> { Ok(()) }
//! #     fn write_file_entry(&mut self, _: &Entry<'_>, _: u32) -> std::io::Result<()> { Ok(()) }
//! #     fn write_file_header(&mut self, _: &Entry<'_>) -> std::io::Result<()> { Ok(()) }
//! #     fn write_file_chunk(&mut self, _: &[u8]) -> std::io::Result<()> { Ok(()) }
//! #     fn write_file_footer(&mut self) -> std::io::Result<()> { Ok(()) }
//! # }
//!
//! let policy = Policy::new("/path/to/project");
//! let bundler = Bundler::new(policy).unwrap();
//! let report = bundler.run(&mut Stdout).unwrap();
//!
//! println!("Streamed {} files", report.stats.files_streamed);
//! ```
//!
//! # Progress Monitoring
//!
//! ```rust,no_run
//! use dirbundle_scan::{Bundler, Policy};
//!
//! let bundler = Bundler::new(Policy::new(".")).unwrap();
//! let mut progress_rx = bundler.subscribe();
//!
//! std::thread::spawn(move || {
//!     while let Ok(progress) = progress_rx.blocking_recv() {
//!         println!("{} entries", progress.entries_seen);
//!     }
//! });
//! ```

mod buffer;
mod bundle;
mod diagnostics;
mod identity;
mod pipeline;
mod progress;
mod stack;
mod walk;

pub use buffer::{BufferPool, PooledBuffer};
pub use bundle::{Bundler, CANCELLED};
pub use diagnostics::{Diagnostics, MAX_RETAINED_WARNINGS};
pub use identity::{Admission, IdentityTracker};
pub use pipeline::{ContentPipeline, LARGE_CHUNK, MEDIUM_FILE, SMALL_CHUNK, Streamed, chunk_size};
pub use progress::{BundleProgress, Phase};
pub use stack::{Frame, TraversalStack};
pub use walk::{Visit, WalkOutcome, Walker};

// Re-export core types for convenience
pub use dirbundle_core::{
    BinaryMode, BundleReport, BundleSink, BundleStats, Entry, EntryKind, Identity, Policy,
    RunOutcome, SymlinkMode, WalkError, WalkWarning, WarningKind,
};
