//! Two-pass bundling driver.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Instant;

use dirbundle_core::{BundleReport, BundleSink, BundleStats, Policy, RunOutcome, WalkError};
use dirbundle_filter::{Rule, RuleChain};
use tokio::sync::broadcast;
use tracing::{debug, info};

use crate::buffer::BufferPool;
use crate::diagnostics::Diagnostics;
use crate::pipeline::{ContentPipeline, Streamed};
use crate::progress::{BundleProgress, Phase, ProgressTracker};
use crate::walk::{Visit, WalkOutcome, Walker};

/// Abort code reported when a run is cancelled through its cancel handle.
pub const CANCELLED: i32 = 130;

/// Entries between progress snapshots.
const PROGRESS_INTERVAL: u64 = 256;

/// Runs the structure pass and the content pass of a bundle into a sink.
pub struct Bundler {
    policy: Policy,
    chain: RuleChain,
    progress_tx: broadcast::Sender<BundleProgress>,
    cancel: Arc<AtomicBool>,
}

impl Bundler {
    /// Create a bundler with the built-in rules for `policy`.
    pub fn new(policy: Policy) -> Result<Self, WalkError> {
        let chain = RuleChain::from_policy(&policy)?;
        Ok(Self::with_chain(policy, chain))
    }

    /// Create a bundler using a prepared rule chain.
    pub fn with_chain(policy: Policy, chain: RuleChain) -> Self {
        let (progress_tx, _) = broadcast::channel(100);
        Self {
            policy,
            chain,
            progress_tx,
            cancel: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Add a rule next to the built-in ones.
    pub fn add_rule(&mut self, rule: Rule) {
        self.chain.add_rule(rule);
    }

    pub fn policy(&self) -> &Policy {
        &self.policy
    }

    pub fn chain(&self) -> &RuleChain {
        &self.chain
    }

    /// Subscribe to progress updates.
    pub fn subscribe(&self) -> broadcast::Receiver<BundleProgress> {
        self.progress_tx.subscribe()
    }

    /// Flag that stops the run at the next entry or chunk when set.
    pub fn cancel_handle(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.cancel)
    }

    /// Bundle the policy's root into `sink`.
    ///
    /// A cancelled run still closes the document; the report's outcome
    /// tells it apart from a finished one.
    pub fn run<S>(&self, sink: &mut S) -> Result<BundleReport, WalkError>
    where
        S: BundleSink + ?Sized,
    {
        let start = Instant::now();
        let diagnostics = Diagnostics::new();
        let pool = BufferPool::new(self.policy.max_buffer_size);
        let walker = Walker::new(&self.policy, &self.chain, &diagnostics)?;
        let mut stats = BundleStats::new();
        let mut progress = ProgressTracker::new(PROGRESS_INTERVAL);

        info!(root = %walker.root().display(), rules = self.chain.len(), "bundling");
        sink.begin_document().map_err(WalkError::output)?;

        // Structure pass
        sink.begin_structure().map_err(WalkError::output)?;
        let mut outcome = walker.walk("", 0, |entry, depth| {
            if self.cancel.load(Ordering::Relaxed) {
                return Ok(Visit::Abort(CANCELLED));
            }
            if entry.is_dir() {
                sink.write_directory(entry, depth).map_err(WalkError::output)?;
                stats.record_dir(depth);
            } else {
                sink.write_file_entry(entry, depth).map_err(WalkError::output)?;
                stats.record_file(depth);
            }
            if progress.record_entry(entry.path()) {
                self.publish(&progress, &stats, &diagnostics);
            }
            Ok(Visit::Continue)
        })?;
        sink.end_structure().map_err(WalkError::output)?;
        debug!(
            dirs = stats.dirs_listed,
            files = stats.files_listed,
            "structure pass done"
        );

        // Content pass
        if outcome == WalkOutcome::Completed {
            progress.start_phase(Phase::Content);
            let pipeline = ContentPipeline::new(
                &self.chain,
                &pool,
                &diagnostics,
                self.policy.max_file_size,
            )
            .with_cancel(&self.cancel);

            sink.begin_content().map_err(WalkError::output)?;
            outcome = walker.walk("", 0, |entry, _depth| {
                if self.cancel.load(Ordering::Relaxed) {
                    return Ok(Visit::Abort(CANCELLED));
                }
                if entry.is_dir() {
                    return Ok(Visit::Continue);
                }
                if pipeline.stream(entry, &mut *sink, &mut stats)? == Streamed::Cancelled {
                    return Ok(Visit::Abort(CANCELLED));
                }
                if progress.record_entry(entry.path()) {
                    self.publish(&progress, &stats, &diagnostics);
                }
                Ok(Visit::Continue)
            })?;
            sink.end_content().map_err(WalkError::output)?;
            debug!(
                streamed = stats.files_streamed,
                skipped = stats.files_skipped,
                "content pass done"
            );
        }

        sink.end_document().map_err(WalkError::output)?;

        stats.peak_buffer_size = stats.peak_buffer_size.max(pool.peak());
        progress.start_phase(Phase::Finished);
        self.publish(&progress, &stats, &diagnostics);

        let outcome = match outcome {
            WalkOutcome::Completed => RunOutcome::Completed,
            WalkOutcome::Aborted(code) => RunOutcome::Aborted(code),
        };
        let (warnings, warning_count) = diagnostics.into_parts();
        let duration = start.elapsed();
        info!(
            ?outcome,
            files = stats.files_streamed,
            warnings = warning_count,
            elapsed_ms = duration.as_millis() as u64,
            "bundle finished"
        );

        Ok(BundleReport {
            outcome,
            stats,
            warnings,
            warning_count,
            duration,
        })
    }

    fn publish(&self, progress: &ProgressTracker, stats: &BundleStats, diagnostics: &Diagnostics) {
        // No receivers is fine.
        let _ = self
            .progress_tx
            .send(progress.snapshot(stats, diagnostics.count()));
    }
}
