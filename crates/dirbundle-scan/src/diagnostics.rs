//! Warning collection for a run.

use std::cell::{Cell, RefCell};

use dirbundle_core::WalkWarning;
use tracing::warn;

/// Most warnings kept for the run report.
pub const MAX_RETAINED_WARNINGS: usize = 1000;

/// Diagnostics sink shared by the walk and the content pipeline.
///
/// Every warning is logged. The first [`MAX_RETAINED_WARNINGS`] are kept
/// for the report; the count covers all of them.
#[derive(Debug, Default)]
pub struct Diagnostics {
    retained: RefCell<Vec<WalkWarning>>,
    count: Cell<u64>,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a warning.
    pub fn warn(&self, warning: WalkWarning) {
        warn!(path = %warning.path.display(), kind = ?warning.kind, "{}", warning.message);
        self.count.set(self.count.get() + 1);
        let mut retained = self.retained.borrow_mut();
        if retained.len() < MAX_RETAINED_WARNINGS {
            retained.push(warning);
        }
    }

    /// Total number of warnings recorded.
    pub fn count(&self) -> u64 {
        self.count.get()
    }

    /// Consume the sink, returning the retained warnings and the total count.
    pub fn into_parts(self) -> (Vec<WalkWarning>, u64) {
        (self.retained.into_inner(), self.count.get())
    }
}
