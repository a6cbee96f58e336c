//! Directory identity tracking for cycle detection.

use dirbundle_core::Identity;
use indexmap::IndexSet;

/// Result of asking to enter a directory.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Admission {
    /// The identity was recorded; the directory may be entered.
    Entered,
    /// The directory is already open on the current descent path.
    Cycle,
    /// The tracker holds as many identities as it may.
    Full,
}

/// Tracks the identities of the directories on the active descent path.
///
/// Only ancestors of the directory currently being listed are held, so a
/// directory reached twice through different branches is walked twice,
/// while one reached again below itself (a symlink cycle) is refused.
/// Entries leave in the reverse order they entered.
#[derive(Debug)]
pub struct IdentityTracker {
    active: IndexSet<Identity>,
    capacity: usize,
}

impl IdentityTracker {
    /// Create a tracker holding at most `capacity` identities.
    pub fn new(capacity: usize) -> Self {
        Self {
            active: IndexSet::with_capacity(capacity.min(64)),
            capacity,
        }
    }

    /// Record `identity` as entered.
    ///
    /// Refused when it is already active or the tracker is full; nothing is
    /// recorded in that case.
    pub fn enter(&mut self, identity: Identity) -> Admission {
        let admission = self.check(identity);
        if admission == Admission::Entered {
            self.active.insert(identity);
        }
        admission
    }

    /// What [`Self::enter`] would answer, without recording anything.
    pub fn check(&self, identity: Identity) -> Admission {
        if self.active.contains(&identity) {
            Admission::Cycle
        } else if self.is_full() {
            Admission::Full
        } else {
            Admission::Entered
        }
    }

    /// Remove the most recently entered identity.
    pub fn leave(&mut self) -> Option<Identity> {
        self.active.pop()
    }

    /// Check if `identity` is on the active path.
    pub fn contains(&self, identity: &Identity) -> bool {
        self.active.contains(identity)
    }

    pub fn len(&self) -> usize {
        self.active.len()
    }

    pub fn is_empty(&self) -> bool {
        self.active.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.active.len() >= self.capacity
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}
