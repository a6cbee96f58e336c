//! Explicit traversal stack replacing recursion.

use std::ffi::OsString;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::vec;

use dirbundle_core::Identity;
use tracing::trace;

use crate::identity::{Admission, IdentityTracker};

/// One open directory on the descent path.
#[derive(Debug)]
pub struct Frame {
    abs_path: PathBuf,
    rel_path: String,
    depth: u32,
    identity: Identity,
    entries: vec::IntoIter<OsString>,
}

impl Frame {
    /// List `abs_path` and build a frame for it.
    ///
    /// Names are sorted so every walk over an unchanged directory yields
    /// them in the same order. The directory handle is closed before this
    /// returns. An error part way through the listing keeps the names read
    /// so far and returns the error alongside.
    pub fn open(
        abs_path: PathBuf,
        rel_path: String,
        depth: u32,
        identity: Identity,
    ) -> io::Result<(Self, Option<io::Error>)> {
        let mut names = Vec::new();
        let mut partial = None;
        for item in fs::read_dir(&abs_path)? {
            match item {
                Ok(dirent) => names.push(dirent.file_name()),
                Err(e) => {
                    partial = Some(e);
                    break;
                }
            }
        }
        names.sort_unstable();

        let frame = Self {
            abs_path,
            rel_path,
            depth,
            identity,
            entries: names.into_iter(),
        };
        Ok((frame, partial))
    }

    /// Absolute path of the directory.
    pub fn abs_path(&self) -> &Path {
        &self.abs_path
    }

    /// Walk-relative path of the directory; empty for the walk root.
    pub fn rel_path(&self) -> &str {
        &self.rel_path
    }

    /// Depth reported for this directory's children.
    pub fn depth(&self) -> u32 {
        self.depth
    }

    pub fn identity(&self) -> Identity {
        self.identity
    }

    /// Next name in the listing, skipping `.` and `..`.
    pub fn next_name(&mut self) -> Option<OsString> {
        self.entries.find(|name| name != "." && name != "..")
    }
}

/// Stack of open frames, paired with the identity tracker that guards it.
///
/// Every frame pushed has its identity entered in the tracker, and every
/// pop leaves it again. Dropping the stack unwinds whatever is left.
#[derive(Debug)]
pub struct TraversalStack {
    frames: Vec<Frame>,
    tracker: IdentityTracker,
}

impl TraversalStack {
    /// Create an empty stack whose tracker holds at most `capacity` identities.
    pub fn new(capacity: usize) -> Self {
        Self {
            frames: Vec::new(),
            tracker: IdentityTracker::new(capacity),
        }
    }

    /// Whether a directory with `identity` may be pushed.
    pub fn admit(&self, identity: Identity) -> Admission {
        self.tracker.check(identity)
    }

    /// Push `frame`, entering its identity.
    ///
    /// The frame is dropped (closing nothing further) when the tracker
    /// refuses it.
    pub fn push(&mut self, frame: Frame) -> Admission {
        let admission = self.tracker.enter(frame.identity);
        if admission == Admission::Entered {
            trace!(path = %frame.abs_path.display(), depth = frame.depth, "push");
            self.frames.push(frame);
        }
        admission
    }

    /// Pop the top frame and leave its identity.
    pub fn pop(&mut self) -> Option<Frame> {
        let frame = self.frames.pop()?;
        self.tracker.leave();
        trace!(path = %frame.abs_path.display(), "pop");
        Some(frame)
    }

    pub fn top_mut(&mut self) -> Option<&mut Frame> {
        self.frames.last_mut()
    }

    /// Pop every frame.
    pub fn unwind(&mut self) {
        while self.pop().is_some() {}
    }

    /// Number of open frames.
    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    pub fn tracker(&self) -> &IdentityTracker {
        &self.tracker
    }
}

impl Drop for TraversalStack {
    fn drop(&mut self) {
        self.unwind();
    }
}
