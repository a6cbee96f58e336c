use std::path::Path;

use dirbundle_core::{Entry, EntryKind, SymlinkMode};
use tracing::debug;

use super::priority;
use crate::rule::{Rule, RuleLogic, Transformed};

/// Largest symlink marker emitted; longer targets get [`SYMLINK_TOO_LONG`].
pub const MARKER_CAPACITY: usize = 2048;

pub const SYMLINK_TOO_LONG: &str = "// [Symbolic link - target too long]\n";
pub const SYMLINK_UNREADABLE: &str = "// [Symbolic link - target unreadable]\n";

/// Symbolic link handling for links the walk does not follow.
///
/// FOLLOW and INCLUDE need no rule: the walk resolves followed links itself
/// and included links are listed without being read.
#[derive(Debug, Clone, Copy)]
pub struct SymlinkPolicy {
    mode: SymlinkMode,
}

impl SymlinkPolicy {
    pub fn new(mode: SymlinkMode) -> Self {
        Self { mode }
    }

    pub fn into_rule(self) -> Option<Rule> {
        match self.mode {
            SymlinkMode::Follow | SymlinkMode::Include => None,
            SymlinkMode::Skip => Some(Rule::exclude("symlink-skip", priority::SYMLINK, self)),
            SymlinkMode::Placeholder => Some(Rule::transform(
                "symlink-placeholder",
                priority::SYMLINK,
                self,
            )),
        }
    }
}

impl RuleLogic for SymlinkPolicy {
    fn match_path(&self, entry: &Entry<'_>) -> Option<bool> {
        match self.mode {
            SymlinkMode::Placeholder => Some(entry.kind() == EntryKind::Symlink),
            _ => Some(entry.is_symlink()),
        }
    }

    fn transform(&self, entry: &Entry<'_>, _chunk: &[u8]) -> Transformed {
        Transformed::ReplacedFile(symlink_marker(entry.abs_path()).into_bytes())
    }
}

/// Marker naming the target of the link at `link`.
pub fn symlink_marker(link: &Path) -> String {
    match std::fs::read_link(link) {
        Ok(target) => {
            let marker = format!("// [Symbolic link to: {}]\n", target.display());
            if marker.len() > MARKER_CAPACITY {
                SYMLINK_TOO_LONG.to_string()
            } else {
                marker
            }
        }
        Err(e) => {
            debug!(path = %link.display(), error = %e, "cannot read symlink target");
            SYMLINK_UNREADABLE.to_string()
        }
    }
}
