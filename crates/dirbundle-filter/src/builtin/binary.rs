use dirbundle_core::{BinaryMode, Entry};

use super::priority;
use crate::rule::{Rule, RuleLogic, Transformed};

/// Marker emitted in place of binary content.
pub const BINARY_PLACEHOLDER: &[u8] = b"// [Binary file content not displayed]\n";

/// Binary file handling.
///
/// The decision rides on [`Entry::is_binary`], which inspects the file once
/// and caches the answer, so the check costs one read per file no matter
/// how many chunks the file has.
#[derive(Debug, Clone, Copy)]
pub struct BinaryPolicy {
    mode: BinaryMode,
}

impl BinaryPolicy {
    pub fn new(mode: BinaryMode) -> Self {
        Self { mode }
    }

    /// The rule for this mode; `None` when binary files are treated as text.
    pub fn into_rule(self) -> Option<Rule> {
        match self.mode {
            BinaryMode::Include => None,
            BinaryMode::Skip => Some(Rule::exclude("binary-skip", priority::BINARY, self)),
            BinaryMode::Placeholder => Some(Rule::transform(
                "binary-placeholder",
                priority::BINARY,
                self,
            )),
        }
    }
}

impl RuleLogic for BinaryPolicy {
    fn match_content(&self, entry: &Entry<'_>, _chunk: &[u8]) -> Option<bool> {
        Some(entry.is_binary())
    }

    fn transform(&self, _entry: &Entry<'_>, _chunk: &[u8]) -> Transformed {
        Transformed::ReplacedFile(BINARY_PLACEHOLDER.to_vec())
    }
}
