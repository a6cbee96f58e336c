//! Priority-ordered rule chain.

use std::borrow::Cow;

use dirbundle_core::{Entry, Policy};
use tracing::debug;

use crate::builtin;
use crate::error::FilterError;
use crate::rule::{Rule, RuleKind, Transformed};

/// A chunk after every applicable transform has run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransformedChunk<'c> {
    /// Bytes to forward to the output.
    pub data: Cow<'c, [u8]>,
    /// Set when a transform replaced the rest of the file; nothing further
    /// should be read for it.
    pub ends_file: bool,
}

/// Ordered list of rules evaluated per entry and per chunk.
///
/// Rules run in ascending priority; rules with equal priority run in the
/// order they were added. The chain only grows, and only before a walk
/// starts.
#[derive(Debug, Default)]
pub struct RuleChain {
    rules: Vec<Rule>,
}

impl RuleChain {
    /// Create an empty chain.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a chain holding the built-in rules `policy` calls for.
    pub fn from_policy(policy: &Policy) -> Result<Self, FilterError> {
        let mut chain = Self::new();
        builtin::install(&mut chain, policy)?;
        Ok(chain)
    }

    /// Insert `rule` after every rule with a lower or equal priority.
    pub fn add_rule(&mut self, rule: Rule) {
        let at = self
            .rules
            .partition_point(|existing| existing.priority() <= rule.priority());
        debug!(
            rule = rule.name(),
            kind = ?rule.kind(),
            priority = rule.priority(),
            position = at,
            "registered rule"
        );
        self.rules.insert(at, rule);
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Rules in evaluation order.
    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    /// Decide whether `entry` is listed and considered for content.
    ///
    /// Only rejections end evaluation: a matching EXCLUDE or a non-matching
    /// INCLUDE rejects, anything else moves on to the next rule. An entry
    /// no rule rejects is kept. Directories are never rejected by INCLUDE
    /// rules so their children can still be reached.
    pub fn should_include_path(&self, entry: &Entry<'_>) -> bool {
        for rule in &self.rules {
            let Some(matched) = rule.logic().match_path(entry) else {
                continue;
            };
            if let Some(verdict) = decide(rule, matched, entry) {
                return verdict;
            }
        }
        true
    }

    /// Decide whether `chunk` of `entry` may be emitted, with the same
    /// precedence as [`Self::should_include_path`] over content matchers.
    ///
    /// A rejection covers the rest of the file.
    pub fn should_include_content(&self, entry: &Entry<'_>, chunk: &[u8]) -> bool {
        for rule in &self.rules {
            let Some(matched) = rule.logic().match_content(entry, chunk) else {
                continue;
            };
            if let Some(verdict) = decide(rule, matched, entry) {
                return verdict;
            }
        }
        true
    }

    /// Run `chunk` through every applicable TRANSFORM rule in order.
    ///
    /// A rule applies when neither its path matcher nor its content matcher
    /// (whichever it has) rejects. Each rule sees the previous rule's
    /// output. The chunk is borrowed unchanged when no rule rewrites it.
    pub fn transform<'c>(&self, entry: &Entry<'_>, chunk: &'c [u8]) -> TransformedChunk<'c> {
        let mut data = Cow::Borrowed(chunk);
        for rule in &self.rules {
            if rule.kind() != RuleKind::Transform {
                continue;
            }
            let logic = rule.logic();
            if logic.match_path(entry) == Some(false)
                || logic.match_content(entry, &data) == Some(false)
            {
                continue;
            }
            match logic.transform(entry, &data) {
                Transformed::Unchanged => {}
                Transformed::Replaced(bytes) => data = Cow::Owned(bytes),
                Transformed::ReplacedFile(bytes) => {
                    debug!(path = entry.path(), rule = rule.name(), "content replaced");
                    return TransformedChunk {
                        data: Cow::Owned(bytes),
                        ends_file: true,
                    };
                }
            }
        }
        TransformedChunk {
            data,
            ends_file: false,
        }
    }
}

impl Extend<Rule> for RuleChain {
    fn extend<T: IntoIterator<Item = Rule>>(&mut self, iter: T) {
        for rule in iter {
            self.add_rule(rule);
        }
    }
}

fn decide(rule: &Rule, matched: bool, entry: &Entry<'_>) -> Option<bool> {
    match rule.kind() {
        RuleKind::Exclude if matched => {
            debug!(path = entry.path(), rule = rule.name(), "excluded");
            Some(false)
        }
        RuleKind::Include if matched || entry.is_dir() => None,
        RuleKind::Include => {
            debug!(path = entry.path(), rule = rule.name(), "not included");
            Some(false)
        }
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rule::{ContentFn, PathFn, TransformFn};
    use dirbundle_core::EntryKind;
    use std::path::Path;

    fn file(rel: &str) -> Entry<'_> {
        Entry::new(rel, Path::new("/nonexistent"), EntryKind::File)
    }

    #[test]
    fn test_empty_chain_includes_everything() {
        let chain = RuleChain::new();
        assert!(chain.is_empty());
        assert!(chain.should_include_path(&file("a.txt")));
        assert!(chain.should_include_content(&file("a.txt"), b"abc"));
        let out = chain.transform(&file("a.txt"), b"abc");
        assert!(matches!(out.data, Cow::Borrowed(_)));
        assert_eq!(out.data.as_ref(), b"abc");
        assert!(!out.ends_file);
    }

    #[test]
    fn test_rules_sorted_by_priority_then_insertion() {
        let mut chain = RuleChain::new();
        chain.add_rule(Rule::exclude("c", 10, PathFn::new(|_| false)));
        chain.add_rule(Rule::exclude("a", 5, PathFn::new(|_| false)));
        chain.add_rule(Rule::exclude("d", 10, PathFn::new(|_| false)));
        chain.add_rule(Rule::exclude("b", 5, PathFn::new(|_| false)));

        let names: Vec<_> = chain.rules().iter().map(Rule::name).collect();
        assert_eq!(names, ["a", "b", "c", "d"]);
    }

    #[test]
    fn test_exclude_match_rejects() {
        let mut chain = RuleChain::new();
        chain.add_rule(Rule::exclude("logs", 1, PathFn::new(|e| e.path().ends_with(".log"))));

        assert!(!chain.should_include_path(&file("x.log")));
        assert!(chain.should_include_path(&file("x.txt")));
    }

    #[test]
    fn test_include_mismatch_rejects_files_but_not_dirs() {
        let mut chain = RuleChain::new();
        chain.add_rule(Rule::include("rust", 1, PathFn::new(|e| e.path().ends_with(".rs"))));

        assert!(chain.should_include_path(&file("lib.rs")));
        assert!(!chain.should_include_path(&file("notes.md")));

        let dir = Entry::new("src", Path::new("/nonexistent"), EntryKind::Directory);
        assert!(chain.should_include_path(&dir));
    }

    #[test]
    fn test_include_match_does_not_end_evaluation() {
        let mut chain = RuleChain::new();
        chain.add_rule(Rule::include("all", 1, PathFn::new(|_| true)));
        chain.add_rule(Rule::exclude("everything", 2, PathFn::new(|_| true)));
        assert!(!chain.should_include_path(&file("a")));

        let mut chain = RuleChain::new();
        chain.add_rule(Rule::include("all", 2, PathFn::new(|_| true)));
        chain.add_rule(Rule::exclude("everything", 1, PathFn::new(|_| true)));
        assert!(!chain.should_include_path(&file("a")));

        let mut chain = RuleChain::new();
        chain.add_rule(Rule::include("all", 1, PathFn::new(|_| true)));
        chain.add_rule(Rule::exclude("nothing", 2, PathFn::new(|_| false)));
        assert!(chain.should_include_path(&file("a")));
    }

    #[test]
    fn test_content_rejection() {
        let mut chain = RuleChain::new();
        chain.add_rule(Rule::exclude(
            "secret",
            1,
            ContentFn::new(|_, chunk| chunk.windows(6).any(|w| w == b"SECRET")),
        ));

        assert!(chain.should_include_content(&file("a"), b"public data"));
        assert!(!chain.should_include_content(&file("a"), b"the SECRET key"));
        // Path decisions ignore content-only rules.
        assert!(chain.should_include_path(&file("a")));
    }

    #[test]
    fn test_transforms_compose_in_order() {
        let mut chain = RuleChain::new();
        chain.add_rule(Rule::transform(
            "suffix",
            2,
            TransformFn::new(|_, chunk| {
                let mut out = chunk.to_vec();
                out.extend_from_slice(b"!");
                Transformed::Replaced(out)
            }),
        ));
        chain.add_rule(Rule::transform(
            "upper",
            1,
            TransformFn::new(|_, chunk| Transformed::Replaced(chunk.to_ascii_uppercase())),
        ));

        let out = chain.transform(&file("a"), b"hi");
        assert_eq!(out.data.as_ref(), b"HI!");
        assert!(!out.ends_file);
    }

    #[test]
    fn test_replaced_file_stops_the_pipeline() {
        let mut chain = RuleChain::new();
        chain.add_rule(Rule::transform(
            "marker",
            1,
            TransformFn::new(|_, _| Transformed::ReplacedFile(b"[gone]".to_vec())),
        ));
        chain.add_rule(Rule::transform(
            "upper",
            2,
            TransformFn::new(|_, chunk| Transformed::Replaced(chunk.to_ascii_uppercase())),
        ));

        let out = chain.transform(&file("a"), b"data");
        assert_eq!(out.data.as_ref(), b"[gone]");
        assert!(out.ends_file);
    }

    #[test]
    fn test_extend_keeps_order() {
        let mut chain = RuleChain::new();
        chain.extend([
            Rule::exclude("late", 9, PathFn::new(|_| false)),
            Rule::exclude("early", 1, PathFn::new(|_| false)),
        ]);
        assert_eq!(chain.len(), 2);
        assert_eq!(chain.rules()[0].name(), "early");
    }
}
