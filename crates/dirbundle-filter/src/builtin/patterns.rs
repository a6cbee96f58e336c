use dirbundle_core::Entry;

use super::priority;
use crate::error::FilterError;
use crate::pattern::PatternSet;
use crate::rule::{Rule, RuleLogic};

/// Keeps only entries matching one of the include patterns.
#[derive(Debug, Clone)]
pub struct IncludePatterns {
    set: PatternSet,
}

impl IncludePatterns {
    pub fn new<S: AsRef<str>>(patterns: &[S]) -> Result<Self, FilterError> {
        Ok(Self {
            set: PatternSet::new(patterns)?,
        })
    }

    pub fn is_empty(&self) -> bool {
        self.set.is_empty()
    }

    pub fn into_rule(self) -> Rule {
        Rule::include("include-patterns", priority::INCLUDE_PATTERNS, self)
    }
}

impl RuleLogic for IncludePatterns {
    fn match_path(&self, entry: &Entry<'_>) -> Option<bool> {
        Some(matches_entry(&self.set, entry))
    }
}

/// Drops entries matching any of the exclude patterns. A matching
/// directory is dropped together with everything below it.
#[derive(Debug, Clone)]
pub struct ExcludePatterns {
    set: PatternSet,
}

impl ExcludePatterns {
    pub fn new<S: AsRef<str>>(patterns: &[S]) -> Result<Self, FilterError> {
        Ok(Self {
            set: PatternSet::new(patterns)?,
        })
    }

    pub fn is_empty(&self) -> bool {
        self.set.is_empty()
    }

    pub fn into_rule(self) -> Rule {
        Rule::exclude("exclude-patterns", priority::EXCLUDE_PATTERNS, self)
    }
}

impl RuleLogic for ExcludePatterns {
    fn match_path(&self, entry: &Entry<'_>) -> Option<bool> {
        Some(matches_entry(&self.set, entry))
    }
}

fn matches_entry(set: &PatternSet, entry: &Entry<'_>) -> bool {
    set.matches(entry.path(), entry.name()) || (entry.is_dir() && set.matches_descendant(entry.path()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use dirbundle_core::EntryKind;
    use std::path::Path;

    #[test]
    fn test_exclude_by_basename() {
        let rule = ExcludePatterns::new(&["*.log"]).unwrap();
        let entry = Entry::new("deep/dir/app.log", Path::new("/x"), EntryKind::File);
        assert_eq!(rule.match_path(&entry), Some(true));
    }

    #[test]
    fn test_exclude_directory_by_name() {
        let rule = ExcludePatterns::new(&["target"]).unwrap();
        let dir = Entry::new("crates/a/target", Path::new("/x"), EntryKind::Directory);
        assert_eq!(rule.match_path(&dir), Some(true));

        let file = Entry::new("crates/a/targets.txt", Path::new("/x"), EntryKind::File);
        assert_eq!(rule.match_path(&file), Some(false));
    }

    #[test]
    fn test_directory_descendant_pattern() {
        let rule = ExcludePatterns::new(&["vendor"]).unwrap();
        let dir = Entry::new("vendor/github.com", Path::new("/x"), EntryKind::Directory);
        assert_eq!(rule.match_path(&dir), Some(true));
    }

    #[test]
    fn test_include_full_path() {
        let rule = IncludePatterns::new(&["src/*.rs"]).unwrap();
        let hit = Entry::new("src/bin/main.rs", Path::new("/x"), EntryKind::File);
        let miss = Entry::new("tests/main.rs", Path::new("/x"), EntryKind::File);
        assert_eq!(rule.match_path(&hit), Some(true));
        assert_eq!(rule.match_path(&miss), Some(false));
    }
}
