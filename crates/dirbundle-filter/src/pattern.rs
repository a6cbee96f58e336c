//! Wildcard path patterns.

use globset::{Glob, GlobBuilder, GlobSet, GlobSetBuilder};

use crate::error::FilterError;

/// A compiled list of wildcard patterns.
///
/// `*` matches any run of characters including `/`, `?` matches one
/// character. A `[` with no closing `]` is taken literally. Patterns are tried case-sensitively first, then with case
/// folded.
#[derive(Debug, Clone)]
pub struct PatternSet {
    patterns: Vec<String>,
    exact: GlobSet,
    folded: GlobSet,
    descendants: GlobSet,
}

impl PatternSet {
    /// Compile `patterns`, trimming surrounding whitespace and dropping
    /// patterns left empty.
    pub fn new<I, S>(patterns: I) -> Result<Self, FilterError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut kept = Vec::new();
        let mut exact = GlobSetBuilder::new();
        let mut folded = GlobSetBuilder::new();
        let mut descendants = GlobSetBuilder::new();

        for raw in patterns {
            let Some(pattern) = normalize_pattern(raw.as_ref()) else {
                continue;
            };
            exact.add(compile(&pattern, false)?);
            folded.add(compile(&pattern, true)?);
            descendants.add(compile(&format!("{pattern}/*"), false)?);
            kept.push(pattern);
        }

        Ok(Self {
            patterns: kept,
            exact: build(exact)?,
            folded: build(folded)?,
            descendants: build(descendants)?,
        })
    }

    /// Patterns as registered after normalization.
    pub fn patterns(&self) -> &[String] {
        &self.patterns
    }

    pub fn len(&self) -> usize {
        self.patterns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }

    /// Check `path` and its final component `name` against every pattern.
    pub fn matches(&self, path: &str, name: &str) -> bool {
        self.matches_one(path) || self.matches_one(name)
    }

    /// Check whether `path` lies under a directory a pattern names, i.e.
    /// matches `pattern/*`.
    pub fn matches_descendant(&self, path: &str) -> bool {
        self.descendants.is_match(path)
    }

    fn matches_one(&self, candidate: &str) -> bool {
        self.exact.is_match(candidate) || self.folded.is_match(candidate)
    }
}

/// Trim whitespace and trailing separators; `None` if nothing is left.
pub fn normalize_pattern(raw: &str) -> Option<String> {
    let trimmed = raw.trim().trim_end_matches('/');
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

fn compile(pattern: &str, case_insensitive: bool) -> Result<Glob, FilterError> {
    GlobBuilder::new(pattern)
        .literal_separator(false)
        .case_insensitive(case_insensitive)
        .allow_unclosed_class(true)
        .build()
        .map_err(|source| FilterError::InvalidPattern {
            pattern: pattern.to_string(),
            source,
        })
}

fn build(builder: GlobSetBuilder) -> Result<GlobSet, FilterError> {
    builder.build().map_err(|source| FilterError::InvalidPattern {
        pattern: String::new(),
        source,
    })
}
