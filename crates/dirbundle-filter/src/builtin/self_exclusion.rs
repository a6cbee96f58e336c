use std::fs;
use std::path::{Component, Path, PathBuf};

use dirbundle_core::{Entry, Identity};
use tracing::debug;

use super::priority;
use crate::error::FilterError;
use crate::rule::{Rule, RuleLogic};

/// Keeps the output document out of the tree it is generated from.
///
/// The output may not exist yet when the rule is built, so it is matched by
/// its walk-relative path as well as by identity when it does exist.
#[derive(Debug, Clone)]
pub struct SelfExclusion {
    abs_output: PathBuf,
    rel_output: String,
    identity: Option<Identity>,
}

impl SelfExclusion {
    /// Build the rule for writing `output` while bundling `root`.
    ///
    /// Returns `None` when the output lies outside `root` or when `root`
    /// cannot be resolved (the walk reports that itself).
    pub fn new(root: &Path, output: &Path) -> Result<Option<Self>, FilterError> {
        let Ok(root) = root.canonicalize() else {
            return Ok(None);
        };
        let abs_output = resolve(output)?;

        let Ok(relative) = abs_output.strip_prefix(&root) else {
            return Ok(None);
        };
        let rel_output = relative
            .components()
            .filter_map(|c| match c {
                Component::Normal(part) => Some(part.to_string_lossy()),
                _ => None,
            })
            .collect::<Vec<_>>()
            .join("/");
        if rel_output.is_empty() {
            return Ok(None);
        }

        let identity = fs::metadata(&abs_output)
            .ok()
            .map(|meta| Identity::of(&abs_output, &meta));

        debug!(output = %abs_output.display(), rel = %rel_output, "excluding output from input");
        Ok(Some(Self {
            abs_output,
            rel_output,
            identity,
        }))
    }

    /// Walk-relative path of the output.
    pub fn relative_path(&self) -> &str {
        &self.rel_output
    }

    pub fn into_rule(self) -> Rule {
        Rule::exclude("output-self-exclusion", priority::SELF_EXCLUSION, self)
    }
}

impl RuleLogic for SelfExclusion {
    fn match_path(&self, entry: &Entry<'_>) -> Option<bool> {
        if entry.path() == self.rel_output || entry.content_path() == self.abs_output {
            return Some(true);
        }
        let same_object = !entry.is_dir() && self.identity == Some(entry.identity());
        Some(same_object)
    }
}

/// Absolute form of `path`, resolving links where the path exists.
fn resolve(path: &Path) -> Result<PathBuf, FilterError> {
    if let Ok(canonical) = path.canonicalize() {
        return Ok(canonical);
    }
    if let (Some(parent), Some(name)) = (path.parent(), path.file_name()) {
        let parent = if parent.as_os_str().is_empty() {
            Path::new(".")
        } else {
            parent
        };
        if let Ok(parent) = parent.canonicalize() {
            return Ok(parent.join(name));
        }
    }
    std::path::absolute(path).map_err(|source| FilterError::Resolve {
        path: path.to_path_buf(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use dirbundle_core::EntryKind;
    use tempfile::TempDir;

    #[test]
    fn test_output_outside_root() {
        let root = TempDir::new().unwrap();
        let elsewhere = TempDir::new().unwrap();
        let rule = SelfExclusion::new(root.path(), &elsewhere.path().join("out.txt")).unwrap();
        assert!(rule.is_none());
    }

    #[test]
    fn test_missing_output_matched_by_path() {
        let root = TempDir::new().unwrap();
        fs::create_dir(root.path().join("docs")).unwrap();
        let output = root.path().join("docs").join("bundle.txt");

        let rule = SelfExclusion::new(root.path(), &output).unwrap().unwrap();
        assert_eq!(rule.relative_path(), "docs/bundle.txt");

        let abs = root.path().join("docs/bundle.txt");
        let hit = Entry::new("docs/bundle.txt", &abs, EntryKind::File);
        assert_eq!(rule.match_path(&hit), Some(true));

        let other = root.path().join("bundle.txt");
        let same_name = Entry::new("bundle.txt", &other, EntryKind::File);
        assert_eq!(rule.match_path(&same_name), Some(false));
    }

    #[test]
    fn test_existing_output_matched_by_identity() {
        let root = TempDir::new().unwrap();
        let output = root.path().join("out.txt");
        fs::write(&output, "previous run").unwrap();

        let rule = SelfExclusion::new(root.path(), &output).unwrap().unwrap();
        let meta = fs::symlink_metadata(&output).unwrap();
        let alias = Path::new("/elsewhere/alias.txt");
        let entry = Entry::new("alias.txt", alias, EntryKind::File)
            .with_identity(Identity::of(&output, &meta));
        assert_eq!(rule.match_path(&entry), Some(true));
    }

    #[test]
    fn test_relative_output_path() {
        let root = TempDir::new().unwrap();
        fs::create_dir(root.path().join("sub")).unwrap();
        let output = root.path().join("sub").join("..").join("out.md");
        let rule = SelfExclusion::new(root.path(), &output).unwrap().unwrap();
        assert_eq!(rule.relative_path(), "out.md");
    }
}
