//! Non-recursive, cycle-safe directory walk.

use std::fs::{self, Metadata};
use std::path::{Path, PathBuf};

use dirbundle_core::{Entry, Identity, Policy, WalkError, WalkWarning, WarningKind};
use dirbundle_filter::RuleChain;
use tracing::{debug, trace};

use crate::diagnostics::Diagnostics;
use crate::identity::Admission;
use crate::stack::{Frame, TraversalStack};

/// What a walk callback wants to happen next.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Visit {
    Continue,
    /// Stop the walk, reporting this code.
    Abort(i32),
}

/// How a walk ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WalkOutcome {
    Completed,
    Aborted(i32),
}

/// Walks the tree under a policy's root, reporting every entry the rule
/// chain accepts.
///
/// Entries come in name order within each directory, parents before their
/// children. Each accepted directory is descended into right after it is
/// reported. Conditions affecting a single entry or subtree are recorded in
/// the diagnostics sink and the walk moves on.
pub struct Walker<'a> {
    root: PathBuf,
    policy: &'a Policy,
    chain: &'a RuleChain,
    diagnostics: &'a Diagnostics,
}

impl<'a> Walker<'a> {
    /// Create a walker, resolving and checking the policy's root.
    pub fn new(
        policy: &'a Policy,
        chain: &'a RuleChain,
        diagnostics: &'a Diagnostics,
    ) -> Result<Self, WalkError> {
        let root = policy
            .root
            .canonicalize()
            .map_err(|e| WalkError::io(&policy.root, e))?;
        if !root.is_dir() {
            return Err(WalkError::NotADirectory { path: root });
        }
        Ok(Self {
            root,
            policy,
            chain,
            diagnostics,
        })
    }

    /// Canonical walk root.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Walk the directory at `start` (relative to the root, `""` for the
    /// root itself), reporting its children at `start_depth`.
    ///
    /// The callback sees each accepted entry with its depth. An `Err` from
    /// the callback stops the walk and is returned as is; every frame is
    /// released on the way out either way.
    pub fn walk<F>(&self, start: &str, start_depth: u32, mut callback: F) -> Result<WalkOutcome, WalkError>
    where
        F: FnMut(&Entry<'_>, u32) -> Result<Visit, WalkError>,
    {
        let start = start.trim_matches('/');
        let start_abs = if start.is_empty() {
            self.root.clone()
        } else {
            self.root.join(start)
        };

        let mut stack = TraversalStack::new(self.policy.max_tracked_identities);

        let metadata = match fs::metadata(&start_abs) {
            Ok(m) => m,
            Err(e) => {
                self.diagnostics
                    .warn(WalkWarning::from_io(&start_abs, "stat", &e));
                return Ok(WalkOutcome::Completed);
            }
        };
        if !metadata.is_dir() {
            return Err(WalkError::NotADirectory { path: start_abs });
        }
        let identity = Identity::of(&start_abs, &metadata);
        if !self.descend(&mut stack, start_abs, start.to_string(), start_depth, identity) {
            return Ok(WalkOutcome::Completed);
        }

        loop {
            let Some(frame) = stack.top_mut() else {
                break;
            };
            let Some(name) = frame.next_name() else {
                stack.pop();
                continue;
            };

            let depth = frame.depth();
            let name = name.to_string_lossy();
            let abs = frame.abs_path().join(name.as_ref());
            let rel = if frame.rel_path().is_empty() {
                name.into_owned()
            } else {
                format!("{}/{}", frame.rel_path(), name)
            };

            if depth > self.policy.max_depth {
                self.diagnostics.warn(WalkWarning::new(
                    &abs,
                    format!("Deeper than {} levels, skipping", self.policy.max_depth),
                    WarningKind::DepthLimit,
                ));
                continue;
            }
            if abs.as_os_str().len() > self.policy.max_path_len {
                self.diagnostics.warn(WalkWarning::new(
                    &abs,
                    format!("Path longer than {} bytes, skipping", self.policy.max_path_len),
                    WarningKind::PathTooLong,
                ));
                continue;
            }

            let metadata = match fs::symlink_metadata(&abs) {
                Ok(m) => m,
                Err(e) => {
                    self.diagnostics.warn(WalkWarning::from_io(&abs, "stat", &e));
                    continue;
                }
            };

            let resolved = if metadata.file_type().is_symlink() && self.policy.follows_symlinks() {
                match resolve_link(&abs) {
                    Ok(resolved) => Some(resolved),
                    Err(e) => {
                        self.diagnostics.warn(WalkWarning::broken_symlink(&abs, &e));
                        continue;
                    }
                }
            } else {
                None
            };

            let mut entry = Entry::from_metadata(&rel, &abs, &metadata);
            if let Some((target, target_metadata)) = &resolved {
                entry = entry.with_link_target(target, target_metadata);
            }

            if !self.chain.should_include_path(&entry) {
                trace!(path = %rel, "filtered out");
                continue;
            }

            if let Visit::Abort(code) = callback(&entry, depth)? {
                debug!(path = %rel, code, "walk aborted");
                stack.unwind();
                return Ok(WalkOutcome::Aborted(code));
            }

            if !entry.is_dir() {
                continue;
            }
            if depth >= self.policy.max_depth {
                self.diagnostics.warn(WalkWarning::new(
                    entry.content_path(),
                    format!("Depth limit {} reached, not descending", self.policy.max_depth),
                    WarningKind::DepthLimit,
                ));
                continue;
            }
            let child_abs = entry.content_path().to_path_buf();
            let identity = entry.identity();
            self.descend(&mut stack, child_abs, rel, depth + 1, identity);
        }

        Ok(WalkOutcome::Completed)
    }

    /// Open `abs` and push it, warning instead when it cannot be entered.
    fn descend(
        &self,
        stack: &mut TraversalStack,
        abs: PathBuf,
        rel: String,
        depth: u32,
        identity: Identity,
    ) -> bool {
        match stack.admit(identity) {
            Admission::Entered => {}
            Admission::Cycle => {
                self.diagnostics.warn(WalkWarning::cycle(&abs));
                return false;
            }
            Admission::Full => {
                self.diagnostics.warn(WalkWarning::new(
                    &abs,
                    format!(
                        "More than {} nested directories open, not descending",
                        stack.tracker().capacity()
                    ),
                    WarningKind::IdentityCapacity,
                ));
                return false;
            }
        }

        let (frame, partial) = match Frame::open(abs.clone(), rel, depth, identity) {
            Ok(opened) => opened,
            Err(e) => {
                self.diagnostics
                    .warn(WalkWarning::from_io(&abs, "open directory", &e));
                return false;
            }
        };
        if let Some(e) = partial {
            self.diagnostics
                .warn(WalkWarning::from_io(&abs, "list directory", &e));
        }
        stack.push(frame) == Admission::Entered
    }
}

/// Canonical target of the link at `path` and its metadata.
fn resolve_link(path: &Path) -> std::io::Result<(PathBuf, Metadata)> {
    let target = path.canonicalize()?;
    let metadata = fs::metadata(&target)?;
    Ok((target, metadata))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn create_test_tree() -> TempDir {
        let temp = TempDir::new().unwrap();
        let root = temp.path();

        fs::create_dir(root.join("dir1")).unwrap();
        fs::create_dir(root.join("dir2")).unwrap();
        fs::create_dir(root.join("dir1/subdir")).unwrap();

        fs::write(root.join("file1.txt"), "hello").unwrap();
        fs::write(root.join("dir1/file2.txt"), "world world world").unwrap();
        fs::write(root.join("dir1/subdir/file3.txt"), "test").unwrap();
        fs::write(root.join("dir2/file4.txt"), "another file here").unwrap();

        temp
    }

    fn collect(walker: &Walker<'_>) -> Vec<(String, u32)> {
        let mut seen = Vec::new();
        let outcome = walker
            .walk("", 0, |entry, depth| {
                seen.push((entry.path().to_string(), depth));
                Ok(Visit::Continue)
            })
            .unwrap();
        assert_eq!(outcome, WalkOutcome::Completed);
        seen
    }

    #[test]
    fn test_walk_order_is_preorder_by_name() {
        let temp = create_test_tree();
        let policy = Policy::new(temp.path());
        let chain = RuleChain::new();
        let diagnostics = Diagnostics::new();
        let walker = Walker::new(&policy, &chain, &diagnostics).unwrap();

        let seen = collect(&walker);
        let expected = [
            ("dir1", 0),
            ("dir1/file2.txt", 1),
            ("dir1/subdir", 1),
            ("dir1/subdir/file3.txt", 2),
            ("dir2", 0),
            ("dir2/file4.txt", 1),
            ("file1.txt", 0),
        ];
        let expected: Vec<_> = expected.iter().map(|(p, d)| (p.to_string(), *d)).collect();
        assert_eq!(seen, expected);
        assert_eq!(diagnostics.count(), 0);
    }

    #[test]
    fn test_excluded_directory_is_not_entered() {
        let temp = create_test_tree();
        let mut policy = Policy::new(temp.path());
        policy.exclude_patterns = vec!["dir1".into()];
        let chain = RuleChain::from_policy(&policy).unwrap();
        let diagnostics = Diagnostics::new();
        let walker = Walker::new(&policy, &chain, &diagnostics).unwrap();

        let seen = collect(&walker);
        assert!(seen.iter().all(|(p, _)| !p.starts_with("dir1")));
        assert!(seen.iter().any(|(p, _)| p == "dir2/file4.txt"));
    }

    #[test]
    fn test_walk_from_subdirectory() {
        let temp = create_test_tree();
        let policy = Policy::new(temp.path());
        let chain = RuleChain::new();
        let diagnostics = Diagnostics::new();
        let walker = Walker::new(&policy, &chain, &diagnostics).unwrap();

        let mut seen = Vec::new();
        walker
            .walk("dir1", 1, |entry, depth| {
                seen.push((entry.path().to_string(), depth));
                Ok(Visit::Continue)
            })
            .unwrap();
        assert_eq!(seen[0], ("dir1/file2.txt".to_string(), 1));
        assert!(seen.contains(&("dir1/subdir/file3.txt".to_string(), 2)));
    }

    #[test]
    fn test_abort_stops_immediately() {
        let temp = create_test_tree();
        let policy = Policy::new(temp.path());
        let chain = RuleChain::new();
        let diagnostics = Diagnostics::new();
        let walker = Walker::new(&policy, &chain, &diagnostics).unwrap();

        let mut calls = 0;
        let outcome = walker
            .walk("", 0, |_, _| {
                calls += 1;
                Ok(if calls == 2 { Visit::Abort(7) } else { Visit::Continue })
            })
            .unwrap();
        assert_eq!(outcome, WalkOutcome::Aborted(7));
        assert_eq!(calls, 2);
    }

    #[test]
    fn test_callback_error_propagates() {
        let temp = create_test_tree();
        let policy = Policy::new(temp.path());
        let chain = RuleChain::new();
        let diagnostics = Diagnostics::new();
        let walker = Walker::new(&policy, &chain, &diagnostics).unwrap();

        let result = walker.walk("", 0, |_, _| {
            Err(WalkError::output(std::io::Error::other("disk full")))
        });
        assert!(matches!(result, Err(WalkError::Output { .. })));
    }

    #[test]
    fn test_missing_root() {
        let policy = Policy::new("/nonexistent/dirbundle/root");
        let chain = RuleChain::new();
        let diagnostics = Diagnostics::new();
        assert!(matches!(
            Walker::new(&policy, &chain, &diagnostics),
            Err(WalkError::NotFound { .. })
        ));
    }

    #[test]
    fn test_root_is_file() {
        let temp = TempDir::new().unwrap();
        let file = temp.path().join("plain.txt");
        fs::write(&file, "x").unwrap();

        let policy = Policy::new(&file);
        let chain = RuleChain::new();
        let diagnostics = Diagnostics::new();
        assert!(matches!(
            Walker::new(&policy, &chain, &diagnostics),
            Err(WalkError::NotADirectory { .. })
        ));
    }

    #[test]
    fn test_path_length_limit() {
        let temp = create_test_tree();
        let mut policy = Policy::new(temp.path());
        let root_len = temp.path().canonicalize().unwrap().as_os_str().len();
        policy.max_path_len = root_len + "/dir1".len();
        let chain = RuleChain::new();
        let diagnostics = Diagnostics::new();
        let walker = Walker::new(&policy, &chain, &diagnostics).unwrap();

        let seen = collect(&walker);
        let names: Vec<_> = seen.iter().map(|(p, _)| p.as_str()).collect();
        assert_eq!(names, ["dir1", "dir2"]);
        assert!(diagnostics.count() > 0);
    }
}
