//! Rules derived from the run policy.

mod binary;
mod patterns;
mod self_exclusion;
mod symlink;

pub use binary::{BINARY_PLACEHOLDER, BinaryPolicy};
pub use patterns::{ExcludePatterns, IncludePatterns};
pub use self_exclusion::SelfExclusion;
pub use symlink::{
    MARKER_CAPACITY, SYMLINK_TOO_LONG, SYMLINK_UNREADABLE, SymlinkPolicy, symlink_marker,
};

use dirbundle_core::Policy;
use tracing::debug;

use crate::chain::RuleChain;
use crate::error::FilterError;

/// Priorities of the built-in rules. Lower runs first.
pub mod priority {
    /// Keeps the output document out of its own input.
    pub const SELF_EXCLUSION: i32 = 0;
    pub const INCLUDE_PATTERNS: i32 = 50;
    pub const SYMLINK: i32 = 80;
    pub const BINARY: i32 = 90;
    pub const EXCLUDE_PATTERNS: i32 = 100;
}

/// Add every rule `policy` calls for to `chain`.
pub fn install(chain: &mut RuleChain, policy: &Policy) -> Result<(), FilterError> {
    if let Some(output) = &policy.output_file {
        match SelfExclusion::new(&policy.root, output)? {
            Some(rule) => chain.add_rule(rule.into_rule()),
            None => debug!(output = %output.display(), "output is outside the input tree"),
        }
    }

    let include = IncludePatterns::new(&policy.include_patterns)?;
    if !include.is_empty() {
        chain.add_rule(include.into_rule());
    }

    if let Some(rule) = SymlinkPolicy::new(policy.symlink_mode).into_rule() {
        chain.add_rule(rule);
    }

    if let Some(rule) = BinaryPolicy::new(policy.binary_mode).into_rule() {
        chain.add_rule(rule);
    }

    let exclude = ExcludePatterns::new(&policy.exclude_patterns)?;
    if !exclude.is_empty() {
        chain.add_rule(exclude.into_rule());
    }

    debug!(rules = chain.len(), "rule chain ready");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use dirbundle_core::{BinaryMode, SymlinkMode};

    #[test]
    fn test_default_policy_rules() {
        let chain = RuleChain::from_policy(&Policy::new("/src")).unwrap();
        let names: Vec<_> = chain.rules().iter().map(|r| r.name()).collect();
        assert_eq!(names, ["symlink-skip", "binary-skip"]);
    }

    #[test]
    fn test_include_modes_install_nothing() {
        let mut policy = Policy::new("/src");
        policy.binary_mode = BinaryMode::Include;
        policy.symlink_mode = SymlinkMode::Include;
        let chain = RuleChain::from_policy(&policy).unwrap();
        assert!(chain.is_empty());

        policy.symlink_mode = SymlinkMode::Follow;
        let chain = RuleChain::from_policy(&policy).unwrap();
        assert!(chain.is_empty());
    }

    #[test]
    fn test_builtin_precedence() {
        let mut policy = Policy::new("/src");
        policy.include_patterns = vec!["*.c".into()];
        policy.exclude_patterns = vec!["test*".into()];
        policy.binary_mode = BinaryMode::Placeholder;
        policy.symlink_mode = SymlinkMode::Placeholder;

        let chain = RuleChain::from_policy(&policy).unwrap();
        let priorities: Vec<_> = chain.rules().iter().map(|r| r.priority()).collect();
        assert_eq!(
            priorities,
            [
                priority::INCLUDE_PATTERNS,
                priority::SYMLINK,
                priority::BINARY,
                priority::EXCLUDE_PATTERNS,
            ]
        );
    }

    #[test]
    fn test_blank_patterns_install_nothing() {
        let mut policy = Policy::new("/src");
        policy.binary_mode = BinaryMode::Include;
        policy.symlink_mode = SymlinkMode::Include;
        policy.include_patterns = vec!["  ".into()];
        policy.exclude_patterns = vec![String::new()];
        let chain = RuleChain::from_policy(&policy).unwrap();
        assert!(chain.is_empty());
    }

    #[test]
    fn test_invalid_pattern_fails_setup() {
        let mut policy = Policy::new("/src");
        policy.exclude_patterns = vec!["file[z-a]".into()];
        assert!(matches!(
            RuleChain::from_policy(&policy),
            Err(FilterError::InvalidPattern { .. })
        ));
    }
}
