//! Rule chain for dirbundle.
//!
//! Decides which entries a walk reports and how their content is rewritten
//! on the way out.
//!
//! # Overview
//!
//! A [`RuleChain`] holds INCLUDE, EXCLUDE and TRANSFORM rules ordered by
//! priority. Each rule supplies any of three capabilities through the
//! [`RuleLogic`] trait:
//!
//! - a **path matcher**, consulted once per entry
//! - a **content matcher**, consulted once per chunk
//! - a **transform**, applied to every chunk it accepts
//!
//! The built-in rules derived from a [`Policy`](dirbundle_core::Policy) are
//! installed by [`RuleChain::from_policy`]; callers can add their own rules
//! next to them.
//!
//! # Example
//!
//! ```rust,no_run
//! use dirbundle_core::Policy;
//! use dirbundle_filter::{PathFn, Rule, RuleChain};
//!
//! let mut policy = Policy::new("/path/to/project");
//! policy.exclude_patterns = vec!["*.log".into(), "target".into()];
//!
//! let mut chain = RuleChain::from_policy(&policy).unwrap();
//! chain.add_rule(Rule::exclude(
//!     "no-lockfiles",
//!     60,
//!     PathFn::new(|entry| entry.name().ends_with(".lock")),
//! ));
//! ```

mod builtin;
mod chain;
mod error;
mod pattern;
mod rule;

pub use builtin::{
    BINARY_PLACEHOLDER, BinaryPolicy, ExcludePatterns, IncludePatterns, MARKER_CAPACITY,
    SYMLINK_TOO_LONG, SYMLINK_UNREADABLE, SelfExclusion, SymlinkPolicy, install, priority,
    symlink_marker,
};
pub use chain::{RuleChain, TransformedChunk};
pub use error::FilterError;
pub use pattern::{PatternSet, normalize_pattern};
pub use rule::{ContentFn, PathFn, Rule, RuleKind, RuleLogic, TransformFn, Transformed};
