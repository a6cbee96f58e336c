//! Rule definitions.

use std::fmt;

use dirbundle_core::Entry;

/// What a rule does when its matchers fire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RuleKind {
    /// Entries must match to be kept.
    Include,
    /// Matching entries are dropped.
    Exclude,
    /// Matching chunks are rewritten.
    Transform,
}

/// Outcome of a transform step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Transformed {
    /// Pass the chunk on as it is.
    Unchanged,
    /// Replace this chunk.
    Replaced(Vec<u8>),
    /// Replace this chunk and drop everything after it in the file.
    ReplacedFile(Vec<u8>),
}

/// Capabilities a rule can provide.
///
/// Every method has a "not provided" default: a matcher returning `None`
/// takes no part in the corresponding decision. Implementations own whatever
/// state they need; it is dropped with the chain.
pub trait RuleLogic: Send + Sync {
    /// Path matcher, consulted once per entry.
    fn match_path(&self, _entry: &Entry<'_>) -> Option<bool> {
        None
    }

    /// Content matcher, consulted once per chunk.
    fn match_content(&self, _entry: &Entry<'_>, _chunk: &[u8]) -> Option<bool> {
        None
    }

    /// Chunk transform; only called for [`RuleKind::Transform`] rules.
    fn transform(&self, _entry: &Entry<'_>, _chunk: &[u8]) -> Transformed {
        Transformed::Unchanged
    }
}

/// Path matcher built from a closure.
pub struct PathFn<F>(F);

impl<F> PathFn<F>
where
    F: Fn(&Entry<'_>) -> bool + Send + Sync,
{
    pub fn new(f: F) -> Self {
        Self(f)
    }
}

impl<F> RuleLogic for PathFn<F>
where
    F: Fn(&Entry<'_>) -> bool + Send + Sync,
{
    fn match_path(&self, entry: &Entry<'_>) -> Option<bool> {
        Some((self.0)(entry))
    }
}

/// Content matcher built from a closure.
pub struct ContentFn<F>(F);

impl<F> ContentFn<F>
where
    F: Fn(&Entry<'_>, &[u8]) -> bool + Send + Sync,
{
    pub fn new(f: F) -> Self {
        Self(f)
    }
}

impl<F> RuleLogic for ContentFn<F>
where
    F: Fn(&Entry<'_>, &[u8]) -> bool + Send + Sync,
{
    fn match_content(&self, entry: &Entry<'_>, chunk: &[u8]) -> Option<bool> {
        Some((self.0)(entry, chunk))
    }
}

/// Unconditional transform built from a closure.
pub struct TransformFn<F>(F);

impl<F> TransformFn<F>
where
    F: Fn(&Entry<'_>, &[u8]) -> Transformed + Send + Sync,
{
    pub fn new(f: F) -> Self {
        Self(f)
    }
}

impl<F> RuleLogic for TransformFn<F>
where
    F: Fn(&Entry<'_>, &[u8]) -> Transformed + Send + Sync,
{
    fn transform(&self, entry: &Entry<'_>, chunk: &[u8]) -> Transformed {
        (self.0)(entry, chunk)
    }
}

/// One unit of the rule chain. Immutable once built.
pub struct Rule {
    name: String,
    kind: RuleKind,
    priority: i32,
    logic: Box<dyn RuleLogic>,
}

impl Rule {
    /// Create a rule. Lower priorities are evaluated first.
    pub fn new(
        name: impl Into<String>,
        kind: RuleKind,
        priority: i32,
        logic: impl RuleLogic + 'static,
    ) -> Self {
        Self {
            name: name.into(),
            kind,
            priority,
            logic: Box::new(logic),
        }
    }

    /// Create an include rule.
    pub fn include(name: impl Into<String>, priority: i32, logic: impl RuleLogic + 'static) -> Self {
        Self::new(name, RuleKind::Include, priority, logic)
    }

    /// Create an exclude rule.
    pub fn exclude(name: impl Into<String>, priority: i32, logic: impl RuleLogic + 'static) -> Self {
        Self::new(name, RuleKind::Exclude, priority, logic)
    }

    /// Create a transform rule.
    pub fn transform(
        name: impl Into<String>,
        priority: i32,
        logic: impl RuleLogic + 'static,
    ) -> Self {
        Self::new(name, RuleKind::Transform, priority, logic)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> RuleKind {
        self.kind
    }

    pub fn priority(&self) -> i32 {
        self.priority
    }

    pub(crate) fn logic(&self) -> &dyn RuleLogic {
        self.logic.as_ref()
    }
}

impl fmt::Debug for Rule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Rule")
            .field("name", &self.name)
            .field("kind", &self.kind)
            .field("priority", &self.priority)
            .finish_non_exhaustive()
    }
}
