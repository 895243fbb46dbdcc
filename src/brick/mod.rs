//! The brick capability: pluggable analyzers/mutators attached to the
//! current source file.
//!
//! A brick re-derives its display state from the tree on every parse cycle
//! and answers presentation-layer actions by building commits. Action
//! handling is two-phase: `prepare` builds the commit without touching
//! visible state, and the host calls `confirm` only once the commit has
//! succeeded and actually changed the text (`discard` otherwise). This keeps
//! brick state consistent when an action races a stale derived view.

mod imports;

pub use imports::{ImportRecord, ImportsBrick};

use crate::commit::Commit;
use crate::parse::ParsedTree;
use crate::text::SourceText;

/// Closed set of brick variants. New brick kinds extend this enum together
/// with [`BrickAction`]; the orchestrator only ever sees the trait.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BrickKind {
    Imports,
}

/// Presentation-layer action routed to a brick. Each carries the item the
/// user acted on, as previously read from the brick's derived state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BrickAction {
    DeleteImport { name: String },
    RestoreImport { name: String },
}

/// Result of preparing an action.
#[derive(Debug)]
pub enum ActionOutcome {
    /// The brick built a commit; the host must later call exactly one of
    /// `confirm` or `discard` on the brick.
    Prepared(Commit),
    /// The action referenced an item not present in the brick's current
    /// derived state (stale by a cycle, or aimed at the wrong brick).
    /// Logged and dropped, never an error.
    Ignored { reason: String },
}

/// Display-ready summary of some code feature, keyed by field name.
///
/// A cache, not a source of truth: fully re-derivable from the source text
/// plus the brick's own pending trash.
pub type DerivedState = serde_json::Map<String, serde_json::Value>;

/// A stateful observer of the current source file.
pub trait Brick {
    fn kind(&self) -> BrickKind;

    fn name(&self) -> &str;

    /// Called once per parse cycle with the freshly built tree. Recomputes
    /// derived state; must not retain the tree reference past this call.
    fn evaluate(&mut self, text: &SourceText, tree: &ParsedTree);

    /// Current derived state, polled by the presentation layer after every
    /// cycle.
    fn derived_state(&self) -> DerivedState;

    /// Validate an action against the current derived state and build the
    /// commit that realizes it. Never mutates visible state.
    fn prepare(&mut self, action: &BrickAction) -> ActionOutcome;

    /// The prepared commit succeeded and changed the text.
    fn confirm(&mut self) {}

    /// The prepared commit failed, or changed nothing.
    fn discard(&mut self) {}
}
