//! Brickwork: brick-driven AST-mutation transactions.
//!
//! The core of a code editor whose "bricks" are live structural analyzers:
//! on every text change the source is re-parsed and each registered brick
//! derives a display-ready summary from the tree; user actions on that
//! summary become commits that splice verified byte-span edits back into
//! the source and hand the new text to the editor surface.
//!
//! # Architecture
//!
//! All mutation compiles down to a single primitive: [`Edit`], a verified
//! byte-span replacement against an in-memory source string. Intelligence
//! lives in span acquisition (tree-sitter queries, ast-grep patterns), not
//! in the application logic. A [`Commit`] owns the tree it mutates; a failed
//! commit drops it, so observers never see partial mutation.
//!
//! # Example
//!
//! ```no_run
//! use brickwork::{BrickAction, ImportsBrick, Orchestrator};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let mut host = Orchestrator::new()?;
//! host.register(Box::new(ImportsBrick::new()));
//! host.on_text_changed("import a from './a';\nimport b from 'b';\n");
//!
//! host.dispatch(0, BrickAction::DeleteImport { name: "./a".into() })?;
//! assert_eq!(host.current_text().as_str(), "import b from 'b';\n");
//! # Ok(())
//! # }
//! ```

pub mod brick;
pub mod commit;
pub mod edit;
pub mod host;
pub mod op;
pub mod parse;
pub mod pattern;
pub mod text;

// Re-exports
pub use brick::{
    ActionOutcome, Brick, BrickAction, BrickKind, DerivedState, ImportRecord, ImportsBrick,
};
pub use commit::{Commit, CommitError, CommitOutcome};
pub use edit::{Edit, EditError, EditVerification};
pub use host::{DispatchOutcome, HostError, Orchestrator, TextSurface};
pub use op::{CodeOperation, InsertionPoint, OperationError, TransformFn};
pub use parse::{
    CapturedField, NodeHandle, NodeKind, NodePredicate, ParseError, ParsedTree, SourceLang,
    SourceParser,
};
pub use pattern::{PatternError, PatternMatch, PatternMatcher};
pub use text::SourceText;
