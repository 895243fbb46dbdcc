//! Source parsing and structural queries.
//!
//! Wraps tree-sitter (grammar acquisition via ast-grep-language) behind a
//! strict contract: a parse either yields a fully recognized tree or a
//! [`ParseError`]; queries run in deterministic document order.

mod errors;
mod parser;
mod query;

pub use errors::ParseError;
pub use parser::{ParsedTree, SourceLang, SourceParser};
pub use query::{CapturedField, NodeHandle, NodeKind, NodePredicate};
