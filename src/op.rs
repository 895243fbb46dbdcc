use crate::edit::Edit;
use crate::parse::{NodeHandle, NodeKind, NodePredicate, ParsedTree};
use crate::pattern;
use std::fmt;
use std::sync::Arc;
use thiserror::Error;

/// Arbitrary transform: receives the current tree, returns span edits.
///
/// This is the span-edit formulation of `(tree) -> tree'`; the commit splices
/// the edits and re-parses, so the next operation sees the transformed tree.
pub type TransformFn = dyn Fn(&ParsedTree) -> Result<Vec<Edit>, OperationError> + Send + Sync;

#[derive(Error, Debug)]
pub enum OperationError {
    #[error("transform failed: {message}")]
    Transform { message: String },
}

impl OperationError {
    pub fn transform(message: impl Into<String>) -> Self {
        OperationError::Transform {
            message: message.into(),
        }
    }
}

/// A declarative description of one structural edit.
///
/// Stateless and reusable: constructing an operation never touches a tree,
/// and the same operation can be executed against any number of trees.
/// Execution against a tree with no matching node is a no-op, not an error;
/// when several nodes match, the first in document order is affected.
#[derive(Clone)]
pub enum CodeOperation {
    /// Remove the first node of `kind` matching `predicate`, along with its
    /// trailing newline.
    Remove {
        kind: NodeKind,
        predicate: NodePredicate,
    },
    /// Insert text at a structural anchor; has no match target.
    Insert {
        text: String,
        point: InsertionPoint,
    },
    /// Rewrite every ast-grep pattern match via a capture-expanding template.
    ReplacePattern { pattern: String, template: String },
    /// Arbitrary transform over the tree.
    Transform(Arc<TransformFn>),
}

/// Printer-determined insertion anchors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertionPoint {
    /// After the last import declaration; top of file when there is none.
    AfterImports,
    /// Byte offset zero.
    FileStart,
}

impl CodeOperation {
    /// Remove the first node of `kind` matching `predicate`.
    pub fn find_and_remove(kind: NodeKind, predicate: NodePredicate) -> Self {
        CodeOperation::Remove { kind, predicate }
    }

    /// Insert `text` verbatim at the given anchor.
    pub fn insert(text: impl Into<String>, point: InsertionPoint) -> Self {
        CodeOperation::Insert {
            text: text.into(),
            point,
        }
    }

    /// Rewrite every match of `pattern` via `template` ($NAME expansion).
    pub fn replace_pattern(pattern: impl Into<String>, template: impl Into<String>) -> Self {
        CodeOperation::ReplacePattern {
            pattern: pattern.into(),
            template: template.into(),
        }
    }

    /// Wrap an arbitrary transform function.
    pub fn transform<F>(f: F) -> Self
    where
        F: Fn(&ParsedTree) -> Result<Vec<Edit>, OperationError> + Send + Sync + 'static,
    {
        CodeOperation::Transform(Arc::new(f))
    }

    /// Execute against a tree, producing the span edits to splice.
    ///
    /// An empty vec means the operation degenerated to a no-op.
    pub(crate) fn execute(&self, tree: &ParsedTree) -> Result<Vec<Edit>, OperationError> {
        match self {
            CodeOperation::Remove { kind, predicate } => {
                Ok(match tree.find_first(*kind, predicate) {
                    Some(node) => vec![removal_edit(tree, &node)],
                    None => Vec::new(),
                })
            }
            CodeOperation::Insert { text, point } => {
                let (offset, needs_leading_newline) = point.resolve(tree);
                let new_text = if needs_leading_newline {
                    format!("\n{text}")
                } else {
                    text.clone()
                };
                Ok(vec![Edit::insert(offset, new_text)])
            }
            CodeOperation::ReplacePattern { pattern, template } => Ok(pattern::rewrite_all(
                tree.source(),
                tree.lang(),
                pattern,
                template,
            )),
            CodeOperation::Transform(f) => f(tree),
        }
    }
}

impl fmt::Debug for CodeOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CodeOperation::Remove { kind, predicate } => f
                .debug_struct("Remove")
                .field("kind", kind)
                .field("predicate", predicate)
                .finish(),
            CodeOperation::Insert { text, point } => f
                .debug_struct("Insert")
                .field("text", text)
                .field("point", point)
                .finish(),
            CodeOperation::ReplacePattern { pattern, template } => f
                .debug_struct("ReplacePattern")
                .field("pattern", pattern)
                .field("template", template)
                .finish(),
            CodeOperation::Transform(_) => f.write_str("Transform(..)"),
        }
    }
}

impl InsertionPoint {
    /// Resolve to a byte offset, and whether the inserted text must open
    /// with a newline to avoid gluing onto the preceding statement.
    fn resolve(self, tree: &ParsedTree) -> (usize, bool) {
        match self {
            InsertionPoint::FileStart => (0, false),
            InsertionPoint::AfterImports => {
                let last = tree
                    .find(NodeKind::ImportDeclaration, &NodePredicate::Any)
                    .last();
                match last {
                    None => (0, false),
                    Some(node) => {
                        let rest = &tree.source()[node.byte_end..];
                        if rest.starts_with("\r\n") {
                            (node.byte_end + 2, false)
                        } else if rest.starts_with('\n') {
                            (node.byte_end + 1, false)
                        } else {
                            (node.byte_end, true)
                        }
                    }
                }
            }
        }
    }
}

/// Removal edit for a node, extended through its trailing newline so the
/// surrounding lines close up instead of leaving a blank one.
fn removal_edit(tree: &ParsedTree, node: &NodeHandle) -> Edit {
    let source = tree.source();
    let mut end = node.byte_end;
    let rest = &source[end..];
    if rest.starts_with("\r\n") {
        end += 2;
    } else if rest.starts_with('\n') {
        end += 1;
    }

    Edit::replace(node.byte_start, end, "", &source[node.byte_start..end])
}
