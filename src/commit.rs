use crate::edit::{Edit, EditError};
use crate::op::{CodeOperation, OperationError};
use crate::parse::{ParseError, ParsedTree, SourceParser};
use crate::text::SourceText;
use thiserror::Error;

/// The atomic unit of mutation: an ordered sequence of operations executed
/// against one exclusively owned tree, serialized back to text exactly once.
///
/// `run` consumes the tree by value. On any failure the working tree is
/// dropped with the error; a half-mutated tree can never leak back into a
/// cycle. Each operation sees a tree reflecting the previous operations'
/// edits: the commit splices the edits into the working source and re-parses
/// before moving on.
#[derive(Debug, Clone)]
#[must_use = "a Commit does nothing until run() is called"]
pub struct Commit {
    operations: Vec<CodeOperation>,
}

/// Result of a successful commit.
#[derive(Debug, Clone, PartialEq, Eq)]
#[must_use = "the outcome says whether the text actually changed"]
pub enum CommitOutcome {
    /// At least one operation took effect; this is the new source text.
    Changed(SourceText),
    /// Every operation degenerated to a no-op; the caller's text stands.
    Unchanged,
}

#[derive(Error, Debug)]
pub enum CommitError {
    #[error("operation {index} failed")]
    Operation {
        index: usize,
        #[source]
        source: OperationError,
    },

    #[error("operation {index} produced an invalid edit")]
    Edit {
        index: usize,
        #[source]
        source: EditError,
    },

    #[error("operation {index} left the source unparseable")]
    Reparse {
        index: usize,
        #[source]
        source: ParseError,
    },
}

impl Commit {
    pub fn new(operations: impl IntoIterator<Item = CodeOperation>) -> Self {
        Self {
            operations: operations.into_iter().collect(),
        }
    }

    /// Commit wrapping a single operation.
    pub fn single(operation: CodeOperation) -> Self {
        Self {
            operations: vec![operation],
        }
    }

    pub fn operations(&self) -> &[CodeOperation] {
        &self.operations
    }

    /// Execute all operations in order against the supplied tree.
    ///
    /// The parser is borrowed for the intermediate re-parses; the tree is
    /// consumed so no observer can see it mid-mutation.
    pub fn run(
        self,
        parser: &mut SourceParser,
        tree: ParsedTree,
    ) -> Result<CommitOutcome, CommitError> {
        let original = tree.source().to_string();
        let mut working = tree;

        for (index, op) in self.operations.iter().enumerate() {
            let edits = op
                .execute(&working)
                .map_err(|source| CommitError::Operation { index, source })?;

            if edits.is_empty() {
                continue;
            }

            let next = Edit::apply_all(working.source(), edits)
                .map_err(|source| CommitError::Edit { index, source })?;

            if next == working.source() {
                continue;
            }

            working = parser
                .parse(&next)
                .map_err(|source| CommitError::Reparse { index, source })?;
        }

        // Single serialization after the last operation
        let output = working.print();
        if output.as_str() == original {
            Ok(CommitOutcome::Unchanged)
        } else {
            Ok(CommitOutcome::Changed(output))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::op::InsertionPoint;
    use crate::parse::{NodeKind, NodePredicate};

    fn setup(source: &str) -> (SourceParser, ParsedTree) {
        let mut parser = SourceParser::new().unwrap();
        let tree = parser.parse(source).unwrap();
        (parser, tree)
    }

    #[test]
    fn empty_commit_is_unchanged() {
        let (mut parser, tree) = setup("import a from './a';\n");
        let outcome = Commit::new([]).run(&mut parser, tree).unwrap();

        assert_eq!(outcome, CommitOutcome::Unchanged);
    }

    #[test]
    fn remove_then_serialize_once() {
        let (mut parser, tree) = setup("import a from './a';\nimport b from 'b';\n");
        let commit = Commit::single(CodeOperation::find_and_remove(
            NodeKind::ImportDeclaration,
            NodePredicate::ImportSource("./a".to_string()),
        ));

        let outcome = commit.run(&mut parser, tree).unwrap();
        assert_eq!(
            outcome,
            CommitOutcome::Changed(SourceText::from("import b from 'b';\n"))
        );
    }

    #[test]
    fn noop_operation_yields_unchanged() {
        let (mut parser, tree) = setup("import a from './a';\n");
        let commit = Commit::single(CodeOperation::find_and_remove(
            NodeKind::ImportDeclaration,
            NodePredicate::ImportSource("./missing".to_string()),
        ));

        let outcome = commit.run(&mut parser, tree).unwrap();
        assert_eq!(outcome, CommitOutcome::Unchanged);
    }

    #[test]
    fn operations_apply_in_order() {
        // The second operation must see the first one's effect: the remove
        // targets the import the insert just added.
        let (mut parser, tree) = setup("const x = 1;\n");
        let commit = Commit::new([
            CodeOperation::insert("import a from './a';\n", InsertionPoint::FileStart),
            CodeOperation::find_and_remove(
                NodeKind::ImportDeclaration,
                NodePredicate::ImportSource("./a".to_string()),
            ),
        ]);

        let outcome = commit.run(&mut parser, tree).unwrap();
        assert_eq!(outcome, CommitOutcome::Unchanged);
    }

    #[test]
    fn composite_commit_multiple_rewrites() {
        let (mut parser, tree) = setup("a.clone();\nb.clone();\nconst x = 1;\n");
        let commit = Commit::new([
            CodeOperation::replace_pattern("$X.clone()", "$X.copy()"),
            CodeOperation::insert("import util from './util';\n", InsertionPoint::FileStart),
        ]);

        let outcome = commit.run(&mut parser, tree).unwrap();
        assert_eq!(
            outcome,
            CommitOutcome::Changed(SourceText::from(
                "import util from './util';\na.copy();\nb.copy();\nconst x = 1;\n"
            ))
        );
    }

    #[test]
    fn failing_operation_aborts_whole_commit() {
        let (mut parser, tree) = setup("import a from './a';\nconst x = 1;\n");
        let commit = Commit::new([
            CodeOperation::find_and_remove(
                NodeKind::ImportDeclaration,
                NodePredicate::ImportSource("./a".to_string()),
            ),
            CodeOperation::transform(|_| Err(OperationError::transform("deliberate"))),
        ]);

        let result = commit.run(&mut parser, tree);
        assert!(matches!(
            result,
            Err(CommitError::Operation { index: 1, .. })
        ));
    }

    #[test]
    fn rerunning_remove_against_emptied_tree_is_noop() {
        let op = CodeOperation::find_and_remove(
            NodeKind::ImportDeclaration,
            NodePredicate::ImportSource("./a".to_string()),
        );

        let (mut parser, tree) = setup("import a from './a';\nconst x = 1;\n");
        let outcome = Commit::single(op.clone()).run(&mut parser, tree).unwrap();
        let CommitOutcome::Changed(text) = outcome else {
            panic!("first run should change text");
        };

        // Operation is reusable; against the already-stripped tree it no-ops
        let tree = parser.parse(text.as_str()).unwrap();
        let outcome = Commit::single(op).run(&mut parser, tree).unwrap();
        assert_eq!(outcome, CommitOutcome::Unchanged);
    }

    #[test]
    fn invalid_rewrite_fails_reparse() {
        let (mut parser, tree) = setup("const x = compute(1);\n");
        let commit = Commit::single(CodeOperation::replace_pattern(
            "compute($ARG)",
            "compute($ARG",
        ));

        let result = commit.run(&mut parser, tree);
        assert!(matches!(result, Err(CommitError::Reparse { index: 0, .. })));
    }
}
