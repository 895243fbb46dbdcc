use crate::brick::{ActionOutcome, Brick, BrickAction, BrickKind, DerivedState};
use crate::commit::Commit;
use crate::op::{CodeOperation, InsertionPoint};
use crate::parse::{NodeKind, NodePredicate, ParsedTree};
use crate::text::SourceText;
use serde::Serialize;
use tracing::debug;

/// One import declaration as derived from the tree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportRecord {
    /// Module path as written in the source (e.g. `./a` or `react`)
    pub name: String,
    /// Whether the path is relative to the current file
    pub local: bool,
    /// Full statement text, retained so a deleted import can be rebuilt
    #[serde(skip)]
    pub statement: String,
}

#[derive(Debug, Clone)]
enum Pending {
    Delete(ImportRecord),
    Restore(usize),
}

/// Brick listing the file's imports and offering delete/restore.
///
/// Deleted imports go to a brick-local trash rather than vanishing, so the
/// user can put one back; restoration re-inserts the retained statement
/// after the remaining imports.
#[derive(Debug, Default)]
pub struct ImportsBrick {
    imports: Vec<ImportRecord>,
    deleted_imports: Vec<ImportRecord>,
    pending: Option<Pending>,
}

impl ImportsBrick {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn imports(&self) -> &[ImportRecord] {
        &self.imports
    }

    pub fn deleted_imports(&self) -> &[ImportRecord] {
        &self.deleted_imports
    }

    fn prepare_delete(&mut self, name: &str) -> ActionOutcome {
        // First match in list order; on duplicate paths the earliest
        // occurrence in document order is the one that goes.
        let Some(record) = self.imports.iter().find(|r| r.name == name) else {
            return ActionOutcome::Ignored {
                reason: format!("import '{name}' not in derived state"),
            };
        };

        let record = record.clone();
        let remove = CodeOperation::find_and_remove(
            NodeKind::ImportDeclaration,
            NodePredicate::ImportSource(record.name.clone()),
        );

        self.pending = Some(Pending::Delete(record));
        ActionOutcome::Prepared(Commit::single(remove))
    }

    fn prepare_restore(&mut self, name: &str) -> ActionOutcome {
        let Some(index) = self.deleted_imports.iter().position(|r| r.name == name) else {
            return ActionOutcome::Ignored {
                reason: format!("import '{name}' not in trash"),
            };
        };

        let statement = format!("{}\n", self.deleted_imports[index].statement);
        let insert = CodeOperation::insert(statement, InsertionPoint::AfterImports);

        self.pending = Some(Pending::Restore(index));
        ActionOutcome::Prepared(Commit::single(insert))
    }
}

impl Brick for ImportsBrick {
    fn kind(&self) -> BrickKind {
        BrickKind::Imports
    }

    fn name(&self) -> &str {
        "Imports"
    }

    fn evaluate(&mut self, _text: &SourceText, tree: &ParsedTree) {
        self.imports = tree
            .find(NodeKind::ImportDeclaration, &NodePredicate::Any)
            .filter_map(|node| {
                let name = node.string_field("source")?.to_string();
                Some(ImportRecord {
                    local: name.starts_with('.'),
                    statement: node.text.clone(),
                    name,
                })
            })
            .collect();
    }

    fn derived_state(&self) -> DerivedState {
        let mut state = DerivedState::new();
        state.insert(
            "imports".to_string(),
            serde_json::json!(self.imports),
        );
        state.insert(
            "deletedImports".to_string(),
            serde_json::json!(self.deleted_imports),
        );
        state
    }

    fn prepare(&mut self, action: &BrickAction) -> ActionOutcome {
        match action {
            BrickAction::DeleteImport { name } => self.prepare_delete(name),
            BrickAction::RestoreImport { name } => self.prepare_restore(name),
        }
    }

    fn confirm(&mut self) {
        match self.pending.take() {
            Some(Pending::Delete(record)) => {
                if let Some(index) = self.imports.iter().position(|r| r == &record) {
                    self.imports.remove(index);
                }
                self.deleted_imports.push(record);
            }
            Some(Pending::Restore(index)) => {
                if index < self.deleted_imports.len() {
                    self.deleted_imports.remove(index);
                }
            }
            None => debug!("confirm without a pending action"),
        }
    }

    fn discard(&mut self) {
        self.pending = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commit::CommitOutcome;
    use crate::parse::SourceParser;

    fn evaluated(source: &str) -> (SourceParser, ImportsBrick) {
        let mut parser = SourceParser::new().unwrap();
        let tree = parser.parse(source).unwrap();
        let mut brick = ImportsBrick::new();
        brick.evaluate(&SourceText::from(source), &tree);
        (parser, brick)
    }

    #[test]
    fn evaluate_classifies_imports() {
        let (_, brick) = evaluated("import a from './a';\nimport b from 'b';\n");

        assert_eq!(brick.imports().len(), 2);
        assert_eq!(brick.imports()[0].name, "./a");
        assert!(brick.imports()[0].local);
        assert_eq!(brick.imports()[1].name, "b");
        assert!(!brick.imports()[1].local);
    }

    #[test]
    fn derived_state_shape() {
        let (_, brick) = evaluated("import a from './a';\n");
        let state = brick.derived_state();

        assert_eq!(
            state["imports"],
            serde_json::json!([{ "name": "./a", "local": true }])
        );
        assert_eq!(state["deletedImports"], serde_json::json!([]));
    }

    #[test]
    fn delete_moves_record_to_trash_on_confirm() {
        let source = "import a from './a';\nimport b from 'b';\n";
        let (mut parser, mut brick) = evaluated(source);

        let outcome = brick.prepare(&BrickAction::DeleteImport {
            name: "./a".to_string(),
        });
        let ActionOutcome::Prepared(commit) = outcome else {
            panic!("expected a prepared commit");
        };

        let tree = parser.parse(source).unwrap();
        let result = commit.run(&mut parser, tree).unwrap();
        assert_eq!(
            result,
            CommitOutcome::Changed(SourceText::from("import b from 'b';\n"))
        );

        brick.confirm();
        assert_eq!(brick.imports().len(), 1);
        assert_eq!(brick.deleted_imports().len(), 1);
        assert_eq!(brick.deleted_imports()[0].name, "./a");
    }

    #[test]
    fn delete_unknown_import_is_ignored() {
        let (_, mut brick) = evaluated("import a from './a';\n");

        let outcome = brick.prepare(&BrickAction::DeleteImport {
            name: "./nope".to_string(),
        });

        assert!(matches!(outcome, ActionOutcome::Ignored { .. }));
        assert_eq!(brick.imports().len(), 1);
    }

    #[test]
    fn restore_unknown_import_is_ignored() {
        let (_, mut brick) = evaluated("import a from './a';\n");

        let outcome = brick.prepare(&BrickAction::RestoreImport {
            name: "./ghost".to_string(),
        });

        assert!(matches!(outcome, ActionOutcome::Ignored { .. }));
    }

    #[test]
    fn restore_reinserts_retained_statement() {
        let source = "import a from './a';\nimport b from 'b';\n";
        let (mut parser, mut brick) = evaluated(source);

        // Delete './a', then restore it
        let ActionOutcome::Prepared(commit) = brick.prepare(&BrickAction::DeleteImport {
            name: "./a".to_string(),
        }) else {
            panic!("expected a prepared commit");
        };
        let tree = parser.parse(source).unwrap();
        let CommitOutcome::Changed(after_delete) = commit.run(&mut parser, tree).unwrap() else {
            panic!("delete should change text");
        };
        brick.confirm();

        let tree = parser.parse(after_delete.as_str()).unwrap();
        brick.evaluate(&after_delete, &tree);

        let ActionOutcome::Prepared(commit) = brick.prepare(&BrickAction::RestoreImport {
            name: "./a".to_string(),
        }) else {
            panic!("expected a prepared commit");
        };
        let tree = parser.parse(after_delete.as_str()).unwrap();
        let CommitOutcome::Changed(restored) = commit.run(&mut parser, tree).unwrap() else {
            panic!("restore should change text");
        };
        brick.confirm();

        assert_eq!(restored.as_str(), "import b from 'b';\nimport a from './a';\n");
        assert!(brick.deleted_imports().is_empty());
    }

    #[test]
    fn discard_rolls_back_pending_change() {
        let (_, mut brick) = evaluated("import a from './a';\n");

        let outcome = brick.prepare(&BrickAction::DeleteImport {
            name: "./a".to_string(),
        });
        assert!(matches!(outcome, ActionOutcome::Prepared(_)));

        brick.discard();
        brick.confirm();
        // Nothing pending any more: state untouched
        assert_eq!(brick.imports().len(), 1);
        assert!(brick.deleted_imports().is_empty());
    }

    #[test]
    fn duplicate_paths_delete_first_occurrence() {
        let source = "import x from './x';\nimport y from './y';\nimport x2 from './x';\n";
        let (mut parser, mut brick) = evaluated(source);
        assert_eq!(brick.imports().len(), 3);

        let ActionOutcome::Prepared(commit) = brick.prepare(&BrickAction::DeleteImport {
            name: "./x".to_string(),
        }) else {
            panic!("expected a prepared commit");
        };
        let tree = parser.parse(source).unwrap();
        let CommitOutcome::Changed(text) = commit.run(&mut parser, tree).unwrap() else {
            panic!("delete should change text");
        };
        brick.confirm();

        assert_eq!(
            text.as_str(),
            "import y from './y';\nimport x2 from './x';\n"
        );
        // First list entry went to the trash; the duplicate survives
        assert_eq!(brick.deleted_imports().len(), 1);
        assert_eq!(brick.imports().iter().filter(|r| r.name == "./x").count(), 1);
    }
}
