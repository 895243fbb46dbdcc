use crate::parse::parser::ParsedTree;
use std::collections::HashMap;

/// Closed set of structural node kinds the core queries for, mapped onto the
/// grammar's node names. The JS and TS grammars mostly agree on names; where
/// they diverge (class fields) both spellings are listed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeKind {
    ImportDeclaration,
    MethodDefinition,
    ClassProperty,
    ClassBody,
}

impl NodeKind {
    fn grammar_kinds(self) -> &'static [&'static str] {
        match self {
            NodeKind::ImportDeclaration => &["import_statement"],
            NodeKind::MethodDefinition => &["method_definition"],
            NodeKind::ClassProperty => &["field_definition", "public_field_definition"],
            NodeKind::ClassBody => &["class_body"],
        }
    }

    fn matches_grammar(self, kind: &str) -> bool {
        self.grammar_kinds().contains(&kind)
    }
}

/// A named field captured off a matched node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CapturedField {
    pub byte_start: usize,
    pub byte_end: usize,
    pub text: String,
    pub kind: String,
}

/// An owned snapshot of one matched node.
///
/// Handles never borrow the tree they came from; they stay valid memory-wise
/// after the tree is discarded, but their spans only mean anything against
/// the source text of the cycle that produced them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeHandle {
    pub kind: NodeKind,
    pub byte_start: usize,
    pub byte_end: usize,
    pub text: String,
    fields: HashMap<String, CapturedField>,
}

impl NodeHandle {
    pub fn field(&self, name: &str) -> Option<&CapturedField> {
        self.fields.get(name)
    }

    pub fn field_text(&self, name: &str) -> Option<&str> {
        self.fields.get(name).map(|f| f.text.as_str())
    }

    /// Field text with surrounding string-literal quotes stripped.
    pub fn string_field(&self, name: &str) -> Option<&str> {
        self.field_text(name).map(unquote)
    }
}

fn unquote(s: &str) -> &str {
    let bytes = s.as_bytes();
    if bytes.len() >= 2 {
        let (first, last) = (bytes[0], bytes[bytes.len() - 1]);
        if first == last && matches!(first, b'\'' | b'"' | b'`') {
            return &s[1..s.len() - 1];
        }
    }
    s
}

/// Attribute predicate applied to candidate nodes during [`ParsedTree::find`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodePredicate {
    /// Match any node of the requested kind.
    Any,
    /// Import declaration whose module path (source.value) equals the string.
    ImportSource(String),
    /// Method or class property whose name equals the string.
    KeyName(String),
}

impl NodePredicate {
    pub fn matches(&self, node: &NodeHandle) -> bool {
        match self {
            NodePredicate::Any => true,
            NodePredicate::ImportSource(path) => {
                node.string_field("source").is_some_and(|v| v == path)
            }
            NodePredicate::KeyName(name) => node
                .field_text("name")
                .or_else(|| node.field_text("property"))
                .is_some_and(|v| v == name),
        }
    }
}

impl ParsedTree {
    /// Structural query: all nodes of `kind` satisfying `predicate`, yielded
    /// lazily in deterministic document order (pre-order, left-to-right).
    /// Re-calling restarts the traversal from the root.
    pub fn find<'t>(
        &'t self,
        kind: NodeKind,
        predicate: &'t NodePredicate,
    ) -> impl Iterator<Item = NodeHandle> + 't {
        Find {
            tree: self,
            stack: vec![self.root_node()],
            kind,
            predicate,
        }
    }

    /// First match in document order, if any.
    pub fn find_first(&self, kind: NodeKind, predicate: &NodePredicate) -> Option<NodeHandle> {
        self.find(kind, predicate).next()
    }

    fn snapshot(&self, node: tree_sitter::Node<'_>, kind: NodeKind) -> NodeHandle {
        let mut fields = HashMap::new();

        for i in 0..node.child_count() {
            let Some(field_name) = node.field_name_for_child(i as u32) else {
                continue;
            };
            let Some(child) = node.child(i) else { continue };
            fields.insert(
                field_name.to_string(),
                CapturedField {
                    byte_start: child.start_byte(),
                    byte_end: child.end_byte(),
                    text: self.source[child.byte_range()].to_string(),
                    kind: child.kind().to_string(),
                },
            );
        }

        NodeHandle {
            kind,
            byte_start: node.start_byte(),
            byte_end: node.end_byte(),
            text: self.source[node.byte_range()].to_string(),
            fields,
        }
    }
}

/// Pre-order depth-first traversal yielding matching node snapshots.
struct Find<'t> {
    tree: &'t ParsedTree,
    stack: Vec<tree_sitter::Node<'t>>,
    kind: NodeKind,
    predicate: &'t NodePredicate,
}

impl Iterator for Find<'_> {
    type Item = NodeHandle;

    fn next(&mut self) -> Option<NodeHandle> {
        while let Some(node) = self.stack.pop() {
            // Children pushed in reverse so the leftmost pops first
            for i in (0..node.child_count()).rev() {
                if let Some(child) = node.child(i) {
                    self.stack.push(child);
                }
            }

            if self.kind.matches_grammar(node.kind()) {
                let handle = self.tree.snapshot(node, self.kind);
                if self.predicate.matches(&handle) {
                    return Some(handle);
                }
            }
        }

        None
    }
}
