use crate::parse::errors::ParseError;
use crate::text::SourceText;
use ast_grep_language::{LanguageExt, SupportLang};
use tree_sitter::{Parser, Tree};

/// Grammar selection for the parsed source.
///
/// The editor operates on React codebases, so the default grammar is TSX,
/// which accepts plain JavaScript and JSX alongside TypeScript syntax.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SourceLang {
    JavaScript,
    TypeScript,
    #[default]
    Tsx,
}

impl SourceLang {
    pub(crate) fn support_lang(self) -> SupportLang {
        match self {
            SourceLang::JavaScript => SupportLang::JavaScript,
            SourceLang::TypeScript => SupportLang::TypeScript,
            SourceLang::Tsx => SupportLang::Tsx,
        }
    }
}

/// Tree-sitter parser wrapper for the editor's source language.
///
/// One instance is owned by the orchestrator and reused across cycles; the
/// trees it produces are cycle-scoped and never outlive their source.
pub struct SourceParser {
    parser: Parser,
    lang: SourceLang,
}

impl SourceParser {
    /// Create a parser for the default grammar (TSX).
    pub fn new() -> Result<Self, ParseError> {
        Self::with_lang(SourceLang::default())
    }

    /// Create a parser for a specific grammar.
    pub fn with_lang(lang: SourceLang) -> Result<Self, ParseError> {
        let mut parser = Parser::new();
        let ts_lang = lang.support_lang().get_ts_language();
        parser
            .set_language(&ts_lang)
            .map_err(|_| ParseError::LanguageSet)?;

        Ok(Self { parser, lang })
    }

    /// Get the configured grammar.
    pub fn lang(&self) -> SourceLang {
        self.lang
    }

    /// Parse source text into a [`ParsedTree`].
    ///
    /// Tree-sitter itself is error tolerant; this wrapper treats any ERROR
    /// or MISSING node as a failed parse, because a brick evaluating a
    /// half-recognized tree would derive garbage. The orchestrator catches
    /// the error and skips the cycle.
    pub fn parse(&mut self, source: &str) -> Result<ParsedTree, ParseError> {
        let tree = self
            .parser
            .parse(source, None)
            .ok_or(ParseError::ParseFailed)?;

        if let Some(err) = first_error_node(tree.root_node()) {
            return Err(err);
        }

        Ok(ParsedTree {
            source: source.to_string(),
            tree,
            lang: self.lang,
        })
    }
}

/// A structural representation of one source text snapshot.
///
/// Rebuilt fresh from the text at the start of each parse cycle; never
/// incrementally patched across cycles. During a commit the working tree is
/// owned exclusively by the commit and replaced wholesale after each
/// operation's edits are spliced in.
pub struct ParsedTree {
    pub(crate) source: String,
    pub(crate) tree: Tree,
    pub(crate) lang: SourceLang,
}

impl ParsedTree {
    /// The source text this tree was parsed from.
    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn lang(&self) -> SourceLang {
        self.lang
    }

    /// Serialize the tree back to source text.
    ///
    /// All mutation happens through verified byte-span splices, so regions
    /// untouched by any operation round-trip byte-identically; with zero
    /// operations the output equals the input.
    pub fn print(&self) -> SourceText {
        SourceText::new(self.source.clone())
    }

    pub(crate) fn root_node(&self) -> tree_sitter::Node<'_> {
        self.tree.root_node()
    }
}

fn first_error_node(node: tree_sitter::Node<'_>) -> Option<ParseError> {
    if node.is_error() || node.is_missing() {
        let start = node.start_position();
        return Some(ParseError::Syntax {
            byte_start: node.start_byte(),
            byte_end: node.end_byte(),
            row: start.row,
            column: start.column,
        });
    }

    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        if let Some(err) = first_error_node(child) {
            return Some(err);
        }
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_valid_source() {
        let mut parser = SourceParser::new().unwrap();
        let source = "import a from './a';\nconst x = 1;\n";
        let parsed = parser.parse(source).unwrap();

        assert_eq!(parsed.root_node().kind(), "program");
        assert_eq!(parsed.source(), source);
    }

    #[test]
    fn parse_unterminated_string_fails() {
        let mut parser = SourceParser::new().unwrap();
        let result = parser.parse("const x = 'oops;\n");

        assert!(matches!(result, Err(ParseError::Syntax { .. })));
    }

    #[test]
    fn print_round_trips() {
        let mut parser = SourceParser::new().unwrap();
        let source = "import a from './a';\nimport b from 'b';\n";
        let parsed = parser.parse(source).unwrap();

        assert_eq!(parsed.print().as_str(), source);
    }

    #[test]
    fn tsx_grammar_accepts_jsx() {
        let mut parser = SourceParser::with_lang(SourceLang::Tsx).unwrap();
        let source = "const el = <div className=\"x\">hi</div>;\n";
        assert!(parser.parse(source).is_ok());
    }
}
