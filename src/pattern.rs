//! Structural pattern matching via ast-grep metavariables.
//!
//! This is the extensibility point for multi-step rewrites that go beyond
//! remove/insert: a pattern plus a capture-expanding template compiles down
//! to verified span [`Edit`]s, composable with any other operation inside a
//! single commit.
//!
//! # Metavariable Syntax
//!
//! - `$NAME` - Matches a single node and captures it
//! - `$$$NAME` - Matches zero or more nodes (variadic)
//! - `$_` - Matches any single node (anonymous)

use crate::edit::{Edit, EditVerification};
use crate::parse::SourceLang;
use ast_grep_core::tree_sitter::StrDoc;
use ast_grep_core::{AstGrep, NodeMatch, Pattern};
use ast_grep_language::SupportLang;
use std::cell::RefCell;
use std::collections::HashMap;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum PatternError {
    #[error("pattern matched 0 locations")]
    NoMatch,

    #[error("pattern matched {count} locations, expected exactly 1")]
    AmbiguousMatch { count: usize },

    #[error("metavariable '{name}' not captured by pattern")]
    MetavarNotFound { name: String },
}

/// A match from an ast-grep pattern with captured metavariables.
#[derive(Debug, Clone)]
pub struct PatternMatch {
    /// Byte range of the entire match
    pub byte_start: usize,
    pub byte_end: usize,
    /// The matched text
    pub text: String,
    /// Captured metavariables: name -> text
    pub captures: HashMap<String, String>,
}

impl PatternMatch {
    /// Expand a template against this match's captures.
    ///
    /// `$NAME` and `$$$NAME` in the template are replaced by the captured
    /// text of the corresponding metavariable.
    pub fn expand_template(&self, template: &str) -> String {
        let mut result = template.to_string();
        for (name, capture_text) in &self.captures {
            result = result.replace(&format!("$$${name}"), capture_text);
            result = result.replace(&format!("${name}"), capture_text);
        }
        result
    }

    /// Edit replacing the whole matched region with the expanded template.
    pub fn rewrite(&self, template: &str) -> Edit {
        Edit {
            byte_start: self.byte_start,
            byte_end: self.byte_end,
            new_text: self.expand_template(template),
            expected_before: EditVerification::from_text(&self.text),
        }
    }
}

/// Pattern matcher over one source snapshot.
pub struct PatternMatcher {
    source: String,
    lang: SupportLang,
    sg: AstGrep<StrDoc<SupportLang>>,
}

impl PatternMatcher {
    pub fn new(source: &str, lang: SourceLang) -> Self {
        let lang = lang.support_lang();
        Self {
            source: source.to_string(),
            lang,
            sg: AstGrep::new(source, lang),
        }
    }

    /// Find all matches for a pattern, in document order.
    pub fn find_all(&self, pattern: &str) -> Vec<PatternMatch> {
        let pat = compile_pattern(pattern, self.lang);
        let root = self.sg.root();
        let matches: Vec<_> = root.find_all(&pat).collect();

        matches
            .into_iter()
            .map(|m| self.to_pattern_match(m))
            .collect()
    }

    /// Find exactly one match for a pattern.
    pub fn find_unique(&self, pattern: &str) -> Result<PatternMatch, PatternError> {
        let mut matches = self.find_all(pattern);
        match matches.len() {
            0 => Err(PatternError::NoMatch),
            1 => Ok(matches.remove(0)),
            n => Err(PatternError::AmbiguousMatch { count: n }),
        }
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    fn to_pattern_match(&self, m: NodeMatch<StrDoc<SupportLang>>) -> PatternMatch {
        let node = m.get_node();
        let range = node.range();
        let byte_start = range.start;
        let byte_end = range.end;
        let text = self.source[byte_start..byte_end].to_string();
        let captures: HashMap<String, String> = m.get_env().clone().into();

        PatternMatch {
            byte_start,
            byte_end,
            text,
            captures,
        }
    }
}

/// Rewrite every pattern match in `source` via the template, as span edits.
pub fn rewrite_all(source: &str, lang: SourceLang, pattern: &str, template: &str) -> Vec<Edit> {
    let matcher = PatternMatcher::new(source, lang);
    matcher
        .find_all(pattern)
        .iter()
        .map(|m| m.rewrite(template))
        .collect()
}

const MAX_CACHE_ENTRIES: usize = 256;

thread_local! {
    // Keyed by "<lang>:<pattern>" so the same pattern text against different
    // grammars never collides.
    static PATTERN_CACHE: RefCell<HashMap<String, Pattern>> = RefCell::new(HashMap::new());
}

/// Compile a pattern, reusing a thread-local cache of compiled patterns.
///
/// Bricks tend to re-run the same handful of patterns every cycle; caching
/// the compiled form avoids paying for compilation on each keystroke. When
/// the cap is reached the cache is cleared and rebuilt on demand.
fn compile_pattern(pattern_str: &str, lang: SupportLang) -> Pattern {
    let cache_key = format!("{lang:?}:{pattern_str}");

    PATTERN_CACHE.with(|cache| {
        let mut cache = cache.borrow_mut();

        if let Some(p) = cache.get(&cache_key) {
            return p.clone();
        }

        if cache.len() >= MAX_CACHE_ENTRIES {
            cache.clear();
        }

        let compiled = Pattern::new(pattern_str, lang);
        cache.insert(cache_key, compiled.clone());
        compiled
    })
}
