use std::fmt;

/// Immutable snapshot of the current file's contents.
///
/// Owned by the [`Orchestrator`](crate::host::Orchestrator) and replaced
/// wholesale on every successful commit or external edit. Nothing in the
/// core mutates a `SourceText` in place; a new snapshot supersedes the old.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct SourceText(String);

impl SourceText {
    pub fn new(text: impl Into<String>) -> Self {
        Self(text.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl From<String> for SourceText {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for SourceText {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl AsRef<str> for SourceText {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SourceText {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
