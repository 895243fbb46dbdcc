use thiserror::Error;
use xxhash_rust::xxh3::xxh3_64;

/// The fundamental edit primitive: an in-memory byte-span replacement with
/// verification.
///
/// Every higher-level operation (remove a declaration, insert a statement,
/// rewrite a pattern match) compiles down to a list of these. Intelligence
/// lives in span acquisition via the parsed tree, not in application.
#[derive(Debug, Clone, PartialEq, Eq)]
#[must_use = "an Edit does nothing until it is applied"]
pub struct Edit {
    /// Starting byte offset (inclusive)
    pub byte_start: usize,
    /// Ending byte offset (exclusive)
    pub byte_end: usize,
    /// New text spliced in at [byte_start, byte_end)
    pub new_text: String,
    /// Verification of what we expect to find at the span before applying
    pub expected_before: EditVerification,
}

/// Verification strategy for edit safety.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EditVerification {
    /// Exact text match required
    ExactMatch(String),
    /// xxh3 hash of expected text (faster for large spans)
    Hash(u64),
}

impl EditVerification {
    /// Check if the provided text matches the verification criteria.
    pub fn matches(&self, text: &str) -> bool {
        match self {
            EditVerification::ExactMatch(expected) => text == expected,
            EditVerification::Hash(expected_hash) => xxh3_64(text.as_bytes()) == *expected_hash,
        }
    }

    /// Create verification from text, using a hash for text over 1KB.
    pub fn from_text(text: &str) -> Self {
        if text.len() > 1024 {
            EditVerification::Hash(xxh3_64(text.as_bytes()))
        } else {
            EditVerification::ExactMatch(text.to_string())
        }
    }
}

#[derive(Error, Debug)]
pub enum EditError {
    #[error("invalid byte range [{byte_start}, {byte_end}) in source of length {source_len}")]
    InvalidByteRange {
        byte_start: usize,
        byte_end: usize,
        source_len: usize,
    },

    #[error("byte offset {offset} is not a char boundary")]
    NotCharBoundary { offset: usize },

    #[error("overlapping edits: span ending at {first_end} overlaps span starting at {second_start}")]
    Overlapping {
        first_end: usize,
        second_start: usize,
    },

    #[error("before-text verification failed at {byte_start}..{byte_end}: found {found:?}")]
    BeforeTextMismatch {
        byte_start: usize,
        byte_end: usize,
        found: String,
    },
}

impl Edit {
    /// Create a replacement edit with automatic verification generation.
    pub fn replace(
        byte_start: usize,
        byte_end: usize,
        new_text: impl Into<String>,
        expected_before: &str,
    ) -> Self {
        Self {
            byte_start,
            byte_end,
            new_text: new_text.into(),
            expected_before: EditVerification::from_text(expected_before),
        }
    }

    /// Create an insertion edit at a single offset (empty target span).
    pub fn insert(offset: usize, new_text: impl Into<String>) -> Self {
        Self {
            byte_start: offset,
            byte_end: offset,
            new_text: new_text.into(),
            expected_before: EditVerification::ExactMatch(String::new()),
        }
    }

    /// Validate this edit against the given source without applying it.
    fn validate(&self, source: &str) -> Result<(), EditError> {
        if self.byte_start > self.byte_end || self.byte_end > source.len() {
            return Err(EditError::InvalidByteRange {
                byte_start: self.byte_start,
                byte_end: self.byte_end,
                source_len: source.len(),
            });
        }

        for offset in [self.byte_start, self.byte_end] {
            if !source.is_char_boundary(offset) {
                return Err(EditError::NotCharBoundary { offset });
            }
        }

        let current = &source[self.byte_start..self.byte_end];

        // Already applied: accepted as a no-op
        if current == self.new_text {
            return Ok(());
        }

        if !self.expected_before.matches(current) {
            return Err(EditError::BeforeTextMismatch {
                byte_start: self.byte_start,
                byte_end: self.byte_end,
                found: current.to_string(),
            });
        }

        Ok(())
    }

    /// Apply a batch of edits to a source string, returning the new string.
    ///
    /// Edits are validated up front, checked for overlap, then spliced
    /// bottom-to-top (sorted descending by start offset) so earlier spans
    /// stay valid while later ones are replaced. Either every edit applies
    /// or the source is left untouched behind the error.
    pub fn apply_all(source: &str, mut edits: Vec<Edit>) -> Result<String, EditError> {
        if edits.is_empty() {
            return Ok(source.to_string());
        }

        edits.sort_by(|a, b| b.byte_start.cmp(&a.byte_start));

        for edit in &edits {
            edit.validate(source)?;
        }

        // Sorted descending: in each adjacent pair, the later-in-document
        // edit comes first in the vec.
        for window in edits.windows(2) {
            let (later, earlier) = (&window[0], &window[1]);
            if earlier.byte_end > later.byte_start {
                return Err(EditError::Overlapping {
                    first_end: earlier.byte_end,
                    second_start: later.byte_start,
                });
            }
        }

        let mut result = source.to_string();
        for edit in &edits {
            result.replace_range(edit.byte_start..edit.byte_end, &edit.new_text);
        }

        Ok(result)
    }
}
