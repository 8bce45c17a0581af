// Copyright (c) Ken Kocienda and other contributors.
//
// This source code is licensed under the MIT license found in the
// LICENSE file in the root directory of this source tree.

//! Span edits and content hashing.
//!
//! The import rewriter never re-renders a dependent file. It computes
//! byte-span replacements over the original text and applies them here, so
//! everything outside the edited module paths is preserved byte for byte.
//!
//! Edits are applied in descending start order after bounds and overlap
//! validation. Either every edit applies or none does.

use std::cmp::Ordering;
use std::fmt;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use thiserror::Error;

/// Hash type for content comparison (SHA-256, stored as hex string).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ContentHash(pub String);

impl ContentHash {
    /// Compute SHA-256 hash of the given bytes, returning hex-encoded string.
    pub fn compute(data: &[u8]) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(data);
        ContentHash(hex::encode(hasher.finalize()))
    }
}

impl fmt::Display for ContentHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Byte offsets into file content.
///
/// Spans are half-open intervals: `[start, end)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Span {
    /// Start byte offset (inclusive).
    pub start: usize,
    /// End byte offset (exclusive).
    pub end: usize,
}

impl Span {
    /// Create a new span.
    ///
    /// # Panics
    /// Panics if `start > end`.
    pub fn new(start: usize, end: usize) -> Self {
        assert!(
            start <= end,
            "Span start ({}) must be <= end ({})",
            start,
            end
        );
        Span { start, end }
    }

    /// Length of the span in bytes.
    pub fn len(&self) -> usize {
        self.end - self.start
    }

    /// Check if span is empty.
    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }

    /// Two spans overlap if they share any byte positions.
    /// Adjacent spans do NOT overlap.
    pub fn overlaps(&self, other: &Span) -> bool {
        self.start < other.end && other.start < self.end
    }

    /// Check if this span contains another span entirely.
    pub fn contains(&self, other: &Span) -> bool {
        self.start <= other.start && other.end <= self.end
    }
}

impl fmt::Display for Span {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {})", self.start, self.end)
    }
}

/// Replace the bytes in `span` with `new_text`.
///
/// An empty span is an insertion at `span.start`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextEdit {
    pub span: Span,
    pub new_text: String,
}

impl TextEdit {
    pub fn replace(span: Span, new_text: impl Into<String>) -> Self {
        TextEdit {
            span,
            new_text: new_text.into(),
        }
    }

    pub fn is_insertion(&self) -> bool {
        self.span.is_empty()
    }
}

/// Errors raised while validating a batch of edits.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EditError {
    #[error("overlapping edits: {first} and {second}")]
    OverlappingEdits { first: Span, second: Span },

    #[error("span {span} is out of bounds for source of length {source_len}")]
    SpanOutOfBounds { span: Span, source_len: usize },

    #[error("span {span} does not fall on a character boundary")]
    NotCharBoundary { span: Span },
}

/// Apply all edits to `source`, returning the new text.
///
/// An empty edit list returns the source unchanged.
pub fn apply_edits(source: &str, edits: &[TextEdit]) -> Result<String, EditError> {
    if edits.is_empty() {
        return Ok(source.to_string());
    }

    let source_len = source.len();
    for edit in edits {
        if edit.span.end > source_len {
            return Err(EditError::SpanOutOfBounds {
                span: edit.span,
                source_len,
            });
        }
        if !source.is_char_boundary(edit.span.start) || !source.is_char_boundary(edit.span.end) {
            return Err(EditError::NotCharBoundary { span: edit.span });
        }
    }

    // Descending by start; at the same position replacements go before
    // insertions so the insertion lands at the original offset.
    let mut sorted: Vec<&TextEdit> = edits.iter().collect();
    sorted.sort_by(|a, b| match b.span.start.cmp(&a.span.start) {
        Ordering::Equal => match (a.is_insertion(), b.is_insertion()) {
            (false, true) => Ordering::Less,
            (true, false) => Ordering::Greater,
            _ => Ordering::Equal,
        },
        other => other,
    });

    for pair in sorted.windows(2) {
        if pair[0].span.overlaps(&pair[1].span) {
            return Err(EditError::OverlappingEdits {
                first: pair[1].span,
                second: pair[0].span,
            });
        }
    }

    let mut result = source.to_string();
    for edit in sorted {
        result.replace_range(edit.span.start..edit.span.end, &edit.new_text);
    }
    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;

    mod content_hash {
        use super::*;

        #[test]
        fn same_bytes_same_hash() {
            let a = ContentHash::compute(b"class Foo: pass");
            let b = ContentHash::compute(b"class Foo: pass");
            assert_eq!(a, b);
            assert_eq!(a.0.len(), 64);
        }

        #[test]
        fn different_bytes_different_hash() {
            let a = ContentHash::compute(b"class Foo: pass");
            let b = ContentHash::compute(b"class Bar: pass");
            assert_ne!(a, b);
        }
    }

    mod span {
        use super::*;

        #[test]
        fn adjacent_spans_do_not_overlap() {
            assert!(!Span::new(0, 5).overlaps(&Span::new(5, 10)));
            assert!(Span::new(0, 6).overlaps(&Span::new(5, 10)));
        }

        #[test]
        fn contains_and_len() {
            let outer = Span::new(2, 10);
            assert!(outer.contains(&Span::new(3, 4)));
            assert!(!outer.contains(&Span::new(1, 4)));
            assert_eq!(outer.len(), 8);
            assert!(Span::new(4, 4).is_empty());
        }

        #[test]
        #[should_panic(expected = "must be <= end")]
        fn inverted_span_panics() {
            let _ = Span::new(5, 2);
        }
    }

    mod apply {
        use super::*;

        #[test]
        fn replaces_module_paths_in_place() {
            let source = "from models import Foo\nfrom models import Bar\n";
            let edits = vec![
                TextEdit::replace(Span::new(5, 11), "foo"),
                TextEdit::replace(Span::new(28, 34), "bar"),
            ];
            let result = apply_edits(source, &edits).unwrap();
            assert_eq!(result, "from foo import Foo\nfrom bar import Bar\n");
        }

        #[test]
        fn order_of_edits_does_not_matter() {
            let source = "abcdef";
            let forward = vec![
                TextEdit::replace(Span::new(0, 1), "X"),
                TextEdit::replace(Span::new(4, 6), "YZW"),
            ];
            let mut backward = forward.clone();
            backward.reverse();
            assert_eq!(
                apply_edits(source, &forward).unwrap(),
                apply_edits(source, &backward).unwrap()
            );
            assert_eq!(apply_edits(source, &forward).unwrap(), "XbcdYZW");
        }

        #[test]
        fn insertion_at_replacement_start_lands_before_it() {
            let source = "import a\n";
            let edits = vec![
                TextEdit::replace(Span::new(0, 0), "import b\n"),
                TextEdit::replace(Span::new(7, 8), "c"),
            ];
            assert_eq!(apply_edits(source, &edits).unwrap(), "import b\nimport c\n");
        }

        #[test]
        fn empty_edits_return_source() {
            assert_eq!(apply_edits("x = 1\n", &[]).unwrap(), "x = 1\n");
        }

        #[test]
        fn out_of_bounds_is_rejected() {
            let err = apply_edits("abc", &[TextEdit::replace(Span::new(1, 9), "z")]).unwrap_err();
            assert_eq!(
                err,
                EditError::SpanOutOfBounds {
                    span: Span::new(1, 9),
                    source_len: 3
                }
            );
        }

        #[test]
        fn overlapping_edits_are_rejected() {
            let edits = vec![
                TextEdit::replace(Span::new(0, 4), "a"),
                TextEdit::replace(Span::new(2, 6), "b"),
            ];
            let err = apply_edits("abcdefgh", &edits).unwrap_err();
            assert!(matches!(err, EditError::OverlappingEdits { .. }));
        }

        #[test]
        fn split_utf8_is_rejected() {
            let err = apply_edits("é", &[TextEdit::replace(Span::new(0, 1), "e")]).unwrap_err();
            assert!(matches!(err, EditError::NotCharBoundary { .. }));
        }
    }
}
