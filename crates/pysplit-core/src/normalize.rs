// Copyright (c) Ken Kocienda and other contributors.
//
// This source code is licensed under the MIT license found in the
// LICENSE file in the root directory of this source tree.

//! Identifier normalization.
//!
//! Maps an arbitrary identifier (class name, module name, free-form title) to
//! its canonical lowercase, underscore-delimited form. The result is used to
//! derive file and module names, so the function is total and idempotent:
//!
//! ```
//! use pysplit_core::normalize::normalize;
//!
//! assert_eq!(normalize("XMLHttpRequest"), "xml_http_request");
//! assert_eq!(normalize(&normalize("XMLHttpRequest")), "xml_http_request");
//! ```
//!
//! ## Word Splitting
//!
//! Words are scanned left to right:
//! - a run of digits is one word
//! - a run of lowercase letters and digits is one word
//! - a run of uppercase letters (and digits) longer than one character keeps
//!   its last letter for the next word when a lowercase letter follows
//!   (`XMLHttp` -> `xml`, `http`)
//! - a single uppercase letter takes the lowercase run after it (`Hello`)
//! - anything else is a word of its own; lone underscores are dropped
//!
//! Leading and trailing punctuation is preserved around the normalized core,
//! so dunder names keep their wrapper (`__Init__` -> `__init__`).

use std::sync::LazyLock;

use regex::Regex;

static SEPARATOR_RUNS: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[-\s]+").unwrap());
static NON_WORD: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[^\w\s]").unwrap());

/// Normalize an identifier to its canonical `snake_case` form.
///
/// Empty and whitespace-only input yields an empty string. Input without any
/// letter or digit is returned unchanged (after trimming whitespace).
pub fn normalize(identifier: &str) -> String {
    let name = identifier.trim();
    if name.is_empty() {
        return String::new();
    }

    let chars: Vec<char> = name.chars().collect();
    let Some(first) = chars.iter().position(|c| c.is_alphanumeric()) else {
        return name.to_string();
    };
    let last = chars
        .iter()
        .rposition(|c| c.is_alphanumeric())
        .unwrap_or(first);

    if first > 0 || last < chars.len() - 1 {
        let prefix: String = chars[..first].iter().collect();
        let inner: String = chars[first..=last].iter().collect();
        let suffix: String = chars[last + 1..].iter().collect();
        return format!("{}{}{}", prefix, normalize(&inner), suffix);
    }

    let name = SEPARATOR_RUNS.replace_all(name, "_");
    let name = NON_WORD.replace_all(&name, "");
    if name.is_empty() {
        return String::new();
    }

    split_words(&name)
        .iter()
        .map(|word| word.to_lowercase())
        .collect::<Vec<_>>()
        .join("_")
}

/// Split a separator-cleaned identifier into words.
fn split_words(name: &str) -> Vec<String> {
    let chars: Vec<char> = name.chars().collect();
    let len = chars.len();
    let mut words = Vec::new();
    let mut start = 0;
    let mut end = 0;

    let is_lower_or_digit = |c: char| c.is_lowercase() || c.is_numeric();

    while start < len {
        let c = chars[start];
        if c.is_numeric() {
            while end < len && chars[end].is_numeric() {
                end += 1;
            }
        } else if c.is_lowercase() {
            while end < len && is_lower_or_digit(chars[end]) {
                end += 1;
            }
        } else if c.is_uppercase() {
            while end < len && (chars[end].is_uppercase() || chars[end].is_numeric()) {
                end += 1;
            }
            if end - start > 1 && end < len {
                // Acronym followed by a capitalized word: give back its last letter.
                while end > start && chars[end].is_lowercase() {
                    end -= 1;
                }
            } else {
                while end < len && is_lower_or_digit(chars[end]) {
                    end += 1;
                }
            }
        } else {
            end += 1;
        }

        let word: String = chars[start..end].iter().collect();
        if word != "_" {
            words.push(word);
        }
        start = end;
    }

    words
}
