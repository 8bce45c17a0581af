// Copyright (c) Ken Kocienda and other contributors.
//
// This source code is licensed under the MIT license found in the
// LICENSE file in the root directory of this source tree.

//! Structural equivalence of code, files and directories.
//!
//! Two sources are equivalent when their code indexes hold the same kinds,
//! the same number of statements per kind, and the same structural
//! fingerprints per kind. Formatting and comments never matter.

use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::files::{relative_python_files, FileError};
use crate::index::CodeIndex;
use crate::render::format_source;
use crate::syntax::{DeclKind, ParseError};

/// Whether statement order within a kind matters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Ordering {
    /// Fingerprints are compared as sorted sets per kind.
    #[default]
    Unordered,
    /// Fingerprints are compared in source order per kind.
    Strict,
}

impl fmt::Display for Ordering {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Ordering::Unordered => write!(f, "unordered"),
            Ordering::Strict => write!(f, "strict"),
        }
    }
}

/// Errors from comparing files or directories.
#[derive(Debug, Error)]
pub enum CompareError {
    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error("failed to read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error(transparent)]
    Files(#[from] FileError),
}

fn fingerprints(index: &CodeIndex, kind: DeclKind, ordering: Ordering) -> Vec<&str> {
    let mut prints: Vec<&str> = index
        .bucket(kind)
        .iter()
        .map(|stmt| stmt.fingerprint.0.as_str())
        .collect();
    if ordering == Ordering::Unordered {
        prints.sort_unstable();
    }
    prints
}

/// Compare two indexes.
pub fn indexes_equivalent(a: &CodeIndex, b: &CodeIndex, ordering: Ordering) -> bool {
    let kinds_a: Vec<_> = a.kinds().collect();
    let kinds_b: Vec<_> = b.kinds().collect();
    if kinds_a != kinds_b {
        return false;
    }
    kinds_a.into_iter().all(|kind| {
        a.bucket(kind).len() == b.bucket(kind).len()
            && fingerprints(a, kind, ordering) == fingerprints(b, kind, ordering)
    })
}

/// Order-insensitive structural equivalence of two sources.
pub fn equivalent(a: &str, b: &str) -> Result<bool, ParseError> {
    equivalent_with(a, b, Ordering::Unordered)
}

/// Structural equivalence of two sources under `ordering`.
pub fn equivalent_with(a: &str, b: &str, ordering: Ordering) -> Result<bool, ParseError> {
    let index_a = CodeIndex::from_source(a)?;
    let index_b = CodeIndex::from_source(b)?;
    Ok(indexes_equivalent(&index_a, &index_b, ordering))
}

fn read(path: &Path) -> Result<String, CompareError> {
    fs::read_to_string(path).map_err(|source| CompareError::Io {
        path: path.to_path_buf(),
        source,
    })
}

/// Compare two files. Text that matches after layout normalisation
/// short-circuits parsing.
pub fn files_equivalent(a: &Path, b: &Path, ordering: Ordering) -> Result<bool, CompareError> {
    let text_a = read(a)?;
    let text_b = read(b)?;
    if text_a == text_b || format_source(&text_a) == format_source(&text_b) {
        return Ok(true);
    }
    let index_a = CodeIndex::from_source(&text_a).map_err(|e| e.with_path(a))?;
    let index_b = CodeIndex::from_source(&text_b).map_err(|e| e.with_path(b))?;
    Ok(indexes_equivalent(&index_a, &index_b, ordering))
}

/// Compare two directory trees of Python files.
///
/// Both trees must hold the same relative file paths, and each pair of
/// files must be equivalent.
pub fn directories_equivalent(a: &Path, b: &Path, ordering: Ordering) -> Result<bool, CompareError> {
    let files_a = relative_python_files(a)?;
    let files_b = relative_python_files(b)?;
    if files_a != files_b {
        debug!(left = ?files_a, right = ?files_b, "directory file sets differ");
        return Ok(false);
    }
    for rel in &files_a {
        if !files_equivalent(&a.join(rel), &b.join(rel), ordering)? {
            debug!(file = %rel, "files differ");
            return Ok(false);
        }
    }
    Ok(true)
}
