// Copyright (c) Ken Kocienda and other contributors.
//
// This source code is licensed under the MIT license found in the
// LICENSE file in the root directory of this source tree.

//! Error bridge implementations for Python-layer errors.
//!
//! This module provides `impl From<X> for SplitError` conversions from the
//! error types of `pysplit-python` to the unified `SplitError` type.
//!
//! These bridges live in this crate rather than `pysplit-core` because
//! they depend on Python-layer types that are not part of core.

use std::io;
use std::path::Path;

use pysplit_core::error::SplitError;
use crate::compare::CompareError;
use crate::files::FileError;
use crate::index::LoadError;
use crate::{ParseError, RefactorError};

fn display(path: &Path) -> String {
    path.display().to_string()
}

fn io_error(action: &str, path: &Path, source: &io::Error) -> SplitError {
    if source.kind() == io::ErrorKind::NotFound {
        SplitError::file_not_found(display(path))
    } else {
        SplitError::apply(
            format!("failed to {} {}: {}", action, path.display(), source),
            Some(display(path)),
        )
    }
}

// ============================================================================
// Bridge: ParseError -> SplitError
// ============================================================================

impl From<ParseError> for SplitError {
    fn from(err: ParseError) -> Self {
        let file = err.path().map(display);
        SplitError::parse(err.to_string(), file)
    }
}

// ============================================================================
// Bridge: FileError -> SplitError
// ============================================================================

impl From<FileError> for SplitError {
    fn from(err: FileError) -> Self {
        match err {
            FileError::NotFound { path } => SplitError::file_not_found(path),
            FileError::Io(io_err) => SplitError::apply(format!("IO error: {}", io_err), None),
        }
    }
}

// ============================================================================
// Bridge: RefactorError -> SplitError
// ============================================================================

impl From<RefactorError> for SplitError {
    fn from(err: RefactorError) -> Self {
        match err {
            RefactorError::Parse(parse_err) => SplitError::from(parse_err),
            RefactorError::Io {
                action,
                path,
                source,
            } => io_error(action, &path, &source),
            RefactorError::Rewrite { ref path, .. } => {
                SplitError::apply(err.to_string(), Some(display(path)))
            }
            RefactorError::Files(file_err) => SplitError::from(file_err),
        }
    }
}

// ============================================================================
// Bridge: CompareError / LoadError -> SplitError
// ============================================================================

impl From<CompareError> for SplitError {
    fn from(err: CompareError) -> Self {
        match err {
            CompareError::Parse(parse_err) => SplitError::from(parse_err),
            CompareError::Io { path, source } => io_error("read", &path, &source),
            CompareError::Files(file_err) => SplitError::from(file_err),
        }
    }
}

impl From<LoadError> for SplitError {
    fn from(err: LoadError) -> Self {
        match err {
            LoadError::Io { path, source } => io_error("read", &path, &source),
            LoadError::Parse(parse_err) => SplitError::from(parse_err),
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use pysplit_core::error::OutputErrorCode;
    use std::path::PathBuf;

    #[test]
    fn parse_errors_keep_the_file() {
        let err = crate::syntax::parse_module("def (:\n")
            .unwrap_err()
            .with_path(Path::new("bad.py"));
        let split = SplitError::from(err);
        assert_eq!(split.error_code(), OutputErrorCode::ParseError);
        assert_eq!(split.file(), Some("bad.py"));
    }

    #[test]
    fn missing_files_are_resolution_errors() {
        let err = RefactorError::Io {
            action: "read",
            path: PathBuf::from("gone.py"),
            source: io::Error::from(io::ErrorKind::NotFound),
        };
        let split = SplitError::from(err);
        assert_eq!(split.error_code(), OutputErrorCode::ResolutionError);
        assert_eq!(split.file(), Some("gone.py"));
    }

    #[test]
    fn write_failures_are_apply_errors() {
        let err = RefactorError::Io {
            action: "write",
            path: PathBuf::from("locked.py"),
            source: io::Error::from(io::ErrorKind::PermissionDenied),
        };
        let split = SplitError::from(err);
        assert_eq!(split.error_code(), OutputErrorCode::ApplyError);
        assert!(split.to_string().contains("failed to write locked.py"));
    }

    #[test]
    fn missing_root_is_a_resolution_error() {
        let err = CompareError::Files(FileError::NotFound {
            path: "/no/such/dir".to_string(),
        });
        assert_eq!(
            SplitError::from(err).error_code(),
            OutputErrorCode::ResolutionError
        );
    }
}
