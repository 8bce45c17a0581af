// Copyright (c) Ken Kocienda and other contributors.
//
// This source code is licensed under the MIT license found in the
// LICENSE file in the root directory of this source tree.

//! Error types and error code constants for pysplit.
//!
//! `SplitError` is the single error type rendered at the CLI boundary.
//! Domain errors from the Python layer (parse failures, rewrite failures,
//! engine I/O) are bridged into it by the root crate.
//!
//! ## Error Code Mapping
//!
//! - `2`: Invalid arguments (bad input from caller)
//! - `3`: Resolution errors (file or module not found)
//! - `4`: Apply errors (failed to write, move or delete a file)
//! - `6`: Parse errors (subject file is not valid Python)
//! - `10`: Internal errors (bugs, unexpected state)

use std::fmt;

use thiserror::Error;

// ============================================================================
// Output Error Codes
// ============================================================================

/// Error codes for JSON output.
///
/// These codes map to CLI exit codes and appear in JSON error responses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum OutputErrorCode {
    /// Invalid arguments from caller (bad input, malformed configuration).
    InvalidArguments = 2,
    /// Resolution errors (file not found, module not found).
    ResolutionError = 3,
    /// Apply errors (failed to write, move or delete files).
    ApplyError = 4,
    /// The subject source could not be parsed.
    ParseError = 6,
    /// Internal errors (bugs, unexpected state).
    InternalError = 10,
}

impl OutputErrorCode {
    /// Get the numeric code value.
    pub fn code(&self) -> u8 {
        *self as u8
    }
}

impl fmt::Display for OutputErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

// ============================================================================
// Unified Error Type
// ============================================================================

/// Unified error type for CLI output.
#[derive(Debug, Error)]
pub enum SplitError {
    /// Invalid arguments from caller.
    #[error("invalid arguments: {message}")]
    InvalidArguments {
        message: String,
        details: Option<serde_json::Value>,
    },

    /// File or directory not found.
    #[error("file not found: {path}")]
    FileNotFound { path: String },

    /// Failed to write, move or delete a file.
    #[error("apply error: {message}")]
    ApplyError {
        message: String,
        file: Option<String>,
    },

    /// Malformed Python source.
    #[error("parse error: {message}")]
    ParseError {
        message: String,
        file: Option<String>,
    },

    /// Internal error (bug or unexpected state).
    #[error("internal error: {message}")]
    InternalError { message: String },
}

// ============================================================================
// Error Code Mapping
// ============================================================================

impl From<&SplitError> for OutputErrorCode {
    fn from(err: &SplitError) -> Self {
        match err {
            SplitError::InvalidArguments { .. } => OutputErrorCode::InvalidArguments,
            SplitError::FileNotFound { .. } => OutputErrorCode::ResolutionError,
            SplitError::ApplyError { .. } => OutputErrorCode::ApplyError,
            SplitError::ParseError { .. } => OutputErrorCode::ParseError,
            SplitError::InternalError { .. } => OutputErrorCode::InternalError,
        }
    }
}

impl From<SplitError> for OutputErrorCode {
    fn from(err: SplitError) -> Self {
        OutputErrorCode::from(&err)
    }
}

impl From<std::io::Error> for SplitError {
    fn from(err: std::io::Error) -> Self {
        SplitError::ApplyError {
            message: format!("IO error: {}", err),
            file: None,
        }
    }
}

impl From<serde_json::Error> for SplitError {
    fn from(err: serde_json::Error) -> Self {
        SplitError::InternalError {
            message: format!("JSON error: {}", err),
        }
    }
}

// ============================================================================
// Convenience Constructors
// ============================================================================

impl SplitError {
    /// Create an invalid arguments error.
    pub fn invalid_args(message: impl Into<String>) -> Self {
        SplitError::InvalidArguments {
            message: message.into(),
            details: None,
        }
    }

    /// Create an invalid arguments error with JSON details.
    pub fn invalid_args_with_details(
        message: impl Into<String>,
        details: serde_json::Value,
    ) -> Self {
        SplitError::InvalidArguments {
            message: message.into(),
            details: Some(details),
        }
    }

    /// Create a file not found error.
    pub fn file_not_found(path: impl Into<String>) -> Self {
        SplitError::FileNotFound { path: path.into() }
    }

    /// Create an apply error tied to a file.
    pub fn apply(message: impl Into<String>, file: Option<String>) -> Self {
        SplitError::ApplyError {
            message: message.into(),
            file,
        }
    }

    /// Create a parse error tied to a file.
    pub fn parse(message: impl Into<String>, file: Option<String>) -> Self {
        SplitError::ParseError {
            message: message.into(),
            file,
        }
    }

    /// Create an internal error.
    pub fn internal(message: impl Into<String>) -> Self {
        SplitError::InternalError {
            message: message.into(),
        }
    }

    /// Get the error code for this error.
    pub fn error_code(&self) -> OutputErrorCode {
        OutputErrorCode::from(self)
    }

    /// The file this error refers to, if any.
    pub fn file(&self) -> Option<&str> {
        match self {
            SplitError::FileNotFound { path } => Some(path),
            SplitError::ApplyError { file, .. } | SplitError::ParseError { file, .. } => {
                file.as_deref()
            }
            _ => None,
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
