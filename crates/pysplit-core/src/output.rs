// Copyright (c) Ken Kocienda and other contributors.
//
// This source code is licensed under the MIT license found in the
// LICENSE file in the root directory of this source tree.

//! JSON output types for CLI responses.
//!
//! Every response has `status` as its first field and carries
//! `schema_version`. Output is deterministic: the same input produces the
//! same bytes (field order is declaration order, arrays are built in a
//! stable order by the callers).

use std::io::{self, Write};

use serde::{Deserialize, Serialize};

use crate::error::{OutputErrorCode, SplitError};

/// Current schema version for all responses.
pub const SCHEMA_VERSION: &str = "1";

// ============================================================================
// Error Types
// ============================================================================

/// Error information for error responses.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorInfo {
    /// Numeric error code.
    pub code: u8,
    /// Human-readable message.
    pub message: String,
    /// Error-specific structured data.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
    /// File the error refers to.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file: Option<String>,
}

impl ErrorInfo {
    /// Create from a SplitError.
    pub fn from_error(err: &SplitError) -> Self {
        let details = match err {
            SplitError::InvalidArguments { details, .. } => details.clone(),
            _ => None,
        };
        ErrorInfo {
            code: OutputErrorCode::from(err).code(),
            message: err.to_string(),
            details,
            file: err.file().map(str::to_string),
        }
    }
}

/// Error response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Status: "error".
    pub status: String,
    /// Schema version for compatibility.
    pub schema_version: String,
    /// Error information.
    pub error: ErrorInfo,
}

impl ErrorResponse {
    /// Create an error response from a SplitError.
    pub fn from_error(err: &SplitError) -> Self {
        ErrorResponse {
            status: "error".to_string(),
            schema_version: SCHEMA_VERSION.to_string(),
            error: ErrorInfo::from_error(err),
        }
    }
}

// ============================================================================
// Command Responses
// ============================================================================

/// One input name and its canonical form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NormalizedName {
    pub input: String,
    pub normalized: String,
}

/// Response for `pysplit normalize`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NormalizeResponse {
    pub status: String,
    pub schema_version: String,
    pub names: Vec<NormalizedName>,
}

impl NormalizeResponse {
    pub fn new(names: Vec<NormalizedName>) -> Self {
        NormalizeResponse {
            status: "ok".to_string(),
            schema_version: SCHEMA_VERSION.to_string(),
            names,
        }
    }
}

/// Response for `pysplit compare`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompareResponse {
    pub status: String,
    pub schema_version: String,
    pub left: String,
    pub right: String,
    /// "unordered" or "strict".
    pub ordering: String,
    pub equivalent: bool,
}

impl CompareResponse {
    pub fn new(
        left: impl Into<String>,
        right: impl Into<String>,
        ordering: impl Into<String>,
        equivalent: bool,
    ) -> Self {
        CompareResponse {
            status: "ok".to_string(),
            schema_version: SCHEMA_VERSION.to_string(),
            left: left.into(),
            right: right.into(),
            ordering: ordering.into(),
            equivalent,
        }
    }
}

/// One declaration-kind bucket of a code index.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexBucket {
    pub kind: String,
    pub names: Vec<String>,
}

/// Response for `pysplit index`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexResponse {
    pub status: String,
    pub schema_version: String,
    pub file: String,
    pub buckets: Vec<IndexBucket>,
}

impl IndexResponse {
    pub fn new(file: impl Into<String>, buckets: Vec<IndexBucket>) -> Self {
        IndexResponse {
            status: "ok".to_string(),
            schema_version: SCHEMA_VERSION.to_string(),
            file: file.into(),
            buckets,
        }
    }
}

/// Response for `pysplit refactor`.
///
/// `modules` holds one outcome per processed module, in processing order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RefactorResponse<M> {
    pub status: String,
    pub schema_version: String,
    pub root: String,
    pub modules: Vec<M>,
}

impl<M> RefactorResponse<M> {
    pub fn new(root: impl Into<String>, modules: Vec<M>) -> Self {
        RefactorResponse {
            status: "ok".to_string(),
            schema_version: SCHEMA_VERSION.to_string(),
            root: root.into(),
            modules,
        }
    }
}

// ============================================================================
// Response Emission
// ============================================================================

/// Emit a response as pretty-printed JSON to a writer.
///
/// This is the single output path for the CLI.
pub fn emit_response<T: Serialize>(response: &T, writer: &mut impl Write) -> io::Result<()> {
    let json = serde_json::to_string_pretty(response)
        .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
    writeln!(writer, "{}", json)
}
