// Copyright (c) Ken Kocienda and other contributors.
//
// This source code is licensed under the MIT license found in the
// LICENSE file in the root directory of this source tree.

//! Python refactoring operations.
//!
//! Provides the options and error types shared by the extraction engine,
//! the import rewriter and directory-wide runs.

pub mod directory;
pub mod extract;
pub mod rewrite;

use std::io;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use pysplit_core::patch::EditError;

use crate::files::FileError;
use crate::module::ModuleError;
use crate::syntax::ParseError;

// ============================================================================
// Options
// ============================================================================

/// How synthesized imports refer to sibling modules.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ImportStyle {
    /// `from foo import Foo`
    #[default]
    Absolute,
    /// `from .foo import Foo`
    Relative,
}

impl ImportStyle {
    /// Module path used to import `module` from a sibling file.
    pub fn module_path(&self, module: &str) -> String {
        match self {
            ImportStyle::Absolute => module.to_string(),
            ImportStyle::Relative => format!(".{}", module),
        }
    }
}

/// Options for a refactoring run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RefactorOptions {
    pub import_style: ImportStyle,
    /// Copy functions and assignments an extracted class needs into its new
    /// file. When false they are imported from the origin module instead.
    pub copy_siblings: bool,
    /// Delete a module left with nothing but imports.
    pub delete_empty_modules: bool,
}

impl Default for RefactorOptions {
    fn default() -> Self {
        RefactorOptions {
            import_style: ImportStyle::Absolute,
            copy_siblings: true,
            delete_empty_modules: true,
        }
    }
}

// ============================================================================
// Error Types
// ============================================================================

/// Errors from refactoring operations.
#[derive(Debug, Error)]
pub enum RefactorError {
    /// The subject file or a file being rewritten is not valid Python.
    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error("failed to {action} {}: {source}", .path.display())]
    Io {
        action: &'static str,
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Computed import edits could not be applied.
    #[error("cannot rewrite imports in {}: {source}", .path.display())]
    Rewrite {
        path: PathBuf,
        #[source]
        source: EditError,
    },

    #[error(transparent)]
    Files(#[from] FileError),
}

impl RefactorError {
    pub(crate) fn io(action: &'static str, path: &Path, source: io::Error) -> Self {
        RefactorError::Io {
            action,
            path: path.to_path_buf(),
            source,
        }
    }

    /// The file the error is about, when known.
    pub fn path(&self) -> Option<&Path> {
        match self {
            RefactorError::Parse(err) => err.path(),
            RefactorError::Io { path, .. } | RefactorError::Rewrite { path, .. } => Some(path),
            RefactorError::Files(_) => None,
        }
    }
}

impl From<ModuleError> for RefactorError {
    fn from(err: ModuleError) -> Self {
        match err {
            ModuleError::Parse(err) => RefactorError::Parse(err),
            ModuleError::Io {
                action,
                path,
                source,
            } => RefactorError::Io {
                action,
                path,
                source,
            },
        }
    }
}
