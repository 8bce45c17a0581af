// Copyright (c) Ken Kocienda and other contributors.
//
// This source code is licensed under the MIT license found in the
// LICENSE file in the root directory of this source tree.

//! Refactoring configuration.
//!
//! Options are resolved in this order (first wins):
//!
//! 1. Command-line flags
//! 2. `pyproject.toml` `[tool.pysplit]` in the target directory
//! 3. Built-in defaults
//!
//! ```toml
//! [tool.pysplit]
//! import-style = "relative"
//! copy-siblings = true
//! delete-empty-modules = false
//! ```

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;

use pysplit_core::error::SplitError;
use pysplit_python::{ImportStyle, RefactorOptions};

/// Name of the project file holding the `[tool.pysplit]` table.
pub const PYPROJECT: &str = "pyproject.toml";

/// Errors from reading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("invalid [tool.pysplit] in {}: {source}", .path.display())]
    Invalid {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}

impl From<ConfigError> for SplitError {
    fn from(err: ConfigError) -> Self {
        let path = match &err {
            ConfigError::Io { path, .. } | ConfigError::Invalid { path, .. } => {
                path.display().to_string()
            }
        };
        SplitError::invalid_args_with_details(
            err.to_string(),
            serde_json::json!({ "config": path }),
        )
    }
}

/// The `[tool.pysplit]` table. Every key is optional.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct FileConfig {
    pub import_style: Option<ImportStyle>,
    pub copy_siblings: Option<bool>,
    pub delete_empty_modules: Option<bool>,
}

#[derive(Debug, Default, Deserialize)]
struct Pyproject {
    #[serde(default)]
    tool: Tool,
}

#[derive(Debug, Default, Deserialize)]
struct Tool {
    #[serde(default)]
    pysplit: Option<FileConfig>,
}

/// Options given on the command line.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CliOverrides {
    pub import_style: Option<ImportStyle>,
    pub copy_siblings: Option<bool>,
    pub delete_empty_modules: Option<bool>,
}

/// Parse the `[tool.pysplit]` table out of pyproject text.
pub fn parse_pyproject(content: &str) -> Result<Option<FileConfig>, toml::de::Error> {
    let pyproject: Pyproject = toml::from_str(content)?;
    Ok(pyproject.tool.pysplit)
}

/// Read `[tool.pysplit]` from `directory/pyproject.toml`.
///
/// A missing file or a file without the table yields the empty config.
pub fn load_file_config(directory: &Path) -> Result<FileConfig, ConfigError> {
    let path = directory.join(PYPROJECT);
    if !path.is_file() {
        return Ok(FileConfig::default());
    }
    let content = fs::read_to_string(&path).map_err(|source| ConfigError::Io {
        path: path.clone(),
        source,
    })?;
    let config = parse_pyproject(&content).map_err(|source| ConfigError::Invalid {
        path: path.clone(),
        source,
    })?;
    Ok(config.unwrap_or_default())
}

/// Merge command-line flags over file settings over defaults.
pub fn resolve_options(file: &FileConfig, cli: &CliOverrides) -> RefactorOptions {
    let defaults = RefactorOptions::default();
    RefactorOptions {
        import_style: cli
            .import_style
            .or(file.import_style)
            .unwrap_or(defaults.import_style),
        copy_siblings: cli
            .copy_siblings
            .or(file.copy_siblings)
            .unwrap_or(defaults.copy_siblings),
        delete_empty_modules: cli
            .delete_empty_modules
            .or(file.delete_empty_modules)
            .unwrap_or(defaults.delete_empty_modules),
    }
}
