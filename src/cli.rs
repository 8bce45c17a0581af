// Copyright (c) Ken Kocienda and other contributors.
//
// This source code is licensed under the MIT license found in the
// LICENSE file in the root directory of this source tree.

//! CLI front door.
//!
//! Each `run_*` function backs one subcommand and returns the response that
//! `main.rs` prints. All of them return `Result<T, SplitError>` so failures
//! carry a stable error code.

use std::path::{Path, PathBuf};

use tracing::debug;

use pysplit_core::error::SplitError;
use pysplit_core::normalize::normalize;
use pysplit_core::output::{
    CompareResponse, IndexBucket, IndexResponse, NormalizeResponse, NormalizedName,
    RefactorResponse,
};
use pysplit_python::compare::{directories_equivalent, files_equivalent, Ordering};
use pysplit_python::{refactor_module, CodeIndex, RefactorOutcome, SourceDirectory};

use crate::config::{load_file_config, resolve_options, CliOverrides};

/// Directory a path's configuration and dependents are looked up in.
fn base_directory(path: &Path) -> PathBuf {
    if path.is_dir() {
        return path.to_path_buf();
    }
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    }
}

fn require_exists(path: &Path) -> Result<(), SplitError> {
    if path.exists() {
        Ok(())
    } else {
        Err(SplitError::file_not_found(path.display().to_string()))
    }
}

/// Refactor a directory tree, or a single module within its directory.
pub fn run_refactor(
    path: &Path,
    overrides: &CliOverrides,
) -> Result<RefactorResponse<RefactorOutcome>, SplitError> {
    require_exists(path)?;
    let base = base_directory(path);
    let options = resolve_options(&load_file_config(&base)?, overrides);
    debug!(?options, path = %path.display(), "resolved refactor options");

    let outcomes = if path.is_dir() {
        SourceDirectory::new(path).refactor(&options)?
    } else {
        vec![refactor_module(path, &base, &options)?]
    };
    Ok(RefactorResponse::new(path.display().to_string(), outcomes))
}

/// Compare two files or two directory trees.
pub fn run_compare(left: &Path, right: &Path, ordering: Ordering) -> Result<CompareResponse, SplitError> {
    require_exists(left)?;
    require_exists(right)?;
    let equivalent = match (left.is_dir(), right.is_dir()) {
        (true, true) => directories_equivalent(left, right, ordering)?,
        (false, false) => files_equivalent(left, right, ordering)?,
        _ => {
            return Err(SplitError::invalid_args(format!(
                "cannot compare a file with a directory: {} and {}",
                left.display(),
                right.display()
            )))
        }
    };
    Ok(CompareResponse::new(
        left.display().to_string(),
        right.display().to_string(),
        ordering.to_string(),
        equivalent,
    ))
}

/// Canonical module names for each input.
pub fn run_normalize(names: &[String]) -> NormalizeResponse {
    NormalizeResponse::new(
        names
            .iter()
            .map(|name| NormalizedName {
                input: name.clone(),
                normalized: normalize(name),
            })
            .collect(),
    )
}

/// The code index of one file, by declaration kind.
pub fn run_index(path: &Path) -> Result<IndexResponse, SplitError> {
    let index = CodeIndex::load(path)?;
    let buckets = index
        .summary()
        .into_iter()
        .map(|(kind, names)| IndexBucket {
            kind: kind.to_string(),
            names,
        })
        .collect();
    Ok(IndexResponse::new(path.display().to_string(), buckets))
}
