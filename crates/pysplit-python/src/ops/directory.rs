// Copyright (c) Ken Kocienda and other contributors.
//
// This source code is licensed under the MIT license found in the
// LICENSE file in the root directory of this source tree.

//! Directory-wide refactoring.

use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::files::{collect_python_files, FileResult};

use super::extract::{refactor_module, ModuleStatus, RefactorOutcome};
use super::{RefactorError, RefactorOptions};

/// A tree of Python files refactored as a unit.
///
/// Every module is processed in path order with the tree root as the
/// search root for dependents, so imports anywhere in the tree follow the
/// classes and modules that move.
#[derive(Debug, Clone)]
pub struct SourceDirectory {
    root: PathBuf,
}

impl SourceDirectory {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        SourceDirectory { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Python files currently in the tree.
    pub fn files(&self) -> FileResult<Vec<PathBuf>> {
        collect_python_files(&self.root)
    }

    /// Refactor every module of the tree.
    ///
    /// The file list is taken once up front. Files created along the way
    /// are already in their final shape; files removed along the way (by a
    /// rename or because they were emptied) are skipped.
    pub fn refactor(&self, options: &RefactorOptions) -> Result<Vec<RefactorOutcome>, RefactorError> {
        let files = self.files()?;
        info!(root = %self.root.display(), files = files.len(), "refactoring directory");

        let mut outcomes = Vec::new();
        for path in files {
            if !path.is_file() {
                debug!(path = %path.display(), "file no longer exists, skipping");
                continue;
            }
            let outcome = refactor_module(&path, &self.root, options)?;
            if outcome.status != ModuleStatus::Unchanged {
                info!(path = %path.display(), status = ?outcome.status, "refactored module");
            }
            outcomes.push(outcome);
        }
        Ok(outcomes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn refactors_every_module() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("a.py"), "class Alpha:\n    pass\n").unwrap();
        fs::write(dir.path().join("beta.py"), "class Beta:\n    pass\n").unwrap();

        let outcomes = SourceDirectory::new(dir.path())
            .refactor(&RefactorOptions::default())
            .unwrap();

        let statuses: Vec<ModuleStatus> = outcomes.iter().map(|o| o.status).collect();
        assert_eq!(statuses, vec![ModuleStatus::Deleted, ModuleStatus::Unchanged]);
        assert!(dir.path().join("alpha.py").is_file());
        assert!(!dir.path().join("a.py").exists());
    }

    #[test]
    fn missing_root_is_an_error() {
        let result = SourceDirectory::new("/no/such/tree").refactor(&RefactorOptions::default());
        assert!(matches!(result, Err(RefactorError::Files(_))));
    }
}
