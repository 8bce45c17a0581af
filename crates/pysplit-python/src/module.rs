// Copyright (c) Ken Kocienda and other contributors.
//
// This source code is licensed under the MIT license found in the
// LICENSE file in the root directory of this source tree.

//! A Python source file and its lazily loaded code index.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::info;

use crate::index::{CodeIndex, LoadError};
use crate::syntax::ParseError;

/// Extension of Python source files.
pub const SOURCE_EXTENSION: &str = "py";

/// Module name of a package's own file.
pub const PACKAGE_INIT: &str = "__init__";

/// Errors raised by [`SourceModule`] file operations.
#[derive(Debug, Error)]
pub enum ModuleError {
    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error("failed to {action} {}: {source}", .path.display())]
    Io {
        action: &'static str,
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl ModuleError {
    fn io(action: &'static str, path: &Path, source: io::Error) -> Self {
        ModuleError::Io {
            action,
            path: path.to_path_buf(),
            source,
        }
    }
}

/// A source file path plus its exclusively owned code index.
///
/// The index is read on first access. A path that does not exist yet loads
/// as an empty index, so a module can be built up in memory and saved.
#[derive(Debug)]
pub struct SourceModule {
    path: PathBuf,
    index: Option<CodeIndex>,
    dirty: bool,
}

impl SourceModule {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        SourceModule {
            path: path.into(),
            index: None,
            dirty: false,
        }
    }

    /// A module whose index is already known. It is written on the next save.
    pub fn with_index(path: impl Into<PathBuf>, index: CodeIndex) -> Self {
        SourceModule {
            path: path.into(),
            index: Some(index),
            dirty: true,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Directory holding the file.
    pub fn directory(&self) -> &Path {
        self.path.parent().unwrap_or_else(|| Path::new(""))
    }

    pub fn file_name(&self) -> String {
        self.path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default()
    }

    /// File name without the `.py` extension.
    pub fn module_name(&self) -> String {
        self.path
            .file_stem()
            .map(|stem| stem.to_string_lossy().into_owned())
            .unwrap_or_default()
    }

    pub fn exists(&self) -> bool {
        self.path.is_file()
    }

    pub fn is_package_init(&self) -> bool {
        self.module_name() == PACKAGE_INIT
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    fn ensure_loaded(&mut self) -> Result<(), ModuleError> {
        if self.index.is_none() {
            let index = if self.exists() {
                CodeIndex::load(&self.path).map_err(|err| match err {
                    LoadError::Io { path, source } => ModuleError::Io {
                        action: "read",
                        path,
                        source,
                    },
                    LoadError::Parse(parse) => ModuleError::Parse(parse),
                })?
            } else {
                CodeIndex::new()
            };
            self.index = Some(index);
        }
        Ok(())
    }

    /// The code index, loading it on first use.
    pub fn index(&mut self) -> Result<&CodeIndex, ModuleError> {
        self.ensure_loaded()?;
        Ok(self.index.get_or_insert_with(CodeIndex::new))
    }

    /// Mutable access to the code index. Marks the module dirty.
    pub fn index_mut(&mut self) -> Result<&mut CodeIndex, ModuleError> {
        self.ensure_loaded()?;
        self.dirty = true;
        Ok(self.index.get_or_insert_with(CodeIndex::new))
    }

    /// True when nothing but imports would be left in the file.
    pub fn should_be_deleted(&mut self) -> Result<bool, ModuleError> {
        let index = self.index()?;
        Ok(index.is_empty() || index.is_import_only())
    }

    /// Render the module text from its index.
    pub fn render(&mut self) -> Result<String, ModuleError> {
        Ok(self.index()?.render())
    }

    /// Write the module if it changed or does not exist yet.
    ///
    /// Returns whether the file was written.
    pub fn save(&mut self) -> Result<bool, ModuleError> {
        if !self.dirty && self.exists() {
            return Ok(false);
        }
        let text = self.render()?;
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)
                    .map_err(|e| ModuleError::io("create directory for", &self.path, e))?;
            }
        }
        fs::write(&self.path, text).map_err(|e| ModuleError::io("write", &self.path, e))?;
        self.dirty = false;
        info!(path = %self.path.display(), "wrote module");
        Ok(true)
    }

    /// Remove the file from disk. The in-memory index is kept.
    pub fn delete(&mut self) -> Result<(), ModuleError> {
        if self.exists() {
            fs::remove_file(&self.path).map_err(|e| ModuleError::io("delete", &self.path, e))?;
            info!(path = %self.path.display(), "deleted module");
        }
        self.dirty = true;
        Ok(())
    }

    /// Point the module at a new path, keeping its index.
    pub fn move_to(&mut self, path: impl Into<PathBuf>) -> Result<(), ModuleError> {
        self.ensure_loaded()?;
        self.path = path.into();
        self.dirty = true;
        Ok(())
    }
}

/// Path of module `name` inside `directory`.
pub fn module_path(directory: &Path, name: &str) -> PathBuf {
    directory.join(format!("{}.{}", name, SOURCE_EXTENSION))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn names_are_derived_from_the_path() {
        let module = SourceModule::new("pkg/MyModels.py");
        assert_eq!(module.file_name(), "MyModels.py");
        assert_eq!(module.module_name(), "MyModels");
        assert_eq!(module.directory(), Path::new("pkg"));
        assert!(!module.is_package_init());
        assert!(SourceModule::new("pkg/__init__.py").is_package_init());
    }

    #[test]
    fn missing_file_loads_empty() {
        let temp = TempDir::new().unwrap();
        let mut module = SourceModule::new(temp.path().join("absent.py"));
        assert!(!module.exists());
        assert!(module.index().unwrap().is_empty());
        assert!(module.should_be_deleted().unwrap());
    }

    #[test]
    fn clean_module_is_not_rewritten() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("a.py");
        fs::write(&path, "x   =   1\n").unwrap();
        let mut module = SourceModule::new(&path);
        module.index().unwrap();
        assert!(!module.save().unwrap());
        assert_eq!(fs::read_to_string(&path).unwrap(), "x   =   1\n");
    }

    #[test]
    fn dirty_module_is_rendered_and_written() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("a.py");
        fs::write(&path, "import os\nx = 1\n").unwrap();
        let mut module = SourceModule::new(&path);
        module.index_mut().unwrap().retain_imports(|_| false);
        assert!(module.save().unwrap());
        assert_eq!(fs::read_to_string(&path).unwrap(), "x = 1\n");
        assert!(!module.is_dirty());
    }

    #[test]
    fn move_and_delete() {
        let temp = TempDir::new().unwrap();
        let old = temp.path().join("Old.py");
        fs::write(&old, "class A:\n    pass\n").unwrap();
        let mut module = SourceModule::new(&old);
        module.index().unwrap();
        module.delete().unwrap();
        assert!(!old.exists());

        let new = module_path(temp.path(), "old");
        module.move_to(&new).unwrap();
        module.save().unwrap();
        assert_eq!(fs::read_to_string(&new).unwrap(), "class A:\n    pass\n");
    }

    #[test]
    fn parse_errors_carry_the_path() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("bad.py");
        fs::write(&path, "def (:\n").unwrap();
        let mut module = SourceModule::new(&path);
        match module.index() {
            Err(ModuleError::Parse(err)) => assert_eq!(err.path(), Some(path.as_path())),
            other => panic!("expected parse error, got {:?}", other.map(|_| ())),
        }
    }

    #[test]
    fn import_only_module_should_be_deleted() {
        let mut module = SourceModule::with_index(
            "x.py",
            CodeIndex::from_source("from foo import Foo\n").unwrap(),
        );
        assert!(module.should_be_deleted().unwrap());
    }
}
