// Copyright (c) Ken Kocienda and other contributors.
//
// This source code is licensed under the MIT license found in the
// LICENSE file in the root directory of this source tree.

//! Python file discovery.

use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;
use walkdir::WalkDir;

use crate::module::SOURCE_EXTENSION;

// ============================================================================
// Error Types
// ============================================================================

/// Error type for file operations.
#[derive(Debug, Error)]
pub enum FileError {
    /// File not found.
    #[error("file not found: {path}")]
    NotFound { path: String },

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}

/// Result type for file operations.
pub type FileResult<T> = Result<T, FileError>;

/// Directory names never descended into.
const EXCLUDED_DIRS: &[&str] = &["__pycache__", "node_modules", "venv", "target"];

fn is_excluded(name: &str) -> bool {
    name.starts_with('.') || EXCLUDED_DIRS.contains(&name)
}

fn is_python_file(path: &Path) -> bool {
    path.extension().is_some_and(|ext| ext == SOURCE_EXTENSION)
}

// ============================================================================
// File Collection
// ============================================================================

/// Collect Python files under `root`, sorted by path.
///
/// Hidden directories, `__pycache__`, `node_modules`, `venv` and `target` are
/// skipped. A `root` that is itself a Python file yields just that file.
pub fn collect_python_files(root: &Path) -> FileResult<Vec<PathBuf>> {
    if !root.exists() {
        return Err(FileError::NotFound {
            path: root.display().to_string(),
        });
    }
    if root.is_file() {
        return Ok(if is_python_file(root) {
            vec![root.to_path_buf()]
        } else {
            Vec::new()
        });
    }

    let mut files = Vec::new();
    let walker = WalkDir::new(root).follow_links(false).into_iter();
    for entry in walker.filter_entry(|entry| {
        entry.depth() == 0
            || !entry.file_type().is_dir()
            || !is_excluded(&entry.file_name().to_string_lossy())
    }) {
        let entry = entry.map_err(|e| FileError::Io(io::Error::other(e.to_string())))?;
        if entry.file_type().is_file() && is_python_file(entry.path()) {
            files.push(entry.into_path());
        }
    }

    files.sort();
    Ok(files)
}

/// Python files under `root` as `/`-separated paths relative to `root`.
pub fn relative_python_files(root: &Path) -> FileResult<Vec<String>> {
    let files = collect_python_files(root)?;
    Ok(files
        .iter()
        .filter_map(|path| path.strip_prefix(root).ok())
        .map(|rel| {
            rel.components()
                .map(|c| c.as_os_str().to_string_lossy().into_owned())
                .collect::<Vec<_>>()
                .join("/")
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::{self, File};
    use std::io::Write;
    use tempfile::TempDir;

    fn create_test_workspace() -> TempDir {
        let dir = TempDir::new().unwrap();

        let src_dir = dir.path().join("src");
        fs::create_dir_all(&src_dir).unwrap();
        File::create(src_dir.join("main.py"))
            .unwrap()
            .write_all(b"def main():\n    pass\n")
            .unwrap();
        File::create(src_dir.join("utils.py"))
            .unwrap()
            .write_all(b"def helper():\n    return 42\n")
            .unwrap();
        File::create(src_dir.join("notes.txt"))
            .unwrap()
            .write_all(b"not python")
            .unwrap();

        let cache_dir = dir.path().join("__pycache__");
        fs::create_dir_all(&cache_dir).unwrap();
        File::create(cache_dir.join("main.py")).unwrap();

        let hidden_dir = dir.path().join(".hidden");
        fs::create_dir_all(&hidden_dir).unwrap();
        File::create(hidden_dir.join("secret.py")).unwrap();

        let venv_dir = dir.path().join("venv").join("lib");
        fs::create_dir_all(&venv_dir).unwrap();
        File::create(venv_dir.join("site.py")).unwrap();

        dir
    }

    #[test]
    fn collect_finds_python_files_only() {
        let workspace = create_test_workspace();
        let files = relative_python_files(workspace.path()).unwrap();
        assert_eq!(files, vec!["src/main.py", "src/utils.py"]);
    }

    #[test]
    fn collect_returns_absolute_sorted_paths() {
        let dir = TempDir::new().unwrap();
        for name in ["z_last.py", "a_first.py", "m_middle.py"] {
            File::create(dir.path().join(name)).unwrap();
        }
        let files = collect_python_files(dir.path()).unwrap();
        let names: Vec<String> = files
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["a_first.py", "m_middle.py", "z_last.py"]);
        assert!(files.iter().all(|p| p.starts_with(dir.path())));
    }

    #[test]
    fn single_file_root() {
        let workspace = create_test_workspace();
        let file = workspace.path().join("src/main.py");
        assert_eq!(collect_python_files(&file).unwrap(), vec![file]);
    }

    #[test]
    fn missing_root_is_not_found() {
        let result = collect_python_files(Path::new("/no/such/dir"));
        assert!(matches!(result, Err(FileError::NotFound { .. })));
    }
}
