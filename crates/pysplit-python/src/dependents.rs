// Copyright (c) Ken Kocienda and other contributors.
//
// This source code is licensed under the MIT license found in the
// LICENSE file in the root directory of this source tree.

//! Dependent discovery: which files import a module or a class from it.
//!
//! An import site counts only when its dotted path resolves to the module's
//! file. Relative paths resolve from the importing file's package. Absolute
//! paths resolve from the importing file's directory, the search root and
//! the search root's ancestors. Two packages that both hold a `models.py`
//! are therefore never confused. The same predicates drive the rewriter, so
//! a file is reported as a dependent exactly when the rewriter would change
//! it.

use std::fs;
use std::path::{Component, Path, PathBuf};

use tracing::{debug, warn};

use crate::files::{collect_python_files, FileResult};
use crate::module::{module_path, PACKAGE_INIT};
use crate::syntax::{import_sites, ImportForm, ImportSite};

/// Lexically normalized form of `path`: `.` dropped, `..` folded.
fn lexical(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                if !out.pop() {
                    out.push("..");
                }
            }
            other => out.push(other),
        }
    }
    out
}

fn is_package_init(path: &Path) -> bool {
    path.file_stem().is_some_and(|stem| stem == PACKAGE_INIT)
}

/// Maps import statements of a file onto module files.
#[derive(Debug, Clone)]
pub struct ImportResolver {
    /// Directories absolute imports are looked up in, nearest first.
    roots: Vec<PathBuf>,
}

impl ImportResolver {
    pub fn new(search_root: &Path) -> Self {
        ImportResolver {
            roots: search_root.ancestors().map(Path::to_path_buf).collect(),
        }
    }

    /// Directories the dotted path of an import in `importer` is relative to.
    fn bases(&self, importer: &Path, level: usize) -> Vec<PathBuf> {
        let directory = importer.parent().unwrap_or_else(|| Path::new(""));
        if level == 0 {
            let mut bases = vec![directory.to_path_buf()];
            bases.extend(self.roots.iter().cloned());
            return bases;
        }
        let mut base = directory.to_path_buf();
        for _ in 1..level {
            base.push("..");
        }
        vec![base]
    }

    /// True when `dotted` (with `level` leading dots) imported from `importer`
    /// names the module stored at `module`.
    pub fn names_module(&self, importer: &Path, level: usize, dotted: &str, module: &Path) -> bool {
        let wanted = lexical(module);
        let segments: Vec<&str> = dotted.split('.').filter(|s| !s.is_empty()).collect();
        self.bases(importer, level).iter().any(|base| {
            let mut package = base.clone();
            package.extend(&segments);
            if is_package_init(&wanted) {
                lexical(&package.join(wanted.file_name().unwrap_or_default())) == wanted
            } else {
                match segments.split_last() {
                    Some((last, _)) => {
                        let parent = package.parent().unwrap_or_else(|| Path::new(""));
                        lexical(&module_path(parent, last)) == wanted
                    }
                    None => false,
                }
            }
        })
    }

    fn from_module_is(&self, importer: &Path, site: &ImportSite, module: &Path) -> bool {
        let dotted = site.module.as_ref().map_or("", |m| m.path.as_str());
        (site.level > 0 || !dotted.is_empty()) && self.names_module(importer, site.level, dotted, module)
    }
}

/// Dotted path `dotted`, which names `module`, pointed at the sibling module
/// `new_module` instead.
///
/// For a regular module the last segment is replaced. A package `__init__`
/// is named by its package path, so the new module is appended.
pub fn retarget(dotted: &str, module: &Path, new_module: &str) -> String {
    if is_package_init(module) {
        return if dotted.is_empty() {
            new_module.to_string()
        } else {
            format!("{}.{}", dotted, new_module)
        };
    }
    match dotted.rsplit_once('.') {
        Some((package, _)) => format!("{}.{}", package, new_module),
        None => new_module.to_string(),
    }
}

/// True when `site` in `importer` imports `class_name` from `module`.
///
/// A from-import must name the class. A plain import matches when it
/// imports the module itself.
pub fn site_imports_class(
    resolver: &ImportResolver,
    importer: &Path,
    site: &ImportSite,
    class_name: &str,
    module: &Path,
) -> bool {
    match site.form {
        ImportForm::Plain => site_imports_module(resolver, importer, site, module),
        ImportForm::From => {
            site.names.iter().any(|name| name.name == class_name)
                && resolver.from_module_is(importer, site, module)
        }
    }
}

/// True when `site` in `importer` imports `module`, or imports from it.
pub fn site_imports_module(
    resolver: &ImportResolver,
    importer: &Path,
    site: &ImportSite,
    module: &Path,
) -> bool {
    match site.form {
        ImportForm::Plain => site
            .names
            .iter()
            .any(|name| resolver.names_module(importer, 0, &name.name, module)),
        ImportForm::From => resolver.from_module_is(importer, site, module),
    }
}

fn scan(
    root: &Path,
    exclude: &[&Path],
    matches: impl Fn(&Path, &ImportSite) -> bool,
) -> FileResult<Vec<PathBuf>> {
    let excluded: Vec<PathBuf> = exclude.iter().map(|path| lexical(path)).collect();
    let mut dependents = Vec::new();
    for path in collect_python_files(root)? {
        if excluded.contains(&lexical(&path)) {
            continue;
        }
        let source = match fs::read_to_string(&path) {
            Ok(source) => source,
            Err(err) => {
                warn!(path = %path.display(), error = %err, "skipping unreadable file");
                continue;
            }
        };
        let sites = match import_sites(&source) {
            Ok(sites) => sites,
            Err(err) => {
                warn!(path = %path.display(), error = %err, "skipping file that failed to parse");
                continue;
            }
        };
        if sites.iter().any(|site| matches(&path, site)) {
            dependents.push(path);
        }
    }
    Ok(dependents)
}

/// Files under `root` importing the module stored at `module`, excluding `exclude`.
pub fn find_module_dependents(
    root: &Path,
    module: &Path,
    exclude: &[&Path],
) -> FileResult<Vec<PathBuf>> {
    let resolver = ImportResolver::new(root);
    let found = scan(root, exclude, |importer, site| {
        site_imports_module(&resolver, importer, site, module)
    })?;
    debug!(module = %module.display(), count = found.len(), "found module dependents");
    Ok(found)
}

/// Files under `root` importing `class_name` from the module at `module`.
pub fn find_class_dependents(
    root: &Path,
    class_name: &str,
    module: &Path,
    exclude: &[&Path],
) -> FileResult<Vec<PathBuf>> {
    let resolver = ImportResolver::new(root);
    let found = scan(root, exclude, |importer, site| {
        site_imports_class(&resolver, importer, site, class_name, module)
    })?;
    debug!(
        class = class_name,
        module = %module.display(),
        count = found.len(),
        "found class dependents"
    );
    Ok(found)
}
