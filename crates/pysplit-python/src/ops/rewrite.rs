// Copyright (c) Ken Kocienda and other contributors.
//
// This source code is licensed under the MIT license found in the
// LICENSE file in the root directory of this source tree.

//! Cross-file import rewriting.
//!
//! Imports are patched with byte-span edits on the module path, so the rest
//! of a dependent file keeps its exact text. A from-import naming several
//! classes of which only one moved is split in two.

use std::fs;
use std::path::Path;

use pysplit_core::patch::{apply_edits, TextEdit};
use tracing::info;

use crate::dependents::{retarget, site_imports_class, site_imports_module, ImportResolver};
use crate::syntax::{import_sites, ImportForm, ImportSite, NameSite};

use super::RefactorError;

/// Point imports of `class_name` from the module at `module` to its sibling
/// module `new_module`.
///
/// Import paths in `path` are resolved with `resolver`; only those naming
/// `module` are touched. Returns whether the file changed.
pub fn rewrite_class_import(
    resolver: &ImportResolver,
    path: &Path,
    class_name: &str,
    module: &Path,
    new_module: &str,
) -> Result<bool, RefactorError> {
    rewrite_file(path, |site| {
        if !site_imports_class(resolver, path, site, class_name, module) {
            return Vec::new();
        }
        match site.form {
            ImportForm::Plain => plain_import_edits(resolver, path, site, module, new_module),
            ImportForm::From => class_from_import_edits(site, class_name, module, new_module),
        }
    })
}

fn plain_import_edits(
    resolver: &ImportResolver,
    path: &Path,
    site: &ImportSite,
    module: &Path,
    new_module: &str,
) -> Vec<TextEdit> {
    site.names
        .iter()
        .filter(|name| resolver.names_module(path, 0, &name.name, module))
        .map(|name| TextEdit::replace(name.span, retarget(&name.name, module, new_module)))
        .collect()
}

fn class_from_import_edits(
    site: &ImportSite,
    class_name: &str,
    module: &Path,
    new_module: &str,
) -> Vec<TextEdit> {
    let old_path = site.module.as_ref().map_or("", |m| m.path.as_str());
    let new_path = retarget(old_path, module, new_module);

    let (moved, kept): (Vec<&NameSite>, Vec<&NameSite>) =
        site.names.iter().partition(|name| name.name == class_name);
    if let (true, Some(module_site)) = (kept.is_empty(), &site.module) {
        return vec![TextEdit::replace(module_site.span, new_path)];
    }

    let dots = ".".repeat(site.level);
    let render = |names: &[&NameSite]| {
        names
            .iter()
            .map(|name| name.render())
            .collect::<Vec<_>>()
            .join(", ")
    };
    let moved_text = format!("from {dots}{new_path} import {}", render(&moved[..]));
    if kept.is_empty() {
        return vec![TextEdit::replace(site.span, moved_text)];
    }
    let separator = if site.starts_line {
        format!("\n{}", site.indent)
    } else {
        "; ".to_string()
    };
    let text = format!(
        "from {dots}{old_path} import {}{separator}{moved_text}",
        render(&kept[..]),
    );
    vec![TextEdit::replace(site.span, text)]
}

/// Point every import of the module at `module` to `new_module`, a module
/// in the same directory.
///
/// Returns whether the file changed.
pub fn rewrite_module_import(
    resolver: &ImportResolver,
    path: &Path,
    module: &Path,
    new_module: &str,
) -> Result<bool, RefactorError> {
    rewrite_file(path, |site| {
        if !site_imports_module(resolver, path, site, module) {
            return Vec::new();
        }
        match site.form {
            ImportForm::Plain => plain_import_edits(resolver, path, site, module, new_module),
            ImportForm::From => site
                .module
                .iter()
                .map(|m| TextEdit::replace(m.span, retarget(&m.path, module, new_module)))
                .collect(),
        }
    })
}

fn rewrite_file(
    path: &Path,
    edits_for: impl Fn(&ImportSite) -> Vec<TextEdit>,
) -> Result<bool, RefactorError> {
    let source = fs::read_to_string(path).map_err(|e| RefactorError::io("read", path, e))?;
    let sites = import_sites(&source).map_err(|e| e.with_path(path))?;
    let edits: Vec<TextEdit> = sites.iter().flat_map(edits_for).collect();
    if edits.is_empty() {
        return Ok(false);
    }

    let updated = apply_edits(&source, &edits).map_err(|e| RefactorError::Rewrite {
        path: path.to_path_buf(),
        source: e,
    })?;
    if updated == source {
        return Ok(false);
    }
    fs::write(path, updated).map_err(|e| RefactorError::io("write", path, e))?;
    info!(path = %path.display(), edits = edits.len(), "rewrote imports");
    Ok(true)
}
