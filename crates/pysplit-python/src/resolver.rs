// Copyright (c) Ken Kocienda and other contributors.
//
// This source code is licensed under the MIT license found in the
// LICENSE file in the root directory of this source tree.

//! Name-based dependency resolution.
//!
//! Resolution is syntactic. A group of statements references the set of
//! identifiers appearing anywhere inside it. An import is required when one
//! of the names it binds is referenced; a sibling declaration is required
//! when the name it defines is referenced. A top-level block such as
//! `try:` or `if TYPE_CHECKING:` defines every name bound in its sections and
//! is selected as a whole. Pulling in a sibling adds its own references, so
//! the closure is iterated to a fixed point.
//!
//! Every function here is pure and preserves the candidates' order.

use std::collections::{BTreeSet, HashSet};

use tracing::debug;

use crate::index::CodeIndex;
use crate::syntax::{DeclKind, NodeId, Stmt};

/// Everything a set of root declarations needs from its module.
#[derive(Debug, Clone, Default)]
pub struct DependencyClosure {
    pub imports: Vec<Stmt>,
    pub functions: Vec<Stmt>,
    /// Plain and annotated assignments.
    pub assignments: Vec<Stmt>,
    pub expressions: Vec<Stmt>,
    /// Top-level blocks binding a referenced name, e.g. a guarded import.
    pub blocks: Vec<Stmt>,
    /// Other classes of the module referenced by the closure.
    pub classes: Vec<Stmt>,
}

impl DependencyClosure {
    /// Required functions, assignments, expressions and blocks in module
    /// order.
    pub fn siblings(&self) -> Vec<&Stmt> {
        let mut siblings: Vec<&Stmt> = self
            .functions
            .iter()
            .chain(&self.assignments)
            .chain(&self.expressions)
            .chain(&self.blocks)
            .collect();
        siblings.sort_by_key(|stmt| stmt.order);
        siblings
    }
}

/// Every identifier referenced inside `group`.
pub fn referenced_names<'a>(group: impl IntoIterator<Item = &'a Stmt>) -> BTreeSet<String> {
    group
        .into_iter()
        .flat_map(|stmt| stmt.references.iter().cloned())
        .collect()
}

fn import_is_required(import: &Stmt, names: &BTreeSet<String>) -> bool {
    match &import.import {
        Some(binding) if binding.is_always_kept() => true,
        Some(binding) => binding.bound_names().iter().any(|name| names.contains(name)),
        None => false,
    }
}

/// Imports among `candidates` that `group` needs.
pub fn required_imports(group: &[&Stmt], candidates: &[&Stmt]) -> Vec<Stmt> {
    let names = referenced_names(group.iter().copied());
    select_imports(&names, candidates)
}

fn select_imports(names: &BTreeSet<String>, candidates: &[&Stmt]) -> Vec<Stmt> {
    candidates
        .iter()
        .filter(|stmt| import_is_required(stmt, names))
        .map(|stmt| (*stmt).clone())
        .collect()
}

/// Declarations among `candidates` whose defined name `group` references.
///
/// One step only; see [`resolve_closure`] for the fixed point.
pub fn required_siblings(group: &[&Stmt], candidates: &[&Stmt]) -> Vec<Stmt> {
    let names = referenced_names(group.iter().copied());
    candidates
        .iter()
        .filter(|stmt| stmt.defined.iter().any(|name| names.contains(name)))
        .map(|stmt| (*stmt).clone())
        .collect()
}

fn is_sibling_kind(kind: DeclKind) -> bool {
    matches!(
        kind,
        DeclKind::Function | DeclKind::Assign | DeclKind::AnnAssign
    ) || kind.binds_through_sections()
}

/// Resolve imports and siblings needed by `roots` within `index`.
///
/// Expression statements are pulled in when their subject (the root name of
/// `x.configure(...)`) is defined by a selected assignment.
pub fn resolve_closure(roots: &[&Stmt], index: &CodeIndex) -> DependencyClosure {
    let root_ids: HashSet<NodeId> = roots.iter().map(|root| root.id).collect();
    let statements = index.statements();
    let mut names = referenced_names(roots.iter().copied());
    let mut selected: HashSet<NodeId> = HashSet::new();

    loop {
        let mut changed = false;

        for stmt in &statements {
            if root_ids.contains(&stmt.id) || selected.contains(&stmt.id) {
                continue;
            }
            if is_sibling_kind(stmt.kind)
                && stmt.defined.iter().any(|name| names.contains(name))
            {
                selected.insert(stmt.id);
                names.extend(stmt.references.iter().cloned());
                changed = true;
            }
        }

        let assigned: BTreeSet<&str> = statements
            .iter()
            .filter(|stmt| selected.contains(&stmt.id))
            .filter(|stmt| matches!(stmt.kind, DeclKind::Assign | DeclKind::AnnAssign))
            .flat_map(|stmt| stmt.defined.iter().map(String::as_str))
            .collect();
        let mut expressions = Vec::new();
        for stmt in &statements {
            if stmt.kind != DeclKind::Expr || selected.contains(&stmt.id) {
                continue;
            }
            if stmt
                .subject
                .as_deref()
                .is_some_and(|subject| assigned.contains(subject))
            {
                expressions.push(*stmt);
            }
        }
        for stmt in expressions {
            selected.insert(stmt.id);
            names.extend(stmt.references.iter().cloned());
            changed = true;
        }

        if !changed {
            break;
        }
    }

    let pick = |wanted: fn(DeclKind) -> bool| -> Vec<Stmt> {
        statements
            .iter()
            .filter(|stmt| selected.contains(&stmt.id) && wanted(stmt.kind))
            .map(|stmt| (*stmt).clone())
            .collect()
    };

    let closure = DependencyClosure {
        imports: select_imports(&names, &index.imports()),
        functions: pick(|kind| kind == DeclKind::Function),
        assignments: pick(|kind| matches!(kind, DeclKind::Assign | DeclKind::AnnAssign)),
        expressions: pick(|kind| kind == DeclKind::Expr),
        blocks: pick(|kind| kind.binds_through_sections()),
        classes: index
            .classes()
            .iter()
            .filter(|class| !root_ids.contains(&class.id) && names.contains(&class.name))
            .cloned()
            .collect(),
    };

    debug!(
        roots = ?roots.iter().map(|r| r.name.as_str()).collect::<Vec<_>>(),
        imports = ?closure.imports.iter().map(|s| s.name.as_str()).collect::<Vec<_>>(),
        siblings = ?closure.siblings().iter().map(|s| s.name.as_str()).collect::<Vec<_>>(),
        classes = ?closure.classes.iter().map(|s| s.name.as_str()).collect::<Vec<_>>(),
        "resolved dependency closure"
    );
    closure
}

/// Imports still referenced by the module's non-import declarations.
pub fn required_module_imports(index: &CodeIndex) -> Vec<Stmt> {
    let names = referenced_names(index.non_imports());
    let required = select_imports(&names, &index.imports());
    debug!(
        kept = ?required.iter().map(|s| s.name.as_str()).collect::<Vec<_>>(),
        "reconciled module imports"
    );
    required
}
