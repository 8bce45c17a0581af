// Copyright (c) Ken Kocienda and other contributors.
//
// This source code is licensed under the MIT license found in the
// LICENSE file in the root directory of this source tree.

//! Code index: one file's declarations grouped by kind.
//!
//! Building an index walks the entire statement tree and buckets every
//! statement under its [`DeclKind`]. Two passes then restore the invariants:
//!
//! - de-duplication by [`NodeId`], so no node appears twice;
//! - containment elision, which drops every node nested in a section of
//!   another indexed composite (per [`DeclKind::sections`]).
//!
//! Empty buckets are never kept. The index is mutated only through
//! whole-collection operations ([`CodeIndex::replace_bucket`],
//! [`CodeIndex::prepend`], [`CodeIndex::remove_subtree`],
//! [`CodeIndex::retain_imports`], [`CodeIndex::merge`]).

use std::collections::{BTreeMap, HashSet};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::warn;

use crate::render::render_module;
use crate::syntax::{parse_module, DeclKind, NodeId, ParseError, Stmt};

/// Failure to build an index from a file.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error(transparent)]
    Parse(#[from] ParseError),
}

/// Declarations of one file, bucketed by kind.
#[derive(Debug, Clone, Default)]
pub struct CodeIndex {
    buckets: BTreeMap<DeclKind, Vec<Stmt>>,
}

impl CodeIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse and index module source.
    pub fn from_source(text: &str) -> Result<Self, ParseError> {
        Ok(Self::from_statements(parse_module(text)?))
    }

    /// Read, parse and index a file.
    pub fn load(path: &Path) -> Result<Self, LoadError> {
        let text = fs::read_to_string(path).map_err(|source| LoadError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_source(&text).map_err(|e| LoadError::Parse(e.with_path(path)))
    }

    /// Index a statement tree.
    pub fn from_statements(stmts: Vec<Stmt>) -> Self {
        let mut seen = HashSet::new();
        let mut walked: Vec<&Stmt> = Vec::new();
        for stmt in &stmts {
            for node in std::iter::once(stmt).chain(stmt.descendants()) {
                if seen.insert(node.id) {
                    walked.push(node);
                }
            }
        }

        let nested: HashSet<NodeId> = walked
            .iter()
            .filter(|node| !node.kind.sections().is_empty())
            .flat_map(|node| node.descendants().into_iter().map(|child| child.id))
            .collect();

        let mut buckets: BTreeMap<DeclKind, Vec<Stmt>> = BTreeMap::new();
        for node in walked.into_iter().filter(|node| !nested.contains(&node.id)) {
            buckets.entry(node.kind).or_default().push(node.clone());
        }
        CodeIndex { buckets }
    }

    pub fn is_empty(&self) -> bool {
        self.buckets.is_empty()
    }

    /// Number of indexed statements.
    pub fn len(&self) -> usize {
        self.buckets.values().map(Vec::len).sum()
    }

    /// True if every indexed statement is an import (or there are none).
    pub fn is_import_only(&self) -> bool {
        self.buckets.keys().all(DeclKind::is_import)
    }

    /// Kinds with at least one statement, in bucket order.
    pub fn kinds(&self) -> impl Iterator<Item = DeclKind> + '_ {
        self.buckets.keys().copied()
    }

    pub fn bucket(&self, kind: DeclKind) -> &[Stmt] {
        self.buckets.get(&kind).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn classes(&self) -> &[Stmt] {
        self.bucket(DeclKind::Class)
    }

    pub fn find_class(&self, name: &str) -> Option<&Stmt> {
        self.classes().iter().find(|class| class.name == name)
    }

    /// Import statements of both forms, in module order.
    pub fn imports(&self) -> Vec<&Stmt> {
        self.sorted(|stmt| stmt.is_import())
    }

    /// Every non-import statement, in module order.
    pub fn non_imports(&self) -> Vec<&Stmt> {
        self.sorted(|stmt| !stmt.is_import())
    }

    /// Every statement, in module order.
    pub fn statements(&self) -> Vec<&Stmt> {
        self.sorted(|_| true)
    }

    fn sorted(&self, keep: impl Fn(&Stmt) -> bool) -> Vec<&Stmt> {
        let mut stmts: Vec<&Stmt> = self
            .buckets
            .values()
            .flatten()
            .filter(|stmt| keep(*stmt))
            .collect();
        stmts.sort_by_key(|stmt| stmt.order);
        stmts
    }

    fn min_order(&self) -> i64 {
        self.buckets.values().flatten().map(|s| s.order).min().unwrap_or(0)
    }

    fn max_order(&self) -> i64 {
        self.buckets.values().flatten().map(|s| s.order).max().unwrap_or(0)
    }

    /// Replace one bucket wholesale. An empty list removes the bucket.
    pub fn replace_bucket(&mut self, kind: DeclKind, stmts: Vec<Stmt>) {
        if stmts.is_empty() {
            self.buckets.remove(&kind);
        } else {
            self.buckets.insert(kind, stmts);
        }
    }

    /// Insert a statement before everything else in the module.
    pub fn prepend(&mut self, stmt: Stmt) {
        let kind = stmt.kind;
        let stmt = stmt.with_order(self.min_order() - 1);
        let mut bucket = self.buckets.remove(&kind).unwrap_or_default();
        bucket.insert(0, stmt);
        self.replace_bucket(kind, bucket);
    }

    /// Insert a statement after everything else in the module.
    pub fn append(&mut self, stmt: Stmt) {
        let stmt = stmt.with_order(self.max_order() + 1);
        self.buckets.entry(stmt.kind).or_default().push(stmt);
    }

    /// Remove the statement `id` together with any indexed node nested in it.
    pub fn remove_subtree(&mut self, id: NodeId) -> Option<Stmt> {
        let removed = self
            .buckets
            .values()
            .flatten()
            .find(|stmt| stmt.id == id)
            .cloned()?;

        let kinds: Vec<DeclKind> = self.buckets.keys().copied().collect();
        for kind in kinds {
            let bucket = self.buckets.remove(&kind).unwrap_or_default();
            let kept: Vec<Stmt> = bucket
                .into_iter()
                .filter(|stmt| !removed.contains(stmt.id))
                .collect();
            self.replace_bucket(kind, kept);
        }
        Some(removed)
    }

    /// Keep only the imports for which `keep` returns true.
    pub fn retain_imports(&mut self, keep: impl Fn(&Stmt) -> bool) {
        for kind in [DeclKind::Import, DeclKind::ImportFrom] {
            let bucket = self.buckets.remove(&kind).unwrap_or_default();
            let kept: Vec<Stmt> = bucket.into_iter().filter(|stmt| keep(stmt)).collect();
            self.replace_bucket(kind, kept);
        }
    }

    /// Merge another module's declarations into this one.
    ///
    /// A class already defined here under the same name is replaced in
    /// place. Other statements already present with the same fingerprint
    /// are skipped. New imports go before existing code, everything else
    /// after it, keeping `other`'s relative order.
    pub fn merge(&mut self, other: CodeIndex) {
        let incoming = other.statements().into_iter().cloned().collect::<Vec<_>>();
        let (imports, rest): (Vec<Stmt>, Vec<Stmt>) =
            incoming.into_iter().partition(|stmt| stmt.is_import());

        let new_imports: Vec<Stmt> = imports
            .into_iter()
            .filter(|stmt| !self.contains_fingerprint(stmt))
            .collect();
        for stmt in new_imports.into_iter().rev() {
            self.prepend(stmt);
        }

        for stmt in rest {
            if stmt.kind == DeclKind::Class {
                if let Some(position) = self
                    .classes()
                    .iter()
                    .position(|existing| existing.name == stmt.name)
                {
                    warn!(class = %stmt.name, "replacing existing class definition in target module");
                    let mut classes = self.buckets.remove(&DeclKind::Class).unwrap_or_default();
                    let order = classes[position].order;
                    classes[position] = stmt.with_order(order);
                    self.replace_bucket(DeclKind::Class, classes);
                    continue;
                }
            }
            if !self.contains_fingerprint(&stmt) {
                self.append(stmt);
            }
        }
    }

    fn contains_fingerprint(&self, stmt: &Stmt) -> bool {
        self.bucket(stmt.kind)
            .iter()
            .any(|existing| existing.fingerprint == stmt.fingerprint)
    }

    /// Module text of this index.
    pub fn render(&self) -> String {
        render_module(self.statements())
    }

    /// Display names per bucket, for reporting.
    pub fn summary(&self) -> Vec<(DeclKind, Vec<String>)> {
        self.buckets
            .iter()
            .map(|(kind, stmts)| (*kind, stmts.iter().map(|s| s.name.clone()).collect()))
            .collect()
    }
}
