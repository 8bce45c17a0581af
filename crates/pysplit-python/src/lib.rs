// Copyright (c) Ken Kocienda and other contributors.
//
// This source code is licensed under the MIT license found in the
// LICENSE file in the root directory of this source tree.

//! Python support for pysplit.
//!
//! This crate splits Python modules into one module per class.
//! It includes:
//! - A tree-sitter syntax bridge producing owned statement nodes
//! - Per-file code indexes and a name-based dependency resolver
//! - The class extraction engine and the cross-file import rewriter
//! - A structural comparator for code, files and directory trees

pub mod compare;
pub mod dependents;
mod error_bridges;
pub mod files;
pub mod index;
pub mod module;
pub mod ops;
pub mod render;
pub mod resolver;
pub mod syntax;

pub use compare::{directories_equivalent, equivalent, equivalent_with, files_equivalent, Ordering};
pub use index::CodeIndex;
pub use module::SourceModule;
pub use ops::directory::SourceDirectory;
pub use ops::extract::{refactor_module, RefactorOutcome};
pub use ops::{ImportStyle, RefactorError, RefactorOptions};
pub use syntax::{DeclKind, ParseError, Stmt};
