// Copyright (c) Ken Kocienda and other contributors.
//
// This source code is licensed under the MIT license found in the
// LICENSE file in the root directory of this source tree.

//! pysplit: one class per module for Python source trees.
//!
//! Moves every top-level class into a module named after it, carries along
//! the imports and helpers the class needs, renames modules to snake_case
//! and rewrites imports across the tree to match.

// Core infrastructure - re-exported from pysplit-core
pub use pysplit_core::error;
pub use pysplit_core::normalize;
pub use pysplit_core::output;
pub use pysplit_core::patch;

// Language adapter
pub use pysplit_python as python;

// Front door
pub mod cli;
pub mod config;

