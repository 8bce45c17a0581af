// Copyright (c) Ken Kocienda and other contributors.
//
// This source code is licensed under the MIT license found in the
// LICENSE file in the root directory of this source tree.

//! Core infrastructure for pysplit.
//!
//! This crate provides the language-agnostic pieces:
//! - Identifier normalization for canonical module names
//! - Byte-span edits and content hashing
//! - Error types and error codes
//! - JSON output types for CLI responses

pub mod error;
pub mod normalize;
pub mod output;
pub mod patch;
