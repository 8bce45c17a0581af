// Copyright (c) Ken Kocienda and other contributors.
//
// This source code is licensed under the MIT license found in the
// LICENSE file in the root directory of this source tree.

//! Module text emission.
//!
//! Statements are re-emitted from their own source text; only the layout
//! between them is generated. `format_source` is a small, idempotent layout
//! normaliser that never looks inside string literals.

use pysplit_core::patch::Span;

use crate::syntax::{string_spans, DeclKind, Stmt};

/// Render statements as module text.
///
/// `from __future__` imports come first, then statements by their `order`
/// key. Definitions are separated by two blank lines, a switch between
/// imports and other code by one. Statement text is emitted as is.
pub fn render_module<'a>(stmts: impl IntoIterator<Item = &'a Stmt>) -> String {
    let mut ordered: Vec<&Stmt> = stmts.into_iter().collect();
    ordered.sort_by_key(|stmt| (!is_future_import(stmt), stmt.order));

    let mut out = String::new();
    let mut previous: Option<&Stmt> = None;
    for stmt in ordered {
        if let Some(prev) = previous {
            out.push('\n');
            for _ in 0..blank_lines_between(prev, stmt) {
                out.push('\n');
            }
        }
        out.push_str(stmt.text.trim_end());
        previous = Some(stmt);
    }
    if !out.is_empty() {
        out.push('\n');
    }
    out
}

fn is_future_import(stmt: &Stmt) -> bool {
    stmt.import.as_ref().is_some_and(|import| import.is_future())
}

fn is_definition(stmt: &Stmt) -> bool {
    matches!(stmt.kind, DeclKind::Class | DeclKind::Function)
}

fn blank_lines_between(prev: &Stmt, next: &Stmt) -> usize {
    if is_definition(prev) || is_definition(next) {
        2
    } else if prev.is_import() != next.is_import() {
        1
    } else {
        0
    }
}

/// Normalise layout: LF line endings, whitespace-only lines emptied, at most
/// two consecutive blank lines, no leading or trailing blank lines, one
/// final newline. Empty input stays empty.
///
/// Lines that begin inside a string literal are kept byte for byte. Text
/// that does not parse is returned unchanged.
pub fn format_source(text: &str) -> String {
    let Ok(strings) = string_spans(text) else {
        return text.to_string();
    };
    let mut lines: Vec<&str> = Vec::new();
    let mut blank_run = 0;
    let mut offset = 0;

    for raw in text.split('\n') {
        let start = offset;
        offset += raw.len() + 1;
        if starts_inside_string(&strings, start) {
            blank_run = 0;
            lines.push(raw);
            continue;
        }
        let line = raw.strip_suffix('\r').unwrap_or(raw);
        if line.trim().is_empty() {
            blank_run += 1;
            if blank_run > 2 || lines.is_empty() {
                continue;
            }
            lines.push("");
        } else {
            blank_run = 0;
            lines.push(line);
        }
    }

    while lines.last().is_some_and(|line| line.is_empty()) {
        lines.pop();
    }
    if lines.is_empty() {
        return String::new();
    }

    let mut out = lines.join("\n");
    out.push('\n');
    out
}

fn starts_inside_string(strings: &[Span], offset: usize) -> bool {
    let at = Span::new(offset, offset);
    strings
        .iter()
        .any(|string| string.start < offset && string.contains(&at))
}
