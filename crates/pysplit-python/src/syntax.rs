// Copyright (c) Ken Kocienda and other contributors.
//
// This source code is licensed under the MIT license found in the
// LICENSE file in the root directory of this source tree.

//! Syntax bridge over tree-sitter.
//!
//! Parses Python source with `tree-sitter-python` and converts the
//! statement-level structure into owned [`Stmt`] values. A `Stmt` carries
//! everything later stages need, so no tree-sitter type escapes this module:
//!
//! - its [`DeclKind`] and nested statements grouped by [`SectionKind`]
//! - its display name and the names it defines or binds
//! - its source text (decorators included, dedented to column zero)
//! - a structural fingerprint that ignores layout, comments and quote style
//! - the set of identifiers it references
//!
//! Node identity is a synthetic [`NodeId`] allocated when the statement is
//! built, never a byte offset.
//!
//! [`import_sites`] is the second entry point: it reports byte spans of every
//! import statement at any depth so the import rewriter can patch files in
//! place.

use std::collections::BTreeSet;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};

use pysplit_core::patch::{ContentHash, Span};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tree_sitter::{Node, Parser, Tree};

// ============================================================================
// Errors
// ============================================================================

/// Malformed Python source.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("syntax error in {} at line {line}, column {column}", display_path(.path))]
    Syntax {
        path: Option<PathBuf>,
        line: usize,
        column: usize,
    },

    #[error("expected exactly one statement, found {found}")]
    NotSingleStatement { found: usize },

    #[error("failed to load the Python grammar: {message}")]
    Language { message: String },
}

impl ParseError {
    /// Attach the file path to a syntax error.
    pub fn with_path(self, file: &Path) -> Self {
        match self {
            ParseError::Syntax { line, column, .. } => ParseError::Syntax {
                path: Some(file.to_path_buf()),
                line,
                column,
            },
            other => other,
        }
    }

    /// The file this error was raised for, if known.
    pub fn path(&self) -> Option<&Path> {
        match self {
            ParseError::Syntax { path, .. } => path.as_deref(),
            _ => None,
        }
    }
}

fn display_path(path: &Option<PathBuf>) -> String {
    match path {
        Some(path) => path.display().to_string(),
        None => "<source>".to_string(),
    }
}

// ============================================================================
// Node identity and kinds
// ============================================================================

/// Synthetic identity of a statement node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NodeId(pub u64);

static NEXT_NODE_ID: AtomicU64 = AtomicU64::new(1);

impl NodeId {
    /// Allocate a process-unique id.
    pub fn fresh() -> Self {
        NodeId(NEXT_NODE_ID.fetch_add(1, Ordering::Relaxed))
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "n{}", self.0)
    }
}

/// Declaration kind of a statement.
///
/// The variant order is the bucket order of a code index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeclKind {
    Import,
    ImportFrom,
    Class,
    Function,
    Assign,
    AnnAssign,
    AugAssign,
    Expr,
    If,
    For,
    While,
    Try,
    With,
    Match,
    Return,
    Raise,
    Pass,
    Break,
    Continue,
    Delete,
    Assert,
    Global,
    Nonlocal,
    TypeAlias,
    Other,
}

/// A group of nested statements inside a composite statement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SectionKind {
    Body,
    Handlers,
    Else,
    Finally,
}

impl DeclKind {
    /// Sections a statement of this kind may carry.
    ///
    /// This is the capability table used for containment elision.
    pub fn sections(&self) -> &'static [SectionKind] {
        use SectionKind::*;
        match self {
            DeclKind::Class | DeclKind::Function | DeclKind::With | DeclKind::Match => &[Body],
            DeclKind::If | DeclKind::For | DeclKind::While => &[Body, Else],
            DeclKind::Try => &[Body, Handlers, Else, Finally],
            _ => &[],
        }
    }

    pub fn is_import(&self) -> bool {
        matches!(self, DeclKind::Import | DeclKind::ImportFrom)
    }

    /// Compound statements whose sections bind names in the enclosing scope,
    /// such as `try: import ujson as json` at module level.
    pub fn binds_through_sections(&self) -> bool {
        matches!(
            self,
            DeclKind::If
                | DeclKind::For
                | DeclKind::While
                | DeclKind::Try
                | DeclKind::With
                | DeclKind::Match
        )
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            DeclKind::Import => "import",
            DeclKind::ImportFrom => "import_from",
            DeclKind::Class => "class",
            DeclKind::Function => "function",
            DeclKind::Assign => "assign",
            DeclKind::AnnAssign => "ann_assign",
            DeclKind::AugAssign => "aug_assign",
            DeclKind::Expr => "expr",
            DeclKind::If => "if",
            DeclKind::For => "for",
            DeclKind::While => "while",
            DeclKind::Try => "try",
            DeclKind::With => "with",
            DeclKind::Match => "match",
            DeclKind::Return => "return",
            DeclKind::Raise => "raise",
            DeclKind::Pass => "pass",
            DeclKind::Break => "break",
            DeclKind::Continue => "continue",
            DeclKind::Delete => "delete",
            DeclKind::Assert => "assert",
            DeclKind::Global => "global",
            DeclKind::Nonlocal => "nonlocal",
            DeclKind::TypeAlias => "type_alias",
            DeclKind::Other => "other",
        }
    }
}

impl fmt::Display for DeclKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// Imports
// ============================================================================

/// `import a.b` versus `from a import b`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ImportForm {
    Plain,
    From,
}

/// One name in an import statement, with its optional alias.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportedName {
    pub name: String,
    pub alias: Option<String>,
}

impl ImportedName {
    pub fn new(name: impl Into<String>, alias: Option<String>) -> Self {
        ImportedName {
            name: name.into(),
            alias,
        }
    }

    /// Source form: `name` or `name as alias`.
    pub fn render(&self) -> String {
        match &self.alias {
            Some(alias) => format!("{} as {}", self.name, alias),
            None => self.name.clone(),
        }
    }
}

/// Binding information of an import statement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportStmt {
    pub form: ImportForm,
    /// Number of leading dots of a relative from-import.
    pub level: usize,
    /// Dotted module of a from-import (`None` for `from . import x`).
    pub module: Option<String>,
    pub names: Vec<ImportedName>,
    pub wildcard: bool,
}

impl ImportStmt {
    /// Names this import binds in the importing namespace.
    ///
    /// A plain import binds its alias or the first segment of the dotted
    /// path. A from-import binds each alias or imported name.
    pub fn bound_names(&self) -> Vec<String> {
        self.names
            .iter()
            .map(|imported| match (&imported.alias, self.form) {
                (Some(alias), _) => alias.clone(),
                (None, ImportForm::Plain) => imported
                    .name
                    .split('.')
                    .next()
                    .unwrap_or(&imported.name)
                    .to_string(),
                (None, ImportForm::From) => imported.name.clone(),
            })
            .collect()
    }

    pub fn is_future(&self) -> bool {
        self.form == ImportForm::From
            && self.level == 0
            && self.module.as_deref() == Some("__future__")
    }

    /// Wildcard and `__future__` imports survive every pruning pass.
    pub fn is_always_kept(&self) -> bool {
        self.wildcard || self.is_future()
    }

    /// Module path with relative dots, e.g. `..pkg.models`.
    pub fn module_path(&self) -> String {
        format!("{}{}", ".".repeat(self.level), self.module.as_deref().unwrap_or(""))
    }
}

// ============================================================================
// Statements
// ============================================================================

/// Nested statements of one section of a composite statement.
#[derive(Debug, Clone)]
pub struct Section {
    pub kind: SectionKind,
    pub body: Vec<Stmt>,
}

/// An owned statement node.
#[derive(Debug, Clone)]
pub struct Stmt {
    pub id: NodeId,
    pub kind: DeclKind,
    /// Class or function name, target of an assignment, alias list of an
    /// import; empty otherwise.
    pub name: String,
    /// Source text, dedented to column zero.
    pub text: String,
    pub fingerprint: ContentHash,
    /// Every identifier referenced anywhere in the statement.
    pub references: BTreeSet<String>,
    /// Names the statement defines or binds at its own scope, including
    /// those bound inside the sections of a block such as `if` or `try`.
    pub defined: Vec<String>,
    pub import: Option<ImportStmt>,
    /// Root identifier of an expression statement such as `app.run()`.
    pub subject: Option<String>,
    pub sections: Vec<Section>,
    /// Sort key used when rendering a module.
    pub order: i64,
}

impl Stmt {
    /// Parse source holding exactly one top-level statement.
    pub fn parse_single(text: &str) -> Result<Stmt, ParseError> {
        let mut statements = parse_module(text)?;
        if statements.len() != 1 {
            return Err(ParseError::NotSingleStatement {
                found: statements.len(),
            });
        }
        Ok(statements.remove(0))
    }

    /// Build `from <module_path> import <name>`.
    pub fn import_from(module_path: &str, name: &str) -> Result<Stmt, ParseError> {
        Stmt::parse_single(&format!("from {} import {}", module_path, name))
    }

    pub fn with_order(mut self, order: i64) -> Self {
        self.order = order;
        self
    }

    pub fn is_import(&self) -> bool {
        self.kind.is_import()
    }

    /// Names bound by an import statement.
    pub fn bound_names(&self) -> Vec<String> {
        self.import
            .as_ref()
            .map(ImportStmt::bound_names)
            .unwrap_or_default()
    }

    /// Nested statements of every section, in source order.
    pub fn children(&self) -> impl Iterator<Item = &Stmt> {
        self.sections.iter().flat_map(|section| section.body.iter())
    }

    /// Every nested statement at any depth (pre-order, excluding `self`).
    pub fn descendants(&self) -> Vec<&Stmt> {
        let mut out = Vec::new();
        for child in self.children() {
            out.push(child);
            out.extend(child.descendants());
        }
        out
    }

    /// True if `id` is this statement or nested inside it.
    pub fn contains(&self, id: NodeId) -> bool {
        self.id == id || self.children().any(|child| child.contains(id))
    }
}

/// Parse a Python module into its top-level statements.
pub fn parse_module(text: &str) -> Result<Vec<Stmt>, ParseError> {
    let tree = parse_tree(text)?;
    let builder = Builder { source: text };
    Ok(builder.statements_in(tree.root_node()))
}

fn parse_tree(text: &str) -> Result<Tree, ParseError> {
    let mut parser = Parser::new();
    parser
        .set_language(&tree_sitter_python::LANGUAGE.into())
        .map_err(|e| ParseError::Language {
            message: e.to_string(),
        })?;
    let tree = parser.parse(text, None).ok_or_else(|| ParseError::Language {
        message: "parser produced no tree".to_string(),
    })?;

    let root = tree.root_node();
    if root.has_error() {
        let (line, column) = first_error(root).unwrap_or((1, 1));
        return Err(ParseError::Syntax {
            path: None,
            line,
            column,
        });
    }
    Ok(tree)
}

/// One-based position of the first error or missing node.
fn first_error(node: Node) -> Option<(usize, usize)> {
    if node.is_error() || node.is_missing() {
        let position = node.start_position();
        return Some((position.row + 1, position.column + 1));
    }
    let mut cursor = node.walk();
    let children: Vec<Node> = node.children(&mut cursor).collect();
    children
        .into_iter()
        .filter(|child| child.has_error())
        .find_map(first_error)
}

fn is_statement(kind: &str) -> bool {
    matches!(
        kind,
        "import_statement"
            | "import_from_statement"
            | "future_import_statement"
            | "class_definition"
            | "function_definition"
            | "decorated_definition"
            | "expression_statement"
            | "if_statement"
            | "for_statement"
            | "while_statement"
            | "try_statement"
            | "with_statement"
            | "match_statement"
            | "return_statement"
            | "raise_statement"
            | "pass_statement"
            | "break_statement"
            | "continue_statement"
            | "delete_statement"
            | "assert_statement"
            | "global_statement"
            | "nonlocal_statement"
            | "type_alias_statement"
            | "print_statement"
            | "exec_statement"
    )
}

fn classify(node: Node) -> DeclKind {
    match node.kind() {
        "import_statement" => DeclKind::Import,
        "import_from_statement" | "future_import_statement" => DeclKind::ImportFrom,
        "class_definition" => DeclKind::Class,
        "function_definition" => DeclKind::Function,
        "expression_statement" => match node.named_child(0) {
            Some(inner) if inner.kind() == "assignment" => {
                if inner.child_by_field_name("type").is_some() {
                    DeclKind::AnnAssign
                } else {
                    DeclKind::Assign
                }
            }
            Some(inner) if inner.kind() == "augmented_assignment" => DeclKind::AugAssign,
            _ => DeclKind::Expr,
        },
        "if_statement" => DeclKind::If,
        "for_statement" => DeclKind::For,
        "while_statement" => DeclKind::While,
        "try_statement" => DeclKind::Try,
        "with_statement" => DeclKind::With,
        "match_statement" => DeclKind::Match,
        "return_statement" => DeclKind::Return,
        "raise_statement" => DeclKind::Raise,
        "pass_statement" => DeclKind::Pass,
        "break_statement" => DeclKind::Break,
        "continue_statement" => DeclKind::Continue,
        "delete_statement" => DeclKind::Delete,
        "assert_statement" => DeclKind::Assert,
        "global_statement" => DeclKind::Global,
        "nonlocal_statement" => DeclKind::Nonlocal,
        "type_alias_statement" => DeclKind::TypeAlias,
        _ => DeclKind::Other,
    }
}

/// Direct `block` children of a clause node.
fn blocks_of(node: Node) -> Vec<Node> {
    let mut cursor = node.walk();
    node.children(&mut cursor)
        .filter(|child| child.kind() == "block")
        .collect()
}

/// Strip whitespace inside dotted names such as `os . path`.
fn compact(text: &str) -> String {
    text.split_whitespace().collect()
}

struct Builder<'src> {
    source: &'src str,
}

impl<'src> Builder<'src> {
    fn text(&self, node: Node) -> &'src str {
        &self.source[node.byte_range()]
    }

    fn statements_in(&self, container: Node) -> Vec<Stmt> {
        let mut out = Vec::new();
        let mut cursor = container.walk();
        let children: Vec<Node> = container.named_children(&mut cursor).collect();
        for child in children {
            if child.kind() == "case_clause" {
                for block in blocks_of(child) {
                    out.extend(self.statements_in(block));
                }
            } else if is_statement(child.kind()) {
                out.push(self.statement(child));
            }
        }
        out
    }

    fn statement(&self, node: Node) -> Stmt {
        let definition = if node.kind() == "decorated_definition" {
            node.child_by_field_name("definition").unwrap_or(node)
        } else {
            node
        };
        let kind = classify(definition);
        let import = kind.is_import().then(|| self.import(definition));
        let sections = self.sections(kind, definition);
        let mut defined = self.defined_names(kind, definition, import.as_ref());

        let name = match &import {
            Some(import) if import.wildcard => "*".to_string(),
            Some(import) => import
                .names
                .iter()
                .map(ImportedName::render)
                .collect::<Vec<_>>()
                .join(", "),
            None => defined.first().cloned().unwrap_or_default(),
        };

        if kind.binds_through_sections() {
            for child in sections.iter().flat_map(|section| section.body.iter()) {
                for bound in &child.defined {
                    if !defined.contains(bound) {
                        defined.push(bound.clone());
                    }
                }
            }
        }

        let mut references = BTreeSet::new();
        collect_references(node, self.source, &mut references);
        if defined.iter().any(|name| name == "__all__") {
            collect_string_contents(node, self.source, &mut references);
        }

        let subject = match kind {
            DeclKind::Expr => self.subject(definition),
            _ => None,
        };

        Stmt {
            id: NodeId::fresh(),
            kind,
            name,
            text: statement_text(self.source, node),
            fingerprint: fingerprint(node, self.source),
            references,
            defined,
            import,
            subject,
            sections,
            order: node.start_byte() as i64,
        }
    }

    fn sections(&self, kind: DeclKind, node: Node) -> Vec<Section> {
        let allowed = kind.sections();
        if allowed.is_empty() {
            return Vec::new();
        }

        let mut sections: Vec<Section> = Vec::new();
        let mut cursor = node.walk();
        let children: Vec<Node> = node.children(&mut cursor).collect();
        for child in children {
            let section = match child.kind() {
                "block" => SectionKind::Body,
                "except_clause" | "except_group_clause" => SectionKind::Handlers,
                "elif_clause" | "else_clause" => SectionKind::Else,
                "finally_clause" => SectionKind::Finally,
                _ => continue,
            };
            if !allowed.contains(&section) {
                continue;
            }

            let body: Vec<Stmt> = if child.kind() == "block" {
                self.statements_in(child)
            } else {
                blocks_of(child)
                    .into_iter()
                    .flat_map(|block| self.statements_in(block))
                    .collect()
            };
            if body.is_empty() {
                continue;
            }

            match sections.iter().position(|existing| existing.kind == section) {
                Some(i) => sections[i].body.extend(body),
                None => sections.push(Section {
                    kind: section,
                    body,
                }),
            }
        }
        sections.sort_by_key(|section| section.kind);
        sections
    }

    fn import(&self, node: Node) -> ImportStmt {
        let names = self.imported_names(node);
        match node.kind() {
            "import_statement" => ImportStmt {
                form: ImportForm::Plain,
                level: 0,
                module: None,
                names,
                wildcard: false,
            },
            "future_import_statement" => ImportStmt {
                form: ImportForm::From,
                level: 0,
                module: Some("__future__".to_string()),
                names,
                wildcard: false,
            },
            _ => {
                let (level, module) = match node.child_by_field_name("module_name") {
                    Some(module) if module.kind() == "relative_import" => {
                        self.relative_module(module)
                    }
                    Some(module) => (0, Some(compact(self.text(module)))),
                    None => (0, None),
                };
                let mut cursor = node.walk();
                let wildcard = node
                    .children(&mut cursor)
                    .any(|child| child.kind() == "wildcard_import");
                ImportStmt {
                    form: ImportForm::From,
                    level,
                    module,
                    names,
                    wildcard,
                }
            }
        }
    }

    fn relative_module(&self, node: Node) -> (usize, Option<String>) {
        let mut level = 0;
        let mut module = None;
        let mut cursor = node.walk();
        let children: Vec<Node> = node.children(&mut cursor).collect();
        for child in children {
            match child.kind() {
                "import_prefix" => level = self.text(child).matches('.').count(),
                "dotted_name" => module = Some(compact(self.text(child))),
                _ => {}
            }
        }
        (level, module)
    }

    fn imported_names(&self, node: Node) -> Vec<ImportedName> {
        let mut cursor = node.walk();
        let children: Vec<Node> = node.children_by_field_name("name", &mut cursor).collect();
        children
            .into_iter()
            .map(|child| {
                if child.kind() == "aliased_import" {
                    let name = child
                        .child_by_field_name("name")
                        .map(|n| compact(self.text(n)))
                        .unwrap_or_default();
                    let alias = child
                        .child_by_field_name("alias")
                        .map(|n| self.text(n).to_string());
                    ImportedName::new(name, alias)
                } else {
                    ImportedName::new(compact(self.text(child)), None)
                }
            })
            .collect()
    }

    fn defined_names(&self, kind: DeclKind, node: Node, import: Option<&ImportStmt>) -> Vec<String> {
        let mut names = Vec::new();
        match kind {
            DeclKind::Class | DeclKind::Function => {
                if let Some(name) = node.child_by_field_name("name") {
                    names.push(self.text(name).to_string());
                }
            }
            DeclKind::Assign | DeclKind::AnnAssign | DeclKind::AugAssign => {
                if let Some(assignment) = node.named_child(0) {
                    self.assignment_targets(assignment, &mut names);
                }
            }
            DeclKind::TypeAlias => {
                if let Some(left) = node.child_by_field_name("left") {
                    if let Some(identifier) = first_identifier(left) {
                        names.push(self.text(identifier).to_string());
                    }
                }
            }
            DeclKind::Import | DeclKind::ImportFrom => {
                if let Some(import) = import {
                    names.extend(import.bound_names());
                }
            }
            _ => {}
        }
        names
    }

    fn assignment_targets(&self, assignment: Node, out: &mut Vec<String>) {
        if let Some(left) = assignment.child_by_field_name("left") {
            self.pattern_names(left, out);
        }
        if let Some(right) = assignment.child_by_field_name("right") {
            if right.kind() == "assignment" {
                self.assignment_targets(right, out);
            }
        }
    }

    fn pattern_names(&self, node: Node, out: &mut Vec<String>) {
        match node.kind() {
            "identifier" => out.push(self.text(node).to_string()),
            "pattern_list" | "tuple_pattern" | "list_pattern" | "list_splat_pattern"
            | "parenthesized_expression" | "tuple" | "list" => {
                let mut cursor = node.walk();
                let children: Vec<Node> = node.named_children(&mut cursor).collect();
                for child in children {
                    self.pattern_names(child, out);
                }
            }
            _ => {}
        }
    }

    fn subject(&self, node: Node) -> Option<String> {
        let mut expr = node.named_child(0)?;
        loop {
            expr = match expr.kind() {
                "identifier" => return Some(self.text(expr).to_string()),
                "call" => expr.child_by_field_name("function")?,
                "attribute" => expr.child_by_field_name("object")?,
                "subscript" => expr.child_by_field_name("value")?,
                "await" => expr.named_child(0)?,
                _ => return None,
            };
        }
    }
}

fn first_identifier(node: Node) -> Option<Node> {
    if node.kind() == "identifier" {
        return Some(node);
    }
    let mut cursor = node.walk();
    let children: Vec<Node> = node.named_children(&mut cursor).collect();
    children.into_iter().find_map(first_identifier)
}

/// Statement source, with continuation lines dedented by the start column.
fn statement_text(source: &str, node: Node) -> String {
    let raw = &source[node.byte_range()];
    let column = node.start_position().column;
    if column == 0 {
        return raw.to_string();
    }
    raw.lines()
        .enumerate()
        .map(|(i, line)| {
            if i == 0 {
                return line;
            }
            let strip = line
                .bytes()
                .take(column)
                .take_while(|b| *b == b' ' || *b == b'\t')
                .count();
            &line[strip..]
        })
        .collect::<Vec<_>>()
        .join("\n")
}

// ============================================================================
// References
// ============================================================================

fn collect_references(node: Node, source: &str, out: &mut BTreeSet<String>) {
    match node.kind() {
        "import_statement" | "import_from_statement" | "future_import_statement"
        | "global_statement" | "nonlocal_statement" | "comment" => {}
        "identifier" => {
            out.insert(source[node.byte_range()].to_string());
        }
        "attribute" => {
            if let Some(object) = node.child_by_field_name("object") {
                collect_references(object, source, out);
            }
        }
        "keyword_argument" => {
            if let Some(value) = node.child_by_field_name("value") {
                collect_references(value, source, out);
            }
        }
        "function_definition" | "class_definition" => {
            let name_id = node.child_by_field_name("name").map(|name| name.id());
            let mut cursor = node.walk();
            let children: Vec<Node> = node.named_children(&mut cursor).collect();
            for child in children {
                if Some(child.id()) != name_id {
                    collect_references(child, source, out);
                }
            }
        }
        "parameters" | "lambda_parameters" => {
            let mut cursor = node.walk();
            let children: Vec<Node> = node.named_children(&mut cursor).collect();
            for child in children {
                collect_parameter_references(child, source, out);
            }
        }
        _ => {
            let mut cursor = node.walk();
            let children: Vec<Node> = node.named_children(&mut cursor).collect();
            for child in children {
                collect_references(child, source, out);
            }
        }
    }
}

/// Parameter names are bindings; only annotations and defaults reference.
fn collect_parameter_references(node: Node, source: &str, out: &mut BTreeSet<String>) {
    let fields: &[&str] = match node.kind() {
        "typed_parameter" => &["type"],
        "default_parameter" => &["value"],
        "typed_default_parameter" => &["type", "value"],
        _ => &[],
    };
    for field in fields {
        if let Some(child) = node.child_by_field_name(field) {
            collect_references(child, source, out);
        }
    }
}

/// String literal contents, used for `__all__ = ["Name", ...]`.
fn collect_string_contents(node: Node, source: &str, out: &mut BTreeSet<String>) {
    if node.kind() == "string_content" {
        out.insert(source[node.byte_range()].to_string());
        return;
    }
    let mut cursor = node.walk();
    let children: Vec<Node> = node.named_children(&mut cursor).collect();
    for child in children {
        collect_string_contents(child, source, out);
    }
}

// ============================================================================
// Fingerprints
// ============================================================================

/// Hash of a canonical structural dump of `node`.
fn fingerprint(node: Node, source: &str) -> ContentHash {
    let mut dump = String::new();
    write_canonical(node, source, &mut dump);
    ContentHash::compute(dump.as_bytes())
}

fn write_canonical(node: Node, source: &str, out: &mut String) {
    match node.kind() {
        "comment" | "line_continuation" | "," | "string_end" => return,
        "string_start" => {
            // Keep the prefix (f, r, b...) but not the quote style.
            let prefix: String = source[node.byte_range()]
                .chars()
                .filter(|c| c.is_alphabetic())
                .flat_map(char::to_lowercase)
                .collect();
            out.push_str("string_start=");
            out.push_str(&prefix);
            out.push(' ');
            return;
        }
        _ => {}
    }

    if node.child_count() == 0 {
        out.push_str(node.kind());
        if node.is_named() {
            out.push('=');
            out.push_str(&source[node.byte_range()]);
        }
        out.push(' ');
        return;
    }

    out.push('(');
    out.push_str(node.kind());
    out.push(' ');
    let mut cursor = node.walk();
    let children: Vec<Node> = node.children(&mut cursor).collect();
    for child in children {
        write_canonical(child, source, out);
    }
    out.push_str(") ");
}

// ============================================================================
// String literals
// ============================================================================

/// Byte spans of every string literal in `source`, outermost only.
pub fn string_spans(source: &str) -> Result<Vec<Span>, ParseError> {
    let tree = parse_tree(source)?;
    let mut spans = Vec::new();
    collect_string_spans(tree.root_node(), &mut spans);
    Ok(spans)
}

fn collect_string_spans(node: Node, out: &mut Vec<Span>) {
    if node.kind() == "string" {
        out.push(Span::new(node.start_byte(), node.end_byte()));
        return;
    }
    let mut cursor = node.walk();
    let children: Vec<Node> = node.named_children(&mut cursor).collect();
    for child in children {
        collect_string_spans(child, out);
    }
}

// ============================================================================
// Import sites
// ============================================================================

/// A dotted name and where it sits in the source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathSite {
    pub path: String,
    pub span: Span,
}

/// One imported name of an import statement.
///
/// For a plain import `span` covers the imported module path; for a
/// from-import it covers the imported name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NameSite {
    pub name: String,
    pub alias: Option<String>,
    pub span: Span,
}

impl NameSite {
    pub fn render(&self) -> String {
        ImportedName::new(self.name.clone(), self.alias.clone()).render()
    }
}

/// An import statement found anywhere in a file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportSite {
    /// The whole statement.
    pub span: Span,
    /// Leading whitespace of the line the statement starts on.
    pub indent: String,
    /// False when the statement follows another on the same line (`a; import b`).
    pub starts_line: bool,
    pub form: ImportForm,
    pub level: usize,
    /// Dotted module of a from-import, without the relative dots.
    pub module: Option<PathSite>,
    pub names: Vec<NameSite>,
    pub wildcard: bool,
}

/// Locate every `import` and `from ... import` statement in `source`.
///
/// `from __future__` imports are not reported.
pub fn import_sites(source: &str) -> Result<Vec<ImportSite>, ParseError> {
    let tree = parse_tree(source)?;
    let mut sites = Vec::new();
    collect_import_sites(tree.root_node(), source, &mut sites);
    Ok(sites)
}

fn collect_import_sites(node: Node, source: &str, out: &mut Vec<ImportSite>) {
    match node.kind() {
        "import_statement" | "import_from_statement" => {
            out.push(import_site(node, source));
            return;
        }
        "future_import_statement" => return,
        _ => {}
    }
    let mut cursor = node.walk();
    let children: Vec<Node> = node.named_children(&mut cursor).collect();
    for child in children {
        collect_import_sites(child, source, out);
    }
}

fn path_site(node: Node, source: &str) -> PathSite {
    PathSite {
        path: compact(&source[node.byte_range()]),
        span: Span::new(node.start_byte(), node.end_byte()),
    }
}

fn import_site(node: Node, source: &str) -> ImportSite {
    let start = node.start_byte();
    let line_start = source[..start].rfind('\n').map_or(0, |i| i + 1);
    let before = &source[line_start..start];
    let line = &source[line_start..];
    let indent: String = line
        .chars()
        .take_while(|c| *c == ' ' || *c == '\t')
        .collect();

    let mut cursor = node.walk();
    let name_nodes: Vec<Node> = node.children_by_field_name("name", &mut cursor).collect();
    let names = name_nodes
        .into_iter()
        .map(|child| {
            let (target, alias) = if child.kind() == "aliased_import" {
                (
                    child.child_by_field_name("name").unwrap_or(child),
                    child
                        .child_by_field_name("alias")
                        .map(|alias| source[alias.byte_range()].to_string()),
                )
            } else {
                (child, None)
            };
            NameSite {
                name: compact(&source[target.byte_range()]),
                alias,
                span: Span::new(target.start_byte(), target.end_byte()),
            }
        })
        .collect();

    let (form, level, module, wildcard) = if node.kind() == "import_statement" {
        (ImportForm::Plain, 0, None, false)
    } else {
        let (level, module) = match node.child_by_field_name("module_name") {
            Some(module) if module.kind() == "relative_import" => {
                let mut level = 0;
                let mut dotted = None;
                let mut cursor = module.walk();
                let children: Vec<Node> = module.children(&mut cursor).collect();
                for child in children {
                    match child.kind() {
                        "import_prefix" => {
                            level = source[child.byte_range()].matches('.').count()
                        }
                        "dotted_name" => dotted = Some(path_site(child, source)),
                        _ => {}
                    }
                }
                (level, dotted)
            }
            Some(module) => (0, Some(path_site(module, source))),
            None => (0, None),
        };
        let mut cursor = node.walk();
        let wildcard = node
            .children(&mut cursor)
            .any(|child| child.kind() == "wildcard_import");
        (ImportForm::From, level, module, wildcard)
    };

    ImportSite {
        span: Span::new(start, node.end_byte()),
        indent,
        starts_line: before.trim().is_empty(),
        form,
        level,
        module,
        names,
        wildcard,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn single(text: &str) -> Stmt {
        Stmt::parse_single(text).unwrap()
    }

    mod classification {
        use super::*;

        #[test]
        fn top_level_kinds() {
            let stmts = parse_module(
                "import os\nfrom a import b\nclass C:\n    pass\ndef f():\n    pass\nx = 1\ny: int = 2\nz += 1\nprint(x)\n",
            )
            .unwrap();
            let kinds: Vec<DeclKind> = stmts.iter().map(|s| s.kind).collect();
            assert_eq!(
                kinds,
                vec![
                    DeclKind::Import,
                    DeclKind::ImportFrom,
                    DeclKind::Class,
                    DeclKind::Function,
                    DeclKind::Assign,
                    DeclKind::AnnAssign,
                    DeclKind::AugAssign,
                    DeclKind::Expr,
                ]
            );
        }

        #[test]
        fn decorated_definition_keeps_decorator_text() {
            let stmt = single("@dataclass\nclass Point:\n    x: int\n");
            assert_eq!(stmt.kind, DeclKind::Class);
            assert_eq!(stmt.name, "Point");
            assert!(stmt.text.starts_with("@dataclass"));
            assert!(stmt.references.contains("dataclass"));
        }

        #[test]
        fn future_import_is_import_from() {
            let stmt = single("from __future__ import annotations\n");
            assert_eq!(stmt.kind, DeclKind::ImportFrom);
            assert!(stmt.import.as_ref().unwrap().is_future());
        }

        #[test]
        fn ids_are_unique() {
            let stmts = parse_module("a = 1\nb = 2\n").unwrap();
            assert_ne!(stmts[0].id, stmts[1].id);
        }
    }

    mod sections {
        use super::*;

        #[test]
        fn try_statement_groups_sections() {
            let stmt = single(
                "try:\n    a = 1\nexcept ValueError:\n    b = 2\nelse:\n    c = 3\nfinally:\n    d = 4\n",
            );
            let kinds: Vec<SectionKind> = stmt.sections.iter().map(|s| s.kind).collect();
            assert_eq!(
                kinds,
                vec![
                    SectionKind::Body,
                    SectionKind::Handlers,
                    SectionKind::Else,
                    SectionKind::Finally
                ]
            );
            assert_eq!(stmt.descendants().len(), 4);
        }

        #[test]
        fn class_body_is_nested() {
            let stmt = single("class A:\n    def m(self):\n        return 1\n");
            let method = stmt.children().next().unwrap();
            assert_eq!(method.kind, DeclKind::Function);
            assert_eq!(method.text, "def m(self):\n    return 1");
            assert!(stmt.contains(method.id));
            assert_eq!(stmt.descendants().len(), 2);
        }

        #[test]
        fn if_elif_else_lands_in_else_section() {
            let stmt = single("if a:\n    x = 1\nelif b:\n    x = 2\nelse:\n    x = 3\n");
            assert_eq!(stmt.sections.len(), 2);
            assert_eq!(stmt.sections[1].kind, SectionKind::Else);
            assert_eq!(stmt.sections[1].body.len(), 2);
        }

        #[test]
        fn capability_table() {
            assert!(DeclKind::Assign.sections().is_empty());
            assert_eq!(DeclKind::Try.sections().len(), 4);
            assert_eq!(DeclKind::Class.sections(), &[SectionKind::Body]);
        }

        #[test]
        fn blocks_define_the_names_their_sections_bind() {
            let stmt = single("try:\n    import ujson as json\nexcept ImportError:\n    import json\n");
            assert_eq!(stmt.defined, vec!["json"]);
            assert!(stmt.name.is_empty());
            assert!(stmt.references.contains("ImportError"));
            assert!(!stmt.references.contains("ujson"));

            let stmt = single("if TYPE_CHECKING:\n    from pkg.other import Thing\n    X = 1\n");
            assert_eq!(stmt.defined, vec!["Thing", "X"]);
            assert!(stmt.references.contains("TYPE_CHECKING"));
        }

        #[test]
        fn class_and_function_bodies_bind_nothing_outside() {
            let stmt = single("class A:\n    x = 1\n    def m(self):\n        pass\n");
            assert_eq!(stmt.defined, vec!["A"]);
        }
    }

    mod references {
        use super::*;

        #[test]
        fn excludes_names_parameters_and_attributes() {
            let stmt = single(
                "class Foo(Base):\n    def run(self, item: Item, count=DEFAULT, *args, **kwargs):\n        return helper(item).value\n",
            );
            let refs: Vec<&str> = stmt.references.iter().map(String::as_str).collect();
            assert_eq!(refs, vec!["Base", "DEFAULT", "Item", "helper", "item"]);
        }

        #[test]
        fn keyword_names_are_not_references() {
            let stmt = single("x = make(size=LIMIT)\n");
            assert!(stmt.references.contains("LIMIT"));
            assert!(!stmt.references.contains("size"));
        }

        #[test]
        fn all_strings_count_as_references() {
            let stmt = single("__all__ = [\"Foo\", 'Bar']\n");
            assert!(stmt.references.contains("Foo"));
            assert!(stmt.references.contains("Bar"));
        }

        #[test]
        fn expression_subject() {
            assert_eq!(single("app.register(view)\n").subject.as_deref(), Some("app"));
            assert_eq!(single("logger.handlers[0].flush()\n").subject.as_deref(), Some("logger"));
            assert_eq!(single("\"docstring\"\n").subject, None);
        }
    }

    mod imports {
        use super::*;

        #[test]
        fn plain_import_binds_top_segment_or_alias() {
            let stmt = single("import os.path, numpy as np\n");
            assert_eq!(stmt.bound_names(), vec!["os", "np"]);
            assert_eq!(stmt.name, "os.path, numpy as np");
        }

        #[test]
        fn from_import_binds_names() {
            let stmt = single("from typing import List, Dict as D\n");
            assert_eq!(stmt.bound_names(), vec!["List", "D"]);
            let import = stmt.import.unwrap();
            assert_eq!(import.module.as_deref(), Some("typing"));
            assert_eq!(import.level, 0);
        }

        #[test]
        fn relative_import_level() {
            let stmt = single("from ..pkg.models import User\n");
            let import = stmt.import.unwrap();
            assert_eq!(import.level, 2);
            assert_eq!(import.module.as_deref(), Some("pkg.models"));
            assert_eq!(import.module_path(), "..pkg.models");

            let bare = single("from . import sibling\n").import.unwrap();
            assert_eq!(bare.level, 1);
            assert_eq!(bare.module, None);
        }

        #[test]
        fn wildcard_is_always_kept() {
            let import = single("from models import *\n").import.unwrap();
            assert!(import.wildcard);
            assert!(import.is_always_kept());
        }

        #[test]
        fn import_sites_report_module_spans() {
            let source = "import models\n\ndef f():\n    from .models import Foo, Bar as B\n";
            let sites = import_sites(source).unwrap();
            assert_eq!(sites.len(), 2);

            let plain = &sites[0];
            assert_eq!(plain.form, ImportForm::Plain);
            assert_eq!(&source[plain.names[0].span.start..plain.names[0].span.end], "models");

            let nested = &sites[1];
            assert_eq!(nested.level, 1);
            assert_eq!(nested.indent, "    ");
            assert!(nested.starts_line);
            let module = nested.module.as_ref().unwrap();
            assert_eq!(module.path, "models");
            assert_eq!(&source[module.span.start..module.span.end], "models");
            assert_eq!(nested.names[1].render(), "Bar as B");
        }
    }

    mod fingerprints {
        use super::*;

        #[test]
        fn layout_and_comments_are_ignored() {
            let a = single("def f(a, b):\n    return a + b\n");
            let b = single("def f(a,b):\n  # add them\n  return a+b\n");
            assert_eq!(a.fingerprint, b.fingerprint);
        }

        #[test]
        fn quote_style_is_ignored() {
            assert_eq!(single("x = 'a'\n").fingerprint, single("x = \"a\"\n").fingerprint);
            assert_ne!(single("x = 'a'\n").fingerprint, single("x = b'a'\n").fingerprint);
        }

        #[test]
        fn names_matter() {
            assert_ne!(
                single("class A:\n    pass\n").fingerprint,
                single("class B:\n    pass\n").fingerprint
            );
        }
    }

    mod errors {
        use super::*;

        #[test]
        fn malformed_source_fails() {
            let err = parse_module("def broken(:\n    pass\n").unwrap_err();
            assert!(matches!(err, ParseError::Syntax { line: 1, .. }));
        }

        #[test]
        fn path_is_attached() {
            let err = parse_module("class\n")
                .unwrap_err()
                .with_path(Path::new("pkg/bad.py"));
            assert_eq!(err.path(), Some(Path::new("pkg/bad.py")));
            assert!(err.to_string().contains("pkg/bad.py"));
        }

        #[test]
        fn parse_single_rejects_many() {
            let err = Stmt::parse_single("a = 1\nb = 2\n").unwrap_err();
            assert_eq!(err, ParseError::NotSingleStatement { found: 2 });
        }
    }
}
