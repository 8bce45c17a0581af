// Copyright (c) Ken Kocienda and other contributors.
//
// This source code is licensed under the MIT license found in the
// LICENSE file in the root directory of this source tree.

//! Class extraction: one class per module, named after the class.
//!
//! Each module runs through a small state machine:
//!
//! ```text
//! ModuleRenamePending -> ExtractingClasses { cursor } -> ReconcilingImports -> Done
//! ```
//!
//! 1. **ModuleRenamePending**: the file is renamed to the normalized form of
//!    its module name and every import of the old name under the search
//!    root is rewritten. A name differing only by letter case is left alone.
//! 2. **ExtractingClasses**: each class whose normalized name differs from
//!    the module name moves to its own file together with the imports and
//!    sibling declarations it references. The origin imports the class back
//!    from its new home and dependent files are rewritten. The cursor only
//!    advances past classes that stay.
//! 3. **ReconcilingImports**: imports no longer referenced are dropped. A
//!    module left with nothing but imports is deleted.
//!
//! Running the machine again over its own output changes nothing.

use std::collections::{BTreeSet, HashSet};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use pysplit_core::normalize::normalize;

use crate::dependents::{find_class_dependents, find_module_dependents, ImportResolver};
use crate::index::CodeIndex;
use crate::module::{module_path, SourceModule};
use crate::resolver::{required_module_imports, resolve_closure};
use crate::syntax::{NodeId, Stmt};

use super::rewrite::{rewrite_class_import, rewrite_module_import};
use super::{RefactorError, RefactorOptions};

// ============================================================================
// States and decisions
// ============================================================================

/// Where the extraction of one module currently stands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExtractionState {
    ModuleRenamePending,
    /// `cursor` indexes the module's current class list.
    ExtractingClasses { cursor: usize },
    ReconcilingImports,
    Done,
}

/// What happened to the module's file name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "decision", rename_all = "snake_case")]
pub enum RenameDecision {
    Unchanged,
    Renamed { from: PathBuf, to: PathBuf },
    /// The normalized name differs only by letter case.
    CollisionSkip { target: PathBuf },
    /// Another file already has the normalized name.
    TargetExists { target: PathBuf },
}

/// What happened to one class.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "decision", rename_all = "snake_case")]
pub enum ClassDecision {
    /// The class already lives in the module named after it.
    AlreadyHome,
    /// The target path differs from the module path only by letter case.
    CollisionSkip { target: PathBuf },
    Extracted {
        target: PathBuf,
        /// Display names of the imports written with the class.
        imports: Vec<String>,
        /// Names of the sibling declarations copied or imported along.
        siblings: Vec<String>,
        /// True if the class was merged into an existing file.
        merged: bool,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassReport {
    pub class: String,
    #[serde(flatten)]
    pub decision: ClassDecision,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModuleStatus {
    /// The file did not exist when the run started.
    NotFound,
    Refactored,
    /// The module was emptied and removed.
    Deleted,
    Unchanged,
}

/// Report of one module's extraction run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RefactorOutcome {
    pub status: ModuleStatus,
    /// The module's path when the run started.
    pub module: PathBuf,
    pub rename: RenameDecision,
    pub classes: Vec<ClassReport>,
    /// Files written, new modules included.
    pub written: Vec<PathBuf>,
    /// Dependent files whose imports were rewritten.
    pub rewritten: Vec<PathBuf>,
    pub deleted: Vec<PathBuf>,
}

impl RefactorOutcome {
    fn new(module: &Path) -> Self {
        RefactorOutcome {
            status: ModuleStatus::Unchanged,
            module: module.to_path_buf(),
            rename: RenameDecision::Unchanged,
            classes: Vec::new(),
            written: Vec::new(),
            rewritten: Vec::new(),
            deleted: Vec::new(),
        }
    }

    fn record(list: &mut Vec<PathBuf>, path: &Path) {
        if !list.iter().any(|existing| existing == path) {
            list.push(path.to_path_buf());
        }
    }

    fn extracted_any(&self) -> bool {
        self.classes
            .iter()
            .any(|report| matches!(report.decision, ClassDecision::Extracted { .. }))
    }

    fn touched_anything(&self) -> bool {
        !self.written.is_empty() || !self.rewritten.is_empty() || !self.deleted.is_empty()
    }
}

fn same_ignoring_case(a: &Path, b: &Path) -> bool {
    a.to_string_lossy().to_lowercase() == b.to_string_lossy().to_lowercase()
}

// ============================================================================
// Engine
// ============================================================================

/// The extraction state machine for one module.
pub struct ClassExtractor<'a> {
    module: SourceModule,
    search_root: PathBuf,
    resolver: ImportResolver,
    options: &'a RefactorOptions,
    state: ExtractionState,
    outcome: RefactorOutcome,
}

impl<'a> ClassExtractor<'a> {
    /// Prepare to refactor `path`. Dependents are searched under `search_root`.
    pub fn new(path: &Path, search_root: &Path, options: &'a RefactorOptions) -> Self {
        ClassExtractor {
            module: SourceModule::new(path),
            search_root: search_root.to_path_buf(),
            resolver: ImportResolver::new(search_root),
            options,
            state: ExtractionState::ModuleRenamePending,
            outcome: RefactorOutcome::new(path),
        }
    }

    pub fn state(&self) -> ExtractionState {
        self.state
    }

    /// The module's current path.
    pub fn module_path(&self) -> &Path {
        self.module.path()
    }

    /// Perform one transition and return the new state.
    pub fn step(&mut self) -> Result<ExtractionState, RefactorError> {
        self.state = match self.state {
            ExtractionState::ModuleRenamePending => {
                self.rename_module()?;
                ExtractionState::ExtractingClasses { cursor: 0 }
            }
            ExtractionState::ExtractingClasses { cursor } => self.extract_at(cursor)?,
            ExtractionState::ReconcilingImports => {
                self.reconcile_imports()?;
                ExtractionState::Done
            }
            ExtractionState::Done => ExtractionState::Done,
        };
        Ok(self.state)
    }

    /// Run to completion.
    ///
    /// A module whose file does not exist is reported as
    /// [`ModuleStatus::NotFound`] without touching anything.
    pub fn run(mut self) -> Result<RefactorOutcome, RefactorError> {
        if !self.module.exists() {
            warn!(path = %self.module.path().display(), "module not found, skipping");
            self.outcome.status = ModuleStatus::NotFound;
            return Ok(self.outcome);
        }
        while self.step()? != ExtractionState::Done {}
        Ok(self.outcome)
    }

    // ------------------------------------------------------------------------
    // ModuleRenamePending
    // ------------------------------------------------------------------------

    fn rename_module(&mut self) -> Result<(), RefactorError> {
        let current = self.module.module_name();
        let target = normalize(&current);
        if target == current || target.is_empty() || self.module.is_package_init() {
            return Ok(());
        }

        let old_path = self.module.path().to_path_buf();
        let new_path = module_path(self.module.directory(), &target);
        if same_ignoring_case(&old_path, &new_path) {
            info!(module = %current, normalized = %target, "module name differs only by case, not renaming");
            self.outcome.rename = RenameDecision::CollisionSkip { target: new_path };
            return Ok(());
        }
        if new_path.exists() {
            warn!(
                module = %current,
                existing = %new_path.display(),
                "target module already exists, not renaming"
            );
            self.outcome.rename = RenameDecision::TargetExists { target: new_path };
            return Ok(());
        }

        self.module.index()?;
        self.module.delete()?;
        let dependents = find_module_dependents(&self.search_root, &old_path, &[&old_path])?;
        self.module.move_to(&new_path)?;
        self.module.save()?;
        info!(from = %old_path.display(), to = %new_path.display(), "renamed module");

        RefactorOutcome::record(&mut self.outcome.deleted, &old_path);
        RefactorOutcome::record(&mut self.outcome.written, &new_path);
        for dependent in dependents {
            if rewrite_module_import(&self.resolver, &dependent, &old_path, &target)? {
                RefactorOutcome::record(&mut self.outcome.rewritten, &dependent);
            }
        }
        self.outcome.rename = RenameDecision::Renamed {
            from: old_path,
            to: new_path,
        };
        Ok(())
    }

    // ------------------------------------------------------------------------
    // ExtractingClasses
    // ------------------------------------------------------------------------

    /// Module a class of this module will live in once the run finishes.
    fn class_home(&self, class_name: &str) -> String {
        let target = normalize(class_name);
        let target_path = module_path(self.module.directory(), &target);
        if same_ignoring_case(&target_path, self.module.path()) {
            self.module.module_name()
        } else {
            target
        }
    }

    fn extract_at(&mut self, cursor: usize) -> Result<ExtractionState, RefactorError> {
        let class = match self.module.index()?.classes().get(cursor) {
            Some(class) => class.clone(),
            None => return Ok(ExtractionState::ReconcilingImports),
        };
        let next = ExtractionState::ExtractingClasses { cursor: cursor + 1 };

        let target = normalize(&class.name);
        let target_path = module_path(self.module.directory(), &target);
        if target_path == self.module.path() {
            self.report(&class.name, ClassDecision::AlreadyHome);
            return Ok(next);
        }
        if same_ignoring_case(&target_path, self.module.path()) {
            info!(
                class = %class.name,
                destination = %target_path.display(),
                "class module differs only by case, leaving class in place"
            );
            self.report(
                &class.name,
                ClassDecision::CollisionSkip {
                    target: target_path,
                },
            );
            return Ok(next);
        }

        self.extract_class(&class, &target, &target_path)?;
        Ok(ExtractionState::ExtractingClasses { cursor })
    }

    fn extract_class(
        &mut self,
        class: &Stmt,
        target: &str,
        target_path: &Path,
    ) -> Result<(), RefactorError> {
        let origin = self.module.module_name();
        let origin_path = self.module.path().to_path_buf();
        let style = self.options.import_style;

        let (extracted, imports, siblings) = self.build_target(class, &origin)?;
        let merged = target_path.is_file();
        let mut target_module = if merged {
            let mut existing = SourceModule::new(target_path);
            existing.index_mut()?.merge(extracted);
            existing
        } else {
            SourceModule::with_index(target_path, extracted)
        };
        target_module.save()?;
        RefactorOutcome::record(&mut self.outcome.written, target_path);

        let back_import = Stmt::import_from(&style.module_path(target), &class.name)?;
        let index = self.module.index_mut()?;
        index.remove_subtree(class.id);
        index.prepend(back_import);
        info!(
            class = %class.name,
            destination = %target_path.display(),
            merged,
            "extracted class"
        );

        let dependents = find_class_dependents(
            &self.search_root,
            &class.name,
            &origin_path,
            &[&origin_path, target_path],
        )?;
        for dependent in dependents {
            if rewrite_class_import(&self.resolver, &dependent, &class.name, &origin_path, target)? {
                RefactorOutcome::record(&mut self.outcome.rewritten, &dependent);
            }
        }

        self.report(
            &class.name,
            ClassDecision::Extracted {
                target: target_path.to_path_buf(),
                imports,
                siblings,
                merged,
            },
        );
        Ok(())
    }

    /// Index of the new module for `class`: the imports it needs, imports
    /// of the other classes it references, its sibling declarations, then
    /// the class itself.
    fn build_target(
        &mut self,
        class: &Stmt,
        origin: &str,
    ) -> Result<(CodeIndex, Vec<String>, Vec<String>), RefactorError> {
        let style = self.options.import_style;
        let closure = resolve_closure(&[class], self.module.index()?);
        let mut target = CodeIndex::new();
        let mut imports = Vec::new();

        for import in &closure.imports {
            imports.push(import.name.clone());
            target.append(import.clone());
        }
        for other in &closure.classes {
            let home = self.class_home(&other.name);
            let import = Stmt::import_from(&style.module_path(&home), &other.name)?;
            imports.push(import.name.clone());
            target.append(import);
        }

        let siblings = closure.siblings();
        let sibling_names: Vec<String> = siblings
            .iter()
            .flat_map(|stmt| {
                if stmt.name.is_empty() {
                    stmt.defined.clone()
                } else {
                    vec![stmt.name.clone()]
                }
            })
            .collect();
        if self.options.copy_siblings {
            for sibling in siblings {
                target.append(sibling.clone());
            }
        } else {
            // A name bound under `try:` or `if TYPE_CHECKING:` may not exist
            // on the origin at runtime, so blocks travel as text.
            let (blocks, plain): (Vec<&Stmt>, Vec<&Stmt>) = siblings
                .into_iter()
                .partition(|stmt| stmt.kind.binds_through_sections());
            let defined: BTreeSet<&str> = plain
                .iter()
                .flat_map(|stmt| stmt.defined.iter().map(String::as_str))
                .collect();
            if !defined.is_empty() {
                let names = defined.into_iter().collect::<Vec<_>>().join(", ");
                let import = Stmt::import_from(&style.module_path(origin), &names)?;
                imports.push(import.name.clone());
                target.append(import);
            }
            for block in blocks {
                target.append(block.clone());
            }
        }

        target.append(class.clone());
        Ok((target, imports, sibling_names))
    }

    fn report(&mut self, class: &str, decision: ClassDecision) {
        self.outcome.classes.push(ClassReport {
            class: class.to_string(),
            decision,
        });
    }

    // ------------------------------------------------------------------------
    // ReconcilingImports
    // ------------------------------------------------------------------------

    fn reconcile_imports(&mut self) -> Result<(), RefactorError> {
        let path = self.module.path().to_path_buf();
        if !self.module.is_package_init() {
            let index = self.module.index()?;
            let required: HashSet<NodeId> = required_module_imports(index)
                .iter()
                .map(|stmt| stmt.id)
                .collect();
            if required.len() < index.imports().len() {
                self.module
                    .index_mut()?
                    .retain_imports(|stmt| required.contains(&stmt.id));
            }
        }

        let emptied = self.outcome.extracted_any()
            && !self.module.is_package_init()
            && self.module.should_be_deleted()?;
        if emptied && self.options.delete_empty_modules {
            self.module.delete()?;
            RefactorOutcome::record(&mut self.outcome.deleted, &path);
            self.outcome.written.retain(|written| written != &path);
            self.outcome.status = ModuleStatus::Deleted;
            return Ok(());
        }

        if self.module.save()? {
            RefactorOutcome::record(&mut self.outcome.written, &path);
        }
        if self.outcome.touched_anything() {
            self.outcome.status = ModuleStatus::Refactored;
        }
        Ok(())
    }
}

/// Refactor the module at `path`, searching for dependents under `search_root`.
pub fn refactor_module(
    path: &Path,
    search_root: &Path,
    options: &RefactorOptions,
) -> Result<RefactorOutcome, RefactorError> {
    ClassExtractor::new(path, search_root, options).run()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn setup_workspace(files: &[(&str, &str)]) -> TempDir {
        let dir = TempDir::new().unwrap();
        for (name, content) in files {
            let path = dir.path().join(name);
            if let Some(parent) = path.parent() {
                fs::create_dir_all(parent).unwrap();
            }
            fs::write(path, content).unwrap();
        }
        dir
    }

    fn read(dir: &TempDir, name: &str) -> String {
        fs::read_to_string(dir.path().join(name)).unwrap()
    }

    mod states {
        use super::*;

        #[test]
        fn transitions_in_order() {
            let workspace = setup_workspace(&[("shapes.py", "class Circle:\n    pass\n")]);
            let options = RefactorOptions::default();
            let path = workspace.path().join("shapes.py");
            let mut extractor = ClassExtractor::new(&path, workspace.path(), &options);

            assert_eq!(extractor.state(), ExtractionState::ModuleRenamePending);
            assert_eq!(
                extractor.step().unwrap(),
                ExtractionState::ExtractingClasses { cursor: 0 }
            );
            // Extraction does not advance the cursor; the class list shrank.
            assert_eq!(
                extractor.step().unwrap(),
                ExtractionState::ExtractingClasses { cursor: 0 }
            );
            assert_eq!(extractor.step().unwrap(), ExtractionState::ReconcilingImports);
            assert_eq!(extractor.step().unwrap(), ExtractionState::Done);
            assert_eq!(extractor.step().unwrap(), ExtractionState::Done);
        }

        #[test]
        fn missing_module_is_not_found() {
            let workspace = setup_workspace(&[]);
            let outcome = refactor_module(
                &workspace.path().join("absent.py"),
                workspace.path(),
                &RefactorOptions::default(),
            )
            .unwrap();
            assert_eq!(outcome.status, ModuleStatus::NotFound);
            assert!(outcome.written.is_empty());
        }
    }

    mod rename {
        use super::*;

        #[test]
        fn module_is_renamed_and_dependents_rewritten() {
            let workspace = setup_workspace(&[
                ("MyHelpers.py", "def helper():\n    return 1\n"),
                ("app.py", "import MyHelpers\nfrom MyHelpers import helper\n"),
            ]);
            let outcome = refactor_module(
                &workspace.path().join("MyHelpers.py"),
                workspace.path(),
                &RefactorOptions::default(),
            )
            .unwrap();

            assert!(!workspace.path().join("MyHelpers.py").exists());
            assert_eq!(read(&workspace, "my_helpers.py"), "def helper():\n    return 1\n");
            assert_eq!(
                read(&workspace, "app.py"),
                "import my_helpers\nfrom my_helpers import helper\n"
            );
            assert!(matches!(outcome.rename, RenameDecision::Renamed { .. }));
            assert_eq!(outcome.status, ModuleStatus::Refactored);
        }

        #[test]
        fn case_only_difference_is_a_collision_skip() {
            let workspace = setup_workspace(&[("Widgets.py", "x = 1\n")]);
            let outcome = refactor_module(
                &workspace.path().join("Widgets.py"),
                workspace.path(),
                &RefactorOptions::default(),
            )
            .unwrap();
            assert!(matches!(outcome.rename, RenameDecision::CollisionSkip { .. }));
            assert_eq!(read(&workspace, "Widgets.py"), "x = 1\n");
            assert_eq!(outcome.status, ModuleStatus::Unchanged);
        }

        #[test]
        fn existing_target_is_not_overwritten() {
            let workspace = setup_workspace(&[
                ("MyHelpers.py", "a = 1\n"),
                ("my_helpers.py", "b = 2\n"),
            ]);
            let outcome = refactor_module(
                &workspace.path().join("MyHelpers.py"),
                workspace.path(),
                &RefactorOptions::default(),
            )
            .unwrap();
            assert!(matches!(outcome.rename, RenameDecision::TargetExists { .. }));
            assert_eq!(read(&workspace, "my_helpers.py"), "b = 2\n");
            assert_eq!(read(&workspace, "MyHelpers.py"), "a = 1\n");
        }
    }

    mod classes {
        use super::*;
        use crate::ops::ImportStyle;

        #[test]
        fn class_moves_with_its_closure() {
            let workspace = setup_workspace(&[(
                "models.py",
                "import os\nimport json\n\nROOT = os.getcwd()\n\n\ndef where():\n    return ROOT\n\n\nclass Config:\n    def path(self):\n        return where()\n\n\ndef dump(x):\n    return json.dumps(x)\n",
            )]);
            let outcome = refactor_module(
                &workspace.path().join("models.py"),
                workspace.path(),
                &RefactorOptions::default(),
            )
            .unwrap();

            assert_eq!(
                read(&workspace, "config.py"),
                "import os\n\nROOT = os.getcwd()\n\n\ndef where():\n    return ROOT\n\n\nclass Config:\n    def path(self):\n        return where()\n"
            );
            let origin = read(&workspace, "models.py");
            assert!(origin.starts_with("import os\nimport json\n"));
            assert!(!origin.contains("class Config"));
            assert!(!origin.contains("import Config"));
            assert_eq!(outcome.classes.len(), 1);
            match &outcome.classes[0].decision {
                ClassDecision::Extracted {
                    imports, siblings, ..
                } => {
                    assert_eq!(imports, &vec!["os".to_string()]);
                    assert_eq!(siblings, &vec!["ROOT".to_string(), "where".to_string()]);
                }
                other => panic!("unexpected decision {:?}", other),
            }
        }

        #[test]
        fn class_named_after_module_stays() {
            let workspace = setup_workspace(&[("widget.py", "class Widget:\n    pass\n")]);
            let outcome = refactor_module(
                &workspace.path().join("widget.py"),
                workspace.path(),
                &RefactorOptions::default(),
            )
            .unwrap();
            assert_eq!(outcome.classes[0].decision, ClassDecision::AlreadyHome);
            assert_eq!(outcome.status, ModuleStatus::Unchanged);
            assert_eq!(read(&workspace, "widget.py"), "class Widget:\n    pass\n");
        }

        #[test]
        fn case_collision_leaves_class_in_place() {
            let workspace = setup_workspace(&[("Gadget.py", "class Gadget:\n    pass\n")]);
            let outcome = refactor_module(
                &workspace.path().join("Gadget.py"),
                workspace.path(),
                &RefactorOptions::default(),
            )
            .unwrap();
            assert!(matches!(
                outcome.classes[0].decision,
                ClassDecision::CollisionSkip { .. }
            ));
            assert_eq!(read(&workspace, "Gadget.py"), "class Gadget:\n    pass\n");
        }

        #[test]
        fn referenced_class_is_imported_from_its_new_home() {
            let workspace = setup_workspace(&[(
                "shapes.py",
                "class Base:\n    pass\n\n\nclass Square(Base):\n    pass\n",
            )]);
            refactor_module(
                &workspace.path().join("shapes.py"),
                workspace.path(),
                &RefactorOptions::default(),
            )
            .unwrap();
            assert_eq!(
                read(&workspace, "square.py"),
                "from base import Base\n\n\nclass Square(Base):\n    pass\n"
            );
            assert_eq!(read(&workspace, "base.py"), "class Base:\n    pass\n");
            assert!(!workspace.path().join("shapes.py").exists());
        }

        #[test]
        fn relative_style_and_imported_siblings() {
            let workspace = setup_workspace(&[(
                "shapes.py",
                "LIMIT = 3\n\n\nclass Square:\n    size = LIMIT\n",
            )]);
            let options = RefactorOptions {
                import_style: ImportStyle::Relative,
                copy_siblings: false,
                delete_empty_modules: true,
            };
            refactor_module(&workspace.path().join("shapes.py"), workspace.path(), &options)
                .unwrap();
            assert_eq!(
                read(&workspace, "square.py"),
                "from .shapes import LIMIT\n\n\nclass Square:\n    size = LIMIT\n"
            );
            assert_eq!(read(&workspace, "shapes.py"), "LIMIT = 3\n");
        }

        #[test]
        fn guarded_import_block_travels_with_the_class() {
            let workspace = setup_workspace(&[(
                "models.py",
                "try:\n    import ujson as json\nexcept ImportError:\n    import json\n\n\nclass Foo:\n    def dump(self):\n        return json.dumps({})\n\n\nclass Bar:\n    pass\n",
            )]);
            let outcome = refactor_module(
                &workspace.path().join("models.py"),
                workspace.path(),
                &RefactorOptions::default(),
            )
            .unwrap();

            assert_eq!(
                read(&workspace, "foo.py"),
                "try:\n    import ujson as json\nexcept ImportError:\n    import json\n\n\nclass Foo:\n    def dump(self):\n        return json.dumps({})\n"
            );
            assert_eq!(read(&workspace, "bar.py"), "class Bar:\n    pass\n");
            match &outcome.classes[0].decision {
                ClassDecision::Extracted { siblings, .. } => {
                    assert_eq!(siblings, &vec!["json".to_string()]);
                }
                other => panic!("unexpected decision {:?}", other),
            }
        }

        #[test]
        fn type_checking_block_travels_with_its_guard() {
            let workspace = setup_workspace(&[(
                "models.py",
                "from typing import TYPE_CHECKING\n\nif TYPE_CHECKING:\n    from pkg.other import Thing\n\n\nclass Foo:\n    def f(self, t) -> Thing:\n        return t\n\n\nclass Bar:\n    pass\n",
            )]);
            refactor_module(
                &workspace.path().join("models.py"),
                workspace.path(),
                &RefactorOptions::default(),
            )
            .unwrap();

            assert_eq!(
                read(&workspace, "foo.py"),
                "from typing import TYPE_CHECKING\n\nif TYPE_CHECKING:\n    from pkg.other import Thing\n\n\nclass Foo:\n    def f(self, t) -> Thing:\n        return t\n"
            );
            assert_eq!(read(&workspace, "bar.py"), "class Bar:\n    pass\n");
        }

        #[test]
        fn blocks_are_copied_when_siblings_are_imported() {
            let workspace = setup_workspace(&[(
                "shapes.py",
                "from typing import TYPE_CHECKING\n\nif TYPE_CHECKING:\n    from pkg.units import Unit\n\nLIMIT = 3\n\n\nclass Square:\n    size = LIMIT\n\n    def unit(self) -> Unit:\n        pass\n",
            )]);
            let options = RefactorOptions {
                copy_siblings: false,
                ..RefactorOptions::default()
            };
            refactor_module(&workspace.path().join("shapes.py"), workspace.path(), &options)
                .unwrap();
            assert_eq!(
                read(&workspace, "square.py"),
                "from typing import TYPE_CHECKING\nfrom shapes import LIMIT\n\nif TYPE_CHECKING:\n    from pkg.units import Unit\n\n\nclass Square:\n    size = LIMIT\n\n    def unit(self) -> Unit:\n        pass\n"
            );
        }

        #[test]
        fn existing_target_is_merged() {
            let workspace = setup_workspace(&[
                ("shapes.py", "import math\n\n\nclass Circle:\n    r = math.pi\n"),
                ("circle.py", "def area(r):\n    return r * r\n"),
            ]);
            let outcome = refactor_module(
                &workspace.path().join("shapes.py"),
                workspace.path(),
                &RefactorOptions::default(),
            )
            .unwrap();
            assert_eq!(
                read(&workspace, "circle.py"),
                "import math\n\n\ndef area(r):\n    return r * r\n\n\nclass Circle:\n    r = math.pi\n"
            );
            assert!(matches!(
                outcome.classes[0].decision,
                ClassDecision::Extracted { merged: true, .. }
            ));
        }

        #[test]
        fn emptied_module_can_be_kept() {
            let workspace = setup_workspace(&[("shapes.py", "class Circle:\n    pass\n")]);
            let options = RefactorOptions {
                delete_empty_modules: false,
                ..RefactorOptions::default()
            };
            let outcome =
                refactor_module(&workspace.path().join("shapes.py"), workspace.path(), &options)
                    .unwrap();
            assert_eq!(outcome.status, ModuleStatus::Refactored);
            assert_eq!(read(&workspace, "shapes.py"), "");
        }

        #[test]
        fn package_init_keeps_reexports() {
            let workspace = setup_workspace(&[("pkg/__init__.py", "class Circle:\n    pass\n")]);
            refactor_module(
                &workspace.path().join("pkg/__init__.py"),
                workspace.path(),
                &RefactorOptions::default(),
            )
            .unwrap();
            assert_eq!(read(&workspace, "pkg/__init__.py"), "from circle import Circle\n");
            assert_eq!(read(&workspace, "pkg/circle.py"), "class Circle:\n    pass\n");
        }
    }
}
