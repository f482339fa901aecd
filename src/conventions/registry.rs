//! Fixture registry: which fixtures are defined, and where.
//!
//! The classifiers only ever read the registry; population happens either by
//! the host handing over its own knowledge or by scanning a workspace here.

use super::decorators::{
    extract_fixture_name_from_decorator, is_fixture_decorator, FixtureFlavors,
};
use super::scope::ModuleScope;
use dashmap::DashMap;
use glob::Pattern;
use rayon::prelude::*;
use rustpython_parser::ast::Stmt;
use rustpython_parser::{parse, Mode};
use std::path::{Path, PathBuf};
use tracing::{debug, error, info, warn};
use walkdir::WalkDir;

/// One fixture-defining function known to the registry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FixtureDefinition {
    /// The name tests request the fixture by. Honors a `name="..."` alias
    /// on the decorator; otherwise the function's own name.
    pub name: String,
    /// The Python function's own name.
    pub function_name: String,
    /// Source file the fixture is defined in.
    pub file_path: PathBuf,
    /// 1-based line of the definition.
    pub line: usize,
}

/// Mapping from fixture name to every definition registered under it.
///
/// `DashMap` keeps reads lock-free while the parallel workspace scan inserts.
#[derive(Debug, Default)]
pub struct FixtureRegistry {
    pub definitions: DashMap<String, Vec<FixtureDefinition>>,
}

impl FixtureRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// All definitions registered under a fixture name.
    pub fn definitions_for(&self, fixture_name: &str) -> Vec<FixtureDefinition> {
        self.definitions
            .get(fixture_name)
            .map(|entry| entry.value().clone())
            .unwrap_or_default()
    }

    /// Parse one Python file and register every fixture definition in it.
    ///
    /// Parse failures are logged and leave the registry unchanged.
    pub fn analyze_file(&self, file_path: PathBuf, content: &str) {
        debug!("Analyzing file for fixtures: {:?}", file_path);

        let parsed = match parse(content, Mode::Module, "") {
            Ok(ast) => ast,
            Err(e) => {
                error!("Failed to parse Python file {:?}: {}", file_path, e);
                return;
            }
        };

        let rustpython_parser::ast::Mod::Module(module) = parsed else {
            return;
        };

        // The scope table backs bare `@fixture` decorators imported from pytest.
        let scope = ModuleScope::from_module(&module.body);
        let line_index = build_line_index(content);

        for stmt in &module.body {
            self.visit_stmt(stmt, &scope, &file_path, &line_index);
        }
    }

    fn visit_stmt(&self, stmt: &Stmt, scope: &ModuleScope, file_path: &Path, line_index: &[usize]) {
        let flavors = FixtureFlavors::default();

        let (func_name, decorator_list, offset) = match stmt {
            Stmt::FunctionDef(func_def) => (
                func_def.name.as_str(),
                &func_def.decorator_list,
                func_def.range.start().to_usize(),
            ),
            Stmt::AsyncFunctionDef(func_def) => (
                func_def.name.as_str(),
                &func_def.decorator_list,
                func_def.range.start().to_usize(),
            ),
            Stmt::ClassDef(class_def) => {
                // Fixtures can live on test classes; nothing else nests them.
                for class_stmt in &class_def.body {
                    self.visit_stmt(class_stmt, scope, file_path, line_index);
                }
                return;
            }
            _ => return,
        };

        let fixture_decorator = decorator_list
            .iter()
            .find(|decorator| is_fixture_decorator(decorator, flavors, scope));

        if let Some(decorator) = fixture_decorator {
            let fixture_name = extract_fixture_name_from_decorator(decorator, flavors, scope)
                .unwrap_or_else(|| func_name.to_string());
            let line = line_from_offset(line_index, offset);

            info!(
                "Found fixture definition: {} (function: {}) at {:?}:{}",
                fixture_name, func_name, file_path, line
            );

            self.definitions
                .entry(fixture_name.clone())
                .or_default()
                .push(FixtureDefinition {
                    name: fixture_name,
                    function_name: func_name.to_string(),
                    file_path: file_path.to_path_buf(),
                    line,
                });
        }
    }

    /// Directories that never contain workspace test files.
    const SKIP_DIRECTORIES: &'static [&'static str] = &[
        ".git",
        ".hg",
        ".svn",
        ".venv",
        "venv",
        "env",
        ".env",
        "__pycache__",
        ".pytest_cache",
        ".mypy_cache",
        ".ruff_cache",
        ".tox",
        ".nox",
        "build",
        "dist",
        ".eggs",
        "node_modules",
        "target",
        ".idea",
        ".vscode",
        "site-packages",
    ];

    pub(crate) fn should_skip_directory(dir_name: &str) -> bool {
        Self::SKIP_DIRECTORIES.contains(&dir_name) || dir_name.ends_with(".egg-info")
    }

    /// Scan a workspace for conftest and test files and register their fixtures.
    pub fn scan_workspace(&self, root_path: &Path) {
        self.scan_workspace_with_excludes(root_path, &[]);
    }

    /// Scan a workspace, skipping paths matching any of the exclude patterns.
    /// Patterns are matched against paths relative to the workspace root.
    pub fn scan_workspace_with_excludes(&self, root_path: &Path, exclude_patterns: &[Pattern]) {
        info!("Scanning workspace for fixtures: {:?}", root_path);

        if !root_path.exists() {
            warn!(
                "Workspace path does not exist, skipping scan: {:?}",
                root_path
            );
            return;
        }

        // Phase 1: collect candidate files sequentially.
        let mut files_to_process: Vec<PathBuf> = Vec::new();

        let walker = WalkDir::new(root_path).into_iter().filter_entry(|entry| {
            if entry.file_type().is_file() {
                return true;
            }
            match entry.file_name().to_str() {
                Some(dir_name) => !Self::should_skip_directory(dir_name),
                None => true,
            }
        });

        for entry in walker {
            let entry = match entry {
                Ok(e) => e,
                Err(err) => {
                    debug!("Error during workspace scan: {}", err);
                    continue;
                }
            };

            let path = entry.path();

            if !exclude_patterns.is_empty() {
                if let Ok(relative_path) = path.strip_prefix(root_path) {
                    let relative_str = relative_path.to_string_lossy();
                    if exclude_patterns.iter().any(|p| p.matches(&relative_str)) {
                        debug!("Skipping excluded path: {:?}", path);
                        continue;
                    }
                }
            }

            if let Some(filename) = path.file_name().and_then(|n| n.to_str()) {
                if filename == "conftest.py"
                    || filename.starts_with("test_") && filename.ends_with(".py")
                    || filename.ends_with("_test.py")
                {
                    files_to_process.push(path.to_path_buf());
                }
            }
        }

        info!(
            "Found {} test/conftest files to process",
            files_to_process.len()
        );

        // Phase 2: parse and register in parallel.
        files_to_process.par_iter().for_each(|path| {
            match std::fs::read_to_string(path) {
                Ok(content) => self.analyze_file(path.clone(), &content),
                Err(err) => error!("Failed to read file {:?}: {}", path, err),
            }
        });

        info!("Total fixtures registered: {}", self.definitions.len());
    }
}

/// Byte offsets of each line start, for O(log n) offset-to-line lookups.
fn build_line_index(content: &str) -> Vec<usize> {
    let mut line_index = Vec::with_capacity(content.len() / 30);
    line_index.push(0);
    for (i, c) in content.char_indices() {
        if c == '\n' {
            line_index.push(i + 1);
        }
    }
    line_index
}

/// 1-based line number for a byte offset.
fn line_from_offset(line_index: &[usize], offset: usize) -> usize {
    match line_index.binary_search(&offset) {
        Ok(line) => line + 1,
        Err(line) => line,
    }
}
