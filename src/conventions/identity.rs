//! Cross-module fixture identity.
//!
//! A conftest may re-export a fixture (`from pkg.fixtures import db_fixture`)
//! that the registry already knows under the same name. Whether the import
//! refers to that same fixture object, and not a same-named shadow from
//! elsewhere, is decided by resolving both sides to their defining source
//! file and comparing.

use super::registry::FixtureRegistry;
use rustpython_parser::ast::StmtImportFrom;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Resolves Python module references to source files on disk.
///
/// Absolute imports resolve against the workspace root; relative imports
/// ascend from the importing file's package directory. Nothing here consults
/// `sys.path` semantics beyond that, which is all a single-workspace host
/// needs.
#[derive(Debug, Clone)]
pub struct ModuleResolver {
    root: PathBuf,
}

impl ModuleResolver {
    /// Create a resolver rooted at the workspace directory.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Resolve a `from <module> import ...` reference to the file it names.
    ///
    /// `module` is the dotted module text (absent for `from . import x`),
    /// `level` the number of leading dots, and `importing_file` the file the
    /// import statement lives in. Returns `None` whenever the reference does
    /// not resolve to an existing `.py` file.
    pub fn resolve(
        &self,
        module: Option<&str>,
        level: u32,
        importing_file: &Path,
    ) -> Option<PathBuf> {
        let base = if level == 0 {
            self.root.clone()
        } else {
            // One dot means the importing file's own package; each further
            // dot ascends one package.
            let mut dir = importing_file.parent()?.to_path_buf();
            for _ in 1..level {
                dir = dir.parent()?.to_path_buf();
            }
            dir
        };

        let mut path = base;
        if let Some(module) = module {
            let parts: Vec<&str> = module.split('.').collect();
            // Reject traversal components and empty segments outright.
            if parts
                .iter()
                .any(|p| p.contains("..") || p.contains('\0') || p.is_empty())
            {
                return None;
            }
            for part in &parts {
                path.push(part);
            }
        } else if level == 0 {
            // `from import` without module or dots cannot be parsed, but be
            // explicit: there is nothing to resolve.
            return None;
        }

        // A dotted reference is either a module file or a package directory.
        if module.is_some() {
            let py_file = path.with_extension("py");
            if py_file.is_file() {
                return Some(py_file);
            }
        }
        let init_file = path.join("__init__.py");
        if init_file.is_file() {
            return Some(init_file);
        }

        debug!("Could not resolve module {:?} (level {})", module, level);
        None
    }
}

/// Checks whether `fixture_name`, imported by `import_node` in
/// `importing_file`, is the same fixture object as one already registered
/// under that name.
///
/// Both sides are resolved to their defining source file: the registered
/// fixture's file versus the file the import's module reference resolves to.
/// Any pair that matches makes the answer true; a pair that fails to resolve
/// is a no-match for that pair, never an error.
pub fn same_module(
    registry: &FixtureRegistry,
    import_node: &StmtImportFrom,
    fixture_name: &str,
    importing_file: &Path,
    resolver: &ModuleResolver,
) -> bool {
    // Only imports that actually bind the fixture name are relevant. An
    // `as` rename binds the local name while the registry knows the fixture
    // by its source symbol, so both names are candidate registry keys.
    let mut candidate_names: Vec<&str> = import_node
        .names
        .iter()
        .filter(|alias| alias.asname.as_ref().unwrap_or(&alias.name).as_str() == fixture_name)
        .map(|alias| alias.name.as_str())
        .collect();
    if candidate_names.is_empty() {
        debug!(
            "Import does not bind fixture name {}, skipping identity check",
            fixture_name
        );
        return false;
    }
    if !candidate_names.contains(&fixture_name) {
        candidate_names.push(fixture_name);
    }

    let level = import_node.level.as_ref().map_or(0, |level| level.to_u32());
    let module = import_node.module.as_ref().map(|m| m.as_str());

    let Some(imported_file) = resolver.resolve(module, level, importing_file) else {
        return false;
    };
    let imported_file = canonical(&imported_file);

    for name in candidate_names {
        for definition in registry.definitions_for(name) {
            if canonical(&definition.file_path) == imported_file {
                debug!(
                    "Fixture {} imported from its defining file {:?}",
                    fixture_name, imported_file
                );
                return true;
            }
        }
    }

    false
}

/// Canonicalize for comparison, falling back to the path as given.
fn canonical(path: &Path) -> PathBuf {
    path.canonicalize().unwrap_or_else(|_| path.to_path_buf())
}
