//! Tests for the cross-module fixture identity check.

use pytest_conventions::{same_module, FixtureRegistry, ModuleResolver};
use rustpython_parser::ast::{Mod, Stmt, StmtImportFrom};
use rustpython_parser::{parse, Mode};
use std::fs;
use std::path::Path;
use tempfile::TempDir;

fn write_file(path: &Path, content: &str) {
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, content).unwrap();
}

fn parse_import(code: &str) -> StmtImportFrom {
    let parsed = parse(code, Mode::Module, "").unwrap();
    let Mod::Module(module) = parsed else {
        panic!("expected a module");
    };
    match module.body.into_iter().next() {
        Some(Stmt::ImportFrom(import_from)) => import_from,
        other => panic!("expected an import-from statement, got {other:?}"),
    }
}

const FIXTURES_PY: &str = "import pytest\n\n@pytest.fixture\ndef db_fixture():\n    return object()\n";

/// Workspace with pkg/fixtures.py defining db_fixture, registered by scanning
/// the file directly (it is not a test file, so the host hands it over).
fn workspace_with_fixture() -> (TempDir, FixtureRegistry) {
    let tmp = TempDir::new().unwrap();
    let root = tmp.path();
    write_file(&root.join("pkg/__init__.py"), "");
    write_file(&root.join("pkg/fixtures.py"), FIXTURES_PY);

    let registry = FixtureRegistry::new();
    registry.analyze_file(root.join("pkg/fixtures.py"), FIXTURES_PY);
    (tmp, registry)
}

#[test]
fn test_import_from_defining_module() {
    let (tmp, registry) = workspace_with_fixture();
    let root = tmp.path();
    let resolver = ModuleResolver::new(root);

    let import = parse_import("from pkg.fixtures import db_fixture\n");
    assert!(same_module(
        &registry,
        &import,
        "db_fixture",
        &root.join("tests/test_db.py"),
        &resolver,
    ));
}

#[test]
fn test_import_from_shadowing_module() {
    let (tmp, registry) = workspace_with_fixture();
    let root = tmp.path();
    // A same-named fixture living elsewhere; importing it is not the same object.
    write_file(&root.join("other/__init__.py"), "");
    write_file(&root.join("other/fixtures.py"), FIXTURES_PY);
    let resolver = ModuleResolver::new(root);

    let import = parse_import("from other.fixtures import db_fixture\n");
    assert!(!same_module(
        &registry,
        &import,
        "db_fixture",
        &root.join("tests/test_db.py"),
        &resolver,
    ));
}

#[test]
fn test_relative_import_from_defining_module() {
    let (tmp, registry) = workspace_with_fixture();
    let root = tmp.path();
    let resolver = ModuleResolver::new(root);

    let import = parse_import("from .fixtures import db_fixture\n");
    assert!(same_module(
        &registry,
        &import,
        "db_fixture",
        &root.join("pkg/test_db.py"),
        &resolver,
    ));
}

#[test]
fn test_import_binding_via_alias() {
    let (tmp, registry) = workspace_with_fixture();
    let root = tmp.path();
    let resolver = ModuleResolver::new(root);

    // The alias binds the requested name; the underlying symbol differs, but
    // the file comparison is what decides identity.
    let import = parse_import("from pkg.fixtures import db_fixture as db\n");
    assert!(same_module(
        &registry,
        &import,
        "db",
        &root.join("tests/test_db.py"),
        &resolver,
    ));
}

#[test]
fn test_import_not_binding_fixture_name() {
    let (tmp, registry) = workspace_with_fixture();
    let root = tmp.path();
    let resolver = ModuleResolver::new(root);

    let import = parse_import("from pkg.fixtures import something_else\n");
    assert!(!same_module(
        &registry,
        &import,
        "db_fixture",
        &root.join("tests/test_db.py"),
        &resolver,
    ));
}

#[test]
fn test_unresolvable_import_is_no_match() {
    let (tmp, registry) = workspace_with_fixture();
    let root = tmp.path();
    let resolver = ModuleResolver::new(root);

    let import = parse_import("from missing.module import db_fixture\n");
    assert!(!same_module(
        &registry,
        &import,
        "db_fixture",
        &root.join("tests/test_db.py"),
        &resolver,
    ));
}

#[test]
fn test_unknown_fixture_is_no_match() {
    let (tmp, registry) = workspace_with_fixture();
    let root = tmp.path();
    let resolver = ModuleResolver::new(root);

    let import = parse_import("from pkg.fixtures import unknown\n");
    assert!(!same_module(
        &registry,
        &import,
        "unknown",
        &root.join("tests/test_db.py"),
        &resolver,
    ));
}
