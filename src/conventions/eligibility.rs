//! Deciding whether a function may consume fixtures as parameters.

use super::decorators::{is_fixture_decorator, is_usefixtures_marker, FixtureFlavors};
use super::scope::SymbolResolver;
use rustpython_parser::ast::Stmt;

/// Returns true when a function definition may legitimately reference fixture
/// names as parameters, so the host should not flag them as undefined.
///
/// A function qualifies when:
/// 1. its name follows pytest's discovery convention (`test_*` or `*_test`), or
/// 2. any decorator is `@pytest.mark.usefixtures(...)` or a fixture decorator
///    (fixtures can depend on other fixtures).
///
/// Non-function statements never qualify. The resolver backs the bare
/// `@fixture` case; pass a closure returning `None` when no symbol table is
/// available.
pub fn can_use_fixture(stmt: &Stmt, resolver: &impl SymbolResolver) -> bool {
    let (name, decorator_list) = match stmt {
        Stmt::FunctionDef(func_def) => (func_def.name.as_str(), &func_def.decorator_list),
        Stmt::AsyncFunctionDef(func_def) => (func_def.name.as_str(), &func_def.decorator_list),
        _ => return false,
    };

    if name.starts_with("test_") || name.ends_with("_test") {
        return true;
    }

    decorator_list.iter().any(|decorator| {
        is_usefixtures_marker(decorator)
            || is_fixture_decorator(decorator, FixtureFlavors::default(), resolver)
    })
}
