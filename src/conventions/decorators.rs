//! Decorator shape matching for pytest fixtures and markers.
//!
//! Pytest spells the same convention several ways: `@pytest.fixture`,
//! `@pytest.fixture(scope="module")`, `@fixture` after a direct import, and
//! the `@pytest.mark.*` family with or without call parentheses. Every
//! matcher here reduces a decorator expression to one of the shapes below and
//! answers with a plain boolean; unmatched shapes are false, never an error.

use super::scope::SymbolResolver;
use rustpython_parser::ast::{Constant, Expr, ExprAttribute, ExprCall, ExprName};
use rustpython_parser::text_size::TextRange;

/// The two decorator shapes left after unwrapping an optional call.
enum DecoratorShape<'a> {
    /// `@fixture` — a bare imported name.
    Plain(&'a ExprName),
    /// `@pytest.fixture` — an attribute chain.
    Dotted(&'a ExprAttribute),
}

/// Unwrap at most one enclosing call, then classify what remains.
///
/// `@pytest.fixture(scope="module")` and `@pytest.fixture` both classify as
/// the dotted shape; literals and other expressions classify as nothing.
fn classify(decorator: &Expr) -> Option<DecoratorShape<'_>> {
    let target = match decorator {
        Expr::Call(call) => &*call.func,
        other => other,
    };
    match target {
        Expr::Name(name) => Some(DecoratorShape::Plain(name)),
        Expr::Attribute(attr) => Some(DecoratorShape::Dotted(attr)),
        _ => None,
    }
}

/// True when the expression is the `mark` receiver of a marker chain:
/// attribute `mark` on a plain `pytest` reference. A bare `mark` name does
/// not match — its origin cannot be confirmed from the decorator alone.
fn is_mark_receiver(expr: &Expr) -> bool {
    match expr {
        Expr::Attribute(inner) => {
            inner.attr.as_str() == "mark"
                && matches!(&*inner.value, Expr::Name(name) if name.id.as_str() == "pytest")
        }
        _ => false,
    }
}

/// Checks for `@pytest.mark.usefixtures(...)`.
///
/// The marker is only meaningful with arguments, so the call is required;
/// a bare `@pytest.mark.usefixtures` does not match.
pub fn is_usefixtures_marker(decorator: &Expr) -> bool {
    let Expr::Call(call) = decorator else {
        return false;
    };
    match &*call.func {
        Expr::Attribute(attr) => {
            attr.attr.as_str() == "usefixtures" && is_mark_receiver(&attr.value)
        }
        _ => false,
    }
}

/// Checks for any `@pytest.mark.X` or `@pytest.mark.X(...)` marker.
pub fn is_pytest_marker(decorator: &Expr) -> bool {
    match classify(decorator) {
        Some(DecoratorShape::Dotted(attr)) => is_mark_receiver(&attr.value),
        _ => false,
    }
}

/// Which fixture-defining decorator names to accept.
///
/// `yield_fixture` is the long-deprecated pre-3.0 spelling; hosts that only
/// target modern pytest can switch it off.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FixtureFlavors {
    pub fixture: bool,
    pub yield_fixture: bool,
}

impl Default for FixtureFlavors {
    fn default() -> Self {
        Self {
            fixture: true,
            yield_fixture: true,
        }
    }
}

impl FixtureFlavors {
    fn accepts(self, name: &str) -> bool {
        match name {
            "fixture" => self.fixture,
            "yield_fixture" => self.yield_fixture,
            _ => false,
        }
    }
}

/// Checks whether a decorator defines a pytest fixture.
///
/// Handles all three surface syntaxes:
/// - `@pytest.fixture` / `@pytest.yield_fixture` (attribute)
/// - `@fixture` when the name resolves to module `pytest` (bare import)
/// - either of the above wrapped in a call, e.g. `@pytest.fixture(scope=...)`
///
/// The resolver supplies the originating module for bare names; a same-named
/// decorator imported from elsewhere does not match.
pub fn is_fixture_decorator(
    decorator: &Expr,
    flavors: FixtureFlavors,
    resolver: &impl SymbolResolver,
) -> bool {
    match classify(decorator) {
        Some(DecoratorShape::Plain(name)) => {
            flavors.accepts(name.id.as_str())
                && resolver
                    .defining_module(name.id.as_str())
                    .is_some_and(|module| module == "pytest")
        }
        Some(DecoratorShape::Dotted(attr)) => {
            flavors.accepts(attr.attr.as_str())
                && matches!(&*attr.value, Expr::Name(recv) if recv.id.as_str() == "pytest")
        }
        None => false,
    }
}

/// Extracts the fixture's registered name from a `name="..."` keyword, if the
/// decorator is a fixture decorator called with one.
pub fn extract_fixture_name_from_decorator(
    decorator: &Expr,
    flavors: FixtureFlavors,
    resolver: &impl SymbolResolver,
) -> Option<String> {
    let Expr::Call(call) = decorator else {
        return None;
    };
    if !is_fixture_decorator(decorator, flavors, resolver) {
        return None;
    }
    string_keyword(call, "name")
}

/// Extracts the fixture names referenced by `@pytest.mark.usefixtures("a", "b")`.
/// Returns each name together with its source range.
pub fn extract_usefixtures_names(decorator: &Expr) -> Vec<(String, TextRange)> {
    if !is_usefixtures_marker(decorator) {
        return Vec::new();
    }
    let Expr::Call(call) = decorator else {
        return Vec::new();
    };
    call.args
        .iter()
        .filter_map(|arg| {
            if let Expr::Constant(constant) = arg {
                if let Constant::Str(s) = &constant.value {
                    return Some((s.to_string(), constant.range));
                }
            }
            None
        })
        .collect()
}

/// Checks for `@pytest.mark.parametrize` with or without call parentheses.
pub fn is_parametrize_decorator(decorator: &Expr) -> bool {
    match classify(decorator) {
        Some(DecoratorShape::Dotted(attr)) => {
            attr.attr.as_str() == "parametrize" && is_mark_receiver(&attr.value)
        }
        _ => false,
    }
}

/// Extracts fixture names referenced through indirect parametrization.
///
/// Handles:
/// - `@pytest.mark.parametrize("fix", [...], indirect=True)`
/// - `@pytest.mark.parametrize("fix1,fix2", [...], indirect=True)`
/// - `@pytest.mark.parametrize("fix1,fix2", [...], indirect=["fix1"])`
pub fn extract_parametrize_indirect_fixtures(decorator: &Expr) -> Vec<(String, TextRange)> {
    let Expr::Call(call) = decorator else {
        return Vec::new();
    };
    if !is_parametrize_decorator(decorator) {
        return Vec::new();
    }

    let Some(indirect) = keyword_value(call, "indirect") else {
        return Vec::new();
    };

    // First positional argument names the parameters, comma-separated.
    let Some(Expr::Constant(param_const)) = call.args.first() else {
        return Vec::new();
    };
    let Constant::Str(param_str) = &param_const.value else {
        return Vec::new();
    };
    let param_names: Vec<&str> = param_str.split(',').map(str::trim).collect();

    match indirect {
        Expr::Constant(constant) if matches!(constant.value, Constant::Bool(true)) => param_names
            .into_iter()
            .map(|name| (name.to_string(), param_const.range))
            .collect(),
        Expr::List(list) => list
            .elts
            .iter()
            .filter_map(|elt| {
                if let Expr::Constant(constant) = elt {
                    if let Constant::Str(s) = &constant.value {
                        if param_names.contains(&s.as_str()) {
                            return Some((s.to_string(), constant.range));
                        }
                    }
                }
                None
            })
            .collect(),
        _ => Vec::new(),
    }
}

fn keyword_value<'a>(call: &'a ExprCall, keyword: &str) -> Option<&'a Expr> {
    call.keywords.iter().find_map(|kw| {
        if kw.arg.as_ref().is_some_and(|arg| arg.as_str() == keyword) {
            Some(&kw.value)
        } else {
            None
        }
    })
}

fn string_keyword(call: &ExprCall, keyword: &str) -> Option<String> {
    match keyword_value(call, keyword)? {
        Expr::Constant(constant) => match &constant.value {
            Constant::Str(s) => Some(s.to_string()),
            _ => None,
        },
        _ => None,
    }
}
