//! Module-level name resolution.
//!
//! A bare `@fixture` decorator is only a pytest fixture if the name was
//! actually imported from pytest. The matchers receive that knowledge through
//! [`SymbolResolver`], an injected lookup from a name to the module it was
//! imported from, so they stay testable without a full symbol table.

use rustpython_parser::ast::{Expr, Stmt};
use std::collections::HashMap;

/// Lookup capability mapping a module-level name to its originating module.
///
/// Returns `None` for names that are undefined or defined locally (functions,
/// classes, assignments) rather than imported. Callers treat `None` as
/// "not a pytest name".
pub trait SymbolResolver {
    fn defining_module(&self, name: &str) -> Option<String>;
}

/// Any closure from name to module name is a resolver. Convenient in tests
/// and for hosts that already maintain their own symbol tables.
impl<F> SymbolResolver for F
where
    F: Fn(&str) -> Option<String>,
{
    fn defining_module(&self, name: &str) -> Option<String> {
        self(name)
    }
}

/// Global symbol table for one module, built from its parsed body.
///
/// Records where each top-level name came from: `Some(module)` for imported
/// names, `None` for local definitions. The first binding for a name wins.
#[derive(Debug, Clone, Default)]
pub struct ModuleScope {
    bindings: HashMap<String, Option<String>>,
}

impl ModuleScope {
    /// Build the scope table from a module's top-level statements.
    #[must_use]
    pub fn from_module(body: &[Stmt]) -> Self {
        let mut scope = Self::default();
        for stmt in body {
            scope.record_stmt(stmt);
        }
        scope
    }

    fn record_stmt(&mut self, stmt: &Stmt) {
        match stmt {
            Stmt::Import(import_stmt) => {
                for alias in &import_stmt.names {
                    // `import pytest` binds "pytest"; `import pytest as pt` binds "pt".
                    // Without an alias a dotted import binds its first segment.
                    let bound = match &alias.asname {
                        Some(asname) => asname.as_str(),
                        None => alias.name.split('.').next().unwrap_or(alias.name.as_str()),
                    };
                    self.bind(bound, Some(alias.name.to_string()));
                }
            }
            Stmt::ImportFrom(import_from) => {
                let module = import_from.module.as_ref().map(|m| m.to_string());
                for alias in &import_from.names {
                    let bound = alias.asname.as_ref().unwrap_or(&alias.name);
                    self.bind(bound.as_str(), module.clone());
                }
            }
            Stmt::FunctionDef(func_def) => self.bind(func_def.name.as_str(), None),
            Stmt::AsyncFunctionDef(func_def) => self.bind(func_def.name.as_str(), None),
            Stmt::ClassDef(class_def) => self.bind(class_def.name.as_str(), None),
            Stmt::Assign(assign) => {
                for target in &assign.targets {
                    self.record_target(target);
                }
            }
            Stmt::AnnAssign(ann_assign) => self.record_target(&ann_assign.target),
            _ => {}
        }
    }

    fn record_target(&mut self, target: &Expr) {
        match target {
            Expr::Name(name) => self.bind(name.id.as_str(), None),
            Expr::Tuple(tuple) => {
                for elt in &tuple.elts {
                    self.record_target(elt);
                }
            }
            Expr::List(list) => {
                for elt in &list.elts {
                    self.record_target(elt);
                }
            }
            _ => {}
        }
    }

    fn bind(&mut self, name: &str, module: Option<String>) {
        self.bindings.entry(name.to_string()).or_insert(module);
    }
}

impl SymbolResolver for ModuleScope {
    fn defining_module(&self, name: &str) -> Option<String> {
        self.bindings.get(name).and_then(Clone::clone)
    }
}
