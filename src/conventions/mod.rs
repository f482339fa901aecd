//! Recognition of pytest conventions in Python source.
//!
//! This module provides the syntactic classification a static-analysis tool
//! needs to avoid false positives on pytest code:
//! - Matching the decorator shapes through which fixtures and markers are
//!   spelled (`@pytest.fixture`, `@fixture`, `@pytest.mark.usefixtures(...)`)
//! - Deciding whether a function may legitimately consume fixtures by name
//! - Building a registry of fixture definitions from a workspace
//! - Checking whether an imported fixture is the same object as a registered one

pub mod decorators;
mod eligibility;
mod identity;
mod registry;
mod scope;

pub use decorators::{
    extract_fixture_name_from_decorator, extract_parametrize_indirect_fixtures,
    extract_usefixtures_names, is_fixture_decorator, is_parametrize_decorator, is_pytest_marker,
    is_usefixtures_marker, FixtureFlavors,
};
pub use eligibility::can_use_fixture;
pub use identity::{same_module, ModuleResolver};
pub use registry::{FixtureDefinition, FixtureRegistry};
pub use scope::{ModuleScope, SymbolResolver};
