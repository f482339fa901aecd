pub mod conventions;

pub use conventions::{
    can_use_fixture, extract_fixture_name_from_decorator, extract_parametrize_indirect_fixtures,
    extract_usefixtures_names, is_fixture_decorator, is_parametrize_decorator, is_pytest_marker,
    is_usefixtures_marker, same_module, FixtureDefinition, FixtureFlavors, FixtureRegistry,
    ModuleResolver, ModuleScope, SymbolResolver,
};
