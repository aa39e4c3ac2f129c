//! mofc-schema: the CIM schema model produced by the MOF compiler.
//!
//! Every type here is plain data: the compiler builds and validates these
//! values, repositories store them. Names are compared case-insensitively
//! (see [`Named`] and [`find_named`]) but keep their declared spelling.
//!
//! The [`Display`](std::fmt::Display) impls of [`QualifierDeclaration`],
//! [`ClassDefinition`] and [`InstanceDefinition`] render MOF source text
//! that compiles back to a structurally identical value.

pub mod class;
pub mod instance;
mod mof;
pub mod qualifier;
pub mod types;
pub mod value;

pub use class::{ClassDefinition, Method, Parameter, Property};
pub use instance::{InstanceDefinition, InstancePath, PropertyValue};
pub use qualifier::{Flavor, FlavorSet, Qualifier, QualifierDeclaration, Scope};
pub use types::CimType;
pub use value::CimValue;

/// Anything addressed by a case-insensitive MOF name.
pub trait Named {
    fn name(&self) -> &str;
}

/// Find an element by name, ignoring ASCII case.
pub fn find_named<'a, T: Named>(items: &'a [T], name: &str) -> Option<&'a T> {
    items.iter().find(|i| i.name().eq_ignore_ascii_case(name))
}

/// Position of an element by name, ignoring ASCII case.
pub fn position_named<T: Named>(items: &[T], name: &str) -> Option<usize> {
    items.iter().position(|i| i.name().eq_ignore_ascii_case(name))
}
