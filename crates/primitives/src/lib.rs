//! Core value types for the design model: element identifiers, property values,
//! structures, and by-name element references.

/// Identifier types for elements and modules.
pub mod ids;
/// Property values, structures and element references.
pub mod value;

pub use ids::{ElementId, ModuleId};
pub use value::{ElementRef, PropertyValue, Structure, ValueHop, split_qualified};
