//! Schema registry for the design model.
//!
//! The registry is a static catalog of element kinds, their properties and
//! containment slots, and the structure layouts used inside property values.
//! It is built once through [`SchemaBuilder`], frozen into a
//! [`SchemaRegistry`], and shared read-only (typically as `Arc`) by every
//! session and design that uses it.

/// Definition types for elements, properties, slots and structures.
pub mod defn;
/// Build and lookup errors.
pub mod error;
/// Registry builder and frozen registry.
pub mod registry;
/// Value validation against property definitions.
pub mod validate;

pub use defn::{
	Cardinality, ContentCheck, ContentValidator, ElementDefn, EXTENDS_PROP, PropertyDefn,
	PropertyFlags, PropertyType, STYLE_PROP, SlotDefn, StructDefn, ValueValidator,
};
pub use error::{SchemaError, ValueError};
pub use registry::{SchemaBuilder, SchemaRegistry};
pub use validate::{check_required_members, validate_item, validate_member_write, validate_value};
