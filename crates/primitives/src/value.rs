//! Property values stored on design elements.
//!
//! A property that has never been written has no value at all; that is
//! distinct from [`PropertyValue::Null`], which is an explicit null written
//! into a property whose definition allows it.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::ids::ElementId;


/// Separator between a library name space and an element name.
pub const NAMESPACE_SEPARATOR: char = '.';

/// The value of a property or structure member.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum PropertyValue {
	/// Explicit null.
	Null,
	/// Boolean value.
	Bool(bool),
	/// Integer value.
	Int(i64),
	/// Floating point value.
	Float(f64),
	/// String value (also used for choice values).
	String(String),
	/// Reference to another element by name.
	Ref(ElementRef),
	/// Embedded structure.
	Structure(Structure),
	/// List of values; list-typed properties and members always hold this variant.
	List(Vec<PropertyValue>),
	/// Owned sub-element held in an element-typed property.
	Element(ElementId),
}

impl PropertyValue {
	/// Returns the boolean value if this is a `Bool` variant.
	pub fn as_bool(&self) -> Option<bool> {
		match self {
			PropertyValue::Bool(v) => Some(*v),
			_ => None,
		}
	}

	/// Returns the integer value if this is an `Int` variant.
	pub fn as_int(&self) -> Option<i64> {
		match self {
			PropertyValue::Int(v) => Some(*v),
			_ => None,
		}
	}

	/// Returns the numeric value of an `Int` or `Float` variant.
	pub fn as_float(&self) -> Option<f64> {
		match self {
			PropertyValue::Float(v) => Some(*v),
			PropertyValue::Int(v) => Some(*v as f64),
			_ => None,
		}
	}

	/// Returns the string value if this is a `String` variant.
	pub fn as_str(&self) -> Option<&str> {
		match self {
			PropertyValue::String(v) => Some(v),
			_ => None,
		}
	}

	/// Returns the element reference if this is a `Ref` variant.
	pub fn as_ref_value(&self) -> Option<&ElementRef> {
		match self {
			PropertyValue::Ref(v) => Some(v),
			_ => None,
		}
	}

	/// Returns the structure if this is a `Structure` variant.
	pub fn as_structure(&self) -> Option<&Structure> {
		match self {
			PropertyValue::Structure(v) => Some(v),
			_ => None,
		}
	}

	/// Returns the structure mutably if this is a `Structure` variant.
	pub fn as_structure_mut(&mut self) -> Option<&mut Structure> {
		match self {
			PropertyValue::Structure(v) => Some(v),
			_ => None,
		}
	}

	/// Returns the list items if this is a `List` variant.
	pub fn as_list(&self) -> Option<&[PropertyValue]> {
		match self {
			PropertyValue::List(v) => Some(v),
			_ => None,
		}
	}

	/// Returns the list mutably if this is a `List` variant.
	pub fn as_list_mut(&mut self) -> Option<&mut Vec<PropertyValue>> {
		match self {
			PropertyValue::List(v) => Some(v),
			_ => None,
		}
	}

	/// Returns the owned sub-element if this is an `Element` variant.
	pub fn as_element(&self) -> Option<ElementId> {
		match self {
			PropertyValue::Element(v) => Some(*v),
			_ => None,
		}
	}

	/// Returns true for an explicit null.
	pub fn is_null(&self) -> bool {
		matches!(self, PropertyValue::Null)
	}

	/// Returns true if the value carries no content: null, an empty or
	/// whitespace-only string, or an empty list.
	pub fn is_blank(&self) -> bool {
		match self {
			PropertyValue::Null => true,
			PropertyValue::String(s) => s.trim().is_empty(),
			PropertyValue::List(items) => items.is_empty(),
			PropertyValue::Ref(r) => r.name.trim().is_empty(),
			_ => false,
		}
	}

	/// Returns the type name of this value.
	pub fn type_name(&self) -> &'static str {
		match self {
			PropertyValue::Null => "null",
			PropertyValue::Bool(_) => "bool",
			PropertyValue::Int(_) => "int",
			PropertyValue::Float(_) => "float",
			PropertyValue::String(_) => "string",
			PropertyValue::Ref(_) => "element reference",
			PropertyValue::Structure(_) => "structure",
			PropertyValue::List(_) => "list",
			PropertyValue::Element(_) => "element",
		}
	}

	/// Visits every element reference inside this value, depth first.
	///
	/// The callback receives the hop path from this value to the reference;
	/// see [`ValueHop`].
	pub fn visit_refs<'a>(&'a self, f: &mut dyn FnMut(&[ValueHop<'a>], &'a ElementRef)) {
		let mut path = Vec::new();
		visit_refs_inner(self, &mut path, f);
	}

	/// Visits every element reference inside this value mutably, depth first.
	pub fn visit_refs_mut(&mut self, f: &mut dyn FnMut(&mut ElementRef)) {
		match self {
			PropertyValue::Ref(r) => f(r),
			PropertyValue::List(items) => {
				for item in items {
					item.visit_refs_mut(f);
				}
			}
			PropertyValue::Structure(s) => {
				for member in s.members.values_mut() {
					member.visit_refs_mut(f);
				}
			}
			_ => {}
		}
	}

	/// Visits every owned sub-element inside this value.
	pub fn visit_elements(&self, f: &mut dyn FnMut(ElementId)) {
		match self {
			PropertyValue::Element(id) => f(*id),
			PropertyValue::List(items) => {
				for item in items {
					item.visit_elements(f);
				}
			}
			_ => {}
		}
	}
}

/// One step from a value into a nested value, as reported by
/// [`PropertyValue::visit_refs`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueHop<'a> {
	/// Entry of a list.
	Index(usize),
	/// Member of a structure.
	Member(&'a str),
}

fn visit_refs_inner<'a>(
	value: &'a PropertyValue,
	path: &mut Vec<ValueHop<'a>>,
	f: &mut dyn FnMut(&[ValueHop<'a>], &'a ElementRef),
) {
	match value {
		PropertyValue::Ref(r) => f(path.as_slice(), r),
		PropertyValue::List(items) => {
			for (i, item) in items.iter().enumerate() {
				path.push(ValueHop::Index(i));
				visit_refs_inner(item, path, f);
				path.pop();
			}
		}
		PropertyValue::Structure(s) => {
			for (name, member) in &s.members {
				path.push(ValueHop::Member(name));
				visit_refs_inner(member, path, f);
				path.pop();
			}
		}
		_ => {}
	}
}

impl From<bool> for PropertyValue {
	fn from(v: bool) -> Self {
		PropertyValue::Bool(v)
	}
}

impl From<i64> for PropertyValue {
	fn from(v: i64) -> Self {
		PropertyValue::Int(v)
	}
}

impl From<f64> for PropertyValue {
	fn from(v: f64) -> Self {
		PropertyValue::Float(v)
	}
}

impl From<String> for PropertyValue {
	fn from(v: String) -> Self {
		PropertyValue::String(v)
	}
}

impl From<&str> for PropertyValue {
	fn from(v: &str) -> Self {
		PropertyValue::String(v.to_string())
	}
}

impl From<Structure> for PropertyValue {
	fn from(v: Structure) -> Self {
		PropertyValue::Structure(v)
	}
}

impl From<ElementRef> for PropertyValue {
	fn from(v: ElementRef) -> Self {
		PropertyValue::Ref(v)
	}
}

impl From<Vec<PropertyValue>> for PropertyValue {
	fn from(v: Vec<PropertyValue>) -> Self {
		PropertyValue::List(v)
	}
}

/// A typed value object with named members.
///
/// Structures have no identity; they live inside property values, typically as
/// list entries. Members that were never written are absent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Structure {
	defn: String,
	members: BTreeMap<String, PropertyValue>,
}

impl Structure {
	/// Creates an empty structure of the named structure definition.
	pub fn new(defn: impl Into<String>) -> Self {
		Self {
			defn: defn.into(),
			members: BTreeMap::new(),
		}
	}

	/// Builder-style member assignment.
	pub fn with(mut self, member: impl Into<String>, value: impl Into<PropertyValue>) -> Self {
		self.members.insert(member.into(), value.into());
		self
	}

	/// Returns the structure definition name.
	pub fn defn(&self) -> &str {
		&self.defn
	}

	/// Returns a member value, if set.
	pub fn get(&self, member: &str) -> Option<&PropertyValue> {
		self.members.get(member)
	}

	/// Returns a member value mutably, if set.
	pub fn get_mut(&mut self, member: &str) -> Option<&mut PropertyValue> {
		self.members.get_mut(member)
	}

	/// Sets or clears a member, returning the previous value.
	pub fn set(&mut self, member: &str, value: Option<PropertyValue>) -> Option<PropertyValue> {
		match value {
			Some(v) => self.members.insert(member.to_string(), v),
			None => self.members.remove(member),
		}
	}

	/// Iterates mutably over set members in name order.
	pub fn members_mut(&mut self) -> impl Iterator<Item = (&str, &mut PropertyValue)> {
		self.members.iter_mut().map(|(k, v)| (k.as_str(), v))
	}

	/// Iterates over set members in name order.
	pub fn members(&self) -> impl Iterator<Item = (&str, &PropertyValue)> {
		self.members.iter().map(|(k, v)| (k.as_str(), v))
	}

	/// Returns true if no member is set.
	pub fn is_empty(&self) -> bool {
		self.members.is_empty()
	}
}

/// A reference to an element by name, optionally resolved to a live element.
///
/// Unresolved references keep their name as the lookup key so they can be
/// resolved later (forward references during load, references into libraries,
/// or references whose target was deleted).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ElementRef {
	/// Lookup name, optionally qualified with a library name space.
	pub name: String,
	/// Resolved target, if any.
	pub target: Option<ElementId>,
}

impl ElementRef {
	/// Creates an unresolved reference.
	pub fn unresolved(name: impl Into<String>) -> Self {
		Self {
			name: name.into(),
			target: None,
		}
	}

	/// Creates a reference resolved to `target`.
	pub fn resolved(name: impl Into<String>, target: ElementId) -> Self {
		Self {
			name: name.into(),
			target: Some(target),
		}
	}

	/// Returns true if the reference points at a live element.
	pub fn is_resolved(&self) -> bool {
		self.target.is_some()
	}

	/// Splits a qualified name into `(namespace, local_name)`.
	pub fn split_name(&self) -> (Option<&str>, &str) {
		split_qualified(&self.name)
	}
}

/// Splits `lib.name` into `(Some("lib"), "name")`; plain names have no name space.
pub fn split_qualified(name: &str) -> (Option<&str>, &str) {
	match name.split_once(NAMESPACE_SEPARATOR) {
		Some((ns, local)) if !ns.is_empty() && !local.is_empty() => (Some(ns), local),
		_ => (None, name),
	}
}
