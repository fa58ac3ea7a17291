//! Value validation against property and structure-member definitions.
//!
//! Validation normalises where the conversion is lossless (integers written
//! into float properties, plain names written into reference properties) and
//! otherwise rejects the value without touching any state.

use quire_primitives::{ElementRef, PropertyValue, Structure};

use crate::defn::{PropertyDefn, PropertyType, StructDefn};
use crate::error::ValueError;
use crate::registry::SchemaRegistry;


/// Validates (and normalises) a complete value for `defn`.
///
/// List properties take a `List` whose items are validated against the item
/// type. Element-typed values are only shape-checked here; kind compatibility
/// of the referenced element is a containment concern of the model.
pub fn validate_value(
	schema: &SchemaRegistry,
	defn: &PropertyDefn,
	value: PropertyValue,
) -> Result<PropertyValue, ValueError> {
	if value.is_null() {
		return if defn.allows_null() {
			Ok(value)
		} else {
			Err(ValueError::NullNotAllowed {
				property: defn.name.clone(),
			})
		};
	}
	if defn.is_list() {
		let PropertyValue::List(items) = value else {
			return Err(mismatch(defn, &value, "list"));
		};
		return items
			.into_iter()
			.map(|item| validate_item(schema, defn, item))
			.collect::<Result<Vec<_>, _>>()
			.map(PropertyValue::List);
	}
	validate_item(schema, defn, value)
}

/// Validates one item of `defn`'s type, ignoring the `LIST` flag.
pub fn validate_item(
	schema: &SchemaRegistry,
	defn: &PropertyDefn,
	value: PropertyValue,
) -> Result<PropertyValue, ValueError> {
	let value = match (&defn.ty, value) {
		(PropertyType::Bool, v @ PropertyValue::Bool(_)) => v,
		(PropertyType::Int, v @ PropertyValue::Int(_)) => v,
		(PropertyType::Float, PropertyValue::Int(n)) => PropertyValue::Float(n as f64),
		(PropertyType::Float, v @ PropertyValue::Float(_)) => v,
		(PropertyType::String, v @ PropertyValue::String(_)) => v,
		(PropertyType::Choice(choices), PropertyValue::String(s)) => {
			if !choices.iter().any(|c| *c == s) {
				return Err(ValueError::InvalidChoice {
					property: defn.name.clone(),
					value: s,
					allowed: choices.clone(),
				});
			}
			PropertyValue::String(s)
		}
		(PropertyType::ElementRef { .. }, PropertyValue::String(name)) => {
			PropertyValue::Ref(ElementRef::unresolved(name))
		}
		(PropertyType::ElementRef { .. }, v @ PropertyValue::Ref(_)) => v,
		(PropertyType::Structure { defn: expected }, PropertyValue::Structure(s)) => {
			PropertyValue::Structure(validate_structure(schema, defn, expected, s)?)
		}
		(PropertyType::Element { .. }, v @ PropertyValue::Element(_)) => v,
		(_, v) => return Err(mismatch(defn, &v, &defn.ty.describe())),
	};

	check_range(defn, &value)?;
	if let Some(validator) = defn.validator {
		validator(&value).map_err(|reason| ValueError::Invalid {
			property: defn.name.clone(),
			reason,
		})?;
	}
	Ok(value)
}

/// Validates a single member write; `None` clears the member.
///
/// Clearing or blanking a required member is rejected.
pub fn validate_member_write(
	schema: &SchemaRegistry,
	structure: &StructDefn,
	member: &str,
	value: Option<PropertyValue>,
) -> Result<Option<PropertyValue>, ValueError> {
	let Some(defn) = structure.member(member) else {
		return Err(ValueError::UnknownMember {
			structure: structure.name.clone(),
			member: member.to_string(),
		});
	};
	let blank = value.as_ref().is_none_or(PropertyValue::is_blank);
	if defn.is_required() && blank {
		return Err(ValueError::RequiredMemberBlank {
			structure: structure.name.clone(),
			member: member.to_string(),
		});
	}
	value.map(|v| validate_value(schema, defn, v)).transpose()
}

/// Checks that every required member of `value` is present and not blank.
pub fn check_required_members(structure: &StructDefn, value: &Structure) -> Result<(), ValueError> {
	for member in structure.member_defns().filter(|m| m.is_required()) {
		if value.get(&member.name).is_none_or(PropertyValue::is_blank) {
			return Err(ValueError::RequiredMemberBlank {
				structure: structure.name.clone(),
				member: member.name.clone(),
			});
		}
	}
	Ok(())
}

fn validate_structure(
	schema: &SchemaRegistry,
	defn: &PropertyDefn,
	expected: &str,
	value: Structure,
) -> Result<Structure, ValueError> {
	if value.defn() != expected {
		return Err(ValueError::WrongStructure {
			property: defn.name.clone(),
			expected: expected.to_string(),
			got: value.defn().to_string(),
		});
	}
	let Some(structure) = schema.structure(expected) else {
		return Err(ValueError::WrongStructure {
			property: defn.name.clone(),
			expected: expected.to_string(),
			got: value.defn().to_string(),
		});
	};

	let mut out = Structure::new(expected);
	for (name, member_value) in value.members() {
		let Some(member) = structure.member(name) else {
			return Err(ValueError::UnknownMember {
				structure: expected.to_string(),
				member: name.to_string(),
			});
		};
		let normalised = validate_value(schema, member, member_value.clone())?;
		out.set(name, Some(normalised));
	}
	check_required_members(structure, &out)?;
	Ok(out)
}

fn check_range(defn: &PropertyDefn, value: &PropertyValue) -> Result<(), ValueError> {
	let Some(n) = value.as_float() else {
		return Ok(());
	};
	let below = defn.min.is_some_and(|min| n < min);
	let above = defn.max.is_some_and(|max| n > max);
	if below || above {
		return Err(ValueError::OutOfRange {
			property: defn.name.clone(),
			value: n,
			min: defn.min,
			max: defn.max,
		});
	}
	Ok(())
}

fn mismatch(defn: &PropertyDefn, value: &PropertyValue, expected: &str) -> ValueError {
	ValueError::TypeMismatch {
		property: defn.name.clone(),
		expected: expected.to_string(),
		got: value.type_name(),
	}
}
