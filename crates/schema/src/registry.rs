//! Registry builder and the frozen [`SchemaRegistry`].

use std::sync::Arc;

use indexmap::IndexMap;
use rustc_hash::{FxHashMap as HashMap, FxHashSet as HashSet};
use tracing::debug;

use crate::defn::{ElementDefn, EXTENDS_PROP, PropertyDefn, PropertyType, STYLE_PROP, StructDefn};
use crate::error::SchemaError;
use crate::validate::validate_value;


/// Builder for constructing a [`SchemaRegistry`].
#[derive(Default)]
pub struct SchemaBuilder {
	elements: Vec<ElementDefn>,
	structures: Vec<StructDefn>,
	style_kind: Option<String>,
}

impl SchemaBuilder {
	pub fn new() -> Self {
		Self::default()
	}

	/// Returns the number of element definitions registered so far.
	pub fn len(&self) -> usize {
		self.elements.len()
	}

	/// Returns true if no element definition has been registered.
	pub fn is_empty(&self) -> bool {
		self.elements.is_empty()
	}

	pub fn register_element(&mut self, defn: ElementDefn) {
		self.elements.push(defn);
	}

	pub fn register_struct(&mut self, defn: StructDefn) {
		self.structures.push(defn);
	}

	/// Chaining form of [`register_element`](Self::register_element).
	pub fn element(mut self, defn: ElementDefn) -> Self {
		self.register_element(defn);
		self
	}

	/// Chaining form of [`register_struct`](Self::register_struct).
	pub fn structure(mut self, defn: StructDefn) -> Self {
		self.register_struct(defn);
		self
	}

	/// Names the element kind used for shared styles and selector styles.
	pub fn style_kind(mut self, kind: impl Into<String>) -> Self {
		self.style_kind = Some(kind.into());
		self
	}

	/// Validates all definitions and freezes them into a registry.
	///
	/// Base chains are flattened (base properties and slots first), the
	/// implicit `extends` and `style` reference properties are injected, and
	/// every kind or structure named by a type is checked to exist.
	pub fn build(self) -> Result<SchemaRegistry, SchemaError> {
		let mut structures: HashMap<String, Arc<StructDefn>> = HashMap::default();
		for mut defn in self.structures {
			if structures.contains_key(&defn.name) {
				return Err(SchemaError::DuplicateStructure(defn.name));
			}
			let mut resolved = IndexMap::new();
			for member in &defn.members {
				if resolved
					.insert(member.name.clone(), Arc::new(member.clone()))
					.is_some()
				{
					return Err(SchemaError::DuplicateProperty {
						owner: defn.name.clone(),
						property: member.name.clone(),
					});
				}
			}
			defn.resolved = resolved;
			structures.insert(defn.name.clone(), Arc::new(defn));
		}

		let mut raw: IndexMap<String, ElementDefn> = IndexMap::new();
		for defn in self.elements {
			if raw.contains_key(&defn.name) {
				return Err(SchemaError::DuplicateElement(defn.name));
			}
			raw.insert(defn.name.clone(), defn);
		}

		let mut resolver = Flattener {
			raw: &raw,
			style_kind: self.style_kind.as_deref(),
			done: HashMap::default(),
			visiting: HashSet::default(),
		};
		for name in raw.keys() {
			resolver.flatten(name)?;
		}
		let elements: HashMap<String, Arc<ElementDefn>> = resolver
			.done
			.into_iter()
			.map(|(k, v)| (k, Arc::new(v)))
			.collect();

		let registry = SchemaRegistry {
			elements,
			structures,
			style_kind: self.style_kind,
		};
		registry.check_links()?;

		debug!(
			elements = registry.elements.len(),
			structures = registry.structures.len(),
			"schema registry built"
		);
		Ok(registry)
	}
}

struct Flattener<'a> {
	raw: &'a IndexMap<String, ElementDefn>,
	style_kind: Option<&'a str>,
	done: HashMap<String, ElementDefn>,
	visiting: HashSet<String>,
}

impl Flattener<'_> {
	fn flatten(&mut self, name: &str) -> Result<(), SchemaError> {
		if self.done.contains_key(name) {
			return Ok(());
		}
		if !self.visiting.insert(name.to_string()) {
			return Err(SchemaError::CyclicBase(name.to_string()));
		}
		let raw = self.raw;
		let Some(defn) = raw.get(name) else {
			return Err(SchemaError::UnknownKind {
				owner: "schema".to_string(),
				kind: name.to_string(),
			});
		};
		let mut out = defn.clone();

		let mut extendable = defn.extendable;
		let mut styled = defn.styled;
		if let Some(base) = &defn.base {
			if !raw.contains_key(base) {
				return Err(SchemaError::UnknownBase {
					element: defn.name.clone(),
					base: base.clone(),
				});
			}
			self.flatten(base)?;
			let base_defn = &self.done[base.as_str()];
			out.ancestry = std::iter::once(base.clone())
				.chain(base_defn.ancestry.iter().cloned())
				.collect();
			out.resolved_slots = base_defn.resolved_slots.clone();
			out.resolved_props = base_defn
				.resolved_props
				.iter()
				.filter(|(k, _)| k.as_str() != EXTENDS_PROP)
				.map(|(k, v)| (k.clone(), v.clone()))
				.collect();
			extendable |= base_defn.extendable;
			styled |= base_defn.styled;
			if out.name_space.is_none() {
				out.name_space = base_defn.name_space.clone();
			}
		}
		out.extendable = extendable;
		out.styled = styled;

		for prop in &defn.properties {
			if out
				.resolved_props
				.insert(prop.name.clone(), Arc::new(prop.clone()))
				.is_some()
			{
				return Err(SchemaError::DuplicateProperty {
					owner: defn.name.clone(),
					property: prop.name.clone(),
				});
			}
		}
		for slot in &defn.slots {
			if out.resolved_slots.iter().any(|s| s.name == slot.name) {
				return Err(SchemaError::DuplicateSlot {
					element: defn.name.clone(),
					slot: slot.name.clone(),
				});
			}
			out.resolved_slots.push(slot.clone());
		}

		if extendable {
			out.resolved_props.insert(
				EXTENDS_PROP.to_string(),
				Arc::new(PropertyDefn::new(
					EXTENDS_PROP,
					PropertyType::ElementRef {
						target: defn.name.clone(),
					},
				)),
			);
		}
		if styled && !out.resolved_props.contains_key(STYLE_PROP) {
			let Some(style_kind) = self.style_kind else {
				return Err(SchemaError::MissingStyleKind {
					element: defn.name.clone(),
				});
			};
			out.resolved_props.insert(
				STYLE_PROP.to_string(),
				Arc::new(PropertyDefn::new(
					STYLE_PROP,
					PropertyType::ElementRef {
						target: style_kind.to_string(),
					},
				)),
			);
		}

		self.visiting.remove(name);
		self.done.insert(name.to_string(), out);
		Ok(())
	}
}

/// Frozen catalog of element kinds and structure layouts.
///
/// Read-only after [`SchemaBuilder::build`]; share it as `Arc<SchemaRegistry>`.
#[derive(Debug)]
pub struct SchemaRegistry {
	elements: HashMap<String, Arc<ElementDefn>>,
	structures: HashMap<String, Arc<StructDefn>>,
	style_kind: Option<String>,
}

impl SchemaRegistry {
	/// Looks up an element kind by name.
	#[inline]
	pub fn element(&self, name: &str) -> Option<&Arc<ElementDefn>> {
		self.elements.get(name)
	}

	/// Looks up a structure definition by name.
	#[inline]
	pub fn structure(&self, name: &str) -> Option<&Arc<StructDefn>> {
		self.structures.get(name)
	}

	/// Looks up a property definition of an element kind.
	pub fn property(&self, kind: &str, property: &str) -> Option<&Arc<PropertyDefn>> {
		self.element(kind)?.property(property)
	}

	/// Kind used for shared and selector styles.
	pub fn style_kind(&self) -> Option<&str> {
		self.style_kind.as_deref()
	}

	/// Returns true if `kind` is `base` or derives from it.
	pub fn is_kind_of(&self, kind: &str, base: &str) -> bool {
		self.element(kind).is_some_and(|d| d.is_kind_of(base))
	}

	/// Iterates over all element kinds in unspecified order.
	pub fn elements(&self) -> impl Iterator<Item = &Arc<ElementDefn>> {
		self.elements.values()
	}

	/// Returns the number of element kinds.
	pub fn len(&self) -> usize {
		self.elements.len()
	}

	/// Returns true if the registry holds no element kinds.
	pub fn is_empty(&self) -> bool {
		self.elements.is_empty()
	}

	fn check_links(&self) -> Result<(), SchemaError> {
		if let Some(style) = &self.style_kind
			&& !self.elements.contains_key(style)
		{
			return Err(SchemaError::UnknownKind {
				owner: "schema style kind".to_string(),
				kind: style.clone(),
			});
		}
		for defn in self.elements.values() {
			for prop in defn.property_defns() {
				self.check_type(&defn.name, prop)?;
				self.check_default(&defn.name, prop)?;
			}
			for slot in defn.slot_defns() {
				for kind in &slot.kinds {
					if !self.elements.contains_key(kind) {
						return Err(SchemaError::UnknownKind {
							owner: format!("{}.{}", defn.name, slot.name),
							kind: kind.clone(),
						});
					}
				}
			}
		}
		for defn in self.structures.values() {
			for member in defn.member_defns() {
				self.check_type(&defn.name, member)?;
				self.check_default(&defn.name, member)?;
			}
			self.check_nesting(defn)?;
		}
		Ok(())
	}

	fn check_type(&self, owner: &str, prop: &PropertyDefn) -> Result<(), SchemaError> {
		match &prop.ty {
			PropertyType::Structure { defn } if !self.structures.contains_key(defn) => {
				Err(SchemaError::UnknownStructure {
					owner: format!("{owner}.{}", prop.name),
					structure: defn.clone(),
				})
			}
			PropertyType::ElementRef { target } if !self.elements.contains_key(target) => {
				Err(SchemaError::UnknownKind {
					owner: format!("{owner}.{}", prop.name),
					kind: target.clone(),
				})
			}
			PropertyType::Element { kinds } => {
				match kinds.iter().find(|k| !self.elements.contains_key(*k)) {
					Some(kind) => Err(SchemaError::UnknownKind {
						owner: format!("{owner}.{}", prop.name),
						kind: kind.clone(),
					}),
					None => Ok(()),
				}
			}
			_ => Ok(()),
		}
	}

	fn check_default(&self, owner: &str, prop: &PropertyDefn) -> Result<(), SchemaError> {
		let Some(default) = &prop.default else {
			return Ok(());
		};
		validate_value(self, prop, default.clone())
			.map(|_| ())
			.map_err(|source| SchemaError::InvalidDefault {
				owner: owner.to_string(),
				property: prop.name.clone(),
				source,
			})
	}

	/// A structure may embed structures whose members are all non-structure.
	fn check_nesting(&self, defn: &StructDefn) -> Result<(), SchemaError> {
		for member in defn.member_defns() {
			let Some(inner) = member.struct_name().and_then(|n| self.structure(n)) else {
				continue;
			};
			if inner.member_defns().any(|m| m.struct_name().is_some()) {
				return Err(SchemaError::NestingTooDeep {
					structure: defn.name.clone(),
				});
			}
		}
		Ok(())
	}
}
