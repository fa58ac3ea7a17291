//! Containment contexts: where an element sits and what may go there.
//!
//! A [`ContainerContext`] names either a schema-declared slot of its owner
//! or an element-typed property of its owner. Insertion legality is checked
//! in a fixed order:
//!
//! 1. kind compatibility and cardinality,
//! 2. the owner's module is writable,
//! 3. virtual and inherited content is not restructured,
//! 4. the owner kind's content validator accepts the candidate.
//!
//! All checks run before anything is mutated.

use std::fmt;

use quire_primitives::{ElementId, PropertyValue};
use quire_schema::ContentCheck;

use crate::cascade::Resolver;
use crate::design::Design;
use crate::error::{ContainmentError, ModelError, Result};


/// The container-side half of a [`ContainerContext`].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ContentSlot {
	/// Index into the owner kind's slot definitions.
	Slot(usize),
	/// Name of an element-typed property of the owner.
	Property(String),
}

/// A containment relationship: an owner element plus one slot or one
/// element-typed property.
///
/// Two contexts are equal when they name the same owner and the same slot
/// index or property name.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ContainerContext {
	owner: ElementId,
	slot: ContentSlot,
}

impl ContainerContext {
	/// Context for slot `index` of `owner`.
	pub fn slot(owner: ElementId, index: usize) -> Self {
		Self {
			owner,
			slot: ContentSlot::Slot(index),
		}
	}

	/// Context for the element-typed property `name` of `owner`.
	pub fn property(owner: ElementId, name: impl Into<String>) -> Self {
		Self {
			owner,
			slot: ContentSlot::Property(name.into()),
		}
	}

	/// Context for the slot called `name` of `owner`.
	pub fn named_slot(design: &Design, owner: ElementId, name: &str) -> Result<Self> {
		let defn = design.defn_of(owner)?;
		match defn.slot(name) {
			Some((index, _)) => Ok(Self::slot(owner, index)),
			None => Err(ContainmentError::UnknownSlot {
				container: owner,
				slot: name.to_string(),
			}
			.into()),
		}
	}

	#[inline]
	pub fn owner(&self) -> ElementId {
		self.owner
	}

	pub fn content_slot(&self) -> &ContentSlot {
		&self.slot
	}

	pub fn slot_index(&self) -> Option<usize> {
		match self.slot {
			ContentSlot::Slot(i) => Some(i),
			ContentSlot::Property(_) => None,
		}
	}

	pub fn property_name(&self) -> Option<&str> {
		match &self.slot {
			ContentSlot::Property(name) => Some(name),
			ContentSlot::Slot(_) => None,
		}
	}

	/// Slot or property name, for messages.
	pub fn label(&self, design: &Design) -> String {
		match &self.slot {
			ContentSlot::Slot(i) => design
				.defn_of(self.owner)
				.ok()
				.and_then(|d| d.slot_defns().get(*i))
				.map(|s| s.name.clone())
				.unwrap_or_else(|| format!("slot {i}")),
			ContentSlot::Property(name) => name.clone(),
		}
	}

	/// Content elements, in order.
	pub fn contents(&self, design: &Design) -> Vec<ElementId> {
		let Some(owner) = design.graph().get(self.owner) else {
			return Vec::new();
		};
		match &self.slot {
			ContentSlot::Slot(i) => owner.slot(*i).to_vec(),
			ContentSlot::Property(name) => {
				let mut out = Vec::new();
				if let Some(value) = owner.local(name) {
					value.visit_elements(&mut |id| out.push(id));
				}
				out
			}
		}
	}

	/// Content element at `index`.
	pub fn get(&self, design: &Design, index: usize) -> Option<ElementId> {
		self.contents(design).get(index).copied()
	}

	pub fn count(&self, design: &Design) -> usize {
		self.contents(design).len()
	}

	/// Position of `element` in this context.
	pub fn index_of(&self, design: &Design, element: ElementId) -> Option<usize> {
		self.contents(design).iter().position(|e| *e == element)
	}

	/// Checks that a new element of `kind` could be appended here.
	pub fn can_contain(&self, design: &Design, kind: &str) -> Result<()> {
		self.check_insert(design, kind, None, None).map(|_| ())
	}

	/// Checks that the existing, detached `element` could be inserted here.
	///
	/// On top of [`can_contain`](Self::can_contain) this rejects elements of
	/// another module, virtual elements, module roots, and placements that
	/// would make an element contain itself.
	pub fn check_containment_context(&self, design: &Design, element: ElementId) -> Result<()> {
		self.check_element(design, element, None).map(|_| ())
	}

	/// Inserts the detached `element` at `index` (appends when `None`).
	pub fn add(&self, design: &mut Design, element: ElementId, index: Option<usize>) -> Result<()> {
		design.add(self, element, index)
	}

	/// Removes `element` from this context and destroys it.
	pub fn remove(&self, design: &mut Design, element: ElementId) -> Result<()> {
		if self.index_of(design, element).is_none() {
			return Err(ContainmentError::NotContained {
				element,
				container: self.owner,
				slot: self.label(design),
			}
			.into());
		}
		design.drop_element(element)
	}

	/// Moves the content at `from` to position `to`.
	pub fn move_content(&self, design: &mut Design, from: usize, to: usize) -> Result<()> {
		design.move_content(self, from, to)
	}

	pub(crate) fn check_element(
		&self,
		design: &Design,
		element: ElementId,
		position: Option<usize>,
	) -> Result<usize> {
		let candidate = design.element(element)?;
		let owner = design.element(self.owner)?;
		if candidate.is_virtual() {
			return Err(ContainmentError::VirtualElement { element }.into());
		}
		if design
			.graph()
			.module(candidate.module())
			.is_some_and(|m| m.root == element)
		{
			return Err(ContainmentError::ModuleRoot { element }.into());
		}
		if candidate.module() != owner.module() {
			return Err(ContainmentError::CrossModule {
				element,
				container: self.owner,
			}
			.into());
		}
		if element == self.owner || design.graph().ancestors(self.owner).contains(&element) {
			return Err(ContainmentError::Cycle { element }.into());
		}
		let kind = candidate.kind().to_string();
		self.check_insert(design, &kind, Some(element), position)
	}

	/// Runs the ordered legality checks and returns the insertion position.
	pub(crate) fn check_insert(
		&self,
		design: &Design,
		kind: &str,
		candidate: Option<ElementId>,
		position: Option<usize>,
	) -> Result<usize> {
		let owner = design.element(self.owner)?;
		let owner_defn = design.defn_of(self.owner)?;
		let label = self.label(design);
		let existing = self.contents(design);

		let (kinds, single) = match &self.slot {
			ContentSlot::Slot(i) => {
				let Some(slot) = owner_defn.slot_defns().get(*i) else {
					return Err(self.unknown(label));
				};
				(slot.kinds.as_slice(), slot.is_single())
			}
			ContentSlot::Property(name) => {
				let Some(defn) = owner_defn.property(name) else {
					return Err(self.unknown(label));
				};
				let Some(kinds) = defn.element_kinds() else {
					return Err(self.unknown(label));
				};
				(kinds, !defn.is_list())
			}
		};
		if !kinds.iter().any(|k| design.schema().is_kind_of(kind, k)) {
			return Err(ContainmentError::KindNotAllowed {
				container: self.owner,
				slot: label,
				kind: kind.to_string(),
			}
			.into());
		}
		if single && !existing.is_empty() {
			return Err(ContainmentError::SlotFull {
				container: self.owner,
				slot: label,
			}
			.into());
		}

		if design.is_sealed(owner.module()) {
			return Err(ContainmentError::ReadOnlyModule {
				container: self.owner,
				module: owner.module(),
			}
			.into());
		}

		if owner.is_virtual() {
			return Err(ContainmentError::VirtualElement {
				element: self.owner,
			}
			.into());
		}
		if matches!(self.slot, ContentSlot::Slot(_)) && owner.extends().is_some_and(|r| r.is_resolved()) {
			return Err(ContainmentError::InheritedContent {
				container: self.owner,
			}
			.into());
		}

		let position = position.unwrap_or(existing.len());
		if position > existing.len() {
			return Err(ContainmentError::IndexOutOfRange {
				index: position,
				len: existing.len(),
			}
			.into());
		}

		if let Some(validator) = owner_defn.content_validator {
			let resolver = Resolver::new(design);
			let existing_kinds: Vec<&str> = existing
				.iter()
				.filter_map(|id| design.graph().get(*id))
				.map(|e| e.kind())
				.collect();
			let container_property = |name: &str| resolver.value(self.owner, name);
			let candidate_property = |name: &str| -> Option<PropertyValue> {
				candidate.and_then(|id| resolver.value(id, name))
			};
			let check = ContentCheck {
				container_kind: owner.kind(),
				slot: &label,
				candidate_kind: kind,
				existing: &existing_kinds,
				position,
				container_property: &container_property,
				candidate_property: &candidate_property,
			};
			validator(&check).map_err(|reason| ContainmentError::Rejected {
				container: self.owner,
				slot: label.clone(),
				kind: kind.to_string(),
				reason,
			})?;
		}
		Ok(position)
	}

	fn unknown(&self, label: String) -> ModelError {
		ContainmentError::UnknownSlot {
			container: self.owner,
			slot: label,
		}
		.into()
	}
}

impl fmt::Display for ContainerContext {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match &self.slot {
			ContentSlot::Slot(i) => write!(f, "{}/{}", self.owner, i),
			ContentSlot::Property(name) => write!(f, "{}.{}", self.owner, name),
		}
	}
}
