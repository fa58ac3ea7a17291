//! Design element nodes.

use std::collections::BTreeMap;

use quire_primitives::{ElementId, ElementRef, ModuleId, PropertyValue};
use quire_schema::{ElementDefn, EXTENDS_PROP, STYLE_PROP};

use crate::containment::ContainerContext;

/// A client registration kept on a referenced element.
///
/// `client` refers to the target through `property` (directly, or through a
/// structure member or list entry of that property). One entry is kept per
/// reference, so a property holding the same target twice registers twice.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct BackRef {
	pub client: ElementId,
	pub property: String,
}

impl BackRef {
	pub fn new(client: ElementId, property: impl Into<String>) -> Self {
		Self {
			client,
			property: property.into(),
		}
	}
}

/// A node of the design graph.
///
/// Properties hold only locally written values; absence means "unset", not
/// "default". Effective values come from the cascade resolver.
#[derive(Debug, Clone, PartialEq)]
pub struct DesignElement {
	pub(crate) id: ElementId,
	pub(crate) kind: String,
	pub(crate) name: Option<String>,
	/// Name space the name is unique in, copied from the kind definition.
	pub(crate) name_space: Option<String>,
	pub(crate) module: ModuleId,
	pub(crate) props: BTreeMap<String, PropertyValue>,
	pub(crate) container: Option<ContainerContext>,
	/// Content per slot, indexed like the kind's slot definitions.
	pub(crate) slots: Vec<Vec<ElementId>>,
	pub(crate) back_refs: Vec<BackRef>,
	/// Element this one was materialised from, for virtual content.
	pub(crate) virtual_parent: Option<ElementId>,
}

impl DesignElement {
	pub(crate) fn new(id: ElementId, defn: &ElementDefn, module: ModuleId) -> Self {
		Self {
			id,
			kind: defn.name.clone(),
			name: None,
			name_space: defn.name_space.clone(),
			module,
			props: BTreeMap::new(),
			container: None,
			slots: vec![Vec::new(); defn.slot_defns().len()],
			back_refs: Vec::new(),
			virtual_parent: None,
		}
	}

	#[inline]
	pub fn id(&self) -> ElementId {
		self.id
	}

	/// Element kind name.
	#[inline]
	pub fn kind(&self) -> &str {
		&self.kind
	}

	#[inline]
	pub fn name(&self) -> Option<&str> {
		self.name.as_deref()
	}

	pub fn name_space(&self) -> Option<&str> {
		self.name_space.as_deref()
	}

	#[inline]
	pub fn module(&self) -> ModuleId {
		self.module
	}

	/// Where this element sits, if it is attached.
	pub fn container(&self) -> Option<&ContainerContext> {
		self.container.as_ref()
	}

	/// Locally set value of `property`.
	pub fn local(&self, property: &str) -> Option<&PropertyValue> {
		self.props.get(property)
	}

	/// All locally set properties.
	pub fn locals(&self) -> impl Iterator<Item = (&str, &PropertyValue)> {
		self.props.iter().map(|(k, v)| (k.as_str(), v))
	}

	/// Content of slot `index`.
	pub fn slot(&self, index: usize) -> &[ElementId] {
		self.slots.get(index).map(Vec::as_slice).unwrap_or(&[])
	}

	pub fn back_refs(&self) -> &[BackRef] {
		&self.back_refs
	}

	pub fn virtual_parent(&self) -> Option<ElementId> {
		self.virtual_parent
	}

	/// Returns true for virtual content materialised from an extends parent.
	pub fn is_virtual(&self) -> bool {
		self.virtual_parent.is_some()
	}

	/// The `extends` reference, if set.
	pub fn extends(&self) -> Option<&ElementRef> {
		self.props.get(EXTENDS_PROP)?.as_ref_value()
	}

	/// The shared `style` reference, if set.
	pub fn style(&self) -> Option<&ElementRef> {
		self.props.get(STYLE_PROP)?.as_ref_value()
	}

	/// Resolved extends parent, or the virtual parent for virtual content.
	pub fn parent(&self) -> Option<ElementId> {
		self.virtual_parent
			.or_else(|| self.extends().and_then(|r| r.target))
	}

	/// Every element id held by slots and element-typed properties.
	pub fn content(&self) -> Vec<ElementId> {
		let mut out: Vec<ElementId> = self.slots.iter().flatten().copied().collect();
		for value in self.props.values() {
			value.visit_elements(&mut |id| out.push(id));
		}
		out
	}
}
