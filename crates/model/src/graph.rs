//! Element arena, name index and module table.
//!
//! The graph holds plain data and the primitive mutations that activity
//! records replay. It performs no validation; every check happens in
//! [`Design`](crate::Design) before a record is created.

use quire_primitives::{ElementId, ModuleId, PropertyValue};
use rustc_hash::FxHashMap as HashMap;
use tracing::warn;

use crate::containment::ContainerContext;
use crate::element::{BackRef, DesignElement};


/// A main design or an included library.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Module {
	pub id: ModuleId,
	/// Qualifier used in `namespace.name` references into this library.
	pub name_space: Option<String>,
	pub root: ElementId,
	/// Sealed modules are read-only.
	pub sealed: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub(crate) struct NameKey {
	pub module: ModuleId,
	pub space: String,
	pub name: String,
}

/// Arena of design elements.
#[derive(Debug, Default)]
pub struct Graph {
	elements: HashMap<ElementId, DesignElement>,
	names: HashMap<NameKey, ElementId>,
	modules: Vec<Module>,
	next_id: u64,
}

impl Graph {
	pub fn new() -> Self {
		Self::default()
	}

	#[inline]
	pub fn get(&self, id: ElementId) -> Option<&DesignElement> {
		self.elements.get(&id)
	}

	pub fn contains(&self, id: ElementId) -> bool {
		self.elements.contains_key(&id)
	}

	pub fn len(&self) -> usize {
		self.elements.len()
	}

	pub fn is_empty(&self) -> bool {
		self.elements.is_empty()
	}

	/// Iterates over all live elements in unspecified order.
	pub fn elements(&self) -> impl Iterator<Item = &DesignElement> {
		self.elements.values()
	}

	pub fn modules(&self) -> &[Module] {
		&self.modules
	}

	pub fn module(&self, id: ModuleId) -> Option<&Module> {
		self.modules.get(id.0 as usize)
	}

	pub(crate) fn module_mut(&mut self, id: ModuleId) -> Option<&mut Module> {
		self.modules.get_mut(id.0 as usize)
	}

	/// Library module registered under `name_space`.
	pub fn module_by_name_space(&self, name_space: &str) -> Option<&Module> {
		self.modules
			.iter()
			.find(|m| m.name_space.as_deref() == Some(name_space))
	}

	pub(crate) fn push_module(&mut self, name_space: Option<String>, root: ElementId) -> ModuleId {
		let id = ModuleId(self.modules.len() as u32);
		self.modules.push(Module {
			id,
			name_space,
			root,
			sealed: false,
		});
		id
	}

	pub(crate) fn next_id(&mut self) -> ElementId {
		self.next_id += 1;
		ElementId(self.next_id)
	}

	/// Element named `name` in `space` of `module`.
	pub fn lookup(&self, module: ModuleId, space: &str, name: &str) -> Option<ElementId> {
		self.names
			.get(&NameKey {
				module,
				space: space.to_string(),
				name: name.to_string(),
			})
			.copied()
	}

	pub(crate) fn insert_element(&mut self, element: DesignElement) {
		if let (Some(space), Some(name)) = (&element.name_space, &element.name) {
			self.names.insert(
				NameKey {
					module: element.module,
					space: space.clone(),
					name: name.clone(),
				},
				element.id,
			);
		}
		self.elements.insert(element.id, element);
	}

	pub(crate) fn remove_element(&mut self, id: ElementId) {
		let Some(element) = self.elements.remove(&id) else {
			warn!(element = %id, "remove of unknown element");
			return;
		};
		if let (Some(space), Some(name)) = (&element.name_space, &element.name) {
			self.unregister(element.module, space, name, id);
		}
	}

	pub(crate) fn set_name(&mut self, id: ElementId, name: Option<String>) {
		let Some(element) = self.elements.get_mut(&id) else {
			warn!(element = %id, "rename of unknown element");
			return;
		};
		let module = element.module;
		let old = std::mem::replace(&mut element.name, name.clone());
		let Some(space) = element.name_space.clone() else {
			return;
		};
		if let Some(old) = old {
			self.unregister(module, &space, &old, id);
		}
		if let Some(name) = name {
			self.names.insert(NameKey { module, space, name }, id);
		}
	}

	fn unregister(&mut self, module: ModuleId, space: &str, name: &str, id: ElementId) {
		let key = NameKey {
			module,
			space: space.to_string(),
			name: name.to_string(),
		};
		if self.names.get(&key) == Some(&id) {
			self.names.remove(&key);
		}
	}

	pub(crate) fn set_prop(&mut self, id: ElementId, property: &str, value: Option<PropertyValue>) {
		let Some(element) = self.elements.get_mut(&id) else {
			warn!(element = %id, property, "property write on unknown element");
			return;
		};
		match value {
			Some(v) => {
				element.props.insert(property.to_string(), v);
			}
			None => {
				element.props.remove(property);
			}
		}
	}

	pub(crate) fn set_container(&mut self, id: ElementId, ctx: Option<ContainerContext>) {
		match self.elements.get_mut(&id) {
			Some(element) => element.container = ctx,
			None => warn!(element = %id, "container update on unknown element"),
		}
	}

	pub(crate) fn slot_insert(&mut self, owner: ElementId, slot: usize, index: usize, id: ElementId) {
		let Some(content) = self
			.elements
			.get_mut(&owner)
			.and_then(|e| e.slots.get_mut(slot))
		else {
			warn!(owner = %owner, slot, "insert into unknown slot");
			return;
		};
		content.insert(index.min(content.len()), id);
		self.set_container(id, Some(ContainerContext::slot(owner, slot)));
	}

	pub(crate) fn slot_remove(&mut self, owner: ElementId, slot: usize, index: usize) {
		let Some(content) = self
			.elements
			.get_mut(&owner)
			.and_then(|e| e.slots.get_mut(slot))
		else {
			warn!(owner = %owner, slot, "remove from unknown slot");
			return;
		};
		if index < content.len() {
			let id = content.remove(index);
			self.set_container(id, None);
		}
	}

	pub(crate) fn slot_move(&mut self, owner: ElementId, slot: usize, from: usize, to: usize) {
		if let Some(content) = self
			.elements
			.get_mut(&owner)
			.and_then(|e| e.slots.get_mut(slot))
			&& from < content.len()
			&& to < content.len()
		{
			let id = content.remove(from);
			content.insert(to, id);
		}
	}

	pub(crate) fn back_ref_insert(&mut self, target: ElementId, index: usize, back_ref: BackRef) {
		match self.elements.get_mut(&target) {
			Some(element) => {
				let index = index.min(element.back_refs.len());
				element.back_refs.insert(index, back_ref);
			}
			None => warn!(target = %target, "back reference on unknown element"),
		}
	}

	pub(crate) fn back_ref_remove(&mut self, target: ElementId, index: usize) {
		if let Some(element) = self.elements.get_mut(&target)
			&& index < element.back_refs.len()
		{
			element.back_refs.remove(index);
		}
	}

	/// Ids of `id` and every element it (transitively) contains, parents first.
	pub fn subtree(&self, id: ElementId) -> Vec<ElementId> {
		let mut out = Vec::new();
		let mut stack = vec![id];
		while let Some(next) = stack.pop() {
			let Some(element) = self.get(next) else {
				continue;
			};
			out.push(next);
			let content = element.content();
			stack.extend(content.into_iter().rev());
		}
		out
	}

	/// Containers of `id`, nearest first.
	pub fn ancestors(&self, id: ElementId) -> Vec<ElementId> {
		let mut out = Vec::new();
		let mut cur = self.get(id).and_then(|e| e.container.as_ref()).map(|c| c.owner());
		while let Some(owner) = cur {
			if out.contains(&owner) {
				break;
			}
			out.push(owner);
			cur = self
				.get(owner)
				.and_then(|e| e.container.as_ref())
				.map(|c| c.owner());
		}
		out
	}
}
