//! Element creation, naming and destruction.

use quire_primitives::{ElementId, ModuleId, PropertyValue};
use tracing::debug;

use super::Design;
use crate::activity::Record;
use crate::containment::{ContainerContext, ContentSlot};
use crate::element::DesignElement;
use crate::error::{ContainmentError, ModelError, ReferenceError, Result};
use crate::refs::RefCause;

impl Design {
	/// Creates a detached element of `kind` in the main module.
	pub fn create_element(&mut self, kind: &str, name: Option<&str>) -> Result<ElementId> {
		self.create_element_in(ModuleId::MAIN, kind, name)
	}

	/// Creates a detached element of `kind` in `module`.
	///
	/// Names are unique per module within the kind's name space. Pending
	/// references to the new name resolve to the new element.
	pub fn create_element_in(&mut self, module: ModuleId, kind: &str, name: Option<&str>) -> Result<ElementId> {
		let defn = self.kind_defn(kind)?;
		let root = self.module_root(module)?;
		if self.is_sealed(module) {
			return Err(ModelError::ReadOnly { element: root, module });
		}
		if let Some(name) = name {
			self.check_name_free(module, defn.name_space.as_deref(), name)?;
		}

		self.run("create element", |d| {
			let id = d.graph_mut().next_id();
			let mut element = DesignElement::new(id, &defn, module);
			element.name = name.map(str::to_string);
			d.apply(Record::Create {
				element: Box::new(element),
			})?;
			if let Some(name) = name {
				d.resolve_pending(Some(name))?;
			}
			debug!(element = %id, kind, name, "element created");
			Ok(id)
		})
	}

	/// Creates an element and inserts it into `ctx` at `index`.
	pub fn create_in(
		&mut self,
		ctx: &ContainerContext,
		kind: &str,
		name: Option<&str>,
		index: Option<usize>,
	) -> Result<ElementId> {
		let module = self.element(ctx.owner())?.module();
		self.run("create element", |d| {
			let id = d.create_element_in(module, kind, name)?;
			d.add(ctx, id, index)?;
			Ok(id)
		})
	}

	fn check_name_free(&self, module: ModuleId, space: Option<&str>, name: &str) -> Result<()> {
		if let Some(space) = space
			&& self.graph().lookup(module, space, name).is_some()
		{
			return Err(ReferenceError::DuplicateName {
				name: name.to_string(),
				space: space.to_string(),
			}
			.into());
		}
		Ok(())
	}

	/// Renames `id`; `None` removes the name.
	///
	/// Registered clients either follow the new name or become unresolved,
	/// depending on [`RenamePolicy`](crate::RenamePolicy).
	pub fn rename(&mut self, id: ElementId, name: Option<&str>) -> Result<()> {
		let el = self.check_writable(id)?;
		if el.is_virtual() {
			return Err(ContainmentError::VirtualElement { element: id }.into());
		}
		if el.name() == name {
			return Ok(());
		}
		let old = el.name.clone();
		if let Some(name) = name {
			self.check_name_free(el.module(), el.name_space(), name)?;
		}

		self.run("rename element", |d| {
			d.apply(Record::SetName {
				element: id,
				old: old.clone(),
				new: name.map(str::to_string),
			})?;
			d.update_client_references(id, RefCause::Renamed)?;
			if let Some(name) = name {
				d.resolve_pending(Some(name))?;
			}
			debug!(element = %id, ?old, new = name, "element renamed");
			Ok(())
		})
	}

	/// Removes `id` from its container (if any) and destroys it with all of
	/// its content.
	///
	/// Outgoing references are released and every client of a destroyed
	/// element is flipped back to an unresolved name.
	pub fn drop_element(&mut self, id: ElementId) -> Result<()> {
		let el = self.check_writable(id)?;
		if el.is_virtual() {
			return Err(ContainmentError::VirtualElement { element: id }.into());
		}
		if self
			.graph()
			.module(el.module())
			.is_some_and(|m| m.root == id)
		{
			return Err(ContainmentError::ModuleRoot { element: id }.into());
		}
		self.run("drop element", |d| d.destroy(id))
	}

	/// Detaches and destroys `id` and its subtree. Must run inside a transaction.
	pub(crate) fn destroy(&mut self, id: ElementId) -> Result<()> {
		let container = self.element(id)?.container().cloned();
		if let Some(ctx) = &container {
			self.detach(id, ctx)?;
		}
		self.destroy_detached(id)?;
		if let Some(ctx) = container {
			self.refresh_dependents(ctx.owner())?;
		}
		Ok(())
	}

	/// Destroys a detached subtree, children first.
	pub(crate) fn destroy_detached(&mut self, id: ElementId) -> Result<()> {
		let subtree = self.graph().subtree(id);
		for &e in &subtree {
			self.sever_outgoing(e)?;
		}
		for &e in &subtree {
			if self.graph().contains(e) {
				self.update_client_references(e, RefCause::Removed)?;
			}
		}
		for &e in subtree.iter().rev() {
			let Some(snapshot) = self.graph().get(e).cloned() else {
				continue;
			};
			self.apply(Record::Destroy {
				element: Box::new(snapshot),
			})?;
		}
		debug!(element = %id, destroyed = subtree.len(), "subtree destroyed");
		Ok(())
	}

	/// Removes `id` from `ctx` without destroying it.
	pub(crate) fn detach(&mut self, id: ElementId, ctx: &ContainerContext) -> Result<()> {
		let Some(index) = ctx.index_of(self, id) else {
			return Err(ContainmentError::NotContained {
				element: id,
				container: ctx.owner(),
				slot: ctx.label(self),
			}
			.into());
		};
		match ctx.content_slot() {
			ContentSlot::Slot(slot) => self.apply(Record::SlotRemove {
				owner: ctx.owner(),
				slot: *slot,
				index,
				element: id,
			}),
			ContentSlot::Property(name) => {
				let owner = self.element(ctx.owner())?;
				let old = owner.local(name).cloned();
				let new = match &old {
					Some(PropertyValue::List(items)) => {
						let mut items = items.clone();
						items.retain(|v| v.as_element() != Some(id));
						Some(PropertyValue::List(items))
					}
					_ => None,
				};
				self.apply(Record::SetProperty {
					element: ctx.owner(),
					property: name.clone(),
					old,
					new,
				})?;
				self.apply(Record::SetContainer {
					element: id,
					old: Some(ctx.clone()),
					new: None,
				})
			}
		}
	}
}
