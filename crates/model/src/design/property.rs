//! Property and member writes.

use std::sync::Arc;

use quire_primitives::{ElementId, PropertyValue};
use quire_schema::{
	EXTENDS_PROP, PropertyDefn, STYLE_PROP, ValueError, validate_item, validate_member_write,
	validate_value,
};
use smallvec::SmallVec;
use tracing::debug;

use super::Design;
use crate::activity::Record;
use crate::error::{AddressError, ContainmentError, ModelError, Result};
use crate::member_ref::MemberRef;
use crate::notification::Notification;

impl Design {
	/// Locally set value of `property` on `id`.
	pub fn local_value(&self, id: ElementId, property: &str) -> Result<Option<&PropertyValue>> {
		Ok(self.element(id)?.local(property))
	}

	/// Definition of `property` on the kind of `id`.
	pub fn property_defn(&self, id: ElementId, property: &str) -> Result<Arc<PropertyDefn>> {
		let el = self.element(id)?;
		self.schema()
			.property(el.kind(), property)
			.cloned()
			.ok_or_else(|| ModelError::UnknownProperty {
				kind: el.kind().to_string(),
				property: property.to_string(),
			})
	}

	/// Address of the whole property `property` on the kind of `id`.
	pub fn member_ref(&self, id: ElementId, property: &str) -> Result<MemberRef> {
		Ok(MemberRef::new(self.property_defn(id, property)?))
	}

	/// Sets (`Some`) or unsets (`None`) a property.
	///
	/// Element-typed properties hold content and are edited through their
	/// [`ContainerContext`](crate::ContainerContext) instead.
	pub fn set_property(&mut self, id: ElementId, property: &str, value: Option<PropertyValue>) -> Result<()> {
		let defn = self.property_defn(id, property)?;
		self.check_writable(id)?;
		if defn.is_element_container() {
			return Err(ContainmentError::ElementValued {
				property: defn.name.clone(),
			}
			.into());
		}
		let value = value
			.map(|v| validate_value(self.schema(), &defn, v))
			.transpose()
			.map_err(|source| value_error(id, &defn.name, source))?;
		self.run("set property", |d| d.write_property(id, &defn, value))
	}

	/// Writes through a structured address: a whole property, a structure
	/// member or a list entry. `None` unsets a property or clears a member.
	pub fn set_member(&mut self, id: ElementId, addr: &MemberRef, value: Option<PropertyValue>) -> Result<()> {
		let defn = self.addressed_property(id, addr)?;
		if addr.hops().is_empty() {
			return self.set_property(id, &defn.name, value);
		}
		let value = if addr.is_item() {
			let Some(value) = value else {
				return Err(AddressError::ClearListItem {
					path: addr.to_string(),
				}
				.into());
			};
			Some(validate_item(self.schema(), addr.leaf_defn(), value))
				.transpose()
				.map_err(|source| value_error(id, &addr.to_string(), source))?
		} else {
			let structure = addr
				.owner_struct()
				.and_then(|s| self.schema().structure(s))
				.ok_or_else(|| AddressError::NotAStructure {
					path: addr.to_string(),
					member: addr.leaf_defn().name.clone(),
				})?;
			validate_member_write(self.schema(), structure, &addr.leaf_defn().name, value)
				.map_err(|source| value_error(id, &addr.to_string(), source))?
		};

		let mut root = self.element(id)?.local(&defn.name).cloned();
		addr.set_value(&mut root, value)?;
		let root = self.revalidate(id, addr, &defn, root)?;
		self.run("set member", |d| d.write_property(id, &defn, root))
	}

	/// Inserts `item` at `index` into the list addressed by `addr`.
	pub fn insert_item(&mut self, id: ElementId, addr: &MemberRef, index: usize, item: PropertyValue) -> Result<()> {
		let defn = self.addressed_property(id, addr)?;
		let item = validate_item(self.schema(), addr.leaf_defn(), item)
			.map_err(|source| value_error(id, &format!("{addr}[{index}]"), source))?;
		let mut root = self.element(id)?.local(&defn.name).cloned();
		addr.insert_item(&mut root, index, item)?;
		let root = self.revalidate(id, addr, &defn, root)?;
		self.run("insert item", |d| d.write_property(id, &defn, root))
	}

	/// Removes the list entry addressed by `addr` and returns it.
	pub fn remove_item(&mut self, id: ElementId, addr: &MemberRef) -> Result<PropertyValue> {
		let defn = self.addressed_property(id, addr)?;
		let mut root = self.element(id)?.local(&defn.name).cloned();
		let removed = addr.remove_item(&mut root)?;
		let root = self.revalidate(id, addr, &defn, root)?;
		self.run("remove item", |d| d.write_property(id, &defn, root))?;
		Ok(removed)
	}

	/// Moves an entry of the list addressed by `addr` from `from` to `to`.
	pub fn move_item(&mut self, id: ElementId, addr: &MemberRef, from: usize, to: usize) -> Result<()> {
		let defn = self.addressed_property(id, addr)?;
		let mut root = self.element(id)?.local(&defn.name).cloned();
		addr.move_item(&mut root, from, to)?;
		let root = self.revalidate(id, addr, &defn, root)?;
		self.run("move item", |d| d.write_property(id, &defn, root))
	}

	/// Checks that `addr` belongs to the kind of `id` and is writable.
	fn addressed_property(&self, id: ElementId, addr: &MemberRef) -> Result<Arc<PropertyDefn>> {
		let defn = self.property_defn(id, addr.property_name())?;
		let theirs = addr.property();
		if !Arc::ptr_eq(theirs, &defn) && (theirs.ty != defn.ty || theirs.flags != defn.flags) {
			return Err(AddressError::ForeignProperty {
				path: addr.to_string(),
				kind: self.element(id)?.kind().to_string(),
			}
			.into());
		}
		self.check_writable(id)?;
		if defn.is_element_container() {
			return Err(ContainmentError::ElementValued {
				property: defn.name.clone(),
			}
			.into());
		}
		Ok(defn)
	}

	/// Validates the whole property value after an edit below its root.
	///
	/// Structures created along the way must still carry their required members.
	fn revalidate(
		&self,
		id: ElementId,
		addr: &MemberRef,
		defn: &PropertyDefn,
		root: Option<PropertyValue>,
	) -> Result<Option<PropertyValue>> {
		root.map(|v| validate_value(self.schema(), defn, v))
			.transpose()
			.map_err(|source| value_error(id, &addr.to_string(), source))
	}

	/// Stores a validated property value, resolving its references first.
	///
	/// Must run inside a transaction.
	pub(crate) fn write_property(
		&mut self,
		id: ElementId,
		defn: &PropertyDefn,
		value: Option<PropertyValue>,
	) -> Result<()> {
		let module = self.element(id)?.module();
		let mut value = value;
		if let Some(v) = value.as_mut() {
			self.resolve_refs(module, defn, v)?;
		}

		let is_extends = defn.name == EXTENDS_PROP;
		if (is_extends || defn.name == STYLE_PROP)
			&& let Some(target) = value
				.as_ref()
				.and_then(|v| v.as_ref_value())
				.and_then(|r| r.target)
		{
			self.check_ref_cycle(id, &defn.name, target)?;
			if is_extends && self.has_local_content(id) {
				return Err(ContainmentError::HasLocalContent { element: id }.into());
			}
		}

		if !self.store_property(id, &defn.name, value)? {
			return Ok(());
		}
		if is_extends {
			self.refresh_virtual_content(id)?;
			self.refresh_dependents(id)?;
		}
		if self.is_style(id) {
			self.broadcast_style_change(id)?;
		}
		Ok(())
	}

	/// Replaces the local value and keeps client registrations in step.
	///
	/// Returns `false` if the value was already equal.
	pub(crate) fn store_property(
		&mut self,
		id: ElementId,
		property: &str,
		value: Option<PropertyValue>,
	) -> Result<bool> {
		let old = self.element(id)?.local(property).cloned();
		if old == value {
			return Ok(false);
		}
		for target in ref_targets(old.as_ref()) {
			self.drop_client(target, id, property)?;
		}
		let added = ref_targets(value.as_ref());
		self.apply(Record::SetProperty {
			element: id,
			property: property.to_string(),
			old,
			new: value,
		})?;
		for target in added {
			self.add_client(target, id, property)?;
		}
		Ok(true)
	}

	/// Returns true if `id.property = target` passes the structural checks
	/// applied to `extends` and `style` writes.
	pub(crate) fn can_link(&self, id: ElementId, property: &str, target: ElementId) -> bool {
		match property {
			EXTENDS_PROP => {
				!self.has_local_content(id) && self.check_ref_cycle(id, property, target).is_ok()
			}
			STYLE_PROP => self.check_ref_cycle(id, property, target).is_ok(),
			_ => true,
		}
	}

	fn has_local_content(&self, id: ElementId) -> bool {
		self.graph().get(id).is_some_and(|el| {
			el.slots
				.iter()
				.flatten()
				.any(|c| self.graph().get(*c).is_some_and(|child| !child.is_virtual()))
		})
	}

	/// Returns true if `id` is of the schema's style kind.
	pub(crate) fn is_style(&self, id: ElementId) -> bool {
		let Some(style_kind) = self.schema().style_kind() else {
			return false;
		};
		self.graph()
			.get(id)
			.is_some_and(|el| self.schema().is_kind_of(el.kind(), style_kind))
	}

	/// Tells every element using the shared style `style` that it changed.
	pub(crate) fn broadcast_style_change(&mut self, style: ElementId) -> Result<()> {
		let clients: Vec<ElementId> = self
			.element(style)?
			.back_refs()
			.iter()
			.filter(|b| b.property == STYLE_PROP)
			.map(|b| b.client)
			.collect();
		debug!(style = %style, clients = clients.len(), "style change broadcast");
		for client in clients {
			self.emit(Notification::StyleChanged { client, style })?;
		}
		Ok(())
	}
}

/// Resolved targets of every reference inside `value`.
pub(crate) fn ref_targets(value: Option<&PropertyValue>) -> SmallVec<[ElementId; 4]> {
	let mut out = SmallVec::new();
	if let Some(value) = value {
		value.visit_refs(&mut |_, r| {
			if let Some(target) = r.target {
				out.push(target);
			}
		});
	}
	out
}

fn value_error(element: ElementId, member: &str, source: ValueError) -> ModelError {
	ModelError::Value {
		element,
		member: member.to_string(),
		source,
	}
}
