//! Name-based references and the client registrations kept on their targets.
//!
//! A resolved reference in a property of `client` registers a [`BackRef`]
//! on its target. The target only ever reaches its clients through these
//! registrations: on rename or removal it visits each one and either moves
//! the reference along or flips it back to an unresolved name.

use quire_primitives::{ElementId, ElementRef, ModuleId, PropertyValue, split_qualified};
use quire_schema::{EXTENDS_PROP, PropertyDefn, STYLE_PROP, SchemaRegistry};
use rustc_hash::FxHashSet as HashSet;
use tracing::{debug, warn};

use crate::activity::Record;
use crate::config::RenamePolicy;
use crate::design::Design;
use crate::element::BackRef;
use crate::error::{ReferenceError, Result};
use crate::notification::Notification;


/// Why a target's clients are being revisited.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum RefCause {
	Renamed,
	Removed,
}

/// Calls `f` for every reference inside `value`, paired with the definition
/// that declares its target kind.
fn walk_refs_mut(
	schema: &SchemaRegistry,
	defn: &PropertyDefn,
	value: &mut PropertyValue,
	f: &mut dyn FnMut(&PropertyDefn, &mut ElementRef) -> Result<()>,
) -> Result<()> {
	match value {
		PropertyValue::Ref(r) if defn.ref_target().is_some() => f(defn, r),
		PropertyValue::List(items) => {
			for item in items {
				walk_refs_mut(schema, defn, item, f)?;
			}
			Ok(())
		}
		PropertyValue::Structure(s) => {
			let Some(layout) = schema.structure(s.defn()) else {
				return Ok(());
			};
			for (name, member) in s.members_mut() {
				if let Some(member_defn) = layout.member(name) {
					walk_refs_mut(schema, member_defn, member, f)?;
				}
			}
			Ok(())
		}
		_ => Ok(()),
	}
}

impl Design {
	/// Looks up an element by (optionally qualified) name in the name space of
	/// `target_kind`, as seen from `module`.
	///
	/// `lib.name` looks in the library included as `lib`; plain names look in
	/// `module` itself.
	pub fn find_element(&self, module: ModuleId, target_kind: &str, name: &str) -> Option<ElementId> {
		let space = self.schema().element(target_kind)?.name_space.as_deref()?;
		if let (Some(ns), local) = split_qualified(name)
			&& let Some(library) = self.graph().module_by_name_space(ns)
			&& let Some(found) = self.graph().lookup(library.id, space, local)
		{
			return Some(found);
		}
		self.graph().lookup(module, space, name)
	}

	/// Name under which elements of `from` refer to `target`.
	pub fn ref_name(&self, from: ModuleId, target: ElementId) -> Option<String> {
		let el = self.graph().get(target)?;
		let name = el.name()?;
		if el.module() == from {
			return Some(name.to_string());
		}
		let ns = self.graph().module(el.module())?.name_space.as_deref()?;
		Some(format!("{ns}.{name}"))
	}

	/// Returns true if any client refers to `target`.
	pub fn has_references(&self, target: ElementId) -> bool {
		self.graph()
			.get(target)
			.is_some_and(|e| !e.back_refs().is_empty())
	}

	/// Distinct `(client, property)` pairs registered on `target`.
	pub fn clients(&self, target: ElementId) -> Vec<(ElementId, String)> {
		let mut out: Vec<(ElementId, String)> = Vec::new();
		if let Some(el) = self.graph().get(target) {
			for b in el.back_refs() {
				if !out.iter().any(|(c, p)| *c == b.client && *p == b.property) {
					out.push((b.client, b.property.clone()));
				}
			}
		}
		out
	}

	/// Registers `client` as referring to `target` through `property`.
	pub(crate) fn add_client(&mut self, target: ElementId, client: ElementId, property: &str) -> Result<()> {
		let Some(el) = self.graph().get(target) else {
			warn!(target = %target, client = %client, property, "client registration on missing target skipped");
			return Ok(());
		};
		let index = el.back_refs().len();
		self.apply(Record::BackRefAdd {
			target,
			index,
			back_ref: BackRef::new(client, property),
		})
	}

	/// Drops one registration of `client` through `property` from `target`.
	pub(crate) fn drop_client(&mut self, target: ElementId, client: ElementId, property: &str) -> Result<()> {
		let back_ref = BackRef::new(client, property);
		let index = self
			.graph()
			.get(target)
			.and_then(|el| el.back_refs().iter().position(|b| *b == back_ref));
		let Some(index) = index else {
			warn!(target = %target, client = %client, property, "client registration not found");
			return Ok(());
		};
		self.apply(Record::BackRefDrop {
			target,
			index,
			back_ref,
		})
	}

	/// Releases every registration held by the properties of `id`.
	pub(crate) fn sever_outgoing(&mut self, id: ElementId) -> Result<()> {
		let mut held = Vec::new();
		if let Some(el) = self.graph().get(id) {
			for (property, value) in el.locals() {
				value.visit_refs(&mut |_, r| {
					if let Some(target) = r.target {
						held.push((target, property.to_string()));
					}
				});
			}
		}
		for (target, property) in held {
			self.drop_client(target, id, &property)?;
		}
		Ok(())
	}

	/// Resolves every reference in `value` by name.
	///
	/// `extends` must resolve; other references that find no target stay
	/// unresolved by name. A target of the wrong kind is an error.
	pub(crate) fn resolve_refs(&self, module: ModuleId, defn: &PropertyDefn, value: &mut PropertyValue) -> Result<()> {
		walk_refs_mut(self.schema(), defn, value, &mut |defn, r| {
			let Some(target_kind) = defn.ref_target() else {
				return Ok(());
			};
			match self.find_element(module, target_kind, &r.name) {
				Some(found) => {
					self.check_target_kind(defn, &r.name, found)?;
					r.target = Some(found);
				}
				None if defn.name == EXTENDS_PROP => {
					return Err(ReferenceError::Unresolved {
						property: defn.name.clone(),
						name: r.name.clone(),
					}
					.into());
				}
				None => r.target = None,
			}
			Ok(())
		})
	}

	fn check_target_kind(&self, defn: &PropertyDefn, name: &str, found: ElementId) -> Result<()> {
		let (Some(expected), Some(el)) = (defn.ref_target(), self.graph().get(found)) else {
			return Ok(());
		};
		if self.schema().is_kind_of(el.kind(), expected) {
			return Ok(());
		}
		Err(ReferenceError::WrongKind {
			property: defn.name.clone(),
			name: name.to_string(),
			expected: expected.to_string(),
			found: el.kind().to_string(),
		}
		.into())
	}

	/// Rejects `element.property = target` when following `property` from
	/// `target` leads back to `element`.
	pub(crate) fn check_ref_cycle(&self, element: ElementId, property: &str, target: ElementId) -> Result<()> {
		let mut seen = HashSet::default();
		let mut cur = Some(target);
		while let Some(id) = cur {
			if id == element {
				return Err(ReferenceError::Cycle {
					element,
					target,
					property: property.to_string(),
				}
				.into());
			}
			if !seen.insert(id) {
				break;
			}
			cur = self
				.graph()
				.get(id)
				.and_then(|e| e.local(property))
				.and_then(PropertyValue::as_ref_value)
				.and_then(|r| r.target);
		}
		Ok(())
	}

	/// Revisits every client of `target` after it was renamed or is about
	/// to be removed.
	///
	/// On rename with [`RenamePolicy::Follow`] references take the new name.
	/// Otherwise they become unresolved, keeping their name, and are
	/// re-resolved against another element carrying that name if there is
	/// one. Style clients get [`Notification::StyleChanged`]; other clients
	/// whose reference became unresolved get
	/// [`Notification::ReferenceInvalidated`].
	pub(crate) fn update_client_references(&mut self, target: ElementId, cause: RefCause) -> Result<()> {
		let clients = self.clients(target);
		if clients.is_empty() {
			return Ok(());
		}
		debug!(target = %target, ?cause, clients = clients.len(), "updating client references");

		for (client, property) in clients {
			let Some(el) = self.graph().get(client) else {
				warn!(client = %client, target = %target, "registered client no longer exists");
				continue;
			};
			let Some(mut value) = el.local(&property).cloned() else {
				warn!(client = %client, property, "registered client property is unset");
				continue;
			};
			let module = el.module();
			let Some(defn) = self.schema().property(el.kind(), &property).cloned() else {
				continue;
			};
			let follow = match cause {
				RefCause::Renamed if self.config().rename_policy == RenamePolicy::Follow => {
					self.ref_name(module, target)
				}
				_ => None,
			};

			let mut invalidated = Vec::new();
			walk_refs_mut(self.schema(), &defn, &mut value, &mut |defn, r| {
				if r.target != Some(target) {
					return Ok(());
				}
				if let Some(name) = &follow {
					r.name = name.clone();
					return Ok(());
				}
				r.target = defn
					.ref_target()
					.and_then(|kind| self.find_element(module, kind, &r.name))
					.filter(|found| *found != target)
					.filter(|found| self.check_target_kind(defn, &r.name, *found).is_ok());
				if r.target.is_none() {
					invalidated.push(r.name.clone());
				}
				Ok(())
			})?;

			self.store_property(client, &property, Some(value))?;
			if property == STYLE_PROP {
				self.emit(Notification::StyleChanged {
					client,
					style: target,
				})?;
			} else {
				for name in invalidated {
					self.emit(Notification::ReferenceInvalidated {
						client,
						property: property.clone(),
						name,
					})?;
				}
			}
			if property == EXTENDS_PROP {
				self.refresh_virtual_content(client)?;
				self.refresh_dependents(client)?;
			}
		}
		Ok(())
	}

	/// Resolves references still waiting for their target.
	///
	/// With `name` set, only references whose (local) name matches are tried.
	pub(crate) fn resolve_pending(&mut self, name: Option<&str>) -> Result<()> {
		let mut updates = Vec::new();
		for el in self.graph().elements() {
			for (property, value) in el.locals() {
				let mut pending = false;
				value.visit_refs(&mut |_, r| {
					pending |= r.target.is_none()
						&& name.is_none_or(|n| split_qualified(&r.name).1 == n);
				});
				if !pending {
					continue;
				}
				let Some(defn) = self.schema().property(el.kind(), property) else {
					continue;
				};
				let mut next = value.clone();
				walk_refs_mut(self.schema(), defn, &mut next, &mut |defn, r| {
					if r.target.is_none()
						&& let Some(kind) = defn.ref_target()
						&& let Some(found) = self.find_element(el.module(), kind, &r.name)
						&& self.check_target_kind(defn, &r.name, found).is_ok()
						&& self.can_link(el.id(), &defn.name, found)
					{
						r.target = Some(found);
					}
					Ok(())
				})?;
				if next != *value {
					updates.push((el.id(), property.to_string(), next));
				}
			}
		}
		updates.sort_by(|a, b| (a.0, &a.1).cmp(&(b.0, &b.1)));

		for (id, property, value) in updates {
			debug!(element = %id, property, "pending reference resolved");
			self.store_property(id, &property, Some(value))?;
			if property == EXTENDS_PROP {
				self.refresh_virtual_content(id)?;
				self.refresh_dependents(id)?;
			}
		}
		Ok(())
	}

	/// References that currently have no target, ordered by element.
	pub fn unresolved_references(&self) -> Vec<(ElementId, String, String)> {
		let mut out = Vec::new();
		for el in self.graph().elements() {
			for (property, value) in el.locals() {
				value.visit_refs(&mut |_, r| {
					if r.target.is_none() {
						out.push((el.id(), property.to_string(), r.name.clone()));
					}
				});
			}
		}
		out.sort();
		out
	}
}
