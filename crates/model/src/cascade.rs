//! Effective property values.
//!
//! Resolution tries each source in turn and stops at the first value found:
//!
//! 1. the element's local value, then its shared style for style properties,
//! 2. for inheritable properties, the same lookup on the parent chain
//!    (extends parents, or virtual parents for virtual content),
//! 3. for style properties, the selector style named after the element kind,
//! 4. for style properties, the selector style of the containing slot,
//! 5. for style properties, the session default,
//! 6. the schema default.
//!
//! Resolution never mutates the design. [`Design::resolve_owned`] is the one
//! exception and only repairs container bookkeeping of owned sub-elements.

use std::sync::Arc;

use quire_primitives::{ElementId, PropertyValue};
use quire_schema::PropertyDefn;
use rustc_hash::FxHashSet as HashSet;
use tracing::trace;

use crate::containment::ContainerContext;
use crate::design::Design;
use crate::element::DesignElement;
use crate::error::{ModelError, Result};


/// Where a resolved value came from.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ValueSource {
	/// Set on the element itself.
	Local(ElementId),
	/// Set on the shared style `.0` used by the element or one of its parents.
	Style(ElementId),
	/// Set on the extends or virtual parent `.0`.
	Inherited(ElementId),
	/// Set on the selector style with the given name.
	Selector(String),
	SessionDefault,
	SchemaDefault,
}

/// An effective value together with its source.
#[derive(Debug, Clone, PartialEq)]
pub struct Resolved {
	pub value: PropertyValue,
	pub source: ValueSource,
}

impl Resolved {
	fn new(value: &PropertyValue, source: ValueSource) -> Self {
		Self {
			value: value.clone(),
			source,
		}
	}
}

/// Read-only cascade over one design.
#[derive(Clone, Copy)]
pub struct Resolver<'a> {
	design: &'a Design,
}

impl<'a> Resolver<'a> {
	pub fn new(design: &'a Design) -> Self {
		Self { design }
	}

	/// Resolves `property` on `element`.
	///
	/// `Ok(None)` means the property is unset everywhere; an explicit null is
	/// returned as `PropertyValue::Null`.
	pub fn resolve(&self, element: ElementId, property: &str) -> Result<Option<Resolved>> {
		let el = self.design.element(element)?;
		let defn = self
			.design
			.schema()
			.property(el.kind(), property)
			.ok_or_else(|| ModelError::UnknownProperty {
				kind: el.kind().to_string(),
				property: property.to_string(),
			})?;
		Ok(self.resolve_defn(el, defn))
	}

	/// Effective value of `property`, or `None` if unset or unknown.
	pub fn value(&self, element: ElementId, property: &str) -> Option<PropertyValue> {
		self.resolve(element, property).ok().flatten().map(|r| r.value)
	}

	/// Resolves an already looked-up property definition.
	pub fn resolve_defn(&self, el: &DesignElement, defn: &Arc<PropertyDefn>) -> Option<Resolved> {
		let name = defn.name.as_str();
		if let Some(found) = self.own_value(el, defn, ValueSource::Local(el.id())) {
			return Some(found);
		}

		if defn.can_inherit() {
			let mut seen = HashSet::default();
			seen.insert(el.id());
			let mut cur = el.parent();
			while let Some(id) = cur {
				if !seen.insert(id) {
					break;
				}
				let Some(parent) = self.design.graph().get(id) else {
					break;
				};
				if let Some(found) = self.own_value(parent, defn, ValueSource::Inherited(id)) {
					return Some(found);
				}
				cur = parent.parent();
			}
		}

		if defn.is_style() {
			if let Some(found) = self.kind_selector(el, name) {
				return Some(found);
			}
			if let Some(found) = self.slot_selector(el, name) {
				return Some(found);
			}
			if let Some(value) = self.design.defaults().get(name) {
				return Some(Resolved {
					value,
					source: ValueSource::SessionDefault,
				});
			}
		}

		defn.default
			.as_ref()
			.map(|v| Resolved::new(v, ValueSource::SchemaDefault))
	}

	/// Local value, or the shared style's value for style properties.
	fn own_value(&self, el: &DesignElement, defn: &PropertyDefn, source: ValueSource) -> Option<Resolved> {
		if let Some(v) = el.local(&defn.name) {
			return Some(Resolved::new(v, source));
		}
		if !defn.is_style() {
			return None;
		}
		let style = el.style()?.target?;
		let v = self.design.graph().get(style)?.local(&defn.name)?;
		Some(Resolved::new(v, ValueSource::Style(style)))
	}

	fn kind_selector(&self, el: &DesignElement, property: &str) -> Option<Resolved> {
		let defn = self.design.schema().element(el.kind())?;
		let selector = defn.selector.as_deref().unwrap_or(el.kind());
		self.selector_value(el, selector, property)
	}

	fn slot_selector(&self, el: &DesignElement, property: &str) -> Option<Resolved> {
		let ctx = el.container()?;
		let slot_index = ctx.slot_index()?;
		let owner = self.design.graph().get(ctx.owner())?;
		let slot = self
			.design
			.schema()
			.element(owner.kind())?
			.slot_defns()
			.get(slot_index)?;
		let base = slot.selector.as_deref()?;
		if slot.nested_selector {
			let depth = self.nesting_depth(ctx);
			self.selector_value(el, &format!("{base}-{depth}"), property)
		} else {
			self.selector_value(el, base, property)
		}
	}

	/// Number of same-kind containers from the owner outwards, capped.
	fn nesting_depth(&self, ctx: &ContainerContext) -> usize {
		let graph = self.design.graph();
		let Some(kind) = graph.get(ctx.owner()).map(|o| o.kind()) else {
			return 1;
		};
		let outer = graph
			.ancestors(ctx.owner())
			.into_iter()
			.filter(|id| graph.get(*id).is_some_and(|e| e.kind() == kind))
			.count();
		(outer + 1).min(self.design.config().selector_depth_cap.max(1))
	}

	fn selector_value(&self, el: &DesignElement, selector: &str, property: &str) -> Option<Resolved> {
		let style_kind = self.design.schema().style_kind()?;
		let id = self.design.find_element(el.module(), style_kind, selector)?;
		let style = self.design.graph().get(id)?;
		if !self.design.schema().is_kind_of(style.kind(), style_kind) {
			return None;
		}
		let v = style.local(property)?;
		trace!(element = %el.id(), selector, property, "selector style matched");
		Some(Resolved::new(v, ValueSource::Selector(selector.to_string())))
	}
}

impl Design {
	/// Read-only resolver over this design.
	pub fn resolver(&self) -> Resolver<'_> {
		Resolver::new(self)
	}

	/// Resolves `property` on `element` through the full cascade.
	pub fn resolve(&self, element: ElementId, property: &str) -> Result<Option<Resolved>> {
		self.resolver().resolve(element, property)
	}

	/// Effective value of `property` on `element`.
	pub fn resolve_value(&self, element: ElementId, property: &str) -> Result<Option<PropertyValue>> {
		Ok(self.resolve(element, property)?.map(|r| r.value))
	}

	/// Resolves an element-typed property and reattaches the returned owned
	/// sub-elements to `element`.
	///
	/// Sub-elements held locally whose container bookkeeping does not name
	/// `element` and `property` are repaired in place. Repeating the call
	/// changes nothing further.
	pub fn resolve_owned(&mut self, element: ElementId, property: &str) -> Result<Option<Resolved>> {
		let resolved = self.resolve(element, property)?;
		if let Some(r) = &resolved
			&& r.source == ValueSource::Local(element)
		{
			let ctx = ContainerContext::property(element, property);
			let mut owned = Vec::new();
			r.value.visit_elements(&mut |id| owned.push(id));
			for id in owned {
				if self.graph().get(id).and_then(|e| e.container()) != Some(&ctx) {
					trace!(element = %id, container = %ctx, "owned sub-element reattached");
					self.graph_mut().set_container(id, Some(ctx.clone()));
				}
			}
		}
		Ok(resolved)
	}
}
