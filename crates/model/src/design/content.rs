//! Content insertion and reordering.

use quire_primitives::{ElementId, PropertyValue};
use tracing::debug;

use super::Design;
use crate::activity::Record;
use crate::containment::{ContainerContext, ContentSlot};
use crate::error::{ContainmentError, Result};

impl Design {
	/// Inserts the detached `element` into `ctx` at `index`, or appends it.
	pub fn add(&mut self, ctx: &ContainerContext, element: ElementId, index: Option<usize>) -> Result<()> {
		if self.element(element)?.container().is_some() {
			return Err(ContainmentError::AlreadyContained { element }.into());
		}
		let index = ctx.check_element(self, element, index)?;
		self.run("add content", |d| d.attach(ctx, element, index))
	}

	/// Moves `element` out of its current container into `ctx` at `index`.
	pub fn move_to(&mut self, element: ElementId, ctx: &ContainerContext, index: Option<usize>) -> Result<()> {
		let Some(from) = self.element(element)?.container().cloned() else {
			return self.add(ctx, element, index);
		};
		if from == *ctx {
			let Some(at) = ctx.index_of(self, element) else {
				return Err(ContainmentError::NotContained {
					element,
					container: ctx.owner(),
					slot: ctx.label(self),
				}
				.into());
			};
			let last = ctx.count(self).saturating_sub(1);
			return self.move_content(ctx, at, index.unwrap_or(last).min(last));
		}
		self.check_restructure(&from)?;
		self.run("move element", |d| {
			d.detach(element, &from)?;
			let index = ctx.check_element(d, element, index)?;
			d.attach(ctx, element, index)?;
			d.refresh_dependents(from.owner())
		})
	}

	/// Moves the content at position `from` of `ctx` to position `to`.
	///
	/// The element is taken out and reinserted at `to` in one step, so the
	/// entries between the two positions shift by one.
	pub fn move_content(&mut self, ctx: &ContainerContext, from: usize, to: usize) -> Result<()> {
		self.check_restructure(ctx)?;
		let contents = ctx.contents(self);
		let len = contents.len();
		for index in [from, to] {
			if index >= len {
				return Err(ContainmentError::IndexOutOfRange { index, len }.into());
			}
		}
		if from == to {
			return Ok(());
		}
		let element = contents[from];
		self.run("move content", |d| {
			match ctx.content_slot() {
				ContentSlot::Slot(slot) => d.apply(Record::SlotMove {
					owner: ctx.owner(),
					slot: *slot,
					from,
					to,
					element,
				})?,
				ContentSlot::Property(name) => {
					let old = d.element(ctx.owner())?.local(name).cloned();
					let Some(PropertyValue::List(mut items)) = old.clone() else {
						return Err(ContainmentError::IndexOutOfRange { index: from, len }.into());
					};
					let item = items.remove(from);
					items.insert(to, item);
					d.apply(Record::SetProperty {
						element: ctx.owner(),
						property: name.clone(),
						old,
						new: Some(PropertyValue::List(items)),
					})?;
				}
			}
			d.refresh_dependents(ctx.owner())
		})
	}

	/// Rejects reordering or removal inside virtual, inherited or read-only content.
	fn check_restructure(&self, ctx: &ContainerContext) -> Result<()> {
		let owner = self.element(ctx.owner())?;
		if self.is_sealed(owner.module()) {
			return Err(ContainmentError::ReadOnlyModule {
				container: ctx.owner(),
				module: owner.module(),
			}
			.into());
		}
		if owner.is_virtual() {
			return Err(ContainmentError::VirtualElement { element: ctx.owner() }.into());
		}
		if ctx.slot_index().is_some() && owner.extends().is_some_and(|r| r.is_resolved()) {
			return Err(ContainmentError::InheritedContent { container: ctx.owner() }.into());
		}
		Ok(())
	}

	/// Records the insertion of a validated, detached element.
	fn attach(&mut self, ctx: &ContainerContext, element: ElementId, index: usize) -> Result<()> {
		match ctx.content_slot() {
			ContentSlot::Slot(slot) => self.apply(Record::SlotInsert {
				owner: ctx.owner(),
				slot: *slot,
				index,
				element,
			})?,
			ContentSlot::Property(name) => {
				let defn = self.property_defn(ctx.owner(), name)?;
				let old = self.element(ctx.owner())?.local(name).cloned();
				let new = if defn.is_list() {
					let mut items = old
						.as_ref()
						.and_then(PropertyValue::as_list)
						.map(<[PropertyValue]>::to_vec)
						.unwrap_or_default();
					items.insert(index.min(items.len()), PropertyValue::Element(element));
					PropertyValue::List(items)
				} else {
					PropertyValue::Element(element)
				};
				self.apply(Record::SetProperty {
					element: ctx.owner(),
					property: name.clone(),
					old,
					new: Some(new),
				})?;
				self.apply(Record::SetContainer {
					element,
					old: None,
					new: Some(ctx.clone()),
				})?;
			}
		}
		debug!(element = %element, container = %ctx, index, "content added");
		self.refresh_dependents(ctx.owner())
	}
}
