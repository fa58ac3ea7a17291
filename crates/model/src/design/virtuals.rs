//! Virtual content materialised from extends parents.
//!
//! An element that extends a parent shows the parent's slot content as
//! virtual children. Each virtual child records the element it mirrors as
//! its virtual parent and resolves unset properties through it. Virtual
//! children can carry local property overrides but cannot be restructured.

use quire_primitives::{ElementId, ModuleId};
use quire_schema::EXTENDS_PROP;
use rustc_hash::FxHashSet as HashSet;
use tracing::trace;

use super::Design;
use crate::activity::Record;
use crate::element::DesignElement;
use crate::error::Result;

impl Design {
	/// Brings the virtual children of `id` in line with its extends parent.
	///
	/// Existing virtual children are kept (with their local overrides) when
	/// the element they mirror is still present; others are destroyed.
	pub(crate) fn refresh_virtual_content(&mut self, id: ElementId) -> Result<()> {
		let Some(el) = self.graph().get(id) else {
			return Ok(());
		};
		let source = el
			.extends()
			.and_then(|r| r.target)
			.filter(|t| self.graph().contains(*t));
		self.sync_virtual(id, source)
	}

	fn sync_virtual(&mut self, target: ElementId, source: Option<ElementId>) -> Result<()> {
		let module = self.element(target)?.module();
		let slot_count = self.element(target)?.slots.len();
		for slot in 0..slot_count {
			let desired: Vec<ElementId> = source
				.and_then(|s| self.graph().get(s))
				.map(|s| s.slot(slot).to_vec())
				.unwrap_or_default();

			let current = self.element(target)?.slot(slot).to_vec();
			for (index, child) in current.iter().enumerate().rev() {
				let Some(vp) = self.graph().get(*child).and_then(|c| c.virtual_parent()) else {
					continue;
				};
				if desired.contains(&vp) {
					continue;
				}
				self.apply(Record::SlotRemove {
					owner: target,
					slot,
					index,
					element: *child,
				})?;
				self.destroy_detached(*child)?;
			}

			for (pos, &mirrored) in desired.iter().enumerate() {
				let current = self.element(target)?.slot(slot).to_vec();
				let existing = current.iter().position(|c| {
					self.graph()
						.get(*c)
						.is_some_and(|e| e.virtual_parent() == Some(mirrored))
				});
				let child = match existing {
					Some(at) => {
						let child = current[at];
						if at != pos {
							self.apply(Record::SlotMove {
								owner: target,
								slot,
								from: at,
								to: pos,
								element: child,
							})?;
						}
						child
					}
					None => {
						let child = self.materialise(module, mirrored)?;
						self.apply(Record::SlotInsert {
							owner: target,
							slot,
							index: pos,
							element: child,
						})?;
						child
					}
				};
				self.sync_virtual(child, Some(mirrored))?;
			}
		}
		Ok(())
	}

	/// Creates a detached virtual copy of `mirrored` in `module`.
	fn materialise(&mut self, module: ModuleId, mirrored: ElementId) -> Result<ElementId> {
		let src = self.element(mirrored)?;
		let defn = self.kind_defn(src.kind())?;
		let name = src.name.clone();
		let id = self.graph_mut().next_id();
		let mut element = DesignElement::new(id, &defn, module);
		element.name = name;
		element.name_space = None;
		element.virtual_parent = Some(mirrored);
		self.apply(Record::Create {
			element: Box::new(element),
		})?;
		trace!(element = %id, mirrored = %mirrored, "virtual element materialised");
		Ok(id)
	}

	/// Refreshes every element whose virtual content mirrors `changed` or
	/// one of its containers, transitively.
	pub(crate) fn refresh_dependents(&mut self, changed: ElementId) -> Result<()> {
		let mut visited = HashSet::default();
		self.refresh_dependents_inner(changed, &mut visited)
	}

	fn refresh_dependents_inner(&mut self, changed: ElementId, visited: &mut HashSet<ElementId>) -> Result<()> {
		let mut chain = vec![changed];
		chain.extend(self.graph().ancestors(changed));
		for e in chain {
			let Some(el) = self.graph().get(e) else {
				continue;
			};
			let mut extenders: Vec<ElementId> = el
				.back_refs()
				.iter()
				.filter(|b| b.property == EXTENDS_PROP)
				.map(|b| b.client)
				.collect();
			extenders.dedup();
			for x in extenders {
				if !visited.insert(x) {
					continue;
				}
				self.refresh_virtual_content(x)?;
				self.refresh_dependents_inner(x, visited)?;
			}
		}
		Ok(())
	}

	/// Refreshes the virtual content of every extending element.
	pub(crate) fn refresh_all_virtual(&mut self) -> Result<()> {
		let mut extending: Vec<ElementId> = self
			.graph()
			.elements()
			.filter(|e| e.extends().is_some_and(|r| r.is_resolved()))
			.map(DesignElement::id)
			.collect();
		extending.sort_unstable();
		for id in extending {
			self.refresh_virtual_content(id)?;
		}
		Ok(())
	}
}
