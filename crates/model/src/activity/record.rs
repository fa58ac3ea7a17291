//! Primitive, invertible mutations of the design graph.

use quire_primitives::{ElementId, PropertyValue};

use crate::containment::ContainerContext;
use crate::element::{BackRef, DesignElement};
use crate::graph::Graph;
use crate::notification::{ContentAction, Notification};

/// One primitive mutation together with everything needed to invert it.
///
/// Records are created only after validation, so replaying a record (or its
/// inverse) against the state it was recorded in cannot fail.
#[derive(Debug, Clone, PartialEq)]
pub enum Record {
	Create {
		element: Box<DesignElement>,
	},
	Destroy {
		element: Box<DesignElement>,
	},
	SetProperty {
		element: ElementId,
		property: String,
		old: Option<PropertyValue>,
		new: Option<PropertyValue>,
	},
	SetName {
		element: ElementId,
		old: Option<String>,
		new: Option<String>,
	},
	SetContainer {
		element: ElementId,
		old: Option<ContainerContext>,
		new: Option<ContainerContext>,
	},
	SlotInsert {
		owner: ElementId,
		slot: usize,
		index: usize,
		element: ElementId,
	},
	SlotRemove {
		owner: ElementId,
		slot: usize,
		index: usize,
		element: ElementId,
	},
	SlotMove {
		owner: ElementId,
		slot: usize,
		from: usize,
		to: usize,
		element: ElementId,
	},
	BackRefAdd {
		target: ElementId,
		index: usize,
		back_ref: BackRef,
	},
	BackRefDrop {
		target: ElementId,
		index: usize,
		back_ref: BackRef,
	},
}

impl Record {
	/// Returns the record that undoes this one.
	pub fn inverse(&self) -> Record {
		match self {
			Record::Create { element } => Record::Destroy {
				element: element.clone(),
			},
			Record::Destroy { element } => Record::Create {
				element: element.clone(),
			},
			Record::SetProperty {
				element,
				property,
				old,
				new,
			} => Record::SetProperty {
				element: *element,
				property: property.clone(),
				old: new.clone(),
				new: old.clone(),
			},
			Record::SetName { element, old, new } => Record::SetName {
				element: *element,
				old: new.clone(),
				new: old.clone(),
			},
			Record::SetContainer { element, old, new } => Record::SetContainer {
				element: *element,
				old: new.clone(),
				new: old.clone(),
			},
			Record::SlotInsert {
				owner,
				slot,
				index,
				element,
			} => Record::SlotRemove {
				owner: *owner,
				slot: *slot,
				index: *index,
				element: *element,
			},
			Record::SlotRemove {
				owner,
				slot,
				index,
				element,
			} => Record::SlotInsert {
				owner: *owner,
				slot: *slot,
				index: *index,
				element: *element,
			},
			Record::SlotMove {
				owner,
				slot,
				from,
				to,
				element,
			} => Record::SlotMove {
				owner: *owner,
				slot: *slot,
				from: *to,
				to: *from,
				element: *element,
			},
			Record::BackRefAdd {
				target,
				index,
				back_ref,
			} => Record::BackRefDrop {
				target: *target,
				index: *index,
				back_ref: back_ref.clone(),
			},
			Record::BackRefDrop {
				target,
				index,
				back_ref,
			} => Record::BackRefAdd {
				target: *target,
				index: *index,
				back_ref: back_ref.clone(),
			},
		}
	}

	/// Applies the record to `graph`.
	pub fn apply(&self, graph: &mut Graph) {
		match self {
			Record::Create { element } => graph.insert_element((**element).clone()),
			Record::Destroy { element } => graph.remove_element(element.id),
			Record::SetProperty {
				element,
				property,
				new,
				..
			} => graph.set_prop(*element, property, new.clone()),
			Record::SetName { element, new, .. } => graph.set_name(*element, new.clone()),
			Record::SetContainer { element, new, .. } => graph.set_container(*element, new.clone()),
			Record::SlotInsert {
				owner,
				slot,
				index,
				element,
			} => graph.slot_insert(*owner, *slot, *index, *element),
			Record::SlotRemove {
				owner, slot, index, ..
			} => graph.slot_remove(*owner, *slot, *index),
			Record::SlotMove {
				owner,
				slot,
				from,
				to,
				..
			} => graph.slot_move(*owner, *slot, *from, *to),
			Record::BackRefAdd {
				target,
				index,
				back_ref,
			} => graph.back_ref_insert(*target, *index, back_ref.clone()),
			Record::BackRefDrop { target, index, .. } => graph.back_ref_remove(*target, *index),
		}
	}

	/// Notification raised when this record is applied.
	pub fn notification(&self) -> Option<Notification> {
		match self {
			Record::Create { element } => Some(Notification::ElementCreated {
				element: element.id,
			}),
			Record::Destroy { element } => Some(Notification::ElementDestroyed {
				element: element.id,
			}),
			Record::SetProperty {
				element, property, ..
			} => Some(Notification::PropertyChanged {
				element: *element,
				property: property.clone(),
			}),
			Record::SetName { element, old, new } => Some(Notification::NameChanged {
				element: *element,
				old: old.clone(),
				new: new.clone(),
			}),
			Record::SetContainer { element, old, new } => {
				let (container, action) = match (new, old) {
					(Some(ctx), _) => (ctx.clone(), ContentAction::Added),
					(None, Some(ctx)) => (ctx.clone(), ContentAction::Removed),
					(None, None) => return None,
				};
				Some(Notification::ContentChanged {
					container,
					element: *element,
					action,
				})
			}
			Record::SlotInsert {
				owner,
				slot,
				element,
				..
			} => Some(content_changed(*owner, *slot, *element, ContentAction::Added)),
			Record::SlotRemove {
				owner,
				slot,
				element,
				..
			} => Some(content_changed(*owner, *slot, *element, ContentAction::Removed)),
			Record::SlotMove {
				owner,
				slot,
				element,
				..
			} => Some(content_changed(*owner, *slot, *element, ContentAction::Moved)),
			Record::BackRefAdd { .. } | Record::BackRefDrop { .. } => None,
		}
	}
}

fn content_changed(owner: ElementId, slot: usize, element: ElementId, action: ContentAction) -> Notification {
	Notification::ContentChanged {
		container: ContainerContext::slot(owner, slot),
		element,
		action,
	}
}
