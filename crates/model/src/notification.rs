//! Change notifications delivered to design listeners.

use quire_primitives::ElementId;

use crate::containment::ContainerContext;

/// What happened to a container's content.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ContentAction {
	Added,
	Removed,
	Moved,
}

/// A change to the design graph.
///
/// Notifications raised inside a transaction are buffered and delivered after
/// the outermost commit; a rollback discards them. Undo and redo deliver the
/// notifications of the records they replay.
#[derive(Debug, Clone, PartialEq)]
pub enum Notification {
	PropertyChanged {
		element: ElementId,
		property: String,
	},
	ContentChanged {
		container: ContainerContext,
		element: ElementId,
		action: ContentAction,
	},
	NameChanged {
		element: ElementId,
		old: Option<String>,
		new: Option<String>,
	},
	ElementCreated {
		element: ElementId,
	},
	ElementDestroyed {
		element: ElementId,
	},
	/// A reference held by `client` lost its target and is unresolved again.
	ReferenceInvalidated {
		client: ElementId,
		property: String,
		/// Name the reference keeps as its lookup key.
		name: String,
	},
	/// The shared style used by `client` changed, was renamed or went away.
	StyleChanged {
		client: ElementId,
		style: ElementId,
	},
}

impl Notification {
	/// Element primarily affected by this notification.
	pub fn element(&self) -> ElementId {
		match self {
			Notification::PropertyChanged { element, .. }
			| Notification::NameChanged { element, .. }
			| Notification::ElementCreated { element }
			| Notification::ElementDestroyed { element } => *element,
			Notification::ContentChanged { container, .. } => container.owner(),
			Notification::ReferenceInvalidated { client, .. }
			| Notification::StyleChanged { client, .. } => *client,
		}
	}
}

/// Receiver of design notifications.
///
/// Listeners run synchronously after the transaction bookkeeping is complete
/// and cannot reach back into the design.
pub trait DesignListener {
	fn on_notification(&mut self, event: &Notification);
}

impl<F> DesignListener for F
where
	F: FnMut(&Notification),
{
	fn on_notification(&mut self, event: &Notification) {
		self(event)
	}
}
