//! Error types for the design model.

use quire_primitives::{ElementId, ModuleId};
use quire_schema::ValueError;
use thiserror::Error;

/// Coarse classification of a [`ModelError`] for callers that translate
/// model failures into their own error surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
	/// Insert, move or remove violates containment rules.
	Containment,
	/// A written value fails its property or member definition.
	Value,
	/// A reference cannot be resolved, would form a cycle, or a name clashes.
	Reference,
	/// Misuse of the transaction stack.
	Transaction,
	/// A structured address does not fit its property definition or value.
	Address,
	/// Unknown element, kind, property or module.
	Lookup,
}

/// Errors returned by design model operations.
#[derive(Debug, Clone, Error)]
pub enum ModelError {
	#[error(transparent)]
	Containment(#[from] ContainmentError),

	#[error("invalid value for {member} on {element}: {source}")]
	Value {
		element: ElementId,
		/// Address of the offending property, member or list entry.
		member: String,
		source: ValueError,
	},

	#[error("invalid session default for '{property}': {source}")]
	InvalidDefault { property: String, source: ValueError },

	#[error(transparent)]
	Reference(#[from] ReferenceError),

	#[error(transparent)]
	Transaction(#[from] TransactionError),

	#[error(transparent)]
	Address(#[from] AddressError),

	#[error("unknown element {0}")]
	UnknownElement(ElementId),

	#[error("unknown element kind {0}")]
	UnknownKind(String),

	#[error("element kind {kind} has no property '{property}'")]
	UnknownProperty { kind: String, property: String },

	#[error("unknown module {0}")]
	UnknownModule(ModuleId),

	#[error("{element} belongs to read-only {module}")]
	ReadOnly { element: ElementId, module: ModuleId },
}

impl ModelError {
	/// Returns the taxonomy bucket of this error.
	pub fn kind(&self) -> ErrorKind {
		match self {
			ModelError::Containment(_) | ModelError::ReadOnly { .. } => ErrorKind::Containment,
			ModelError::Value { .. } | ModelError::InvalidDefault { .. } => ErrorKind::Value,
			ModelError::Reference(_) => ErrorKind::Reference,
			ModelError::Transaction(_) => ErrorKind::Transaction,
			ModelError::Address(_) => ErrorKind::Address,
			ModelError::UnknownElement(_)
			| ModelError::UnknownKind(_)
			| ModelError::UnknownProperty { .. }
			| ModelError::UnknownModule(_) => ErrorKind::Lookup,
		}
	}

	/// Element the error is about, when there is one.
	pub fn element(&self) -> Option<ElementId> {
		match self {
			ModelError::Value { element, .. }
			| ModelError::ReadOnly { element, .. }
			| ModelError::UnknownElement(element) => Some(*element),
			ModelError::Containment(e) => e.element(),
			ModelError::Reference(ReferenceError::Cycle { element, .. }) => Some(*element),
			_ => None,
		}
	}
}

/// Result type for design model operations.
pub type Result<T> = std::result::Result<T, ModelError>;

/// Containment violations. Always detected before any mutation.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ContainmentError {
	#[error("{container} has no slot or element property '{slot}'")]
	UnknownSlot { container: ElementId, slot: String },

	#[error("'{slot}' of {container} cannot hold {kind}")]
	KindNotAllowed {
		container: ElementId,
		slot: String,
		kind: String,
	},

	#[error("'{slot}' of {container} already holds its single element")]
	SlotFull { container: ElementId, slot: String },

	#[error("{container} is in read-only {module}")]
	ReadOnlyModule { container: ElementId, module: ModuleId },

	#[error("content of {container} is inherited and cannot be restructured")]
	InheritedContent { container: ElementId },

	#[error("{element} is virtual and cannot be restructured")]
	VirtualElement { element: ElementId },

	#[error("'{slot}' of {container} rejects {kind}: {reason}")]
	Rejected {
		container: ElementId,
		slot: String,
		kind: String,
		reason: String,
	},

	#[error("{element} and {container} belong to different modules")]
	CrossModule { element: ElementId, container: ElementId },

	#[error("{element} already has a container")]
	AlreadyContained { element: ElementId },

	#[error("{element} is not content of '{slot}' of {container}")]
	NotContained {
		element: ElementId,
		container: ElementId,
		slot: String,
	},

	#[error("{element} cannot be placed inside itself or its own content")]
	Cycle { element: ElementId },

	#[error("position {index} out of range (length {len})")]
	IndexOutOfRange { index: usize, len: usize },

	#[error("'{property}' holds content; edit it through its container context")]
	ElementValued { property: String },

	#[error("{element} is a module root")]
	ModuleRoot { element: ElementId },

	#[error("{element} has local content and cannot extend another element")]
	HasLocalContent { element: ElementId },
}

impl ContainmentError {
	fn element(&self) -> Option<ElementId> {
		match self {
			ContainmentError::VirtualElement { element }
			| ContainmentError::CrossModule { element, .. }
			| ContainmentError::AlreadyContained { element }
			| ContainmentError::NotContained { element, .. }
			| ContainmentError::Cycle { element }
			| ContainmentError::ModuleRoot { element }
			| ContainmentError::HasLocalContent { element } => Some(*element),
			ContainmentError::UnknownSlot { container, .. }
			| ContainmentError::KindNotAllowed { container, .. }
			| ContainmentError::SlotFull { container, .. }
			| ContainmentError::ReadOnlyModule { container, .. }
			| ContainmentError::InheritedContent { container }
			| ContainmentError::Rejected { container, .. } => Some(*container),
			ContainmentError::IndexOutOfRange { .. } | ContainmentError::ElementValued { .. } => {
				None
			}
		}
	}
}

/// Reference violations.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ReferenceError {
	#[error("'{property}' refers to unknown element '{name}'")]
	Unresolved { property: String, name: String },

	#[error("'{property}' expects a {expected}, but '{name}' is a {found}")]
	WrongKind {
		property: String,
		name: String,
		expected: String,
		found: String,
	},

	#[error("{element} cannot refer to {target} through '{property}': it would form a cycle")]
	Cycle {
		element: ElementId,
		target: ElementId,
		property: String,
	},

	#[error("name '{name}' is already used in name space '{space}'")]
	DuplicateName { name: String, space: String },
}

/// Transaction stack misuse. These are programming errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransactionError {
	#[error("no active transaction")]
	NoActiveTransaction,

	#[error("handle (depth {expected}) is not the innermost transaction; stack is at depth {depth}")]
	Mismatch { expected: usize, depth: usize },

	#[error("persistent transaction '{label}' cannot nest inside an undoable transaction")]
	PersistentInsideUndoable { label: String },

	#[error("undo and redo are not available while {depth} transaction(s) are active")]
	Active { depth: usize },
}

/// Structured address construction and navigation failures.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AddressError {
	#[error("{path} is not a list and cannot be indexed")]
	NotAList { path: String },

	#[error("{path} is not a structure; it has no member '{member}'")]
	NotAStructure { path: String, member: String },

	#[error("structure {structure} has no member '{member}'")]
	UnknownMember { structure: String, member: String },

	#[error("{path} cannot be extended further")]
	TooDeep { path: String },

	#[error("index {index} out of range for {path} (length {len})")]
	IndexOutOfRange {
		path: String,
		index: usize,
		len: usize,
	},

	#[error("{path} has no value to navigate into")]
	MissingValue { path: String },

	#[error("list entry {path} cannot be cleared; remove it instead")]
	ClearListItem { path: String },

	#[error("{path} does not address a list entry")]
	NotAnItem { path: String },

	#[error("{path} addresses a property foreign to element kind {kind}")]
	ForeignProperty { path: String, kind: String },
}
