use thiserror::Error;

/// Errors detected while building a [`SchemaRegistry`](crate::SchemaRegistry).
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SchemaError {
	#[error("duplicate element definition: {0}")]
	DuplicateElement(String),

	#[error("duplicate structure definition: {0}")]
	DuplicateStructure(String),

	#[error("duplicate property '{property}' on {owner}")]
	DuplicateProperty { owner: String, property: String },

	#[error("duplicate slot '{slot}' on {element}")]
	DuplicateSlot { element: String, slot: String },

	#[error("{element} extends unknown base kind {base}")]
	UnknownBase { element: String, base: String },

	#[error("cyclic base chain through {0}")]
	CyclicBase(String),

	#[error("{owner} refers to unknown structure {structure}")]
	UnknownStructure { owner: String, structure: String },

	#[error("{owner} refers to unknown element kind {kind}")]
	UnknownKind { owner: String, kind: String },

	#[error("{element} is styled but the schema declares no style kind")]
	MissingStyleKind { element: String },

	#[error("structure {structure} nests structures deeper than two levels")]
	NestingTooDeep { structure: String },

	#[error("invalid default for '{property}' on {owner}: {source}")]
	InvalidDefault {
		owner: String,
		property: String,
		source: ValueError,
	},
}

/// A value rejected by its property or member definition.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValueError {
	#[error("type mismatch for '{property}': expected {expected}, got {got}")]
	TypeMismatch {
		property: String,
		expected: String,
		got: &'static str,
	},

	#[error("invalid choice '{value}' for '{property}' (allowed: {allowed:?})")]
	InvalidChoice {
		property: String,
		value: String,
		allowed: Vec<String>,
	},

	#[error("value {value} out of range for '{property}'")]
	OutOfRange {
		property: String,
		value: f64,
		min: Option<f64>,
		max: Option<f64>,
	},

	#[error("'{property}' does not allow null")]
	NullNotAllowed { property: String },

	#[error("required member '{member}' of {structure} is blank")]
	RequiredMemberBlank { structure: String, member: String },

	#[error("{structure} has no member '{member}'")]
	UnknownMember { structure: String, member: String },

	#[error("'{property}' expects structure {expected}, got {got}")]
	WrongStructure {
		property: String,
		expected: String,
		got: String,
	},

	#[error("invalid value for '{property}': {reason}")]
	Invalid { property: String, reason: String },
}
