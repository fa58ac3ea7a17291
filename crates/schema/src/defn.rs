//! Element, property, slot and structure definitions.
//!
//! Definitions are plain data assembled by the embedding application (or by a
//! test) and handed to [`SchemaBuilder`](crate::SchemaBuilder). The builder
//! resolves base-kind inheritance and fills the lookup tables that the
//! accessors on this page read from.

use std::sync::Arc;

use bitflags::bitflags;
use indexmap::IndexMap;
use quire_primitives::PropertyValue;

/// Name of the implicit property holding an element's "extends" parent.
pub const EXTENDS_PROP: &str = "extends";

/// Name of the implicit property holding an element's shared style.
pub const STYLE_PROP: &str = "style";

/// Custom validator attached to a property definition.
pub type ValueValidator = fn(&PropertyValue) -> Result<(), String>;

/// Container-specific content rule consulted before an insertion.
pub type ContentValidator = fn(&ContentCheck<'_>) -> Result<(), String>;

bitflags! {
	/// Behavioural flags of a property or structure member.
	#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
	pub struct PropertyFlags: u16 {
		/// The value is a list of items of the property type.
		const LIST = 1 << 0;
		/// Unset values are looked up along the extends chain.
		const INHERITABLE = 1 << 1;
		/// Style property: cascades through styles, selectors and session defaults.
		const STYLE = 1 << 2;
		/// Structure member that must not be blank.
		const REQUIRED = 1 << 3;
		/// An explicit null may be written.
		const NULLABLE = 1 << 4;
	}
}

/// Value type of a property or structure member.
#[derive(Debug, Clone, PartialEq)]
pub enum PropertyType {
	Bool,
	Int,
	Float,
	String,
	/// String restricted to a fixed set of choices.
	Choice(Vec<String>),
	/// By-name reference to an element of the given kind (or a sub-kind).
	ElementRef { target: String },
	/// Embedded structure of the named structure definition.
	Structure { defn: String },
	/// Owned sub-element of one of the given kinds.
	Element { kinds: Vec<String> },
}

impl PropertyType {
	/// Human-readable description used in error messages.
	pub fn describe(&self) -> String {
		match self {
			PropertyType::Bool => "bool".to_string(),
			PropertyType::Int => "int".to_string(),
			PropertyType::Float => "float".to_string(),
			PropertyType::String => "string".to_string(),
			PropertyType::Choice(_) => "choice".to_string(),
			PropertyType::ElementRef { target } => format!("reference to {target}"),
			PropertyType::Structure { defn } => format!("structure {defn}"),
			PropertyType::Element { kinds } => format!("element of {}", kinds.join("|")),
		}
	}
}

/// Definition of a property or of a structure member.
#[derive(Debug, Clone)]
pub struct PropertyDefn {
	pub name: String,
	pub ty: PropertyType,
	pub flags: PropertyFlags,
	/// Inclusive lower bound for numeric values.
	pub min: Option<f64>,
	/// Inclusive upper bound for numeric values.
	pub max: Option<f64>,
	/// Schema default reported when nothing in the cascade sets a value.
	pub default: Option<PropertyValue>,
	pub validator: Option<ValueValidator>,
}

impl PropertyDefn {
	/// Creates a definition with no flags, bounds or default.
	pub fn new(name: impl Into<String>, ty: PropertyType) -> Self {
		Self {
			name: name.into(),
			ty,
			flags: PropertyFlags::empty(),
			min: None,
			max: None,
			default: None,
			validator: None,
		}
	}

	/// Adds flags.
	pub fn with_flags(mut self, flags: PropertyFlags) -> Self {
		self.flags |= flags;
		self
	}

	/// Marks the property list-valued.
	pub fn list(self) -> Self {
		self.with_flags(PropertyFlags::LIST)
	}

	/// Marks the property as a style property.
	pub fn style(self) -> Self {
		self.with_flags(PropertyFlags::STYLE)
	}

	/// Marks the property inheritable along the extends chain.
	pub fn inheritable(self) -> Self {
		self.with_flags(PropertyFlags::INHERITABLE)
	}

	/// Marks a structure member required.
	pub fn required(self) -> Self {
		self.with_flags(PropertyFlags::REQUIRED)
	}

	/// Allows explicit nulls.
	pub fn nullable(self) -> Self {
		self.with_flags(PropertyFlags::NULLABLE)
	}

	/// Sets inclusive numeric bounds.
	pub fn with_range(mut self, min: Option<f64>, max: Option<f64>) -> Self {
		self.min = min;
		self.max = max;
		self
	}

	/// Sets the schema default.
	pub fn with_default(mut self, value: impl Into<PropertyValue>) -> Self {
		self.default = Some(value.into());
		self
	}

	/// Sets a custom validator.
	pub fn with_validator(mut self, validator: ValueValidator) -> Self {
		self.validator = Some(validator);
		self
	}

	#[inline]
	pub fn is_list(&self) -> bool {
		self.flags.contains(PropertyFlags::LIST)
	}

	#[inline]
	pub fn is_style(&self) -> bool {
		self.flags.contains(PropertyFlags::STYLE)
	}

	/// Style properties and `INHERITABLE` properties both follow the extends chain.
	#[inline]
	pub fn can_inherit(&self) -> bool {
		self.flags
			.intersects(PropertyFlags::STYLE | PropertyFlags::INHERITABLE)
	}

	#[inline]
	pub fn is_required(&self) -> bool {
		self.flags.contains(PropertyFlags::REQUIRED)
	}

	#[inline]
	pub fn allows_null(&self) -> bool {
		self.flags.contains(PropertyFlags::NULLABLE)
	}

	/// Structure definition name for structure-typed properties.
	pub fn struct_name(&self) -> Option<&str> {
		match &self.ty {
			PropertyType::Structure { defn } => Some(defn),
			_ => None,
		}
	}

	/// Target kind for element-reference properties.
	pub fn ref_target(&self) -> Option<&str> {
		match &self.ty {
			PropertyType::ElementRef { target } => Some(target),
			_ => None,
		}
	}

	/// Allowed kinds for element-typed (owned sub-element) properties.
	pub fn element_kinds(&self) -> Option<&[String]> {
		match &self.ty {
			PropertyType::Element { kinds } => Some(kinds),
			_ => None,
		}
	}

	/// Returns true for element-typed properties.
	pub fn is_element_container(&self) -> bool {
		matches!(self.ty, PropertyType::Element { .. })
	}
}

/// Multiplicity of a containment slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cardinality {
	/// At most one content element.
	Single,
	/// Unbounded ordered content.
	Multiple,
}

/// Definition of a named, ordered containment slot.
#[derive(Debug, Clone)]
pub struct SlotDefn {
	pub name: String,
	/// Kinds accepted as content; sub-kinds are accepted too.
	pub kinds: Vec<String>,
	pub cardinality: Cardinality,
	/// Predefined selector style applied to content of this slot.
	pub selector: Option<String>,
	/// The selector name is suffixed with the nesting depth of repeated
	/// containers of the same slot (`group-header-1`, `group-header-2`, ...).
	pub nested_selector: bool,
}

impl SlotDefn {
	/// Creates a slot with unbounded cardinality and no selector.
	pub fn new<I, S>(name: impl Into<String>, kinds: I) -> Self
	where
		I: IntoIterator<Item = S>,
		S: Into<String>,
	{
		Self {
			name: name.into(),
			kinds: kinds.into_iter().map(Into::into).collect(),
			cardinality: Cardinality::Multiple,
			selector: None,
			nested_selector: false,
		}
	}

	/// Restricts the slot to a single content element.
	pub fn single(mut self) -> Self {
		self.cardinality = Cardinality::Single;
		self
	}

	/// Sets the slot selector.
	pub fn with_selector(mut self, selector: impl Into<String>) -> Self {
		self.selector = Some(selector.into());
		self
	}

	/// Enables depth-suffixed selector names.
	pub fn nested(mut self) -> Self {
		self.nested_selector = true;
		self
	}

	#[inline]
	pub fn is_single(&self) -> bool {
		self.cardinality == Cardinality::Single
	}
}

/// Inputs handed to a container's [`ContentValidator`].
pub struct ContentCheck<'a> {
	pub container_kind: &'a str,
	/// Slot or element-typed property receiving the content.
	pub slot: &'a str,
	pub candidate_kind: &'a str,
	/// Kinds of the content already present, in order.
	pub existing: &'a [&'a str],
	/// Insertion position.
	pub position: usize,
	/// Effective property values of the container.
	pub container_property: &'a dyn Fn(&str) -> Option<PropertyValue>,
	/// Effective property values of the candidate.
	pub candidate_property: &'a dyn Fn(&str) -> Option<PropertyValue>,
}

/// Definition of a structure layout.
#[derive(Debug, Clone)]
pub struct StructDefn {
	pub name: String,
	pub members: Vec<PropertyDefn>,
	pub(crate) resolved: IndexMap<String, Arc<PropertyDefn>>,
}

impl StructDefn {
	pub fn new(name: impl Into<String>) -> Self {
		Self {
			name: name.into(),
			members: Vec::new(),
			resolved: IndexMap::new(),
		}
	}

	/// Adds a member definition.
	pub fn with_member(mut self, member: PropertyDefn) -> Self {
		self.members.push(member);
		self
	}

	/// Looks up a member definition. Only available on registered definitions.
	pub fn member(&self, name: &str) -> Option<&Arc<PropertyDefn>> {
		self.resolved.get(name)
	}

	/// Iterates over member definitions in declaration order.
	pub fn member_defns(&self) -> impl Iterator<Item = &Arc<PropertyDefn>> {
		self.resolved.values()
	}
}

/// Definition of an element kind.
#[derive(Debug, Clone)]
pub struct ElementDefn {
	pub name: String,
	/// Base kind whose properties and slots this kind inherits.
	pub base: Option<String>,
	pub properties: Vec<PropertyDefn>,
	pub slots: Vec<SlotDefn>,
	/// Name space in which element names must be unique.
	pub name_space: Option<String>,
	/// Elements of this kind may extend another element of the same kind.
	pub extendable: bool,
	/// Elements of this kind may reference a shared style.
	pub styled: bool,
	/// Predefined selector style named after this kind.
	pub selector: Option<String>,
	pub content_validator: Option<ContentValidator>,
	pub(crate) resolved_props: IndexMap<String, Arc<PropertyDefn>>,
	pub(crate) resolved_slots: Vec<SlotDefn>,
	pub(crate) ancestry: Vec<String>,
}

impl ElementDefn {
	pub fn new(name: impl Into<String>) -> Self {
		Self {
			name: name.into(),
			base: None,
			properties: Vec::new(),
			slots: Vec::new(),
			name_space: None,
			extendable: false,
			styled: false,
			selector: None,
			content_validator: None,
			resolved_props: IndexMap::new(),
			resolved_slots: Vec::new(),
			ancestry: Vec::new(),
		}
	}

	pub fn with_base(mut self, base: impl Into<String>) -> Self {
		self.base = Some(base.into());
		self
	}

	pub fn with_property(mut self, property: PropertyDefn) -> Self {
		self.properties.push(property);
		self
	}

	pub fn with_slot(mut self, slot: SlotDefn) -> Self {
		self.slots.push(slot);
		self
	}

	pub fn with_name_space(mut self, name_space: impl Into<String>) -> Self {
		self.name_space = Some(name_space.into());
		self
	}

	pub fn extendable(mut self) -> Self {
		self.extendable = true;
		self
	}

	pub fn styled(mut self) -> Self {
		self.styled = true;
		self
	}

	pub fn with_selector(mut self, selector: impl Into<String>) -> Self {
		self.selector = Some(selector.into());
		self
	}

	pub fn with_content_validator(mut self, validator: ContentValidator) -> Self {
		self.content_validator = Some(validator);
		self
	}

	/// Looks up a property definition, including inherited and implicit ones.
	pub fn property(&self, name: &str) -> Option<&Arc<PropertyDefn>> {
		self.resolved_props.get(name)
	}

	/// Iterates over all property definitions in resolution order.
	pub fn property_defns(&self) -> impl Iterator<Item = &Arc<PropertyDefn>> {
		self.resolved_props.values()
	}

	/// All slots, base slots first. Slot indices are positions in this slice.
	pub fn slot_defns(&self) -> &[SlotDefn] {
		&self.resolved_slots
	}

	/// Looks up a slot by name.
	pub fn slot(&self, name: &str) -> Option<(usize, &SlotDefn)> {
		self.resolved_slots
			.iter()
			.enumerate()
			.find(|(_, s)| s.name == name)
	}

	/// Returns true if this kind is `kind` or derives from it.
	pub fn is_kind_of(&self, kind: &str) -> bool {
		self.name == kind || self.ancestry.iter().any(|a| a == kind)
	}

	/// Base kinds, nearest first.
	pub fn ancestry(&self) -> &[String] {
		&self.ancestry
	}

	/// Returns true if any slot or element-typed property can hold content.
	pub fn is_container(&self) -> bool {
		!self.resolved_slots.is_empty()
			|| self
				.resolved_props
				.values()
				.any(|p| p.is_element_container())
	}
}
