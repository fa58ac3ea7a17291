//! Structured addresses into property values.
//!
//! A [`MemberRef`] names a property, a member of a structure held by that
//! property, or an entry of a (possibly nested) list. Its [`RefShape`] is one
//! of ten fixed forms and determines exactly which hops are taken when the
//! address is read or written:
//!
//! ```text
//! property                    property[n]
//! property.member             property.member.member
//! property.member[n]          property.member[n].member
//! property[n].member          property[n].member[n]
//! property[n].member[n].member
//! property[n].member.member
//! ```
//!
//! Extending an address by one hop recomputes the shape through
//! [`RefShape::extend`], a pure table lookup. Extending with a hop the shape
//! or the property definition cannot take is a programming error: the
//! `try_*` constructors report it as [`AddressError`], the plain ones panic.

use std::fmt;
use std::sync::Arc;

use quire_primitives::{PropertyValue, Structure};
use quire_schema::{PropertyDefn, SchemaRegistry};
use smallvec::SmallVec;

use crate::error::AddressError;


/// Kind of a single addressing hop.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HopKind {
	/// Entry of a list.
	Index,
	/// Member of a structure.
	Member,
}

/// The ten addressing shapes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RefShape {
	/// `property`
	Property,
	/// `property[n]`
	PropertyIndex,
	/// `property.member`
	PropertyMember,
	/// `property.member.member`
	PropertyMemberMember,
	/// `property.member[n]`
	PropertyMemberIndex,
	/// `property.member[n].member`
	PropertyMemberIndexMember,
	/// `property[n].member`
	PropertyIndexMember,
	/// `property[n].member[n]`
	PropertyIndexMemberIndex,
	/// `property[n].member[n].member`
	PropertyIndexMemberIndexMember,
	/// `property[n].member.member`
	PropertyIndexMemberMember,
}

impl RefShape {
	/// Every shape, in order of increasing hop count.
	pub const ALL: [RefShape; 10] = [
		RefShape::Property,
		RefShape::PropertyIndex,
		RefShape::PropertyMember,
		RefShape::PropertyMemberMember,
		RefShape::PropertyMemberIndex,
		RefShape::PropertyIndexMember,
		RefShape::PropertyMemberIndexMember,
		RefShape::PropertyIndexMemberIndex,
		RefShape::PropertyIndexMemberMember,
		RefShape::PropertyIndexMemberIndexMember,
	];

	/// Shape obtained by appending `hop`, or `None` if no shape has that form.
	pub const fn extend(self, hop: HopKind) -> Option<RefShape> {
		use HopKind::{Index, Member};
		use RefShape::*;
		match (self, hop) {
			(Property, Index) => Some(PropertyIndex),
			(Property, Member) => Some(PropertyMember),
			(PropertyIndex, Member) => Some(PropertyIndexMember),
			(PropertyMember, Member) => Some(PropertyMemberMember),
			(PropertyMember, Index) => Some(PropertyMemberIndex),
			(PropertyMemberIndex, Member) => Some(PropertyMemberIndexMember),
			(PropertyIndexMember, Index) => Some(PropertyIndexMemberIndex),
			(PropertyIndexMember, Member) => Some(PropertyIndexMemberMember),
			(PropertyIndexMemberIndex, Member) => Some(PropertyIndexMemberIndexMember),
			_ => None,
		}
	}

	/// Hops taken after the property, in order.
	pub const fn hops(self) -> &'static [HopKind] {
		use HopKind::{Index, Member};
		match self {
			RefShape::Property => &[],
			RefShape::PropertyIndex => &[Index],
			RefShape::PropertyMember => &[Member],
			RefShape::PropertyMemberMember => &[Member, Member],
			RefShape::PropertyMemberIndex => &[Member, Index],
			RefShape::PropertyMemberIndexMember => &[Member, Index, Member],
			RefShape::PropertyIndexMember => &[Index, Member],
			RefShape::PropertyIndexMemberIndex => &[Index, Member, Index],
			RefShape::PropertyIndexMemberIndexMember => &[Index, Member, Index, Member],
			RefShape::PropertyIndexMemberMember => &[Index, Member, Member],
		}
	}

	/// Number of list indices in the shape (at most two).
	pub fn list_depth(self) -> usize {
		self.hops().iter().filter(|h| **h == HopKind::Index).count()
	}
}

/// One hop of a [`MemberRef`].
#[derive(Debug, Clone)]
pub enum RefHop {
	Index(usize),
	Member(Arc<PropertyDefn>),
}

impl RefHop {
	pub fn kind(&self) -> HopKind {
		match self {
			RefHop::Index(_) => HopKind::Index,
			RefHop::Member(_) => HopKind::Member,
		}
	}
}

impl PartialEq for RefHop {
	fn eq(&self, other: &Self) -> bool {
		match (self, other) {
			(RefHop::Index(a), RefHop::Index(b)) => a == b,
			(RefHop::Member(a), RefHop::Member(b)) => a.name == b.name,
			_ => false,
		}
	}
}

impl Eq for RefHop {}

/// Immutable structured address of a property, structure member or list entry.
#[derive(Debug, Clone)]
pub struct MemberRef {
	property: Arc<PropertyDefn>,
	hops: SmallVec<[RefHop; 4]>,
	shape: RefShape,
}

impl MemberRef {
	/// Addresses a whole property.
	pub fn new(property: Arc<PropertyDefn>) -> Self {
		Self {
			property,
			hops: SmallVec::new(),
			shape: RefShape::Property,
		}
	}

	#[inline]
	pub fn shape(&self) -> RefShape {
		self.shape
	}

	/// Definition of the addressed property.
	#[inline]
	pub fn property(&self) -> &Arc<PropertyDefn> {
		&self.property
	}

	#[inline]
	pub fn property_name(&self) -> &str {
		&self.property.name
	}

	pub fn hops(&self) -> &[RefHop] {
		&self.hops
	}

	/// Definition of the last named hop (the property or the last member).
	pub fn leaf_defn(&self) -> &Arc<PropertyDefn> {
		self.hops
			.iter()
			.rev()
			.find_map(|h| match h {
				RefHop::Member(d) => Some(d),
				RefHop::Index(_) => None,
			})
			.unwrap_or(&self.property)
	}

	/// Returns true if the address ends in a list index.
	pub fn is_item(&self) -> bool {
		matches!(self.hops.last(), Some(RefHop::Index(_)))
	}

	/// Returns true if the address names a whole list.
	pub fn is_list(&self) -> bool {
		!self.is_item() && self.leaf_defn().is_list()
	}

	/// Structure definition that owns the leaf member, for member addresses.
	pub fn owner_struct(&self) -> Option<&str> {
		if !matches!(self.hops.last(), Some(RefHop::Member(_))) {
			return None;
		}
		let named: SmallVec<[&Arc<PropertyDefn>; 4]> = std::iter::once(&self.property)
			.chain(self.hops.iter().filter_map(|h| match h {
				RefHop::Member(d) => Some(d),
				RefHop::Index(_) => None,
			}))
			.collect();
		named
			.len()
			.checked_sub(2)
			.and_then(|i| named[i].struct_name())
	}

	/// Address without its last hop.
	pub fn parent(&self) -> Option<MemberRef> {
		let (_, init) = self.hops.split_last()?;
		let mut out = MemberRef::new(self.property.clone());
		for hop in init {
			out.push(hop.clone());
		}
		Some(out)
	}

	/// Extends the address with a list index.
	pub fn try_index(&self, index: usize) -> Result<MemberRef, AddressError> {
		if !self.is_list() {
			return Err(AddressError::NotAList {
				path: self.to_string(),
			});
		}
		let mut out = self.clone();
		out.shape = self
			.shape
			.extend(HopKind::Index)
			.ok_or_else(|| AddressError::TooDeep {
				path: self.to_string(),
			})?;
		out.hops.push(RefHop::Index(index));
		Ok(out)
	}

	/// Extends the address with a structure member.
	pub fn try_member(&self, schema: &SchemaRegistry, member: &str) -> Result<MemberRef, AddressError> {
		let leaf = self.leaf_defn();
		let structure = match leaf.struct_name() {
			Some(name) if !self.is_list() => name,
			_ => {
				return Err(AddressError::NotAStructure {
					path: self.to_string(),
					member: member.to_string(),
				});
			}
		};
		let defn = schema
			.structure(structure)
			.and_then(|s| s.member(member))
			.ok_or_else(|| AddressError::UnknownMember {
				structure: structure.to_string(),
				member: member.to_string(),
			})?;
		let mut out = self.clone();
		out.shape = self
			.shape
			.extend(HopKind::Member)
			.ok_or_else(|| AddressError::TooDeep {
				path: self.to_string(),
			})?;
		out.hops.push(RefHop::Member(defn.clone()));
		Ok(out)
	}

	/// Panicking form of [`try_index`](Self::try_index).
	///
	/// # Panics
	///
	/// Panics if the address does not name a list or no shape can take the hop.
	#[track_caller]
	pub fn index(&self, index: usize) -> MemberRef {
		match self.try_index(index) {
			Ok(r) => r,
			Err(e) => panic!("invalid address extension: {e}"),
		}
	}

	/// Panicking form of [`try_member`](Self::try_member).
	///
	/// # Panics
	///
	/// Panics if the address does not name a single structure, the member is
	/// unknown, or no shape can take the hop.
	#[track_caller]
	pub fn member(&self, schema: &SchemaRegistry, member: &str) -> MemberRef {
		match self.try_member(schema, member) {
			Ok(r) => r,
			Err(e) => panic!("invalid address extension: {e}"),
		}
	}

	fn push(&mut self, hop: RefHop) {
		if let Some(shape) = self.shape.extend(hop.kind()) {
			self.shape = shape;
			self.hops.push(hop);
		}
	}

	/// Reads the addressed value from a property value.
	///
	/// Addresses naming a list return the list itself.
	pub fn get_value<'v>(&self, root: Option<&'v PropertyValue>) -> Option<&'v PropertyValue> {
		let mut cur = root?;
		for hop in &self.hops {
			cur = match hop {
				RefHop::Index(i) => cur.as_list()?.get(*i)?,
				RefHop::Member(d) => cur.as_structure()?.get(&d.name)?,
			};
		}
		Some(cur)
	}

	/// Reads the addressed value as a structure.
	pub fn get_structure<'v>(&self, root: Option<&'v PropertyValue>) -> Option<&'v Structure> {
		self.get_value(root)?.as_structure()
	}

	/// Reads the addressed value as a list.
	pub fn get_list<'v>(&self, root: Option<&'v PropertyValue>) -> Option<&'v [PropertyValue]> {
		self.get_value(root)?.as_list()
	}

	/// Writes `value` at the address and returns the previous value.
	///
	/// Missing structures along the path are created empty; missing list
	/// entries are an error. `None` unsets a property or clears a member.
	pub fn set_value(
		&self,
		root: &mut Option<PropertyValue>,
		value: Option<PropertyValue>,
	) -> Result<Option<PropertyValue>, AddressError> {
		let Some((last, init)) = self.hops.split_last() else {
			return Ok(std::mem::replace(root, value));
		};
		let parent = self.navigate_mut(root, init, true)?;
		match last {
			RefHop::Index(i) => {
				let Some(value) = value else {
					return Err(AddressError::ClearListItem {
						path: self.to_string(),
					});
				};
				let slot = self.entry_mut(parent, *i)?;
				Ok(Some(std::mem::replace(slot, value)))
			}
			RefHop::Member(d) => {
				let s = parent
					.as_structure_mut()
					.ok_or_else(|| self.not_a_structure(&d.name))?;
				Ok(s.set(&d.name, value))
			}
		}
	}

	/// Inserts `item` at `index` into the addressed list.
	pub fn insert_item(
		&self,
		root: &mut Option<PropertyValue>,
		index: usize,
		item: PropertyValue,
	) -> Result<(), AddressError> {
		let list = self.list_mut(root, true)?;
		if index > list.len() {
			return Err(AddressError::IndexOutOfRange {
				path: self.to_string(),
				index,
				len: list.len(),
			});
		}
		list.insert(index, item);
		Ok(())
	}

	/// Removes the addressed list entry and returns it.
	pub fn remove_item(&self, root: &mut Option<PropertyValue>) -> Result<PropertyValue, AddressError> {
		let (Some(RefHop::Index(index)), Some(list_ref)) = (self.hops.last(), self.parent()) else {
			return Err(AddressError::NotAnItem {
				path: self.to_string(),
			});
		};
		let list = list_ref.list_mut(root, false)?;
		if *index >= list.len() {
			return Err(AddressError::IndexOutOfRange {
				path: self.to_string(),
				index: *index,
				len: list.len(),
			});
		}
		Ok(list.remove(*index))
	}

	/// Moves an entry of the addressed list from `from` to `to`.
	pub fn move_item(
		&self,
		root: &mut Option<PropertyValue>,
		from: usize,
		to: usize,
	) -> Result<(), AddressError> {
		let list = self.list_mut(root, false)?;
		let len = list.len();
		for index in [from, to] {
			if index >= len {
				return Err(AddressError::IndexOutOfRange {
					path: self.to_string(),
					index,
					len,
				});
			}
		}
		let item = list.remove(from);
		list.insert(to, item);
		Ok(())
	}

	fn list_mut<'v>(
		&self,
		root: &'v mut Option<PropertyValue>,
		create: bool,
	) -> Result<&'v mut Vec<PropertyValue>, AddressError> {
		if !self.is_list() {
			return Err(AddressError::NotAList {
				path: self.to_string(),
			});
		}
		self.navigate_mut(root, &self.hops, create)?
			.as_list_mut()
			.ok_or_else(|| AddressError::NotAList {
				path: self.to_string(),
			})
	}

	fn navigate_mut<'v>(
		&self,
		root: &'v mut Option<PropertyValue>,
		hops: &[RefHop],
		create: bool,
	) -> Result<&'v mut PropertyValue, AddressError> {
		if root.is_none() {
			match empty_container(&self.property) {
				Some(empty) if create => *root = Some(empty),
				_ => return Err(self.missing()),
			}
		}
		let mut cur = root.as_mut().ok_or_else(|| self.missing())?;
		for hop in hops {
			cur = match hop {
				RefHop::Index(i) => self.entry_mut(cur, *i)?,
				RefHop::Member(d) => {
					let s = cur
						.as_structure_mut()
						.ok_or_else(|| self.not_a_structure(&d.name))?;
					if s.get(&d.name).is_none() {
						match empty_container(d) {
							Some(empty) if create => {
								s.set(&d.name, Some(empty));
							}
							_ => return Err(self.missing()),
						}
					}
					s.get_mut(&d.name).ok_or_else(|| self.missing())?
				}
			};
		}
		Ok(cur)
	}

	fn entry_mut<'v>(
		&self,
		value: &'v mut PropertyValue,
		index: usize,
	) -> Result<&'v mut PropertyValue, AddressError> {
		let list = value.as_list_mut().ok_or_else(|| AddressError::NotAList {
			path: self.to_string(),
		})?;
		let len = list.len();
		list.get_mut(index).ok_or_else(|| AddressError::IndexOutOfRange {
			path: self.to_string(),
			index,
			len,
		})
	}

	fn missing(&self) -> AddressError {
		AddressError::MissingValue {
			path: self.to_string(),
		}
	}

	fn not_a_structure(&self, member: &str) -> AddressError {
		AddressError::NotAStructure {
			path: self.to_string(),
			member: member.to_string(),
		}
	}
}

/// Empty value a missing list or structure is created as.
fn empty_container(defn: &PropertyDefn) -> Option<PropertyValue> {
	if defn.is_list() {
		Some(PropertyValue::List(Vec::new()))
	} else {
		defn.struct_name()
			.map(|name| PropertyValue::Structure(Structure::new(name)))
	}
}

impl PartialEq for MemberRef {
	fn eq(&self, other: &Self) -> bool {
		self.property.name == other.property.name && self.hops == other.hops
	}
}

impl Eq for MemberRef {}

impl fmt::Display for MemberRef {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(&self.property.name)?;
		for hop in &self.hops {
			match hop {
				RefHop::Index(i) => write!(f, "[{i}]")?,
				RefHop::Member(d) => write!(f, ".{}", d.name)?,
			}
		}
		Ok(())
	}
}
