use serde::{Deserialize, Serialize};

/// Unique identifier for an element within a design.
///
/// Identifiers are allocated monotonically by the owning design and never
/// reused, so a stale identifier simply fails to resolve instead of aliasing
/// a newer element.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ElementId(pub u64);

impl ElementId {
	/// Returns the raw numeric value.
	#[inline]
	pub fn as_u64(self) -> u64 {
		self.0
	}
}

impl core::fmt::Display for ElementId {
	fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
		write!(f, "#{}", self.0)
	}
}

/// Identifier for a module (the main design or an included library).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ModuleId(pub u32);

impl ModuleId {
	/// The editable main module of every design.
	pub const MAIN: ModuleId = ModuleId(0);

	/// Returns true for the main module.
	#[inline]
	pub fn is_main(self) -> bool {
		self == Self::MAIN
	}
}

impl core::fmt::Display for ModuleId {
	fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
		write!(f, "module{}", self.0)
	}
}
