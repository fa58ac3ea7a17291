//! Finalisation before a design is written out.

use quire_primitives::ElementId;
use tracing::{debug, warn};

use super::Design;
use crate::activity::TransKind;
use crate::error::Result;

/// A reference left without a target when the design was prepared for saving.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct UnresolvedRef {
	pub element: ElementId,
	pub property: String,
	pub name: String,
}

/// Outcome of [`Design::prepare_to_save`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SaveReport {
	pub unresolved: Vec<UnresolvedRef>,
}

impl SaveReport {
	/// Returns true if every reference resolved.
	pub fn is_clean(&self) -> bool {
		self.unresolved.is_empty()
	}
}

impl Design {
	/// Resolves pending forward references and refreshes virtual content so
	/// the graph can be traversed for writing.
	///
	/// Runs as a silent transaction: any changes fold into the latest undo
	/// entry.
	pub fn prepare_to_save(&mut self) -> Result<SaveReport> {
		self.run_as("prepare to save", TransKind::Silent, |d| {
			d.resolve_pending(None)?;
			d.refresh_all_virtual()
		})?;

		let unresolved: Vec<UnresolvedRef> = self
			.unresolved_references()
			.into_iter()
			.map(|(element, property, name)| UnresolvedRef {
				element,
				property,
				name,
			})
			.collect();
		for r in &unresolved {
			warn!(element = %r.element, property = r.property, name = r.name, "reference unresolved at save");
		}
		debug!(unresolved = unresolved.len(), "design prepared for save");
		Ok(SaveReport { unresolved })
	}
}
