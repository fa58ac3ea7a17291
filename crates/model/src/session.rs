//! Sessions: the set of open designs sharing one schema and one defaults map.

use std::sync::Arc;
use std::thread::{self, ThreadId};

use quire_primitives::PropertyValue;
use quire_schema::{SchemaRegistry, validate_value};
use rustc_hash::FxHashMap as HashMap;
use tracing::debug;

use crate::config::{ModelConfig, SessionDefaults};
use crate::design::Design;
use crate::error::{ModelError, Result};


/// Handle of a design opened in a [`Session`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct DesignId(pub u32);

/// Root registry of open designs.
///
/// A session may be bound to one thread at a time with
/// [`activate`](Self::activate). The binding only selects the locale used
/// for messages; it does not provide mutual exclusion.
#[derive(Debug)]
pub struct Session {
	schema: Arc<SchemaRegistry>,
	defaults: Arc<SessionDefaults>,
	config: ModelConfig,
	designs: HashMap<DesignId, Design>,
	next_design: u32,
	locale: String,
	active: Option<ThreadId>,
}

impl Session {
	pub fn new(schema: Arc<SchemaRegistry>) -> Self {
		Self::with_config(schema, ModelConfig::default())
	}

	pub fn with_config(schema: Arc<SchemaRegistry>, config: ModelConfig) -> Self {
		Self {
			schema,
			defaults: Arc::new(SessionDefaults::new()),
			locale: config.locale.clone(),
			config,
			designs: HashMap::default(),
			next_design: 0,
			active: None,
		}
	}

	/// Replaces the session defaults. Designs opened later share them.
	pub fn with_defaults(mut self, defaults: SessionDefaults) -> Self {
		self.defaults = Arc::new(defaults);
		self
	}

	pub fn schema(&self) -> &Arc<SchemaRegistry> {
		&self.schema
	}

	pub fn defaults(&self) -> &Arc<SessionDefaults> {
		&self.defaults
	}

	pub fn config(&self) -> &ModelConfig {
		&self.config
	}

	/// Opens an empty design whose root is of kind `root_kind`.
	pub fn open_design(&mut self, root_kind: &str) -> Result<DesignId> {
		let design = Design::with_parts(
			self.schema.clone(),
			self.defaults.clone(),
			self.config.clone(),
			root_kind,
		)?;
		self.next_design += 1;
		let id = DesignId(self.next_design);
		self.designs.insert(id, design);
		debug!(design = id.0, root_kind, "design opened");
		Ok(id)
	}

	pub fn design(&self, id: DesignId) -> Option<&Design> {
		self.designs.get(&id)
	}

	pub fn design_mut(&mut self, id: DesignId) -> Option<&mut Design> {
		self.designs.get_mut(&id)
	}

	/// Closes a design and hands it back.
	pub fn close_design(&mut self, id: DesignId) -> Option<Design> {
		let design = self.designs.remove(&id);
		if design.is_some() {
			debug!(design = id.0, "design closed");
		}
		design
	}

	/// Ids of all open designs, in opening order.
	pub fn designs(&self) -> Vec<DesignId> {
		let mut ids: Vec<DesignId> = self.designs.keys().copied().collect();
		ids.sort_unstable();
		ids
	}

	/// Binds the session to the calling thread, optionally switching locale.
	pub fn activate(&mut self, locale: Option<&str>) {
		if let Some(locale) = locale {
			self.locale = locale.to_string();
		}
		self.active = Some(thread::current().id());
		debug!(locale = self.locale, "session activated");
	}

	/// Releases the thread binding.
	pub fn suspend(&mut self) {
		self.active = None;
		debug!("session suspended");
	}

	/// Returns true if the session is bound to the calling thread.
	pub fn is_active(&self) -> bool {
		self.active == Some(thread::current().id())
	}

	pub fn locale(&self) -> &str {
		&self.locale
	}

	/// Sets the session default of a style property.
	///
	/// The value is validated against the first style property of that name
	/// found in the schema.
	pub fn set_default(&self, property: &str, value: PropertyValue) -> Result<()> {
		let mut kinds: Vec<_> = self.schema.elements().collect();
		kinds.sort_by(|a, b| a.name.cmp(&b.name));
		let defn = kinds
			.iter()
			.find_map(|k| k.property(property).filter(|p| p.is_style()))
			.ok_or_else(|| ModelError::UnknownProperty {
				kind: "style".to_string(),
				property: property.to_string(),
			})?;
		let value = validate_value(&self.schema, defn, value).map_err(|source| {
			ModelError::InvalidDefault {
				property: property.to_string(),
				source,
			}
		})?;
		self.defaults.set(property, value);
		Ok(())
	}

	/// Removes the session default of a style property.
	pub fn clear_default(&self, property: &str) -> bool {
		self.defaults.clear(property)
	}
}
