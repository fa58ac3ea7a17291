//! Model configuration and session-wide style defaults.
//!
//! Both load from TOML:
//!
//! ```toml
//! max_undo = 50
//! rename_policy = "unresolve"
//!
//! [defaults]
//! color = "black"
//! font-size = 10
//! ```

use std::sync::Arc;

use arc_swap::ArcSwap;
use quire_primitives::PropertyValue;
use rustc_hash::FxHashMap as HashMap;
use serde::Deserialize;
use thiserror::Error;
use tracing::debug;

use crate::activity::MAX_UNDO;


/// Errors raised while loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
	#[error("TOML parse error: {0}")]
	Toml(#[from] toml::de::Error),

	/// A default uses a TOML type with no property value equivalent.
	#[error("unsupported value for default '{key}': {found}")]
	UnsupportedValue { key: String, found: &'static str },

	#[error("'defaults' must be a table")]
	DefaultsNotATable,
}

/// How name-based references react when their target is renamed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RenamePolicy {
	/// References are rewritten to the new name and stay resolved.
	#[default]
	Follow,
	/// References keep the old name and become unresolved.
	Unresolve,
}

/// Tunables of a design.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ModelConfig {
	/// Maximum number of undo entries kept.
	pub max_undo: usize,
	pub rename_policy: RenamePolicy,
	/// Largest depth suffix used for nested slot selectors.
	pub selector_depth_cap: usize,
	/// Locale used by a session until one is activated.
	pub locale: String,
}

impl Default for ModelConfig {
	fn default() -> Self {
		Self {
			max_undo: MAX_UNDO,
			rename_policy: RenamePolicy::Follow,
			selector_depth_cap: 9,
			locale: "en".to_string(),
		}
	}
}

impl ModelConfig {
	/// Parses a configuration, filling missing keys with defaults.
	pub fn from_toml_str(src: &str) -> Result<Self, ConfigError> {
		Ok(toml::from_str(src)?)
	}
}

/// Process-wide defaults for style properties, consulted last by the cascade.
///
/// Reads take a lock-free snapshot; writes publish a new map. One instance
/// is shared by every design of a session.
#[derive(Debug, Default)]
pub struct SessionDefaults {
	values: ArcSwap<HashMap<String, PropertyValue>>,
}

impl SessionDefaults {
	pub fn new() -> Self {
		Self::default()
	}

	/// Loads the `[defaults]` table of a TOML document.
	pub fn from_toml_str(src: &str) -> Result<Self, ConfigError> {
		let doc: toml::Table = toml::from_str(src)?;
		let mut values = HashMap::default();
		match doc.get("defaults") {
			None => {}
			Some(toml::Value::Table(table)) => {
				for (key, value) in table {
					values.insert(key.clone(), convert(key, value)?);
				}
			}
			Some(_) => return Err(ConfigError::DefaultsNotATable),
		}
		debug!(count = values.len(), "session defaults loaded");
		Ok(Self {
			values: ArcSwap::from_pointee(values),
		})
	}

	pub fn get(&self, property: &str) -> Option<PropertyValue> {
		self.values.load().get(property).cloned()
	}

	pub fn set(&self, property: &str, value: PropertyValue) {
		self.values.rcu(|cur| {
			let mut next = HashMap::clone(cur);
			next.insert(property.to_string(), value.clone());
			next
		});
	}

	/// Removes a default, returning whether one was set.
	pub fn clear(&self, property: &str) -> bool {
		let had = self.values.load().contains_key(property);
		if had {
			self.values.rcu(|cur| {
				let mut next = HashMap::clone(cur);
				next.remove(property);
				next
			});
		}
		had
	}

	/// Current defaults.
	pub fn snapshot(&self) -> Arc<HashMap<String, PropertyValue>> {
		self.values.load_full()
	}

	pub fn len(&self) -> usize {
		self.values.load().len()
	}

	pub fn is_empty(&self) -> bool {
		self.values.load().is_empty()
	}
}

fn convert(key: &str, value: &toml::Value) -> Result<PropertyValue, ConfigError> {
	Ok(match value {
		toml::Value::String(s) => PropertyValue::String(s.clone()),
		toml::Value::Integer(n) => PropertyValue::Int(*n),
		toml::Value::Float(x) => PropertyValue::Float(*x),
		toml::Value::Boolean(b) => PropertyValue::Bool(*b),
		toml::Value::Array(items) => PropertyValue::List(
			items
				.iter()
				.map(|v| convert(key, v))
				.collect::<Result<_, _>>()?,
		),
		other => {
			return Err(ConfigError::UnsupportedValue {
				key: key.to_string(),
				found: other.type_str(),
			});
		}
	})
}
