//! The design: element graph, modules, transactions and listeners.
//!
//! Every public mutator validates first, then applies records inside its
//! own nested transaction. When a step fails after records were applied,
//! that nested transaction is rolled back before the error is returned, so a
//! failed call leaves the graph as it found it.

use std::fmt;
use std::sync::Arc;

use quire_primitives::{ElementId, ModuleId};
use quire_schema::{ElementDefn, SchemaRegistry};
use tracing::{debug, trace};

use crate::activity::{ActivityStack, Record, TransKind, TransactionHandle};
use crate::config::{ModelConfig, SessionDefaults};
use crate::element::DesignElement;
use crate::error::{ModelError, Result, TransactionError};
use crate::graph::Graph;
use crate::notification::{DesignListener, Notification};

mod content;
mod lifecycle;
mod property;
mod save;
mod virtuals;

pub use save::{SaveReport, UnresolvedRef};


/// A report design: one editable main module plus included libraries.
pub struct Design {
	schema: Arc<SchemaRegistry>,
	defaults: Arc<SessionDefaults>,
	config: ModelConfig,
	graph: Graph,
	/// Root of the main module.
	root: ElementId,
	stack: ActivityStack,
	listeners: Vec<Box<dyn DesignListener>>,
}

impl fmt::Debug for Design {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("Design")
			.field("elements", &self.graph.len())
			.field("modules", &self.graph.modules().len())
			.field("stack", &self.stack)
			.field("listeners", &self.listeners.len())
			.finish()
	}
}

impl Design {
	/// Creates a design whose main module root is of kind `root_kind`.
	pub fn new(schema: Arc<SchemaRegistry>, root_kind: &str) -> Result<Self> {
		Self::with_parts(
			schema,
			Arc::new(SessionDefaults::default()),
			ModelConfig::default(),
			root_kind,
		)
	}

	pub(crate) fn with_parts(
		schema: Arc<SchemaRegistry>,
		defaults: Arc<SessionDefaults>,
		config: ModelConfig,
		root_kind: &str,
	) -> Result<Self> {
		let mut graph = Graph::new();
		let (_, root) = push_module(&mut graph, &schema, None, root_kind)?;
		Ok(Self {
			schema,
			defaults,
			stack: ActivityStack::new(config.max_undo),
			config,
			graph,
			root,
			listeners: Vec::new(),
		})
	}

	/// Replaces the configuration. Resets undo history to the new capacity.
	pub fn with_config(mut self, config: ModelConfig) -> Self {
		self.stack = ActivityStack::new(config.max_undo);
		self.config = config;
		self
	}

	/// Shares `defaults` with this design.
	pub fn with_defaults(mut self, defaults: Arc<SessionDefaults>) -> Self {
		self.defaults = defaults;
		self
	}

	#[inline]
	pub fn schema(&self) -> &Arc<SchemaRegistry> {
		&self.schema
	}

	#[inline]
	pub fn graph(&self) -> &Graph {
		&self.graph
	}

	#[inline]
	pub(crate) fn graph_mut(&mut self) -> &mut Graph {
		&mut self.graph
	}

	pub fn config(&self) -> &ModelConfig {
		&self.config
	}

	pub fn defaults(&self) -> &Arc<SessionDefaults> {
		&self.defaults
	}

	pub fn activity(&self) -> &ActivityStack {
		&self.stack
	}

	/// Root element of the main module.
	pub fn root(&self) -> ElementId {
		self.root
	}

	/// Root element of `module`.
	pub fn module_root(&self, module: ModuleId) -> Result<ElementId> {
		self.graph
			.module(module)
			.map(|m| m.root)
			.ok_or(ModelError::UnknownModule(module))
	}

	pub fn element(&self, id: ElementId) -> Result<&DesignElement> {
		self.graph.get(id).ok_or(ModelError::UnknownElement(id))
	}

	/// Kind definition of `id`.
	pub fn defn_of(&self, id: ElementId) -> Result<&Arc<ElementDefn>> {
		let kind = self.element(id)?.kind();
		self.schema
			.element(kind)
			.ok_or_else(|| ModelError::UnknownKind(kind.to_string()))
	}

	pub(crate) fn kind_defn(&self, kind: &str) -> Result<Arc<ElementDefn>> {
		self.schema
			.element(kind)
			.cloned()
			.ok_or_else(|| ModelError::UnknownKind(kind.to_string()))
	}

	pub fn is_sealed(&self, module: ModuleId) -> bool {
		self.graph.module(module).is_some_and(|m| m.sealed)
	}

	pub(crate) fn check_writable(&self, id: ElementId) -> Result<&DesignElement> {
		let el = self.element(id)?;
		if self.is_sealed(el.module()) {
			return Err(ModelError::ReadOnly {
				element: id,
				module: el.module(),
			});
		}
		Ok(el)
	}

	/// Includes a library module addressed as `name_space.name`.
	///
	/// The library is writable until [`seal_module`](Self::seal_module).
	/// Module setup is not part of the undo history.
	pub fn include_library(&mut self, name_space: &str, root_kind: &str) -> Result<ModuleId> {
		if self.graph.module_by_name_space(name_space).is_some() {
			return Err(crate::error::ReferenceError::DuplicateName {
				name: name_space.to_string(),
				space: "libraries".to_string(),
			}
			.into());
		}
		let (module, _) = push_module(&mut self.graph, &self.schema, Some(name_space.to_string()), root_kind)?;
		debug!(module = %module, name_space, "library included");
		Ok(module)
	}

	/// Makes `module` read-only.
	pub fn seal_module(&mut self, module: ModuleId) -> Result<()> {
		let m = self
			.graph
			.module_mut(module)
			.ok_or(ModelError::UnknownModule(module))?;
		m.sealed = true;
		debug!(module = %module, "module sealed");
		Ok(())
	}

	/// Registers a listener for notifications.
	pub fn add_listener(&mut self, listener: impl DesignListener + 'static) {
		self.listeners.push(Box::new(listener));
	}

	pub fn start_trans(&mut self, label: &str) -> Result<TransactionHandle> {
		Ok(self.stack.start(label, TransKind::Undoable)?)
	}

	/// Starts a transaction that folds into the latest undo entry instead of
	/// forming its own.
	pub fn start_silent_trans(&mut self, label: &str) -> Result<TransactionHandle> {
		Ok(self.stack.start(label, TransKind::Silent)?)
	}

	/// Starts a transaction excluded from history. Committing the outermost
	/// persistent transaction clears undo and redo history.
	pub fn start_persistent_trans(&mut self, label: &str) -> Result<TransactionHandle> {
		Ok(self.stack.start(label, TransKind::Persistent)?)
	}

	pub fn commit(&mut self, handle: TransactionHandle) -> Result<()> {
		if let Some(events) = self.stack.commit(handle)? {
			self.dispatch(&events);
		}
		Ok(())
	}

	pub fn rollback(&mut self, handle: TransactionHandle) -> Result<()> {
		Ok(self.stack.rollback(handle, &mut self.graph)?)
	}

	/// Runs `f` inside an undoable transaction labelled `label`.
	///
	/// If `f` fails, everything it did is rolled back and the error returned.
	pub fn transact<T>(&mut self, label: &str, f: impl FnOnce(&mut Self) -> Result<T>) -> Result<T> {
		self.run_as(label, TransKind::Undoable, f)
	}

	pub(crate) fn run<T>(&mut self, label: &str, f: impl FnOnce(&mut Self) -> Result<T>) -> Result<T> {
		self.run_as(label, TransKind::Undoable, f)
	}

	pub(crate) fn run_as<T>(
		&mut self,
		label: &str,
		kind: TransKind,
		f: impl FnOnce(&mut Self) -> Result<T>,
	) -> Result<T> {
		let handle = self.stack.start(label, kind)?;
		match f(self) {
			Ok(value) => match self.stack.commit(handle) {
				Ok(Some(events)) => {
					self.dispatch(&events);
					Ok(value)
				}
				Ok(None) => Ok(value),
				Err(e) => {
					self.stack.unwind_to(handle, &mut self.graph);
					Err(e.into())
				}
			},
			Err(e) => {
				debug!(label, error = %e, "operation failed; rolling back");
				self.stack.unwind_to(handle, &mut self.graph);
				Err(e)
			}
		}
	}

	/// Reverts the latest undo entry and returns its label.
	pub fn undo(&mut self) -> Result<Option<String>> {
		let Some((label, events)) = self.stack.undo(&mut self.graph)? else {
			return Ok(None);
		};
		self.dispatch(&events);
		Ok(Some(label))
	}

	/// Re-applies the latest undone entry and returns its label.
	pub fn redo(&mut self) -> Result<Option<String>> {
		let Some((label, events)) = self.stack.redo(&mut self.graph)? else {
			return Ok(None);
		};
		self.dispatch(&events);
		Ok(Some(label))
	}

	pub fn can_undo(&self) -> bool {
		self.stack.can_undo()
	}

	pub fn can_redo(&self) -> bool {
		self.stack.can_redo()
	}

	/// Applies `record` to the graph and logs it in the active transaction.
	pub(crate) fn apply(&mut self, record: Record) -> Result<()> {
		if !self.stack.is_active() {
			return Err(TransactionError::NoActiveTransaction.into());
		}
		trace!(?record, "apply");
		record.apply(&mut self.graph);
		if let Some(event) = record.notification() {
			self.stack.emit(event)?;
		}
		self.stack.record(record)?;
		Ok(())
	}

	/// Buffers a notification in the active transaction.
	pub(crate) fn emit(&mut self, event: Notification) -> Result<()> {
		Ok(self.stack.emit(event)?)
	}

	fn dispatch(&mut self, events: &[Notification]) {
		if events.is_empty() || self.listeners.is_empty() {
			return;
		}
		trace!(events = events.len(), listeners = self.listeners.len(), "dispatching notifications");
		for listener in &mut self.listeners {
			for event in events {
				listener.on_notification(event);
			}
		}
	}
}

/// Adds a module to `graph` together with its root element.
fn push_module(
	graph: &mut Graph,
	schema: &SchemaRegistry,
	name_space: Option<String>,
	root_kind: &str,
) -> Result<(ModuleId, ElementId)> {
	let defn = schema
		.element(root_kind)
		.ok_or_else(|| ModelError::UnknownKind(root_kind.to_string()))?;
	let root = graph.next_id();
	let module = graph.push_module(name_space, root);
	graph.insert_element(DesignElement::new(root, defn, module));
	Ok((module, root))
}
