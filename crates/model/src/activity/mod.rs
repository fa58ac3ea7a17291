//! Activity stack: nested transactions and undo/redo history.
//!
//! Mutations are logged as [`Record`]s into the innermost active
//! transaction. Committing a nested transaction folds its records into the
//! parent; committing the outermost one turns them into an undo entry (or,
//! for silent and persistent transactions, handles history as described on
//! [`TransKind`]). Rolling back replays the inverse records in reverse order.
//!
//! ```text
//! start("outer") ── start("inner") ── record.. ── commit ─┐
//!       │                                                 │ folded
//!       └── record.. ── commit ── undo_stack.push(entry) ◄┘
//! ```

use tracing::{debug, trace};

use crate::error::TransactionError;
use crate::graph::Graph;
use crate::notification::Notification;

mod record;

pub use record::Record;


/// Maximum undo history size.
pub const MAX_UNDO: usize = 100;

/// How a transaction interacts with the undo history.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TransKind {
	/// Becomes one undo entry when committed as the outermost transaction.
	Undoable,
	/// Implementation detail of a higher-level operation: its records are
	/// folded into the most recent undo entry instead of forming their own.
	Silent,
	/// Excluded from history; committing it discards undo and redo history.
	Persistent,
}

/// Token for an active transaction, used to commit or roll back exactly
/// the transaction that was started.
#[must_use = "a transaction must be committed or rolled back"]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TransactionHandle {
	depth: usize,
	generation: u64,
}

impl TransactionHandle {
	/// Nesting depth of the transaction, starting at 1 for the outermost.
	pub fn depth(self) -> usize {
		self.depth
	}
}

/// A committed, undoable unit of work.
#[derive(Debug, Clone, PartialEq)]
pub struct Activity {
	pub label: String,
	pub records: Vec<Record>,
}

#[derive(Debug)]
struct Frame {
	label: String,
	kind: TransKind,
	generation: u64,
	records: Vec<Record>,
	events: Vec<Notification>,
}

/// Transaction and undo/redo bookkeeping for one design.
#[derive(Debug)]
pub struct ActivityStack {
	undo_stack: Vec<Activity>,
	redo_stack: Vec<Activity>,
	frames: Vec<Frame>,
	max_undo: usize,
	next_generation: u64,
}

impl Default for ActivityStack {
	fn default() -> Self {
		Self::new(MAX_UNDO)
	}
}

impl ActivityStack {
	pub fn new(max_undo: usize) -> Self {
		Self {
			undo_stack: Vec::new(),
			redo_stack: Vec::new(),
			frames: Vec::new(),
			max_undo,
			next_generation: 0,
		}
	}

	/// Number of active (nested) transactions.
	pub fn depth(&self) -> usize {
		self.frames.len()
	}

	pub fn is_active(&self) -> bool {
		!self.frames.is_empty()
	}

	pub fn can_undo(&self) -> bool {
		!self.undo_stack.is_empty()
	}

	pub fn can_redo(&self) -> bool {
		!self.redo_stack.is_empty()
	}

	pub fn undo_len(&self) -> usize {
		self.undo_stack.len()
	}

	pub fn redo_len(&self) -> usize {
		self.redo_stack.len()
	}

	/// Label of the entry the next undo would revert.
	pub fn undo_label(&self) -> Option<&str> {
		self.undo_stack.last().map(|a| a.label.as_str())
	}

	/// Label of the entry the next redo would re-apply.
	pub fn redo_label(&self) -> Option<&str> {
		self.redo_stack.last().map(|a| a.label.as_str())
	}

	/// Label of the innermost active transaction.
	pub fn active_label(&self) -> Option<&str> {
		self.frames.last().map(|f| f.label.as_str())
	}

	/// Starts a transaction nested in the current one, if any.
	pub fn start(&mut self, label: &str, kind: TransKind) -> Result<TransactionHandle, TransactionError> {
		if kind == TransKind::Persistent && self.frames.iter().any(|f| f.kind != TransKind::Persistent) {
			return Err(TransactionError::PersistentInsideUndoable {
				label: label.to_string(),
			});
		}
		let generation = self.next_generation;
		self.next_generation += 1;
		self.frames.push(Frame {
			label: label.to_string(),
			kind,
			generation,
			records: Vec::new(),
			events: Vec::new(),
		});
		trace!(label, ?kind, depth = self.frames.len(), generation, "transaction started");
		Ok(TransactionHandle {
			depth: self.frames.len(),
			generation,
		})
	}

	/// Logs an applied record into the innermost transaction.
	pub fn record(&mut self, record: Record) -> Result<(), TransactionError> {
		let frame = self
			.frames
			.last_mut()
			.ok_or(TransactionError::NoActiveTransaction)?;
		frame.records.push(record);
		Ok(())
	}

	/// Buffers a notification in the innermost transaction.
	pub fn emit(&mut self, event: Notification) -> Result<(), TransactionError> {
		let frame = self
			.frames
			.last_mut()
			.ok_or(TransactionError::NoActiveTransaction)?;
		frame.events.push(event);
		Ok(())
	}

	/// Checks that `handle` names the innermost transaction.
	///
	/// A handle kept past its commit or rollback fails even when a newer
	/// transaction has reached the same depth.
	fn check(&self, handle: TransactionHandle) -> Result<(), TransactionError> {
		let Some(frame) = self.frames.last() else {
			return Err(TransactionError::NoActiveTransaction);
		};
		let depth = self.frames.len();
		if depth != handle.depth || frame.generation != handle.generation {
			return Err(TransactionError::Mismatch {
				expected: handle.depth,
				depth,
			});
		}
		Ok(())
	}

	/// Commits the innermost transaction.
	///
	/// Returns the buffered notifications once the outermost transaction
	/// commits, `None` for nested commits.
	pub fn commit(
		&mut self,
		handle: TransactionHandle,
	) -> Result<Option<Vec<Notification>>, TransactionError> {
		self.check(handle)?;
		let frame = self
			.frames
			.pop()
			.ok_or(TransactionError::NoActiveTransaction)?;

		if let Some(parent) = self.frames.last_mut() {
			trace!(
				label = frame.label,
				records = frame.records.len(),
				parent = parent.label,
				"nested transaction folded"
			);
			parent.records.extend(frame.records);
			parent.events.extend(frame.events);
			return Ok(None);
		}

		match frame.kind {
			TransKind::Undoable => {
				if !frame.records.is_empty() {
					self.push_undo(Activity {
						label: frame.label.clone(),
						records: frame.records,
					});
				}
			}
			TransKind::Silent => {
				if !frame.records.is_empty() {
					if let Some(top) = self.undo_stack.last_mut() {
						top.records.extend(frame.records);
					}
					self.clear_redo();
				}
			}
			TransKind::Persistent => {
				debug!(
					label = frame.label,
					dropped_undo = self.undo_stack.len(),
					dropped_redo = self.redo_stack.len(),
					"persistent transaction committed; history cleared"
				);
				self.undo_stack.clear();
				self.redo_stack.clear();
			}
		}
		debug!(label = frame.label, kind = ?frame.kind, events = frame.events.len(), "transaction committed");
		Ok(Some(frame.events))
	}

	/// Rolls back the innermost transaction, reverting its records on `graph`.
	pub fn rollback(&mut self, handle: TransactionHandle, graph: &mut Graph) -> Result<(), TransactionError> {
		self.check(handle)?;
		self.unwind_to(handle, graph);
		Ok(())
	}

	/// Rolls back every transaction at or above `handle`'s depth.
	pub(crate) fn unwind_to(&mut self, handle: TransactionHandle, graph: &mut Graph) {
		while self.frames.len() >= handle.depth {
			let Some(frame) = self.frames.pop() else {
				break;
			};
			for record in frame.records.iter().rev() {
				record.inverse().apply(graph);
			}
			debug!(
				label = frame.label,
				reverted = frame.records.len(),
				discarded_events = frame.events.len(),
				"transaction rolled back"
			);
		}
	}

	/// Reverts the most recent undo entry.
	///
	/// Returns the entry's label and the notifications of the replayed
	/// inverse records, or `None` if there is nothing to undo.
	pub fn undo(&mut self, graph: &mut Graph) -> Result<Option<(String, Vec<Notification>)>, TransactionError> {
		self.check_idle()?;
		let Some(activity) = self.undo_stack.pop() else {
			return Ok(None);
		};
		let mut events = Vec::new();
		for record in activity.records.iter().rev() {
			let inverse = record.inverse();
			inverse.apply(graph);
			events.extend(inverse.notification());
		}
		let label = activity.label.clone();
		self.redo_stack.push(activity);
		trace!(
			label,
			undo_stack = self.undo_stack.len(),
			redo_stack = self.redo_stack.len(),
			"undo applied"
		);
		Ok(Some((label, events)))
	}

	/// Re-applies the most recently undone entry.
	pub fn redo(&mut self, graph: &mut Graph) -> Result<Option<(String, Vec<Notification>)>, TransactionError> {
		self.check_idle()?;
		let Some(activity) = self.redo_stack.pop() else {
			return Ok(None);
		};
		let mut events = Vec::new();
		for record in &activity.records {
			record.apply(graph);
			events.extend(record.notification());
		}
		let label = activity.label.clone();
		self.undo_stack.push(activity);
		trace!(
			label,
			undo_stack = self.undo_stack.len(),
			redo_stack = self.redo_stack.len(),
			"redo applied"
		);
		Ok(Some((label, events)))
	}

	/// Drops all undo and redo history.
	pub fn clear_history(&mut self) {
		self.undo_stack.clear();
		self.redo_stack.clear();
	}

	fn check_idle(&self) -> Result<(), TransactionError> {
		if self.frames.is_empty() {
			Ok(())
		} else {
			Err(TransactionError::Active {
				depth: self.frames.len(),
			})
		}
	}

	fn push_undo(&mut self, activity: Activity) {
		trace!(
			label = activity.label,
			records = activity.records.len(),
			undo_stack = self.undo_stack.len() + 1,
			"undo entry pushed"
		);
		self.undo_stack.push(activity);
		self.clear_redo();
		if self.undo_stack.len() > self.max_undo {
			self.undo_stack.remove(0);
		}
	}

	fn clear_redo(&mut self) {
		if !self.redo_stack.is_empty() {
			trace!(cleared = self.redo_stack.len(), "redo stack cleared");
		}
		self.redo_stack.clear();
	}
}
