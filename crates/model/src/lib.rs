//! Element graph, property cascade and transactional mutation core for
//! report designs.
//!
//! A [`Design`] owns an arena of [`DesignElement`]s typed by a shared
//! [`SchemaRegistry`](quire_schema::SchemaRegistry). Reads go through the
//! cascade [`Resolver`]; every write is validated first and then applied as
//! invertible [`Record`]s inside a transaction, so it can be rolled back,
//! undone and redone. Elements refer to each other by name; the targets keep
//! [`BackRef`]s to their clients so renames and deletions repair or
//! invalidate every reference.

/// Activity stack: transactions, undo and redo.
pub mod activity;
/// Cascade resolution of effective property values.
pub mod cascade;
/// Configuration and session defaults.
pub mod config;
/// Containment contexts and insertion checks.
pub mod containment;
/// The design and its mutators.
pub mod design;
/// Design elements and back references.
pub mod element;
/// Error types.
pub mod error;
/// Element arena and module table.
pub mod graph;
/// Structured addresses into property values.
pub mod member_ref;
/// Change notifications.
pub mod notification;
mod refs;
/// Sessions of open designs.
pub mod session;
#[cfg(test)]
mod testing;

pub use activity::{Activity, ActivityStack, MAX_UNDO, Record, TransKind, TransactionHandle};
pub use cascade::{Resolved, Resolver, ValueSource};
pub use config::{ConfigError, ModelConfig, RenamePolicy, SessionDefaults};
pub use containment::{ContainerContext, ContentSlot};
pub use design::{Design, SaveReport, UnresolvedRef};
pub use element::{BackRef, DesignElement};
pub use error::{
	AddressError, ContainmentError, ErrorKind, ModelError, ReferenceError, Result, TransactionError,
};
pub use graph::{Graph, Module};
pub use member_ref::{HopKind, MemberRef, RefHop, RefShape};
pub use notification::{ContentAction, DesignListener, Notification};
pub use session::{DesignId, Session};
