//! Entity model: the records swarmwatch diffs and streams.
//!
//! ## Contents
//! - [`Node`], [`Service`], [`Task`], [`NetworkRef`] plain records
//! - [`Entity`] id/status access used by the diff engine
//! - [`EntityKind`] the three polled kinds
//! - [`Snapshot`] id-unique collection of one kind
//! - [`naming`] display-name and capacity formatting helpers

mod entity;
pub mod naming;
mod snapshot;

pub use entity::{Entity, EntityKind, NetworkRef, Node, Service, Task};
pub use snapshot::Snapshot;
