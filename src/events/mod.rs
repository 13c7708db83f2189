//! Cluster events: types and the bounded event queue.
//!
//! ## Contents
//! - [`ClusterEvent`], [`Action`], [`EventKind`] event data model
//! - [`Frame`] encoded, shareable event payload
//! - [`queue`] bounded FIFO between reconcilers and the broadcaster
//!
//! ## Quick reference
//! - **Producers**: one `Reconciler` per entity kind.
//! - **Consumer**: the `Broadcaster` sender loop.

mod event;
pub mod queue;

pub use event::{Action, ClusterEvent, EventKind, Frame};
pub use queue::{EventReceiver, EventSender, QueueClosed};
