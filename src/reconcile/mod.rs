//! Poll/diff reconciliation.
//!
//! ## Contents
//! - [`diff`] / [`reconcile`] pure snapshot comparison
//! - [`Watch`] per-kind polling contract ([`NodeWatch`], [`ServiceWatch`], [`TaskWatch`])
//! - [`Reconciler`] the periodic loop owning one kind's last snapshot
//!
//! ## Quick reference
//! ```text
//! Reconciler<NodeWatch>    ──┐
//! Reconciler<ServiceWatch> ──┼──► EventSender ──► Broadcaster
//! Reconciler<TaskWatch>    ──┘
//! ```

mod diff;
mod reconciler;
mod watch;

pub use diff::{diff, reconcile, Change};
pub use reconciler::{Reconciler, Tick};
pub use watch::{NodeWatch, ServiceWatch, TaskWatch, Watch};
