//! Subscriber fan-out.
//!
//! ## Contents
//! - [`Subscriber`] connection contract, [`SubscriberId`] registration handle
//! - [`Broadcaster`] registry owner: fan-out, probing, snapshots, shutdown
//! - [`Registry`] ordered subscriber list with batch eviction

mod broadcaster;
mod registry;
mod subscriber;

pub use broadcaster::{Broadcaster, ListingKind};
pub use registry::{Entry, Registry};
pub use subscriber::{Subscriber, SubscriberId};
