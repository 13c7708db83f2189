//! # Subscriber trait.
//!
//! A [`Subscriber`] is one live dashboard connection. The broadcaster owns every
//! subscriber exclusively (through the registry) and is the only caller of
//! [`Subscriber::send`] and [`Subscriber::close`].
//!
//! ## Contract
//! - `send` writes one whole frame or fails; a failure means the peer is dead.
//! - `close` is called at most once, after the subscriber was evicted or during
//!   shutdown, and never fails.
//! - `peer` is for logs only.
//!
//! ## Example (skeleton)
//! ```rust
//! use async_trait::async_trait;
//! use swarmwatch::broadcast::Subscriber;
//! use swarmwatch::{Frame, SendError};
//!
//! struct Collect(Vec<String>);
//!
//! #[async_trait]
//! impl Subscriber for Collect {
//!     async fn send(&mut self, frame: &Frame) -> Result<(), SendError> {
//!         self.0.push(frame.as_str().to_owned());
//!         Ok(())
//!     }
//!     async fn close(&mut self) {}
//!     fn peer(&self) -> String { "collector".into() }
//! }
//! ```

use std::fmt;

use async_trait::async_trait;

use crate::error::SendError;
use crate::events::Frame;

/// Contract for broadcast targets.
#[async_trait]
pub trait Subscriber: Send + 'static {
    /// Writes one frame to the peer.
    async fn send(&mut self, frame: &Frame) -> Result<(), SendError>;

    /// Closes the underlying connection.
    async fn close(&mut self);

    /// Remote address (or another label) for logs.
    fn peer(&self) -> String;
}

/// Registration handle assigned by the broadcaster; unique per process.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SubscriberId(pub u64);

impl fmt::Display for SubscriberId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "sub-{}", self.0)
    }
}
