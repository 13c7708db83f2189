//! Runtime core: assembly and lifecycle.
//!
//! The public API from this module is [`RuntimeBuilder`] and [`Runtime`].
//!
//! Internal modules:
//! - [`runtime`]: spawns every loop, serves HTTP, drives graceful shutdown;
//! - [`builder`]: validates inputs and assembles a runtime;
//! - [`alive`]: tracks loop names for stuck-loop reporting;
//! - [`shutdown`]: cross-platform termination signal handling.

mod alive;
mod builder;
mod runtime;
mod shutdown;

pub use builder::RuntimeBuilder;
pub use runtime::Runtime;
