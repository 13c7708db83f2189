//! Error types used by swarmwatch.
//!
//! - [`SourceError`]: a cluster listing could not be fetched or decoded.
//! - [`EncodeError`]: an event could not be serialized to a frame.
//! - [`SendError`]: a frame could not be written to one subscriber.
//! - [`SnapshotError`]: an on-demand listing or report request failed.
//! - [`RuntimeError`]: startup, serving and shutdown failures of the runtime itself.
//!
//! Every enum provides `as_label` (stable snake_case label for log fields).
//! Only [`RuntimeError`] is fatal; everything else is contained to one poll cycle,
//! one event, one subscriber or one request.

use std::time::Duration;
use thiserror::Error;

/// # Errors produced while talking to the cluster API.
///
/// All variants are transient from the reconciler's point of view: the cycle is
/// skipped and the previous snapshot is retained.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum SourceError {
    /// The request never produced a response (connection refused, reset, ...).
    #[error("{op}: transport failure: {error}")]
    Transport {
        /// Listing operation, e.g. `list_nodes`.
        op: &'static str,
        /// The underlying error message.
        error: String,
    },

    /// The API answered with a non-success status.
    #[error("{op}: unexpected status {status}: {body}")]
    Status {
        /// Listing operation.
        op: &'static str,
        /// HTTP status code.
        status: u16,
        /// Response body (truncated by the caller when large).
        body: String,
    },

    /// The response body did not match the expected shape.
    #[error("{op}: undecodable response: {error}")]
    Decode {
        /// Listing operation.
        op: &'static str,
        /// The underlying error message.
        error: String,
    },
}

impl SourceError {
    /// Returns a short stable label (snake_case) for use in logs.
    ///
    /// # Example
    /// ```
    /// use swarmwatch::SourceError;
    ///
    /// let err = SourceError::Status { op: "list_nodes", status: 503, body: String::new() };
    /// assert_eq!(err.as_label(), "source_status");
    /// ```
    pub fn as_label(&self) -> &'static str {
        match self {
            SourceError::Transport { .. } => "source_transport",
            SourceError::Status { .. } => "source_status",
            SourceError::Decode { .. } => "source_decode",
        }
    }

    /// Listing operation that failed.
    pub fn op(&self) -> &'static str {
        match self {
            SourceError::Transport { op, .. }
            | SourceError::Status { op, .. }
            | SourceError::Decode { op, .. } => op,
        }
    }
}

/// An event could not be turned into a frame.
#[derive(Error, Debug)]
#[error("event encoding failed: {0}")]
pub struct EncodeError(#[from] pub serde_json::Error);

/// A frame could not be written to a subscriber connection.
///
/// The broadcaster treats any send error as a dead peer.
#[derive(Error, Debug)]
#[error("write to {peer} failed: {error}")]
pub struct SendError {
    /// Remote address of the subscriber.
    pub peer: String,
    /// The underlying error message.
    pub error: String,
}

impl SendError {
    pub fn new(peer: impl Into<String>, error: impl ToString) -> Self {
        Self {
            peer: peer.into(),
            error: error.to_string(),
        }
    }
}

/// # Errors produced by on-demand listing and report requests.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum SnapshotError {
    /// Fetching from the cluster API failed.
    #[error(transparent)]
    Source(#[from] SourceError),

    /// Serializing the listing failed.
    #[error("listing encoding failed: {0}")]
    Encode(#[from] serde_json::Error),
}

impl SnapshotError {
    /// Returns a short stable label (snake_case) for use in logs.
    pub fn as_label(&self) -> &'static str {
        match self {
            SnapshotError::Source(e) => e.as_label(),
            SnapshotError::Encode(_) => "snapshot_encode",
        }
    }
}

/// # Errors produced by the swarmwatch runtime.
///
/// Startup variants abort the process; `GraceExceeded` is reported after shutdown.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum RuntimeError {
    /// The runtime was built without a cluster source.
    #[error("no cluster source configured")]
    MissingSource,

    /// The cluster API endpoint could not be turned into a client.
    #[error("invalid cluster endpoint {endpoint:?}: {reason}")]
    InvalidEndpoint {
        /// Endpoint as configured.
        endpoint: String,
        /// Why it was rejected.
        reason: String,
    },

    /// The HTTP listener could not be bound.
    #[error("failed to bind {addr}: {source}")]
    Bind {
        /// Listen address.
        addr: std::net::SocketAddr,
        /// The underlying io error.
        source: std::io::Error,
    },

    /// The HTTP server stopped with an error.
    #[error("http server failed: {0}")]
    Serve(std::io::Error),

    /// A runtime loop panicked.
    #[error("loop {name} panicked: {info}")]
    LoopPanicked {
        /// Loop name, e.g. `broadcaster:sender`.
        name: String,
        /// Panic message.
        info: String,
    },

    /// Registering OS signal handlers failed.
    #[error("signal handler registration failed: {0}")]
    Signal(std::io::Error),

    /// Shutdown grace period was exceeded; some loops were still running.
    #[error("shutdown timeout {grace:?} exceeded; stuck: {stuck:?}")]
    GraceExceeded {
        /// The configured grace duration.
        grace: Duration,
        /// Loops that did not stop in time.
        stuck: Vec<String>,
    },
}

impl RuntimeError {
    /// Returns a short stable label (snake_case) for use in logs.
    ///
    /// # Example
    /// ```
    /// use swarmwatch::RuntimeError;
    /// use std::time::Duration;
    ///
    /// let err = RuntimeError::GraceExceeded { grace: Duration::from_secs(5), stuck: vec![] };
    /// assert_eq!(err.as_label(), "runtime_grace_exceeded");
    /// ```
    pub fn as_label(&self) -> &'static str {
        match self {
            RuntimeError::MissingSource => "runtime_missing_source",
            RuntimeError::InvalidEndpoint { .. } => "runtime_invalid_endpoint",
            RuntimeError::Bind { .. } => "runtime_bind",
            RuntimeError::Serve(_) => "runtime_serve",
            RuntimeError::LoopPanicked { .. } => "runtime_loop_panicked",
            RuntimeError::Signal(_) => "runtime_signal",
            RuntimeError::GraceExceeded { .. } => "runtime_grace_exceeded",
        }
    }

    /// Indicates whether the error happened before the runtime started serving.
    pub fn is_startup(&self) -> bool {
        matches!(
            self,
            RuntimeError::MissingSource
                | RuntimeError::InvalidEndpoint { .. }
                | RuntimeError::Bind { .. }
                | RuntimeError::Signal(_)
        )
    }
}
