//! # Cluster events streamed to subscribers.
//!
//! [`ClusterEvent`] is a closed tagged union: every variant has a fixed wire shape.
//!
//! ## Wire format
//! ```text
//! {"action":"start","type":"node","dnode":{...}}
//! {"action":"stop","type":"service","dservice":{...}}
//! {"action":"start","type":"task","dtask":{...}}
//! {"action":"update","type":"task","id":"...","state":"..."}     (task-state)
//! ```
//!
//! Events are encoded exactly once into a [`Frame`] by the producer; the
//! broadcaster only ever handles frames.
//!
//! ## Example
//! ```rust
//! use swarmwatch::{Action, ClusterEvent};
//!
//! let ev = ClusterEvent::task_state("t1", "running");
//! assert_eq!(ev.action(), Action::Update);
//! let frame = ev.encode().unwrap();
//! assert_eq!(frame.as_str(), r#"{"action":"update","type":"task","id":"t1","state":"running"}"#);
//! ```

use std::fmt;
use std::sync::Arc;

use serde::ser::{SerializeMap, Serializer};
use serde::{Deserialize, Serialize};

use crate::error::EncodeError;
use crate::model::{Node, Service, Task};

/// What happened to an entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Action {
    /// The entity appeared.
    Start,
    /// The entity disappeared.
    Stop,
    /// The entity's status changed.
    Update,
}

impl Action {
    pub fn as_str(&self) -> &'static str {
        match self {
            Action::Start => "start",
            Action::Stop => "stop",
            Action::Update => "update",
        }
    }
}

/// Classification of cluster events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    Node,
    Service,
    Task,
    /// Lightweight task status change (`id` + `state` only).
    TaskState,
}

impl EventKind {
    /// Label for logs.
    pub fn as_str(&self) -> &'static str {
        match self {
            EventKind::Node => "node",
            EventKind::Service => "service",
            EventKind::Task => "task",
            EventKind::TaskState => "task-state",
        }
    }

    /// Value of the wire `type` field; task-state travels as `task`.
    pub fn wire_type(&self) -> &'static str {
        match self {
            EventKind::Node => "node",
            EventKind::Service => "service",
            EventKind::Task | EventKind::TaskState => "task",
        }
    }
}

/// One change observed in the cluster.
#[derive(Debug, Clone, PartialEq)]
pub enum ClusterEvent {
    Node { action: Action, node: Node },
    Service { action: Action, service: Service },
    Task { action: Action, task: Task },
    /// Always an [`Action::Update`].
    TaskState { id: String, state: String },
}

impl ClusterEvent {
    /// Creates a task-state update.
    pub fn task_state(id: impl Into<String>, state: impl Into<String>) -> Self {
        ClusterEvent::TaskState {
            id: id.into(),
            state: state.into(),
        }
    }

    #[inline]
    pub fn action(&self) -> Action {
        match self {
            ClusterEvent::Node { action, .. }
            | ClusterEvent::Service { action, .. }
            | ClusterEvent::Task { action, .. } => *action,
            ClusterEvent::TaskState { .. } => Action::Update,
        }
    }

    #[inline]
    pub fn kind(&self) -> EventKind {
        match self {
            ClusterEvent::Node { .. } => EventKind::Node,
            ClusterEvent::Service { .. } => EventKind::Service,
            ClusterEvent::Task { .. } => EventKind::Task,
            ClusterEvent::TaskState { .. } => EventKind::TaskState,
        }
    }

    /// Id of the entity the event is about.
    pub fn entity_id(&self) -> &str {
        match self {
            ClusterEvent::Node { node, .. } => &node.id,
            ClusterEvent::Service { service, .. } => &service.id,
            ClusterEvent::Task { task, .. } => &task.id,
            ClusterEvent::TaskState { id, .. } => id,
        }
    }

    /// Serializes the event into an immutable frame.
    pub fn encode(&self) -> Result<Frame, EncodeError> {
        let text = serde_json::to_string(self)?;
        Ok(Frame::from(text))
    }
}

impl Serialize for ClusterEvent {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(None)?;
        map.serialize_entry("action", &self.action())?;
        map.serialize_entry("type", self.kind().wire_type())?;
        match self {
            ClusterEvent::Node { node, .. } => map.serialize_entry("dnode", node)?,
            ClusterEvent::Service { service, .. } => map.serialize_entry("dservice", service)?,
            ClusterEvent::Task { task, .. } => map.serialize_entry("dtask", task)?,
            ClusterEvent::TaskState { id, state } => {
                map.serialize_entry("id", id)?;
                map.serialize_entry("state", state)?;
            }
        }
        map.end()
    }
}

/// Encoded text payload written to subscribers.
///
/// Cheap to clone (`Arc`-backed); the same frame is shared by every subscriber.
#[derive(Clone, PartialEq, Eq)]
pub struct Frame(Arc<str>);

impl Frame {
    /// Text of the liveness probe frame.
    pub const PROBE_TEXT: &'static str = r#"{"type":"ping"}"#;

    /// The liveness probe frame; distinct from every entity event.
    pub fn probe() -> Self {
        Frame(Arc::from(Self::PROBE_TEXT))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_probe(&self) -> bool {
        &*self.0 == Self::PROBE_TEXT
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<String> for Frame {
    fn from(s: String) -> Self {
        Frame(Arc::from(s))
    }
}

impl From<&str> for Frame {
    fn from(s: &str) -> Self {
        Frame(Arc::from(s))
    }
}

impl fmt::Debug for Frame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Frame").field(&&*self.0).finish()
    }
}
