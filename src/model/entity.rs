//! # Cluster entities.
//!
//! Records are converted from raw API listings by [`crate::source`] and carry only
//! what the dashboard renders. Field names on the wire are camelCase.

use std::fmt;

use serde::{Deserialize, Serialize};

/// The polled entity kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntityKind {
    Node,
    Service,
    Task,
}

impl EntityKind {
    /// Lowercase name, also used as the wire `type`.
    pub fn as_str(&self) -> &'static str {
        match self {
            EntityKind::Node => "node",
            EntityKind::Service => "service",
            EntityKind::Task => "task",
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Identity and status access shared by all entity kinds.
///
/// Two entities are "the same" when their ids match; a changed
/// [`status`](Entity::status) on the same id is an update.
pub trait Entity {
    fn id(&self) -> &str;
    fn status(&self) -> &str;
}

/// A swarm node.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Node {
    pub id: String,
    /// Hostname.
    pub name: String,
    /// Node status, e.g. `ready`, `down`.
    pub state: String,
    /// Formatted memory capacity, e.g. `2.1 GB`.
    pub memory: String,
    /// Formatted CPU capacity, e.g. `4 CPU(s)`.
    pub cpus: String,
}

impl Entity for Node {
    fn id(&self) -> &str {
        &self.id
    }

    fn status(&self) -> &str {
        &self.state
    }
}

/// A swarm service.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Service {
    pub id: String,
    pub name: String,
    pub image: String,
    /// Desired replica count (replicated mode only).
    pub replicas: Option<u64>,
    /// Ids of the networks the service's tasks attach to.
    pub networks: Vec<String>,
    /// `running/desired` task counts, empty when the API does not report them.
    pub status: String,
}

impl Entity for Service {
    fn id(&self) -> &str {
        &self.id
    }

    fn status(&self) -> &str {
        &self.status
    }
}

/// Network attachment of a task, or a network in a report.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct NetworkRef {
    pub id: String,
    pub name: String,
}

/// A scheduled swarm task.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: String,
    /// Display name, see [`naming::task_display_name`](super::naming::task_display_name).
    pub name: String,
    /// Task state, e.g. `running`, `shutdown`.
    pub status: String,
    pub service_id: String,
    pub node_id: String,
    pub networks: Vec<NetworkRef>,
}

impl Entity for Task {
    fn id(&self) -> &str {
        &self.id
    }

    fn status(&self) -> &str {
        &self.status
    }
}
