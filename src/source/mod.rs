//! # Cluster source: where listings come from.
//!
//! [`ClusterSource`] is the seam between swarmwatch and the cluster API. The runtime
//! uses [`DockerClient`]; tests plug in in-memory fakes.
//!
//! ## Contract
//! - Every call is a fresh listing; no caching.
//! - Errors are [`SourceError`] and never fatal to callers.
//! - A hung call stalls only its caller (the Docker client gives up after 120s).

mod docker;
pub mod convert;
pub mod raw;

use std::collections::HashMap;

use async_trait::async_trait;

use crate::error::SourceError;

pub use docker::DockerClient;
pub use raw::{RawContainer, RawNetwork, RawNode, RawService, RawTask};

/// Task listing filter.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskFilter {
    /// Only tasks whose desired state equals this value (`None` = all).
    pub desired_state: Option<String>,
}

impl TaskFilter {
    pub fn desired_state(state: impl Into<String>) -> Self {
        Self {
            desired_state: Some(state.into()),
        }
    }

    /// Engine `filters` map, `None` when unfiltered.
    pub fn to_filters(&self) -> Option<HashMap<String, Vec<String>>> {
        self.desired_state
            .as_ref()
            .map(|s| HashMap::from([("desired-state".to_string(), vec![s.clone()])]))
    }

    /// Applies the filter locally (for sources that cannot filter server-side).
    pub fn matches(&self, task: &RawTask) -> bool {
        match &self.desired_state {
            Some(state) => &task.desired_state == state,
            None => true,
        }
    }
}

/// Contract for cluster listing sources.
#[async_trait]
pub trait ClusterSource: Send + Sync + 'static {
    async fn list_nodes(&self) -> Result<Vec<RawNode>, SourceError>;

    async fn list_services(&self) -> Result<Vec<RawService>, SourceError>;

    async fn list_tasks(&self, filter: &TaskFilter) -> Result<Vec<RawTask>, SourceError>;

    /// Running containers on the engine the source talks to.
    async fn list_containers(&self) -> Result<Vec<RawContainer>, SourceError>;

    async fn list_networks(&self) -> Result<Vec<RawNetwork>, SourceError>;
}
