//! # Per-kind polling and event mapping.
//!
//! A [`Watch`] tells a [`Reconciler`](super::Reconciler) how to fetch one entity
//! kind and how to turn a [`Change`] of that kind into a [`ClusterEvent`].

use async_trait::async_trait;

use crate::error::SourceError;
use crate::events::{Action, ClusterEvent};
use crate::model::{Entity, EntityKind, Node, Service, Task};
use crate::source::{convert, ClusterSource, TaskFilter};

use super::diff::Change;

/// Contract for one polled entity kind.
#[async_trait]
pub trait Watch: Send + Sync + 'static {
    type Entity: Entity + Clone + Send + Sync + 'static;

    fn kind(&self) -> EntityKind;

    /// Fetches the current listing of this kind.
    async fn poll(&self, source: &dyn ClusterSource) -> Result<Vec<Self::Entity>, SourceError>;

    /// Maps one change to the event broadcast for it.
    fn event(change: Change<Self::Entity>) -> ClusterEvent;
}

fn action_of<T>(change: &Change<T>) -> Action {
    match change {
        Change::Removed(_) => Action::Stop,
        Change::Added(_) => Action::Start,
        Change::Updated(_) => Action::Update,
    }
}

/// Watches swarm nodes.
#[derive(Debug, Clone, Copy, Default)]
pub struct NodeWatch;

#[async_trait]
impl Watch for NodeWatch {
    type Entity = Node;

    fn kind(&self) -> EntityKind {
        EntityKind::Node
    }

    async fn poll(&self, source: &dyn ClusterSource) -> Result<Vec<Node>, SourceError> {
        source.list_nodes().await.map(convert::nodes)
    }

    fn event(change: Change<Node>) -> ClusterEvent {
        let action = action_of(&change);
        let (Change::Removed(node) | Change::Added(node) | Change::Updated(node)) = change;
        ClusterEvent::Node { action, node }
    }
}

/// Watches swarm services.
#[derive(Debug, Clone, Copy, Default)]
pub struct ServiceWatch;

#[async_trait]
impl Watch for ServiceWatch {
    type Entity = Service;

    fn kind(&self) -> EntityKind {
        EntityKind::Service
    }

    async fn poll(&self, source: &dyn ClusterSource) -> Result<Vec<Service>, SourceError> {
        source.list_services().await.map(convert::services)
    }

    fn event(change: Change<Service>) -> ClusterEvent {
        let action = action_of(&change);
        let (Change::Removed(service) | Change::Added(service) | Change::Updated(service)) =
            change;
        ClusterEvent::Service { action, service }
    }
}

/// Watches scheduled tasks matching a filter.
///
/// Tasks without an assigned node are dropped before diffing.
#[derive(Debug, Clone, Default)]
pub struct TaskWatch {
    pub filter: TaskFilter,
}

impl TaskWatch {
    pub fn new(filter: TaskFilter) -> Self {
        Self { filter }
    }
}

#[async_trait]
impl Watch for TaskWatch {
    type Entity = Task;

    fn kind(&self) -> EntityKind {
        EntityKind::Task
    }

    async fn poll(&self, source: &dyn ClusterSource) -> Result<Vec<Task>, SourceError> {
        source.list_tasks(&self.filter).await.map(convert::tasks)
    }

    fn event(change: Change<Task>) -> ClusterEvent {
        match change {
            Change::Removed(task) => ClusterEvent::Task {
                action: Action::Stop,
                task,
            },
            Change::Added(task) => ClusterEvent::Task {
                action: Action::Start,
                task,
            },
            Change::Updated(task) => ClusterEvent::TaskState {
                id: task.id,
                state: task.status,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::fake::FakeSource;
    use crate::source::raw::{RawTask, TaskStatus};

    #[test]
    fn service_changes_map_to_service_events() {
        let svc = Service {
            id: "s1".into(),
            ..Service::default()
        };
        let ev = ServiceWatch::event(Change::Removed(svc.clone()));
        assert_eq!(ev.action(), Action::Stop);
        let ev = ServiceWatch::event(Change::Updated(svc));
        assert!(matches!(ev, ClusterEvent::Service { action: Action::Update, .. }));
    }

    #[tokio::test]
    async fn task_poll_applies_filter_and_node_assignment() {
        let source = FakeSource::default();
        let task = |id: &str, node: &str, desired: &str| RawTask {
            id: id.into(),
            node_id: node.into(),
            desired_state: desired.into(),
            status: TaskStatus {
                state: "running".into(),
            },
            ..RawTask::default()
        };
        *source.tasks.lock().unwrap() = vec![
            task("scheduled", "n1", "running"),
            task("pending", "", "running"),
            task("old", "n1", "shutdown"),
        ];

        let watch = TaskWatch::new(TaskFilter::desired_state("running"));
        let tasks = watch.poll(&source).await.unwrap();
        let ids: Vec<&str> = tasks.iter().map(|t| t.id.as_str()).collect();
        assert_eq!(ids, vec!["scheduled"]);
    }
}
