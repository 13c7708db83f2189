//! # Snapshot diff.
//!
//! Pure functions; no I/O, no shared state.
//!
//! ## Rules
//! ```text
//! last ─┬─ id not in current            → Removed  (in last order)
//!       │
//! current ─┬─ id not in last            → Added    (in current order)
//!          └─ id in last, status differs → Updated (in current order)
//! ```
//! Output order is all removals, then all additions, then all updates.

use crate::events::ClusterEvent;
use crate::model::{Entity, Snapshot};

use super::watch::Watch;

/// One difference between two snapshots.
#[derive(Debug, Clone, PartialEq)]
pub enum Change<T> {
    Removed(T),
    Added(T),
    /// Carries the current version of the entity.
    Updated(T),
}

impl<T> Change<T> {
    pub fn entity(&self) -> &T {
        match self {
            Change::Removed(e) | Change::Added(e) | Change::Updated(e) => e,
        }
    }
}

/// Computes the minimal change list from `last` to `current`.
pub fn diff<T: Entity + Clone>(last: &Snapshot<T>, current: &Snapshot<T>) -> Vec<Change<T>> {
    let mut changes = Vec::new();

    for old in last.items() {
        if !current.contains(old.id()) {
            changes.push(Change::Removed(old.clone()));
        }
    }

    for new in current.items() {
        if !last.contains(new.id()) {
            changes.push(Change::Added(new.clone()));
        }
    }

    for new in current.items() {
        if let Some(old) = last.get(new.id()) {
            if old.status() != new.status() {
                changes.push(Change::Updated(new.clone()));
            }
        }
    }

    changes
}

/// Diffs two snapshots of one kind into the events to broadcast.
pub fn reconcile<W: Watch>(
    last: &Snapshot<W::Entity>,
    current: &Snapshot<W::Entity>,
) -> Vec<ClusterEvent> {
    diff(last, current).into_iter().map(W::event).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::{Action, EventKind};
    use crate::model::{Node, Task};
    use crate::reconcile::watch::{NodeWatch, TaskWatch};

    fn node(id: &str, state: &str) -> Node {
        Node {
            id: id.into(),
            name: format!("{id}-name"),
            state: state.into(),
            ..Node::default()
        }
    }

    fn nodes(ids: &[&str]) -> Snapshot<Node> {
        ids.iter().map(|id| node(id, "running")).collect()
    }

    fn count(events: &[ClusterEvent], action: Action) -> usize {
        events.iter().filter(|e| e.action() == action).count()
    }

    #[test]
    fn one_node_added() {
        let events = reconcile::<NodeWatch>(&nodes(&["node1", "node2"]), &nodes(&["node1", "node2", "node3"]));
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].action(), Action::Start);
        assert_eq!(events[0].entity_id(), "node3");
    }

    #[test]
    fn one_node_removed() {
        let events = reconcile::<NodeWatch>(&nodes(&["node1", "node2"]), &nodes(&["node2"]));
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].action(), Action::Stop);
        assert_eq!(events[0].entity_id(), "node1");
    }

    #[test]
    fn one_removed_two_added() {
        let events = reconcile::<NodeWatch>(
            &nodes(&["node1", "node2"]),
            &nodes(&["node2", "node3", "node4"]),
        );
        assert_eq!(count(&events, Action::Stop), 1);
        assert_eq!(count(&events, Action::Start), 2);
        let order: Vec<&str> = events.iter().map(|e| e.entity_id()).collect();
        assert_eq!(order, vec!["node1", "node3", "node4"]);
    }

    #[test]
    fn status_change_is_one_update() {
        let last: Snapshot<Node> = vec![node("node1", "running"), node("node2", "running")]
            .into_iter()
            .collect();
        let current: Snapshot<Node> = vec![node("node1", "paused"), node("node2", "running")]
            .into_iter()
            .collect();
        let events = reconcile::<NodeWatch>(&last, &current);
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].action(), Action::Update);
        match &events[0] {
            ClusterEvent::Node { node, .. } => assert_eq!(node.state, "paused"),
            other => panic!("unexpected event {other:?}"),
        }
    }

    #[test]
    fn identical_snapshots_emit_nothing() {
        let snap = nodes(&["a", "b", "c"]);
        assert!(reconcile::<NodeWatch>(&snap, &snap).is_empty());
        let empty: Snapshot<Node> = Snapshot::default();
        assert!(reconcile::<NodeWatch>(&empty, &empty).is_empty());
    }

    #[test]
    fn counts_ignore_listing_order() {
        let last: Snapshot<Node> = vec![node("a", "up"), node("b", "up"), node("c", "up")]
            .into_iter()
            .collect();
        let forward: Snapshot<Node> = vec![node("b", "down"), node("c", "up"), node("d", "up")]
            .into_iter()
            .collect();
        let reversed: Snapshot<Node> = vec![node("d", "up"), node("c", "up"), node("b", "down")]
            .into_iter()
            .collect();
        let last_rev: Snapshot<Node> = vec![node("c", "up"), node("b", "up"), node("a", "up")]
            .into_iter()
            .collect();

        for (l, c) in [(&last, &forward), (&last, &reversed), (&last_rev, &forward), (&last_rev, &reversed)] {
            let events = reconcile::<NodeWatch>(l, c);
            assert_eq!(count(&events, Action::Stop), 1);
            assert_eq!(count(&events, Action::Start), 1);
            assert_eq!(count(&events, Action::Update), 1);
        }
    }

    #[test]
    fn event_counts_match_set_differences() {
        let last = nodes(&["a", "b", "c", "d"]);
        let mut current: Vec<Node> = ["c", "d", "e", "f", "g"]
            .iter()
            .map(|id| node(id, "running"))
            .collect();
        current[1].state = "drain".into();
        let current: Snapshot<Node> = current.into_iter().collect();

        let events = reconcile::<NodeWatch>(&last, &current);
        assert_eq!(count(&events, Action::Start), 3); // |current \ last|
        assert_eq!(count(&events, Action::Stop), 2); // |last \ current|
        assert_eq!(count(&events, Action::Update), 1);
    }

    #[test]
    fn task_status_change_is_a_task_state_event() {
        let task = |status: &str| Task {
            id: "t1".into(),
            name: "web.1".into(),
            status: status.into(),
            ..Task::default()
        };
        let last: Snapshot<Task> = vec![task("starting")].into_iter().collect();
        let current: Snapshot<Task> = vec![task("running")].into_iter().collect();

        let events = reconcile::<TaskWatch>(&last, &current);
        assert_eq!(events, vec![ClusterEvent::task_state("t1", "running")]);
        assert_eq!(events[0].kind(), EventKind::TaskState);
    }

    #[test]
    fn diff_reports_current_version_on_update() {
        let last: Snapshot<Node> = vec![node("a", "up")].into_iter().collect();
        let current: Snapshot<Node> = vec![node("a", "down")].into_iter().collect();
        let changes = diff(&last, &current);
        assert_eq!(changes.len(), 1);
        assert!(matches!(&changes[0], Change::Updated(n) if n.state == "down"));
        assert_eq!(changes[0].entity().id, "a");
    }
}
