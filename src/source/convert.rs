//! Raw listing → entity model conversion.

use crate::model::naming::{format_cpus, format_memory, task_display_name};
use crate::model::{NetworkRef, Node, Service, Task};

use super::raw::{RawNetwork, RawNode, RawService, RawTask};

pub fn nodes(raw: Vec<RawNode>) -> Vec<Node> {
    raw.into_iter().map(node).collect()
}

pub fn node(raw: RawNode) -> Node {
    Node {
        id: raw.id,
        name: raw.description.hostname,
        state: raw.status.state,
        memory: format_memory(raw.description.resources.memory_bytes),
        cpus: format_cpus(raw.description.resources.nano_cpus),
    }
}

pub fn services(raw: Vec<RawService>) -> Vec<Service> {
    raw.into_iter().map(service).collect()
}

pub fn service(raw: RawService) -> Service {
    let spec = raw.spec;

    // TaskTemplate.Networks first, then the deprecated Spec.Networks; first mention wins.
    let mut networks: Vec<String> = Vec::new();
    for target in spec
        .task_template
        .networks
        .iter()
        .chain(spec.networks.iter())
        .map(|n| &n.target)
    {
        if !target.is_empty() && !networks.contains(target) {
            networks.push(target.clone());
        }
    }

    Service {
        id: raw.id,
        name: spec.name,
        image: spec
            .task_template
            .container_spec
            .map(|c| c.image)
            .unwrap_or_default(),
        replicas: spec.mode.replicated.map(|r| r.replicas),
        networks,
        status: raw
            .service_status
            .map(|s| format!("{}/{}", s.running_tasks, s.desired_tasks))
            .unwrap_or_default(),
    }
}

/// Converts tasks, skipping those not yet assigned to a node.
pub fn tasks(raw: Vec<RawTask>) -> Vec<Task> {
    raw.into_iter()
        .filter(|t| !t.node_id.is_empty())
        .map(task)
        .collect()
}

pub fn task(raw: RawTask) -> Task {
    let image = raw
        .spec
        .container_spec
        .map(|c| c.image)
        .unwrap_or_default();

    Task {
        id: raw.id,
        name: task_display_name(&image, raw.slot),
        status: raw.status.state,
        service_id: raw.service_id,
        node_id: raw.node_id,
        networks: raw
            .networks_attachments
            .into_iter()
            .map(|a| NetworkRef {
                id: a.network.id,
                name: a.network.spec.name,
            })
            .collect(),
    }
}

pub fn networks(raw: Vec<RawNetwork>) -> Vec<NetworkRef> {
    raw.into_iter()
        .map(|n| NetworkRef {
            id: n.id,
            name: n.name,
        })
        .collect()
}
