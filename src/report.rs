//! # Service/network report views.
//!
//! Two projections of the same many-to-many relation: which networks each service
//! attaches to, and which services sit on each network.
//!
//! ## Rules
//! - Rows are sorted by name (ties broken by id).
//! - A service attachment target is matched against network ids first, then
//!   names; an unmatched target is reported with the target as both id and name.
//! - Every network appears in the network report, even with no services.

use std::cmp::Ordering;
use std::collections::HashMap;

use serde::Serialize;

use crate::error::SnapshotError;
use crate::model::{NetworkRef, Service};
use crate::source::{convert, ClusterSource};

/// Service side of a report row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ServiceRef {
    pub id: String,
    pub name: String,
}

/// One service and the networks it attaches to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ServiceReport {
    pub id: String,
    pub name: String,
    pub networks: Vec<NetworkRef>,
}

/// One network and the services attached to it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NetworkReport {
    pub id: String,
    pub name: String,
    pub services: Vec<ServiceRef>,
}

struct NetworkIndex<'a> {
    by_id: HashMap<&'a str, &'a NetworkRef>,
    by_name: HashMap<&'a str, &'a NetworkRef>,
}

impl<'a> NetworkIndex<'a> {
    fn new(networks: &'a [NetworkRef]) -> Self {
        let mut by_id = HashMap::new();
        let mut by_name = HashMap::new();
        for n in networks {
            by_id.entry(n.id.as_str()).or_insert(n);
            by_name.entry(n.name.as_str()).or_insert(n);
        }
        Self { by_id, by_name }
    }

    fn resolve(&self, target: &str) -> NetworkRef {
        match self.by_id.get(target).or_else(|| self.by_name.get(target)) {
            Some(n) => (*n).clone(),
            None => NetworkRef {
                id: target.to_string(),
                name: target.to_string(),
            },
        }
    }
}

fn by_name(a_name: &str, a_id: &str, b_name: &str, b_id: &str) -> Ordering {
    a_name.cmp(b_name).then_with(|| a_id.cmp(b_id))
}

/// Per service, the networks it attaches to.
pub fn service_report(services: &[Service], networks: &[NetworkRef]) -> Vec<ServiceReport> {
    let index = NetworkIndex::new(networks);

    let mut rows: Vec<ServiceReport> = services
        .iter()
        .map(|s| {
            let mut nets: Vec<NetworkRef> = Vec::with_capacity(s.networks.len());
            for target in &s.networks {
                let net = index.resolve(target);
                if !nets.iter().any(|n| n.id == net.id) {
                    nets.push(net);
                }
            }
            nets.sort_by(|a, b| by_name(&a.name, &a.id, &b.name, &b.id));
            ServiceReport {
                id: s.id.clone(),
                name: s.name.clone(),
                networks: nets,
            }
        })
        .collect();

    rows.sort_by(|a, b| by_name(&a.name, &a.id, &b.name, &b.id));
    rows
}

/// Per network, the services attached to it.
pub fn network_report(services: &[Service], networks: &[NetworkRef]) -> Vec<NetworkReport> {
    let index = NetworkIndex::new(networks);

    let mut rows: Vec<NetworkReport> = networks
        .iter()
        .map(|n| NetworkReport {
            id: n.id.clone(),
            name: n.name.clone(),
            services: Vec::new(),
        })
        .collect();
    let mut position: HashMap<String, usize> = rows
        .iter()
        .enumerate()
        .map(|(i, r)| (r.id.clone(), i))
        .collect();

    for s in services {
        for target in &s.networks {
            let net = index.resolve(target);
            let idx = match position.get(&net.id) {
                Some(&idx) => idx,
                None => {
                    rows.push(NetworkReport {
                        id: net.id.clone(),
                        name: net.name,
                        services: Vec::new(),
                    });
                    position.insert(net.id, rows.len() - 1);
                    rows.len() - 1
                }
            };
            let row = &mut rows[idx];
            if !row.services.iter().any(|r| r.id == s.id) {
                row.services.push(ServiceRef {
                    id: s.id.clone(),
                    name: s.name.clone(),
                });
            }
        }
    }

    for row in &mut rows {
        row.services.sort_by(|a, b| by_name(&a.name, &a.id, &b.name, &b.id));
    }
    rows.sort_by(|a, b| by_name(&a.name, &a.id, &b.name, &b.id));
    rows
}

async fn fetch(
    source: &dyn ClusterSource,
) -> Result<(Vec<Service>, Vec<NetworkRef>), SnapshotError> {
    let services = convert::services(source.list_services().await?);
    let networks = convert::networks(source.list_networks().await?);
    Ok((services, networks))
}

/// Builds the service report from fresh listings.
pub async fn build_service_report(
    source: &dyn ClusterSource,
) -> Result<Vec<ServiceReport>, SnapshotError> {
    let (services, networks) = fetch(source).await?;
    Ok(service_report(&services, &networks))
}

/// Builds the network report from fresh listings.
pub async fn build_network_report(
    source: &dyn ClusterSource,
) -> Result<Vec<NetworkReport>, SnapshotError> {
    let (services, networks) = fetch(source).await?;
    Ok(network_report(&services, &networks))
}
