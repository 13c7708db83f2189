//! # Docker Engine API client.
//!
//! Built on [`bollard`]. Without an explicit endpoint the client uses the local
//! defaults: `DOCKER_HOST` when set, otherwise `/var/run/docker.sock`.
//!
//! Explicit endpoints:
//! - `unix:///path/to/docker.sock` or a bare absolute socket path
//! - `tcp://host:port` or `http://host:port`
//!
//! Engine models are reshaped into the [`raw`](super::raw) records through their
//! JSON form, so top-level fields swarmwatch does not read are kept.
//!
//! The engine's task model carries no network attachments, so tasks without any
//! get the networks their service's spec attaches to, resolved against the
//! network listing.

use std::collections::HashMap;

use async_trait::async_trait;
use bollard::query_parameters::{
    ListContainersOptions, ListNetworksOptions, ListNodesOptions, ListServicesOptions,
    ListTasksOptions,
};
use bollard::{Docker, API_DEFAULT_VERSION};
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::{RuntimeError, SourceError};

use super::convert;
use super::raw::{AttachedNetwork, AttachedNetworkSpec, NetworkAttachment};
use super::{ClusterSource, RawContainer, RawNetwork, RawNode, RawService, RawTask, TaskFilter};

/// Per-request timeout in seconds (bollard's own default).
const REQUEST_TIMEOUT: u64 = 120;

/// Longest engine error message kept in a [`SourceError::Status`].
const MAX_ERROR_BODY: usize = 512;

/// [`ClusterSource`] backed by the Docker Engine API.
#[derive(Clone, Debug)]
pub struct DockerClient {
    docker: Docker,
    endpoint: String,
}

impl DockerClient {
    /// Connects to `endpoint`, or to the local defaults when `None`.
    ///
    /// No request is made here; an unreachable engine shows up as
    /// [`SourceError::Transport`] on the first listing.
    ///
    /// Fails with [`RuntimeError::InvalidEndpoint`] for empty endpoints and
    /// unsupported schemes.
    pub fn connect(endpoint: Option<&str>) -> Result<Self, RuntimeError> {
        let Some(endpoint) = endpoint else {
            let docker = Docker::connect_with_local_defaults().map_err(|e| {
                RuntimeError::InvalidEndpoint {
                    endpoint: "local defaults".to_string(),
                    reason: e.to_string(),
                }
            })?;
            return Ok(Self {
                docker,
                endpoint: "local defaults".to_string(),
            });
        };

        let invalid = |reason: String| RuntimeError::InvalidEndpoint {
            endpoint: endpoint.to_string(),
            reason,
        };

        let trimmed = endpoint.trim();
        let docker = match Endpoint::parse(trimmed) {
            Endpoint::Socket(path) => {
                Docker::connect_with_socket(path, REQUEST_TIMEOUT, API_DEFAULT_VERSION)
            }
            Endpoint::Http(addr) => {
                Docker::connect_with_http(addr, REQUEST_TIMEOUT, API_DEFAULT_VERSION)
            }
            Endpoint::Empty => return Err(invalid("endpoint is empty".into())),
            Endpoint::Unsupported(scheme) => {
                return Err(invalid(format!("unsupported scheme {scheme:?}")))
            }
        }
        .map_err(|e| invalid(e.to_string()))?;

        Ok(Self {
            docker,
            endpoint: trimmed.to_string(),
        })
    }

    /// Endpoint as configured, for logs.
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Fills empty task network attachments from the owning service's spec.
    async fn attach_service_networks(&self, tasks: &mut [RawTask]) -> Result<(), SourceError> {
        if tasks.iter().all(|t| !t.networks_attachments.is_empty()) {
            return Ok(());
        }
        let services = self.list_services().await?;
        let networks = self.list_networks().await?;
        fill_attachments(tasks, &services, &networks);
        Ok(())
    }
}

/// Resolves each service's network targets (id or name) and attaches them to its
/// tasks that have none. Unknown targets are used as both id and name.
fn fill_attachments(tasks: &mut [RawTask], services: &[RawService], networks: &[RawNetwork]) {
    let resolve = |target: &str| -> NetworkAttachment {
        let found = networks
            .iter()
            .find(|n| n.id == target)
            .or_else(|| networks.iter().find(|n| n.name == target));
        let (id, name) = match found {
            Some(n) => (n.id.clone(), n.name.clone()),
            None => (target.to_string(), target.to_string()),
        };
        NetworkAttachment {
            network: AttachedNetwork {
                id,
                spec: AttachedNetworkSpec { name },
            },
        }
    };

    let by_service: HashMap<&str, Vec<String>> = services
        .iter()
        .map(|s| (s.id.as_str(), convert::service(s.clone()).networks))
        .collect();

    for task in tasks.iter_mut().filter(|t| t.networks_attachments.is_empty()) {
        if let Some(targets) = by_service.get(task.service_id.as_str()) {
            task.networks_attachments = targets.iter().map(|t| resolve(t)).collect();
        }
    }
}

/// Classified endpoint string.
#[derive(Debug, PartialEq, Eq)]
enum Endpoint<'a> {
    Empty,
    Socket(&'a str),
    Http(&'a str),
    Unsupported(&'a str),
}

impl<'a> Endpoint<'a> {
    fn parse(endpoint: &'a str) -> Self {
        if endpoint.is_empty() {
            return Endpoint::Empty;
        }
        if endpoint.starts_with('/') {
            return Endpoint::Socket(endpoint);
        }
        match endpoint.split_once("://") {
            Some(("unix", path)) if !path.is_empty() => Endpoint::Socket(path),
            Some(("tcp" | "http", rest)) if !rest.is_empty() => Endpoint::Http(endpoint),
            Some((scheme, _)) => Endpoint::Unsupported(scheme),
            None => Endpoint::Unsupported(""),
        }
    }
}

/// Maps a bollard error onto the listing error taxonomy.
fn source_error(op: &'static str, err: bollard::errors::Error) -> SourceError {
    use bollard::errors::Error as E;

    match err {
        E::DockerResponseServerError {
            status_code,
            mut message,
        } => {
            if message.len() > MAX_ERROR_BODY {
                let mut cut = MAX_ERROR_BODY;
                while !message.is_char_boundary(cut) {
                    cut -= 1;
                }
                message.truncate(cut);
            }
            SourceError::Status {
                op,
                status: status_code,
                body: message,
            }
        }
        e @ (E::JsonDataError { .. } | E::JsonSerdeError { .. }) => SourceError::Decode {
            op,
            error: e.to_string(),
        },
        e => SourceError::Transport {
            op,
            error: e.to_string(),
        },
    }
}

/// Re-reads engine models as raw records via their JSON form.
fn reshape<M, R>(op: &'static str, items: Vec<M>) -> Result<Vec<R>, SourceError>
where
    M: Serialize,
    R: DeserializeOwned,
{
    items
        .into_iter()
        .map(|m| serde_json::to_value(m).and_then(serde_json::from_value))
        .collect::<Result<_, _>>()
        .map_err(|e| SourceError::Decode {
            op,
            error: e.to_string(),
        })
}

#[async_trait]
impl ClusterSource for DockerClient {
    async fn list_nodes(&self) -> Result<Vec<RawNode>, SourceError> {
        let op = "list_nodes";
        let nodes = self
            .docker
            .list_nodes(None::<ListNodesOptions>)
            .await
            .map_err(|e| source_error(op, e))?;
        reshape(op, nodes)
    }

    async fn list_services(&self) -> Result<Vec<RawService>, SourceError> {
        let op = "list_services";
        let opts = ListServicesOptions {
            status: Some(true),
            ..Default::default()
        };
        let services = self
            .docker
            .list_services(Some(opts))
            .await
            .map_err(|e| source_error(op, e))?;
        reshape(op, services)
    }

    async fn list_tasks(&self, filter: &TaskFilter) -> Result<Vec<RawTask>, SourceError> {
        let op = "list_tasks";
        let opts = ListTasksOptions {
            filters: filter.to_filters(),
            ..Default::default()
        };
        let tasks = self
            .docker
            .list_tasks(Some(opts))
            .await
            .map_err(|e| source_error(op, e))?;
        let mut tasks: Vec<RawTask> = reshape(op, tasks)?;
        self.attach_service_networks(&mut tasks).await?;
        Ok(tasks)
    }

    async fn list_containers(&self) -> Result<Vec<RawContainer>, SourceError> {
        let op = "list_containers";
        let containers = self
            .docker
            .list_containers(None::<ListContainersOptions>)
            .await
            .map_err(|e| source_error(op, e))?;
        reshape(op, containers)
    }

    async fn list_networks(&self) -> Result<Vec<RawNetwork>, SourceError> {
        let op = "list_networks";
        let networks = self
            .docker
            .list_networks(None::<ListNetworksOptions>)
            .await
            .map_err(|e| source_error(op, e))?;
        reshape(op, networks)
    }
}
