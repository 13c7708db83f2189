//! # swarmwatch
//!
//! **swarmwatch** is the backend of a live container-swarm dashboard.
//!
//! It polls the cluster API for nodes, services and tasks, diffs every listing
//! against the previous one, and streams the resulting start/stop/update events to
//! every connected WebSocket client. Plain HTTP endpoints serve full listings and
//! service/network reports on demand.
//!
//! ## Architecture
//! ### Overview
//! ```text
//!                     ┌─────────────────────────────────┐
//!                     │   ClusterSource (Docker API)    │
//!                     └──┬──────────┬──────────┬─────┬──┘
//!                  poll  │    poll  │    poll  │     │ on-demand listings
//!                        ▼          ▼          ▼     │
//!     ┌────────────────┐ ┌────────────────┐ ┌────────────────┐
//!     │  Reconciler    │ │  Reconciler    │ │  Reconciler    │
//!     │  <NodeWatch>   │ │ <ServiceWatch> │ │  <TaskWatch>   │
//!     │  every 5s      │ │  every 1s      │ │  every 1s      │
//!     └───────┬────────┘ └───────┬────────┘ └───────┬────────┘
//!             │ diff ─► ClusterEvent ─► Frame       │        │
//!             ▼                  ▼                  ▼        │
//! ┌──────────────────────────────────────────────────────┐   │
//! │        event queue (bounded FIFO, backpressure)       │   │
//! └──────────────────────────┬───────────────────────────┘   │
//!                            ▼                               │
//! ┌──────────────────────────────────────────────────────────┴──┐
//! │  Broadcaster                                                │
//! │  - sender loop: dequeue ─► fan_out ─► sleep(send_interval)  │
//! │  - prober loop: probe_all every probe_interval              │
//! │  - Mutex<Registry> of subscribers, batch eviction           │
//! │  - snapshot(kind) for listing endpoints                     │
//! └──────┬──────────────────┬──────────────────┬────────────────┘
//!        ▼                  ▼                  ▼
//!    WebSocket 1        WebSocket 2        WebSocket N
//! ```
//!
//! ### Lifecycle
//! ```text
//! RuntimeBuilder::new(cfg).with_source(src).build()? ─► Runtime::run()
//!   ├─► bind listener, spawn reconcilers, broadcaster loops, HTTP server
//!   ├─► wait for SIGINT / SIGTERM / SIGQUIT / Ctrl-C
//!   ├─► cancel all loops, close every subscriber once
//!   └─► join within cfg.grace, else RuntimeError::GraceExceeded
//! ```
//!
//! ## Features
//! | Area             | Description                                              | Key types                                  |
//! |------------------|----------------------------------------------------------|--------------------------------------------|
//! | **Model**        | Node/service/task records and id-unique snapshots.       | [`Node`], [`Service`], [`Task`], [`Snapshot`] |
//! | **Events**       | Tagged-union change events and their encoded frames.     | [`ClusterEvent`], [`Action`], [`Frame`]    |
//! | **Reconcile**    | Pure diff plus the periodic per-kind poll loop.          | [`reconcile::Reconciler`], [`reconcile::Watch`] |
//! | **Broadcast**    | Subscriber registry, fan-out, probing, shutdown.         | [`broadcast::Broadcaster`], [`broadcast::Subscriber`] |
//! | **Source**       | Cluster API seam and the Docker implementation.          | [`ClusterSource`], [`DockerClient`]        |
//! | **Reports**      | Service→networks and network→services views.             | [`report::service_report`], [`report::network_report`] |
//! | **Errors**       | Typed errors with stable log labels.                     | [`SourceError`], [`RuntimeError`]          |
//! | **Configuration**| Centralized runtime settings.                            | [`Config`]                                 |
//!
//! ## Example
//! ```no_run
//! use std::sync::Arc;
//! use swarmwatch::{Config, DockerClient, RuntimeBuilder};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let cfg = Config::default();
//!     let docker = DockerClient::connect(cfg.endpoint.as_deref())?;
//!
//!     let runtime = RuntimeBuilder::new(cfg)
//!         .with_source(Arc::new(docker))
//!         .build()?;
//!     runtime.run().await?;
//!     Ok(())
//! }
//! ```
mod config;
mod core;
mod error;
mod events;
mod server;

pub mod broadcast;
pub mod model;
pub mod reconcile;
pub mod report;
pub mod source;
pub mod telemetry;

// ---- Public re-exports ----

pub use config::{Config, MIN_INTERVAL};
pub use crate::core::{Runtime, RuntimeBuilder};
pub use error::{EncodeError, RuntimeError, SendError, SnapshotError, SourceError};
pub use events::queue;
pub use events::{Action, ClusterEvent, EventKind, EventReceiver, EventSender, Frame, QueueClosed};
pub use model::{Entity, EntityKind, NetworkRef, Node, Service, Snapshot, Task};
pub use server::{router, AppState, WsSubscriber};
pub use source::{ClusterSource, DockerClient, TaskFilter};
