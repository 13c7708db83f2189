//! # Broadcaster: subscriber registry, fan-out and liveness probing.
//!
//! The broadcaster is the single consumer of the event queue and the sole owner of
//! every subscriber connection.
//!
//! ## Architecture
//! ```text
//! /start ──► register(sub) ──► [Mutex<Registry>]
//!                                   ▲          ▲
//! EventReceiver ──► sender loop ────┘          │
//!                   dequeue ─► fan_out ─► sleep(send_interval)
//!                                              │
//!                   prober loop ───────────────┘
//!                   sleep(probe_interval) ─► probe_all
//!
//! fan_out / probe_all:
//!   for (i, sub) in registry: sub.send(frame) ──Err──► mark i
//!   registry.evict(marked) ─► close + log each evicted
//! ```
//!
//! ## Rules
//! - One mutex serializes register, fan-out, probe, eviction and shutdown.
//! - A subscriber that fails a write is evicted exactly once, after the pass in which
//!   it failed; other subscribers still receive the frame in that pass.
//! - Frames are delivered in queue order to every subscriber present for the whole
//!   pass.
//! - `snapshot` does not touch the registry.
//! - After `shutdown` the registry stays closed: a late `register` closes the
//!   subscriber right away, so every registered connection is closed exactly once.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use futures::future::BoxFuture;
use futures::FutureExt;
use tokio::sync::Mutex;
use tokio::{select, time};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::error::SnapshotError;
use crate::events::{EventReceiver, Frame};
use crate::source::{ClusterSource, TaskFilter};

use super::registry::{Entry, Registry};
use super::subscriber::{Subscriber, SubscriberId};

/// Listings available through [`Broadcaster::snapshot`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ListingKind {
    Nodes,
    Services,
    Tasks,
    Containers,
}

impl ListingKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ListingKind::Nodes => "nodes",
            ListingKind::Services => "services",
            ListingKind::Tasks => "tasks",
            ListingKind::Containers => "containers",
        }
    }
}

/// Fan-out hub for dashboard subscribers.
pub struct Broadcaster {
    registry: Mutex<Registry>,
    source: Arc<dyn ClusterSource>,
    send_interval: Duration,
    probe_interval: Duration,
    next_id: AtomicU64,
}

impl Broadcaster {
    pub fn new(
        source: Arc<dyn ClusterSource>,
        send_interval: Duration,
        probe_interval: Duration,
    ) -> Arc<Self> {
        Arc::new(Self {
            registry: Mutex::new(Registry::new()),
            source,
            send_interval,
            probe_interval,
            next_id: AtomicU64::new(1),
        })
    }

    /// Adds a subscriber; it receives every frame fanned out after this returns.
    ///
    /// Returns `None` after [`shutdown`](Self::shutdown); the subscriber is then
    /// closed instead of registered.
    pub async fn register(&self, sub: Box<dyn Subscriber>) -> Option<SubscriberId> {
        let id = SubscriberId(self.next_id.fetch_add(1, Ordering::Relaxed));
        let peer = sub.peer();
        let mut reg = self.registry.lock().await;
        match reg.push(id, sub) {
            Ok(()) => {
                info!(%id, %peer, subscribers = reg.len(), "subscriber registered");
                Some(id)
            }
            Err(mut sub) => {
                drop(reg);
                sub.close().await;
                warn!(%peer, "broadcaster is shut down; subscriber closed");
                None
            }
        }
    }

    /// Number of registered subscribers.
    pub async fn subscriber_count(&self) -> usize {
        self.registry.lock().await.len()
    }

    /// Ids of registered subscribers (order unspecified).
    pub async fn subscriber_ids(&self) -> Vec<SubscriberId> {
        self.registry.lock().await.ids()
    }

    /// Writes `frame` to every subscriber and evicts the ones that failed.
    ///
    /// Returns the number of evicted subscribers.
    pub async fn fan_out(&self, frame: &Frame) -> usize {
        let mut reg = self.registry.lock().await;

        let mut marked = Vec::new();
        for (idx, entry) in reg.iter_mut().enumerate() {
            if let Err(e) = entry.sub.send(frame).await {
                debug!(id = %entry.id, error = %e, "write failed; marking for eviction");
                marked.push(idx);
            }
        }
        if marked.is_empty() {
            return 0;
        }

        let evicted = reg.evict(marked);
        let remaining = reg.len();
        let count = evicted.len();
        for entry in evicted {
            close_evicted(entry, remaining).await;
        }
        count
    }

    /// Writes the probe frame to every subscriber; returns the evicted count.
    pub async fn probe_all(&self) -> usize {
        self.fan_out(&Frame::probe()).await
    }

    /// Returns the named sender and prober loops, ready to be spawned.
    ///
    /// Both loops stop when `token` is cancelled; the sender loop also stops when
    /// every event producer is gone.
    pub fn run(
        self: &Arc<Self>,
        rx: EventReceiver,
        token: &CancellationToken,
    ) -> Vec<(&'static str, BoxFuture<'static, ()>)> {
        let sender = Arc::clone(self);
        let sender_token = token.child_token();
        let prober = Arc::clone(self);
        let prober_token = token.child_token();

        vec![
            (
                "broadcaster:sender",
                async move { sender.sender_loop(rx, sender_token).await }.boxed(),
            ),
            (
                "broadcaster:prober",
                async move { prober.prober_loop(prober_token).await }.boxed(),
            ),
        ]
    }

    /// Dequeues frames in FIFO order and fans each one out.
    pub async fn sender_loop(&self, mut rx: EventReceiver, token: CancellationToken) {
        debug!(send_interval_ms = self.send_interval.as_millis() as u64, "sender loop started");
        loop {
            let frame = select! {
                frame = rx.dequeue() => frame,
                _ = token.cancelled() => break,
            };
            let Some(frame) = frame else {
                info!("event queue closed; sender loop exiting");
                break;
            };

            self.fan_out(&frame).await;

            select! {
                _ = time::sleep(self.send_interval) => {}
                _ = token.cancelled() => break,
            }
        }
        debug!("sender loop stopped");
    }

    /// Probes every subscriber each `probe_interval`.
    pub async fn prober_loop(&self, token: CancellationToken) {
        debug!(probe_interval_ms = self.probe_interval.as_millis() as u64, "prober loop started");
        loop {
            select! {
                _ = time::sleep(self.probe_interval) => {}
                _ = token.cancelled() => break,
            }
            let evicted = self.probe_all().await;
            if evicted > 0 {
                debug!(evicted, "probe pass evicted dead subscribers");
            }
        }
        debug!("prober loop stopped");
    }

    /// Fetches a fresh listing from the source and serializes it.
    ///
    /// Tasks are listed unfiltered.
    pub async fn snapshot(&self, kind: ListingKind) -> Result<Vec<u8>, SnapshotError> {
        let body = match kind {
            ListingKind::Nodes => serde_json::to_vec(&self.source.list_nodes().await?)?,
            ListingKind::Services => serde_json::to_vec(&self.source.list_services().await?)?,
            ListingKind::Tasks => {
                serde_json::to_vec(&self.source.list_tasks(&TaskFilter::default()).await?)?
            }
            ListingKind::Containers => {
                serde_json::to_vec(&self.source.list_containers().await?)?
            }
        };
        Ok(body)
    }

    /// Closes every subscriber once and empties the registry.
    ///
    /// Returns the number of closed subscribers.
    pub async fn shutdown(&self) -> usize {
        let drained = self.registry.lock().await.drain();
        let count = drained.len();
        for mut entry in drained {
            entry.sub.close().await;
        }
        info!(closed = count, "broadcaster shut down");
        count
    }
}

async fn close_evicted(mut entry: Entry, remaining: usize) {
    let peer = entry.sub.peer();
    entry.sub.close().await;
    warn!(id = %entry.id, %peer, remaining, "subscriber evicted");
}
