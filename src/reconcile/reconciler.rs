//! # Reconciler: single-kind poll/diff loop.
//!
//! Owns the last snapshot of one entity kind and publishes the minimal diff on
//! every poll tick.
//!
//! ## Architecture
//! ```text
//! Runtime ──► Reconciler<W>::run(token)
//!
//! loop {
//!   ├─► tick():
//!   │     ├─► W::poll(source) ──Err──► warn, keep last, skip cycle
//!   │     ├─► Snapshot::from_listing(current)
//!   │     ├─► last == None ? prime (no events)
//!   │     │                : reconcile(last, current) ─► encode ─► queue.enqueue()
//!   │     └─► last = current
//!   └─► sleep(interval) (cancellable)
//! }
//! ```
//!
//! ## Rules
//! - `last` is owned by the reconciler alone; nothing else reads it.
//! - Cancellation is checked at **safe points**: before each tick, while an
//!   enqueue waits on a full queue, and during the interval sleep.
//! - A failed poll never replaces `last`.
//! - An event that fails to encode is logged and skipped; the cycle continues.

use std::sync::Arc;
use std::time::Duration;

use tokio::{select, time};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::error::SourceError;
use crate::events::EventSender;
use crate::model::Snapshot;
use crate::source::ClusterSource;

use super::diff::reconcile;
use super::watch::Watch;

/// Result of one successful poll cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tick {
    /// First successful poll; `entities` were recorded without emitting events.
    Primed { entities: usize },
    /// Diff published; `events` frames were enqueued.
    Published { events: usize },
    /// Cancelled or the queue consumer is gone; the loop should exit.
    Stopped,
}

/// Polls one entity kind and publishes its changes.
pub struct Reconciler<W: Watch> {
    watch: W,
    source: Arc<dyn ClusterSource>,
    queue: EventSender,
    interval: Duration,
    last: Option<Snapshot<W::Entity>>,
}

impl<W: Watch> Reconciler<W> {
    pub fn new(
        watch: W,
        source: Arc<dyn ClusterSource>,
        queue: EventSender,
        interval: Duration,
    ) -> Self {
        Self {
            watch,
            source,
            queue,
            interval,
            last: None,
        }
    }

    /// Loop name used in logs and shutdown reports, e.g. `reconciler:node`.
    pub fn name(&self) -> String {
        format!("reconciler:{}", self.watch.kind())
    }

    /// The snapshot from the last successful poll, if any.
    pub fn last(&self) -> Option<&Snapshot<W::Entity>> {
        self.last.as_ref()
    }

    /// Runs the loop until `token` is cancelled or the queue closes.
    pub async fn run(mut self, token: CancellationToken) {
        let kind = self.watch.kind();
        info!(%kind, interval_ms = self.interval.as_millis() as u64, "reconciler started");

        loop {
            if token.is_cancelled() {
                break;
            }

            match self.tick(&token).await {
                Ok(Tick::Stopped) => break,
                Ok(Tick::Primed { entities }) => {
                    info!(%kind, entities, "initial snapshot recorded");
                }
                Ok(Tick::Published { events }) => {
                    if events > 0 {
                        debug!(%kind, events, "changes published");
                    }
                }
                Err(e) => {
                    warn!(
                        %kind,
                        op = e.op(),
                        label = e.as_label(),
                        error = %e,
                        "poll failed; keeping previous snapshot"
                    );
                }
            }

            let sleep = time::sleep(self.interval);
            tokio::pin!(sleep);
            select! {
                _ = &mut sleep => {}
                _ = token.cancelled() => { break; }
            }
        }

        info!(%kind, "reconciler stopped");
    }

    /// Runs one poll cycle.
    pub async fn tick(&mut self, token: &CancellationToken) -> Result<Tick, SourceError> {
        let listing = self.watch.poll(self.source.as_ref()).await?;
        let current = Snapshot::from_listing(listing);

        let Some(last) = self.last.as_ref() else {
            let entities = current.len();
            self.last = Some(current);
            return Ok(Tick::Primed { entities });
        };

        let events = reconcile::<W>(last, &current);
        self.last = Some(current);

        let mut published = 0;
        for ev in events {
            let frame = match ev.encode() {
                Ok(frame) => frame,
                Err(e) => {
                    error!(
                        kind = ev.kind().as_str(),
                        id = ev.entity_id(),
                        error = %e,
                        "dropping event that failed to encode"
                    );
                    continue;
                }
            };

            select! {
                res = self.queue.enqueue(frame) => {
                    if res.is_err() {
                        warn!(kind = %self.watch.kind(), "event queue closed");
                        return Ok(Tick::Stopped);
                    }
                    published += 1;
                }
                _ = token.cancelled() => return Ok(Tick::Stopped),
            }
        }

        Ok(Tick::Published { events: published })
    }
}
