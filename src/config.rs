//! # Global runtime configuration.
//!
//! Provides [`Config`], the centralized settings for the swarmwatch runtime.
//!
//! ## Sentinel values
//! - `queue_capacity = 0` → clamped to 1 by [`Config::queue_capacity_clamped`]
//! - poll/probe intervals of `0s` → clamped to [`MIN_INTERVAL`]
//! - `send_interval = 0s` → no pause between fan-out passes
//! - `task_desired_state = None` → tasks are listed without a desired-state filter

use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use crate::model::EntityKind;

/// Floor applied to poll and probe intervals.
pub const MIN_INTERVAL: Duration = Duration::from_millis(1);

/// Global configuration for the swarmwatch runtime.
///
/// ## Field semantics
/// - `listen`: HTTP/WebSocket listen address
/// - `endpoint`: Docker Engine endpoint (`None` = local defaults)
/// - `static_dir`: directory served under `/`
/// - `node_interval` / `service_interval` / `task_interval`: per-kind poll cadence
/// - `queue_capacity`: bounded event queue size (min 1)
/// - `send_interval`: pause after each fan-out pass
/// - `probe_interval`: liveness probe cadence
/// - `grace`: maximum wait for loops to stop after a termination signal
/// - `task_desired_state`: desired-state filter for task polling
#[derive(Clone, Debug)]
pub struct Config {
    /// Address the HTTP server binds to.
    pub listen: SocketAddr,

    /// Docker Engine endpoint, e.g. `unix:///var/run/docker.sock` or `tcp://10.0.0.5:2375`.
    ///
    /// `None` uses `DOCKER_HOST`, falling back to the local socket.
    pub endpoint: Option<String>,

    /// Directory with the dashboard's static assets.
    pub static_dir: PathBuf,

    /// How often nodes are polled.
    pub node_interval: Duration,

    /// How often services are polled.
    pub service_interval: Duration,

    /// How often tasks are polled.
    pub task_interval: Duration,

    /// Capacity of the event queue between reconcilers and the broadcaster.
    ///
    /// When full, reconcilers wait (backpressure); nothing is dropped.
    pub queue_capacity: usize,

    /// Pause after every fan-out pass; bounds the outbound event rate.
    pub send_interval: Duration,

    /// How often a liveness probe is written to every subscriber.
    pub probe_interval: Duration,

    /// Maximum time to wait for loops to stop after shutdown was requested.
    pub grace: Duration,

    /// Only tasks with this desired state are polled (`None` = all).
    pub task_desired_state: Option<String>,
}

impl Config {
    /// Returns the poll cadence for one entity kind, floored at [`MIN_INTERVAL`].
    #[inline]
    pub fn poll_interval(&self, kind: EntityKind) -> Duration {
        let raw = match kind {
            EntityKind::Node => self.node_interval,
            EntityKind::Service => self.service_interval,
            EntityKind::Task => self.task_interval,
        };
        raw.max(MIN_INTERVAL)
    }

    /// Returns the probe cadence, floored at [`MIN_INTERVAL`].
    #[inline]
    pub fn probe_interval_clamped(&self) -> Duration {
        self.probe_interval.max(MIN_INTERVAL)
    }

    /// Returns the queue capacity clamped to a minimum of 1.
    ///
    /// `tokio::sync::mpsc::channel` panics on zero capacity.
    #[inline]
    pub fn queue_capacity_clamped(&self) -> usize {
        self.queue_capacity.max(1)
    }
}

impl Default for Config {
    /// Default configuration:
    ///
    /// - `listen = 0.0.0.0:6969`
    /// - `endpoint = None` (local defaults)
    /// - `static_dir = static`
    /// - `node_interval = 5s`, `service_interval = 1s`, `task_interval = 1s`
    /// - `queue_capacity = 100`
    /// - `send_interval = 50ms`
    /// - `probe_interval = 5s`
    /// - `grace = 10s`
    /// - `task_desired_state = Some("running")`
    fn default() -> Self {
        Self {
            listen: SocketAddr::from(([0, 0, 0, 0], 6969)),
            endpoint: None,
            static_dir: PathBuf::from("static"),
            node_interval: Duration::from_secs(5),
            service_interval: Duration::from_secs(1),
            task_interval: Duration::from_secs(1),
            queue_capacity: 100,
            send_interval: Duration::from_millis(50),
            probe_interval: Duration::from_secs(5),
            grace: Duration::from_secs(10),
            task_desired_state: Some("running".to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_the_dashboard_cadence() {
        let cfg = Config::default();
        assert_eq!(cfg.listen.port(), 6969);
        assert!(cfg.endpoint.is_none());
        assert_eq!(cfg.poll_interval(EntityKind::Node), Duration::from_secs(5));
        assert_eq!(cfg.poll_interval(EntityKind::Service), Duration::from_secs(1));
        assert_eq!(cfg.poll_interval(EntityKind::Task), Duration::from_secs(1));
        assert_eq!(cfg.send_interval, Duration::from_millis(50));
        assert_eq!(cfg.task_desired_state.as_deref(), Some("running"));
    }

    #[test]
    fn zero_sentinels_are_clamped() {
        let cfg = Config {
            queue_capacity: 0,
            task_interval: Duration::ZERO,
            probe_interval: Duration::ZERO,
            ..Config::default()
        };
        assert_eq!(cfg.queue_capacity_clamped(), 1);
        assert_eq!(cfg.poll_interval(EntityKind::Task), MIN_INTERVAL);
        assert_eq!(cfg.probe_interval_clamped(), MIN_INTERVAL);
    }
}
