//! # Runtime: wires reconcilers, broadcaster and HTTP server, and drives shutdown.
//!
//! ## Architecture
//! ```text
//! Runtime::run()
//!   ├─► TcpListener::bind(cfg.listen)            (fails → RuntimeError::Bind)
//!   ├─► events::queue::channel(queue_capacity)
//!   ├─► spawn (each under runtime_token.child_token(), tracked in AliveSet):
//!   │     reconciler:node     Reconciler<NodeWatch>    ──┐
//!   │     reconciler:service  Reconciler<ServiceWatch> ──┼─► EventSender
//!   │     reconciler:task     Reconciler<TaskWatch>    ──┘
//!   │     broadcaster:sender  EventReceiver ─► fan_out
//!   │     broadcaster:prober  probe_all every probe_interval
//!   │     http                axum::serve(router)
//!   │
//!   └─► drive_shutdown():
//!         wait_for_shutdown_signal() / a loop failing or panicking
//!           └─► runtime_token.cancel()
//!           └─► within cfg.grace:
//!                 broadcaster.shutdown()   (close every subscriber once)
//!                 join all loops
//!               ├─ Ok        → Ok(())
//!               └─ timed out → RuntimeError::GraceExceeded { stuck }
//! ```
//!
//! ## Rules
//! - All state lives in the runtime's components; nothing is process-global.
//! - The HTTP server is the only loop that returns errors; its failure shuts down the rest.
//! - A panic in any loop is caught, reported as [`RuntimeError::LoopPanicked`], and
//!   shuts down the rest. Nothing keeps serving without its event stream.

use std::future::Future;
use std::io;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use futures::FutureExt;
use tokio::net::TcpListener;
use tokio::task::JoinSet;
use tokio::{select, time};
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use crate::broadcast::Broadcaster;
use crate::config::Config;
use crate::error::RuntimeError;
use crate::events::{self, EventSender};
use crate::model::EntityKind;
use crate::reconcile::{NodeWatch, Reconciler, ServiceWatch, TaskWatch, Watch};
use crate::server::{self, AppState};
use crate::source::{ClusterSource, TaskFilter};

use super::alive::AliveSet;
use super::shutdown;

type LoopSet = JoinSet<Result<(), RuntimeError>>;

/// The assembled swarmwatch service.
pub struct Runtime {
    cfg: Config,
    source: Arc<dyn ClusterSource>,
    broadcaster: Arc<Broadcaster>,
}

impl Runtime {
    pub(crate) fn new_internal(cfg: Config, source: Arc<dyn ClusterSource>) -> Self {
        let broadcaster = Broadcaster::new(
            Arc::clone(&source),
            cfg.send_interval,
            cfg.probe_interval_clamped(),
        );
        Self {
            cfg,
            source,
            broadcaster,
        }
    }

    pub fn config(&self) -> &Config {
        &self.cfg
    }

    pub fn broadcaster(&self) -> &Arc<Broadcaster> {
        &self.broadcaster
    }

    /// Runs until a termination signal arrives, then shuts down gracefully.
    pub async fn run(&self) -> Result<(), RuntimeError> {
        self.run_until(shutdown::wait_for_shutdown_signal()).await
    }

    /// Binds `cfg.listen` and runs until `stop` completes.
    ///
    /// An `Err` from `stop` is reported as [`RuntimeError::Signal`] after shutdown.
    pub async fn run_until<F>(&self, stop: F) -> Result<(), RuntimeError>
    where
        F: Future<Output = io::Result<()>>,
    {
        let addr = self.cfg.listen;
        let listener = TcpListener::bind(addr)
            .await
            .map_err(|source| RuntimeError::Bind { addr, source })?;
        self.serve_until(listener, stop).await
    }

    /// Runs on an already bound listener until `stop` completes.
    pub async fn serve_until<F>(&self, listener: TcpListener, stop: F) -> Result<(), RuntimeError>
    where
        F: Future<Output = io::Result<()>>,
    {
        let token = CancellationToken::new();
        let alive = AliveSet::new();
        let mut set = LoopSet::new();

        let (tx, rx) = events::queue::channel(self.cfg.queue_capacity_clamped());
        let filter = TaskFilter {
            desired_state: self.cfg.task_desired_state.clone(),
        };
        self.spawn_reconciler(&mut set, &alive, &token, NodeWatch, tx.clone());
        self.spawn_reconciler(&mut set, &alive, &token, ServiceWatch, tx.clone());
        self.spawn_reconciler(&mut set, &alive, &token, TaskWatch::new(filter), tx);

        for (name, fut) in self.broadcaster.run(rx, &token) {
            spawn_loop(&mut set, &alive, name, async move {
                fut.await;
                Ok(())
            });
        }

        let state = AppState {
            broadcaster: Arc::clone(&self.broadcaster),
            source: Arc::clone(&self.source),
        };
        let router = server::router(state, &self.cfg.static_dir);
        spawn_loop(
            &mut set,
            &alive,
            "http",
            server::serve(listener, router, token.child_token()),
        );

        info!(
            listen = %self.cfg.listen,
            endpoint = self.cfg.endpoint.as_deref().unwrap_or("local defaults"),
            "swarmwatch running"
        );
        self.drive_shutdown(&mut set, &alive, &token, stop).await
    }

    fn spawn_reconciler<W: Watch>(
        &self,
        set: &mut LoopSet,
        alive: &AliveSet,
        token: &CancellationToken,
        watch: W,
        queue: EventSender,
    ) {
        let kind: EntityKind = watch.kind();
        let rec = Reconciler::new(
            watch,
            Arc::clone(&self.source),
            queue,
            self.cfg.poll_interval(kind),
        );
        let name = rec.name();
        let child = token.child_token();
        spawn_loop(set, alive, name, async move {
            rec.run(child).await;
            Ok(())
        });
    }

    /// Waits for `stop` or a failing loop, then cancels everything.
    async fn drive_shutdown<F>(
        &self,
        set: &mut LoopSet,
        alive: &AliveSet,
        token: &CancellationToken,
        stop: F,
    ) -> Result<(), RuntimeError>
    where
        F: Future<Output = io::Result<()>>,
    {
        tokio::pin!(stop);

        let outcome = loop {
            select! {
                res = &mut stop => break res.map_err(RuntimeError::Signal),
                joined = set.join_next() => match joined {
                    None => break Ok(()),
                    Some(Ok(Ok(()))) => {}
                    Some(Ok(Err(e))) => {
                        error!(label = e.as_label(), error = %e, "loop failed");
                        break Err(e);
                    }
                    Some(Err(e)) => {
                        error!(error = %e, "loop aborted");
                        break Err(RuntimeError::LoopPanicked {
                            name: "unknown".to_string(),
                            info: e.to_string(),
                        });
                    }
                },
            }
        };

        info!("shutting down");
        token.cancel();
        let waited = self.wait_all_with_grace(set, alive).await;
        outcome.and(waited)
    }

    /// Closes subscribers and joins every loop within `cfg.grace`.
    async fn wait_all_with_grace(
        &self,
        set: &mut LoopSet,
        alive: &AliveSet,
    ) -> Result<(), RuntimeError> {
        let grace = self.cfg.grace;
        let done = async {
            self.broadcaster.shutdown().await;
            while let Some(joined) = set.join_next().await {
                match joined {
                    Ok(Ok(())) => {}
                    Ok(Err(e)) => warn!(label = e.as_label(), error = %e, "loop failed during shutdown"),
                    Err(e) => warn!(error = %e, "loop panicked during shutdown"),
                }
            }
        };

        let joined = time::timeout(grace, done).await;
        match joined {
            Ok(()) => {
                info!("all loops stopped within grace");
                Ok(())
            }
            Err(_) => {
                let stuck = alive.snapshot();
                set.abort_all();
                warn!(grace_ms = grace.as_millis() as u64, ?stuck, "grace exceeded");
                Err(RuntimeError::GraceExceeded { grace, stuck })
            }
        }
    }
}

fn spawn_loop<F>(set: &mut LoopSet, alive: &AliveSet, name: impl Into<String>, fut: F)
where
    F: Future<Output = Result<(), RuntimeError>> + Send + 'static,
{
    let name = name.into();
    let guard = alive.track(name.clone());
    set.spawn(async move {
        let _guard = guard;
        match AssertUnwindSafe(fut).catch_unwind().await {
            Ok(res) => res,
            Err(panic_err) => {
                let any = &*panic_err;
                let info = if let Some(msg) = any.downcast_ref::<&'static str>() {
                    (*msg).to_string()
                } else if let Some(msg) = any.downcast_ref::<String>() {
                    msg.clone()
                } else {
                    "unknown panic".to_string()
                };
                Err(RuntimeError::LoopPanicked { name, info })
            }
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::RuntimeBuilder;
    use crate::error::SourceError;
    use crate::source::fake::FakeSource;
    use crate::source::raw::{RawContainer, RawNetwork, RawNode, RawService, RawTask};
    use async_trait::async_trait;
    use std::time::Duration;
    use tokio::sync::oneshot;

    fn test_config() -> Config {
        Config {
            listen: "127.0.0.1:0".parse().unwrap(),
            static_dir: std::env::temp_dir().join("swarmwatch-runtime-static"),
            grace: Duration::from_secs(2),
            ..Config::default()
        }
    }

    fn stop_on(rx: oneshot::Receiver<()>) -> impl Future<Output = io::Result<()>> {
        async move {
            let _ = rx.await;
            Ok(())
        }
    }

    #[tokio::test]
    async fn serves_listings_and_stops_cleanly() {
        let source = Arc::new(FakeSource::default());
        *source.nodes.lock().unwrap() = vec![RawNode {
            id: "n1".into(),
            ..RawNode::default()
        }];
        let runtime = RuntimeBuilder::new(test_config())
            .with_source(source.clone())
            .build()
            .unwrap();

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let (stop_tx, stop_rx) = oneshot::channel();

        let serve = runtime.serve_until(listener, stop_on(stop_rx));
        let client = async {
            let body: serde_json::Value = reqwest::get(format!("http://{addr}/nodes"))
                .await
                .unwrap()
                .json()
                .await
                .unwrap();
            assert_eq!(body[0]["ID"], "n1");
            stop_tx.send(()).unwrap();
        };

        let (result, ()) = tokio::join!(serve, client);
        result.unwrap();
    }

    #[tokio::test]
    async fn occupied_address_is_a_bind_error() {
        let taken = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let cfg = Config {
            listen: taken.local_addr().unwrap(),
            ..test_config()
        };
        let runtime = RuntimeBuilder::new(cfg)
            .with_source(Arc::new(FakeSource::default()))
            .build()
            .unwrap();

        let err = runtime
            .run_until(std::future::pending::<io::Result<()>>())
            .await
            .unwrap_err();
        assert_eq!(err.as_label(), "runtime_bind");
        assert!(err.is_startup());
    }

    /// Source whose calls never complete.
    struct HungSource;

    #[async_trait]
    impl ClusterSource for HungSource {
        async fn list_nodes(&self) -> Result<Vec<RawNode>, SourceError> {
            std::future::pending().await
        }
        async fn list_services(&self) -> Result<Vec<RawService>, SourceError> {
            std::future::pending().await
        }
        async fn list_tasks(&self, _filter: &TaskFilter) -> Result<Vec<RawTask>, SourceError> {
            std::future::pending().await
        }
        async fn list_containers(&self) -> Result<Vec<RawContainer>, SourceError> {
            std::future::pending().await
        }
        async fn list_networks(&self) -> Result<Vec<RawNetwork>, SourceError> {
            std::future::pending().await
        }
    }

    #[tokio::test]
    async fn hung_polls_exceed_the_grace_period() {
        let cfg = Config {
            grace: Duration::from_millis(100),
            ..test_config()
        };
        let runtime = RuntimeBuilder::new(cfg)
            .with_source(Arc::new(HungSource))
            .build()
            .unwrap();
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();

        let stop = async {
            time::sleep(Duration::from_millis(50)).await;
            Ok(())
        };
        let err = runtime.serve_until(listener, stop).await.unwrap_err();
        match err {
            RuntimeError::GraceExceeded { stuck, .. } => {
                assert_eq!(
                    stuck,
                    vec!["reconciler:node", "reconciler:service", "reconciler:task"]
                );
            }
            other => panic!("unexpected error {other:?}"),
        }
    }

    /// Source whose node listing panics; everything else is empty.
    struct PanickingSource;

    #[async_trait]
    impl ClusterSource for PanickingSource {
        async fn list_nodes(&self) -> Result<Vec<RawNode>, SourceError> {
            panic!("node listing blew up");
        }
        async fn list_services(&self) -> Result<Vec<RawService>, SourceError> {
            Ok(Vec::new())
        }
        async fn list_tasks(&self, _filter: &TaskFilter) -> Result<Vec<RawTask>, SourceError> {
            Ok(Vec::new())
        }
        async fn list_containers(&self) -> Result<Vec<RawContainer>, SourceError> {
            Ok(Vec::new())
        }
        async fn list_networks(&self) -> Result<Vec<RawNetwork>, SourceError> {
            Ok(Vec::new())
        }
    }

    #[tokio::test]
    async fn panicking_loop_shuts_the_runtime_down() {
        let runtime = RuntimeBuilder::new(test_config())
            .with_source(Arc::new(PanickingSource))
            .build()
            .unwrap();
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();

        let err = runtime
            .serve_until(listener, std::future::pending::<io::Result<()>>())
            .await
            .unwrap_err();
        match err {
            RuntimeError::LoopPanicked { name, info } => {
                assert_eq!(name, "reconciler:node");
                assert_eq!(info, "node listing blew up");
            }
            other => panic!("unexpected error {other:?}"),
        }
        assert_eq!(runtime.broadcaster().subscriber_count().await, 0);
    }

    #[tokio::test]
    async fn failing_signal_registration_still_shuts_down() {
        let runtime = RuntimeBuilder::new(test_config())
            .with_source(Arc::new(FakeSource::default()))
            .build()
            .unwrap();
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();

        let stop = async { Err(io::Error::other("no signals")) };
        let err = runtime.serve_until(listener, stop).await.unwrap_err();
        assert_eq!(err.as_label(), "runtime_signal");
    }
}
