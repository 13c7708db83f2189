//! # HTTP surface.
//!
//! ```text
//! GET /start           ──► WebSocket upgrade ─► Broadcaster::register
//! GET /nodes           ──┐
//! GET /services          ├► Broadcaster::snapshot ─► JSON
//! GET /tasks             │
//! GET /containers      ──┘
//! GET /servicereport   ──► report::build_service_report ─► JSON
//! GET /networkreport   ──► report::build_network_report ─► JSON
//! GET /*               ──► static files
//! ```
//!
//! Every JSON response carries `Access-Control-Allow-Origin: *`. A failing cluster
//! API answers 502 with `{"error": "..."}`.

mod ws;

use std::net::SocketAddr;
use std::path::Path;
use std::sync::Arc;

use axum::extract::State;
use axum::http::header::{ACCESS_CONTROL_ALLOW_ORIGIN, CONTENT_TYPE};
use axum::http::{HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::Router;
use serde::Serialize;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

use crate::broadcast::{Broadcaster, ListingKind};
use crate::error::{RuntimeError, SnapshotError};
use crate::report;
use crate::source::ClusterSource;

pub use ws::WsSubscriber;

/// Shared handler state.
#[derive(Clone)]
pub struct AppState {
    pub broadcaster: Arc<Broadcaster>,
    pub source: Arc<dyn ClusterSource>,
}

/// Builds the router with all routes.
pub fn router(state: AppState, static_dir: &Path) -> Router {
    Router::new()
        .route("/start", get(ws::start))
        .route("/nodes", get(nodes))
        .route("/services", get(services))
        .route("/tasks", get(tasks))
        .route("/containers", get(containers))
        .route("/servicereport", get(service_report))
        .route("/networkreport", get(network_report))
        .fallback_service(ServeDir::new(static_dir))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Serves `router` on `listener` until `token` is cancelled.
pub async fn serve(
    listener: TcpListener,
    router: Router,
    token: CancellationToken,
) -> Result<(), RuntimeError> {
    if let Ok(addr) = listener.local_addr() {
        info!(%addr, "http server listening");
    }
    axum::serve(
        listener,
        router.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(async move { token.cancelled().await })
    .await
    .map_err(RuntimeError::Serve)
}

impl IntoResponse for SnapshotError {
    fn into_response(self) -> Response {
        let status = match &self {
            SnapshotError::Source(_) => StatusCode::BAD_GATEWAY,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        warn!(label = self.as_label(), error = %self, "listing request failed");

        let body = serde_json::json!({ "error": self.to_string() }).to_string();
        json_response(status, body.into_bytes())
    }
}

fn json_response(status: StatusCode, body: Vec<u8>) -> Response {
    let mut resp = (status, body).into_response();
    let headers = resp.headers_mut();
    headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
    headers.insert(ACCESS_CONTROL_ALLOW_ORIGIN, HeaderValue::from_static("*"));
    resp
}

fn json_ok<T: Serialize>(value: &T) -> Result<Response, SnapshotError> {
    Ok(json_response(StatusCode::OK, serde_json::to_vec(value)?))
}

async fn listing(state: &AppState, kind: ListingKind) -> Result<Response, SnapshotError> {
    let body = state.broadcaster.snapshot(kind).await?;
    Ok(json_response(StatusCode::OK, body))
}

async fn nodes(State(state): State<AppState>) -> Result<Response, SnapshotError> {
    listing(&state, ListingKind::Nodes).await
}

async fn services(State(state): State<AppState>) -> Result<Response, SnapshotError> {
    listing(&state, ListingKind::Services).await
}

async fn tasks(State(state): State<AppState>) -> Result<Response, SnapshotError> {
    listing(&state, ListingKind::Tasks).await
}

async fn containers(State(state): State<AppState>) -> Result<Response, SnapshotError> {
    listing(&state, ListingKind::Containers).await
}

async fn service_report(State(state): State<AppState>) -> Result<Response, SnapshotError> {
    json_ok(&report::build_service_report(state.source.as_ref()).await?)
}

async fn network_report(State(state): State<AppState>) -> Result<Response, SnapshotError> {
    json_ok(&report::build_network_report(state.source.as_ref()).await?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::Frame;
    use crate::source::fake::FakeSource;
    use crate::source::raw::{RawContainer, RawNetwork};
    use futures::StreamExt;
    use std::time::Duration;

    struct TestServer {
        base: String,
        source: Arc<FakeSource>,
        broadcaster: Arc<Broadcaster>,
        token: CancellationToken,
    }

    impl Drop for TestServer {
        fn drop(&mut self) {
            self.token.cancel();
        }
    }

    async fn spawn_server() -> TestServer {
        let source = Arc::new(FakeSource::default());
        let broadcaster = Broadcaster::new(
            source.clone(),
            Duration::from_millis(50),
            Duration::from_secs(5),
        );
        let state = AppState {
            broadcaster: Arc::clone(&broadcaster),
            source: source.clone(),
        };
        let static_dir = std::env::temp_dir().join("swarmwatch-test-static-missing");
        let app = router(state, &static_dir);

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let token = CancellationToken::new();
        tokio::spawn(serve(listener, app, token.clone()));

        TestServer {
            base: format!("http://{addr}"),
            source,
            broadcaster,
            token,
        }
    }

    /// Polls until the broadcaster holds `n` subscribers.
    async fn wait_for_subscribers(broadcaster: &Broadcaster, n: usize) {
        tokio::time::timeout(Duration::from_secs(5), async {
            while broadcaster.subscriber_count().await != n {
                tokio::time::sleep(Duration::from_millis(10)).await;
            }
        })
        .await
        .unwrap();
    }

    #[tokio::test]
    async fn listings_are_json_with_cors() {
        let server = spawn_server().await;
        *server.source.containers.lock().unwrap() = vec![RawContainer {
            id: "c1".into(),
            image: "nginx".into(),
            ..RawContainer::default()
        }];

        let resp = reqwest::get(format!("{}/containers", server.base)).await.unwrap();
        assert_eq!(resp.status(), 200);
        assert_eq!(resp.headers()["content-type"], "application/json");
        assert_eq!(resp.headers()["access-control-allow-origin"], "*");
        let body: serde_json::Value = resp.json().await.unwrap();
        assert_eq!(body[0]["Id"], "c1");
        assert_eq!(body[0]["Image"], "nginx");
    }

    #[tokio::test]
    async fn source_failure_is_bad_gateway() {
        let server = spawn_server().await;
        server.source.set_down(true);

        let resp = reqwest::get(format!("{}/nodes", server.base)).await.unwrap();
        assert_eq!(resp.status(), 502);
        assert_eq!(resp.headers()["access-control-allow-origin"], "*");
        let body: serde_json::Value = resp.json().await.unwrap();
        assert!(body["error"].as_str().unwrap().contains("list_nodes"));
    }

    #[tokio::test]
    async fn network_report_lists_every_network() {
        let server = spawn_server().await;
        *server.source.networks.lock().unwrap() = vec![RawNetwork {
            id: "n1".into(),
            name: "ingress".into(),
            ..RawNetwork::default()
        }];

        let resp = reqwest::get(format!("{}/networkreport", server.base))
            .await
            .unwrap();
        assert_eq!(resp.status(), 200);
        let body: serde_json::Value = resp.json().await.unwrap();
        assert_eq!(
            body,
            serde_json::json!([{"id":"n1","name":"ingress","services":[]}])
        );
    }

    #[tokio::test]
    async fn start_rejects_plain_requests() {
        let server = spawn_server().await;
        let client = reqwest::Client::new();

        let resp = client
            .post(format!("{}/start", server.base))
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), 405);

        let resp = client
            .get(format!("{}/start", server.base))
            .send()
            .await
            .unwrap();
        assert!(resp.status().is_client_error());
    }

    #[tokio::test]
    async fn start_streams_fanned_out_frames_to_the_socket() {
        let server = spawn_server().await;
        let url = format!("{}/start", server.base.replacen("http://", "ws://", 1));

        let (mut ws, resp) = tokio_tungstenite::connect_async(url).await.unwrap();
        assert_eq!(resp.headers()["access-control-allow-origin"], "*");
        wait_for_subscribers(&server.broadcaster, 1).await;

        let text = r#"{"action":"start","type":"node","id":"n1"}"#;
        assert_eq!(server.broadcaster.fan_out(&Frame::from(text)).await, 0);
        let msg = ws.next().await.unwrap().unwrap();
        assert!(msg.is_text());
        assert_eq!(msg.to_text().unwrap(), text);

        // A write to a dropped peer may still be buffered once; the next one fails.
        drop(ws);
        tokio::time::timeout(Duration::from_secs(5), async {
            while server.broadcaster.subscriber_count().await != 0 {
                server.broadcaster.fan_out(&Frame::from("after close")).await;
                tokio::time::sleep(Duration::from_millis(10)).await;
            }
        })
        .await
        .unwrap();
    }
}
