//! WebSocket subscriber endpoint (`/start`).

use std::net::SocketAddr;

use async_trait::async_trait;
use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::{ConnectInfo, State};
use axum::http::header::ACCESS_CONTROL_ALLOW_ORIGIN;
use axum::http::HeaderValue;
use axum::response::Response;
use futures::stream::{SplitSink, SplitStream};
use futures::{SinkExt, StreamExt};
use tracing::{debug, trace};

use crate::broadcast::Subscriber;
use crate::error::SendError;
use crate::events::Frame;

use super::AppState;

/// Write half of a dashboard WebSocket.
pub struct WsSubscriber {
    sink: SplitSink<WebSocket, Message>,
    peer: SocketAddr,
}

impl WsSubscriber {
    pub fn new(sink: SplitSink<WebSocket, Message>, peer: SocketAddr) -> Self {
        Self { sink, peer }
    }
}

#[async_trait]
impl Subscriber for WsSubscriber {
    async fn send(&mut self, frame: &Frame) -> Result<(), SendError> {
        self.sink
            .send(Message::Text(frame.as_str().to_owned().into()))
            .await
            .map_err(|e| SendError::new(self.peer.to_string(), e))
    }

    async fn close(&mut self) {
        if let Err(e) = self.sink.close().await {
            trace!(peer = %self.peer, error = %e, "close on dead socket");
        }
    }

    fn peer(&self) -> String {
        self.peer.to_string()
    }
}

/// Upgrades the request and registers the connection with the broadcaster.
pub async fn start(
    State(state): State<AppState>,
    ConnectInfo(peer): ConnectInfo<SocketAddr>,
    ws: WebSocketUpgrade,
) -> Response {
    let mut resp = ws.on_upgrade(move |socket| async move {
        let (sink, stream) = socket.split();
        let registered = state
            .broadcaster
            .register(Box::new(WsSubscriber::new(sink, peer)))
            .await;
        if registered.is_some() {
            tokio::spawn(drain_incoming(stream, peer));
        }
    });
    resp.headers_mut()
        .insert(ACCESS_CONTROL_ALLOW_ORIGIN, HeaderValue::from_static("*"));
    resp
}

/// Reads and discards client messages so control frames are processed.
///
/// A closed or failed read is not an eviction; the next write to the peer is.
async fn drain_incoming(mut stream: SplitStream<WebSocket>, peer: SocketAddr) {
    while let Some(msg) = stream.next().await {
        match msg {
            Ok(Message::Close(_)) => break,
            Ok(_) => {}
            Err(e) => {
                debug!(%peer, error = %e, "websocket read failed");
                break;
            }
        }
    }
    debug!(%peer, "websocket reader finished");
}
