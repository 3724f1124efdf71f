//! Stickerboard WebSocket Store Server
//!
//! A path-keyed value store. Each path holds the last pushed value; every
//! push is broadcast to all connections subscribed to that path, the
//! pushing connection included.
//!
//! ## Protocol
//!
//! Messages are JSON with the following format:
//! ```json
//! { "type": "subscribe", "path": "canvas" }
//! { "type": "push", "path": "canvas", "data": "<base64-encoded-value>" }
//! { "type": "unsubscribe" }
//! ```
//! The server answers with `{ "type": "value", "path": ..., "data": ... }`
//! (`data` absent while the path is empty) or `{ "type": "error", "message": ... }`.

use axum::{
    Router,
    extract::{
        State,
        ws::{Message, WebSocket, WebSocketUpgrade},
    },
    response::IntoResponse,
    routing::get,
};
use dashmap::DashMap;
use futures_util::{SinkExt, StreamExt};
use std::{net::SocketAddr, sync::Arc};
use stickerboard_core::store::protocol::{ClientMessage, ServerMessage, encode_payload};
use tokio::sync::broadcast;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{debug, error, info, warn};
use uuid::Uuid;

const CHANNEL_CAPACITY: usize = 256;
const DEFAULT_ADDR: &str = "0.0.0.0:3030";
const ADDR_ENV: &str = "STICKERBOARD_ADDR";

/// One stored path.
struct Slot {
    /// Broadcast channel for value changes of this path
    tx: broadcast::Sender<ServerMessage>,
    /// Last pushed value (base64)
    value: Option<String>,
}

impl Slot {
    fn new() -> Self {
        let (tx, _) = broadcast::channel(CHANNEL_CAPACITY);
        Self { tx, value: None }
    }
}

/// Shared application state
struct AppState {
    /// Stored paths
    slots: DashMap<String, Slot>,
}

impl AppState {
    fn new() -> Self {
        Self {
            slots: DashMap::new(),
        }
    }

    /// Subscribe to a path, returning the receiver and the current value.
    fn subscribe(&self, path: &str) -> (broadcast::Receiver<ServerMessage>, ServerMessage) {
        let slot = self.slots.entry(path.to_string()).or_insert_with(Slot::new);
        let rx = slot.tx.subscribe();
        let current = ServerMessage::Value {
            path: path.to_string(),
            data: slot.value.clone(),
        };
        (rx, current)
    }

    /// Store a value and notify every subscriber of the path.
    fn push(&self, path: &str, data: String) {
        let mut slot = self.slots.entry(path.to_string()).or_insert_with(Slot::new);
        slot.value = Some(data.clone());
        let receivers = slot.tx.send(ServerMessage::Value {
            path: path.to_string(),
            data: Some(data),
        });
        debug!(
            "Pushed to {} ({} subscribers)",
            path,
            receivers.unwrap_or(0)
        );
    }
}

#[tokio::main]
async fn main() -> std::io::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "stickerboard_server=info,tower_http=info".into()),
        )
        .init();

    let addr: SocketAddr = std::env::var(ADDR_ENV)
        .unwrap_or_else(|_| DEFAULT_ADDR.to_string())
        .parse()
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidInput, e))?;

    let state = Arc::new(AppState::new());

    let app = Router::new()
        .route("/", get(index))
        .route("/ws", get(ws_handler))
        .route("/health", get(health))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    info!("Stickerboard store server listening on {}", addr);
    info!("WebSocket endpoint: ws://{}/ws", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await
}

/// Index page
async fn index() -> &'static str {
    "Stickerboard Store Server - Connect via WebSocket at /ws"
}

/// Health check
async fn health() -> &'static str {
    "ok"
}

/// WebSocket upgrade handler
async fn ws_handler(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

fn to_frame(msg: &ServerMessage) -> Option<Message> {
    match serde_json::to_string(msg) {
        Ok(json) => Some(Message::Text(json.into())),
        Err(e) => {
            error!("Failed to serialize server message: {}", e);
            None
        }
    }
}

/// Handle a WebSocket connection
async fn handle_socket(socket: WebSocket, state: Arc<AppState>) {
    let conn_id = Uuid::new_v4().to_string();
    info!("New connection: {}", conn_id);

    let (mut sender, mut receiver) = socket.split();
    let mut current_path: Option<String> = None;
    let mut path_rx: Option<broadcast::Receiver<ServerMessage>> = None;

    loop {
        // Replies to the client's own request, sent after the select.
        let mut reply: Option<ServerMessage> = None;

        tokio::select! {
            // Handle incoming messages from client
            msg = receiver.next() => {
                match msg {
                    Some(Ok(Message::Text(text))) => {
                        match serde_json::from_str::<ClientMessage>(&text) {
                            Ok(ClientMessage::Subscribe { path }) => {
                                let (rx, current) = state.subscribe(&path);
                                path_rx = Some(rx);
                                info!("Connection {} subscribed to {}", conn_id, path);
                                current_path = Some(path);
                                reply = Some(current);
                            }
                            Ok(ClientMessage::Unsubscribe) => {
                                if let Some(path) = current_path.take() {
                                    info!("Connection {} unsubscribed from {}", conn_id, path);
                                }
                                path_rx = None;
                            }
                            Ok(ClientMessage::Push { path, data }) => {
                                state.push(&path, data);
                            }
                            Err(e) => {
                                warn!("Invalid message from {}: {}", conn_id, e);
                                reply = Some(ServerMessage::Error {
                                    message: format!("Invalid message: {}", e),
                                });
                            }
                        }
                    }
                    Some(Ok(Message::Binary(data))) => {
                        // Binary frames are raw values for the subscribed path
                        match current_path {
                            Some(ref path) => state.push(path, encode_payload(&data)),
                            None => {
                                reply = Some(ServerMessage::Error {
                                    message: "Binary push requires a subscription".to_string(),
                                });
                            }
                        }
                    }
                    Some(Ok(Message::Close(_))) | None => {
                        break;
                    }
                    Some(Ok(_)) => {} // Ignore ping/pong
                    Some(Err(e)) => {
                        warn!("WebSocket error for {}: {}", conn_id, e);
                        break;
                    }
                }
            }

            // Handle value changes of the subscribed path
            msg = async {
                match &mut path_rx {
                    Some(rx) => rx.recv().await,
                    None => std::future::pending().await,
                }
            } => {
                match msg {
                    Ok(change) => reply = Some(change),
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        warn!("Connection {} lagged, skipped {} values", conn_id, skipped);
                    }
                    Err(broadcast::error::RecvError::Closed) => {
                        path_rx = None;
                    }
                }
            }
        }

        if let Some(frame) = reply.as_ref().and_then(to_frame) {
            if sender.send(frame).await.is_err() {
                break;
            }
        }
    }

    info!("Connection closed: {}", conn_id);
}
