//! WebSocket client for `stickerboard-server`.
//!
//! The socket lives on a background thread. Commands and events cross
//! `std::sync::mpsc` channels, and the owning thread drains events with
//! [`RemoteStore::poll_changes`] without ever blocking.

use super::protocol::{ClientMessage, ServerMessage, decode_payload};
use super::{RemoteStore, StoreError, StoreResult, ValueChange};
use std::net::TcpStream;
use std::sync::mpsc::{Receiver, Sender, TryRecvError, channel};
use std::thread::{self, JoinHandle};
use std::time::Duration;
use tungstenite::stream::MaybeTlsStream;
use tungstenite::{Message, WebSocket, connect};
use url::Url;

/// Longest frame prefix written to debug logs, in characters.
const PREVIEW_CHARS: usize = 100;

/// Connection state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Disconnected,
    Connecting,
    Connected,
    Error,
}

/// Commands sent to the WebSocket thread.
enum WsCommand {
    Send(String),
    Close,
}

/// Events sent from the WebSocket thread.
#[derive(Debug)]
enum WsEvent {
    Connected,
    Disconnected,
    Value(ValueChange),
    Error(String),
}

/// Remote store client backed by a WebSocket connection.
pub struct WebSocketStore {
    state: ConnectionState,
    /// Channel to send commands to the WebSocket thread.
    cmd_tx: Option<Sender<WsCommand>>,
    /// Channel to receive events from the WebSocket thread.
    event_rx: Option<Receiver<WsEvent>>,
    /// Handle to the WebSocket thread.
    _thread: Option<JoinHandle<()>>,
}

impl WebSocketStore {
    /// Start connecting to `url` (`ws://` or `wss://`).
    ///
    /// Returns immediately. Commands issued before the handshake finishes
    /// are queued and sent once connected.
    pub fn connect(url: &str) -> StoreResult<Self> {
        let parsed_url = Url::parse(url).map_err(|e| StoreError::InvalidUrl(e.to_string()))?;
        if parsed_url.scheme() != "ws" && parsed_url.scheme() != "wss" {
            return Err(StoreError::InvalidUrl(format!(
                "Invalid WebSocket URL scheme: {}",
                parsed_url.scheme()
            )));
        }

        let (cmd_tx, cmd_rx) = channel::<WsCommand>();
        let (event_tx, event_rx) = channel::<WsEvent>();
        let url = url.to_string();

        let handle = thread::spawn(move || run_socket(&url, cmd_rx, event_tx));

        Ok(Self {
            state: ConnectionState::Connecting,
            cmd_tx: Some(cmd_tx),
            event_rx: Some(event_rx),
            _thread: Some(handle),
        })
    }

    /// Close the connection.
    pub fn disconnect(&mut self) {
        if let Some(tx) = self.cmd_tx.take() {
            let _ = tx.send(WsCommand::Close);
        }
        self.event_rx = None;
        self._thread = None;
        self.state = ConnectionState::Disconnected;
    }

    /// Get current connection state.
    pub fn state(&self) -> ConnectionState {
        self.state
    }

    /// Check if connected.
    pub fn is_connected(&self) -> bool {
        self.state == ConnectionState::Connected
    }

    fn send(&self, msg: &ClientMessage) -> StoreResult<()> {
        let tx = self.cmd_tx.as_ref().ok_or(StoreError::NotConnected)?;
        tx.send(WsCommand::Send(msg.to_json()?))
            .map_err(|e| StoreError::Send(e.to_string()))
    }
}

impl RemoteStore for WebSocketStore {
    fn push(&mut self, path: &str, bytes: &[u8]) -> StoreResult<()> {
        self.send(&ClientMessage::push(path, bytes))
    }

    fn subscribe_value_changes(&mut self, path: &str) -> StoreResult<()> {
        self.send(&ClientMessage::Subscribe {
            path: path.to_string(),
        })
    }

    fn poll_changes(&mut self) -> Vec<ValueChange> {
        let mut changes = Vec::new();
        let Some(rx) = self.event_rx.as_ref() else {
            return changes;
        };
        while let Ok(event) = rx.try_recv() {
            match event {
                WsEvent::Connected => self.state = ConnectionState::Connected,
                WsEvent::Disconnected => self.state = ConnectionState::Disconnected,
                WsEvent::Error(message) => {
                    log::error!("Remote store error: {}", message);
                    self.state = ConnectionState::Error;
                }
                WsEvent::Value(change) => changes.push(change),
            }
        }
        changes
    }
}

impl Drop for WebSocketStore {
    fn drop(&mut self) {
        self.disconnect();
    }
}

/// Body of the WebSocket thread.
fn run_socket(url: &str, cmd_rx: Receiver<WsCommand>, event_tx: Sender<WsEvent>) {
    log::info!("WebSocket thread: connecting to {}", url);

    let mut socket = match connect(url) {
        Ok((socket, response)) => {
            log::info!("WebSocket connected, status: {}", response.status());
            socket
        }
        Err(e) => {
            log::error!("WebSocket connection failed: {}", e);
            let _ = event_tx.send(WsEvent::Error(format!("Connection failed: {}", e)));
            return;
        }
    };
    let _ = event_tx.send(WsEvent::Connected);
    set_timeouts(&mut socket);

    loop {
        match cmd_rx.try_recv() {
            Ok(WsCommand::Send(msg)) => {
                log::debug!("WebSocket sending: {}", preview(&msg));
                if let Err(e) = socket.send(Message::Text(msg)) {
                    log::error!("WebSocket send error: {}", e);
                    let _ = event_tx.send(WsEvent::Error(format!("Send failed: {}", e)));
                    break;
                }
            }
            Ok(WsCommand::Close) => {
                log::info!("WebSocket close requested");
                let _ = socket.close(None);
                break;
            }
            Err(TryRecvError::Disconnected) => {
                log::info!("WebSocket command channel disconnected");
                break;
            }
            Err(TryRecvError::Empty) => {}
        }

        match socket.read() {
            Ok(Message::Text(txt)) => {
                log::debug!("WebSocket received: {}", preview(&txt));
                if let Some(event) = server_event(&txt) {
                    let _ = event_tx.send(event);
                }
            }
            Ok(Message::Ping(data)) => {
                let _ = socket.send(Message::Pong(data));
            }
            Ok(Message::Close(_)) => {
                log::info!("WebSocket received close frame");
                break;
            }
            Ok(_) => {}
            Err(tungstenite::Error::Io(ref e))
                if e.kind() == std::io::ErrorKind::WouldBlock
                    || e.kind() == std::io::ErrorKind::TimedOut =>
            {
                continue;
            }
            Err(e) => {
                log::error!("WebSocket read error: {}", e);
                let _ = event_tx.send(WsEvent::Error(format!("Read failed: {}", e)));
                break;
            }
        }
    }

    log::info!("WebSocket thread exiting");
    let _ = event_tx.send(WsEvent::Disconnected);
}

/// At most the first [`PREVIEW_CHARS`] characters of a frame, cut on a
/// char boundary.
fn preview(frame: &str) -> &str {
    frame
        .char_indices()
        .nth(PREVIEW_CHARS)
        .map_or(frame, |(end, _)| &frame[..end])
}

/// A short read timeout keeps the loop responsive to outgoing commands.
fn set_timeouts(socket: &mut WebSocket<MaybeTlsStream<TcpStream>>) {
    match socket.get_mut() {
        MaybeTlsStream::Plain(tcp) => {
            let _ = tcp.set_read_timeout(Some(Duration::from_millis(50)));
            let _ = tcp.set_write_timeout(Some(Duration::from_secs(5)));
        }
        #[allow(unreachable_patterns)]
        _ => {
            log::debug!("TLS or other stream - using default timeout handling");
        }
    }
}

/// Translate a server text frame into an event for the owning thread.
fn server_event(txt: &str) -> Option<WsEvent> {
    match serde_json::from_str::<ServerMessage>(txt) {
        Ok(ServerMessage::Value { path, data }) => {
            let bytes = match data {
                None => Vec::new(),
                Some(data) => match decode_payload(&data) {
                    Ok(bytes) => bytes,
                    Err(e) => {
                        log::warn!("Dropping value for {}: {}", path, e);
                        return None;
                    }
                },
            };
            Some(WsEvent::Value(ValueChange { path, bytes }))
        }
        Ok(ServerMessage::Error { message }) => Some(WsEvent::Error(message)),
        Err(e) => {
            log::warn!("Failed to parse server message: {} ({})", txt, e);
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::protocol::encode_payload;

    #[test]
    fn test_rejects_bad_urls() {
        assert!(matches!(
            WebSocketStore::connect("not a url"),
            Err(StoreError::InvalidUrl(_))
        ));
        assert!(matches!(
            WebSocketStore::connect("http://localhost:3030/ws"),
            Err(StoreError::InvalidUrl(_))
        ));
    }

    #[test]
    fn test_value_message_becomes_change() {
        let txt = format!(
            r#"{{"type":"value","path":"canvas","data":"{}"}}"#,
            encode_payload(b"abc")
        );
        match server_event(&txt) {
            Some(WsEvent::Value(change)) => {
                assert_eq!(change.path, "canvas");
                assert_eq!(change.bytes, b"abc");
            }
            other => panic!("unexpected event {:?}", other),
        }
    }

    #[test]
    fn test_value_without_data_is_empty() {
        match server_event(r#"{"type":"value","path":"canvas"}"#) {
            Some(WsEvent::Value(change)) => assert!(change.bytes.is_empty()),
            other => panic!("unexpected event {:?}", other),
        }
    }

    #[test]
    fn test_garbage_is_dropped() {
        assert!(server_event("{").is_none());
        assert!(server_event(r#"{"type":"value","path":"p","data":"***"}"#).is_none());
    }

    #[test]
    fn test_preview_cuts_on_char_boundary() {
        // The push frame for this path has an 'é' across bytes 99..101.
        let path = format!("aa{}", "é".repeat(40));
        let push = ClientMessage::push(&path, b"{}").to_json().unwrap();
        assert!(!push.is_char_boundary(100));
        assert_eq!(preview(&push), push);

        let long = ClientMessage::push(&path.repeat(4), b"{}").to_json().unwrap();
        let short = preview(&long);
        assert!(long.starts_with(short));
        assert_eq!(short.chars().count(), PREVIEW_CHARS);
        assert_eq!(preview("short"), "short");
    }

    #[test]
    fn test_disconnected_store_reports_not_connected() {
        let mut store = WebSocketStore {
            state: ConnectionState::Disconnected,
            cmd_tx: None,
            event_rx: None,
            _thread: None,
        };
        assert!(matches!(
            store.push("canvas", b"x"),
            Err(StoreError::NotConnected)
        ));
        assert!(store.poll_changes().is_empty());
        assert!(!store.is_connected());
    }
}
