//! JSON messages exchanged with `stickerboard-server`.
//!
//! Values are opaque bytes, carried as standard base64 strings.

use super::{StoreError, StoreResult};
use base64::{Engine, engine::general_purpose::STANDARD};
use serde::{Deserialize, Serialize};

/// Messages sent to the server
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientMessage {
    /// Store a value under a path
    Push { path: String, data: String },
    /// Observe a path; replaces any previous subscription
    Subscribe { path: String },
    /// Stop observing
    Unsubscribe,
}

/// Messages received from the server
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerMessage {
    /// Current value of a subscribed path. `data` is absent when nothing
    /// has been stored yet.
    Value {
        path: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        data: Option<String>,
    },
    /// Error message
    Error { message: String },
}

pub fn encode_payload(bytes: &[u8]) -> String {
    STANDARD.encode(bytes)
}

pub fn decode_payload(data: &str) -> StoreResult<Vec<u8>> {
    STANDARD
        .decode(data)
        .map_err(|e| StoreError::Encoding(format!("Invalid base64 payload: {}", e)))
}

impl ClientMessage {
    pub fn push(path: &str, bytes: &[u8]) -> Self {
        ClientMessage::Push {
            path: path.to_string(),
            data: encode_payload(bytes),
        }
    }

    pub fn to_json(&self) -> StoreResult<String> {
        serde_json::to_string(self).map_err(|e| StoreError::Encoding(e.to_string()))
    }
}
