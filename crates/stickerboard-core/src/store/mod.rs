//! Remote key-value store abstraction.
//!
//! A store keeps one opaque value per path. Clients push new values and
//! subscribe to value changes of a path. Notifications are queued by the
//! store and drained with [`RemoteStore::poll_changes`], so whoever owns
//! the widget set decides when they are applied.

mod memory;
pub mod protocol;
mod websocket;

pub use memory::MemoryStore;
pub use websocket::{ConnectionState, WebSocketStore};

use thiserror::Error;

/// Store errors.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Not connected to the store")]
    NotConnected,
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),
    #[error("Send failed: {0}")]
    Send(String),
    #[error("Encoding error: {0}")]
    Encoding(String),
}

/// Result type for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// A value observed on a subscribed path.
///
/// An empty `bytes` means nothing has been stored at the path yet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValueChange {
    pub path: String,
    pub bytes: Vec<u8>,
}

/// A client of a push/subscribe key-value store.
///
/// Semantics shared by every implementation:
/// - `subscribe_value_changes` replaces this client's subscription. The
///   current value of the path is delivered once (empty when unset),
///   followed by every later push to that path.
/// - Pushes are delivered to all subscribers, the pushing client included.
/// - Last writer wins; there are no version tokens.
pub trait RemoteStore {
    /// Store `bytes` under `path`.
    fn push(&mut self, path: &str, bytes: &[u8]) -> StoreResult<()>;

    /// Observe value changes of `path`.
    fn subscribe_value_changes(&mut self, path: &str) -> StoreResult<()>;

    /// Drain queued notifications without blocking.
    fn poll_changes(&mut self) -> Vec<ValueChange>;
}

impl<S: RemoteStore + ?Sized> RemoteStore for Box<S> {
    fn push(&mut self, path: &str, bytes: &[u8]) -> StoreResult<()> {
        (**self).push(path, bytes)
    }

    fn subscribe_value_changes(&mut self, path: &str) -> StoreResult<()> {
        (**self).subscribe_value_changes(path)
    }

    fn poll_changes(&mut self) -> Vec<ValueChange> {
        (**self).poll_changes()
    }
}
