//! Document synchronization over a remote store.
//!
//! Bridges the canvas document and a [`RemoteStore`] path: local saves are
//! encoded and pushed, remote values are decoded and handed back to the
//! owner on its own thread when it polls.

use crate::document::{CanvasDocument, DecodeError, EncodeError};
use crate::store::{RemoteStore, StoreError};
use thiserror::Error;

/// Errors from publishing or subscribing.
#[derive(Debug, Error)]
pub enum SyncError {
    #[error(transparent)]
    Encode(#[from] EncodeError),
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// What happened to a value received from the store.
#[derive(Debug, Clone, PartialEq)]
pub enum SyncEvent {
    /// A remote document decoded successfully.
    DocumentReceived(CanvasDocument),
    /// A remote payload was rejected; the previous document still stands.
    DecodeFailed(DecodeError),
}

/// Synchronizes one document path with a remote store.
pub struct DocumentSync<S> {
    store: S,
    path: String,
}

impl<S: RemoteStore> DocumentSync<S> {
    pub fn new(store: S, path: impl Into<String>) -> Self {
        Self {
            store,
            path: path.into(),
        }
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut S {
        &mut self.store
    }

    /// Encode and push `document`. Failures are logged and returned; there
    /// is no retry.
    pub fn publish(&mut self, document: &CanvasDocument) -> Result<(), SyncError> {
        let bytes = document.encode().inspect_err(|e| {
            log::error!("Failed to encode document for {}: {}", self.path, e);
        })?;
        self.store.push(&self.path, &bytes).inspect_err(|e| {
            log::error!("Failed to push document to {}: {}", self.path, e);
        })?;
        log::debug!(
            "Published {} widgets ({} bytes) to {}",
            document.len(),
            bytes.len(),
            self.path
        );
        Ok(())
    }

    /// Start observing the document path.
    pub fn subscribe(&mut self) -> Result<(), SyncError> {
        self.store.subscribe_value_changes(&self.path)?;
        log::info!("Subscribed to {}", self.path);
        Ok(())
    }

    /// Drain pending remote values.
    ///
    /// Empty payloads (nothing stored yet) produce no event. Our own
    /// publishes come back here too; applying them again is harmless.
    pub fn poll(&mut self) -> Vec<SyncEvent> {
        let mut events = Vec::new();
        for change in self.store.poll_changes() {
            if change.path != self.path {
                log::debug!("Ignoring value for unrelated path {}", change.path);
                continue;
            }
            if change.bytes.is_empty() {
                continue;
            }
            match CanvasDocument::decode(&change.bytes) {
                Ok(document) => {
                    log::debug!("Received document with {} widgets", document.len());
                    events.push(SyncEvent::DocumentReceived(document));
                }
                Err(e) => {
                    log::warn!("Ignoring undecodable document at {}: {}", self.path, e);
                    events.push(SyncEvent::DecodeFailed(e));
                }
            }
        }
        events
    }

    /// Drain pending remote values, invoking `on_document` for each one
    /// that decodes. Returns how many documents were delivered.
    pub fn poll_documents(&mut self, mut on_document: impl FnMut(CanvasDocument)) -> usize {
        let mut delivered = 0;
        for event in self.poll() {
            if let SyncEvent::DocumentReceived(document) = event {
                on_document(document);
                delivered += 1;
            }
        }
        delivered
    }
}
