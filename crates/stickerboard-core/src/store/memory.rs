//! In-process store implementation.

use super::{RemoteStore, StoreError, StoreResult, ValueChange};
use std::collections::HashMap;
use std::sync::mpsc::{Receiver, Sender, channel};
use std::sync::{Arc, RwLock};

#[derive(Default)]
struct Backend {
    values: HashMap<String, Vec<u8>>,
    subscribers: HashMap<u64, Subscriber>,
    next_client: u64,
}

struct Subscriber {
    path: String,
    tx: Sender<ValueChange>,
}

/// In-memory store for tests and single-process use.
///
/// Every client created from the same backend with [`MemoryStore::connect`]
/// sees the same values, like separate viewers of one remote store.
pub struct MemoryStore {
    backend: Arc<RwLock<Backend>>,
    client: u64,
    tx: Sender<ValueChange>,
    rx: Receiver<ValueChange>,
}

impl MemoryStore {
    /// Create a fresh backend and a first client of it.
    pub fn new() -> Self {
        Self::attach(Arc::new(RwLock::new(Backend::default())))
    }

    /// Create another client sharing this client's backend.
    pub fn connect(&self) -> Self {
        Self::attach(self.backend.clone())
    }

    fn attach(backend: Arc<RwLock<Backend>>) -> Self {
        let client = {
            let mut b = backend.write().unwrap_or_else(|e| e.into_inner());
            b.next_client += 1;
            b.next_client
        };
        let (tx, rx) = channel();
        Self {
            backend,
            client,
            tx,
            rx,
        }
    }

    /// The stored value of `path`, if any.
    pub fn value(&self, path: &str) -> StoreResult<Option<Vec<u8>>> {
        let backend = self
            .backend
            .read()
            .map_err(|e| StoreError::Send(format!("Lock error: {}", e)))?;
        Ok(backend.values.get(path).cloned())
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl RemoteStore for MemoryStore {
    fn push(&mut self, path: &str, bytes: &[u8]) -> StoreResult<()> {
        let mut backend = self
            .backend
            .write()
            .map_err(|e| StoreError::Send(format!("Lock error: {}", e)))?;
        backend.values.insert(path.to_string(), bytes.to_vec());

        // Subscribers whose client is gone are dropped on the way.
        backend.subscribers.retain(|_, sub| {
            sub.path != path
                || sub
                    .tx
                    .send(ValueChange {
                        path: path.to_string(),
                        bytes: bytes.to_vec(),
                    })
                    .is_ok()
        });
        log::debug!("Memory store: pushed {} bytes to {}", bytes.len(), path);
        Ok(())
    }

    fn subscribe_value_changes(&mut self, path: &str) -> StoreResult<()> {
        let mut backend = self
            .backend
            .write()
            .map_err(|e| StoreError::Send(format!("Lock error: {}", e)))?;
        let current = backend.values.get(path).cloned().unwrap_or_default();
        backend.subscribers.insert(
            self.client,
            Subscriber {
                path: path.to_string(),
                tx: self.tx.clone(),
            },
        );
        self.tx
            .send(ValueChange {
                path: path.to_string(),
                bytes: current,
            })
            .map_err(|e| StoreError::Send(e.to_string()))
    }

    fn poll_changes(&mut self) -> Vec<ValueChange> {
        self.rx.try_iter().collect()
    }
}

impl Drop for MemoryStore {
    fn drop(&mut self) {
        if let Ok(mut backend) = self.backend.write() {
            backend.subscribers.remove(&self.client);
        }
    }
}
