//! Application state and commands.

use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use stickerboard_core::{
    Canvas, CanvasDocument, DEFAULT_DOCUMENT_PATH, DecodeError, EncodeError, RemoteStore,
    SessionConfig, StoreError, SyncError, WebSocketStore, WidgetKind,
};
use thiserror::Error;

/// Server used when none is configured.
pub const DEFAULT_SERVER_URL: &str = "ws://localhost:3030/ws";
/// Store polling interval in milliseconds.
pub const DEFAULT_POLL_MS: u64 = 50;
/// How long `publish` and `export` wait for the store.
pub const DEFAULT_TIMEOUT_SECS: u64 = 10;

/// Application configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct AppConfig {
    pub server_url: String,
    pub document_path: String,
    pub poll_interval: Duration,
    pub timeout: Duration,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            server_url: DEFAULT_SERVER_URL.to_string(),
            document_path: DEFAULT_DOCUMENT_PATH.to_string(),
            poll_interval: Duration::from_millis(DEFAULT_POLL_MS),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        }
    }
}

impl AppConfig {
    fn session_config(&self) -> SessionConfig {
        SessionConfig {
            document_path: self.document_path.clone(),
            ..SessionConfig::default()
        }
    }
}

#[derive(Debug, Error)]
pub enum AppError {
    #[error("failed to access {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("invalid document: {0}")]
    Decode(#[from] DecodeError),
    #[error(transparent)]
    Encode(#[from] EncodeError),
    #[error(transparent)]
    Sync(#[from] SyncError),
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error("timed out after {0:?} waiting for the store")]
    Timeout(Duration),
}

/// A headless viewer of one shared canvas.
pub struct App<S> {
    config: AppConfig,
    canvas: Canvas<S>,
}

impl App<WebSocketStore> {
    /// Connect to the configured server.
    pub fn connect(config: AppConfig) -> Result<Self, AppError> {
        let store = WebSocketStore::connect(&config.server_url)?;
        log::info!("Connecting to {}", config.server_url);
        Ok(Self::with_store(config, store))
    }
}

impl<S: RemoteStore> App<S> {
    pub fn with_store(config: AppConfig, store: S) -> Self {
        let canvas = Canvas::new(store, config.session_config());
        Self { config, canvas }
    }

    pub fn canvas(&self) -> &Canvas<S> {
        &self.canvas
    }

    /// Follow the shared document, logging every applied version.
    ///
    /// Runs until `limit` documents were applied, or forever without one.
    pub fn watch(&mut self, limit: Option<usize>) -> Result<usize, AppError> {
        self.canvas.start()?;
        log::info!("Watching {}", self.config.document_path);

        let mut seen = 0;
        loop {
            let applied = self.canvas.poll_remote();
            if applied > 0 {
                seen += applied;
                log::info!("{}", summarize(&self.canvas.snapshot()));
            }
            if limit.is_some_and(|limit| seen >= limit) {
                return Ok(seen);
            }
            std::thread::sleep(self.config.poll_interval);
        }
    }

    /// Replace the shared document with `document` and wait until the
    /// store echoes it back.
    pub fn publish(&mut self, document: CanvasDocument) -> Result<(), AppError> {
        self.canvas.start()?;
        self.canvas.edit();
        self.canvas.replace_document(document.clone());
        self.canvas.save()?;
        self.wait_until(|canvas| {
            canvas.poll_remote();
            canvas.snapshot() == document
        })?;
        log::info!("Published {}", summarize(&document));
        Ok(())
    }

    /// Wait for the first non-empty remote document and return it.
    pub fn export(&mut self) -> Result<CanvasDocument, AppError> {
        self.canvas.start()?;
        let mut received = false;
        self.wait_until(|canvas| {
            received |= canvas.poll_remote() > 0;
            received
        })?;
        Ok(self.canvas.snapshot())
    }

    /// Call `done` every poll interval until it holds or the timeout
    /// elapses.
    fn wait_until(
        &mut self,
        mut done: impl FnMut(&mut Canvas<S>) -> bool,
    ) -> Result<(), AppError> {
        let deadline = Instant::now() + self.config.timeout;
        loop {
            if done(&mut self.canvas) {
                return Ok(());
            }
            if Instant::now() >= deadline {
                return Err(AppError::Timeout(self.config.timeout));
            }
            std::thread::sleep(self.config.poll_interval);
        }
    }
}

/// Load and validate a document file.
pub fn read_document(path: &Path) -> Result<CanvasDocument, AppError> {
    let bytes = std::fs::read(path).map_err(|source| AppError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(CanvasDocument::decode(&bytes)?)
}

/// Write a document as indented JSON.
pub fn write_document(path: &Path, document: &CanvasDocument) -> Result<(), AppError> {
    let json = document.to_json_pretty()?;
    std::fs::write(path, json).map_err(|source| AppError::Io {
        path: path.to_path_buf(),
        source,
    })
}

/// One-line description of a document for logs.
pub fn summarize(document: &CanvasDocument) -> String {
    let texts = document
        .widgets
        .iter()
        .filter(|w| w.kind() == WidgetKind::Text)
        .count();
    let background = document
        .background_color
        .map(|c| c.to_hex())
        .unwrap_or_else(|| "default".to_string());
    format!(
        "document: {} widgets ({} text, {} stickers), background {}",
        document.len(),
        texts,
        document.len() - texts,
        background
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use stickerboard_core::{HexColor, MemoryStore, Widget};

    fn test_config() -> AppConfig {
        AppConfig {
            poll_interval: Duration::from_millis(1),
            timeout: Duration::from_millis(50),
            ..AppConfig::default()
        }
    }

    fn sample() -> CanvasDocument {
        CanvasDocument {
            background_color: Some(HexColor::new(0xff, 0, 0)),
            widgets: vec![Widget::new_text("hi"), Widget::new_sticker("bunny", None)],
        }
    }

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.server_url, "ws://localhost:3030/ws");
        assert_eq!(config.document_path, "canvas");
        assert_eq!(config.poll_interval, Duration::from_millis(50));
    }

    #[test]
    fn test_publish_then_export() {
        let store = MemoryStore::new();
        let mut reader = App::with_store(test_config(), store.connect());
        let mut writer = App::with_store(test_config(), store);

        writer.publish(sample()).unwrap();
        assert_eq!(reader.export().unwrap(), sample());
    }

    #[test]
    fn test_export_times_out_on_empty_store() {
        let mut app = App::with_store(test_config(), MemoryStore::new());
        assert!(matches!(app.export(), Err(AppError::Timeout(_))));
    }

    #[test]
    fn test_watch_stops_after_limit() {
        let store = MemoryStore::new();
        let mut writer = App::with_store(test_config(), store.connect());
        writer.publish(sample()).unwrap();

        let mut watcher = App::with_store(test_config(), store);
        assert_eq!(watcher.watch(Some(1)).unwrap(), 1);
        assert_eq!(watcher.canvas().snapshot(), sample());
    }

    #[test]
    fn test_summary() {
        assert_eq!(
            summarize(&sample()),
            "document: 2 widgets (1 text, 1 stickers), background #ff0000"
        );
        assert_eq!(
            summarize(&CanvasDocument::new()),
            "document: 0 widgets (0 text, 0 stickers), background default"
        );
    }

    #[test]
    fn test_document_files() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("canvas.json");
        write_document(&path, &sample()).unwrap();
        assert_eq!(read_document(&path).unwrap(), sample());

        std::fs::write(&path, br#"{"widgets":[{"type":"banana"}]}"#).unwrap();
        assert!(matches!(read_document(&path), Err(AppError::Decode(_))));

        let missing = temp_dir.path().join("missing.json");
        assert!(matches!(read_document(&missing), Err(AppError::Io { .. })));
    }
}
