//! Stickerboard Application
//!
//! Headless shell around an editor session: follows a shared canvas
//! document, publishes documents from files, and exports the current one.

mod app;

pub use app::{
    App, AppConfig, AppError, DEFAULT_POLL_MS, DEFAULT_SERVER_URL, DEFAULT_TIMEOUT_SECS,
    read_document, summarize, write_document,
};
