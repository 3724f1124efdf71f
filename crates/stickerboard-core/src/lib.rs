//! Stickerboard Core Library
//!
//! Canvas document model, gesture-driven widget manipulation and
//! document synchronization over a push/subscribe key-value store.

pub mod canvas;
pub mod color;
pub mod document;
pub mod geometry;
pub mod store;
pub mod sync;
pub mod widget;

pub use canvas::{
    BackgroundImage, BackgroundMode, Canvas, DEFAULT_DOCUMENT_PATH, SessionConfig,
    WidgetPickerDelegate,
};
pub use color::{ColorParseError, HexColor};
pub use document::{CanvasDocument, DecodeError, EncodeError};
pub use store::{
    ConnectionState, MemoryStore, RemoteStore, StoreError, StoreResult, ValueChange,
    WebSocketStore,
};
pub use sync::{DocumentSync, SyncError, SyncEvent};
pub use widget::{
    GestureEvent, GestureKind, StickerCatalog, Widget, WidgetContent, WidgetEvent, WidgetId,
    WidgetKind, WidgetManager, WidgetSet, WidgetState,
};
