//! Widgets: the items placed on a canvas and the gestures that move them.
//!
//! - [`Widget`] is pure data (kind, geometry, content) and owns its
//!   document encoding.
//! - [`WidgetSet`] is the live, z-ordered collection of a session.
//! - [`WidgetManager`] turns gesture samples into geometry changes and
//!   reports what happened as [`WidgetEvent`]s.

mod catalog;
mod manager;
mod model;
mod set;
mod state;

pub use catalog::{
    DEFAULT_STICKER_SIZE, StickerAsset, StickerCatalog, TEXT_FONT_SIZE, TEXT_PLACEHOLDER,
    measure_text,
};
pub use manager::{MIN_PINCH_FACTOR, WidgetManager, pinch_factor};
pub use model::{
    STICKER_KIND, StickerContent, TEXT_KIND, TextContent, TransformFields, Widget, WidgetContent,
    WidgetFields, WidgetKind,
};
pub use set::{WidgetId, WidgetSet};
pub use state::{GestureEvent, GestureKind, GestureSession, WidgetEvent, WidgetState};
