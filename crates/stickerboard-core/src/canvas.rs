//! Editor session: the live canvas and its edit-mode lifecycle.

use crate::color::HexColor;
use crate::document::CanvasDocument;
use crate::store::RemoteStore;
use crate::sync::{DocumentSync, SyncError, SyncEvent};
use crate::widget::{GestureEvent, Widget, WidgetEvent, WidgetId, WidgetManager, WidgetSet};
use kurbo::{Point, Size};

/// Store path used when none is configured.
pub const DEFAULT_DOCUMENT_PATH: &str = "canvas";

/// Viewport size used when none is configured.
pub const DEFAULT_VIEWPORT: Size = Size::new(375.0, 667.0);

/// Session configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionConfig {
    /// Store path of the shared document.
    pub document_path: String,
    /// Visible canvas area; new widgets land at its center.
    pub viewport: Size,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            document_path: DEFAULT_DOCUMENT_PATH.to_string(),
            viewport: DEFAULT_VIEWPORT,
        }
    }
}

/// How a background image fills the canvas.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum BackgroundMode {
    Tiled,
    #[default]
    Scaled,
    Repeated,
}

/// An image painted under the widgets.
///
/// Local to the session: documents carry only the background color.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackgroundImage {
    /// Asset name, resolved by the renderer.
    pub name: String,
    pub mode: BackgroundMode,
}

/// Receives widgets produced by a picker.
pub trait WidgetPickerDelegate {
    /// Place `widget` on the canvas. Returns its id, or `None` if the
    /// canvas does not accept new widgets right now.
    fn picked_widget(&mut self, widget: Widget) -> Option<WidgetId>;
}

/// Runtime canvas state for one viewer.
pub struct Canvas<S> {
    background: Option<HexColor>,
    background_image: Option<BackgroundImage>,
    widgets: WidgetSet,
    manager: WidgetManager,
    sync: DocumentSync<S>,
    /// Last tapped widget.
    selection: Option<WidgetId>,
    editing: bool,
    viewport: Size,
}

impl<S: RemoteStore> Canvas<S> {
    /// Create an empty session on top of `store`.
    pub fn new(store: S, config: SessionConfig) -> Self {
        Self {
            background: None,
            background_image: None,
            widgets: WidgetSet::new(),
            manager: WidgetManager::new(),
            sync: DocumentSync::new(store, config.document_path),
            selection: None,
            editing: false,
            viewport: config.viewport,
        }
    }

    /// Subscribe to the shared document. Remote values are applied by
    /// [`Canvas::poll_remote`].
    pub fn start(&mut self) -> Result<(), SyncError> {
        self.sync.subscribe()
    }

    /// Enter edit mode.
    pub fn edit(&mut self) {
        self.editing = true;
    }

    pub fn is_editing(&self) -> bool {
        self.editing
    }

    /// Publish the current canvas and leave edit mode.
    ///
    /// On failure the session stays in edit mode so nothing is lost
    /// locally; the caller decides whether to try again.
    pub fn save(&mut self) -> Result<(), SyncError> {
        let document = self.snapshot();
        self.sync.publish(&document)?;
        self.editing = false;
        self.selection = None;
        log::info!("Saved canvas with {} widgets", document.len());
        Ok(())
    }

    pub fn background(&self) -> Option<HexColor> {
        self.background
    }

    /// Set the background color. Any background image is cleared.
    pub fn set_background(&mut self, color: Option<HexColor>) {
        if let Some(image) = self.background_image.take() {
            log::debug!("Clearing background image {}", image.name);
        }
        self.background = color;
    }

    pub fn background_image(&self) -> Option<&BackgroundImage> {
        self.background_image.as_ref()
    }

    /// Paint `name` under the widgets. The background color is kept
    /// beneath it.
    pub fn set_background_image(&mut self, name: impl Into<String>, mode: BackgroundMode) {
        self.background_image = Some(BackgroundImage {
            name: name.into(),
            mode,
        });
    }

    pub fn clear_background_image(&mut self) {
        self.background_image = None;
    }

    /// The live widgets, back to front.
    pub fn widgets(&self) -> &WidgetSet {
        &self.widgets
    }

    pub fn selection(&self) -> Option<WidgetId> {
        self.selection
    }

    pub fn viewport(&self) -> Size {
        self.viewport
    }

    /// Set the viewport size.
    pub fn set_viewport_size(&mut self, width: f64, height: f64) {
        self.viewport = Size::new(width, height);
    }

    pub fn sync(&self) -> &DocumentSync<S> {
        &self.sync
    }

    pub fn sync_mut(&mut self) -> &mut DocumentSync<S> {
        &mut self.sync
    }

    /// Route a gesture sample to the manipulation controller.
    ///
    /// Outside edit mode the canvas is read-only and samples are dropped.
    pub fn handle_gesture(&mut self, id: WidgetId, event: GestureEvent) -> Vec<WidgetEvent> {
        if !self.editing {
            return Vec::new();
        }
        let events = self.manager.handle_gesture(&mut self.widgets, id, event);
        for &event in &events {
            self.apply_widget_event(event);
        }
        events
    }

    /// Apply text typed into a label. An emptied label is detached.
    ///
    /// Like gestures, edits are dropped outside edit mode.
    pub fn edit_text(&mut self, id: WidgetId, text: &str) -> Vec<WidgetEvent> {
        if !self.editing {
            return Vec::new();
        }
        let events = self.manager.text_edited(&mut self.widgets, id, text);
        for &event in &events {
            if let WidgetEvent::Removed(removed) = event {
                self.widgets.remove(removed);
            }
            self.apply_widget_event(event);
        }
        events
    }

    fn apply_widget_event(&mut self, event: WidgetEvent) {
        match event {
            WidgetEvent::InteractionBegan(id) => {
                self.widgets.bring_to_front(id);
            }
            WidgetEvent::Tapped(id) => self.selection = Some(id),
            WidgetEvent::Removed(id) => {
                self.manager.forget(id);
                self.selection = None;
            }
        }
    }

    /// Apply documents received from the store. Each one replaces the
    /// whole canvas. Returns how many were applied.
    pub fn poll_remote(&mut self) -> usize {
        let mut applied = 0;
        for event in self.sync.poll() {
            match event {
                SyncEvent::DocumentReceived(document) => {
                    self.replace_document(document);
                    applied += 1;
                }
                SyncEvent::DecodeFailed(_) => {
                    log::debug!("Keeping current canvas after rejected remote document");
                }
            }
        }
        applied
    }

    /// Swap in `document` wholesale. Widgets get fresh ids; gesture state
    /// and selection are dropped. The background image is not part of the
    /// document and stays.
    pub fn replace_document(&mut self, document: CanvasDocument) {
        let CanvasDocument {
            background_color,
            widgets,
        } = document;
        self.background = background_color;
        self.widgets.replace_all(widgets);
        self.manager.reset();
        self.selection = None;
        log::info!("Applied document with {} widgets", self.widgets.len());
    }

    /// The current canvas as a document.
    pub fn snapshot(&self) -> CanvasDocument {
        CanvasDocument::snapshot(self.background, self.widgets.ordered())
    }

    fn viewport_center(&self) -> Point {
        Point::new(self.viewport.width / 2.0, self.viewport.height / 2.0)
    }
}

impl<S: RemoteStore> WidgetPickerDelegate for Canvas<S> {
    fn picked_widget(&mut self, widget: Widget) -> Option<WidgetId> {
        if !self.editing {
            log::debug!("Ignoring picked widget outside edit mode");
            return None;
        }
        let id = self.widgets.add(widget.with_position(self.viewport_center()));
        log::debug!("Placed widget {}", id);
        Some(id)
    }
}
