//! Manipulation controller: turns gesture samples into widget geometry.

use super::model::WidgetKind;
use super::set::{WidgetId, WidgetSet};
use super::state::{GestureEvent, GestureKind, GestureSession, WidgetEvent, WidgetState};
use crate::geometry;
use kurbo::{Affine, Vec2};
use std::collections::HashMap;

/// Smallest incremental pinch factor applied to a transform.
///
/// A pinch sample whose factor comes out zero or negative is clamped to
/// this value so the transform never collapses or mirrors.
pub const MIN_PINCH_FACTOR: f64 = 1e-3;

/// Tracks gesture state for every widget and applies gesture samples.
///
/// State is private per widget; gestures never span widgets, so nothing
/// here needs cross-widget coordination.
#[derive(Debug, Clone, Default)]
pub struct WidgetManager {
    /// Widgets with at least one running gesture. Absent means idle.
    sessions: HashMap<WidgetId, GestureSession>,
}

impl WidgetManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the interaction state of a widget.
    pub fn state(&self, id: WidgetId) -> WidgetState {
        self.sessions
            .get(&id)
            .map(|session| WidgetState::Interacting(*session))
            .unwrap_or_default()
    }

    /// Check if any gesture is running on a widget.
    pub fn is_interacting(&self, id: WidgetId) -> bool {
        self.sessions.contains_key(&id)
    }

    /// Drop gesture state for a widget that left the canvas.
    pub fn forget(&mut self, id: WidgetId) {
        self.sessions.remove(&id);
    }

    /// Drop all gesture state (after the widget set was replaced).
    pub fn reset(&mut self) {
        self.sessions.clear();
    }

    /// Apply one gesture sample to the widget `id`.
    ///
    /// Samples for a widget that is not in `widgets` are ignored and
    /// produce no events.
    pub fn handle_gesture(
        &mut self,
        widgets: &mut WidgetSet,
        id: WidgetId,
        event: GestureEvent,
    ) -> Vec<WidgetEvent> {
        let mut events = Vec::new();

        if !widgets.contains(id) {
            log::debug!("Ignoring {:?} for missing widget {}", event, id);
            self.forget(id);
            return events;
        }

        match event {
            GestureEvent::Began(kind) => {
                self.session_mut(id).begin(kind);
                events.push(WidgetEvent::InteractionBegan(id));
            }
            GestureEvent::Ended(kind) => self.end(id, kind),
            GestureEvent::Panned { translation } => {
                if !translation.is_finite() {
                    log::warn!("Dropping non-finite pan sample for {}", id);
                    return events;
                }
                let session = self.active_session(id, GestureKind::Pan, &mut events);
                let last = session.last_translation.unwrap_or(Vec2::ZERO);
                session.last_translation = Some(translation);
                let delta = translation - last;
                if let Some(widget) = widgets.get_mut(id) {
                    widget.position = geometry::translate(widget.position, delta.x, delta.y);
                }
            }
            GestureEvent::Rotated { rotation } => {
                if !rotation.is_finite() {
                    log::warn!("Dropping non-finite rotation sample for {}", id);
                    return events;
                }
                let session = self.active_session(id, GestureKind::Rotate, &mut events);
                let last = session.last_rotation.unwrap_or(0.0);
                session.last_rotation = Some(rotation);
                if let Some(widget) = widgets.get_mut(id) {
                    widget.transform = geometry::rotate(widget.transform, rotation - last);
                }
            }
            GestureEvent::Pinched { scale } => {
                if !scale.is_finite() {
                    log::warn!("Dropping non-finite pinch sample for {}", id);
                    return events;
                }
                let session = self.active_session(id, GestureKind::Pinch, &mut events);
                let last = session.last_scale.unwrap_or(1.0);
                session.last_scale = Some(scale);
                if let Some(widget) = widgets.get_mut(id) {
                    widget.transform = apply_pinch(widget.transform, pinch_factor(last, scale));
                }
            }
            GestureEvent::Tap => {
                events.push(WidgetEvent::InteractionBegan(id));
                if let Some(widget) = widgets.get_mut(id) {
                    if widget.kind() == WidgetKind::Sticker {
                        widget.transform = geometry::mirror_horizontal(widget.transform);
                    }
                }
                events.push(WidgetEvent::Tapped(id));
            }
            GestureEvent::LongPress => {
                events.push(WidgetEvent::InteractionBegan(id));
                widgets.remove(id);
                self.forget(id);
                log::debug!("Removed widget {} on long press", id);
                events.push(WidgetEvent::Removed(id));
            }
        }

        events
    }

    /// Apply a text edit coming from the text input surface.
    ///
    /// Emptying a label reports `Removed` but leaves the widget in place;
    /// detaching it is the session's job.
    pub fn text_edited(
        &mut self,
        widgets: &mut WidgetSet,
        id: WidgetId,
        text: &str,
    ) -> Vec<WidgetEvent> {
        let Some(widget) = widgets.get_mut(id) else {
            return Vec::new();
        };
        if widget.kind() != WidgetKind::Text {
            return Vec::new();
        }
        if text.is_empty() {
            return vec![WidgetEvent::Removed(id)];
        }
        widget.set_text(text);
        Vec::new()
    }

    fn session_mut(&mut self, id: WidgetId) -> &mut GestureSession {
        self.sessions.entry(id).or_default()
    }

    /// The session for a sample of `kind`, starting the gesture if the
    /// recognizer skipped its begin event.
    fn active_session(
        &mut self,
        id: WidgetId,
        kind: GestureKind,
        events: &mut Vec<WidgetEvent>,
    ) -> &mut GestureSession {
        let session = self.session_mut(id);
        if !session.is_active(kind) {
            session.begin(kind);
            events.push(WidgetEvent::InteractionBegan(id));
        }
        session
    }

    fn end(&mut self, id: WidgetId, kind: GestureKind) {
        if let Some(session) = self.sessions.get_mut(&id) {
            session.end(kind);
            if session.is_empty() {
                self.sessions.remove(&id);
            }
        }
    }
}

/// Incremental pinch factor between two cumulative samples, clamped to
/// stay positive.
pub fn pinch_factor(last_scale: f64, scale: f64) -> f64 {
    let factor = 1.0 - (last_scale - scale);
    if factor <= 0.0 {
        MIN_PINCH_FACTOR
    } else {
        factor
    }
}

/// Scale `transform`, keeping the previous transform if the result would
/// underflow to a singular matrix.
fn apply_pinch(transform: Affine, factor: f64) -> Affine {
    let next = geometry::scale(transform, factor);
    if geometry::is_invertible(next) {
        next
    } else {
        log::debug!("Pinch would make the transform singular; keeping previous scale");
        transform
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::widget::Widget;
    use kurbo::Point;
    use std::f64::consts::PI;

    fn setup(widget: Widget) -> (WidgetManager, WidgetSet, WidgetId) {
        let mut widgets = WidgetSet::new();
        let id = widgets.add(widget);
        (WidgetManager::new(), widgets, id)
    }

    fn pan(dx: f64, dy: f64) -> GestureEvent {
        GestureEvent::Panned {
            translation: Vec2::new(dx, dy),
        }
    }

    fn assert_transform(widgets: &WidgetSet, id: WidgetId, expected: Affine) {
        let transform = widgets.get(id).unwrap().transform;
        assert!(
            geometry::approx_eq(transform, expected, 1e-12),
            "{:?} != {:?}",
            transform,
            expected
        );
    }

    #[test]
    fn test_begin_notifies_interaction() {
        let (mut manager, mut widgets, id) = setup(Widget::new_text("hi"));
        let events =
            manager.handle_gesture(&mut widgets, id, GestureEvent::Began(GestureKind::Pan));
        assert_eq!(events, vec![WidgetEvent::InteractionBegan(id)]);
        assert!(manager.is_interacting(id));
    }

    #[test]
    fn test_pan_uses_incremental_deltas() {
        let (mut manager, mut widgets, id) =
            setup(Widget::new_text("hi").with_position(Point::new(10.0, 10.0)));
        manager.handle_gesture(&mut widgets, id, GestureEvent::Began(GestureKind::Pan));
        for (dx, dy) in [(1.0, 2.0), (5.0, 5.0), (30.0, -4.0)] {
            manager.handle_gesture(&mut widgets, id, pan(dx, dy));
        }
        manager.handle_gesture(&mut widgets, id, GestureEvent::Ended(GestureKind::Pan));

        // Total displacement equals the final cumulative translation.
        assert_eq!(widgets.get(id).unwrap().position, Point::new(40.0, 6.0));
        assert!(!manager.is_interacting(id));
    }

    #[test]
    fn test_pan_baseline_resets_between_gestures() {
        let (mut manager, mut widgets, id) = setup(Widget::new_text("hi"));
        manager.handle_gesture(&mut widgets, id, GestureEvent::Began(GestureKind::Pan));
        manager.handle_gesture(&mut widgets, id, pan(10.0, 0.0));
        manager.handle_gesture(&mut widgets, id, GestureEvent::Ended(GestureKind::Pan));

        manager.handle_gesture(&mut widgets, id, GestureEvent::Began(GestureKind::Pan));
        manager.handle_gesture(&mut widgets, id, pan(3.0, 0.0));
        assert_eq!(widgets.get(id).unwrap().position, Point::new(13.0, 0.0));
    }

    #[test]
    fn test_non_finite_pan_is_dropped() {
        let (mut manager, mut widgets, id) =
            setup(Widget::new_text("hi").with_position(Point::new(10.0, 10.0)));
        manager.handle_gesture(&mut widgets, id, GestureEvent::Began(GestureKind::Pan));
        manager.handle_gesture(&mut widgets, id, pan(f64::NAN, 0.0));
        manager.handle_gesture(&mut widgets, id, pan(0.0, f64::INFINITY));
        manager.handle_gesture(&mut widgets, id, pan(5.0, 5.0));

        let widget = widgets.get(id).unwrap();
        assert_eq!(widget.position, Point::new(15.0, 15.0));

        let doc = crate::CanvasDocument::snapshot(None, widgets.ordered());
        assert_eq!(crate::CanvasDocument::decode(&doc.encode().unwrap()).unwrap(), doc);
    }

    #[test]
    fn test_rotation_samples_compose_to_total() {
        let (mut manager, mut widgets, id) = setup(Widget::new_sticker("dragon", None));
        manager.handle_gesture(&mut widgets, id, GestureEvent::Began(GestureKind::Rotate));
        for rotation in [0.1, 0.25, 0.7, PI / 2.0] {
            manager.handle_gesture(&mut widgets, id, GestureEvent::Rotated { rotation });
        }
        let expected = Affine::rotate(PI / 2.0);
        assert_transform(&widgets, id, expected);
    }

    #[test]
    fn test_pinch_samples_compose() {
        let (mut manager, mut widgets, id) = setup(Widget::new_text("zoom"));
        manager.handle_gesture(&mut widgets, id, GestureEvent::Began(GestureKind::Pinch));
        manager.handle_gesture(&mut widgets, id, GestureEvent::Pinched { scale: 1.5 });
        manager.handle_gesture(&mut widgets, id, GestureEvent::Pinched { scale: 2.0 });
        // factors: 1 - (1.0 - 1.5) = 1.5, then 1 - (1.5 - 2.0) = 1.5
        let expected = Affine::scale(2.25);
        assert_transform(&widgets, id, expected);
    }

    #[test]
    fn test_pinch_to_zero_never_degenerates() {
        let (mut manager, mut widgets, id) = setup(Widget::new_text("shrink"));
        manager.handle_gesture(&mut widgets, id, GestureEvent::Began(GestureKind::Pinch));
        for scale in [0.6, 0.0, -0.5, -3.0, 0.0, 0.2, -10.0] {
            manager.handle_gesture(&mut widgets, id, GestureEvent::Pinched { scale });
            let transform = widgets.get(id).unwrap().transform;
            assert!(transform.determinant() > 0.0, "determinant collapsed at {scale}");
        }

        // Hammer the clamp until the scale would underflow.
        for _ in 0..500 {
            manager.handle_gesture(&mut widgets, id, GestureEvent::Began(GestureKind::Pinch));
            manager.handle_gesture(&mut widgets, id, GestureEvent::Pinched { scale: -5.0 });
        }
        let transform = widgets.get(id).unwrap().transform;
        assert!(transform.determinant() > 0.0);
        assert!(geometry::is_invertible(transform));
    }

    #[test]
    fn test_pinch_factor_clamps() {
        assert_eq!(pinch_factor(1.0, 1.0), 1.0);
        assert_eq!(pinch_factor(1.0, 0.0), MIN_PINCH_FACTOR);
        assert_eq!(pinch_factor(1.5, 0.2), MIN_PINCH_FACTOR);
        assert!((pinch_factor(1.0, 0.5) - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_implicit_begin() {
        let (mut manager, mut widgets, id) = setup(Widget::new_text("hi"));
        let events =
            manager.handle_gesture(&mut widgets, id, GestureEvent::Rotated { rotation: 0.3 });
        assert_eq!(events, vec![WidgetEvent::InteractionBegan(id)]);
        let events =
            manager.handle_gesture(&mut widgets, id, GestureEvent::Rotated { rotation: 0.4 });
        assert!(events.is_empty());
        assert_transform(&widgets, id, Affine::rotate(0.4));
    }

    #[test]
    fn test_simultaneous_rotate_and_pinch() {
        let (mut manager, mut widgets, id) = setup(Widget::new_sticker("wow", None));
        manager.handle_gesture(&mut widgets, id, GestureEvent::Began(GestureKind::Rotate));
        manager.handle_gesture(&mut widgets, id, GestureEvent::Began(GestureKind::Pinch));
        manager.handle_gesture(&mut widgets, id, GestureEvent::Rotated { rotation: 0.5 });
        manager.handle_gesture(&mut widgets, id, GestureEvent::Pinched { scale: 2.0 });
        manager.handle_gesture(&mut widgets, id, GestureEvent::Ended(GestureKind::Rotate));
        assert!(manager.is_interacting(id));
        manager.handle_gesture(&mut widgets, id, GestureEvent::Ended(GestureKind::Pinch));
        assert!(!manager.is_interacting(id));

        let expected = Affine::rotate(0.5) * Affine::scale(2.0);
        assert_transform(&widgets, id, expected);
    }

    #[test]
    fn test_tap_mirrors_stickers_only() {
        let (mut manager, mut widgets, sticker) = setup(Widget::new_sticker("bunny", None));
        let text = widgets.add(Widget::new_text("label"));

        let events = manager.handle_gesture(&mut widgets, sticker, GestureEvent::Tap);
        assert_eq!(
            events,
            vec![WidgetEvent::InteractionBegan(sticker), WidgetEvent::Tapped(sticker)]
        );
        assert_eq!(
            widgets.get(sticker).unwrap().transform,
            Affine::scale_non_uniform(-1.0, 1.0)
        );

        manager.handle_gesture(&mut widgets, text, GestureEvent::Tap);
        assert_eq!(widgets.get(text).unwrap().transform, Affine::IDENTITY);
    }

    #[test]
    fn test_long_press_removes_once() {
        let (mut manager, mut widgets, id) = setup(Widget::new_text("bye"));
        let events = manager.handle_gesture(&mut widgets, id, GestureEvent::LongPress);
        let removed = events.iter().filter(|e| **e == WidgetEvent::Removed(id)).count();
        assert_eq!(removed, 1);
        assert!(!widgets.contains(id));

        let again = manager.handle_gesture(&mut widgets, id, GestureEvent::LongPress);
        assert!(again.is_empty());
    }

    #[test]
    fn test_emptied_text_notifies_without_removing() {
        let (mut manager, mut widgets, id) = setup(Widget::new_text("hello"));
        let events = manager.text_edited(&mut widgets, id, "");
        assert_eq!(events, vec![WidgetEvent::Removed(id)]);
        assert!(widgets.contains(id));
        assert_eq!(widgets.get(id).unwrap().text(), Some("hello"));
    }

    #[test]
    fn test_text_edit_updates_content() {
        let (mut manager, mut widgets, id) = setup(Widget::new_text("a"));
        let events = manager.text_edited(&mut widgets, id, "abc");
        assert!(events.is_empty());
        assert_eq!(widgets.get(id).unwrap().text(), Some("abc"));

        let sticker = widgets.add(Widget::new_sticker("sonic", None));
        assert!(manager.text_edited(&mut widgets, sticker, "").is_empty());
    }
}
