//! Widget interaction state and gesture events.

use super::set::WidgetId;
use kurbo::Vec2;

/// The interaction state of one widget.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum WidgetState {
    /// No gesture is running on the widget.
    #[default]
    Idle,
    /// At least one continuous gesture is running.
    Interacting(GestureSession),
}

impl WidgetState {
    pub fn is_interacting(&self) -> bool {
        matches!(self, Self::Interacting(_))
    }
}

/// Continuous gestures that accumulate into a widget's geometry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GestureKind {
    Pan,
    Rotate,
    Pinch,
}

/// A gesture sample delivered by the recognizer for one widget.
///
/// Continuous samples carry the recognizer's cumulative value since the
/// gesture began; the controller turns them into increments.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum GestureEvent {
    Began(GestureKind),
    /// Cumulative finger translation since the pan began.
    Panned { translation: Vec2 },
    /// Cumulative rotation in radians since the rotation began.
    Rotated { rotation: f64 },
    /// Cumulative scale since the pinch began (1.0 = unchanged).
    Pinched { scale: f64 },
    Ended(GestureKind),
    Tap,
    LongPress,
}

/// Notifications from the controller to the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WidgetEvent {
    /// A gesture started; the widget should be raised to the top.
    InteractionBegan(WidgetId),
    Tapped(WidgetId),
    /// The widget is gone, or (after a text edit) should be detached.
    Removed(WidgetId),
}

/// Baselines for the gestures currently running on one widget.
///
/// Created when the first gesture begins and discarded when the last one
/// ends, so nothing leaks from one gesture into the next.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct GestureSession {
    pub last_translation: Option<Vec2>,
    pub last_rotation: Option<f64>,
    pub last_scale: Option<f64>,
}

impl GestureSession {
    /// Reset the baseline for `kind` to its neutral value.
    pub fn begin(&mut self, kind: GestureKind) {
        match kind {
            GestureKind::Pan => self.last_translation = Some(Vec2::ZERO),
            GestureKind::Rotate => self.last_rotation = Some(0.0),
            GestureKind::Pinch => self.last_scale = Some(1.0),
        }
    }

    pub fn end(&mut self, kind: GestureKind) {
        match kind {
            GestureKind::Pan => self.last_translation = None,
            GestureKind::Rotate => self.last_rotation = None,
            GestureKind::Pinch => self.last_scale = None,
        }
    }

    pub fn is_active(&self, kind: GestureKind) -> bool {
        match kind {
            GestureKind::Pan => self.last_translation.is_some(),
            GestureKind::Rotate => self.last_rotation.is_some(),
            GestureKind::Pinch => self.last_scale.is_some(),
        }
    }

    /// No gesture is running.
    pub fn is_empty(&self) -> bool {
        self.last_translation.is_none()
            && self.last_rotation.is_none()
            && self.last_scale.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_session_begin_resets_to_neutral() {
        let mut session = GestureSession::default();
        assert!(session.is_empty());

        session.begin(GestureKind::Pinch);
        assert_eq!(session.last_scale, Some(1.0));
        session.last_scale = Some(0.4);
        session.begin(GestureKind::Pinch);
        assert_eq!(session.last_scale, Some(1.0));
    }

    #[test]
    fn test_session_tracks_simultaneous_gestures() {
        let mut session = GestureSession::default();
        session.begin(GestureKind::Rotate);
        session.begin(GestureKind::Pinch);
        assert!(session.is_active(GestureKind::Rotate));
        assert!(!session.is_active(GestureKind::Pan));

        session.end(GestureKind::Rotate);
        assert!(!session.is_empty());
        session.end(GestureKind::Pinch);
        assert!(session.is_empty());
    }

    #[test]
    fn test_default_state_is_idle() {
        assert!(!WidgetState::default().is_interacting());
    }
}
