//! The live, ordered set of widgets in an editing session.

use super::model::Widget;
use std::collections::HashMap;
use uuid::Uuid;

/// Identity of a widget within one session.
///
/// Ids are never serialized; a document decoded from the remote store gets
/// fresh ids when it is swapped in.
pub type WidgetId = Uuid;

/// Widgets keyed by id, plus their z-order (back to front).
#[derive(Debug, Clone, Default)]
pub struct WidgetSet {
    widgets: HashMap<WidgetId, Widget>,
    z_order: Vec<WidgetId>,
}

impl WidgetSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a widget on top of everything else.
    pub fn add(&mut self, widget: Widget) -> WidgetId {
        let id = Uuid::new_v4();
        self.z_order.push(id);
        self.widgets.insert(id, widget);
        id
    }

    /// Remove a widget. Returns `None` if it was already gone.
    pub fn remove(&mut self, id: WidgetId) -> Option<Widget> {
        let removed = self.widgets.remove(&id)?;
        self.z_order.retain(|&other| other != id);
        Some(removed)
    }

    pub fn get(&self, id: WidgetId) -> Option<&Widget> {
        self.widgets.get(&id)
    }

    pub fn get_mut(&mut self, id: WidgetId) -> Option<&mut Widget> {
        self.widgets.get_mut(&id)
    }

    pub fn contains(&self, id: WidgetId) -> bool {
        self.widgets.contains_key(&id)
    }

    /// Raise a widget to the top of the z-order.
    /// Returns false if the widget is not in the set.
    pub fn bring_to_front(&mut self, id: WidgetId) -> bool {
        if !self.contains(id) {
            return false;
        }
        self.z_order.retain(|&other| other != id);
        self.z_order.push(id);
        true
    }

    /// The topmost widget, if any.
    pub fn top(&self) -> Option<WidgetId> {
        self.z_order.last().copied()
    }

    /// Ids back to front.
    pub fn ids(&self) -> &[WidgetId] {
        &self.z_order
    }

    /// Widgets back to front.
    pub fn ordered(&self) -> impl Iterator<Item = &Widget> {
        self.z_order.iter().filter_map(|id| self.widgets.get(id))
    }

    /// Widgets back to front, with their ids.
    pub fn ordered_with_ids(&self) -> impl Iterator<Item = (WidgetId, &Widget)> {
        self.z_order
            .iter()
            .filter_map(|&id| self.widgets.get(&id).map(|w| (id, w)))
    }

    pub fn len(&self) -> usize {
        self.widgets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.widgets.is_empty()
    }

    pub fn clear(&mut self) {
        self.widgets.clear();
        self.z_order.clear();
    }

    /// Drop every widget and load `widgets` in order, bottom first.
    pub fn replace_all(&mut self, widgets: impl IntoIterator<Item = Widget>) -> Vec<WidgetId> {
        self.clear();
        widgets.into_iter().map(|w| self.add(w)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_add_appends_to_top() {
        let mut set = WidgetSet::new();
        let a = set.add(Widget::new_text("a"));
        let b = set.add(Widget::new_text("b"));
        assert_eq!(set.ids(), &[a, b]);
        assert_eq!(set.top(), Some(b));
    }

    #[test]
    fn test_remove() {
        let mut set = WidgetSet::new();
        let a = set.add(Widget::new_text("a"));
        assert!(set.remove(a).is_some());
        assert!(set.remove(a).is_none());
        assert!(set.is_empty());
        assert!(set.ids().is_empty());
    }

    #[test]
    fn test_bring_to_front() {
        let mut set = WidgetSet::new();
        let a = set.add(Widget::new_text("a"));
        let b = set.add(Widget::new_text("b"));
        let c = set.add(Widget::new_text("c"));

        assert!(set.bring_to_front(a));
        assert_eq!(set.ids(), &[b, c, a]);
        assert!(!set.bring_to_front(Uuid::new_v4()));

        let texts: Vec<_> = set.ordered().filter_map(|w| w.text()).collect();
        assert_eq!(texts, vec!["b", "c", "a"]);
    }

    #[test]
    fn test_replace_all_preserves_order() {
        let mut set = WidgetSet::new();
        let old = set.add(Widget::new_text("old"));
        let ids = set.replace_all(vec![Widget::new_text("x"), Widget::new_sticker("wow", None)]);
        assert_eq!(ids.len(), 2);
        assert!(!set.contains(old));
        assert_eq!(set.ids(), ids.as_slice());
        assert_eq!(set.ordered().next().and_then(|w| w.text()), Some("x"));
    }
}
