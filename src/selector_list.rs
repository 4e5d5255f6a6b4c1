//! The list of candidate windows shown in the middle of the active monitor.

use crate::compositor::Compositor;
use crate::overlay::{Overlay, RowStyle};
use crate::window::{Rect, WindowId, WindowInfo};

pub const ICON_SIZE: i32 = 48;
pub const FALLBACK_ICON: &str = "applications-other";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Icon {
    /// Themed icon name or absolute path of the application's icon
    App(String),
    /// Generic icon used when the application's icon cannot be resolved
    Fallback,
}

impl Icon {
    pub fn name(&self) -> &str {
        match self {
            Icon::App(name) => name,
            Icon::Fallback => FALLBACK_ICON,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListEntry {
    pub window: WindowId,
    pub icon: Icon,
    pub label: String,
}

struct Row {
    entry: ListEntry,
    style: RowStyle,
}

pub struct SelectorList {
    rows: Vec<Row>,
}

impl SelectorList {
    pub fn empty() -> Self {
        SelectorList { rows: Vec::new() }
    }

    /// Build one row per candidate, in list order, and center the list in `area`.
    pub fn build(
        windows: &[WindowInfo],
        area: Rect,
        compositor: &mut dyn Compositor,
        overlay: &mut dyn Overlay,
    ) -> Self {
        let rows: Vec<Row> = windows
            .iter()
            .map(|window| {
                let icon = compositor
                    .app_icon(window)
                    .map(Icon::App)
                    .unwrap_or(Icon::Fallback);
                Row {
                    entry: ListEntry {
                        window: window.id,
                        icon,
                        label: window.title.clone(),
                    },
                    style: RowStyle::default(),
                }
            })
            .collect();

        for row in &rows {
            overlay.add_list_row(&row.entry);
        }
        overlay.show_list(area);

        SelectorList { rows }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn entry(&self, index: usize) -> Option<&ListEntry> {
        self.rows.get(index).map(|r| &r.entry)
    }

    pub fn style(&self, index: usize) -> Option<RowStyle> {
        self.rows.get(index).map(|r| r.style)
    }

    pub fn position(&self, window: WindowId) -> Option<usize> {
        self.rows.iter().position(|r| r.entry.window == window)
    }

    /// Give the focus style to the row at `index` and take it from every other row.
    pub fn focus(&mut self, index: usize, overlay: &mut dyn Overlay) {
        for (i, row) in self.rows.iter_mut().enumerate() {
            let focus = i == index;
            if row.style.focus != focus {
                row.style.focus = focus;
                overlay.set_row_style(row.entry.window, row.style);
            }
        }
    }

    pub fn set_hover(&mut self, window: WindowId, hover: bool, overlay: &mut dyn Overlay) {
        if let Some(row) = self.rows.iter_mut().find(|r| r.entry.window == window)
            && row.style.hover != hover
        {
            row.style.hover = hover;
            overlay.set_row_style(window, row.style);
        }
    }

    pub fn remove(&mut self, index: usize, overlay: &mut dyn Overlay) {
        if index < self.rows.len() {
            let row = self.rows.remove(index);
            overlay.remove_list_row(row.entry.window);
        }
    }

    pub fn clear(&mut self) {
        self.rows.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{MockCompositor, RecordingOverlay, make_window};

    fn build(windows: &[WindowInfo], overlay: &mut RecordingOverlay) -> SelectorList {
        let mut compositor = MockCompositor::new(windows.to_vec());
        compositor.icons.insert(WindowId(1), "org.gnome.Terminal".to_string());
        SelectorList::build(windows, Rect::new(0, 0, 1920, 1080), &mut compositor, overlay)
    }

    #[test]
    fn test_build_resolves_icons_with_fallback() {
        let mut overlay = RecordingOverlay::default();
        let windows = vec![make_window(1, "Terminal"), make_window(2, "Unknown")];
        let list = build(&windows, &mut overlay);

        assert_eq!(list.len(), 2);
        assert_eq!(
            list.entry(0).unwrap().icon,
            Icon::App("org.gnome.Terminal".to_string())
        );
        assert_eq!(list.entry(1).unwrap().icon, Icon::Fallback);
        assert_eq!(list.entry(1).unwrap().icon.name(), FALLBACK_ICON);
        assert_eq!(overlay.row_ids(), vec![WindowId(1), WindowId(2)]);
        assert_eq!(overlay.list, Some(Rect::new(0, 0, 1920, 1080)));
    }

    #[test]
    fn test_focus_is_exclusive() {
        let mut overlay = RecordingOverlay::default();
        let windows = vec![make_window(1, "A"), make_window(2, "B"), make_window(3, "C")];
        let mut list = build(&windows, &mut overlay);

        list.focus(1, &mut overlay);
        list.focus(2, &mut overlay);

        assert_eq!(overlay.focused_rows(), vec![WindowId(3)]);
        assert!(!list.style(1).unwrap().focus);
        assert!(list.style(2).unwrap().focus);
    }

    #[test]
    fn test_hover_style() {
        let mut overlay = RecordingOverlay::default();
        let windows = vec![make_window(1, "A"), make_window(2, "B")];
        let mut list = build(&windows, &mut overlay);

        list.set_hover(WindowId(2), true, &mut overlay);
        assert!(overlay.row_style(WindowId(2)).unwrap().hover);

        list.set_hover(WindowId(2), false, &mut overlay);
        assert!(!overlay.row_style(WindowId(2)).unwrap().hover);

        // Unknown rows are ignored
        list.set_hover(WindowId(9), true, &mut overlay);
    }

    #[test]
    fn test_remove_row() {
        let mut overlay = RecordingOverlay::default();
        let windows = vec![make_window(1, "A"), make_window(2, "B")];
        let mut list = build(&windows, &mut overlay);

        list.remove(0, &mut overlay);
        assert_eq!(list.len(), 1);
        assert_eq!(list.position(WindowId(2)), Some(0));
        assert_eq!(overlay.row_ids(), vec![WindowId(2)]);
    }

    #[test]
    fn test_long_titles_are_left_to_the_label() {
        let mut overlay = RecordingOverlay::default();
        let title = "ä".repeat(200);
        let windows = vec![make_window(1, &title)];
        let list = build(&windows, &mut overlay);

        assert_eq!(list.entry(0).unwrap().label, title);
        assert_eq!(overlay.rows[0].0.label, title);
    }
}
