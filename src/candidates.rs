//! Candidate list and selection cursor of a switcher session.
//!
//! The list is fixed when a session starts and only ever shrinks (when a
//! window goes away). The cursor is always a valid index while the list is
//! non-empty.

use crate::window::{WindowId, WindowInfo};

pub struct Candidates {
    windows: Vec<WindowInfo>,
    cursor: usize,
}

impl Candidates {
    /// Create the list with the cursor on the focused window, or on the
    /// first window when focus is elsewhere.
    pub fn new(windows: Vec<WindowInfo>, focused: Option<WindowId>) -> Self {
        let cursor = focused
            .and_then(|id| windows.iter().position(|w| w.id == id))
            .unwrap_or(0);

        Candidates { windows, cursor }
    }

    pub fn windows(&self) -> &[WindowInfo] {
        &self.windows
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    /// Get the currently selected window, if any.
    pub fn current(&self) -> Option<&WindowInfo> {
        self.windows.get(self.cursor)
    }

    pub fn len(&self) -> usize {
        self.windows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.windows.is_empty()
    }

    pub fn position(&self, id: WindowId) -> Option<usize> {
        self.windows.iter().position(|w| w.id == id)
    }

    /// Move the cursor to an index. Out of range indices are ignored.
    pub fn set_cursor(&mut self, index: usize) -> bool {
        if index < self.windows.len() {
            self.cursor = index;
            true
        } else {
            false
        }
    }

    /// Advance with wrap-around. Returns the new cursor.
    pub fn next(&mut self) -> usize {
        if !self.windows.is_empty() {
            self.cursor = (self.cursor + 1) % self.windows.len();
        }
        self.cursor
    }

    /// Retreat with wrap-around. Returns the new cursor.
    pub fn previous(&mut self) -> usize {
        let len = self.windows.len();
        if len > 0 {
            self.cursor = (self.cursor + len - 1) % len;
        }
        self.cursor
    }

    /// Remove the window at `index`, keeping the cursor on the same window
    /// when that window survives.
    pub fn remove(&mut self, index: usize) -> Option<WindowInfo> {
        if index >= self.windows.len() {
            return None;
        }
        let removed = self.windows.remove(index);

        if self.windows.is_empty() {
            self.cursor = 0;
        } else if index < self.cursor {
            self.cursor -= 1;
        } else {
            self.cursor %= self.windows.len();
        }

        Some(removed)
    }

    pub fn clear(&mut self) {
        self.windows.clear();
        self.cursor = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::make_window;

    fn abcd() -> Vec<WindowInfo> {
        vec![
            make_window(1, "A"),
            make_window(2, "B"),
            make_window(3, "C"),
            make_window(4, "D"),
        ]
    }

    #[test]
    fn test_new_starts_at_focused() {
        let candidates = Candidates::new(abcd(), Some(WindowId(3)));
        assert_eq!(candidates.cursor(), 2);
        assert_eq!(candidates.current().unwrap().title, "C");
    }

    #[test]
    fn test_new_focus_outside_list_starts_at_first() {
        let candidates = Candidates::new(abcd(), Some(WindowId(42)));
        assert_eq!(candidates.cursor(), 0);

        let candidates = Candidates::new(abcd(), None);
        assert_eq!(candidates.cursor(), 0);
    }

    #[test]
    fn test_next_wraps_around() {
        let mut candidates = Candidates::new(abcd(), Some(WindowId(4)));
        assert_eq!(candidates.next(), 0);
        assert_eq!(candidates.next(), 1);
    }

    #[test]
    fn test_previous_wraps_around() {
        let mut candidates = Candidates::new(abcd(), None);
        assert_eq!(candidates.previous(), 3);
        assert_eq!(candidates.previous(), 2);
    }

    #[test]
    fn test_single_window_wraps_to_itself() {
        let mut candidates = Candidates::new(vec![make_window(1, "A")], None);
        assert_eq!(candidates.next(), 0);
        assert_eq!(candidates.previous(), 0);
    }

    #[test]
    fn test_cycle_empty() {
        let mut candidates = Candidates::new(vec![], None);
        assert_eq!(candidates.next(), 0);
        assert_eq!(candidates.previous(), 0);
        assert!(candidates.current().is_none());
    }

    #[test]
    fn test_remove_before_cursor_keeps_selection() {
        let mut candidates = Candidates::new(abcd(), Some(WindowId(3)));
        candidates.remove(1);

        let titles: Vec<_> = candidates.windows().iter().map(|w| w.title.as_str()).collect();
        assert_eq!(titles, ["A", "C", "D"]);
        assert_eq!(candidates.cursor(), 1);
        assert_eq!(candidates.current().unwrap().title, "C");

        candidates.remove(0);
        assert_eq!(candidates.cursor(), 0);
        assert_eq!(candidates.current().unwrap().title, "C");
    }

    #[test]
    fn test_remove_at_cursor_selects_following() {
        let mut candidates = Candidates::new(abcd(), Some(WindowId(2)));
        candidates.remove(1);
        assert_eq!(candidates.current().unwrap().title, "C");
    }

    #[test]
    fn test_remove_last_at_cursor_wraps() {
        let mut candidates = Candidates::new(abcd(), Some(WindowId(4)));
        candidates.remove(3);
        assert_eq!(candidates.cursor(), 0);
        assert_eq!(candidates.current().unwrap().title, "A");
    }

    #[test]
    fn test_remove_out_of_range() {
        let mut candidates = Candidates::new(abcd(), None);
        assert!(candidates.remove(10).is_none());
        assert_eq!(candidates.len(), 4);
    }

    #[test]
    fn test_set_cursor_bounds() {
        let mut candidates = Candidates::new(abcd(), None);
        assert!(candidates.set_cursor(3));
        assert!(!candidates.set_cursor(4));
        assert_eq!(candidates.cursor(), 3);
    }
}
