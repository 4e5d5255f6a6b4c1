//! Window previews shown behind the selector list.
//!
//! One slot per candidate, index-aligned with the candidate list. A slot is
//! empty when the window had no live thumbnail; empty slots are never drawn.

use crate::overlay::Overlay;
use crate::window::{Monitor, WindowId, WindowInfo, WorkspaceId};
use tracing::debug;

pub const OPAQUE: u8 = 255;
pub const TRANSPARENT: u8 = 0;

/// RGBA of the decorative preview outline
pub const OUTLINE_COLOR: [u8; 4] = [0x99, 0x22, 0x22, 0xc4];
pub const OUTLINE_THICKNESS: i32 = 5;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Preview {
    pub window: WindowId,
    pub title: String,
    /// Offset from the active monitor's origin
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
    pub opacity: u8,
    pub has_outline: bool,
}

impl Preview {
    /// Build a preview for a window, or `None` if it has nothing to clone.
    pub fn for_window(
        window: &WindowInfo,
        monitor: &Monitor,
        active_workspace: Option<&WorkspaceId>,
        has_outline: bool,
    ) -> Option<Self> {
        let thumbnail = window.thumbnail?;

        // Minimized windows keep their compositor position, so it is used as is.
        let opacity = if window.is_visible_on(active_workspace) {
            OPAQUE
        } else {
            TRANSPARENT
        };

        Some(Preview {
            window: window.id,
            title: window.title.clone(),
            x: window.frame.x - monitor.rect.x,
            y: window.frame.y - monitor.rect.y,
            width: thumbnail.width,
            height: thumbnail.height,
            opacity,
            has_outline,
        })
    }
}

pub struct PreviewLayer {
    slots: Vec<Option<Preview>>,
    shown: Option<WindowId>,
}

impl PreviewLayer {
    pub fn empty() -> Self {
        PreviewLayer {
            slots: Vec::new(),
            shown: None,
        }
    }

    /// Create a preview for every candidate and hand them to the overlay, all hidden.
    pub fn build(
        windows: &[WindowInfo],
        monitor: &Monitor,
        active_workspace: Option<&WorkspaceId>,
        draw_borders: bool,
        overlay: &mut dyn Overlay,
    ) -> Self {
        let slots: Vec<Option<Preview>> = windows
            .iter()
            .map(|w| Preview::for_window(w, monitor, active_workspace, draw_borders))
            .collect();

        for preview in slots.iter().flatten() {
            overlay.add_preview(preview);
        }
        debug!(
            "Built {} previews for {} windows",
            slots.iter().flatten().count(),
            slots.len()
        );

        PreviewLayer { slots, shown: None }
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn get(&self, index: usize) -> Option<&Preview> {
        self.slots.get(index).and_then(Option::as_ref)
    }

    pub fn shown(&self) -> Option<WindowId> {
        self.shown
    }

    /// Hide the previously shown preview and show the one at `index`.
    ///
    /// A transparent preview becomes opaque once selected and stays that way.
    pub fn show(&mut self, index: usize, overlay: &mut dyn Overlay) {
        if let Some(previous) = self.shown.take()
            && let Some(preview) = self.slots.iter().flatten().find(|p| p.window == previous)
        {
            overlay.set_preview_shown(previous, false, preview.opacity);
        }

        if let Some(Some(preview)) = self.slots.get_mut(index) {
            preview.opacity = OPAQUE;
            overlay.set_preview_shown(preview.window, true, preview.opacity);
            self.shown = Some(preview.window);
        }
    }

    /// Drop the slot at `index` together with its on-screen preview.
    pub fn remove(&mut self, index: usize, overlay: &mut dyn Overlay) {
        if index >= self.slots.len() {
            return;
        }
        if let Some(preview) = self.slots.remove(index) {
            if self.shown == Some(preview.window) {
                self.shown = None;
            }
            overlay.remove_preview(preview.window);
        }
    }

    pub fn clear(&mut self, overlay: &mut dyn Overlay) {
        for preview in self.slots.drain(..).flatten() {
            overlay.remove_preview(preview.window);
        }
        self.shown = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{RecordingOverlay, make_window};
    use crate::window::{Rect, Thumbnail};

    fn monitor() -> Monitor {
        Monitor {
            name: "DP-2".to_string(),
            rect: Rect::new(1920, 0, 1920, 1080),
            primary: true,
        }
    }

    fn window_at(id: i64, workspace: i64, x: i32, y: i32) -> WindowInfo {
        let mut window = make_window(id, &format!("w{}", id));
        window.workspace = Some(WorkspaceId(workspace));
        window.frame = Rect::new(x, y, 800, 600);
        window.thumbnail = Some(Thumbnail {
            width: 800,
            height: 600,
        });
        window
    }

    #[test]
    fn test_preview_offsets_are_monitor_relative() {
        let window = window_at(1, 0, 2000, 100);
        let preview = Preview::for_window(&window, &monitor(), Some(&WorkspaceId(0)), true).unwrap();

        assert_eq!((preview.x, preview.y), (80, 100));
        assert_eq!((preview.width, preview.height), (800, 600));
        assert_eq!(preview.opacity, OPAQUE);
        assert!(preview.has_outline);
    }

    #[test]
    fn test_preview_opacity_rules() {
        let active = WorkspaceId(0);
        let other = window_at(1, 1, 2000, 0);
        assert_eq!(
            Preview::for_window(&other, &monitor(), Some(&active), false).unwrap().opacity,
            TRANSPARENT
        );

        let mut minimized = window_at(2, 0, 2000, 0);
        minimized.minimized = true;
        let preview = Preview::for_window(&minimized, &monitor(), Some(&active), false).unwrap();
        assert_eq!(preview.opacity, TRANSPARENT);
        assert_eq!(preview.x, 80);

        let mut sticky = window_at(3, 1, 2000, 0);
        sticky.on_all_workspaces = true;
        assert_eq!(
            Preview::for_window(&sticky, &monitor(), Some(&active), false).unwrap().opacity,
            OPAQUE
        );
    }

    #[test]
    fn test_window_without_thumbnail_gets_empty_slot() {
        let mut overlay = RecordingOverlay::default();
        let mut unmapped = window_at(2, 0, 0, 0);
        unmapped.thumbnail = None;
        let windows = vec![window_at(1, 0, 0, 0), unmapped, window_at(3, 0, 0, 0)];

        let layer = PreviewLayer::build(&windows, &monitor(), Some(&WorkspaceId(0)), false, &mut overlay);

        assert_eq!(layer.len(), 3);
        assert!(layer.get(1).is_none());
        assert_eq!(overlay.previews.len(), 2);
    }

    #[test]
    fn test_show_swaps_single_visible_preview() {
        let mut overlay = RecordingOverlay::default();
        let windows = vec![window_at(1, 0, 0, 0), window_at(2, 1, 0, 0)];
        let mut layer =
            PreviewLayer::build(&windows, &monitor(), Some(&WorkspaceId(0)), false, &mut overlay);

        layer.show(0, &mut overlay);
        assert_eq!(overlay.shown_previews(), vec![WindowId(1)]);

        layer.show(1, &mut overlay);
        assert_eq!(overlay.shown_previews(), vec![WindowId(2)]);
        // Selected off-workspace preview is faded in
        assert_eq!(layer.get(1).unwrap().opacity, OPAQUE);
        assert_eq!(layer.shown(), Some(WindowId(2)));
    }

    #[test]
    fn test_show_empty_slot_hides_previous() {
        let mut overlay = RecordingOverlay::default();
        let mut unmapped = window_at(2, 0, 0, 0);
        unmapped.thumbnail = None;
        let windows = vec![window_at(1, 0, 0, 0), unmapped];
        let mut layer =
            PreviewLayer::build(&windows, &monitor(), Some(&WorkspaceId(0)), false, &mut overlay);

        layer.show(0, &mut overlay);
        layer.show(1, &mut overlay);
        assert!(overlay.shown_previews().is_empty());
        assert_eq!(layer.shown(), None);
    }

    #[test]
    fn test_remove_and_clear() {
        let mut overlay = RecordingOverlay::default();
        let windows = vec![window_at(1, 0, 0, 0), window_at(2, 0, 0, 0), window_at(3, 0, 0, 0)];
        let mut layer =
            PreviewLayer::build(&windows, &monitor(), Some(&WorkspaceId(0)), false, &mut overlay);

        layer.show(1, &mut overlay);
        layer.remove(1, &mut overlay);
        assert_eq!(layer.len(), 2);
        assert_eq!(layer.shown(), None);
        assert!(!overlay.previews.contains_key(&WindowId(2)));

        layer.clear(&mut overlay);
        assert_eq!(layer.len(), 0);
        assert!(overlay.previews.is_empty());
    }
}
