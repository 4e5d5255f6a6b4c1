//! Compositor abstraction for testability.
//!
//! This is everything the switcher needs from the window manager: the window
//! registry, focus, workspaces, outputs and the key-binding table. The Sway
//! implementation lives in `sway_client`; tests use `testing::MockCompositor`.

use anyhow::Result;

use crate::keybindings::Binding;
use crate::modifiers::ModifierMask;
use crate::window::{Monitor, WindowId, WindowInfo, WorkspaceId};

pub trait Compositor {
    /// All currently manageable windows, in compositor enumeration order
    fn windows(&mut self) -> Result<Vec<WindowInfo>>;

    /// The window that currently has input focus
    fn focus_window(&mut self) -> Result<Option<WindowId>>;

    fn active_workspace(&mut self) -> Result<Option<WorkspaceId>>;

    /// Raise and focus a window
    fn activate_window(&mut self, id: WindowId, time: u32) -> Result<()>;

    /// Politely ask a window to close. The window may ignore the request.
    fn close_window(&mut self, id: WindowId, time: u32) -> Result<()>;

    /// Active outputs; exactly one should be flagged primary
    fn monitors(&mut self) -> Result<Vec<Monitor>>;

    /// The output under the pointer, if the compositor can tell
    fn monitor_at_pointer(&mut self) -> Result<Option<Monitor>>;

    /// Resolve a key press against the compositor's binding table
    fn keybinding_action(&self, keysym: &str, state: ModifierMask) -> Option<Binding>;

    /// Icon name of the window's application, if one can be resolved
    fn app_icon(&mut self, window: &WindowInfo) -> Option<String>;

    /// Current event timestamp in milliseconds
    fn current_time(&self) -> u32;

    /// Record that a window received focus (for hosts that track recency themselves)
    fn note_focus(&mut self, _id: WindowId) {}
}

/// Pick the primary output, falling back to the first one listed.
pub fn primary_monitor(monitors: &[Monitor]) -> Option<&Monitor> {
    monitors.iter().find(|m| m.primary).or_else(|| monitors.first())
}
