//! The switcher's on-screen surface.
//!
//! An `Overlay` owns the input grab and the retained widgets the session
//! drives: one root area holding window previews and one list of rows. All
//! retained elements are addressed by the `WindowId` they represent, so
//! removing an element never shifts the identity of the others.

use crate::modifiers::ModifierMask;
use crate::preview::Preview;
use crate::selector_list::ListEntry;
use crate::window::{Rect, Size, WindowId};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GrabMode {
    PointerAndKeyboard,
    /// Used when another client already holds the pointer
    KeyboardOnly,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RowStyle {
    pub focus: bool,
    pub hover: bool,
}

pub trait Overlay {
    /// Acquire exclusive input. Returns false if the grab was refused.
    fn push_modal(&mut self, mode: GrabMode) -> bool;

    fn pop_modal(&mut self);

    /// Modifiers held right now, queried from the input device rather than
    /// taken from the last event. `None` until the compositor has told us.
    fn modifier_state(&self) -> Option<ModifierMask>;

    fn stage_size(&self) -> Size;

    fn set_stage_size(&mut self, size: Size);

    /// Place the root overlay over `area` and make it visible
    fn show_root(&mut self, area: Rect);

    fn remove_root(&mut self);

    fn add_preview(&mut self, preview: &Preview);

    fn set_preview_shown(&mut self, window: WindowId, shown: bool, opacity: u8);

    fn remove_preview(&mut self, window: WindowId);

    fn add_list_row(&mut self, entry: &ListEntry);

    fn set_row_style(&mut self, window: WindowId, style: RowStyle);

    fn remove_list_row(&mut self, window: WindowId);

    /// Lay out the list centered within `area` and make it visible
    fn show_list(&mut self, area: Rect);

    fn remove_list(&mut self);
}
