//! Test doubles for the compositor, overlay, scheduler and settings backend.

use anyhow::Result;
use std::collections::HashMap;
use std::time::Duration;

use crate::compositor::Compositor;
use crate::keybindings::{Binding, KeyBindingTable};
use crate::modifiers::ModifierMask;
use crate::overlay::{GrabMode, Overlay, RowStyle};
use crate::preview::Preview;
use crate::selector_list::ListEntry;
use crate::settings::{SettingValue, SettingsBackend};
use crate::timers::{Scheduler, SessionId, SessionTimer, TimerHandle};
use crate::window::{Monitor, Rect, Size, WindowId, WindowInfo, WorkspaceId};

pub fn make_window(id: i64, title: &str) -> WindowInfo {
    WindowInfo {
        id: WindowId(id),
        app_id: Some(format!("app-{}", id)),
        title: title.to_string(),
        workspace: Some(WorkspaceId(0)),
        window_class: None,
        skip_taskbar: false,
        minimized: false,
        on_all_workspaces: false,
        user_time: 0,
        frame: Rect::new(0, 0, 800, 600),
        thumbnail: None,
    }
}

pub struct MockCompositor {
    pub windows: Vec<WindowInfo>,
    pub focused: Option<WindowId>,
    pub workspace: Option<WorkspaceId>,
    pub monitors: Vec<Monitor>,
    pub pointer_monitor: Option<Monitor>,
    pub keybindings: KeyBindingTable,
    pub icons: HashMap<WindowId, String>,
    pub time: u32,
    pub activated: Vec<(WindowId, u32)>,
    pub closed: Vec<WindowId>,
    pub focus_notes: Vec<WindowId>,
}

impl MockCompositor {
    pub fn new(windows: Vec<WindowInfo>) -> Self {
        MockCompositor {
            windows,
            focused: None,
            workspace: Some(WorkspaceId(0)),
            monitors: vec![Monitor {
                name: "eDP-1".to_string(),
                rect: Rect::new(0, 0, 1920, 1080),
                primary: true,
            }],
            pointer_monitor: None,
            keybindings: KeyBindingTable::defaults(),
            icons: HashMap::new(),
            time: 1,
            activated: Vec::new(),
            closed: Vec::new(),
            focus_notes: Vec::new(),
        }
    }

    pub fn activated_ids(&self) -> Vec<WindowId> {
        self.activated.iter().map(|(id, _)| *id).collect()
    }
}

impl Compositor for MockCompositor {
    fn windows(&mut self) -> Result<Vec<WindowInfo>> {
        Ok(self.windows.clone())
    }

    fn focus_window(&mut self) -> Result<Option<WindowId>> {
        Ok(self.focused)
    }

    fn active_workspace(&mut self) -> Result<Option<WorkspaceId>> {
        Ok(self.workspace)
    }

    fn activate_window(&mut self, id: WindowId, time: u32) -> Result<()> {
        self.activated.push((id, time));
        Ok(())
    }

    fn close_window(&mut self, id: WindowId, _time: u32) -> Result<()> {
        self.closed.push(id);
        Ok(())
    }

    fn monitors(&mut self) -> Result<Vec<Monitor>> {
        Ok(self.monitors.clone())
    }

    fn monitor_at_pointer(&mut self) -> Result<Option<Monitor>> {
        Ok(self.pointer_monitor.clone())
    }

    fn keybinding_action(&self, keysym: &str, state: ModifierMask) -> Option<Binding> {
        self.keybindings.lookup(keysym, state)
    }

    fn app_icon(&mut self, window: &WindowInfo) -> Option<String> {
        self.icons.get(&window.id).cloned()
    }

    fn current_time(&self) -> u32 {
        self.time
    }

    fn note_focus(&mut self, id: WindowId) {
        self.focus_notes.push(id);
    }
}

#[derive(Debug, Clone)]
pub struct PreviewState {
    pub preview: Preview,
    pub shown: bool,
    pub opacity: u8,
}

/// Overlay that records what would be on screen.
#[derive(Default)]
pub struct RecordingOverlay {
    /// Grab modes that will be refused
    pub refuse: Vec<GrabMode>,
    pub grabs: Vec<GrabMode>,
    pub pops: usize,
    pub modifiers: Option<ModifierMask>,
    pub stage: Size,
    pub stage_history: Vec<Size>,
    pub root: Option<Rect>,
    pub shown_roots: Vec<Rect>,
    pub root_removals: usize,
    pub previews: HashMap<WindowId, PreviewState>,
    pub rows: Vec<(ListEntry, RowStyle)>,
    pub list: Option<Rect>,
}

impl RecordingOverlay {
    pub fn shown_previews(&self) -> Vec<WindowId> {
        let mut ids: Vec<WindowId> = self
            .previews
            .iter()
            .filter(|(_, p)| p.shown)
            .map(|(id, _)| *id)
            .collect();
        ids.sort();
        ids
    }

    pub fn row_ids(&self) -> Vec<WindowId> {
        self.rows.iter().map(|(e, _)| e.window).collect()
    }

    pub fn focused_rows(&self) -> Vec<WindowId> {
        self.rows
            .iter()
            .filter(|(_, s)| s.focus)
            .map(|(e, _)| e.window)
            .collect()
    }

    pub fn row_style(&self, window: WindowId) -> Option<RowStyle> {
        self.rows
            .iter()
            .find(|(e, _)| e.window == window)
            .map(|(_, s)| *s)
    }
}

impl Overlay for RecordingOverlay {
    fn push_modal(&mut self, mode: GrabMode) -> bool {
        self.grabs.push(mode);
        !self.refuse.contains(&mode)
    }

    fn pop_modal(&mut self) {
        self.pops += 1;
    }

    fn modifier_state(&self) -> Option<ModifierMask> {
        self.modifiers
    }

    fn stage_size(&self) -> Size {
        self.stage
    }

    fn set_stage_size(&mut self, size: Size) {
        self.stage = size;
        self.stage_history.push(size);
    }

    fn show_root(&mut self, area: Rect) {
        self.root = Some(area);
        self.shown_roots.push(area);
    }

    fn remove_root(&mut self) {
        self.root = None;
        self.root_removals += 1;
    }

    fn add_preview(&mut self, preview: &Preview) {
        self.previews.insert(
            preview.window,
            PreviewState {
                preview: preview.clone(),
                shown: false,
                opacity: preview.opacity,
            },
        );
    }

    fn set_preview_shown(&mut self, window: WindowId, shown: bool, opacity: u8) {
        if let Some(state) = self.previews.get_mut(&window) {
            state.shown = shown;
            state.opacity = opacity;
        }
    }

    fn remove_preview(&mut self, window: WindowId) {
        self.previews.remove(&window);
    }

    fn add_list_row(&mut self, entry: &ListEntry) {
        self.rows.push((entry.clone(), RowStyle::default()));
    }

    fn set_row_style(&mut self, window: WindowId, style: RowStyle) {
        if let Some(row) = self.rows.iter_mut().find(|(e, _)| e.window == window) {
            row.1 = style;
        }
    }

    fn remove_list_row(&mut self, window: WindowId) {
        self.rows.retain(|(e, _)| e.window != window);
    }

    fn show_list(&mut self, area: Rect) {
        self.list = Some(area);
    }

    fn remove_list(&mut self) {
        self.list = None;
        self.rows.clear();
    }
}

/// Scheduler whose timers only fire when a test says so.
#[derive(Default)]
pub struct ManualScheduler {
    next: u64,
    pub pending: Vec<(SessionId, TimerHandle, Duration, SessionTimer)>,
    pub cancelled: Vec<TimerHandle>,
}

impl ManualScheduler {
    pub fn pending_handle(&self, timer: SessionTimer) -> Option<TimerHandle> {
        self.pending
            .iter()
            .find(|(_, _, _, t)| *t == timer)
            .map(|(_, h, _, _)| *h)
    }

    /// Mark a timer as fired; the caller delivers the event.
    pub fn fire(&mut self, handle: TimerHandle) {
        self.pending.retain(|(_, h, _, _)| *h != handle);
    }
}

impl Scheduler for ManualScheduler {
    fn schedule(
        &mut self,
        session: SessionId,
        delay: Duration,
        timer: SessionTimer,
    ) -> TimerHandle {
        self.next += 1;
        let handle = TimerHandle(self.next);
        self.pending.push((session, handle, delay, timer));
        handle
    }

    fn cancel(&mut self, handle: TimerHandle) {
        if self.pending.iter().any(|(_, h, _, _)| *h == handle) {
            self.cancelled.push(handle);
        }
        self.pending.retain(|(_, h, _, _)| *h != handle);
    }
}

/// In-memory settings backend.
#[derive(Default)]
pub struct MemoryBackend {
    values: Vec<(String, SettingValue)>,
    staged: Vec<String>,
    pub writes: Vec<(String, bool)>,
}

impl MemoryBackend {
    pub fn from_values(values: Vec<(&str, SettingValue)>) -> Self {
        MemoryBackend {
            values: values
                .into_iter()
                .map(|(k, v)| (k.to_string(), v))
                .collect(),
            ..Default::default()
        }
    }

    pub fn set(&mut self, key: &str, value: SettingValue) {
        match self.values.iter_mut().find(|(k, _)| k == key) {
            Some(entry) => entry.1 = value,
            None => self.values.push((key.to_string(), value)),
        }
    }

    pub fn remove(&mut self, key: &str) {
        self.values.retain(|(k, _)| k != key);
    }

    /// Change a value and report it from the next `refresh`.
    pub fn stage_change(&mut self, key: &str, value: SettingValue) {
        self.set(key, value);
        self.staged.push(key.to_string());
    }
}

impl SettingsBackend for MemoryBackend {
    fn list_keys(&self) -> Vec<String> {
        self.values.iter().map(|(k, _)| k.clone()).collect()
    }

    fn value(&self, key: &str) -> Option<SettingValue> {
        self.values
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.clone())
    }

    fn set_boolean(&mut self, key: &str, value: bool) -> Result<()> {
        self.set(key, SettingValue::Bool(value));
        self.writes.push((key.to_string(), value));
        Ok(())
    }

    fn refresh(&mut self) -> Result<Vec<String>> {
        Ok(std::mem::take(&mut self.staged))
    }
}
