//! Sway implementation of the compositor interface.
//!
//! Windows are the view containers of the Sway tree. Sway keeps no
//! interaction timestamps, so recency comes from focus events counted by a
//! `FocusClock`. Hidden scratchpad windows stand in for minimized ones.

use anyhow::{Context, Result};
use std::collections::HashMap;
use std::time::Instant;
use swayipc::{Connection, Node, NodeType};
use tracing::{debug, info, warn};

use crate::compositor::Compositor;
use crate::icon_resolver::IconResolver;
use crate::keybindings::{Binding, KeyBindingTable};
use crate::modifiers::ModifierMask;
use crate::window::{Monitor, Rect, Thumbnail, WindowId, WindowInfo, WorkspaceId};

const SCRATCHPAD_WORKSPACE: &str = "__i3_scratch";
/// Windows carrying this mark are left out of the switcher
pub const SKIP_MARK: &str = "alttab-skip";

/// Monotonic focus counter standing in for per-window interaction times.
#[derive(Debug, Default)]
pub struct FocusClock {
    tick: u64,
    stamps: HashMap<WindowId, u64>,
}

impl FocusClock {
    /// Record that `id` was just focused
    pub fn touch(&mut self, id: WindowId) {
        self.tick += 1;
        self.stamps.insert(id, self.tick);
    }

    /// Focus stamp of a window; never-focused windows are oldest
    pub fn stamp(&self, id: WindowId) -> u64 {
        self.stamps.get(&id).copied().unwrap_or(0)
    }

    /// Make sure `id` is the most recent window, e.g. when focus changed
    /// before we were listening.
    pub fn ensure_latest(&mut self, id: WindowId) {
        if self.stamp(id) != self.tick || self.tick == 0 {
            self.touch(id);
        }
    }

    /// Drop stamps of windows that no longer exist
    pub fn retain(&mut self, live: &[WindowInfo]) {
        self.stamps.retain(|id, _| live.iter().any(|w| w.id == *id));
    }
}

/// Where a window sits in the tree
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Placement {
    workspace: Option<WorkspaceId>,
    scratchpad: bool,
}

impl Placement {
    const ROOT: Placement = Placement {
        workspace: None,
        scratchpad: false,
    };

    fn for_workspace(id: i64, name: Option<&str>) -> Placement {
        if name == Some(SCRATCHPAD_WORKSPACE) {
            Placement {
                workspace: None,
                scratchpad: true,
            }
        } else {
            Placement {
                workspace: Some(WorkspaceId(id)),
                scratchpad: false,
            }
        }
    }
}

/// Real implementation using swayipc
pub struct RealSwayClient {
    connection: Connection,
    clock: FocusClock,
    keybindings: KeyBindingTable,
    icons: IconResolver,
    started: Instant,
}

impl RealSwayClient {
    /// Create a new connection to Sway
    pub fn new() -> Result<Self> {
        let mut connection = Connection::new().context("Failed to connect to Sway")?;

        let keybindings = match connection.get_config() {
            Ok(config) => KeyBindingTable::from_sway_config(&config.config),
            Err(e) => {
                warn!("Failed to read Sway config, using default bindings: {}", e);
                KeyBindingTable::defaults()
            }
        };
        info!("Loaded {} switcher key bindings", keybindings.len());

        Ok(RealSwayClient {
            connection,
            clock: FocusClock::default(),
            keybindings,
            icons: IconResolver::new(),
            started: Instant::now(),
        })
    }

    fn run_command(&mut self, command: String) -> Result<()> {
        debug!("Sway command: {}", command);
        for outcome in self.connection.run_command(&command)? {
            outcome.with_context(|| format!("Sway rejected '{}'", command))?;
        }
        Ok(())
    }

    fn outputs(&mut self) -> Result<Vec<Monitor>> {
        let mut monitors: Vec<Monitor> = self
            .connection
            .get_outputs()?
            .into_iter()
            .filter(|o| o.active)
            .map(|o| Monitor {
                name: o.name,
                rect: Rect::new(o.rect.x, o.rect.y, o.rect.width, o.rect.height),
                primary: false,
            })
            .collect();
        mark_primary(&mut monitors);
        Ok(monitors)
    }
}

impl Compositor for RealSwayClient {
    fn windows(&mut self) -> Result<Vec<WindowInfo>> {
        let tree = self.connection.get_tree()?;

        if let Some(focused) = find_focused_window(&tree) {
            self.clock.ensure_latest(WindowId(focused));
        }

        let mut windows = collect_windows(&tree, Placement::ROOT);
        for window in &mut windows {
            window.user_time = self.clock.stamp(window.id);
        }
        self.clock.retain(&windows);

        debug!("Sway reports {} windows", windows.len());
        Ok(windows)
    }

    fn focus_window(&mut self) -> Result<Option<WindowId>> {
        let tree = self.connection.get_tree()?;
        Ok(find_focused_window(&tree).map(WindowId))
    }

    fn active_workspace(&mut self) -> Result<Option<WorkspaceId>> {
        let workspaces = self.connection.get_workspaces()?;
        Ok(workspaces
            .iter()
            .find(|w| w.focused)
            .map(|w| WorkspaceId(w.id)))
    }

    fn activate_window(&mut self, id: WindowId, _time: u32) -> Result<()> {
        self.run_command(format!("[con_id={}] focus", id))?;
        self.clock.touch(id);
        Ok(())
    }

    fn close_window(&mut self, id: WindowId, _time: u32) -> Result<()> {
        self.run_command(format!("[con_id={}] kill", id))
    }

    fn monitors(&mut self) -> Result<Vec<Monitor>> {
        self.outputs()
    }

    /// Sway does not expose the pointer position, so this is the output of
    /// the focused workspace.
    fn monitor_at_pointer(&mut self) -> Result<Option<Monitor>> {
        let workspaces = self.connection.get_workspaces()?;
        let Some(output) = workspaces.into_iter().find(|w| w.focused).map(|w| w.output) else {
            return Ok(None);
        };

        Ok(self.outputs()?.into_iter().find(|m| m.name == output))
    }

    fn keybinding_action(&self, keysym: &str, state: ModifierMask) -> Option<Binding> {
        self.keybindings.lookup(keysym, state)
    }

    fn app_icon(&mut self, window: &WindowInfo) -> Option<String> {
        self.icons.resolve(window)
    }

    fn current_time(&self) -> u32 {
        // Wraps after ~49 days, like X server time
        self.started.elapsed().as_millis() as u32
    }

    fn note_focus(&mut self, id: WindowId) {
        self.clock.touch(id);
    }
}

/// Flag the output at the origin as primary, or the first one if none is there.
fn mark_primary(monitors: &mut [Monitor]) {
    let index = monitors
        .iter()
        .position(|m| m.rect.x == 0 && m.rect.y == 0)
        .unwrap_or(0);
    for (i, monitor) in monitors.iter_mut().enumerate() {
        monitor.primary = i == index;
    }
}

/// Views have a pid, plain containers don't
fn is_view(node: &Node) -> bool {
    matches!(node.node_type, NodeType::Con | NodeType::FloatingCon) && node.pid.is_some()
}

fn window_from_node(node: &Node, placement: Placement) -> WindowInfo {
    // WM_CLASS for X11/XWayland windows
    let window_class = node
        .window_properties
        .as_ref()
        .and_then(|props| props.class.clone());
    let frame = Rect::new(node.rect.x, node.rect.y, node.rect.width, node.rect.height);

    WindowInfo {
        id: WindowId(node.id),
        app_id: node.app_id.clone(),
        title: node.name.clone().unwrap_or_default(),
        workspace: placement.workspace,
        window_class,
        skip_taskbar: node.marks.iter().any(|m| m == SKIP_MARK),
        minimized: placement.scratchpad,
        on_all_workspaces: node.sticky,
        user_time: 0,
        frame,
        thumbnail: (!frame.is_empty()).then_some(Thumbnail {
            width: frame.width,
            height: frame.height,
        }),
    }
}

/// Recursively collect all windows from a Sway node tree.
#[must_use]
fn collect_windows(node: &Node, placement: Placement) -> Vec<WindowInfo> {
    let placement = if node.node_type == NodeType::Workspace {
        Placement::for_workspace(node.id, node.name.as_deref())
    } else {
        placement
    };

    let mut windows = Vec::new();
    if is_view(node) {
        windows.push(window_from_node(node, placement));
    }

    for child in node.nodes.iter().chain(&node.floating_nodes) {
        windows.extend(collect_windows(child, placement));
    }

    windows
}

/// Find the currently focused window in a Sway node tree.
#[must_use]
fn find_focused_window(node: &Node) -> Option<i64> {
    if node.focused && is_view(node) {
        return Some(node.id);
    }

    node.nodes
        .iter()
        .chain(&node.floating_nodes)
        .find_map(find_focused_window)
}
