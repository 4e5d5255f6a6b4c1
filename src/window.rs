use std::fmt;

/// Compositor-side identity of a window. Sway uses container ids.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct WindowId(pub i64);

impl fmt::Display for WindowId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct WorkspaceId(pub i64);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Rect {
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
}

impl Rect {
    pub fn new(x: i32, y: i32, width: i32, height: i32) -> Self {
        Rect { x, y, width, height }
    }

    pub fn is_empty(&self) -> bool {
        self.width <= 0 || self.height <= 0
    }

    pub fn center(&self) -> (i32, i32) {
        (self.x + self.width / 2, self.y + self.height / 2)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Size {
    pub width: i32,
    pub height: i32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Monitor {
    /// Output connector name, e.g. `DP-1`
    pub name: String,
    pub rect: Rect,
    pub primary: bool,
}

/// Handle to a window's live contents. Opaque to the session; only its size is read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Thumbnail {
    pub width: i32,
    pub height: i32,
}

/// A window as seen by the switcher.
///
/// Borrowed from the compositor by identity: holding a `WindowInfo` says
/// nothing about whether the window still exists.
#[derive(Debug, Clone)]
pub struct WindowInfo {
    pub id: WindowId,
    pub app_id: Option<String>,
    pub title: String,
    /// `None` for windows that are on no regular workspace (e.g. the scratchpad)
    pub workspace: Option<WorkspaceId>,
    pub window_class: Option<String>, // WM_CLASS for X11 windows
    pub skip_taskbar: bool,
    pub minimized: bool,
    pub on_all_workspaces: bool,
    /// Last-interaction timestamp; larger is more recent
    pub user_time: u64,
    /// Frame position and size in global compositor coordinates
    pub frame: Rect,
    pub thumbnail: Option<Thumbnail>,
}

impl WindowInfo {
    /// Application-class identity used for group switching.
    ///
    /// X11 windows report WM_CLASS; native Wayland windows only have an app id.
    pub fn wm_class(&self) -> Option<&str> {
        self.window_class.as_deref().or(self.app_id.as_deref())
    }

    /// Whether the window is currently drawn on the given workspace.
    pub fn is_visible_on(&self, workspace: Option<&WorkspaceId>) -> bool {
        if self.minimized {
            return false;
        }
        self.on_all_workspaces || (workspace.is_some() && self.workspace.as_ref() == workspace)
    }
}
