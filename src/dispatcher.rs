//! Turns a fired switcher binding into the candidate list for a new session.

use anyhow::Result;
use tracing::{debug, info};

use crate::compositor::Compositor;
use crate::keybindings::Binding;
use crate::settings::SwitcherSettings;
use crate::window::{WindowId, WindowInfo, WorkspaceId};

#[derive(Debug)]
pub enum Dispatch {
    /// Start a session over these windows, most recently used first
    Start(Vec<WindowInfo>),
    /// Nothing to switch to
    NoCandidates,
    /// The binding's feature toggle is off
    Disabled,
}

/// Filter and order the windows a binding should switch between.
///
/// Group bindings keep the windows sharing the focused window's class (or the
/// first window's class when nothing is focused) across all workspaces. A
/// focused window that was not enumerated selects nothing. Every other
/// binding keeps the windows of the active workspace. Windows that skip the
/// taskbar are always dropped. Ties on the interaction time keep
/// enumeration order.
#[must_use]
pub fn select_candidates(
    windows: Vec<WindowInfo>,
    binding: Binding,
    focused: Option<WindowId>,
    active_workspace: Option<WorkspaceId>,
) -> Vec<WindowInfo> {
    let mut selected: Vec<WindowInfo> = if binding.is_group() {
        // A focused window outside the enumeration has no class we can match
        let reference = match focused {
            Some(id) => windows.iter().find(|w| w.id == id),
            None => windows.first(),
        };
        let Some(class) = reference.map(|w| w.wm_class().map(str::to_owned)) else {
            debug!("No reference window for group switching");
            return Vec::new();
        };

        windows
            .into_iter()
            .filter(|w| !w.skip_taskbar && w.wm_class() == class.as_deref())
            .collect()
    } else {
        windows
            .into_iter()
            .filter(|w| !w.skip_taskbar && active_workspace.is_some() && w.workspace == active_workspace)
            .collect()
    };

    selected.sort_by(|a, b| b.user_time.cmp(&a.user_time));
    selected
}

/// Gather the current window set from the compositor and select candidates.
pub fn dispatch(
    binding: Binding,
    settings: &SwitcherSettings,
    compositor: &mut dyn Compositor,
) -> Result<Dispatch> {
    if !settings.binding_enabled(binding) {
        debug!("Binding {} is disabled", binding);
        return Ok(Dispatch::Disabled);
    }

    let windows = compositor.windows()?;
    let focused = compositor.focus_window()?;
    let active_workspace = compositor.active_workspace()?;
    let total = windows.len();

    let candidates = select_candidates(windows, binding, focused, active_workspace);
    info!(
        "Binding {}: {} of {} windows are candidates",
        binding,
        candidates.len(),
        total
    );

    if candidates.is_empty() {
        Ok(Dispatch::NoCandidates)
    } else {
        Ok(Dispatch::Start(candidates))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{MockCompositor, make_window};

    fn window(id: i64, class: &str, workspace: i64, user_time: u64) -> WindowInfo {
        let mut window = make_window(id, &format!("w{}", id));
        window.window_class = Some(class.to_string());
        window.workspace = Some(WorkspaceId(workspace));
        window.user_time = user_time;
        window
    }

    fn ids(windows: &[WindowInfo]) -> Vec<i64> {
        windows.iter().map(|w| w.id.0).collect()
    }

    #[test]
    fn test_group_filter_by_focused_class() {
        let windows = vec![
            window(1, "X", 0, 10),
            window(2, "Y", 0, 30),
            window(3, "X", 1, 20),
        ];

        let selected = select_candidates(windows, Binding::SwitchGroup, Some(WindowId(1)), Some(WorkspaceId(0)));
        assert_eq!(ids(&selected), vec![3, 1]);
    }

    #[test]
    fn test_group_backward_is_group() {
        let windows = vec![window(1, "X", 0, 10), window(2, "Y", 0, 30)];
        let selected = select_candidates(
            windows,
            Binding::SwitchGroupBackward,
            Some(WindowId(2)),
            Some(WorkspaceId(0)),
        );
        assert_eq!(ids(&selected), vec![2]);
    }

    #[test]
    fn test_group_without_focus_uses_first_window() {
        let windows = vec![
            window(1, "Y", 0, 1),
            window(2, "X", 0, 2),
            window(3, "Y", 1, 3),
        ];
        let selected = select_candidates(windows, Binding::SwitchGroup, None, Some(WorkspaceId(0)));
        assert_eq!(ids(&selected), vec![3, 1]);
    }

    #[test]
    fn test_group_with_unlisted_focus_selects_nothing() {
        let windows = vec![window(1, "Y", 0, 1), window(2, "Y", 0, 2)];
        let selected = select_candidates(windows, Binding::SwitchGroup, Some(WindowId(7)), Some(WorkspaceId(0)));
        assert!(selected.is_empty());
    }

    #[test]
    fn test_group_with_skipped_focus_uses_its_class() {
        let mut focused = window(1, "X", 0, 90);
        focused.skip_taskbar = true;
        let windows = vec![window(2, "Y", 0, 50), focused, window(3, "X", 1, 10)];
        let selected = select_candidates(windows, Binding::SwitchGroup, Some(WindowId(1)), Some(WorkspaceId(0)));
        assert_eq!(ids(&selected), vec![3]);
    }

    #[test]
    fn test_group_excludes_skip_taskbar() {
        let mut skipped = window(3, "X", 0, 50);
        skipped.skip_taskbar = true;
        let windows = vec![window(1, "X", 0, 10), skipped];
        let selected = select_candidates(windows, Binding::SwitchGroup, Some(WindowId(1)), None);
        assert_eq!(ids(&selected), vec![1]);
    }

    #[test]
    fn test_workspace_filter() {
        let mut skipped = window(4, "Z", 0, 99);
        skipped.skip_taskbar = true;
        let windows = vec![
            window(1, "X", 0, 5),
            window(2, "Y", 1, 50),
            window(3, "X", 0, 7),
            skipped,
        ];

        let selected = select_candidates(
            windows,
            Binding::SwitchApplications,
            Some(WindowId(1)),
            Some(WorkspaceId(0)),
        );
        assert_eq!(ids(&selected), vec![3, 1]);
    }

    #[test]
    fn test_workspace_filter_without_active_workspace() {
        let windows = vec![window(1, "X", 0, 5)];
        let selected = select_candidates(windows, Binding::SwitchApplications, None, None);
        assert!(selected.is_empty());
    }

    #[test]
    fn test_ties_keep_enumeration_order() {
        let windows = vec![
            window(1, "X", 0, 5),
            window(2, "X", 0, 5),
            window(3, "X", 0, 9),
        ];
        let selected = select_candidates(windows, Binding::SwitchApplications, None, Some(WorkspaceId(0)));
        assert_eq!(ids(&selected), vec![3, 1, 2]);
    }

    #[test]
    fn test_empty_input() {
        assert!(select_candidates(vec![], Binding::SwitchGroup, None, None).is_empty());
    }

    #[test]
    fn test_dispatch_outcomes() {
        let mut compositor = MockCompositor::new(vec![window(1, "X", 0, 1), window(2, "X", 1, 2)]);
        compositor.workspace = Some(WorkspaceId(1));
        let settings = SwitcherSettings::default();

        match dispatch(Binding::SwitchApplications, &settings, &mut compositor).unwrap() {
            Dispatch::Start(windows) => assert_eq!(ids(&windows), vec![2]),
            other => panic!("unexpected {:?}", other),
        }

        compositor.workspace = Some(WorkspaceId(7));
        assert!(matches!(
            dispatch(Binding::SwitchApplications, &settings, &mut compositor).unwrap(),
            Dispatch::NoCandidates
        ));

        let disabled = SwitcherSettings {
            switch_group: false,
            ..SwitcherSettings::default()
        };
        assert!(matches!(
            dispatch(Binding::SwitchGroup, &disabled, &mut compositor).unwrap(),
            Dispatch::Disabled
        ));
    }
}
