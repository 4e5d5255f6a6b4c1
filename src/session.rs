//! One run of the switcher, from input grab to teardown.
//!
//! A session keeps three index-aligned collections: the candidate windows,
//! their previews and their list rows. Every cursor move re-renders the
//! previews and the list before the next event is handled. Whatever ends the
//! session, `finish` runs exactly once and at most one window is activated.

use std::time::Duration;
use tracing::{debug, info, warn};

use crate::candidates::Candidates;
use crate::compositor::{Compositor, primary_monitor};
use crate::events::{ScrollDirection, SessionEvent};
use crate::keybindings::Binding;
use crate::modifiers::ModifierMask;
use crate::overlay::{GrabMode, Overlay};
use crate::preview::PreviewLayer;
use crate::selector_list::SelectorList;
use crate::settings::SwitcherSettings;
use crate::timers::{Scheduler, SessionId, SessionTimer, TimerHandle};
use crate::window::{Monitor, Rect, Size, WindowId, WindowInfo};

/// Grace period before a closed window is dropped from the session
pub const CHECK_DESTROYED_TIMEOUT: Duration = Duration::from_millis(100);
/// Pointer hover is ignored for this long after the list appears
pub const HOVER_SETTLE_DELAY: Duration = Duration::from_millis(500);

const CANCEL_KEY: &str = "Escape";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Idle,
    Active,
    Destroyed,
}

/// The collaborators a session talks to while handling an event.
pub struct SessionHost<'a> {
    pub compositor: &'a mut dyn Compositor,
    pub overlay: &'a mut dyn Overlay,
    pub scheduler: &'a mut dyn Scheduler,
}

pub struct Session {
    id: SessionId,
    state: SessionState,
    candidates: Candidates,
    mask: ModifierMask,
    settings: SwitcherSettings,
    previews: PreviewLayer,
    list: SelectorList,
    monitor: Option<Monitor>,
    have_modal: bool,
    saved_stage: Option<Size>,
    hover_enabled: bool,
    hover_timer: Option<TimerHandle>,
    close_checks: Vec<(WindowId, TimerHandle)>,
    time: u32,
    activated: Option<WindowId>,
}

impl Session {
    /// Start a session over `windows`.
    ///
    /// The returned session may already be finished: when no grab can be
    /// acquired, or the triggering modifier was released before the grab
    /// landed, the initially selected window is activated right away.
    pub fn start(
        id: SessionId,
        windows: Vec<WindowInfo>,
        mask: ModifierMask,
        settings: SwitcherSettings,
        host: &mut SessionHost<'_>,
    ) -> Session {
        let focused = host.compositor.focus_window().unwrap_or_else(|e| {
            warn!("Failed to query focused window: {:#}", e);
            None
        });

        let mut session = Session {
            id,
            state: SessionState::Idle,
            candidates: Candidates::new(windows, focused),
            mask: mask.primary(),
            settings,
            previews: PreviewLayer::empty(),
            list: SelectorList::empty(),
            monitor: None,
            have_modal: false,
            saved_stage: None,
            hover_enabled: false,
            hover_timer: None,
            close_checks: Vec::new(),
            time: host.compositor.current_time(),
            activated: None,
        };

        info!(
            "Starting session {:?} with {} windows, mask {}, cursor {}",
            id,
            session.candidates.len(),
            session.mask,
            session.candidates.cursor()
        );

        if session.candidates.is_empty() {
            warn!("Session {:?} started without candidates", id);
            session.finish(host);
            return session;
        }

        // Someone else may hold the pointer; a keyboard grab is enough to switch.
        let granted = host.overlay.push_modal(GrabMode::PointerAndKeyboard)
            || host.overlay.push_modal(GrabMode::KeyboardOnly);
        if !granted {
            warn!("Could not grab input, activating without showing the switcher");
            session.activate_selected(host);
            return session;
        }

        session.have_modal = true;
        session.state = SessionState::Active;

        // The modifier may have been released before the grab took effect,
        // in which case its release event went to someone else.
        if session.modifier_released(host) {
            debug!("Modifier released before grab completed");
            session.activate_selected(host);
            return session;
        }

        session.show(host);
        session
    }

    pub fn id(&self) -> SessionId {
        self.id
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn is_active(&self) -> bool {
        self.state == SessionState::Active
    }

    pub fn cursor(&self) -> usize {
        self.candidates.cursor()
    }

    pub fn windows(&self) -> &[WindowInfo] {
        self.candidates.windows()
    }

    pub fn previews(&self) -> &PreviewLayer {
        &self.previews
    }

    pub fn list(&self) -> &SelectorList {
        &self.list
    }

    pub fn monitor(&self) -> Option<&Monitor> {
        self.monitor.as_ref()
    }

    /// The window this session activated, if any
    pub fn activated(&self) -> Option<WindowId> {
        self.activated
    }

    pub fn hover_enabled(&self) -> bool {
        self.hover_enabled
    }

    fn show(&mut self, host: &mut SessionHost<'_>) {
        let monitors = host.compositor.monitors().unwrap_or_else(|e| {
            warn!("Failed to query monitors: {:#}", e);
            Vec::new()
        });
        let monitor = self.active_monitor(&monitors, host);

        if monitors.len() > 1 {
            self.enable_monitor_fix(&monitor, host.overlay);
        }

        host.overlay.show_root(monitor.rect);

        let active_workspace = host.compositor.active_workspace().unwrap_or_else(|e| {
            warn!("Failed to query active workspace: {:#}", e);
            None
        });
        self.previews = PreviewLayer::build(
            self.candidates.windows(),
            &monitor,
            active_workspace.as_ref(),
            self.settings.draw_borders,
            host.overlay,
        );
        self.list = SelectorList::build(
            self.candidates.windows(),
            monitor.rect,
            host.compositor,
            host.overlay,
        );

        self.hover_enabled = false;
        if let Some(handle) = self.hover_timer.take() {
            host.scheduler.cancel(handle);
        }
        self.hover_timer = Some(host.scheduler.schedule(
            self.id,
            HOVER_SETTLE_DELAY,
            SessionTimer::HoverSettle,
        ));

        debug!("Showing switcher on {}", monitor.name);
        self.monitor = Some(monitor);
        self.next(host);
    }

    /// The primary monitor, unless the user allows following the pointer.
    fn active_monitor(&self, monitors: &[Monitor], host: &mut SessionHost<'_>) -> Monitor {
        if !self.settings.enforce_primary_monitor {
            match host.compositor.monitor_at_pointer() {
                Ok(Some(monitor)) => return monitor,
                Ok(None) => debug!("No monitor under pointer, using primary"),
                Err(e) => debug!("Monitor lookup failed, using primary: {:#}", e),
            }
        }

        primary_monitor(monitors).cloned().unwrap_or_else(|| {
            let stage = host.overlay.stage_size();
            Monitor {
                name: String::new(),
                rect: Rect::new(0, 0, stage.width, stage.height),
                primary: true,
            }
        })
    }

    /// Widen the canvas so it is symmetric around the active monitor's center.
    fn enable_monitor_fix(&mut self, monitor: &Monitor, overlay: &mut dyn Overlay) {
        let old = overlay.stage_size();
        let (cx, cy) = monitor.rect.center();
        let widened = Size {
            width: 2 * cx,
            height: 2 * cy,
        };
        debug!("Widening canvas from {:?} to {:?}", old, widened);
        overlay.set_stage_size(widened);
        self.saved_stage = Some(old);
    }

    fn disable_monitor_fix(&mut self, overlay: &mut dyn Overlay) {
        if let Some(size) = self.saved_stage.take() {
            overlay.set_stage_size(size);
        }
    }

    fn update_current(&mut self, host: &mut SessionHost<'_>) {
        let cursor = self.candidates.cursor();
        self.previews.show(cursor, host.overlay);
        self.list.focus(cursor, host.overlay);

        if let Some(window) = self.candidates.current() {
            debug!("Selected {}: {:?}", cursor, window.title);
        }
    }

    pub fn next(&mut self, host: &mut SessionHost<'_>) {
        self.candidates.next();
        self.update_current(host);
    }

    pub fn previous(&mut self, host: &mut SessionHost<'_>) {
        self.candidates.previous();
        self.update_current(host);
    }

    /// Feed one event through the state machine. Events outside the active
    /// state are swallowed.
    pub fn handle(&mut self, event: SessionEvent, host: &mut SessionHost<'_>) {
        if self.state != SessionState::Active {
            debug!("Session {:?} is {:?}, ignoring {:?}", self.id, self.state, event);
            return;
        }

        match event {
            SessionEvent::KeyPress {
                keysym,
                state,
                time,
            } => {
                self.time = time;
                self.key_press(&keysym, state, host);
            }
            SessionEvent::KeyRelease { time } => {
                self.time = time;
                if self.modifier_released(host) {
                    self.activate_selected(host);
                }
            }
            SessionEvent::BindingRepeat { binding, state } => {
                self.binding_action(binding, state, host);
            }
            SessionEvent::Scroll { direction, time } => {
                self.time = time;
                match direction {
                    ScrollDirection::Up => self.previous(host),
                    ScrollDirection::Down => self.next(host),
                    _ => {}
                }
            }
            SessionEvent::PointerEnter(window) => {
                if self.hover_enabled {
                    self.list.set_hover(window, true, host.overlay);
                }
            }
            SessionEvent::PointerLeave(window) => {
                self.list.set_hover(window, false, host.overlay);
            }
            SessionEvent::PointerClick { window, time } => {
                self.time = time;
                if let Some(index) = self.candidates.position(window) {
                    self.candidates.set_cursor(index);
                    self.activate_selected(host);
                }
            }
            SessionEvent::WindowDestroyed(window) => {
                self.remove_window(window, host);
            }
            SessionEvent::WindowMapped(window) => {
                debug!("Window {} mapped, activation settled", window);
                self.finish(host);
            }
            SessionEvent::TimerFired { handle, timer } => self.timer_fired(handle, timer, host),
        }
    }

    fn key_press(&mut self, keysym: &str, state: ModifierMask, host: &mut SessionHost<'_>) {
        match keysym {
            CANCEL_KEY => {
                self.candidates.set_cursor(0);
                self.activate_selected(host);
            }
            "q" | "Q" => self.close_selected(host),
            "Up" => self.previous(host),
            "Down" => self.next(host),
            _ => match host.compositor.keybinding_action(keysym, state) {
                Some(binding) => self.binding_action(binding, state, host),
                None => debug!("Swallowing key {}", keysym),
            },
        }
    }

    /// Unknown modifier state counts as still held.
    fn modifier_released(&self, host: &SessionHost<'_>) -> bool {
        host.overlay
            .modifier_state()
            .is_some_and(|state| !state.intersects(self.mask))
    }

    fn binding_action(&mut self, binding: Binding, state: ModifierMask, host: &mut SessionHost<'_>) {
        if binding.is_backward() || state.contains(ModifierMask::SHIFT) {
            self.previous(host);
        } else {
            self.next(host);
        }
    }

    fn timer_fired(&mut self, handle: TimerHandle, timer: SessionTimer, host: &mut SessionHost<'_>) {
        match timer {
            SessionTimer::HoverSettle if self.hover_timer == Some(handle) => {
                self.hover_timer = None;
                self.hover_enabled = true;
            }
            SessionTimer::CheckDestroyed(window) => {
                let Some(pos) = self.close_checks.iter().position(|(_, h)| *h == handle) else {
                    debug!("Stale close check for {}", window);
                    return;
                };
                self.close_checks.remove(pos);
                self.check_destroyed(window, host);
            }
            _ => debug!("Stale timer {:?}", timer),
        }
    }

    /// Ask the selected window to close and check back shortly.
    fn close_selected(&mut self, host: &mut SessionHost<'_>) {
        let Some(window) = self.candidates.current().map(|w| w.id) else {
            return;
        };

        info!("Requesting close of window {}", window);
        if let Err(e) = host.compositor.close_window(window, self.time) {
            warn!("Failed to close window {}: {:#}", window, e);
        }

        let handle = host.scheduler.schedule(
            self.id,
            CHECK_DESTROYED_TIMEOUT,
            SessionTimer::CheckDestroyed(window),
        );
        self.close_checks.push((window, handle));
    }

    /// Drop a closed window even if its destroy event never arrived.
    fn check_destroyed(&mut self, window: WindowId, host: &mut SessionHost<'_>) {
        if self.candidates.position(window).is_none() {
            return;
        }

        debug!("Window {} still listed after close request, dropping it", window);
        self.remove_window(window, host);
    }

    fn remove_window(&mut self, window: WindowId, host: &mut SessionHost<'_>) {
        let Some(index) = self.candidates.position(window) else {
            return;
        };

        for (_, handle) in self.close_checks.iter().filter(|(w, _)| *w == window) {
            host.scheduler.cancel(*handle);
        }
        self.close_checks.retain(|(w, _)| *w != window);

        if self.candidates.len() == 1 {
            info!("Last candidate {} went away, closing switcher", window);
            self.finish(host);
            return;
        }

        debug!("Removing window {} at index {}", window, index);
        self.candidates.remove(index);
        self.previews.remove(index, host.overlay);
        self.list.remove(index, host.overlay);
        self.update_current(host);
    }

    fn activate_selected(&mut self, host: &mut SessionHost<'_>) {
        if self.state == SessionState::Destroyed {
            return;
        }

        if let Some(window) = self.candidates.current().map(|w| w.id) {
            info!("Activating window {}", window);
            if let Err(e) = host.compositor.activate_window(window, self.time) {
                warn!("Failed to activate window {}: {:#}", window, e);
            }
            self.activated = Some(window);
        }

        self.finish(host);
    }

    /// Tear everything down. Only the first call has any effect.
    pub fn finish(&mut self, host: &mut SessionHost<'_>) {
        if self.state == SessionState::Destroyed {
            return;
        }

        self.previews.clear(host.overlay);
        self.list.clear();
        host.overlay.remove_list();
        host.overlay.remove_root();
        self.disable_monitor_fix(host.overlay);

        if self.have_modal {
            host.overlay.pop_modal();
            self.have_modal = false;
        }

        if let Some(handle) = self.hover_timer.take() {
            host.scheduler.cancel(handle);
        }
        for (_, handle) in self.close_checks.drain(..) {
            host.scheduler.cancel(handle);
        }
        self.hover_enabled = false;

        self.candidates.clear();
        self.state = SessionState::Destroyed;
        info!("Session {:?} finished, activated: {:?}", self.id, self.activated);
    }
}
