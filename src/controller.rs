//! Routes control events to the switcher session on the GTK main thread.

use tokio::sync::{mpsc, watch};
use tracing::{debug, error, info, warn};

use crate::compositor::Compositor;
use crate::dispatcher::{Dispatch, dispatch};
use crate::events::{ControlEvent, SessionEvent};
use crate::ipc::SwitcherStatus;
use crate::keybindings::Binding;
use crate::modifiers::ModifierMask;
use crate::overlay::Overlay;
use crate::session::{Session, SessionHost};
use crate::settings::{SettingsBackend, SettingsStore};
use crate::timers::{Scheduler, SessionId};

/// Whether the controller wants to keep receiving events
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Quit,
}

pub struct Controller<C, O, S, B>
where
    C: Compositor,
    O: Overlay,
    S: Scheduler,
    B: SettingsBackend,
{
    compositor: C,
    overlay: O,
    scheduler: S,
    settings: SettingsStore<B>,
    session: Option<Session>,
    next_session: u64,
    status: watch::Sender<SwitcherStatus>,
}

impl<C, O, S, B> Controller<C, O, S, B>
where
    C: Compositor,
    O: Overlay,
    S: Scheduler,
    B: SettingsBackend,
{
    pub fn new(
        compositor: C,
        overlay: O,
        scheduler: S,
        settings: SettingsStore<B>,
        status: watch::Sender<SwitcherStatus>,
    ) -> Self {
        Controller {
            compositor,
            overlay,
            scheduler,
            settings,
            session: None,
            next_session: 0,
            status,
        }
    }

    pub fn session(&self) -> Option<&Session> {
        self.session.as_ref()
    }

    pub fn handle(&mut self, event: ControlEvent) -> Flow {
        debug!("Control event: {:?}", event);

        let flow = match event {
            ControlEvent::Binding { binding, mask } => {
                if self.session.is_some() {
                    // The combo Sway matched is the best guess until the overlay knows
                    let state = self.overlay.modifier_state().unwrap_or(mask);
                    self.forward(SessionEvent::BindingRepeat { binding, state });
                } else {
                    self.start_session(binding, mask);
                }
                Flow::Continue
            }
            ControlEvent::Input(event) => {
                self.forward(event);
                Flow::Continue
            }
            ControlEvent::WindowFocused(id) => {
                self.compositor.note_focus(id);
                Flow::Continue
            }
            ControlEvent::WindowDestroyed(id) => {
                self.forward(SessionEvent::WindowDestroyed(id));
                Flow::Continue
            }
            ControlEvent::WindowMapped(id) => {
                self.forward(SessionEvent::WindowMapped(id));
                Flow::Continue
            }
            ControlEvent::Timer {
                session,
                handle,
                timer,
            } => {
                if self.session.as_ref().map(Session::id) == Some(session) {
                    self.forward(SessionEvent::TimerFired { handle, timer });
                } else {
                    debug!("Dropping timer {:?} of finished session {:?}", handle, session);
                }
                Flow::Continue
            }
            ControlEvent::SettingsFileChanged => {
                self.settings.refresh();
                Flow::Continue
            }
            ControlEvent::Shutdown => {
                if let Some(session) = self.session.as_mut() {
                    let mut host = SessionHost {
                        compositor: &mut self.compositor,
                        overlay: &mut self.overlay,
                        scheduler: &mut self.scheduler,
                    };
                    session.finish(&mut host);
                }
                Flow::Quit
            }
        };

        self.reap_session();
        self.publish_status();
        flow
    }

    fn start_session(&mut self, binding: Binding, mask: ModifierMask) {
        let settings = self.settings.snapshot();
        let windows = match dispatch(binding, &settings, &mut self.compositor) {
            Ok(Dispatch::Start(windows)) => windows,
            Ok(Dispatch::NoCandidates) => {
                info!("No windows to switch to");
                return;
            }
            Ok(Dispatch::Disabled) => return,
            Err(e) => {
                error!("Failed to gather windows: {:#}", e);
                return;
            }
        };

        self.next_session += 1;
        let id = SessionId(self.next_session);
        let mut host = SessionHost {
            compositor: &mut self.compositor,
            overlay: &mut self.overlay,
            scheduler: &mut self.scheduler,
        };
        self.session = Some(Session::start(id, windows, mask, settings, &mut host));
    }

    fn forward(&mut self, event: SessionEvent) {
        let Some(session) = self.session.as_mut() else {
            debug!("No session for {:?}", event);
            return;
        };

        let mut host = SessionHost {
            compositor: &mut self.compositor,
            overlay: &mut self.overlay,
            scheduler: &mut self.scheduler,
        };
        session.handle(event, &mut host);
    }

    fn reap_session(&mut self) {
        if let Some(session) = self.session.take_if(|s| !s.is_active()) {
            debug!(
                "Session {:?} ended, activated {:?}",
                session.id(),
                session.activated()
            );
        }
    }

    fn publish_status(&self) {
        let status = match &self.session {
            Some(session) => SwitcherStatus {
                switching: true,
                window_count: session.windows().len(),
                current_index: Some(session.cursor()),
            },
            None => SwitcherStatus::default(),
        };
        self.status.send_if_modified(|current| {
            if *current == status {
                false
            } else {
                *current = status;
                true
            }
        });
    }
}

/// Drive `controller` from `rx` on the GLib main context until shutdown.
pub fn run<C, O, S, B>(
    mut controller: Controller<C, O, S, B>,
    mut rx: mpsc::UnboundedReceiver<ControlEvent>,
    on_quit: impl FnOnce() + 'static,
) where
    C: Compositor + 'static,
    O: Overlay + 'static,
    S: Scheduler + 'static,
    B: SettingsBackend + 'static,
{
    info!("Controller started");

    glib::spawn_future_local(async move {
        while let Some(event) = rx.recv().await {
            if controller.handle(event) == Flow::Quit {
                info!("Controller shutting down");
                on_quit();
                return;
            }
        }

        warn!("Controller stopped - channel closed");
    });
}
