//! Cancellable one-shot timers for the switcher session.

use crate::events::ControlEvent;
use crate::window::WindowId;
use std::collections::HashMap;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{debug, warn};

/// Identifies one switcher session; timers carry it so a late fire from an
/// earlier session can be told apart.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SessionId(pub u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TimerHandle(pub u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionTimer {
    /// Enables list hover highlighting once the initial layout has settled
    HoverSettle,
    /// Follow-up on a close request sent to the window
    CheckDestroyed(WindowId),
}

pub trait Scheduler {
    /// Deliver `timer` to `session` after `delay`
    fn schedule(&mut self, session: SessionId, delay: Duration, timer: SessionTimer)
    -> TimerHandle;

    /// Cancel a pending timer. Cancelling a timer that already fired is a no-op.
    fn cancel(&mut self, handle: TimerHandle);
}

/// Scheduler backed by the GLib main loop. Fired timers are posted into the
/// controller channel as `ControlEvent::Timer`.
pub struct GlibScheduler {
    tx: mpsc::UnboundedSender<ControlEvent>,
    next_handle: u64,
    sources: HashMap<TimerHandle, glib::SourceId>,
    fired: std::rc::Rc<std::cell::RefCell<Vec<TimerHandle>>>,
}

impl GlibScheduler {
    pub fn new(tx: mpsc::UnboundedSender<ControlEvent>) -> Self {
        GlibScheduler {
            tx,
            next_handle: 0,
            sources: HashMap::new(),
            fired: Default::default(),
        }
    }

    /// Forget sources that already ran; removing them would be an error in GLib.
    fn reap_fired(&mut self) {
        for handle in self.fired.borrow_mut().drain(..) {
            self.sources.remove(&handle);
        }
    }
}

impl Scheduler for GlibScheduler {
    fn schedule(
        &mut self,
        session: SessionId,
        delay: Duration,
        timer: SessionTimer,
    ) -> TimerHandle {
        self.reap_fired();

        self.next_handle += 1;
        let handle = TimerHandle(self.next_handle);
        let tx = self.tx.clone();
        let fired = self.fired.clone();

        let source = glib::timeout_add_local_once(delay, move || {
            fired.borrow_mut().push(handle);
            if tx
                .send(ControlEvent::Timer {
                    session,
                    handle,
                    timer,
                })
                .is_err()
            {
                warn!("Failed to deliver timer {:?}, controller is gone", timer);
            }
        });

        debug!("Scheduled {:?} in {:?} as {:?}", timer, delay, handle);
        self.sources.insert(handle, source);
        handle
    }

    fn cancel(&mut self, handle: TimerHandle) {
        self.reap_fired();
        if let Some(source) = self.sources.remove(&handle) {
            debug!("Cancelled timer {:?}", handle);
            source.remove();
        }
    }
}
