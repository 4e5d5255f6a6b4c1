use crate::keybindings::Binding;
use crate::modifiers::ModifierMask;
use crate::timers::{SessionId, SessionTimer, TimerHandle};
use crate::window::WindowId;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScrollDirection {
    Up,
    Down,
    Left,
    Right,
}

/// Input and compositor events consumed by a switcher session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    KeyPress {
        /// Keysym name as reported by the toolkit, e.g. `Escape`, `q`, `ISO_Left_Tab`
        keysym: String,
        state: ModifierMask,
        time: u32,
    },
    KeyRelease {
        time: u32,
    },
    /// A switcher binding the compositor handled itself while we held the keyboard
    BindingRepeat {
        binding: Binding,
        state: ModifierMask,
    },
    Scroll {
        direction: ScrollDirection,
        time: u32,
    },
    PointerEnter(WindowId),
    PointerLeave(WindowId),
    PointerClick {
        window: WindowId,
        time: u32,
    },
    WindowDestroyed(WindowId),
    WindowMapped(WindowId),
    TimerFired {
        handle: TimerHandle,
        timer: SessionTimer,
    },
}

/// Everything delivered to the controller on the UI thread.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ControlEvent {
    /// A switcher binding fired
    Binding {
        binding: Binding,
        mask: ModifierMask,
    },
    /// Input from the overlay widgets
    Input(SessionEvent),
    WindowFocused(WindowId),
    WindowDestroyed(WindowId),
    WindowMapped(WindowId),
    Timer {
        session: SessionId,
        handle: TimerHandle,
        timer: SessionTimer,
    },
    SettingsFileChanged,
    Shutdown,
}
