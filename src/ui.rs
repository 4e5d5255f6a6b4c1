//! GTK4 layer-shell implementation of the switcher overlay.
//!
//! One overlay window per daemon, placed on the chosen output while a session
//! runs and hidden in between. Widgets never touch session state: every input
//! event is posted to the controller channel as `ControlEvent::Input`.

use crate::events::{ControlEvent, ScrollDirection, SessionEvent};
use crate::modifiers::ModifierMask;
use crate::overlay::{GrabMode, Overlay, RowStyle};
use crate::preview::{OUTLINE_COLOR, OUTLINE_THICKNESS, Preview};
use crate::selector_list::{ICON_SIZE, ListEntry};
use crate::window::{Rect, Size, WindowId};
use gtk4::prelude::*;
use gtk4::{
    Align, Application, ApplicationWindow, Box as GtkBox, DrawingArea, EventControllerKey,
    EventControllerMotion, EventControllerScroll, EventControllerScrollFlags, Fixed, GestureClick,
    Image, Label, Orientation, gdk,
};
use gtk4_layer_shell::{Edge, KeyboardMode, Layer};
use std::cell::Cell;
use std::collections::HashMap;
use std::rc::Rc;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

const LIST_PADDING: i32 = 12;
const ROW_SPACING: i32 = 4;
const MAX_LABEL_CHARS: i32 = 60;

type Sender = mpsc::UnboundedSender<ControlEvent>;

pub struct SwitcherWindow {
    window: ApplicationWindow,
    canvas: Fixed,
    list: GtkBox,
    previews: HashMap<WindowId, DrawingArea>,
    rows: HashMap<WindowId, GtkBox>,
    stage: Size,
    layered: bool,
    /// Modifiers last reported by the compositor; `None` until the overlay
    /// has keyboard focus
    modifiers: Rc<Cell<Option<ModifierMask>>>,
    tx: Sender,
}

impl SwitcherWindow {
    pub fn new(app: &Application, tx: Sender) -> Self {
        let window = ApplicationWindow::builder()
            .application(app)
            .title("Window Switcher")
            .decorated(false)
            .resizable(false)
            .build();
        window.add_css_class("switcher");

        let layered = gtk4_layer_shell::is_supported();
        if layered {
            gtk4_layer_shell::init_for_window(&window);
            gtk4_layer_shell::set_namespace(&window, env!("CARGO_PKG_NAME"));
            gtk4_layer_shell::set_layer(&window, Layer::Overlay);
            gtk4_layer_shell::set_exclusive_zone(&window, -1);
            for edge in [Edge::Left, Edge::Right, Edge::Top, Edge::Bottom] {
                gtk4_layer_shell::set_anchor(&window, edge, true);
            }
        } else {
            warn!("Layer shell is not supported, falling back to a regular window");
        }

        // Previews at the bottom, the list stacked above them
        let canvas = Fixed::new();
        let list = GtkBox::new(Orientation::Vertical, ROW_SPACING);
        list.add_css_class("switcher-list");
        list.set_halign(Align::Center);
        list.set_valign(Align::Center);
        list.set_margin_start(LIST_PADDING);
        list.set_margin_end(LIST_PADDING);
        list.set_margin_top(LIST_PADDING);
        list.set_margin_bottom(LIST_PADDING);

        let stack = gtk4::Overlay::new();
        stack.set_child(Some(&canvas));
        stack.add_overlay(&list);
        window.set_child(Some(&stack));

        let modifiers = Rc::new(Cell::new(None));
        attach_key_controller(&window, &tx, &modifiers);
        attach_scroll_controller(&window, &tx);

        SwitcherWindow {
            window,
            canvas,
            list,
            previews: HashMap::new(),
            rows: HashMap::new(),
            stage: Size::default(),
            layered,
            modifiers,
            tx,
        }
    }

    fn build_row(&self, entry: &ListEntry) -> GtkBox {
        let row = GtkBox::new(Orientation::Horizontal, LIST_PADDING);
        row.add_css_class("switcher-row");

        let icon = if entry.icon.name().starts_with('/') {
            Image::from_file(entry.icon.name())
        } else {
            Image::from_icon_name(entry.icon.name())
        };
        icon.set_pixel_size(ICON_SIZE);
        row.append(&icon);

        let label = Label::new(Some(&entry.label));
        label.set_ellipsize(gtk4::pango::EllipsizeMode::End);
        label.set_max_width_chars(MAX_LABEL_CHARS);
        label.set_xalign(0.0);
        row.append(&label);

        let window = entry.window;
        let motion = EventControllerMotion::new();
        let tx = self.tx.clone();
        motion.connect_enter(move |_, _, _| {
            send(&tx, SessionEvent::PointerEnter(window));
        });
        let tx = self.tx.clone();
        motion.connect_leave(move |_| {
            send(&tx, SessionEvent::PointerLeave(window));
        });
        row.add_controller(motion);

        let click = GestureClick::new();
        let tx = self.tx.clone();
        click.connect_released(move |gesture, _, _, _| {
            send(
                &tx,
                SessionEvent::PointerClick {
                    window,
                    time: gesture.current_event_time(),
                },
            );
        });
        row.add_controller(click);

        row
    }

    /// Put the layer surface on the output whose origin matches `area`
    fn place_on_output(&self, area: Rect) {
        if !self.layered {
            self.window.set_default_size(area.width, area.height);
            return;
        }

        let monitors = WidgetExt::display(&self.window).monitors();
        let found = (0..monitors.n_items())
            .filter_map(|i| monitors.item(i).and_downcast::<gdk::Monitor>())
            .find(|m| {
                let geometry = m.geometry();
                geometry.x() == area.x && geometry.y() == area.y
            });

        match found {
            Some(monitor) => gtk4_layer_shell::set_monitor(&self.window, &monitor),
            None => debug!("No GDK monitor at {},{}; letting the compositor choose", area.x, area.y),
        }
    }
}

impl Overlay for SwitcherWindow {
    fn push_modal(&mut self, mode: GrabMode) -> bool {
        // Covering the output is what gives us the pointer
        if mode == GrabMode::PointerAndKeyboard && !self.layered {
            return false;
        }

        self.modifiers.set(None);
        if self.layered {
            gtk4_layer_shell::set_keyboard_mode(&self.window, KeyboardMode::Exclusive);
        }
        self.window.set_can_target(mode == GrabMode::PointerAndKeyboard);
        info!("Acquired {:?} grab", mode);
        true
    }

    fn pop_modal(&mut self) {
        if self.layered {
            gtk4_layer_shell::set_keyboard_mode(&self.window, KeyboardMode::None);
        }
        self.window.set_visible(false);
        self.modifiers.set(None);
        debug!("Released grab");
    }

    /// Wayland only sends modifiers once our surface has keyboard focus.
    fn modifier_state(&self) -> Option<ModifierMask> {
        self.modifiers.get()
    }

    fn stage_size(&self) -> Size {
        self.stage
    }

    /// Layer surfaces are per output, so the stage size is bookkeeping only.
    fn set_stage_size(&mut self, size: Size) {
        self.stage = size;
    }

    fn show_root(&mut self, area: Rect) {
        self.place_on_output(area);
        self.canvas.set_size_request(area.width, area.height);
        self.window.set_visible(true);
        self.window.present();
        debug!("Overlay presented on {:?}", area);
    }

    fn remove_root(&mut self) {
        for (_, preview) in self.previews.drain() {
            self.canvas.remove(&preview);
        }
        self.window.set_visible(false);
    }

    fn add_preview(&mut self, preview: &Preview) {
        let area = DrawingArea::new();
        area.set_content_width(preview.width);
        area.set_content_height(preview.height);
        area.set_can_target(false);
        area.set_visible(false);
        area.set_opacity(f64::from(preview.opacity) / 255.0);

        let has_outline = preview.has_outline;
        area.set_draw_func(move |_, cr, width, height| {
            cr.set_source_rgba(0.15, 0.15, 0.15, 0.85);
            cr.rectangle(0.0, 0.0, f64::from(width), f64::from(height));
            if let Err(e) = cr.fill() {
                warn!("Failed to draw preview: {}", e);
            }

            if has_outline {
                let [r, g, b, a] = OUTLINE_COLOR.map(|c| f64::from(c) / 255.0);
                let inset = f64::from(OUTLINE_THICKNESS) / 2.0;
                cr.set_source_rgba(r, g, b, a);
                cr.set_line_width(f64::from(OUTLINE_THICKNESS));
                cr.rectangle(
                    inset,
                    inset,
                    f64::from(width) - 2.0 * inset,
                    f64::from(height) - 2.0 * inset,
                );
                if let Err(e) = cr.stroke() {
                    warn!("Failed to draw preview outline: {}", e);
                }
            }
        });

        self.canvas
            .put(&area, f64::from(preview.x), f64::from(preview.y));
        if let Some(old) = self.previews.insert(preview.window, area) {
            self.canvas.remove(&old);
        }
    }

    fn set_preview_shown(&mut self, window: WindowId, shown: bool, opacity: u8) {
        if let Some(area) = self.previews.get(&window) {
            area.set_opacity(f64::from(opacity) / 255.0);
            area.set_visible(shown);
        }
    }

    fn remove_preview(&mut self, window: WindowId) {
        if let Some(area) = self.previews.remove(&window) {
            self.canvas.remove(&area);
        }
    }

    fn add_list_row(&mut self, entry: &ListEntry) {
        let row = self.build_row(entry);
        self.list.append(&row);
        if let Some(old) = self.rows.insert(entry.window, row) {
            self.list.remove(&old);
        }
    }

    fn set_row_style(&mut self, window: WindowId, style: RowStyle) {
        if let Some(row) = self.rows.get(&window) {
            set_css_class(row, "focus", style.focus);
            set_css_class(row, "hover", style.hover);
        }
    }

    fn remove_list_row(&mut self, window: WindowId) {
        if let Some(row) = self.rows.remove(&window) {
            self.list.remove(&row);
        }
    }

    fn show_list(&mut self, area: Rect) {
        debug!("Showing list with {} rows on {:?}", self.rows.len(), area);
        self.list.set_visible(true);
    }

    fn remove_list(&mut self) {
        for (_, row) in self.rows.drain() {
            self.list.remove(&row);
        }
        self.list.set_visible(false);
    }
}

fn set_css_class(widget: &impl IsA<gtk4::Widget>, class: &str, enabled: bool) {
    if enabled {
        widget.add_css_class(class);
    } else {
        widget.remove_css_class(class);
    }
}

fn send(tx: &Sender, event: SessionEvent) {
    if tx.send(ControlEvent::Input(event)).is_err() {
        warn!("Input dropped, controller is gone");
    }
}

fn attach_key_controller(
    window: &ApplicationWindow,
    tx: &Sender,
    modifiers: &Rc<Cell<Option<ModifierMask>>>,
) {
    let keys = EventControllerKey::new();

    let tx_press = tx.clone();
    keys.connect_key_pressed(move |controller, keyval, _, state| {
        let Some(keysym) = keyval.name() else {
            return glib::Propagation::Stop;
        };
        send(
            &tx_press,
            SessionEvent::KeyPress {
                keysym: keysym.to_string(),
                state: modifiers_from_gdk(state),
                time: controller.current_event_time(),
            },
        );
        glib::Propagation::Stop
    });

    let tx_release = tx.clone();
    keys.connect_key_released(move |controller, _, _, _| {
        send(
            &tx_release,
            SessionEvent::KeyRelease {
                time: controller.current_event_time(),
            },
        );
    });

    // Also fires when the surface first gains keyboard focus
    let tx_mods = tx.clone();
    let modifiers = modifiers.clone();
    keys.connect_modifiers(move |controller, state| {
        modifiers.set(Some(modifiers_from_gdk(state)));
        send(
            &tx_mods,
            SessionEvent::KeyRelease {
                time: controller.current_event_time(),
            },
        );
        glib::Propagation::Proceed
    });

    window.add_controller(keys);
}

fn attach_scroll_controller(window: &ApplicationWindow, tx: &Sender) {
    let scroll = EventControllerScroll::new(
        EventControllerScrollFlags::VERTICAL | EventControllerScrollFlags::DISCRETE,
    );
    let tx = tx.clone();
    scroll.connect_scroll(move |controller, _, dy| {
        let direction = if dy < 0.0 {
            ScrollDirection::Up
        } else {
            ScrollDirection::Down
        };
        send(
            &tx,
            SessionEvent::Scroll {
                direction,
                time: controller.current_event_time(),
            },
        );
        glib::Propagation::Stop
    });
    window.add_controller(scroll);
}

/// Translate GDK's modifier state into our mask
pub fn modifiers_from_gdk(state: gdk::ModifierType) -> ModifierMask {
    let pairs = [
        (gdk::ModifierType::SHIFT_MASK, ModifierMask::SHIFT),
        (gdk::ModifierType::LOCK_MASK, ModifierMask::LOCK),
        (gdk::ModifierType::CONTROL_MASK, ModifierMask::CONTROL),
        (gdk::ModifierType::ALT_MASK, ModifierMask::MOD1),
        (gdk::ModifierType::SUPER_MASK, ModifierMask::MOD4),
        (gdk::ModifierType::HYPER_MASK, ModifierMask::MOD3),
        (gdk::ModifierType::META_MASK, ModifierMask::MOD1),
    ];

    pairs
        .iter()
        .filter(|(gdk_flag, _)| state.contains(*gdk_flag))
        .fold(ModifierMask::empty(), |mask, (_, flag)| mask | *flag)
}

/// Setup CSS styling for the switcher and preferences windows
pub fn setup_css() {
    let Some(display) = gdk::Display::default() else {
        warn!("No display, skipping CSS setup");
        return;
    };

    let provider = gtk4::CssProvider::new();
    provider.load_from_data(
        r#"
        window.switcher {
            background-color: transparent;
        }

        .switcher-list {
            background-color: rgba(30, 30, 30, 0.95);
            border-radius: 10px;
            border: 2px solid rgba(100, 100, 100, 0.5);
            padding: 8px;
        }

        .switcher-row {
            padding: 6px 10px;
            border-radius: 8px;
        }

        .switcher-row label {
            color: #ffffff;
            font-size: 12px;
        }

        .switcher-row.hover {
            background-color: rgba(255, 255, 255, 0.1);
        }

        .switcher-row.focus {
            background-color: rgba(70, 130, 180, 0.7);
        }
        "#,
    );

    gtk4::style_context_add_provider_for_display(
        &display,
        &provider,
        gtk4::STYLE_PROVIDER_PRIORITY_APPLICATION,
    );
}
