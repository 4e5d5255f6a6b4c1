//! Preferences window: two switches bound both ways to the settings file.

use crate::events::ControlEvent;
use crate::settings::{SettingsBackend, SettingsStore};
use crate::settings_file::{self, JsonFileBackend};
use anyhow::Result;
use gtk4::prelude::*;
use gtk4::{Align, Application, ApplicationWindow, Box as GtkBox, Label, Orientation, Switch};
use std::cell::RefCell;
use std::path::PathBuf;
use std::rc::Rc;
use tokio::sync::mpsc;
use tracing::{error, info, warn};

/// Settings exposed in the window, with their labels
pub const TOGGLES: &[(&str, &str)] = &[
    (
        "enforce-primary-monitor",
        "Always show the switcher on the primary monitor",
    ),
    ("draw-borders", "Draw borders around window previews"),
];

/// Write a toggle through to the backend unless it already has that value.
/// Returns whether anything was written.
pub fn apply_toggle<B: SettingsBackend>(
    store: &mut SettingsStore<B>,
    key: &str,
    active: bool,
) -> Result<bool> {
    if store.get(key) == Some(active) {
        return Ok(false);
    }
    store.backend_mut().set_boolean(key, active)?;
    store.on_change(key);
    Ok(true)
}

/// Run the preferences window until it is closed
pub fn run(settings_path: PathBuf) -> Result<()> {
    let mut store = SettingsStore::new(JsonFileBackend::open(&settings_path)?);
    store.load();
    let store = Rc::new(RefCell::new(store));

    gtk4::init()?;

    let app = Application::builder()
        .application_id("io.github.alttab-previews.Preferences")
        .build();

    app.connect_activate(move |app| {
        crate::ui::setup_css();
        build_window(app, &store, &settings_path);
    });

    // Arguments were already handled by clap
    app.run_with_args::<&str>(&[]);
    Ok(())
}

fn build_window(
    app: &Application,
    store: &Rc<RefCell<SettingsStore<JsonFileBackend>>>,
    settings_path: &std::path::Path,
) {
    let window = ApplicationWindow::builder()
        .application(app)
        .title("Alt-Tab Previews")
        .default_width(420)
        .build();

    let content = GtkBox::new(Orientation::Vertical, 12);
    content.set_margin_start(18);
    content.set_margin_end(18);
    content.set_margin_top(18);
    content.set_margin_bottom(18);

    let mut switches = Vec::new();
    for &(key, text) in TOGGLES {
        let row = GtkBox::new(Orientation::Horizontal, 12);
        let label = Label::new(Some(text));
        label.set_hexpand(true);
        label.set_xalign(0.0);
        row.append(&label);

        let switch = Switch::new();
        switch.set_valign(Align::Center);
        switch.set_active(store.borrow().get(key).unwrap_or(true));

        let store_for_switch = store.clone();
        let key_for_switch = key.to_string();
        switch.connect_active_notify(move |switch| {
            let key = &key_for_switch;
            if let Err(e) = apply_toggle(&mut store_for_switch.borrow_mut(), key, switch.is_active()) {
                error!("Failed to save {}: {:#}", key, e);
            }
        });

        row.append(&switch);
        content.append(&row);
        switches.push((key.to_string(), switch));
    }
    window.set_child(Some(&content));

    // Reflect edits made behind our back, e.g. by `alttab-previews set`
    let (tx, mut rx) = mpsc::unbounded_channel();
    match settings_file::watch(settings_path, tx) {
        Ok(monitor) => {
            let store = store.clone();
            glib::spawn_future_local(async move {
                let _monitor = monitor;
                while let Some(event) = rx.recv().await {
                    if event != ControlEvent::SettingsFileChanged {
                        continue;
                    }
                    store.borrow_mut().refresh();
                    for (key, switch) in &switches {
                        let value = store.borrow().get(key).unwrap_or(true);
                        if switch.is_active() != value {
                            switch.set_active(value);
                        }
                    }
                }
            });
        }
        Err(e) => warn!("Settings changes made elsewhere will not show up: {:#}", e),
    }

    info!("Showing preferences for {}", settings_path.display());
    window.present();
}
