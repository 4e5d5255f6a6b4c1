mod candidates;
mod compositor;
mod config;
mod controller;
mod daemon;
mod dispatcher;
mod events;
mod icon_resolver;
mod ipc;
mod keybindings;
mod modifiers;
mod overlay;
mod prefs;
mod preview;
mod selector_list;
mod session;
mod settings;
mod settings_file;
mod socket_client;
mod socket_server;
mod sway_client;
#[cfg(test)]
mod testing;
mod timers;
mod ui;
mod window;

use anyhow::{Context, Result};
use config::{Command, Config};
use controller::Controller;
use gtk4::prelude::*;
use ipc::{IpcCommand, SwitcherStatus};
use settings::{SettingsBackend, SettingsStore};
use settings_file::JsonFileBackend;
use std::cell::RefCell;
use std::fs;
use std::path::{Path, PathBuf};
use sway_client::RealSwayClient;
use timers::GlibScheduler;
use tokio::sync::{mpsc, oneshot, watch};
use tracing::{error, info, warn};
use ui::SwitcherWindow;

const APPLICATION_ID: &str = "io.github.alttab-previews";

/// Get the path to the pidfile
fn get_pidfile_path() -> Result<PathBuf> {
    // Try to use XDG_RUNTIME_DIR, fall back to ~/.cache
    let runtime_dir = dirs::runtime_dir()
        .or_else(dirs::cache_dir)
        .context("Could not determine runtime directory")?;

    Ok(runtime_dir.join(concat!(env!("CARGO_PKG_NAME"), ".pid")))
}

/// Refuse to start next to a live daemon, then claim the pidfile.
fn acquire_pidfile() -> Result<PidfileGuard> {
    let path = get_pidfile_path()?;

    if path.exists() {
        let pid: u32 = fs::read_to_string(&path)
            .context("Failed to read pidfile")?
            .trim()
            .parse()
            .context("Invalid PID in pidfile")?;

        // Linux-only, like Sway
        if Path::new(&format!("/proc/{}", pid)).exists() {
            anyhow::bail!(
                "Another daemon is already running (PID: {}). \
                 If this is incorrect, remove the pidfile at: {}",
                pid,
                path.display()
            );
        }

        info!("Removing stale pidfile (PID {} not found)", pid);
        if let Err(e) = fs::remove_file(&path) {
            warn!("Failed to remove stale pidfile: {}", e);
        }
    }

    let pid = std::process::id();
    fs::write(&path, pid.to_string()).context("Failed to write pidfile")?;
    info!("Created pidfile at {} with PID {}", path.display(), pid);

    Ok(PidfileGuard { path })
}

/// Guard that removes the pidfile when dropped
struct PidfileGuard {
    path: PathBuf,
}

impl Drop for PidfileGuard {
    fn drop(&mut self) {
        if let Err(e) = fs::remove_file(&self.path) {
            error!("Failed to remove pidfile: {}", e);
        } else {
            info!("Removed pidfile at {}", self.path.display());
        }
    }
}

fn main() -> Result<()> {
    let config = Config::parse();

    let log_level = if config.verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::INFO
    };

    tracing_subscriber::fmt()
        .with_max_level(log_level)
        .with_target(false)
        .init();

    // Ignore SIGUSR1 signal to prevent crashes
    #[cfg(unix)]
    unsafe {
        use libc::{SIG_IGN, SIGUSR1, signal};
        signal(SIGUSR1, SIG_IGN);
    }

    let settings_path = match config.settings.clone() {
        Some(path) => path,
        None => settings_file::default_path()?,
    };

    match config.command() {
        Command::Daemon => run_daemon(settings_path),
        Command::Prefs => prefs::run(settings_path),
        Command::Set { key, value } => set_setting(&settings_path, &key, value),
        Command::Status => socket_client::send_command_and_exit(IpcCommand::Status),
        Command::Shutdown => socket_client::send_command_and_exit(IpcCommand::Shutdown),
        binding_command => {
            let (binding, mask) = binding_command
                .binding()
                .context("Not a switcher binding")?;
            socket_client::send_command_and_exit(IpcCommand::Binding { binding, mask })
        }
    }
}

fn set_setting(path: &Path, key: &str, value: bool) -> Result<()> {
    if !settings_file::DEFAULTS.iter().any(|(known, _)| *known == key) {
        anyhow::bail!("Unknown setting: {}", key);
    }

    let mut backend = JsonFileBackend::open(path)?;
    backend.set_boolean(key, value)
}

fn run_daemon(settings_path: PathBuf) -> Result<()> {
    info!("Starting {} daemon", env!("CARGO_PKG_NAME"));

    let _pidfile_guard = acquire_pidfile()?;

    let mut store = SettingsStore::new(JsonFileBackend::open(&settings_path)?);
    store.load();
    info!(
        "Loaded {} settings from {}: {:?}",
        store.len(),
        settings_path.display(),
        store.snapshot()
    );

    gtk4::init()?;

    let app = gtk4::Application::builder()
        .application_id(APPLICATION_ID)
        .build();

    let (ctl_tx, ctl_rx) = mpsc::unbounded_channel();
    let (status_tx, status_rx) = watch::channel(SwitcherStatus::default());
    let (shutdown_tx, shutdown_rx) = oneshot::channel();

    // Spawn Tokio runtime in a background thread
    let daemon_tx = ctl_tx.clone();
    let daemon_thread = std::thread::spawn(move || {
        let rt = match tokio::runtime::Runtime::new() {
            Ok(rt) => rt,
            Err(e) => {
                error!("Failed to create Tokio runtime: {}", e);
                return;
            }
        };

        rt.block_on(async move {
            match daemon::run(daemon_tx, status_rx, shutdown_rx).await {
                Ok(()) => info!("Daemon exited normally"),
                Err(e) => error!("Daemon error: {:#}", e),
            }
        });
    });

    // activate can fire more than once; the controller is built on the first
    let pending = RefCell::new(Some((store, ctl_rx, status_tx)));
    app.connect_activate(move |app| {
        let Some((store, ctl_rx, status_tx)) = pending.borrow_mut().take() else {
            return;
        };

        ui::setup_css();

        let compositor = match RealSwayClient::new() {
            Ok(compositor) => compositor,
            Err(e) => {
                error!("{:#}", e);
                app.quit();
                return;
            }
        };

        let settings_monitor = match settings_file::watch(&settings_path, ctl_tx.clone()) {
            Ok(monitor) => Some(monitor),
            Err(e) => {
                warn!("Settings changes will need a restart: {:#}", e);
                None
            }
        };

        let overlay = SwitcherWindow::new(app, ctl_tx.clone());
        let scheduler = GlibScheduler::new(ctl_tx.clone());
        let controller = Controller::new(compositor, overlay, scheduler, store, status_tx);

        let hold = app.hold();
        let app = app.clone();
        controller::run(controller, ctl_rx, move || {
            drop(settings_monitor);
            drop(hold);
            app.quit();
        });
    });

    // Arguments were already handled by clap
    app.run_with_args::<&str>(&[]);

    if shutdown_tx.send(()).is_err() {
        warn!("Daemon thread already stopped");
    }
    if daemon_thread.join().is_err() {
        error!("Daemon thread panicked");
    }

    Ok(())
}
