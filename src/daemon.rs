//! The async half of the daemon: IPC socket and Sway window events.
//!
//! Runs on its own Tokio runtime thread and only talks to the GTK side
//! through the controller channel.

use crate::events::ControlEvent;
use crate::ipc::{SwitcherStatus, get_socket_path};
use crate::socket_server;
use crate::window::WindowId;
use anyhow::Result;
use futures_lite::stream::StreamExt;
use swayipc_async::{Connection, Event, EventType, WindowChange, WindowEvent};
use tokio::sync::{mpsc, oneshot, watch};
use tracing::{debug, error, info};

/// Serve IPC and forward Sway window events until `shutdown` fires or the
/// controller goes away.
pub async fn run(
    tx: mpsc::UnboundedSender<ControlEvent>,
    status: watch::Receiver<SwitcherStatus>,
    shutdown: oneshot::Receiver<()>,
) -> Result<()> {
    let socket_path = get_socket_path()?;
    let _socket_guard = socket_server::start_server(&socket_path, tx.clone(), status).await?;

    let events_tx = tx.clone();
    let sway_events = tokio::spawn(async move {
        if let Err(e) = monitor_sway_events(events_tx).await {
            error!("Sway event monitoring error: {}", e);
        }
    });

    tokio::select! {
        _ = shutdown => info!("Daemon shutdown requested"),
        _ = tx.closed() => info!("Controller is gone, shutting down"),
    }

    sway_events.abort();
    Ok(())
}

/// Map a Sway window event to what the controller cares about
fn control_event(event: &WindowEvent) -> Option<ControlEvent> {
    let id = WindowId(event.container.id);
    match event.change {
        WindowChange::Focus => Some(ControlEvent::WindowFocused(id)),
        WindowChange::Close => Some(ControlEvent::WindowDestroyed(id)),
        WindowChange::New => Some(ControlEvent::WindowMapped(id)),
        _ => None,
    }
}

/// Monitor Sway events for window changes
async fn monitor_sway_events(tx: mpsc::UnboundedSender<ControlEvent>) -> Result<()> {
    let subs = [EventType::Window];
    let mut events = Connection::new().await?.subscribe(&subs).await?;

    info!("Subscribed to Sway window events");

    while let Some(event) = events.next().await {
        if let Event::Window(e) = event? {
            debug!("Sway window event: {:?} for container {:?}", e.change, e.container.id);

            if let Some(event) = control_event(&e)
                && tx.send(event).is_err()
            {
                break;
            }
        }
    }

    Ok(())
}
