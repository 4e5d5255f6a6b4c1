use crate::events::ControlEvent;
use crate::ipc::{IpcCommand, IpcResponse, SwitcherStatus};
use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};
use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncWrite, AsyncWriteExt, BufReader};
use tokio::net::UnixListener;
use tokio::sync::{mpsc, watch};
use tracing::{debug, error, info, warn};

/// Guard that removes the socket file when dropped
pub struct SocketGuard {
    path: PathBuf,
}

impl Drop for SocketGuard {
    fn drop(&mut self) {
        if let Err(e) = fs::remove_file(&self.path) {
            if self.path.exists() {
                error!("Failed to remove socket file: {}", e);
            }
        } else {
            info!("Removed socket file at {}", self.path.display());
        }
    }
}

/// Start the IPC socket server at `socket_path`.
///
/// Binding and shutdown commands are forwarded to the controller through
/// `tx`; status queries are answered from the latest published `status`.
pub async fn start_server(
    socket_path: &Path,
    tx: mpsc::UnboundedSender<ControlEvent>,
    status: watch::Receiver<SwitcherStatus>,
) -> Result<SocketGuard> {
    // Remove stale socket if it exists
    if socket_path.exists() {
        info!("Removing stale socket at {}", socket_path.display());
        fs::remove_file(socket_path)?;
    }

    let listener = UnixListener::bind(socket_path)
        .with_context(|| format!("Failed to bind socket at {}", socket_path.display()))?;

    info!("IPC socket listening at {}", socket_path.display());

    let guard = SocketGuard {
        path: socket_path.to_path_buf(),
    };

    tokio::spawn(async move {
        loop {
            match listener.accept().await {
                Ok((stream, _)) => {
                    let tx = tx.clone();
                    let status = status.clone();
                    tokio::spawn(async move {
                        let (reader, writer) = stream.into_split();
                        if let Err(e) = handle_client(reader, writer, &tx, &status).await {
                            debug!("Client connection error: {}", e);
                        }
                    });
                }
                Err(e) => {
                    error!("Failed to accept connection: {}", e);
                }
            }
        }
    });

    Ok(guard)
}

/// Answer one command
pub fn respond(
    command: IpcCommand,
    tx: &mpsc::UnboundedSender<ControlEvent>,
    status: &watch::Receiver<SwitcherStatus>,
) -> IpcResponse {
    let event = match command {
        IpcCommand::Status => return IpcResponse::Status(status.borrow().clone()),
        IpcCommand::Binding { binding, mask } => ControlEvent::Binding { binding, mask },
        IpcCommand::Shutdown => ControlEvent::Shutdown,
    };

    if tx.send(event).is_err() {
        IpcResponse::Error("Daemon is shutting down".to_string())
    } else {
        IpcResponse::Ok
    }
}

/// Handle a single client connection: one command line in, one JSON line out
async fn handle_client<R, W>(
    reader: R,
    mut writer: W,
    tx: &mpsc::UnboundedSender<ControlEvent>,
    status: &watch::Receiver<SwitcherStatus>,
) -> Result<()>
where
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let mut reader = BufReader::new(reader);
    let mut line = String::new();
    reader.read_line(&mut line).await?;

    let response = match line.parse::<IpcCommand>() {
        Ok(command) => {
            debug!("Received IPC command: {}", command);
            respond(command, tx, status)
        }
        Err(e) => {
            warn!("{}", e);
            IpcResponse::Error(e.to_string())
        }
    };

    let response_json = serde_json::to_string(&response)?;
    writer.write_all(response_json.as_bytes()).await?;
    writer.write_all(b"\n").await?;
    writer.flush().await?;

    Ok(())
}
