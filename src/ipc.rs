use crate::keybindings::Binding;
use crate::modifiers::ModifierMask;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

/// Commands sent from CLI client to daemon
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IpcCommand {
    /// A switcher binding fired; `mask` holds the modifiers of the key combo
    Binding { binding: Binding, mask: ModifierMask },
    /// Query daemon status
    Status,
    /// Shutdown the daemon gracefully
    Shutdown,
}

/// What the daemon reports for `status`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SwitcherStatus {
    pub switching: bool,
    pub window_count: usize,
    pub current_index: Option<usize>,
}

/// Response from daemon to CLI client
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IpcResponse {
    /// Command executed successfully
    Ok,
    /// Error occurred
    Error(String),
    Status(SwitcherStatus),
}

/// Get the path to the Unix socket
pub fn get_socket_path() -> Result<PathBuf> {
    let runtime_dir = dirs::runtime_dir()
        .or_else(dirs::cache_dir)
        .context("Could not determine runtime directory")?;

    Ok(runtime_dir.join(concat!(env!("CARGO_PKG_NAME"), ".sock")))
}

/// Error returned when parsing an invalid IpcCommand string
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseIpcCommandError(String);

impl fmt::Display for ParseIpcCommandError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid IPC command: {}", self.0)
    }
}

impl std::error::Error for ParseIpcCommandError {}

impl FromStr for IpcCommand {
    type Err = ParseIpcCommandError;

    /// Parses `status`, `shutdown` and `binding <name> [<mask>]`. The mask
    /// defaults to Alt.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let err = || ParseIpcCommandError(s.trim().to_string());
        let mut words = s.split_whitespace();
        let command = words.next().ok_or_else(err)?.to_lowercase();

        let parsed = match command.as_str() {
            "status" => IpcCommand::Status,
            "shutdown" => IpcCommand::Shutdown,
            "binding" => {
                let binding = words.next().ok_or_else(err)?.parse().map_err(|_| err())?;
                let mask = match words.next() {
                    Some(mask) => mask.parse().map_err(|_| err())?,
                    None => ModifierMask::MOD1,
                };
                IpcCommand::Binding { binding, mask }
            }
            _ => return Err(err()),
        };

        if words.next().is_some() {
            return Err(err());
        }
        Ok(parsed)
    }
}

impl fmt::Display for IpcCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IpcCommand::Binding { binding, mask } => write!(f, "binding {} {}", binding, mask),
            IpcCommand::Status => write!(f, "status"),
            IpcCommand::Shutdown => write!(f, "shutdown"),
        }
    }
}
