use crate::keybindings::Binding;
use crate::modifiers::ModifierMask;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Debug, Clone, Args)]
pub struct BindingArgs {
    /// Modifiers of the key combo that triggered the binding, e.g. `Mod1` or `Mod4+Shift`
    #[arg(long, default_value = "Mod1")]
    pub mask: ModifierMask,
}

#[derive(Debug, Clone, Subcommand)]
pub enum Command {
    /// Run as daemon (default if no command specified)
    Daemon,
    /// Switch between the windows of the current workspace
    SwitchApplications(BindingArgs),
    /// Like switch-applications, cycling backwards
    SwitchApplicationsBackward(BindingArgs),
    /// Switch between the windows of the focused application
    SwitchGroup(BindingArgs),
    /// Like switch-group, cycling backwards
    SwitchGroupBackward(BindingArgs),
    /// Open the preferences window
    Prefs,
    /// Change a boolean setting, e.g. `set draw-borders false`
    Set {
        key: String,
        #[arg(action = clap::ArgAction::Set)]
        value: bool,
    },
    /// Query daemon status
    Status,
    /// Shutdown the daemon
    Shutdown,
}

impl Command {
    /// The switcher binding this command fires, if it is one
    pub fn binding(&self) -> Option<(Binding, ModifierMask)> {
        let (binding, args) = match self {
            Command::SwitchApplications(args) => (Binding::SwitchApplications, args),
            Command::SwitchApplicationsBackward(args) => (Binding::SwitchApplicationsBackward, args),
            Command::SwitchGroup(args) => (Binding::SwitchGroup, args),
            Command::SwitchGroupBackward(args) => (Binding::SwitchGroupBackward, args),
            _ => return None,
        };
        Some((binding, args.mask))
    }
}

#[derive(Debug, Clone, Parser)]
#[command(name = "alttab-previews")]
#[command(about = "Alt-Tab window switcher with live previews for Sway", long_about = None)]
pub struct Config {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Settings file (defaults to $XDG_CONFIG_HOME/alttab-previews/settings.json)
    #[arg(long, global = true)]
    pub settings: Option<PathBuf>,

    /// Command to execute
    #[command(subcommand)]
    pub command: Option<Command>,
}

impl Config {
    pub fn parse() -> Self {
        <Config as Parser>::parse()
    }

    /// Get the command, defaulting to Daemon if none specified
    pub fn command(&self) -> Command {
        self.command.clone().unwrap_or(Command::Daemon)
    }
}
