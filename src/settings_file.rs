//! JSON file settings backend.
//!
//! Settings live in a flat JSON object at
//! `$XDG_CONFIG_HOME/alttab-previews/settings.json`, keyed by hyphenated
//! names. Keys missing from the file take their default value.

use crate::events::ControlEvent;
use crate::settings::{SettingValue, SettingsBackend};
use anyhow::{Context, Result};
use gtk4::gio;
use gtk4::gio::prelude::*;
use serde_json::{Map, Value};
use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

/// Known keys and their defaults.
pub const DEFAULTS: &[(&str, bool)] = &[
    ("enforce-primary-monitor", true),
    ("draw-borders", true),
    ("switch-applications", true),
    ("switch-group", true),
];

/// Get the path to the settings file
pub fn default_path() -> Result<PathBuf> {
    let config_dir = dirs::config_dir().context("Could not determine config directory")?;
    Ok(config_dir.join(env!("CARGO_PKG_NAME")).join("settings.json"))
}

pub struct JsonFileBackend {
    path: PathBuf,
    values: Map<String, Value>,
}

impl JsonFileBackend {
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let values = read_values(&path)?;
        debug!("Opened settings at {} ({} keys)", path.display(), values.len());
        Ok(JsonFileBackend { path, values })
    }

    pub fn get_boolean(&self, key: &str) -> Option<bool> {
        self.values.get(key).and_then(Value::as_bool)
    }
}

impl SettingsBackend for JsonFileBackend {
    fn list_keys(&self) -> Vec<String> {
        self.values.keys().cloned().collect()
    }

    fn value(&self, key: &str) -> Option<SettingValue> {
        let value = match self.values.get(key)? {
            Value::Bool(b) => SettingValue::Bool(*b),
            Value::Number(n) => n.as_i64().map_or(SettingValue::Other, SettingValue::Int),
            Value::String(s) => SettingValue::Str(s.clone()),
            _ => SettingValue::Other,
        };
        Some(value)
    }

    fn set_boolean(&mut self, key: &str, value: bool) -> Result<()> {
        // Only the file's own keys are written back; defaults stay implicit.
        let mut file_values = read_file(&self.path)?.unwrap_or_default();
        file_values.insert(key.to_string(), Value::Bool(value));

        if let Some(dir) = self.path.parent() {
            fs::create_dir_all(dir)
                .with_context(|| format!("Failed to create {}", dir.display()))?;
        }
        let json = serde_json::to_string_pretty(&Value::Object(file_values))?;
        fs::write(&self.path, json + "\n")
            .with_context(|| format!("Failed to write {}", self.path.display()))?;

        info!("Set {} = {} in {}", key, value, self.path.display());
        self.values.insert(key.to_string(), Value::Bool(value));
        Ok(())
    }

    fn refresh(&mut self) -> Result<Vec<String>> {
        let fresh = read_values(&self.path)?;

        let keys: BTreeSet<&String> = self.values.keys().chain(fresh.keys()).collect();
        let changed: Vec<String> = keys
            .into_iter()
            .filter(|key| self.values.get(*key) != fresh.get(*key))
            .cloned()
            .collect();

        self.values = fresh;
        debug!("Settings refreshed, changed keys: {:?}", changed);
        Ok(changed)
    }
}

/// Read the file as a JSON object. `None` if the file does not exist.
fn read_file(path: &Path) -> Result<Option<Map<String, Value>>> {
    if !path.exists() {
        return Ok(None);
    }
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    if content.trim().is_empty() {
        return Ok(Some(Map::new()));
    }
    match serde_json::from_str(&content)
        .with_context(|| format!("Failed to parse {}", path.display()))?
    {
        Value::Object(map) => Ok(Some(map)),
        _ => anyhow::bail!("{} does not contain a JSON object", path.display()),
    }
}

/// Defaults overlaid with the file's values.
fn read_values(path: &Path) -> Result<Map<String, Value>> {
    let mut values: Map<String, Value> = DEFAULTS
        .iter()
        .map(|(key, value)| (key.to_string(), Value::Bool(*value)))
        .collect();

    match read_file(path)? {
        Some(file_values) => values.extend(file_values),
        None => debug!("No settings file at {}, using defaults", path.display()),
    }
    Ok(values)
}

/// Watch the settings file and post `SettingsFileChanged` on every completed change.
///
/// The returned monitor must be kept alive for as long as notifications are wanted.
pub fn watch(path: &Path, tx: mpsc::UnboundedSender<ControlEvent>) -> Result<gio::FileMonitor> {
    if let Some(dir) = path.parent() {
        fs::create_dir_all(dir).with_context(|| format!("Failed to create {}", dir.display()))?;
    }

    let monitor = gio::File::for_path(path)
        .monitor_file(gio::FileMonitorFlags::NONE, gio::Cancellable::NONE)
        .with_context(|| format!("Failed to watch {}", path.display()))?;

    monitor.connect_changed(move |_, _, _, event| {
        if matches!(
            event,
            gio::FileMonitorEvent::ChangesDoneHint
                | gio::FileMonitorEvent::Created
                | gio::FileMonitorEvent::Deleted
        ) && tx.send(ControlEvent::SettingsFileChanged).is_err()
        {
            warn!("Settings change dropped, controller is gone");
        }
    });

    info!("Watching settings file {}", path.display());
    Ok(monitor)
}
