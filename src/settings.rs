//! Live view of the switcher's boolean settings.
//!
//! The store mirrors every boolean key of a `SettingsBackend` into a flat
//! map, keyed by the backend name with hyphens turned into underscores.
//! Sessions never read the store directly: they get a `SwitcherSettings`
//! snapshot taken when the session starts.

use anyhow::Result;
use std::collections::HashMap;
use tracing::{debug, warn};

/// A raw value as stored by a settings backend.
#[derive(Debug, Clone, PartialEq)]
pub enum SettingValue {
    Bool(bool),
    Int(i64),
    Str(String),
    Other,
}

pub trait SettingsBackend {
    /// Every key the backend knows about, in backend spelling
    fn list_keys(&self) -> Vec<String>;

    fn value(&self, key: &str) -> Option<SettingValue>;

    fn set_boolean(&mut self, key: &str, value: bool) -> Result<()>;

    /// Re-read backing storage. Returns the keys whose values changed.
    fn refresh(&mut self) -> Result<Vec<String>> {
        Ok(Vec::new())
    }
}

/// Normalize a backend key (`draw-borders`) to the store spelling (`draw_borders`).
pub fn normalize_key(key: &str) -> String {
    key.replace('-', "_")
}

pub struct SettingsStore<B: SettingsBackend> {
    backend: B,
    values: HashMap<String, bool>,
}

impl<B: SettingsBackend> SettingsStore<B> {
    pub fn new(backend: B) -> Self {
        SettingsStore {
            backend,
            values: HashMap::new(),
        }
    }

    /// Populate the map from every boolean key of the backend.
    pub fn load(&mut self) {
        self.values.clear();
        for key in self.backend.list_keys() {
            self.read_key(&key);
        }
        debug!("Loaded {} boolean settings", self.values.len());
    }

    /// Re-read a single key after the backend reported a change.
    pub fn on_change(&mut self, key: &str) {
        debug!("Setting changed: {}", key);
        self.read_key(key);
    }

    /// Pull fresh values from the backend and apply every changed key.
    pub fn refresh(&mut self) {
        match self.backend.refresh() {
            Ok(changed) => {
                for key in changed {
                    self.on_change(&key);
                }
            }
            Err(e) => warn!("Failed to refresh settings: {:#}", e),
        }
    }

    fn read_key(&mut self, key: &str) {
        match self.backend.value(key) {
            Some(SettingValue::Bool(value)) => {
                self.values.insert(normalize_key(key), value);
            }
            // Key disappeared from the backend
            None => {
                self.values.remove(&normalize_key(key));
            }
            Some(_) => {}
        }
    }

    pub fn get(&self, key: &str) -> Option<bool> {
        self.values.get(&normalize_key(key)).copied()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn backend_mut(&mut self) -> &mut B {
        &mut self.backend
    }

    pub fn snapshot(&self) -> SwitcherSettings {
        SwitcherSettings::from_map(&self.values)
    }
}

/// Settings as seen by one switcher session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SwitcherSettings {
    pub enforce_primary_monitor: bool,
    pub draw_borders: bool,
    pub switch_applications: bool,
    pub switch_group: bool,
}

impl Default for SwitcherSettings {
    fn default() -> Self {
        SwitcherSettings {
            enforce_primary_monitor: true,
            draw_borders: true,
            switch_applications: true,
            switch_group: true,
        }
    }
}

impl SwitcherSettings {
    /// Missing keys fall back to the defaults.
    pub fn from_map(values: &HashMap<String, bool>) -> Self {
        let defaults = SwitcherSettings::default();
        let get = |key: &str, default: bool| values.get(key).copied().unwrap_or(default);

        SwitcherSettings {
            enforce_primary_monitor: get(
                "enforce_primary_monitor",
                defaults.enforce_primary_monitor,
            ),
            draw_borders: get("draw_borders", defaults.draw_borders),
            switch_applications: get("switch_applications", defaults.switch_applications),
            switch_group: get("switch_group", defaults.switch_group),
        }
    }

    /// Whether the feature toggle for a binding is on
    pub fn binding_enabled(&self, binding: crate::keybindings::Binding) -> bool {
        if binding.is_group() {
            self.switch_group
        } else {
            self.switch_applications
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::keybindings::Binding;
    use crate::testing::MemoryBackend;

    fn backend() -> MemoryBackend {
        MemoryBackend::from_values(vec![
            ("enforce-primary-monitor", SettingValue::Bool(false)),
            ("draw-borders", SettingValue::Bool(true)),
            ("icon-size", SettingValue::Int(48)),
            ("theme", SettingValue::Str("dark".to_string())),
        ])
    }

    #[test]
    fn test_load_keeps_only_booleans() {
        let mut store = SettingsStore::new(backend());
        store.load();

        assert_eq!(store.len(), 2);
        assert_eq!(store.get("enforce_primary_monitor"), Some(false));
        assert_eq!(store.get("draw-borders"), Some(true));
        assert_eq!(store.get("icon_size"), None);
        assert_eq!(store.get("theme"), None);
    }

    #[test]
    fn test_on_change_updates_single_key() {
        let mut store = SettingsStore::new(backend());
        store.load();

        store
            .backend_mut()
            .set("draw-borders", SettingValue::Bool(false));
        store
            .backend_mut()
            .set("enforce-primary-monitor", SettingValue::Bool(true));
        store.on_change("draw-borders");

        assert_eq!(store.get("draw_borders"), Some(false));
        // Untouched until its own notification arrives
        assert_eq!(store.get("enforce_primary_monitor"), Some(false));
    }

    #[test]
    fn test_on_change_unknown_or_non_boolean_is_ignored() {
        let mut store = SettingsStore::new(backend());
        store.load();

        store.on_change("icon-size");
        store.on_change("no-such-key");
        assert_eq!(store.len(), 2);
    }

    #[test]
    fn test_on_change_removed_key() {
        let mut store = SettingsStore::new(backend());
        store.load();

        store.backend_mut().remove("draw-borders");
        store.on_change("draw-borders");
        assert_eq!(store.get("draw_borders"), None);
        assert!(store.snapshot().draw_borders); // default applies again
    }

    #[test]
    fn test_snapshot_defaults_and_overrides() {
        let mut store = SettingsStore::new(backend());
        assert_eq!(store.snapshot(), SwitcherSettings::default());

        store.load();
        let snapshot = store.snapshot();
        assert!(!snapshot.enforce_primary_monitor);
        assert!(snapshot.draw_borders);
        assert!(snapshot.switch_group);
    }

    #[test]
    fn test_refresh_applies_changed_keys() {
        let mut store = SettingsStore::new(backend());
        store.load();

        store
            .backend_mut()
            .stage_change("switch-group", SettingValue::Bool(false));
        store.refresh();

        assert_eq!(store.get("switch_group"), Some(false));
        assert!(!store.snapshot().binding_enabled(Binding::SwitchGroupBackward));
        assert!(store.snapshot().binding_enabled(Binding::SwitchApplications));
    }

    #[test]
    fn test_normalize_key() {
        assert_eq!(normalize_key("enforce-primary-monitor"), "enforce_primary_monitor");
        assert_eq!(normalize_key("draw_borders"), "draw_borders");
    }
}
