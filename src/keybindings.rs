//! Switcher key bindings and their lookup table.
//!
//! Sway routes the switcher bindings to us through `bindsym ... exec
//! alttab-previews <binding>`. While a session holds the keyboard, key presses
//! are resolved back to the same logical actions through a table parsed from
//! those `bindsym` lines.

use crate::modifiers::{BINDING_MODIFIERS, ModifierMask};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

/// The four logical switcher actions a compositor can route to us.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Binding {
    SwitchApplications,
    SwitchApplicationsBackward,
    SwitchGroup,
    SwitchGroupBackward,
}

impl Binding {
    pub const ALL: [Binding; 4] = [
        Binding::SwitchApplications,
        Binding::SwitchApplicationsBackward,
        Binding::SwitchGroup,
        Binding::SwitchGroupBackward,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Binding::SwitchApplications => "switch-applications",
            Binding::SwitchApplicationsBackward => "switch-applications-backward",
            Binding::SwitchGroup => "switch-group",
            Binding::SwitchGroupBackward => "switch-group-backward",
        }
    }

    /// Group bindings restrict candidates to the focused window's application.
    pub fn is_group(self) -> bool {
        matches!(self, Binding::SwitchGroup | Binding::SwitchGroupBackward)
    }

    pub fn is_backward(self) -> bool {
        matches!(
            self,
            Binding::SwitchApplicationsBackward | Binding::SwitchGroupBackward
        )
    }

}

/// Error returned when parsing an unknown binding name
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseBindingError;

impl fmt::Display for ParseBindingError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid binding name")
    }
}

impl std::error::Error for ParseBindingError {}

impl FromStr for Binding {
    type Err = ParseBindingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim().to_lowercase().replace('_', "-");
        Binding::ALL
            .into_iter()
            .find(|b| b.name() == s)
            .ok_or(ParseBindingError)
    }
}

impl fmt::Display for Binding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct KeyCombo {
    mods: ModifierMask,
    keysym: String,
}

/// Maps physical key presses to switcher actions.
#[derive(Debug, Clone, Default)]
pub struct KeyBindingTable {
    entries: Vec<(KeyCombo, Binding)>,
}

impl KeyBindingTable {
    /// The GNOME defaults: Alt+Tab for applications, Alt+` for groups.
    pub fn defaults() -> Self {
        let mut table = KeyBindingTable::default();
        table.insert(ModifierMask::MOD1, "Tab", Binding::SwitchApplications);
        table.insert(
            ModifierMask::MOD1 | ModifierMask::SHIFT,
            "Tab",
            Binding::SwitchApplicationsBackward,
        );
        table.insert(ModifierMask::MOD1, "grave", Binding::SwitchGroup);
        table.insert(
            ModifierMask::MOD1 | ModifierMask::SHIFT,
            "grave",
            Binding::SwitchGroupBackward,
        );
        table
    }

    /// Build the table from a Sway config, falling back to the defaults when
    /// the config does not route any binding to the switcher.
    pub fn from_sway_config(config: &str) -> Self {
        let table = parse_sway_bindings(config);
        if table.is_empty() {
            Self::defaults()
        } else {
            table
        }
    }

    pub fn insert(&mut self, mods: ModifierMask, keysym: &str, binding: Binding) {
        let combo = KeyCombo {
            mods: mods & BINDING_MODIFIERS,
            keysym: normalize_keysym(keysym),
        };
        self.entries.retain(|(c, _)| c != &combo);
        self.entries.push((combo, binding));
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Resolve a key press to an action.
    ///
    /// An exact modifier match wins; otherwise Shift is ignored on both
    /// sides, so `Shift+Alt+Tab` still resolves when only `Alt+Tab` is bound.
    pub fn lookup(&self, keysym: &str, state: ModifierMask) -> Option<Binding> {
        let keysym = normalize_keysym(keysym);
        let mods = state & BINDING_MODIFIERS;

        let matching = |mask: ModifierMask| {
            self.entries
                .iter()
                .find(|(c, _)| c.keysym == keysym && c.mods - mask == mods - mask)
                .map(|(_, b)| *b)
        };

        matching(ModifierMask::empty()).or_else(|| matching(ModifierMask::SHIFT))
    }
}

/// Keysym names compare case-insensitively; Shift+Tab arrives as `ISO_Left_Tab`.
fn normalize_keysym(keysym: &str) -> String {
    let lower = keysym.to_ascii_lowercase();
    match lower.as_str() {
        "iso_left_tab" => "tab".to_string(),
        "`" => "grave".to_string(),
        _ => lower,
    }
}

fn parse_sway_bindings(config: &str) -> KeyBindingTable {
    let mut vars: HashMap<String, String> = HashMap::new();
    let mut table = KeyBindingTable::default();

    for line in config.lines() {
        let line = line.trim();
        if line.starts_with('#') {
            continue;
        }
        let mut tokens = line.split_whitespace();
        match tokens.next() {
            Some("set") => {
                if let (Some(name), Some(value)) = (tokens.next(), tokens.next()) {
                    vars.insert(name.to_string(), value.to_string());
                }
            }
            Some("bindsym") => {
                let mut rest = tokens.skip_while(|t| t.starts_with("--"));
                let Some(combo) = rest.next() else {
                    continue;
                };
                let command: Vec<&str> = rest.collect();
                let Some(binding) = command
                    .iter()
                    .skip_while(|t| !t.contains(env!("CARGO_PKG_NAME")))
                    .skip(1)
                    .find_map(|t| t.parse::<Binding>().ok())
                else {
                    continue;
                };

                let combo = substitute_vars(combo, &vars);
                if let Some((mods, keysym)) = parse_combo(&combo) {
                    table.insert(mods, &keysym, binding);
                }
            }
            _ => {}
        }
    }

    table
}

fn substitute_vars(combo: &str, vars: &HashMap<String, String>) -> String {
    combo
        .split('+')
        .map(|part| vars.get(part).map(String::as_str).unwrap_or(part))
        .collect::<Vec<_>>()
        .join("+")
}

fn parse_combo(combo: &str) -> Option<(ModifierMask, String)> {
    let mut parts: Vec<&str> = combo.split('+').collect();
    let keysym = parts.pop()?;
    if keysym.is_empty() {
        return None;
    }
    let mods = parts.into_iter().try_fold(ModifierMask::empty(), |mask, name| {
        ModifierMask::from_modifier_name(name).map(|m| mask | m)
    })?;
    Some((mods, keysym.to_string()))
}
