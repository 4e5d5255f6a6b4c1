//! Keyboard modifier masks.
//!
//! Bit values follow the GDK modifier layout for the low bits so that masks
//! coming from GTK events convert cheaply; `MOD4` stands in for GDK's super bit.

use bitflags::bitflags;
use std::fmt;
use std::str::FromStr;

bitflags! {
    /// Set of held (or bound) keyboard modifiers.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct ModifierMask: u32 {
        const SHIFT   = 1 << 0;
        const LOCK    = 1 << 1;
        const CONTROL = 1 << 2;
        /// Alt on nearly every layout
        const MOD1    = 1 << 3;
        /// Num Lock on nearly every layout
        const MOD2    = 1 << 4;
        const MOD3    = 1 << 5;
        /// Super / Logo
        const MOD4    = 1 << 6;
        const MOD5    = 1 << 7;
    }
}

/// Modifiers that take part in key-binding matching. Lock and Num Lock never do.
pub const BINDING_MODIFIERS: ModifierMask = ModifierMask::SHIFT
    .union(ModifierMask::CONTROL)
    .union(ModifierMask::MOD1)
    .union(ModifierMask::MOD3)
    .union(ModifierMask::MOD4)
    .union(ModifierMask::MOD5);

impl ModifierMask {
    /// Reduce a binding mask to its single most significant modifier.
    ///
    /// A binding such as `Shift+Alt+Tab` keeps the session alive for as long
    /// as Alt is held, regardless of what happens to Shift.
    pub fn primary(self) -> ModifierMask {
        if self.is_empty() {
            return ModifierMask::empty();
        }
        let top = 31 - self.bits().leading_zeros();
        ModifierMask::from_bits_retain(1 << top)
    }

    /// Parse a single modifier name as written in Sway configs and on the CLI.
    pub fn from_modifier_name(name: &str) -> Option<ModifierMask> {
        let mask = match name.to_ascii_lowercase().as_str() {
            "shift" => ModifierMask::SHIFT,
            "lock" | "capslock" => ModifierMask::LOCK,
            "control" | "ctrl" => ModifierMask::CONTROL,
            "mod1" | "alt" => ModifierMask::MOD1,
            "mod2" => ModifierMask::MOD2,
            "mod3" => ModifierMask::MOD3,
            "mod4" | "super" | "logo" => ModifierMask::MOD4,
            "mod5" => ModifierMask::MOD5,
            _ => return None,
        };
        Some(mask)
    }
}

/// Error returned when a modifier string contains an unknown name
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseModifierError(pub String);

impl fmt::Display for ParseModifierError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown modifier: {}", self.0)
    }
}

impl std::error::Error for ParseModifierError {}

impl FromStr for ModifierMask {
    type Err = ParseModifierError;

    /// Parses `Mod1+Shift` style lists. An empty string or `none` is the empty mask.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.is_empty() || s.eq_ignore_ascii_case("none") {
            return Ok(ModifierMask::empty());
        }

        s.split('+')
            .map(str::trim)
            .try_fold(ModifierMask::empty(), |mask, name| {
                ModifierMask::from_modifier_name(name)
                    .map(|m| mask | m)
                    .ok_or_else(|| ParseModifierError(name.to_string()))
            })
    }
}

impl fmt::Display for ModifierMask {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_empty() {
            return write!(f, "none");
        }

        let names = [
            (ModifierMask::SHIFT, "Shift"),
            (ModifierMask::LOCK, "Lock"),
            (ModifierMask::CONTROL, "Control"),
            (ModifierMask::MOD1, "Mod1"),
            (ModifierMask::MOD2, "Mod2"),
            (ModifierMask::MOD3, "Mod3"),
            (ModifierMask::MOD4, "Mod4"),
            (ModifierMask::MOD5, "Mod5"),
        ];
        let parts: Vec<&str> = names
            .iter()
            .filter(|(flag, _)| self.contains(*flag))
            .map(|(_, name)| *name)
            .collect();
        write!(f, "{}", parts.join("+"))
    }
}
