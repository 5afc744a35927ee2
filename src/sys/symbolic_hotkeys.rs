//! The system's "Switch to Desktop N" shortcuts.

use std::path::PathBuf;

use serde_json::Value;
use tracing::{debug, trace};

use crate::model::{HotkeyBinding, HotkeyBindingTable};
use crate::sys::hotkey::Modifiers;
use crate::sys::plist;

/// Symbolic hotkey id of "Switch to Desktop 1"; desktop N uses `118 + N - 1`.
pub const FIRST_DESKTOP_HOTKEY_ID: usize = 118;
/// The system offers switch shortcuts for the first sixteen desktops.
pub const MAX_SHORTCUT_SLOTS: usize = 16;

pub trait BindingSource: Send {
    fn load(&mut self) -> anyhow::Result<HotkeyBindingTable>;
}

/// Reads `com.apple.symbolichotkeys.plist` and layers configured overrides on
/// top of it.
pub struct SymbolicHotkeySource {
    path: PathBuf,
    overrides: HotkeyBindingTable,
}

impl SymbolicHotkeySource {
    pub fn new(path: PathBuf, overrides: HotkeyBindingTable) -> Self {
        Self { path, overrides }
    }

    pub fn from_preferences(overrides: HotkeyBindingTable) -> Self {
        Self::new(plist::preference_path(plist::SYMBOLIC_HOTKEYS_PLIST), overrides)
    }
}

impl BindingSource for SymbolicHotkeySource {
    fn load(&mut self) -> anyhow::Result<HotkeyBindingTable> {
        let mut table = if self.path.exists() {
            parse_symbolic_hotkeys(&plist::read_as_json(&self.path)?)
        } else {
            debug!(path = %self.path.display(), "no symbolic hotkeys file");
            HotkeyBindingTable::new()
        };
        table.merge(&self.overrides);
        debug!(bindings = table.len(), "loaded desktop switch bindings");
        Ok(table)
    }
}

/// Extracts slot bindings from the JSON form of the symbolic hotkeys plist.
/// Entries that do not have the expected shape are skipped.
pub fn parse_symbolic_hotkeys(root: &Value) -> HotkeyBindingTable {
    let Some(hotkeys) = root.get("AppleSymbolicHotKeys") else {
        return HotkeyBindingTable::new();
    };
    (0..MAX_SHORTCUT_SLOTS)
        .filter_map(|slot| {
            let entry = hotkeys.get((FIRST_DESKTOP_HOTKEY_ID + slot).to_string())?;
            let binding = parse_entry(entry);
            if binding.is_none() {
                trace!(slot, ?entry, "skipping malformed symbolic hotkey");
            }
            binding.map(|b| (slot, b))
        })
        .collect()
}

fn parse_entry(entry: &Value) -> Option<HotkeyBinding> {
    let enabled = match entry.get("enabled")? {
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_i64()? != 0,
        _ => return None,
    };
    let parameters = entry.get("value")?.get("parameters")?.as_array()?;
    let keycode = u16::try_from(parameters.get(1)?.as_i64()?).ok()?;
    let mask = u64::try_from(parameters.get(2)?.as_i64()?).ok()?;
    Some(HotkeyBinding {
        keycode,
        enabled,
        modifiers: Modifiers::from_event_flags(mask),
    })
}
