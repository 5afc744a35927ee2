//! Per-slot "switch to desktop N" shortcuts.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::common::collections::HashMap;
use crate::sys::hotkey::{Hotkey, KeyCode, Modifiers};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct HotkeyBinding {
    pub keycode: u16,
    pub enabled: bool,
    pub modifiers: Modifiers,
}

impl HotkeyBinding {
    pub fn new(keycode: u16, modifiers: Modifiers) -> Self {
        Self { keycode, enabled: true, modifiers }
    }

    pub fn disabled(mut self) -> Self {
        self.enabled = false;
        self
    }
}

/// Spelled like a configured hotkey when the keycode has a name, otherwise
/// as the raw keycode.
impl fmt::Display for HotkeyBinding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match KeyCode::from_virtual_keycode(self.keycode) {
            Some(key) => write!(f, "{}", Hotkey::new(self.modifiers, key))?,
            None if self.modifiers.is_empty() => write!(f, "keycode {}", self.keycode)?,
            None => write!(f, "{} + keycode {}", self.modifiers, self.keycode)?,
        }
        if !self.enabled {
            write!(f, " (disabled)")?;
        }
        Ok(())
    }
}

/// Shortcut table keyed by slot. A slot without an entry has no shortcut.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct HotkeyBindingTable {
    bindings: HashMap<usize, HotkeyBinding>,
}

impl HotkeyBindingTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, slot: usize, binding: HotkeyBinding) -> Option<HotkeyBinding> {
        self.bindings.insert(slot, binding)
    }

    pub fn remove(&mut self, slot: usize) -> Option<HotkeyBinding> {
        self.bindings.remove(&slot)
    }

    pub fn get(&self, slot: usize) -> Option<&HotkeyBinding> {
        self.bindings.get(&slot)
    }

    pub fn enabled_binding(&self, slot: usize) -> Option<HotkeyBinding> {
        self.bindings.get(&slot).copied().filter(|b| b.enabled)
    }

    pub fn has_shortcut(&self, slot: usize) -> bool {
        self.enabled_binding(slot).is_some()
    }

    /// Entries in `overrides` replace the ones already present.
    pub fn merge(&mut self, overrides: &HotkeyBindingTable) {
        for (&slot, &binding) in &overrides.bindings {
            self.bindings.insert(slot, binding);
        }
    }

    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }

    /// Bindings ordered by slot.
    pub fn sorted(&self) -> Vec<(usize, HotkeyBinding)> {
        let mut entries: Vec<_> = self.bindings.iter().map(|(&s, &b)| (s, b)).collect();
        entries.sort_by_key(|(slot, _)| *slot);
        entries
    }
}

impl FromIterator<(usize, HotkeyBinding)> for HotkeyBindingTable {
    fn from_iter<T: IntoIterator<Item = (usize, HotkeyBinding)>>(iter: T) -> Self {
        Self { bindings: iter.into_iter().collect() }
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use test_log::test;

    use super::*;

    const CTRL: Modifiers = Modifiers::CONTROL;

    #[test]
    fn disabled_and_missing_bindings_have_no_shortcut() {
        let table: HotkeyBindingTable = [
            (0, HotkeyBinding::new(18, CTRL)),
            (1, HotkeyBinding::new(19, CTRL).disabled()),
        ]
        .into_iter()
        .collect();

        assert_eq!(Some(HotkeyBinding::new(18, CTRL)), table.enabled_binding(0));
        assert_eq!(None, table.enabled_binding(1));
        assert!(table.get(1).is_some());
        assert!(!table.has_shortcut(2));
    }

    #[test]
    fn merge_overrides_by_slot() {
        let mut table: HotkeyBindingTable = [
            (0, HotkeyBinding::new(18, CTRL)),
            (1, HotkeyBinding::new(19, CTRL)),
        ]
        .into_iter()
        .collect();
        let overrides: HotkeyBindingTable = [
            (1, HotkeyBinding::new(19, CTRL).disabled()),
            (4, HotkeyBinding::new(21, CTRL | Modifiers::SHIFT)),
        ]
        .into_iter()
        .collect();

        table.merge(&overrides);

        assert_eq!(
            vec![
                (0, HotkeyBinding::new(18, CTRL)),
                (1, HotkeyBinding::new(19, CTRL).disabled()),
                (4, HotkeyBinding::new(21, CTRL | Modifiers::SHIFT)),
            ],
            table.sorted()
        );
    }

    #[test]
    fn bindings_display_key_names_when_known() {
        assert_eq!("Ctrl + 1", HotkeyBinding::new(18, CTRL).to_string());
        assert_eq!(
            "Ctrl + Shift + Down (disabled)",
            HotkeyBinding::new(0x7D, CTRL | Modifiers::SHIFT).disabled().to_string()
        );
        assert_eq!("Ctrl + keycode 127", HotkeyBinding::new(0x7F, CTRL).to_string());
        assert_eq!("keycode 127", HotkeyBinding::new(0x7F, Modifiers::empty()).to_string());
    }
}
