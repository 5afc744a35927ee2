use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::debug;

/// Managed space id assigned by the window server.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct DesktopId(pub u64);

impl fmt::Display for DesktopId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "space#{}", self.0)
    }
}

/// A visible desktop at a given moment. `slot` is only meaningful for the
/// snapshot it came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Desktop {
    pub id: DesktopId,
    pub slot: usize,
    pub display: String,
}

/// Slots added or removed by one reconciliation, in the order they were
/// applied.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NameDelta {
    pub added: Vec<usize>,
    pub removed: Vec<usize>,
}

impl NameDelta {
    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.removed.is_empty()
    }
}

/// User-visible desktop names, indexed by slot.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DesktopNames {
    names: Vec<String>,
}

impl DesktopNames {
    pub fn new(names: Vec<String>) -> Self {
        Self { names }
    }

    pub fn default_name(prefix: &str, slot: usize) -> String {
        format!("{prefix} {}", slot + 1)
    }

    /// Matches the name list to `count` desktops: appends default names in
    /// ascending slot order or drops trailing names in descending order.
    pub fn reconcile(&mut self, count: usize, prefix: &str) -> NameDelta {
        let mut delta = NameDelta::default();
        while self.names.len() < count {
            let slot = self.names.len();
            self.names.push(Self::default_name(prefix, slot));
            delta.added.push(slot);
        }
        while self.names.len() > count {
            self.names.pop();
            delta.removed.push(self.names.len());
        }
        if !delta.is_empty() {
            debug!(?delta, count, "reconciled desktop names");
        }
        delta
    }

    pub fn rename(&mut self, slot: usize, name: impl Into<String>) -> bool {
        match self.names.get_mut(slot) {
            Some(existing) => {
                *existing = name.into();
                true
            }
            None => false,
        }
    }

    /// Drag-to-reorder: `to` is the drop row in the list as it was before the
    /// move, so dropping below the source shifts the target up by one.
    pub fn move_name(&mut self, from: usize, to: usize) -> bool {
        if from >= self.names.len() || to > self.names.len() {
            return false;
        }
        let name = self.names.remove(from);
        let insert_at = if from < to { to - 1 } else { to };
        self.names.insert(insert_at, name);
        true
    }

    pub fn get(&self, slot: usize) -> Option<&str> {
        self.names.get(slot).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    pub fn as_slice(&self) -> &[String] {
        &self.names
    }

    pub fn to_vec(&self) -> Vec<String> {
        self.names.clone()
    }

    pub fn picker_entries(&self, has_shortcut: impl Fn(usize) -> bool) -> Vec<PickerEntry> {
        self.names
            .iter()
            .enumerate()
            .map(|(slot, name)| PickerEntry {
                slot,
                name: name.clone(),
                has_shortcut: has_shortcut(slot),
            })
            .collect()
    }
}

/// One row of the desktop picker.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PickerEntry {
    pub slot: usize,
    pub name: String,
    pub has_shortcut: bool,
}

impl PickerEntry {
    pub fn title(&self) -> String {
        let number = self.slot + 1;
        let pad = if number < 10 { " " } else { "" };
        let warning = if self.has_shortcut { "" } else { "   ⚠️" };
        format!("{pad}{number}.\t{}{warning}", self.name)
    }
}
