//! Back/forward history over visited desktop slots.
//!
//! The stack behaves like browser history: moving to a new desktop while at the
//! head appends, moving to a new desktop from the middle discards the abandoned
//! forward entries first.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::trace;

#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum HistoryError {
    #[error("already at the start of the desktop history")]
    AtHistoryStart,
    #[error("already at the end of the desktop history")]
    AtHistoryEnd,
}

#[derive(Debug, Clone, Default)]
pub struct NavigationHistory {
    stack: Vec<usize>,
    cursor: usize,
    desktop_count: usize,
}

impl NavigationHistory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records the externally observed active desktop. Returns whether the
    /// history changed.
    pub fn record_active(&mut self, slot: usize) -> bool {
        if self.stack.is_empty() {
            self.stack.push(slot);
            self.cursor = 0;
            return true;
        }

        if self.stack[self.cursor] == slot {
            return false;
        }

        if self.cursor + 1 < self.stack.len() {
            trace!(
                dropped = self.stack.len() - self.cursor - 1,
                "discarding forward history"
            );
            self.stack.truncate(self.cursor + 1);
        }
        self.stack.push(slot);
        self.cursor = self.stack.len() - 1;
        true
    }

    pub fn step_back(&mut self) -> Result<usize, HistoryError> {
        if !self.can_step_back() {
            return Err(HistoryError::AtHistoryStart);
        }
        self.cursor -= 1;
        Ok(self.stack[self.cursor])
    }

    pub fn step_forward(&mut self) -> Result<usize, HistoryError> {
        if !self.can_step_forward() {
            return Err(HistoryError::AtHistoryEnd);
        }
        self.cursor += 1;
        Ok(self.stack[self.cursor])
    }

    pub fn can_step_back(&self) -> bool {
        self.stack.len() > 1 && self.cursor > 0
    }

    pub fn can_step_forward(&self) -> bool {
        !self.stack.is_empty() && self.cursor < self.stack.len() - 1
    }

    /// Moves the cursor back to a position it held before a history step whose
    /// switch never got confirmed.
    pub fn restore_cursor(&mut self, cursor: usize) -> bool {
        if cursor >= self.stack.len() {
            return false;
        }
        self.cursor = cursor;
        true
    }

    pub fn grow_to(&mut self, count: usize) {
        debug_assert!(count >= self.desktop_count);
        self.desktop_count = count;
    }

    /// Entries pointing past the new end are kept; the next `record_active`
    /// repairs the state.
    pub fn shrink_to(&mut self, count: usize) {
        debug_assert!(count <= self.desktop_count);
        self.desktop_count = count;
        let stale = self.stale_entries();
        if stale > 0 {
            trace!(stale, count, "history holds slots past the last desktop");
        }
    }

    pub fn stale_entries(&self) -> usize {
        self.stack.iter().filter(|&&slot| slot >= self.desktop_count).count()
    }

    pub fn desktop_count(&self) -> usize {
        self.desktop_count
    }

    pub fn current(&self) -> Option<usize> {
        self.stack.get(self.cursor).copied()
    }

    pub fn cursor(&self) -> Option<usize> {
        (!self.stack.is_empty()).then_some(self.cursor)
    }

    pub fn get(&self, position: usize) -> Option<usize> {
        self.stack.get(position).copied()
    }

    pub fn entries(&self) -> &[usize] {
        &self.stack
    }

    pub fn len(&self) -> usize {
        self.stack.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stack.is_empty()
    }

    pub fn summary(&self) -> HistorySummary {
        HistorySummary {
            entries: self.stack.clone(),
            cursor: self.cursor(),
        }
    }
}

/// Snapshot of the history for diagnostics.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistorySummary {
    pub entries: Vec<usize>,
    pub cursor: Option<usize>,
}

impl fmt::Display for HistorySummary {
    /// Renders `[0, ①, 2]`, with the entry under the cursor circled.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("[")?;
        for (i, slot) in self.entries.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            if Some(i) == self.cursor {
                match circled(*slot) {
                    Some(ch) => write!(f, "{ch}")?,
                    None => write!(f, "({slot})")?,
                }
            } else {
                write!(f, "{slot}")?;
            }
        }
        f.write_str("]")
    }
}

fn circled(n: usize) -> Option<char> {
    match n {
        0 => Some('⓪'),
        1..=20 => char::from_u32(0x2460 + n as u32 - 1),
        _ => None,
    }
}
