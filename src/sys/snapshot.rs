//! Point-in-time reads of the visible desktops and the active one.

use thiserror::Error;
use tracing::{trace, warn};

use crate::model::{Desktop, DesktopId};

/// Identifier the window server reports for the primary display when displays
/// share a single set of spaces.
pub const MAIN_DISPLAY: &str = "Main";

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SnapshotError {
    #[error("desktop snapshot provider failed: {0}")]
    Provider(String),
    #[error("no display reports an active desktop")]
    NoActiveDesktop,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawSpace {
    pub id: u64,
    /// Fullscreen tiles occupy a space but are not user desktops.
    pub tiled: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawDisplay {
    pub identifier: String,
    pub current_space: Option<u64>,
    pub spaces: Vec<RawSpace>,
}

/// Unprocessed provider output, one entry per display in window server order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawSnapshot {
    pub displays: Vec<RawDisplay>,
    /// Display owning the active menu bar.
    pub active_display: Option<String>,
}

pub trait SnapshotProvider: Send {
    fn snapshot(&self) -> Result<RawSnapshot, SnapshotError>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DesktopSnapshot {
    pub desktops: Vec<Desktop>,
    pub active: DesktopId,
}

impl DesktopSnapshot {
    /// `None` when the active space is not a user desktop, e.g. a fullscreen
    /// tile.
    pub fn active_slot(&self) -> Option<usize> {
        self.desktops.iter().find(|d| d.id == self.active).map(|d| d.slot)
    }

    pub fn len(&self) -> usize {
        self.desktops.len()
    }

    pub fn is_empty(&self) -> bool {
        self.desktops.is_empty()
    }
}

pub struct DesktopSnapshotReader {
    provider: Box<dyn SnapshotProvider>,
}

impl DesktopSnapshotReader {
    pub fn new(provider: Box<dyn SnapshotProvider>) -> Self {
        Self { provider }
    }

    pub fn read(&self) -> Result<DesktopSnapshot, SnapshotError> {
        let raw = self.provider.snapshot()?;
        let snapshot = Self::flatten(&raw)?;
        trace!(count = snapshot.len(), active = %snapshot.active, "read desktop snapshot");
        Ok(snapshot)
    }

    /// Orders desktops by display then by position on that display, dropping
    /// tiled spaces. The active desktop comes from the main display when it
    /// reports one, otherwise from the display owning the menu bar.
    pub fn flatten(raw: &RawSnapshot) -> Result<DesktopSnapshot, SnapshotError> {
        let mut desktops = Vec::new();
        for display in &raw.displays {
            for space in display.spaces.iter().filter(|s| !s.tiled) {
                desktops.push(Desktop {
                    id: DesktopId(space.id),
                    slot: desktops.len(),
                    display: display.identifier.clone(),
                });
            }
        }

        let current_on = |identifier: &str| {
            raw.displays
                .iter()
                .find(|d| d.identifier == identifier)
                .and_then(|d| d.current_space)
        };
        let active = current_on(MAIN_DISPLAY)
            .or_else(|| raw.active_display.as_deref().and_then(current_on))
            .ok_or_else(|| {
                warn!(active_display = ?raw.active_display, "snapshot has no active desktop");
                SnapshotError::NoActiveDesktop
            })?;

        Ok(DesktopSnapshot { desktops, active: DesktopId(active) })
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use test_log::test;

    use super::*;

    struct Fixed(Result<RawSnapshot, SnapshotError>);

    impl SnapshotProvider for Fixed {
        fn snapshot(&self) -> Result<RawSnapshot, SnapshotError> {
            self.0.clone()
        }
    }

    fn display(identifier: &str, current: Option<u64>, spaces: &[(u64, bool)]) -> RawDisplay {
        RawDisplay {
            identifier: identifier.to_string(),
            current_space: current,
            spaces: spaces.iter().map(|&(id, tiled)| RawSpace { id, tiled }).collect(),
        }
    }

    #[test]
    fn tiled_spaces_do_not_take_slots() {
        let raw = RawSnapshot {
            displays: vec![display(MAIN_DISPLAY, Some(7), &[(3, false), (9, true), (7, false)])],
            active_display: Some(MAIN_DISPLAY.into()),
        };
        let snapshot = DesktopSnapshotReader::flatten(&raw).unwrap();
        let ids: Vec<_> = snapshot.desktops.iter().map(|d| (d.id.0, d.slot)).collect();
        assert_eq!(vec![(3, 0), (7, 1)], ids);
        assert_eq!(Some(1), snapshot.active_slot());
    }

    #[test]
    fn main_display_wins_over_menu_bar_display() {
        let raw = RawSnapshot {
            displays: vec![
                display("B-UUID", Some(20), &[(20, false)]),
                display(MAIN_DISPLAY, Some(11), &[(10, false), (11, false)]),
            ],
            active_display: Some("B-UUID".into()),
        };
        let snapshot = DesktopSnapshotReader::flatten(&raw).unwrap();
        assert_eq!(DesktopId(11), snapshot.active);
        assert_eq!(Some(2), snapshot.active_slot());
    }

    #[test]
    fn falls_back_to_menu_bar_display() {
        let raw = RawSnapshot {
            displays: vec![
                display("A-UUID", Some(1), &[(1, false), (2, false)]),
                display("B-UUID", Some(5), &[(5, false)]),
            ],
            active_display: Some("B-UUID".into()),
        };
        let snapshot = DesktopSnapshotReader::flatten(&raw).unwrap();
        assert_eq!(Some(2), snapshot.active_slot());
        assert_eq!("B-UUID", snapshot.desktops[2].display);
    }

    #[test]
    fn active_tile_has_no_slot() {
        let raw = RawSnapshot {
            displays: vec![display(MAIN_DISPLAY, Some(9), &[(3, false), (9, true)])],
            active_display: None,
        };
        let snapshot = DesktopSnapshotReader::flatten(&raw).unwrap();
        assert_eq!(None, snapshot.active_slot());
        assert_eq!(1, snapshot.len());
    }

    #[test]
    fn missing_active_display_is_an_error() {
        let raw = RawSnapshot {
            displays: vec![display("A-UUID", Some(1), &[(1, false)])],
            active_display: Some("gone".into()),
        };
        assert_eq!(
            Err(SnapshotError::NoActiveDesktop),
            DesktopSnapshotReader::flatten(&raw)
        );
    }

    #[test]
    fn provider_errors_pass_through() {
        let reader = DesktopSnapshotReader::new(Box::new(Fixed(Err(SnapshotError::Provider(
            "null".into(),
        )))));
        assert_eq!(Err(SnapshotError::Provider("null".into())), reader.read());
    }
}
