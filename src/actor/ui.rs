//! Outgoing notifications for whatever presents desktops to the user.
//!
//! The menu bar and picker are not part of this crate; the binary attaches
//! [`LoggingUi`] so outcomes are at least visible in the log.

use tracing::{info, warn};

use crate::actor;
use crate::actor::navigator::SwitchError;
use crate::model::PickerEntry;

pub type Sender = actor::Sender<UiEvent>;
pub type Receiver = actor::Receiver<UiEvent>;

#[derive(Debug, Clone, PartialEq)]
pub enum UiEvent {
    ActiveDesktopChanged { slot: usize, name: Option<String> },
    SwitchSucceeded { slot: usize },
    SwitchFailed(SwitchError),
    /// Desktops were added, removed, renamed or reordered.
    DesktopsChanged { names: Vec<String> },
    OpenPicker { entries: Vec<PickerEntry> },
}

pub struct LoggingUi {
    rx: Receiver,
}

impl LoggingUi {
    pub fn new(rx: Receiver) -> Self {
        Self { rx }
    }

    pub async fn run(mut self) {
        while let Some((span, event)) = self.rx.recv().await {
            let _guard = span.enter();
            Self::handle_event(event);
        }
    }

    fn handle_event(event: UiEvent) {
        match event {
            UiEvent::ActiveDesktopChanged { slot, name } => {
                info!(slot, name = name.as_deref().unwrap_or("?"), "active desktop");
            }
            UiEvent::SwitchSucceeded { slot } => info!(slot, "switch confirmed"),
            UiEvent::SwitchFailed(e) => warn!("switch failed: {e}"),
            UiEvent::DesktopsChanged { names } => info!(?names, "desktops changed"),
            UiEvent::OpenPicker { entries } => {
                for entry in entries {
                    info!("{}", entry.title());
                }
            }
        }
    }
}
