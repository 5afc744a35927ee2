use tracing::{debug, info, warn};

use super::hotkey::{HistoryStep, HotkeyDispatcher};
use crate::actor::navigator::{Command, Navigator};
use crate::actor::ui::UiEvent;

pub struct CommandEventHandler;

impl CommandEventHandler {
    pub fn handle_command(navigator: &mut Navigator, command: Command) {
        match command {
            Command::NavigateBack => HotkeyDispatcher::navigate_history(navigator, HistoryStep::Back),
            Command::NavigateForward => {
                HotkeyDispatcher::navigate_history(navigator, HistoryStep::Forward)
            }
            Command::NavigateTo(slot) => HotkeyDispatcher::navigate_to(navigator, slot),
            Command::RenameDesktop { slot, name } => {
                if navigator.names.rename(slot, name) {
                    Self::names_edited(navigator);
                } else {
                    debug!(slot, "rename for unknown desktop");
                }
            }
            Command::MoveName { from, to } => {
                if navigator.names.move_name(from, to) {
                    Self::names_edited(navigator);
                } else {
                    debug!(from, to, "move outside the desktop list");
                }
            }
            Command::ReplaceBindings(bindings) => {
                info!(count = bindings.len(), "replacing switch shortcuts");
                navigator.bindings = bindings;
            }
            Command::OpenDesktopFolder => Self::open_desktop_folder(navigator),
        }
    }

    fn open_desktop_folder(navigator: &mut Navigator) {
        let Some(name) = navigator.current_slot_name() else {
            debug!("no current desktop to open a folder for");
            return;
        };
        let Some(folders) = navigator.space_folders.as_mut() else {
            debug!("desktop folders are disabled");
            return;
        };
        match folders.open(&name) {
            Ok(folder) => info!(folder = %folder.display(), "opened desktop folder"),
            Err(e) => warn!("could not open folder for {name:?}: {e:#}"),
        }
    }

    pub fn handle_bindings_changed(navigator: &mut Navigator) {
        match navigator.binding_source.load() {
            Ok(bindings) if bindings != navigator.bindings => {
                info!(count = bindings.len(), "switch shortcuts changed");
                navigator.bindings = bindings;
            }
            Ok(_) => debug!("switch shortcuts unchanged"),
            Err(e) => warn!("could not reload switch shortcuts: {e:#}"),
        }
    }

    fn names_edited(navigator: &mut Navigator) {
        navigator.persist_names();
        navigator.notify_ui(UiEvent::DesktopsChanged { names: navigator.names.to_vec() });
        if let Some(slot) = navigator.confirmed_slot() {
            navigator.notify_ui(UiEvent::ActiveDesktopChanged {
                slot,
                name: navigator.names.get(slot).map(str::to_string),
            });
        }
    }
}
