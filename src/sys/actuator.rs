//! Presses the system "switch to desktop" shortcut on our behalf.

use std::process::Command;

use tracing::{debug, warn};

use crate::sys::hotkey::Modifiers;

/// Fire-and-forget request for the window server to switch desktops. The
/// effect is observed later through snapshots, never through the return value.
pub trait SwitchActuator: Send {
    fn perform(&mut self, keycode: u16, modifiers: Modifiers);
}

/// Maps a shortcut keycode to the keycode that produces the same character on
/// the active keyboard layout. Only consulted for command shortcuts.
pub trait KeycodeRemapper: Send {
    fn remap(&self, keycode: u16) -> u16;
}

pub struct IdentityRemapper;

impl KeycodeRemapper for IdentityRemapper {
    fn remap(&self, keycode: u16) -> u16 {
        keycode
    }
}

pub struct OsascriptActuator {
    remapper: Box<dyn KeycodeRemapper>,
}

impl OsascriptActuator {
    pub fn new(remapper: Box<dyn KeycodeRemapper>) -> Self {
        Self { remapper }
    }
}

impl Default for OsascriptActuator {
    fn default() -> Self {
        Self::new(Box::new(IdentityRemapper))
    }
}

impl SwitchActuator for OsascriptActuator {
    fn perform(&mut self, keycode: u16, modifiers: Modifiers) {
        let keycode = if modifiers.contains(Modifiers::COMMAND) {
            self.remapper.remap(keycode)
        } else {
            keycode
        };
        let script = applescript_for(keycode, modifiers);
        debug!(%script, "sending switch shortcut");

        let spawned = std::thread::Builder::new().name("osascript".to_string()).spawn(move || {
            match Command::new("/usr/bin/osascript").arg("-e").arg(&script).output() {
                Ok(output) if output.status.success() => {}
                Ok(output) => warn!(
                    status = ?output.status,
                    stderr = %String::from_utf8_lossy(&output.stderr).trim(),
                    "osascript rejected switch shortcut"
                ),
                Err(e) => warn!("failed to run osascript: {e}"),
            }
        });
        if let Err(e) = spawned {
            warn!("failed to spawn osascript thread: {e}");
        }
    }
}

/// `tell application "System Events" to key code 18 using {shift down, control down}`
pub fn applescript_for(keycode: u16, modifiers: Modifiers) -> String {
    let held: Vec<String> = Modifiers::ORDERED
        .iter()
        .filter(|(m, _)| modifiers.contains(*m))
        .map(|(_, name)| format!("{name} down"))
        .collect();
    let using = match held.as_slice() {
        [] => String::new(),
        [only] => format!(" using {only}"),
        many => format!(" using {{{}}}", many.join(", ")),
    };
    format!("tell application \"System Events\" to key code {keycode}{using}")
}
