//! Registers the navigation hotkeys with Carbon and forwards presses to the
//! navigator.

use tracing::{debug, info, warn};

use super::navigator::{self, Event, HotkeyAction};
use crate::common::config::NavigationHotkeys;
use crate::sys::carbon::{
    CarbonError, CarbonListener, EventHotKeyId, K_EVENT_CLASS_KEYBOARD, K_EVENT_HOT_KEY_PRESSED,
    NO_ERR, RegisteredHotKey, event_type,
};
use crate::sys::hotkey::Hotkey;

const SIGNATURE: u32 = 0x6e_73_70_63; // 'nspc'

const ACTIONS: [HotkeyAction; 3] =
    [HotkeyAction::Back, HotkeyAction::Forward, HotkeyAction::OpenPicker];

fn hot_key_id(action: HotkeyAction) -> EventHotKeyId {
    let id = match action {
        HotkeyAction::Back => 1,
        HotkeyAction::Forward => 2,
        HotkeyAction::OpenPicker => 3,
    };
    EventHotKeyId { signature: SIGNATURE, id }
}

fn action_for(id: EventHotKeyId) -> Option<HotkeyAction> {
    if id.signature != SIGNATURE {
        return None;
    }
    ACTIONS.into_iter().find(|&action| hot_key_id(action) == id)
}

fn hotkey_for(hotkeys: &NavigationHotkeys, action: HotkeyAction) -> &Hotkey {
    match action {
        HotkeyAction::Back => &hotkeys.back,
        HotkeyAction::Forward => &hotkeys.forward,
        HotkeyAction::OpenPicker => &hotkeys.open_picker,
    }
}

/// Owns the hotkey registrations. Dropping it unregisters everything.
pub struct HotkeyManager {
    _registered: Vec<RegisteredHotKey>,
    _listener: CarbonListener,
}

impl HotkeyManager {
    /// Must be called on the main thread before the run loop starts.
    pub fn new(
        hotkeys: &NavigationHotkeys,
        events_tx: navigator::Sender,
    ) -> Result<Self, CarbonError> {
        let types = [event_type(K_EVENT_CLASS_KEYBOARD, K_EVENT_HOT_KEY_PRESSED)];
        let listener = CarbonListener::application(&types, move |ev| {
            if let Some(action) = ev.hot_key_id().and_then(action_for) {
                debug!(?action, "hotkey pressed");
                events_tx.send(Event::Hotkey(action));
            }
            NO_ERR
        })?;

        let mut registered = Vec::with_capacity(ACTIONS.len());
        for action in ACTIONS {
            let hotkey = hotkey_for(hotkeys, action);
            match RegisteredHotKey::register(
                hotkey.key_code.virtual_keycode(),
                hotkey.modifiers.to_carbon(),
                hot_key_id(action),
            ) {
                Ok(key) => {
                    info!(?action, %hotkey, "registered hotkey");
                    registered.push(key);
                }
                // Another app may own the combination; the rest still work.
                Err(e) => warn!(?action, %hotkey, "could not register hotkey: {e}"),
            }
        }

        Ok(Self {
            _registered: registered,
            _listener: listener,
        })
    }
}
