use tracing::{debug, trace};

use crate::actor::navigator::{HotkeyAction, Navigator, PendingNavigation};
use crate::actor::ui::UiEvent;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HistoryStep {
    Back,
    Forward,
}

pub struct HotkeyDispatcher;

impl HotkeyDispatcher {
    pub fn handle_hotkey(navigator: &mut Navigator, action: HotkeyAction) {
        match action {
            HotkeyAction::Back => Self::navigate_history(navigator, HistoryStep::Back),
            HotkeyAction::Forward => Self::navigate_history(navigator, HistoryStep::Forward),
            HotkeyAction::OpenPicker => Self::open_picker(navigator),
        }
    }

    /// Moves the history cursor and switches to the desktop under it. The
    /// cursor goes back to where it was if the switch fails.
    pub fn navigate_history(navigator: &mut Navigator, step: HistoryStep) {
        let Some(cursor) = navigator.history.cursor() else {
            trace!(?step, "no history yet");
            return;
        };
        let moved = match step {
            HistoryStep::Back => navigator.history.step_back(),
            HistoryStep::Forward => navigator.history.step_forward(),
        };
        let target = match moved {
            Ok(target) => target,
            Err(e) => {
                trace!(?step, "{e}");
                return;
            }
        };

        // Repeated steps keep the position of the last confirmed desktop.
        let origin_cursor = navigator.pending_nav.map_or(cursor, |p| p.origin_cursor);
        debug!(?step, slot = target, history = %navigator.history.summary(), "history step");

        match navigator.driver.request_switch(target, &navigator.bindings) {
            Ok(token) => {
                navigator.pending_nav = Some(PendingNavigation { token, origin_cursor, target });
            }
            Err(e) => {
                navigator.pending_nav = None;
                navigator.history.restore_cursor(origin_cursor);
                navigator.report_switch_failure(e);
            }
        }
    }

    /// Switches to `slot` without touching the history; the history follows
    /// once the switch is observed.
    pub fn navigate_to(navigator: &mut Navigator, slot: usize) {
        Self::roll_back_pending(navigator);
        if let Err(e) = navigator.driver.request_switch(slot, &navigator.bindings) {
            navigator.report_switch_failure(e);
        }
    }

    pub fn roll_back_pending(navigator: &mut Navigator) {
        if let Some(pending) = navigator.pending_nav.take() {
            navigator.history.restore_cursor(pending.origin_cursor);
            debug!(
                slot = pending.target,
                cursor = pending.origin_cursor,
                "rolled back unconfirmed history step"
            );
        }
    }

    fn open_picker(navigator: &mut Navigator) {
        let bindings = &navigator.bindings;
        let entries = navigator.names.picker_entries(|slot| bindings.has_shortcut(slot));
        navigator.notify_ui(UiEvent::OpenPicker { entries });
    }
}
