use std::cmp::Ordering;

use tracing::{debug, trace, warn};

use crate::actor::navigator::{Navigator, RetryToken, SwitchError, TickOutcome};
use crate::actor::ui::UiEvent;
use crate::sys::snapshot::DesktopSnapshot;

pub struct DesktopChangeObserver;

impl DesktopChangeObserver {
    pub fn handle_spaces_changed(navigator: &mut Navigator) {
        match navigator.reader.read() {
            Ok(snapshot) => Self::observe(navigator, &snapshot),
            Err(e) => warn!("desktop snapshot unavailable: {e}"),
        }
    }

    pub fn handle_retry_tick(navigator: &mut Navigator, token: RetryToken) {
        match navigator.driver.on_tick(token, &navigator.reader) {
            TickOutcome::Stale | TickOutcome::Pending => {}
            TickOutcome::Succeeded { slot, snapshot } => {
                if navigator.pending_nav.is_some_and(|p| p.token == token) {
                    navigator.pending_nav = None;
                }
                Self::observe(navigator, &snapshot);
                navigator.notify_ui(UiEvent::SwitchSucceeded { slot });
            }
            TickOutcome::TimedOut(slot) => {
                if navigator.pending_nav.is_some_and(|p| p.token == token) {
                    super::hotkey::HotkeyDispatcher::roll_back_pending(navigator);
                }
                navigator.report_switch_failure(SwitchError::SwitchTimedOut(slot));
            }
        }
    }

    /// Applies one snapshot: match names and tracked count to the desktops
    /// that exist, then record the active one.
    pub fn observe(navigator: &mut Navigator, snapshot: &DesktopSnapshot) {
        let count = snapshot.len();
        match count.cmp(&navigator.history.desktop_count()) {
            Ordering::Greater => navigator.history.grow_to(count),
            Ordering::Less => navigator.history.shrink_to(count),
            Ordering::Equal => {}
        }
        let delta = navigator.names.reconcile(count, &navigator.name_prefix);
        if !delta.is_empty() {
            navigator.persist_names();
            navigator.notify_ui(UiEvent::DesktopsChanged { names: navigator.names.to_vec() });
        }

        let Some(slot) = snapshot.active_slot() else {
            debug!(active = %snapshot.active, "active space is not a desktop");
            return;
        };

        if let Some(pending) = navigator.pending_nav {
            let origin = navigator.history.get(pending.origin_cursor);
            if slot == pending.target {
                navigator.pending_nav = None;
            } else if Some(slot) == origin {
                trace!(slot, pending = pending.target, "still on origin desktop");
                return;
            } else {
                debug!(slot, pending = pending.target, "landed elsewhere during history step");
                super::hotkey::HotkeyDispatcher::roll_back_pending(navigator);
            }
        }

        if navigator.history.record_active(slot) {
            trace!(history = %navigator.history.summary(), "recorded active desktop");
        }

        if navigator.last_active != Some(slot) {
            navigator.last_active = Some(slot);
            navigator.notify_ui(UiEvent::ActiveDesktopChanged {
                slot,
                name: navigator.names.get(slot).map(str::to_string),
            });
        }
    }
}
