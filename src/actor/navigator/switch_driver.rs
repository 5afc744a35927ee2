//! Bounded retry loop that presses a desktop's switch shortcut until the
//! window server reports that desktop as active.
//!
//! The driver never sleeps. After each actuation it asks a [`RetryScheduler`]
//! to post a [`RetryTick`](super::Event::RetryTick) carrying the session token
//! once the delay has passed; the navigator feeds that tick back through
//! [`DesktopSwitchDriver::on_tick`]. Ticks whose token no longer matches the
//! live session are dropped, so a superseded session can never actuate again.

use std::time::Duration;

use tokio::task::JoinHandle;
use tracing::{debug, info, trace, warn};

use super::{Event, Sender, SwitchError};
use crate::model::{DesktopId, HotkeyBinding, HotkeyBindingTable};
use crate::sys::actuator::SwitchActuator;
use crate::sys::snapshot::{DesktopSnapshot, DesktopSnapshotReader};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RetryToken(pub u64);

/// Delivers `RetryTick { token }` to the navigator after a delay.
pub trait RetryScheduler: Send {
    fn schedule(&mut self, token: RetryToken, delay: Duration);
    fn cancel(&mut self, token: RetryToken);
}

/// Sleeps on the navigator's tokio runtime and posts the tick to its channel.
pub struct TokioRetryScheduler {
    events_tx: Sender,
    pending: Option<(RetryToken, JoinHandle<()>)>,
}

impl TokioRetryScheduler {
    pub fn new(events_tx: Sender) -> Self {
        Self { events_tx, pending: None }
    }
}

impl RetryScheduler for TokioRetryScheduler {
    fn schedule(&mut self, token: RetryToken, delay: Duration) {
        if let Some((_, handle)) = self.pending.take() {
            handle.abort();
        }
        let events_tx = self.events_tx.clone();
        let handle = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            events_tx.send(Event::RetryTick { token });
        });
        self.pending = Some((token, handle));
    }

    fn cancel(&mut self, token: RetryToken) {
        if let Some((pending, handle)) = self.pending.take() {
            if pending == token {
                handle.abort();
            } else {
                self.pending = Some((pending, handle));
            }
        }
    }
}

impl Drop for TokioRetryScheduler {
    fn drop(&mut self) {
        if let Some((_, handle)) = self.pending.take() {
            handle.abort();
        }
    }
}

#[derive(Debug, Clone)]
pub struct RetrySession {
    pub token: RetryToken,
    pub target: usize,
    pub attempts_remaining: u32,
    pub last_observed_active: Option<DesktopId>,
    binding: HotkeyBinding,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TickOutcome {
    /// The tick belongs to a session that was cancelled or already finished.
    Stale,
    /// Target not reached yet; the shortcut was sent again.
    Pending,
    Succeeded { slot: usize, snapshot: DesktopSnapshot },
    TimedOut(usize),
}

pub struct DesktopSwitchDriver {
    actuator: Box<dyn SwitchActuator>,
    scheduler: Box<dyn RetryScheduler>,
    attempts: u32,
    delay: Duration,
    session: Option<RetrySession>,
    next_token: u64,
}

impl DesktopSwitchDriver {
    pub fn new(
        actuator: Box<dyn SwitchActuator>,
        scheduler: Box<dyn RetryScheduler>,
        attempts: u32,
        delay: Duration,
    ) -> Self {
        Self {
            actuator,
            scheduler,
            attempts: attempts.max(1),
            delay,
            session: None,
            next_token: 0,
        }
    }

    pub fn session(&self) -> Option<&RetrySession> {
        self.session.as_ref()
    }

    pub fn is_switching(&self) -> bool {
        self.session.is_some()
    }

    /// Drops the in-flight session, returning its target.
    pub fn cancel(&mut self) -> Option<usize> {
        let session = self.session.take()?;
        self.scheduler.cancel(session.token);
        debug!(slot = session.target, token = session.token.0, "cancelled switch session");
        Some(session.target)
    }

    /// Starts a new session for `target`, superseding any in-flight one. The
    /// first actuation happens before this returns.
    pub fn request_switch(
        &mut self,
        target: usize,
        bindings: &HotkeyBindingTable,
    ) -> Result<RetryToken, SwitchError> {
        self.cancel();

        let binding = bindings
            .enabled_binding(target)
            .ok_or(SwitchError::NoShortcutConfigured(target))?;

        self.next_token += 1;
        let token = RetryToken(self.next_token);
        self.session = Some(RetrySession {
            token,
            target,
            attempts_remaining: self.attempts,
            last_observed_active: None,
            binding,
        });
        debug!(slot = target, token = token.0, attempts = self.attempts, "starting switch session");
        self.attempt(token, binding);
        Ok(token)
    }

    pub fn on_tick(&mut self, token: RetryToken, reader: &DesktopSnapshotReader) -> TickOutcome {
        let Some(session) = self.session.as_mut().filter(|s| s.token == token) else {
            trace!(token = token.0, "ignoring stale retry tick");
            return TickOutcome::Stale;
        };

        match reader.read() {
            Ok(snapshot) => {
                session.last_observed_active = Some(snapshot.active);
                if snapshot.active_slot() == Some(session.target) {
                    let slot = session.target;
                    let used = self.attempts - session.attempts_remaining + 1;
                    self.session = None;
                    info!(slot, attempts = used, "switched desktop");
                    return TickOutcome::Succeeded { slot, snapshot };
                }
            }
            Err(e) => warn!(slot = session.target, "snapshot failed during switch: {e}"),
        }

        session.attempts_remaining -= 1;
        if session.attempts_remaining > 0 {
            let binding = session.binding;
            trace!(
                slot = session.target,
                remaining = session.attempts_remaining,
                observed = ?session.last_observed_active,
                "target not active yet, retrying"
            );
            self.attempt(token, binding);
            TickOutcome::Pending
        } else {
            let slot = session.target;
            self.session = None;
            warn!(slot, attempts = self.attempts, "gave up switching desktop");
            TickOutcome::TimedOut(slot)
        }
    }

    fn attempt(&mut self, token: RetryToken, binding: HotkeyBinding) {
        self.actuator.perform(binding.keycode, binding.modifiers);
        self.scheduler.schedule(token, self.delay);
    }
}
