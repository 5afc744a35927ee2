//! The navigator owns all desktop navigation state and is its only mutator.
//!
//! Hotkeys, window server notifications, preference file changes, UI commands
//! and retry ticks all arrive as [`Event`]s on one channel and run to
//! completion in order. Outcomes leave through the [`ui`](crate::actor::ui)
//! channel.

mod error;
mod events;
mod switch_driver;

#[cfg(test)]
mod testing;

use std::thread;

pub use error::SwitchError;
use events::command::CommandEventHandler;
use events::hotkey::HotkeyDispatcher;
use events::space::DesktopChangeObserver;
pub use switch_driver::{
    DesktopSwitchDriver, RetryScheduler, RetrySession, RetryToken, TickOutcome,
    TokioRetryScheduler,
};
use tokio::sync::oneshot;
use tracing::{debug, info, instrument, warn};

use crate::actor::{self, ui};
use crate::common::config::Settings;
use crate::model::{
    DesktopNames, HistorySummary, HotkeyBindingTable, NameStore, NavigationHistory,
};
use crate::sys::actuator::SwitchActuator;
use crate::sys::snapshot::{DesktopSnapshotReader, SnapshotProvider};
use crate::sys::space_folders::SpaceFolders;
use crate::sys::symbolic_hotkeys::BindingSource;

pub type Sender = actor::Sender<Event>;
pub type Receiver = actor::Receiver<Event>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HotkeyAction {
    Back,
    Forward,
    OpenPicker,
}

#[derive(Debug)]
pub enum Event {
    Hotkey(HotkeyAction),
    /// The active desktop or the set of desktops may have changed.
    SpacesChanged,
    /// The system switch shortcuts may have changed on disk.
    BindingsChanged,
    Command(Command),
    Query(Query),
    RetryTick { token: RetryToken },
    Shutdown,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    NavigateBack,
    NavigateForward,
    NavigateTo(usize),
    RenameDesktop { slot: usize, name: String },
    /// Drag-to-reorder: `to` is the drop row in the list before the move.
    MoveName { from: usize, to: usize },
    ReplaceBindings(HotkeyBindingTable),
    /// Creates and shows the folder named after the current desktop.
    OpenDesktopFolder,
}

#[derive(Debug)]
pub enum Query {
    CurrentSlotName(oneshot::Sender<Option<String>>),
    HistorySummary(oneshot::Sender<HistorySummary>),
    DesktopNames(oneshot::Sender<Vec<String>>),
}

/// Everything outside the navigator it talks to.
pub struct Collaborators {
    pub snapshot: Box<dyn SnapshotProvider>,
    pub actuator: Box<dyn SwitchActuator>,
    pub name_store: Box<dyn NameStore>,
    pub binding_source: Box<dyn BindingSource>,
    pub space_folders: SpaceFolders,
}

/// A history step whose switch has not been confirmed yet.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct PendingNavigation {
    pub token: RetryToken,
    pub origin_cursor: usize,
    pub target: usize,
}

pub struct Navigator {
    pub(crate) history: NavigationHistory,
    pub(crate) bindings: HotkeyBindingTable,
    pub(crate) names: DesktopNames,
    pub(crate) reader: DesktopSnapshotReader,
    pub(crate) driver: DesktopSwitchDriver,
    pub(crate) name_store: Box<dyn NameStore>,
    pub(crate) binding_source: Box<dyn BindingSource>,
    pub(crate) ui_tx: ui::Sender,
    pub(crate) pending_nav: Option<PendingNavigation>,
    pub(crate) last_active: Option<usize>,
    pub(crate) name_prefix: String,
    /// Present only when desktop folders are enabled.
    pub(crate) space_folders: Option<SpaceFolders>,
    running: bool,
}

impl Navigator {
    pub fn new(
        collaborators: Collaborators,
        scheduler: Box<dyn RetryScheduler>,
        settings: &Settings,
        ui_tx: ui::Sender,
    ) -> Self {
        let Collaborators {
            snapshot,
            actuator,
            mut name_store,
            mut binding_source,
            space_folders,
        } = collaborators;

        let names = match name_store.load() {
            Ok(names) => DesktopNames::new(names),
            Err(e) => {
                warn!("could not load desktop names, starting fresh: {e:#}");
                DesktopNames::default()
            }
        };
        let bindings = binding_source.load().unwrap_or_else(|e| {
            warn!("could not load switch shortcuts: {e:#}");
            HotkeyBindingTable::new()
        });

        Navigator {
            history: NavigationHistory::new(),
            bindings,
            names,
            reader: DesktopSnapshotReader::new(snapshot),
            driver: DesktopSwitchDriver::new(
                actuator,
                scheduler,
                settings.retry_attempts,
                settings.retry_delay(),
            ),
            name_store,
            binding_source,
            ui_tx,
            pending_nav: None,
            last_active: None,
            name_prefix: settings.default_name_prefix.clone(),
            space_folders: settings.space_folders.then_some(space_folders),
            running: true,
        }
    }

    /// Runs the navigator on its own thread with a single-threaded runtime
    /// that drives the retry timers.
    pub fn spawn(
        collaborators: Collaborators,
        settings: Settings,
        ui_tx: ui::Sender,
    ) -> anyhow::Result<(Sender, thread::JoinHandle<()>)> {
        let (events_tx, events_rx) = actor::channel();
        let scheduler_tx = events_tx.clone();
        let handle = thread::Builder::new().name("navigator".to_string()).spawn(move || {
            let runtime = match tokio::runtime::Builder::new_current_thread().enable_time().build()
            {
                Ok(runtime) => runtime,
                Err(e) => {
                    tracing::error!("failed to start navigator runtime: {e}");
                    return;
                }
            };
            runtime.block_on(async move {
                let scheduler = Box::new(TokioRetryScheduler::new(scheduler_tx));
                Navigator::new(collaborators, scheduler, &settings, ui_tx).run(events_rx).await
            });
        })?;
        Ok((events_tx, handle))
    }

    pub async fn run(mut self, mut events: Receiver) {
        self.handle_event(Event::SpacesChanged);
        while let Some((span, event)) = events.recv().await {
            let _guard = span.enter();
            self.handle_event(event);
            if !self.running {
                break;
            }
        }
        debug!("navigator stopped");
    }

    #[instrument(name = "navigator::handle_event", skip(self))]
    pub fn handle_event(&mut self, event: Event) {
        match event {
            Event::Hotkey(action) => HotkeyDispatcher::handle_hotkey(self, action),
            Event::SpacesChanged => DesktopChangeObserver::handle_spaces_changed(self),
            Event::BindingsChanged => CommandEventHandler::handle_bindings_changed(self),
            Event::Command(command) => CommandEventHandler::handle_command(self, command),
            Event::Query(query) => self.handle_query(query),
            Event::RetryTick { token } => DesktopChangeObserver::handle_retry_tick(self, token),
            Event::Shutdown => self.handle_shutdown(),
        }
    }

    /// Name of the last confirmed active desktop.
    pub fn current_slot_name(&self) -> Option<String> {
        let slot = self.confirmed_slot()?;
        self.names.get(slot).map(str::to_string)
    }

    pub fn history_summary(&self) -> HistorySummary {
        self.history.summary()
    }

    pub fn desktop_names(&self) -> &DesktopNames {
        &self.names
    }

    pub fn bindings(&self) -> &HotkeyBindingTable {
        &self.bindings
    }

    /// The history cursor may point at an unconfirmed target while a history
    /// step is in flight; the confirmed slot is the one it left from.
    pub(crate) fn confirmed_slot(&self) -> Option<usize> {
        match self.pending_nav {
            Some(pending) => self.history.get(pending.origin_cursor),
            None => self.history.current(),
        }
    }

    pub(crate) fn persist_names(&mut self) {
        if let Err(e) = self.name_store.save(self.names.as_slice()) {
            warn!("failed to save desktop names: {e:#}");
        }
    }

    pub(crate) fn notify_ui(&self, event: ui::UiEvent) {
        self.ui_tx.send(event);
    }

    pub(crate) fn report_switch_failure(&self, error: SwitchError) {
        warn!("{error}");
        self.notify_ui(ui::UiEvent::SwitchFailed(error));
    }

    fn handle_query(&self, query: Query) {
        // A dropped receiver just means the asker stopped waiting.
        match query {
            Query::CurrentSlotName(reply) => {
                _ = reply.send(self.current_slot_name());
            }
            Query::HistorySummary(reply) => {
                _ = reply.send(self.history_summary());
            }
            Query::DesktopNames(reply) => {
                _ = reply.send(self.names.to_vec());
            }
        }
    }

    fn handle_shutdown(&mut self) {
        info!("navigator shutting down");
        if self.driver.cancel().is_some() {
            HotkeyDispatcher::roll_back_pending(self);
        }
        self.persist_names();
        self.running = false;
    }
}

impl Sender {
    /// Sends a query and waits for the answer. `None` if the navigator is
    /// gone.
    pub async fn query<T>(&self, make: impl FnOnce(oneshot::Sender<T>) -> Query) -> Option<T> {
        let (tx, rx) = oneshot::channel();
        self.try_send(Event::Query(make(tx))).ok()?;
        rx.await.ok()
    }
}
