use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::time::Instant;

use super::*;
use crate::actor::ui::UiEvent;
use crate::model::HotkeyBinding;
use crate::sys::hotkey::Modifiers;
use crate::sys::snapshot::{MAIN_DISPLAY, RawDisplay, RawSnapshot, RawSpace, SnapshotError};
use crate::sys::space_folders::{FolderOpener, SPACES_DIR, SpaceFolders};

pub const BASE_KEYCODE: u16 = 18;

pub fn space_id(slot: usize) -> u64 { 100 + slot as u64 }

pub fn keycode_for(slot: usize) -> u16 { BASE_KEYCODE + slot as u16 }

pub fn bindings_for(slots: impl IntoIterator<Item = usize>) -> HotkeyBindingTable {
    slots
        .into_iter()
        .map(|slot| (slot, HotkeyBinding::new(keycode_for(slot), Modifiers::CONTROL)))
        .collect()
}

#[derive(Default)]
struct SpacesState {
    count: usize,
    active: u64,
    tiles: Vec<u64>,
    fail: bool,
}

/// Window server stand-in with one display.
#[derive(Clone, Default)]
pub struct FakeSpaces(Arc<Mutex<SpacesState>>);

impl FakeSpaces {
    pub fn new(count: usize, active_slot: usize) -> Self {
        let spaces = FakeSpaces::default();
        spaces.set_count(count);
        spaces.set_active(active_slot);
        spaces
    }

    pub fn set_count(&self, count: usize) { self.0.lock().count = count; }

    pub fn set_active(&self, slot: usize) { self.0.lock().active = space_id(slot); }

    /// Makes a fullscreen tile the active space.
    pub fn activate_tile(&self, id: u64) {
        let mut state = self.0.lock();
        state.tiles.push(id);
        state.active = id;
    }

    pub fn set_failing(&self, fail: bool) { self.0.lock().fail = fail; }
}

impl SnapshotProvider for FakeSpaces {
    fn snapshot(&self) -> Result<RawSnapshot, SnapshotError> {
        let state = self.0.lock();
        if state.fail {
            return Err(SnapshotError::Provider("window server unavailable".into()));
        }
        let mut spaces: Vec<RawSpace> =
            (0..state.count).map(|slot| RawSpace { id: space_id(slot), tiled: false }).collect();
        spaces.extend(state.tiles.iter().map(|&id| RawSpace { id, tiled: true }));
        Ok(RawSnapshot {
            displays: vec![RawDisplay {
                identifier: MAIN_DISPLAY.to_string(),
                current_space: Some(state.active),
                spaces,
            }],
            active_display: Some(MAIN_DISPLAY.to_string()),
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActuatorBehavior {
    /// Shortcuts are swallowed.
    Ignore,
    /// The desktop changes on the given attempt for each target, counting
    /// from 1.
    SwitchOnAttempt(usize),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Actuation {
    pub keycode: u16,
    pub modifiers: Modifiers,
    pub at: Instant,
}

struct ActuatorState {
    behavior: ActuatorBehavior,
    calls: Vec<Actuation>,
    streak: (u16, usize),
}

#[derive(Clone)]
pub struct FakeActuator {
    state: Arc<Mutex<ActuatorState>>,
    spaces: FakeSpaces,
}

impl FakeActuator {
    pub fn new(spaces: FakeSpaces, behavior: ActuatorBehavior) -> Self {
        Self {
            state: Arc::new(Mutex::new(ActuatorState {
                behavior,
                calls: Vec::new(),
                streak: (0, 0),
            })),
            spaces,
        }
    }

    pub fn set_behavior(&self, behavior: ActuatorBehavior) { self.state.lock().behavior = behavior; }

    pub fn calls(&self) -> Vec<Actuation> { self.state.lock().calls.clone() }

    pub fn keycodes(&self) -> Vec<u16> { self.calls().iter().map(|c| c.keycode).collect() }

    pub fn call_count(&self) -> usize { self.state.lock().calls.len() }
}

impl SwitchActuator for FakeActuator {
    fn perform(&mut self, keycode: u16, modifiers: Modifiers) {
        let mut state = self.state.lock();
        state.calls.push(Actuation { keycode, modifiers, at: Instant::now() });
        state.streak = if state.streak.0 == keycode {
            (keycode, state.streak.1 + 1)
        } else {
            (keycode, 1)
        };
        if let ActuatorBehavior::SwitchOnAttempt(n) = state.behavior
            && state.streak.1 == n
        {
            self.spaces.set_active(usize::from(keycode - BASE_KEYCODE));
        }
    }
}

#[derive(Default)]
struct SchedulerState {
    scheduled: Vec<(RetryToken, Duration)>,
    cancelled: Vec<RetryToken>,
}

/// Records schedule requests; tests deliver ticks themselves.
#[derive(Clone, Default)]
pub struct ManualScheduler(Arc<Mutex<SchedulerState>>);

impl ManualScheduler {
    pub fn scheduled(&self) -> Vec<(RetryToken, Duration)> { self.0.lock().scheduled.clone() }

    pub fn cancelled(&self) -> Vec<RetryToken> { self.0.lock().cancelled.clone() }

    pub fn last_token(&self) -> Option<RetryToken> {
        self.0.lock().scheduled.last().map(|(token, _)| *token)
    }
}

impl RetryScheduler for ManualScheduler {
    fn schedule(&mut self, token: RetryToken, delay: Duration) {
        self.0.lock().scheduled.push((token, delay));
    }

    fn cancel(&mut self, token: RetryToken) { self.0.lock().cancelled.push(token); }
}

#[derive(Default)]
struct StoreState {
    names: Vec<String>,
    saves: usize,
}

#[derive(Clone, Default)]
pub struct MemoryNameStore(Arc<Mutex<StoreState>>);

impl MemoryNameStore {
    pub fn with_names(names: &[&str]) -> Self {
        let store = MemoryNameStore::default();
        store.0.lock().names = names.iter().map(|s| s.to_string()).collect();
        store
    }

    pub fn names(&self) -> Vec<String> { self.0.lock().names.clone() }

    pub fn saves(&self) -> usize { self.0.lock().saves }
}

impl NameStore for MemoryNameStore {
    fn load(&mut self) -> anyhow::Result<Vec<String>> { Ok(self.names()) }

    fn save(&mut self, names: &[String]) -> anyhow::Result<()> {
        let mut state = self.0.lock();
        state.names = names.to_vec();
        state.saves += 1;
        Ok(())
    }
}

#[derive(Clone, Default)]
pub struct SharedBindings(Arc<Mutex<HotkeyBindingTable>>);

impl SharedBindings {
    pub fn new(table: HotkeyBindingTable) -> Self { Self(Arc::new(Mutex::new(table))) }

    pub fn set(&self, table: HotkeyBindingTable) { *self.0.lock() = table; }
}

impl BindingSource for SharedBindings {
    fn load(&mut self) -> anyhow::Result<HotkeyBindingTable> { Ok(self.0.lock().clone()) }
}

/// Records opened folders instead of showing them.
#[derive(Clone, Default)]
pub struct RecordingOpener(Arc<Mutex<Vec<PathBuf>>>);

impl RecordingOpener {
    pub fn opened(&self) -> Vec<PathBuf> { self.0.lock().clone() }
}

impl FolderOpener for RecordingOpener {
    fn open(&mut self, path: &Path) { self.0.lock().push(path.to_path_buf()); }
}

pub struct Harness {
    pub navigator: Navigator,
    pub spaces: FakeSpaces,
    pub actuator: FakeActuator,
    pub scheduler: ManualScheduler,
    pub store: MemoryNameStore,
    pub bindings: SharedBindings,
    pub opener: RecordingOpener,
    pub home: tempfile::TempDir,
    pub ui_rx: ui::Receiver,
}

impl Harness {
    /// `count` desktops with shortcuts for every slot, starting on slot 0.
    pub fn new(count: usize) -> Self {
        Self::with(count, bindings_for(0..count), MemoryNameStore::default())
    }

    pub fn with(count: usize, bindings: HotkeyBindingTable, store: MemoryNameStore) -> Self {
        Self::with_settings(count, bindings, store, &Settings::default())
    }

    pub fn with_settings(
        count: usize,
        bindings: HotkeyBindingTable,
        store: MemoryNameStore,
        settings: &Settings,
    ) -> Self {
        let spaces = FakeSpaces::new(count, 0);
        let actuator = FakeActuator::new(spaces.clone(), ActuatorBehavior::SwitchOnAttempt(1));
        let scheduler = ManualScheduler::default();
        let bindings = SharedBindings::new(bindings);
        let opener = RecordingOpener::default();
        let home = tempfile::tempdir().expect("temp home");
        let (ui_tx, ui_rx) = actor::channel();
        let navigator = Navigator::new(
            Collaborators {
                snapshot: Box::new(spaces.clone()),
                actuator: Box::new(actuator.clone()),
                name_store: Box::new(store.clone()),
                binding_source: Box::new(bindings.clone()),
                space_folders: SpaceFolders::new(
                    home.path().join(SPACES_DIR),
                    Box::new(opener.clone()),
                ),
            },
            Box::new(scheduler.clone()),
            settings,
            ui_tx,
        );
        Harness {
            navigator,
            spaces,
            actuator,
            scheduler,
            store,
            bindings,
            opener,
            home,
            ui_rx,
        }
    }

    /// Simulates the user moving to `slot` without us.
    pub fn visit(&mut self, slot: usize) {
        self.spaces.set_active(slot);
        self.navigator.handle_event(Event::SpacesChanged);
    }

    pub fn visit_all(&mut self, slots: &[usize]) {
        for &slot in slots {
            self.visit(slot);
        }
    }

    /// Delivers the tick for the most recently scheduled retry.
    pub fn tick(&mut self) {
        let token = self.scheduler.last_token().expect("no retry scheduled");
        self.navigator.handle_event(Event::RetryTick { token });
    }

    pub fn ui_events(&mut self) -> Vec<UiEvent> {
        let mut events = Vec::new();
        while let Ok((_, event)) = self.ui_rx.try_recv() {
            events.push(event);
        }
        events
    }

    pub fn spaces_dir(&self) -> PathBuf { self.home.path().join(SPACES_DIR) }

    pub fn history(&self) -> (Vec<usize>, Option<usize>) {
        let summary = self.navigator.history_summary();
        (summary.entries, summary.cursor)
    }
}

/// A navigator running its event loop on the test runtime with real timers.
pub struct LiveHarness {
    pub events_tx: Sender,
    pub ui_rx: ui::Receiver,
    pub spaces: FakeSpaces,
    pub actuator: FakeActuator,
    pub store: MemoryNameStore,
    pub task: tokio::task::JoinHandle<()>,
}

impl LiveHarness {
    pub fn spawn(count: usize, behavior: ActuatorBehavior) -> Self {
        let spaces = FakeSpaces::new(count, 0);
        let actuator = FakeActuator::new(spaces.clone(), behavior);
        let store = MemoryNameStore::default();
        let (events_tx, events_rx) = actor::channel();
        let (ui_tx, ui_rx) = actor::channel();
        let navigator = Navigator::new(
            Collaborators {
                snapshot: Box::new(spaces.clone()),
                actuator: Box::new(actuator.clone()),
                name_store: Box::new(store.clone()),
                binding_source: Box::new(SharedBindings::new(bindings_for(0..count))),
                space_folders: SpaceFolders::new(
                    std::env::temp_dir().join(SPACES_DIR),
                    Box::new(RecordingOpener::default()),
                ),
            },
            Box::new(TokioRetryScheduler::new(events_tx.clone())),
            &Settings::default(),
            ui_tx,
        );
        let task = tokio::spawn(navigator.run(events_rx));
        LiveHarness {
            events_tx,
            ui_rx,
            spaces,
            actuator,
            store,
            task,
        }
    }

    /// Waits for the next switch outcome, skipping other UI events.
    pub async fn next_outcome(&mut self) -> UiEvent {
        loop {
            let (_, event) = self.ui_rx.recv().await.expect("navigator stopped");
            if matches!(event, UiEvent::SwitchSucceeded { .. } | UiEvent::SwitchFailed(_)) {
                return event;
            }
        }
    }
}
