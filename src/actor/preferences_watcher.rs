//! Watches the system preference files that describe desktops and their
//! switch shortcuts.

use std::path::{Path, PathBuf};
use std::thread;
use std::time::Duration;

use notify::RecursiveMode;
use notify_debouncer_mini::{DebounceEventResult, DebouncedEvent, DebouncedEventKind, new_debouncer};
use tracing::{debug, info, trace, warn};

use super::navigator::{self, Event};
use crate::sys::plist::{SPACES_PLIST, SYMBOLIC_HOTKEYS_PLIST};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PreferenceChange {
    Spaces,
    Bindings,
}

impl PreferenceChange {
    pub fn for_path(path: &Path) -> Option<Self> {
        // Preferences are replaced atomically, so the events name temp files
        // like `com.apple.spaces.plist.aBc12` as well.
        let name = path.file_name()?.to_str()?;
        if name.starts_with(SPACES_PLIST) {
            Some(PreferenceChange::Spaces)
        } else if name.starts_with(SYMBOLIC_HOTKEYS_PLIST) {
            Some(PreferenceChange::Bindings)
        } else {
            None
        }
    }

    pub fn event(self) -> Event {
        match self {
            PreferenceChange::Spaces => Event::SpacesChanged,
            PreferenceChange::Bindings => Event::BindingsChanged,
        }
    }
}

pub struct PreferencesWatcher {
    dir: PathBuf,
    events_tx: navigator::Sender,
}

impl PreferencesWatcher {
    pub fn spawn(events_tx: navigator::Sender, dir: PathBuf) -> anyhow::Result<()> {
        thread::Builder::new().name("preferences-watcher".to_string()).spawn(move || {
            let watcher = PreferencesWatcher { dir, events_tx };
            let runtime = match tokio::runtime::Builder::new_current_thread().build() {
                Ok(runtime) => runtime,
                Err(e) => {
                    warn!("preferences-watcher: could not start runtime: {e}");
                    return;
                }
            };
            if let Err(e) = runtime.block_on(watcher.run()) {
                warn!("preferences-watcher: error: {e:?}");
            }
        })?;
        Ok(())
    }

    async fn run(self) -> notify::Result<()> {
        let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel::<DebouncedEvent>();

        let mut debouncer =
            new_debouncer(Duration::from_millis(250), move |res: DebounceEventResult| {
                if let Ok(events) = res {
                    for e in events {
                        if e.kind == DebouncedEventKind::Any {
                            let _ = tx.send(e);
                        }
                    }
                }
            })?;

        debouncer.watcher().watch(&self.dir, RecursiveMode::NonRecursive)?;
        info!("watching {:?}", self.dir);

        while let Some(event) = rx.recv().await {
            let Some(change) = PreferenceChange::for_path(&event.path) else {
                continue;
            };
            trace!("change detected (debounced): {:?} {:?}", event.kind, event.path);
            debug!(?change, "preferences changed");
            if self.events_tx.try_send(change.event()).is_err() {
                debug!("navigator gone, stopping preferences watcher");
                break;
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use test_log::test;

    use super::*;

    #[test]
    fn classifies_preference_files() {
        let dir = Path::new("/Users/me/Library/Preferences");
        assert_eq!(
            Some(PreferenceChange::Spaces),
            PreferenceChange::for_path(&dir.join("com.apple.spaces.plist"))
        );
        assert_eq!(
            Some(PreferenceChange::Spaces),
            PreferenceChange::for_path(&dir.join("com.apple.spaces.plist.Xq81z"))
        );
        assert_eq!(
            Some(PreferenceChange::Bindings),
            PreferenceChange::for_path(&dir.join("com.apple.symbolichotkeys.plist"))
        );
        assert_eq!(None, PreferenceChange::for_path(&dir.join("com.apple.dock.plist")));
        assert_eq!(None, PreferenceChange::for_path(dir));
    }

    #[test]
    fn changes_map_to_navigator_events() {
        assert!(matches!(PreferenceChange::Spaces.event(), Event::SpacesChanged));
        assert!(matches!(PreferenceChange::Bindings.event(), Event::BindingsChanged));
    }
}
