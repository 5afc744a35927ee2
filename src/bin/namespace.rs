use std::path::PathBuf;
use std::process;

use clap::Parser;

#[cfg(target_os = "macos")]
embed_plist::embed_info_plist!(concat!(env!("CARGO_MANIFEST_DIR"), "/assets/Info.plist"));

#[derive(Parser)]
struct Cli {
    /// Path to configuration file to use (overrides default).
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Check whether the configuration file is valid without starting.
    #[arg(long)]
    validate: bool,

    /// Print the desktop switch shortcuts that would be used and exit.
    #[arg(long)]
    print_bindings: bool,
}

#[cfg(target_os = "macos")]
fn main() {
    sigpipe::reset();
    let opt = Cli::parse();
    namespace::common::log::init_logging();

    if let Err(e) = macos::run(opt) {
        eprintln!("{e:#}");
        process::exit(1);
    }
}

#[cfg(not(target_os = "macos"))]
fn main() {
    let _ = Cli::parse();
    eprintln!("namespace only runs on macOS");
    process::exit(1);
}

#[cfg(target_os = "macos")]
mod macos {
    use std::process;

    use anyhow::Context;
    use namespace::actor::hotkeys::HotkeyManager;
    use namespace::actor::navigator::{self, Collaborators, Event, Navigator};
    use namespace::actor::notification_center::NotificationCenter;
    use namespace::actor::preferences_watcher::PreferencesWatcher;
    use namespace::actor::ui::LoggingUi;
    use namespace::common::config::{Config, config_file, names_file};
    use namespace::model::RonNameStore;
    use namespace::sys::actuator::OsascriptActuator;
    use namespace::sys::plist::{self, SPACES_PLIST};
    use namespace::sys::skylight::SkyLightSpaces;
    use namespace::sys::space_folders::SpaceFolders;
    use namespace::sys::spaces_prefs::SpacesPreferences;
    use namespace::sys::symbolic_hotkeys::{BindingSource, SymbolicHotkeySource};
    use objc2::MainThreadMarker;
    use objc2_app_kit::{NSApplication, NSApplicationActivationPolicy, NSScreen};
    use tracing::{info, warn};

    use super::Cli;

    pub fn run(opt: Cli) -> anyhow::Result<()> {
        let config_path = opt.config.clone().unwrap_or_else(config_file);

        if opt.validate {
            let config = Config::read(&config_path)?;
            let issues = config.validate();
            if issues.is_empty() {
                println!("Config validation passed");
                return Ok(());
            }
            for issue in issues {
                eprintln!("{issue}");
            }
            process::exit(1);
        }

        let config = Config::read_or_default(&config_path)?;
        for issue in config.validate() {
            warn!("config: {issue}");
        }

        let mut binding_source = SymbolicHotkeySource::from_preferences(config.binding_overrides());
        if opt.print_bindings {
            for (slot, binding) in binding_source.load()?.sorted() {
                println!("{:>2}: {binding}", slot + 1);
            }
            return Ok(());
        }

        let mtm = MainThreadMarker::new().context("must be started on the main thread")?;
        let app = NSApplication::sharedApplication(mtm);
        let _ = app.setActivationPolicy(NSApplicationActivationPolicy::Accessory);
        app.finishLaunching();

        if config.settings.check_spaces_preferences {
            check_spaces_preferences(NSScreen::screens(mtm).count())?;
        }

        let collaborators = Collaborators {
            snapshot: Box::new(SkyLightSpaces),
            actuator: Box::new(OsascriptActuator::default()),
            name_store: Box::new(RonNameStore::new(names_file())),
            binding_source: Box::new(binding_source),
            space_folders: SpaceFolders::in_home(),
        };
        let (ui_tx, ui_rx) = namespace::actor::channel();
        let (events_tx, navigator_thread) =
            Navigator::spawn(collaborators, config.settings.clone(), ui_tx)?;

        std::thread::Builder::new().name("ui".to_string()).spawn(move || {
            match tokio::runtime::Builder::new_current_thread().build() {
                Ok(runtime) => runtime.block_on(LoggingUi::new(ui_rx).run()),
                Err(e) => warn!("could not start ui runtime: {e}"),
            }
        })?;

        if config.settings.watch_preferences {
            PreferencesWatcher::spawn(events_tx.clone(), plist::preferences_dir())?;
        }

        let _notification_center = NotificationCenter::new(events_tx.clone());
        let _hotkeys = HotkeyManager::new(&config.hotkeys, events_tx.clone())?;

        install_shutdown_handler(events_tx, navigator_thread)?;

        info!("namespace started");
        app.run();
        Ok(())
    }

    fn check_spaces_preferences(display_count: usize) -> anyhow::Result<()> {
        let path = plist::preference_path(SPACES_PLIST);
        let prefs = match plist::read_as_json(&path) {
            Ok(json) => SpacesPreferences::from_json(&json),
            Err(e) => {
                warn!("could not read {}: {e:#}", path.display());
                None
            }
        };
        let Some(prefs) = prefs else {
            return Ok(());
        };
        for issue in prefs.issues(display_count) {
            if issue.is_fatal() {
                anyhow::bail!("{issue}");
            }
            warn!("{issue}");
        }
        Ok(())
    }

    fn install_shutdown_handler(
        events_tx: navigator::Sender,
        navigator_thread: std::thread::JoinHandle<()>,
    ) -> anyhow::Result<()> {
        let (stop_tx, stop_rx) = std::sync::mpsc::channel();
        ctrlc::set_handler(move || {
            let _ = stop_tx.send(());
        })?;
        std::thread::Builder::new().name("shutdown".to_string()).spawn(move || {
            if stop_rx.recv().is_err() {
                return;
            }
            info!("shutting down");
            events_tx.send(Event::Shutdown);
            if navigator_thread.join().is_err() {
                warn!("navigator thread panicked");
            }
            process::exit(0);
        })?;
        Ok(())
    }
}
