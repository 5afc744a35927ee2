pub mod actuator;
pub mod hotkey;
pub mod plist;
pub mod snapshot;
pub mod space_folders;
pub mod spaces_prefs;
pub mod symbolic_hotkeys;

#[cfg(target_os = "macos")]
pub mod carbon;
#[cfg(target_os = "macos")]
pub mod skylight;
