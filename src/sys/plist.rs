use std::path::{Path, PathBuf};
use std::process::Command;

use anyhow::{Context, bail};

pub const SPACES_PLIST: &str = "com.apple.spaces.plist";
pub const SYMBOLIC_HOTKEYS_PLIST: &str = "com.apple.symbolichotkeys.plist";

pub fn preferences_dir() -> PathBuf {
    dirs::home_dir().unwrap_or_default().join("Library").join("Preferences")
}

pub fn preference_path(file_name: &str) -> PathBuf {
    preferences_dir().join(file_name)
}

/// Reads a (possibly binary) property list as JSON through `plutil`.
pub fn read_as_json(path: &Path) -> anyhow::Result<serde_json::Value> {
    let output = Command::new("/usr/bin/plutil")
        .args(["-convert", "json", "-o", "-"])
        .arg(path)
        .output()
        .context("running plutil")?;
    if !output.status.success() {
        bail!(
            "plutil could not convert {}: {}",
            path.display(),
            String::from_utf8_lossy(&output.stderr).trim()
        );
    }
    serde_json::from_slice(&output.stdout)
        .with_context(|| format!("parsing converted {}", path.display()))
}
