use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, anyhow};
use serde::{Deserialize, Serialize};

use super::collections::HashSet;
use crate::model::{HotkeyBinding, HotkeyBindingTable};
use crate::sys::hotkey::{Hotkey, KeyCode, Modifiers};
use crate::sys::symbolic_hotkeys::MAX_SHORTCUT_SLOTS;

pub fn data_dir() -> PathBuf { dirs::home_dir().unwrap_or_default().join(".namespace") }
pub fn names_file() -> PathBuf { data_dir().join("names.ron") }
pub fn config_file() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_default()
        .join(".config")
        .join("namespace")
        .join("config.toml")
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Default)]
#[serde(deny_unknown_fields)]
pub struct Config {
    #[serde(default)]
    pub settings: Settings,
    #[serde(default)]
    pub hotkeys: NavigationHotkeys,
    #[serde(default)]
    pub bindings: Vec<BindingOverride>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct Settings {
    /// Number of times the switch shortcut is sent before giving up.
    #[serde(default = "default_retry_attempts")]
    pub retry_attempts: u32,
    /// Wait between sending the shortcut and checking the active desktop.
    #[serde(default = "default_retry_delay_ms")]
    pub retry_delay_ms: u64,
    #[serde(default = "default_name_prefix")]
    pub default_name_prefix: String,
    #[serde(default = "yes")]
    pub watch_preferences: bool,
    #[serde(default = "yes")]
    pub check_spaces_preferences: bool,
    /// Lets the open-folder command create and show `~/Spaces/<desktop name>`.
    #[serde(default)]
    pub space_folders: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            retry_attempts: default_retry_attempts(),
            retry_delay_ms: default_retry_delay_ms(),
            default_name_prefix: default_name_prefix(),
            watch_preferences: true,
            check_spaces_preferences: true,
            space_folders: false,
        }
    }
}

impl Settings {
    pub fn retry_delay(&self) -> Duration { Duration::from_millis(self.retry_delay_ms) }

    pub fn validate(&self) -> Vec<String> {
        let mut issues = Vec::new();
        if self.retry_attempts == 0 {
            issues.push("settings.retry_attempts must be at least 1".to_string());
        }
        if self.retry_delay_ms == 0 {
            issues.push("settings.retry_delay_ms must be greater than 0".to_string());
        }
        if self.default_name_prefix.trim().is_empty() {
            issues.push("settings.default_name_prefix must not be empty".to_string());
        }
        issues
    }
}

/// Global shortcuts that drive history navigation and the picker.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct NavigationHotkeys {
    #[serde(default = "default_back")]
    pub back: Hotkey,
    #[serde(default = "default_forward")]
    pub forward: Hotkey,
    #[serde(default = "default_open_picker")]
    pub open_picker: Hotkey,
}

impl Default for NavigationHotkeys {
    fn default() -> Self {
        Self {
            back: default_back(),
            forward: default_forward(),
            open_picker: default_open_picker(),
        }
    }
}

impl NavigationHotkeys {
    pub fn validate(&self) -> Vec<String> {
        let named = [
            ("back", self.back),
            ("forward", self.forward),
            ("open_picker", self.open_picker),
        ];
        let mut issues = Vec::new();
        for (i, (name, hotkey)) in named.iter().enumerate() {
            for (other, other_hotkey) in &named[i + 1..] {
                if hotkey == other_hotkey {
                    issues.push(format!(
                        "hotkeys.{name} and hotkeys.{other} are both bound to {hotkey}"
                    ));
                }
            }
        }
        issues
    }
}

/// Key of a binding override: a key name (`"1"`, `"Left"`) or a raw virtual
/// keycode.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(untagged)]
pub enum BindingKey {
    Code(u16),
    Name(String),
}

impl BindingKey {
    pub fn keycode(&self) -> anyhow::Result<u16> {
        match self {
            BindingKey::Code(code) => Ok(*code),
            BindingKey::Name(name) => Ok(name.parse::<KeyCode>()?.virtual_keycode()),
        }
    }
}

/// Replaces the system shortcut for one slot.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct BindingOverride {
    pub slot: usize,
    pub key: BindingKey,
    #[serde(default)]
    pub modifiers: Modifiers,
    #[serde(default = "yes")]
    pub enabled: bool,
}

impl Config {
    pub fn read(path: &Path) -> anyhow::Result<Config> {
        let buf = std::fs::read_to_string(path)
            .with_context(|| format!("reading config {}", path.display()))?;
        Self::parse(&buf)
    }

    /// Reads `path`, falling back to the defaults when it does not exist.
    pub fn read_or_default(path: &Path) -> anyhow::Result<Config> {
        if path.exists() {
            Self::read(path)
        } else {
            Ok(Config::default())
        }
    }

    pub fn parse(buf: &str) -> anyhow::Result<Config> {
        toml::from_str(buf).map_err(|e| anyhow!("invalid config: {e}"))
    }

    /// Validates the entire configuration and returns a list of issues found.
    pub fn validate(&self) -> Vec<String> {
        let mut issues = Vec::new();
        issues.extend(self.settings.validate());
        issues.extend(self.hotkeys.validate());

        let mut seen = HashSet::default();
        for (i, binding) in self.bindings.iter().enumerate() {
            if binding.slot >= MAX_SHORTCUT_SLOTS {
                issues.push(format!(
                    "bindings[{i}].slot must be below {MAX_SHORTCUT_SLOTS}, got {}",
                    binding.slot
                ));
            }
            if !seen.insert(binding.slot) {
                issues.push(format!("bindings[{i}] overrides slot {} more than once", binding.slot));
            }
            if let Err(e) = binding.key.keycode() {
                issues.push(format!("bindings[{i}].key: {e}"));
            }
        }
        issues
    }

    /// Binding overrides as a table. Overrides whose key cannot be resolved
    /// are left out; `validate` reports them.
    pub fn binding_overrides(&self) -> HotkeyBindingTable {
        self.bindings
            .iter()
            .filter_map(|b| {
                let keycode = b.key.keycode().ok()?;
                Some((b.slot, HotkeyBinding {
                    keycode,
                    enabled: b.enabled,
                    modifiers: b.modifiers,
                }))
            })
            .collect()
    }
}

fn yes() -> bool { true }

fn default_retry_attempts() -> u32 { 9 }

fn default_retry_delay_ms() -> u64 { 270 }

fn default_name_prefix() -> String { "Desktop".to_string() }

fn default_back() -> Hotkey { Hotkey::new(Modifiers::CONTROL | Modifiers::OPTION, KeyCode::ArrowLeft) }

fn default_forward() -> Hotkey {
    Hotkey::new(Modifiers::CONTROL | Modifiers::OPTION, KeyCode::ArrowRight)
}

fn default_open_picker() -> Hotkey {
    Hotkey::new(Modifiers::CONTROL | Modifiers::OPTION, KeyCode::ArrowDown)
}
