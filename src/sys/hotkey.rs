use std::fmt;
use std::str::FromStr;

use anyhow::anyhow;
use bitflags::bitflags;
use serde::{Deserialize, Serialize};

bitflags! {
    /// Modifier keys held while a shortcut fires.
    #[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Default)]
    #[repr(transparent)]
    pub struct Modifiers: u8 {
        const SHIFT   = 1 << 0;
        const CONTROL = 1 << 1;
        const OPTION  = 1 << 2;
        const COMMAND = 1 << 3;
    }
}

// Bits used by CGEventFlags and by the symbolic hotkeys preference file.
const CG_MASK_SHIFT: u64 = 0x02_0000;
const CG_MASK_CONTROL: u64 = 0x04_0000;
const CG_MASK_ALTERNATE: u64 = 0x08_0000;
const CG_MASK_COMMAND: u64 = 0x10_0000;

// Carbon `EventModifiers` bits accepted by RegisterEventHotKey.
const CARBON_CMD_KEY: u32 = 1 << 8;
const CARBON_SHIFT_KEY: u32 = 1 << 9;
const CARBON_OPTION_KEY: u32 = 1 << 11;
const CARBON_CONTROL_KEY: u32 = 1 << 12;

impl Modifiers {
    /// Canonical order used when a shortcut is spelled out, e.g. for
    /// AppleScript `using {shift down, control down}`.
    pub const ORDERED: [(Modifiers, &'static str); 4] = [
        (Modifiers::SHIFT, "shift"),
        (Modifiers::CONTROL, "control"),
        (Modifiers::OPTION, "option"),
        (Modifiers::COMMAND, "command"),
    ];

    pub fn from_event_flags(mask: u64) -> Self {
        let mut mods = Modifiers::empty();
        mods.set(Modifiers::SHIFT, mask & CG_MASK_SHIFT != 0);
        mods.set(Modifiers::CONTROL, mask & CG_MASK_CONTROL != 0);
        mods.set(Modifiers::OPTION, mask & CG_MASK_ALTERNATE != 0);
        mods.set(Modifiers::COMMAND, mask & CG_MASK_COMMAND != 0);
        mods
    }

    pub fn to_carbon(self) -> u32 {
        let mut mask = 0;
        if self.contains(Modifiers::SHIFT) {
            mask |= CARBON_SHIFT_KEY;
        }
        if self.contains(Modifiers::CONTROL) {
            mask |= CARBON_CONTROL_KEY;
        }
        if self.contains(Modifiers::OPTION) {
            mask |= CARBON_OPTION_KEY;
        }
        if self.contains(Modifiers::COMMAND) {
            mask |= CARBON_CMD_KEY;
        }
        mask
    }

    pub fn insert_from_token(&mut self, token: &str) -> bool {
        let modifier = match token.to_lowercase().as_str() {
            "alt" | "option" | "opt" => Modifiers::OPTION,
            "ctrl" | "control" => Modifiers::CONTROL,
            "shift" => Modifiers::SHIFT,
            "meta" | "cmd" | "command" => Modifiers::COMMAND,
            _ => return false,
        };
        self.insert(modifier);
        true
    }
}

impl fmt::Display for Modifiers {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut parts: Vec<&str> = Vec::new();
        if self.contains(Modifiers::CONTROL) {
            parts.push("Ctrl");
        }
        if self.contains(Modifiers::OPTION) {
            parts.push("Alt");
        }
        if self.contains(Modifiers::SHIFT) {
            parts.push("Shift");
        }
        if self.contains(Modifiers::COMMAND) {
            parts.push("Cmd");
        }
        write!(f, "{}", parts.join(" + "))
    }
}

impl FromStr for Modifiers {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut mods = Modifiers::empty();
        for part in s.split('+').map(str::trim).filter(|p| !p.is_empty()) {
            if !mods.insert_from_token(part) {
                return Err(anyhow!("Unrecognized modifier: {}", part));
            }
        }
        Ok(mods)
    }
}

impl Serialize for Modifiers {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Modifiers {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Modifiers::from_str(&s).map_err(serde::de::Error::custom)
    }
}

#[derive(Serialize, Deserialize, Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum KeyCode {
    KeyA,
    KeyB,
    KeyC,
    KeyD,
    KeyE,
    KeyF,
    KeyG,
    KeyH,
    KeyI,
    KeyJ,
    KeyK,
    KeyL,
    KeyM,
    KeyN,
    KeyO,
    KeyP,
    KeyQ,
    KeyR,
    KeyS,
    KeyT,
    KeyU,
    KeyV,
    KeyW,
    KeyX,
    KeyY,
    KeyZ,
    Digit0,
    Digit1,
    Digit2,
    Digit3,
    Digit4,
    Digit5,
    Digit6,
    Digit7,
    Digit8,
    Digit9,
    Minus,
    Equal,
    BracketLeft,
    BracketRight,
    Backslash,
    Semicolon,
    Quote,
    Comma,
    Period,
    Slash,
    Backquote,
    Enter,
    Tab,
    Space,
    Escape,
    F1,
    F2,
    F3,
    F4,
    F5,
    F6,
    F7,
    F8,
    F9,
    F10,
    F11,
    F12,
    ArrowLeft,
    ArrowRight,
    ArrowDown,
    ArrowUp,
}

/// ANSI virtual key codes (`kVK_*`) for every supported key.
const VIRTUAL_KEYCODES: &[(KeyCode, u16)] = {
    use KeyCode::*;
    &[
        (KeyA, 0x00),
        (KeyS, 0x01),
        (KeyD, 0x02),
        (KeyF, 0x03),
        (KeyH, 0x04),
        (KeyG, 0x05),
        (KeyZ, 0x06),
        (KeyX, 0x07),
        (KeyC, 0x08),
        (KeyV, 0x09),
        (KeyB, 0x0B),
        (KeyQ, 0x0C),
        (KeyW, 0x0D),
        (KeyE, 0x0E),
        (KeyR, 0x0F),
        (KeyY, 0x10),
        (KeyT, 0x11),
        (Digit1, 0x12),
        (Digit2, 0x13),
        (Digit3, 0x14),
        (Digit4, 0x15),
        (Digit6, 0x16),
        (Digit5, 0x17),
        (Equal, 0x18),
        (Digit9, 0x19),
        (Digit7, 0x1A),
        (Minus, 0x1B),
        (Digit8, 0x1C),
        (Digit0, 0x1D),
        (BracketRight, 0x1E),
        (KeyO, 0x1F),
        (KeyU, 0x20),
        (BracketLeft, 0x21),
        (KeyI, 0x22),
        (KeyP, 0x23),
        (Enter, 0x24),
        (KeyL, 0x25),
        (KeyJ, 0x26),
        (Quote, 0x27),
        (KeyK, 0x28),
        (Semicolon, 0x29),
        (Backslash, 0x2A),
        (Comma, 0x2B),
        (Slash, 0x2C),
        (KeyN, 0x2D),
        (KeyM, 0x2E),
        (Period, 0x2F),
        (Tab, 0x30),
        (Space, 0x31),
        (Backquote, 0x32),
        (Escape, 0x35),
        (F5, 0x60),
        (F6, 0x61),
        (F7, 0x62),
        (F3, 0x63),
        (F8, 0x64),
        (F9, 0x65),
        (F11, 0x67),
        (F10, 0x6D),
        (F12, 0x6F),
        (F4, 0x76),
        (F2, 0x78),
        (F1, 0x7A),
        (ArrowLeft, 0x7B),
        (ArrowRight, 0x7C),
        (ArrowDown, 0x7D),
        (ArrowUp, 0x7E),
    ]
};

impl KeyCode {
    pub fn virtual_keycode(self) -> u16 {
        VIRTUAL_KEYCODES
            .iter()
            .find(|(key, _)| *key == self)
            .map(|(_, code)| *code)
            .unwrap_or_default()
    }

    pub fn from_virtual_keycode(code: u16) -> Option<KeyCode> {
        VIRTUAL_KEYCODES.iter().find(|(_, c)| *c == code).map(|(key, _)| *key)
    }
}

impl fmt::Display for KeyCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        use KeyCode::*;
        let s = match self {
            ArrowLeft => "Left",
            ArrowRight => "Right",
            ArrowUp => "Up",
            ArrowDown => "Down",
            Tab => "Tab",
            Space => "Space",
            Enter => "Enter",
            Escape => "Escape",
            Minus => "-",
            Equal => "=",
            BracketLeft => "[",
            BracketRight => "]",
            Backslash => "\\",
            Semicolon => ";",
            Quote => "'",
            Comma => ",",
            Period => ".",
            Slash => "/",
            Backquote => "`",
            other => {
                let name = format!("{other:?}");
                let name = name
                    .strip_prefix("Key")
                    .or_else(|| name.strip_prefix("Digit"))
                    .unwrap_or(&name)
                    .to_string();
                return f.write_str(&name);
            }
        };
        f.write_str(s)
    }
}

impl FromStr for KeyCode {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        use KeyCode::*;
        let upper = s.to_uppercase();
        let key = match upper.as_str() {
            "LEFT" | "ARROWLEFT" => ArrowLeft,
            "RIGHT" | "ARROWRIGHT" => ArrowRight,
            "UP" | "ARROWUP" => ArrowUp,
            "DOWN" | "ARROWDOWN" => ArrowDown,
            "TAB" => Tab,
            "SPACE" => Space,
            "ENTER" | "RETURN" => Enter,
            "ESC" | "ESCAPE" => Escape,
            "-" | "MINUS" | "HYPHEN" => Minus,
            "=" | "EQUAL" | "EQUALS" => Equal,
            "[" | "BRACKETLEFT" | "LEFTBRACKET" => BracketLeft,
            "]" | "BRACKETRIGHT" | "RIGHTBRACKET" => BracketRight,
            "\\" | "BACKSLASH" => Backslash,
            ";" | "SEMICOLON" => Semicolon,
            "'" | "QUOTE" | "APOSTROPHE" => Quote,
            "," | "COMMA" => Comma,
            "." | "DOT" | "PERIOD" => Period,
            "/" | "SLASH" => Slash,
            "`" | "BACKQUOTE" | "GRAVE" => Backquote,
            other => {
                return VIRTUAL_KEYCODES
                    .iter()
                    .map(|(key, _)| *key)
                    .find(|key| key.to_string().eq_ignore_ascii_case(other))
                    .ok_or_else(|| anyhow!("Unrecognized key token: {}", s));
            }
        };
        Ok(key)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Hotkey {
    pub modifiers: Modifiers,
    pub key_code: KeyCode,
}

impl Hotkey {
    pub fn new(modifiers: Modifiers, key_code: KeyCode) -> Self {
        Self { modifiers, key_code }
    }
}

impl fmt::Display for Hotkey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.modifiers.is_empty() {
            write!(f, "{}", self.key_code)
        } else {
            write!(f, "{} + {}", self.modifiers, self.key_code)
        }
    }
}

impl FromStr for Hotkey {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut mods = Modifiers::empty();
        let mut key = None;
        for part in s.split('+').map(str::trim).filter(|p| !p.is_empty()) {
            if mods.insert_from_token(part) {
                continue;
            }
            if key.is_some() {
                return Err(anyhow!("More than one key in hotkey: {}", s));
            }
            key = Some(KeyCode::from_str(part)?);
        }
        let key_code = key.ok_or_else(|| anyhow!("No key specified in hotkey: {}", s))?;
        Ok(Hotkey::new(mods, key_code))
    }
}

impl Serialize for Hotkey {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Hotkey {
    fn deserialize<D>(deserializer: D) -> Result<Hotkey, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum HotkeyRepr {
            Str(String),
            Map { modifiers: Modifiers, key_code: KeyCode },
        }

        match HotkeyRepr::deserialize(deserializer)? {
            HotkeyRepr::Str(s) => Hotkey::from_str(&s).map_err(serde::de::Error::custom),
            HotkeyRepr::Map { modifiers, key_code } => Ok(Hotkey::new(modifiers, key_code)),
        }
    }
}
