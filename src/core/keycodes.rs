//! Keycode table: raw terminal sequences for the named special keys.

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use once_cell::sync::Lazy;

use crate::core::error::EngineError;

/// Chunk that terminates the process (ctrl+c in raw mode).
pub const INTERRUPT: &str = "\x03";

/// Control codes 1..=26 map to ctrl + `a`..=`z`.
pub const CTRL_RANGE: std::ops::RangeInclusive<u32> = 1..=26;

/// Named special keys the register tracks as flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum KeyFlag {
    Escape,
    Return,
    Backspace,
    Delete,
    Tab,
    Up,
    Down,
    Left,
    Right,
    Insert,
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
}

impl KeyFlag {
    pub const ALL: [KeyFlag; 22] = [
        KeyFlag::Escape,
        KeyFlag::Return,
        KeyFlag::Backspace,
        KeyFlag::Delete,
        KeyFlag::Tab,
        KeyFlag::Up,
        KeyFlag::Down,
        KeyFlag::Left,
        KeyFlag::Right,
        KeyFlag::Insert,
        KeyFlag::F1,
        KeyFlag::F2,
        KeyFlag::F3,
        KeyFlag::F4,
        KeyFlag::F5,
        KeyFlag::F6,
        KeyFlag::F7,
        KeyFlag::F8,
        KeyFlag::F9,
        KeyFlag::F10,
        KeyFlag::F11,
        KeyFlag::F12,
    ];

    pub fn name(self) -> &'static str {
        match self {
            KeyFlag::Escape => "esc",
            KeyFlag::Return => "return",
            KeyFlag::Backspace => "backspace",
            KeyFlag::Delete => "delete",
            KeyFlag::Tab => "tab",
            KeyFlag::Up => "up",
            KeyFlag::Down => "down",
            KeyFlag::Left => "left",
            KeyFlag::Right => "right",
            KeyFlag::Insert => "insert",
            KeyFlag::F1 => "f1",
            KeyFlag::F2 => "f2",
            KeyFlag::F3 => "f3",
            KeyFlag::F4 => "f4",
            KeyFlag::F5 => "f5",
            KeyFlag::F6 => "f6",
            KeyFlag::F7 => "f7",
            KeyFlag::F8 => "f8",
            KeyFlag::F9 => "f9",
            KeyFlag::F10 => "f10",
            KeyFlag::F11 => "f11",
            KeyFlag::F12 => "f12",
        }
    }

    /// Raw sequences a terminal may send for this key.
    pub fn sequences(self) -> &'static [&'static str] {
        match self {
            KeyFlag::Escape => &SEQ_ESCAPE,
            KeyFlag::Return => &SEQ_RETURN,
            KeyFlag::Backspace => &SEQ_BACKSPACE,
            KeyFlag::Delete => &SEQ_DELETE,
            KeyFlag::Tab => &SEQ_TAB,
            KeyFlag::Up => &SEQ_UP,
            KeyFlag::Down => &SEQ_DOWN,
            KeyFlag::Left => &SEQ_LEFT,
            KeyFlag::Right => &SEQ_RIGHT,
            KeyFlag::Insert => &SEQ_INSERT,
            KeyFlag::F1 => &SEQ_F1,
            KeyFlag::F2 => &SEQ_F2,
            KeyFlag::F3 => &SEQ_F3,
            KeyFlag::F4 => &SEQ_F4,
            KeyFlag::F5 => &SEQ_F5,
            KeyFlag::F6 => &SEQ_F6,
            KeyFlag::F7 => &SEQ_F7,
            KeyFlag::F8 => &SEQ_F8,
            KeyFlag::F9 => &SEQ_F9,
            KeyFlag::F10 => &SEQ_F10,
            KeyFlag::F11 => &SEQ_F11,
            KeyFlag::F12 => &SEQ_F12,
        }
    }
}

impl fmt::Display for KeyFlag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for KeyFlag {
    type Err = EngineError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let lowered = value.to_ascii_lowercase();
        let flag = match lowered.as_str() {
            "esc" | "escape" => KeyFlag::Escape,
            "return" | "enter" => KeyFlag::Return,
            "backspace" => KeyFlag::Backspace,
            "delete" => KeyFlag::Delete,
            "tab" => KeyFlag::Tab,
            "up" => KeyFlag::Up,
            "down" => KeyFlag::Down,
            "left" => KeyFlag::Left,
            "right" => KeyFlag::Right,
            "insert" => KeyFlag::Insert,
            other => {
                return KeyFlag::ALL
                    .iter()
                    .copied()
                    .find(|flag| flag.name() == other)
                    .ok_or_else(|| EngineError::UnknownKey(value.to_string()))
            }
        };
        Ok(flag)
    }
}

const SEQ_ESCAPE: [&str; 1] = ["\x1b"];
const SEQ_RETURN: [&str; 2] = ["\r", "\x1bOM"];
const SEQ_BACKSPACE: [&str; 1] = ["\x7f"];
const SEQ_DELETE: [&str; 1] = ["\x1b[3~"];
const SEQ_TAB: [&str; 1] = ["\t"];
const SEQ_UP: [&str; 2] = ["\x1b[A", "\x1bOA"];
const SEQ_DOWN: [&str; 2] = ["\x1b[B", "\x1bOB"];
const SEQ_RIGHT: [&str; 2] = ["\x1b[C", "\x1bOC"];
const SEQ_LEFT: [&str; 2] = ["\x1b[D", "\x1bOD"];
const SEQ_INSERT: [&str; 1] = ["\x1b[2~"];
const SEQ_F1: [&str; 3] = ["\x1bOP", "\x1b[11~", "\x1b[[A"];
const SEQ_F2: [&str; 3] = ["\x1bOQ", "\x1b[12~", "\x1b[[B"];
const SEQ_F3: [&str; 3] = ["\x1bOR", "\x1b[13~", "\x1b[[C"];
const SEQ_F4: [&str; 3] = ["\x1bOS", "\x1b[14~", "\x1b[[D"];
const SEQ_F5: [&str; 2] = ["\x1b[15~", "\x1b[[E"];
const SEQ_F6: [&str; 1] = ["\x1b[17~"];
const SEQ_F7: [&str; 1] = ["\x1b[18~"];
const SEQ_F8: [&str; 1] = ["\x1b[19~"];
const SEQ_F9: [&str; 1] = ["\x1b[20~"];
const SEQ_F10: [&str; 1] = ["\x1b[21~"];
const SEQ_F11: [&str; 1] = ["\x1b[23~"];
const SEQ_F12: [&str; 1] = ["\x1b[24~"];

static KEYCODES: Lazy<HashMap<&'static str, KeyFlag>> = Lazy::new(|| {
    let mut map = HashMap::new();
    for flag in KeyFlag::ALL {
        for sequence in flag.sequences() {
            map.insert(*sequence, flag);
        }
    }
    map
});

/// Look up the special key a raw chunk encodes, if any.
pub fn lookup(chunk: &str) -> Option<KeyFlag> {
    KEYCODES.get(chunk).copied()
}

/// Decode a control-key chunk into its lowercase letter.
///
/// Only the leading code point is considered; codes owned by the keycode
/// table (tab, return) must be checked with [`lookup`] first.
pub fn ctrl_letter(chunk: &str) -> Option<char> {
    let code = chunk.chars().next()? as u32;
    if !CTRL_RANGE.contains(&code) {
        return None;
    }
    char::from_u32(code + 96)
}

/// Raw control byte for ctrl + `letter`, the inverse of [`ctrl_letter`].
pub fn ctrl_sequence(letter: char) -> Option<String> {
    if !letter.is_ascii_lowercase() {
        return None;
    }
    char::from_u32(letter as u32 - 96).map(|ch| ch.to_string())
}
