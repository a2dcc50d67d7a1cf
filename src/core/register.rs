//! Keystroke register: decodes raw chunks and resolves binding sets into one
//! command per cycle.
//!
//! A cycle starts with [`Register::decode`]. Any number of consumers may then
//! call [`Register::match_config`]; the first command matched in the cycle
//! wins and is never overwritten. [`Register::emit`] hands the command to the
//! listener bus once, no matter how many consumers ask.

use unicode_segmentation::UnicodeSegmentation;

use crate::core::binding::{KeyBindingSet, KeyName};
use crate::core::keycodes::{self, KeyFlag, INTERRUPT};

/// Literal characters retained between cycles.
pub const CHAR_REGISTER_LEN: usize = 2;

/// The key flags of one cycle. At most one flag is ever set.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct KeyFlags {
    active: Option<KeyName>,
}

impl KeyFlags {
    pub fn is(self, flag: KeyFlag) -> bool {
        self.active == Some(KeyName::Flag(flag))
    }

    pub fn ctrl(self) -> bool {
        self.active == Some(KeyName::Ctrl)
    }

    pub fn any(self) -> bool {
        self.active.is_some()
    }

    pub fn active(self) -> Option<KeyName> {
        self.active
    }
}

/// Decoded state visible to binding predicates.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct KeyState {
    pub flags: KeyFlags,
    pub ctrl_letter: Option<char>,
    pub char_register: String,
}

impl KeyState {
    /// Whether the held literal characters are exactly `input`.
    pub fn register_matches(&self, input: &str) -> bool {
        !input.is_empty() && self.char_register == input
    }

    fn push_literal(&mut self, chunk: &str) {
        self.char_register.push_str(chunk);
        let count = self.char_register.graphemes(true).count();
        if count > CHAR_REGISTER_LEN {
            let skip: usize = self
                .char_register
                .graphemes(true)
                .take(count - CHAR_REGISTER_LEN)
                .map(str::len)
                .sum();
            self.char_register.drain(..skip);
        }
    }
}

/// Result of decoding one raw chunk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecodeOutcome {
    Special(KeyFlag),
    Ctrl(char),
    Literal,
    /// The interrupt sequence; the owner must release listeners and terminate.
    Interrupt,
}

/// A resolved command as delivered to listeners.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Keypress {
    pub command: String,
    pub chunk: String,
    pub flags: KeyFlags,
    pub ctrl_letter: Option<char>,
}

#[derive(Debug, Default)]
pub struct Register {
    state: KeyState,
    command: Option<String>,
    event_emitted: bool,
}

impl Register {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a new cycle from one raw input chunk.
    pub fn decode(&mut self, chunk: &str) -> DecodeOutcome {
        self.command = None;
        self.event_emitted = false;

        if chunk == INTERRUPT {
            return DecodeOutcome::Interrupt;
        }

        if let Some(flag) = keycodes::lookup(chunk) {
            self.state.flags.active = Some(KeyName::Flag(flag));
            self.state.ctrl_letter = None;
            self.state.char_register.clear();
            return DecodeOutcome::Special(flag);
        }

        if let Some(letter) = keycodes::ctrl_letter(chunk) {
            self.state.flags.active = Some(KeyName::Ctrl);
            self.state.ctrl_letter = Some(letter);
            self.state.char_register.clear();
            return DecodeOutcome::Ctrl(letter);
        }

        self.state.flags.active = None;
        self.state.ctrl_letter = None;
        self.state.push_literal(chunk);
        DecodeOutcome::Literal
    }

    /// Match one consumer's binding set against the current cycle.
    ///
    /// Returns the cycle's command, which may have been set by an earlier
    /// consumer.
    pub fn match_config(&mut self, config: &KeyBindingSet) -> Option<&str> {
        if self.command.is_none() {
            let matched = config
                .iter()
                .find(|(_, bindings)| bindings.iter().any(|binding| binding.matches(&self.state)))
                .map(|(command, _)| command.to_string());
            if let Some(command) = matched {
                tracing::trace!(command = %command, "register matched command");
                self.state.char_register.clear();
                self.command = Some(command);
            }
        }
        self.command.as_deref()
    }

    /// Deliver `command` for this cycle. Only the first call per cycle yields
    /// a keypress.
    pub fn emit(&mut self, command: &str, chunk: &str) -> Option<Keypress> {
        if self.event_emitted {
            return None;
        }
        self.event_emitted = true;
        Some(Keypress {
            command: command.to_string(),
            chunk: chunk.to_string(),
            flags: self.state.flags,
            ctrl_letter: self.state.ctrl_letter,
        })
    }

    pub fn char_register(&self) -> &str {
        &self.state.char_register
    }

    pub fn command(&self) -> Option<&str> {
        self.command.as_deref()
    }

    pub fn flags(&self) -> KeyFlags {
        self.state.flags
    }

    pub fn ctrl_letter(&self) -> Option<char> {
        self.state.ctrl_letter
    }

    pub fn event_emitted(&self) -> bool {
        self.event_emitted
    }

    pub fn state(&self) -> &KeyState {
        &self.state
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }
}
