//! Declarative key bindings and per-consumer binding sets.

use std::fmt;

use crate::core::error::EngineError;
use crate::core::keycodes::KeyFlag;
use crate::core::register::KeyState;

/// A key name usable in a binding: a special key flag or the synthetic ctrl flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KeyName {
    Flag(KeyFlag),
    Ctrl,
}

impl KeyName {
    pub fn parse(value: &str) -> Result<Self, EngineError> {
        if value.eq_ignore_ascii_case("ctrl") {
            return Ok(KeyName::Ctrl);
        }
        value.parse().map(KeyName::Flag)
    }

    fn is_set(self, state: &KeyState) -> bool {
        match self {
            KeyName::Flag(flag) => state.flags.is(flag),
            KeyName::Ctrl => state.flags.ctrl(),
        }
    }
}

impl From<KeyFlag> for KeyName {
    fn from(value: KeyFlag) -> Self {
        KeyName::Flag(value)
    }
}

impl fmt::Display for KeyName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            KeyName::Flag(flag) => flag.fmt(f),
            KeyName::Ctrl => f.write_str("ctrl"),
        }
    }
}

/// A single match predicate over the register's key state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Binding {
    /// Matches every keystroke.
    Any,
    /// The named flag must be set.
    Key(KeyName),
    /// Control combination with the given lowercase letter.
    Ctrl(char),
    /// Literal input with no special flag set.
    Input(String),
    /// A special flag together with literal input.
    ///
    /// The register never sets a flag and buffers a literal in the same
    /// cycle, so this never matches decoded input. It is kept so binding
    /// sets written against it still load.
    KeyInput(KeyFlag, String),
    /// Matches when none of the keys is set and the register is not one of
    /// the inputs.
    Exclude {
        keys: Vec<KeyName>,
        inputs: Vec<String>,
    },
}

impl Binding {
    pub fn any() -> Self {
        Binding::Any
    }

    pub fn key(name: &str) -> Result<Self, EngineError> {
        BindingSpec::new().key(name).try_into()
    }

    pub fn ctrl(letter: char) -> Result<Self, EngineError> {
        BindingSpec::new().key("ctrl").input(letter.to_string()).try_into()
    }

    pub fn input(literal: impl Into<String>) -> Self {
        Binding::Input(literal.into())
    }

    pub fn matches(&self, state: &KeyState) -> bool {
        match self {
            Binding::Any => true,
            Binding::Exclude { keys, inputs } => {
                !keys.iter().any(|key| key.is_set(state))
                    && !inputs.iter().any(|input| state.register_matches(input))
            }
            Binding::Ctrl(letter) => state.ctrl_letter == Some(*letter),
            Binding::KeyInput(flag, input) => {
                state.flags.is(*flag) && state.register_matches(input)
            }
            Binding::Key(name) => name.is_set(state),
            Binding::Input(input) => !state.flags.any() && state.register_matches(input),
        }
    }
}

impl From<&str> for Binding {
    fn from(value: &str) -> Self {
        Binding::Input(value.to_string())
    }
}

impl From<String> for Binding {
    fn from(value: String) -> Self {
        Binding::Input(value)
    }
}

impl From<KeyFlag> for Binding {
    fn from(value: KeyFlag) -> Self {
        Binding::Key(KeyName::Flag(value))
    }
}

/// Loose binding description with optional fields, validated into a [`Binding`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BindingSpec {
    pub key: Option<String>,
    pub input: Option<String>,
    pub not_key: Vec<String>,
    pub not_input: Vec<String>,
}

impl BindingSpec {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn key(mut self, key: impl Into<String>) -> Self {
        self.key = Some(key.into());
        self
    }

    pub fn input(mut self, input: impl Into<String>) -> Self {
        self.input = Some(input.into());
        self
    }

    pub fn not_key(mut self, key: impl Into<String>) -> Self {
        self.not_key.push(key.into());
        self
    }

    pub fn not_input(mut self, input: impl Into<String>) -> Self {
        self.not_input.push(input.into());
        self
    }
}

impl TryFrom<BindingSpec> for Binding {
    type Error = EngineError;

    fn try_from(spec: BindingSpec) -> Result<Self, Self::Error> {
        if let Some(input) = spec.input.as_deref() {
            if input.is_empty() {
                return Err(EngineError::InvalidBinding("input must not be empty".to_string()));
            }
        }

        if !spec.not_key.is_empty() || !spec.not_input.is_empty() {
            if spec.key.is_some() || spec.input.is_some() {
                return Err(EngineError::InvalidBinding(
                    "exclusion lists cannot be combined with key or input".to_string(),
                ));
            }
            let keys = spec
                .not_key
                .iter()
                .map(|key| KeyName::parse(key))
                .collect::<Result<Vec<_>, _>>()?;
            return Ok(Binding::Exclude {
                keys,
                inputs: spec.not_input,
            });
        }

        let key = spec.key.as_deref().map(KeyName::parse).transpose()?;
        match (key, spec.input) {
            (None, None) => Ok(Binding::Any),
            (None, Some(input)) => Ok(Binding::Input(input)),
            (Some(KeyName::Ctrl), Some(input)) => {
                let mut chars = input.chars();
                match (chars.next(), chars.next()) {
                    (Some(letter), None) if letter.is_ascii_lowercase() => Ok(Binding::Ctrl(letter)),
                    _ => Err(EngineError::InvalidBinding(format!(
                        "ctrl binding needs a single lowercase letter, got {input:?}"
                    ))),
                }
            }
            (Some(KeyName::Flag(flag)), Some(input)) => Ok(Binding::KeyInput(flag, input)),
            (Some(name), None) => Ok(Binding::Key(name)),
        }
    }
}

/// Ordered mapping from command name to alternative bindings.
///
/// Commands are matched in declaration order; within a command the first
/// matching binding wins.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct KeyBindingSet {
    entries: Vec<(String, Vec<Binding>)>,
}

impl KeyBindingSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder form of [`KeyBindingSet::set`].
    pub fn bind<B: Into<Bindings>>(mut self, command: impl Into<String>, bindings: B) -> Self {
        self.set(command, bindings);
        self
    }

    /// Declare a command, replacing an earlier declaration in place.
    pub fn set<B: Into<Bindings>>(&mut self, command: impl Into<String>, bindings: B) {
        let command = command.into();
        let bindings = bindings.into().0;
        match self.entries.iter_mut().find(|(name, _)| *name == command) {
            Some(entry) => entry.1 = bindings,
            None => self.entries.push((command, bindings)),
        }
    }

    pub fn get(&self, command: &str) -> Option<&[Binding]> {
        self.entries
            .iter()
            .find(|(name, _)| name == command)
            .map(|(_, bindings)| bindings.as_slice())
    }

    pub fn contains(&self, command: &str) -> bool {
        self.get(command).is_some()
    }

    pub fn commands(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(name, _)| name.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[Binding])> {
        self.entries
            .iter()
            .map(|(name, bindings)| (name.as_str(), bindings.as_slice()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// One binding or an ordered list of alternatives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Bindings(pub Vec<Binding>);

impl From<Binding> for Bindings {
    fn from(value: Binding) -> Self {
        Bindings(vec![value])
    }
}

impl From<Vec<Binding>> for Bindings {
    fn from(value: Vec<Binding>) -> Self {
        Bindings(value)
    }
}

impl From<&str> for Bindings {
    fn from(value: &str) -> Self {
        Bindings(vec![Binding::from(value)])
    }
}

impl From<Vec<&str>> for Bindings {
    fn from(value: Vec<&str>) -> Self {
        Bindings(value.into_iter().map(Binding::from).collect())
    }
}

impl From<KeyFlag> for Bindings {
    fn from(value: KeyFlag) -> Self {
        Bindings(vec![Binding::from(value)])
    }
}
