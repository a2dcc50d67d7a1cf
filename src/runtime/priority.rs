//! Priority gate: decides which consumers may take part in a register cycle.

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use crate::core::error::EngineError;
use crate::runtime::hub::ConsumerId;

/// Declared priority of a keymap consumer.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum Priority {
    Never,
    #[default]
    Default,
    Override,
    TextInput,
    Always,
}

impl Priority {
    /// Rank used for arbitration. `Never` and `Always` do not compete.
    fn rank(self) -> Option<u8> {
        match self {
            Priority::Default => Some(0),
            Priority::Override => Some(1),
            Priority::TextInput => Some(2),
            Priority::Never | Priority::Always => None,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Priority::Never => "never",
            Priority::Default => "default",
            Priority::Override => "override",
            Priority::TextInput => "textinput",
            Priority::Always => "always",
        }
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Priority {
    type Err = EngineError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.to_ascii_lowercase().as_str() {
            "never" => Ok(Priority::Never),
            "default" => Ok(Priority::Default),
            "override" => Ok(Priority::Override),
            "textinput" => Ok(Priority::TextInput),
            "always" => Ok(Priority::Always),
            _ => Err(EngineError::UnknownPriority(value.to_string())),
        }
    }
}

/// Table of `(id, priority)` entries for every consumer currently holding a slot.
#[derive(Debug, Default)]
pub struct PriorityGate {
    entries: HashMap<ConsumerId, Priority>,
}

impl PriorityGate {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn can_process(&self, id: ConsumerId, priority: Priority) -> bool {
        let mut others = self.entries.iter().filter(|(other, _)| **other != id);
        match priority {
            Priority::Never => false,
            Priority::Always => !others.any(|(_, other)| *other == Priority::TextInput),
            _ => {
                let Some(rank) = priority.rank() else {
                    return false;
                };
                !others
                    .filter_map(|(_, other)| other.rank())
                    .any(|other| other > rank)
            }
        }
    }

    pub fn update_priority(&mut self, id: ConsumerId, priority: Priority) {
        self.entries.insert(id, priority);
    }

    pub fn remove_hook(&mut self, id: ConsumerId) {
        self.entries.remove(&id);
    }

    pub fn priority_of(&self, id: ConsumerId) -> Option<Priority> {
        self.entries.get(&id).copied()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}
