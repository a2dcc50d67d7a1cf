//! Interaction engine for terminal UI toolkits.
//!
//! Invariant: at most one command per input chunk. The [`InputHub`] decodes
//! each chunk through its [`Register`], lets every focused consumer the
//! [`PriorityGate`] admits match its [`KeyBindingSet`], and fires the listener
//! bus once for the winning command.
//!
//! # Public API Overview
//! - Declare bindings with [`Binding`], [`BindingSpec`] and [`KeyBindingSet`].
//! - Attach consumers to an [`InputHub`] with [`ConsumerSpec`]; feed it from
//!   [`ProcessInput`] (stdin) or [`ScriptedInput`] (tests, replays).
//! - Keep list and page windows in a [`Viewport`], grid focus in a
//!   [`Navigator`], and hand them to nested consumers through a [`Scope`].

pub mod config;
pub mod logging;

pub mod core;
pub mod platform;
pub mod runtime;

/// Binding declarations.
pub use crate::core::binding::{Binding, BindingSpec, Bindings, KeyBindingSet, KeyName};
/// Engine error type.
pub use crate::core::error::{EngineError, EngineResult};
/// Named special keys and the interrupt sequence.
pub use crate::core::keycodes::{KeyFlag, INTERRUPT};
/// Keystroke register.
pub use crate::core::register::{DecodeOutcome, KeyFlags, KeyState, Keypress, Register};

/// Environment configuration and log setup.
pub use crate::config::EnvConfig;
pub use crate::logging::init_logging;

/// Input sources.
pub use crate::platform::{Chunker, InputStream, ScriptedInput};
#[cfg(unix)]
pub use crate::platform::ProcessInput;

/// Hub, gate, viewport, navigator and scopes.
pub use crate::runtime::{
    AlwaysFocused, ConsumerId, ConsumerSpec, CycleOutcome, Direction, FocusFlags, FocusProbe,
    HubOptions, InputHub, Navigator, NavigatorScope, Priority, PriorityGate, Scope, ScrollMode,
    StartNode, Viewport, ViewportOptions, ViewportScope, ViewportState,
};
