//! Consumer arbitration and presentation state.

pub mod hub;
pub mod navigator;
pub mod priority;
pub mod scope;
pub mod viewport;

pub use hub::{
    AlwaysFocused, ConsumerId, ConsumerSpec, CycleOutcome, FocusFlags, FocusProbe, HubOptions,
    InputHub, KeypressHandler,
};
pub use navigator::{Direction, Navigator, StartNode, EMPTY_LOCATION};
pub use priority::{Priority, PriorityGate};
pub use scope::{NavigatorScope, Scope, Scoped, ViewportScope};
pub use viewport::{ScrollMode, Viewport, ViewportOptions, ViewportState};
