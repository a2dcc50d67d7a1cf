#![allow(unused_imports)]

use tape_interact::{
    init_logging, AlwaysFocused, Binding, BindingSpec, Bindings, Chunker, ConsumerId, ConsumerSpec,
    CycleOutcome, DecodeOutcome, Direction, EngineError, EngineResult, EnvConfig, FocusFlags,
    FocusProbe, HubOptions, InputHub, InputStream, KeyBindingSet, KeyFlag, KeyFlags, KeyName,
    KeyState, Keypress, Navigator, NavigatorScope, Priority, PriorityGate, Register, Scope,
    ScriptedInput, ScrollMode, StartNode, Viewport, ViewportOptions, ViewportScope, ViewportState,
    INTERRUPT,
};

#[cfg(unix)]
use tape_interact::ProcessInput;

#[test]
fn public_api_exports_compile() {}

#[test]
fn binding_specs_validate_at_construction() {
    assert!(matches!(
        Binding::try_from(BindingSpec::new().input("")),
        Err(EngineError::InvalidBinding(_))
    ));
    assert!(matches!(
        Binding::try_from(BindingSpec::new().key("ctrl").input("ab")),
        Err(EngineError::InvalidBinding(_))
    ));
    assert!(matches!(
        Binding::try_from(BindingSpec::new().key("hyper")),
        Err(EngineError::UnknownKey(_))
    ));
    assert_eq!(
        Binding::try_from(BindingSpec::new().key("ctrl").input("x")).unwrap(),
        Binding::Ctrl('x')
    );
    assert_eq!("textinput".parse::<Priority>().unwrap(), Priority::TextInput);
}
