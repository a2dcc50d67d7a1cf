use std::cell::RefCell;
use std::rc::Rc;

use pretty_assertions::assert_eq;
use tape_interact::{
    Binding, ConsumerSpec, CycleOutcome, HubOptions, InputHub, KeyBindingSet, KeyFlag, Keypress,
    Navigator, Register, ScriptedInput, StartNode, Viewport, ViewportOptions, ViewportScope,
};

fn scripted_hub(chunks: &[&str]) -> InputHub<ScriptedInput> {
    let mut hub = InputHub::new(ScriptedInput::with_chunks(chunks.iter().copied()), HubOptions::default());
    hub.set_interrupt_handler(|| {});
    hub
}

#[test]
fn ctrl_letters_resolve_to_their_commands() {
    let config = KeyBindingSet::new()
        .bind("ctrlA", Binding::ctrl('a').unwrap())
        .bind("ctrlB", Binding::ctrl('b').unwrap())
        .bind("ctrlD", Binding::ctrl('d').unwrap());
    let mut register = Register::new();

    let mut resolved = Vec::new();
    for chunk in ["\x01", "\x02", "\x04"] {
        register.decode(chunk);
        resolved.push(register.match_config(&config).map(str::to_string));
        assert_eq!(register.char_register(), "");
    }
    assert_eq!(
        resolved,
        vec![
            Some("ctrlA".to_string()),
            Some("ctrlB".to_string()),
            Some("ctrlD".to_string())
        ]
    );
}

#[test]
fn single_and_multi_character_inputs_share_a_command() {
    let config = KeyBindingSet::new().bind("foo", vec!["f", "F", "!@", "#$"]);
    let mut register = Register::new();
    let mut matched = Vec::new();

    for chunk in ["f", "F", "!", "@", "#", "$"] {
        register.decode(chunk);
        if let Some(command) = register.match_config(&config) {
            matched.push((chunk, command.to_string()));
            assert_eq!(register.char_register(), "");
        }
    }
    assert_eq!(
        matched,
        vec![
            ("f", "foo".to_string()),
            ("F", "foo".to_string()),
            ("@", "foo".to_string()),
            ("$", "foo".to_string()),
        ]
    );
}

#[test]
fn ragged_grid_walk_matches_expected_path() {
    let grid = vec![
        vec!["a", "b"],
        vec!["c"],
        vec!["d"],
        vec!["e"],
        vec!["f", "g"],
        vec!["h"],
    ];
    let mut nav = Navigator::new(grid, Some(StartNode::from("a"))).unwrap();
    let moves = [
        "up", "up", "right", "right", "left", "left", "right", "down", "up", "up", "down", "down",
        "down", "down", "right", "right", "down",
    ];
    let mut visited = Vec::new();
    for step in moves {
        let location = match step {
            "up" => nav.up(),
            "down" => nav.down(),
            "left" => nav.left(),
            "right" => nav.right(),
            other => panic!("unknown move {other}"),
        }
        .unwrap()
        .to_string();
        visited.push(location);
    }
    assert_eq!(
        visited,
        vec!["a", "a", "b", "b", "a", "a", "b", "c", "a", "a", "c", "d", "e", "f", "g", "g", "h"]
    );
}

#[test]
fn edge_scroll_shifts_window_by_one() {
    let mut viewport = Viewport::new(10, ViewportOptions::new(3)).unwrap();
    viewport.next_item().unwrap();
    viewport.next_item().unwrap();
    assert_eq!(
        (viewport.current_index(), viewport.start(), viewport.end()),
        (2, 0, 3)
    );
    viewport.next_item().unwrap();
    assert_eq!(
        (viewport.current_index(), viewport.start(), viewport.end()),
        (3, 1, 4)
    );
}

#[test]
fn zero_window_collapses_onto_focus() {
    let mut viewport = Viewport::new(10, ViewportOptions::new(3).start_index(4)).unwrap();
    viewport.modify_win_size(0).unwrap();
    assert_eq!(viewport.start(), 4);
    assert_eq!(viewport.end(), 4);
    assert_eq!(viewport.current_index(), 4);
}

#[test]
fn duplicate_declarations_fire_once_per_listener() {
    let log = Rc::new(RefCell::new(Vec::new()));
    let mut hub = scripted_hub(&["j", "k"]);

    for tag in ["list", "status"] {
        let log = Rc::clone(&log);
        hub.attach(
            ConsumerSpec::new(KeyBindingSet::new().bind("down", "j"))
                .on("down", move |keypress: &Keypress| {
                    log.borrow_mut().push(format!("{tag}:{}", keypress.chunk))
                }),
        );
    }

    let outcomes = hub.pump();
    assert_eq!(
        outcomes,
        vec![
            CycleOutcome::Matched {
                command: "down".to_string(),
                delivered: 2
            },
            CycleOutcome::Unmatched,
        ]
    );
    assert_eq!(*log.borrow(), vec!["list:j", "status:j"]);
}

#[test]
fn listeners_drive_scoped_viewport() {
    let viewport = Rc::new(RefCell::new(Viewport::new(5, ViewportOptions::new(2)).unwrap()));
    let mut scope = ViewportScope::new();
    scope.provide(Rc::clone(&viewport));

    let mut hub = scripted_hub(&["\x1b[B", "\x1b[B", "\x1b[B", "\x1b[A"]);
    let down = Rc::clone(&viewport);
    let up = Rc::clone(&viewport);
    hub.attach(
        ConsumerSpec::new(
            KeyBindingSet::new()
                .bind("next", KeyFlag::Down)
                .bind("prev", KeyFlag::Up),
        )
        .on("next", move |_| down.borrow_mut().next_item().unwrap())
        .on("prev", move |_| up.borrow_mut().prev_item().unwrap()),
    );

    assert_eq!(hub.pump().len(), 4);
    assert!(scope.is_focused(2).unwrap());
    let snapshot = viewport.borrow().snapshot();
    assert_eq!((snapshot.start, snapshot.end), (2, 4));
}
