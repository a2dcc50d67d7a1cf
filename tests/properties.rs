use proptest::prelude::*;
use tape_interact::{
    DecodeOutcome, KeyBindingSet, KeyFlag, Navigator, Register, StartNode, Viewport,
    ViewportOptions,
};

/// Control codes 1..=26 that the keycode table or the interrupt do not own.
fn free_ctrl_code() -> impl Strategy<Value = u32> {
    (1u32..=26).prop_filter("owned by the keycode table", |code| {
        let chunk = char::from_u32(*code).map(|ch| ch.to_string()).unwrap_or_default();
        chunk != tape_interact::INTERRUPT && !KeyFlag::ALL.iter().any(|flag| flag.sequences().contains(&chunk.as_str()))
    })
}

#[derive(Debug, Clone)]
enum ViewportOp {
    Next,
    Prev,
    GoTo(usize),
    ScrollUp,
    ScrollDown,
    Resize(usize),
    SetLength(usize),
}

fn viewport_op() -> impl Strategy<Value = ViewportOp> {
    prop_oneof![
        Just(ViewportOp::Next),
        Just(ViewportOp::Prev),
        (0usize..40).prop_map(ViewportOp::GoTo),
        Just(ViewportOp::ScrollUp),
        Just(ViewportOp::ScrollDown),
        (0usize..12).prop_map(ViewportOp::Resize),
        (0usize..30).prop_map(ViewportOp::SetLength),
    ]
}

fn ragged_grid() -> impl Strategy<Value = Vec<Vec<String>>> {
    prop::collection::vec(1usize..5, 1..6).prop_map(|widths| {
        let mut next = 0;
        widths
            .into_iter()
            .map(|width| {
                (0..width)
                    .map(|_| {
                        next += 1;
                        format!("n{next}")
                    })
                    .collect()
            })
            .collect()
    })
}

proptest! {
    #[test]
    fn control_codes_decode_to_letters(code in free_ctrl_code(), prefix in "[a-z]{0,2}") {
        let mut register = Register::new();
        for ch in prefix.chars() {
            register.decode(&ch.to_string());
        }
        let chunk = char::from_u32(code).unwrap().to_string();
        let expected = char::from_u32(code + 96).unwrap();
        prop_assert_eq!(register.decode(&chunk), DecodeOutcome::Ctrl(expected));
        prop_assert_eq!(register.ctrl_letter(), Some(expected));
        prop_assert_eq!(register.char_register(), "");
    }

    #[test]
    fn viewport_invariant_holds(
        length in 0usize..30,
        window in 0usize..12,
        circular in any::<bool>(),
        centered in any::<bool>(),
        ops in prop::collection::vec(viewport_op(), 0..40),
    ) {
        let mut options = ViewportOptions::new(window).circular(circular);
        if centered {
            options = options.centered();
        }
        let mut viewport = Viewport::new(length, options).unwrap();
        for op in ops {
            let result = match op {
                ViewportOp::Next => viewport.next_item(),
                ViewportOp::Prev => viewport.prev_item(),
                ViewportOp::GoTo(index) => viewport.go_to_index(index),
                ViewportOp::ScrollUp => viewport.scroll_up(),
                ViewportOp::ScrollDown => viewport.scroll_down(),
                ViewportOp::Resize(size) => viewport.modify_win_size(size),
                ViewportOp::SetLength(length) => viewport.set_length(length),
            };
            prop_assert!(result.is_ok(), "{:?} failed: {:?}", op, result);

            let (idx, start, end) = (viewport.current_index(), viewport.start(), viewport.end());
            prop_assert!(start <= end && end <= viewport.length());
            if viewport.length() > 0 && viewport.window_size() > 0 {
                prop_assert!(start <= idx && idx < end);
            }
            if viewport.window_size() == 0 {
                prop_assert!(start == idx && end == idx);
            }
        }
    }

    #[test]
    fn next_and_prev_cycle_back(grid in ragged_grid(), start in 0usize..20) {
        let mut nav = Navigator::new(grid, Some(StartNode::Iteration(start))).unwrap();
        let origin = nav.location().to_string();
        for _ in 0..nav.size() {
            nav.next().unwrap();
        }
        prop_assert_eq!(nav.location(), origin.as_str());
        for _ in 0..nav.size() {
            nav.prev().unwrap();
        }
        prop_assert_eq!(nav.location(), origin.as_str());
    }

    #[test]
    fn at_most_one_command_per_chunk(chunks in prop::collection::vec("[a-c]{1,2}|\\x1b\\[[AB]", 1..30)) {
        let first = KeyBindingSet::new().bind("alpha", vec!["a", "ab"]).bind("up", KeyFlag::Up);
        let second = KeyBindingSet::new().bind("beta", vec!["b", "a"]).bind("down", KeyFlag::Down);
        let mut register = Register::new();
        for chunk in chunks {
            register.decode(&chunk);
            let winner = register.match_config(&first).map(str::to_string);
            let after = register.match_config(&second).map(str::to_string);
            if winner.is_some() {
                prop_assert_eq!(&after, &winner);
            }
            if let Some(command) = after {
                prop_assert!(register.emit(&command, &chunk).is_some());
                prop_assert!(register.emit(&command, &chunk).is_none());
            }
        }
    }
}
