//! Property-based tests for the assembler and the battle engine.
//!
//! Run with: cargo test --release prop_battle

#![allow(missing_docs)]
#![allow(clippy::unwrap_used)]

use proptest::prelude::*;

use tankasm::game::{
    check_invariants, resolve_moves, BattleConfig, BattleManager, Coord, Feedback, Grid, Level,
    MoveOutcome,
};
use tankasm::isa::{tokenize, Operand};
use tankasm::tournament::run_battle_observed;
use tankasm::compile;

/// Source lines a random program is built from. Every line compiles, and
/// `top` is always defined, so any sequence of them is a valid program.
const LINES: &[&str] = &[
    "NOP",
    "INC R0",
    "DEC R1",
    "ADD ACC, R0",
    "MOD R0, 4",
    "CMP R0, 2",
    "CMP AMMO, 1",
    "JE top",
    "JNE top",
    "JG top",
    "MOVE FORWARD",
    "MOVE BACKWARD",
    "ROTATE LEFT",
    "ROTATE RIGHT",
    "FIRE",
    "SCAN R2, R3",
    "PING R4, R5",
    "WAIT",
    "DIV R0, R1",
];

fn program_source(lines: &[usize]) -> String {
    let mut source = String::from("top:\n");
    for &i in lines {
        source.push_str(LINES[i % LINES.len()]);
        source.push('\n');
    }
    source.push_str("JMP top\n");
    source
}

fn any_coord() -> impl Strategy<Value = Coord> {
    (-1i32..7, -1i32..5).prop_map(|(x, y)| Coord::new(x, y))
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(2000))]

    /// The tokenizer accepts any text.
    #[test]
    fn prop_tokenize_never_panics(source in "\\PC{0,200}") {
        let _ = tokenize(&source);
    }

    /// Compiling arbitrary text yields a program or an error, the same one
    /// every time.
    #[test]
    fn prop_compile_is_deterministic(source in "[A-Za-z0-9 ,:;#/\\-\\n]{0,120}") {
        prop_assert_eq!(compile(&source), compile(&source));
    }

    /// A compile error always points at a line that exists.
    #[test]
    fn prop_compile_error_line_in_range(source in "[A-Z0-9 ,:\\n]{0,80}") {
        if let Err(err) = compile(&source) {
            prop_assert!(err.line >= 1);
            prop_assert!(err.line <= source.lines().count().max(1));
        }
    }

    /// Forward and backward references to one label resolve to one address.
    #[test]
    fn prop_forward_and_backward_labels_agree(before in 0usize..20, after in 0usize..20) {
        let mut source = String::from("JMP target\n");
        source.push_str(&"NOP\n".repeat(before));
        source.push_str("target:\n");
        source.push_str(&"NOP\n".repeat(after));
        source.push_str("JMP target\n");

        let program = compile(&source).unwrap();
        let first = &program.instructions()[0];
        let last = &program.instructions()[program.len() - 1];
        prop_assert_eq!(&first.operands, &last.operands);
        prop_assert_eq!(first.operands[0], Operand::Addr(before + 1));
        prop_assert_eq!(program.label("target"), Some(before + 1));
    }

    /// Every intent gets exactly one outcome and no tank ends up on a wall
    /// or on the other tank.
    #[test]
    fn prop_move_outcomes_are_total(
        a in any_coord(),
        b in any_coord(),
        move_a in any::<bool>(),
        move_b in any::<bool>(),
        p1 in (0i32..6, 0i32..4),
        p2 in (0i32..6, 0i32..4),
    ) {
        let grid = Grid::with_walls(6, 4, [Coord::new(3, 0), Coord::new(3, 1)]).unwrap();
        let positions = [Coord::new(p1.0, p1.1), Coord::new(p2.0, p2.1)];
        prop_assume!(positions[0] != positions[1]);
        prop_assume!(grid.is_valid(positions[0]) && grid.is_valid(positions[1]));

        let intents = [move_a.then_some(a), move_b.then_some(b)];
        let outcomes = resolve_moves(&grid, positions, intents);

        let mut finals = positions;
        for i in 0..2 {
            prop_assert_eq!(intents[i].is_some(), outcomes[i].is_some());
            match &outcomes[i] {
                Some(MoveOutcome::Moved(to)) => {
                    prop_assert!(grid.is_valid(*to));
                    finals[i] = *to;
                }
                Some(MoveOutcome::Rejected(feedback)) => {
                    prop_assert!(matches!(
                        feedback,
                        Feedback::Wall | Feedback::Collision | Feedback::Blocked
                    ));
                }
                None => {}
            }
        }
        prop_assert_ne!(finals[0], finals[1]);
    }

    /// Writes to the mirrored registers never move or heal a tank.
    #[test]
    fn prop_sensor_writes_have_no_effect(value in any::<i32>()) {
        let source = format!("MOV PX, {value}\nMOV HP, {value}\nMOV DIR, {value}\nMOVE\nHALT");
        let mut battle = BattleManager::new(BattleConfig::default());
        battle.load_code(&source, "HALT").unwrap();
        battle.run_until_ready(1);
        battle.run_until_ready(2);
        battle.resolve_turn().unwrap();

        let p1 = battle.tank(1).unwrap();
        prop_assert_eq!(p1.position, Coord::new(2, 6));
        prop_assert_eq!(p1.hp, 3);
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    /// Random programs play out deterministically and never break the
    /// battle invariants.
    #[test]
    fn prop_random_battles_hold_invariants(
        a in prop::collection::vec(0usize..64, 1..24),
        b in prop::collection::vec(0usize..64, 1..24),
        level in 1u8..=3,
    ) {
        let programs = [
            compile(&program_source(&a)).unwrap(),
            compile(&program_source(&b)).unwrap(),
        ];
        let arena = Level::try_from(level).unwrap().arena();
        let config = BattleConfig {
            max_turns: 80,
            ..BattleConfig::default()
        };

        let mut violations = Vec::new();
        let first = run_battle_observed(&programs, &arena, &config, |battle| {
            violations.extend(check_invariants(&battle.state()));
        })
        .unwrap();
        prop_assert!(violations.is_empty(), "{:?}", violations);

        let second = run_battle_observed(&programs, &arena, &config, |_| {}).unwrap();
        prop_assert_eq!(first, second);
    }
}
