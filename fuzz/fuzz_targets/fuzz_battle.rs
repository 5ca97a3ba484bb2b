#![no_main]

//! Full battle fuzzer.
//!
//! Builds two programs from fuzzer-chosen instructions, plays them on a
//! fuzzer-chosen level and checks the invariants after every turn:
//! 1. Both CPUs are stepped until turn-ready
//! 2. The turn is resolved
//! 3. The snapshot is checked
//!
//! This catches interactions between bullets, sensors and movement that unit
//! tests miss.

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use tankasm::game::{check_invariants, BattleConfig, BattleManager, Level};

/// One fuzzer-chosen instruction.
#[derive(Arbitrary, Debug, Clone, Copy)]
enum FuzzOp {
    Nop,
    Inc(u8),
    AddImm(u8, i8),
    Cmp(u8, i8),
    JumpIfEqual,
    JumpIfGreater,
    MoveForward,
    MoveBackward,
    RotateLeft,
    RotateRight,
    Fire,
    Scan,
    Ping,
    Wait,
    Divide(u8, u8),
    Halt,
}

impl FuzzOp {
    fn source(self) -> String {
        let reg = |r: u8| format!("R{}", r % 6);
        match self {
            FuzzOp::Nop => "NOP".to_string(),
            FuzzOp::Inc(r) => format!("INC {}", reg(r)),
            FuzzOp::AddImm(r, v) => format!("ADD {}, {v}", reg(r)),
            FuzzOp::Cmp(r, v) => format!("CMP {}, {v}", reg(r)),
            FuzzOp::JumpIfEqual => "JE top".to_string(),
            FuzzOp::JumpIfGreater => "JG top".to_string(),
            FuzzOp::MoveForward => "MOVE FORWARD".to_string(),
            FuzzOp::MoveBackward => "MOVE BACKWARD".to_string(),
            FuzzOp::RotateLeft => "ROTATE LEFT".to_string(),
            FuzzOp::RotateRight => "ROTATE RIGHT".to_string(),
            FuzzOp::Fire => "FIRE".to_string(),
            FuzzOp::Scan => "SCAN R4, R5".to_string(),
            FuzzOp::Ping => "PING R4, R5".to_string(),
            FuzzOp::Wait => "WAIT".to_string(),
            FuzzOp::Divide(a, b) => format!("DIV {}, {}", reg(a), reg(b)),
            FuzzOp::Halt => "HALT".to_string(),
        }
    }
}

/// Structured input for battle fuzzing.
#[derive(Arbitrary, Debug)]
struct BattleInput {
    /// Instructions for P1.
    p1: Vec<FuzzOp>,
    /// Instructions for P2.
    p2: Vec<FuzzOp>,
    /// Level selector.
    level: u8,
    /// Bullet tuning.
    bullet_speed: u8,
    bullet_range: u8,
    /// Per-turn op budget.
    op_limit: u8,
    /// Number of turns to simulate.
    num_turns: u8,
}

fn program(ops: &[FuzzOp]) -> String {
    let mut source = String::from("top:\n");
    for op in ops.iter().take(32) {
        source.push_str(&op.source());
        source.push('\n');
    }
    source.push_str("JMP top\n");
    source
}

fuzz_target!(|input: BattleInput| {
    let config = BattleConfig {
        max_turns: u32::from(input.num_turns % 100).max(1),
        bullet_speed: u32::from(input.bullet_speed % 4),
        bullet_range: i32::from(input.bullet_range % 16).max(1),
        max_ops_per_turn: u32::from(input.op_limit),
        ..BattleConfig::default()
    };
    let level = Level::ALL[usize::from(input.level) % Level::ALL.len()];

    let mut battle = BattleManager::new(config);
    battle.setup_arena(level);
    if let Err(e) = battle.load_code(&program(&input.p1), &program(&input.p2)) {
        panic!("generated program failed to compile: {e}");
    }

    let violations = check_invariants(&battle.state());
    assert!(violations.is_empty(), "Invariants violated at start: {violations:?}");

    while !battle.is_over() {
        battle.run_until_ready(1);
        battle.run_until_ready(2);
        if let Err(e) = battle.resolve_turn() {
            panic!("turn {} refused: {e}", battle.turn());
        }

        let violations = check_invariants(&battle.state());
        assert!(
            violations.is_empty(),
            "Invariants violated after turn {}: {violations:?}",
            battle.turn()
        );
    }
});
