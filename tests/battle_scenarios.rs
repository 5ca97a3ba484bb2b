//! End-to-end battle tests: sample bots, custom arenas and config files.
//!
//! Run with: cargo test --release battle_scenarios

#![allow(missing_docs)]
#![allow(clippy::unwrap_used)]

use std::io::Write;

use tankasm::game::{
    check_invariants, Arena, BattleConfig, BattleManager, DrawReason, Feedback, GameOutcome,
    Level,
};
use tankasm::isa::Program;
use tankasm::tournament::{run_battle, run_battle_observed, run_tournament, Entry};
use tankasm::{compile, TurnError};

const BOTS: [&str; 4] = ["halt", "hunter", "sniper", "spinner"];

/// Load and compile a program from the bots directory.
fn load_bot(name: &str) -> Program {
    let path = format!("{}/bots/{}.tasm", env!("CARGO_MANIFEST_DIR"), name);
    let source =
        std::fs::read_to_string(&path).unwrap_or_else(|e| panic!("Failed to load {path}: {e}"));
    compile(&source).unwrap_or_else(|e| panic!("{path}: {e}"))
}

#[test]
fn test_sample_bots_compile() {
    for name in BOTS {
        let program = load_bot(name);
        assert!(!program.is_empty(), "{name} compiled to nothing");
    }
}

#[test]
fn test_bot_battles_keep_invariants() {
    let config = BattleConfig::default();

    for level in Level::ALL {
        let arena = level.arena();
        for a in BOTS {
            for b in BOTS {
                let programs = [load_bot(a), load_bot(b)];
                let result = run_battle_observed(&programs, &arena, &config, |battle| {
                    let violations = check_invariants(&battle.state());
                    assert!(
                        violations.is_empty(),
                        "{a} vs {b} on {level}, turn {}: {violations:?}",
                        battle.turn()
                    );
                })
                .unwrap();
                assert!(result.turns_played >= 1);
                assert!(result.turns_played <= config.max_turns);
            }
        }
    }
}

#[test]
fn test_battles_are_deterministic() {
    let config = BattleConfig::default();
    let programs = [load_bot("hunter"), load_bot("spinner")];

    for level in Level::ALL {
        let arena = level.arena();
        let first = run_battle(&programs, &arena, &config).unwrap();
        let second = run_battle(&programs, &arena, &config).unwrap();
        assert_eq!(first, second, "different results on {level}");
    }
}

#[test]
fn test_halt_vs_halt_is_stalemate() {
    let halt = load_bot("halt");
    let result = run_battle(&[halt.clone(), halt], &Level::Open.arena(), &BattleConfig::default())
        .unwrap();
    assert_eq!(
        result.outcome,
        GameOutcome::Draw {
            reason: DrawReason::Stalemate
        }
    );
    assert_eq!(result.turns_played, 1);
}

#[test]
fn test_sniper_in_corridor_wins() {
    let arena = Arena::from_ascii(
        "#####\n\
         #1.2#\n\
         #####\n",
    )
    .unwrap();
    let programs = [load_bot("sniper"), load_bot("halt")];

    let result = run_battle(&programs, &arena, &BattleConfig::default()).unwrap();
    assert_eq!(result.outcome, GameOutcome::Winner { tank: 1 });
    assert_eq!(result.tanks[0].final_hp, 3);
    assert_eq!(result.tanks[1].final_hp, 0);
    assert!(result.turns_played <= 10);
}

#[test]
fn test_custom_arena_spawns_and_walls() {
    let arena = Arena::from_ascii(
        "......\n\
         .1.#..\n\
         ...#2.\n",
    )
    .unwrap();
    let mut battle = BattleManager::new(BattleConfig::default());
    battle.setup_custom_arena(arena);
    battle.load_code("SCAN R0, R1\nHALT", "HALT").unwrap();
    battle.run_until_ready(1);
    battle.run_until_ready(2);
    battle.resolve_turn().unwrap();

    let state = battle.state();
    assert_eq!(state.width, 6);
    assert_eq!(state.height, 3);
    assert_eq!(state.walls.len(), 2);

    // P1 at (1,1) faces east; the wall at (3,1) is two cells away
    let p1 = state.tank(1).unwrap();
    assert_eq!(p1.registers[&tankasm::isa::Register::R0], 2);
    assert_eq!(p1.registers[&tankasm::isa::Register::R1], 1);
}

#[test]
fn test_config_file_sets_turn_limit() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(file, "# short battles").unwrap();
    writeln!(file, "max_turns = 3").unwrap();
    writeln!(file, "max_hp = 1").unwrap();
    file.flush().unwrap();

    let config = BattleConfig::load(file.path()).unwrap();
    assert_eq!(config.max_turns, 3);
    assert_eq!(config.max_hp, 1);
    assert_eq!(config.bullet_range, BattleConfig::default().bullet_range);

    let waiter = compile("l: WAIT\nJMP l").unwrap();
    let result = run_battle(&[load_bot("halt"), waiter], &Level::Open.arena(), &config).unwrap();
    assert_eq!(
        result.outcome,
        GameOutcome::Draw {
            reason: DrawReason::TurnLimit
        }
    );
    assert_eq!(result.turns_played, 3);
}

#[test]
fn test_config_file_rejects_unknown_keys() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(file, "max_turns = 3").unwrap();
    writeln!(file, "fog_of_war = true").unwrap();
    file.flush().unwrap();

    assert!(BattleConfig::load(file.path()).is_err());
}

#[test]
fn test_failed_load_changes_nothing() {
    let mut battle = BattleManager::new(BattleConfig::default());
    battle.load_code("MOVE\nHALT", "HALT").unwrap();
    battle.run_until_ready(1);
    battle.run_until_ready(2);
    battle.resolve_turn().unwrap();
    let before = battle.state();

    let err = battle.load_code("HALT", "JMP nowhere").unwrap_err();
    assert_eq!(err.tank, 2);
    assert_eq!(battle.state(), before);
}

#[test]
fn test_snapshot_is_independent() {
    let mut battle = BattleManager::new(BattleConfig::default());
    battle.load_code("HALT", "HALT").unwrap();

    let mut snapshot = battle.state();
    snapshot.tanks[0].hp = 0;
    snapshot.turn = 99;

    let fresh = battle.state();
    assert_eq!(fresh.turn, 0);
    assert_eq!(fresh.tank(1).unwrap().hp, 3);
}

#[test]
fn test_resolve_turn_rejects_misuse() {
    let mut battle = BattleManager::new(BattleConfig::default());
    assert_eq!(battle.resolve_turn(), Err(TurnError::NoProgram));

    battle.load_code("HALT", "HALT").unwrap();
    battle.run_until_ready(1);
    assert_eq!(battle.resolve_turn(), Err(TurnError::NotReady(2)));

    battle.run_until_ready(2);
    battle.resolve_turn().unwrap();
    assert_eq!(battle.resolve_turn(), Err(TurnError::GameOver));
}

#[test]
fn test_move_into_wall_reports_wall() {
    let mut battle = BattleManager::new(BattleConfig::default());
    battle.setup_arena(Level::CenterBlock);
    // P1 at (1,6) faces east; walk to (4,6) then bump the block at (5,6)
    battle
        .load_code("MOVE\nMOVE\nMOVE\nMOVE\nHALT", "HALT")
        .unwrap();

    for _ in 0..4 {
        battle.run_until_ready(1);
        battle.run_until_ready(2);
        battle.resolve_turn().unwrap();
    }

    let p1 = battle.tank(1).unwrap();
    assert_eq!(p1.position.x, 4);
    assert_eq!(p1.last_feedback, Feedback::Wall);
}

#[test]
fn test_tournament_ranks_sample_bots() {
    let entries: Vec<_> = BOTS
        .iter()
        .map(|name| Entry::new(*name, load_bot(name)))
        .collect();
    let config = BattleConfig {
        max_turns: 60,
        ..BattleConfig::default()
    };

    let result = run_tournament(&entries, &Level::ALL, &config).unwrap();
    assert_eq!(result.matches.len(), 4 * 3 * 3);
    assert_eq!(result.standings.len(), 4);

    let played: u32 = result.standings.iter().map(|s| s.played).sum();
    assert_eq!(played as usize, 2 * result.matches.len());
    for pair in result.standings.windows(2) {
        assert!(pair[0].points >= pair[1].points);
    }
}
