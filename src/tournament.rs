//! Headless battle runner and round-robin tournaments.
//!
//! Provides a pure function interface: `(programs, arena, config) -> BattleResult`
//!
//! Battles share nothing, so a tournament plays them in parallel with rayon
//! and merges per-thread standings at the end.

use rayon::prelude::*;
use serde::Serialize;

use crate::error::TurnError;
use crate::game::{Arena, BattleConfig, BattleManager, GameOutcome, Level, TankId};
use crate::isa::Program;

/// Points for a win.
pub const WIN_POINTS: u32 = 3;
/// Points for a draw.
pub const DRAW_POINTS: u32 = 1;

/// Statistics for a single tank.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TankStats {
    /// Tank identifier.
    pub id: TankId,
    /// Hit points left at the end.
    pub final_hp: i32,
    /// Register ops executed over the whole battle.
    pub total_ops: u64,
    /// Why the program stopped, if it did.
    pub halted: Option<String>,
}

/// Final result of a battle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BattleResult {
    /// How the battle ended.
    pub outcome: GameOutcome,
    /// Turns resolved.
    pub turns_played: u32,
    /// P1 then P2.
    pub tanks: [TankStats; 2],
}

impl BattleResult {
    fn from_battle(battle: &BattleManager, outcome: GameOutcome) -> Self {
        let state = battle.state();
        let stats = |id: TankId| {
            let tank = state.tank(id);
            TankStats {
                id,
                final_hp: tank.map_or(0, |t| t.hp),
                total_ops: tank.map_or(0, |t| t.total_ops),
                halted: tank.and_then(|t| t.halted.clone()),
            }
        };
        Self {
            outcome,
            turns_played: battle.turn(),
            tanks: [stats(1), stats(2)],
        }
    }
}

/// Play a battle to completion.
///
/// Each turn steps P1 until it is turn-ready, then P2, then resolves.
///
/// # Determinism
///
/// Given the same programs, arena and config, this function always produces
/// the same `BattleResult`.
///
/// # Errors
///
/// Returns an error only if the engine refuses to resolve a turn, which
/// indicates a bug.
pub fn run_battle(
    programs: &[Program; 2],
    arena: &Arena,
    config: &BattleConfig,
) -> Result<BattleResult, TurnError> {
    run_battle_observed(programs, arena, config, |_| {})
}

/// Like [`run_battle`], calling `observe` after every resolved turn.
///
/// # Errors
///
/// Same as [`run_battle`].
pub fn run_battle_observed(
    programs: &[Program; 2],
    arena: &Arena,
    config: &BattleConfig,
    mut observe: impl FnMut(&BattleManager),
) -> Result<BattleResult, TurnError> {
    let mut battle = BattleManager::new(*config);
    battle.setup_custom_arena(arena.clone());
    battle.install_programs(programs.clone());

    let outcome = loop {
        if let Some(outcome) = battle.outcome() {
            break outcome;
        }
        battle.run_until_ready(1);
        battle.run_until_ready(2);
        battle.resolve_turn()?;
        observe(&battle);
    };

    Ok(BattleResult::from_battle(&battle, outcome))
}

/// A named program entered into a tournament.
#[derive(Debug, Clone)]
pub struct Entry {
    /// Display name.
    pub name: String,
    /// Compiled program.
    pub program: Program,
}

impl Entry {
    /// Create a new entry.
    #[must_use]
    pub fn new(name: impl Into<String>, program: Program) -> Self {
        Self {
            name: name.into(),
            program,
        }
    }
}

/// One entry's tournament record.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Standing {
    /// Entry name.
    pub name: String,
    /// Battles played.
    pub played: u32,
    /// Battles won.
    pub wins: u32,
    /// Battles lost.
    pub losses: u32,
    /// Battles drawn.
    pub draws: u32,
    /// `wins * 3 + draws`.
    pub points: u32,
}

/// One battle played in a tournament.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MatchRecord {
    /// Index of the entry playing P1.
    pub first: usize,
    /// Index of the entry playing P2.
    pub second: usize,
    /// Level played on.
    pub level: Level,
    /// The result.
    pub result: BattleResult,
}

/// Aggregated tournament results.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TournamentResult {
    /// Standings, best first.
    pub standings: Vec<Standing>,
    /// Every battle, ordered by pairing then level.
    pub matches: Vec<MatchRecord>,
}

/// Error type for tournament operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TournamentError {
    /// Fewer than two entries.
    TooFewEntries(usize),
    /// No levels to play on.
    NoLevels,
    /// A battle could not be driven to completion.
    Battle(TurnError),
}

impl std::fmt::Display for TournamentError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::TooFewEntries(n) => write!(f, "Too few entries: {n} (minimum 2)"),
            Self::NoLevels => write!(f, "No levels selected"),
            Self::Battle(e) => write!(f, "Battle failed: {e}"),
        }
    }
}

impl std::error::Error for TournamentError {}

impl From<TurnError> for TournamentError {
    fn from(e: TurnError) -> Self {
        Self::Battle(e)
    }
}

/// Per-thread accumulator, merged at the end.
#[derive(Debug, Clone)]
struct TournamentStats {
    standings: Vec<Standing>,
    matches: Vec<MatchRecord>,
    error: Option<TurnError>,
}

impl TournamentStats {
    fn new(entries: &[Entry]) -> Self {
        Self {
            standings: entries
                .iter()
                .map(|e| Standing {
                    name: e.name.clone(),
                    ..Standing::default()
                })
                .collect(),
            matches: Vec::new(),
            error: None,
        }
    }

    fn add_result(&mut self, record: MatchRecord) {
        let (first, second) = (record.first, record.second);
        self.standings[first].played += 1;
        self.standings[second].played += 1;
        match record.result.outcome.winner() {
            Some(1) => {
                self.standings[first].wins += 1;
                self.standings[second].losses += 1;
            }
            Some(_) => {
                self.standings[second].wins += 1;
                self.standings[first].losses += 1;
            }
            None => {
                self.standings[first].draws += 1;
                self.standings[second].draws += 1;
            }
        }
        self.matches.push(record);
    }

    fn merge(&mut self, other: Self) {
        for (mine, theirs) in self.standings.iter_mut().zip(other.standings) {
            mine.played += theirs.played;
            mine.wins += theirs.wins;
            mine.losses += theirs.losses;
            mine.draws += theirs.draws;
        }
        self.matches.extend(other.matches);
        if self.error.is_none() {
            self.error = other.error;
        }
    }

    fn finish(mut self) -> Result<TournamentResult, TournamentError> {
        if let Some(e) = self.error {
            return Err(e.into());
        }
        for standing in &mut self.standings {
            standing.points = standing.wins * WIN_POINTS + standing.draws * DRAW_POINTS;
        }
        self.standings.sort_by(|a, b| {
            b.points
                .cmp(&a.points)
                .then(b.wins.cmp(&a.wins))
                .then(a.name.cmp(&b.name))
        });
        self.matches
            .sort_by_key(|m| (m.first, m.second, m.level));
        Ok(TournamentResult {
            standings: self.standings,
            matches: self.matches,
        })
    }
}

/// Play every ordered pair of entries on every level.
///
/// # Errors
///
/// Returns an error for fewer than two entries, no levels, or a battle the
/// engine could not complete.
pub fn run_tournament(
    entries: &[Entry],
    levels: &[Level],
    config: &BattleConfig,
) -> Result<TournamentResult, TournamentError> {
    run_tournament_with_progress(entries, levels, config, || {})
}

/// Like [`run_tournament`], calling `on_battle_done` from worker threads as
/// each battle finishes.
///
/// # Errors
///
/// Same as [`run_tournament`].
pub fn run_tournament_with_progress(
    entries: &[Entry],
    levels: &[Level],
    config: &BattleConfig,
    on_battle_done: impl Fn() + Sync,
) -> Result<TournamentResult, TournamentError> {
    if entries.len() < 2 {
        return Err(TournamentError::TooFewEntries(entries.len()));
    }
    if levels.is_empty() {
        return Err(TournamentError::NoLevels);
    }

    let jobs = schedule(entries.len(), levels);
    log::info!(
        "tournament: {} entries, {} levels, {} battles",
        entries.len(),
        levels.len(),
        jobs.len()
    );

    // Lock-free fold/reduce: each thread accumulates its own stats.
    jobs.into_par_iter()
        .fold(
            || TournamentStats::new(entries),
            |mut local, (first, second, level)| {
                let programs = [
                    entries[first].program.clone(),
                    entries[second].program.clone(),
                ];
                match run_battle(&programs, &level.arena(), config) {
                    Ok(result) => local.add_result(MatchRecord {
                        first,
                        second,
                        level,
                        result,
                    }),
                    Err(e) => local.error = local.error.or(Some(e)),
                }
                on_battle_done();
                local
            },
        )
        .reduce(
            || TournamentStats::new(entries),
            |mut a, b| {
                a.merge(b);
                a
            },
        )
        .finish()
}

/// Every `(first, second, level)` triple with `first != second`.
#[must_use]
pub fn schedule(entries: usize, levels: &[Level]) -> Vec<(usize, usize, Level)> {
    let mut jobs = Vec::with_capacity(entries * entries.saturating_sub(1) * levels.len());
    for first in 0..entries {
        for second in 0..entries {
            if first == second {
                continue;
            }
            for &level in levels {
                jobs.push((first, second, level));
            }
        }
    }
    jobs
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::DrawReason;
    use crate::isa::compile;

    fn entry(name: &str, source: &str) -> Entry {
        Entry::new(name, compile(source).unwrap())
    }

    /// Long enough range for a bullet to cross the open level.
    fn long_range() -> BattleConfig {
        BattleConfig {
            bullet_range: 12,
            ..BattleConfig::default()
        }
    }

    #[test]
    fn test_run_battle_halt_vs_halt() {
        let programs = [compile("HALT").unwrap(), compile("HALT").unwrap()];
        let result = run_battle(&programs, &Level::Open.arena(), &BattleConfig::default()).unwrap();
        assert_eq!(
            result.outcome,
            GameOutcome::Draw {
                reason: DrawReason::Stalemate
            }
        );
        assert_eq!(result.turns_played, 1);
        assert_eq!(result.tanks[0].halted.as_deref(), Some("halted"));
    }

    #[test]
    fn test_run_battle_shooter_wins() {
        let shooter = compile("loop: FIRE\nJMP loop").unwrap();
        let idle = compile("loop: WAIT\nJMP loop").unwrap();
        let result = run_battle(&[shooter, idle], &Level::Open.arena(), &long_range()).unwrap();
        assert_eq!(result.outcome, GameOutcome::Winner { tank: 1 });
        assert_eq!(result.tanks[1].final_hp, 0);
        assert_eq!(result.tanks[0].final_hp, 3);
    }

    #[test]
    fn test_run_battle_observed_sees_every_turn() {
        let programs = [
            compile("l: WAIT\nJMP l").unwrap(),
            compile("l: WAIT\nJMP l").unwrap(),
        ];
        let config = BattleConfig {
            max_turns: 5,
            ..BattleConfig::default()
        };
        let mut seen = Vec::new();
        let result = run_battle_observed(&programs, &Level::Open.arena(), &config, |b| {
            seen.push(b.turn());
        })
        .unwrap();
        assert_eq!(seen, vec![1, 2, 3, 4, 5]);
        assert_eq!(result.turns_played, 5);
    }

    #[test]
    fn test_schedule() {
        let jobs = schedule(3, &[Level::Open, Level::Scattered]);
        assert_eq!(jobs.len(), 12);
        assert!(jobs.iter().all(|(a, b, _)| a != b));
    }

    #[test]
    fn test_tournament_standings() {
        let entries = vec![
            entry("shooter", "loop: FIRE\nJMP loop"),
            entry("idler", "loop: WAIT\nJMP loop"),
        ];
        let result = run_tournament(&entries, &[Level::Open], &long_range()).unwrap();

        assert_eq!(result.matches.len(), 2);
        assert_eq!(result.standings[0].name, "shooter");
        assert_eq!(result.standings[0].wins, 2);
        assert_eq!(result.standings[0].points, 6);
        assert_eq!(result.standings[1].losses, 2);
        assert_eq!(result.matches[0].first, 0);
    }

    #[test]
    fn test_tournament_is_deterministic() {
        let entries = vec![
            entry("a", "loop: SCAN R0, R1\nCMP R1, 2\nJE shoot\nROTATE RIGHT\nJMP loop\nshoot: FIRE\nJMP loop"),
            entry("b", "loop: MOVE\nROTATE LEFT\nFIRE\nJMP loop"),
            entry("c", "HALT"),
        ];
        let first = run_tournament(&entries, &Level::ALL, &BattleConfig::default()).unwrap();
        let second = run_tournament(&entries, &Level::ALL, &BattleConfig::default()).unwrap();
        assert_eq!(first, second);
        assert_eq!(first.matches.len(), 18);
    }

    #[test]
    fn test_tournament_errors() {
        let one = vec![entry("solo", "HALT")];
        assert_eq!(
            run_tournament(&one, &Level::ALL, &BattleConfig::default()),
            Err(TournamentError::TooFewEntries(1))
        );
        let two = vec![entry("a", "HALT"), entry("b", "HALT")];
        assert_eq!(
            run_tournament(&two, &[], &BattleConfig::default()),
            Err(TournamentError::NoLevels)
        );
    }
}
