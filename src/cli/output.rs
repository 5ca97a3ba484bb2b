//! Output formatting utilities for CLI.

use serde::Serialize;
use tankasm::game::BattleState;
use tankasm::tournament::{BattleResult, TournamentResult};

/// JSON-serializable battle result.
#[derive(Debug, Serialize)]
pub(super) struct JsonBattleResult<'a> {
    /// Program names, P1 first.
    pub(super) players: [&'a str; 2],
    /// Arena description (level number or map file).
    pub(super) arena: &'a str,
    /// Final result.
    pub(super) result: &'a BattleResult,
    /// Final snapshot.
    pub(super) state: &'a BattleState,
    /// Snapshot after every turn, when tracing.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub(super) trace: Vec<BattleState>,
}

/// Format a battle result as human-readable text.
pub(super) fn format_text(result: &BattleResult, names: &[String; 2], arena: &str) -> String {
    let mut output = String::new();

    output.push_str(&format!("Battle Result ({arena})\n"));
    match result.outcome.winner() {
        Some(winner) => {
            let name = names.get(usize::from(winner) - 1).map_or("unknown", String::as_str);
            output.push_str(&format!("  Winner: P{winner} ({name})\n"));
        }
        None => output.push_str(&format!("  Result: {}\n", result.outcome)),
    }
    output.push_str(&format!("  Turns: {}\n\n", result.turns_played));

    for (stats, name) in result.tanks.iter().zip(names) {
        output.push_str(&format!(
            "  P{} ({}): hp {}, {} ops",
            stats.id, name, stats.final_hp, stats.total_ops
        ));
        if let Some(reason) = &stats.halted {
            output.push_str(&format!(" [{reason}]"));
        }
        output.push('\n');
    }

    output
}

/// Format one turn for `--trace`: the board plus a line per tank.
pub(super) fn format_turn(state: &BattleState) -> String {
    let mut output = String::new();

    output.push_str(&format!("--- turn {} ---\n", state.turn));
    output.push_str(&state.render());
    for tank in &state.tanks {
        output.push_str(&format!(
            "P{} at {} facing {:?}, hp {}: {} -> {}\n",
            tank.id, tank.position, tank.facing, tank.hp, tank.last_action, tank.last_feedback
        ));
    }
    for bullet in &state.bullets {
        output.push_str(&format!(
            "bullet {} (P{}) at {}, travelled {}\n",
            bullet.id, bullet.owner, bullet.position, bullet.distance
        ));
    }

    output
}

/// Format tournament standings as human-readable text.
pub(super) fn format_tournament_text(result: &TournamentResult) -> String {
    let mut output = String::new();

    output.push_str(&format!("Tournament Results ({} battles)\n", result.matches.len()));
    output.push_str("========================================\n\n");
    output.push_str(&format!(
        "  {:<4}{:<20}{:>6}{:>6}{:>6}{:>6}{:>8}\n",
        "#", "program", "P", "W", "D", "L", "pts"
    ));
    for (rank, s) in result.standings.iter().enumerate() {
        output.push_str(&format!(
            "  {:<4}{:<20}{:>6}{:>6}{:>6}{:>6}{:>8}\n",
            rank + 1,
            s.name,
            s.played,
            s.wins,
            s.draws,
            s.losses,
            s.points
        ));
    }

    let total_turns: u64 = result
        .matches
        .iter()
        .map(|m| u64::from(m.result.turns_played))
        .sum();
    if let Some(avg) = total_turns.checked_div(result.matches.len() as u64) {
        output.push_str(&format!("\nAverage Battle Length: {avg} turns\n"));
    }

    output
}

/// Format tournament standings as CSV.
pub(super) fn format_tournament_csv(result: &TournamentResult) -> String {
    let mut output = String::new();

    // Header
    output.push_str("rank,program,played,wins,draws,losses,points\n");

    // Data rows
    for (rank, s) in result.standings.iter().enumerate() {
        output.push_str(&format!(
            "{},{},{},{},{},{},{}\n",
            rank + 1,
            s.name,
            s.played,
            s.wins,
            s.draws,
            s.losses,
            s.points
        ));
    }

    output
}

#[cfg(test)]
mod tests {
    use super::*;
    use tankasm::game::Level;
    use tankasm::tournament::{Entry, run_tournament};
    use tankasm::{compile, BattleConfig};

    fn tournament() -> TournamentResult {
        let entries = vec![
            Entry::new("halter", compile("HALT").unwrap()),
            Entry::new("waiter", compile("l: WAIT\nJMP l").unwrap()),
        ];
        let config = BattleConfig {
            max_turns: 5,
            ..BattleConfig::default()
        };
        run_tournament(&entries, &[Level::Open], &config).unwrap()
    }

    #[test]
    fn test_csv_has_row_per_entry() {
        let csv = format_tournament_csv(&tournament());
        let lines: Vec<_> = csv.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[0].starts_with("rank,program"));
        assert!(lines[1].ends_with(",2"));
    }

    #[test]
    fn test_text_mentions_battles() {
        let text = format_tournament_text(&tournament());
        assert!(text.contains("(2 battles)"));
        assert!(text.contains("halter"));
        assert!(text.contains("Average Battle Length: 5 turns"));
    }
}
