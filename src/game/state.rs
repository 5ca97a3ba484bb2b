//! Serializable battle snapshots.

use std::collections::BTreeMap;
use std::fmt;

use serde::Serialize;

use crate::game::{ActionKind, BattleConfig, Bullet, Coord, Direction, Event, Feedback, Tank, TankId};
use crate::isa::Register;

/// Why a battle ended without a winner.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DrawReason {
    /// Both tanks reached zero HP on the same turn.
    BothDestroyed,
    /// Both programs halted.
    Stalemate,
    /// The turn limit was reached.
    TurnLimit,
}

impl fmt::Display for DrawReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DrawReason::BothDestroyed => f.write_str("both destroyed"),
            DrawReason::Stalemate => f.write_str("stalemate"),
            DrawReason::TurnLimit => f.write_str("turn limit"),
        }
    }
}

/// How a finished battle ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(tag = "result", rename_all = "snake_case")]
pub enum GameOutcome {
    /// One tank survived.
    Winner {
        /// The surviving tank.
        tank: TankId,
    },
    /// Nobody won.
    Draw {
        /// Why.
        reason: DrawReason,
    },
}

impl GameOutcome {
    /// The winning tank, if any.
    #[must_use]
    pub const fn winner(self) -> Option<TankId> {
        match self {
            GameOutcome::Winner { tank } => Some(tank),
            GameOutcome::Draw { .. } => None,
        }
    }
}

impl fmt::Display for GameOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GameOutcome::Winner { tank } => write!(f, "P{tank} wins"),
            GameOutcome::Draw { reason } => write!(f, "draw ({reason})"),
        }
    }
}

/// Snapshot of one tank.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TankState {
    /// 1 or 2.
    pub id: TankId,
    /// Current cell.
    pub position: Coord,
    /// Current facing.
    pub facing: Direction,
    /// Remaining hit points.
    pub hp: i32,
    /// `hp > 0`.
    pub alive: bool,
    /// Register values, keyed by name. Empty when no program is loaded.
    pub registers: BTreeMap<Register, i32>,
    /// Program counter.
    pub pc: usize,
    /// Why the program stopped, if it has.
    pub halted: Option<String>,
    /// Action resolved last turn.
    pub last_action: ActionKind,
    /// Feedback from last turn.
    pub last_feedback: Feedback,
    /// Register ops executed over the whole battle.
    pub total_ops: u64,
}

impl TankState {
    pub(crate) fn capture(tank: &Tank) -> Self {
        let cpu = tank.cpu();
        Self {
            id: tank.id,
            position: tank.position,
            facing: tank.facing,
            hp: tank.hp,
            alive: tank.is_alive(),
            registers: cpu
                .map(|cpu| cpu.registers().iter().collect())
                .unwrap_or_default(),
            pc: cpu.map_or(0, crate::vm::Cpu::pc),
            halted: cpu.and_then(crate::vm::Cpu::halt_reason).map(|r| r.to_string()),
            last_action: tank.last_action,
            last_feedback: tank.last_feedback.clone(),
            total_ops: tank.total_ops,
        }
    }
}

/// Independent copy of everything a collaborator may observe.
///
/// Mutating a snapshot never affects the battle it came from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BattleState {
    /// Turns resolved so far.
    pub turn: u32,
    /// Rules in effect.
    pub config: BattleConfig,
    /// Grid width.
    pub width: i32,
    /// Grid height.
    pub height: i32,
    /// Wall cells, row-major.
    pub walls: Vec<Coord>,
    /// P1 then P2.
    pub tanks: Vec<TankState>,
    /// Live bullets in id order.
    pub bullets: Vec<Bullet>,
    /// Visualization events since the arena was set up.
    pub events: Vec<Event>,
    /// Recent human-readable log lines, oldest first.
    pub messages: Vec<String>,
    /// Set once the battle has ended.
    pub outcome: Option<GameOutcome>,
}

impl BattleState {
    /// Check if the battle has ended.
    #[must_use]
    pub const fn is_over(&self) -> bool {
        self.outcome.is_some()
    }

    /// Snapshot of tank `id`.
    #[must_use]
    pub fn tank(&self, id: TankId) -> Option<&TankState> {
        self.tanks.iter().find(|t| t.id == id)
    }

    /// Render the board as ASCII: `#` wall, `1`/`2` tanks (`x` if destroyed),
    /// `*` bullets.
    #[must_use]
    pub fn render(&self) -> String {
        let width = usize::try_from(self.width).unwrap_or(0);
        let height = usize::try_from(self.height).unwrap_or(0);
        let mut rows = vec![vec!['.'; width]; height];

        let mut put = |at: Coord, ch: char| {
            if let (Ok(x), Ok(y)) = (usize::try_from(at.x), usize::try_from(at.y)) {
                if let Some(cell) = rows.get_mut(y).and_then(|row| row.get_mut(x)) {
                    *cell = ch;
                }
            }
        };

        for wall in &self.walls {
            put(*wall, '#');
        }
        for bullet in &self.bullets {
            put(bullet.position, '*');
        }
        for tank in &self.tanks {
            let ch = if tank.alive {
                char::from(b'0' + tank.id)
            } else {
                'x'
            };
            put(tank.position, ch);
        }

        let mut out = String::with_capacity((width + 1) * height);
        for row in rows {
            out.extend(row);
            out.push('\n');
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_outcome_display_and_json() {
        let win = GameOutcome::Winner { tank: 2 };
        assert_eq!(win.to_string(), "P2 wins");
        assert_eq!(win.winner(), Some(2));

        let draw = GameOutcome::Draw {
            reason: DrawReason::Stalemate,
        };
        assert_eq!(draw.to_string(), "draw (stalemate)");
        let json = serde_json::to_value(draw).unwrap();
        assert_eq!(json["result"], "draw");
        assert_eq!(json["reason"], "stalemate");
    }
}
