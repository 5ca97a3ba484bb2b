//! Tanks and the advisory feedback they receive each turn.

use std::fmt;

use serde::{Serialize, Serializer};

use crate::game::{Coord, Direction, Spawn};
use crate::isa::{Heading, Rotation};
use crate::vm::{Cpu, StepResult};

/// Tank identifier: 1 or 2.
pub type TankId = u8;

/// Advisory, non-fatal outcome of a tank's last action.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Feedback {
    /// The action took effect.
    #[default]
    Ok,
    /// `FIRE` while the tank's previous bullet is still live.
    Reloading,
    /// `FIRE` into a wall or the arena edge, or `MOVE` into the enemy.
    Blocked,
    /// `MOVE` into a wall or off the grid.
    Wall,
    /// Both tanks tried to enter the same cell or swap cells.
    Collision,
    /// The tank waited.
    Waiting(String),
    /// The tank's program has stopped.
    Halted(String),
    /// The tank has no hit points left.
    Destroyed,
}

impl fmt::Display for Feedback {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Feedback::Ok => f.write_str("ok"),
            Feedback::Reloading => f.write_str("reloading"),
            Feedback::Blocked => f.write_str("blocked"),
            Feedback::Wall => f.write_str("wall"),
            Feedback::Collision => f.write_str("collision"),
            Feedback::Waiting(reason) => write!(f, "waiting: {reason}"),
            Feedback::Halted(reason) => write!(f, "halted: {reason}"),
            Feedback::Destroyed => f.write_str("destroyed"),
        }
    }
}

impl Serialize for Feedback {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// The turn-ending action a tank last took.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ActionKind {
    /// Nothing yet, or the tank was already destroyed.
    #[default]
    Idle,
    /// `MOVE`.
    Move(Heading),
    /// `ROTATE`.
    Rotate(Rotation),
    /// `FIRE`.
    Fire,
    /// `SCAN`.
    Scan,
    /// `PING`.
    Ping,
    /// `WAIT`, including a forced wait from the op budget.
    Wait,
    /// The program has stopped.
    Halt,
}

impl ActionKind {
    /// Classify a turn-ending step result.
    #[must_use]
    pub fn from_step(result: &StepResult) -> Self {
        match result {
            StepResult::CpuOp | StepResult::Dead => ActionKind::Idle,
            StepResult::Move(heading) => ActionKind::Move(*heading),
            StepResult::Rotate(rotation) => ActionKind::Rotate(*rotation),
            StepResult::Fire => ActionKind::Fire,
            StepResult::Scan { .. } => ActionKind::Scan,
            StepResult::Ping { .. } => ActionKind::Ping,
            StepResult::Wait { .. } => ActionKind::Wait,
            StepResult::Halt(_) => ActionKind::Halt,
        }
    }
}

impl fmt::Display for ActionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ActionKind::Idle => f.write_str("idle"),
            ActionKind::Move(Heading::Forward) => f.write_str("move forward"),
            ActionKind::Move(Heading::Backward) => f.write_str("move backward"),
            ActionKind::Rotate(Rotation::Left) => f.write_str("rotate left"),
            ActionKind::Rotate(Rotation::Right) => f.write_str("rotate right"),
            ActionKind::Fire => f.write_str("fire"),
            ActionKind::Scan => f.write_str("scan"),
            ActionKind::Ping => f.write_str("ping"),
            ActionKind::Wait => f.write_str("wait"),
            ActionKind::Halt => f.write_str("halt"),
        }
    }
}

impl Serialize for ActionKind {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// A tank in the arena. Owns its CPU.
#[derive(Debug, Clone)]
pub struct Tank {
    /// 1 or 2.
    pub id: TankId,
    /// Current cell.
    pub position: Coord,
    /// Current facing.
    pub facing: Direction,
    /// Remaining hit points.
    pub hp: i32,
    /// Action resolved last turn.
    pub last_action: ActionKind,
    /// Feedback from last turn.
    pub last_feedback: Feedback,
    /// Register ops executed over the whole battle.
    pub total_ops: u64,
    pub(crate) cpu: Option<Cpu>,
}

impl Tank {
    /// Create a tank at its spawn with full health and no program.
    #[must_use]
    pub fn new(id: TankId, spawn: Spawn, max_hp: i32) -> Self {
        Self {
            id,
            position: spawn.position,
            facing: spawn.facing,
            hp: max_hp,
            last_action: ActionKind::Idle,
            last_feedback: Feedback::Ok,
            total_ops: 0,
            cpu: None,
        }
    }

    /// Check if the tank has hit points left.
    #[must_use]
    #[inline]
    pub const fn is_alive(&self) -> bool {
        self.hp > 0
    }

    /// The tank's CPU, if a program is installed.
    #[must_use]
    pub const fn cpu(&self) -> Option<&Cpu> {
        self.cpu.as_ref()
    }

    /// Take one point of damage. Returns `true` if this destroyed the tank.
    pub fn damage(&mut self) -> bool {
        let was_alive = self.is_alive();
        self.hp = (self.hp - 1).max(0);
        if was_alive && !self.is_alive() {
            self.last_feedback = Feedback::Destroyed;
            return true;
        }
        false
    }

    /// Mirror position, facing, health and ammo into the CPU's sensor registers.
    pub(crate) fn sync_cpu(&mut self, ammo_available: bool) {
        let (x, y, facing, hp) = (self.position.x, self.position.y, self.facing.index(), self.hp);
        if let Some(cpu) = self.cpu.as_mut() {
            cpu.update_tank_state(x, y, facing, hp, ammo_available);
        }
    }
}
