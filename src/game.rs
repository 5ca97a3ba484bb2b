//! Game layer for tankasm.
//!
//! Implements the battle rules on top of the VM:
//! - Grid geometry and ray queries
//! - Built-in levels and ASCII arenas
//! - Tanks, bullets and the event log
//! - The battle manager and its turn resolver
//! - Snapshots and invariant checks

mod battle;
mod bullet;
mod config;
mod event;
mod grid;
mod invariants;
mod level;
mod movement;
mod state;
mod tank;
mod turn;

pub use battle::BattleManager;
pub use bullet::Bullet;
pub use config::{BattleConfig, ConfigError};
pub use event::{Event, EventKind};
pub use grid::{Coord, Direction, Grid, ParseCoordError, RayHit, RayResult};
pub use invariants::{assert_invariants, check_invariants, InvariantViolation};
pub use level::{default_spawns, Arena, Level, Spawn, LEVEL_SIZE};
pub use movement::{resolve_moves, MoveOutcome};
pub use state::{BattleState, DrawReason, GameOutcome, TankState};
pub use tank::{ActionKind, Feedback, Tank, TankId};
