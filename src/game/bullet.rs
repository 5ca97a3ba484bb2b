//! Projectiles.

use serde::Serialize;

use crate::game::{Coord, Direction, TankId};

/// A live bullet.
///
/// `distance` counts cells travelled including the spawn cell, so a freshly
/// fired bullet starts at 1.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Bullet {
    /// Unique, monotonically increasing id.
    pub id: u32,
    /// Current cell.
    pub position: Coord,
    /// Step along x per cell.
    pub dx: i32,
    /// Step along y per cell.
    pub dy: i32,
    /// The tank that fired it.
    pub owner: TankId,
    /// Cells travelled.
    pub distance: i32,
}

impl Bullet {
    /// Spawn a bullet in `position` travelling along `facing`.
    #[must_use]
    pub const fn new(id: u32, position: Coord, facing: Direction, owner: TankId) -> Self {
        let (dx, dy) = facing.delta();
        Self {
            id,
            position,
            dx,
            dy,
            owner,
            distance: 1,
        }
    }

    /// The next cell along the bullet's path.
    #[must_use]
    pub const fn next_cell(&self) -> Coord {
        self.position.offset(self.dx, self.dy)
    }
}
