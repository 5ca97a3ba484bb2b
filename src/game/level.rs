//! Built-in levels and custom arenas.

use std::collections::HashSet;

use serde::Serialize;

use crate::error::ArenaError;
use crate::game::{Coord, Direction, Grid, TankId};

/// Width and height of the built-in levels.
pub const LEVEL_SIZE: i32 = 12;

/// Where and how a tank starts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Spawn {
    /// Starting cell.
    pub position: Coord,
    /// Starting facing.
    pub facing: Direction,
}

impl Spawn {
    /// Create a spawn point.
    #[must_use]
    pub const fn new(position: Coord, facing: Direction) -> Self {
        Self { position, facing }
    }
}

/// A grid plus one spawn per tank.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Arena {
    grid: Grid,
    spawns: [Spawn; 2],
}

impl Arena {
    /// Validate and build an arena.
    ///
    /// # Errors
    ///
    /// Returns an error if a spawn is off the grid, on a wall, or if both
    /// tanks share a cell.
    pub fn new(grid: Grid, spawns: [Spawn; 2]) -> Result<Self, ArenaError> {
        for (id, spawn) in (1..).zip(spawns.iter()) {
            if !grid.is_valid(spawn.position) {
                return Err(ArenaError::InvalidSpawn(id));
            }
        }
        if spawns[0].position == spawns[1].position {
            return Err(ArenaError::SharedSpawn);
        }
        Ok(Self { grid, spawns })
    }

    /// Parse an ASCII map: `#` wall, `.` floor, `1` and `2` spawns.
    ///
    /// P1 faces east and P2 faces west. Blank lines and trailing whitespace
    /// are ignored.
    ///
    /// # Errors
    ///
    /// Returns an error for an empty or ragged map, an unknown character, or
    /// a missing or repeated spawn marker.
    pub fn from_ascii(text: &str) -> Result<Self, ArenaError> {
        let rows: Vec<&str> = text
            .lines()
            .map(str::trim_end)
            .filter(|line| !line.is_empty())
            .collect();
        let Some(first) = rows.first() else {
            return Err(ArenaError::Empty);
        };
        let width = first.chars().count();

        let mut walls = HashSet::new();
        let mut spawns: [Option<Coord>; 2] = [None, None];

        for (row, line) in rows.iter().enumerate() {
            let found = line.chars().count();
            if found != width {
                return Err(ArenaError::RaggedRow {
                    row,
                    expected: width,
                    found,
                });
            }
            for (col, ch) in line.chars().enumerate() {
                let at = Coord::new(to_i32(col), to_i32(row));
                match ch {
                    '#' => {
                        walls.insert(at);
                    }
                    '.' => {}
                    '1' | '2' => {
                        let id: TankId = if ch == '1' { 1 } else { 2 };
                        let slot = &mut spawns[usize::from(id - 1)];
                        if slot.is_some() {
                            return Err(ArenaError::DuplicateSpawn(id));
                        }
                        *slot = Some(at);
                    }
                    _ => return Err(ArenaError::UnknownTile { row, col, ch }),
                }
            }
        }

        let p1 = spawns[0].ok_or(ArenaError::MissingSpawn(1))?;
        let p2 = spawns[1].ok_or(ArenaError::MissingSpawn(2))?;
        let grid = Grid::with_walls(to_i32(width), to_i32(rows.len()), walls)
            .ok_or(ArenaError::Empty)?;

        Self::new(
            grid,
            [
                Spawn::new(p1, Direction::East),
                Spawn::new(p2, Direction::West),
            ],
        )
    }

    /// The arena geometry.
    #[must_use]
    pub const fn grid(&self) -> &Grid {
        &self.grid
    }

    /// Spawn for tank `id` (1 or 2).
    #[must_use]
    pub fn spawn(&self, id: TankId) -> Option<Spawn> {
        let index = usize::from(id).checked_sub(1)?;
        self.spawns.get(index).copied()
    }

    /// Both spawns, P1 first.
    #[must_use]
    pub const fn spawns(&self) -> [Spawn; 2] {
        self.spawns
    }

    /// Render the arena as ASCII, the inverse of [`Arena::from_ascii`].
    #[must_use]
    pub fn to_ascii(&self) -> String {
        let mut out = String::new();
        for y in 0..self.grid.height() {
            for x in 0..self.grid.width() {
                let at = Coord::new(x, y);
                let ch = if at == self.spawns[0].position {
                    '1'
                } else if at == self.spawns[1].position {
                    '2'
                } else if self.grid.is_wall(at) {
                    '#'
                } else {
                    '.'
                };
                out.push(ch);
            }
            out.push('\n');
        }
        out
    }
}

fn to_i32(n: usize) -> i32 {
    i32::try_from(n).unwrap_or(i32::MAX)
}

/// The built-in levels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(into = "u8")]
pub enum Level {
    /// No walls.
    Open = 1,
    /// A 2×2 block in the middle.
    CenterBlock = 2,
    /// Scattered single-cell walls.
    Scattered = 3,
}

impl Level {
    /// Every level in order.
    pub const ALL: [Level; 3] = [Level::Open, Level::CenterBlock, Level::Scattered];

    /// Level number (1-based).
    #[must_use]
    pub const fn number(self) -> u8 {
        self as u8
    }

    /// Wall cells for this level.
    #[must_use]
    pub fn walls(self) -> Vec<Coord> {
        match self {
            Level::Open => Vec::new(),
            Level::CenterBlock => (5..=6)
                .flat_map(|y| (5..=6).map(move |x| Coord::new(x, y)))
                .collect(),
            Level::Scattered => [
                (3, 3),
                (8, 3),
                (3, 8),
                (8, 8),
                (5, 1),
                (6, 10),
                (1, 9),
                (10, 2),
                (4, 6),
                (7, 5),
            ]
            .into_iter()
            .map(|(x, y)| Coord::new(x, y))
            .collect(),
        }
    }

    /// Build this level's arena.
    #[must_use]
    pub fn arena(self) -> Arena {
        let mut grid = Grid::square(LEVEL_SIZE);
        for wall in self.walls() {
            grid.add_wall(wall);
        }
        Arena {
            grid,
            spawns: default_spawns(),
        }
    }
}

/// P1 on the west side facing east, P2 on the east side facing west.
#[must_use]
pub const fn default_spawns() -> [Spawn; 2] {
    [
        Spawn::new(Coord::new(1, 6), Direction::East),
        Spawn::new(Coord::new(LEVEL_SIZE - 2, 6), Direction::West),
    ]
}

impl TryFrom<u8> for Level {
    type Error = ArenaError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(Level::Open),
            2 => Ok(Level::CenterBlock),
            3 => Ok(Level::Scattered),
            n => Err(ArenaError::UnknownLevel(n)),
        }
    }
}

impl From<Level> for u8 {
    fn from(level: Level) -> Self {
        level.number()
    }
}

impl std::fmt::Display for Level {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.number())
    }
}
