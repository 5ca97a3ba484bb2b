//! Arena geometry: coordinates, facings, walls and ray queries.

use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::game::TankId;
use crate::isa::Rotation;

/// A cell coordinate. May lie outside the grid (e.g. a rejected move target).
///
/// Serializes as the string `"x,y"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub struct Coord {
    /// Column.
    pub x: i32,
    /// Row (0 at the top).
    pub y: i32,
}

impl Coord {
    /// Create a new coordinate.
    #[must_use]
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// The coordinate `(dx, dy)` away from this one.
    #[must_use]
    pub const fn offset(self, dx: i32, dy: i32) -> Self {
        Self::new(self.x + dx, self.y + dy)
    }

    /// The neighbouring cell in `dir`.
    #[must_use]
    pub const fn step(self, dir: Direction) -> Self {
        let (dx, dy) = dir.delta();
        self.offset(dx, dy)
    }
}

impl fmt::Display for Coord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},{}", self.x, self.y)
    }
}

/// Error parsing an `"x,y"` coordinate string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseCoordError(String);

impl fmt::Display for ParseCoordError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid coordinate '{}': expected \"x,y\"", self.0)
    }
}

impl std::error::Error for ParseCoordError {}

impl FromStr for Coord {
    type Err = ParseCoordError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let err = || ParseCoordError(s.to_string());
        let (x, y) = s.split_once(',').ok_or_else(err)?;
        let x = x.trim().parse().map_err(|_| err())?;
        let y = y.trim().parse().map_err(|_| err())?;
        Ok(Self::new(x, y))
    }
}

impl From<Coord> for String {
    fn from(coord: Coord) -> Self {
        coord.to_string()
    }
}

impl TryFrom<String> for Coord {
    type Error = ParseCoordError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

/// Compass facing. The discriminant is the value programs see in `DIR`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[repr(u8)]
pub enum Direction {
    /// Towards y = 0.
    North = 0,
    /// Towards increasing x.
    East = 1,
    /// Towards increasing y.
    South = 2,
    /// Towards x = 0.
    West = 3,
}

impl Direction {
    /// Facing from its numeric code, wrapping modulo 4.
    #[must_use]
    pub const fn from_index(index: u8) -> Self {
        match index % 4 {
            0 => Direction::North,
            1 => Direction::East,
            2 => Direction::South,
            _ => Direction::West,
        }
    }

    /// Numeric code (0..=3).
    #[must_use]
    pub const fn index(self) -> u8 {
        self as u8
    }

    /// Unit step `(dx, dy)`.
    #[must_use]
    pub const fn delta(self) -> (i32, i32) {
        match self {
            Direction::North => (0, -1),
            Direction::East => (1, 0),
            Direction::South => (0, 1),
            Direction::West => (-1, 0),
        }
    }

    /// Facing after a quarter turn.
    #[must_use]
    pub const fn rotate(self, rotation: Rotation) -> Self {
        match rotation {
            Rotation::Right => Self::from_index(self.index() + 1),
            Rotation::Left => Self::from_index(self.index() + 3),
        }
    }

    /// The opposite facing.
    #[must_use]
    pub const fn opposite(self) -> Self {
        Self::from_index(self.index() + 2)
    }
}

/// What a ray ran into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RayHit {
    /// The ray left the arena without hitting anything.
    Nothing,
    /// A wall cell.
    Wall,
    /// A tank.
    Tank(TankId),
}

impl RayHit {
    /// Type code written by `SCAN`: 0 nothing, 1 wall, 2 tank.
    #[must_use]
    pub const fn code(self) -> i32 {
        match self {
            RayHit::Nothing => 0,
            RayHit::Wall => 1,
            RayHit::Tank(_) => 2,
        }
    }
}

/// Result of a ray query.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RayResult {
    /// Steps from the origin to the cell that stopped the ray.
    pub distance: i32,
    /// What stopped it.
    pub hit: RayHit,
}

/// Static arena geometry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Grid {
    width: i32,
    height: i32,
    walls: HashSet<Coord>,
}

impl Grid {
    /// Create an empty grid.
    ///
    /// Returns `None` if either dimension is not positive.
    #[must_use]
    pub fn new(width: i32, height: i32) -> Option<Self> {
        if width <= 0 || height <= 0 {
            return None;
        }
        Some(Self {
            width,
            height,
            walls: HashSet::new(),
        })
    }

    /// Create an empty square grid. `size` is clamped to at least one cell.
    #[must_use]
    pub fn square(size: i32) -> Self {
        let size = size.max(1);
        Self {
            width: size,
            height: size,
            walls: HashSet::new(),
        }
    }

    /// Create a grid and mark `walls`, dropping any that fall outside it.
    ///
    /// Returns `None` if either dimension is not positive.
    #[must_use]
    pub fn with_walls(width: i32, height: i32, walls: impl IntoIterator<Item = Coord>) -> Option<Self> {
        let mut grid = Self::new(width, height)?;
        for wall in walls {
            grid.add_wall(wall);
        }
        Some(grid)
    }

    /// Width in cells.
    #[must_use]
    pub const fn width(&self) -> i32 {
        self.width
    }

    /// Height in cells.
    #[must_use]
    pub const fn height(&self) -> i32 {
        self.height
    }

    /// Mark a cell as wall. Returns `false` if it is out of bounds.
    pub fn add_wall(&mut self, coord: Coord) -> bool {
        if !self.in_bounds(coord) {
            return false;
        }
        self.walls.insert(coord);
        true
    }

    /// Check if a coordinate lies inside the grid.
    #[must_use]
    #[inline]
    pub const fn in_bounds(&self, coord: Coord) -> bool {
        coord.x >= 0 && coord.x < self.width && coord.y >= 0 && coord.y < self.height
    }

    /// Check if a coordinate is a wall.
    #[must_use]
    #[inline]
    pub fn is_wall(&self, coord: Coord) -> bool {
        self.walls.contains(&coord)
    }

    /// In bounds and not a wall.
    #[must_use]
    #[inline]
    pub fn is_valid(&self, coord: Coord) -> bool {
        self.in_bounds(coord) && !self.is_wall(coord)
    }

    /// Pull a coordinate back inside the grid.
    #[must_use]
    pub fn clamp(&self, coord: Coord) -> Coord {
        Coord::new(
            coord.x.clamp(0, self.width - 1),
            coord.y.clamp(0, self.height - 1),
        )
    }

    /// Wall cells in row-major order.
    #[must_use]
    pub fn walls(&self) -> Vec<Coord> {
        let mut walls: Vec<Coord> = self.walls.iter().copied().collect();
        walls.sort_by_key(|c| (c.y, c.x));
        walls
    }

    /// Number of wall cells.
    #[must_use]
    pub fn wall_count(&self) -> usize {
        self.walls.len()
    }

    /// Walk from `origin` (exclusive) along `(dx, dy)` until the ray leaves
    /// the grid, enters a wall, or enters a cell held by an occupant other
    /// than `self_id`.
    ///
    /// A zero direction returns distance 0 and [`RayHit::Nothing`].
    #[must_use]
    pub fn raycast(
        &self,
        origin: Coord,
        (dx, dy): (i32, i32),
        self_id: TankId,
        occupants: &[(TankId, Coord)],
    ) -> RayResult {
        if dx == 0 && dy == 0 {
            return RayResult {
                distance: 0,
                hit: RayHit::Nothing,
            };
        }

        let mut cursor = origin;
        let mut distance = 0;
        loop {
            cursor = cursor.offset(dx, dy);
            distance += 1;

            if !self.in_bounds(cursor) {
                return RayResult {
                    distance,
                    hit: RayHit::Nothing,
                };
            }
            if self.is_wall(cursor) {
                return RayResult {
                    distance,
                    hit: RayHit::Wall,
                };
            }
            if let Some(&(id, _)) = occupants
                .iter()
                .find(|(id, at)| *id != self_id && *at == cursor)
            {
                return RayResult {
                    distance,
                    hit: RayHit::Tank(id),
                };
            }
        }
    }
}
