//! Simultaneous movement conflict resolution.
//!
//! Both tanks' move intents are filtered through a fixed sequence of rules.
//! Once a rule rejects an intent it never comes back, so later rules only see
//! the survivors of earlier ones.

use crate::game::{Coord, Feedback, Grid};

/// What happened to one move intent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MoveOutcome {
    /// The tank moved to this cell.
    Moved(Coord),
    /// The tank stayed put with this feedback.
    Rejected(Feedback),
}

/// Resolve both tanks' intents against the grid and each other.
///
/// `positions` are the tanks' current cells, P1 first. An intent of `None`
/// means that tank is not moving, and its outcome is `None` too.
#[must_use]
pub fn resolve_moves(
    grid: &Grid,
    positions: [Coord; 2],
    intents: [Option<Coord>; 2],
) -> [Option<MoveOutcome>; 2] {
    let mut live = intents;
    let mut outcomes: [Option<MoveOutcome>; 2] = [None, None];

    // Walls and the arena edge.
    for (slot, outcome) in live.iter_mut().zip(outcomes.iter_mut()) {
        if slot.is_some_and(|target| !grid.is_valid(target)) {
            *slot = None;
            *outcome = Some(MoveOutcome::Rejected(Feedback::Wall));
        }
    }

    // Swapping cells, then converging on one cell.
    if let [Some(a), Some(b)] = live {
        let swap = a == positions[1] && b == positions[0];
        if swap || a == b {
            live = [None, None];
            outcomes = [
                Some(MoveOutcome::Rejected(Feedback::Collision)),
                Some(MoveOutcome::Rejected(Feedback::Collision)),
            ];
        }
    }

    // Driving into the other tank where it stands.
    for i in 0..2 {
        if live[i].is_some_and(|target| target == positions[1 - i]) {
            live[i] = None;
            outcomes[i] = Some(MoveOutcome::Rejected(Feedback::Blocked));
        }
    }

    for (slot, outcome) in live.iter().zip(outcomes.iter_mut()) {
        if let Some(target) = slot {
            *outcome = Some(MoveOutcome::Moved(grid.clamp(*target)));
        }
    }

    outcomes
}

#[cfg(test)]
mod tests {
    use super::*;

    fn grid() -> Grid {
        let mut grid = Grid::new(6, 3).unwrap();
        grid.add_wall(Coord::new(3, 0));
        grid
    }

    const P1: Coord = Coord::new(1, 1);
    const P2: Coord = Coord::new(4, 1);

    #[test]
    fn test_free_moves() {
        let out = resolve_moves(&grid(), [P1, P2], [Some(Coord::new(2, 1)), None]);
        assert_eq!(out, [Some(MoveOutcome::Moved(Coord::new(2, 1))), None]);
    }

    #[test]
    fn test_wall_and_edge() {
        let out = resolve_moves(
            &grid(),
            [Coord::new(3, 1), Coord::new(0, 2)],
            [Some(Coord::new(3, 0)), Some(Coord::new(-1, 2))],
        );
        assert_eq!(
            out,
            [
                Some(MoveOutcome::Rejected(Feedback::Wall)),
                Some(MoveOutcome::Rejected(Feedback::Wall)),
            ]
        );
    }

    #[test]
    fn test_same_target_collides() {
        let a = Coord::new(2, 1);
        let b = Coord::new(3, 1);
        let target = Coord::new(2, 2);
        let out = resolve_moves(&grid(), [a, b], [Some(target), Some(target)]);
        assert_eq!(out[0], Some(MoveOutcome::Rejected(Feedback::Collision)));
        assert_eq!(out[1], Some(MoveOutcome::Rejected(Feedback::Collision)));
    }

    #[test]
    fn test_swap_collides() {
        let a = Coord::new(2, 1);
        let b = Coord::new(3, 1);
        let out = resolve_moves(&grid(), [a, b], [Some(b), Some(a)]);
        assert_eq!(out[0], Some(MoveOutcome::Rejected(Feedback::Collision)));
        assert_eq!(out[1], Some(MoveOutcome::Rejected(Feedback::Collision)));
    }

    #[test]
    fn test_moving_into_stationary_tank_is_blocked() {
        let a = Coord::new(2, 1);
        let b = Coord::new(3, 1);
        let out = resolve_moves(&grid(), [a, b], [Some(b), None]);
        assert_eq!(out, [Some(MoveOutcome::Rejected(Feedback::Blocked)), None]);
    }

    #[test]
    fn test_following_a_moving_tank_is_blocked() {
        // P1 targets P2's current cell while P2 moves away: still blocked,
        // because the check uses unmoved positions.
        let a = Coord::new(1, 1);
        let b = Coord::new(2, 1);
        let out = resolve_moves(&grid(), [a, b], [Some(b), Some(Coord::new(2, 2))]);
        assert_eq!(out[0], Some(MoveOutcome::Rejected(Feedback::Blocked)));
        assert_eq!(out[1], Some(MoveOutcome::Moved(Coord::new(2, 2))));
    }

    #[test]
    fn test_rejected_intent_is_not_reinstated() {
        // P2 hits the wall, so P1's intent is not a collision with it.
        let a = Coord::new(2, 0);
        let b = Coord::new(4, 0);
        let out = resolve_moves(&grid(), [a, b], [Some(Coord::new(2, 1)), Some(Coord::new(3, 0))]);
        assert_eq!(out[0], Some(MoveOutcome::Moved(Coord::new(2, 1))));
        assert_eq!(out[1], Some(MoveOutcome::Rejected(Feedback::Wall)));
    }
}
