//! Battle invariants - sanity checks that detect engine bugs.
//!
//! These should never trigger for a state produced by [`BattleManager`]. If
//! they do, the turn resolver has a bug.
//!
//! [`BattleManager`]: crate::game::BattleManager

use std::collections::HashSet;

use crate::game::{BattleState, Coord};

/// Invariant violation error.
#[derive(Debug, Clone)]
pub struct InvariantViolation {
    /// Description of the violated invariant.
    pub message: String,
}

impl std::fmt::Display for InvariantViolation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Invariant violation: {}", self.message)
    }
}

impl std::error::Error for InvariantViolation {}

fn in_bounds(state: &BattleState, at: Coord) -> bool {
    at.x >= 0 && at.x < state.width && at.y >= 0 && at.y < state.height
}

/// Check all battle invariants.
///
/// Returns a list of violations found, or empty if all invariants hold.
#[must_use]
pub fn check_invariants(state: &BattleState) -> Vec<InvariantViolation> {
    let mut violations = Vec::new();
    let mut push = |message: String| violations.push(InvariantViolation { message });

    let walls: HashSet<Coord> = state.walls.iter().copied().collect();

    for tank in &state.tanks {
        if !in_bounds(state, tank.position) {
            push(format!("P{} at {} is off the grid", tank.id, tank.position));
        }
        if walls.contains(&tank.position) {
            push(format!("P{} at {} is inside a wall", tank.id, tank.position));
        }
        if tank.hp < 0 || tank.hp > state.config.max_hp {
            push(format!(
                "P{} has hp {} outside [0, {}]",
                tank.id, tank.hp, state.config.max_hp
            ));
        }
        if tank.alive != (tank.hp > 0) {
            push(format!("P{} alive flag disagrees with hp {}", tank.id, tank.hp));
        }
    }

    if let [a, b] = state.tanks.as_slice() {
        if a.position == b.position {
            push(format!("both tanks share cell {}", a.position));
        }
    }

    let mut owners = HashSet::new();
    let mut ids = HashSet::new();
    for bullet in &state.bullets {
        if !owners.insert(bullet.owner) {
            push(format!("P{} has more than one live bullet", bullet.owner));
        }
        if !ids.insert(bullet.id) {
            push(format!("bullet id {} is not unique", bullet.id));
        }
        if bullet.distance < 1 || bullet.distance > state.config.bullet_range {
            push(format!(
                "bullet {} has travelled {} cells, range is {}",
                bullet.id, bullet.distance, state.config.bullet_range
            ));
        }
        if !in_bounds(state, bullet.position) || walls.contains(&bullet.position) {
            push(format!("bullet {} at {} is off the floor", bullet.id, bullet.position));
        }
    }

    if let Some(outcome) = state.outcome {
        if state.turn == 0 {
            push(format!("battle ended ({outcome}) before any turn was played"));
        }
    }
    if state.turn > state.config.max_turns {
        push(format!(
            "turn {} exceeds the limit of {}",
            state.turn, state.config.max_turns
        ));
    }

    violations
}

/// Assert all battle invariants hold, panicking if any are violated.
///
/// Only active in debug builds. No-op in release builds.
///
/// # Panics
///
/// Panics with detailed message if any invariant is violated.
#[cfg(debug_assertions)]
pub fn assert_invariants(state: &BattleState) {
    let violations = check_invariants(state);
    if !violations.is_empty() {
        let messages: Vec<_> = violations.iter().map(|v| v.message.as_str()).collect();
        panic!("Battle invariant violations:\n  - {}", messages.join("\n  - "));
    }
}

/// No-op in release builds.
#[cfg(not(debug_assertions))]
pub fn assert_invariants(_state: &BattleState) {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::{BattleManager, Bullet, Direction, Level};

    fn create_valid_battle() -> BattleState {
        let mut battle = BattleManager::default();
        battle.setup_arena(Level::Scattered);
        battle.load_code("FIRE", "WAIT").unwrap();
        battle.state()
    }

    #[test]
    fn test_valid_battle_passes() {
        let state = create_valid_battle();
        assert!(check_invariants(&state).is_empty());
    }

    #[test]
    fn test_tank_in_wall_detected() {
        let mut state = create_valid_battle();
        state.tanks[0].position = state.walls[0];

        let violations = check_invariants(&state);
        assert!(!violations.is_empty());
        assert!(violations[0].message.contains("inside a wall"));
    }

    #[test]
    fn test_excess_hp_detected() {
        let mut state = create_valid_battle();
        state.tanks[1].hp = 9;

        let violations = check_invariants(&state);
        assert!(violations.iter().any(|v| v.message.contains("hp 9")));
    }

    #[test]
    fn test_shared_cell_detected() {
        let mut state = create_valid_battle();
        state.tanks[1].position = state.tanks[0].position;

        let violations = check_invariants(&state);
        assert!(violations.iter().any(|v| v.message.contains("share")));
    }

    #[test]
    fn test_duplicate_bullets_detected() {
        let mut state = create_valid_battle();
        let bullet = Bullet::new(0, Coord::new(2, 6), Direction::East, 1);
        state.bullets = vec![bullet, bullet];

        let violations = check_invariants(&state);
        assert!(violations.iter().any(|v| v.message.contains("more than one")));
        assert!(violations.iter().any(|v| v.message.contains("not unique")));
    }

    #[test]
    fn test_assert_invariants_passes_valid_state() {
        assert_invariants(&create_valid_battle());
    }
}
