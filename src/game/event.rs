//! Visualization events. Written by the engine, never read back by it.

use serde::Serialize;

use crate::game::{Coord, TankId};

/// One entry in the event log.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Event {
    /// Monotonic id, unique per arena.
    pub id: u32,
    /// Turn the event happened on (1-based).
    pub turn: u32,
    /// What happened.
    #[serde(flatten)]
    pub kind: EventKind,
}

/// Event payloads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EventKind {
    /// A bullet or shell detonated.
    Explosion {
        /// Cell of the explosion.
        at: Coord,
        /// The tank that was hit, if any.
        tank: Option<TankId>,
    },
    /// A tank located its enemy.
    Ping {
        /// The pinging tank.
        from: TankId,
        /// Where the enemy was.
        target: Coord,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_json_shape() {
        let event = Event {
            id: 4,
            turn: 2,
            kind: EventKind::Explosion {
                at: Coord::new(3, 5),
                tank: Some(2),
            },
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "EXPLOSION");
        assert_eq!(json["at"], "3,5");
        assert_eq!(json["tank"], 2);
        assert_eq!(json["turn"], 2);
    }
}
