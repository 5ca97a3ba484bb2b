//! Turn resolution.
//!
//! Phases run in a fixed order: bullets, sensors, actions, movement, game
//! over. Within each phase P1 is handled before P2.

use crate::error::TurnError;
use crate::game::movement::{MoveOutcome, resolve_moves};
use crate::game::{
    ActionKind, BattleManager, Bullet, Coord, DrawReason, EventKind, Feedback, GameOutcome,
    TankId,
};
use crate::isa::{Heading, Register};
use crate::vm::StepResult;

impl BattleManager {
    /// Apply both tanks' pending actions to the world.
    ///
    /// # Errors
    ///
    /// Fails without changing anything if no programs are loaded, the battle
    /// is over, or a living tank has no pending action.
    pub fn resolve_turn(&mut self) -> Result<(), TurnError> {
        if !self.has_programs() {
            return Err(TurnError::NoProgram);
        }
        if self.outcome.is_some() {
            return Err(TurnError::GameOver);
        }
        for id in [1, 2] {
            if !self.is_tank_ready(id) {
                return Err(TurnError::NotReady(id));
            }
        }

        self.turn += 1;
        log::debug!("resolving turn {}", self.turn);

        // Tanks destroyed before this turn contribute nothing.
        let actions: [Option<StepResult>; 2] = [0, 1].map(|i| {
            let tank = &self.tanks[i];
            if tank.is_alive() {
                tank.cpu().and_then(|cpu| cpu.pending_action().cloned())
            } else {
                None
            }
        });

        self.advance_bullets();
        self.resolve_sensors(&actions);
        let intents = self.resolve_actions(&actions);
        self.resolve_movement(intents);

        for tank in &mut self.tanks {
            if !tank.is_alive() {
                tank.last_feedback = Feedback::Destroyed;
            }
        }

        self.evaluate_game_over();

        for tank in &mut self.tanks {
            if let Some(cpu) = tank.cpu.as_mut() {
                cpu.clear_pending();
            }
        }
        Ok(())
    }

    /// Living tank, other than `owner`, standing on `at`.
    fn target_at(&self, at: Coord, owner: TankId) -> Option<TankId> {
        self.tanks
            .iter()
            .find(|t| t.id != owner && t.is_alive() && t.position == at)
            .map(|t| t.id)
    }

    fn hit_tank(&mut self, id: TankId, at: Coord, by: TankId) {
        let Some(tank) = self.tank_mut(id) else {
            return;
        };
        let destroyed = tank.damage();
        let hp = tank.hp;
        self.emit(EventKind::Explosion { at, tank: Some(id) });
        self.log_message(format!("P{by} hit P{id} at {at} (hp {hp})"));
        if destroyed {
            self.log_message(format!("P{id} destroyed"));
        }
    }

    // ==== Bullets ====

    fn advance_bullets(&mut self) {
        let mut bullets = std::mem::take(&mut self.bullets);
        bullets.sort_by_key(|b| b.id);

        let mut survivors = Vec::with_capacity(bullets.len());
        for mut bullet in bullets {
            if self.advance_bullet(&mut bullet) {
                survivors.push(bullet);
            }
        }
        self.bullets = survivors;
    }

    /// Move one bullet up to `bullet_speed` cells. Returns `false` once it dies.
    fn advance_bullet(&mut self, bullet: &mut Bullet) -> bool {
        if let Some(id) = self.target_at(bullet.position, bullet.owner) {
            self.hit_tank(id, bullet.position, bullet.owner);
            return false;
        }

        for _ in 0..self.config.bullet_speed {
            let next = bullet.next_cell();
            bullet.distance += 1;

            if bullet.distance > self.config.bullet_range {
                return false;
            }
            let grid = self.arena.grid();
            if !grid.in_bounds(next) {
                return false;
            }
            if grid.is_wall(next) {
                self.emit(EventKind::Explosion { at: next, tank: None });
                return false;
            }

            bullet.position = next;
            if let Some(id) = self.target_at(next, bullet.owner) {
                self.hit_tank(id, next, bullet.owner);
                return false;
            }
        }
        true
    }

    // ==== Sensors ====

    fn resolve_sensors(&mut self, actions: &[Option<StepResult>; 2]) {
        let occupants: Vec<(TankId, Coord)> = self
            .tanks
            .iter()
            .filter(|t| t.is_alive())
            .map(|t| (t.id, t.position))
            .collect();

        for (i, action) in actions.iter().enumerate() {
            match action {
                Some(StepResult::Scan { distance, kind }) => {
                    let tank = &self.tanks[i];
                    let ray = self.arena.grid().raycast(
                        tank.position,
                        tank.facing.delta(),
                        tank.id,
                        &occupants,
                    );
                    self.write_registers(i, [(*distance, ray.distance), (*kind, ray.hit.code())]);
                }
                Some(StepResult::Ping { x, y }) => {
                    let from = self.tanks[i].id;
                    let enemy = &self.tanks[1 - i];
                    let target = enemy.is_alive().then_some(enemy.position);
                    match target {
                        Some(at) => {
                            self.write_registers(i, [(*x, at.x), (*y, at.y)]);
                            self.emit(EventKind::Ping { from, target: at });
                        }
                        None => self.write_registers(i, [(*x, -1), (*y, -1)]),
                    }
                }
                _ => {}
            }
        }
    }

    fn write_registers(&mut self, index: usize, values: [(Register, i32); 2]) {
        if let Some(cpu) = self.tanks[index].cpu.as_mut() {
            for (reg, value) in values {
                cpu.set_register(reg, value);
            }
        }
    }

    // ==== Actions ====

    /// Apply rotations and fire, and collect move intents.
    fn resolve_actions(&mut self, actions: &[Option<StepResult>; 2]) -> [Option<Coord>; 2] {
        let mut intents = [None, None];

        for (i, action) in actions.iter().enumerate() {
            let Some(action) = action else {
                self.tanks[i].last_action = ActionKind::Idle;
                continue;
            };

            let was_halted = self.tanks[i].last_action == ActionKind::Halt;
            self.tanks[i].last_action = ActionKind::from_step(action);
            self.tanks[i].last_feedback = Feedback::Ok;

            match action {
                StepResult::Rotate(rotation) => {
                    let tank = &mut self.tanks[i];
                    tank.facing = tank.facing.rotate(*rotation);
                }
                StepResult::Move(heading) => {
                    let tank = &self.tanks[i];
                    let dir = match heading {
                        Heading::Forward => tank.facing,
                        Heading::Backward => tank.facing.opposite(),
                    };
                    intents[i] = Some(tank.position.step(dir));
                }
                StepResult::Fire => self.fire(i),
                StepResult::Wait { reason } => {
                    self.tanks[i].last_feedback = Feedback::Waiting(reason.clone());
                }
                StepResult::Halt(reason) => {
                    self.tanks[i].last_feedback = Feedback::Halted(reason.to_string());
                    if !was_halted {
                        let id = self.tanks[i].id;
                        self.log_message(format!("P{id} {reason}"));
                    }
                }
                StepResult::Dead => {
                    self.tanks[i].last_action = ActionKind::Idle;
                    self.tanks[i].last_feedback = Feedback::Destroyed;
                }
                StepResult::CpuOp | StepResult::Scan { .. } | StepResult::Ping { .. } => {}
            }
        }

        intents
    }

    fn fire(&mut self, index: usize) {
        let (id, position, facing) = {
            let tank = &self.tanks[index];
            (tank.id, tank.position, tank.facing)
        };

        if self.has_live_bullet(id) {
            self.tanks[index].last_feedback = Feedback::Reloading;
            return;
        }

        let ahead = position.step(facing);
        if !self.arena.grid().is_valid(ahead) {
            self.emit(EventKind::Explosion { at: ahead, tank: None });
            self.tanks[index].last_feedback = Feedback::Blocked;
            return;
        }

        if let Some(enemy) = self.target_at(ahead, id) {
            self.hit_tank(enemy, ahead, id);
            return;
        }

        let bullet_id = self.next_bullet_id();
        log::debug!("P{id} fired bullet {bullet_id} from {ahead}");
        self.bullets.push(Bullet::new(bullet_id, ahead, facing, id));
    }

    // ==== Movement ====

    fn resolve_movement(&mut self, intents: [Option<Coord>; 2]) {
        let positions = [self.tanks[0].position, self.tanks[1].position];
        let outcomes = resolve_moves(self.arena.grid(), positions, intents);

        for (tank, outcome) in self.tanks.iter_mut().zip(outcomes) {
            match outcome {
                Some(MoveOutcome::Moved(to)) => tank.position = to,
                Some(MoveOutcome::Rejected(feedback)) => tank.last_feedback = feedback,
                None => {}
            }
        }
    }

    // ==== Game over ====

    fn evaluate_game_over(&mut self) {
        let [p1, p2] = &self.tanks;
        let outcome = match (p1.is_alive(), p2.is_alive()) {
            (false, false) => Some(GameOutcome::Draw {
                reason: DrawReason::BothDestroyed,
            }),
            (true, false) => Some(GameOutcome::Winner { tank: p1.id }),
            (false, true) => Some(GameOutcome::Winner { tank: p2.id }),
            (true, true) => {
                if p1.last_action == ActionKind::Halt && p2.last_action == ActionKind::Halt {
                    Some(GameOutcome::Draw {
                        reason: DrawReason::Stalemate,
                    })
                } else if self.turn >= self.config.max_turns {
                    Some(GameOutcome::Draw {
                        reason: DrawReason::TurnLimit,
                    })
                } else {
                    None
                }
            }
        };

        if let Some(outcome) = outcome {
            log::info!("battle over after {} turns: {outcome}", self.turn);
            self.log_message(format!("game over: {outcome}"));
            self.outcome = Some(outcome);
        }
    }
}
