//! The battle manager: arena setup, program loading and micro-stepping.
//!
//! Turn resolution lives in the sibling `turn` module.

use std::collections::VecDeque;

use crate::error::LoadError;
use crate::game::{
    Arena, BattleConfig, BattleState, Bullet, Event, EventKind, GameOutcome, Level, Tank, TankId,
    TankState,
};
use crate::isa::{Program, compile};
use crate::vm::{Cpu, StepResult};

/// Owns both tanks, the bullets, the logs and the arena.
///
/// Driven from outside: call [`BattleManager::step_cpu`] for each tank until
/// both are turn-ready, then [`BattleManager::resolve_turn`].
#[derive(Debug, Clone)]
pub struct BattleManager {
    pub(super) config: BattleConfig,
    pub(super) arena: Arena,
    pub(super) tanks: [Tank; 2],
    pub(super) bullets: Vec<Bullet>,
    pub(super) events: Vec<Event>,
    pub(super) messages: VecDeque<String>,
    pub(super) turn: u32,
    pub(super) outcome: Option<GameOutcome>,
    programs: Option<[Program; 2]>,
    next_bullet_id: u32,
    next_event_id: u32,
}

impl BattleManager {
    /// Create a manager on level 1 with no programs loaded.
    #[must_use]
    pub fn new(config: BattleConfig) -> Self {
        let arena = Level::Open.arena();
        let tanks = spawn_tanks(&arena, &config);
        Self {
            config,
            arena,
            tanks,
            bullets: Vec::new(),
            events: Vec::new(),
            messages: VecDeque::new(),
            turn: 0,
            outcome: None,
            programs: None,
            next_bullet_id: 0,
            next_event_id: 0,
        }
    }

    /// Switch to a built-in level and reset the battle.
    pub fn setup_arena(&mut self, level: Level) {
        self.setup_custom_arena(level.arena());
    }

    /// Switch to a custom arena and reset the battle.
    pub fn setup_custom_arena(&mut self, arena: Arena) {
        self.arena = arena;
        self.reset();
    }

    /// Compile both sources and install them.
    ///
    /// On failure nothing changes: the previous programs, positions and logs
    /// stay as they were.
    ///
    /// # Errors
    ///
    /// Returns the first compile error, tagged with the tank whose source
    /// failed. P1's source is compiled first.
    pub fn load_code(&mut self, source_a: &str, source_b: &str) -> Result<[Program; 2], LoadError> {
        let a = compile(source_a).map_err(|error| LoadError { tank: 1, error })?;
        let b = compile(source_b).map_err(|error| LoadError { tank: 2, error })?;
        let programs = [a, b];
        self.install_programs(programs.clone());
        Ok(programs)
    }

    /// Install already-compiled programs and reset the battle.
    pub fn install_programs(&mut self, programs: [Program; 2]) {
        log::info!(
            "installing programs ({} and {} instructions)",
            programs[0].len(),
            programs[1].len()
        );
        self.programs = Some(programs);
        self.reset();
    }

    /// Restore starting positions and health, give both tanks fresh CPUs
    /// and clear bullets, events, messages and the turn counter.
    pub fn reset(&mut self) {
        let mut tanks = spawn_tanks(&self.arena, &self.config);
        if let Some(programs) = &self.programs {
            for (tank, program) in tanks.iter_mut().zip(programs.iter()) {
                tank.cpu = Some(Cpu::with_op_limit(
                    program.clone(),
                    self.config.max_ops_per_turn,
                ));
            }
        }
        self.tanks = tanks;
        self.bullets.clear();
        self.events.clear();
        self.messages.clear();
        self.turn = 0;
        self.outcome = None;
        self.next_bullet_id = 0;
        self.next_event_id = 0;
    }

    /// Run one micro-step of tank `id`'s CPU.
    ///
    /// Returns `None` without doing anything if the battle is over, the tank
    /// is destroyed or has no program, or `id` is not 1 or 2. If the tank
    /// already has a pending action, that action is returned again.
    pub fn step_cpu(&mut self, id: TankId) -> Option<StepResult> {
        if self.outcome.is_some() {
            return None;
        }
        let ammo_available = !self.has_live_bullet(id);
        let tank = self.tank_mut(id)?;
        if !tank.is_alive() || tank.cpu.is_none() {
            return None;
        }

        tank.sync_cpu(ammo_available);
        let result = tank.cpu.as_mut()?.step();
        if result == StepResult::CpuOp {
            tank.total_ops += 1;
        }
        Some(result)
    }

    /// Step tank `id` until it produces a turn-ending result.
    ///
    /// The op budget guarantees termination. Returns `None` under the same
    /// conditions as [`BattleManager::step_cpu`].
    pub fn run_until_ready(&mut self, id: TankId) -> Option<StepResult> {
        loop {
            let result = self.step_cpu(id)?;
            if result.ends_turn() {
                return Some(result);
            }
        }
    }

    /// A tank is turn-ready when it has a pending action or is destroyed.
    #[must_use]
    pub fn is_tank_ready(&self, id: TankId) -> bool {
        self.tank(id).is_some_and(|tank| {
            !tank.is_alive()
                || tank
                    .cpu()
                    .is_some_and(|cpu| cpu.pending_action().is_some())
        })
    }

    /// Independent snapshot of the battle.
    #[must_use]
    pub fn state(&self) -> BattleState {
        BattleState {
            turn: self.turn,
            config: self.config,
            width: self.arena.grid().width(),
            height: self.arena.grid().height(),
            walls: self.arena.grid().walls(),
            tanks: self.tanks.iter().map(TankState::capture).collect(),
            bullets: self.bullets.clone(),
            events: self.events.clone(),
            messages: self.messages.iter().cloned().collect(),
            outcome: self.outcome,
        }
    }

    /// Tank `id` (1 or 2).
    #[must_use]
    pub fn tank(&self, id: TankId) -> Option<&Tank> {
        let index = usize::from(id).checked_sub(1)?;
        self.tanks.get(index)
    }

    pub(super) fn tank_mut(&mut self, id: TankId) -> Option<&mut Tank> {
        let index = usize::from(id).checked_sub(1)?;
        self.tanks.get_mut(index)
    }

    /// Live bullets in id order.
    #[must_use]
    pub fn bullets(&self) -> &[Bullet] {
        &self.bullets
    }

    /// The current arena.
    #[must_use]
    pub const fn arena(&self) -> &Arena {
        &self.arena
    }

    /// Rules in effect.
    #[must_use]
    pub const fn config(&self) -> &BattleConfig {
        &self.config
    }

    /// Turns resolved so far.
    #[must_use]
    pub const fn turn(&self) -> u32 {
        self.turn
    }

    /// How the battle ended, if it has.
    #[must_use]
    pub const fn outcome(&self) -> Option<GameOutcome> {
        self.outcome
    }

    /// Check if the battle has ended.
    #[must_use]
    pub const fn is_over(&self) -> bool {
        self.outcome.is_some()
    }

    /// Check if programs are installed.
    #[must_use]
    pub const fn has_programs(&self) -> bool {
        self.programs.is_some()
    }

    pub(super) fn has_live_bullet(&self, owner: TankId) -> bool {
        self.bullets.iter().any(|b| b.owner == owner)
    }

    pub(super) fn next_bullet_id(&mut self) -> u32 {
        let id = self.next_bullet_id;
        self.next_bullet_id += 1;
        id
    }

    pub(super) fn emit(&mut self, kind: EventKind) {
        let id = self.next_event_id;
        self.next_event_id += 1;
        self.events.push(Event {
            id,
            turn: self.turn,
            kind,
        });
    }

    pub(super) fn log_message(&mut self, message: String) {
        log::debug!("turn {}: {message}", self.turn);
        self.messages.push_back(format!("[{}] {message}", self.turn));
        while self.messages.len() > self.config.message_limit {
            self.messages.pop_front();
        }
    }
}

impl Default for BattleManager {
    fn default() -> Self {
        Self::new(BattleConfig::default())
    }
}

fn spawn_tanks(arena: &Arena, config: &BattleConfig) -> [Tank; 2] {
    let [p1, p2] = arena.spawns();
    [Tank::new(1, p1, config.max_hp), Tank::new(2, p2, config.max_hp)]
}
