//! CPU state: register file, program and the pending-action slot.

use std::fmt;

use serde::Serialize;

use crate::error::Fault;
use crate::isa::{Heading, Program, Register, Rotation};
use crate::vm::execute::execute;
use crate::vm::registers::RegisterFile;

/// Reason string for the forced wait issued when the op budget runs out.
pub const OP_LIMIT_REASON: &str = "op limit";

/// Why a CPU stopped executing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum HaltReason {
    /// The program executed `HALT`.
    Instruction,
    /// The program counter ran past the last instruction.
    EndOfProgram,
    /// A fatal instruction fault.
    #[serde(serialize_with = "serialize_fault")]
    Fault(Fault),
}

fn serialize_fault<S: serde::Serializer>(fault: &Fault, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.collect_str(fault)
}

impl fmt::Display for HaltReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HaltReason::Instruction => f.write_str("halted"),
            HaltReason::EndOfProgram => f.write_str("end of program"),
            HaltReason::Fault(fault) => write!(f, "fault: {fault}"),
        }
    }
}

/// Result of a single micro-step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StepResult {
    /// A register or control-flow instruction; the turn continues.
    CpuOp,
    /// Move one cell along (or against) the current facing.
    Move(Heading),
    /// Turn 90 degrees.
    Rotate(Rotation),
    /// Fire the cannon.
    Fire,
    /// Cast a ray along the facing; answers land in the two registers.
    Scan {
        /// Register receiving the distance.
        distance: Register,
        /// Register receiving the hit type code.
        kind: Register,
    },
    /// Locate the enemy; answers land in the two registers.
    Ping {
        /// Register receiving the enemy's x.
        x: Register,
        /// Register receiving the enemy's y.
        y: Register,
    },
    /// Skip this turn.
    Wait {
        /// Why the tank is waiting.
        reason: String,
    },
    /// No more instructions will run.
    Halt(HaltReason),
    /// The tank has no hit points left.
    Dead,
}

impl StepResult {
    /// Whether this result ends the tank's turn.
    #[must_use]
    pub fn ends_turn(&self) -> bool {
        !matches!(self, StepResult::CpuOp)
    }
}

/// One tank's processor.
///
/// `step()` executes exactly one instruction. Any result other than
/// [`StepResult::CpuOp`] is latched into the pending-action slot; while the
/// slot is full, further steps do not execute and return the latched result.
#[derive(Debug, Clone)]
pub struct Cpu {
    regs: RegisterFile,
    program: Program,
    pending: Option<StepResult>,
    halted: Option<HaltReason>,
    op_limit: u32,
    ops_this_turn: u32,
    executed: u64,
}

impl Cpu {
    /// Create a CPU for `program` with an unbounded per-turn op budget.
    #[must_use]
    pub fn new(program: Program) -> Self {
        Self::with_op_limit(program, u32::MAX)
    }

    /// Create a CPU that may run at most `op_limit` register ops per turn.
    ///
    /// A limit of zero is treated as one.
    #[must_use]
    pub fn with_op_limit(program: Program, op_limit: u32) -> Self {
        Self {
            regs: RegisterFile::new(),
            program,
            pending: None,
            halted: None,
            op_limit: op_limit.max(1),
            ops_this_turn: 0,
            executed: 0,
        }
    }

    /// Mirror authoritative tank state into the sensor registers.
    ///
    /// `ammo_available` is true when the tank has no live bullet.
    pub fn update_tank_state(&mut self, x: i32, y: i32, facing: u8, hp: i32, ammo_available: bool) {
        self.regs.set(Register::Px, x);
        self.regs.set(Register::Py, y);
        self.regs.set(Register::Dir, i32::from(facing));
        self.regs.set(Register::Hp, hp);
        self.regs.set(Register::Ammo, i32::from(ammo_available));
    }

    /// Execute one instruction.
    pub fn step(&mut self) -> StepResult {
        if let Some(pending) = &self.pending {
            return pending.clone();
        }

        if self.regs.get(Register::Hp) <= 0 {
            return self.latch(StepResult::Dead);
        }

        if let Some(reason) = self.halted {
            return self.latch(StepResult::Halt(reason));
        }

        if self.ops_this_turn >= self.op_limit {
            return self.latch(StepResult::Wait {
                reason: OP_LIMIT_REASON.to_string(),
            });
        }

        let pc = self.regs.pc();
        let Some(inst) = self.program.get(pc) else {
            self.halted = Some(HaltReason::EndOfProgram);
            return self.latch(StepResult::Halt(HaltReason::EndOfProgram));
        };

        self.executed += 1;
        match execute(inst, &mut self.regs, pc, self.program.len()) {
            Ok(done) => {
                self.regs.set_pc(done.next_pc);
                if let StepResult::Halt(reason) = done.result {
                    self.halted = Some(reason);
                }
                if done.result.ends_turn() {
                    self.latch(done.result)
                } else {
                    self.ops_this_turn += 1;
                    StepResult::CpuOp
                }
            }
            Err(fault) => {
                log::warn!("cpu fault (line {}): {fault}", inst.line);
                let reason = HaltReason::Fault(fault);
                self.halted = Some(reason);
                self.latch(StepResult::Halt(reason))
            }
        }
    }

    fn latch(&mut self, result: StepResult) -> StepResult {
        self.pending = Some(result.clone());
        result
    }

    /// The latched turn-ending result, if any.
    #[must_use]
    pub fn pending_action(&self) -> Option<&StepResult> {
        self.pending.as_ref()
    }

    /// Clear the pending slot and reset the per-turn op budget.
    pub fn clear_pending(&mut self) {
        self.pending = None;
        self.ops_this_turn = 0;
    }

    /// Post a value into a register (used for sensor answers).
    pub fn set_register(&mut self, reg: Register, value: i32) {
        self.regs.set(reg, value);
    }

    /// Read a register.
    #[must_use]
    pub fn register(&self, reg: Register) -> i32 {
        self.regs.get(reg)
    }

    /// The whole register file.
    #[must_use]
    pub fn registers(&self) -> &RegisterFile {
        &self.regs
    }

    /// Current program counter.
    #[must_use]
    pub fn pc(&self) -> usize {
        self.regs.pc()
    }

    /// The loaded program.
    #[must_use]
    pub fn program(&self) -> &Program {
        &self.program
    }

    /// Why the CPU halted, if it has.
    #[must_use]
    pub fn halt_reason(&self) -> Option<HaltReason> {
        self.halted
    }

    /// Instructions executed since creation.
    #[must_use]
    pub fn instructions_executed(&self) -> u64 {
        self.executed
    }
}
