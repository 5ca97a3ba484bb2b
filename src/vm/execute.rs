//! Single-instruction execution.
//!
//! Arithmetic wraps on overflow. Anything the parser would have rejected
//! (wrong operand count or kind) raises [`Fault::BadOperands`] instead of
//! touching the register file.

use std::cmp::Ordering;

use crate::error::{Fault, VmResult};
use crate::isa::{Instruction, Opcode, Operand, Register};
use crate::vm::cpu::{HaltReason, StepResult};
use crate::vm::registers::RegisterFile;

/// Reason string carried by an explicit `WAIT`.
pub(crate) const WAIT_REASON: &str = "wait";

/// Outcome of executing one instruction.
#[derive(Debug)]
pub(crate) struct Executed {
    /// Where the program counter goes next.
    pub(crate) next_pc: usize,
    /// What the instruction produced.
    pub(crate) result: StepResult,
}

/// Execute `inst`, located at `pc`, against `regs`.
///
/// # Errors
///
/// Returns a [`Fault`] for malformed operands, division by zero, or a jump
/// beyond `program_len`. The register file is left untouched on error.
#[allow(clippy::too_many_lines)]
pub(crate) fn execute(
    inst: &Instruction,
    regs: &mut RegisterFile,
    pc: usize,
    program_len: usize,
) -> VmResult<Executed> {
    let bad = Fault::BadOperands {
        pc,
        opcode: inst.opcode,
    };
    if inst.operands.len() != inst.opcode.arity() {
        return Err(bad);
    }
    let ops = inst.operands.as_slice();
    let next_pc = pc + 1;

    let result = match inst.opcode {
        // ==================== Register ops ====================
        Opcode::Mov => {
            let dst = dest(ops[0], bad)?;
            let value = read(ops[1], regs, bad)?;
            regs.set(dst, value);
            StepResult::CpuOp
        }
        Opcode::Add | Opcode::Sub | Opcode::Mul | Opcode::Div | Opcode::Mod => {
            let dst = dest(ops[0], bad)?;
            let lhs = regs.get(dst);
            let rhs = read(ops[1], regs, bad)?;
            let value = match inst.opcode {
                Opcode::Add => lhs.wrapping_add(rhs),
                Opcode::Sub => lhs.wrapping_sub(rhs),
                Opcode::Mul => lhs.wrapping_mul(rhs),
                Opcode::Div if rhs == 0 => return Err(Fault::DivisionByZero { pc }),
                Opcode::Div => lhs.wrapping_div(rhs),
                _ if rhs == 0 => return Err(Fault::DivisionByZero { pc }),
                _ => lhs.wrapping_rem(rhs),
            };
            regs.set(dst, value);
            StepResult::CpuOp
        }
        Opcode::Inc => {
            let dst = dest(ops[0], bad)?;
            regs.set(dst, regs.get(dst).wrapping_add(1));
            StepResult::CpuOp
        }
        Opcode::Dec => {
            let dst = dest(ops[0], bad)?;
            regs.set(dst, regs.get(dst).wrapping_sub(1));
            StepResult::CpuOp
        }
        Opcode::Cmp => {
            let lhs = read(ops[0], regs, bad)?;
            let rhs = read(ops[1], regs, bad)?;
            let flag = match lhs.cmp(&rhs) {
                Ordering::Less => -1,
                Ordering::Equal => 0,
                Ordering::Greater => 1,
            };
            regs.set(Register::Cmp, flag);
            StepResult::CpuOp
        }

        // ==================== Control flow ====================
        Opcode::Jmp
        | Opcode::Je
        | Opcode::Jne
        | Opcode::Jg
        | Opcode::Jl
        | Opcode::Jge
        | Opcode::Jle => {
            let Operand::Addr(target) = ops[0] else {
                return Err(bad);
            };
            if target > program_len {
                return Err(Fault::JumpOutOfRange { pc, target });
            }
            let flag = regs.get(Register::Cmp);
            let taken = match inst.opcode {
                Opcode::Jmp => true,
                Opcode::Je => flag == 0,
                Opcode::Jne => flag != 0,
                Opcode::Jg => flag > 0,
                Opcode::Jl => flag < 0,
                Opcode::Jge => flag >= 0,
                _ => flag <= 0,
            };
            return Ok(Executed {
                next_pc: if taken { target } else { next_pc },
                result: StepResult::CpuOp,
            });
        }
        Opcode::Nop => StepResult::CpuOp,
        Opcode::Halt => {
            return Ok(Executed {
                next_pc: pc,
                result: StepResult::Halt(HaltReason::Instruction),
            });
        }

        // ==================== Tank actions ====================
        Opcode::Move => match ops[0] {
            Operand::Heading(heading) => StepResult::Move(heading),
            _ => return Err(bad),
        },
        Opcode::Rotate => match ops[0] {
            Operand::Rotation(rotation) => StepResult::Rotate(rotation),
            _ => return Err(bad),
        },
        Opcode::Fire => StepResult::Fire,
        Opcode::Scan => StepResult::Scan {
            distance: dest(ops[0], bad)?,
            kind: dest(ops[1], bad)?,
        },
        Opcode::Ping => StepResult::Ping {
            x: dest(ops[0], bad)?,
            y: dest(ops[1], bad)?,
        },
        Opcode::Wait => StepResult::Wait {
            reason: WAIT_REASON.to_string(),
        },
    };

    Ok(Executed { next_pc, result })
}

/// A writable register operand.
fn dest(operand: Operand, fault: Fault) -> VmResult<Register> {
    match operand {
        Operand::Reg(reg) if reg.is_writable() => Ok(reg),
        _ => Err(fault),
    }
}

/// The value of a register-or-immediate operand.
fn read(operand: Operand, regs: &RegisterFile, fault: Fault) -> VmResult<i32> {
    match operand {
        Operand::Reg(reg) => Ok(regs.get(reg)),
        Operand::Imm(value) => Ok(value),
        _ => Err(fault),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::isa::{Heading, Rotation};

    fn run(inst: Instruction, regs: &mut RegisterFile) -> VmResult<Executed> {
        execute(&inst, regs, 0, 10)
    }

    fn inst(opcode: Opcode, operands: Vec<Operand>) -> Instruction {
        Instruction::new(opcode, operands, 0)
    }

    #[test]
    fn test_arithmetic() {
        let mut regs = RegisterFile::new();
        let acc = Operand::Reg(Register::Acc);

        run(inst(Opcode::Mov, vec![acc, Operand::Imm(7)]), &mut regs).unwrap();
        run(inst(Opcode::Mul, vec![acc, Operand::Imm(6)]), &mut regs).unwrap();
        assert_eq!(regs.get(Register::Acc), 42);

        run(inst(Opcode::Sub, vec![acc, Operand::Imm(2)]), &mut regs).unwrap();
        run(inst(Opcode::Div, vec![acc, Operand::Imm(8)]), &mut regs).unwrap();
        assert_eq!(regs.get(Register::Acc), 5);

        run(inst(Opcode::Mod, vec![acc, Operand::Imm(3)]), &mut regs).unwrap();
        assert_eq!(regs.get(Register::Acc), 2);

        run(inst(Opcode::Dec, vec![acc]), &mut regs).unwrap();
        run(inst(Opcode::Dec, vec![acc]), &mut regs).unwrap();
        run(inst(Opcode::Dec, vec![acc]), &mut regs).unwrap();
        assert_eq!(regs.get(Register::Acc), -1);
    }

    #[test]
    fn test_arithmetic_wraps() {
        let mut regs = RegisterFile::new();
        regs.set(Register::R0, i32::MAX);
        run(inst(Opcode::Inc, vec![Operand::Reg(Register::R0)]), &mut regs).unwrap();
        assert_eq!(regs.get(Register::R0), i32::MIN);

        regs.set(Register::R1, i32::MIN);
        run(
            inst(Opcode::Div, vec![Operand::Reg(Register::R1), Operand::Imm(-1)]),
            &mut regs,
        )
        .unwrap();
        assert_eq!(regs.get(Register::R1), i32::MIN);
    }

    #[test]
    fn test_division_by_zero_faults_without_writing() {
        let mut regs = RegisterFile::new();
        regs.set(Register::R2, 9);
        let err = run(
            inst(Opcode::Div, vec![Operand::Reg(Register::R2), Operand::Imm(0)]),
            &mut regs,
        )
        .unwrap_err();
        assert_eq!(err, Fault::DivisionByZero { pc: 0 });
        assert_eq!(regs.get(Register::R2), 9);

        let err = run(
            inst(Opcode::Mod, vec![Operand::Reg(Register::R2), Operand::Reg(Register::R3)]),
            &mut regs,
        )
        .unwrap_err();
        assert_eq!(err, Fault::DivisionByZero { pc: 0 });
    }

    #[test]
    fn test_cmp_and_branches() {
        let mut regs = RegisterFile::new();
        run(
            inst(Opcode::Cmp, vec![Operand::Imm(1), Operand::Imm(5)]),
            &mut regs,
        )
        .unwrap();
        assert_eq!(regs.get(Register::Cmp), -1);

        let jl = run(inst(Opcode::Jl, vec![Operand::Addr(7)]), &mut regs).unwrap();
        assert_eq!(jl.next_pc, 7);
        let jg = run(inst(Opcode::Jg, vec![Operand::Addr(7)]), &mut regs).unwrap();
        assert_eq!(jg.next_pc, 1);
        let jne = run(inst(Opcode::Jne, vec![Operand::Addr(3)]), &mut regs).unwrap();
        assert_eq!(jne.next_pc, 3);
        let jle = run(inst(Opcode::Jle, vec![Operand::Addr(4)]), &mut regs).unwrap();
        assert_eq!(jle.next_pc, 4);

        run(
            inst(Opcode::Cmp, vec![Operand::Imm(5), Operand::Imm(5)]),
            &mut regs,
        )
        .unwrap();
        let je = run(inst(Opcode::Je, vec![Operand::Addr(2)]), &mut regs).unwrap();
        assert_eq!(je.next_pc, 2);
        let jge = run(inst(Opcode::Jge, vec![Operand::Addr(9)]), &mut regs).unwrap();
        assert_eq!(jge.next_pc, 9);
    }

    #[test]
    fn test_jump_past_end_faults() {
        let mut regs = RegisterFile::new();
        let err = run(inst(Opcode::Jmp, vec![Operand::Addr(11)]), &mut regs).unwrap_err();
        assert_eq!(err, Fault::JumpOutOfRange { pc: 0, target: 11 });

        // Jumping exactly to the end is allowed and halts on the next step.
        let ok = run(inst(Opcode::Jmp, vec![Operand::Addr(10)]), &mut regs).unwrap();
        assert_eq!(ok.next_pc, 10);
    }

    #[test]
    fn test_actions() {
        let mut regs = RegisterFile::new();
        let mv = run(
            inst(Opcode::Move, vec![Operand::Heading(Heading::Backward)]),
            &mut regs,
        )
        .unwrap();
        assert_eq!(mv.result, StepResult::Move(Heading::Backward));

        let rot = run(
            inst(Opcode::Rotate, vec![Operand::Rotation(Rotation::Left)]),
            &mut regs,
        )
        .unwrap();
        assert_eq!(rot.result, StepResult::Rotate(Rotation::Left));

        let scan = run(
            inst(
                Opcode::Scan,
                vec![Operand::Reg(Register::R0), Operand::Reg(Register::R1)],
            ),
            &mut regs,
        )
        .unwrap();
        assert_eq!(
            scan.result,
            StepResult::Scan {
                distance: Register::R0,
                kind: Register::R1
            }
        );

        let halt = run(inst(Opcode::Halt, vec![]), &mut regs).unwrap();
        assert_eq!(halt.next_pc, 0);
        assert_eq!(halt.result, StepResult::Halt(HaltReason::Instruction));
    }

    #[test]
    fn test_malformed_operands_fault() {
        let mut regs = RegisterFile::new();
        let cases = vec![
            inst(Opcode::Add, vec![Operand::Imm(1), Operand::Imm(2)]),
            inst(Opcode::Mov, vec![Operand::Reg(Register::Pc), Operand::Imm(2)]),
            inst(Opcode::Fire, vec![Operand::Imm(1)]),
            inst(Opcode::Move, vec![]),
            inst(Opcode::Move, vec![Operand::Rotation(Rotation::Right)]),
            inst(Opcode::Jmp, vec![Operand::Reg(Register::Acc)]),
            inst(Opcode::Scan, vec![Operand::Reg(Register::R0), Operand::Imm(1)]),
        ];
        for case in cases {
            let opcode = case.opcode;
            let err = run(case, &mut regs).unwrap_err();
            assert_eq!(err, Fault::BadOperands { pc: 0, opcode });
        }
        assert_eq!(regs, RegisterFile::new());
    }
}
