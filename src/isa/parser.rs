//! Parser: token stream to validated [`Program`].
//!
//! Labels are resolved in two passes. The first pass records each label
//! definition at the address of the next instruction and emits a
//! placeholder for every label reference; the second pass back-patches the
//! placeholders, failing on the first undefined name.

use std::collections::BTreeMap;

use crate::error::{CompileError, CompileErrorKind};
use crate::isa::instruction::OperandSlot;
use crate::isa::lexer::{Token, TokenKind};
use crate::isa::{Heading, Instruction, Opcode, Operand, Program, Register, Rotation};

/// A label reference waiting for its address.
struct Backpatch {
    instruction: usize,
    operand: usize,
    label: String,
    line: usize,
}

/// Parse a token stream into a program.
///
/// # Errors
///
/// Returns the first structural error found, annotated with its source line.
pub fn parse(tokens: &[Token]) -> Result<Program, CompileError> {
    let mut instructions: Vec<Instruction> = Vec::new();
    let mut labels: BTreeMap<String, usize> = BTreeMap::new();
    let mut backpatches: Vec<Backpatch> = Vec::new();

    let mut pos = 0;
    while pos < tokens.len() {
        let token = &tokens[pos];
        match &token.kind {
            TokenKind::LabelDef(name) => {
                if labels.insert(name.clone(), instructions.len()).is_some() {
                    return Err(CompileError::new(
                        token.line,
                        CompileErrorKind::DuplicateLabel(name.clone()),
                    ));
                }
                pos += 1;
            }
            TokenKind::Opcode(opcode) => {
                let operand_end = tokens[pos + 1..]
                    .iter()
                    .position(|t| t.line != token.line)
                    .map_or(tokens.len(), |offset| pos + 1 + offset);
                let operand_tokens = &tokens[pos + 1..operand_end];

                let (operands, refs) = parse_operands(*opcode, token.line, operand_tokens)?;
                for (operand, label) in refs {
                    backpatches.push(Backpatch {
                        instruction: instructions.len(),
                        operand,
                        label,
                        line: token.line,
                    });
                }
                instructions.push(Instruction::new(*opcode, operands, token.line));
                pos = operand_end;
            }
            TokenKind::Ident(word) => {
                return Err(CompileError::new(
                    token.line,
                    CompileErrorKind::UnknownOpcode(word.clone()),
                ));
            }
            TokenKind::Int(_) => {
                return Err(CompileError::new(
                    token.line,
                    CompileErrorKind::UnexpectedToken {
                        expected: "opcode or label",
                        found: token.text(),
                    },
                ));
            }
            TokenKind::Unknown(text) => {
                return Err(CompileError::new(
                    token.line,
                    CompileErrorKind::UnrecognizedToken(text.clone()),
                ));
            }
        }
    }

    for patch in backpatches {
        let Some(&addr) = labels.get(&patch.label) else {
            return Err(CompileError::new(
                patch.line,
                CompileErrorKind::UndefinedLabel(patch.label),
            ));
        };
        instructions[patch.instruction].operands[patch.operand] = Operand::Addr(addr);
    }

    Ok(Program::new(instructions, labels))
}

/// Operands plus `(operand index, label name)` pairs still to be resolved.
type ParsedOperands = (Vec<Operand>, Vec<(usize, String)>);

fn parse_operands(
    opcode: Opcode,
    line: usize,
    tokens: &[Token],
) -> Result<ParsedOperands, CompileError> {
    let signature = opcode.signature();
    if tokens.len() > signature.len() {
        // Surface garbage before arity so the message points at the real problem.
        if let Some(bad) = tokens.iter().find(|t| matches!(t.kind, TokenKind::Unknown(_))) {
            return Err(CompileError::new(
                line,
                CompileErrorKind::UnrecognizedToken(bad.text()),
            ));
        }
        return Err(CompileError::new(
            line,
            CompileErrorKind::TooManyOperands {
                opcode,
                max: signature.len(),
            },
        ));
    }

    let mut operands = Vec::with_capacity(signature.len());
    let mut refs = Vec::new();

    for (idx, slot) in signature.iter().enumerate() {
        let Some(token) = tokens.get(idx) else {
            if *slot == OperandSlot::OptionalHeading {
                operands.push(Operand::Heading(Heading::Forward));
                continue;
            }
            return Err(CompileError::new(
                line,
                CompileErrorKind::MissingOperand {
                    opcode,
                    expected: describe(*slot),
                },
            ));
        };

        if let TokenKind::Unknown(text) = &token.kind {
            return Err(CompileError::new(
                line,
                CompileErrorKind::UnrecognizedToken(text.clone()),
            ));
        }

        let operand = match (*slot, &token.kind) {
            (OperandSlot::Dest, TokenKind::Ident(word)) => match Register::from_name(word) {
                Some(reg) if reg.is_writable() => Some(Operand::Reg(reg)),
                Some(reg) => {
                    return Err(CompileError::new(
                        line,
                        CompileErrorKind::ReadOnlyRegister(reg),
                    ));
                }
                None => None,
            },
            (OperandSlot::Source, TokenKind::Ident(word)) => {
                Register::from_name(word).map(Operand::Reg)
            }
            (OperandSlot::Source, TokenKind::Int(value)) => Some(Operand::Imm(*value)),
            (OperandSlot::Label, TokenKind::Ident(word)) if Register::from_name(word).is_none() => {
                refs.push((idx, word.clone()));
                Some(Operand::Addr(0))
            }
            (OperandSlot::Rotation, TokenKind::Ident(word)) => {
                Rotation::from_keyword(word).map(Operand::Rotation)
            }
            (OperandSlot::OptionalHeading, TokenKind::Ident(word)) => {
                Heading::from_keyword(word).map(Operand::Heading)
            }
            _ => None,
        };

        let Some(operand) = operand else {
            return Err(CompileError::new(
                line,
                CompileErrorKind::UnexpectedToken {
                    expected: describe(*slot),
                    found: token.text(),
                },
            ));
        };
        operands.push(operand);
    }

    Ok((operands, refs))
}

const fn describe(slot: OperandSlot) -> &'static str {
    match slot {
        OperandSlot::Dest => "a writable register",
        OperandSlot::Source => "a register or integer",
        OperandSlot::Label => "a label",
        OperandSlot::Rotation => "LEFT or RIGHT",
        OperandSlot::OptionalHeading => "FORWARD or BACKWARD",
    }
}
