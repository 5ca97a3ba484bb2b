//! Error types for compiling programs, executing them and driving battles.

use std::fmt;

use crate::game::TankId;
use crate::isa::{Opcode, Register};

/// What went wrong while turning source text into a program.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CompileErrorKind {
    /// A word in opcode position is not in the opcode table.
    UnknownOpcode(String),
    /// The tokenizer could not classify a fragment of the source.
    UnrecognizedToken(String),
    /// A well-formed token appeared where something else was required.
    UnexpectedToken {
        /// Description of what the parser wanted.
        expected: &'static str,
        /// The text that was found instead.
        found: String,
    },
    /// An opcode is missing one of its operands.
    MissingOperand {
        /// The opcode being parsed.
        opcode: Opcode,
        /// Description of the missing operand.
        expected: &'static str,
    },
    /// An opcode was given more operands than it accepts.
    TooManyOperands {
        /// The opcode being parsed.
        opcode: Opcode,
        /// The maximum operand count for this opcode.
        max: usize,
    },
    /// A jump names a label that is never defined.
    UndefinedLabel(String),
    /// The same label is defined twice.
    DuplicateLabel(String),
    /// A destination operand names a register programs cannot write.
    ReadOnlyRegister(Register),
}

impl fmt::Display for CompileErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnknownOpcode(word) => write!(f, "unknown opcode '{word}'"),
            Self::UnrecognizedToken(text) => write!(f, "unrecognized token '{text}'"),
            Self::UnexpectedToken { expected, found } => {
                write!(f, "expected {expected}, found '{found}'")
            }
            Self::MissingOperand { opcode, expected } => {
                write!(f, "{opcode} is missing an operand: expected {expected}")
            }
            Self::TooManyOperands { opcode, max } => {
                write!(f, "{opcode} takes at most {max} operand(s)")
            }
            Self::UndefinedLabel(name) => write!(f, "undefined label '{name}'"),
            Self::DuplicateLabel(name) => write!(f, "label '{name}' is defined more than once"),
            Self::ReadOnlyRegister(reg) => write!(f, "register {reg} is read-only"),
        }
    }
}

/// A compile error annotated with the source line it occurred on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompileError {
    /// 1-based source line.
    pub line: usize,
    /// The kind of error.
    pub kind: CompileErrorKind,
}

impl CompileError {
    /// Create a new compile error.
    #[must_use]
    pub fn new(line: usize, kind: CompileErrorKind) -> Self {
        Self { line, kind }
    }
}

impl fmt::Display for CompileError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "line {}: {}", self.line, self.kind)
    }
}

impl std::error::Error for CompileError {}

/// Fatal instruction faults. A faulting CPU halts instead of continuing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Fault {
    /// The operands do not match what the opcode expects.
    BadOperands {
        /// Address of the faulting instruction.
        pc: usize,
        /// The opcode whose operands were malformed.
        opcode: Opcode,
    },
    /// `DIV` or `MOD` with a zero divisor.
    DivisionByZero {
        /// Address of the faulting instruction.
        pc: usize,
    },
    /// A jump target lies beyond the end of the program.
    JumpOutOfRange {
        /// Address of the faulting instruction.
        pc: usize,
        /// The requested target address.
        target: usize,
    },
}

impl fmt::Display for Fault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Fault::BadOperands { pc, opcode } => {
                write!(f, "malformed operands for {opcode} at {pc}")
            }
            Fault::DivisionByZero { pc } => write!(f, "division by zero at {pc}"),
            Fault::JumpOutOfRange { pc, target } => {
                write!(f, "jump from {pc} to out-of-range address {target}")
            }
        }
    }
}

impl std::error::Error for Fault {}

/// Result type for single-instruction execution.
pub type VmResult<T> = Result<T, Fault>;

/// A program failed to compile while loading a battle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadError {
    /// Which tank's source failed.
    pub tank: TankId,
    /// The underlying compile error.
    pub error: CompileError,
}

impl fmt::Display for LoadError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "P{} {}", self.tank, self.error)
    }
}

impl std::error::Error for LoadError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.error)
    }
}

/// Why a turn could not be resolved. Nothing is mutated when this is returned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TurnError {
    /// No programs are installed.
    NoProgram,
    /// The battle has already ended.
    GameOver,
    /// A living tank has not yet produced a turn-ending action.
    NotReady(TankId),
}

impl fmt::Display for TurnError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TurnError::NoProgram => f.write_str("no programs loaded"),
            TurnError::GameOver => f.write_str("the battle is over"),
            TurnError::NotReady(id) => write!(f, "P{id} has no pending action"),
        }
    }
}

impl std::error::Error for TurnError {}

/// A custom arena could not be built.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArenaError {
    /// No level has this number.
    UnknownLevel(u8),
    /// The map text has no rows.
    Empty,
    /// A row's width differs from the first row's.
    RaggedRow {
        /// 0-based row index.
        row: usize,
        /// Width of the first row.
        expected: usize,
        /// Width of this row.
        found: usize,
    },
    /// A character that is not a tile.
    UnknownTile {
        /// 0-based row index.
        row: usize,
        /// 0-based column index.
        col: usize,
        /// The offending character.
        ch: char,
    },
    /// A tank has no spawn marker.
    MissingSpawn(TankId),
    /// A tank has more than one spawn marker.
    DuplicateSpawn(TankId),
    /// A spawn is off the grid or on a wall.
    InvalidSpawn(TankId),
    /// Both tanks spawn on the same cell.
    SharedSpawn,
}

impl fmt::Display for ArenaError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArenaError::UnknownLevel(n) => write!(f, "unknown level {n}"),
            ArenaError::Empty => f.write_str("map is empty"),
            ArenaError::RaggedRow {
                row,
                expected,
                found,
            } => write!(f, "row {row} has width {found}, expected {expected}"),
            ArenaError::UnknownTile { row, col, ch } => {
                write!(f, "unknown tile '{ch}' at row {row}, column {col}")
            }
            ArenaError::MissingSpawn(id) => write!(f, "no spawn for P{id}"),
            ArenaError::DuplicateSpawn(id) => write!(f, "more than one spawn for P{id}"),
            ArenaError::InvalidSpawn(id) => write!(f, "spawn for P{id} is off the grid or on a wall"),
            ArenaError::SharedSpawn => f.write_str("both tanks spawn on the same cell"),
        }
    }
}

impl std::error::Error for ArenaError {}
