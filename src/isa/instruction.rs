//! Opcode table, register names and the parsed instruction form.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// The fixed opcode table.
#[allow(missing_docs)] // Variants are named after their mnemonics
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Opcode {
    // ==================== Register ops ====================
    Mov,
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    Inc,
    Dec,
    Cmp,

    // ==================== Control flow ====================
    Jmp,
    Je,
    Jne,
    Jg,
    Jl,
    Jge,
    Jle,
    Nop,
    Halt,

    // ==================== Tank actions ====================
    Move,
    Rotate,
    Fire,
    Scan,
    Ping,
    Wait,
}

/// The kind of operand an opcode expects in a given position.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum OperandSlot {
    /// A register the program may write.
    Dest,
    /// A register or an integer literal.
    Source,
    /// A label name, resolved to an address.
    Label,
    /// `LEFT` or `RIGHT`.
    Rotation,
    /// `FORWARD` or `BACKWARD`, defaulting to `FORWARD` when omitted.
    OptionalHeading,
}

impl Opcode {
    /// Every opcode, in table order.
    pub const ALL: [Opcode; 24] = [
        Opcode::Mov,
        Opcode::Add,
        Opcode::Sub,
        Opcode::Mul,
        Opcode::Div,
        Opcode::Mod,
        Opcode::Inc,
        Opcode::Dec,
        Opcode::Cmp,
        Opcode::Jmp,
        Opcode::Je,
        Opcode::Jne,
        Opcode::Jg,
        Opcode::Jl,
        Opcode::Jge,
        Opcode::Jle,
        Opcode::Nop,
        Opcode::Halt,
        Opcode::Move,
        Opcode::Rotate,
        Opcode::Fire,
        Opcode::Scan,
        Opcode::Ping,
        Opcode::Wait,
    ];

    /// Source-level spelling of the opcode.
    #[must_use]
    pub const fn mnemonic(self) -> &'static str {
        match self {
            Opcode::Mov => "MOV",
            Opcode::Add => "ADD",
            Opcode::Sub => "SUB",
            Opcode::Mul => "MUL",
            Opcode::Div => "DIV",
            Opcode::Mod => "MOD",
            Opcode::Inc => "INC",
            Opcode::Dec => "DEC",
            Opcode::Cmp => "CMP",
            Opcode::Jmp => "JMP",
            Opcode::Je => "JE",
            Opcode::Jne => "JNE",
            Opcode::Jg => "JG",
            Opcode::Jl => "JL",
            Opcode::Jge => "JGE",
            Opcode::Jle => "JLE",
            Opcode::Nop => "NOP",
            Opcode::Halt => "HALT",
            Opcode::Move => "MOVE",
            Opcode::Rotate => "ROTATE",
            Opcode::Fire => "FIRE",
            Opcode::Scan => "SCAN",
            Opcode::Ping => "PING",
            Opcode::Wait => "WAIT",
        }
    }

    /// Look up an opcode by mnemonic, ignoring case.
    #[must_use]
    pub fn from_mnemonic(text: &str) -> Option<Self> {
        Self::ALL
            .iter()
            .copied()
            .find(|op| op.mnemonic().eq_ignore_ascii_case(text))
    }

    /// Whether this opcode ends the tank's turn (including `HALT` and `WAIT`).
    #[must_use]
    pub const fn ends_turn(self) -> bool {
        matches!(
            self,
            Opcode::Halt
                | Opcode::Move
                | Opcode::Rotate
                | Opcode::Fire
                | Opcode::Scan
                | Opcode::Ping
                | Opcode::Wait
        )
    }

    /// Operand layout for this opcode.
    #[must_use]
    pub(crate) const fn signature(self) -> &'static [OperandSlot] {
        use OperandSlot::{Dest, Label, OptionalHeading, Rotation, Source};
        match self {
            Opcode::Mov | Opcode::Add | Opcode::Sub | Opcode::Mul | Opcode::Div | Opcode::Mod => {
                &[Dest, Source]
            }
            Opcode::Inc | Opcode::Dec => &[Dest],
            Opcode::Cmp => &[Source, Source],
            Opcode::Jmp
            | Opcode::Je
            | Opcode::Jne
            | Opcode::Jg
            | Opcode::Jl
            | Opcode::Jge
            | Opcode::Jle => &[Label],
            Opcode::Nop | Opcode::Halt | Opcode::Fire | Opcode::Wait => &[],
            Opcode::Move => &[OptionalHeading],
            Opcode::Rotate => &[Rotation],
            Opcode::Scan | Opcode::Ping => &[Dest, Dest],
        }
    }

    /// Number of operands a parsed instruction with this opcode carries.
    #[must_use]
    pub const fn arity(self) -> usize {
        self.signature().len()
    }
}

impl fmt::Display for Opcode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.mnemonic())
    }
}

/// Named register slots.
///
/// `PX`, `PY`, `DIR`, `HP` and `AMMO` mirror the tank's state and are
/// rewritten before every step, so programs may write them but the world
/// never sees those writes. `PC` can be read but not written.
#[allow(missing_docs)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Register {
    Acc,
    Cmp,
    R0,
    R1,
    R2,
    R3,
    R4,
    R5,
    Pc,
    Px,
    Py,
    Dir,
    Hp,
    Ammo,
}

impl Register {
    /// Number of register slots.
    pub const COUNT: usize = 14;

    /// Every register, in slot order.
    pub const ALL: [Register; Register::COUNT] = [
        Register::Acc,
        Register::Cmp,
        Register::R0,
        Register::R1,
        Register::R2,
        Register::R3,
        Register::R4,
        Register::R5,
        Register::Pc,
        Register::Px,
        Register::Py,
        Register::Dir,
        Register::Hp,
        Register::Ammo,
    ];

    /// Slot index into a register file.
    #[must_use]
    pub const fn index(self) -> usize {
        self as usize
    }

    /// Source-level spelling of the register.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Register::Acc => "ACC",
            Register::Cmp => "CMP",
            Register::R0 => "R0",
            Register::R1 => "R1",
            Register::R2 => "R2",
            Register::R3 => "R3",
            Register::R4 => "R4",
            Register::R5 => "R5",
            Register::Pc => "PC",
            Register::Px => "PX",
            Register::Py => "PY",
            Register::Dir => "DIR",
            Register::Hp => "HP",
            Register::Ammo => "AMMO",
        }
    }

    /// Look up a register by name, ignoring case.
    #[must_use]
    pub fn from_name(text: &str) -> Option<Self> {
        Self::ALL
            .iter()
            .copied()
            .find(|reg| reg.name().eq_ignore_ascii_case(text))
    }

    /// Whether programs may name this register as a destination.
    #[must_use]
    pub const fn is_writable(self) -> bool {
        !matches!(self, Register::Pc)
    }

    /// Whether this register mirrors tank state.
    #[must_use]
    pub const fn is_sensor(self) -> bool {
        matches!(
            self,
            Register::Px | Register::Py | Register::Dir | Register::Hp | Register::Ammo
        )
    }
}

impl fmt::Display for Register {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Direction literal for `MOVE`, relative to the tank's facing.
#[allow(missing_docs)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Heading {
    Forward,
    Backward,
}

impl Heading {
    /// Parse a heading literal, ignoring case.
    #[must_use]
    pub fn from_keyword(text: &str) -> Option<Self> {
        if text.eq_ignore_ascii_case("FORWARD") {
            Some(Heading::Forward)
        } else if text.eq_ignore_ascii_case("BACKWARD") {
            Some(Heading::Backward)
        } else {
            None
        }
    }
}

/// Direction literal for `ROTATE`.
#[allow(missing_docs)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Rotation {
    Left,
    Right,
}

impl Rotation {
    /// Parse a rotation literal, ignoring case.
    #[must_use]
    pub fn from_keyword(text: &str) -> Option<Self> {
        if text.eq_ignore_ascii_case("LEFT") {
            Some(Rotation::Left)
        } else if text.eq_ignore_ascii_case("RIGHT") {
            Some(Rotation::Right)
        } else {
            None
        }
    }
}

/// A single instruction operand.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Operand {
    /// A register reference.
    Reg(Register),
    /// An integer literal.
    Imm(i32),
    /// A resolved label address.
    Addr(usize),
    /// A `MOVE` direction.
    Heading(Heading),
    /// A `ROTATE` direction.
    Rotation(Rotation),
}

impl fmt::Display for Operand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operand::Reg(reg) => write!(f, "{reg}"),
            Operand::Imm(value) => write!(f, "{value}"),
            Operand::Addr(addr) => write!(f, "@{addr}"),
            Operand::Heading(Heading::Forward) => f.write_str("FORWARD"),
            Operand::Heading(Heading::Backward) => f.write_str("BACKWARD"),
            Operand::Rotation(Rotation::Left) => f.write_str("LEFT"),
            Operand::Rotation(Rotation::Right) => f.write_str("RIGHT"),
        }
    }
}

/// A parsed instruction. Immutable once produced by the parser.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Instruction {
    /// The operation.
    pub opcode: Opcode,
    /// Operands in source order.
    pub operands: Vec<Operand>,
    /// Source line the instruction came from (0 for synthesized code).
    pub line: usize,
}

impl Instruction {
    /// Create an instruction.
    #[must_use]
    pub fn new(opcode: Opcode, operands: Vec<Operand>, line: usize) -> Self {
        Self {
            opcode,
            operands,
            line,
        }
    }
}

impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.opcode)?;
        for (i, operand) in self.operands.iter().enumerate() {
            let sep = if i == 0 { " " } else { ", " };
            write!(f, "{sep}{operand}")?;
        }
        Ok(())
    }
}

/// A compiled program: instructions plus the label table.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Program {
    instructions: Vec<Instruction>,
    labels: BTreeMap<String, usize>,
}

impl Program {
    /// Build a program from parts.
    ///
    /// No validation happens here; malformed instructions fault at run time.
    #[must_use]
    pub fn new(instructions: Vec<Instruction>, labels: BTreeMap<String, usize>) -> Self {
        Self {
            instructions,
            labels,
        }
    }

    /// Number of instructions.
    #[must_use]
    pub fn len(&self) -> usize {
        self.instructions.len()
    }

    /// Whether the program has no instructions.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.instructions.is_empty()
    }

    /// Instruction at `addr`, if any.
    #[must_use]
    #[inline]
    pub fn get(&self, addr: usize) -> Option<&Instruction> {
        self.instructions.get(addr)
    }

    /// All instructions in address order.
    #[must_use]
    pub fn instructions(&self) -> &[Instruction] {
        &self.instructions
    }

    /// Label table.
    #[must_use]
    pub fn labels(&self) -> &BTreeMap<String, usize> {
        &self.labels
    }

    /// Address of a label.
    #[must_use]
    pub fn label(&self, name: &str) -> Option<usize> {
        self.labels.get(name).copied()
    }

    /// Disassemble into a human-readable listing with label names.
    #[must_use]
    pub fn listing(&self) -> String {
        let mut by_addr: BTreeMap<usize, Vec<&str>> = BTreeMap::new();
        for (name, &addr) in &self.labels {
            by_addr.entry(addr).or_default().push(name);
        }

        let mut out = String::new();
        for addr in 0..=self.instructions.len() {
            if let Some(names) = by_addr.get(&addr) {
                for name in names {
                    out.push_str(name);
                    out.push_str(":\n");
                }
            }
            if let Some(inst) = self.instructions.get(addr) {
                out.push_str(&format!("{addr:4}  {inst}\n"));
            }
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mnemonic_lookup_ignores_case() {
        assert_eq!(Opcode::from_mnemonic("move"), Some(Opcode::Move));
        assert_eq!(Opcode::from_mnemonic("JgE"), Some(Opcode::Jge));
        assert_eq!(Opcode::from_mnemonic("teleport"), None);
    }

    #[test]
    fn test_every_mnemonic_round_trips() {
        for op in Opcode::ALL {
            assert_eq!(Opcode::from_mnemonic(op.mnemonic()), Some(op));
        }
        for reg in Register::ALL {
            assert_eq!(Register::from_name(reg.name()), Some(reg));
            assert_eq!(Register::ALL[reg.index()], reg);
        }
    }

    #[test]
    fn test_register_classes() {
        assert!(!Register::Pc.is_writable());
        assert!(Register::Hp.is_writable());
        assert!(Register::Hp.is_sensor());
        assert!(!Register::Acc.is_sensor());
    }

    #[test]
    fn test_turn_ending_opcodes() {
        assert!(Opcode::Fire.ends_turn());
        assert!(Opcode::Halt.ends_turn());
        assert!(!Opcode::Jmp.ends_turn());
        assert!(!Opcode::Nop.ends_turn());
    }

    #[test]
    fn test_instruction_display() {
        let inst = Instruction::new(
            Opcode::Add,
            vec![Operand::Reg(Register::Acc), Operand::Imm(-2)],
            1,
        );
        assert_eq!(inst.to_string(), "ADD ACC, -2");

        let inst = Instruction::new(Opcode::Jmp, vec![Operand::Addr(4)], 1);
        assert_eq!(inst.to_string(), "JMP @4");
    }

    #[test]
    fn test_listing_shows_labels() {
        let mut labels = BTreeMap::new();
        labels.insert("top".to_string(), 0);
        let program = Program::new(
            vec![
                Instruction::new(Opcode::Fire, vec![], 2),
                Instruction::new(Opcode::Jmp, vec![Operand::Addr(0)], 3),
            ],
            labels,
        );
        let listing = program.listing();
        assert!(listing.starts_with("top:\n"));
        assert!(listing.contains("   1  JMP @0"));
    }
}
