//! The per-CPU register file.

use serde::Serialize;

use crate::isa::Register;

/// Fixed register slots, one `i32` each.
///
/// `PC` lives in its own slot but can only be changed through
/// [`RegisterFile::set_pc`]; writes through [`RegisterFile::set`] are ignored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct RegisterFile {
    values: [i32; Register::COUNT],
}

impl RegisterFile {
    /// Create a register file with every slot zeroed.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Read a register.
    #[inline]
    #[must_use]
    pub fn get(&self, reg: Register) -> i32 {
        self.values[reg.index()]
    }

    /// Write a register. Writes to `PC` are ignored.
    #[inline]
    pub fn set(&mut self, reg: Register, value: i32) {
        if reg != Register::Pc {
            self.values[reg.index()] = value;
        }
    }

    /// Current program counter.
    #[inline]
    #[must_use]
    pub fn pc(&self) -> usize {
        usize::try_from(self.values[Register::Pc.index()]).unwrap_or(0)
    }

    /// Move the program counter.
    #[inline]
    pub fn set_pc(&mut self, addr: usize) {
        self.values[Register::Pc.index()] = i32::try_from(addr).unwrap_or(i32::MAX);
    }

    /// Every register paired with its value, in slot order.
    pub fn iter(&self) -> impl Iterator<Item = (Register, i32)> + '_ {
        Register::ALL.iter().map(|&reg| (reg, self.get(reg)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pc_ignores_plain_writes() {
        let mut regs = RegisterFile::new();

        regs.set(Register::Pc, 99);
        assert_eq!(regs.get(Register::Pc), 0);

        regs.set_pc(7);
        assert_eq!(regs.pc(), 7);
        assert_eq!(regs.get(Register::Pc), 7);
    }

    #[test]
    fn test_all_writable_registers() {
        let mut regs = RegisterFile::new();

        for (i, reg) in Register::ALL.iter().enumerate() {
            regs.set(*reg, i32::try_from(i).unwrap() * 10 - 50);
        }

        for (reg, value) in regs.iter() {
            if reg == Register::Pc {
                assert_eq!(value, 0);
            } else {
                assert_eq!(value, i32::try_from(reg.index()).unwrap() * 10 - 50);
            }
        }
    }
}
