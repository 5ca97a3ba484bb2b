//! Register-machine interpreter for tank programs.

pub mod cpu;
mod execute;
pub mod registers;

pub use cpu::{Cpu, HaltReason, OP_LIMIT_REASON, StepResult};
pub use registers::RegisterFile;
