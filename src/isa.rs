//! Tank assembly: tokenizer, parser and instruction definitions.

mod instruction;
mod lexer;
mod parser;

pub use instruction::{Heading, Instruction, Opcode, Operand, Program, Register, Rotation};
pub use lexer::{tokenize, Token, TokenKind};
pub use parser::parse;

use crate::error::CompileError;

/// Tokenize and parse source text in one call.
///
/// # Errors
///
/// Returns the first compile error, annotated with its source line.
pub fn compile(source: &str) -> Result<Program, CompileError> {
    parse(&tokenize(source))
}
