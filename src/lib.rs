// Allow unwrap and unreadable literals in tests (test code is not production)
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::unreadable_literal))]
//! tankasm: a deterministic two-tank arena driven by a tiny assembly language.
//!
//! Each tank runs its own program on a small register machine. Programs are
//! stepped one instruction at a time until they request a turn-ending action;
//! once both tanks have one, the battle manager resolves the turn.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────┐
//! │        Tournament Runner            │
//! ├─────────────────────────────────────┤
//! │   Battle Manager (turn resolver)    │
//! ├─────────────────────────────────────┤
//! │     CPU (register interpreter)      │
//! ├─────────────────────────────────────┤
//! │   Assembler (tokenizer + parser)    │
//! └─────────────────────────────────────┘
//! ```
//!
//! # Example
//!
//! ```
//! use tankasm::game::{BattleConfig, BattleManager, GameOutcome, DrawReason};
//!
//! let mut battle = BattleManager::new(BattleConfig::default());
//! battle.load_code("HALT", "HALT").unwrap();
//! battle.run_until_ready(1);
//! battle.run_until_ready(2);
//! battle.resolve_turn().unwrap();
//! assert_eq!(
//!     battle.outcome(),
//!     Some(GameOutcome::Draw { reason: DrawReason::Stalemate })
//! );
//! ```

pub mod error;
pub mod game;
pub mod isa;
pub mod tournament;
pub mod vm;

pub use error::{ArenaError, CompileError, CompileErrorKind, Fault, LoadError, TurnError, VmResult};

// Re-export key types at crate root for convenience
pub use game::{BattleConfig, BattleManager, BattleState, Coord, GameOutcome, Level, TankId};
pub use isa::{compile, Program};
pub use vm::{Cpu, StepResult};
