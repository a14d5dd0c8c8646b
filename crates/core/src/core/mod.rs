//! Processor model.
//!
//! This module contains the register state, the arithmetic units and the
//! interpreter that executes assembled programs against them.

/// Architectural state (register files, `hi`/`lo`, condition flags).
pub mod arch;

/// The fetch/dispatch/execute interpreter and its syscall layer.
pub mod interp;

/// Execution units (ALU, FPU).
pub mod units;

pub use self::interp::Interpreter;
