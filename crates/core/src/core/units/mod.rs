//! Execution units.
//!
//! Pure integer and floating-point arithmetic used by the interpreter. Neither
//! unit touches registers or memory; the interpreter reads operands, calls in
//! and writes the result.

/// Arithmetic Logic Unit for integer operations.
pub mod alu;

/// Floating-Point Unit for IEEE 754 operations.
pub mod fpu;
