//! Instruction Set Architecture (ISA) Definitions.
//!
//! Contains the closed instruction type produced by the assembler and executed by
//! the interpreter, the register naming conventions and the canonical text form.
//!
//! # Modules
//!
//! * `abi`: Register names and the indices the syscall ABI relies on.
//! * `instruction`: The [`instruction::Instruction`] sum type and its operation families.
//! * `disasm`: Canonical basic-instruction text.

/// Application Binary Interface (ABI) register name mappings.
pub mod abi;

/// Instruction disassembler for the debugger and diagnostics.
pub mod disasm;

/// Instruction representation.
pub mod instruction;
