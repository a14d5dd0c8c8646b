//! MIPS teaching assembler and interpreter library.
//!
//! This crate assembles and runs MIPS32 programs with a reversible debugger:
//! 1. **Assembly:** Include/macro preprocessing, linking with source provenance, and a
//!    two-pass assembler with canonical pseudo-instruction expansion.
//! 2. **Core:** Register file, integer and floating-point units, and the interpreter with
//!    its syscall layer.
//! 3. **Memory:** Segmented little-endian memory, heap and the MMIO terminal.
//! 4. **Debugging:** Breakpoints, the prompt command grammar and exact step-back.
//! 5. **Simulation:** Program loading, run events, the threaded controller and statistics.

/// Preprocessor, linker, assembler and program representation.
pub mod asm;
/// Common types and constants (memory map, errors, source tags).
pub mod common;
/// Run configuration.
pub mod config;
/// Register state, execution units and the interpreter.
pub mod core;
/// Debugger state machine, undo log and command grammar.
pub mod debug;
/// Instruction set (instruction type, ABI names, canonical text).
pub mod isa;
/// Loader, events and the run controller.
pub mod sim;
/// Memory and the MMIO terminal.
pub mod soc;
/// Instruction-count statistics.
pub mod stats;

/// Run configuration; use `Config::default()` or deserialize from JSON.
pub use crate::config::Config;
/// The interpreter driving one run.
pub use crate::core::Interpreter;
/// Boundary error type.
pub use crate::common::SimError;
/// Assembled program.
pub use crate::asm::Program;
