//! Unit tests, one module per engine component.

/// Preprocessor, linker and assembler.
pub mod asm;

/// Configuration loading.
pub mod config;

/// Debugger commands, breakpoints and step-back.
pub mod debug;

/// Instruction execution and syscalls.
pub mod interp;

/// Run controller and events.
pub mod sim;

/// Memory model.
pub mod soc;
