/// Program arguments on the stack.
pub mod args;

/// Integer execution, control flow and runtime faults.
pub mod execute;

/// Floating-point edge cases.
pub mod float;

/// Console, input, heap and file syscalls.
pub mod syscalls;
