/// Breakpoints and the pause protocol.
pub mod breakpoints;

/// Prompt grammar and command effects.
pub mod commands;

/// Step-back restores prior state exactly.
pub mod reverse;
