//! Shared test infrastructure.

/// Assembly and execution harness.
pub mod harness;

/// Mock collaborators.
pub mod mocks;
