//! Common utilities and types used throughout the engine.
//!
//! This module provides the building blocks shared by every stage. It includes:
//! 1. **Constants:** The fixed memory map and machine sizes.
//! 2. **Error Handling:** The preprocessing, assembly and runtime error taxonomy.
//! 3. **Provenance:** Source tags attached to every assembled unit.

/// Memory map and machine-size constants.
pub mod constants;

/// Error types for every stage.
pub mod error;

/// Source provenance tags.
pub mod tag;

pub use error::{AssembleError, AssembleErrorKind, PreprocessError, Reserved, RuntimeError, SimError};
pub use tag::SourceTag;
