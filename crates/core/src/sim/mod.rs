//! Simulation driver.
//!
//! Everything between source text and a running program:
//! 1. **Loader:** Preprocess, link and assemble into a [`crate::asm::Program`].
//! 2. **Events:** The [`events::EventSink`] seam the interpreter reports through.
//! 3. **Controller:** A thread-safe façade owning one worker per active run.

/// Thread-safe run façade.
pub mod controller;

/// Run events and sinks.
pub mod events;

/// Source to program pipeline.
pub mod loader;

pub use controller::{Command, Controller};
pub use events::{Event, EventSink, NullSink, Recorder};
pub use loader::{assemble, assemble_source};
