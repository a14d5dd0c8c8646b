/// Threaded run controller.
pub mod controller;

/// Event delivery to sinks.
pub mod events;
