//! Mock implementations of the engine's seams.

use mipsim_core::sim::events::{Event, EventSink};
use mockall::mock;

mock! {
    /// Event sink double; set expectations on `emit`.
    pub Sink {}

    impl EventSink for Sink {
        fn emit(&mut self, event: Event);
    }
}
