//! Run events and the sink trait that receives them.
//!
//! The interpreter reports progress through an [`EventSink`] instead of calling
//! into any user interface. It provides:
//! 1. **Events:** Step, console output, pause, fault and end notifications.
//! 2. **Sinks:** A channel sender for cross-thread delivery, a recorder for inspection
//!    and a sink that drops everything.
//!
//! Implementors must be `Send` so a run can move onto its worker thread.

use std::sync::mpsc::Sender;
use std::sync::{Arc, Mutex, PoisonError};

/// Notification emitted by a run.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Event {
    /// The current instruction changed; `pc` is the new current instruction.
    Step {
        /// Address of the next instruction to execute.
        pc: u32,
    },
    /// Text written by the program to standard output or error.
    Console(String),
    /// Execution paused before the instruction at `pc`.
    Paused {
        /// Address of the instruction about to execute.
        pc: u32,
    },
    /// A runtime fault, emitted just before the `End` it causes.
    Error {
        /// Fault name, e.g. `DivideByZero`.
        kind: &'static str,
        /// Message with the source tag and pc of the faulting instruction.
        message: String,
    },
    /// The run ended. Emitted exactly once.
    End {
        /// True for exit syscalls and falling off the text segment.
        success: bool,
    },
}

/// Receiver of run events.
pub trait EventSink: Send {
    /// Delivers one event.
    fn emit(&mut self, event: Event);
}

impl EventSink for Sender<Event> {
    fn emit(&mut self, event: Event) {
        // A dropped receiver only means nobody is listening any more.
        let _ = self.send(event);
    }
}

/// Sink that discards every event.
#[derive(Clone, Copy, Debug, Default)]
pub struct NullSink;

impl EventSink for NullSink {
    fn emit(&mut self, _event: Event) {}
}

/// Sink that stores events; clones share the same buffer.
#[derive(Clone, Debug, Default)]
pub struct Recorder {
    events: Arc<Mutex<Vec<Event>>>,
}

impl Recorder {
    /// Creates an empty recorder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Events received so far.
    pub fn events(&self) -> Vec<Event> {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Concatenation of every console event.
    pub fn console(&self) -> String {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                Event::Console(text) => Some(text),
                _ => None,
            })
            .collect()
    }

    /// Removes and returns the events received so far.
    pub fn drain(&self) -> Vec<Event> {
        std::mem::take(&mut *self.events.lock().unwrap_or_else(PoisonError::into_inner))
    }
}

impl EventSink for Recorder {
    fn emit(&mut self, event: Event) {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(event);
    }
}
