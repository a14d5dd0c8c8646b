//! Debugger.
//!
//! This module decides when execution pauses and how it steps backwards. It provides:
//! 1. **State Machine:** Running, single-stepping, paused at a breakpoint, continuing.
//! 2. **Breakpoints:** `(file, line)` pairs normalized to display names at registration
//!    and matched only against the first instruction emitted for a source line.
//! 3. **Undo Log:** One [`undo::Change`] per executed instruction, popped by step-back.
//! 4. **Commands:** The prompt grammar in [`command`].

/// Prompt command grammar and `print` rendering.
pub mod command;

/// Change records and the undo log.
pub mod undo;

use std::collections::BTreeSet;
use std::sync::Arc;

use tracing::debug;

use crate::asm::preprocess::PathMap;
use crate::asm::program::TextEntry;
use crate::common::tag::SourceTag;

use self::undo::UndoLog;

/// Where the debugger currently is.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DebugState {
    /// Debugging disabled; nothing pauses.
    Running,
    /// Every instruction pauses.
    Stepping,
    /// Stopped on a breakpoint.
    Paused,
    /// Running until the next breakpoint.
    Continuing,
}

/// How execution leaves a pause.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ResumeMode {
    /// Execute one instruction, then pause again.
    Step,
    /// Run until a breakpoint.
    Continue,
}

/// Pause decisions, breakpoints and the undo log of one run.
#[derive(Clone, Debug)]
pub struct Debugger {
    enabled: bool,
    state: DebugState,
    continue_flag: bool,
    breakpoints: BTreeSet<(Arc<str>, usize)>,
    undo: UndoLog,
    paths: Arc<PathMap>,
}

impl Debugger {
    /// Creates a debugger for a program whose files are described by `paths`.
    ///
    /// # Arguments
    ///
    /// * `enabled` - When false, [`Debugger::should_break`] never pauses.
    /// * `paths` - Used to normalize breakpoint file names.
    pub fn new(enabled: bool, paths: Arc<PathMap>) -> Self {
        Self {
            enabled,
            state: if enabled {
                DebugState::Stepping
            } else {
                DebugState::Running
            },
            continue_flag: false,
            breakpoints: BTreeSet::new(),
            undo: UndoLog::default(),
            paths,
        }
    }

    /// True when pauses are enabled.
    pub const fn enabled(&self) -> bool {
        self.enabled
    }

    /// Enables or disables pausing.
    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
        if !enabled {
            self.state = DebugState::Running;
        }
    }

    /// Current state.
    pub const fn state(&self) -> DebugState {
        self.state
    }

    /// True once `continue` was issued and no breakpoint has been hit since.
    pub const fn continuing(&self) -> bool {
        self.continue_flag
    }

    /// Registers a breakpoint.
    ///
    /// # Returns
    ///
    /// The normalized `(file, line)` pair, and whether it was new.
    pub fn add_breakpoint(&mut self, file: &str, line: usize) -> ((Arc<str>, usize), bool) {
        let key = (self.paths.normalize(file), line);
        let added = self.breakpoints.insert(key.clone());
        debug!(file = %key.0, line, added, "breakpoint set");
        (key, added)
    }

    /// Removes a breakpoint; returns whether it existed.
    pub fn remove_breakpoint(&mut self, file: &str, line: usize) -> bool {
        self.breakpoints.remove(&(self.paths.normalize(file), line))
    }

    /// Removes every breakpoint.
    pub fn clear_breakpoints(&mut self) {
        self.breakpoints.clear();
    }

    /// Breakpoints in file, then line order.
    pub fn breakpoints(&self) -> impl Iterator<Item = &(Arc<str>, usize)> {
        self.breakpoints.iter()
    }

    /// True if a breakpoint is set on the line `tag` names.
    pub fn is_breakpoint(&self, tag: &SourceTag) -> bool {
        self.breakpoints.contains(&(Arc::clone(&tag.file), tag.line))
    }

    /// Decides whether to pause before executing `entry`.
    ///
    /// A breakpoint matches only the first instruction of its source line; a match
    /// pauses and cancels `continue`. Otherwise every instruction pauses unless
    /// `continue` is active.
    pub fn should_break(&mut self, entry: &TextEntry) -> bool {
        if !self.enabled {
            return false;
        }
        if entry.first && self.is_breakpoint(&entry.tag) {
            self.state = DebugState::Paused;
            self.continue_flag = false;
            return true;
        }
        if self.continue_flag {
            return false;
        }
        self.state = DebugState::Stepping;
        true
    }

    /// Leaves a pause.
    pub fn resume(&mut self, mode: ResumeMode) {
        match mode {
            ResumeMode::Step => {
                self.continue_flag = false;
                self.state = DebugState::Stepping;
            }
            ResumeMode::Continue => {
                self.continue_flag = true;
                self.state = DebugState::Continuing;
            }
        }
    }

    /// The undo log.
    pub const fn undo(&self) -> &UndoLog {
        &self.undo
    }

    /// The undo log, mutably.
    pub const fn undo_mut(&mut self) -> &mut UndoLog {
        &mut self.undo
    }

    /// Listing for the `info` command: `index file line` per breakpoint.
    pub fn describe_breakpoints(&self) -> String {
        self.breakpoints
            .iter()
            .enumerate()
            .map(|(i, (file, line))| format!("{} \"{file}\" {line}", i + 1))
            .collect::<Vec<_>>()
            .join("\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::isa::instruction::Instruction;

    fn entry(line: usize, first: bool) -> TextEntry {
        TextEntry {
            address: 0x0040_0000,
            instr: Instruction::Nop,
            tag: SourceTag::new("main.asm", line),
            source: Arc::from("nop"),
            expanded: false,
            first,
        }
    }

    #[test]
    fn disabled_never_breaks() {
        let mut dbg = Debugger::new(false, Arc::default());
        let _ = dbg.add_breakpoint("main.asm", 3);
        assert!(!dbg.should_break(&entry(3, true)));
    }

    #[test]
    fn continue_runs_to_breakpoint() {
        let mut dbg = Debugger::new(true, Arc::default());
        let _ = dbg.add_breakpoint("\"main.asm\"", 3);
        assert!(dbg.should_break(&entry(1, true)), "stepping pauses everywhere");
        dbg.resume(ResumeMode::Continue);
        assert!(!dbg.should_break(&entry(2, true)));
        assert!(!dbg.should_break(&entry(3, false)), "only the first instruction matches");
        assert!(dbg.should_break(&entry(3, true)));
        assert_eq!(dbg.state(), DebugState::Paused);
        assert!(!dbg.continuing());
    }
}
