//! Interpreter.
//!
//! This module owns the state of one run and drives it one instruction at a time.
//! It provides:
//! 1. **Stepping Protocol:** Offer the current entry to the debugger, capture a change
//!    record, execute, push the record, count the instruction and emit `Step`.
//! 2. **Outcomes:** [`Tick`] tells the driver whether the run paused, is waiting for
//!    input or has ended.
//! 3. **Termination:** Exit syscalls, falling off the text segment, runtime faults and
//!    external stops all converge on a single `End` event.
//! 4. **Debugger Commands:** [`Interpreter::run_command`] applies one parsed prompt command.

/// Instruction dispatch.
pub mod execute;

/// Host files opened by the program.
pub mod files;

/// The syscall layer.
pub mod syscall;

use std::sync::Arc;

use tracing::{debug, trace};

use crate::asm::program::{Program, TextEntry};
use crate::common::constants::{INSTRUCTION_BYTES, USER_LIMIT};
use crate::common::error::{RuntimeError, SimError};
use crate::config::Config;
use crate::core::arch::RegisterFile;
use crate::debug::command::{DebugCommand, USAGE};
use crate::debug::undo::Change;
use crate::debug::{Debugger, ResumeMode};
use crate::isa::abi::{REG_A0, REG_A1, REG_SP};
use crate::sim::events::{Event, EventSink};
use crate::soc::memory::{Memory, Width};
use crate::stats::InstructionStats;

use self::files::FileTable;

/// Result of one [`Interpreter::tick`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Tick {
    /// One instruction executed.
    Executed,
    /// The debugger paused before the current instruction.
    Paused,
    /// A read syscall needs input; nothing changed.
    AwaitingInput,
    /// An exit syscall ended the run with this code.
    Exited(i32),
    /// The run had already ended or fell off the text segment.
    Finished,
}

/// How control leaves an executed instruction.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Flow {
    /// Fall through to `pc + 4`.
    Next,
    /// Continue at the address.
    Jump(u32),
    /// Input is required; the instruction did not execute.
    AwaitInput,
    /// Terminate with the code.
    Exit(i32),
}

/// What the prompt does after a debugger command.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CommandAction {
    /// Keep prompting at the same instruction.
    Stay,
    /// Leave the pause.
    Resume(ResumeMode),
    /// The run was terminated.
    Quit,
}

/// Text and follow-up action of one debugger command.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CommandOutcome {
    /// Text to show at the prompt; may be empty.
    pub output: String,
    /// What happens next.
    pub action: CommandAction,
}

impl CommandOutcome {
    fn stay(output: impl Into<String>) -> Self {
        Self {
            output: output.into(),
            action: CommandAction::Stay,
        }
    }
}

/// State and driver of one run.
pub struct Interpreter {
    program: Arc<Program>,
    regs: RegisterFile,
    mem: Memory,
    debugger: Debugger,
    sink: Box<dyn EventSink>,
    stats: InstructionStats,
    max_instructions: Option<u64>,
    input: Option<String>,
    console: String,
    files: FileTable,
    skip_check: bool,
    ended: bool,
}

impl std::fmt::Debug for Interpreter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Interpreter")
            .field("pc", &self.regs.pc)
            .field("instructions", &self.stats.total)
            .field("ended", &self.ended)
            .finish_non_exhaustive()
    }
}

impl Interpreter {
    /// Loads `program` into fresh memory and registers.
    ///
    /// # Arguments
    ///
    /// * `program` - The assembled program; shared, never mutated.
    /// * `config` - Debugging, filler and instruction-limit settings.
    /// * `sink` - Receiver of step, console, pause and end events.
    pub fn new(program: Arc<Program>, config: &Config, sink: Box<dyn EventSink>) -> Self {
        let regs = RegisterFile::new(program.entry, config.garbage_registers);
        let mem = Memory::with_program(&program, config.garbage_memory);
        let debugger = Debugger::new(config.debug, Arc::clone(&program.paths));
        let files = FileTable::new(program.paths.root_dir());
        debug!(entry = program.entry, debug = config.debug, "run created");
        Self {
            program,
            regs,
            mem,
            debugger,
            sink,
            stats: InstructionStats::default(),
            max_instructions: config.max_instructions,
            input: None,
            console: String::new(),
            files,
            skip_check: false,
            ended: false,
        }
    }

    /// The loaded program.
    pub fn program(&self) -> &Arc<Program> {
        &self.program
    }

    /// Register state.
    pub const fn regs(&self) -> &RegisterFile {
        &self.regs
    }

    /// Register state, mutably.
    pub const fn regs_mut(&mut self) -> &mut RegisterFile {
        &mut self.regs
    }

    /// Memory.
    pub const fn mem(&self) -> &Memory {
        &self.mem
    }

    /// The debugger.
    pub const fn debugger(&self) -> &Debugger {
        &self.debugger
    }

    /// The debugger, mutably.
    pub const fn debugger_mut(&mut self) -> &mut Debugger {
        &mut self.debugger
    }

    /// Execution statistics.
    pub const fn stats(&self) -> &InstructionStats {
        &self.stats
    }

    /// Basic instructions executed, net of step-backs.
    pub const fn instruction_count(&self) -> u64 {
        self.stats.total
    }

    /// Everything the program has printed so far.
    pub fn console(&self) -> &str {
        &self.console
    }

    /// True once `End` has been emitted.
    pub const fn is_ended(&self) -> bool {
        self.ended
    }

    /// True while delivered input is waiting to be consumed.
    pub const fn has_input(&self) -> bool {
        self.input.is_some()
    }

    /// Delivers the text the next read syscall consumes.
    pub fn set_input(&mut self, text: impl Into<String>) {
        self.input = Some(text.into());
    }

    /// The entry the program counter points at.
    pub fn current_entry(&self) -> Option<&TextEntry> {
        self.program.entry_at(self.regs.pc)
    }

    /// Prompt listing of the current instruction, or `None` past the end.
    pub fn describe_current(&self) -> Option<String> {
        self.current_entry().map(TextEntry::describe)
    }

    /// Copies program arguments onto the stack.
    ///
    /// The strings are stored null-terminated below the top of user memory, followed
    /// downwards by a null-terminated `argv` array; `$a0 = argc`, `$a1 = argv` and
    /// `$sp` points at `argv`.
    pub fn set_program_args(&mut self, args: &[String]) {
        if args.is_empty() {
            return;
        }
        let mut cursor = USER_LIMIT;
        let mut pointers = Vec::with_capacity(args.len());
        {
            let mut raw = self.mem.privileged();
            for arg in args.iter().rev() {
                let bytes = arg.as_bytes();
                cursor -= bytes.len() as u32 + 1;
                for (i, &b) in bytes.iter().enumerate() {
                    raw.set_byte(cursor + i as u32, b);
                }
                raw.set_byte(cursor + bytes.len() as u32, 0);
                pointers.push(cursor);
            }
            pointers.reverse();
            pointers.push(0);
            cursor &= !3;
            let argv = cursor - 4 * pointers.len() as u32;
            for (i, &p) in pointers.iter().enumerate() {
                raw.set_bits(argv + 4 * i as u32, Width::Word, u64::from(p));
            }
            cursor = argv;
        }
        self.regs.write(REG_A0, args.len() as i32);
        self.regs.write(REG_A1, cursor as i32);
        self.regs.write(REG_SP, cursor as i32);
        debug!(argc = args.len(), argv = cursor, "program arguments installed");
    }

    /// Leaves a pause; the next tick executes without consulting the debugger.
    pub fn resume(&mut self, mode: ResumeMode) {
        self.debugger.resume(mode);
        self.skip_check = true;
    }

    /// Advances the run by at most one instruction.
    ///
    /// # Returns
    ///
    /// What happened. Runtime faults end the run and come back as
    /// [`SimError::Runtime`] carrying the faulting pc and source tag.
    pub fn tick(&mut self) -> Result<Tick, SimError> {
        if self.ended {
            return Ok(Tick::Finished);
        }
        let pc = self.regs.pc;
        if self.program.is_past_end(pc) {
            debug!(pc, "fell off the text segment");
            self.finish(true);
            return Ok(Tick::Finished);
        }
        let program = Arc::clone(&self.program);
        let Some(entry) = program.entry_at(pc) else {
            return Err(self.fault(pc, RuntimeError::InvalidProgramCounter(pc)));
        };

        if !self.skip_check && self.debugger.should_break(entry) {
            self.skip_check = true;
            self.sink.emit(Event::Paused { pc });
            return Ok(Tick::Paused);
        }

        if let Some(max) = self.max_instructions.filter(|&m| self.stats.total >= m) {
            return Err(self.fault(pc, RuntimeError::InstructionLimit(max)));
        }

        let change = match Change::capture(&entry.instr, pc, &self.regs, &self.mem) {
            Ok(change) => change,
            Err(e) => return Err(self.fault(pc, e)),
        };
        trace!(pc = format_args!("{pc:#010x}"), instr = %entry.instr, "execute");
        let flow = match self.execute(&entry.instr, pc) {
            Ok(flow) => flow,
            Err(e) => return Err(self.fault(pc, e)),
        };
        if flow == Flow::AwaitInput {
            return Ok(Tick::AwaitingInput);
        }

        self.skip_check = false;
        if self.debugger.enabled() {
            self.debugger.undo_mut().push(change);
        }
        self.stats.record(entry.instr.class());
        match flow {
            Flow::Exit(code) => {
                debug!(code, "exit syscall");
                self.finish(true);
                Ok(Tick::Exited(code))
            }
            Flow::Jump(target) => {
                self.regs.pc = target;
                self.sink.emit(Event::Step { pc: target });
                Ok(Tick::Executed)
            }
            Flow::Next | Flow::AwaitInput => {
                self.regs.pc = pc.wrapping_add(INSTRUCTION_BYTES);
                self.sink.emit(Event::Step { pc: self.regs.pc });
                Ok(Tick::Executed)
            }
        }
    }

    /// Executes exactly one instruction, bypassing the pause check.
    pub fn step(&mut self) -> Result<Tick, SimError> {
        self.skip_check = true;
        self.tick()
    }

    /// Ticks until the run pauses, waits for input or ends.
    pub fn run(&mut self) -> Result<Tick, SimError> {
        loop {
            match self.tick()? {
                Tick::Executed => {}
                other => return Ok(other),
            }
        }
    }

    /// Undoes the most recent instruction.
    ///
    /// # Returns
    ///
    /// Whether anything was undone. Either way a `Step` event for the resulting pc
    /// is emitted; an ended run is left alone.
    pub fn step_back(&mut self) -> bool {
        if self.ended {
            return false;
        }
        let Some(change) = self.debugger.undo_mut().pop() else {
            self.sink.emit(Event::Step { pc: self.regs.pc });
            return false;
        };
        change.revert(&mut self.regs, &mut self.mem);
        if let Some(entry) = self.program.entry_at(self.regs.pc) {
            self.stats.unrecord(entry.instr.class());
        }
        debug!(pc = self.regs.pc, "stepped back");
        self.sink.emit(Event::Step { pc: self.regs.pc });
        true
    }

    /// Ends the run; only the first call emits `End`.
    pub fn finish(&mut self, success: bool) {
        if self.ended {
            return;
        }
        self.ended = true;
        self.files.close_all();
        debug!(success, instructions = self.stats.total, "run ended");
        self.sink.emit(Event::End { success });
    }

    /// Terminates the run from outside.
    pub fn stop(&mut self) {
        self.finish(false);
    }

    /// Applies one debugger command.
    pub fn run_command(&mut self, command: &DebugCommand) -> CommandOutcome {
        match command {
            DebugCommand::Break { file, line } => {
                let _ = self.debugger.add_breakpoint(file, *line);
                CommandOutcome::stay("")
            }
            DebugCommand::Next => {
                self.resume(ResumeMode::Step);
                CommandOutcome {
                    output: String::new(),
                    action: CommandAction::Resume(ResumeMode::Step),
                }
            }
            DebugCommand::Continue => {
                self.resume(ResumeMode::Continue);
                CommandOutcome {
                    output: String::new(),
                    action: CommandAction::Resume(ResumeMode::Continue),
                }
            }
            DebugCommand::Info => CommandOutcome::stay(self.debugger.describe_breakpoints()),
            DebugCommand::Delete => {
                self.debugger.clear_breakpoints();
                CommandOutcome::stay("")
            }
            DebugCommand::Print(query) => CommandOutcome::stay(query.render(&self.regs, &self.mem)),
            DebugCommand::Quit => {
                self.stop();
                CommandOutcome {
                    output: String::new(),
                    action: CommandAction::Quit,
                }
            }
            DebugCommand::Reverse => {
                let _ = self.step_back();
                CommandOutcome::stay(self.describe_current().unwrap_or_default())
            }
            DebugCommand::Help => CommandOutcome::stay(USAGE.trim_end()),
        }
    }

    /// Parses and applies one prompt line; malformed lines show the usage banner.
    pub fn run_line(&mut self, line: &str) -> CommandOutcome {
        DebugCommand::parse(line).map_or_else(
            || CommandOutcome::stay(USAGE.trim_end()),
            |command| self.run_command(&command),
        )
    }

    pub(crate) fn print(&mut self, text: String) {
        self.console.push_str(&text);
        self.sink.emit(Event::Console(text));
    }

    pub(crate) fn take_input(&mut self) -> Option<String> {
        self.input.take()
    }

    fn fault(&mut self, pc: u32, error: RuntimeError) -> SimError {
        let tag = self.program.entry_at(pc).map(|e| e.tag.clone());
        debug!(pc, %error, "run faulted");
        let fault = SimError::Runtime { pc, tag, error };
        let (kind, message) = fault.report();
        self.sink.emit(Event::Error { kind, message });
        self.finish(false);
        fault
    }
}
