//! Run Controller.
//!
//! This module is the thread-safe façade consumers use to drive a program. It provides:
//! 1. **Worker:** One thread per active run owns all mutation and holds the interpreter
//!    lock for exactly one instruction at a time.
//! 2. **Commands:** Resume, pause, step, reverse, input and stop travel over an
//!    `mpsc` channel; the worker blocks on it while paused or awaiting input.
//! 3. **Queries:** Memory, registers, flags, labels, instruction count and console text,
//!    each returning `None` when no run is installed.
//! 4. **Breakpoints:** Kept on the controller and installed into each run before its
//!    worker starts, so the first instructions cannot slip past them.

use std::collections::BTreeSet;
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::thread::{self, JoinHandle};

use tracing::{debug, warn};

use crate::asm::Program;
use crate::config::Config;
use crate::core::arch::RegisterFile;
use crate::core::interp::{Interpreter, Tick};
use crate::debug::ResumeMode;
use crate::sim::events::EventSink;

/// Request sent from a consumer to the worker.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Command {
    /// Run until a breakpoint.
    Resume,
    /// Pause before the next instruction.
    Pause,
    /// Execute one instruction, then pause.
    Step,
    /// Undo the most recent instruction.
    Reverse,
    /// Deliver text to a pending or future read syscall.
    Input(String),
    /// Terminate the run.
    Stop,
}

type Shared = Arc<Mutex<Interpreter>>;
type LastError = Arc<Mutex<Option<(&'static str, String)>>>;

fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(PoisonError::into_inner)
}

#[derive(Debug)]
struct Run {
    interp: Shared,
    commands: Sender<Command>,
    worker: Option<JoinHandle<()>>,
    error: LastError,
}

/// Owner of the active run.
#[derive(Debug)]
pub struct Controller {
    config: Config,
    breakpoints: BTreeSet<(String, usize)>,
    run: Option<Run>,
}

/// What the worker does after handling a command.
enum Next {
    Run,
    Wait,
    Exit,
}

fn handle(interp: &Shared, command: Command, paused: bool) -> Next {
    let mut it = lock(interp);
    match command {
        Command::Resume => {
            it.resume(ResumeMode::Continue);
            Next::Run
        }
        Command::Step => {
            it.resume(ResumeMode::Step);
            Next::Run
        }
        Command::Pause => {
            it.debugger_mut().resume(ResumeMode::Step);
            if paused { Next::Wait } else { Next::Run }
        }
        Command::Reverse => {
            let _ = it.step_back();
            if paused { Next::Wait } else { Next::Run }
        }
        Command::Input(text) => {
            it.set_input(text);
            if paused { Next::Wait } else { Next::Run }
        }
        Command::Stop => {
            it.stop();
            Next::Exit
        }
    }
}

fn worker(interp: &Shared, commands: &Receiver<Command>, error: &LastError) {
    let mut paused = false;
    loop {
        while let Ok(command) = commands.try_recv() {
            match handle(interp, command, paused) {
                Next::Exit => return,
                Next::Run => paused = false,
                Next::Wait => {}
            }
        }
        if paused {
            let Ok(command) = commands.recv() else {
                lock(interp).stop();
                return;
            };
            match handle(interp, command, paused) {
                Next::Exit => return,
                Next::Run => paused = false,
                Next::Wait => {}
            }
            continue;
        }

        let tick = lock(interp).tick();
        match tick {
            Ok(Tick::Executed) => {}
            Ok(Tick::Paused) => paused = true,
            Ok(Tick::AwaitingInput) => {
                let Ok(command) = commands.recv() else {
                    lock(interp).stop();
                    return;
                };
                if let Next::Exit = handle(interp, command, paused) {
                    return;
                }
            }
            Ok(Tick::Exited(_) | Tick::Finished) => return,
            Err(e) => {
                warn!(kind = e.kind(), "run failed: {e}");
                *lock(error) = Some(e.report());
                return;
            }
        }
    }
}

impl Controller {
    /// Creates a controller with no run installed. Debugging is always enabled for
    /// controlled runs so breakpoints and step-back work.
    pub fn new(mut config: Config) -> Self {
        config.debug = true;
        Self {
            config,
            breakpoints: BTreeSet::new(),
            run: None,
        }
    }

    /// Installs `program` and starts running it until the first breakpoint.
    ///
    /// Any active run is stopped first.
    pub fn start(&mut self, program: Arc<Program>, sink: Box<dyn EventSink>) {
        self.stop();
        let mut interp = Interpreter::new(program, &self.config, sink);
        interp.debugger_mut().resume(ResumeMode::Continue);
        self.install(interp);
    }

    /// Installs `program` paused before its first instruction.
    pub fn start_paused(&mut self, program: Arc<Program>, sink: Box<dyn EventSink>) {
        self.stop();
        self.install(Interpreter::new(program, &self.config, sink));
    }

    fn install(&mut self, mut interp: Interpreter) {
        for (file, line) in &self.breakpoints {
            let _ = interp.debugger_mut().add_breakpoint(file, *line);
        }
        let interp = Arc::new(Mutex::new(interp));
        let error = LastError::default();
        let (commands, rx) = mpsc::channel();
        let shared = Arc::clone(&interp);
        let errors = Arc::clone(&error);
        let handle = thread::spawn(move || worker(&shared, &rx, &errors));
        debug!("run started");
        self.run = Some(Run {
            interp,
            commands,
            worker: Some(handle),
            error,
        });
    }

    fn send(&self, command: Command) -> bool {
        self.run
            .as_ref()
            .is_some_and(|run| run.commands.send(command).is_ok())
    }

    /// Pauses (`true`) or resumes (`false`) the run. Returns false without a live run.
    pub fn pause(&self, pause: bool) -> bool {
        self.send(if pause { Command::Pause } else { Command::Resume })
    }

    /// Executes one instruction, then pauses.
    pub fn step(&self) -> bool {
        self.send(Command::Step)
    }

    /// Undoes the most recent instruction.
    pub fn reverse(&self) -> bool {
        self.send(Command::Reverse)
    }

    /// Delivers input to a read syscall.
    pub fn set_input(&self, text: impl Into<String>) -> bool {
        self.send(Command::Input(text.into()))
    }

    /// Stops and discards the active run, joining its worker.
    pub fn stop(&mut self) {
        if let Some(mut run) = self.run.take() {
            let _ = run.commands.send(Command::Stop);
            if let Some(handle) = run.worker.take() {
                if handle.join().is_err() {
                    warn!("run worker panicked");
                }
            }
            lock(&run.interp).stop();
            debug!("run stopped");
        }
    }

    /// Blocks until the worker exits on its own (end of program or fault).
    ///
    /// The run stays installed so its final state can still be read.
    pub fn wait(&mut self) {
        if let Some(handle) = self.run.as_mut().and_then(|run| run.worker.take()) {
            if handle.join().is_err() {
                warn!("run worker panicked");
            }
        }
    }

    /// True while a worker thread is alive.
    pub fn is_running(&self) -> bool {
        self.run
            .as_ref()
            .and_then(|run| run.worker.as_ref())
            .is_some_and(|h| !h.is_finished())
    }

    fn with<T>(&self, f: impl FnOnce(&mut Interpreter) -> T) -> Option<T> {
        self.run.as_ref().map(|run| f(&mut lock(&run.interp)))
    }

    /// Registers a breakpoint for the active run and every later one.
    ///
    /// # Returns
    ///
    /// Whether the controller did not already hold it.
    pub fn add_breakpoint(&mut self, file: &str, line: usize) -> bool {
        let _ = self.with(|it| it.debugger_mut().add_breakpoint(file, line));
        self.breakpoints.insert((file.to_string(), line))
    }

    /// Removes a breakpoint from the active run and later ones; returns whether it
    /// was held.
    pub fn remove_breakpoint(&mut self, file: &str, line: usize) -> bool {
        let _ = self.with(|it| it.debugger_mut().remove_breakpoint(file, line));
        self.breakpoints.remove(&(file.to_string(), line))
    }

    /// Byte at `address`, sign- or zero-extended.
    pub fn get_byte(&self, address: u32, signed: bool) -> Option<i32> {
        self.with(|it| {
            it.mem()
                .get_byte(address)
                .ok()
                .map(|b| if signed { i32::from(b) } else { i32::from(b as u8) })
        })
        .flatten()
    }

    /// Word at `address`, as signed or unsigned.
    pub fn get_word(&self, address: u32, signed: bool) -> Option<i64> {
        self.with(|it| {
            it.mem()
                .get_word(address)
                .ok()
                .map(|w| if signed { i64::from(w) } else { i64::from(w as u32) })
        })
        .flatten()
    }

    /// Snapshot of the register file.
    pub fn registers(&self) -> Option<RegisterFile> {
        self.with(|it| it.regs().clone())
    }

    /// Current program counter.
    pub fn pc(&self) -> Option<u32> {
        self.with(|it| it.regs().pc)
    }

    /// The eight condition flags.
    pub fn flags(&self) -> Option<[bool; 8]> {
        self.with(|it| it.regs().flags())
    }

    /// Label table, sorted by name.
    pub fn get_labels(&self) -> Option<Vec<(String, u32)>> {
        self.with(|it| {
            it.program()
                .symbols
                .iter()
                .map(|(name, addr)| (name.to_string(), addr))
                .collect()
        })
    }

    /// Basic instructions executed, net of step-backs.
    pub fn get_instruction_count(&self) -> Option<u64> {
        self.with(|it| it.instruction_count())
    }

    /// Everything the program has printed.
    pub fn console(&self) -> Option<String> {
        self.with(|it| it.console().to_string())
    }

    /// `(kind, message)` of the fault that ended the run, if any.
    pub fn last_error(&self) -> Option<(&'static str, String)> {
        self.run.as_ref().and_then(|run| lock(&run.error).clone())
    }
}

impl Drop for Controller {
    fn drop(&mut self) {
        self.stop();
    }
}
