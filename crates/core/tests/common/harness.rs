//! Test harness.
//!
//! `TestContext` assembles a source string inside a temporary directory and
//! runs it against a recording event sink.

use std::path::Path;
use std::sync::Arc;

use mipsim_core::asm::Program;
use mipsim_core::common::SimError;
use mipsim_core::config::Config;
use mipsim_core::core::interp::{Interpreter, Tick};
use mipsim_core::debug::ResumeMode;
use mipsim_core::isa::abi::parse_gpr;
use mipsim_core::sim::events::{Event, Recorder};
use mipsim_core::sim::loader;
use tempfile::TempDir;

/// Installs a test-friendly tracing subscriber once per process.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// Assembles `src` as `main.asm` in a fresh directory.
pub fn assemble(src: &str) -> Result<Program, SimError> {
    assemble_with(src, &Config::default())
}

/// Assembles `src` with `config`.
pub fn assemble_with(src: &str, config: &Config) -> Result<Program, SimError> {
    init_tracing();
    let dir = tempfile::tempdir().unwrap();
    loader::assemble_source("main.asm", src, dir.path(), config)
}

/// Writes `(name, contents)` pairs under `dir`.
pub fn write_files(dir: &Path, files: &[(&str, &str)]) {
    for (name, contents) in files {
        let path = dir.join(name);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).unwrap();
        }
        std::fs::write(path, contents).unwrap();
    }
}

/// Execution context for a single program.
#[derive(Debug)]
pub struct TestContext {
    /// The run under test.
    pub interp: Interpreter,
    /// Every event the run has emitted.
    pub events: Recorder,
    dir: TempDir,
}

impl TestContext {
    /// Assembles and loads `src` with the default configuration.
    pub fn new(src: &str) -> Self {
        Self::with_config(src, Config::default())
    }

    /// Assembles and loads `src` with debugging enabled.
    pub fn debug(src: &str) -> Self {
        Self::with_config(
            src,
            Config {
                debug: true,
                ..Config::default()
            },
        )
    }

    /// Assembles and loads `src` with `config`.
    pub fn with_config(src: &str, config: Config) -> Self {
        init_tracing();
        let dir = tempfile::tempdir().unwrap();
        let program = loader::assemble_source("main.asm", src, dir.path(), &config)
            .unwrap_or_else(|e| panic!("assembly failed: {e}"));
        let events = Recorder::new();
        let interp = Interpreter::new(Arc::new(program), &config, Box::new(events.clone()));
        Self {
            interp,
            events,
            dir,
        }
    }

    /// Runs until the program ends, continuing through every pause.
    pub fn run_to_end(&mut self) -> Result<Tick, SimError> {
        loop {
            match self.interp.run()? {
                Tick::Paused => self.interp.resume(ResumeMode::Continue),
                other => return Ok(other),
            }
        }
    }

    /// Executes exactly `n` instructions.
    pub fn step_n(&mut self, n: usize) {
        for _ in 0..n {
            assert_eq!(self.interp.step().unwrap(), Tick::Executed, "step should execute");
        }
    }

    /// Value of the register named `name`.
    pub fn reg(&self, name: &str) -> i32 {
        let idx = parse_gpr(name).unwrap_or_else(|| panic!("unknown register {name}"));
        self.interp.regs().read(idx)
    }

    /// Directory the program was assembled in; relative file names resolve here.
    pub fn dir(&self) -> &Path {
        self.dir.path()
    }

    /// Everything the program printed.
    pub fn console(&self) -> String {
        self.events.console()
    }

    /// `End` events received so far.
    pub fn ends(&self) -> Vec<bool> {
        self.events
            .events()
            .into_iter()
            .filter_map(|e| match e {
                Event::End { success } => Some(success),
                _ => None,
            })
            .collect()
    }
}
