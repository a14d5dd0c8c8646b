//! MIPS assembler and interpreter CLI.
//!
//! This binary assembles a program and runs it on the console. It performs:
//! 1. **Configuration:** Optional JSON config overlaid with command-line flags.
//! 2. **Assembly:** Preprocess, link and assemble; `--dump-linked` prints the tagged stream.
//! 3. **Execution:** Runs the program with console I/O, delivering stdin lines to read syscalls.
//! 4. **Debugging:** With `-d`, pauses at every instruction or breakpoint and reads prompt
//!    commands from stdin.

use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::sync::Arc;
use std::{fs, process};

use clap::Parser;
use tracing::debug;
use tracing_subscriber::EnvFilter;

use mipsim_core::config::Config;
use mipsim_core::core::interp::{CommandAction, Interpreter, Tick};
use mipsim_core::sim::events::{Event, EventSink};
use mipsim_core::sim::loader;

#[derive(Parser, Debug)]
#[command(
    name = "mipsim",
    author,
    version,
    about = "MIPS assembler, interpreter and reversible debugger",
    long_about = "Assemble and run a MIPS program.\n\nExamples:\n  mipsim hello.asm\n  mipsim -d sort.asm\n  mipsim main.asm --pa first second\n  mipsim -a --dump-linked main.asm"
)]
struct Cli {
    /// Main source file.
    file: PathBuf,

    /// Enable the interactive debugger.
    #[arg(short, long)]
    debug: bool,

    /// Assemble only; do not run.
    #[arg(short, long)]
    assemble_only: bool,

    /// Fill uninitialized memory with deterministic garbage.
    #[arg(short, long)]
    garbage_memory: bool,

    /// Fill registers with deterministic garbage.
    #[arg(long)]
    garbage_registers: bool,

    /// Print instruction statistics when the run ends.
    #[arg(short, long)]
    instruction_count: bool,

    /// Log assembler warnings.
    #[arg(short, long)]
    warnings: bool,

    /// Fail the run after this many instructions.
    #[arg(short = 'n', long)]
    max_instructions: Option<u64>,

    /// Start at the `main` label.
    #[arg(long)]
    start_at_main: bool,

    /// Print the linked, tagged source.
    #[arg(long)]
    dump_linked: bool,

    /// JSON configuration file; flags override it.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Program arguments, passed in `$a0`/`$a1`.
    #[arg(long = "pa", num_args = 1.., allow_hyphen_values = true)]
    program_args: Vec<String>,
}

/// Writes program output straight to stdout.
struct ConsoleSink;

impl EventSink for ConsoleSink {
    fn emit(&mut self, event: Event) {
        if let Event::Console(text) = event {
            let mut out = io::stdout().lock();
            let _ = out.write_all(text.as_bytes());
            let _ = out.flush();
        }
    }
}

fn fail(kind: &str, message: &str) -> ! {
    eprintln!("[!] {kind}: {message}");
    process::exit(1);
}

fn load_config(cli: &Cli) -> Config {
    let mut config = match &cli.config {
        Some(path) => {
            let text = fs::read_to_string(path)
                .unwrap_or_else(|e| fail("ConfigError", &format!("{}: {e}", path.display())));
            Config::from_json(&text).unwrap_or_else(|e| fail("ConfigError", &e.to_string()))
        }
        None => Config::default(),
    };
    config.debug |= cli.debug;
    config.garbage_memory |= cli.garbage_memory;
    config.garbage_registers |= cli.garbage_registers;
    config.warnings |= cli.warnings;
    config.show_instruction_count |= cli.instruction_count;
    config.start_at_main |= cli.start_at_main;
    if cli.max_instructions.is_some() {
        config.max_instructions = cli.max_instructions;
    }
    config
}

/// Reads one line from stdin, or `None` at end of input.
fn read_line(stdin: &mut impl BufRead) -> Option<String> {
    let mut line = String::new();
    match stdin.read_line(&mut line) {
        Ok(0) | Err(_) => None,
        Ok(_) => Some(line),
    }
}

/// Prompts until a command leaves the pause. Returns false when the run was quit.
fn prompt(interp: &mut Interpreter, stdin: &mut impl BufRead) -> bool {
    if let Some(listing) = interp.describe_current() {
        println!("{listing}");
    }
    loop {
        print!(">");
        let _ = io::stdout().flush();
        let Some(line) = read_line(stdin) else {
            interp.stop();
            return false;
        };
        let outcome = interp.run_line(&line);
        if !outcome.output.is_empty() {
            println!("{}", outcome.output);
        }
        match outcome.action {
            CommandAction::Stay => {}
            CommandAction::Resume(_) => return true,
            CommandAction::Quit => return false,
        }
    }
}

fn report(interp: &Interpreter, config: &Config) {
    if config.show_instruction_count {
        eprint!("{}", interp.stats().report());
    }
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();
    let config = load_config(&cli);

    let program = loader::assemble(&cli.file, &config).unwrap_or_else(|e| {
        let (kind, message) = e.report();
        fail(kind, &message)
    });
    if cli.dump_linked {
        print!("{}", program.linked.tagged_text());
    }
    if cli.assemble_only {
        debug!(instructions = program.text.len(), "assembled only");
        return;
    }

    let mut interp = Interpreter::new(Arc::new(program), &config, Box::new(ConsoleSink));
    interp.set_program_args(&cli.program_args);
    let mut stdin = io::stdin().lock();

    let code = loop {
        match interp.run() {
            Ok(Tick::Paused) => {
                if !prompt(&mut interp, &mut stdin) {
                    break 0;
                }
            }
            Ok(Tick::AwaitingInput) => match read_line(&mut stdin) {
                Some(line) => interp.set_input(line),
                None => {
                    interp.stop();
                    report(&interp, &config);
                    fail("InvalidInput", "end of input while a read syscall was pending");
                }
            },
            Ok(Tick::Exited(code)) => break code,
            Ok(Tick::Finished | Tick::Executed) => break 0,
            Err(e) => {
                report(&interp, &config);
                let (kind, message) = e.report();
                fail(kind, &message);
            }
        }
    };
    report(&interp, &config);
    process::exit(code);
}
