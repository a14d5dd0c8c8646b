//! Program Loader.
//!
//! This module turns source into a runnable [`Program`]. It performs:
//! 1. **Preprocessing:** Walks the include graph and applies `.eqv` macros.
//! 2. **Linking:** Concatenates the tagged lines in includer order.
//! 3. **Assembly:** Runs both assembler passes over the linked stream.
//!
//! Any stage failing returns its error wrapped in [`SimError`]; nothing is loaded.

use std::path::Path;
use std::sync::Arc;

use tracing::debug;

use crate::asm::{Assembler, LinkedSource, Preprocessed, Preprocessor, Program};
use crate::common::error::SimError;
use crate::config::Config;

/// Assembles the file at `root` and everything it includes.
///
/// # Arguments
///
/// * `root` - Path of the main source file.
/// * `config` - Warning and entry-point settings.
///
/// # Returns
///
/// The assembled program, or the first preprocessing or assembly error.
pub fn assemble(root: &Path, config: &Config) -> Result<Program, SimError> {
    let pre = Preprocessor::new(config).run(root)?;
    build(pre, config)
}

/// Assembles in-memory source named `name`, resolving includes against `dir`.
pub fn assemble_source(
    name: &str,
    text: &str,
    dir: &Path,
    config: &Config,
) -> Result<Program, SimError> {
    let pre = Preprocessor::new(config).run_source(name, text, dir)?;
    build(pre, config)
}

fn build(pre: Preprocessed, config: &Config) -> Result<Program, SimError> {
    debug!(files = pre.files.len(), macros = pre.eqv.len(), "preprocessed");
    let linked = LinkedSource::link(&pre);
    let program = Assembler::new(config).assemble(linked, Arc::new(pre.paths))?;
    debug!(
        instructions = program.text.len(),
        symbols = program.symbols.len(),
        entry = program.entry,
        "assembled"
    );
    Ok(program)
}
