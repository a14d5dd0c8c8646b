//! Configuration system for the engine.
//!
//! This module defines every setting that changes how a program is assembled
//! or run. It provides:
//! 1. **Defaults:** Baseline behavior when a setting is not supplied.
//! 2. **Structure:** A single [`Config`] value, built once and passed by reference into the
//!    preprocessor, assembler, interpreter and debugger.
//! 3. **Loading:** Deserialization from JSON (`Config::from_json`), or `Config::default()` for the CLI.

use serde::Deserialize;
use thiserror::Error;

/// Configuration could not be parsed.
#[derive(Debug, Error)]
#[error("invalid configuration: {0}")]
pub struct ConfigError(#[from] pub serde_json::Error);

/// Engine settings.
///
/// Every field has a default, so a partial JSON object is accepted.
///
/// # Examples
///
/// ```
/// use mipsim_core::config::Config;
///
/// let json = r#"{ "debug": true, "garbage_memory": true, "max_instructions": 5000 }"#;
/// let config = Config::from_json(json).unwrap();
/// assert!(config.debug);
/// assert!(config.garbage_memory);
/// assert!(!config.garbage_registers);
/// assert_eq!(config.max_instructions, Some(5000));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// Enable interactive debugging: breakpoints pause, and without the continue flag every
    /// instruction pauses.
    #[serde(default)]
    pub debug: bool,

    /// Uninitialized memory reads back as deterministic non-zero filler instead of zero.
    #[serde(default)]
    pub garbage_memory: bool,

    /// Registers other than `$zero`, `$gp`, `$sp` start with deterministic filler instead of zero.
    #[serde(default)]
    pub garbage_registers: bool,

    /// Log assembler and preprocessor warnings (macro redefinition, truncated data values).
    #[serde(default)]
    pub warnings: bool,

    /// Print the executed instruction count when a run ends.
    #[serde(default)]
    pub show_instruction_count: bool,

    /// Fail the run once this many instructions have executed.
    #[serde(default)]
    pub max_instructions: Option<u64>,

    /// Start execution at the `main` label instead of the first text address.
    #[serde(default)]
    pub start_at_main: bool,
}

impl Config {
    /// Parses a JSON object into a configuration.
    ///
    /// # Arguments
    ///
    /// * `json` - JSON text; unknown keys are rejected, missing keys take their defaults.
    ///
    /// # Returns
    ///
    /// The parsed configuration, or a [`ConfigError`] describing the malformed input.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            debug: false,
            garbage_memory: false,
            garbage_registers: false,
            warnings: false,
            show_instruction_count: false,
            max_instructions: None,
            start_at_main: false,
        }
    }
}
