//! Error taxonomy.
//!
//! This module defines the failures the engine can report. It provides:
//! 1. **Preprocessing Errors:** Include-graph and macro failures that abort before code generation.
//! 2. **Assembly Errors:** Operand, label and directive failures, each tagged with file and line.
//! 3. **Runtime Errors:** Faults raised while executing an instruction; they end only the current run.
//! 4. **Boundary Errors:** [`SimError`], which collapses all of the above into a `(kind, message)` pair.

use std::fmt;
use std::path::PathBuf;

use thiserror::Error;

use super::tag::SourceTag;
use crate::asm::directive::Section;
use crate::config::ConfigError;

/// Token class an `.eqv` name is not allowed to shadow.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Reserved {
    /// A register name such as `$t0`, `t0` or `$f2`.
    Register,
    /// An assembler directive such as `.word`.
    Directive,
    /// An instruction or pseudo-instruction mnemonic.
    Mnemonic,
}

impl fmt::Display for Reserved {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Register => "register",
            Self::Directive => "directive",
            Self::Mnemonic => "mnemonic",
        })
    }
}

/// Failure while walking the include graph or collecting `.eqv` macros.
#[derive(Debug, Error)]
pub enum PreprocessError {
    /// A file was reached again while it was still being included.
    #[error("cyclic include of {}: {}", .path.display(), .chain.join(" -> "))]
    CyclicInclude {
        /// Canonical path of the revisited file.
        path: PathBuf,
        /// Display names along the include path, ending with the revisit.
        chain: Vec<String>,
    },

    /// An included (or the root) file could not be read.
    #[error("file not found: {}", .path.display())]
    MissingFile {
        /// Path as resolved from the directive.
        path: PathBuf,
        /// Underlying I/O failure.
        #[source]
        source: std::io::Error,
    },

    /// An `.eqv` name collides with a register, directive or mnemonic.
    #[error("{tag}: `{name}` is a {reserved} and cannot be redefined with .eqv")]
    RestrictedMacro {
        /// The offending macro name.
        name: String,
        /// Which token class it shadows.
        reserved: Reserved,
        /// Where the `.eqv` appeared.
        tag: SourceTag,
    },

    /// An `.include` or `.eqv` line does not have the expected operand shape.
    #[error("{tag}: malformed {directive} directive")]
    MalformedDirective {
        /// The directive name.
        directive: &'static str,
        /// Where it appeared.
        tag: SourceTag,
    },
}

impl PreprocessError {
    /// Short machine-readable name of the failure.
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::CyclicInclude { .. } => "CyclicInclude",
            Self::MissingFile { .. } => "MissingFile",
            Self::RestrictedMacro { .. } => "RestrictedMacro",
            Self::MalformedDirective { .. } => "MalformedDirective",
        }
    }
}

/// Cause of an [`AssembleError`].
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum AssembleErrorKind {
    /// Operand is not a register name of the expected file.
    #[error("invalid register `{0}`")]
    BadRegister(String),
    /// Operand could not be parsed as an integer or float literal.
    #[error("malformed immediate `{0}`")]
    MalformedImmediate(String),
    /// Immediate does not fit the field of a basic instruction.
    #[error("immediate {value} is out of range for `{mnemonic}`")]
    ImmediateOutOfRange {
        /// Instruction mnemonic.
        mnemonic: String,
        /// Offending value.
        value: i64,
    },
    /// Reference to a label that is never defined.
    #[error("undefined label `{0}`")]
    UndefinedLabel(String),
    /// Second definition of a label.
    #[error("label `{0}` is already defined")]
    DuplicateLabel(String),
    /// Label name is not a valid identifier.
    #[error("malformed label `{0}`")]
    BadLabel(String),
    /// Data directive placed at an address not aligned to its element width.
    #[error("{directive} at {address:#010x} is not aligned to {align} bytes (use .align)")]
    MisalignedDirective {
        /// Directive name.
        directive: String,
        /// Address where the first element would land.
        address: u32,
        /// Required alignment.
        align: u32,
    },
    /// `.align` argument outside `0..=3`.
    #[error(".align expects a power of two exponent in 0..=3, got {0}")]
    InvalidAlignment(i64),
    /// Mnemonic is neither a basic nor a pseudo-instruction.
    #[error("unknown instruction `{0}`")]
    UnknownInstruction(String),
    /// Directive name is not recognized.
    #[error("unknown directive `{0}`")]
    UnknownDirective(String),
    /// Operands do not match any accepted shape of the mnemonic.
    #[error("`{mnemonic}` expects {expected}")]
    WrongOperands {
        /// Instruction or directive name.
        mnemonic: String,
        /// Human-readable accepted shape.
        expected: &'static str,
    },
    /// String literal is unterminated or has a bad escape.
    #[error("malformed string literal")]
    MalformedString,
    /// Directive or instruction used in the wrong section.
    #[error("`{0}` is not allowed in the {1} segment")]
    WrongSegment(String, Section),
    /// Layout ran past the end of a segment.
    #[error("{0} segment overflow")]
    SegmentOverflow(Section),
}

/// Assembly failure with the source line that caused it.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
#[error("{tag}: {kind}")]
pub struct AssembleError {
    /// Origin of the failing line.
    pub tag: SourceTag,
    /// What went wrong.
    pub kind: AssembleErrorKind,
}

impl AssembleError {
    /// Attaches `tag` to `kind`.
    pub const fn new(tag: SourceTag, kind: AssembleErrorKind) -> Self {
        Self { tag, kind }
    }
}

/// Fault raised while executing an instruction.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum RuntimeError {
    /// Access not aligned to its natural width.
    #[error("misaligned {width}-byte access at {addr:#010x}")]
    MisalignedAccess {
        /// Faulting address.
        addr: u32,
        /// Access width in bytes.
        width: u32,
    },
    /// Access outside every user-accessible segment.
    #[error("address {0:#010x} is out of range")]
    AddressOutOfRange(u32),
    /// Register name unknown, or an odd register used as a double.
    #[error("invalid register `{0}`")]
    InvalidRegister(String),
    /// Signed overflow in `add`, `addi` or `sub`.
    #[error("arithmetic overflow")]
    ArithmeticOverflow,
    /// Integer division by zero.
    #[error("division by zero")]
    DivideByZero,
    /// Program counter points at no instruction.
    #[error("no instruction at {0:#010x}")]
    InvalidProgramCounter(u32),
    /// Unknown syscall selector in `$v0`.
    #[error("invalid syscall {0}")]
    InvalidSyscall(i32),
    /// Input delivered to a read syscall could not be parsed.
    #[error("invalid input `{0}`")]
    InvalidInput(String),
    /// Configured instruction budget exhausted.
    #[error("instruction limit of {0} reached")]
    InstructionLimit(u64),
}

impl RuntimeError {
    /// Short machine-readable name of the fault.
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::MisalignedAccess { .. } => "MisalignedAccess",
            Self::AddressOutOfRange(_) => "AddressOutOfRange",
            Self::InvalidRegister(_) => "InvalidRegister",
            Self::ArithmeticOverflow => "ArithmeticOverflow",
            Self::DivideByZero => "DivideByZero",
            Self::InvalidProgramCounter(_) => "InvalidProgramCounter",
            Self::InvalidSyscall(_) => "InvalidSyscall",
            Self::InvalidInput(_) => "InvalidInput",
            Self::InstructionLimit(_) => "InstructionLimit",
        }
    }
}

/// Boundary error surfaced to the console or any other consumer.
#[derive(Debug, Error)]
pub enum SimError {
    /// Include/macro stage failed.
    #[error(transparent)]
    Preprocess(#[from] PreprocessError),
    /// Assembly failed; nothing was loaded.
    #[error(transparent)]
    Assemble(#[from] AssembleError),
    /// The current run faulted; the program stays loaded.
    #[error("{}", runtime_message(.pc, .tag.as_ref(), .error))]
    Runtime {
        /// Address of the faulting instruction.
        pc: u32,
        /// Source of the faulting instruction, if it exists.
        tag: Option<SourceTag>,
        /// The fault.
        #[source]
        error: RuntimeError,
    },
    /// Configuration could not be loaded.
    #[error(transparent)]
    Config(#[from] ConfigError),
}

fn runtime_message(pc: &u32, tag: Option<&SourceTag>, error: &RuntimeError) -> String {
    match tag {
        Some(tag) => format!("{tag} (pc {pc:#010x}): {error}"),
        None => format!("pc {pc:#010x}: {error}"),
    }
}

impl SimError {
    /// Short machine-readable name, e.g. `MisalignedAccess` or `UndefinedLabel`.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Preprocess(e) => e.kind(),
            Self::Assemble(e) => match e.kind {
                AssembleErrorKind::BadRegister(_) => "BadRegister",
                AssembleErrorKind::MalformedImmediate(_) => "MalformedImmediate",
                AssembleErrorKind::ImmediateOutOfRange { .. } => "ImmediateOutOfRange",
                AssembleErrorKind::UndefinedLabel(_) => "UndefinedLabel",
                AssembleErrorKind::DuplicateLabel(_) => "DuplicateLabel",
                AssembleErrorKind::BadLabel(_) => "BadLabel",
                AssembleErrorKind::MisalignedDirective { .. }
                | AssembleErrorKind::InvalidAlignment(_) => "MisalignedDirective",
                AssembleErrorKind::UnknownInstruction(_) => "UnknownInstruction",
                AssembleErrorKind::UnknownDirective(_) => "UnknownDirective",
                AssembleErrorKind::WrongOperands { .. } => "WrongOperands",
                AssembleErrorKind::MalformedString => "MalformedString",
                AssembleErrorKind::WrongSegment(..) => "WrongSegment",
                AssembleErrorKind::SegmentOverflow(_) => "SegmentOverflow",
            },
            Self::Runtime { error, .. } => error.kind(),
            Self::Config(_) => "ConfigError",
        }
    }

    /// Human-readable description, suitable for the console.
    pub fn message(&self) -> String {
        self.to_string()
    }

    /// The `(kind, message)` pair shown to users.
    pub fn report(&self) -> (&'static str, String) {
        (self.kind(), self.message())
    }

    /// Returns the runtime fault, if this is one.
    pub const fn runtime(&self) -> Option<&RuntimeError> {
        match self {
            Self::Runtime { error, .. } => Some(error),
            _ => None,
        }
    }
}
