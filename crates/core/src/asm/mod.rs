//! Source pipeline: from a root `.asm` file to an assembled [`Program`].
//!
//! This module turns source text into an executable program. It includes:
//! 1. **Preprocessing:** Include walk, `.eqv` substitution and provenance tagging.
//! 2. **Linking:** Concatenation of the tagged files in includer order.
//! 3. **Lexing:** Labels, heads and operand classification for one line.
//! 4. **Assembly:** Two passes producing the text segment, data segment and symbols.

/// Two-pass assembler.
pub mod assembler;

/// Directive names and data kinds.
pub mod directive;

/// Statement lexer and literal parsing.
pub mod lexer;

/// Linked line stream.
pub mod linker;

/// Include walk, macro table and line tagging.
pub mod preprocess;

/// Assembled program and symbol table.
pub mod program;

/// Instruction selection and pseudo-instruction expansion.
pub mod pseudo;

pub use assembler::Assembler;
pub use linker::LinkedSource;
pub use preprocess::{Preprocessed, Preprocessor};
pub use program::{Program, SymbolTable, TextEntry};
