//! Assembler directives.
//!
//! Names the directives the assembler understands, the segment each belongs
//! to, and the element width and alignment of the data directives.

use std::fmt;

/// Segment the assembler is currently laying out.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Section {
    /// Instructions, from `0x0040_0000`.
    Text,
    /// Declarations, from `0x1001_0000`.
    Data,
}

impl fmt::Display for Section {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Text => "text",
            Self::Data => "data",
        })
    }
}

/// Kind of a data declaration.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum DataKind {
    /// 32-bit integers or label addresses.
    Word,
    /// 8-bit integers.
    Byte,
    /// 16-bit integers.
    Half,
    /// Singles.
    Float,
    /// Doubles.
    Double,
    /// Strings without terminator.
    Ascii,
    /// Null-terminated strings.
    Asciiz,
    /// Reserved, never-written bytes.
    Space,
}

impl DataKind {
    /// Bytes per element, which is also the required alignment.
    pub const fn align(self) -> u32 {
        match self {
            Self::Word | Self::Float => 4,
            Self::Half => 2,
            Self::Double => 8,
            Self::Byte | Self::Ascii | Self::Asciiz | Self::Space => 1,
        }
    }
}

/// A recognized directive.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Directive {
    /// `.text`.
    Text,
    /// `.data`.
    Data,
    /// A data-emitting directive.
    Emit(DataKind),
    /// `.align n`.
    Align,
    /// `.eqv NAME VALUE`, consumed by the preprocessor.
    Eqv,
    /// `.include "file"`, consumed by the preprocessor.
    Include,
    /// `.globl label`, accepted and ignored.
    Globl,
}

/// Every directive name, with its leading dot.
pub const DIRECTIVES: [&str; 15] = [
    ".text", ".data", ".word", ".byte", ".half", ".float", ".double", ".ascii", ".asciiz",
    ".space", ".align", ".eqv", ".include", ".globl", ".global",
];

impl Directive {
    /// Looks up a directive by its dotted name.
    pub fn parse(name: &str) -> Option<Self> {
        Some(match name {
            ".text" => Self::Text,
            ".data" => Self::Data,
            ".word" => Self::Emit(DataKind::Word),
            ".byte" => Self::Emit(DataKind::Byte),
            ".half" => Self::Emit(DataKind::Half),
            ".float" => Self::Emit(DataKind::Float),
            ".double" => Self::Emit(DataKind::Double),
            ".ascii" => Self::Emit(DataKind::Ascii),
            ".asciiz" => Self::Emit(DataKind::Asciiz),
            ".space" => Self::Emit(DataKind::Space),
            ".align" => Self::Align,
            ".eqv" => Self::Eqv,
            ".include" => Self::Include,
            ".globl" | ".global" => Self::Globl,
            _ => return None,
        })
    }
}
