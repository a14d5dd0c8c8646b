//! Assembled program.
//!
//! The immutable output of the assembler: the text segment (address to basic
//! instruction), the initialized bytes of the data segment, the symbol table, the
//! data declarations, and the path map and linked source the program was built from.

use std::collections::BTreeMap;
use std::sync::Arc;

use crate::asm::directive::DataKind;
use crate::asm::linker::LinkedSource;
use crate::asm::preprocess::PathMap;
use crate::common::constants::{INSTRUCTION_BYTES, TEXT_BASE, TEXT_LIMIT};
use crate::common::tag::SourceTag;
use crate::isa::instruction::Instruction;

/// Label name to absolute address.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SymbolTable {
    map: BTreeMap<String, u32>,
}

impl SymbolTable {
    /// Binds `name` to `addr`.
    ///
    /// # Returns
    ///
    /// `false`, leaving the table unchanged, if `name` is already bound.
    pub fn define(&mut self, name: &str, addr: u32) -> bool {
        if self.map.contains_key(name) {
            return false;
        }
        let _ = self.map.insert(name.to_string(), addr);
        true
    }

    /// Address of `name`.
    pub fn get(&self, name: &str) -> Option<u32> {
        self.map.get(name).copied()
    }

    /// Labels in name order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, u32)> {
        self.map.iter().map(|(k, &v)| (k.as_str(), v))
    }

    /// Number of labels.
    pub fn len(&self) -> usize {
        self.map.len()
    }

    /// True when no label is defined.
    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }
}

/// One basic instruction in the text segment.
#[derive(Clone, Debug, PartialEq)]
pub struct TextEntry {
    /// Address of the instruction.
    pub address: u32,
    /// The basic instruction.
    pub instr: Instruction,
    /// Source line it was assembled from.
    pub tag: SourceTag,
    /// Source text of that line, labels and comments removed.
    pub source: Arc<str>,
    /// True when this is the pseudo-instruction expansion of `source`.
    pub expanded: bool,
    /// True for the first instruction emitted for its source line.
    pub first: bool,
}

impl TextEntry {
    /// Console description: the source text, the basic instruction when it differs,
    /// and the tag.
    pub fn describe(&self) -> String {
        if self.expanded {
            format!("{} ( {} )  {}", self.source, self.instr, self.tag)
        } else {
            format!("{}  {}", self.source, self.tag)
        }
    }
}

/// A scalar in a data declaration.
#[derive(Clone, Debug, PartialEq)]
pub enum DataValue {
    /// Integer literal.
    Int(i64),
    /// Float literal.
    Float(f64),
    /// Label address plus displacement.
    Label {
        /// Referenced label.
        name: String,
        /// Constant displacement.
        offset: i64,
    },
    /// String literal, escapes decoded.
    Text(String),
}

/// Declaration payload.
#[derive(Clone, Debug, PartialEq)]
pub enum Payload {
    /// A single element.
    Scalar(DataValue),
    /// Several elements, in order.
    Sequence(Vec<DataValue>),
}

/// One data directive as declared.
#[derive(Clone, Debug, PartialEq)]
pub struct Declaration {
    /// Label on the declaration, if any.
    pub label: Option<String>,
    /// Directive kind.
    pub kind: DataKind,
    /// Elements.
    pub payload: Payload,
    /// Address of the first byte.
    pub address: u32,
    /// Size in bytes.
    pub size: u32,
    /// Source line.
    pub tag: SourceTag,
}

/// An instruction as written in the source: a basic instruction or a pseudo-instruction.
#[derive(Clone, Debug, PartialEq)]
pub struct SourceInstruction {
    /// Address of its first basic instruction.
    pub address: u32,
    /// The instruction; [`Instruction::Pseudo`] for expanded lines.
    pub instr: Instruction,
    /// Source line.
    pub tag: SourceTag,
}

/// A fully assembled and linked program.
#[derive(Clone, Debug)]
pub struct Program {
    /// Address to basic instruction; built once, never mutated during execution.
    pub text: BTreeMap<u32, TextEntry>,
    /// Initialized data bytes.
    pub data: BTreeMap<u32, u8>,
    /// Labels of both segments.
    pub symbols: Arc<SymbolTable>,
    /// Data declarations in source order.
    pub declarations: Vec<Declaration>,
    /// Instructions in source order, pseudo-instructions unexpanded.
    pub instructions: Vec<SourceInstruction>,
    /// Canonical paths and display names of the source files.
    pub paths: Arc<PathMap>,
    /// The linked source.
    pub linked: LinkedSource,
    /// Address of the first instruction to execute.
    pub entry: u32,
}

impl Program {
    /// Text entry at `addr`.
    pub fn entry_at(&self, addr: u32) -> Option<&TextEntry> {
        self.text.get(&addr)
    }

    /// First address past the last instruction.
    pub fn text_end(&self) -> u32 {
        self.text
            .keys()
            .next_back()
            .map_or(TEXT_BASE, |&a| a + INSTRUCTION_BYTES)
    }

    /// True if execution reaching `pc` has run off the end of the program: `pc` lies
    /// in the text segment at or beyond [`Program::text_end`].
    pub fn is_past_end(&self, pc: u32) -> bool {
        pc >= self.text_end() && pc < TEXT_LIMIT
    }
}
