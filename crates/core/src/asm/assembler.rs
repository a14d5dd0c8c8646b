//! Two-pass assembler.
//!
//! Turns the linked line stream into a [`Program`]. It performs:
//! 1. **Pass 1 (layout):** Lexes every line, binds labels, sizes instructions and
//!    lays out the data segment. Directive placement and alignment are checked here.
//! 2. **Pass 2 (binding):** Re-expands every instruction with the complete symbol
//!    table, emits the text segment and patches `.word label` values.
//!
//! Every failure carries the [`SourceTag`] of the offending line.

use std::collections::BTreeMap;
use std::sync::Arc;

use tracing::{debug, warn};

use crate::asm::directive::{DataKind, Directive, Section};
use crate::asm::lexer::{
    Operand, Statement, lex, operand, parse_float, parse_int, parse_string, strip_comment,
    strip_label,
};
use crate::asm::linker::LinkedSource;
use crate::asm::preprocess::PathMap;
use crate::asm::program::{
    DataValue, Declaration, Payload, Program, SourceInstruction, SymbolTable, TextEntry,
};
use crate::asm::pseudo::{Sizing, expand};
use crate::common::constants::{DATA_BASE, HEAP_BASE, INSTRUCTION_BYTES, TEXT_BASE, TEXT_LIMIT};
use crate::common::error::{AssembleError, AssembleErrorKind};
use crate::common::tag::SourceTag;
use crate::config::Config;
use crate::isa::instruction::{Instruction, PseudoInstr};

/// An instruction laid out in pass 1, waiting for its labels.
struct Pending {
    address: u32,
    mnemonic: String,
    args: Vec<String>,
    tag: SourceTag,
    source: Arc<str>,
}

/// A `.word` element naming a label.
struct Fixup {
    address: u32,
    name: String,
    offset: i64,
    tag: SourceTag,
}

/// Pass-1 state.
struct Layout<'a> {
    config: &'a Config,
    section: Section,
    text_pc: u32,
    data_pc: u32,
    symbols: SymbolTable,
    labels: Vec<String>,
    pending: Vec<Pending>,
    declarations: Vec<Declaration>,
    data: BTreeMap<u32, u8>,
    fixups: Vec<Fixup>,
}

/// Assembles linked source into a program.
#[derive(Debug)]
pub struct Assembler<'a> {
    config: &'a Config,
}

impl<'a> Assembler<'a> {
    /// Creates an assembler reading settings from `config`.
    pub const fn new(config: &'a Config) -> Self {
        Self { config }
    }

    /// Assembles `linked`.
    ///
    /// # Arguments
    ///
    /// * `linked` - The linked, tagged line stream.
    /// * `paths` - Path map of the files the stream was linked from.
    ///
    /// # Returns
    ///
    /// The program, or the first [`AssembleError`]. Nothing is partially loaded.
    pub fn assemble(
        &self,
        linked: LinkedSource,
        paths: Arc<PathMap>,
    ) -> Result<Program, AssembleError> {
        let mut layout = Layout {
            config: self.config,
            section: Section::Text,
            text_pc: TEXT_BASE,
            data_pc: DATA_BASE,
            symbols: SymbolTable::default(),
            labels: Vec::new(),
            pending: Vec::new(),
            declarations: Vec::new(),
            data: BTreeMap::new(),
            fixups: Vec::new(),
        };
        for line in linked.lines() {
            if line.text.trim().is_empty() {
                continue;
            }
            let stmt = lex(&line.text).map_err(|kind| AssembleError::new(line.tag.clone(), kind))?;
            layout
                .statement(stmt, &line.text, &line.tag)
                .map_err(|kind| AssembleError::new(line.tag.clone(), kind))?;
        }
        let _ = layout.flush_labels().map_err(|kind| {
            let tag = linked
                .lines()
                .last()
                .map_or_else(|| SourceTag::new("", 0), |l| l.tag.clone());
            AssembleError::new(tag, kind)
        })?;
        debug!(
            labels = layout.symbols.len(),
            instructions = layout.pending.len(),
            data_bytes = layout.data.len(),
            "pass 1 finished"
        );
        self.bind(layout, linked, paths)
    }

    /// Pass 2.
    fn bind(
        &self,
        layout: Layout<'_>,
        linked: LinkedSource,
        paths: Arc<PathMap>,
    ) -> Result<Program, AssembleError> {
        let Layout {
            symbols,
            pending,
            declarations,
            mut data,
            fixups,
            ..
        } = layout;

        let mut text = BTreeMap::new();
        let mut instructions = Vec::with_capacity(pending.len());
        for p in pending {
            let e = expand(&p.mnemonic, &p.args, &symbols)
                .map_err(|kind| AssembleError::new(p.tag.clone(), kind))?;
            for (i, instr) in e.instrs.iter().enumerate() {
                let address = p.address + INSTRUCTION_BYTES * i as u32;
                let _ = text.insert(
                    address,
                    TextEntry {
                        address,
                        instr: instr.clone(),
                        tag: p.tag.clone(),
                        source: Arc::clone(&p.source),
                        expanded: e.pseudo,
                        first: i == 0,
                    },
                );
            }
            let instr = if e.pseudo {
                Instruction::Pseudo(PseudoInstr {
                    source: Arc::clone(&p.source),
                    expansion: e.instrs,
                })
            } else {
                e.instrs.into_iter().next().unwrap_or(Instruction::Nop)
            };
            instructions.push(SourceInstruction {
                address: p.address,
                instr,
                tag: p.tag,
            });
        }

        for f in fixups {
            let value = symbols
                .get(&f.name)
                .ok_or_else(|| {
                    AssembleError::new(f.tag.clone(), AssembleErrorKind::UndefinedLabel(f.name.clone()))
                })?
                .wrapping_add(f.offset as u32);
            for (i, b) in value.to_le_bytes().into_iter().enumerate() {
                let _ = data.insert(f.address + i as u32, b);
            }
        }

        let entry = match symbols.get("main") {
            Some(main) if self.config.start_at_main => main,
            _ => TEXT_BASE,
        };
        debug!(text = text.len(), entry, "pass 2 finished");
        Ok(Program {
            text,
            data,
            symbols: Arc::new(symbols),
            declarations,
            instructions,
            paths,
            linked,
            entry,
        })
    }
}

/// Source text of an instruction line: labels and comment removed, trimmed.
fn instruction_text(line: &str) -> Arc<str> {
    let mut rest = strip_comment(line).trim();
    while let Some((_, after)) = strip_label(rest) {
        rest = after.trim_start();
    }
    Arc::from(rest.trim_end())
}

fn wrong(directive: &str, expected: &'static str) -> AssembleErrorKind {
    AssembleErrorKind::WrongOperands {
        mnemonic: directive.to_string(),
        expected,
    }
}

/// Splits a `value:count` repetition.
fn repetition(token: &str) -> Result<(&str, usize), AssembleErrorKind> {
    match token.rsplit_once(':') {
        Some((value, count)) if !count.is_empty() && count.bytes().all(|b| b.is_ascii_digit()) => {
            let n = parse_int(count)?;
            let n = usize::try_from(n)
                .map_err(|_| AssembleErrorKind::MalformedImmediate(count.to_string()))?;
            Ok((value, n))
        }
        _ => Ok((token, 1)),
    }
}

/// Fails unless `count` elements of `width` bytes still fit in the data segment
/// after the `used` bytes already laid out at `address`.
fn reserve(address: u32, used: usize, count: usize, width: u32) -> Result<(), AssembleErrorKind> {
    let room = HEAP_BASE.saturating_sub(address) as usize;
    count
        .checked_mul(width as usize)
        .and_then(|n| n.checked_add(used))
        .filter(|&end| end <= room)
        .map(|_| ())
        .ok_or(AssembleErrorKind::SegmentOverflow(Section::Data))
}

impl Layout<'_> {
    const fn pc(&self) -> u32 {
        match self.section {
            Section::Text => self.text_pc,
            Section::Data => self.data_pc,
        }
    }

    /// Binds labels collected so far at the current address.
    fn flush_labels(&mut self) -> Result<Vec<String>, AssembleErrorKind> {
        let addr = self.pc();
        let labels = std::mem::take(&mut self.labels);
        for name in &labels {
            if !self.symbols.define(name, addr) {
                return Err(AssembleErrorKind::DuplicateLabel(name.clone()));
            }
        }
        Ok(labels)
    }

    fn statement(
        &mut self,
        stmt: Statement,
        text: &str,
        tag: &SourceTag,
    ) -> Result<(), AssembleErrorKind> {
        self.labels.extend(stmt.labels);
        let Some(head) = stmt.head else {
            return Ok(());
        };
        if !head.starts_with('.') {
            return self.instruction(head, stmt.args, text, tag);
        }
        let directive =
            Directive::parse(&head).ok_or_else(|| AssembleErrorKind::UnknownDirective(head.clone()))?;
        match directive {
            Directive::Text | Directive::Data => {
                let _ = self.flush_labels()?;
                let section = if directive == Directive::Text {
                    Section::Text
                } else {
                    Section::Data
                };
                self.section = section;
                match stmt.args.as_slice() {
                    [] => {}
                    [addr] => {
                        let addr = u32::try_from(parse_int(addr)?)
                            .map_err(|_| AssembleErrorKind::MalformedImmediate(addr.clone()))?;
                        match section {
                            Section::Text => self.text_pc = addr,
                            Section::Data => self.data_pc = addr,
                        }
                    }
                    _ => return Err(wrong(&head, "an optional address")),
                }
                Ok(())
            }
            Directive::Align => self.align(&head, &stmt.args),
            Directive::Emit(kind) => self.emit(&head, kind, &stmt.args, tag),
            Directive::Eqv | Directive::Include | Directive::Globl => Ok(()),
        }
    }

    fn instruction(
        &mut self,
        mnemonic: String,
        args: Vec<String>,
        text: &str,
        tag: &SourceTag,
    ) -> Result<(), AssembleErrorKind> {
        if self.section != Section::Text {
            return Err(AssembleErrorKind::WrongSegment(mnemonic, self.section));
        }
        let _ = self.flush_labels()?;
        let size = expand(&mnemonic, &args, &Sizing)?.instrs.len() as u32;
        let address = self.text_pc;
        self.text_pc = address
            .checked_add(size * INSTRUCTION_BYTES)
            .filter(|&end| end <= TEXT_LIMIT)
            .ok_or(AssembleErrorKind::SegmentOverflow(Section::Text))?;
        self.pending.push(Pending {
            address,
            mnemonic,
            args,
            tag: tag.clone(),
            source: instruction_text(text),
        });
        Ok(())
    }

    fn align(&mut self, head: &str, args: &[String]) -> Result<(), AssembleErrorKind> {
        if self.section != Section::Data {
            return Err(AssembleErrorKind::WrongSegment(head.to_string(), self.section));
        }
        let [n] = args else {
            return Err(wrong(head, "an exponent in 0..=3"));
        };
        let n = parse_int(n)?;
        if !(0..=3).contains(&n) {
            return Err(AssembleErrorKind::InvalidAlignment(n));
        }
        let align = 1u32 << n;
        self.data_pc = self.data_pc.next_multiple_of(align);
        let _ = self.flush_labels()?;
        Ok(())
    }

    fn warn_truncated(&self, directive: &str, value: i64, tag: &SourceTag) {
        if self.config.warnings {
            warn!(%tag, directive, value, "value truncated to fit");
        }
    }

    fn emit(
        &mut self,
        head: &str,
        kind: DataKind,
        args: &[String],
        tag: &SourceTag,
    ) -> Result<(), AssembleErrorKind> {
        if self.section != Section::Data {
            return Err(AssembleErrorKind::WrongSegment(head.to_string(), self.section));
        }
        if args.is_empty() {
            return Err(wrong(head, "at least one value"));
        }
        let address = self.data_pc;
        let align = kind.align();
        if address % align != 0 {
            return Err(AssembleErrorKind::MisalignedDirective {
                directive: head.to_string(),
                address,
                align,
            });
        }
        let label = self.flush_labels()?.pop();

        let mut bytes: Vec<Option<u8>> = Vec::new();
        let mut values = Vec::new();
        match kind {
            DataKind::Word | DataKind::Half | DataKind::Byte => {
                for token in args {
                    let (token, count) = repetition(token)?;
                    let value = match parse_int(token) {
                        Ok(v) => DataValue::Int(v),
                        Err(e) => match operand_label(token) {
                            Some((name, offset)) if kind == DataKind::Word => {
                                DataValue::Label { name, offset }
                            }
                            _ => return Err(e),
                        },
                    };
                    reserve(address, bytes.len(), count, kind.align())?;
                    for _ in 0..count {
                        let at = address + bytes.len() as u32;
                        match &value {
                            DataValue::Int(v) => {
                                bytes.extend(self.integer(head, kind, *v, tag)?.into_iter().map(Some));
                            }
                            DataValue::Label { name, offset } => {
                                self.fixups.push(Fixup {
                                    address: at,
                                    name: name.clone(),
                                    offset: *offset,
                                    tag: tag.clone(),
                                });
                                bytes.extend([Some(0); 4]);
                            }
                            DataValue::Float(_) | DataValue::Text(_) => {}
                        }
                    }
                    values.push(value);
                }
            }
            DataKind::Float | DataKind::Double => {
                for token in args {
                    let (token, count) = repetition(token)?;
                    let v = parse_float(token)?;
                    reserve(address, bytes.len(), count, kind.align())?;
                    for _ in 0..count {
                        if kind == DataKind::Float {
                            bytes.extend((v as f32).to_le_bytes().map(Some));
                        } else {
                            bytes.extend(v.to_le_bytes().map(Some));
                        }
                    }
                    values.push(DataValue::Float(v));
                }
            }
            DataKind::Ascii | DataKind::Asciiz => {
                for token in args {
                    let s = parse_string(token)?;
                    bytes.extend(s.chars().map(|c| Some(u8::try_from(u32::from(c)).unwrap_or(b'?'))));
                    if kind == DataKind::Asciiz {
                        bytes.push(Some(0));
                    }
                    values.push(DataValue::Text(s));
                }
            }
            DataKind::Space => {
                let [n] = args else {
                    return Err(wrong(head, "a byte count"));
                };
                let n = parse_int(n)?;
                let n = usize::try_from(n).map_err(|_| AssembleErrorKind::ImmediateOutOfRange {
                    mnemonic: head.to_string(),
                    value: n,
                })?;
                reserve(address, 0, n, 1)?;
                bytes.resize(n, None);
                values.push(DataValue::Int(n as i64));
            }
        }

        let size = bytes.len() as u32;
        self.data_pc = address
            .checked_add(size)
            .filter(|&end| end <= HEAP_BASE)
            .ok_or(AssembleErrorKind::SegmentOverflow(Section::Data))?;
        for (i, b) in bytes.into_iter().enumerate() {
            if let Some(b) = b {
                let _ = self.data.insert(address + i as u32, b);
            }
        }
        let payload = if values.len() == 1 {
            Payload::Scalar(values.remove(0))
        } else {
            Payload::Sequence(values)
        };
        self.declarations.push(Declaration {
            label,
            kind,
            payload,
            address,
            size,
            tag: tag.clone(),
        });
        Ok(())
    }

    /// Little-endian bytes of an integer element.
    fn integer(
        &self,
        head: &str,
        kind: DataKind,
        v: i64,
        tag: &SourceTag,
    ) -> Result<Vec<u8>, AssembleErrorKind> {
        Ok(match kind {
            DataKind::Word => {
                if v < i64::from(i32::MIN) || v > i64::from(u32::MAX) {
                    return Err(AssembleErrorKind::ImmediateOutOfRange {
                        mnemonic: head.to_string(),
                        value: v,
                    });
                }
                (v as u32).to_le_bytes().to_vec()
            }
            DataKind::Half => {
                if v < i64::from(i16::MIN) || v > i64::from(u16::MAX) {
                    self.warn_truncated(head, v, tag);
                }
                (v as u16).to_le_bytes().to_vec()
            }
            _ => {
                if v < i64::from(i8::MIN) || v > i64::from(u8::MAX) {
                    self.warn_truncated(head, v, tag);
                }
                vec![v as u8]
            }
        })
    }
}

/// `label`, `label+N` or `label-N` in a `.word` list.
fn operand_label(token: &str) -> Option<(String, i64)> {
    match operand(token) {
        Ok(Operand::Label { name, offset }) => Some((name, offset)),
        _ => None,
    }
}
