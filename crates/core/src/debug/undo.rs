//! Change records and the undo log.
//!
//! Before an instruction mutates anything, the interpreter captures a [`Change`]
//! holding the prior value of everything the instruction is about to write. Popping
//! and reverting records in LIFO order walks execution backwards exactly. There is
//! no redo.

use crate::common::error::RuntimeError;
use crate::core::arch::RegisterFile;
use crate::isa::abi::{REG_A0, REG_A1, REG_A2, REG_RA, REG_V0};
use crate::isa::instruction::{CvtFmt, Fmt, HiLoMove, Instruction, MemOp};
use crate::soc::memory::{MAX_STRING_LEN, Memory, Width};

/// Prior state overwritten by a syscall.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SyscallChange {
    /// Address of the `syscall`.
    pub pc: u32,
    /// Integer registers the call may write.
    pub regs: Vec<(usize, i32)>,
    /// Float registers the call may write, as raw bits.
    pub fregs: Vec<(usize, u32)>,
    /// Buffer bytes the call may write; `None` for never-written bytes.
    pub bytes: Vec<(u32, Option<u8>)>,
    /// Heap break before the call.
    pub heap_top: u32,
}

/// Prior state overwritten by one executed instruction.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Change {
    /// An integer register.
    Register {
        /// Register index.
        reg: usize,
        /// Value before the instruction.
        prior: i32,
        /// Address of the instruction.
        pc: u32,
    },
    /// A float register, as raw bits.
    FloatRegister {
        /// Register index.
        reg: usize,
        /// Bits before the instruction.
        prior: u32,
        /// Address of the instruction.
        pc: u32,
    },
    /// An even/odd float register pair, as raw bits.
    DoubleRegister {
        /// Even register index.
        reg: usize,
        /// Bits before the instruction.
        prior: u64,
        /// Address of the instruction.
        pc: u32,
    },
    /// A store.
    Memory {
        /// First byte written.
        addr: u32,
        /// Access width.
        width: Width,
        /// Little-endian bytes before the store.
        prior: u64,
        /// Bit `i` set when byte `addr + i` had been written before.
        present: u8,
        /// Address of the instruction.
        pc: u32,
    },
    /// A condition flag.
    Flag {
        /// Flag index.
        flag: usize,
        /// Value before the instruction.
        prior: bool,
        /// Address of the instruction.
        pc: u32,
    },
    /// Both halves of the multiply/divide result.
    HiLo {
        /// `hi` before the instruction.
        hi: i32,
        /// `lo` before the instruction.
        lo: i32,
        /// Address of the instruction.
        pc: u32,
    },
    /// Only the program counter moved.
    Control {
        /// Address of the instruction.
        pc: u32,
    },
    /// A syscall.
    Syscall(Box<SyscallChange>),
}

fn float_dest(fmt: Fmt, reg: usize, pc: u32, regs: &RegisterFile) -> Result<Change, RuntimeError> {
    Ok(match fmt {
        Fmt::Single => Change::FloatRegister {
            reg,
            prior: regs.fpr.read_bits(reg),
            pc,
        },
        Fmt::Double => Change::DoubleRegister {
            reg,
            prior: regs.fpr.get_double_bits(reg)?,
            pc,
        },
    })
}

fn snapshot(mem: &Memory, addr: u32, len: i32) -> Vec<(u32, Option<u8>)> {
    let len = usize::try_from(len).unwrap_or(0).min(MAX_STRING_LEN) as u32;
    (0..len)
        .map(|i| addr.wrapping_add(i))
        .map(|a| (a, mem.is_initialized(a).then(|| mem.peek(a))))
        .collect()
}

impl Change {
    /// Captures what `instr`, about to execute at `pc`, will overwrite.
    ///
    /// # Returns
    ///
    /// The record, or [`RuntimeError::InvalidRegister`] when a double operand
    /// names an odd register (the instruction would fail the same way).
    pub fn capture(
        instr: &Instruction,
        pc: u32,
        regs: &RegisterFile,
        mem: &Memory,
    ) -> Result<Self, RuntimeError> {
        let reg = |reg: usize| Self::Register {
            reg,
            prior: regs.read(reg),
            pc,
        };
        Ok(match instr {
            Instruction::Reg { rd, .. }
            | Instruction::Count { rd, .. }
            | Instruction::MoveOnFlag { rd, .. } => reg(*rd),
            Instruction::Imm { rt, .. } | Instruction::Lui { rt, .. } => reg(*rt),
            Instruction::HiLo { .. }
            | Instruction::HiLoMove {
                op: HiLoMove::Mthi | HiLoMove::Mtlo,
                ..
            } => Self::HiLo {
                hi: regs.hi,
                lo: regs.lo,
                pc,
            },
            Instruction::HiLoMove { reg: r, .. } => reg(*r),
            Instruction::Jump { link: true, .. } => reg(REG_RA),
            Instruction::JumpReg { link: Some(r), .. } => reg(*r),
            Instruction::Branch { op, .. } if op.links() => reg(REG_RA),
            Instruction::Jump { .. }
            | Instruction::JumpReg { .. }
            | Instruction::Branch { .. }
            | Instruction::BranchFlag { .. }
            | Instruction::Nop
            | Instruction::Break { .. }
            | Instruction::Pseudo(_) => Self::Control { pc },
            Instruction::FloatArith { fmt, fd, .. }
            | Instruction::FloatUnary { fmt, fd, .. }
            | Instruction::FloatMoveCond { fmt, fd, .. }
            | Instruction::FloatMoveOnFlag { fmt, fd, .. } => float_dest(*fmt, *fd, pc, regs)?,
            Instruction::FloatToWord { fd, .. } => float_dest(Fmt::Single, *fd, pc, regs)?,
            Instruction::Convert { to, fd, .. } => {
                let fmt = if *to == CvtFmt::D { Fmt::Double } else { Fmt::Single };
                float_dest(fmt, *fd, pc, regs)?
            }
            Instruction::Compare { flag, .. } => Self::Flag {
                flag: *flag,
                prior: regs.flag(*flag),
                pc,
            },
            Instruction::MoveFloatWord { to_float: true, fs, .. } => {
                float_dest(Fmt::Single, *fs, pc, regs)?
            }
            Instruction::MoveFloatWord { rt, .. } => reg(*rt),
            Instruction::Mem {
                op,
                reg: data,
                base,
                offset,
            } => match op {
                MemOp::Sw | MemOp::Sh | MemOp::Sb | MemOp::Swc1 | MemOp::Sdc1 => {
                    let addr = (regs.read(*base) as u32).wrapping_add(*offset as u32);
                    let width = match op {
                        MemOp::Sb => Width::Byte,
                        MemOp::Sh => Width::Half,
                        MemOp::Sdc1 => Width::Double,
                        _ => Width::Word,
                    };
                    Self::Memory {
                        addr,
                        width,
                        prior: mem.peek_bits(addr, width),
                        present: mem.initialized_mask(addr, width),
                        pc,
                    }
                }
                MemOp::Lwc1 => float_dest(Fmt::Single, *data, pc, regs)?,
                MemOp::Ldc1 => float_dest(Fmt::Double, *data, pc, regs)?,
                MemOp::Lw | MemOp::Lh | MemOp::Lhu | MemOp::Lb | MemOp::Lbu => reg(*data),
            },
            Instruction::Syscall => {
                let code = regs.read(REG_V0);
                let bytes = match code {
                    8 => snapshot(mem, regs.read(REG_A0) as u32, regs.read(REG_A1)),
                    14 => snapshot(mem, regs.read(REG_A1) as u32, regs.read(REG_A2)),
                    _ => Vec::new(),
                };
                Self::Syscall(Box::new(SyscallChange {
                    pc,
                    regs: vec![(REG_V0, regs.read(REG_V0))],
                    fregs: vec![(0, regs.fpr.read_bits(0)), (1, regs.fpr.read_bits(1))],
                    bytes,
                    heap_top: mem.heap_top(),
                }))
            }
        })
    }

    /// Address of the instruction this record undoes.
    pub fn pc(&self) -> u32 {
        match self {
            Self::Register { pc, .. }
            | Self::FloatRegister { pc, .. }
            | Self::DoubleRegister { pc, .. }
            | Self::Memory { pc, .. }
            | Self::Flag { pc, .. }
            | Self::HiLo { pc, .. }
            | Self::Control { pc } => *pc,
            Self::Syscall(s) => s.pc,
        }
    }

    /// Restores the captured state and sets `pc` to the undone instruction.
    pub fn revert(self, regs: &mut RegisterFile, mem: &mut Memory) {
        regs.pc = self.pc();
        match self {
            Self::Register { reg, prior, .. } => regs.write(reg, prior),
            Self::FloatRegister { reg, prior, .. } => regs.fpr.write_bits(reg, prior),
            Self::DoubleRegister { reg, prior, .. } => {
                regs.fpr.write_bits(reg, prior as u32);
                regs.fpr.write_bits(reg + 1, (prior >> 32) as u32);
            }
            Self::Memory {
                addr,
                width,
                prior,
                present,
                ..
            } => {
                let mut raw = mem.privileged();
                for i in 0..width.bytes() {
                    let a = addr.wrapping_add(i);
                    if present & (1 << i) == 0 {
                        raw.forget(a);
                    } else {
                        raw.set_byte(a, (prior >> (8 * i)) as u8);
                    }
                }
            }
            Self::Flag { flag, prior, .. } => regs.set_flag(flag, prior),
            Self::HiLo { hi, lo, .. } => {
                regs.hi = hi;
                regs.lo = lo;
            }
            Self::Control { .. } => {}
            Self::Syscall(s) => {
                for (reg, v) in s.regs {
                    regs.write(reg, v);
                }
                for (reg, v) in s.fregs {
                    regs.fpr.write_bits(reg, v);
                }
                let mut raw = mem.privileged();
                for (a, b) in s.bytes {
                    match b {
                        Some(b) => raw.set_byte(a, b),
                        None => raw.forget(a),
                    }
                }
                raw.set_heap_top(s.heap_top);
            }
        }
    }
}

/// Append-then-pop stack of change records.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct UndoLog {
    records: Vec<Change>,
}

impl UndoLog {
    /// Appends the record of the instruction just executed.
    pub fn push(&mut self, change: Change) {
        self.records.push(change);
    }

    /// Removes the newest record.
    pub fn pop(&mut self) -> Option<Change> {
        self.records.pop()
    }

    /// Number of records.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// True when nothing can be undone.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Drops every record.
    pub fn clear(&mut self) {
        self.records.clear();
    }
}
