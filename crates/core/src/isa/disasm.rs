//! Instruction Disassembler.
//!
//! Renders an [`Instruction`] as canonical basic assembly text for the debugger,
//! diagnostics and tests. Integer registers use ABI names except `$zero`, which
//! prints as `$0`; logical immediates, `lui` and memory displacements print as
//! 8-digit hex; arithmetic immediates and shift amounts print in decimal.
//!
//! # Usage
//!
//! ```
//! use mipsim_core::isa::instruction::{ImmOp, Instruction};
//! let ori = Instruction::Imm { op: ImmOp::Ori, rt: 2, rs: 0, imm: 10 };
//! assert_eq!(ori.to_string(), "ori $v0, $0, 0x0000000a");
//! ```

use std::fmt;

use crate::isa::abi::{REG_RA, fpr_display as f, gpr_display as r};
use crate::isa::instruction::Instruction;

/// Formats a 32-bit value as `0x` followed by 8 hex digits.
pub fn hex(value: u32) -> String {
    format!("{value:#010x}")
}

fn target(label: &str, addr: u32) -> String {
    if label.is_empty() {
        hex(addr)
    } else {
        label.to_string()
    }
}

impl fmt::Display for Instruction {
    fn fmt(&self, out: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Reg { op, rd, rs, rt } => {
                write!(out, "{} {}, {}, {}", op.mnemonic(), r(*rd), r(*rs), r(*rt))
            }
            Self::Imm { op, rt, rs, imm } if op.is_logical() => {
                write!(out, "{} {}, {}, {}", op.mnemonic(), r(*rt), r(*rs), hex(*imm as u32))
            }
            Self::Imm { op, rt, rs, imm } => {
                write!(out, "{} {}, {}, {imm}", op.mnemonic(), r(*rt), r(*rs))
            }
            Self::Lui { rt, imm } => write!(out, "lui {}, {}", r(*rt), hex(u32::from(*imm))),
            Self::HiLo { op, rs, rt } => write!(out, "{} {}, {}", op.mnemonic(), r(*rs), r(*rt)),
            Self::Count { op, rd, rs } => write!(out, "{} {}, {}", op.mnemonic(), r(*rd), r(*rs)),
            Self::HiLoMove { op, reg } => write!(out, "{} {}", op.mnemonic(), r(*reg)),
            Self::Jump { link, target: addr, label } => {
                let m = if *link { "jal" } else { "j" };
                write!(out, "{m} {}", target(label, *addr))
            }
            Self::JumpReg { link: None, rs } => write!(out, "jr {}", r(*rs)),
            Self::JumpReg { link: Some(REG_RA), rs } => write!(out, "jalr {}", r(*rs)),
            Self::JumpReg { link: Some(rd), rs } => write!(out, "jalr {}, {}", r(*rd), r(*rs)),
            Self::Branch { op, rs, rt, target: addr, label } if op.compares_registers() => write!(
                out,
                "{} {}, {}, {}",
                op.mnemonic(),
                r(*rs),
                r(*rt),
                target(label, *addr)
            ),
            Self::Branch { op, rs, target: addr, label, .. } => {
                write!(out, "{} {}, {}", op.mnemonic(), r(*rs), target(label, *addr))
            }
            Self::FloatArith { op, fmt, fd, fs, ft } => {
                write!(out, "{}.{} {}, {}, {}", op.stem(), fmt.suffix(), f(*fd), f(*fs), f(*ft))
            }
            Self::FloatUnary { op, fmt, fd, fs } => {
                write!(out, "{}.{} {}, {}", op.stem(), fmt.suffix(), f(*fd), f(*fs))
            }
            Self::FloatToWord { mode, fmt, fd, fs } => {
                write!(out, "{}.w.{} {}, {}", mode.stem(), fmt.suffix(), f(*fd), f(*fs))
            }
            Self::Convert { to, from, fd, fs } => {
                write!(out, "cvt.{}.{} {}, {}", to.suffix(), from.suffix(), f(*fd), f(*fs))
            }
            Self::Compare { cond, fmt, flag, fs, ft } => {
                write!(out, "{}.{} {flag}, {}, {}", cond.stem(), fmt.suffix(), f(*fs), f(*ft))
            }
            Self::BranchFlag { when, flag, target: addr, label } => {
                let m = if *when { "bc1t" } else { "bc1f" };
                write!(out, "{m} {flag}, {}", target(label, *addr))
            }
            Self::MoveFloatWord { to_float, rt, fs } => {
                let m = if *to_float { "mtc1" } else { "mfc1" };
                write!(out, "{m} {}, {}", r(*rt), f(*fs))
            }
            Self::FloatMoveCond { nonzero, fmt, fd, fs, rt } => {
                let m = if *nonzero { "movn" } else { "movz" };
                write!(out, "{m}.{} {}, {}, {}", fmt.suffix(), f(*fd), f(*fs), r(*rt))
            }
            Self::MoveOnFlag { when, rd, rs, flag } => {
                let m = if *when { "movt" } else { "movf" };
                write!(out, "{m} {}, {}, {flag}", r(*rd), r(*rs))
            }
            Self::FloatMoveOnFlag { when, fmt, fd, fs, flag } => {
                let m = if *when { "movt" } else { "movf" };
                write!(out, "{m}.{} {}, {}, {flag}", fmt.suffix(), f(*fd), f(*fs))
            }
            Self::Mem { op, reg, base, offset } => {
                let data = if op.is_float() { f(*reg) } else { r(*reg) };
                write!(out, "{} {data}, {}({})", op.mnemonic(), hex(*offset as u32), r(*base))
            }
            Self::Nop => out.write_str("nop"),
            Self::Syscall => out.write_str("syscall"),
            Self::Break { code: 0 } => out.write_str("break"),
            Self::Break { code } => write!(out, "break {code}"),
            Self::Pseudo(p) => out.write_str(&p.source),
        }
    }
}
