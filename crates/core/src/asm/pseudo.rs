//! Instruction selection and pseudo-instruction expansion.
//!
//! Maps a mnemonic and its operand tokens to the basic instructions that
//! implement it. Basic instructions written in their native operand shape map to
//! themselves; everything else (pseudo-instructions, out-of-range immediates,
//! label-addressed loads and stores) expands to a fixed canonical sequence that
//! uses `$at` as scratch.
//!
//! The number of instructions an expansion produces never depends on the value a
//! label resolves to, so pass 1 can size every line with [`Sizing`] before any
//! label is bound.

use std::sync::Arc;

use crate::asm::lexer::{Operand, operand};
use crate::asm::program::SymbolTable;
use crate::common::error::AssembleErrorKind as E;
use crate::isa::abi::{REG_AT, REG_RA, REG_ZERO};
use crate::isa::instruction::{
    BranchOp, CountOp, Cond, CvtFmt, FloatOp, FloatUnary, Fmt, HiLoMove, HiLoOp, ImmOp,
    Instruction, MemOp, Reg, RegOp, RoundMode,
};

const AT: Reg = REG_AT;
const ZERO: Reg = REG_ZERO;

/// Label resolution used during expansion.
pub trait Resolve {
    /// Address of `label`.
    fn resolve(&self, label: &str) -> Result<u32, E>;
}

/// Pass-1 resolver: every label resolves to 0.
#[derive(Debug, Clone, Copy)]
pub struct Sizing;

impl Resolve for Sizing {
    fn resolve(&self, _label: &str) -> Result<u32, E> {
        Ok(0)
    }
}

impl Resolve for SymbolTable {
    fn resolve(&self, label: &str) -> Result<u32, E> {
        self.get(label)
            .ok_or_else(|| E::UndefinedLabel(label.to_string()))
    }
}

/// Basic instructions selected for one source instruction.
#[derive(Clone, Debug, PartialEq)]
pub struct Expansion {
    /// Basic instructions in execution order.
    pub instrs: Vec<Instruction>,
    /// True unless the source was a basic instruction in its native shape.
    pub pseudo: bool,
}

fn basic(instr: Instruction) -> Expansion {
    Expansion {
        instrs: vec![instr],
        pseudo: false,
    }
}

const fn pseudo(instrs: Vec<Instruction>) -> Expansion {
    Expansion {
        instrs,
        pseudo: true,
    }
}

const fn fits_i16(v: i64) -> bool {
    v >= i16::MIN as i64 && v <= i16::MAX as i64
}

const fn fits_u16(v: i64) -> bool {
    v >= 0 && v <= 0xFFFF
}

const fn fits_word(v: i64) -> bool {
    v >= i32::MIN as i64 && v <= u32::MAX as i64
}

fn out_of_range(m: &str, value: i64) -> E {
    E::ImmediateOutOfRange {
        mnemonic: m.to_string(),
        value,
    }
}

fn wrong(m: &str, expected: &'static str) -> E {
    E::WrongOperands {
        mnemonic: m.to_string(),
        expected,
    }
}

const fn reg(op: RegOp, rd: Reg, rs: Reg, rt: Reg) -> Instruction {
    Instruction::Reg { op, rd, rs, rt }
}

const fn imm(op: ImmOp, rt: Reg, rs: Reg, v: i64) -> Instruction {
    Instruction::Imm {
        op,
        rt,
        rs,
        imm: v as i32,
    }
}

/// Loads a 32-bit constant into `rd`: `ori` for 16-bit unsigned values, `addiu`
/// for negative 16-bit values, `lui $at` + `ori` otherwise.
fn load_imm(m: &str, rd: Reg, v: i64) -> Result<Vec<Instruction>, E> {
    if !fits_word(v) {
        return Err(out_of_range(m, v));
    }
    Ok(if fits_u16(v) {
        vec![imm(ImmOp::Ori, rd, ZERO, v)]
    } else if fits_i16(v) {
        vec![imm(ImmOp::Addiu, rd, ZERO, v)]
    } else {
        let w = v as u32;
        vec![
            Instruction::Lui {
                rt: AT,
                imm: (w >> 16) as u16,
            },
            imm(ImmOp::Ori, rd, AT, i64::from(w & 0xFFFF)),
        ]
    })
}

/// Splits an address into a `lui` half and a signed 16-bit displacement.
const fn split_signed(addr: u32) -> (u16, i32) {
    ((addr.wrapping_add(0x8000) >> 16) as u16, addr as u16 as i16 as i32)
}

fn resolve_label(r: &dyn Resolve, name: &str, offset: i64) -> Result<u32, E> {
    Ok(r.resolve(name)?.wrapping_add(offset as u32))
}

fn target(m: &str, op: &Operand, r: &dyn Resolve) -> Result<(u32, Arc<str>), E> {
    match op {
        Operand::Label { name, offset } => {
            Ok((resolve_label(r, name, *offset)?, Arc::from(name.as_str())))
        }
        Operand::Int(v) if fits_word(*v) => Ok((*v as u32, Arc::from(""))),
        _ => Err(wrong(m, "a label or address target")),
    }
}

fn flag(m: &str, v: i64) -> Result<usize, E> {
    if (0..8).contains(&v) {
        Ok(v as usize)
    } else {
        Err(out_of_range(m, v))
    }
}

/// Puts the right-hand operand of a compare in a register, loading immediates into `$at`.
fn rhs(m: &str, op: &Operand, seq: &mut Vec<Instruction>) -> Result<Reg, E> {
    match op {
        Operand::Gpr(rt) => Ok(*rt),
        Operand::Int(v) => {
            seq.extend(load_imm(m, AT, *v)?);
            Ok(AT)
        }
        _ => Err(wrong(m, "rd, rs, rt or rd, rs, imm")),
    }
}

/// Selects the basic instructions for one source instruction.
///
/// # Arguments
///
/// * `mnemonic` - Instruction name as written (case-insensitive).
/// * `args` - Raw operand tokens.
/// * `r` - Label resolver: [`Sizing`] in pass 1, the symbol table in pass 2.
///
/// # Returns
///
/// The expansion, or the assembly error describing why the operands do not fit.
///
/// # Examples
///
/// ```
/// use mipsim_core::asm::pseudo::{expand, Sizing};
///
/// let e = expand("li", &["$v0".into(), "10".into()], &Sizing).unwrap();
/// assert!(e.pseudo);
/// assert_eq!(e.instrs[0].to_string(), "ori $v0, $0, 0x0000000a");
/// ```
pub fn expand(mnemonic: &str, args: &[String], r: &dyn Resolve) -> Result<Expansion, E> {
    let lower = mnemonic.to_ascii_lowercase();
    let m = lower.as_str();
    let ops = args
        .iter()
        .map(|a| operand(a))
        .collect::<Result<Vec<_>, _>>()?;

    if let Some(op) = reg_op(m) {
        return reg_family(m, op, &ops);
    }
    if let Some(op) = imm_op(m) {
        return imm_family(m, op, &ops);
    }
    if let Some(op) = shift_op(m) {
        return shift_family(m, op, &ops);
    }
    if let Some(op) = hilo_op(m) {
        return hilo_family(m, op, &ops);
    }
    if let Some(op) = mem_op(m) {
        return mem_family(m, op, &ops, r);
    }
    if let Some(op) = branch_op(m) {
        return branch_family(m, op, &ops, r);
    }
    if m.contains('.') {
        return float_family(m, &ops);
    }
    misc(m, &ops, r)
}

/// True if `name` is a basic or pseudo-instruction mnemonic.
pub fn is_mnemonic(name: &str) -> bool {
    !matches!(expand(name, &[], &Sizing), Err(E::UnknownInstruction(_)))
}

fn reg_op(m: &str) -> Option<RegOp> {
    Some(match m {
        "add" => RegOp::Add,
        "addu" => RegOp::Addu,
        "sub" => RegOp::Sub,
        "subu" => RegOp::Subu,
        "and" => RegOp::And,
        "or" => RegOp::Or,
        "xor" => RegOp::Xor,
        "nor" => RegOp::Nor,
        "slt" => RegOp::Slt,
        "sltu" => RegOp::Sltu,
        "sllv" => RegOp::Sllv,
        "srlv" => RegOp::Srlv,
        "srav" => RegOp::Srav,
        "mul" => RegOp::Mul,
        "movn" => RegOp::Movn,
        "movz" => RegOp::Movz,
        _ => return None,
    })
}

fn imm_op(m: &str) -> Option<ImmOp> {
    Some(match m {
        "addi" => ImmOp::Addi,
        "addiu" => ImmOp::Addiu,
        "slti" => ImmOp::Slti,
        "sltiu" => ImmOp::Sltiu,
        "andi" => ImmOp::Andi,
        "ori" => ImmOp::Ori,
        "xori" => ImmOp::Xori,
        _ => return None,
    })
}

fn shift_op(m: &str) -> Option<ImmOp> {
    Some(match m {
        "sll" => ImmOp::Sll,
        "srl" => ImmOp::Srl,
        "sra" => ImmOp::Sra,
        _ => return None,
    })
}

fn hilo_op(m: &str) -> Option<HiLoOp> {
    Some(match m {
        "mult" => HiLoOp::Mult,
        "multu" => HiLoOp::Multu,
        "div" => HiLoOp::Div,
        "divu" => HiLoOp::Divu,
        "madd" => HiLoOp::Madd,
        "maddu" => HiLoOp::Maddu,
        "msub" => HiLoOp::Msub,
        "msubu" => HiLoOp::Msubu,
        _ => return None,
    })
}

fn mem_op(m: &str) -> Option<MemOp> {
    Some(match m {
        "lw" => MemOp::Lw,
        "lh" => MemOp::Lh,
        "lhu" => MemOp::Lhu,
        "lb" => MemOp::Lb,
        "lbu" => MemOp::Lbu,
        "sw" => MemOp::Sw,
        "sh" => MemOp::Sh,
        "sb" => MemOp::Sb,
        "lwc1" | "l.s" => MemOp::Lwc1,
        "swc1" | "s.s" => MemOp::Swc1,
        "ldc1" | "l.d" => MemOp::Ldc1,
        "sdc1" | "s.d" => MemOp::Sdc1,
        _ => return None,
    })
}

fn branch_op(m: &str) -> Option<BranchOp> {
    Some(match m {
        "beq" => BranchOp::Beq,
        "bne" => BranchOp::Bne,
        "bgez" => BranchOp::Bgez,
        "bgtz" => BranchOp::Bgtz,
        "blez" => BranchOp::Blez,
        "bltz" => BranchOp::Bltz,
        "bgezal" => BranchOp::Bgezal,
        "bltzal" => BranchOp::Bltzal,
        _ => return None,
    })
}

fn reg_family(m: &str, op: RegOp, ops: &[Operand]) -> Result<Expansion, E> {
    use Operand::{Gpr as G, Int as I};
    match ops {
        [G(rd), G(rs), G(rt)] => Ok(basic(reg(op, *rd, *rs, *rt))),
        [G(rd), G(rs), I(v)] => {
            let (rd, rs, v) = (*rd, *rs, *v);
            let direct = match op {
                RegOp::Add if fits_i16(v) => Some(imm(ImmOp::Addi, rd, rs, v)),
                RegOp::Addu if fits_i16(v) => Some(imm(ImmOp::Addiu, rd, rs, v)),
                RegOp::And if fits_u16(v) => Some(imm(ImmOp::Andi, rd, rs, v)),
                RegOp::Or if fits_u16(v) => Some(imm(ImmOp::Ori, rd, rs, v)),
                RegOp::Xor if fits_u16(v) => Some(imm(ImmOp::Xori, rd, rs, v)),
                RegOp::Slt if fits_i16(v) => Some(imm(ImmOp::Slti, rd, rs, v)),
                RegOp::Sltu if fits_i16(v) => Some(imm(ImmOp::Sltiu, rd, rs, v)),
                RegOp::Sllv if (0..32).contains(&v) => Some(imm(ImmOp::Sll, rd, rs, v)),
                RegOp::Srlv if (0..32).contains(&v) => Some(imm(ImmOp::Srl, rd, rs, v)),
                RegOp::Srav if (0..32).contains(&v) => Some(imm(ImmOp::Sra, rd, rs, v)),
                RegOp::Movn | RegOp::Movz => return Err(wrong(m, "rd, rs, rt")),
                _ => None,
            };
            if let Some(instr) = direct {
                return Ok(pseudo(vec![instr]));
            }
            let mut seq = load_imm(m, AT, v)?;
            seq.push(reg(op, rd, rs, AT));
            Ok(pseudo(seq))
        }
        _ => Err(wrong(m, "rd, rs, rt")),
    }
}

fn imm_family(m: &str, op: ImmOp, ops: &[Operand]) -> Result<Expansion, E> {
    use Operand::{Gpr as G, Int as I};
    match ops {
        [G(rt), G(rs), I(v)] => {
            let (rt, rs, v) = (*rt, *rs, *v);
            let fits = if op.is_logical() { fits_u16(v) } else { fits_i16(v) };
            if fits {
                return Ok(basic(imm(op, rt, rs, v)));
            }
            let wide = match op {
                ImmOp::Addi => RegOp::Add,
                ImmOp::Addiu => RegOp::Addu,
                ImmOp::Slti => RegOp::Slt,
                ImmOp::Sltiu => RegOp::Sltu,
                ImmOp::Andi => RegOp::And,
                ImmOp::Ori => RegOp::Or,
                ImmOp::Xori => RegOp::Xor,
                ImmOp::Sll | ImmOp::Srl | ImmOp::Sra => return Err(out_of_range(m, v)),
            };
            let mut seq = load_imm(m, AT, v)?;
            seq.push(reg(wide, rt, rs, AT));
            Ok(pseudo(seq))
        }
        [G(rt), I(v)] => {
            let mut e = imm_family(m, op, &[G(*rt), G(*rt), I(*v)])?;
            e.pseudo = true;
            Ok(e)
        }
        _ => Err(wrong(m, "rt, rs, imm")),
    }
}

fn shift_family(m: &str, op: ImmOp, ops: &[Operand]) -> Result<Expansion, E> {
    use Operand::{Gpr as G, Int as I};
    match ops {
        [G(rd), G(rt), I(v)] if (0..32).contains(v) => Ok(basic(imm(op, *rd, *rt, *v))),
        [G(_), G(_), I(v)] => Err(out_of_range(m, *v)),
        [G(rd), G(rt), G(rs)] => {
            let var = match op {
                ImmOp::Srl => RegOp::Srlv,
                ImmOp::Sra => RegOp::Srav,
                _ => RegOp::Sllv,
            };
            Ok(pseudo(vec![reg(var, *rd, *rt, *rs)]))
        }
        _ => Err(wrong(m, "rd, rt, shamt")),
    }
}

fn hilo_family(m: &str, op: HiLoOp, ops: &[Operand]) -> Result<Expansion, E> {
    use Operand::{Gpr as G, Int as I};
    let divides = matches!(op, HiLoOp::Div | HiLoOp::Divu);
    match ops {
        [G(rs), G(rt)] => Ok(basic(Instruction::HiLo { op, rs: *rs, rt: *rt })),
        [G(rd), G(rs), rt] if divides => {
            let mut seq = Vec::new();
            let rt = rhs(m, rt, &mut seq)?;
            seq.push(Instruction::HiLo { op, rs: *rs, rt });
            seq.push(Instruction::HiLoMove {
                op: HiLoMove::Mflo,
                reg: *rd,
            });
            Ok(pseudo(seq))
        }
        [G(_), G(_), I(_)] | [G(_), G(_), G(_)] => Err(wrong(m, "rs, rt")),
        _ if divides => Err(wrong(m, "rs, rt or rd, rs, rt")),
        _ => Err(wrong(m, "rs, rt")),
    }
}

fn mem_family(m: &str, op: MemOp, ops: &[Operand], r: &dyn Resolve) -> Result<Expansion, E> {
    let alias = m.contains('.');
    let (data, addr) = match (ops, op.is_float()) {
        ([Operand::Fpr(f), addr], true) => (*f, addr),
        ([Operand::Gpr(g), addr], false) => (*g, addr),
        (_, true) => return Err(wrong(m, "ft, offset(base) or ft, label")),
        (_, false) => return Err(wrong(m, "rt, offset(base) or rt, label")),
    };
    let mem = |base: Reg, offset: i32| Instruction::Mem {
        op,
        reg: data,
        base,
        offset,
    };
    let wide = |addr: u32, base: Option<Reg>| {
        let (hi, lo) = split_signed(addr);
        let mut seq = vec![Instruction::Lui { rt: AT, imm: hi }];
        if let Some(base) = base {
            seq.push(reg(RegOp::Addu, AT, AT, base));
        }
        seq.push(mem(AT, lo));
        pseudo(seq)
    };
    let mut e = match addr {
        Operand::Mem {
            label: None,
            offset,
            base,
        } if fits_i16(*offset) => basic(mem(*base, *offset as i32)),
        Operand::Mem {
            label: Some(name),
            offset,
            base,
        } => wide(resolve_label(r, name, *offset)?, Some(*base)),
        Operand::Mem { offset, base, .. } if fits_word(*offset) => {
            wide(*offset as u32, Some(*base))
        }
        Operand::Mem { offset, .. } => return Err(out_of_range(m, *offset)),
        Operand::Label { name, offset } => wide(resolve_label(r, name, *offset)?, None),
        Operand::Int(v) if fits_i16(*v) => pseudo(vec![mem(ZERO, *v as i32)]),
        Operand::Int(v) if fits_word(*v) => wide(*v as u32, None),
        Operand::Int(v) => return Err(out_of_range(m, *v)),
        Operand::Gpr(_) | Operand::Fpr(_) => return Err(wrong(m, "reg, offset(base)")),
    };
    e.pseudo |= alias;
    Ok(e)
}

fn branch_family(m: &str, op: BranchOp, ops: &[Operand], r: &dyn Resolve) -> Result<Expansion, E> {
    use Operand::{Gpr as G, Int as I};
    let branch = |rs: Reg, rt: Reg, t: &Operand| -> Result<Instruction, E> {
        let (target, label) = target(m, t, r)?;
        Ok(Instruction::Branch {
            op,
            rs,
            rt,
            target,
            label,
        })
    };
    if op.compares_registers() {
        return match ops {
            [G(rs), G(rt), t] => Ok(basic(branch(*rs, *rt, t)?)),
            [G(rs), I(v), t] => {
                let mut seq = load_imm(m, AT, *v)?;
                seq.push(branch(*rs, AT, t)?);
                Ok(pseudo(seq))
            }
            _ => Err(wrong(m, "rs, rt, label")),
        };
    }
    match ops {
        [G(rs), t] => Ok(basic(branch(*rs, ZERO, t)?)),
        _ => Err(wrong(m, "rs, label")),
    }
}

fn fmt_of(s: &str) -> Option<Fmt> {
    match s {
        "s" => Some(Fmt::Single),
        "d" => Some(Fmt::Double),
        _ => None,
    }
}

fn cvt_of(s: &str) -> Option<CvtFmt> {
    match s {
        "s" => Some(CvtFmt::S),
        "d" => Some(CvtFmt::D),
        "w" => Some(CvtFmt::W),
        _ => None,
    }
}

fn float_family(m: &str, ops: &[Operand]) -> Result<Expansion, E> {
    use Operand::{Fpr as F, Gpr as G, Int as I};
    let unknown = || E::UnknownInstruction(m.to_string());
    let parts: Vec<&str> = m.split('.').collect();
    match parts.as_slice() {
        ["c", cond, fmt] => {
            let cond = match *cond {
                "eq" => Cond::Eq,
                "lt" => Cond::Lt,
                "le" => Cond::Le,
                _ => return Err(unknown()),
            };
            let fmt = fmt_of(fmt).ok_or_else(unknown)?;
            let (flag, fs, ft) = match ops {
                [F(fs), F(ft)] => (0, *fs, *ft),
                [I(c), F(fs), F(ft)] => (flag(m, *c)?, *fs, *ft),
                _ => return Err(wrong(m, "[flag,] fs, ft")),
            };
            Ok(basic(Instruction::Compare {
                cond,
                fmt,
                flag,
                fs,
                ft,
            }))
        }
        ["cvt", to, from] => {
            let (to, from) = cvt_of(to).zip(cvt_of(from)).ok_or_else(unknown)?;
            if to == from {
                return Err(unknown());
            }
            match ops {
                [F(fd), F(fs)] => Ok(basic(Instruction::Convert {
                    to,
                    from,
                    fd: *fd,
                    fs: *fs,
                })),
                _ => Err(wrong(m, "fd, fs")),
            }
        }
        [stem, "w", fmt] => {
            let mode = match *stem {
                "ceil" => RoundMode::Ceil,
                "floor" => RoundMode::Floor,
                "round" => RoundMode::Round,
                "trunc" => RoundMode::Trunc,
                _ => return Err(unknown()),
            };
            let fmt = fmt_of(fmt).ok_or_else(unknown)?;
            match ops {
                [F(fd), F(fs)] => Ok(basic(Instruction::FloatToWord {
                    mode,
                    fmt,
                    fd: *fd,
                    fs: *fs,
                })),
                _ => Err(wrong(m, "fd, fs")),
            }
        }
        [stem, fmt] => {
            let fmt = fmt_of(fmt).ok_or_else(unknown)?;
            let arith = match *stem {
                "add" => Some(FloatOp::Add),
                "sub" => Some(FloatOp::Sub),
                "mul" => Some(FloatOp::Mul),
                "div" => Some(FloatOp::Div),
                _ => None,
            };
            if let Some(op) = arith {
                return match ops {
                    [F(fd), F(fs), F(ft)] => Ok(basic(Instruction::FloatArith {
                        op,
                        fmt,
                        fd: *fd,
                        fs: *fs,
                        ft: *ft,
                    })),
                    _ => Err(wrong(m, "fd, fs, ft")),
                };
            }
            let unary = match *stem {
                "abs" => Some(FloatUnary::Abs),
                "neg" => Some(FloatUnary::Neg),
                "sqrt" => Some(FloatUnary::Sqrt),
                "mov" => Some(FloatUnary::Mov),
                _ => None,
            };
            if let Some(op) = unary {
                return match ops {
                    [F(fd), F(fs)] => Ok(basic(Instruction::FloatUnary {
                        op,
                        fmt,
                        fd: *fd,
                        fs: *fs,
                    })),
                    _ => Err(wrong(m, "fd, fs")),
                };
            }
            match (*stem, ops) {
                ("movn" | "movz", [F(fd), F(fs), G(rt)]) => Ok(basic(Instruction::FloatMoveCond {
                    nonzero: *stem == "movn",
                    fmt,
                    fd: *fd,
                    fs: *fs,
                    rt: *rt,
                })),
                ("movn" | "movz", _) => Err(wrong(m, "fd, fs, rt")),
                ("movt" | "movf", [F(fd), F(fs)]) => Ok(basic(Instruction::FloatMoveOnFlag {
                    when: *stem == "movt",
                    fmt,
                    fd: *fd,
                    fs: *fs,
                    flag: 0,
                })),
                ("movt" | "movf", [F(fd), F(fs), I(c)]) => {
                    Ok(basic(Instruction::FloatMoveOnFlag {
                        when: *stem == "movt",
                        fmt,
                        fd: *fd,
                        fs: *fs,
                        flag: flag(m, *c)?,
                    }))
                }
                ("movt" | "movf", _) => Err(wrong(m, "fd, fs[, flag]")),
                _ => Err(unknown()),
            }
        }
        _ => Err(unknown()),
    }
}

/// Branch on a comparison synthesized with `slt`/`sltu` into `$at`.
fn compare_branch(m: &str, ops: &[Operand], r: &dyn Resolve) -> Result<Expansion, E> {
    let [Operand::Gpr(rs), rhs_op, t] = ops else {
        return Err(wrong(m, "rs, rt, label"));
    };
    let unsigned = m.ends_with('u');
    let stem = m.trim_end_matches('u');
    let mut seq = Vec::new();
    let rt = rhs(m, rhs_op, &mut seq)?;
    let (a, b, taken_when_set) = match stem {
        "blt" => (*rs, rt, true),
        "bgt" => (rt, *rs, true),
        "ble" => (rt, *rs, false),
        _ => (*rs, rt, false),
    };
    let cmp = if unsigned { RegOp::Sltu } else { RegOp::Slt };
    seq.push(reg(cmp, AT, a, b));
    let (target, label) = target(m, t, r)?;
    seq.push(Instruction::Branch {
        op: if taken_when_set { BranchOp::Bne } else { BranchOp::Beq },
        rs: AT,
        rt: ZERO,
        target,
        label,
    });
    Ok(pseudo(seq))
}

/// `sgt`/`sge`/`sle`/`seq`/`sne` and their unsigned forms.
fn set_compare(m: &str, ops: &[Operand]) -> Result<Expansion, E> {
    let [Operand::Gpr(rd), Operand::Gpr(rs), rhs_op] = ops else {
        return Err(wrong(m, "rd, rs, rt"));
    };
    let (rd, rs) = (*rd, *rs);
    let mut seq = Vec::new();
    let rt = rhs(m, rhs_op, &mut seq)?;
    let slt = if m.ends_with('u') {
        RegOp::Sltu
    } else {
        RegOp::Slt
    };
    match m {
        "sgt" | "sgtu" => seq.push(reg(slt, rd, rt, rs)),
        "sge" | "sgeu" => {
            seq.push(reg(slt, rd, rs, rt));
            seq.push(imm(ImmOp::Xori, rd, rd, 1));
        }
        "sle" | "sleu" => {
            seq.push(reg(slt, rd, rt, rs));
            seq.push(imm(ImmOp::Xori, rd, rd, 1));
        }
        "seq" => {
            seq.push(reg(RegOp::Subu, rd, rs, rt));
            seq.push(imm(ImmOp::Sltiu, rd, rd, 1));
        }
        _ => {
            seq.push(reg(RegOp::Subu, rd, rs, rt));
            seq.push(reg(RegOp::Sltu, rd, ZERO, rd));
        }
    }
    Ok(pseudo(seq))
}

fn misc(m: &str, ops: &[Operand], r: &dyn Resolve) -> Result<Expansion, E> {
    use Operand::{Fpr as F, Gpr as G, Int as I};
    match m {
        "nop" => match ops {
            [] => Ok(basic(Instruction::Nop)),
            _ => Err(wrong(m, "no operands")),
        },
        "syscall" => match ops {
            [] => Ok(basic(Instruction::Syscall)),
            _ => Err(wrong(m, "no operands")),
        },
        "break" => match ops {
            [] => Ok(basic(Instruction::Break { code: 0 })),
            [I(code)] if fits_word(*code) => Ok(basic(Instruction::Break {
                code: *code as u32,
            })),
            _ => Err(wrong(m, "[code]")),
        },
        "lui" => match ops {
            [G(rt), I(v)] if fits_u16(*v) || fits_i16(*v) => Ok(basic(Instruction::Lui {
                rt: *rt,
                imm: *v as u16,
            })),
            [G(_), I(v)] => Err(out_of_range(m, *v)),
            _ => Err(wrong(m, "rt, imm")),
        },
        "clo" | "clz" => match ops {
            [G(rd), G(rs)] => Ok(basic(Instruction::Count {
                op: if m == "clo" { CountOp::Clo } else { CountOp::Clz },
                rd: *rd,
                rs: *rs,
            })),
            _ => Err(wrong(m, "rd, rs")),
        },
        "mfhi" | "mflo" | "mthi" | "mtlo" => {
            let op = match m {
                "mfhi" => HiLoMove::Mfhi,
                "mflo" => HiLoMove::Mflo,
                "mthi" => HiLoMove::Mthi,
                _ => HiLoMove::Mtlo,
            };
            match ops {
                [G(reg)] => Ok(basic(Instruction::HiLoMove { op, reg: *reg })),
                _ => Err(wrong(m, "rd")),
            }
        }
        "j" | "jal" => match ops {
            [t] => {
                let (target, label) = target(m, t, r)?;
                Ok(basic(Instruction::Jump {
                    link: m == "jal",
                    target,
                    label,
                }))
            }
            _ => Err(wrong(m, "label")),
        },
        "jr" => match ops {
            [G(rs)] => Ok(basic(Instruction::JumpReg { link: None, rs: *rs })),
            _ => Err(wrong(m, "rs")),
        },
        "jalr" => match ops {
            [G(rs)] => Ok(basic(Instruction::JumpReg {
                link: Some(REG_RA),
                rs: *rs,
            })),
            [G(rd), G(rs)] => Ok(basic(Instruction::JumpReg {
                link: Some(*rd),
                rs: *rs,
            })),
            _ => Err(wrong(m, "[rd,] rs")),
        },
        "bc1t" | "bc1f" => {
            let (flag, t) = match ops {
                [t] => (0, t),
                [I(c), t] => (flag(m, *c)?, t),
                _ => return Err(wrong(m, "[flag,] label")),
            };
            let (target, label) = target(m, t, r)?;
            Ok(basic(Instruction::BranchFlag {
                when: m == "bc1t",
                flag,
                target,
                label,
            }))
        }
        "mfc1" | "mtc1" => match ops {
            [G(rt), F(fs)] => Ok(basic(Instruction::MoveFloatWord {
                to_float: m == "mtc1",
                rt: *rt,
                fs: *fs,
            })),
            _ => Err(wrong(m, "rt, fs")),
        },
        "movt" | "movf" => {
            let (rd, rs, flag) = match ops {
                [G(rd), G(rs)] => (*rd, *rs, 0),
                [G(rd), G(rs), I(c)] => (*rd, *rs, flag(m, *c)?),
                _ => return Err(wrong(m, "rd, rs[, flag]")),
            };
            Ok(basic(Instruction::MoveOnFlag {
                when: m == "movt",
                rd,
                rs,
                flag,
            }))
        }
        "li" => match ops {
            [G(rd), I(v)] => Ok(pseudo(load_imm(m, *rd, *v)?)),
            _ => Err(wrong(m, "rd, imm")),
        },
        "la" => match ops {
            [G(rd), Operand::Label { name, offset }] => {
                let addr = resolve_label(r, name, *offset)?;
                Ok(pseudo(vec![
                    Instruction::Lui {
                        rt: AT,
                        imm: (addr >> 16) as u16,
                    },
                    imm(ImmOp::Ori, *rd, AT, i64::from(addr & 0xFFFF)),
                ]))
            }
            [G(rd), I(v)] => Ok(pseudo(load_imm(m, *rd, *v)?)),
            [
                G(rd),
                Operand::Mem {
                    label: None,
                    offset,
                    base,
                },
            ] if fits_i16(*offset) => Ok(pseudo(vec![imm(ImmOp::Addi, *rd, *base, *offset)])),
            [G(rd), Operand::Mem { label, offset, base }] => {
                let addr = match label {
                    Some(name) => resolve_label(r, name, *offset)?,
                    None if fits_word(*offset) => *offset as u32,
                    None => return Err(out_of_range(m, *offset)),
                };
                Ok(pseudo(vec![
                    Instruction::Lui {
                        rt: AT,
                        imm: (addr >> 16) as u16,
                    },
                    imm(ImmOp::Ori, AT, AT, i64::from(addr & 0xFFFF)),
                    reg(RegOp::Addu, *rd, AT, *base),
                ]))
            }
            _ => Err(wrong(m, "rd, label")),
        },
        "move" => match ops {
            [G(rd), G(rs)] => Ok(pseudo(vec![reg(RegOp::Addu, *rd, ZERO, *rs)])),
            _ => Err(wrong(m, "rd, rs")),
        },
        "neg" | "negu" | "not" => {
            let (rd, rs) = match ops {
                [G(rd), G(rs)] => (*rd, *rs),
                [G(rd)] => (*rd, *rd),
                _ => return Err(wrong(m, "rd, rs")),
            };
            Ok(pseudo(vec![match m {
                "neg" => reg(RegOp::Sub, rd, ZERO, rs),
                "negu" => reg(RegOp::Subu, rd, ZERO, rs),
                _ => reg(RegOp::Nor, rd, rs, ZERO),
            }]))
        }
        "abs" => match ops {
            [G(rd), G(rs)] => Ok(pseudo(vec![
                imm(ImmOp::Sra, AT, *rs, 31),
                reg(RegOp::Xor, *rd, AT, *rs),
                reg(RegOp::Subu, *rd, *rd, AT),
            ])),
            _ => Err(wrong(m, "rd, rs")),
        },
        "b" => match ops {
            [t] => {
                let (target, label) = target(m, t, r)?;
                Ok(pseudo(vec![Instruction::Branch {
                    op: BranchOp::Beq,
                    rs: ZERO,
                    rt: ZERO,
                    target,
                    label,
                }]))
            }
            _ => Err(wrong(m, "label")),
        },
        "beqz" | "bnez" => match ops {
            [G(rs), t] => {
                let (target, label) = target(m, t, r)?;
                Ok(pseudo(vec![Instruction::Branch {
                    op: if m == "beqz" { BranchOp::Beq } else { BranchOp::Bne },
                    rs: *rs,
                    rt: ZERO,
                    target,
                    label,
                }]))
            }
            _ => Err(wrong(m, "rs, label")),
        },
        "blt" | "bgt" | "ble" | "bge" | "bltu" | "bgtu" | "bleu" | "bgeu" => {
            compare_branch(m, ops, r)
        }
        "sgt" | "sgtu" | "sge" | "sgeu" | "sle" | "sleu" | "seq" | "sne" => set_compare(m, ops),
        "rem" | "remu" => match ops {
            [G(rd), G(rs), rt] => {
                let mut seq = Vec::new();
                let rt = rhs(m, rt, &mut seq)?;
                seq.push(Instruction::HiLo {
                    op: if m == "rem" { HiLoOp::Div } else { HiLoOp::Divu },
                    rs: *rs,
                    rt,
                });
                seq.push(Instruction::HiLoMove {
                    op: HiLoMove::Mfhi,
                    reg: *rd,
                });
                Ok(pseudo(seq))
            }
            _ => Err(wrong(m, "rd, rs, rt")),
        },
        "subi" | "subiu" => match ops {
            [G(rd), G(rs), I(v)] => {
                let (add, sub) = if m == "subi" {
                    (ImmOp::Addi, RegOp::Sub)
                } else {
                    (ImmOp::Addiu, RegOp::Subu)
                };
                if fits_i16(-*v) {
                    return Ok(pseudo(vec![imm(add, *rd, *rs, -*v)]));
                }
                let mut seq = load_imm(m, AT, *v)?;
                seq.push(reg(sub, *rd, *rs, AT));
                Ok(pseudo(seq))
            }
            _ => Err(wrong(m, "rd, rs, imm")),
        },
        _ => Err(E::UnknownInstruction(m.to_string())),
    }
}
