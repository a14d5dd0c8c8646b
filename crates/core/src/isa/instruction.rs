//! Instruction representation.
//!
//! The assembler produces values of the closed [`Instruction`] type and the
//! interpreter dispatches over it exhaustively. It provides:
//! 1. **Operation Families:** Small `Copy` enums naming the operation inside each family.
//! 2. **Operand Shapes:** One variant per operand layout (register, immediate, memory, branch).
//! 3. **Pseudo-Instructions:** The ordered basic expansion together with the source text.
//! 4. **Classification:** [`InstrClass`] buckets used by the statistics collector.
//!
//! Register operands are plain indices (`0..32`) into the integer or float file, as
//! selected by the variant. Branch and jump targets are absolute addresses resolved by
//! the assembler; the label name is kept for display only.

use std::sync::Arc;

/// Integer register index.
pub type Reg = usize;

/// Float register index.
pub type FReg = usize;

/// Three-register integer operations: `rd = rs op rt`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum RegOp {
    /// Signed add, traps on overflow.
    Add,
    /// Wrapping add.
    Addu,
    /// Signed subtract, traps on overflow.
    Sub,
    /// Wrapping subtract.
    Subu,
    /// Bitwise and.
    And,
    /// Bitwise or.
    Or,
    /// Bitwise xor.
    Xor,
    /// Bitwise nor.
    Nor,
    /// Set on signed less-than.
    Slt,
    /// Set on unsigned less-than.
    Sltu,
    /// Shift left by `rt & 31`.
    Sllv,
    /// Logical shift right by `rt & 31`.
    Srlv,
    /// Arithmetic shift right by `rt & 31`.
    Srav,
    /// Low 32 bits of the signed product.
    Mul,
    /// `rd = rs` when `rt != 0`.
    Movn,
    /// `rd = rs` when `rt == 0`.
    Movz,
}

impl RegOp {
    /// Assembly mnemonic.
    pub const fn mnemonic(self) -> &'static str {
        match self {
            Self::Add => "add",
            Self::Addu => "addu",
            Self::Sub => "sub",
            Self::Subu => "subu",
            Self::And => "and",
            Self::Or => "or",
            Self::Xor => "xor",
            Self::Nor => "nor",
            Self::Slt => "slt",
            Self::Sltu => "sltu",
            Self::Sllv => "sllv",
            Self::Srlv => "srlv",
            Self::Srav => "srav",
            Self::Mul => "mul",
            Self::Movn => "movn",
            Self::Movz => "movz",
        }
    }
}

/// Register-immediate operations: `rt = rs op imm`, including constant shifts.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ImmOp {
    /// Signed add, traps on overflow.
    Addi,
    /// Wrapping add.
    Addiu,
    /// Set on signed less-than.
    Slti,
    /// Set on unsigned less-than (immediate sign-extended, compared unsigned).
    Sltiu,
    /// Bitwise and with the zero-extended immediate.
    Andi,
    /// Bitwise or with the zero-extended immediate.
    Ori,
    /// Bitwise xor with the zero-extended immediate.
    Xori,
    /// Shift left by a constant.
    Sll,
    /// Logical shift right by a constant.
    Srl,
    /// Arithmetic shift right by a constant.
    Sra,
}

impl ImmOp {
    /// Assembly mnemonic.
    pub const fn mnemonic(self) -> &'static str {
        match self {
            Self::Addi => "addi",
            Self::Addiu => "addiu",
            Self::Slti => "slti",
            Self::Sltiu => "sltiu",
            Self::Andi => "andi",
            Self::Ori => "ori",
            Self::Xori => "xori",
            Self::Sll => "sll",
            Self::Srl => "srl",
            Self::Sra => "sra",
        }
    }

    /// True for the zero-extended logical immediates, which display in hex.
    pub const fn is_logical(self) -> bool {
        matches!(self, Self::Andi | Self::Ori | Self::Xori)
    }

    /// True for the constant shifts, whose immediate is a 5-bit amount.
    pub const fn is_shift(self) -> bool {
        matches!(self, Self::Sll | Self::Srl | Self::Sra)
    }
}

/// Two-register operations that write or accumulate into `hi`/`lo`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum HiLoOp {
    /// Signed 64-bit product.
    Mult,
    /// Unsigned 64-bit product.
    Multu,
    /// Signed quotient in `lo`, remainder in `hi`.
    Div,
    /// Unsigned quotient in `lo`, remainder in `hi`.
    Divu,
    /// `hi:lo += rs * rt` (signed).
    Madd,
    /// `hi:lo += rs * rt` (unsigned).
    Maddu,
    /// `hi:lo -= rs * rt` (signed).
    Msub,
    /// `hi:lo -= rs * rt` (unsigned).
    Msubu,
}

impl HiLoOp {
    /// Assembly mnemonic.
    pub const fn mnemonic(self) -> &'static str {
        match self {
            Self::Mult => "mult",
            Self::Multu => "multu",
            Self::Div => "div",
            Self::Divu => "divu",
            Self::Madd => "madd",
            Self::Maddu => "maddu",
            Self::Msub => "msub",
            Self::Msubu => "msubu",
        }
    }
}

/// Single-source bit counting operations.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum CountOp {
    /// Count leading ones.
    Clo,
    /// Count leading zeros.
    Clz,
}

impl CountOp {
    /// Assembly mnemonic.
    pub const fn mnemonic(self) -> &'static str {
        match self {
            Self::Clo => "clo",
            Self::Clz => "clz",
        }
    }
}

/// Moves between a general register and `hi`/`lo`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum HiLoMove {
    /// `rd = hi`.
    Mfhi,
    /// `rd = lo`.
    Mflo,
    /// `hi = rs`.
    Mthi,
    /// `lo = rs`.
    Mtlo,
}

impl HiLoMove {
    /// Assembly mnemonic.
    pub const fn mnemonic(self) -> &'static str {
        match self {
            Self::Mfhi => "mfhi",
            Self::Mflo => "mflo",
            Self::Mthi => "mthi",
            Self::Mtlo => "mtlo",
        }
    }
}

/// Conditional branch conditions.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum BranchOp {
    /// `rs == rt`.
    Beq,
    /// `rs != rt`.
    Bne,
    /// `rs >= 0`.
    Bgez,
    /// `rs > 0`.
    Bgtz,
    /// `rs <= 0`.
    Blez,
    /// `rs < 0`.
    Bltz,
    /// `rs >= 0`, linking `$ra`.
    Bgezal,
    /// `rs < 0`, linking `$ra`.
    Bltzal,
}

impl BranchOp {
    /// Assembly mnemonic.
    pub const fn mnemonic(self) -> &'static str {
        match self {
            Self::Beq => "beq",
            Self::Bne => "bne",
            Self::Bgez => "bgez",
            Self::Bgtz => "bgtz",
            Self::Blez => "blez",
            Self::Bltz => "bltz",
            Self::Bgezal => "bgezal",
            Self::Bltzal => "bltzal",
        }
    }

    /// True for the two-register comparisons.
    pub const fn compares_registers(self) -> bool {
        matches!(self, Self::Beq | Self::Bne)
    }

    /// True for the variants that write the return address.
    pub const fn links(self) -> bool {
        matches!(self, Self::Bgezal | Self::Bltzal)
    }
}

/// Load and store operations.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum MemOp {
    /// Load word.
    Lw,
    /// Load sign-extended half.
    Lh,
    /// Load zero-extended half.
    Lhu,
    /// Load sign-extended byte.
    Lb,
    /// Load zero-extended byte.
    Lbu,
    /// Store word.
    Sw,
    /// Store low half.
    Sh,
    /// Store low byte.
    Sb,
    /// Load single into a float register.
    Lwc1,
    /// Store single from a float register.
    Swc1,
    /// Load double into an even float register pair.
    Ldc1,
    /// Store double from an even float register pair.
    Sdc1,
}

impl MemOp {
    /// Assembly mnemonic.
    pub const fn mnemonic(self) -> &'static str {
        match self {
            Self::Lw => "lw",
            Self::Lh => "lh",
            Self::Lhu => "lhu",
            Self::Lb => "lb",
            Self::Lbu => "lbu",
            Self::Sw => "sw",
            Self::Sh => "sh",
            Self::Sb => "sb",
            Self::Lwc1 => "lwc1",
            Self::Swc1 => "swc1",
            Self::Ldc1 => "ldc1",
            Self::Sdc1 => "sdc1",
        }
    }

    /// True if the operation writes memory.
    pub const fn is_store(self) -> bool {
        matches!(self, Self::Sw | Self::Sh | Self::Sb | Self::Swc1 | Self::Sdc1)
    }

    /// True if the data register is a float register.
    pub const fn is_float(self) -> bool {
        matches!(self, Self::Lwc1 | Self::Swc1 | Self::Ldc1 | Self::Sdc1)
    }

    /// Access width in bytes.
    pub const fn width(self) -> u32 {
        match self {
            Self::Lb | Self::Lbu | Self::Sb => 1,
            Self::Lh | Self::Lhu | Self::Sh => 2,
            Self::Lw | Self::Sw | Self::Lwc1 | Self::Swc1 => 4,
            Self::Ldc1 | Self::Sdc1 => 8,
        }
    }
}

/// Float precision selected by the `.s` / `.d` suffix.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Fmt {
    /// 32-bit single.
    Single,
    /// 64-bit double in an even/odd register pair.
    Double,
}

impl Fmt {
    /// Mnemonic suffix without the dot.
    pub const fn suffix(self) -> &'static str {
        match self {
            Self::Single => "s",
            Self::Double => "d",
        }
    }
}

/// Number formats accepted by `cvt`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum CvtFmt {
    /// Single precision.
    S,
    /// Double precision.
    D,
    /// 32-bit integer held in a float register.
    W,
}

impl CvtFmt {
    /// Mnemonic suffix without the dot.
    pub const fn suffix(self) -> &'static str {
        match self {
            Self::S => "s",
            Self::D => "d",
            Self::W => "w",
        }
    }
}

/// Binary float arithmetic.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum FloatOp {
    /// Addition.
    Add,
    /// Subtraction.
    Sub,
    /// Multiplication.
    Mul,
    /// Division.
    Div,
}

impl FloatOp {
    /// Mnemonic stem, before the precision suffix.
    pub const fn stem(self) -> &'static str {
        match self {
            Self::Add => "add",
            Self::Sub => "sub",
            Self::Mul => "mul",
            Self::Div => "div",
        }
    }
}

/// Unary float operations.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum FloatUnary {
    /// Absolute value.
    Abs,
    /// Negation.
    Neg,
    /// Square root.
    Sqrt,
    /// Register copy.
    Mov,
}

impl FloatUnary {
    /// Mnemonic stem, before the precision suffix.
    pub const fn stem(self) -> &'static str {
        match self {
            Self::Abs => "abs",
            Self::Neg => "neg",
            Self::Sqrt => "sqrt",
            Self::Mov => "mov",
        }
    }
}

/// Rounding used by the float-to-word conversions.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum RoundMode {
    /// Toward positive infinity.
    Ceil,
    /// Toward negative infinity.
    Floor,
    /// To nearest, ties to even.
    Round,
    /// Toward zero.
    Trunc,
}

impl RoundMode {
    /// Mnemonic stem, before `.w.<fmt>`.
    pub const fn stem(self) -> &'static str {
        match self {
            Self::Ceil => "ceil",
            Self::Floor => "floor",
            Self::Round => "round",
            Self::Trunc => "trunc",
        }
    }
}

/// Float compare conditions.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Cond {
    /// Equal.
    Eq,
    /// Less than.
    Lt,
    /// Less than or equal.
    Le,
}

impl Cond {
    /// Mnemonic stem, e.g. `c.eq`.
    pub const fn stem(self) -> &'static str {
        match self {
            Self::Eq => "c.eq",
            Self::Lt => "c.lt",
            Self::Le => "c.le",
        }
    }
}

/// Coarse instruction category for the instruction-mix counters.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum InstrClass {
    /// Integer arithmetic, logic, shifts, moves and `hi`/`lo` operations.
    Alu,
    /// Memory reads.
    Load,
    /// Memory writes.
    Store,
    /// Conditional branches.
    Branch,
    /// Unconditional jumps.
    Jump,
    /// Coprocessor 1 arithmetic, conversions, compares and moves.
    Float,
    /// System calls.
    Syscall,
    /// `nop` and `break`.
    Other,
}

/// A pseudo-instruction as written, with its canonical basic expansion.
#[derive(Clone, Debug, PartialEq)]
pub struct PseudoInstr {
    /// Source text of the pseudo-instruction, e.g. `li $v0, 10`.
    pub source: Arc<str>,
    /// Basic instructions in execution order.
    pub expansion: Vec<Instruction>,
}

/// One assembled machine operation.
#[derive(Clone, Debug, PartialEq)]
pub enum Instruction {
    /// `op rd, rs, rt`.
    Reg {
        /// Operation.
        op: RegOp,
        /// Destination.
        rd: Reg,
        /// First source.
        rs: Reg,
        /// Second source.
        rt: Reg,
    },
    /// `op rt, rs, imm`, or `op rd, rt, shamt` for constant shifts.
    Imm {
        /// Operation.
        op: ImmOp,
        /// Destination.
        rt: Reg,
        /// Source.
        rs: Reg,
        /// Immediate, already range-checked for `op`.
        imm: i32,
    },
    /// `lui rt, imm`.
    Lui {
        /// Destination.
        rt: Reg,
        /// Upper half.
        imm: u16,
    },
    /// `op rs, rt` writing `hi`/`lo`.
    HiLo {
        /// Operation.
        op: HiLoOp,
        /// First source.
        rs: Reg,
        /// Second source.
        rt: Reg,
    },
    /// `clo rd, rs` / `clz rd, rs`.
    Count {
        /// Operation.
        op: CountOp,
        /// Destination.
        rd: Reg,
        /// Source.
        rs: Reg,
    },
    /// `mfhi rd`, `mflo rd`, `mthi rs`, `mtlo rs`.
    HiLoMove {
        /// Direction and half.
        op: HiLoMove,
        /// The general register moved to or from.
        reg: Reg,
    },
    /// `j target` / `jal target`.
    Jump {
        /// Write the return address to `$ra`.
        link: bool,
        /// Absolute target address.
        target: u32,
        /// Label the target was written as; empty for numeric targets.
        label: Arc<str>,
    },
    /// `jr rs` / `jalr rd, rs`.
    JumpReg {
        /// Link register, `None` for `jr`.
        link: Option<Reg>,
        /// Register holding the target.
        rs: Reg,
    },
    /// Conditional branch to an absolute target.
    Branch {
        /// Condition.
        op: BranchOp,
        /// First compared register.
        rs: Reg,
        /// Second compared register (`beq`/`bne` only).
        rt: Reg,
        /// Absolute target address.
        target: u32,
        /// Label the target was written as; empty for numeric targets.
        label: Arc<str>,
    },
    /// `op.fmt fd, fs, ft`.
    FloatArith {
        /// Operation.
        op: FloatOp,
        /// Precision.
        fmt: Fmt,
        /// Destination.
        fd: FReg,
        /// First source.
        fs: FReg,
        /// Second source.
        ft: FReg,
    },
    /// `op.fmt fd, fs`.
    FloatUnary {
        /// Operation.
        op: FloatUnary,
        /// Precision.
        fmt: Fmt,
        /// Destination.
        fd: FReg,
        /// Source.
        fs: FReg,
    },
    /// `mode.w.fmt fd, fs`.
    FloatToWord {
        /// Rounding.
        mode: RoundMode,
        /// Source precision.
        fmt: Fmt,
        /// Destination (holds a 32-bit integer).
        fd: FReg,
        /// Source.
        fs: FReg,
    },
    /// `cvt.to.from fd, fs`.
    Convert {
        /// Target format.
        to: CvtFmt,
        /// Source format.
        from: CvtFmt,
        /// Destination.
        fd: FReg,
        /// Source.
        fs: FReg,
    },
    /// `c.cond.fmt flag, fs, ft`.
    Compare {
        /// Condition.
        cond: Cond,
        /// Precision.
        fmt: Fmt,
        /// Condition flag written (0-7).
        flag: usize,
        /// First source.
        fs: FReg,
        /// Second source.
        ft: FReg,
    },
    /// `bc1t flag, target` / `bc1f flag, target`.
    BranchFlag {
        /// Branch when the flag equals this value.
        when: bool,
        /// Condition flag tested (0-7).
        flag: usize,
        /// Absolute target address.
        target: u32,
        /// Label the target was written as.
        label: Arc<str>,
    },
    /// `mfc1 rt, fs` (`to_float == false`) or `mtc1 rt, fs`.
    MoveFloatWord {
        /// Copy from the general register into the float register.
        to_float: bool,
        /// General register.
        rt: Reg,
        /// Float register.
        fs: FReg,
    },
    /// `movn.fmt fd, fs, rt` / `movz.fmt fd, fs, rt`.
    FloatMoveCond {
        /// Move when `rt != 0` (`movn`) rather than `rt == 0` (`movz`).
        nonzero: bool,
        /// Precision.
        fmt: Fmt,
        /// Destination.
        fd: FReg,
        /// Source.
        fs: FReg,
        /// Tested general register.
        rt: Reg,
    },
    /// `movt rd, rs, flag` / `movf rd, rs, flag`.
    MoveOnFlag {
        /// Move when the flag equals this value.
        when: bool,
        /// Destination.
        rd: Reg,
        /// Source.
        rs: Reg,
        /// Condition flag tested (0-7).
        flag: usize,
    },
    /// `movt.fmt fd, fs, flag` / `movf.fmt fd, fs, flag`.
    FloatMoveOnFlag {
        /// Move when the flag equals this value.
        when: bool,
        /// Precision.
        fmt: Fmt,
        /// Destination.
        fd: FReg,
        /// Source.
        fs: FReg,
        /// Condition flag tested (0-7).
        flag: usize,
    },
    /// `op reg, offset(base)`.
    Mem {
        /// Operation.
        op: MemOp,
        /// Data register (float register for the coprocessor forms).
        reg: usize,
        /// Base register.
        base: Reg,
        /// Signed 16-bit displacement.
        offset: i32,
    },
    /// `nop`.
    Nop,
    /// `syscall`.
    Syscall,
    /// `break [code]`.
    Break {
        /// Optional code operand.
        code: u32,
    },
    /// A pseudo-instruction; the text segment only ever holds its expansion.
    Pseudo(PseudoInstr),
}

impl Instruction {
    /// Category used by the instruction-mix counters.
    pub fn class(&self) -> InstrClass {
        match self {
            Self::Reg { .. }
            | Self::Imm { .. }
            | Self::Lui { .. }
            | Self::HiLo { .. }
            | Self::Count { .. }
            | Self::HiLoMove { .. }
            | Self::MoveOnFlag { .. } => InstrClass::Alu,
            Self::Jump { .. } | Self::JumpReg { .. } => InstrClass::Jump,
            Self::Branch { .. } | Self::BranchFlag { .. } => InstrClass::Branch,
            Self::FloatArith { .. }
            | Self::FloatUnary { .. }
            | Self::FloatToWord { .. }
            | Self::Convert { .. }
            | Self::Compare { .. }
            | Self::MoveFloatWord { .. }
            | Self::FloatMoveCond { .. }
            | Self::FloatMoveOnFlag { .. } => InstrClass::Float,
            Self::Mem { op, .. } if op.is_store() => InstrClass::Store,
            Self::Mem { .. } => InstrClass::Load,
            Self::Syscall => InstrClass::Syscall,
            Self::Nop | Self::Break { .. } => InstrClass::Other,
            Self::Pseudo(p) => p
                .expansion
                .first()
                .map_or(InstrClass::Other, Instruction::class),
        }
    }

    /// Number of basic instructions this occupies in the text segment.
    pub fn size(&self) -> usize {
        match self {
            Self::Pseudo(p) => p.expansion.len(),
            _ => 1,
        }
    }

    /// The basic instructions this stands for, in execution order.
    pub fn basics(&self) -> &[Instruction] {
        match self {
            Self::Pseudo(p) => &p.expansion,
            other => std::slice::from_ref(other),
        }
    }
}
