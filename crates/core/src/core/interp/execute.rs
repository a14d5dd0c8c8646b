//! Instruction dispatch.
//!
//! One exhaustive match over [`Instruction`]. Operands are read before any write so
//! a faulting instruction leaves the state untouched; the caller advances `pc`
//! according to the returned [`Flow`].

use tracing::debug;

use super::{Flow, Interpreter};
use crate::common::constants::INSTRUCTION_BYTES;
use crate::common::error::RuntimeError;
use crate::core::units::alu::{Alu, arithmetic, logic};
use crate::core::units::fpu::Fpu;
use crate::core::units::fpu::rounding_modes::to_word;
use crate::debug::ResumeMode;
use crate::isa::abi::REG_RA;
use crate::isa::instruction::{
    BranchOp, CvtFmt, Fmt, HiLoMove, Instruction, MemOp, RegOp, RoundMode,
};
use crate::soc::memory::Width;

const fn branch_taken(op: BranchOp, a: i32, b: i32) -> bool {
    match op {
        BranchOp::Beq => a == b,
        BranchOp::Bne => a != b,
        BranchOp::Bgez | BranchOp::Bgezal => a >= 0,
        BranchOp::Bgtz => a > 0,
        BranchOp::Blez => a <= 0,
        BranchOp::Bltz | BranchOp::Bltzal => a < 0,
    }
}

impl Interpreter {
    /// Executes `instr`, located at `pc`, against the current state.
    ///
    /// # Returns
    ///
    /// Where control goes next, or the fault the instruction raised.
    pub(crate) fn execute(&mut self, instr: &Instruction, pc: u32) -> Result<Flow, RuntimeError> {
        let link = pc.wrapping_add(INSTRUCTION_BYTES) as i32;
        match instr {
            Instruction::Reg { op, rd, rs, rt } => {
                let (a, b) = (self.regs.read(*rs), self.regs.read(*rt));
                let value = Alu::reg(*op, a, b)?;
                let write = match op {
                    RegOp::Movn => b != 0,
                    RegOp::Movz => b == 0,
                    _ => true,
                };
                if write {
                    self.regs.write(*rd, value);
                }
            }
            Instruction::Imm { op, rt, rs, imm } => {
                let value = Alu::imm(*op, self.regs.read(*rs), *imm)?;
                self.regs.write(*rt, value);
            }
            Instruction::Lui { rt, imm } => self.regs.write(*rt, i32::from(*imm) << 16),
            Instruction::HiLo { op, rs, rt } => {
                let (hi, lo) = arithmetic::hilo(
                    *op,
                    self.regs.read(*rs),
                    self.regs.read(*rt),
                    self.regs.hi,
                    self.regs.lo,
                )?;
                self.regs.hi = hi;
                self.regs.lo = lo;
            }
            Instruction::Count { op, rd, rs } => {
                let value = logic::count(*op, self.regs.read(*rs));
                self.regs.write(*rd, value);
            }
            Instruction::HiLoMove { op, reg } => match op {
                HiLoMove::Mfhi => self.regs.write(*reg, self.regs.hi),
                HiLoMove::Mflo => self.regs.write(*reg, self.regs.lo),
                HiLoMove::Mthi => self.regs.hi = self.regs.read(*reg),
                HiLoMove::Mtlo => self.regs.lo = self.regs.read(*reg),
            },
            Instruction::Jump {
                link: linked,
                target,
                ..
            } => {
                if *linked {
                    self.regs.write(REG_RA, link);
                }
                return Ok(Flow::Jump(*target));
            }
            Instruction::JumpReg { link: dest, rs } => {
                let target = self.regs.read(*rs) as u32;
                if let Some(rd) = dest {
                    self.regs.write(*rd, link);
                }
                return Ok(Flow::Jump(target));
            }
            Instruction::Branch {
                op, rs, rt, target, ..
            } => {
                let taken = branch_taken(*op, self.regs.read(*rs), self.regs.read(*rt));
                if op.links() {
                    self.regs.write(REG_RA, link);
                }
                if taken {
                    return Ok(Flow::Jump(*target));
                }
            }
            Instruction::FloatArith {
                op,
                fmt,
                fd,
                fs,
                ft,
            } => match fmt {
                Fmt::Single => {
                    let v = Fpu::arith_s(*op, self.regs.fpr.get_float(*fs), self.regs.fpr.get_float(*ft));
                    self.regs.fpr.set_float(*fd, v);
                }
                Fmt::Double => {
                    let (a, b) = (self.regs.fpr.get_double(*fs)?, self.regs.fpr.get_double(*ft)?);
                    self.regs.fpr.set_double(*fd, Fpu::arith_d(*op, a, b))?;
                }
            },
            Instruction::FloatUnary { op, fmt, fd, fs } => match fmt {
                Fmt::Single => {
                    let v = Fpu::unary_s(*op, self.regs.fpr.get_float(*fs));
                    self.regs.fpr.set_float(*fd, v);
                }
                Fmt::Double => {
                    let bits = self.regs.fpr.get_double_bits(*fs)?;
                    let v = Fpu::unary_d(*op, f64::from_bits(bits));
                    self.regs.fpr.set_double(*fd, v)?;
                }
            },
            Instruction::FloatToWord { mode, fmt, fd, fs } => {
                let x = self.float_operand(*fmt, *fs)?;
                self.regs.fpr.write_bits(*fd, to_word(*mode, x) as u32);
            }
            Instruction::Convert { to, from, fd, fs } => {
                let x = match from {
                    CvtFmt::W => f64::from(self.regs.fpr.read_bits(*fs) as i32),
                    CvtFmt::S => f64::from(self.regs.fpr.get_float(*fs)),
                    CvtFmt::D => self.regs.fpr.get_double(*fs)?,
                };
                match to {
                    CvtFmt::W => self
                        .regs
                        .fpr
                        .write_bits(*fd, to_word(RoundMode::Round, x) as u32),
                    CvtFmt::S => self.regs.fpr.set_float(*fd, x as f32),
                    CvtFmt::D => self.regs.fpr.set_double(*fd, x)?,
                }
            }
            Instruction::Compare {
                cond,
                fmt,
                flag,
                fs,
                ft,
            } => {
                let result = match fmt {
                    Fmt::Single => Fpu::compare(
                        *cond,
                        self.regs.fpr.get_float(*fs),
                        self.regs.fpr.get_float(*ft),
                    ),
                    Fmt::Double => Fpu::compare(
                        *cond,
                        self.regs.fpr.get_double(*fs)?,
                        self.regs.fpr.get_double(*ft)?,
                    ),
                };
                self.regs.set_flag(*flag, result);
            }
            Instruction::BranchFlag {
                when, flag, target, ..
            } => {
                if self.regs.flag(*flag) == *when {
                    return Ok(Flow::Jump(*target));
                }
            }
            Instruction::MoveFloatWord { to_float, rt, fs } => {
                if *to_float {
                    self.regs.fpr.write_bits(*fs, self.regs.read(*rt) as u32);
                } else {
                    self.regs.write(*rt, self.regs.fpr.read_bits(*fs) as i32);
                }
            }
            Instruction::FloatMoveCond {
                nonzero,
                fmt,
                fd,
                fs,
                rt,
            } => {
                if (self.regs.read(*rt) != 0) == *nonzero {
                    self.move_float(*fmt, *fd, *fs)?;
                }
            }
            Instruction::MoveOnFlag { when, rd, rs, flag } => {
                if self.regs.flag(*flag) == *when {
                    self.regs.write(*rd, self.regs.read(*rs));
                }
            }
            Instruction::FloatMoveOnFlag {
                when,
                fmt,
                fd,
                fs,
                flag,
            } => {
                if self.regs.flag(*flag) == *when {
                    self.move_float(*fmt, *fd, *fs)?;
                }
            }
            Instruction::Mem {
                op,
                reg,
                base,
                offset,
            } => {
                let addr = (self.regs.read(*base) as u32).wrapping_add(*offset as u32);
                self.memory(*op, *reg, addr)?;
            }
            Instruction::Nop => {}
            Instruction::Syscall => return self.syscall(),
            Instruction::Break { code } => {
                debug!(pc, code, "break");
                if self.debugger.enabled() {
                    self.debugger.resume(ResumeMode::Step);
                }
            }
            Instruction::Pseudo(_) => return Err(RuntimeError::InvalidProgramCounter(pc)),
        }
        Ok(Flow::Next)
    }

    fn float_operand(&self, fmt: Fmt, reg: usize) -> Result<f64, RuntimeError> {
        Ok(match fmt {
            Fmt::Single => f64::from(self.regs.fpr.get_float(reg)),
            Fmt::Double => self.regs.fpr.get_double(reg)?,
        })
    }

    fn move_float(&mut self, fmt: Fmt, fd: usize, fs: usize) -> Result<(), RuntimeError> {
        match fmt {
            Fmt::Single => self.regs.fpr.write_bits(fd, self.regs.fpr.read_bits(fs)),
            Fmt::Double => {
                let bits = self.regs.fpr.get_double_bits(fs)?;
                self.regs.fpr.set_double_bits(fd, bits)?;
            }
        }
        Ok(())
    }

    fn memory(&mut self, op: MemOp, reg: usize, addr: u32) -> Result<(), RuntimeError> {
        match op {
            MemOp::Lw => {
                let v = self.mem.get_word(addr)?;
                self.regs.write(reg, v);
            }
            MemOp::Lh => {
                let v = self.mem.get_half(addr)?;
                self.regs.write(reg, i32::from(v));
            }
            MemOp::Lhu => {
                let v = self.mem.get_half(addr)?;
                self.regs.write(reg, i32::from(v as u16));
            }
            MemOp::Lb => {
                let v = self.mem.get_byte(addr)?;
                self.regs.write(reg, i32::from(v));
            }
            MemOp::Lbu => {
                let v = self.mem.get_byte(addr)?;
                self.regs.write(reg, i32::from(v as u8));
            }
            MemOp::Sw => self.mem.set_word(addr, self.regs.read(reg))?,
            MemOp::Sh => self.mem.set_half(addr, self.regs.read(reg) as i16)?,
            MemOp::Sb => self.mem.set_byte(addr, self.regs.read(reg) as u8)?,
            MemOp::Lwc1 => {
                let v = self.mem.get_word(addr)?;
                self.regs.fpr.write_bits(reg, v as u32);
            }
            MemOp::Swc1 => self.mem.set_word(addr, self.regs.fpr.read_bits(reg) as i32)?,
            MemOp::Ldc1 => {
                if reg % 2 != 0 {
                    return Err(RuntimeError::InvalidRegister(format!("$f{reg}")));
                }
                let bits = self.mem.get_bits(addr, Width::Double)?;
                self.regs.fpr.set_double_bits(reg, bits)?;
            }
            MemOp::Sdc1 => {
                let bits = self.regs.fpr.get_double_bits(reg)?;
                self.mem.set_double(addr, f64::from_bits(bits))?;
            }
        }
        Ok(())
    }
}
