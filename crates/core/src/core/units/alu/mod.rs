//! Arithmetic Logic Unit (ALU).
//!
//! This module implements the integer operations of the interpreter on 32-bit
//! registers. Operations are organized into submodules by category:
//! - [`arithmetic`]: add/sub with overflow traps, multiply/divide into `hi`/`lo`
//! - [`logic`]:      nor, slt, sltu, clo, clz
//! - [`shifts`]:     sll, srl, sra and their variable forms

/// Integer arithmetic operations (add, subtract, multiply, divide).
pub mod arithmetic;

/// Bitwise logical, comparison and bit-count operations.
pub mod logic;

/// Shift operations (sll, srl, sra).
pub mod shifts;

use crate::common::error::RuntimeError;
use crate::isa::instruction::{ImmOp, RegOp};

/// Arithmetic Logic Unit (ALU) for integer operations.
#[derive(Debug)]
pub struct Alu;

impl Alu {
    /// Executes a three-register operation.
    ///
    /// # Arguments
    ///
    /// * `op` - The operation.
    /// * `a`  - Value of `rs`.
    /// * `b`  - Value of `rt` (the shift amount for the variable shifts).
    ///
    /// # Returns
    ///
    /// The value to write to `rd`. The conditional moves return `a`; whether it is
    /// written depends on `b` and is decided by the caller.
    ///
    /// # Examples
    ///
    /// ```
    /// use mipsim_core::core::units::alu::Alu;
    /// use mipsim_core::isa::instruction::RegOp;
    ///
    /// assert_eq!(Alu::reg(RegOp::Addu, i32::MAX, 1), Ok(i32::MIN));
    /// assert!(Alu::reg(RegOp::Add, i32::MAX, 1).is_err());
    /// assert_eq!(Alu::reg(RegOp::Sllv, 1, 4), Ok(16));
    /// ```
    pub fn reg(op: RegOp, a: i32, b: i32) -> Result<i32, RuntimeError> {
        Ok(match op {
            RegOp::Add => arithmetic::add_checked(a, b)?,
            RegOp::Sub => arithmetic::sub_checked(a, b)?,
            RegOp::Addu => a.wrapping_add(b),
            RegOp::Subu => a.wrapping_sub(b),
            RegOp::Mul => a.wrapping_mul(b),
            RegOp::And => a & b,
            RegOp::Or => a | b,
            RegOp::Xor => a ^ b,
            RegOp::Nor => logic::nor(a, b),
            RegOp::Slt => logic::slt(a, b),
            RegOp::Sltu => logic::sltu(a, b),
            RegOp::Sllv => shifts::sll(a, b),
            RegOp::Srlv => shifts::srl(a, b),
            RegOp::Srav => shifts::sra(a, b),
            RegOp::Movn | RegOp::Movz => a,
        })
    }

    /// Executes a register-immediate operation.
    ///
    /// The logical forms zero-extend the low 16 bits of `imm`; the arithmetic and
    /// compare forms use it sign-extended; shifts use it as the amount.
    pub fn imm(op: ImmOp, a: i32, imm: i32) -> Result<i32, RuntimeError> {
        let zext = imm & 0xFFFF;
        Ok(match op {
            ImmOp::Addi => arithmetic::add_checked(a, imm)?,
            ImmOp::Addiu => a.wrapping_add(imm),
            ImmOp::Slti => logic::slt(a, imm),
            ImmOp::Sltiu => logic::sltu(a, imm),
            ImmOp::Andi => a & zext,
            ImmOp::Ori => a | zext,
            ImmOp::Xori => a ^ zext,
            ImmOp::Sll => shifts::sll(a, imm),
            ImmOp::Srl => shifts::srl(a, imm),
            ImmOp::Sra => shifts::sra(a, imm),
        })
    }
}
