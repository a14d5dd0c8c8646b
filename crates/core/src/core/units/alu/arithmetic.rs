//! ALU arithmetic operations.
//!
//! Implements addition, subtraction and the `hi`/`lo` multiply/divide family
//! on 32-bit two's complement operands. The trapping forms (`add`, `addi`,
//! `sub`) report signed overflow instead of wrapping; division by zero is a
//! runtime error rather than an unpredictable result.

use crate::common::error::RuntimeError;
use crate::isa::instruction::HiLoOp;

/// Number of bits in a register (used to split 64-bit products).
const WORD_BITS: u32 = 32;

/// Signed addition that fails on overflow.
pub fn add_checked(a: i32, b: i32) -> Result<i32, RuntimeError> {
    a.checked_add(b).ok_or(RuntimeError::ArithmeticOverflow)
}

/// Signed subtraction that fails on overflow.
pub fn sub_checked(a: i32, b: i32) -> Result<i32, RuntimeError> {
    a.checked_sub(b).ok_or(RuntimeError::ArithmeticOverflow)
}

/// Joins `hi:lo` into one 64-bit accumulator.
const fn join(hi: i32, lo: i32) -> u64 {
    ((hi as u32 as u64) << WORD_BITS) | lo as u32 as u64
}

/// Splits a 64-bit accumulator into `(hi, lo)`.
const fn split(acc: u64) -> (i32, i32) {
    ((acc >> WORD_BITS) as i32, acc as i32)
}

/// Executes a `hi`/`lo` operation.
///
/// # Arguments
///
/// * `op` - The operation.
/// * `a`  - Value of `rs`.
/// * `b`  - Value of `rt`.
/// * `hi` - Current `hi`, read by the accumulating forms.
/// * `lo` - Current `lo`, read by the accumulating forms.
///
/// # Returns
///
/// The new `(hi, lo)` pair. Division leaves the remainder in `hi` and the
/// quotient in `lo`; `i32::MIN / -1` wraps. Dividing by zero fails with
/// [`RuntimeError::DivideByZero`].
pub fn hilo(op: HiLoOp, a: i32, b: i32, hi: i32, lo: i32) -> Result<(i32, i32), RuntimeError> {
    let signed = (a as i64).wrapping_mul(b as i64) as u64;
    let unsigned = (a as u32 as u64) * (b as u32 as u64);
    Ok(match op {
        HiLoOp::Mult => split(signed),
        HiLoOp::Multu => split(unsigned),
        HiLoOp::Madd => split(join(hi, lo).wrapping_add(signed)),
        HiLoOp::Maddu => split(join(hi, lo).wrapping_add(unsigned)),
        HiLoOp::Msub => split(join(hi, lo).wrapping_sub(signed)),
        HiLoOp::Msubu => split(join(hi, lo).wrapping_sub(unsigned)),
        HiLoOp::Div => {
            if b == 0 {
                return Err(RuntimeError::DivideByZero);
            }
            (a.wrapping_rem(b), a.wrapping_div(b))
        }
        HiLoOp::Divu => {
            if b == 0 {
                return Err(RuntimeError::DivideByZero);
            }
            let (x, y) = (a as u32, b as u32);
            ((x % y) as i32, (x / y) as i32)
        }
    })
}
