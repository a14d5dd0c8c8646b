//! ALU logic, comparison and bit-counting operations.

use crate::isa::instruction::CountOp;

/// Set-on-less-than, signed.
pub const fn slt(a: i32, b: i32) -> i32 {
    (a < b) as i32
}

/// Set-on-less-than, unsigned.
pub const fn sltu(a: i32, b: i32) -> i32 {
    ((a as u32) < (b as u32)) as i32
}

/// Bitwise not-or.
pub const fn nor(a: i32, b: i32) -> i32 {
    !(a | b)
}

/// Counts leading ones (`clo`) or zeros (`clz`); 32 for an all-ones/all-zeros word.
pub const fn count(op: CountOp, a: i32) -> i32 {
    match op {
        CountOp::Clo => a.leading_ones() as i32,
        CountOp::Clz => a.leading_zeros() as i32,
    }
}
