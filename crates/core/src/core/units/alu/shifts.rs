//! ALU shift operations.
//!
//! Shift amounts are masked to 5 bits (0-31); `srl` shifts in zeros and `sra`
//! replicates the sign bit.

/// Bit mask for a shift amount.
const SHAMT_MASK: u32 = 0x1f;

/// Shift left logical.
pub const fn sll(a: i32, amount: i32) -> i32 {
    ((a as u32) << (amount as u32 & SHAMT_MASK)) as i32
}

/// Shift right logical.
pub const fn srl(a: i32, amount: i32) -> i32 {
    ((a as u32) >> (amount as u32 & SHAMT_MASK)) as i32
}

/// Shift right arithmetic.
pub const fn sra(a: i32, amount: i32) -> i32 {
    a >> (amount as u32 & SHAMT_MASK)
}
