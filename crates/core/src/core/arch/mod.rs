//! Architectural state.
//!
//! This module contains the register state the interpreter mutates. It includes:
//! 1. **GPRs:** The 32 integer registers.
//! 2. **FPRs:** The 32 coprocessor 1 registers with single/double views.
//! 3. **Register File:** [`RegisterFile`], bundling both with `pc`, `hi`, `lo` and the
//!    eight floating-point condition flags.

/// Floating-Point Register file implementation.
pub mod fpr;

/// General-Purpose Register file implementation.
pub mod gpr;

use crate::common::constants::{GP_INIT, NUM_FLAGS, SP_INIT, TEXT_BASE};
use crate::isa::abi::{REG_GP, REG_SP, REG_ZERO};

use self::fpr::Fpr;
use self::gpr::Gpr;

/// Complete register state of one run.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RegisterFile {
    /// Integer registers.
    pub gpr: Gpr,
    /// Float registers.
    pub fpr: Fpr,
    /// Address of the next instruction.
    pub pc: u32,
    /// High word of the multiply/divide result.
    pub hi: i32,
    /// Low word of the multiply/divide result.
    pub lo: i32,
    flags: [bool; NUM_FLAGS],
}

/// Deterministic non-zero filler for register `idx`.
fn garbage_word(idx: usize) -> i32 {
    let mixed = (idx as u32 + 1).wrapping_mul(0x9E37_79B9).rotate_left(7) ^ 0xDEAD_BEEF;
    mixed as i32 | 1
}

impl RegisterFile {
    /// Creates the reset state: `$sp`, `$gp` and `pc` at their initial values and
    /// every other register zero.
    ///
    /// # Arguments
    ///
    /// * `entry` - Initial program counter.
    /// * `garbage` - Fill the remaining integer and float registers with
    ///   deterministic non-zero values instead of zero.
    pub fn new(entry: u32, garbage: bool) -> Self {
        let mut gpr = Gpr::new();
        let mut fpr = Fpr::new();
        if garbage {
            for idx in 0..32 {
                gpr.write(idx, garbage_word(idx));
                fpr.write_bits(idx, garbage_word(idx + 32) as u32);
            }
        }
        gpr.write(REG_ZERO, 0);
        gpr.write(REG_SP, SP_INIT as i32);
        gpr.write(REG_GP, GP_INIT as i32);
        let (hi, lo) = if garbage {
            (garbage_word(64), garbage_word(65))
        } else {
            (0, 0)
        };
        Self {
            gpr,
            fpr,
            pc: entry,
            hi,
            lo,
            flags: [false; NUM_FLAGS],
        }
    }

    /// Reads an integer register.
    pub fn read(&self, idx: usize) -> i32 {
        self.gpr.read(idx)
    }

    /// Writes an integer register; writes to `$zero` are ignored.
    pub fn write(&mut self, idx: usize, val: i32) {
        self.gpr.write(idx, val);
    }

    /// Reads condition flag `idx` (0-7); out-of-range flags read false.
    pub fn flag(&self, idx: usize) -> bool {
        self.flags.get(idx).copied().unwrap_or(false)
    }

    /// Sets condition flag `idx` (0-7); out-of-range flags are ignored.
    pub fn set_flag(&mut self, idx: usize, val: bool) {
        if let Some(slot) = self.flags.get_mut(idx) {
            *slot = val;
        }
    }

    /// All eight condition flags.
    pub const fn flags(&self) -> [bool; NUM_FLAGS] {
        self.flags
    }
}

impl Default for RegisterFile {
    fn default() -> Self {
        Self::new(TEXT_BASE, false)
    }
}
