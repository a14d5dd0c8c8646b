//! Floating-Point Register File.
//!
//! This module implements coprocessor 1's 32 registers. It performs the following:
//! 1. **Storage:** Each register holds a raw 32-bit pattern, so NaN payloads survive moves.
//! 2. **Type Conversion:** Views a register as a single, or an even/odd pair as a double.
//! 3. **Access Control:** Rejects doubles based at an odd register.

use crate::common::error::RuntimeError;
use crate::isa::abi::fpr_display;

/// Floating-Point Register file.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Fpr {
    bits: [u32; 32],
}

impl Fpr {
    /// Creates a register file with every register `+0.0`.
    pub const fn new() -> Self {
        Self { bits: [0; 32] }
    }

    /// Reads the raw bits of a register; out-of-range indices read 0.
    pub fn read_bits(&self, idx: usize) -> u32 {
        self.bits.get(idx).copied().unwrap_or(0)
    }

    /// Writes the raw bits of a register; out-of-range indices are ignored.
    pub fn write_bits(&mut self, idx: usize, val: u32) {
        if let Some(slot) = self.bits.get_mut(idx) {
            *slot = val;
        }
    }

    /// Reads a register as a single.
    pub fn get_float(&self, idx: usize) -> f32 {
        f32::from_bits(self.read_bits(idx))
    }

    /// Writes a single to a register.
    pub fn set_float(&mut self, idx: usize, val: f32) {
        self.write_bits(idx, val.to_bits());
    }

    /// Reads the raw 64-bit pattern of the pair based at `idx`.
    ///
    /// The even register holds the low word, the odd register the high word.
    ///
    /// # Returns
    ///
    /// The double's bits, or [`RuntimeError::InvalidRegister`] when `idx` is odd.
    pub fn get_double_bits(&self, idx: usize) -> Result<u64, RuntimeError> {
        Self::check_pair(idx)?;
        Ok(u64::from(self.read_bits(idx)) | (u64::from(self.read_bits(idx + 1)) << 32))
    }

    /// Writes the raw 64-bit pattern of the pair based at `idx`.
    pub fn set_double_bits(&mut self, idx: usize, val: u64) -> Result<(), RuntimeError> {
        Self::check_pair(idx)?;
        self.write_bits(idx, val as u32);
        self.write_bits(idx + 1, (val >> 32) as u32);
        Ok(())
    }

    /// Reads the pair based at `idx` as a double.
    pub fn get_double(&self, idx: usize) -> Result<f64, RuntimeError> {
        self.get_double_bits(idx).map(f64::from_bits)
    }

    /// Writes a double to the pair based at `idx`.
    pub fn set_double(&mut self, idx: usize, val: f64) -> Result<(), RuntimeError> {
        self.set_double_bits(idx, val.to_bits())
    }

    fn check_pair(idx: usize) -> Result<(), RuntimeError> {
        if idx % 2 == 0 && idx < 32 {
            Ok(())
        } else {
            Err(RuntimeError::InvalidRegister(fpr_display(idx)))
        }
    }
}

impl Default for Fpr {
    fn default() -> Self {
        Self::new()
    }
}
