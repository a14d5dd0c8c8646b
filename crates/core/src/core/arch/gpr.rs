//! General-Purpose Register File.
//!
//! This module implements the 32 integer registers. It performs the following:
//! 1. **Storage:** Maintains `$0`-`$31` as signed 32-bit words.
//! 2. **Invariant Enforcement:** Register `$zero` is hard-wired to zero.
//! 3. **Debugging:** Renders the register state for the console.

use crate::isa::abi::GPR_NAMES;

/// General-Purpose Register file.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Gpr {
    regs: [i32; 32],
}

impl Gpr {
    /// Creates a register file with every register zero.
    pub const fn new() -> Self {
        Self { regs: [0; 32] }
    }

    /// Reads a register. `$zero` always reads 0; indices past 31 read 0.
    ///
    /// # Arguments
    ///
    /// * `idx` - Register index (0-31).
    pub fn read(&self, idx: usize) -> i32 {
        if idx == 0 {
            0
        } else {
            self.regs.get(idx).copied().unwrap_or(0)
        }
    }

    /// Writes a register. Writes to `$zero` and out-of-range indices are ignored.
    ///
    /// # Arguments
    ///
    /// * `idx` - Register index (0-31).
    /// * `val` - The value to write.
    pub fn write(&mut self, idx: usize, val: i32) {
        if idx != 0
            && let Some(slot) = self.regs.get_mut(idx)
        {
            *slot = val;
        }
    }

    /// Formats all registers, two per line, as `$name = 0x...`.
    pub fn dump(&self) -> String {
        let mut out = String::new();
        for i in (0..32).step_by(2) {
            out.push_str(&format!(
                "${:<4} = {:#010x}  ${:<4} = {:#010x}\n",
                GPR_NAMES[i],
                self.read(i),
                GPR_NAMES[i + 1],
                self.read(i + 1)
            ));
        }
        out
    }
}

impl Default for Gpr {
    fn default() -> Self {
        Self::new()
    }
}
