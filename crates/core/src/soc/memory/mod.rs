//! Segmented System Memory.
//!
//! This module implements the byte-addressable, little-endian memory of one run.
//! It provides:
//! 1. **Storage:** A sparse byte map; bytes never written read as zero, or as
//!    deterministic non-zero filler when garbage memory is enabled.
//! 2. **Protection:** Typed accessors enforce natural alignment and reject
//!    addresses outside the data/heap/stack range and the MMIO terminal.
//! 3. **Privileged Access:** [`Privileged`] bypasses protection for the loader and
//!    for step-back, which may need to restore bytes to their never-written state.
//! 4. **Heap and Labels:** The heap break for `sbrk`, and symbol lookups for the debugger.

/// Memory-mapped terminal buffer.
pub mod mmio;

use std::collections::HashMap;
use std::sync::Arc;

use crate::asm::program::{Program, SymbolTable};
use crate::common::constants::{
    DATA_SEGMENT_BASE, HEAP_BASE, MMIO_BASE, MMIO_SIZE, SP_INIT, USER_LIMIT,
};
use crate::common::error::RuntimeError;

/// Longest string a syscall or label lookup will read before giving up on a terminator.
pub const MAX_STRING_LEN: usize = 1 << 16;

/// Access width of a typed memory operation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Width {
    /// 1 byte.
    Byte,
    /// 2 bytes.
    Half,
    /// 4 bytes, integer view.
    Word,
    /// 4 bytes, single-precision view.
    Float,
    /// 8 bytes, double-precision view.
    Double,
}

impl Width {
    /// Size in bytes, which is also the required alignment.
    pub const fn bytes(self) -> u32 {
        match self {
            Self::Byte => 1,
            Self::Half => 2,
            Self::Word | Self::Float => 4,
            Self::Double => 8,
        }
    }
}

/// Deterministic non-zero filler byte for an address that was never written.
pub const fn filler(addr: u32) -> u8 {
    let mixed = addr.wrapping_mul(0x9E37_79B1).rotate_left(13) ^ 0xA5A5_A5A5;
    let byte = (mixed >> 24) as u8;
    if byte == 0 { 0xA5 } else { byte }
}

/// True if `addr` lies in a user-accessible region.
const fn user_accessible(addr: u32) -> bool {
    (addr >= DATA_SEGMENT_BASE && addr <= USER_LIMIT)
        || (addr >= MMIO_BASE && addr - MMIO_BASE < MMIO_SIZE)
}

/// Memory of one run.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Memory {
    bytes: HashMap<u32, u8>,
    garbage: bool,
    heap_top: u32,
    symbols: Arc<SymbolTable>,
}

impl Memory {
    /// Creates an empty memory with no symbols.
    ///
    /// # Arguments
    ///
    /// * `garbage` - Never-written bytes read as [`filler`] instead of zero.
    pub fn new(garbage: bool) -> Self {
        Self {
            bytes: HashMap::new(),
            garbage,
            heap_top: HEAP_BASE,
            symbols: Arc::default(),
        }
    }

    /// Creates the memory of a fresh run of `program`: its data segment loaded and
    /// its symbol table available for label lookups.
    pub fn with_program(program: &Program, garbage: bool) -> Self {
        let mut mem = Self::new(garbage);
        mem.bytes.extend(program.data.iter().map(|(&a, &b)| (a, b)));
        mem.symbols = Arc::clone(&program.symbols);
        mem
    }

    /// Reads a byte without any checks; used for external inspection.
    pub fn peek(&self, addr: u32) -> u8 {
        match self.bytes.get(&addr) {
            Some(&b) => b,
            None if self.garbage => filler(addr),
            None => 0,
        }
    }

    /// Reads `width` little-endian bytes without any checks.
    pub fn peek_bits(&self, addr: u32, width: Width) -> u64 {
        self.load_unchecked(addr, width)
    }

    /// True if the byte at `addr` has ever been written.
    pub fn is_initialized(&self, addr: u32) -> bool {
        self.bytes.contains_key(&addr)
    }

    /// Bit `i` set when byte `addr + i` has been written, for `i` below the width.
    pub fn initialized_mask(&self, addr: u32, width: Width) -> u8 {
        (0..width.bytes()).fold(0, |mask, i| {
            if self.is_initialized(addr.wrapping_add(i)) {
                mask | (1 << i)
            } else {
                mask
            }
        })
    }

    fn check(addr: u32, width: u32) -> Result<(), RuntimeError> {
        if addr % width != 0 {
            return Err(RuntimeError::MisalignedAccess { addr, width });
        }
        let last = addr
            .checked_add(width - 1)
            .ok_or(RuntimeError::AddressOutOfRange(addr))?;
        if user_accessible(addr) && user_accessible(last) {
            Ok(())
        } else {
            Err(RuntimeError::AddressOutOfRange(addr))
        }
    }

    fn load(&self, addr: u32, width: Width) -> Result<u64, RuntimeError> {
        Self::check(addr, width.bytes())?;
        Ok(self.load_unchecked(addr, width))
    }

    fn load_unchecked(&self, addr: u32, width: Width) -> u64 {
        (0..width.bytes()).fold(0, |acc, i| {
            acc | (u64::from(self.peek(addr.wrapping_add(i))) << (8 * i))
        })
    }

    fn store(&mut self, addr: u32, width: Width, value: u64) -> Result<(), RuntimeError> {
        Self::check(addr, width.bytes())?;
        self.store_unchecked(addr, width, value);
        Ok(())
    }

    fn store_unchecked(&mut self, addr: u32, width: Width, value: u64) {
        for i in 0..width.bytes() {
            let _ = self.bytes.insert(addr.wrapping_add(i), (value >> (8 * i)) as u8);
        }
    }

    /// Reads the raw little-endian bits of an access of `width`, with protection.
    pub fn get_bits(&self, addr: u32, width: Width) -> Result<u64, RuntimeError> {
        self.load(addr, width)
    }

    /// Reads a signed word.
    pub fn get_word(&self, addr: u32) -> Result<i32, RuntimeError> {
        self.load(addr, Width::Word).map(|v| v as i32)
    }

    /// Reads a signed half; cast to `u16` for the unsigned view.
    pub fn get_half(&self, addr: u32) -> Result<i16, RuntimeError> {
        self.load(addr, Width::Half).map(|v| v as i16)
    }

    /// Reads a signed byte; cast to `u8` for the unsigned view.
    pub fn get_byte(&self, addr: u32) -> Result<i8, RuntimeError> {
        self.load(addr, Width::Byte).map(|v| v as i8)
    }

    /// Reads a single.
    pub fn get_float(&self, addr: u32) -> Result<f32, RuntimeError> {
        self.load(addr, Width::Float).map(|v| f32::from_bits(v as u32))
    }

    /// Reads a double (8-byte aligned).
    pub fn get_double(&self, addr: u32) -> Result<f64, RuntimeError> {
        self.load(addr, Width::Double).map(f64::from_bits)
    }

    /// Writes a word.
    pub fn set_word(&mut self, addr: u32, value: i32) -> Result<(), RuntimeError> {
        self.store(addr, Width::Word, u64::from(value as u32))
    }

    /// Writes a half.
    pub fn set_half(&mut self, addr: u32, value: i16) -> Result<(), RuntimeError> {
        self.store(addr, Width::Half, u64::from(value as u16))
    }

    /// Writes a byte.
    pub fn set_byte(&mut self, addr: u32, value: u8) -> Result<(), RuntimeError> {
        self.store(addr, Width::Byte, u64::from(value))
    }

    /// Writes a single.
    pub fn set_float(&mut self, addr: u32, value: f32) -> Result<(), RuntimeError> {
        self.store(addr, Width::Float, u64::from(value.to_bits()))
    }

    /// Writes a double (8-byte aligned).
    pub fn set_double(&mut self, addr: u32, value: f64) -> Result<(), RuntimeError> {
        self.store(addr, Width::Double, value.to_bits())
    }

    /// Reads `len` consecutive bytes with protection.
    pub fn read_bytes(&self, addr: u32, len: usize) -> Result<Vec<u8>, RuntimeError> {
        (0..len)
            .map(|i| self.get_byte(addr.wrapping_add(i as u32)).map(|b| b as u8))
            .collect()
    }

    /// Writes consecutive bytes with protection; nothing is written if any byte is out of range.
    pub fn write_bytes(&mut self, addr: u32, data: &[u8]) -> Result<(), RuntimeError> {
        for i in 0..data.len() {
            Self::check(addr.wrapping_add(i as u32), 1)?;
        }
        for (i, &b) in data.iter().enumerate() {
            let _ = self.bytes.insert(addr.wrapping_add(i as u32), b);
        }
        Ok(())
    }

    /// Reads a null-terminated string starting at `addr`.
    ///
    /// Reading stops at the terminator or after [`MAX_STRING_LEN`] bytes.
    pub fn read_cstring(&self, addr: u32) -> Result<Vec<u8>, RuntimeError> {
        let mut out = Vec::new();
        for i in 0..MAX_STRING_LEN {
            let b = self.get_byte(addr.wrapping_add(i as u32))? as u8;
            if b == 0 {
                break;
            }
            out.push(b);
        }
        Ok(out)
    }

    /// Current heap break.
    pub const fn heap_top(&self) -> u32 {
        self.heap_top
    }

    /// Extends the heap by `amount` bytes, rounded up to a word multiple.
    ///
    /// # Returns
    ///
    /// The address of the new block. A negative amount fails with
    /// [`RuntimeError::InvalidInput`]; growing into the stack fails with
    /// [`RuntimeError::AddressOutOfRange`].
    pub fn sbrk(&mut self, amount: i32) -> Result<u32, RuntimeError> {
        let amount = u32::try_from(amount)
            .map_err(|_| RuntimeError::InvalidInput(format!("sbrk amount {amount}")))?;
        let block = self.heap_top;
        let rounded = amount.div_ceil(4) * 4;
        let next = block
            .checked_add(rounded)
            .filter(|&n| n <= SP_INIT)
            .ok_or(RuntimeError::AddressOutOfRange(block))?;
        self.heap_top = next;
        Ok(block)
    }

    /// The program's symbol table.
    pub fn symbols(&self) -> &SymbolTable {
        &self.symbols
    }

    /// Address bound to `label`.
    pub fn label_address(&self, label: &str) -> Option<u32> {
        self.symbols.get(label)
    }

    /// Null-terminated string stored at `label`.
    ///
    /// # Returns
    ///
    /// `Ok(None)` for an unknown label; bytes map one-to-one onto characters.
    pub fn label_string(&self, label: &str) -> Result<Option<String>, RuntimeError> {
        let Some(addr) = self.label_address(label) else {
            return Ok(None);
        };
        let bytes = self.read_cstring(addr)?;
        Ok(Some(bytes.into_iter().map(char::from).collect()))
    }

    /// Grants unprotected access until the returned guard is dropped.
    pub const fn privileged(&mut self) -> Privileged<'_> {
        Privileged { mem: self }
    }
}

/// Unprotected view of [`Memory`]; alignment and segment checks are skipped.
#[derive(Debug)]
pub struct Privileged<'a> {
    mem: &'a mut Memory,
}

impl Privileged<'_> {
    /// Writes the low `width` bytes of `value` little-endian at `addr`.
    pub fn set_bits(&mut self, addr: u32, width: Width, value: u64) {
        self.mem.store_unchecked(addr, width, value);
    }

    /// Reads `width` bytes at `addr` without checks.
    pub fn get_bits(&self, addr: u32, width: Width) -> u64 {
        self.mem.load_unchecked(addr, width)
    }

    /// Writes one byte.
    pub fn set_byte(&mut self, addr: u32, value: u8) {
        let _ = self.mem.bytes.insert(addr, value);
    }

    /// Returns a byte to its never-written state.
    pub fn forget(&mut self, addr: u32) {
        let _ = self.mem.bytes.remove(&addr);
    }

    /// Sets the heap break.
    pub fn set_heap_top(&mut self, top: u32) {
        self.mem.heap_top = top;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::constants::{DATA_BASE, KERNEL_BASE, TEXT_BASE};

    #[test]
    fn little_endian_layout() {
        let mut mem = Memory::new(false);
        mem.set_word(DATA_BASE, 0x1234_5678).unwrap();
        assert_eq!(mem.peek(DATA_BASE), 0x78);
        assert_eq!(mem.get_half(DATA_BASE + 2), Ok(0x1234));
        assert_eq!(mem.get_byte(DATA_BASE + 3), Ok(0x12));
    }

    #[test]
    fn protection_order_is_alignment_then_range() {
        let mem = Memory::new(false);
        assert_eq!(
            mem.get_word(TEXT_BASE + 1),
            Err(RuntimeError::MisalignedAccess { addr: TEXT_BASE + 1, width: 4 })
        );
        assert_eq!(mem.get_word(TEXT_BASE), Err(RuntimeError::AddressOutOfRange(TEXT_BASE)));
        assert_eq!(mem.get_byte(KERNEL_BASE), Err(RuntimeError::AddressOutOfRange(KERNEL_BASE)));
        assert!(mem.get_word(MMIO_BASE + MMIO_SIZE - 4).is_ok());
    }

    #[test]
    fn privileged_writes_bypass_protection() {
        let mut mem = Memory::new(false);
        mem.privileged().set_bits(KERNEL_BASE, Width::Word, 7);
        assert_eq!(mem.peek(KERNEL_BASE), 7);
        mem.privileged().forget(KERNEL_BASE);
        assert!(!mem.is_initialized(KERNEL_BASE));
    }

    #[test]
    fn garbage_filler_is_nonzero_and_stable() {
        let mem = Memory::new(true);
        for addr in DATA_BASE..DATA_BASE + 64 {
            assert_ne!(mem.peek(addr), 0);
            assert_eq!(mem.peek(addr), filler(addr));
        }
    }

    #[test]
    fn sbrk_rounds_to_words() {
        let mut mem = Memory::new(false);
        assert_eq!(mem.sbrk(5), Ok(HEAP_BASE));
        assert_eq!(mem.sbrk(0), Ok(HEAP_BASE + 8));
        assert!(mem.sbrk(-1).is_err());
    }
}
