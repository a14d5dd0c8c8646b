/// Protection, alignment, endianness and the MMIO terminal.
pub mod memory;
