//! Global System Constants.
//!
//! This module defines the fixed memory map and machine sizes shared by the
//! assembler, memory model and interpreter. It includes:
//! 1. **Segment Bases:** Start and end addresses of text, data, heap, stack, kernel and MMIO.
//! 2. **Initial Register Values:** Reset values of `$gp`, `$sp` and the program counter.
//! 3. **Machine Sizes:** Instruction width, register counts and condition flag count.
//! 4. **Terminal Geometry:** Size of the memory-mapped character display.

/// Address of the first instruction in the text segment.
pub const TEXT_BASE: u32 = 0x0040_0000;

/// First address past the text segment.
pub const TEXT_LIMIT: u32 = 0x1000_0000;

/// Lowest user-accessible data address (the `.extern` area starts here).
pub const DATA_SEGMENT_BASE: u32 = 0x1000_0000;

/// Address where `.data` declarations are laid out.
pub const DATA_BASE: u32 = 0x1001_0000;

/// Initial value of the global pointer `$gp`.
pub const GP_INIT: u32 = 0x1000_8000;

/// First address handed out by the heap-extend syscall.
pub const HEAP_BASE: u32 = 0x1004_0000;

/// Initial value of the stack pointer `$sp`; the stack grows downward.
pub const SP_INIT: u32 = 0x7FFF_EFFC;

/// Highest user-accessible data address (inclusive).
pub const USER_LIMIT: u32 = 0x7FFF_FFFF;

/// First address of the kernel/reserved segment.
pub const KERNEL_BASE: u32 = 0x8000_0000;

/// First address of the memory-mapped terminal buffer.
pub const MMIO_BASE: u32 = 0xFFFF_0000;

/// Terminal width in character cells.
pub const TERMINAL_COLS: u32 = 80;

/// Terminal height in character cells.
pub const TERMINAL_ROWS: u32 = 25;

/// Bytes per terminal cell (character code, color byte).
pub const TERMINAL_CELL_BYTES: u32 = 2;

/// Size in bytes of the memory-mapped terminal buffer.
pub const MMIO_SIZE: u32 = TERMINAL_COLS * TERMINAL_ROWS * TERMINAL_CELL_BYTES;

/// Size of one encoded instruction in bytes.
pub const INSTRUCTION_BYTES: u32 = 4;

/// Number of integer (and of floating-point) registers.
pub const NUM_REGISTERS: usize = 32;

/// Number of floating-point condition flags.
pub const NUM_FLAGS: usize = 8;

/// First file descriptor handed out by the open-file syscall (0-2 are the console).
pub const FIRST_USER_FD: i32 = 3;
