//! Memory-mapped terminal.
//!
//! An 80x25 character display lives at `0xFFFF_0000`. Each cell is two bytes:
//! the character code, then a color byte whose high nibble is the background
//! and low nibble the foreground, both indexing [`PALETTE`]. Cells are laid out
//! row-major. A character code of 0 displays as a space.

use crate::common::constants::{MMIO_BASE, TERMINAL_CELL_BYTES, TERMINAL_COLS, TERMINAL_ROWS};
use crate::soc::memory::Memory;

/// Display name and RGB value of each 4-bit color index.
pub const PALETTE: [(&str, [u8; 3]); 16] = [
    ("black", [0, 0, 0]),
    ("darkRed", [128, 0, 0]),
    ("darkGreen", [0, 128, 0]),
    ("darkYellow", [192, 119, 0]),
    ("darkBlue", [0, 0, 128]),
    ("darkMagenta", [128, 0, 128]),
    ("darkCyan", [0, 128, 128]),
    ("gray", [160, 160, 164]),
    ("darkGray", [128, 128, 128]),
    ("red", [255, 0, 0]),
    ("green", [0, 255, 0]),
    ("yellow", [255, 255, 0]),
    ("blue", [0, 0, 255]),
    ("magenta", [255, 0, 255]),
    ("cyan", [0, 255, 255]),
    ("white", [255, 255, 255]),
];

/// One terminal cell as stored in memory.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TerminalCell {
    /// Character code.
    pub ch: u8,
    /// Packed color byte.
    pub color: u8,
}

impl TerminalCell {
    /// Character to draw; code 0 draws as a space.
    pub fn glyph(self) -> char {
        if self.ch == 0 { ' ' } else { char::from(self.ch) }
    }

    /// Background palette index (high nibble).
    pub const fn background(self) -> usize {
        (self.color >> 4) as usize
    }

    /// Foreground palette index (low nibble).
    pub const fn foreground(self) -> usize {
        (self.color & 0xF) as usize
    }
}

/// Address of the cell at `(col, row)`, or `None` outside the 80x25 grid.
pub const fn cell_address(col: u32, row: u32) -> Option<u32> {
    if col >= TERMINAL_COLS || row >= TERMINAL_ROWS {
        return None;
    }
    Some(MMIO_BASE + (row * TERMINAL_COLS + col) * TERMINAL_CELL_BYTES)
}

/// Reads the cell at `(col, row)`.
pub fn cell(mem: &Memory, col: u32, row: u32) -> Option<TerminalCell> {
    let addr = cell_address(col, row)?;
    Some(TerminalCell {
        ch: mem.peek(addr),
        color: mem.peek(addr + 1),
    })
}

/// The characters of every row, right-trimmed, one line per row.
pub fn render_text(mem: &Memory) -> String {
    let mut out = String::new();
    for row in 0..TERMINAL_ROWS {
        let line: String = (0..TERMINAL_COLS)
            .filter_map(|col| cell(mem, col, row))
            .map(TerminalCell::glyph)
            .collect();
        out.push_str(line.trim_end());
        out.push('\n');
    }
    out
}
