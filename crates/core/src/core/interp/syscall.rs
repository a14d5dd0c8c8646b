//! Syscall layer.
//!
//! The selector is read from `$v0`:
//!
//! | code | operation        | code | operation        |
//! |------|------------------|------|------------------|
//! | 1    | print int        | 12   | read char        |
//! | 2    | print float      | 13   | open file        |
//! | 3    | print double     | 14   | read file        |
//! | 4    | print string     | 15   | write file       |
//! | 5    | read int         | 16   | close file       |
//! | 6    | read float       | 17   | exit with code   |
//! | 7    | read double      | 30   | dump memory      |
//! | 8    | read string      | 34   | print hex        |
//! | 9    | sbrk             | 35   | print binary     |
//! | 10   | exit             | 36   | print unsigned   |
//! | 11   | print char       |      |                  |
//!
//! Reads consume the text delivered with [`Interpreter::set_input`]; with none
//! pending they return [`Flow::AwaitInput`] before touching any state.

use super::{Flow, Interpreter};
use crate::common::error::RuntimeError;
use crate::core::units::fpu::Fpu;
use crate::isa::abi::{FREG_F0, FREG_F12, REG_A0, REG_A1, REG_A2, REG_V0};
use crate::isa::disasm::hex;
use crate::soc::memory::MAX_STRING_LEN;

fn latin1(bytes: &[u8]) -> String {
    bytes.iter().copied().map(char::from).collect()
}

impl Interpreter {
    /// Runs the syscall selected by `$v0`.
    pub(crate) fn syscall(&mut self) -> Result<Flow, RuntimeError> {
        let code = self.regs.read(REG_V0);
        let a0 = self.regs.read(REG_A0);
        match code {
            1 => self.print(a0.to_string()),
            2 => {
                let text = Fpu::format_single(self.regs.fpr.get_float(FREG_F12));
                self.print(text);
            }
            3 => {
                let text = Fpu::format_double(self.regs.fpr.get_double(FREG_F12)?);
                self.print(text);
            }
            4 => {
                let bytes = self.mem.read_cstring(a0 as u32)?;
                self.print(latin1(&bytes));
            }
            5 => {
                let Some(text) = self.take_input() else {
                    return Ok(Flow::AwaitInput);
                };
                let value = text
                    .trim()
                    .parse::<i32>()
                    .map_err(|_| RuntimeError::InvalidInput(text.clone()))?;
                self.regs.write(REG_V0, value);
            }
            6 => {
                let Some(text) = self.take_input() else {
                    return Ok(Flow::AwaitInput);
                };
                let value = text
                    .trim()
                    .parse::<f32>()
                    .map_err(|_| RuntimeError::InvalidInput(text.clone()))?;
                self.regs.fpr.set_float(FREG_F0, value);
            }
            7 => {
                let Some(text) = self.take_input() else {
                    return Ok(Flow::AwaitInput);
                };
                let value = text
                    .trim()
                    .parse::<f64>()
                    .map_err(|_| RuntimeError::InvalidInput(text.clone()))?;
                self.regs.fpr.set_double(FREG_F0, value)?;
            }
            8 => {
                let Some(text) = self.take_input() else {
                    return Ok(Flow::AwaitInput);
                };
                let capacity = usize::try_from(self.regs.read(REG_A1))
                    .unwrap_or(0)
                    .min(MAX_STRING_LEN);
                if capacity > 0 {
                    let mut bytes: Vec<u8> = text.bytes().take(capacity - 1).collect();
                    bytes.push(0);
                    self.mem.write_bytes(a0 as u32, &bytes)?;
                }
            }
            9 => {
                let block = self.mem.sbrk(a0)?;
                self.regs.write(REG_V0, block as i32);
            }
            10 => return Ok(Flow::Exit(0)),
            11 => self.print(char::from(a0 as u8).to_string()),
            12 => {
                let Some(text) = self.take_input() else {
                    return Ok(Flow::AwaitInput);
                };
                let byte = *text
                    .as_bytes()
                    .first()
                    .ok_or_else(|| RuntimeError::InvalidInput(text.clone()))?;
                self.regs.write(REG_V0, i32::from(byte));
            }
            13 => {
                let name = latin1(&self.mem.read_cstring(a0 as u32)?);
                let fd = self.files.open(&name, self.regs.read(REG_A1));
                self.regs.write(REG_V0, fd);
            }
            14 => return self.read_file(a0),
            15 => {
                let len = usize::try_from(self.regs.read(REG_A2))
                    .unwrap_or(0)
                    .min(MAX_STRING_LEN);
                let data = self.mem.read_bytes(self.regs.read(REG_A1) as u32, len)?;
                let written = match a0 {
                    1 | 2 => {
                        self.print(latin1(&data));
                        Some(data.len())
                    }
                    fd => self.files.write(fd, &data),
                };
                self.regs.write(REG_V0, written.map_or(-1, |n| n as i32));
            }
            16 => self.files.close(a0),
            17 => return Ok(Flow::Exit(a0)),
            30 => {
                let end = self.regs.read(REG_A1) as u32;
                let mut text = String::new();
                let mut addr = a0 as u32;
                while addr < end {
                    let word = self.mem.get_word(addr)?;
                    text.push_str(&format!("{}: {}\n", hex(addr), hex(word as u32)));
                    addr = addr.wrapping_add(4);
                }
                self.print(text);
            }
            34 => self.print(hex(a0 as u32)),
            35 => self.print(format!("{:032b}", a0 as u32)),
            36 => self.print((a0 as u32).to_string()),
            _ => return Err(RuntimeError::InvalidSyscall(code)),
        }
        Ok(Flow::Next)
    }

    fn read_file(&mut self, fd: i32) -> Result<Flow, RuntimeError> {
        let buffer = self.regs.read(REG_A1) as u32;
        let Ok(len) = usize::try_from(self.regs.read(REG_A2)) else {
            self.regs.write(REG_V0, -1);
            return Ok(Flow::Next);
        };
        let len = len.min(MAX_STRING_LEN);
        let data = if fd == 0 {
            let Some(text) = self.take_input() else {
                return Ok(Flow::AwaitInput);
            };
            Some(text.into_bytes().into_iter().take(len).collect::<Vec<u8>>())
        } else {
            self.files.read(fd, len)
        };
        match data {
            Some(bytes) => {
                self.mem.write_bytes(buffer, &bytes)?;
                self.regs.write(REG_V0, bytes.len() as i32);
            }
            None => self.regs.write(REG_V0, -1),
        }
        Ok(Flow::Next)
    }
}
