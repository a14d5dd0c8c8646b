//! Interactive debugger command grammar.
//!
//! Parses one line typed at the debugger prompt into a [`DebugCommand`] and
//! renders `print` queries against the current machine state. Every malformed
//! line maps to `None`, for which the caller shows [`USAGE`] and changes nothing.

use crate::core::arch::RegisterFile;
use crate::core::units::fpu::Fpu;
use crate::isa::abi::{fpr_display, gpr_display, parse_fpr, parse_gpr};
use crate::soc::memory::{MAX_STRING_LEN, Memory, Width};

/// Usage banner printed for `help` and for every malformed command.
pub const USAGE: &str = "\
USAGE:  [b]reak <filename> <line_no>
[d]elete: Clear all breakpoints
[n]ext: Step to the next instruction
[c]ontinue: Run until the next breakpoint
[i]nfo b: Print information about the breakpoints
[p]rint <flag>
[p]rint <reg> <format>
[p]rint <label> <data_type> <length> <format>
[q]uit: Terminate the program
[h]elp: Print this usage text
[r]everse: Step back to the previous instruction
";

/// Integer display radix.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Radix {
    /// `i`: signed decimal.
    Signed,
    /// `u`: unsigned decimal.
    Unsigned,
    /// `x`: zero-padded hex.
    Hex,
    /// `b`: zero-padded binary.
    Binary,
}

impl Radix {
    fn parse(s: &str) -> Option<Self> {
        Some(match s {
            "i" => Self::Signed,
            "u" => Self::Unsigned,
            "x" => Self::Hex,
            "b" => Self::Binary,
            _ => return None,
        })
    }

    /// Formats the low `bytes` bytes of `value`, which is sign-extended from that width.
    pub fn format(self, value: i64, bytes: u32) -> String {
        let bits = 8 * bytes;
        let mask = if bits >= 64 { u64::MAX } else { (1u64 << bits) - 1 };
        let raw = value as u64 & mask;
        match self {
            Self::Signed => value.to_string(),
            Self::Unsigned => raw.to_string(),
            Self::Hex => format!("0x{raw:0width$x}", width = 2 * bytes as usize),
            Self::Binary => format!("0b{raw:0width$b}", width = bits as usize),
        }
    }
}

/// What a `print` command asks for.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PrintQuery {
    /// `p <flag>`.
    Flag(usize),
    /// `p <reg> <i|u|x|b>`; float registers print their raw word.
    Register {
        /// Register index.
        reg: usize,
        /// True for a float register.
        float: bool,
        /// Display radix.
        radix: Radix,
    },
    /// `p <freg> <f|d>`.
    Float {
        /// Register index.
        reg: usize,
        /// Read the even/odd pair as a double.
        double: bool,
    },
    /// `p <label> s`.
    Text {
        /// Label of the string.
        label: String,
    },
    /// `p <label> <w|h|b> <count> <i|u|x|b>`.
    Ints {
        /// Label of the first element.
        label: String,
        /// Element width.
        width: Width,
        /// Number of elements.
        count: usize,
        /// Display radix.
        radix: Radix,
    },
    /// `p <label> <f|d> <count>`.
    Floats {
        /// Label of the first element.
        label: String,
        /// Doubles rather than singles.
        double: bool,
        /// Number of elements.
        count: usize,
    },
    /// `p <label> c <count>`.
    Chars {
        /// Label of the first byte.
        label: String,
        /// Number of bytes.
        count: usize,
    },
}

/// A parsed debugger command.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum DebugCommand {
    /// `b|break <file> <line>`.
    Break {
        /// File as typed.
        file: String,
        /// 1-based line.
        line: usize,
    },
    /// `n|next`.
    Next,
    /// `c|continue`.
    Continue,
    /// `i|info`.
    Info,
    /// `d|delete`.
    Delete,
    /// `p|print ...`.
    Print(PrintQuery),
    /// `q|quit`.
    Quit,
    /// `r|reverse`.
    Reverse,
    /// `h|help`.
    Help,
}

/// Elements of `step` bytes a dump may cover, capped at [`MAX_STRING_LEN`] bytes.
fn span(count: usize, step: u32) -> u32 {
    count.min(MAX_STRING_LEN / step as usize) as u32
}

fn count(s: &str) -> Option<usize> {
    s.parse::<usize>().ok().filter(|&n| n >= 1)
}

fn parse_print(args: &[&str]) -> Option<PrintQuery> {
    match *args {
        [flag] => flag
            .parse::<usize>()
            .ok()
            .filter(|&f| f < 8)
            .map(PrintQuery::Flag),
        [reg, fmt] if parse_gpr(reg).is_some() || parse_fpr(reg).is_some() => {
            if let Some(radix) = Radix::parse(fmt) {
                return Some(match parse_gpr(reg) {
                    Some(reg) => PrintQuery::Register {
                        reg,
                        float: false,
                        radix,
                    },
                    None => PrintQuery::Register {
                        reg: parse_fpr(reg)?,
                        float: true,
                        radix,
                    },
                });
            }
            let reg = parse_fpr(reg)?;
            match fmt {
                "f" => Some(PrintQuery::Float { reg, double: false }),
                "d" => Some(PrintQuery::Float { reg, double: true }),
                _ => None,
            }
        }
        [label, "s"] => Some(PrintQuery::Text {
            label: label.to_string(),
        }),
        [label, kind @ ("w" | "h" | "b"), n, radix] => Some(PrintQuery::Ints {
            label: label.to_string(),
            width: match kind {
                "w" => Width::Word,
                "h" => Width::Half,
                _ => Width::Byte,
            },
            count: count(n)?,
            radix: Radix::parse(radix)?,
        }),
        [label, kind @ ("f" | "d"), n] => Some(PrintQuery::Floats {
            label: label.to_string(),
            double: kind == "d",
            count: count(n)?,
        }),
        [label, "c", n] => Some(PrintQuery::Chars {
            label: label.to_string(),
            count: count(n)?,
        }),
        _ => None,
    }
}

impl DebugCommand {
    /// Parses one prompt line.
    ///
    /// # Returns
    ///
    /// The command, or `None` when the line is empty or malformed.
    ///
    /// # Examples
    ///
    /// ```
    /// use mipsim_core::debug::command::DebugCommand;
    ///
    /// assert_eq!(
    ///     DebugCommand::parse("b main.asm 12"),
    ///     Some(DebugCommand::Break { file: "main.asm".into(), line: 12 })
    /// );
    /// assert_eq!(DebugCommand::parse("b main.asm twelve"), None);
    /// ```
    pub fn parse(line: &str) -> Option<Self> {
        let words: Vec<&str> = line.split_whitespace().collect();
        let (&head, args) = words.split_first()?;
        match (head, args) {
            ("b" | "break", [file, line]) if line.bytes().all(|b| b.is_ascii_digit()) => {
                Some(Self::Break {
                    file: (*file).to_string(),
                    line: line.parse().ok()?,
                })
            }
            ("n" | "next", []) => Some(Self::Next),
            ("c" | "continue", []) => Some(Self::Continue),
            ("i" | "info", [] | ["b"]) => Some(Self::Info),
            ("d" | "delete", []) => Some(Self::Delete),
            ("p" | "print", args) => parse_print(args).map(Self::Print),
            ("q" | "quit", []) => Some(Self::Quit),
            ("r" | "reverse", []) => Some(Self::Reverse),
            ("h" | "help", []) => Some(Self::Help),
            _ => None,
        }
    }
}

fn printable(b: u8) -> String {
    match b {
        0 => "\\0".into(),
        9 => "\\t".into(),
        10 => "\\n".into(),
        13 => "\\r".into(),
        32..=126 => char::from(b).to_string(),
        _ => ".".into(),
    }
}

impl PrintQuery {
    /// Renders the query against the current state.
    ///
    /// Unknown labels render the usage banner; faulting reads render the fault.
    pub fn render(&self, regs: &RegisterFile, mem: &Memory) -> String {
        let base = |label: &str| mem.label_address(label);
        match self {
            Self::Flag(f) => regs.flag(*f).to_string(),
            Self::Register { reg, float, radix } => {
                if *float {
                    let bits = regs.fpr.read_bits(*reg) as i32;
                    format!("{} {}", fpr_display(*reg), radix.format(i64::from(bits), 4))
                } else {
                    let v = regs.read(*reg);
                    format!("{} {}", gpr_display(*reg), radix.format(i64::from(v), 4))
                }
            }
            Self::Float { reg, double: false } => {
                format!("{} {}", fpr_display(*reg), Fpu::format_single(regs.fpr.get_float(*reg)))
            }
            Self::Float { reg, double: true } => match regs.fpr.get_double(*reg) {
                Ok(d) => format!("{} {}", fpr_display(*reg), Fpu::format_double(d)),
                Err(_) => "Not an even numbered register".into(),
            },
            Self::Text { label } => match mem.label_string(label) {
                Ok(Some(s)) => format!("{label} {s}"),
                Ok(None) => USAGE.trim_end().into(),
                Err(e) => e.to_string(),
            },
            Self::Ints {
                label,
                width,
                count,
                radix,
            } => {
                let Some(addr) = base(label) else {
                    return USAGE.trim_end().into();
                };
                let step = width.bytes();
                let mut lines = Vec::new();
                for i in 0..span(*count, step) {
                    let at = addr.wrapping_add(i * step);
                    let value = match width {
                        Width::Half => mem.get_half(at).map(i64::from),
                        Width::Byte => mem.get_byte(at).map(i64::from),
                        _ => mem.get_word(at).map(i64::from),
                    };
                    match value {
                        Ok(v) => lines.push(radix.format(v, step)),
                        Err(e) => {
                            lines.push(e.to_string());
                            break;
                        }
                    }
                }
                lines.join("\n")
            }
            Self::Floats {
                label,
                double,
                count,
            } => {
                let Some(addr) = base(label) else {
                    return USAGE.trim_end().into();
                };
                let step = if *double { 8 } else { 4 };
                let mut lines = Vec::new();
                for i in 0..span(*count, step) {
                    let at = addr.wrapping_add(i * step);
                    let text = if *double {
                        mem.get_double(at).map(Fpu::format_double)
                    } else {
                        mem.get_float(at).map(Fpu::format_single)
                    };
                    match text {
                        Ok(t) => lines.push(t),
                        Err(e) => {
                            lines.push(e.to_string());
                            break;
                        }
                    }
                }
                lines.join("\n")
            }
            Self::Chars { label, count } => {
                let Some(addr) = base(label) else {
                    return USAGE.trim_end().into();
                };
                let mut lines = vec![label.clone()];
                for i in 0..span(*count, 1) {
                    match mem.get_byte(addr.wrapping_add(i)) {
                        Ok(b) => lines.push(format!("\t{}", printable(b as u8))),
                        Err(e) => {
                            lines.push(e.to_string());
                            break;
                        }
                    }
                }
                lines.join("\n")
            }
        }
    }
}
