//! MIPS Application Binary Interface (ABI) register names.
//!
//! Defines the conventional register names and the indices the syscall ABI and the
//! pseudo-instruction expansions rely on. Lookups accept `$name`, `$N` and, for the
//! debugger's print command, the bare name without `$`.

/// `$zero`, hard-wired to zero.
pub const REG_ZERO: usize = 0;
/// `$at`, scratch register reserved for pseudo-instruction expansions.
pub const REG_AT: usize = 1;
/// `$v0`, syscall selector and first return value.
pub const REG_V0: usize = 2;
/// `$a0`, first argument.
pub const REG_A0: usize = 4;
/// `$a1`, second argument.
pub const REG_A1: usize = 5;
/// `$a2`, third argument.
pub const REG_A2: usize = 6;
/// `$gp`, global pointer.
pub const REG_GP: usize = 28;
/// `$sp`, stack pointer.
pub const REG_SP: usize = 29;
/// `$fp`, frame pointer.
pub const REG_FP: usize = 30;
/// `$ra`, return address.
pub const REG_RA: usize = 31;

/// `$f0`, float syscall result.
pub const FREG_F0: usize = 0;
/// `$f12`, float syscall argument.
pub const FREG_F12: usize = 12;

/// Conventional names of the integer registers, without the `$` sigil.
pub const GPR_NAMES: [&str; 32] = [
    "zero", "at", "v0", "v1", "a0", "a1", "a2", "a3", "t0", "t1", "t2", "t3", "t4", "t5", "t6",
    "t7", "s0", "s1", "s2", "s3", "s4", "s5", "s6", "s7", "t8", "t9", "k0", "k1", "gp", "sp",
    "fp", "ra",
];

/// Canonical spelling of an integer register in disassembly: `$0` for zero, `$name` otherwise.
pub fn gpr_display(idx: usize) -> String {
    match GPR_NAMES.get(idx) {
        Some(_) if idx == REG_ZERO => "$0".to_string(),
        Some(name) => format!("${name}"),
        None => format!("${idx}"),
    }
}

/// Canonical spelling of a float register: `$fN`.
pub fn fpr_display(idx: usize) -> String {
    format!("$f{idx}")
}

/// Parses an integer register token: `$t0`, `$8`, `$zero` or `$0`.
pub fn parse_gpr(token: &str) -> Option<usize> {
    let name = token.strip_prefix('$')?;
    parse_gpr_name(name)
}

/// Parses an integer register name without the sigil (`t0`, `8`, `zero`).
///
/// Also accepts `s8` as an alias of `fp`.
pub fn parse_gpr_name(name: &str) -> Option<usize> {
    if let Ok(n) = name.parse::<usize>() {
        return (n < GPR_NAMES.len() && !name.starts_with('+')).then_some(n);
    }
    if name == "s8" {
        return Some(REG_FP);
    }
    GPR_NAMES.iter().position(|&n| n == name)
}

/// Parses a float register token `$f0`..`$f31`.
pub fn parse_fpr(token: &str) -> Option<usize> {
    let name = token.strip_prefix('$')?;
    parse_fpr_name(name)
}

/// Parses a float register name without the sigil (`f0`..`f31`).
pub fn parse_fpr_name(name: &str) -> Option<usize> {
    let digits = name.strip_prefix('f')?;
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    let n = digits.parse::<usize>().ok()?;
    (n < 32).then_some(n)
}

/// True if `name` spells a register in any accepted form (with or without `$`).
pub fn is_register_token(name: &str) -> bool {
    let bare = name.strip_prefix('$').unwrap_or(name);
    parse_gpr_name(bare).is_some() || parse_fpr_name(bare).is_some()
}
