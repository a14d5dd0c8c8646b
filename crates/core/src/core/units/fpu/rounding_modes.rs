//! Float-to-word conversion.
//!
//! | Mode    | Rounding                         |
//! |---------|----------------------------------|
//! | `ceil`  | toward +infinity                 |
//! | `floor` | toward -infinity                 |
//! | `round` | to nearest, ties to even         |
//! | `trunc` | toward zero                      |
//!
//! `cvt.w.s` / `cvt.w.d` use `round`. NaN, infinities and results outside the
//! `i32` range all convert to `2147483647`.

use crate::isa::instruction::RoundMode;

/// Value produced for NaN, infinite or out-of-range inputs.
pub const INVALID_WORD: i32 = i32::MAX;

/// Converts `x` to a 32-bit integer with the given rounding.
///
/// # Arguments
///
/// * `mode` - Rounding direction.
/// * `x`    - Source value; singles are widened losslessly before the call.
///
/// # Returns
///
/// The rounded integer, or [`INVALID_WORD`] when it is not representable.
pub fn to_word(mode: RoundMode, x: f64) -> i32 {
    if !x.is_finite() {
        return INVALID_WORD;
    }
    let rounded = match mode {
        RoundMode::Ceil => x.ceil(),
        RoundMode::Floor => x.floor(),
        RoundMode::Round => x.round_ties_even(),
        RoundMode::Trunc => x.trunc(),
    };
    if rounded < f64::from(i32::MIN) || rounded > f64::from(i32::MAX) {
        INVALID_WORD
    } else {
        rounded as i32
    }
}
