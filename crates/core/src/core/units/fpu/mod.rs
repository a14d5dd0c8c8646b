//! Floating-Point Unit (FPU).
//!
//! This module implements coprocessor 1 arithmetic for single and double
//! precision. Rust's `f32`/`f64` operations are IEEE 754 with round-to-nearest,
//! so overflow saturates to a signed infinity, invalid operations yield NaN and
//! `x / 0` yields a signed infinity without consulting any host floating state.
//!
//! Operations are organized into submodules:
//! - [`rounding_modes`]: Conversion to 32-bit integers under the four rounding modes.

/// Float-to-word rounding.
pub mod rounding_modes;

use crate::isa::instruction::{Cond, FloatOp, FloatUnary};

/// Floating-Point Unit (FPU) for coprocessor 1 operations.
#[derive(Debug)]
pub struct Fpu;

impl Fpu {
    /// Executes a binary single-precision operation.
    ///
    /// # Examples
    ///
    /// ```
    /// use mipsim_core::core::units::fpu::Fpu;
    /// use mipsim_core::isa::instruction::FloatOp;
    ///
    /// assert!(Fpu::arith_s(FloatOp::Add, f32::INFINITY, f32::NEG_INFINITY).is_nan());
    /// assert_eq!(Fpu::arith_s(FloatOp::Div, 1.0, 0.0), f32::INFINITY);
    /// ```
    pub fn arith_s(op: FloatOp, a: f32, b: f32) -> f32 {
        match op {
            FloatOp::Add => a + b,
            FloatOp::Sub => a - b,
            FloatOp::Mul => a * b,
            FloatOp::Div => a / b,
        }
    }

    /// Executes a binary double-precision operation.
    pub fn arith_d(op: FloatOp, a: f64, b: f64) -> f64 {
        match op {
            FloatOp::Add => a + b,
            FloatOp::Sub => a - b,
            FloatOp::Mul => a * b,
            FloatOp::Div => a / b,
        }
    }

    /// Executes a unary single-precision operation.
    pub fn unary_s(op: FloatUnary, a: f32) -> f32 {
        match op {
            FloatUnary::Abs => a.abs(),
            FloatUnary::Neg => -a,
            FloatUnary::Sqrt => a.sqrt(),
            FloatUnary::Mov => a,
        }
    }

    /// Executes a unary double-precision operation.
    pub fn unary_d(op: FloatUnary, a: f64) -> f64 {
        match op {
            FloatUnary::Abs => a.abs(),
            FloatUnary::Neg => -a,
            FloatUnary::Sqrt => a.sqrt(),
            FloatUnary::Mov => a,
        }
    }

    /// Evaluates a compare condition. Any comparison involving NaN is false.
    pub fn compare<T: PartialOrd>(cond: Cond, a: T, b: T) -> bool {
        match cond {
            Cond::Eq => a == b,
            Cond::Lt => a < b,
            Cond::Le => a <= b,
        }
    }

    /// Console text of a single: `nan`, `inf`, `-inf`, or the shortest round-trip
    /// decimal with at least one fractional digit (`1337.0`, `420.42`).
    pub fn format_single(x: f32) -> String {
        if x.is_nan() {
            "nan".to_string()
        } else if x.is_infinite() {
            if x > 0.0 { "inf" } else { "-inf" }.to_string()
        } else {
            format!("{x:?}")
        }
    }

    /// Console text of a double, with the same conventions as [`Fpu::format_single`].
    pub fn format_double(x: f64) -> String {
        if x.is_nan() {
            "nan".to_string()
        } else if x.is_infinite() {
            if x > 0.0 { "inf" } else { "-inf" }.to_string()
        } else {
            format!("{x:?}")
        }
    }
}
