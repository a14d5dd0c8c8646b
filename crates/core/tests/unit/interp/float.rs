use mipsim_core::core::units::fpu::Fpu;
use mipsim_core::isa::instruction::{FloatOp, FloatUnary};
use pretty_assertions::assert_eq;
use rstest::rstest;

use crate::common::harness::TestContext;

#[rstest]
#[case::inf_minus_inf(FloatOp::Add, f64::INFINITY, f64::NEG_INFINITY)]
#[case::zero_over_zero(FloatOp::Div, 0.0, 0.0)]
#[case::inf_times_zero(FloatOp::Mul, f64::INFINITY, 0.0)]
fn invalid_operations_give_nan(#[case] op: FloatOp, #[case] a: f64, #[case] b: f64) {
    assert!(Fpu::arith_d(op, a, b).is_nan());
    assert!(Fpu::arith_s(op, a as f32, b as f32).is_nan());
}

#[rstest]
#[case(1.0, f64::INFINITY)]
#[case(-1.0, f64::NEG_INFINITY)]
fn division_by_zero_is_infinite(#[case] x: f64, #[case] expected: f64) {
    assert_eq!(Fpu::arith_d(FloatOp::Div, x, 0.0), expected);
}

#[test]
fn sqrt_of_negative_is_nan() {
    assert!(Fpu::unary_s(FloatUnary::Sqrt, -1.0).is_nan());
    assert!(Fpu::unary_d(FloatUnary::Sqrt, -1.0).is_nan());
}

fn print_single(op: &str, a: &str, b: &str) -> String {
    let src = format!(
        ".data\nlhs: .float {a}\nrhs: .float {b}\n.text\nl.s $f0, lhs\nl.s $f1, rhs\n{op}.s $f12, $f0, $f1\nli $v0, 2\nsyscall\n"
    );
    let mut ctx = TestContext::new(&src);
    let _ = ctx.run_to_end().unwrap();
    ctx.console()
}

#[rstest]
#[case("add", "1.5", "2.25", "3.75")]
#[case("div", "1.0", "0.0", "inf")]
#[case("div", "-1.0", "0.0", "-inf")]
#[case("div", "0.0", "0.0", "nan")]
#[case("mul", "1337", "1", "1337.0")]
fn single_precision_console(#[case] op: &str, #[case] a: &str, #[case] b: &str, #[case] out: &str) {
    assert_eq!(print_single(op, a, b), out);
}

#[test]
fn doubles_use_register_pairs() {
    let mut ctx = TestContext::new(
        ".data\nx: .double 2.5\n.text\nl.d $f12, x\nadd.d $f12, $f12, $f12\nli $v0, 3\nsyscall\n",
    );
    let _ = ctx.run_to_end().unwrap();
    assert_eq!(ctx.console(), "5.0");
}

#[test]
fn odd_double_register_faults() {
    let mut ctx = TestContext::new(".data\n.align 3\nx: .double 1.0\n.text\nla $t0, x\nldc1 $f1, 0($t0)\n");
    let err = ctx.run_to_end().unwrap_err();
    assert_eq!(err.kind(), "InvalidRegister");
}

#[test]
fn compare_sets_flag_and_branches() {
    let mut ctx = TestContext::new(
        ".data\nlhs: .float 1.0\nrhs: .float 2.0\n.text\nl.s $f0, lhs\nl.s $f1, rhs\nc.lt.s $f0, $f1\nbc1t yes\nli $t0, 1\nj done\nyes: li $t0, 2\ndone: nop\n",
    );
    let _ = ctx.run_to_end().unwrap();
    assert!(ctx.interp.regs().flag(0));
    assert_eq!(ctx.reg("$t0"), 2);
}

#[test]
fn word_conversion_round_trips() {
    let mut ctx = TestContext::new(
        "li $t0, -7\nmtc1 $t0, $f2\ncvt.s.w $f4, $f2\ncvt.w.s $f6, $f4\nmfc1 $t1, $f6\n",
    );
    let _ = ctx.run_to_end().unwrap();
    assert_eq!(ctx.interp.regs().fpr.get_float(4), -7.0);
    assert_eq!(ctx.reg("$t1"), -7);
}
