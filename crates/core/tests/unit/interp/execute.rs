use mipsim_core::common::SimError;
use mipsim_core::config::Config;
use mipsim_core::core::interp::Tick;
use pretty_assertions::assert_eq;
use rstest::rstest;

use crate::common::harness::TestContext;

#[test]
fn falling_off_the_end_is_a_successful_finish() {
    let mut ctx = TestContext::new("li $t0, 1\n");
    assert_eq!(ctx.run_to_end().unwrap(), Tick::Finished);
    assert_eq!(ctx.ends(), vec![true]);
    assert_eq!(ctx.interp.instruction_count(), 1);
}

#[test]
fn jal_and_jr_link_through_ra() {
    let mut ctx = TestContext::new(
        "main: jal f\nli $v0, 10\nsyscall\nf: li $t0, 7\njr $ra\n",
    );
    assert_eq!(ctx.run_to_end().unwrap(), Tick::Exited(0));
    assert_eq!(ctx.reg("$t0"), 7);
    assert_eq!(ctx.reg("$ra"), 0x0040_0004);
}

#[test]
fn hi_lo_division() {
    let mut ctx = TestContext::new("li $t0, 7\nli $t1, 2\ndiv $t0, $t1\nmflo $t2\nmfhi $t3\n");
    let _ = ctx.run_to_end().unwrap();
    assert_eq!((ctx.reg("$t2"), ctx.reg("$t3")), (3, 1));
}

#[test]
fn loads_sign_and_zero_extend() {
    let mut ctx = TestContext::new(".data\nb: .byte -2\n.text\nlb $t0, b\nlbu $t1, b\n");
    let _ = ctx.run_to_end().unwrap();
    assert_eq!((ctx.reg("$t0"), ctx.reg("$t1")), (-2, 254));
}

#[test]
fn zero_register_ignores_writes() {
    let mut ctx = TestContext::new("addi $zero, $zero, 5\nmove $t0, $zero\n");
    let _ = ctx.run_to_end().unwrap();
    assert_eq!(ctx.reg("$zero"), 0);
    assert_eq!(ctx.reg("$t0"), 0);
}

#[test]
fn loop_counts_down() {
    let mut ctx = TestContext::new(
        "li $t0, 5\nli $t1, 0\nloop: addi $t1, $t1, 2\naddi $t0, $t0, -1\nbgtz $t0, loop\n",
    );
    let _ = ctx.run_to_end().unwrap();
    assert_eq!(ctx.reg("$t1"), 10);
    assert_eq!(ctx.interp.instruction_count(), 2 + 5 * 3);
}

#[rstest]
#[case::overflow("li $t0, 0x7fffffff\naddi $t0, $t0, 1\n", "ArithmeticOverflow", 2)]
#[case::divide_by_zero("li $t0, 1\ndiv $t0, $zero\n", "DivideByZero", 2)]
#[case::misaligned(".data\nx: .word 1\n.text\nla $t0, x\nlw $t1, 1($t0)\n", "MisalignedAccess", 5)]
#[case::out_of_range("lw $t0, 0($zero)\n", "AddressOutOfRange", 1)]
#[case::invalid_syscall("li $v0, 99\nsyscall\n", "InvalidSyscall", 2)]
#[case::jump_into_data("li $t0, 0x10010000\njr $t0\n", "InvalidProgramCounter", 0)]
fn runtime_faults(#[case] src: &str, #[case] kind: &str, #[case] line: usize) {
    let mut ctx = TestContext::new(src);
    let err = ctx.run_to_end().unwrap_err();
    assert_eq!(err.kind(), kind, "{err}");
    assert_eq!(ctx.ends(), vec![false]);
    if line > 0 {
        match err {
            SimError::Runtime { tag: Some(tag), .. } => {
                assert_eq!(tag.line, line);
            }
            other => panic!("expected a tagged runtime error, got {other}"),
        }
    }
}

#[test]
fn faulting_instruction_leaves_state_untouched() {
    let mut ctx = TestContext::new("li $t0, 0x7fffffff\naddi $t0, $t0, 1\n");
    let _ = ctx.run_to_end().unwrap_err();
    assert_eq!(ctx.reg("$t0"), 0x7fff_ffff);
    assert!(ctx.interp.is_ended());
    assert_eq!(ctx.interp.step().unwrap(), Tick::Finished);
}

#[test]
fn instruction_limit_stops_runaway_loops() {
    let config = Config {
        max_instructions: Some(50),
        ..Config::default()
    };
    let mut ctx = TestContext::with_config("spin: j spin\n", config);
    let err = ctx.run_to_end().unwrap_err();
    assert_eq!(err.kind(), "InstructionLimit");
    assert_eq!(ctx.interp.instruction_count(), 50);
}

#[test]
fn garbage_registers_spare_the_special_ones() {
    let config = Config {
        garbage_registers: true,
        ..Config::default()
    };
    let ctx = TestContext::with_config("nop\n", config);
    assert_eq!(ctx.reg("$zero"), 0);
    assert_eq!(ctx.reg("$sp"), 0x7FFF_EFFC);
    assert_ne!(ctx.reg("$t0"), 0);
}
