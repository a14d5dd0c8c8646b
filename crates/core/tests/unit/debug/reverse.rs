use mipsim_core::common::constants::DATA_BASE;
use mipsim_core::core::interp::Tick;
use mipsim_core::sim::events::Event;
use pretty_assertions::assert_eq;
use proptest::prelude::*;

use crate::common::harness::TestContext;

const PROGRAM: &str = "\
.data
v: .word 0
.text
li $t0, 5
sw $t0, v
addi $t0, $t0, 3
mult $t0, $t0
mflo $t1
sw $t1, v
li $a0, 8
li $v0, 9
syscall
sb $t0, 0($v0)
li $a0, 65
li $v0, 11
syscall
";

proptest! {
    #![proptest_config(ProptestConfig::with_cases(48))]

    #[test]
    fn stepping_back_restores_registers_and_memory(a in 0usize..=15, b in 0usize..=15) {
        let mut ctx = TestContext::debug(PROGRAM);
        let total = ctx.interp.program().text.len();
        let (n, m) = (a.min(b).min(total), a.max(b).min(total));

        ctx.step_n(n);
        let regs = ctx.interp.regs().clone();
        let mem = ctx.interp.mem().clone();
        let count = ctx.interp.instruction_count();

        ctx.step_n(m - n);
        for _ in n..m {
            prop_assert!(ctx.interp.step_back());
        }

        prop_assert_eq!(ctx.interp.regs(), &regs);
        prop_assert_eq!(ctx.interp.mem(), &mem);
        prop_assert_eq!(ctx.interp.instruction_count(), count);
    }
}

#[test]
fn stepping_back_past_the_start_is_a_no_op() {
    let mut ctx = TestContext::debug(PROGRAM);
    let pc = ctx.interp.regs().pc;
    assert!(!ctx.interp.step_back());
    assert_eq!(ctx.interp.regs().pc, pc);
    assert_eq!(ctx.events.drain(), vec![Event::Step { pc }]);
}

#[test]
fn store_is_undone() {
    let mut ctx = TestContext::debug(PROGRAM);
    ctx.step_n(3);
    assert_eq!(ctx.interp.mem().get_word(DATA_BASE).unwrap(), 5);
    assert!(ctx.interp.step_back());
    assert_eq!(ctx.interp.mem().get_word(DATA_BASE).unwrap(), 0);
}

#[test]
fn ended_runs_cannot_step_back() {
    let mut ctx = TestContext::debug("li $t0, 1\nli $v0, 10\nsyscall\n");
    ctx.step_n(2);
    assert_eq!(ctx.interp.step().unwrap(), Tick::Exited(0));
    assert!(!ctx.interp.step_back());
}

#[test]
fn undo_is_only_recorded_while_debugging() {
    let mut ctx = TestContext::new("li $t0, 1\nli $t1, 2\n");
    ctx.step_n(2);
    assert!(ctx.interp.debugger().undo().is_empty());
    assert!(!ctx.interp.step_back());
}
