use mipsim_core::common::constants::TEXT_BASE;
use mipsim_core::core::interp::Tick;
use mipsim_core::debug::ResumeMode;
use mipsim_core::sim::events::Event;
use pretty_assertions::assert_eq;

use crate::common::harness::TestContext;

const PROGRAM: &str = "\
main: li $t0, 0x12345678
li $t1, 1
li $t2, 2
li $t3, 3
";

#[test]
fn debugging_pauses_before_the_first_instruction() {
    let mut ctx = TestContext::debug(PROGRAM);
    assert_eq!(ctx.interp.run().unwrap(), Tick::Paused);
    assert_eq!(ctx.interp.regs().pc, TEXT_BASE);
    assert_eq!(ctx.events.events(), vec![Event::Paused { pc: TEXT_BASE }]);
}

#[test]
fn stepping_pauses_after_every_instruction() {
    let mut ctx = TestContext::debug(PROGRAM);
    assert_eq!(ctx.interp.run().unwrap(), Tick::Paused);
    ctx.interp.resume(ResumeMode::Step);
    assert_eq!(ctx.interp.run().unwrap(), Tick::Paused);
    assert_eq!(ctx.interp.regs().pc, TEXT_BASE + 4);
}

#[test]
fn continue_runs_to_the_breakpoint() {
    let mut ctx = TestContext::debug(PROGRAM);
    assert_eq!(ctx.interp.run().unwrap(), Tick::Paused);
    let _ = ctx.interp.debugger_mut().add_breakpoint("main.asm", 3);
    ctx.interp.resume(ResumeMode::Continue);

    assert_eq!(ctx.interp.run().unwrap(), Tick::Paused);
    assert_eq!(ctx.interp.regs().pc, TEXT_BASE + 12);
    assert_eq!((ctx.reg("$t1"), ctx.reg("$t2")), (1, 0));
    assert!(!ctx.interp.debugger().continuing(), "a hit cancels continue");
}

#[test]
fn breakpoint_fires_only_on_the_first_instruction_of_its_line() {
    let mut ctx = TestContext::debug(PROGRAM);
    assert_eq!(ctx.interp.run().unwrap(), Tick::Paused);
    let _ = ctx.interp.debugger_mut().add_breakpoint("main.asm", 1);
    ctx.interp.resume(ResumeMode::Continue);

    assert_eq!(ctx.interp.run().unwrap(), Tick::Finished);
    assert_eq!(ctx.reg("$t0"), 0x1234_5678);
    assert_eq!(ctx.reg("$t3"), 3);
}

#[test]
fn breakpoints_inside_loops_fire_every_iteration() {
    let mut ctx = TestContext::debug("li $t0, 3\nloop: addi $t0, $t0, -1\nbgtz $t0, loop\n");
    assert_eq!(ctx.interp.run().unwrap(), Tick::Paused);
    let _ = ctx.interp.debugger_mut().add_breakpoint("main.asm", 2);

    let mut hits = 0;
    loop {
        ctx.interp.resume(ResumeMode::Continue);
        match ctx.interp.run().unwrap() {
            Tick::Paused => hits += 1,
            Tick::Finished => break,
            other => panic!("unexpected {other:?}"),
        }
    }
    assert_eq!(hits, 3);
}

#[test]
fn break_instruction_pauses_only_while_debugging() {
    let src = "li $t0, 1\nbreak\nli $t0, 2\n";

    let mut plain = TestContext::new(src);
    assert_eq!(plain.run_to_end().unwrap(), Tick::Finished);
    assert_eq!(plain.reg("$t0"), 2);

    let mut dbg = TestContext::debug(src);
    assert_eq!(dbg.interp.run().unwrap(), Tick::Paused);
    dbg.interp.resume(ResumeMode::Continue);
    assert_eq!(dbg.interp.run().unwrap(), Tick::Paused);
    assert_eq!(dbg.interp.regs().pc, TEXT_BASE + 8);
    assert_eq!(dbg.reg("$t0"), 1);
}

#[test]
fn breakpoint_files_are_normalized() {
    let mut ctx = TestContext::debug(PROGRAM);
    let ((file, line), added) = ctx.interp.debugger_mut().add_breakpoint("\"./main.asm\"", 2);
    assert_eq!((&*file, line, added), ("main.asm", 2, true));
    let (_, again) = ctx.interp.debugger_mut().add_breakpoint("main.asm", 2);
    assert!(!again);
    assert!(ctx.interp.debugger_mut().remove_breakpoint("main.asm", 2));
}
