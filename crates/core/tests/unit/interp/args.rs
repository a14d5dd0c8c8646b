use mipsim_core::core::interp::Tick;
use pretty_assertions::assert_eq;

use crate::common::harness::TestContext;

#[test]
fn arguments_are_copied_onto_the_stack() {
    let mut ctx = TestContext::new("nop\n");
    ctx.interp
        .set_program_args(&["first".to_string(), "2nd".to_string()]);
    assert_eq!(ctx.reg("$a0"), 2);
    let argv = ctx.reg("$a1") as u32;
    assert_eq!(ctx.reg("$sp") as u32, argv);
    assert_eq!(argv % 4, 0);

    let mem = ctx.interp.mem();
    let args: Vec<Vec<u8>> = (0..2)
        .map(|i| {
            let ptr = mem.get_word(argv + 4 * i).unwrap() as u32;
            mem.read_cstring(ptr).unwrap()
        })
        .collect();
    assert_eq!(args, vec![b"first".to_vec(), b"2nd".to_vec()]);
    assert_eq!(mem.get_word(argv + 8).unwrap(), 0, "argv is null-terminated");
    assert_eq!(ctx.run_to_end().unwrap(), Tick::Finished);
}

#[test]
fn no_arguments_leave_registers_alone() {
    let mut ctx = TestContext::new("nop\n");
    ctx.interp.set_program_args(&[]);
    assert_eq!(ctx.reg("$a0"), 0);
    assert_eq!(ctx.reg("$sp"), 0x7FFF_EFFC);
}

#[test]
fn program_can_walk_argv() {
    let mut ctx = TestContext::new(
        "lw $a0, 0($a1)\nli $v0, 4\nsyscall\n",
    );
    ctx.interp.set_program_args(&["hello".to_string()]);
    let _ = ctx.run_to_end().unwrap();
    assert_eq!(ctx.console(), "hello");
}
