use std::fs;

use mipsim_core::common::constants::{DATA_BASE, HEAP_BASE, TEXT_BASE};
use mipsim_core::core::interp::Tick;
use mipsim_core::soc::memory::MAX_STRING_LEN;
use pretty_assertions::assert_eq;
use rstest::rstest;

use crate::common::harness::TestContext;

#[test]
fn hello_world() {
    let mut ctx = TestContext::new(
        ".data\nmsg: .asciiz \"hi\\n\"\n.text\nmain: la $a0, msg\nli $v0, 4\nsyscall\nli $v0, 10\nsyscall\n",
    );
    assert_eq!(ctx.run_to_end().unwrap(), Tick::Exited(0));
    assert_eq!(ctx.console(), "hi\n");
    assert_eq!(ctx.interp.console(), "hi\n");
    assert_eq!(ctx.ends(), vec![true]);
}

#[rstest]
#[case::int(1, "-1")]
#[case::hex(34, "0xffffffff")]
#[case::binary(35, "11111111111111111111111111111111")]
#[case::unsigned(36, "4294967295")]
fn integer_printers(#[case] code: i32, #[case] expected: &str) {
    let mut ctx = TestContext::new(&format!("li $a0, -1\nli $v0, {code}\nsyscall\n"));
    let _ = ctx.run_to_end().unwrap();
    assert_eq!(ctx.console(), expected);
}

#[test]
fn print_char() {
    let mut ctx = TestContext::new("li $a0, 65\nli $v0, 11\nsyscall\n");
    let _ = ctx.run_to_end().unwrap();
    assert_eq!(ctx.console(), "A");
}

#[test]
fn exit_with_code() {
    let mut ctx = TestContext::new("li $a0, 3\nli $v0, 17\nsyscall\nli $t0, 1\n");
    assert_eq!(ctx.run_to_end().unwrap(), Tick::Exited(3));
    assert_eq!(ctx.reg("$t0"), 0, "nothing runs after exit");
}

#[test]
fn read_int_waits_for_input() {
    let mut ctx = TestContext::new("li $v0, 5\nsyscall\nmove $t0, $v0\n");
    assert_eq!(ctx.interp.run().unwrap(), Tick::AwaitingInput);
    assert_eq!(ctx.interp.regs().pc, TEXT_BASE + 4, "the syscall has not retired");
    assert_eq!(ctx.interp.instruction_count(), 1);

    ctx.interp.set_input(" 42\n");
    assert_eq!(ctx.run_to_end().unwrap(), Tick::Finished);
    assert_eq!(ctx.reg("$t0"), 42);
}

#[test]
fn malformed_int_input_faults() {
    let mut ctx = TestContext::new("li $v0, 5\nsyscall\n");
    ctx.interp.set_input("forty-two");
    assert_eq!(ctx.run_to_end().unwrap_err().kind(), "InvalidInput");
}

#[test]
fn read_string_truncates_and_terminates() {
    let mut ctx = TestContext::new(
        ".data\nbuf: .space 8\n.text\nla $a0, buf\nli $a1, 4\nli $v0, 8\nsyscall\n",
    );
    ctx.interp.set_input("hello");
    let _ = ctx.run_to_end().unwrap();
    let bytes: Vec<u8> = (0..5)
        .map(|i| ctx.interp.mem().get_byte(DATA_BASE + i).unwrap() as u8)
        .collect();
    assert_eq!(bytes, b"hel\0\0");
}

#[test]
fn read_char() {
    let mut ctx = TestContext::new("li $v0, 12\nsyscall\n");
    ctx.interp.set_input("xyz");
    let _ = ctx.run_to_end().unwrap();
    assert_eq!(ctx.reg("$v0"), i32::from(b'x'));
}

#[test]
fn sbrk_hands_out_word_aligned_blocks() {
    let mut ctx = TestContext::new(
        "li $a0, 5\nli $v0, 9\nsyscall\nmove $t0, $v0\nli $a0, 4\nli $v0, 9\nsyscall\n",
    );
    let _ = ctx.run_to_end().unwrap();
    assert_eq!(ctx.reg("$t0") as u32, HEAP_BASE);
    assert_eq!(ctx.reg("$v0") as u32, HEAP_BASE + 8);
}

#[test]
fn memory_dump() {
    let mut ctx = TestContext::new(
        ".data\nw: .word 1, 2\n.text\nla $a0, w\naddi $a1, $a0, 8\nli $v0, 30\nsyscall\n",
    );
    let _ = ctx.run_to_end().unwrap();
    assert_eq!(
        ctx.console(),
        "0x10010000: 0x00000001\n0x10010004: 0x00000002\n"
    );
}

#[test]
fn file_write_then_read() {
    let mut ctx = TestContext::new(
        ".data\n\
         name: .asciiz \"out.txt\"\n\
         msg: .ascii \"hello\"\n\
         buf: .space 16\n\
         .text\n\
         la $a0, name\nli $a1, 1\nli $v0, 13\nsyscall\nmove $s0, $v0\n\
         move $a0, $s0\nla $a1, msg\nli $a2, 5\nli $v0, 15\nsyscall\nmove $s1, $v0\n\
         move $a0, $s0\nli $v0, 16\nsyscall\n\
         la $a0, name\nli $a1, 0\nli $v0, 13\nsyscall\nmove $s2, $v0\n\
         move $a0, $s2\nla $a1, buf\nli $a2, 16\nli $v0, 14\nsyscall\nmove $s3, $v0\n",
    );
    let _ = ctx.run_to_end().unwrap();
    assert_eq!(ctx.reg("$s0"), 3, "first user descriptor");
    assert_eq!(ctx.reg("$s1"), 5);
    assert_eq!(ctx.reg("$s3"), 5);
    assert_eq!(fs::read_to_string(ctx.dir().join("out.txt")).unwrap(), "hello");
}

#[test]
fn failed_open_returns_minus_one() {
    let mut ctx = TestContext::new(
        ".data\nname: .asciiz \"missing/nope.txt\"\n.text\nla $a0, name\nli $a1, 0\nli $v0, 13\nsyscall\n",
    );
    let _ = ctx.run_to_end().unwrap();
    assert_eq!(ctx.reg("$v0"), -1);
}

#[test]
fn write_to_stdout_goes_to_console() {
    let mut ctx = TestContext::new(
        ".data\nmsg: .ascii \"abc\"\n.text\nli $a0, 1\nla $a1, msg\nli $a2, 3\nli $v0, 15\nsyscall\n",
    );
    let _ = ctx.run_to_end().unwrap();
    assert_eq!(ctx.console(), "abc");
    assert_eq!(ctx.reg("$v0"), 3);
}

#[test]
fn oversized_write_is_capped() {
    let mut ctx = TestContext::new(
        ".data\nmsg: .ascii \"abc\"\n.text\nli $a0, 1\nla $a1, msg\nli $a2, 0x7fffffff\nli $v0, 15\nsyscall\n",
    );
    let _ = ctx.run_to_end().unwrap();
    assert_eq!(ctx.reg("$v0"), MAX_STRING_LEN as i32);
    assert_eq!(ctx.console().len(), MAX_STRING_LEN);
    assert!(ctx.console().starts_with("abc\0"));
}
