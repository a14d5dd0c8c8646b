use mipsim_core::core::interp::CommandAction;
use mipsim_core::debug::ResumeMode;
use mipsim_core::debug::command::{DebugCommand, PrintQuery, Radix, USAGE};
use mipsim_core::soc::memory::{MAX_STRING_LEN, Width};
use pretty_assertions::assert_eq;
use rstest::rstest;

use crate::common::harness::TestContext;

#[rstest]
#[case("b main.asm 12", DebugCommand::Break { file: "main.asm".into(), line: 12 })]
#[case("break lib/x.asm 3", DebugCommand::Break { file: "lib/x.asm".into(), line: 3 })]
#[case("n", DebugCommand::Next)]
#[case("next", DebugCommand::Next)]
#[case("c", DebugCommand::Continue)]
#[case("i", DebugCommand::Info)]
#[case("info b", DebugCommand::Info)]
#[case("d", DebugCommand::Delete)]
#[case("q", DebugCommand::Quit)]
#[case("r", DebugCommand::Reverse)]
#[case("  help  ", DebugCommand::Help)]
#[case("p 3", DebugCommand::Print(PrintQuery::Flag(3)))]
#[case(
    "p $t0 x",
    DebugCommand::Print(PrintQuery::Register { reg: 8, float: false, radix: Radix::Hex })
)]
#[case(
    "print $8 i",
    DebugCommand::Print(PrintQuery::Register { reg: 8, float: false, radix: Radix::Signed })
)]
#[case("p $f2 d", DebugCommand::Print(PrintQuery::Float { reg: 2, double: true }))]
#[case(
    "p arr w 4 u",
    DebugCommand::Print(PrintQuery::Ints {
        label: "arr".into(),
        width: Width::Word,
        count: 4,
        radix: Radix::Unsigned,
    })
)]
#[case("p msg s", DebugCommand::Print(PrintQuery::Text { label: "msg".into() }))]
#[case("p buf c 2", DebugCommand::Print(PrintQuery::Chars { label: "buf".into(), count: 2 }))]
fn grammar(#[case] line: &str, #[case] expected: DebugCommand) {
    assert_eq!(DebugCommand::parse(line), Some(expected));
}

#[rstest]
#[case("")]
#[case("b main.asm")]
#[case("b main.asm -1")]
#[case("n 2")]
#[case("p 8")]
#[case("p arr w 0 i")]
#[case("p arr q 1 i")]
#[case("jump")]
fn malformed_lines(#[case] line: &str) {
    assert_eq!(DebugCommand::parse(line), None);
}

const PROGRAM: &str = "\
.data
arr: .word 1, -2
msg: .asciiz \"ok\"
.text
main: li $t0, -3
li $t1, 4
li $t2, 5
";

#[test]
fn print_renders_state() {
    let mut ctx = TestContext::debug(PROGRAM);
    ctx.step_n(1);
    assert_eq!(ctx.interp.run_line("p $t0 i").output, "$t0 -3");
    assert_eq!(ctx.interp.run_line("p $t0 x").output, "$t0 0xfffffffd");
    assert_eq!(ctx.interp.run_line("p arr w 2 i").output, "1\n-2");
    assert_eq!(ctx.interp.run_line("p arr w 2 x").output, "0x00000001\n0xfffffffe");
    assert_eq!(ctx.interp.run_line("p msg s").output, "msg ok");
    assert_eq!(ctx.interp.run_line("p 0").output, "false");
    assert_eq!(ctx.interp.run_line("p nolabel s").output, USAGE.trim_end());
}

#[test]
fn huge_print_counts_are_capped() {
    let mut ctx = TestContext::debug(PROGRAM);
    let words = ctx.interp.run_line("p arr w 2000000000 i").output;
    let lines: Vec<&str> = words.lines().collect();
    assert_eq!(lines.len(), MAX_STRING_LEN / 4);
    assert_eq!(lines[..2], ["1", "-2"]);

    let doubles = ctx.interp.run_line("p arr d 5000000000").output;
    assert_eq!(doubles.lines().count(), MAX_STRING_LEN / 8);

    let chars = ctx.interp.run_line("p msg c 4294967297").output;
    assert_eq!(chars.lines().count(), 1 + MAX_STRING_LEN, "label line plus one per byte");
}

#[test]
fn malformed_and_help_show_usage() {
    let mut ctx = TestContext::debug(PROGRAM);
    for line in ["help", "bogus"] {
        let outcome = ctx.interp.run_line(line);
        assert_eq!(outcome.output, USAGE.trim_end());
        assert_eq!(outcome.action, CommandAction::Stay);
    }
}

#[test]
fn break_info_delete() {
    let mut ctx = TestContext::debug(PROGRAM);
    assert_eq!(ctx.interp.run_line("b main.asm 7").action, CommandAction::Stay);
    let _ = ctx.interp.run_line("b main.asm 6");
    assert_eq!(
        ctx.interp.run_line("i").output,
        "1 \"main.asm\" 6\n2 \"main.asm\" 7"
    );
    let _ = ctx.interp.run_line("d");
    assert_eq!(ctx.interp.run_line("info b").output, "");
}

#[test]
fn next_and_continue_resume() {
    let mut ctx = TestContext::debug(PROGRAM);
    assert_eq!(
        ctx.interp.run_line("n").action,
        CommandAction::Resume(ResumeMode::Step)
    );
    assert_eq!(
        ctx.interp.run_line("c").action,
        CommandAction::Resume(ResumeMode::Continue)
    );
    assert!(ctx.interp.debugger().continuing());
}

#[test]
fn reverse_lists_the_restored_instruction() {
    let mut ctx = TestContext::debug(PROGRAM);
    ctx.step_n(2);
    let outcome = ctx.interp.run_line("r");
    assert_eq!(outcome.output, "li $t1, 4 ( ori $t1, $0, 0x00000004 )  \"main.asm\" 6");
    assert_eq!(ctx.reg("$t1"), 0);
}

#[test]
fn quit_ends_the_run() {
    let mut ctx = TestContext::debug(PROGRAM);
    assert_eq!(ctx.interp.run_line("q").action, CommandAction::Quit);
    assert!(ctx.interp.is_ended());
    assert_eq!(ctx.ends(), vec![false]);
}
