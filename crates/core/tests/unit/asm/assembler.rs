use mipsim_core::common::SimError;
use mipsim_core::common::constants::{DATA_BASE, HEAP_BASE, TEXT_BASE};
use mipsim_core::config::Config;
use pretty_assertions::assert_eq;
use rstest::rstest;

use crate::common::harness::{assemble, assemble_with};

#[test]
fn labels_and_data_are_laid_out() {
    let p = assemble(".data\nx: .word 7\nmsg: .asciiz \"ok\"\n.text\nmain: lw $t0, x\n").unwrap();
    assert_eq!(p.symbols.get("x"), Some(DATA_BASE));
    assert_eq!(p.symbols.get("msg"), Some(DATA_BASE + 4));
    assert_eq!(p.symbols.get("main"), Some(TEXT_BASE));
    assert_eq!(p.data.get(&(DATA_BASE + 4)), Some(&b'o'));
    assert_eq!(p.data.get(&(DATA_BASE + 6)), Some(&0));
}

#[test]
fn pseudo_instructions_expand_in_place() {
    let p = assemble("li $v0, 10\nblt $t0, $t1, done\ndone: nop\n").unwrap();
    let basic: Vec<String> = p.text.values().map(|e| e.instr.to_string()).collect();
    assert_eq!(
        basic,
        vec![
            "ori $v0, $0, 0x0000000a",
            "slt $at, $t0, $t1",
            "bne $at, $0, done",
            "nop",
        ]
    );
    assert_eq!(p.symbols.get("done"), Some(TEXT_BASE + 12));
}

#[test]
fn listing_shows_source_and_expansion() {
    let p = assemble("li $v0, 10\nnop\n").unwrap();
    let entries: Vec<_> = p.text.values().collect();
    assert_eq!(
        entries[0].describe(),
        "li $v0, 10 ( ori $v0, $0, 0x0000000a )  \"main.asm\" 1"
    );
    assert_eq!(entries[1].describe(), "nop  \"main.asm\" 2");
}

#[test]
fn source_order_keeps_pseudo_instructions_whole() {
    let p = assemble("li $t0, 0x12345678\nnop\n").unwrap();
    assert_eq!(p.text.len(), 3);
    assert_eq!(p.instructions.len(), 2);
    assert_eq!(p.instructions[1].address, TEXT_BASE + 8);
}

#[test]
fn entry_defaults_to_first_instruction() {
    let src = "nop\nmain: nop\n";
    assert_eq!(assemble(src).unwrap().entry, TEXT_BASE);
    let config = Config {
        start_at_main: true,
        ..Config::default()
    };
    assert_eq!(assemble_with(src, &config).unwrap().entry, TEXT_BASE + 4);
}

#[rstest]
#[case::unknown_instruction("frob $t0\n", "UnknownInstruction")]
#[case::unknown_directive(".frob 1\n", "UnknownDirective")]
#[case::undefined_label("j nowhere\n", "UndefinedLabel")]
#[case::duplicate_label("a: nop\na: nop\n", "DuplicateLabel")]
#[case::misaligned_word(".data\n.byte 1\n.word 2\n", "MisalignedDirective")]
#[case::data_in_text(".word 2\n", "WrongSegment")]
#[case::instruction_in_data(".data\nadd $t0, $t0, $t0\n", "WrongSegment")]
#[case::huge_space(".data\nbuf: .space 4000000000\n", "SegmentOverflow")]
#[case::huge_word_repeat(".data\nbuf: .word 1:3000000000\n", "SegmentOverflow")]
#[case::huge_double_repeat(".data\nbuf: .double 1.5:900000000000\n", "SegmentOverflow")]
#[case::space_one_past_heap(".data\n.byte 1\nbuf: .space 196608\n", "SegmentOverflow")]
fn assembly_errors(#[case] src: &str, #[case] kind: &str) {
    let err = assemble(src).unwrap_err();
    assert_eq!(err.kind(), kind, "{err}");
}

#[test]
fn data_segment_can_be_filled_to_the_heap() {
    let p = assemble(".data\nbuf: .space 196604\nlast: .word 5:1\n").unwrap();
    assert_eq!(p.symbols.get("last"), Some(HEAP_BASE - 4));
    assert_eq!(p.data.get(&(HEAP_BASE - 4)), Some(&5));
}

#[test]
fn errors_carry_their_source_line() {
    let err = assemble("nop\nnop\nj nowhere\n").unwrap_err();
    let SimError::Assemble(err) = err else {
        panic!("expected an assembly error, got {err}");
    };
    assert_eq!(&*err.tag.file, "main.asm");
    assert_eq!(err.tag.line, 3);
}
