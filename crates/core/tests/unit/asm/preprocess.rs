use std::path::Path;

use mipsim_core::asm::{Preprocessed, Preprocessor};
use mipsim_core::common::PreprocessError;
use mipsim_core::config::Config;
use pretty_assertions::assert_eq;
use rstest::rstest;

use crate::common::harness::{init_tracing, write_files};

fn run(dir: &Path, files: &[(&str, &str)]) -> Result<Preprocessed, PreprocessError> {
    init_tracing();
    write_files(dir, files);
    Preprocessor::new(&Config::default()).run(&dir.join("main.asm"))
}

fn names(pre: &Preprocessed) -> Vec<String> {
    pre.files.iter().map(|f| f.name.to_string()).collect()
}

fn line<'a>(pre: &'a Preprocessed, file: &str, line: usize) -> &'a str {
    let file = pre.files.iter().find(|f| &*f.name == file).unwrap();
    &file.lines[line - 1].text
}

#[test]
fn included_files_come_before_their_includer() {
    let dir = tempfile::tempdir().unwrap();
    let pre = run(
        dir.path(),
        &[
            ("main.asm", ".include \"lib/util.asm\"\nmain: li $v0, 10\nsyscall\n"),
            ("lib/util.asm", "helper: jr $ra\n"),
        ],
    )
    .unwrap();
    assert_eq!(names(&pre), vec!["lib/util.asm", "main.asm"]);
}

#[test]
fn diamond_includes_are_read_once() {
    let dir = tempfile::tempdir().unwrap();
    let pre = run(
        dir.path(),
        &[
            ("main.asm", ".include \"a.asm\"\n.include \"b.asm\"\n"),
            ("a.asm", ".include \"common.asm\"\n"),
            ("b.asm", ".include \"common.asm\"\n"),
            ("common.asm", "nop\n"),
        ],
    )
    .unwrap();
    assert_eq!(names(&pre), vec!["common.asm", "a.asm", "b.asm", "main.asm"]);
}

#[test]
fn cyclic_include_reports_the_chain() {
    let dir = tempfile::tempdir().unwrap();
    let err = run(
        dir.path(),
        &[
            ("main.asm", ".include \"a.asm\"\n"),
            ("a.asm", ".include \"b.asm\"\n"),
            ("b.asm", ".include \"a.asm\"\n"),
        ],
    )
    .unwrap_err();
    assert_eq!(err.kind(), "CyclicInclude");
    match err {
        PreprocessError::CyclicInclude { chain, .. } => {
            assert_eq!(chain, vec!["main.asm", "a.asm", "b.asm", "a.asm"]);
        }
        other => panic!("unexpected error {other}"),
    }
}

#[test]
fn missing_include_is_reported() {
    let dir = tempfile::tempdir().unwrap();
    let err = run(dir.path(), &[("main.asm", ".include \"gone.asm\"\n")]).unwrap_err();
    assert_eq!(err.kind(), "MissingFile");
}

#[test]
fn macros_are_pooled_across_files() {
    let dir = tempfile::tempdir().unwrap();
    let pre = run(
        dir.path(),
        &[
            ("main.asm", ".include \"defs.asm\"\nli $t0, SIZE\naddi $t1, $t0, SIZE_2\n"),
            ("defs.asm", ".eqv SIZE 4\n.eqv SIZE_2 8\n"),
        ],
    )
    .unwrap();
    assert_eq!(line(&pre, "main.asm", 2), "li $t0, 4");
    assert_eq!(line(&pre, "main.asm", 3), "addi $t1, $t0, 8", "whole words only");
}

#[test]
fn comments_are_stripped_but_string_lines_are_kept() {
    let dir = tempfile::tempdir().unwrap();
    let pre = run(
        dir.path(),
        &[(
            "main.asm",
            ".eqv N 10\nli $t0, N   # count\n\nmsg: .asciiz \"N items\" # kept\n",
        )],
    )
    .unwrap();
    assert_eq!(line(&pre, "main.asm", 2), "li $t0, 10");
    assert_eq!(line(&pre, "main.asm", 3), "");
    assert_eq!(line(&pre, "main.asm", 4), "msg: .asciiz \"N items\" # kept");
}

#[rstest]
#[case::register(".eqv $t0 5\n", "RestrictedMacro")]
#[case::mnemonic(".eqv add 5\n", "RestrictedMacro")]
#[case::directive(".eqv .word 5\n", "RestrictedMacro")]
#[case::missing_value(".eqv N\n", "MalformedDirective")]
#[case::unquoted_include(".include a.asm\n", "MalformedDirective")]
fn bad_directives(#[case] src: &str, #[case] kind: &str) {
    let dir = tempfile::tempdir().unwrap();
    let err = run(dir.path(), &[("main.asm", src)]).unwrap_err();
    assert_eq!(err.kind(), kind);
}

#[test]
fn eqv_substitutes_verbatim_outside_string_lines() {
    let dir = tempfile::tempdir().unwrap();
    let pre = run(
        dir.path(),
        &[(
            "main.asm",
            ".eqv word \"hello\"\nmsg: .asciiz \"hello word\"\nli $t0, 1  # word\nla $a0, word\n",
        )],
    )
    .unwrap();
    assert_eq!(pre.eqv.get("word"), Some("\"hello\""));
    assert_eq!(line(&pre, "main.asm", 1), ".eqv \"hello\" \"hello\"");
    assert_eq!(line(&pre, "main.asm", 2), "msg: .asciiz \"hello word\"");
    assert_eq!(line(&pre, "main.asm", 3), "li $t0, 1");
    assert_eq!(line(&pre, "main.asm", 4), "la $a0, \"hello\"");
}
