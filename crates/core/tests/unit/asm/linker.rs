use mipsim_core::asm::{LinkedSource, Preprocessor};
use mipsim_core::common::tag::{SourceTag, parse_tagged_line};
use mipsim_core::config::Config;
use pretty_assertions::assert_eq;

use crate::common::harness::{init_tracing, write_files};

fn linked() -> LinkedSource {
    init_tracing();
    let dir = tempfile::tempdir().unwrap();
    write_files(
        dir.path(),
        &[
            (
                "main.asm",
                ".include \"lib/util.asm\"\nmain: jal helper\n\nli $v0, 10\nsyscall\n",
            ),
            ("lib/util.asm", "helper: jr $ra\n"),
        ],
    );
    let pre = Preprocessor::new(&Config::default())
        .run(&dir.path().join("main.asm"))
        .unwrap();
    LinkedSource::link(&pre)
}

#[test]
fn tagged_text_drops_includes_and_keeps_blank_lines() {
    assert_eq!(
        linked().tagged_text(),
        "helper: jr $ra  \"lib/util.asm\" 1\n\
         main: jal helper  \"main.asm\" 2\n\
         \n\
         li $v0, 10  \"main.asm\" 4\n\
         syscall  \"main.asm\" 5\n"
    );
}

#[test]
fn untagged_text_is_plain_source() {
    assert_eq!(
        linked().untagged_text(),
        "helper: jr $ra\nmain: jal helper\n\nli $v0, 10\nsyscall\n"
    );
}

#[test]
fn every_tagged_line_parses_back() {
    let source = linked();
    let text = source.tagged_text();
    let tags: Vec<SourceTag> = text
        .lines()
        .filter_map(parse_tagged_line)
        .map(|(_, tag)| tag)
        .collect();
    let expected: Vec<SourceTag> = source
        .lines()
        .iter()
        .filter(|l| !l.text.is_empty())
        .map(|l| l.tag.clone())
        .collect();
    assert_eq!(tags, expected);
}

#[test]
fn tagged_file_round_trips_through_disk() {
    let source = linked();
    let out = tempfile::NamedTempFile::new().unwrap();
    source.write_tagged(out.path()).unwrap();
    assert_eq!(std::fs::read_to_string(out.path()).unwrap(), source.tagged_text());
}

#[test]
fn tagged_and_untagged_differ_only_by_suffix() {
    let source = linked();
    let tagged = source.tagged_text();
    let untagged = source.untagged_text();
    for (t, u) in tagged.lines().zip(untagged.lines()) {
        if u.is_empty() {
            assert_eq!(t, "");
        } else {
            let (text, _) = parse_tagged_line(t).unwrap();
            assert_eq!(text, u);
        }
    }
    assert_eq!(tagged.lines().count(), untagged.lines().count());
}
