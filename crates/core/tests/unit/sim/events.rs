use std::sync::Arc;

use mipsim_core::config::Config;
use mipsim_core::core::interp::{Interpreter, Tick};
use mipsim_core::sim::events::Event;
use mockall::Sequence;

use crate::common::harness::assemble;
use crate::common::mocks::MockSink;

#[test]
fn end_is_emitted_exactly_once() {
    let mut sink = MockSink::new();
    let _ = sink.expect_emit()
        .withf(|e| matches!(e, Event::End { success: true }))
        .times(1)
        .return_const(());
    let _ = sink.expect_emit()
        .withf(|e| matches!(e, Event::Step { .. }))
        .times(2)
        .return_const(());

    let program = assemble("nop\nnop\n").unwrap();
    let mut interp = Interpreter::new(Arc::new(program), &Config::default(), Box::new(sink));
    assert_eq!(interp.run().unwrap(), Tick::Finished);
    interp.stop();
    assert_eq!(interp.tick().unwrap(), Tick::Finished);
}

#[test]
fn console_text_is_forwarded() {
    let mut sink = MockSink::new();
    let _ = sink.expect_emit()
        .withf(|e| *e == Event::Console("42".into()))
        .times(1)
        .return_const(());
    let _ = sink.expect_emit()
        .withf(|e| !matches!(e, Event::Console(_)))
        .return_const(());

    let program = assemble("li $a0, 42\nli $v0, 1\nsyscall\n").unwrap();
    let mut interp = Interpreter::new(Arc::new(program), &Config::default(), Box::new(sink));
    let _ = interp.run().unwrap();
}

#[test]
fn faults_end_unsuccessfully() {
    let mut sink = MockSink::new();
    let mut seq = Sequence::new();
    let _ = sink.expect_emit()
        .withf(|e| matches!(e, Event::Error { kind: "InvalidSyscall", message } if message.contains("\"main.asm\" 2")))
        .times(1)
        .in_sequence(&mut seq)
        .return_const(());
    let _ = sink.expect_emit()
        .withf(|e| matches!(e, Event::End { success: false }))
        .times(1)
        .in_sequence(&mut seq)
        .return_const(());
    let _ = sink.expect_emit()
        .withf(|e| matches!(e, Event::Step { .. }))
        .return_const(());

    let program = assemble("li $v0, 99\nsyscall\n").unwrap();
    let mut interp = Interpreter::new(Arc::new(program), &Config::default(), Box::new(sink));
    assert!(interp.run().is_err());
}
