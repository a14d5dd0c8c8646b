use std::sync::Arc;
use std::sync::mpsc::{self, Receiver};
use std::time::Duration;

use mipsim_core::common::constants::{DATA_BASE, TEXT_BASE};
use mipsim_core::config::Config;
use mipsim_core::sim::{Controller, Event, Recorder};
use pretty_assertions::assert_eq;

use crate::common::harness::assemble;

fn wait_for(rx: &Receiver<Event>, wanted: &Event) {
    loop {
        match rx.recv_timeout(Duration::from_secs(5)) {
            Ok(event) if &event == wanted => return,
            Ok(_) => {}
            Err(e) => panic!("timed out waiting for {wanted:?}: {e}"),
        }
    }
}

#[test]
fn queries_without_a_run_return_none() {
    let controller = Controller::new(Config::default());
    assert_eq!(controller.pc(), None);
    assert_eq!(controller.console(), None);
    assert_eq!(controller.get_instruction_count(), None);
    assert_eq!(controller.get_word(DATA_BASE, true), None);
    assert!(!controller.step());
    assert!(!controller.is_running());
}

#[test]
fn runs_to_completion() {
    let program = assemble(".data\nv: .byte -1\n.text\nmain: li $a0, 7\nli $v0, 1\nsyscall\n").unwrap();
    let events = Recorder::new();
    let mut controller = Controller::new(Config::default());
    controller.start(Arc::new(program), Box::new(events.clone()));
    controller.wait();

    assert!(!controller.is_running());
    assert_eq!(controller.console().as_deref(), Some("7"));
    assert_eq!(controller.get_instruction_count(), Some(3));
    assert_eq!(controller.get_byte(DATA_BASE, true), Some(-1));
    assert_eq!(controller.get_byte(DATA_BASE, false), Some(255));
    assert_eq!(controller.get_word(DATA_BASE + 1, false), None, "misaligned");
    assert_eq!(controller.last_error(), None);
    assert_eq!(
        controller.get_labels(),
        Some(vec![("main".to_string(), TEXT_BASE), ("v".to_string(), DATA_BASE)])
    );
    let ends: Vec<Event> = events
        .events()
        .into_iter()
        .filter(|e| matches!(e, Event::End { .. }))
        .collect();
    assert_eq!(ends, vec![Event::End { success: true }]);
}

#[test]
fn faults_are_kept_for_inspection() {
    let program = assemble("li $t0, 1\ndiv $t0, $zero\n").unwrap();
    let events = Recorder::new();
    let mut controller = Controller::new(Config::default());
    controller.start(Arc::new(program), Box::new(events.clone()));
    controller.wait();
    let (kind, message) = controller.last_error().unwrap();
    assert_eq!(kind, "DivideByZero");
    assert!(message.contains("\"main.asm\" 2"), "{message}");

    let reported: Vec<Event> = events
        .events()
        .into_iter()
        .filter(|e| !matches!(e, Event::Step { .. }))
        .collect();
    assert_eq!(
        reported,
        vec![
            Event::Error { kind, message },
            Event::End { success: false },
        ]
    );
}

#[test]
fn paused_start_steps_and_reverses() {
    let program = assemble("li $t0, 1\nli $t1, 2\nli $t2, 3\n").unwrap();
    let (tx, rx) = mpsc::channel();
    let mut controller = Controller::new(Config::default());
    controller.start_paused(Arc::new(program), Box::new(tx));
    wait_for(&rx, &Event::Paused { pc: TEXT_BASE });

    assert!(controller.step());
    wait_for(&rx, &Event::Paused { pc: TEXT_BASE + 4 });
    assert_eq!(controller.pc(), Some(TEXT_BASE + 4));
    assert_eq!(controller.registers().map(|r| r.read(8)), Some(1));

    assert!(controller.reverse());
    wait_for(&rx, &Event::Step { pc: TEXT_BASE });
    assert_eq!(controller.registers().map(|r| r.read(8)), Some(0));

    assert!(controller.pause(false));
    wait_for(&rx, &Event::End { success: true });
    controller.wait();
    assert_eq!(controller.registers().map(|r| r.read(10)), Some(3));
}

#[test]
fn breakpoints_stop_a_running_program() {
    let program = assemble("li $t0, 1\nli $t1, 2\nli $t2, 3\n").unwrap();
    let (tx, rx) = mpsc::channel();
    let mut controller = Controller::new(Config::default());
    controller.start_paused(Arc::new(program), Box::new(tx));
    wait_for(&rx, &Event::Paused { pc: TEXT_BASE });

    assert!(controller.add_breakpoint("main.asm", 3));
    assert!(controller.pause(false));
    wait_for(&rx, &Event::Paused { pc: TEXT_BASE + 8 });
    assert!(controller.remove_breakpoint("main.asm", 3));
    controller.stop();
    assert_eq!(controller.pc(), None);
}

#[test]
fn breakpoints_set_before_start_apply_to_every_run() {
    let program = Arc::new(assemble("li $t0, 1\nli $t1, 2\nli $t2, 3\n").unwrap());
    let mut controller = Controller::new(Config::default());
    assert!(controller.add_breakpoint("main.asm", 2));
    assert!(!controller.add_breakpoint("main.asm", 2), "already held");

    for _ in 0..2 {
        let (tx, rx) = mpsc::channel();
        controller.start(Arc::clone(&program), Box::new(tx));
        wait_for(&rx, &Event::Paused { pc: TEXT_BASE + 4 });
        assert_eq!(controller.registers().map(|r| r.read(9)), Some(0), "line 2 has not run");
        controller.stop();
    }

    assert!(controller.remove_breakpoint("main.asm", 2));
    let (tx, rx) = mpsc::channel();
    controller.start(program, Box::new(tx));
    wait_for(&rx, &Event::End { success: true });
}

#[test]
fn input_reaches_a_waiting_read() {
    let program = assemble("li $v0, 5\nsyscall\nmove $t0, $v0\n").unwrap();
    let (tx, rx) = mpsc::channel();
    let mut controller = Controller::new(Config::default());
    controller.start(Arc::new(program), Box::new(tx));
    assert!(controller.set_input("41\n"));
    wait_for(&rx, &Event::End { success: true });
    controller.wait();
    assert_eq!(controller.registers().map(|r| r.read(8)), Some(41));
}

#[test]
fn stop_ends_the_run_once() {
    let program = assemble("spin: j spin\n").unwrap();
    let events = Recorder::new();
    let mut controller = Controller::new(Config::default());
    controller.start(Arc::new(program), Box::new(events.clone()));
    controller.stop();
    controller.stop();
    let ends = events
        .events()
        .into_iter()
        .filter(|e| matches!(e, Event::End { .. }))
        .count();
    assert_eq!(ends, 1);
    assert!(!controller.is_running());
}
