use mipsim_core::common::RuntimeError;
use mipsim_core::common::constants::{DATA_BASE, KERNEL_BASE, MMIO_BASE, TEXT_BASE};
use mipsim_core::soc::memory::{Memory, Width, filler, mmio};
use pretty_assertions::assert_eq;
use proptest::prelude::*;

use crate::common::harness::TestContext;

proptest! {
    #[test]
    fn accesses_must_be_naturally_aligned(offset in 0u32..256) {
        let mut mem = Memory::new(false);
        let addr = DATA_BASE + offset;
        prop_assert_eq!(mem.get_word(addr).is_ok(), offset % 4 == 0);
        prop_assert_eq!(mem.get_half(addr).is_ok(), offset % 2 == 0);
        prop_assert!(mem.get_byte(addr).is_ok());
        prop_assert_eq!(mem.set_word(addr, 1).is_ok(), offset % 4 == 0);
    }

    #[test]
    fn words_are_little_endian(value in any::<i32>()) {
        let mut mem = Memory::new(false);
        mem.set_word(DATA_BASE, value).unwrap();
        let bytes: Vec<u8> = (0..4).map(|i| mem.get_byte(DATA_BASE + i).unwrap() as u8).collect();
        prop_assert_eq!(bytes, value.to_le_bytes().to_vec());
        prop_assert_eq!(mem.get_half(DATA_BASE).unwrap(), value as i16);
    }
}

#[test]
fn misalignment_reports_address_and_width() {
    let mem = Memory::new(false);
    assert_eq!(
        mem.get_word(DATA_BASE + 2),
        Err(RuntimeError::MisalignedAccess {
            addr: DATA_BASE + 2,
            width: 4
        })
    );
}

#[test]
fn text_and_kernel_space_are_protected() {
    let mut mem = Memory::new(false);
    assert_eq!(mem.get_word(TEXT_BASE), Err(RuntimeError::AddressOutOfRange(TEXT_BASE)));
    assert_eq!(mem.set_byte(KERNEL_BASE, 1), Err(RuntimeError::AddressOutOfRange(KERNEL_BASE)));
    assert!(mem.set_byte(MMIO_BASE, b'A').is_ok());
}

#[test]
fn uninitialized_reads_depend_on_the_filler_setting() {
    let clean = Memory::new(false);
    assert_eq!(clean.get_byte(DATA_BASE + 100).unwrap(), 0);
    assert!(!clean.is_initialized(DATA_BASE + 100));

    let dirty = Memory::new(true);
    assert_eq!(dirty.get_byte(DATA_BASE + 100).unwrap() as u8, filler(DATA_BASE + 100));
}

#[test]
fn initialized_mask_tracks_partial_writes() {
    let mut mem = Memory::new(false);
    mem.set_byte(DATA_BASE + 1, 7).unwrap();
    assert_eq!(mem.initialized_mask(DATA_BASE, Width::Word), 0b0010);
}

#[test]
fn heap_rejects_negative_growth() {
    let mut mem = Memory::new(false);
    let first = mem.sbrk(3).unwrap();
    assert_eq!(mem.sbrk(0).unwrap(), first + 4);
    assert_eq!(mem.sbrk(-4).unwrap_err().to_string(), "invalid input `sbrk amount -4`");
}

#[test]
fn program_can_draw_on_the_terminal() {
    let mut ctx = TestContext::new(
        "li $t0, 0xffff0000\nli $t1, 72\nsb $t1, 0($t0)\nli $t1, 105\nsb $t1, 2($t0)\nli $t1, 0x1f\nsb $t1, 1($t0)\n",
    );
    let _ = ctx.run_to_end().unwrap();
    let text = mmio::render_text(ctx.interp.mem());
    assert_eq!(text.lines().next(), Some("Hi"));
    assert_eq!(text.lines().count(), 25);
    let cell = mmio::cell(ctx.interp.mem(), 0, 0).unwrap();
    assert_eq!((cell.glyph(), cell.background(), cell.foreground()), ('H', 1, 15));
}
