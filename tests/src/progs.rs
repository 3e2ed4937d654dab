//! Whole-program runs that cross from the core into the board devices.

use crate::asm::*;
use crate::harness::{machine, steps, BASE};
use common::Bus;
use common::constants::{DMEM_BASE, MC_BASE, VRAM_BASE};
use nd_lib::MessagePort;

#[test]
fn byte_copy_loop() {
    let prog = [
        ld_b(0, 2, 8), // loop: r8 = *src
        st_b(8, 0, 3),
        addu_i(1, 2, 2),
        addu_i(1, 3, 3),
        addu_i(1, 4, 4),
        btne_i(16, 4, rel(5, 0)),
    ];
    let (mut cpu, mem) = machine(&prog);
    let src = BASE + 0x800;
    let dst = BASE + 0x900;
    for k in 0..16u32 {
        mem.write_u8(src + k, (0xC0 + k) as u8);
    }
    cpu.set_ireg(2, src);
    cpu.set_ireg(3, dst);
    steps(&mut cpu, &mem, 16 * 6);
    for k in 0..16u32 {
        assert_eq!(mem.read_u8(dst + k), (0xC0 + k) as u8);
    }
    assert_eq!(cpu.ireg(4), 16);
    assert_eq!(cpu.pc(), BASE + 24);
}

#[test]
fn word_checksum_with_the_loop_branch() {
    let prog = [
        bla(5, 4, rel(0, 2)), // prime
        nop(),
        ld_l(0, 2, 9), // loop:
        addu(9, 8, 8),
        addu_i(4, 2, 2),
        bla(5, 4, rel(5, 2)),
        nop(),
    ];
    let (mut cpu, mem) = machine(&prog);
    let data = BASE + 0x800;
    let mut sum = 0u32;
    for k in 0..8u32 {
        let v = 0x0101_0101u32.wrapping_mul(k + 1);
        mem.write_u32(data + 4 * k, v);
        sum = sum.wrapping_add(v);
    }
    cpu.set_ireg(2, data);
    cpu.set_ireg(4, 7); // one less than the word count
    cpu.set_ireg(5, 0xFFFF_FFFF);
    steps(&mut cpu, &mem, 2 + 8 * 5);
    assert_eq!(cpu.ireg(8), sum);
    assert_eq!(cpu.pc(), BASE + 28);
}

#[test]
fn guest_store_raises_the_host_interrupt_line() {
    let prog = [
        orh(MC_BASE >> 16, 0, 3),
        or_i(1, 0, 4), // the int860 level bit
        st_l(4, 0, 3),
    ];
    let (mut cpu, mem) = machine(&prog);
    steps(&mut cpu, &mem, 3);
    assert!(mem.read_u32(MC_BASE) & 1 != 0);
    let msgs = mem.port.drain();
    assert_eq!(msgs & MessagePort::RAISE_INTR, MessagePort::RAISE_INTR);
}

#[test]
fn pixels_land_in_interleaved_order() {
    let prog = [
        orh(VRAM_BASE >> 16, 0, 3),
        orh(0x1122, 0, 5),
        or_i(0x3344, 5, 5),
        st_l(5, 0, 3),
        ld_l_i(0, 3, 8),
    ];
    let (mut cpu, mem) = machine(&prog);
    steps(&mut cpu, &mem, prog.len());
    // the bus view round-trips
    assert_eq!(cpu.ireg(8), 0x1122_3344);
    // the frame consumer sees the raw byte placement
    let frame = mem.framebuffer_snapshot();
    assert_eq!(frame[0], 0x4411_2233);
    assert_eq!(mem.framebuffer_len(), frame.len() * 4);
}

#[test]
fn scratch_ram_mailbox_exchange() {
    let prog = [
        orh(DMEM_BASE >> 16, 0, 3),
        ld_l_i(0x40, 3, 8),
        addu_i(1, 8, 8),
        st_l(8, 0x44, 3),
    ];
    let (mut cpu, mem) = machine(&prog);
    mem.write_u32(DMEM_BASE + 0x40, 0x0000_1233);
    steps(&mut cpu, &mem, prog.len());
    assert_eq!(mem.read_u32(DMEM_BASE + 0x44), 0x0000_1234);
}
