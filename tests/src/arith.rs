use crate::asm::*;
use crate::harness::{machine, steps, BASE};
use common::constants::TRAP_VECTOR;
use i860::regs::{Epsr, Psr};

#[test]
fn addu_carry_lands_in_cc_and_of() {
    let prog = [addu_i(1, 4, 5), ld_c(CR_EPSR, 6)];
    let (mut cpu, mem) = machine(&prog);
    cpu.set_ireg(4, 0xFFFF_FFFF);
    steps(&mut cpu, &mem, prog.len());
    assert_eq!(cpu.ireg(5), 0);
    assert!(cpu.psr_raw() & Psr::CC != 0, "carry");
    assert!(cpu.ireg(6) & Epsr::OF != 0);
}

#[test]
fn addu_without_carry_clears_cc() {
    let prog = [
        and_i(0, 0, 9), // zero result raises cc first
        addu_i(7, 4, 5),
        ld_c(CR_EPSR, 6),
    ];
    let (mut cpu, mem) = machine(&prog);
    cpu.set_ireg(4, 5);
    steps(&mut cpu, &mem, prog.len());
    assert_eq!(cpu.ireg(5), 12);
    assert_eq!(cpu.psr_raw() & Psr::CC, 0);
    assert_eq!(cpu.ireg(6) & Epsr::OF, 0);
}

#[test]
fn subu_cc_means_no_borrow() {
    let prog = [subu_i(10, 4, 5)];
    let (mut cpu, mem) = machine(&prog);
    cpu.set_ireg(4, 3);
    steps(&mut cpu, &mem, 1);
    assert_eq!(cpu.ireg(5), 7);
    assert!(cpu.psr_raw() & Psr::CC != 0);

    let prog = [subu_i(3, 4, 5), ld_c(CR_EPSR, 6)];
    let (mut cpu, mem) = machine(&prog);
    cpu.set_ireg(4, 10);
    steps(&mut cpu, &mem, 2);
    assert_eq!(cpu.ireg(5), 3u32.wrapping_sub(10));
    assert_eq!(cpu.psr_raw() & Psr::CC, 0, "borrow");
    assert!(cpu.ireg(6) & Epsr::OF != 0);
}

#[test]
fn adds_overflow_sets_of_but_cc_tracks_the_exact_sign() {
    let prog = [adds(3, 4, 5), ld_c(CR_EPSR, 6)];
    let (mut cpu, mem) = machine(&prog);
    cpu.set_ireg(3, 0x7FFF_FFFF);
    cpu.set_ireg(4, 1);
    steps(&mut cpu, &mem, 2);
    assert_eq!(cpu.ireg(5), 0x8000_0000);
    assert_eq!(cpu.psr_raw() & Psr::CC, 0);
    assert!(cpu.ireg(6) & Epsr::OF != 0);
}

#[test]
fn adds_immediate_sign_extends() {
    let prog = [adds_i(-3, 4, 5)];
    let (mut cpu, mem) = machine(&prog);
    cpu.set_ireg(4, 1);
    steps(&mut cpu, &mem, 1);
    assert_eq!(cpu.ireg(5), (-2i32) as u32);
    assert!(cpu.psr_raw() & Psr::CC != 0, "negative");
}

#[test]
fn subs_signed_difference() {
    let prog = [subs(3, 4, 5)];
    let (mut cpu, mem) = machine(&prog);
    cpu.set_ireg(3, 2);
    cpu.set_ireg(4, 5);
    steps(&mut cpu, &mem, 1);
    assert_eq!(cpu.ireg(5), (-3i32) as u32);
    assert!(cpu.psr_raw() & Psr::CC != 0);
}

#[test]
fn shifts() {
    let prog = [
        shl_i(4, 2, 5),
        shra_i(8, 3, 6),
        shl(7, 2, 8), // count comes from r7, mod 32
    ];
    let (mut cpu, mem) = machine(&prog);
    cpu.set_ireg(2, 0x0001_0001);
    cpu.set_ireg(3, 0x8000_0000);
    cpu.set_ireg(7, 33);
    steps(&mut cpu, &mem, prog.len());
    assert_eq!(cpu.ireg(5), 0x0010_0010);
    assert_eq!(cpu.ireg(6), 0xFF80_0000);
    assert_eq!(cpu.ireg(8), 0x0002_0002);
}

#[test]
fn shrd_funnels_with_the_saved_count() {
    let prog = [
        shr_i(8, 2, 5), // latches sc = 8
        shrd(3, 4, 6),
    ];
    let (mut cpu, mem) = machine(&prog);
    cpu.set_ireg(2, 0xABCD_1234);
    cpu.set_ireg(3, 0x0000_00AA);
    cpu.set_ireg(4, 0x1234_5678);
    steps(&mut cpu, &mem, 2);
    assert_eq!(cpu.ireg(5), 0x00AB_CD12);
    assert_eq!(cpu.ireg(6), 0xAA12_3456);
}

#[test]
fn intovr_traps_only_after_unsigned_overflow() {
    let prog = [addu_i(1, 4, 5), intovr()];
    let (mut cpu, mem) = machine(&prog);
    cpu.set_ireg(4, 0xFFFF_FFFF);
    steps(&mut cpu, &mem, 2);
    assert_eq!(cpu.pc(), TRAP_VECTOR);
    assert_eq!(cpu.fir(), BASE + 4);
    assert!(cpu.psr_raw() & Psr::IT != 0);

    let prog = [addu_i(1, 4, 5), intovr()];
    let (mut cpu, mem) = machine(&prog);
    cpu.set_ireg(4, 7);
    steps(&mut cpu, &mem, 2);
    assert_eq!(cpu.pc(), BASE + 8);
}
