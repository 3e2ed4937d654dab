use crate::asm::*;
use crate::harness::{machine, steps, BASE};
use common::Bus;
use common::constants::{ROM_LEN, TRAP_VECTOR};
use common::mem::as_byte_slice;
use i860::regs::Psr;
use nd_lib::NdMem;

// Parks a handler in the eeprom that returns `skip` bytes past the
// faulting instruction.
fn install_handler(mem: &NdMem, skip: i32) {
    let handler = [ld_c(CR_FIR, 16), addu_i(skip, 16, 16), bri(16), nop()];
    let mut image = vec![0u8; ROM_LEN as usize];
    let start = (TRAP_VECTOR & (ROM_LEN - 1)) as usize;
    let bytes = as_byte_slice(&handler);
    image[start..start + bytes.len()].copy_from_slice(bytes);
    mem.load_rom(&image);
}

#[test]
fn trap_vectors_to_the_fixed_address() {
    let prog = [nop(), trap()];
    let (mut cpu, mem) = machine(&prog);
    steps(&mut cpu, &mem, 2);
    assert_eq!(cpu.pc(), TRAP_VECTOR);
    assert_eq!(cpu.fir(), BASE + 4);
    assert!(cpu.psr_raw() & Psr::IT != 0);
}

#[test]
fn every_cause_parks_pc_on_the_vector() {
    // software trap, unpopulated opcode, misaligned store
    let programs: [&[u32]; 3] = [&[trap()], &[0x06 << 26], &[st_l(5, 0, 2)]];
    for prog in programs {
        let (mut cpu, mem) = machine(prog);
        cpu.set_ireg(2, BASE + 0x802); // misaligns the store
        steps(&mut cpu, &mem, 1);
        assert_eq!(cpu.pc(), TRAP_VECTOR);
        assert_eq!(cpu.fir(), BASE);
    }
}

#[test]
fn misaligned_store_is_dropped() {
    let prog = [st_l(5, 0x100, 2)];
    let (mut cpu, mem) = machine(&prog);
    cpu.set_ireg(2, BASE + 2);
    cpu.set_ireg(5, 0xDEAD_BEEF);
    steps(&mut cpu, &mem, 1);
    assert_eq!(cpu.pc(), TRAP_VECTOR);
    assert!(cpu.psr_raw() & Psr::DAT != 0);
    assert_eq!(mem.read_u32(BASE + 0x100), 0);
    assert_eq!(mem.read_u32(BASE + 0x104), 0);
}

#[test]
fn trap_in_a_delay_slot_records_the_branch_target() {
    let prog = [br(rel(0, 5)), trap(), nop(), nop(), nop(), nop()];
    let (mut cpu, mem) = machine(&prog);
    steps(&mut cpu, &mem, 2);
    assert_eq!(cpu.pc(), TRAP_VECTOR);
    // resumption address is where the branch was headed
    assert_eq!(cpu.fir(), BASE + 20);
}

#[test]
fn return_resumes_after_the_trap_with_state_restored() {
    let prog = [
        or_i(0x10, 0, 3),
        st_c(3, CR_PSR), // unmask interrupts so there is state to restore
        trap(),
        or_i(2, 0, 9),
    ];
    let (mut cpu, mem) = machine(&prog);
    install_handler(&mem, 4);
    steps(&mut cpu, &mem, 3);
    assert_eq!(cpu.pc(), TRAP_VECTOR);
    // entry stashed the mask and dropped it
    assert_eq!(cpu.psr_raw() & Psr::IM, 0);
    assert!(cpu.psr_raw() & Psr::PIM != 0);

    steps(&mut cpu, &mem, 5); // handler, its slot, then the resume
    assert_eq!(cpu.ireg(9), 2);
    assert_eq!(cpu.pc(), BASE + 16);
    assert!(cpu.psr_raw() & Psr::IM != 0, "mask restored");
    assert_eq!(cpu.psr_raw() & Psr::TRAP_CAUSES, 0);
}

#[test]
fn dual_mode_survives_a_trap_round_trip() {
    let prog = [
        d_fnop(), // 0
        nop(),    // 1
        d_fnop(), // 2: pair 1
        fnop(),   // 3
        trap(),   // 4: pair 2, fully paired
        fnop(),   // 5
        or_i(1, 0, 8), // 6: pair 3 resumes paired
        fnop(),        // 7
        or_i(2, 0, 9), // 8: single again
    ];
    let (mut cpu, mem) = machine(&prog);
    install_handler(&mem, 8); // step over the whole pair
    steps(&mut cpu, &mem, 4);
    assert_eq!(cpu.pc(), TRAP_VECTOR);
    assert!(cpu.psr_raw() & Psr::DIM != 0, "paired mode recorded");
    assert!(cpu.dim().is_single(), "handler runs unpaired");

    steps(&mut cpu, &mem, 4); // handler returns
    steps(&mut cpu, &mem, 1); // pair 3
    assert!(cpu.dim().is_temp());
    assert_eq!(cpu.ireg(8), 1);
    steps(&mut cpu, &mem, 1);
    assert!(cpu.dim().is_single());
    assert_eq!(cpu.ireg(9), 2);
}

#[test]
fn interrupt_pin_waits_for_the_mask() {
    let prog = [or_i(0x10, 0, 3), st_c(3, CR_PSR), nop(), nop()];
    let (mut cpu, mem) = machine(&prog);
    cpu.set_int_pin(true);
    steps(&mut cpu, &mem, 1);
    assert_ne!(cpu.pc(), TRAP_VECTOR, "masked at reset");
    steps(&mut cpu, &mem, 1); // unmasking lets it through
    assert_eq!(cpu.pc(), TRAP_VECTOR);
    assert!(cpu.psr_raw() & Psr::IN != 0);
    assert_eq!(cpu.stats().ints_taken, 1);
    // entry drops the mask, so the handler is not re-entered
    steps(&mut cpu, &mem, 1);
    assert_eq!(cpu.pc(), TRAP_VECTOR + 4);
}

#[test]
fn low_pin_never_traps() {
    let prog = [or_i(0x10, 0, 3), st_c(3, CR_PSR), nop(), nop()];
    let (mut cpu, mem) = machine(&prog);
    steps(&mut cpu, &mem, 4);
    assert_eq!(cpu.pc(), BASE + 16);
    assert_eq!(cpu.stats().ints_taken, 0);
}
