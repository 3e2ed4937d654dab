use crate::asm::*;
use crate::harness::{machine, steps, BASE};

#[test]
fn br_is_delayed_one_instruction() {
    let prog = [
        br(rel(0, 3)),
        or_i(1, 0, 8),    // delay slot runs
        or_i(0xFF, 0, 9), // skipped
        or_i(2, 0, 10),
    ];
    let (mut cpu, mem) = machine(&prog);
    steps(&mut cpu, &mem, 3);
    assert_eq!(cpu.ireg(8), 1, "delay slot");
    assert_eq!(cpu.ireg(9), 0);
    assert_eq!(cpu.ireg(10), 2);
    assert_eq!(cpu.pc(), BASE + 16);
}

#[test]
fn call_links_past_the_delay_slot() {
    let prog = [call(rel(0, 3)), nop(), or_i(0xFF, 0, 9), or_i(2, 0, 10)];
    let (mut cpu, mem) = machine(&prog);
    steps(&mut cpu, &mem, 3);
    assert_eq!(cpu.ireg(1), BASE + 8);
    assert_eq!(cpu.ireg(9), 0);
    assert_eq!(cpu.ireg(10), 2);
}

#[test]
fn calli_jumps_through_a_register() {
    let prog = [calli(3), nop(), or_i(0xFF, 0, 9), nop(), or_i(7, 0, 8)];
    let (mut cpu, mem) = machine(&prog);
    cpu.set_ireg(3, BASE + 16 + 2); // low bits are stripped
    steps(&mut cpu, &mem, 3);
    assert_eq!(cpu.ireg(8), 7);
    assert_eq!(cpu.ireg(1), BASE + 8);
    assert_eq!(cpu.ireg(9), 0);
}

#[test]
fn bc_is_immediate_and_bnc_is_its_opposite() {
    let prog = [
        and_i(0, 0, 9), // sets cc
        bc(rel(1, 4)),
        or_i(1, 0, 8), // no delay slot, never runs
        nop(),
        or_i(2, 0, 10),
    ];
    let (mut cpu, mem) = machine(&prog);
    steps(&mut cpu, &mem, 3);
    assert_eq!(cpu.ireg(8), 0);
    assert_eq!(cpu.ireg(10), 2);

    let prog = [and_i(0, 0, 9), bnc(rel(1, 4)), or_i(1, 0, 8)];
    let (mut cpu, mem) = machine(&prog);
    steps(&mut cpu, &mem, 3);
    assert_eq!(cpu.ireg(8), 1, "fell through");
}

#[test]
fn taken_variant_annuls_its_slot_on_fall_through() {
    let prog = [
        or_i(1, 0, 9), // nonzero result clears cc
        bc_t(rel(1, 9)),
        or_i(1, 0, 8), // annulled
        or_i(2, 0, 10),
    ];
    let (mut cpu, mem) = machine(&prog);
    steps(&mut cpu, &mem, 3);
    assert_eq!(cpu.ireg(8), 0, "annulled");
    assert_eq!(cpu.ireg(10), 2);
}

#[test]
fn taken_variant_runs_its_slot_when_taken() {
    let prog = [
        and_i(0, 0, 9),
        bc_t(rel(1, 5)),
        or_i(1, 0, 8),     // delay slot runs
        or_i(0xFF, 0, 11), // skipped
        nop(),
        or_i(2, 0, 10),
    ];
    let (mut cpu, mem) = machine(&prog);
    steps(&mut cpu, &mem, 4);
    assert_eq!(cpu.ireg(8), 1);
    assert_eq!(cpu.ireg(11), 0);
    assert_eq!(cpu.ireg(10), 2);
}

#[test]
fn compare_branches() {
    let prog = [bte_i(7, 4, rel(0, 3)), or_i(1, 0, 8), nop(), or_i(2, 0, 10)];
    let (mut cpu, mem) = machine(&prog);
    cpu.set_ireg(4, 7);
    steps(&mut cpu, &mem, 2);
    assert_eq!(cpu.ireg(8), 0);
    assert_eq!(cpu.ireg(10), 2);

    let prog = [
        btne_r(5, 4, rel(0, 3)),
        or_i(1, 0, 8),
        nop(),
        or_i(2, 0, 10),
    ];
    let (mut cpu, mem) = machine(&prog);
    cpu.set_ireg(4, 7);
    cpu.set_ireg(5, 9);
    steps(&mut cpu, &mem, 2);
    assert_eq!(cpu.ireg(10), 2);

    let prog = [btne_i(7, 4, rel(0, 3)), or_i(1, 0, 8)];
    let (mut cpu, mem) = machine(&prog);
    cpu.set_ireg(4, 7);
    steps(&mut cpu, &mem, 2);
    assert_eq!(cpu.ireg(8), 1);
}

#[test]
fn bla_loops_on_the_lagging_counter_flag() {
    let prog = [
        bla(5, 4, rel(0, 2)), // primes lcc, never taken here
        nop(),
        addu_i(1, 8, 8), // loop body counts passes
        bla(5, 4, rel(3, 2)),
        nop(), // always-run delay slot
    ];
    let (mut cpu, mem) = machine(&prog);
    cpu.set_ireg(4, 3);
    cpu.set_ireg(5, 0xFFFF_FFFF);
    steps(&mut cpu, &mem, 14);
    assert_eq!(cpu.ireg(8), 4, "count plus one passes");
    // five decrements in all, one per bla
    assert_eq!(cpu.ireg(4), 0xFFFF_FFFE);
    assert_eq!(cpu.pc(), BASE + 20);
}

#[test]
fn bri_strips_low_target_bits() {
    let prog = [bri(3), nop(), or_i(0xFF, 0, 9), or_i(5, 0, 8)];
    let (mut cpu, mem) = machine(&prog);
    cpu.set_ireg(3, BASE + 12 + 2);
    steps(&mut cpu, &mem, 3);
    assert_eq!(cpu.ireg(8), 5);
    assert_eq!(cpu.ireg(9), 0);
}
