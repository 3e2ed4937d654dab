use crate::asm::*;
use crate::harness::{machine, steps, BASE};
use i860::regs::Psr;

// The d-bit takes effect one pair late in both directions, so entering
// costs a temporary pair and leaving drains one.
#[test]
fn mode_walks_temp_full_temp_single() {
    let prog = [
        d_fnop(), // request dual
        nop(),
        d_fnop(),      // pair 1: keep requesting
        or_i(1, 0, 8), //   the high half runs once paired
        fnop(),        // pair 2: stop requesting
        nop(),
        fnop(), // pair 3
        nop(),
        or_i(2, 0, 9), // back to one word per step
    ];
    let (mut cpu, mem) = machine(&prog);
    steps(&mut cpu, &mem, 2);
    assert!(cpu.dim().is_single());
    assert_eq!(cpu.ireg(8), 0);

    steps(&mut cpu, &mem, 1); // pair 1
    assert!(cpu.dim().is_temp());
    assert_eq!(cpu.ireg(8), 1);

    steps(&mut cpu, &mem, 1); // pair 2
    assert!(cpu.dim().is_full());

    steps(&mut cpu, &mem, 1); // pair 3
    assert!(cpu.dim().is_temp());

    steps(&mut cpu, &mem, 1);
    assert!(cpu.dim().is_single());
    assert_eq!(cpu.ireg(9), 2);
    assert_eq!(cpu.stats().executed, 9);
}

#[test]
fn dual_call_links_past_the_delay_pair() {
    let prog = [
        d_fnop(),         // 0
        nop(),            // 1
        d_fnop(),         // 2: pair 1
        fnop(),           // 3
        call(rel(4, 12)), // 4: pair 2, fully paired now
        fnop(),           // 5
        or_i(1, 0, 8),    // 6: delay pair runs
        fnop(),           // 7
        or_i(0xFF, 0, 11), // 8: skipped
        fnop(),           // 9
        nop(),            // 10
        nop(),            // 11
        or_i(2, 0, 9),    // 12: target
        fnop(),           // 13
    ];
    let (mut cpu, mem) = machine(&prog);
    steps(&mut cpu, &mem, 6);
    assert_eq!(cpu.ireg(1), BASE + 32, "resume past the delay pair");
    assert_eq!(cpu.ireg(8), 1);
    assert_eq!(cpu.ireg(9), 2);
    assert_eq!(cpu.ireg(11), 0);
}

#[test]
fn knf_skips_one_fp_half() {
    let prog = [
        ixfr(7, 2),
        or_i(0x8000, 0, 3),
        st_c(3, CR_PSR), // plant the kill-next bit
        famov(0, 2, 4),  // skipped
        famov(0, 2, 5),  // bit consumed, this one runs
        ld_c(CR_PSR, 6),
    ];
    let (mut cpu, mem) = machine(&prog);
    cpu.set_ireg(7, 0x3F80_0000);
    steps(&mut cpu, &mem, prog.len());
    assert_eq!(cpu.freg_s(4), 0);
    assert_eq!(cpu.freg_s(5), 0x3F80_0000);
    assert_eq!(cpu.ireg(6) & Psr::KNF, 0);
}
