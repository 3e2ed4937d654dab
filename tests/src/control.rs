use crate::asm::*;
use crate::harness::{machine, run, steps, BASE};
use i860::regs::Psr;

#[test]
fn r0_reads_zero_and_drops_writes() {
    let prog = [or_i(0xFFFF, 0, 0), addu_i(5, 0, 3)];
    let (cpu, _mem) = run(&prog);
    assert_eq!(cpu.ireg(0), 0);
    assert_eq!(cpu.ireg(3), 5);
}

#[test]
fn f0_and_f1_stay_zero() {
    let prog = [ixfr(3, 0), ixfr(3, 1), ixfr(3, 2)];
    let (mut cpu, mem) = machine(&prog);
    cpu.set_ireg(3, 0xFFFF_FFFF);
    steps(&mut cpu, &mem, 3);
    assert_eq!(cpu.freg_s(0), 0);
    assert_eq!(cpu.freg_s(1), 0);
    assert_eq!(cpu.freg_s(2), 0xFFFF_FFFF);
}

#[test]
fn fir_ignores_stores() {
    let prog = [st_c(3, CR_FIR), ld_c(CR_FIR, 5)];
    let (mut cpu, mem) = machine(&prog);
    cpu.set_ireg(3, 0x1234_5678);
    steps(&mut cpu, &mem, 2);
    assert_eq!(cpu.ireg(5), 0);
}

#[test]
fn db_latches_any_value() {
    let prog = [st_c(3, CR_DB), ld_c(CR_DB, 5)];
    let (mut cpu, mem) = machine(&prog);
    cpu.set_ireg(3, 0xAAAA_5555);
    steps(&mut cpu, &mem, 2);
    assert_eq!(cpu.ireg(5), 0xAAAA_5555);
}

#[test]
fn epsr_keeps_the_hardwired_identity() {
    let prog = [ld_c(CR_EPSR, 5), st_c(3, CR_EPSR), ld_c(CR_EPSR, 6)];
    let (mut cpu, mem) = machine(&prog);
    cpu.set_ireg(3, 0x0000_1FFF); // try to clobber type and stepping
    steps(&mut cpu, &mem, 3);
    assert_eq!(cpu.ireg(5) & 0x1FFF, cpu.ireg(6) & 0x1FFF);
    assert_eq!(cpu.ireg(6) & 0xFF, 0x01, "processor type");
    assert_eq!((cpu.ireg(6) >> 8) & 0x1F, 5, "stepping");
}

#[test]
fn dirbase_invalidate_bit_reads_back_zero() {
    let prog = [st_c(3, CR_DIRBASE), ld_c(CR_DIRBASE, 5)];
    let (mut cpu, mem) = machine(&prog);
    cpu.set_ireg(3, 0x0002_0020); // a directory base plus the iti command
    steps(&mut cpu, &mem, 2);
    assert_eq!(cpu.ireg(5), 0x0002_0000);
}

#[test]
fn boot_fetch_mode_clears_one_way() {
    let prog = [
        ld_c(CR_DIRBASE, 5), // visible at power-on
        st_c(0, CR_DIRBASE), // leave boot mode
        st_c(3, CR_DIRBASE), // try to set it again
        ld_c(CR_DIRBASE, 6),
    ];
    let (mut cpu, mem) = machine(&prog);
    cpu.set_ireg(3, 0x80); // the cs8 bit
    steps(&mut cpu, &mem, prog.len());
    assert!(cpu.ireg(5) & 0x80 != 0);
    assert_eq!(cpu.ireg(6) & 0x80, 0);
}

#[test]
fn fsr_round_trips() {
    let prog = [st_c(3, CR_FSR), ld_c(CR_FSR, 5)];
    let (mut cpu, mem) = machine(&prog);
    cpu.set_ireg(3, 0x0000_0021); // trap enable plus flush-to-zero
    steps(&mut cpu, &mem, 2);
    assert_eq!(cpu.ireg(5), 0x21);
}

#[test]
fn escape_group_decodes() {
    let prog = [lock(), unlock(), intovr()];
    let (mut cpu, mem) = machine(&prog);
    steps(&mut cpu, &mem, 3);
    // nothing overflowed, so intovr passes through quietly
    assert_eq!(cpu.pc(), BASE + 12);
    assert_eq!(cpu.psr_raw() & Psr::TRAP_CAUSES, 0);
}
