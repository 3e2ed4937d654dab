use crate::asm::*;
use crate::harness::{board, machine, steps};
use common::constants::{RESET_VECTOR, ROM_LEN};
use common::mem::as_byte_slice;
use i860::Cpu;

fn rom_image(at: u32, words: &[u32]) -> Vec<u8> {
    let mut image = vec![0u8; ROM_LEN as usize];
    let start = (at & (ROM_LEN - 1)) as usize;
    let bytes = as_byte_slice(words);
    image[start..start + bytes.len()].copy_from_slice(bytes);
    image
}

#[test]
fn blank_eeprom_executes_as_harmless_xorh() {
    let mem = board();
    mem.load_rom(&vec![0xFF; ROM_LEN as usize]);
    let mut cpu = Cpu::new();
    assert_eq!(cpu.pc(), RESET_VECTOR);
    steps(&mut cpu, &mem, 3);
    assert_eq!(cpu.pc(), RESET_VECTOR + 12);
    assert_eq!(cpu.ireg(31), 0xFFFF_0000);
    assert_eq!(cpu.stats().executed, 3);
}

#[test]
fn boot_fetch_assembles_words_byte_wide() {
    let mem = board();
    mem.load_rom(&rom_image(
        RESET_VECTOR,
        &[orh(0x1234, 0, 5), or_i(0x5678, 5, 5)],
    ));
    let mut cpu = Cpu::new();
    steps(&mut cpu, &mem, 2);
    assert_eq!(cpu.ireg(5), 0x1234_5678);
}

#[test]
fn leaving_boot_mode_engages_the_instruction_cache() {
    let prog = [
        st_c(0, CR_DIRBASE), // drop the byte-wide strap
        or_i(1, 0, 8),
        or_i(2, 8, 8),
        or_i(4, 8, 8),
    ];
    let (mut cpu, mem) = machine(&prog);
    assert_eq!(cpu.stats().icache_misses, 0);
    steps(&mut cpu, &mem, 4);
    assert_eq!(cpu.ireg(8), 7);
    // the second word misses its pair, the third misses the next one,
    // the fourth hits that line
    assert_eq!(cpu.stats().icache_misses, 2);
    assert_eq!(cpu.stats().icache_hits, 1);
}
