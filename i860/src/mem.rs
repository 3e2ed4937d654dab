//! Memory access plumbing for the auxiliary core: the endianness-selected
//! access function tables, address translation, and the instruction cache.
//!
//! The access tables hold ten function pointers (five widths, load and
//! store). Flipping the data endianness swaps the whole table with a single
//! reference assignment; it only ever happens between instructions, so no
//! partially-swapped state is observable. The backing bus is little-endian;
//! big-endian mode folds sub-word addresses and reverses the word order of
//! wide accesses.

use common::Bus;

use crate::regs::{Dirbase, Stats};

pub struct AccessFns {
    pub rd8: fn(&dyn Bus, u32) -> u32,
    pub rd16: fn(&dyn Bus, u32) -> u32,
    pub rd32: fn(&dyn Bus, u32) -> u32,
    pub rd64: fn(&dyn Bus, u32) -> [u32; 2],
    pub rd128: fn(&dyn Bus, u32) -> [u32; 4],
    pub wr8: fn(&dyn Bus, u32, u32),
    pub wr16: fn(&dyn Bus, u32, u32),
    pub wr32: fn(&dyn Bus, u32, u32),
    pub wr64: fn(&dyn Bus, u32, [u32; 2]),
    pub wr128: fn(&dyn Bus, u32, [u32; 4]),
}

fn rd8_le(bus: &dyn Bus, addr: u32) -> u32 {
    bus.read_u8(addr) as u32
}

fn rd16_le(bus: &dyn Bus, addr: u32) -> u32 {
    bus.read_u16(addr) as u32
}

fn rd32_any(bus: &dyn Bus, addr: u32) -> u32 {
    bus.read_u32(addr)
}

// Wide values index low word first; [0] lands in the even register.
fn rd64_le(bus: &dyn Bus, addr: u32) -> [u32; 2] {
    [bus.read_u32(addr), bus.read_u32(addr.wrapping_add(4))]
}

fn rd128_le(bus: &dyn Bus, addr: u32) -> [u32; 4] {
    [
        bus.read_u32(addr),
        bus.read_u32(addr.wrapping_add(4)),
        bus.read_u32(addr.wrapping_add(8)),
        bus.read_u32(addr.wrapping_add(12)),
    ]
}

fn wr8_le(bus: &dyn Bus, addr: u32, val: u32) {
    bus.write_u8(addr, val as u8);
}

fn wr16_le(bus: &dyn Bus, addr: u32, val: u32) {
    bus.write_u16(addr, val as u16);
}

fn wr32_any(bus: &dyn Bus, addr: u32, val: u32) {
    bus.write_u32(addr, val);
}

fn wr64_le(bus: &dyn Bus, addr: u32, val: [u32; 2]) {
    bus.write_u32(addr, val[0]);
    bus.write_u32(addr.wrapping_add(4), val[1]);
}

fn wr128_le(bus: &dyn Bus, addr: u32, val: [u32; 4]) {
    for (k, w) in val.iter().enumerate() {
        bus.write_u32(addr.wrapping_add(4 * k as u32), *w);
    }
}

// Big-endian mode: sub-word addresses fold onto the little-endian bus, word
// accesses are unchanged, and wide accesses go high-order word first.
fn rd8_be(bus: &dyn Bus, addr: u32) -> u32 {
    bus.read_u8(addr ^ 3) as u32
}

fn rd16_be(bus: &dyn Bus, addr: u32) -> u32 {
    bus.read_u16(addr ^ 2) as u32
}

fn rd64_be(bus: &dyn Bus, addr: u32) -> [u32; 2] {
    [bus.read_u32(addr.wrapping_add(4)), bus.read_u32(addr)]
}

fn rd128_be(bus: &dyn Bus, addr: u32) -> [u32; 4] {
    [
        bus.read_u32(addr.wrapping_add(12)),
        bus.read_u32(addr.wrapping_add(8)),
        bus.read_u32(addr.wrapping_add(4)),
        bus.read_u32(addr),
    ]
}

fn wr8_be(bus: &dyn Bus, addr: u32, val: u32) {
    bus.write_u8(addr ^ 3, val as u8);
}

fn wr16_be(bus: &dyn Bus, addr: u32, val: u32) {
    bus.write_u16(addr ^ 2, val as u16);
}

fn wr64_be(bus: &dyn Bus, addr: u32, val: [u32; 2]) {
    bus.write_u32(addr, val[1]);
    bus.write_u32(addr.wrapping_add(4), val[0]);
}

fn wr128_be(bus: &dyn Bus, addr: u32, val: [u32; 4]) {
    bus.write_u32(addr, val[3]);
    bus.write_u32(addr.wrapping_add(4), val[2]);
    bus.write_u32(addr.wrapping_add(8), val[1]);
    bus.write_u32(addr.wrapping_add(12), val[0]);
}

pub static ACCESS_LE: AccessFns = AccessFns {
    rd8: rd8_le,
    rd16: rd16_le,
    rd32: rd32_any,
    rd64: rd64_le,
    rd128: rd128_le,
    wr8: wr8_le,
    wr16: wr16_le,
    wr32: wr32_any,
    wr64: wr64_le,
    wr128: wr128_le,
};

pub static ACCESS_BE: AccessFns = AccessFns {
    rd8: rd8_be,
    rd16: rd16_be,
    rd32: rd32_any,
    rd64: rd64_be,
    rd128: rd128_be,
    wr8: wr8_be,
    wr16: wr16_be,
    wr32: wr32_any,
    wr64: wr64_be,
    wr128: wr128_be,
};

pub fn access_table(be: bool) -> &'static AccessFns {
    if be { &ACCESS_BE } else { &ACCESS_LE }
}

////////////////////////////////////////////////////////////////////////////////

const TLB_LINES: usize = 64;
const ICACHE_LINES: usize = 512; // 8-byte lines, 4KB total

const PTE_PRESENT: u32 = 1 << 0;
const PTE_ACCESSED: u32 = 1 << 5;
const PTE_DIRTY: u32 = 1 << 6;
const PTE_FRAME: u32 = 0xFFFF_F000;

#[derive(Default, Clone, Copy)]
struct TlbEntry {
    valid: bool,
    dirty: bool,
    vpn: u32,
    frame: u32,
}

#[derive(Default, Clone, Copy)]
struct ILine {
    valid: bool,
    tag: u32,
    data: [u32; 2],
}

/// Translation lookaside buffer and instruction cache. Both are flushed by
/// writing ITI to dirbase.
pub struct Mmu {
    tlb: [TlbEntry; TLB_LINES],
    icache: Box<[ILine]>,
}

impl Mmu {
    pub fn new() -> Self {
        Mmu {
            tlb: [TlbEntry::default(); TLB_LINES],
            icache: vec![ILine::default(); ICACHE_LINES].into_boxed_slice(),
        }
    }

    pub fn invalidate(&mut self) {
        self.tlb = [TlbEntry::default(); TLB_LINES];
        self.icache.fill(ILine::default());
    }

    /// Two-level page walk with a direct-mapped TLB in front. `Err` means
    /// the mapping is absent; the caller raises the access fault matching
    /// the access kind.
    pub fn translate(
        &mut self,
        bus: &dyn Bus,
        db: Dirbase,
        va: u32,
        wr: bool,
        stats: &mut Stats,
    ) -> Result<u32, ()> {
        if !db.ate() {
            return Ok(va);
        }

        let vpn = va >> 12;
        let line = (vpn as usize) & (TLB_LINES - 1);
        let e = self.tlb[line];
        if e.valid && e.vpn == vpn && (!wr || e.dirty) {
            stats.tlb_hits += 1;
            return Ok(e.frame | (va & 0xFFF));
        }
        stats.tlb_misses += 1;

        let dir_addr = db.dtb() | ((va >> 22) << 2);
        let dir = bus.read_u32(dir_addr);
        if dir & PTE_PRESENT == 0 {
            return Err(());
        }
        let pte_addr = (dir & PTE_FRAME) | (((va >> 12) & 0x3FF) << 2);
        let mut pte = bus.read_u32(pte_addr);
        if pte & PTE_PRESENT == 0 {
            return Err(());
        }

        // Maintain accessed/dirty in the table the way the hardware does.
        let want = PTE_ACCESSED | if wr { PTE_DIRTY } else { 0 };
        if pte & want != want {
            pte |= want;
            bus.write_u32(pte_addr, pte);
        }

        self.tlb[line] = TlbEntry {
            valid: true,
            dirty: pte & PTE_DIRTY != 0,
            vpn,
            frame: pte & PTE_FRAME,
        };
        Ok((pte & PTE_FRAME) | (va & 0xFFF))
    }

    /// Fetch the aligned 64-bit pair holding `pa` through the instruction
    /// cache. Returns (low word, high word).
    pub fn fetch_pair(&mut self, bus: &dyn Bus, pa: u32, stats: &mut Stats) -> (u32, u32) {
        let base = pa & !7;
        let line = ((base >> 3) as usize) & (ICACHE_LINES - 1);
        let tag = base >> 12;
        let e = &mut self.icache[line];
        if e.valid && e.tag == tag {
            stats.icache_hits += 1;
        } else {
            stats.icache_misses += 1;
            *e = ILine {
                valid: true,
                tag,
                data: [bus.read_u32(base), bus.read_u32(base | 4)],
            };
        }
        (e.data[0], e.data[1])
    }
}

impl Default for Mmu {
    fn default() -> Self {
        Self::new()
    }
}
