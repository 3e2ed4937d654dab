//! Bank table and the memory banks behind it.
//!
//! The 32-bit space is carved into 64KB banks; every access resolves its
//! bank with one table lookup and dispatches on the bank kind. The table is
//! populated once at board construction and never remapped afterwards.
//! Unmapped or absent regions log and return zero instead of faulting; the
//! boot firmware probes address ranges speculatively and relies on the bus
//! tolerating it.

use bytemuck::cast_slice_mut;
use log::debug;

use common::Bus;
use common::constants::{
    BANK_COUNT, BANK_SHIFT, BANK_SIZE, DMEM_BASE, DMEM_SCRATCH_LEN, DRAM_BANKS, DRAM_BANK_SPAN,
    DRAM_BASE, MC_BASE, RAMDAC_BASE, ROM_BASE, ROM_LEN, VRAM_BASE, VRAM_LEN, VRAM_MASK,
};
use derive_more::IsVariant;

use crate::config::NdConfig;
use crate::io::dp::Dp;
use crate::io::mc::Mc;
use crate::io::ramdac::Ramdac;
use crate::port::MessagePort;

const MB: u32 = 1 << 20;

// The boot ROM window spans four bytes of address per ROM byte.
const ROM_WINDOW: u32 = ROM_LEN << 2;

/// Fixed heap buffer addressed by offset from both the host adapter and the
/// core's access tables. Reads and writes go through raw pointers in host
/// byte order; the startup self-test pins the host to little-endian so the
/// core's big-endian view can be produced purely by address folding.
pub(crate) struct Arena {
    ptr: *mut u8,
    len: usize,
}

// SAFETY: the allocation is created once and freed on drop; the pointer
// never moves. Cross-thread access is unsynchronized by design: the
// scheduling protocol guarantees a single active bus master per region.
unsafe impl Send for Arena {}
unsafe impl Sync for Arena {}

impl Arena {
    fn new(len: usize) -> Arena {
        let boxed = vec![0u8; len].into_boxed_slice();
        Arena {
            ptr: Box::into_raw(boxed) as *mut u8,
            len,
        }
    }

    fn rd8(&self, off: usize) -> u32 {
        debug_assert!(off < self.len);
        unsafe { *self.ptr.add(off) as u32 }
    }

    fn wr8(&self, off: usize, val: u32) {
        debug_assert!(off < self.len);
        unsafe { *self.ptr.add(off) = val as u8 }
    }

    fn rd16(&self, off: usize) -> u32 {
        debug_assert!(off + 2 <= self.len);
        unsafe { (self.ptr.add(off) as *const u16).read_unaligned() as u32 }
    }

    fn wr16(&self, off: usize, val: u32) {
        debug_assert!(off + 2 <= self.len);
        unsafe { (self.ptr.add(off) as *mut u16).write_unaligned(val as u16) }
    }

    fn rd32(&self, off: usize) -> u32 {
        debug_assert!(off + 4 <= self.len);
        unsafe { (self.ptr.add(off) as *const u32).read_unaligned() }
    }

    fn wr32(&self, off: usize, val: u32) {
        debug_assert!(off + 4 <= self.len);
        unsafe { (self.ptr.add(off) as *mut u32).write_unaligned(val) }
    }

    fn load_from(&self, data: &[u8]) {
        debug_assert!(data.len() <= self.len);
        for (off, byte) in data.iter().enumerate() {
            self.wr8(off, *byte as u32);
        }
    }
}

impl Drop for Arena {
    fn drop(&mut self) {
        // SAFETY: ptr/len came from Box::into_raw of a boxed slice.
        unsafe {
            drop(Box::from_raw(std::ptr::slice_from_raw_parts_mut(
                self.ptr, self.len,
            )));
        }
    }
}

////////////////////////////////////////////////////////////////////////////////

/// Access policy of one 64KB bank. Copy data, dispatched by match in the
/// access path.
#[derive(Clone, Copy, Debug, PartialEq, Eq, IsVariant)]
pub enum Bank {
    /// Never mapped by firmware. Logs, reads zero, drops writes.
    Illegal,
    /// A populated slot with no memory module in it. Same policy as
    /// Illegal but distinct in the logs.
    Empty,
    Ram { slot: usize, mask: u32 },
    Vram,
    Rom,
    Dmem,
    Io,
    Dac,
}

/// Pixel byte placement. Row selected by address mod 4; value bytes land
/// most-significant first at the row's offsets. Narrower widths use the
/// leading entries. Loads read back through the same table, so the
/// permutation is invisible from the bus side and only the framebuffer
/// consumer sees the raw order.
const VRAM_DELTA: [[i32; 4]; 4] = [
    [2, 1, 0, 3],
    [0, -1, 2, 5],
    [-2, 1, 4, 3],
    [0, 3, 2, 1],
];

pub struct NdMem {
    table: Vec<Bank>,
    dram: Vec<Arena>,
    vram: Arena,
    scratch: Arena,
    rom: Arena,
    pub mc: Mc,
    pub dac: Ramdac,
    pub dp: Dp,
    pub port: MessagePort,
}

impl NdMem {
    pub fn new(config: &NdConfig) -> NdMem {
        let mut mem = NdMem {
            table: vec![Bank::Illegal; BANK_COUNT],
            dram: config
                .bank_mb
                .iter()
                .map(|mb| Arena::new((mb * MB) as usize))
                .collect(),
            vram: Arena::new(VRAM_LEN as usize),
            scratch: Arena::new(DMEM_SCRATCH_LEN as usize),
            rom: Arena::new(ROM_LEN as usize),
            mc: Mc::new(config.cs8_strap, config.slot),
            dac: Ramdac::new(),
            dp: Dp::new(),
            port: MessagePort::new(),
        };

        let span_banks = (DRAM_BANK_SPAN >> BANK_SHIFT) as usize;
        for slot in 0..DRAM_BANKS {
            let start = ((DRAM_BASE + slot as u32 * DRAM_BANK_SPAN) >> BANK_SHIFT) as usize;
            let bank = match config.bank_mb[slot] {
                0 => Bank::Empty,
                mb => Bank::Ram {
                    slot,
                    mask: mb * MB - 1,
                },
            };
            mem.map_banks(bank, start, span_banks);
        }
        // VRAM mirrors across its whole 16MB span.
        mem.map_banks(
            Bank::Vram,
            (VRAM_BASE >> BANK_SHIFT) as usize,
            (DRAM_BANK_SPAN >> BANK_SHIFT) as usize,
        );
        mem.map_banks(Bank::Dmem, (DMEM_BASE >> BANK_SHIFT) as usize, 1);
        mem.map_banks(Bank::Dac, (RAMDAC_BASE >> BANK_SHIFT) as usize, 1);
        mem.map_banks(Bank::Io, (MC_BASE >> BANK_SHIFT) as usize, 1);
        mem.map_banks(
            Bank::Rom,
            (ROM_BASE >> BANK_SHIFT) as usize,
            (ROM_WINDOW >> BANK_SHIFT) as usize,
        );
        mem
    }

    /// Installs `bank` into table slots `[start, start+count)`. Last writer
    /// wins, the way real bus remapping behaves.
    pub fn map_banks(&mut self, bank: Bank, start: usize, count: usize) {
        for slot in &mut self.table[start..start + count] {
            *slot = bank;
        }
    }

    pub fn resolve(&self, addr: u32) -> Bank {
        self.table[(addr >> BANK_SHIFT) as usize]
    }

    pub fn load_rom(&self, image: &[u8]) {
        self.rom.load_from(image);
    }

    ////////////////////////////////////////////////////////////////////////

    /// Raw pixel memory for the presentation collaborator. Byte layout is
    /// the VRAM_DELTA order; consumers depend on it bit-for-bit.
    pub fn framebuffer_ptr(&self) -> *const u8 {
        self.vram.ptr
    }

    pub fn framebuffer_len(&self) -> usize {
        self.vram.len
    }

    /// Copies the frame out as words, for consumers that want an owned
    /// snapshot instead of the live pointer.
    pub fn framebuffer_snapshot(&self) -> Vec<u32> {
        let mut words = vec![0u32; self.vram.len / 4];
        let bytes = cast_slice_mut::<u32, u8>(&mut words);
        // SAFETY: source is valid for len; racing stores are tolerated by
        // the snapshot contract (tearing yields stale pixels, not UB on
        // the copy itself given the single-master protocol).
        unsafe { std::ptr::copy_nonoverlapping(self.vram.ptr, bytes.as_mut_ptr(), self.vram.len) };
        words
    }

    ////////////////////////////////////////////////////////////////////////

    fn vram_read(&self, addr: u32, width: u32) -> u32 {
        let off = addr & VRAM_MASK;
        let row = &VRAM_DELTA[(off & 3) as usize];
        let mut val = 0;
        for k in 0..width {
            let src = off.wrapping_add(row[k as usize] as u32) & VRAM_MASK;
            val = (val << 8) | self.vram.rd8(src as usize);
        }
        val
    }

    fn vram_write(&self, addr: u32, val: u32, width: u32) {
        let off = addr & VRAM_MASK;
        let row = &VRAM_DELTA[(off & 3) as usize];
        for k in 0..width {
            let dst = off.wrapping_add(row[k as usize] as u32) & VRAM_MASK;
            self.vram.wr8(dst as usize, (val >> (8 * (width - 1 - k))) & 0xFF);
        }
    }

    // The ROM interface delivers one byte per 4 bytes of address space.
    fn rom_read(&self, addr: u32, width: u32) -> u32 {
        let off = ((addr & (ROM_WINDOW - 1)) >> 2) & (ROM_LEN - 1);
        let mut val = 0;
        for k in 0..width {
            val |= self.rom.rd8(((off + k) & (ROM_LEN - 1)) as usize) << (8 * k);
        }
        val
    }

    fn dmem_read(&self, addr: u32, width: u32) -> u32 {
        let off = (addr & (BANK_SIZE - 1)) as usize;
        if off + width as usize <= DMEM_SCRATCH_LEN as usize {
            match width {
                1 => self.scratch.rd8(off),
                2 => self.scratch.rd16(off),
                _ => self.scratch.rd32(off),
            }
        } else {
            self.dp.read(off)
        }
    }

    fn dmem_write(&self, addr: u32, val: u32, width: u32) {
        let off = (addr & (BANK_SIZE - 1)) as usize;
        if off + width as usize <= DMEM_SCRATCH_LEN as usize {
            match width {
                1 => self.scratch.wr8(off, val),
                2 => self.scratch.wr16(off, val),
                _ => self.scratch.wr32(off, val),
            }
        } else {
            self.dp.write(off, val);
        }
    }

    fn load(&self, addr: u32, width: u32) -> u32 {
        match self.resolve(addr) {
            Bank::Ram { slot, mask } => {
                let off = (addr & mask) as usize;
                match width {
                    1 => self.dram[slot].rd8(off),
                    2 => self.dram[slot].rd16(off),
                    _ => self.dram[slot].rd32(off),
                }
            }
            Bank::Vram => self.vram_read(addr, width),
            Bank::Rom => self.rom_read(addr, width),
            Bank::Dmem => self.dmem_read(addr, width),
            Bank::Io => {
                if width == 4 {
                    self.mc.read(addr & (BANK_SIZE - 1))
                } else {
                    debug!("narrow read of io bank at {addr:08x}");
                    0
                }
            }
            Bank::Dac => {
                let byte = self.dac.read(addr) as u32;
                match width {
                    1 => byte,
                    2 => byte << 8 | byte,
                    _ => byte << 24 | byte << 16 | byte << 8 | byte,
                }
            }
            Bank::Empty => {
                debug!("read of empty bank at {addr:08x}");
                0
            }
            Bank::Illegal => {
                debug!("read of unmapped address {addr:08x}");
                0
            }
        }
    }

    fn store(&self, addr: u32, val: u32, width: u32) {
        match self.resolve(addr) {
            Bank::Ram { slot, mask } => {
                let off = (addr & mask) as usize;
                match width {
                    1 => self.dram[slot].wr8(off, val),
                    2 => self.dram[slot].wr16(off, val),
                    _ => self.dram[slot].wr32(off, val),
                }
            }
            Bank::Vram => self.vram_write(addr, val, width),
            Bank::Rom => debug!("write to rom at {addr:08x} dropped"),
            Bank::Dmem => self.dmem_write(addr, val, width),
            Bank::Io => {
                if width == 4 {
                    self.mc.write(&self.port, addr & (BANK_SIZE - 1), val);
                } else {
                    debug!("narrow write to io bank at {addr:08x} dropped");
                }
            }
            Bank::Dac => {
                for k in 0..width {
                    self.dac.write(addr, (val >> (8 * (width - 1 - k))) as u8);
                }
            }
            Bank::Empty => debug!("write to empty bank at {addr:08x} dropped"),
            Bank::Illegal => debug!("write to unmapped address {addr:08x} dropped"),
        }
    }
}

impl Bus for NdMem {
    fn read_u8(&self, addr: u32) -> u8 {
        self.load(addr, 1) as u8
    }

    fn read_u16(&self, addr: u32) -> u16 {
        self.load(addr, 2) as u16
    }

    fn read_u32(&self, addr: u32) -> u32 {
        self.load(addr, 4)
    }

    fn write_u8(&self, addr: u32, val: u8) {
        self.store(addr, val as u32, 1);
    }

    fn write_u16(&self, addr: u32, val: u16) {
        self.store(addr, val as u32, 2);
    }

    fn write_u32(&self, addr: u32, val: u32) {
        self.store(addr, val, 4);
    }

    // Boot fetches bypass the ROM's divide-by-four remap.
    fn read_cs8(&self, addr: u32) -> u8 {
        match self.resolve(addr) {
            Bank::Rom => self.rom.rd8((addr & (ROM_LEN - 1)) as usize) as u8,
            _ => self.read_u8(addr),
        }
    }
}
