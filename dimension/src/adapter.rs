//! Host-side views of the board.
//!
//! The host CPU reaches the board through two windows. Board space strips
//! the slot nibble and exposes internal memory only. Slot space folds the
//! low 24 bits under the device region, where the scratch memory, device
//! registers and boot ROM live, and intercepts the bus interface chip's
//! register window at the very top before bank dispatch. The auxiliary
//! core is a different bus master and never comes through here.

use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};

use log::debug;

use common::Bus;
use common::constants::{BOARD_LOCAL_MASK, NBIC_THRESHOLD, SLOT_FOLD_BASE, SLOT_LOCAL_MASK};

use crate::banks::NdMem;

/// Bus interface chip registers. Word-wide internally; sub-word host
/// access picks big-endian lanes out of the register, the way the chip
/// sits on the 68k bus.
pub struct Nbic {
    intmask: AtomicU32,
    control: AtomicU32,
}

impl Nbic {
    // Slot-local register offsets.
    pub const INTSTATUS: u32 = 0x00FF_FFD0;
    pub const INTMASK: u32 = 0x00FF_FFD4;
    pub const ID: u32 = 0x00FF_FFE8;
    pub const CONTROL: u32 = 0x00FF_FFF0;

    /// Board class and revision, probed byte-wise by the host ROM.
    pub const BOARD_ID: u32 = 0xC000_0001;

    fn new() -> Nbic {
        Nbic {
            intmask: AtomicU32::new(0),
            control: AtomicU32::new(0),
        }
    }

    fn reg_read(&self, local: u32) -> u32 {
        match local & !3 {
            // no board-to-host interrupt source in this model
            Nbic::INTSTATUS => 0,
            Nbic::INTMASK => self.intmask.load(Ordering::Relaxed),
            Nbic::ID => Nbic::BOARD_ID,
            Nbic::CONTROL => self.control.load(Ordering::Relaxed),
            _ => {
                debug!("nbic read of unimplemented register {local:#x}");
                0
            }
        }
    }

    fn reg_write(&self, local: u32, val: u32) {
        match local & !3 {
            Nbic::INTMASK => self.intmask.store(val, Ordering::Relaxed),
            Nbic::CONTROL => self.control.store(val, Ordering::Relaxed),
            Nbic::INTSTATUS | Nbic::ID => {
                debug!("nbic write to read-only register {local:#x} dropped")
            }
            _ => debug!("nbic write to unimplemented register {local:#x} dropped"),
        }
    }

    fn lane_shift(local: u32, width: u32) -> u32 {
        let lane = (local & 3).min(4 - width);
        8 * (4 - width - lane)
    }

    fn read(&self, local: u32, width: u32) -> u32 {
        let mask = if width == 4 { u32::MAX } else { (1 << (8 * width)) - 1 };
        (self.reg_read(local) >> Nbic::lane_shift(local, width)) & mask
    }

    fn write(&self, local: u32, val: u32, width: u32) {
        if width == 4 {
            self.reg_write(local, val);
            return;
        }
        let shift = Nbic::lane_shift(local, width);
        let mask = ((1u32 << (8 * width)) - 1) << shift;
        let old = self.reg_read(local);
        self.reg_write(local & !3, (old & !mask) | ((val << shift) & mask));
    }
}

////////////////////////////////////////////////////////////////////////////////

/// Routes host accesses into the bank table, forcing the fixed high bits
/// of the chosen window first.
pub struct HostAdapter {
    mem: Arc<NdMem>,
    nbic: Nbic,
}

impl HostAdapter {
    pub fn new(mem: Arc<NdMem>) -> HostAdapter {
        HostAdapter {
            mem,
            nbic: Nbic::new(),
        }
    }

    pub fn board_read_u8(&self, addr: u32) -> u8 {
        self.mem.read_u8(addr & BOARD_LOCAL_MASK)
    }

    pub fn board_read_u16(&self, addr: u32) -> u16 {
        self.mem.read_u16(addr & BOARD_LOCAL_MASK)
    }

    pub fn board_read_u32(&self, addr: u32) -> u32 {
        self.mem.read_u32(addr & BOARD_LOCAL_MASK)
    }

    pub fn board_write_u8(&self, addr: u32, val: u8) {
        self.mem.write_u8(addr & BOARD_LOCAL_MASK, val);
    }

    pub fn board_write_u16(&self, addr: u32, val: u16) {
        self.mem.write_u16(addr & BOARD_LOCAL_MASK, val);
    }

    pub fn board_write_u32(&self, addr: u32, val: u32) {
        self.mem.write_u32(addr & BOARD_LOCAL_MASK, val);
    }

    pub fn slot_read_u8(&self, addr: u32) -> u8 {
        let local = addr & SLOT_LOCAL_MASK;
        if local >= NBIC_THRESHOLD {
            self.nbic.read(local, 1) as u8
        } else {
            self.mem.read_u8(SLOT_FOLD_BASE | local)
        }
    }

    pub fn slot_read_u16(&self, addr: u32) -> u16 {
        let local = addr & SLOT_LOCAL_MASK;
        if local >= NBIC_THRESHOLD {
            self.nbic.read(local, 2) as u16
        } else {
            self.mem.read_u16(SLOT_FOLD_BASE | local)
        }
    }

    pub fn slot_read_u32(&self, addr: u32) -> u32 {
        let local = addr & SLOT_LOCAL_MASK;
        if local >= NBIC_THRESHOLD {
            self.nbic.read(local, 4)
        } else {
            self.mem.read_u32(SLOT_FOLD_BASE | local)
        }
    }

    pub fn slot_write_u8(&self, addr: u32, val: u8) {
        let local = addr & SLOT_LOCAL_MASK;
        if local >= NBIC_THRESHOLD {
            self.nbic.write(local, val as u32, 1);
        } else {
            self.mem.write_u8(SLOT_FOLD_BASE | local, val);
        }
    }

    pub fn slot_write_u16(&self, addr: u32, val: u16) {
        let local = addr & SLOT_LOCAL_MASK;
        if local >= NBIC_THRESHOLD {
            self.nbic.write(local, val as u32, 2);
        } else {
            self.mem.write_u16(SLOT_FOLD_BASE | local, val);
        }
    }

    pub fn slot_write_u32(&self, addr: u32, val: u32) {
        let local = addr & SLOT_LOCAL_MASK;
        if local >= NBIC_THRESHOLD {
            self.nbic.write(local, val, 4);
        } else {
            self.mem.write_u32(SLOT_FOLD_BASE | local, val);
        }
    }
}
