//! Video datapath register block, reached through the top of the
//! scratch+control bank.
//!
//! Firmware programs these during display setup; nothing on the emulated
//! board consumes them, so they are plain latched storage with logging.

use std::sync::atomic::{AtomicU32, Ordering};

use log::debug;

use common::constants::DMEM_SCRATCH_LEN;

const DP_REGS: usize = 32;

pub struct Dp {
    regs: [AtomicU32; DP_REGS],
}

impl Dp {
    pub fn new() -> Dp {
        Dp {
            regs: std::array::from_fn(|_| AtomicU32::new(0)),
        }
    }

    // Register space starts right above the scratch buffer and mirrors.
    fn index(off: usize) -> usize {
        off.wrapping_sub(DMEM_SCRATCH_LEN as usize) >> 2 & (DP_REGS - 1)
    }

    pub fn read(&self, off: usize) -> u32 {
        let val = self.regs[Dp::index(off)].load(Ordering::Relaxed);
        debug!("dp read {off:#x} -> {val:08x}");
        val
    }

    pub fn write(&self, off: usize, val: u32) {
        debug!("dp write {off:#x} <- {val:08x}");
        self.regs[Dp::index(off)].store(val, Ordering::Relaxed);
    }
}

impl Default for Dp {
    fn default() -> Dp {
        Dp::new()
    }
}
