//! Memory-controller register file behind the IO bank.
//!
//! Four word registers, reachable from both bus masters, so the storage is
//! atomic. CSR0 is the live control/status word; CSR1 and CSR2 are scratch
//! the firmware uses freely; SID identifies the slot. Side effects (core
//! reset, interrupt line changes) are delivered through the message port
//! rather than touching the core directly.

use std::sync::atomic::{AtomicU32, Ordering};

use log::debug;

use crate::port::MessagePort;

pub struct Mc {
    csr0: AtomicU32,
    csr1: AtomicU32,
    csr2: AtomicU32,
    sid: u32,
}

impl Mc {
    // Register offsets within the IO bank.
    pub const CSR0: u32 = 0x0;
    pub const CSR1: u32 = 0x4;
    pub const CSR2: u32 = 0x8;
    pub const SID: u32 = 0xC;

    // CSR0 bits.
    /// Level of the auxiliary core's INT pin.
    pub const INT860: u32 = 1 << 0;
    /// Vertical-blank interrupt enable.
    pub const VBL_IE: u32 = 1 << 1;
    /// Vertical-blank interrupt pending. Write 1 to clear.
    pub const VBL_IP: u32 = 1 << 2;
    /// Pulses a core reset. Reads back as zero.
    pub const RESET860: u32 = 1 << 3;
    /// Byte-wide boot-fetch strap. Read-only.
    pub const CS8: u32 = 1 << 4;

    pub fn new(cs8_strap: bool, slot: u32) -> Mc {
        Mc {
            csr0: AtomicU32::new(if cs8_strap { Mc::CS8 } else { 0 }),
            csr1: AtomicU32::new(0),
            csr2: AtomicU32::new(0),
            sid: slot,
        }
    }

    pub fn read(&self, off: u32) -> u32 {
        match off {
            Mc::CSR0 => self.csr0.load(Ordering::Relaxed),
            Mc::CSR1 => self.csr1.load(Ordering::Relaxed),
            Mc::CSR2 => self.csr2.load(Ordering::Relaxed),
            Mc::SID => self.sid,
            _ => {
                debug!("mc read of unknown register {off:#x}");
                0
            }
        }
    }

    pub fn write(&self, port: &MessagePort, off: u32, val: u32) {
        match off {
            Mc::CSR0 => self.write_csr0(port, val),
            Mc::CSR1 => self.csr1.store(val, Ordering::Relaxed),
            Mc::CSR2 => self.csr2.store(val, Ordering::Relaxed),
            Mc::SID => debug!("mc write to read-only sid dropped"),
            _ => debug!("mc write to unknown register {off:#x} dropped"),
        }
    }

    fn write_csr0(&self, port: &MessagePort, val: u32) {
        let old = self.csr0.load(Ordering::Relaxed);
        let mut new = val & (Mc::INT860 | Mc::VBL_IE);
        new |= old & Mc::CS8;
        // pending bit is write-1-clear
        new |= old & Mc::VBL_IP & !val;
        self.csr0.store(new, Ordering::Relaxed);
        if val & Mc::RESET860 != 0 {
            port.send(MessagePort::RESET);
        }
        port.send(Mc::int_message(new));
    }

    /// Interrupt line level implied by a CSR0 value: the direct INT860
    /// level or an enabled pending vblank.
    fn int_message(csr0: u32) -> u32 {
        let vbl = csr0 & Mc::VBL_IE != 0 && csr0 & Mc::VBL_IP != 0;
        if csr0 & Mc::INT860 != 0 || vbl {
            MessagePort::RAISE_INTR
        } else {
            MessagePort::LOWER_INTR
        }
    }

    /// Display-blank edge from the timer path. Latches the pending bit and
    /// chases the interrupt line when vblank interrupts are enabled.
    pub fn latch_vblank(&self, port: &MessagePort) {
        if self.csr0.load(Ordering::Relaxed) & Mc::VBL_IE != 0 {
            let new = self.csr0.fetch_or(Mc::VBL_IP, Ordering::Relaxed) | Mc::VBL_IP;
            port.send(Mc::int_message(new));
        }
    }
}
