//! Bt463-style color lookup device behind the lookup bank.
//!
//! The device sees only byte accesses; the bank layer decomposes wider
//! traffic before it gets here. Bus address bits 3:2 select one of four
//! registers: address low, address high, indexed control, palette data.
//! Palette data cycles a red/green/blue phase and autoincrements the
//! cursor after blue, so firmware streams whole color maps with repeated
//! stores to one register.

use std::sync::Mutex;

/// Overlay, cursor and window-type entries included.
const PALETTE_LEN: usize = 528;

struct State {
    addr: u16,
    phase: u8,
    ctl: [u8; 16],
    palette: [[u8; 3]; PALETTE_LEN],
}

impl State {
    fn advance(&mut self) {
        self.phase += 1;
        if self.phase == 3 {
            self.phase = 0;
            self.addr = self.addr.wrapping_add(1);
        }
    }
}

pub struct Ramdac {
    state: Mutex<State>,
}

impl Ramdac {
    const REG_ADDR_LO: u32 = 0;
    const REG_ADDR_HI: u32 = 1;
    const REG_CTL: u32 = 2;

    pub fn new() -> Ramdac {
        Ramdac {
            state: Mutex::new(State {
                addr: 0,
                phase: 0,
                ctl: [0; 16],
                palette: [[0; 3]; PALETTE_LEN],
            }),
        }
    }

    pub fn read(&self, addr: u32) -> u8 {
        let mut s = self.state.lock().unwrap();
        match (addr >> 2) & 3 {
            Ramdac::REG_ADDR_LO => s.addr as u8,
            Ramdac::REG_ADDR_HI => (s.addr >> 8) as u8,
            Ramdac::REG_CTL => {
                let val = s.ctl[(s.addr & 0xF) as usize];
                s.addr = s.addr.wrapping_add(1);
                val
            }
            _ => {
                let val = s.palette[s.addr as usize % PALETTE_LEN][s.phase as usize];
                s.advance();
                val
            }
        }
    }

    pub fn write(&self, addr: u32, val: u8) {
        let mut s = self.state.lock().unwrap();
        match (addr >> 2) & 3 {
            Ramdac::REG_ADDR_LO => {
                s.addr = (s.addr & 0xFF00) | val as u16;
                s.phase = 0;
            }
            Ramdac::REG_ADDR_HI => {
                s.addr = (s.addr & 0x00FF) | ((val as u16) << 8);
                s.phase = 0;
            }
            Ramdac::REG_CTL => {
                let idx = (s.addr & 0xF) as usize;
                s.ctl[idx] = val;
                s.addr = s.addr.wrapping_add(1);
            }
            _ => {
                let idx = s.addr as usize % PALETTE_LEN;
                let phase = s.phase as usize;
                s.palette[idx][phase] = val;
                s.advance();
            }
        }
    }

    /// Snapshot of one palette entry, for presentation and tests.
    pub fn palette_rgb(&self, entry: usize) -> (u8, u8, u8) {
        let s = self.state.lock().unwrap();
        let [r, g, b] = s.palette[entry % PALETTE_LEN];
        (r, g, b)
    }
}

impl Default for Ramdac {
    fn default() -> Ramdac {
        Ramdac::new()
    }
}
