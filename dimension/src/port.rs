//! One-word atomic mailbox between the host thread and the board core.
//!
//! Senders merge bits with a compare-and-swap retry loop; the core drains
//! with a single swap. The raise/lower interrupt pair is kept mutually
//! exclusive inside the same atomic update, so a drain can never observe
//! both edges at once.

use std::sync::atomic::{AtomicU32, Ordering};

#[derive(Default)]
pub struct MessagePort(AtomicU32);

impl MessagePort {
    pub const KILL: u32 = 1 << 0;
    pub const RESET: u32 = 1 << 1;
    pub const RAISE_INTR: u32 = 1 << 2;
    pub const LOWER_INTR: u32 = 1 << 3;
    pub const DEBUG_BREAK: u32 = 1 << 4;
    pub const DISPLAY_BLANK: u32 = 1 << 5;
    pub const VIDEO_BLANK: u32 = 1 << 6;

    pub fn new() -> Self {
        MessagePort(AtomicU32::new(0))
    }

    /// Fire-and-forget from any thread.
    pub fn send(&self, bits: u32) {
        let mut cur = self.0.load(Ordering::Relaxed);
        loop {
            let mut next = cur | bits;
            if bits & Self::RAISE_INTR != 0 {
                next &= !Self::LOWER_INTR;
            } else if bits & Self::LOWER_INTR != 0 {
                next &= !Self::RAISE_INTR;
            }
            match self
                .0
                .compare_exchange_weak(cur, next, Ordering::AcqRel, Ordering::Acquire)
            {
                Ok(_) => return,
                Err(now) => cur = now,
            }
        }
    }

    /// Atomically takes every pending bit.
    pub fn drain(&self) -> u32 {
        self.0.swap(0, Ordering::AcqRel)
    }

    /// Non-destructive view, for diagnostics.
    pub fn peek(&self) -> u32 {
        self.0.load(Ordering::Acquire)
    }
}
