//! Periodic blanking timers, polled from the host harness.
//!
//! The display timer paces the auxiliary core: every firing deposits the
//! cycle allowance for one half display frame at the 33 MHz reference
//! clock, which is the only way the core ever receives budget. The video
//! timer just toggles NTSC-rate blanking. Both notify every installed
//! board through its message port; cores pick the change up at the next
//! mailbox drain.

use std::time::{Duration, Instant};

use common::constants::{DISPLAY_TOGGLE_HZ, ND_CLOCK_HZ, VIDEO_TOGGLE_HZ};

use crate::machine::Dimension;
use crate::port::MessagePort;

const NANOS_PER_SEC: u64 = 1_000_000_000;

/// Cycle allowance per display firing: one half display frame of the
/// core's reference clock.
pub const DISPLAY_GRANT: i64 = (ND_CLOCK_HZ / DISPLAY_TOGGLE_HZ) as i64;

/// A stalled or starved core never accumulates more than this many
/// half-frames of budget.
pub(crate) const GRANT_CLAMP: i64 = 4;

pub(crate) const BUDGET_CAP: i64 = GRANT_CLAMP * DISPLAY_GRANT;

struct Periodic {
    period: Duration,
    next: Instant,
}

impl Periodic {
    fn new(toggle_hz: u64, now: Instant) -> Periodic {
        let period = Duration::from_nanos(NANOS_PER_SEC / toggle_hz);
        Periodic {
            period,
            next: now + period,
        }
    }

    /// Number of firings due. A host stall beyond a second resyncs the
    /// deadline instead of replaying every missed period.
    fn due(&mut self, now: Instant) -> u32 {
        if now.saturating_duration_since(self.next) > Duration::from_secs(1) {
            self.next = now + self.period;
            return 1;
        }
        let mut fired = 0;
        while self.next <= now {
            fired += 1;
            self.next += self.period;
        }
        fired
    }
}

pub struct BlankTimers {
    display: Periodic,
    video: Periodic,
    display_blank: bool,
    video_blank: bool,
}

impl BlankTimers {
    pub fn new() -> BlankTimers {
        BlankTimers::starting_at(Instant::now())
    }

    fn starting_at(now: Instant) -> BlankTimers {
        BlankTimers {
            display: Periodic::new(DISPLAY_TOGGLE_HZ, now),
            video: Periodic::new(VIDEO_TOGGLE_HZ, now),
            display_blank: false,
            video_blank: false,
        }
    }

    /// Runs every firing that has come due and returns the next deadline,
    /// so the caller knows how long it may sleep.
    pub fn poll(&mut self, boards: &[&Dimension]) -> Instant {
        self.poll_at(Instant::now(), boards)
    }

    fn poll_at(&mut self, now: Instant, boards: &[&Dimension]) -> Instant {
        let fired = self.display.due(now);
        for _ in 0..fired {
            self.display_blank = !self.display_blank;
            for board in boards {
                board.send(MessagePort::DISPLAY_BLANK);
            }
        }
        if fired > 0 {
            let grant = (fired as i64).min(GRANT_CLAMP) * DISPLAY_GRANT;
            for board in boards {
                board.grant_cycles(grant);
            }
        }

        let fired = self.video.due(now);
        for _ in 0..fired {
            self.video_blank = !self.video_blank;
            for board in boards {
                board.send(MessagePort::VIDEO_BLANK);
            }
        }

        self.display.next.min(self.video.next)
    }

    pub fn display_blank(&self) -> bool {
        self.display_blank
    }

    pub fn video_blank(&self) -> bool {
        self.video_blank
    }
}

impl Default for BlankTimers {
    fn default() -> BlankTimers {
        BlankTimers::new()
    }
}
