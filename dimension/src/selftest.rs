//! Startup self-tests.
//!
//! The arena accessors and the core's endian-folded access tables both
//! assume the host stores integers little-endian, and the framebuffer
//! consumer assumes the exact VRAM byte-lane table. A machine where
//! either assumption is off would corrupt multi-byte data silently, so
//! both checks run at board construction and failure is fatal.

use log::error;
use thiserror::Error;

use common::Bus;
use common::constants::VRAM_BASE;

use crate::banks::NdMem;

/// Exit code for a failed startup self-test.
pub const SELFTEST_EXIT: i32 = 70;

/// Set to `big-endian` to rehearse the fatal path without patching the
/// binary.
const SIMULATE_VAR: &str = "ND_SELFTEST_SIMULATE";

#[derive(Debug, Error)]
pub enum SelfTestError {
    #[error("host byte order is {found}, the access tables assume little-endian")]
    HostOrder { found: &'static str },
    #[error("vram self-test: {access} at {addr:#010x} read {got:#x}, want {want:#x}")]
    VramMismatch {
        access: &'static str,
        addr: u32,
        got: u32,
        want: u32,
    },
}

pub fn verify_host_order() -> Result<(), SelfTestError> {
    let simulated = std::env::var(SIMULATE_VAR);
    let big = matches!(simulated.as_deref(), Ok("big-endian"));
    if big || 0x0102_0304u32.to_ne_bytes() != [0x04, 0x03, 0x02, 0x01] {
        return Err(SelfTestError::HostOrder {
            found: "big-endian",
        });
    }
    Ok(())
}

fn expect(access: &'static str, addr: u32, got: u32, want: u32) -> Result<(), SelfTestError> {
    if got != want {
        return Err(SelfTestError::VramMismatch {
            access,
            addr,
            got,
            want,
        });
    }
    Ok(())
}

/// Exercises the VRAM byte-lane table end to end through the real banks,
/// every width, then zeroes the probe area again.
pub fn vram_check(mem: &NdMem) -> Result<(), SelfTestError> {
    mem.write_u32(VRAM_BASE, 0x1234_5678);
    for (k, want) in [0x12u32, 0x34, 0x56, 0x78].into_iter().enumerate() {
        let addr = VRAM_BASE + k as u32;
        expect("byte read", addr, mem.read_u8(addr) as u32, want)?;
    }

    mem.write_u16(VRAM_BASE + 8, 0x7654);
    mem.write_u16(VRAM_BASE + 10, 0x3210);
    expect(
        "word read",
        VRAM_BASE + 8,
        mem.read_u32(VRAM_BASE + 8),
        0x7654_3210,
    )?;

    for a in 0..4 {
        let addr = VRAM_BASE + 16 + a;
        mem.write_u8(addr, 0xA0 | a as u8);
        expect("byte round trip", addr, mem.read_u8(addr) as u32, 0xA0 | a)?;
    }
    for a in [24u32, 26] {
        mem.write_u16(VRAM_BASE + a, 0x5500 | a as u16);
        expect(
            "halfword round trip",
            VRAM_BASE + a,
            mem.read_u16(VRAM_BASE + a) as u32,
            0x5500 | a,
        )?;
    }

    for off in (0..32).step_by(4) {
        mem.write_u32(VRAM_BASE + off, 0);
    }
    Ok(())
}

/// Runs every startup check; a failure ends the process before the core
/// has executed a single instruction.
pub(crate) fn enforce(mem: &NdMem) {
    if let Err(err) = verify_host_order().and_then(|()| vram_check(mem)) {
        error!("startup self-test failed: {err}");
        std::process::exit(SELFTEST_EXIT);
    }
}
