//! Instruction dispatch tables.
//!
//! The primary table is indexed by the top 13 instruction bits, so each
//! 6-bit opcode owns a 128-entry span. The escape opcodes indirect through
//! their own tables on the low instruction bits. Unpopulated slots all
//! point at the instruction-fault handler.

use common::Bus;
use common::mem::sign_ext;

use crate::exec::{self, Cpu};
use crate::fpu;

pub type ExecFn = fn(&mut Cpu, &dyn Bus, u32);

pub(crate) static PRIMARY: [ExecFn; 8192] = build_primary();
pub(crate) static FP: [ExecFn; 128] = build_fp();
pub(crate) static ESCAPE: [ExecFn; 8] = build_escape();

// fp escape word flags
pub(crate) const FP_P: u32 = 1 << 10;
pub(crate) const FP_D: u32 = 1 << 9;
pub(crate) const FP_S: u32 = 1 << 8;
pub(crate) const FP_R: u32 = 1 << 7;

pub(crate) fn src1(insn: u32) -> u32 {
    (insn >> 11) & 31
}

pub(crate) fn src2(insn: u32) -> u32 {
    (insn >> 21) & 31
}

pub(crate) fn dest(insn: u32) -> u32 {
    (insn >> 16) & 31
}

/// Store and branch-compare offsets keep their high five bits in the dest
/// field slot.
pub(crate) fn split16(insn: u32) -> u32 {
    sign_ext(((insn >> 5) & 0xF800) | (insn & 0x7FF), 16)
}

////////////////////////////////////////////////////////////////////////////////

const fn build_primary() -> [ExecFn; 8192] {
    let mut t: [ExecFn; 8192] = [exec::op_fault as ExecFn; 8192];
    let mut i = 0;
    while i < t.len() {
        t[i] = primary_slot((i >> 7) as u32);
        i += 1;
    }
    t
}

const fn primary_slot(op: u32) -> ExecFn {
    match op {
        0x00 | 0x01 | 0x04 | 0x05 => exec::op_ld,
        0x02 => exec::op_ixfr,
        0x03 | 0x07 => exec::op_st,
        0x08 | 0x09 => exec::op_fld,
        0x0A | 0x0B | 0x0F => exec::op_fst,
        0x0C => exec::op_ld_ctrl,
        0x0D => exec::op_flush,
        0x0E => exec::op_st_ctrl,
        0x10 => exec::op_bri,
        0x11 => exec::op_trap,
        0x12 => fpu::op_fp_escape,
        0x13 => exec::op_core_escape,
        0x14 | 0x15 => exec::op_btne,
        0x16 | 0x17 => exec::op_bte,
        0x18 | 0x19 => exec::op_pfld,
        0x1A => exec::op_br,
        0x1B => exec::op_call,
        0x1C => exec::op_bc,
        0x1D => exec::op_bc_t,
        0x1E => exec::op_bnc,
        0x1F => exec::op_bnc_t,
        0x20 | 0x21 => exec::op_addu,
        0x22 | 0x23 => exec::op_subu,
        0x24 | 0x25 => exec::op_adds,
        0x26 | 0x27 => exec::op_subs,
        0x28 | 0x29 => exec::op_shl,
        0x2A | 0x2B => exec::op_shr,
        0x2C => exec::op_shrd,
        0x2D => exec::op_bla,
        0x2E | 0x2F => exec::op_shra,
        0x30 | 0x31 => exec::op_and,
        0x33 => exec::op_andh,
        0x34 | 0x35 => exec::op_andnot,
        0x37 => exec::op_andnoth,
        0x38 | 0x39 => exec::op_or,
        0x3B => exec::op_orh,
        0x3C | 0x3D => exec::op_xor,
        0x3F => exec::op_xorh,
        _ => exec::op_fault,
    }
}

const fn build_fp() -> [ExecFn; 128] {
    let mut t: [ExecFn; 128] = [fpu::fp_fault_op as ExecFn; 128];
    t[0x20] = fpu::fp_fmul;
    t[0x21] = fpu::fp_fmlow;
    t[0x22] = fpu::fp_frcp;
    t[0x23] = fpu::fp_frsqr;
    t[0x30] = fpu::fp_fadd;
    t[0x31] = fpu::fp_fsub;
    t[0x32] = fpu::fp_fix;
    t[0x33] = fpu::fp_famov;
    t[0x34] = fpu::fp_pfgt;
    t[0x35] = fpu::fp_pfeq;
    t[0x3A] = fpu::fp_ftrunc;
    t[0x40] = fpu::fp_fxfr;
    t[0x49] = fpu::fp_fiadd;
    t[0x4D] = fpu::fp_fisub;
    t
}

const fn build_escape() -> [ExecFn; 8] {
    let mut t: [ExecFn; 8] = [exec::op_fault as ExecFn; 8];
    t[0x1] = exec::esc_lock;
    t[0x2] = exec::esc_calli;
    t[0x4] = exec::esc_intovr;
    t[0x7] = exec::esc_unlock;
    t
}
