//! Floating-point escape group and the result pipelines.
//!
//! Scalar forms write the destination immediately. Pipelined forms push the
//! new result into the unit's pipe and the destination receives whatever
//! falls out of the far end, sized by the flag captured when that value
//! entered. The pipes power up zeroed, so the first results out are 0.0.

use common::Bus;
use log::debug;

use crate::decode::{self, dest, src1, src2, FP_P, FP_R, FP_S};
use crate::exec::Cpu;
use crate::regs::{Fsr, Psr};

#[derive(Clone, Copy, Default)]
pub(crate) struct Stage {
    pub(crate) bits: u64,
    pub(crate) dbl: bool,
}

/// Three-deep result pipe: adder, multiplier, and the pfld path.
#[derive(Default)]
pub(crate) struct Pipe {
    q: [Stage; 3],
}

impl Pipe {
    pub(crate) fn push(&mut self, bits: u64, dbl: bool) -> Stage {
        let out = self.q[0];
        self.q[0] = self.q[1];
        self.q[1] = self.q[2];
        self.q[2] = Stage { bits, dbl };
        out
    }
}

/// The graphics unit pipe is a single stage.
#[derive(Default)]
pub(crate) struct GPipe {
    q: Stage,
}

impl GPipe {
    pub(crate) fn push(&mut self, bits: u64, dbl: bool) -> Stage {
        std::mem::replace(&mut self.q, Stage { bits, dbl })
    }
}

#[derive(Clone, Copy)]
enum Unit {
    Add,
    Mul,
    Gr,
}

////////////////////////////////////////////////////////////////////////////////

pub(crate) fn op_fp_escape(cpu: &mut Cpu, bus: &dyn Bus, insn: u32) {
    // The dual-issue request applies whether or not the sub-op is valid.
    if insn & decode::FP_D != 0 {
        cpu.dim_op = true;
    }
    decode::FP[(insn & 0x7F) as usize](cpu, bus, insn);
}

/// Source exception: always recorded in FSR, trapping only when enabled.
fn fp_fault(cpu: &mut Cpu) {
    cpu.fsr.set(Fsr::SE, true);
    if cpu.fsr.get(Fsr::FTE) {
        cpu.pending |= Psr::FT;
    }
}

fn src_val(cpu: &Cpu, insn: u32, reg: u32) -> f64 {
    if insn & FP_S != 0 {
        f64::from_bits(cpu.f.get_d(reg))
    } else {
        f32::from_bits(cpu.f.get_s(reg)) as f64
    }
}

fn src_pair(cpu: &Cpu, insn: u32) -> (f64, f64) {
    (src_val(cpu, insn, src1(insn)), src_val(cpu, insn, src2(insn)))
}

fn write_freg(cpu: &mut Cpu, fd: u32, bits: u64, dbl: bool) {
    if dbl {
        cpu.f.set_d(fd, bits);
    } else {
        cpu.f.set_s(fd, bits as u32);
    }
}

fn fp_result(cpu: &mut Cpu, unit: Unit, insn: u32, bits: u64, dbl: bool) {
    let fd = dest(insn);
    if insn & FP_P != 0 {
        let out = match unit {
            Unit::Add => cpu.apipe.push(bits, dbl),
            Unit::Mul => cpu.mpipe.push(bits, dbl),
            Unit::Gr => cpu.gpipe.push(bits, dbl),
        };
        write_freg(cpu, fd, out.bits, out.dbl);
    } else {
        write_freg(cpu, fd, bits, dbl);
    }
}

// Rounds to the result precision before the value is stored or piped.
fn fp_result_f(cpu: &mut Cpu, unit: Unit, insn: u32, val: f64) {
    let dbl = insn & FP_R != 0;
    let bits = if dbl {
        val.to_bits()
    } else {
        (val as f32).to_bits() as u64
    };
    fp_result(cpu, unit, insn, bits, dbl);
}

////////////////////////////////////////////////////////////////////////////////

pub(crate) fn fp_fmul(cpu: &mut Cpu, _bus: &dyn Bus, insn: u32) {
    let (a, b) = src_pair(cpu, insn);
    if a.is_nan() || b.is_nan() {
        fp_fault(cpu);
    }
    fp_result_f(cpu, Unit::Mul, insn, a * b);
}

// Low-order multiply: 63-bit wrapping product of the raw operands, sign
// bit carried through as the xor of the source signs.
pub(crate) fn fp_fmlow(cpu: &mut Cpu, _bus: &dyn Bus, insn: u32) {
    const MAG: u64 = !(1 << 63);
    let a = cpu.f.get_d(src1(insn));
    let b = cpu.f.get_d(src2(insn));
    let bits = ((a & MAG).wrapping_mul(b & MAG) & MAG) | ((a ^ b) & !MAG);
    fp_result(cpu, Unit::Mul, insn, bits, true);
}

pub(crate) fn fp_frcp(cpu: &mut Cpu, _bus: &dyn Bus, insn: u32) {
    let x = src_val(cpu, insn, src2(insn));
    if x == 0.0 || x.is_nan() {
        fp_fault(cpu);
    }
    fp_result_f(cpu, Unit::Mul, insn, 1.0 / x);
}

pub(crate) fn fp_frsqr(cpu: &mut Cpu, _bus: &dyn Bus, insn: u32) {
    let x = src_val(cpu, insn, src2(insn));
    if x <= 0.0 || x.is_nan() {
        fp_fault(cpu);
    }
    fp_result_f(cpu, Unit::Mul, insn, 1.0 / x.sqrt());
}

pub(crate) fn fp_fadd(cpu: &mut Cpu, _bus: &dyn Bus, insn: u32) {
    let (a, b) = src_pair(cpu, insn);
    if a.is_nan() || b.is_nan() {
        fp_fault(cpu);
    }
    fp_result_f(cpu, Unit::Add, insn, a + b);
}

pub(crate) fn fp_fsub(cpu: &mut Cpu, _bus: &dyn Bus, insn: u32) {
    let (a, b) = src_pair(cpu, insn);
    if a.is_nan() || b.is_nan() {
        fp_fault(cpu);
    }
    fp_result_f(cpu, Unit::Add, insn, a - b);
}

// fix / ftrunc: the destination pair holds the converted value as a 64-bit
// signed integer. Conversion saturates at the type bounds.
fn fp_to_int(cpu: &mut Cpu, insn: u32, round: bool) {
    let x = src_val(cpu, insn, src1(insn));
    if x.is_nan() {
        fp_fault(cpu);
    }
    let val = if round { x.round_ties_even() } else { x.trunc() };
    fp_result(cpu, Unit::Add, insn, val as i64 as u64, true);
}

pub(crate) fn fp_fix(cpu: &mut Cpu, _bus: &dyn Bus, insn: u32) {
    fp_to_int(cpu, insn, true);
}

pub(crate) fn fp_ftrunc(cpu: &mut Cpu, _bus: &dyn Bus, insn: u32) {
    fp_to_int(cpu, insn, false);
}

// famov: precision-converting register move.
pub(crate) fn fp_famov(cpu: &mut Cpu, _bus: &dyn Bus, insn: u32) {
    let x = src_val(cpu, insn, src1(insn));
    fp_result_f(cpu, Unit::Add, insn, x);
}

// pfgt / pfeq: CC updates immediately even though the result slot drains
// through the adder pipe. Unordered compares are simply false.
pub(crate) fn fp_pfgt(cpu: &mut Cpu, _bus: &dyn Bus, insn: u32) {
    let (a, b) = src_pair(cpu, insn);
    cpu.set_cc(a > b);
    fp_result(cpu, Unit::Add, insn, 0, insn & FP_R != 0);
}

pub(crate) fn fp_pfeq(cpu: &mut Cpu, _bus: &dyn Bus, insn: u32) {
    let (a, b) = src_pair(cpu, insn);
    cpu.set_cc(a == b);
    fp_result(cpu, Unit::Add, insn, 0, insn & FP_R != 0);
}

// fxfr: float register bits to an integer register.
pub(crate) fn fp_fxfr(cpu: &mut Cpu, _bus: &dyn Bus, insn: u32) {
    let bits = cpu.f.get_s(src1(insn));
    cpu.r.set(dest(insn), bits);
}

// Graphics-unit integer adds on the raw register bits, 32 or 64 wide.
fn gr_int(cpu: &mut Cpu, insn: u32, sub: bool) {
    let (bits, dbl) = if insn & FP_S != 0 {
        let a = cpu.f.get_d(src1(insn));
        let b = cpu.f.get_d(src2(insn));
        let v = if sub { a.wrapping_sub(b) } else { a.wrapping_add(b) };
        (v, true)
    } else {
        let a = cpu.f.get_s(src1(insn));
        let b = cpu.f.get_s(src2(insn));
        let v = if sub { a.wrapping_sub(b) } else { a.wrapping_add(b) };
        (v as u64, false)
    };
    fp_result(cpu, Unit::Gr, insn, bits, dbl);
}

pub(crate) fn fp_fiadd(cpu: &mut Cpu, _bus: &dyn Bus, insn: u32) {
    gr_int(cpu, insn, false);
}

pub(crate) fn fp_fisub(cpu: &mut Cpu, _bus: &dyn Bus, insn: u32) {
    gr_int(cpu, insn, true);
}

/// Unimplemented fp sub-ops, including the dual-op accumulate family.
pub(crate) fn fp_fault_op(cpu: &mut Cpu, _bus: &dyn Bus, insn: u32) {
    debug!(
        "unrecognized fp op {:#04x} at {:08x}",
        insn & 0x7F,
        cpu.insn_addr
    );
    cpu.pending |= Psr::IT;
}
