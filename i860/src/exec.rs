//! The auxiliary core's execute engine.
//!
//! Instructions are fetched as 64-bit aligned pairs. The low word is always
//! a core instruction; the high word is a floating-point candidate that only
//! runs while dual-instruction mode is active. The DIM state machine advances
//! exactly once per pair boundary, delayed branches run their slot through
//! the `pending_jump` latch, and a trap check follows every executed half.

use common::Bus;
use common::constants::{RESET_VECTOR, TRAP_VECTOR};
use common::mem::sign_ext;

use log::{debug, trace};
use num_traits::FromPrimitive;

use crate::decode::{self, src1, src2, dest};
use crate::disas::DisAsm;
use crate::fpu::{GPipe, Pipe};
use crate::mem::{AccessFns, Mmu, access_table};
use crate::regs::{CrIndex, Dim, Dirbase, Epsr, FRegs, Fsr, IRegs, Psr, Stats};

pub struct Cpu {
    pub(crate) r: IRegs,
    pub(crate) f: FRegs,

    pub(crate) fir: u32,
    pub(crate) psr: Psr,
    pub(crate) dirbase: Dirbase,
    pub(crate) db: u32,
    pub(crate) fsr: Fsr,
    pub(crate) epsr: Epsr,

    pub(crate) pc: u32,
    pub(crate) dim: Dim,
    pub(crate) dim_op: bool,
    pair_tag: u32,
    pending_jump: Option<u32>,
    pub(crate) insn_addr: u32,

    // Fault causes raised by the current half, folded into PSR at trap entry.
    pub(crate) pending: u32,
    in_trap: bool,
    int_pin: bool,
    pub(crate) lock: bool,

    // Live condition code; folded into PSR whenever the handler could see it.
    cc: bool,
    cc_valid: bool,

    pub(crate) access: &'static AccessFns,
    pub(crate) mmu: Mmu,

    pub(crate) apipe: Pipe,
    pub(crate) mpipe: Pipe,
    pub(crate) lpipe: Pipe,
    pub(crate) gpipe: GPipe,

    pub(crate) stats: Stats,
}

impl Cpu {
    pub fn new() -> Self {
        let mut cpu = Cpu {
            r: IRegs::new(),
            f: FRegs::new(),
            fir: 0,
            psr: Psr::default(),
            dirbase: Dirbase::at_reset(),
            db: 0,
            fsr: Fsr::default(),
            epsr: Epsr::new(),
            pc: RESET_VECTOR,
            dim: Dim::Single,
            dim_op: false,
            pair_tag: RESET_VECTOR & !7,
            pending_jump: None,
            insn_addr: RESET_VECTOR,
            pending: 0,
            in_trap: false,
            int_pin: false,
            lock: false,
            cc: false,
            cc_valid: false,
            access: access_table(false),
            mmu: Mmu::new(),
            apipe: Pipe::default(),
            mpipe: Pipe::default(),
            lpipe: Pipe::default(),
            gpipe: GPipe::default(),
            stats: Stats::default(),
        };
        cpu.reset();
        cpu
    }

    /// Power-on state: registers cleared, byte-wide boot fetch mode, pc at
    /// the reset vector. Statistics survive, they are cumulative.
    pub fn reset(&mut self) {
        self.r = IRegs::new();
        self.f = FRegs::new();
        self.fir = 0;
        self.psr = Psr::default();
        self.dirbase = Dirbase::at_reset();
        self.db = 0;
        self.fsr = Fsr::default();
        self.epsr = Epsr::new();
        self.pc = RESET_VECTOR;
        self.dim = Dim::Single;
        self.dim_op = false;
        self.pair_tag = RESET_VECTOR & !7;
        self.pending_jump = None;
        self.pending = 0;
        self.in_trap = false;
        self.int_pin = false;
        self.lock = false;
        self.cc = false;
        self.cc_valid = false;
        self.access = access_table(false);
        self.mmu.invalidate();
        self.apipe = Pipe::default();
        self.mpipe = Pipe::default();
        self.lpipe = Pipe::default();
        self.gpipe = GPipe::default();
    }

    ////////////////////////////////////////////////////////////////////////

    pub fn pc(&self) -> u32 {
        self.pc
    }

    pub fn set_pc(&mut self, pc: u32) {
        self.pc = pc & !3;
        self.pending_jump = None;
    }

    pub fn dim(&self) -> Dim {
        self.dim
    }

    pub fn stats(&self) -> Stats {
        self.stats
    }

    pub fn ireg(&self, i: u32) -> u32 {
        self.r.get(i)
    }

    pub fn set_ireg(&mut self, i: u32, val: u32) {
        self.r.set(i, val);
    }

    pub fn freg_s(&self, i: u32) -> u32 {
        self.f.get_s(i)
    }

    pub fn freg_d(&self, i: u32) -> u64 {
        self.f.get_d(i)
    }

    pub fn fir(&self) -> u32 {
        self.fir
    }

    pub fn psr_raw(&mut self) -> u32 {
        self.sync_cc();
        self.psr.to_raw()
    }

    /// Drives the external interrupt pin. Level-sensitive: the trap fires at
    /// the next half boundary where PSR.IM is set.
    pub fn set_int_pin(&mut self, level: bool) {
        self.int_pin = level;
        self.epsr.set(Epsr::INT, level);
    }

    pub fn int_pin(&self) -> bool {
        self.int_pin
    }

    ////////////////////////////////////////////////////////////////////////

    pub(crate) fn get_cc(&self) -> bool {
        if self.cc_valid { self.cc } else { self.psr.get(Psr::CC) }
    }

    pub(crate) fn set_cc(&mut self, val: bool) {
        self.cc = val;
        self.cc_valid = true;
    }

    fn sync_cc(&mut self) {
        if self.cc_valid {
            let cc = self.cc;
            self.psr.set(Psr::CC, cc);
            self.cc_valid = false;
        }
    }

    ////////////////////////////////////////////////////////////////////////

    /// One execution step: a single instruction outside dual mode, a full
    /// pair inside it.
    pub fn step(&mut self, bus: &dyn Bus) {
        let pair = self.pc & !7;
        if pair != self.pair_tag {
            self.dim = self.dim.advance(self.dim_op);
            self.dim_op = false;
            self.pair_tag = pair;
        }
        // Some(_) means this slot is the delay slot of an armed branch.
        let jump = self.pending_jump.take();

        if self.dim.dual() {
            self.insn_addr = pair;
            match self.fetch_pair_words(bus, pair) {
                Some((lo, hi)) => {
                    self.pc = pair.wrapping_add(8);
                    self.exec(bus, lo);
                    if self.take_trap(jump) {
                        return;
                    }
                    self.insn_addr = pair | 4;
                    self.exec(bus, hi);
                    if self.take_trap(jump) {
                        return;
                    }
                }
                None => {
                    self.take_trap(jump);
                    return;
                }
            }
        } else {
            self.insn_addr = self.pc;
            match self.fetch_word(bus, self.pc) {
                Some(insn) => {
                    self.pc = self.pc.wrapping_add(4);
                    self.exec(bus, insn);
                    if self.take_trap(jump) {
                        return;
                    }
                }
                None => {
                    self.take_trap(jump);
                    return;
                }
            }
        }

        if let Some(target) = jump {
            self.pc = target;
        }
    }

    fn exec(&mut self, bus: &dyn Bus, insn: u32) {
        self.stats.executed += 1;
        debug!("{:08x}: {}", self.insn_addr, DisAsm(insn));

        // Knowingly-no-float: skip the whole fp group without decoding,
        // keeping only its dual-issue request visible.
        if insn >> 26 == 0x12 && self.psr.get(Psr::KNF) {
            self.psr.set(Psr::KNF, false);
            if insn & decode::FP_D != 0 {
                self.dim_op = true;
            }
            return;
        }

        decode::PRIMARY[(insn >> 19) as usize](self, bus, insn);
    }

    /// Fires a pending trap. `jump` carries the branch target when the half
    /// that trapped was a delay slot; the handler resumes there.
    fn take_trap(&mut self, jump: Option<u32>) -> bool {
        let int_due = self.int_pin && self.psr.get(Psr::IM);
        if self.pending == 0 && !int_due {
            return false;
        }

        let mut causes = self.pending;
        self.pending = 0;
        if int_due {
            causes |= Psr::IN;
            self.stats.ints_taken += 1;
        }

        let resume = jump.unwrap_or(self.insn_addr);
        self.fir = resume;
        self.sync_cc();
        self.psr.raise(causes);

        let u = self.psr.get(Psr::U);
        let im = self.psr.get(Psr::IM);
        self.psr.set(Psr::PU, u);
        self.psr.set(Psr::PIM, im);
        self.psr.set(Psr::U, false);
        self.psr.set(Psr::IM, false);

        self.psr.set(Psr::DIM, self.dim.is_full());
        self.psr.set(Psr::DS, self.dim.is_temp());
        self.dim = Dim::Single;
        self.dim_op = false;

        self.in_trap = true;
        self.pending_jump = None;
        self.pc = TRAP_VECTOR;
        self.pair_tag = TRAP_VECTOR & !7;
        debug!("trap: causes {causes:#05x}, fir {resume:08x}");
        true
    }

    ////////////////////////////////////////////////////////////////////////

    fn fetch_word(&mut self, bus: &dyn Bus, va: u32) -> Option<u32> {
        let pa = self.insn_pa(bus, va)?;
        if self.dirbase.cs8() {
            Some(self.cs8_word(bus, pa))
        } else {
            let (lo, hi) = self.mmu.fetch_pair(bus, pa, &mut self.stats);
            Some(if va & 4 != 0 { hi } else { lo })
        }
    }

    fn fetch_pair_words(&mut self, bus: &dyn Bus, pair: u32) -> Option<(u32, u32)> {
        let pa = self.insn_pa(bus, pair)?;
        if self.dirbase.cs8() {
            Some((self.cs8_word(bus, pa), self.cs8_word(bus, pa.wrapping_add(4))))
        } else {
            Some(self.mmu.fetch_pair(bus, pa, &mut self.stats))
        }
    }

    fn insn_pa(&mut self, bus: &dyn Bus, va: u32) -> Option<u32> {
        match self.mmu.translate(bus, self.dirbase, va, false, &mut self.stats) {
            Ok(pa) => Some(pa),
            Err(()) => {
                self.pending |= Psr::IAT;
                None
            }
        }
    }

    // Byte-wide boot fetch: the EEPROM is read a byte per bus cycle and the
    // word assembled low byte first. Bypasses the instruction cache.
    fn cs8_word(&self, bus: &dyn Bus, pa: u32) -> u32 {
        let mut word = 0u32;
        for k in 0..4 {
            word |= (bus.read_cs8(pa.wrapping_add(k)) as u32) << (8 * k);
        }
        word
    }

    /// Translates a data access, raising DAT on misalignment or a missing
    /// mapping. `None` means the access is dropped and the trap will fire.
    pub(crate) fn data_pa(&mut self, bus: &dyn Bus, va: u32, size: u32, wr: bool) -> Option<u32> {
        if va & (size - 1) != 0 {
            trace!("misaligned {size}-byte access at {va:08x}");
            self.pending |= Psr::DAT;
            return None;
        }
        match self.mmu.translate(bus, self.dirbase, va, wr, &mut self.stats) {
            Ok(pa) => Some(pa),
            Err(()) => {
                self.pending |= Psr::DAT;
                None
            }
        }
    }

    ////////////////////////////////////////////////////////////////////////

    pub(crate) fn branch_to(&mut self, target: u32) {
        self.pending_jump = Some(target & !3);
    }

    // Taken-variant conditional branches annul the sequential slot when the
    // branch falls through.
    fn annul_slot(&mut self) {
        let step = if self.dim.dual() { 8 } else { 4 };
        self.pc = self.pc.wrapping_add(step);
    }

    fn ret_addr(&self) -> u32 {
        if self.dim.dual() {
            (self.insn_addr & !7).wrapping_add(16)
        } else {
            self.insn_addr.wrapping_add(8)
        }
    }

    fn rel26(&self, insn: u32) -> u32 {
        self.insn_addr
            .wrapping_add(4)
            .wrapping_add(sign_ext(insn & 0x03FF_FFFF, 26) << 2)
    }

    fn rel16(&self, insn: u32) -> u32 {
        self.insn_addr
            .wrapping_add(4)
            .wrapping_add(decode::split16(insn) << 2)
    }
}

impl Default for Cpu {
    fn default() -> Self {
        Self::new()
    }
}

////////////////////////////////////////////////////////////////////////////////
// Integer load/store and transfers.

// ld.b / ld.s / ld.l, register and immediate offset forms. Narrow loads
// sign-extend.
pub(crate) fn op_ld(cpu: &mut Cpu, bus: &dyn Bus, insn: u32) {
    let op = insn >> 26;
    let size = if op & 4 != 0 {
        if insn & 1 != 0 { 4 } else { 2 }
    } else {
        1
    };
    let off = if op & 1 != 0 {
        sign_ext(insn & 0xFFFF, 16) & !(size - 1)
    } else {
        cpu.r.get(src1(insn))
    };
    let va = off.wrapping_add(cpu.r.get(src2(insn)));
    let Some(pa) = cpu.data_pa(bus, va, size, false) else {
        return;
    };
    let val = match size {
        1 => sign_ext((cpu.access.rd8)(bus, pa), 8),
        2 => sign_ext((cpu.access.rd16)(bus, pa), 16),
        _ => (cpu.access.rd32)(bus, pa),
    };
    cpu.r.set(dest(insn), val);
}

// st.b / st.s / st.l. Stores only exist with an immediate offset, split
// across the dest field and the low bits.
pub(crate) fn op_st(cpu: &mut Cpu, bus: &dyn Bus, insn: u32) {
    let size = if insn >> 26 == 0x07 {
        if insn & 1 != 0 { 4 } else { 2 }
    } else {
        1
    };
    let off = decode::split16(insn) & !(size - 1);
    let va = off.wrapping_add(cpu.r.get(src2(insn)));
    let val = cpu.r.get(src1(insn));
    let Some(pa) = cpu.data_pa(bus, va, size, true) else {
        return;
    };
    match size {
        1 => (cpu.access.wr8)(bus, pa, val),
        2 => (cpu.access.wr16)(bus, pa, val),
        _ => (cpu.access.wr32)(bus, pa, val),
    }
}

pub(crate) fn op_ixfr(cpu: &mut Cpu, _bus: &dyn Bus, insn: u32) {
    let val = cpu.r.get(src1(insn));
    cpu.f.set_s(dest(insn), val);
}

// Operand size of the float load/store group, from the low instruction
// bits. Bit 0 requests base autoincrement.
fn fp_ls_size(insn: u32) -> u32 {
    match (insn >> 1) & 3 {
        0 => 8,
        1 => 4,
        _ => 16,
    }
}

fn fp_ls_addr(cpu: &mut Cpu, insn: u32) -> u32 {
    let off = if insn >> 26 & 1 != 0 {
        sign_ext(insn & 0xFFF8, 16)
    } else {
        cpu.r.get(src1(insn))
    };
    let va = off.wrapping_add(cpu.r.get(src2(insn)));
    if insn & 1 != 0 {
        cpu.r.set(src2(insn), va);
    }
    va
}

// fld.l / fld.d / fld.q.
pub(crate) fn op_fld(cpu: &mut Cpu, bus: &dyn Bus, insn: u32) {
    let size = fp_ls_size(insn);
    let va = fp_ls_addr(cpu, insn);
    let Some(pa) = cpu.data_pa(bus, va, size, false) else {
        return;
    };
    let fd = dest(insn);
    match size {
        4 => {
            let w = (cpu.access.rd32)(bus, pa);
            cpu.f.set_s(fd, w);
        }
        8 => {
            let w = (cpu.access.rd64)(bus, pa);
            cpu.f.set_d(fd, w[0] as u64 | ((w[1] as u64) << 32));
        }
        _ => {
            let w = (cpu.access.rd128)(bus, pa);
            cpu.f.set_q(fd, w);
        }
    }
}

// fst.y, and pst.d which stores the same way (the pixel-merge path is not
// modeled).
pub(crate) fn op_fst(cpu: &mut Cpu, bus: &dyn Bus, insn: u32) {
    let size = if insn >> 26 == 0x0F { 8 } else { fp_ls_size(insn) };
    let va = fp_ls_addr(cpu, insn);
    let Some(pa) = cpu.data_pa(bus, va, size, true) else {
        return;
    };
    let fd = dest(insn);
    match size {
        4 => (cpu.access.wr32)(bus, pa, cpu.f.get_s(fd)),
        8 => {
            let d = cpu.f.get_d(fd);
            (cpu.access.wr64)(bus, pa, [d as u32, (d >> 32) as u32]);
        }
        _ => (cpu.access.wr128)(bus, pa, cpu.f.get_q(fd)),
    }
}

// pfld.y: three-deep load pipeline; the destination receives the value
// loaded three pfld's ago.
pub(crate) fn op_pfld(cpu: &mut Cpu, bus: &dyn Bus, insn: u32) {
    let size = fp_ls_size(insn).min(8);
    let va = fp_ls_addr(cpu, insn);
    let Some(pa) = cpu.data_pa(bus, va, size, false) else {
        return;
    };
    let (bits, dbl) = if size == 8 {
        let w = (cpu.access.rd64)(bus, pa);
        (w[0] as u64 | ((w[1] as u64) << 32), true)
    } else {
        ((cpu.access.rd32)(bus, pa) as u64, false)
    };
    let out = cpu.lpipe.push(bits, dbl);
    let fd = dest(insn);
    if out.dbl {
        cpu.f.set_d(fd, out.bits);
    } else {
        cpu.f.set_s(fd, out.bits as u32);
    }
}

// flush: data cache line writeback. There is no data cache here, but the
// autoincrement side effect is architectural.
pub(crate) fn op_flush(cpu: &mut Cpu, _bus: &dyn Bus, insn: u32) {
    let _ = fp_ls_addr(cpu, insn);
}

////////////////////////////////////////////////////////////////////////////////
// Control registers.

pub(crate) fn op_ld_ctrl(cpu: &mut Cpu, _bus: &dyn Bus, insn: u32) {
    let idx = src2(insn);
    let val = match CrIndex::from_u32(idx) {
        Some(CrIndex::Fir) => cpu.fir,
        Some(CrIndex::Psr) => {
            cpu.sync_cc();
            cpu.psr.to_raw()
        }
        Some(CrIndex::Dirbase) => cpu.dirbase.to_raw(),
        Some(CrIndex::Db) => cpu.db,
        Some(CrIndex::Fsr) => cpu.fsr.to_raw(),
        Some(CrIndex::Epsr) => cpu.epsr.to_raw(),
        None => {
            debug!("ld.c of unknown control register {idx}");
            0
        }
    };
    cpu.r.set(dest(insn), val);
}

pub(crate) fn op_st_ctrl(cpu: &mut Cpu, _bus: &dyn Bus, insn: u32) {
    let idx = src2(insn);
    let val = cpu.r.get(src1(insn));
    match CrIndex::from_u32(idx) {
        Some(CrIndex::Fir) => {
            // Read-only; the fault address comes from the trap machinery.
            debug!("st.c to fir ignored");
        }
        Some(CrIndex::Psr) => {
            cpu.psr = Psr::from_raw(val);
            cpu.cc_valid = false;
        }
        Some(CrIndex::Dirbase) => {
            if cpu.dirbase.write(val) {
                cpu.mmu.invalidate();
            }
        }
        Some(CrIndex::Db) => cpu.db = val,
        Some(CrIndex::Fsr) => cpu.fsr = Fsr::from_raw(val),
        Some(CrIndex::Epsr) => {
            let be = val & Epsr::BE != 0;
            cpu.epsr.write(val);
            cpu.access = access_table(be);
        }
        None => debug!("st.c to unknown control register {idx}"),
    }
}

////////////////////////////////////////////////////////////////////////////////
// Control transfer.

pub(crate) fn op_br(cpu: &mut Cpu, _bus: &dyn Bus, insn: u32) {
    let target = cpu.rel26(insn);
    cpu.branch_to(target);
}

pub(crate) fn op_call(cpu: &mut Cpu, _bus: &dyn Bus, insn: u32) {
    let ret = cpu.ret_addr();
    cpu.r.set(1, ret);
    let target = cpu.rel26(insn);
    cpu.branch_to(target);
}

pub(crate) fn op_bc(cpu: &mut Cpu, _bus: &dyn Bus, insn: u32) {
    if cpu.get_cc() {
        cpu.pc = cpu.rel26(insn);
    }
}

pub(crate) fn op_bc_t(cpu: &mut Cpu, _bus: &dyn Bus, insn: u32) {
    if cpu.get_cc() {
        let target = cpu.rel26(insn);
        cpu.branch_to(target);
    } else {
        cpu.annul_slot();
    }
}

pub(crate) fn op_bnc(cpu: &mut Cpu, _bus: &dyn Bus, insn: u32) {
    if !cpu.get_cc() {
        cpu.pc = cpu.rel26(insn);
    }
}

pub(crate) fn op_bnc_t(cpu: &mut Cpu, _bus: &dyn Bus, insn: u32) {
    if !cpu.get_cc() {
        let target = cpu.rel26(insn);
        cpu.branch_to(target);
    } else {
        cpu.annul_slot();
    }
}

fn bt_src1(cpu: &Cpu, insn: u32) -> u32 {
    if insn >> 26 & 1 != 0 {
        src1(insn) // 5-bit immediate, zero-extended
    } else {
        cpu.r.get(src1(insn))
    }
}

pub(crate) fn op_bte(cpu: &mut Cpu, _bus: &dyn Bus, insn: u32) {
    if bt_src1(cpu, insn) == cpu.r.get(src2(insn)) {
        cpu.pc = cpu.rel16(insn);
    }
}

pub(crate) fn op_btne(cpu: &mut Cpu, _bus: &dyn Bus, insn: u32) {
    if bt_src1(cpu, insn) != cpu.r.get(src2(insn)) {
        cpu.pc = cpu.rel16(insn);
    }
}

// bla: loop branch. The branch decision uses LCC from before this
// instruction; the new LCC is the carry out of src1ni + src2.
pub(crate) fn op_bla(cpu: &mut Cpu, _bus: &dyn Bus, insn: u32) {
    let a = cpu.r.get(src1(insn));
    let b = cpu.r.get(src2(insn));
    let sum = a as u64 + b as u64;
    let taken = cpu.psr.get(Psr::LCC);
    cpu.psr.set(Psr::LCC, sum >> 32 != 0);
    cpu.r.set(src2(insn), sum as u32);
    if taken {
        let target = cpu.rel16(insn);
        cpu.branch_to(target);
    }
}

pub(crate) fn op_bri(cpu: &mut Cpu, _bus: &dyn Bus, insn: u32) {
    let target = cpu.r.get(src1(insn)) & !3;
    if cpu.in_trap {
        // Trap return: dual-mode state resumes from the two bits recorded
        // at entry, privileges from their shadows.
        cpu.dim = if cpu.psr.get(Psr::DIM) { Dim::Full } else { Dim::Single };
        cpu.dim_op = cpu.psr.get(Psr::DS);
        let pu = cpu.psr.get(Psr::PU);
        let pim = cpu.psr.get(Psr::PIM);
        cpu.psr.set(Psr::U, pu);
        cpu.psr.set(Psr::IM, pim);
        cpu.psr.clear(Psr::TRAP_CAUSES);
        cpu.cc_valid = false;
        cpu.in_trap = false;
    }
    cpu.branch_to(target);
}

pub(crate) fn op_trap(cpu: &mut Cpu, _bus: &dyn Bus, _insn: u32) {
    cpu.pending |= Psr::IT;
}

////////////////////////////////////////////////////////////////////////////////
// ALU.

// Sign-extended immediate for the arithmetic and shift group.
fn src1_sval(cpu: &Cpu, insn: u32) -> u32 {
    if insn >> 26 & 1 != 0 {
        sign_ext(insn & 0xFFFF, 16)
    } else {
        cpu.r.get(src1(insn))
    }
}

// Zero-extended immediate for the logical group.
fn src1_uval(cpu: &Cpu, insn: u32) -> u32 {
    if insn >> 26 & 1 != 0 {
        insn & 0xFFFF
    } else {
        cpu.r.get(src1(insn))
    }
}

pub(crate) fn op_addu(cpu: &mut Cpu, _bus: &dyn Bus, insn: u32) {
    let a = src1_sval(cpu, insn);
    let b = cpu.r.get(src2(insn));
    let sum = a as u64 + b as u64;
    let carry = sum >> 32 != 0;
    cpu.set_cc(carry);
    cpu.epsr.set(Epsr::OF, carry);
    cpu.r.set(dest(insn), sum as u32);
}

pub(crate) fn op_subu(cpu: &mut Cpu, _bus: &dyn Bus, insn: u32) {
    let a = src1_sval(cpu, insn);
    let b = cpu.r.get(src2(insn));
    let borrow = a < b;
    cpu.set_cc(!borrow);
    cpu.epsr.set(Epsr::OF, borrow);
    cpu.r.set(dest(insn), a.wrapping_sub(b));
}

pub(crate) fn op_adds(cpu: &mut Cpu, _bus: &dyn Bus, insn: u32) {
    let a = src1_sval(cpu, insn) as i32;
    let b = cpu.r.get(src2(insn)) as i32;
    let exact = a as i64 + b as i64;
    cpu.set_cc(exact < 0);
    cpu.epsr.set(Epsr::OF, exact != exact as i32 as i64);
    cpu.r.set(dest(insn), exact as u32);
}

pub(crate) fn op_subs(cpu: &mut Cpu, _bus: &dyn Bus, insn: u32) {
    let a = src1_sval(cpu, insn) as i32;
    let b = cpu.r.get(src2(insn)) as i32;
    let exact = a as i64 - b as i64;
    cpu.set_cc(exact < 0);
    cpu.epsr.set(Epsr::OF, exact != exact as i32 as i64);
    cpu.r.set(dest(insn), exact as u32);
}

pub(crate) fn op_shl(cpu: &mut Cpu, _bus: &dyn Bus, insn: u32) {
    let count = src1_sval(cpu, insn) & 31;
    let val = cpu.r.get(src2(insn));
    cpu.r.set(dest(insn), val << count);
}

pub(crate) fn op_shr(cpu: &mut Cpu, _bus: &dyn Bus, insn: u32) {
    let count = src1_sval(cpu, insn) & 31;
    cpu.psr.set_sc(count);
    let val = cpu.r.get(src2(insn));
    cpu.r.set(dest(insn), val >> count);
}

pub(crate) fn op_shra(cpu: &mut Cpu, _bus: &dyn Bus, insn: u32) {
    let count = src1_sval(cpu, insn) & 31;
    let val = cpu.r.get(src2(insn)) as i32;
    cpu.r.set(dest(insn), (val >> count) as u32);
}

// shrd: funnel shift of src1ni:src2 right by the count saved by shr.
pub(crate) fn op_shrd(cpu: &mut Cpu, _bus: &dyn Bus, insn: u32) {
    let hi = cpu.r.get(src1(insn)) as u64;
    let lo = cpu.r.get(src2(insn)) as u64;
    let count = cpu.psr.get_sc();
    let val = ((hi << 32) | lo) >> count;
    cpu.r.set(dest(insn), val as u32);
}

fn logic_result(cpu: &mut Cpu, insn: u32, result: u32) {
    cpu.set_cc(result == 0);
    cpu.r.set(dest(insn), result);
}

pub(crate) fn op_and(cpu: &mut Cpu, _bus: &dyn Bus, insn: u32) {
    let result = src1_uval(cpu, insn) & cpu.r.get(src2(insn));
    logic_result(cpu, insn, result);
}

pub(crate) fn op_andh(cpu: &mut Cpu, _bus: &dyn Bus, insn: u32) {
    let result = ((insn & 0xFFFF) << 16) & cpu.r.get(src2(insn));
    logic_result(cpu, insn, result);
}

pub(crate) fn op_andnot(cpu: &mut Cpu, _bus: &dyn Bus, insn: u32) {
    let result = !src1_uval(cpu, insn) & cpu.r.get(src2(insn));
    logic_result(cpu, insn, result);
}

pub(crate) fn op_andnoth(cpu: &mut Cpu, _bus: &dyn Bus, insn: u32) {
    let result = !((insn & 0xFFFF) << 16) & cpu.r.get(src2(insn));
    logic_result(cpu, insn, result);
}

pub(crate) fn op_or(cpu: &mut Cpu, _bus: &dyn Bus, insn: u32) {
    let result = src1_uval(cpu, insn) | cpu.r.get(src2(insn));
    logic_result(cpu, insn, result);
}

pub(crate) fn op_orh(cpu: &mut Cpu, _bus: &dyn Bus, insn: u32) {
    let result = ((insn & 0xFFFF) << 16) | cpu.r.get(src2(insn));
    logic_result(cpu, insn, result);
}

pub(crate) fn op_xor(cpu: &mut Cpu, _bus: &dyn Bus, insn: u32) {
    let result = src1_uval(cpu, insn) ^ cpu.r.get(src2(insn));
    logic_result(cpu, insn, result);
}

pub(crate) fn op_xorh(cpu: &mut Cpu, _bus: &dyn Bus, insn: u32) {
    let result = ((insn & 0xFFFF) << 16) ^ cpu.r.get(src2(insn));
    logic_result(cpu, insn, result);
}

////////////////////////////////////////////////////////////////////////////////
// Escapes.

pub(crate) fn op_core_escape(cpu: &mut Cpu, bus: &dyn Bus, insn: u32) {
    decode::ESCAPE[(insn & 7) as usize](cpu, bus, insn);
}

pub(crate) fn esc_lock(cpu: &mut Cpu, _bus: &dyn Bus, _insn: u32) {
    trace!("bus lock");
    cpu.lock = true;
}

pub(crate) fn esc_unlock(cpu: &mut Cpu, _bus: &dyn Bus, _insn: u32) {
    trace!("bus unlock");
    cpu.lock = false;
}

pub(crate) fn esc_calli(cpu: &mut Cpu, _bus: &dyn Bus, insn: u32) {
    let ret = cpu.ret_addr();
    let target = cpu.r.get(src1(insn)) & !3;
    cpu.r.set(1, ret);
    cpu.branch_to(target);
}

pub(crate) fn esc_intovr(cpu: &mut Cpu, _bus: &dyn Bus, _insn: u32) {
    if cpu.epsr.get(Epsr::OF) {
        cpu.pending |= Psr::IT;
    }
}

/// Unpopulated decode slots raise the instruction fault.
pub(crate) fn op_fault(cpu: &mut Cpu, _bus: &dyn Bus, insn: u32) {
    debug!("unrecognized instruction {insn:08x} at {:08x}", cpu.insn_addr);
    cpu.pending |= Psr::IT;
}
