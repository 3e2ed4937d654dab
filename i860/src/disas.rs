//! Text form of instruction words, for the execution trace and the
//! debugger's `x` command. Branch targets print relative to the
//! instruction's own address.

use std::fmt;

use common::mem::sign_ext;

use crate::decode::{dest, split16, src1, src2, FP_D, FP_P, FP_R, FP_S};

/// Lazy wrapper so trace statements only format when the level is enabled.
pub struct DisAsm(pub u32);

impl fmt::Display for DisAsm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&disasm(self.0))
    }
}

fn soff(val: u32) -> String {
    let v = val as i32;
    if v < 0 {
        format!("-{:#x}", -(v as i64))
    } else {
        format!("{v:#x}")
    }
}

fn rel26(insn: u32) -> String {
    let off = (sign_ext(insn & 0x03FF_FFFF, 26) << 2).wrapping_add(4);
    format!(".+{}", soff(off))
}

fn rel16(insn: u32) -> String {
    let off = (split16(insn) << 2).wrapping_add(4);
    format!(".+{}", soff(off))
}

// Integer load/store operand: "r3(r4)" or "16(r4)".
fn ea(insn: u32, imm: bool, clear: u32) -> String {
    if imm {
        format!("{}(r{})", soff(sign_ext(insn & 0xFFFF, 16) & !clear), src2(insn))
    } else {
        format!("r{}(r{})", src1(insn), src2(insn))
    }
}

fn fp_ea(insn: u32) -> String {
    let ai = if insn & 1 != 0 { "++" } else { "" };
    if insn >> 26 & 1 != 0 {
        format!("{}(r{}){}", soff(sign_ext(insn & 0xFFF8, 16)), src2(insn), ai)
    } else {
        format!("r{}(r{}){}", src1(insn), src2(insn), ai)
    }
}

fn fp_ls_suffix(insn: u32) -> &'static str {
    match (insn >> 1) & 3 {
        0 => "d",
        1 => "l",
        _ => "q",
    }
}

fn alu(name: &str, insn: u32) -> String {
    if insn >> 26 & 1 != 0 {
        format!("{} {},r{},r{}", name, soff(sign_ext(insn & 0xFFFF, 16)), src2(insn), dest(insn))
    } else {
        format!("{} r{},r{},r{}", name, src1(insn), src2(insn), dest(insn))
    }
}

fn logic(name: &str, insn: u32) -> String {
    if insn >> 26 & 1 != 0 {
        format!("{} {:#x},r{},r{}", name, insn & 0xFFFF, src2(insn), dest(insn))
    } else {
        format!("{} r{},r{},r{}", name, src1(insn), src2(insn), dest(insn))
    }
}

const CR_NAMES: [&str; 6] = ["fir", "psr", "dirbase", "db", "fsr", "epsr"];

fn cr_name(idx: u32) -> String {
    match CR_NAMES.get(idx as usize) {
        Some(name) => (*name).into(),
        None => format!("cr{idx}"),
    }
}

fn fp_op(insn: u32) -> String {
    let name = match insn & 0x7F {
        0x20 => "fmul",
        0x21 => "fmlow",
        0x22 => "frcp",
        0x23 => "frsqr",
        0x30 => "fadd",
        0x31 => "fsub",
        0x32 => "fix",
        0x33 => "famov",
        0x34 => "pfgt",
        0x35 => "pfeq",
        0x3A => "ftrunc",
        0x40 => "fxfr",
        0x49 => "fiadd",
        0x4D => "fisub",
        _ => return format!(".long {insn:#010x}"),
    };
    let dual = if insn & FP_D != 0 { "d." } else { "" };
    let pipe = if insn & FP_P != 0 && !name.starts_with('p') { "p" } else { "" };
    let s = if insn & FP_S != 0 { 'd' } else { 's' };
    let r = if insn & FP_R != 0 { 'd' } else { 's' };
    if insn & 0x7F == 0x40 {
        // integer destination
        format!("{dual}fxfr f{},r{}", src1(insn), dest(insn))
    } else {
        format!(
            "{dual}{pipe}{name}.{s}{r} f{},f{},f{}",
            src1(insn),
            src2(insn),
            dest(insn)
        )
    }
}

pub fn disasm(insn: u32) -> String {
    let imm = insn >> 26 & 1 != 0;
    match insn >> 26 {
        0x00 | 0x01 => format!("ld.b {},r{}", ea(insn, imm, 0), dest(insn)),
        0x02 => format!("ixfr r{},f{}", src1(insn), dest(insn)),
        0x03 => format!("st.b r{},{}(r{})", src1(insn), soff(split16(insn)), src2(insn)),
        0x04 | 0x05 => {
            let sz = if insn & 1 != 0 { ("l", 3u32) } else { ("s", 1) };
            format!("ld.{} {},r{}", sz.0, ea(insn, imm, sz.1), dest(insn))
        }
        0x07 => {
            let (sz, clear) = if insn & 1 != 0 { ("l", 3u32) } else { ("s", 1) };
            format!(
                "st.{} r{},{}(r{})",
                sz,
                src1(insn),
                soff(split16(insn) & !clear),
                src2(insn)
            )
        }
        0x08 | 0x09 => format!("fld.{} {},f{}", fp_ls_suffix(insn), fp_ea(insn), dest(insn)),
        0x0A | 0x0B => format!("fst.{} f{},{}", fp_ls_suffix(insn), dest(insn), fp_ea(insn)),
        0x0C => format!("ld.c {},r{}", cr_name(src2(insn)), dest(insn)),
        0x0D => format!("flush {}", fp_ea(insn)),
        0x0E => format!("st.c r{},{}", src1(insn), cr_name(src2(insn))),
        0x0F => format!("pst.d f{},{}", dest(insn), fp_ea(insn)),
        0x10 => format!("bri r{}", src1(insn)),
        0x11 => "trap".into(),
        0x12 => fp_op(insn),
        0x13 => match insn & 7 {
            0x1 => "lock".into(),
            0x2 => format!("calli r{}", src1(insn)),
            0x4 => "intovr".into(),
            0x7 => "unlock".into(),
            _ => format!(".long {insn:#010x}"),
        },
        0x14 | 0x15 => {
            let s1 = if imm { format!("{}", src1(insn)) } else { format!("r{}", src1(insn)) };
            format!("btne {},r{},{}", s1, src2(insn), rel16(insn))
        }
        0x16 | 0x17 => {
            let s1 = if imm { format!("{}", src1(insn)) } else { format!("r{}", src1(insn)) };
            format!("bte {},r{},{}", s1, src2(insn), rel16(insn))
        }
        0x18 | 0x19 => format!("pfld.{} {},f{}", fp_ls_suffix(insn), fp_ea(insn), dest(insn)),
        0x1A => format!("br {}", rel26(insn)),
        0x1B => format!("call {}", rel26(insn)),
        0x1C => format!("bc {}", rel26(insn)),
        0x1D => format!("bc.t {}", rel26(insn)),
        0x1E => format!("bnc {}", rel26(insn)),
        0x1F => format!("bnc.t {}", rel26(insn)),
        0x20 | 0x21 => alu("addu", insn),
        0x22 | 0x23 => alu("subu", insn),
        0x24 | 0x25 => alu("adds", insn),
        0x26 | 0x27 => alu("subs", insn),
        0x28 | 0x29 => alu("shl", insn),
        0x2A | 0x2B => alu("shr", insn),
        0x2C => alu("shrd", insn),
        0x2D => format!("bla r{},r{},{}", src1(insn), src2(insn), rel16(insn)),
        0x2E | 0x2F => alu("shra", insn),
        0x30 | 0x31 => logic("and", insn),
        0x33 => logic("andh", insn),
        0x34 | 0x35 => logic("andnot", insn),
        0x37 => logic("andnoth", insn),
        0x38 | 0x39 => logic("or", insn),
        0x3B => logic("orh", insn),
        0x3C | 0x3D => logic("xor", insn),
        0x3F => logic("xorh", insn),
        _ => format!(".long {insn:#010x}"),
    }
}
