//! Line-oriented monitor for a paused core. Input and output go through the
//! `Console` trait so the monitor can be scripted from tests; the CLI hands
//! it stdin.

use std::io::{self, BufRead, Write};

use common::Bus;

use crate::disas::disasm;
use crate::exec::Cpu;

/// What the board loop should do after the monitor returns.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    Resume,
    Quit,
}

pub trait Console {
    /// None means end of input; the monitor quits.
    fn read_line(&mut self) -> Option<String>;
    fn write_line(&mut self, line: &str);
}

pub struct StdioConsole;

impl Console for StdioConsole {
    fn read_line(&mut self) -> Option<String> {
        print!("nd> ");
        io::stdout().flush().ok()?;
        let mut buf = String::new();
        match io::stdin().lock().read_line(&mut buf) {
            Ok(0) | Err(_) => None,
            Ok(_) => Some(buf),
        }
    }

    fn write_line(&mut self, line: &str) {
        println!("{line}");
    }
}

const HELP: &str = "r | f | s [n] | x ADDR [n] | d ADDR [n] | pc ADDR | c | q";

fn parse_num(tok: &str) -> Option<u32> {
    let tok = tok.strip_prefix("0x").unwrap_or(tok);
    u32::from_str_radix(tok, 16).ok()
}

fn show_iregs(cpu: &mut Cpu, con: &mut dyn Console) {
    for row in 0..4 {
        let mut line = String::new();
        for col in 0..8 {
            let i = row * 8 + col;
            line.push_str(&format!("r{i:<2} {:08x}  ", cpu.ireg(i)));
        }
        con.write_line(line.trim_end());
    }
    con.write_line(&format!(
        "pc {:08x}  psr {:08x}  fir {:08x}",
        cpu.pc(),
        cpu.psr_raw(),
        cpu.fir()
    ));
}

fn show_fregs(cpu: &Cpu, con: &mut dyn Console) {
    for row in 0..4 {
        let mut line = String::new();
        for col in 0..8 {
            let i = row * 8 + col;
            line.push_str(&format!("f{i:<2} {:08x}  ", cpu.freg_s(i)));
        }
        con.write_line(line.trim_end());
    }
}

fn examine(bus: &dyn Bus, con: &mut dyn Console, addr: u32, count: u32) {
    for k in 0..count {
        let a = addr.wrapping_add(k * 4) & !3;
        let word = bus.read_u32(a);
        con.write_line(&format!("{a:08x}: {word:08x}  {}", disasm(word)));
    }
}

fn dump(bus: &dyn Bus, con: &mut dyn Console, addr: u32, count: u32) {
    let mut k = 0;
    while k < count {
        let a = addr.wrapping_add(k * 4) & !3;
        let mut line = format!("{a:08x}:");
        for j in 0..u32::min(4, count - k) {
            line.push_str(&format!(" {:08x}", bus.read_u32(a.wrapping_add(j * 4))));
        }
        con.write_line(&line);
        k += 4;
    }
}

/// Runs the monitor until the user resumes or quits.
pub fn debug_repl(cpu: &mut Cpu, bus: &dyn Bus, con: &mut dyn Console) -> Verdict {
    con.write_line(&format!("stopped at {:08x}", cpu.pc()));
    loop {
        let Some(line) = con.read_line() else {
            return Verdict::Quit;
        };
        let mut toks = line.split_whitespace();
        let cmd = toks.next().unwrap_or("");
        let arg1 = toks.next().and_then(parse_num);
        let arg2 = toks.next().and_then(parse_num);
        match cmd {
            "" => {}
            "r" => show_iregs(cpu, con),
            "f" => show_fregs(cpu, con),
            "s" => {
                let n = arg1.unwrap_or(1);
                for _ in 0..n {
                    cpu.step(bus);
                }
                let pc = cpu.pc();
                con.write_line(&format!("{pc:08x}: {}", disasm(bus.read_u32(pc))));
            }
            "x" => match arg1 {
                Some(addr) => examine(bus, con, addr, arg2.unwrap_or(8)),
                None => con.write_line("x needs an address"),
            },
            "d" => match arg1 {
                Some(addr) => dump(bus, con, addr, arg2.unwrap_or(16)),
                None => con.write_line("d needs an address"),
            },
            "pc" => match arg1 {
                Some(addr) => cpu.set_pc(addr),
                None => con.write_line("pc needs an address"),
            },
            "c" => return Verdict::Resume,
            "q" => return Verdict::Quit,
            _ => con.write_line(HELP),
        }
    }
}
