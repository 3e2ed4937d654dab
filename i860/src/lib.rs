pub mod debug;
pub mod decode;
pub mod disas;
pub mod exec;
pub mod fpu;
pub mod mem;
pub mod regs;

pub use debug::{Console, StdioConsole, Verdict};
pub use exec::Cpu;
pub use regs::{Dim, Stats};
