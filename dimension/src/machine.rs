//! The board handle and the auxiliary core's run loop.
//!
//! `Dimension` is what the embedding host owns: it builds the memory
//! system, runs the startup self-tests, and either spawns the core onto
//! its own thread or keeps it inline for the integrated model. All
//! steady-state signaling toward the core goes through the message port;
//! the only shared mutable state beyond the banks is the small atomic
//! block in `Shared`.

use std::sync::atomic::{AtomicBool, AtomicI64, Ordering};
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use delegate::delegate;
use log::{debug, error};

use common::constants::ND_CLOCK_MHZ;
use i860::debug::debug_repl;
use i860::{Cpu, Stats, StdioConsole, Verdict};

use crate::adapter::HostAdapter;
use crate::banks::NdMem;
use crate::config::{ConfigError, NdConfig};
use crate::port::MessagePort;
use crate::selftest;
use crate::timers::BUDGET_CAP;

/// Instructions per budget check in the threaded loop.
const BATCH: i64 = 16;

const HALT_NAP: Duration = Duration::from_millis(10);
const STARVE_NAP: Duration = Duration::from_millis(1);
const REPORT_PERIOD: Duration = Duration::from_secs(1);

/// State shared between the host handle and the core's run context.
struct Shared {
    cycles: AtomicI64,
    halted: AtomicBool,
    report: Mutex<String>,
}

impl Shared {
    fn new() -> Shared {
        Shared {
            cycles: AtomicI64::new(0),
            halted: AtomicBool::new(false),
            report: Mutex::new(String::new()),
        }
    }
}

////////////////////////////////////////////////////////////////////////////////

/// The auxiliary core plus everything its run loop touches.
struct Core {
    cpu: Cpu,
    mem: Arc<NdMem>,
    shared: Arc<Shared>,
    display_blank: bool,
    video_blank: bool,
    last_stats: Stats,
    last_report: Instant,
}

impl Core {
    fn new(mem: Arc<NdMem>, shared: Arc<Shared>) -> Core {
        Core {
            cpu: Cpu::new(),
            mem,
            shared,
            display_blank: false,
            video_blank: false,
            last_stats: Stats::default(),
            last_report: Instant::now(),
        }
    }

    /// One mailbox drain. Returns false when KILL came through.
    fn drain(&mut self) -> bool {
        let bits = self.mem.port.drain();
        if bits == 0 {
            return true;
        }
        if bits & MessagePort::KILL != 0 {
            return false;
        }
        if bits & MessagePort::RESET != 0 {
            debug!("core reset by message");
            self.cpu.reset();
        }
        if bits & MessagePort::RAISE_INTR != 0 {
            self.cpu.set_int_pin(true);
        }
        if bits & MessagePort::LOWER_INTR != 0 {
            self.cpu.set_int_pin(false);
        }
        if bits & MessagePort::DISPLAY_BLANK != 0 {
            self.display_blank = !self.display_blank;
            self.mem.mc.latch_vblank(&self.mem.port);
        }
        if bits & MessagePort::VIDEO_BLANK != 0 {
            self.video_blank = !self.video_blank;
        }
        if bits & MessagePort::DEBUG_BREAK != 0 {
            let mut con = StdioConsole;
            if debug_repl(&mut self.cpu, self.mem.as_ref(), &mut con) == Verdict::Quit {
                return false;
            }
        }
        true
    }

    /// Dedicated-thread model. Runs until KILL or a debugger quit.
    fn run(mut self) {
        debug!("auxiliary core thread running");
        loop {
            if !self.drain() {
                debug!("auxiliary core thread exiting");
                return;
            }
            if self.shared.halted.load(Ordering::Relaxed) {
                thread::sleep(HALT_NAP);
                continue;
            }
            let budget = self.shared.cycles.load(Ordering::Relaxed);
            if budget <= 0 {
                thread::sleep(STARVE_NAP);
                continue;
            }
            let batch = budget.min(BATCH);
            for _ in 0..batch {
                self.cpu.step(self.mem.as_ref());
            }
            self.shared.cycles.fetch_sub(batch, Ordering::Relaxed);
            self.publish_stats();
        }
    }

    /// Refreshes the diagnostics line about once a second.
    fn publish_stats(&mut self) {
        let now = Instant::now();
        let elapsed = now.duration_since(self.last_report);
        if elapsed < REPORT_PERIOD {
            return;
        }
        let stats = self.cpu.stats();
        let secs = elapsed.as_secs_f64();
        let mips = (stats.executed - self.last_stats.executed) as f64 / secs / 1e6;
        let ints = (stats.ints_taken - self.last_stats.ints_taken) as f64 / secs;
        let line = format!(
            "{mips:.2} mips, icache {:.1}%, tlb {:.1}%, {ints:.0} ints/s",
            percent(
                stats.icache_hits - self.last_stats.icache_hits,
                stats.icache_misses - self.last_stats.icache_misses,
            ),
            percent(
                stats.tlb_hits - self.last_stats.tlb_hits,
                stats.tlb_misses - self.last_stats.tlb_misses,
            ),
        );
        *self.shared.report.lock().unwrap() = line;
        self.last_stats = stats;
        self.last_report = now;
    }
}

fn percent(hits: u64, misses: u64) -> f64 {
    let total = hits + misses;
    if total == 0 {
        return 100.0;
    }
    hits as f64 * 100.0 / total as f64
}

////////////////////////////////////////////////////////////////////////////////

/// One coprocessor board.
pub struct Dimension {
    config: NdConfig,
    mem: Arc<NdMem>,
    adapter: HostAdapter,
    shared: Arc<Shared>,
    /// Present in the integrated model only.
    core: Option<Core>,
    /// Present in the threaded model only.
    thread: Option<JoinHandle<()>>,
}

impl Dimension {
    /// Builds the board and starts its core. The startup self-tests run
    /// here, before the core can execute anything; their failure exits
    /// the process.
    pub fn new(config: NdConfig) -> Result<Dimension, ConfigError> {
        config.validate()?;
        let rom = config.load_rom()?;

        let mem = Arc::new(NdMem::new(&config));
        mem.load_rom(&rom);
        selftest::enforce(&mem);

        let shared = Arc::new(Shared::new());
        let adapter = HostAdapter::new(mem.clone());

        let mut board = Dimension {
            config,
            mem,
            adapter,
            shared,
            core: None,
            thread: None,
        };
        let core = Core::new(board.mem.clone(), board.shared.clone());
        if board.config.threaded {
            board.thread = Some(thread::spawn(move || core.run()));
        } else {
            board.core = Some(core);
        }
        Ok(board)
    }

    delegate! {
        to self.adapter {
            pub fn board_read_u8(&self, addr: u32) -> u8;
            pub fn board_read_u16(&self, addr: u32) -> u16;
            pub fn board_read_u32(&self, addr: u32) -> u32;
            pub fn board_write_u8(&self, addr: u32, val: u8);
            pub fn board_write_u16(&self, addr: u32, val: u16);
            pub fn board_write_u32(&self, addr: u32, val: u32);
            pub fn slot_read_u8(&self, addr: u32) -> u8;
            pub fn slot_read_u16(&self, addr: u32) -> u16;
            pub fn slot_read_u32(&self, addr: u32) -> u32;
            pub fn slot_write_u8(&self, addr: u32, val: u8);
            pub fn slot_write_u16(&self, addr: u32, val: u16);
            pub fn slot_write_u32(&self, addr: u32, val: u32);
        }
        to self.mem {
            pub fn framebuffer_ptr(&self) -> *const u8;
            pub fn framebuffer_len(&self) -> usize;
            pub fn framebuffer_snapshot(&self) -> Vec<u32>;
        }
        to self.mem.port {
            pub fn send(&self, bits: u32);
        }
    }

    pub fn mem(&self) -> &NdMem {
        &self.mem
    }

    /// Posts DEBUG_BREAK; the core enters its monitor at the next drain.
    pub fn force_break(&self) {
        self.send(MessagePort::DEBUG_BREAK);
    }

    /// Deposits cycle allowance for the threaded core, capped so a
    /// stalled core cannot bank unbounded time.
    pub fn grant_cycles(&self, n: i64) {
        let _ = self
            .shared
            .cycles
            .fetch_update(Ordering::Relaxed, Ordering::Relaxed, |c| {
                Some((c + n).min(BUDGET_CAP))
            });
    }

    pub fn cycle_budget(&self) -> i64 {
        self.shared.cycles.load(Ordering::Relaxed)
    }

    /// Pause/resume for the whole machine. Distinct from KILL: the core
    /// thread stays parked and resumable.
    pub fn set_halted(&self, halted: bool) {
        self.shared.halted.store(halted, Ordering::Relaxed);
    }

    /// One-line diagnostics, empty while halted.
    pub fn reports(&self) -> String {
        if self.shared.halted.load(Ordering::Relaxed) {
            return String::new();
        }
        self.shared.report.lock().unwrap().clone()
    }

    /// Integrated model: runs the core synchronously on the caller's
    /// thread, scaled from the host CPU's clock to the 33 MHz reference.
    /// No-op for a threaded board, which paces itself.
    pub fn run_host_cycles(&mut self, host_cycles: u64) {
        let Some(core) = self.core.as_mut() else {
            return;
        };
        // KILL has no loop to terminate here; the drain verdict is moot
        let _ = core.drain();
        if self.shared.halted.load(Ordering::Relaxed) {
            return;
        }
        let steps = host_cycles * ND_CLOCK_MHZ / self.config.host_mhz;
        for _ in 0..steps {
            core.cpu.step(core.mem.as_ref());
        }
        core.publish_stats();
    }
}

impl Drop for Dimension {
    fn drop(&mut self) {
        if let Some(handle) = self.thread.take() {
            self.mem.port.send(MessagePort::KILL);
            if handle.join().is_err() {
                error!("auxiliary core thread panicked");
            }
        }
    }
}
