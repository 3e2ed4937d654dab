//! Host harness for one coprocessor board: builds it from the command
//! line, pumps the blanking timers, prints the diagnostics line, and
//! relays a couple of keys.

use std::path::PathBuf;
use std::thread;
use std::time::{Duration, Instant};

use clap::Parser;
use crossterm::event::{self, Event, KeyCode, KeyEventKind, KeyModifiers};
use crossterm::terminal::{disable_raw_mode, enable_raw_mode};
use crossterm::tty::IsTty;

use nd_lib::{BlankTimers, Dimension, NdConfig};

/// NeXTdimension board emulator
#[derive(Parser)]
struct Args {
    /// Boot ROM image (blank EEPROM when omitted)
    #[arg(long)]
    rom: Option<PathBuf>,

    /// Memory bank capacities in MB, 0 for an empty socket
    #[arg(long, num_args = 4, value_delimiter = ',', default_value = "4,4,4,4")]
    banks: Vec<u32>,

    /// Interleave the core into this thread instead of its own
    #[arg(long)]
    integrated: bool,

    /// Host CPU clock in MHz, scales integrated-model execution
    #[arg(long, default_value_t = 25)]
    host_mhz: u64,

    /// Exit after this many milliseconds
    #[arg(long)]
    run_for: Option<u64>,
}

fn main() {
    env_logger::init();
    let args = Args::parse();

    let banks: [u32; 4] = args.banks.clone().try_into().unwrap();
    let config = NdConfig {
        bank_mb: banks,
        rom_path: args.rom.clone(),
        threaded: !args.integrated,
        host_mhz: args.host_mhz,
        ..NdConfig::default()
    };
    let mut board = Dimension::new(config).unwrap();
    let mut timers = BlankTimers::new();

    // Raw keys only make sense on a terminal, and the core monitor wants
    // the terminal cooked again, so key handling ends at the first break.
    let mut keys_live = std::io::stdin().is_tty();
    if keys_live {
        enable_raw_mode().unwrap();
        println!("b: break into the core monitor, q: quit\r");
    }

    let start = Instant::now();
    let mut last_host_run = Instant::now();
    let mut last_print = Instant::now();
    'run: loop {
        if let Some(ms) = args.run_for {
            if start.elapsed() >= Duration::from_millis(ms) {
                break;
            }
        }
        let deadline = timers.poll(&[&board]);

        if args.integrated {
            // stand in for the host cpu: elapsed wall time becomes cycles
            let now = Instant::now();
            let host_cycles = now.duration_since(last_host_run).as_micros() as u64 * args.host_mhz;
            last_host_run = now;
            board.run_host_cycles(host_cycles);
        }

        if last_print.elapsed() >= Duration::from_secs(1) {
            last_print = Instant::now();
            let line = board.reports();
            if !line.is_empty() {
                if keys_live {
                    println!("{line}\r");
                } else {
                    println!("{line}");
                }
            }
        }

        // wait out the rest of the period on the keyboard
        loop {
            let now = Instant::now();
            if now >= deadline {
                break;
            }
            let wait = deadline - now;
            if !keys_live {
                thread::sleep(wait);
                continue;
            }
            if !event::poll(wait).unwrap() {
                continue;
            }
            if let Ok(Event::Key(key)) = event::read() {
                if key.kind != KeyEventKind::Press {
                    continue;
                }
                match key.code {
                    KeyCode::Char('q') => break 'run,
                    KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                        break 'run;
                    }
                    KeyCode::Char('b') => {
                        // hand the monitor a cooked terminal
                        disable_raw_mode().unwrap();
                        keys_live = false;
                        board.force_break();
                    }
                    _ => {}
                }
            }
        }
    }

    if keys_live {
        disable_raw_mode().unwrap();
    }
}
