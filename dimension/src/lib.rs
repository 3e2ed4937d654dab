pub mod adapter;
pub mod banks;
pub mod config;
pub mod io;
pub mod machine;
pub mod port;
pub mod selftest;
pub mod timers;

pub use banks::{Bank, NdMem};
pub use config::{ConfigError, NdConfig};
pub use machine::Dimension;
pub use port::MessagePort;
pub use timers::BlankTimers;
