pub mod bus;
pub mod constants;
pub mod mem;

pub use bus::Bus;
